//! sqlforge - a validating SQL statement assembler for MySQL-family databases
//!
//! Statements are described as plain data (or JSON objects), validated,
//! compiled to parameterized SQL and run through a pluggable driver.
//!
//! # Example
//! ```ignore
//! use sqlforge::{Client, ConnectionConfig, Op, QuerySpec, Record};
//!
//! // Connect to database
//! let client = Client::connect(&ConnectionConfig::mysql("localhost", "app", "shop")).await?;
//! let querier = client.querier();
//!
//! // SELECT `id`, `name` FROM `users` WHERE `active` = ? AND `age` >= ? LIMIT 10
//! let rows = querier
//!     .find(
//!         &QuerySpec::new("users")
//!             .columns(["id", "name"])
//!             .where_eq("active", true)
//!             .filter("age", Op::Gte, 18)
//!             .limit(10),
//!     )
//!     .await?
//!     .rows();
//!
//! querier
//!     .insert("users", Record::new().field("name", "Ana").field("age", 30))
//!     .await?;
//!
//! client.disconnect().await?;
//! ```

pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod querier;
pub mod traits;
pub mod types;

mod client;
mod json;

// Re-export main types for convenient access
pub use builders::{
    ColumnDef, CreateTable, DeleteSpec, GroupQuery, InsertSpec, OrderedQuery, Page, QuerySpec,
    Record, Reference, TableSchema, UpdateSpec,
};
pub use clauses::{Combinator, Condition, Join, JoinKind, JoinOn, Op, Order, WhereClause};
pub use client::Client;
pub use config::ConnectionConfig;
pub use error::{Result, SqlForgeError};
pub use querier::Querier;
pub use traits::DatabaseDriver;
pub use types::{CompiledQuery, Dialect, ExecResult, QueryResult, RawQueryResult, Row, SqlValue};
