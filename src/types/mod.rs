mod compiled;
mod dialect;
mod row;
mod sql_value;

pub(crate) use compiled::SqlWriter;
pub use compiled::CompiledQuery;
pub use dialect::Dialect;
pub use row::{ExecResult, QueryResult, RawQueryResult, Row};
pub use sql_value::SqlValue;
