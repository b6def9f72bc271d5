use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Dialect, ExecResult, RawQueryResult, SqlValue};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Connecting to the database
/// - Converting SqlValue parameters to native types
/// - Running statements and converting results to RawQueryResult / ExecResult
///
/// Driver failures must be reported as `SqlForgeError::Execution`.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// The SQL flavour this driver expects (quoting and placeholder style).
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns rows.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;

    /// Run a statement for its effect and report affected rows / generated id.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult>;

    /// Release the underlying connection(s).
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
