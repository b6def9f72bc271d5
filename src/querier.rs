use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::builders::{
    CreateTable, DeleteSpec, GroupQuery, InsertSpec, OrderedQuery, Page, QuerySpec, Record,
    Statement, TableSchema, UpdateSpec,
};
use crate::client::ConnectionSlot;
use crate::error::{Result, SqlForgeError};
use crate::traits::DatabaseDriver;
use crate::types::{CompiledQuery, ExecResult, QueryResult, SqlValue};

/// Runs statement descriptors against the client's connection.
///
/// Every call validates its input first, then compiles for the connected
/// driver's dialect and awaits the driver once. Nothing is retried or cached.
pub struct Querier {
    slot: Arc<ConnectionSlot>,
    timeout: Option<Duration>,
}

impl Querier {
    pub(crate) fn new(slot: Arc<ConnectionSlot>, timeout: Option<Duration>) -> Self {
        Self { slot, timeout }
    }

    /// Fail any single call that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// General-purpose SELECT.
    pub async fn find(&self, spec: &QuerySpec) -> Result<QueryResult> {
        self.fetch(spec).await
    }

    pub async fn find_all(&self, table: &str, page: Page) -> Result<QueryResult> {
        self.find(&QuerySpec::all(table, page)).await
    }

    pub async fn find_columns(
        &self,
        table: &str,
        columns: &[&str],
        page: Page,
    ) -> Result<QueryResult> {
        self.find(&QuerySpec::only_columns(table, columns.iter().copied(), page))
            .await
    }

    pub async fn find_by_where(
        &self,
        table: &str,
        conditions: &Record,
        page: Page,
    ) -> Result<QueryResult> {
        self.find(&QuerySpec::by_where(table, conditions, page)).await
    }

    pub async fn find_by_or(
        &self,
        table: &str,
        conditions: &Record,
        page: Page,
    ) -> Result<QueryResult> {
        self.find(&QuerySpec::by_or(table, conditions, page)).await
    }

    pub async fn find_group(&self, query: &GroupQuery) -> Result<QueryResult> {
        self.find(&query.to_spec()?).await
    }

    pub async fn find_with_order(&self, query: &OrderedQuery) -> Result<QueryResult> {
        self.find(&query.to_spec()?).await
    }

    pub async fn insert(&self, table: &str, row: Record) -> Result<ExecResult> {
        self.run(&InsertSpec::new(table, row)).await
    }

    pub async fn update(&self, spec: &UpdateSpec) -> Result<ExecResult> {
        self.run(spec).await
    }

    pub async fn delete_records(&self, spec: &DeleteSpec) -> Result<ExecResult> {
        self.run(spec).await
    }

    /// `CREATE TABLE IF NOT EXISTS`, awaited like any other statement.
    pub async fn create_table(&self, table: &str, schema: TableSchema) -> Result<ExecResult> {
        let result = self.run(&CreateTable::new(table, schema)).await?;
        info!(table, "table created");
        Ok(result)
    }

    /// Forward `sql` verbatim and return its rows.
    pub async fn raw_query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult> {
        let compiled = raw_statement(sql, params)?;
        let driver = self.slot.current()?;
        self.query_compiled(driver.as_ref(), &compiled).await
    }

    /// Forward `sql` verbatim and return affected-row metadata.
    pub async fn raw_execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let compiled = raw_statement(sql, params)?;
        let driver = self.slot.current()?;
        self.execute_compiled(driver.as_ref(), &compiled).await
    }

    async fn fetch<S: Statement>(&self, statement: &S) -> Result<QueryResult> {
        statement.validate()?;
        let driver = self.slot.current()?;
        let compiled = statement.compile(driver.dialect())?;
        self.query_compiled(driver.as_ref(), &compiled).await
    }

    async fn run<S: Statement>(&self, statement: &S) -> Result<ExecResult> {
        statement.validate()?;
        let driver = self.slot.current()?;
        let compiled = statement.compile(driver.dialect())?;
        self.execute_compiled(driver.as_ref(), &compiled).await
    }

    async fn query_compiled(
        &self,
        driver: &dyn DatabaseDriver,
        compiled: &CompiledQuery,
    ) -> Result<QueryResult> {
        log_statement(compiled);
        let raw = self
            .bounded(driver.query(&compiled.sql, &compiled.params))
            .await
            .map_err(log_failure)?;
        Ok(QueryResult::from_raw(raw))
    }

    async fn execute_compiled(
        &self,
        driver: &dyn DatabaseDriver,
        compiled: &CompiledQuery,
    ) -> Result<ExecResult> {
        log_statement(compiled);
        self.bounded(driver.execute(&compiled.sql, &compiled.params))
            .await
            .map_err(log_failure)
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SqlForgeError::Timeout(limit))?,
            None => call.await,
        }
    }
}

fn raw_statement(sql: &str, params: &[SqlValue]) -> Result<CompiledQuery> {
    if sql.trim().is_empty() {
        return Err(SqlForgeError::validation(
            "a valid SQL query string is required",
        ));
    }
    Ok(CompiledQuery {
        sql: sql.to_string(),
        params: params.to_vec(),
    })
}

fn log_statement(compiled: &CompiledQuery) {
    debug!(
        target: "sqlforge::sql",
        sql = %compiled.sql,
        params = compiled.params.len(),
        "executing statement"
    );
}

fn log_failure(err: SqlForgeError) -> SqlForgeError {
    warn!(error = %err, "statement failed");
    err
}
