use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column as _, MySql, Row as _, TypeInfo as _};

use super::cell::{bytes_or_null, or_null, CellKind};
use crate::config::ConnectionConfig;
use crate::error::{Result, SqlForgeError};
use crate::traits::DatabaseDriver;
use crate::types::{Dialect, ExecResult, RawQueryResult, SqlValue};

/// MySQL / MariaDB driver implementation using a sqlx pool.
pub struct MySqlDriver {
    pool: MySqlPool,
}

impl MySqlDriver {
    /// Open a pool against the server described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = match &config.url {
            Some(url) => MySqlConnectOptions::from_str(url)
                .map_err(|e| SqlForgeError::Connection(e.to_string()))?,
            None => {
                let mut options = MySqlConnectOptions::new()
                    .host(&config.host)
                    .username(&config.user);
                if let Some(port) = config.port {
                    options = options.port(port);
                }
                if let Some(password) = &config.password {
                    options = options.password(password);
                }
                if let Some(database) = &config.database {
                    options = options.database(database);
                }
                options
            }
        };

        let mut pool_options = MySqlPoolOptions::new().max_connections(config.max_connections);
        if let Some(timeout) = config.connect_timeout() {
            pool_options = pool_options.acquire_timeout(timeout);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| SqlForgeError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let rows = bind_params(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlForgeError::execution)?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let result_rows = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row_value_to_string(row, i))
                    .collect()
            })
            .collect();

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let done = bind_params(sql, params)
            .execute(&self.pool)
            .await
            .map_err(SqlForgeError::execution)?;

        // MySQL reports 0 when the statement generated no id.
        let last_insert_id = Some(done.last_insert_id()).filter(|id| *id != 0);
        Ok(ExecResult::new(done.rows_affected(), last_insert_id))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Attach every parameter to the statement in order.
fn bind_params<'q>(sql: &'q str, params: &'q [SqlValue]) -> Query<'q, MySql, MySqlArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, value| match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int32(i) => query.bind(*i),
            SqlValue::Int64(i) => query.bind(*i),
            SqlValue::Float64(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(*b),
        })
}

/// Column type name as reported by sqlx (`INT UNSIGNED`, `DECIMAL`, ...).
fn mysql_cell_kind(type_name: &str) -> CellKind {
    let name = type_name.to_ascii_uppercase();
    let (base, unsigned) = match name.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (name.as_str(), false),
    };

    match base {
        // TINYINT(1) is reported as BOOLEAN; it is read back as 0/1 like any integer.
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "BOOLEAN" if unsigned => {
            CellKind::Unsigned
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "BOOLEAN" => CellKind::Signed,
        "FLOAT" | "DOUBLE" => CellKind::Float,
        "DECIMAL" => CellKind::Decimal,
        "DATE" => CellKind::Date,
        "TIME" => CellKind::Time,
        "DATETIME" | "TIMESTAMP" => CellKind::DateTime,
        "JSON" => CellKind::Json,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            CellKind::Text
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => CellKind::Bytes,
        _ => CellKind::Other,
    }
}

/// Convert a row value at a given index to a string.
fn row_value_to_string(row: &MySqlRow, index: usize) -> String {
    let kind = mysql_cell_kind(row.column(index).type_info().name());
    decode_as(row, index, kind)
        .or_else(|| decode_any(row, index))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn decode_as(row: &MySqlRow, index: usize, kind: CellKind) -> Option<String> {
    match kind {
        CellKind::Signed => row.try_get::<Option<i64>, _>(index).ok().map(or_null),
        CellKind::Unsigned => row.try_get::<Option<u64>, _>(index).ok().map(or_null),
        CellKind::Float => row.try_get::<Option<f64>, _>(index).ok().map(or_null),
        CellKind::Decimal => row.try_get::<Option<Decimal>, _>(index).ok().map(or_null),
        CellKind::Bool => row.try_get::<Option<bool>, _>(index).ok().map(or_null),
        CellKind::Date => row.try_get::<Option<NaiveDate>, _>(index).ok().map(or_null),
        CellKind::Time => row.try_get::<Option<NaiveTime>, _>(index).ok().map(or_null),
        CellKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .map(or_null),
        CellKind::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .map(or_null),
        CellKind::Text => row.try_get::<Option<String>, _>(index).ok().map(or_null),
        CellKind::Bytes => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .map(bytes_or_null),
        CellKind::DateTimeTz | CellKind::Other => None,
    }
}

/// The first decode that the column type accepts wins; NULL decodes as `None`
/// on the first attempt.
fn decode_any(row: &MySqlRow, index: usize) -> Option<String> {
    if let Ok(val) = row.try_get::<Option<i64>, _>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<Option<u64>, _>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<Option<f64>, _>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<Option<String>, _>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Some(bytes_or_null(val));
    }
    // Decimal and JSON values too wide for the typed decoders still travel as text.
    row.try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .map(or_null)
}
