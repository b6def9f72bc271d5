use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::error;

use super::cell::{bytes_or_null, or_null, CellKind};
use crate::config::ConnectionConfig;
use crate::error::{Result, SqlForgeError};
use crate::traits::DatabaseDriver;
use crate::types::{Dialect, ExecResult, RawQueryResult, SqlValue};

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Statements are prepared first so each parameter can be converted to the
/// exact type the server expects: `SqlValue::Int64(7)` binds as `int4` for an
/// `integer` column and as `int8` for a `bigint` one.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut pg_config = match &config.url {
            Some(url) => url
                .parse::<tokio_postgres::Config>()
                .map_err(|e| SqlForgeError::Connection(e.to_string()))?,
            None => {
                let mut pg_config = tokio_postgres::Config::new();
                pg_config.host(&config.host).user(&config.user);
                if let Some(port) = config.port {
                    pg_config.port(port);
                }
                if let Some(password) = &config.password {
                    pg_config.password(password);
                }
                if let Some(database) = &config.database {
                    pg_config.dbname(database);
                }
                pg_config
            }
        };
        if let Some(timeout) = config.connect_timeout() {
            pg_config.connect_timeout(timeout);
        }

        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| SqlForgeError::Connection(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn prepare(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<(tokio_postgres::Statement, Vec<Param>)> {
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(SqlForgeError::execution)?;
        let converted = convert_params(params, statement.params())?;
        Ok((statement, converted))
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let (statement, converted_params) = self.prepare(sql, params).await?;
        let param_refs = param_refs(&converted_params);

        let rows = self
            .client
            .query(&statement, &param_refs)
            .await
            .map_err(SqlForgeError::execution)?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows: Vec<Vec<String>> = rows
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
        let (statement, converted_params) = self.prepare(sql, params).await?;
        let param_refs = param_refs(&converted_params);

        let rows_affected = self
            .client
            .execute(&statement, &param_refs)
            .await
            .map_err(SqlForgeError::execution)?;

        // PostgreSQL has no session-level insert id; use RETURNING with `query`.
        Ok(ExecResult::new(rows_affected, None))
    }
}

type Param = Box<dyn ToSql + Sync + Send>;

fn convert_params(params: &[SqlValue], types: &[Type]) -> Result<Vec<Param>> {
    if params.len() != types.len() {
        return Err(SqlForgeError::execution(format!(
            "statement expects {} parameters, got {}",
            types.len(),
            params.len()
        )));
    }
    params
        .iter()
        .zip(types)
        .map(|(value, ty)| -> Result<Param> { Ok(PgParam::coerce(value, ty)?.boxed(ty)) })
        .collect()
}

fn param_refs(converted: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    converted
        .iter()
        .map(|b| b.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// A parameter converted to the Rust type matching its declared SQL type.
#[derive(Debug, Clone, PartialEq)]
enum PgParam {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
    Json(serde_json::Value),
}

fn is_one_of(ty: &Type, types: &[Type]) -> bool {
    types.contains(ty)
}

fn is_text(ty: &Type) -> bool {
    is_one_of(ty, &[Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME])
}

fn mismatch(value: impl std::fmt::Display, ty: &Type) -> SqlForgeError {
    SqlForgeError::execution(format!("cannot bind {value} as {ty}"))
}

impl PgParam {
    fn coerce(value: &SqlValue, ty: &Type) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(PgParam::Null),
            SqlValue::Bool(b) if is_text(ty) => Ok(PgParam::Text(b.to_string())),
            SqlValue::Bool(b) => Ok(PgParam::Bool(*b)),
            SqlValue::Int32(i) => Self::integer(i64::from(*i), ty),
            SqlValue::Int64(i) => Self::integer(*i, ty),
            SqlValue::Float64(f) => Self::float(*f, ty),
            SqlValue::Text(s) => Self::text(s, ty),
        }
    }

    fn integer(i: i64, ty: &Type) -> Result<Self> {
        let param = if *ty == Type::INT2 {
            PgParam::Int2(i16::try_from(i).map_err(|_| mismatch(i, ty))?)
        } else if *ty == Type::INT4 {
            PgParam::Int4(i32::try_from(i).map_err(|_| mismatch(i, ty))?)
        } else if *ty == Type::FLOAT4 {
            PgParam::Float4(i as f32)
        } else if *ty == Type::FLOAT8 {
            PgParam::Float8(i as f64)
        } else if *ty == Type::NUMERIC {
            PgParam::Numeric(Decimal::from(i))
        } else if is_text(ty) {
            PgParam::Text(i.to_string())
        } else {
            PgParam::Int8(i)
        };
        Ok(param)
    }

    fn float(f: f64, ty: &Type) -> Result<Self> {
        let param = if *ty == Type::FLOAT4 {
            PgParam::Float4(f as f32)
        } else if *ty == Type::NUMERIC {
            PgParam::Numeric(Decimal::try_from(f).map_err(|_| mismatch(f, ty))?)
        } else if is_text(ty) {
            PgParam::Text(f.to_string())
        } else {
            PgParam::Float8(f)
        };
        Ok(param)
    }

    /// Text is parsed when the server expects a non-text type, so JSON configs
    /// can pass dates, decimals and numeric strings.
    fn text(s: &str, ty: &Type) -> Result<Self> {
        let parsed = |ok: Option<PgParam>| ok.ok_or_else(|| mismatch(format!("{s:?}"), ty));

        if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 {
            let i = s.trim().parse::<i64>().map_err(|_| mismatch(format!("{s:?}"), ty))?;
            Self::integer(i, ty)
        } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
            let f = s.trim().parse::<f64>().map_err(|_| mismatch(format!("{s:?}"), ty))?;
            Self::float(f, ty)
        } else if *ty == Type::NUMERIC {
            parsed(Decimal::from_str(s.trim()).ok().map(PgParam::Numeric))
        } else if *ty == Type::BOOL {
            parsed(match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(PgParam::Bool(true)),
                "false" | "f" | "0" => Some(PgParam::Bool(false)),
                _ => None,
            })
        } else if *ty == Type::DATE {
            parsed(NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(PgParam::Date))
        } else if *ty == Type::TIME {
            parsed(NaiveTime::from_str(s).ok().map(PgParam::Time))
        } else if *ty == Type::TIMESTAMP {
            parsed(parse_timestamp(s).map(PgParam::Timestamp))
        } else if *ty == Type::TIMESTAMPTZ {
            parsed(
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .or_else(|| parse_timestamp(s).map(|t| t.and_utc().fixed_offset()))
                    .map(PgParam::TimestampTz),
            )
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            parsed(serde_json::from_str(s).ok().map(PgParam::Json))
        } else {
            Ok(PgParam::Text(s.to_string()))
        }
    }

    fn boxed(self, ty: &Type) -> Param {
        match self {
            PgParam::Null => typed_null(ty),
            PgParam::Bool(v) => Box::new(v),
            PgParam::Int2(v) => Box::new(v),
            PgParam::Int4(v) => Box::new(v),
            PgParam::Int8(v) => Box::new(v),
            PgParam::Float4(v) => Box::new(v),
            PgParam::Float8(v) => Box::new(v),
            PgParam::Numeric(v) => Box::new(v),
            PgParam::Text(v) => Box::new(v),
            PgParam::Date(v) => Box::new(v),
            PgParam::Time(v) => Box::new(v),
            PgParam::Timestamp(v) => Box::new(v),
            PgParam::TimestampTz(v) => Box::new(v),
            PgParam::Json(v) => Box::new(v),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// NULL still has to pass the type check of the parameter it is bound to.
fn typed_null(ty: &Type) -> Param {
    if *ty == Type::BOOL {
        Box::new(None::<bool>)
    } else if *ty == Type::INT2 {
        Box::new(None::<i16>)
    } else if *ty == Type::INT4 {
        Box::new(None::<i32>)
    } else if *ty == Type::INT8 {
        Box::new(None::<i64>)
    } else if *ty == Type::FLOAT4 {
        Box::new(None::<f32>)
    } else if *ty == Type::FLOAT8 {
        Box::new(None::<f64>)
    } else if *ty == Type::NUMERIC {
        Box::new(None::<Decimal>)
    } else if *ty == Type::DATE {
        Box::new(None::<NaiveDate>)
    } else if *ty == Type::TIME {
        Box::new(None::<NaiveTime>)
    } else if *ty == Type::TIMESTAMP {
        Box::new(None::<NaiveDateTime>)
    } else if *ty == Type::TIMESTAMPTZ {
        Box::new(None::<DateTime<Utc>>)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        Box::new(None::<serde_json::Value>)
    } else if *ty == Type::BYTEA {
        Box::new(None::<Vec<u8>>)
    } else {
        Box::new(None::<String>)
    }
}

fn postgres_cell_kind(ty: &Type) -> CellKind {
    if is_one_of(ty, &[Type::INT2, Type::INT4, Type::INT8]) {
        CellKind::Signed
    } else if is_one_of(ty, &[Type::FLOAT4, Type::FLOAT8]) {
        CellKind::Float
    } else if *ty == Type::NUMERIC {
        CellKind::Decimal
    } else if *ty == Type::BOOL {
        CellKind::Bool
    } else if *ty == Type::DATE {
        CellKind::Date
    } else if *ty == Type::TIME {
        CellKind::Time
    } else if *ty == Type::TIMESTAMP {
        CellKind::DateTime
    } else if *ty == Type::TIMESTAMPTZ {
        CellKind::DateTimeTz
    } else if is_one_of(ty, &[Type::JSON, Type::JSONB]) {
        CellKind::Json
    } else if is_text(ty) {
        CellKind::Text
    } else if *ty == Type::BYTEA {
        CellKind::Bytes
    } else {
        CellKind::Other
    }
}

/// Convert a row value at a given index to a string.
fn row_value_to_string(row: &tokio_postgres::Row, index: usize) -> String {
    let kind = postgres_cell_kind(row.columns()[index].type_());
    decode_as(row, index, kind)
        .or_else(|| decode_any(row, index))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn decode_as(row: &tokio_postgres::Row, index: usize, kind: CellKind) -> Option<String> {
    match kind {
        CellKind::Signed => row
            .try_get::<_, Option<i64>>(index)
            .map(or_null)
            .or_else(|_| row.try_get::<_, Option<i32>>(index).map(or_null))
            .or_else(|_| row.try_get::<_, Option<i16>>(index).map(or_null))
            .ok(),
        CellKind::Float => row
            .try_get::<_, Option<f64>>(index)
            .map(or_null)
            .or_else(|_| row.try_get::<_, Option<f32>>(index).map(or_null))
            .ok(),
        CellKind::Decimal => row.try_get::<_, Option<Decimal>>(index).ok().map(or_null),
        CellKind::Bool => row.try_get::<_, Option<bool>>(index).ok().map(or_null),
        CellKind::Date => row.try_get::<_, Option<NaiveDate>>(index).ok().map(or_null),
        CellKind::Time => row.try_get::<_, Option<NaiveTime>>(index).ok().map(or_null),
        CellKind::DateTime => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .ok()
            .map(or_null),
        CellKind::DateTimeTz => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .ok()
            .map(|v| or_null(v.map(|t| t.to_rfc3339()))),
        CellKind::Json => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .ok()
            .map(or_null),
        CellKind::Text => row.try_get::<_, Option<String>>(index).ok().map(or_null),
        CellKind::Bytes => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .ok()
            .map(bytes_or_null),
        CellKind::Unsigned | CellKind::Other => None,
    }
}

/// Trying common types in turn.
fn decode_any(row: &tokio_postgres::Row, index: usize) -> Option<String> {
    if let Ok(val) = row.try_get::<_, Option<i32>>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<_, Option<i64>>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<_, Option<String>>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<_, Option<bool>>(index) {
        return Some(or_null(val));
    }
    if let Ok(val) = row.try_get::<_, Option<f64>>(index) {
        return Some(or_null(val));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_follow_parameter_type() {
        assert_eq!(PgParam::coerce(&SqlValue::Int64(7), &Type::INT4).unwrap(), PgParam::Int4(7));
        assert_eq!(PgParam::coerce(&SqlValue::Int32(7), &Type::INT8).unwrap(), PgParam::Int8(7));
        assert_eq!(PgParam::coerce(&SqlValue::Int32(7), &Type::INT2).unwrap(), PgParam::Int2(7));
        assert_eq!(
            PgParam::coerce(&SqlValue::Int64(7), &Type::NUMERIC).unwrap(),
            PgParam::Numeric(Decimal::from(7))
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::Int64(7), &Type::FLOAT8).unwrap(),
            PgParam::Float8(7.0)
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::Int64(7), &Type::TEXT).unwrap(),
            PgParam::Text("7".to_string())
        );
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let err = PgParam::coerce(&SqlValue::Int64(i64::from(i32::MAX) + 1), &Type::INT4).unwrap_err();
        assert!(err.is_execution());
        assert!(PgParam::coerce(&SqlValue::Int32(40_000), &Type::INT2).is_err());
    }

    #[test]
    fn test_text_is_parsed_for_typed_parameters() {
        assert_eq!(
            PgParam::coerce(&SqlValue::from("42"), &Type::INT4).unwrap(),
            PgParam::Int4(42)
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::from("19.99"), &Type::NUMERIC).unwrap(),
            PgParam::Numeric(Decimal::from_str("19.99").unwrap())
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::from("2024-03-09"), &Type::DATE).unwrap(),
            PgParam::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::from("2024-03-09 14:05:00"), &Type::TIMESTAMP).unwrap(),
            PgParam::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 9)
                    .unwrap()
                    .and_hms_opt(14, 5, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::from(r#"{"a":1}"#), &Type::JSONB).unwrap(),
            PgParam::Json(serde_json::json!({ "a": 1 }))
        );
        assert_eq!(
            PgParam::coerce(&SqlValue::from("Ana"), &Type::VARCHAR).unwrap(),
            PgParam::Text("Ana".to_string())
        );
        assert!(PgParam::coerce(&SqlValue::from("seven"), &Type::INT8).is_err());
    }

    #[test]
    fn test_other_values_keep_their_type() {
        assert_eq!(PgParam::coerce(&SqlValue::Null, &Type::INT4).unwrap(), PgParam::Null);
        assert_eq!(PgParam::coerce(&SqlValue::Bool(true), &Type::BOOL).unwrap(), PgParam::Bool(true));
        assert_eq!(
            PgParam::coerce(&SqlValue::Float64(1.5), &Type::FLOAT4).unwrap(),
            PgParam::Float4(1.5)
        );
    }

    #[test]
    fn test_parameter_count_must_match() {
        let err = convert_params(&[SqlValue::Int32(1)], &[]).err().unwrap();
        assert!(err.is_execution());
        assert_eq!(convert_params(&[SqlValue::Int32(1)], &[Type::INT8]).unwrap().len(), 1);
    }

    #[test]
    fn test_postgres_cell_kinds() {
        assert_eq!(postgres_cell_kind(&Type::INT4), CellKind::Signed);
        assert_eq!(postgres_cell_kind(&Type::NUMERIC), CellKind::Decimal);
        assert_eq!(postgres_cell_kind(&Type::TIMESTAMP), CellKind::DateTime);
        assert_eq!(postgres_cell_kind(&Type::TIMESTAMPTZ), CellKind::DateTimeTz);
        assert_eq!(postgres_cell_kind(&Type::JSONB), CellKind::Json);
        assert_eq!(postgres_cell_kind(&Type::BPCHAR), CellKind::Text);
        assert_eq!(postgres_cell_kind(&Type::UUID), CellKind::Other);
    }
}
