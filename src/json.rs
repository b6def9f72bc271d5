//! Plain-data front-end: build statement descriptors from JSON objects.
//!
//! Keys follow the configuration objects callers already pass around
//! (`table`, `where`, `or`, `filters`, `groupBy`, `orderBy`, ...). Object key
//! order is preserved, so it decides column and parameter order.
//!
//! ```ignore
//! let spec = QuerySpec::from_json(&json!({
//!     "table": "users",
//!     "where": { "active": true },
//!     "filters": { "age": { ">=": 18 } },
//!     "orderBy": { "name": "asc" },
//!     "limit": 10
//! }))?;
//! ```
//!
//! Everything is checked here, before any SQL is built: unknown keys,
//! non-scalar values, unknown operators, bad directions and non-integer
//! limits are all validation errors.

use serde_json::{Map, Value};

use crate::builders::{ColumnDef, DeleteSpec, QuerySpec, Record, TableSchema, UpdateSpec};
use crate::clauses::{Condition, Join, JoinKind, Op, Order, WhereClause};
use crate::error::{Result, SqlForgeError};
use crate::types::SqlValue;

type Object = Map<String, Value>;

const QUERY_KEYS: &[&str] = &[
    "table",
    "alias",
    "columns",
    "functions",
    "expressions",
    "subqueries",
    "joins",
    "where",
    "or",
    "filters",
    "groupBy",
    "having",
    "orderBy",
    "limit",
    "offset",
    "distinct",
    "window",
    "withClause",
    "with",
];

const UPDATE_KEYS: &[&str] = &[
    "table", "alias", "set", "where", "or", "filters", "joins", "orderBy", "limit",
];

const DELETE_KEYS: &[&str] = &[
    "table", "alias", "where", "or", "filters", "joins", "orderBy", "limit", "offset",
];

const DESCRIPTOR_KEYS: &[&str] = &["type", "isnull", "isprimarykey", "isRefKey", "refCol"];

fn invalid(message: impl Into<String>) -> SqlForgeError {
    SqlForgeError::validation(message)
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Object> {
    value
        .as_object()
        .ok_or_else(|| invalid(format!("{what} must be an object")))
}

fn check_keys(obj: &Object, allowed: &[&str], what: &str) -> Result<()> {
    match obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(invalid(format!("unrecognized key {key:?} in {what}"))),
        None => Ok(()),
    }
}

/// A present, non-null value for `key`.
fn get<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn table(obj: &Object) -> Result<String> {
    match get(obj, "table") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None => Err(invalid("table name is required")),
        Some(_) => Err(invalid("table must be a string")),
    }
}

fn opt_string(obj: &Object, key: &str) -> Result<Option<String>> {
    match get(obj, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(format!("{key} must be a string"))),
    }
}

fn string_list(obj: &Object, key: &str) -> Result<Vec<String>> {
    let Some(value) = get(obj, key) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| invalid(format!("{key} must be an array of strings")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("{key} must be an array of strings")))
        })
        .collect()
}

fn flag(obj: &Object, key: &str) -> Result<bool> {
    match get(obj, key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(format!("{key} must be a boolean"))),
    }
}

/// A bound value: null, boolean, number or string.
fn scalar(value: &Value, context: &str) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Int64(i))
            } else if n.is_u64() {
                Err(invalid(format!("{context}: integer {n} is out of range")))
            } else {
                n.as_f64()
                    .map(SqlValue::Float64)
                    .ok_or_else(|| invalid(format!("{context}: unsupported number {n}")))
            }
        }
        Value::Array(_) | Value::Object(_) => Err(invalid(format!(
            "{context}: value must be a scalar, not an array or object"
        ))),
    }
}

fn entries<'a>(obj: &'a Object, key: &str) -> Result<Option<&'a Object>> {
    get(obj, key).map(|v| as_object(v, key)).transpose()
}

fn equalities(obj: &Object, key: &str) -> Result<Vec<Condition>> {
    let Some(map) = entries(obj, key)? else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(column, value)| -> Result<Condition> {
            Ok(Condition::eq(column, scalar(value, &format!("{key}.{column}"))?))
        })
        .collect()
}

/// `{ "<op>": value }` with exactly one key.
fn operator_condition(column: &str, value: &Value, context: &str) -> Result<Condition> {
    let map = as_object(value, context)?;
    let mut ops = map.iter();
    match (ops.next(), ops.next()) {
        (Some((op, operand)), None) => {
            let condition = Condition::new(column, op.parse::<Op>()?, scalar(operand, context)?);
            condition.check()?;
            Ok(condition)
        }
        _ => Err(invalid(format!(
            "{context} must hold exactly one operator, e.g. {{\">\": 5}}"
        ))),
    }
}

fn filters(obj: &Object) -> Result<Vec<Condition>> {
    let Some(map) = entries(obj, "filters")? else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(column, value)| -> Result<Condition> {
            let context = format!("filters.{column}");
            if value.is_object() {
                operator_condition(column, value, &context)
            } else {
                Ok(Condition::eq(column, scalar(value, &context)?))
            }
        })
        .collect()
}

fn having(obj: &Object) -> Result<Vec<Condition>> {
    let Some(map) = entries(obj, "having")? else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(column, value)| operator_condition(column, value, &format!("having.{column}")))
        .collect()
}

fn predicates(obj: &Object) -> Result<WhereClause> {
    Ok(WhereClause {
        all: equalities(obj, "where")?,
        filters: filters(obj)?,
        any: equalities(obj, "or")?,
    })
}

fn order_by(obj: &Object) -> Result<Vec<(String, Order)>> {
    let Some(map) = entries(obj, "orderBy")? else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(column, direction)| -> Result<(String, Order)> {
            let direction = direction
                .as_str()
                .ok_or_else(|| invalid(format!("orderBy.{column} must be \"ASC\" or \"DESC\"")))?;
            Ok((column.clone(), direction.parse()?))
        })
        .collect()
}

/// A row count: a non-negative integer or a string holding one.
fn count(obj: &Object, key: &str) -> Result<Option<u64>> {
    let bad = || invalid(format!("{key} must be a non-negative integer"));
    match get(obj, key) {
        None => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(bad),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| bad()),
        Some(_) => Err(bad()),
    }
}

/// Joins with a missing table or ON column come back incomplete; the
/// assembler leaves those out of the statement.
fn joins(obj: &Object) -> Result<Vec<Join>> {
    let Some(value) = get(obj, "joins") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| invalid("joins must be an array"))?;

    items
        .iter()
        .map(|item| -> Result<Join> {
            let join = as_object(item, "join")?;
            check_keys(join, &["type", "table", "on"], "join")?;

            let kind = match opt_string(join, "type")? {
                Some(kind) => kind.parse()?,
                None => JoinKind::Inner,
            };
            let mut out = Join::new(kind, opt_string(join, "table")?.unwrap_or_default());

            if let Some(on) = entries(join, "on")? {
                let left = opt_string(on, "left")?.unwrap_or_default();
                let right = opt_string(on, "right")?.unwrap_or_default();
                out = out.on(left, right);
            }
            Ok(out)
        })
        .collect()
}

fn subqueries(obj: &Object) -> Result<Vec<(String, String)>> {
    let Some(map) = entries(obj, "subqueries")? else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(alias, sql)| {
            sql.as_str()
                .map(|sql| (alias.clone(), sql.to_string()))
                .ok_or_else(|| invalid(format!("subqueries.{alias} must be a SQL string")))
        })
        .collect()
}

impl QuerySpec {
    /// Build a SELECT descriptor from a configuration object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "query")?;
        check_keys(obj, QUERY_KEYS, "query")?;

        let with_clause = match opt_string(obj, "withClause")? {
            Some(cte) => Some(cte),
            None => opt_string(obj, "with")?,
        };

        Ok(QuerySpec {
            table: table(obj)?,
            alias: opt_string(obj, "alias")?,
            with_clause,
            distinct: flag(obj, "distinct")?,
            columns: string_list(obj, "columns")?,
            functions: string_list(obj, "functions")?,
            expressions: string_list(obj, "expressions")?,
            subqueries: subqueries(obj)?,
            joins: joins(obj)?,
            predicates: predicates(obj)?,
            group_by: string_list(obj, "groupBy")?,
            having: having(obj)?,
            having_combinator: Default::default(),
            window: opt_string(obj, "window")?,
            order_by: order_by(obj)?,
            limit: count(obj, "limit")?,
            offset: count(obj, "offset")?,
        })
    }
}

impl UpdateSpec {
    /// Build an UPDATE descriptor from a configuration object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "update")?;
        check_keys(obj, UPDATE_KEYS, "update")?;

        let set = match get(obj, "set") {
            Some(set) => Record::from_json(set)?,
            None => Record::new(),
        };
        if set.is_empty() {
            return Err(invalid("set values are required"));
        }

        Ok(UpdateSpec {
            table: table(obj)?,
            alias: opt_string(obj, "alias")?,
            joins: joins(obj)?,
            set,
            predicates: predicates(obj)?,
            order_by: order_by(obj)?,
            limit: count(obj, "limit")?,
        })
    }
}

impl DeleteSpec {
    /// Build a DELETE descriptor from a configuration object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "delete")?;
        check_keys(obj, DELETE_KEYS, "delete")?;

        Ok(DeleteSpec {
            table: table(obj)?,
            alias: opt_string(obj, "alias")?,
            joins: joins(obj)?,
            predicates: predicates(obj)?,
            order_by: order_by(obj)?,
            limit: count(obj, "limit")?,
            offset: count(obj, "offset")?,
        })
    }
}

impl Record {
    /// `{ column: scalar, ... }` in key order.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "row")?;
        obj.iter()
            .map(|(column, value)| -> Result<(String, SqlValue)> {
                Ok((column.clone(), scalar(value, column)?))
            })
            .collect()
    }
}

impl TableSchema {
    /// Each entry is either a raw type string or a descriptor
    /// `{type, isnull?, isprimarykey?, isRefKey?, refCol?: {table, column}}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "schema")?;
        if obj.is_empty() {
            return Err(invalid("table schema must define at least one column"));
        }

        let mut schema = TableSchema::new();
        for (name, entry) in obj {
            schema.push(name.clone(), column_def(name, entry)?);
        }
        Ok(schema)
    }
}

fn column_def(name: &str, entry: &Value) -> Result<ColumnDef> {
    let descriptor = match entry {
        Value::String(sql_type) => return Ok(ColumnDef::new(sql_type.clone())),
        Value::Object(descriptor) => descriptor,
        _ => {
            return Err(invalid(format!(
                "schema entry {name} must be a type string or a column descriptor"
            )))
        }
    };
    check_keys(descriptor, DESCRIPTOR_KEYS, &format!("schema entry {name}"))?;

    let sql_type = opt_string(descriptor, "type")?
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| invalid(format!("schema entry {name} has no type")))?;
    let mut def = ColumnDef::new(sql_type);

    match get(descriptor, "isnull") {
        None | Some(Value::Bool(true)) => {}
        Some(Value::Bool(false)) => def = def.not_null(),
        Some(_) => return Err(invalid(format!("{name}.isnull must be a boolean"))),
    }
    if flag(descriptor, "isprimarykey")? {
        def = def.primary_key();
    }

    if flag(descriptor, "isRefKey")? {
        if let Some(reference) = entries(descriptor, "refCol")? {
            check_keys(reference, &["table", "column"], &format!("{name}.refCol"))?;
            let table = opt_string(reference, "table")?.unwrap_or_default();
            let column = opt_string(reference, "column")?.unwrap_or_default();
            def = def.references(table, column);
        }
    }
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dialect;
    use serde_json::json;

    fn compile(value: Value) -> (String, Vec<SqlValue>) {
        let compiled = QuerySpec::from_json(&value)
            .unwrap()
            .compile(Dialect::MySql)
            .unwrap();
        (compiled.sql, compiled.params)
    }

    #[test]
    fn test_where_preserves_key_order() {
        let (sql, params) = compile(json!({ "table": "t", "where": { "b": 2, "a": 1 } }));
        assert_eq!(sql, "SELECT * FROM `t` WHERE `b` = ? AND `a` = ?");
        assert_eq!(params, vec![SqlValue::Int64(2), SqlValue::Int64(1)]);
    }

    #[test]
    fn test_filters_accept_scalars_and_operators() {
        let (sql, params) = compile(json!({
            "table": "users",
            "where": { "active": true },
            "filters": { "age": { ">=": 18 }, "country": "PT", "name": { "like": "A%" } }
        }));
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE `active` = ? AND `age` >= ? AND `country` = ? AND `name` LIKE ?"
        );
        assert_eq!(
            params,
            vec![
                SqlValue::Bool(true),
                SqlValue::Int64(18),
                SqlValue::from("PT"),
                SqlValue::from("A%"),
            ]
        );
    }

    #[test]
    fn test_full_query_object() {
        let (sql, params) = compile(json!({
            "table": "orders",
            "alias": "o",
            "columns": ["o.customer_id"],
            "functions": ["SUM(o.total) AS spent"],
            "joins": [
                { "type": "left", "table": "customers", "on": { "left": "o.customer_id", "right": "customers.id" } },
                { "table": "ghosts", "on": { "left": "o.id" } }
            ],
            "or": { "o.status": "paid" },
            "groupBy": ["o.customer_id"],
            "having": { "spent": { ">": 100 } },
            "orderBy": { "spent": "desc" },
            "limit": "10",
            "offset": 0
        }));
        assert_eq!(
            sql,
            "SELECT `o`.`customer_id`, SUM(o.total) AS spent FROM `orders` AS `o` \
             LEFT JOIN `customers` ON `o`.`customer_id` = `customers`.`id` \
             WHERE (`o`.`status` = ?) GROUP BY `o`.`customer_id` HAVING `spent` > ? \
             ORDER BY `spent` DESC LIMIT 10 OFFSET 0"
        );
        assert_eq!(params, vec![SqlValue::from("paid"), SqlValue::Int64(100)]);
    }

    #[test]
    fn test_with_and_window_and_subqueries() {
        let (sql, _) = compile(json!({
            "withClause": "top AS (SELECT id FROM users LIMIT 5)",
            "table": "top",
            "distinct": true,
            "expressions": ["id"],
            "subqueries": { "n": "SELECT COUNT(*) FROM users" },
            "window": "w AS (ORDER BY id)"
        }));
        assert_eq!(
            sql,
            "WITH top AS (SELECT id FROM users LIMIT 5) SELECT DISTINCT id, \
             (SELECT COUNT(*) FROM users) AS `n` FROM `top` WINDOW w AS (ORDER BY id)"
        );
    }

    #[test]
    fn test_missing_table_is_rejected() {
        let err = QuerySpec::from_json(&json!({})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_bad_shapes_are_rejected() {
        let cases = [
            json!({ "table": "t", "limit": "ten" }),
            json!({ "table": "t", "limit": 1.5 }),
            json!({ "table": "t", "offset": -1 }),
            json!({ "table": "t", "where": { "a": [1, 2] } }),
            json!({ "table": "t", "filters": { "a": { ">": 1, "<": 5 } } }),
            json!({ "table": "t", "filters": { "a": { "~~": 1 } } }),
            json!({ "table": "t", "having": { "n": 3 } }),
            json!({ "table": "t", "orderBy": { "a": "sideways" } }),
            json!({ "table": "t", "joins": [{ "type": "diagonal", "table": "x" }] }),
            json!({ "table": "t", "wher": { "a": 1 } }),
            json!(["t"]),
        ];
        for case in cases {
            let err = QuerySpec::from_json(&case).unwrap_err();
            assert!(err.is_validation(), "expected validation error for {case}");
        }
    }

    #[test]
    fn test_update_from_json() {
        let compiled = UpdateSpec::from_json(&json!({
            "table": "t",
            "set": { "x": 1 },
            "where": { "id": 2 }
        }))
        .unwrap()
        .compile(Dialect::MySql)
        .unwrap();

        assert_eq!(compiled.sql, "UPDATE `t` SET `x` = ? WHERE `id` = ?");
        assert_eq!(compiled.params, vec![SqlValue::Int64(1), SqlValue::Int64(2)]);
    }

    #[test]
    fn test_update_requires_set() {
        assert!(UpdateSpec::from_json(&json!({ "table": "t", "set": {} }))
            .unwrap_err()
            .is_validation());
        assert!(UpdateSpec::from_json(&json!({ "table": "t", "groupBy": ["a"], "set": { "a": 1 } }))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_delete_from_json() {
        let compiled = DeleteSpec::from_json(&json!({ "table": "users", "where": { "id": 7 } }))
            .unwrap()
            .compile(Dialect::MySql)
            .unwrap();

        assert_eq!(compiled.sql, "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(compiled.params, vec![SqlValue::Int64(7)]);
    }

    #[test]
    fn test_record_from_json() {
        let record = Record::from_json(&json!({ "name": "Ana", "age": 30, "score": 9.5 })).unwrap();
        let fields: Vec<_> = record.iter().collect();
        assert_eq!(
            fields,
            vec![
                ("name", &SqlValue::from("Ana")),
                ("age", &SqlValue::Int64(30)),
                ("score", &SqlValue::Float64(9.5)),
            ]
        );
    }

    #[test]
    fn test_schema_from_json() {
        let schema = TableSchema::from_json(&json!({
            "id": { "type": "INT", "isnull": false, "isprimarykey": true },
            "author_id": { "type": "INT", "isRefKey": true, "refCol": { "table": "users", "column": "id" } },
            "body": "TEXT",
            "editor_id": { "type": "INT", "refCol": { "table": "users", "column": "id" } }
        }))
        .unwrap();

        let compiled = crate::builders::CreateTable::new("posts", schema)
            .compile(Dialect::MySql)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "CREATE TABLE IF NOT EXISTS `posts` (`id` INT NOT NULL PRIMARY KEY, \
             `author_id` INT, `body` TEXT, `editor_id` INT, \
             FOREIGN KEY (`author_id`) REFERENCES `users`(`id`))"
        );
    }

    #[test]
    fn test_malformed_schema_is_rejected() {
        let cases = [
            json!({}),
            json!({ "id": 42 }),
            json!({ "id": { "isnull": false } }),
            json!({ "id": { "type": "INT", "nullable": false } }),
            json!("id INT"),
        ];
        for case in cases {
            let err = TableSchema::from_json(&case).unwrap_err();
            assert!(err.is_validation(), "expected validation error for {case}");
        }
    }

    #[test]
    fn test_null_tests_and_mysql_operators() {
        let (sql, params) = compile(json!({
            "table": "users",
            "filters": {
                "deleted_at": { "IS": null },
                "verified_at": { "is not": null },
                "manager_id": { "<=>": null },
                "email": { "REGEXP": "@example\\.com$" },
                "active": { "IS": true }
            },
            "having": { "last_login": { "IS NOT": null } },
            "groupBy": ["id"]
        }));
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE `deleted_at` IS NULL AND `verified_at` IS NOT NULL \
             AND `manager_id` <=> ? AND `email` REGEXP ? AND `active` IS TRUE \
             GROUP BY `id` HAVING `last_login` IS NOT NULL"
        );
        assert_eq!(
            params,
            vec![SqlValue::Null, SqlValue::from("@example\\.com$")]
        );
    }

    #[test]
    fn test_is_with_non_null_operand_is_rejected() {
        for operand in [json!(5), json!("x")] {
            let err = QuerySpec::from_json(&json!({
                "table": "users",
                "filters": { "deleted_at": { "IS NOT": operand } }
            }))
            .unwrap_err();
            assert!(err.is_validation());
        }
    }

    #[test]
    fn test_blank_join_table_is_skipped() {
        let (sql, _) = compile(json!({
            "table": "u",
            "joins": [
                { "table": "  ", "on": { "left": "a", "right": "b" } },
                { "table": "o", "on": { "left": " ", "right": "b" } }
            ]
        }));
        assert_eq!(sql, "SELECT * FROM `u`");
    }
}
