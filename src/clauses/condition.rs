use std::fmt;
use std::str::FromStr;

use crate::error::SqlForgeError;
use crate::types::{Dialect, SqlValue, SqlWriter};

/// Comparison operator of a filter or HAVING condition.
///
/// Operators are a closed set: they are spliced into the SQL text, so free-form
/// operator strings are rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    /// `!=`
    NotEq,
    /// `<>`
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
    /// `<=>`, equality that treats two NULLs as equal.
    NullSafeEq,
    Regexp,
    NotRegexp,
    /// `IS NULL` / `IS TRUE` / `IS FALSE`; the operand must be null or a boolean.
    Is,
    IsNot,
}

impl Op {
    /// MySQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::NullSafeEq => "<=>",
            Op::Regexp => "REGEXP",
            Op::NotRegexp => "NOT REGEXP",
            Op::Is => "IS",
            Op::IsNot => "IS NOT",
        }
    }

    fn sql_for(self, dialect: Dialect) -> &'static str {
        match (dialect, self) {
            (Dialect::Postgres, Op::NullSafeEq) => "IS NOT DISTINCT FROM",
            (Dialect::Postgres, Op::Regexp) => "~",
            (Dialect::Postgres, Op::NotRegexp) => "!~",
            _ => self.as_sql(),
        }
    }

    /// `IS` / `IS NOT` take a keyword operand instead of a placeholder.
    pub fn is_keyword_test(self) -> bool {
        matches!(self, Op::Is | Op::IsNot)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Op {
    type Err = SqlForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "=" => Op::Eq,
            "!=" => Op::NotEq,
            "<>" => Op::Ne,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "LIKE" => Op::Like,
            "NOT LIKE" => Op::NotLike,
            "<=>" => Op::NullSafeEq,
            "REGEXP" | "RLIKE" => Op::Regexp,
            "NOT REGEXP" | "NOT RLIKE" => Op::NotRegexp,
            "IS" => Op::Is,
            "IS NOT" => Op::IsNot,
            _ => {
                return Err(SqlForgeError::validation(format!(
                    "unsupported comparison operator {s:?}"
                )))
            }
        };
        Ok(op)
    }
}

/// How the conditions of a clause are joined together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub(crate) fn separator(self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

/// `column <op> ?`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: Op,
    pub value: SqlValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Eq, value)
    }

    /// Rejects `IS` / `IS NOT` with an operand other than null or a boolean.
    pub(crate) fn check(&self) -> Result<(), SqlForgeError> {
        if self.op.is_keyword_test() && !matches!(self.value, SqlValue::Null | SqlValue::Bool(_)) {
            return Err(SqlForgeError::validation(format!(
                "{} on column {} needs a null or boolean operand",
                self.op, self.column
            )));
        }
        Ok(())
    }

    pub(crate) fn write(&self, w: &mut SqlWriter) {
        w.push_ident(&self.column);
        w.push_str(" ");
        w.push_str(self.op.sql_for(w.dialect()));
        w.push_str(" ");
        match (self.op.is_keyword_test(), &self.value) {
            (true, SqlValue::Null) => w.push_str("NULL"),
            (true, SqlValue::Bool(true)) => w.push_str("TRUE"),
            (true, SqlValue::Bool(false)) => w.push_str("FALSE"),
            _ => w.push_param(&self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dialect;

    #[test]
    fn test_parse_operators() {
        assert_eq!(">=".parse::<Op>().unwrap(), Op::Gte);
        assert_eq!("like".parse::<Op>().unwrap(), Op::Like);
        assert_eq!("not   like".parse::<Op>().unwrap(), Op::NotLike);
        assert_eq!("<>".parse::<Op>().unwrap(), Op::Ne);
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let err = "; DROP TABLE users".parse::<Op>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_condition_writes_placeholder() {
        let mut w = SqlWriter::new(Dialect::MySql);
        Condition::new("age", Op::Gt, 18).write(&mut w);
        let compiled = w.finish();

        assert_eq!(compiled.sql, "`age` > ?");
        assert_eq!(compiled.params, vec![SqlValue::Int32(18)]);
    }

    #[test]
    fn test_parse_mysql_specific_operators() {
        assert_eq!("<=>".parse::<Op>().unwrap(), Op::NullSafeEq);
        assert_eq!("regexp".parse::<Op>().unwrap(), Op::Regexp);
        assert_eq!("NOT  REGEXP".parse::<Op>().unwrap(), Op::NotRegexp);
        assert_eq!("is".parse::<Op>().unwrap(), Op::Is);
        assert_eq!("IS NOT".parse::<Op>().unwrap(), Op::IsNot);
    }

    fn render(condition: &Condition, dialect: Dialect) -> (String, Vec<SqlValue>) {
        let mut w = SqlWriter::new(dialect);
        condition.write(&mut w);
        let compiled = w.finish();
        (compiled.sql, compiled.params)
    }

    #[test]
    fn test_is_conditions_bind_nothing() {
        let (sql, params) = render(&Condition::new("deleted_at", Op::Is, SqlValue::Null), Dialect::MySql);
        assert_eq!(sql, "`deleted_at` IS NULL");
        assert!(params.is_empty());

        let (sql, params) = render(&Condition::new("deleted_at", Op::IsNot, SqlValue::Null), Dialect::MySql);
        assert_eq!(sql, "`deleted_at` IS NOT NULL");
        assert!(params.is_empty());

        let (sql, _) = render(&Condition::new("active", Op::Is, true), Dialect::MySql);
        assert_eq!(sql, "`active` IS TRUE");
        let (sql, _) = render(&Condition::new("active", Op::IsNot, false), Dialect::Postgres);
        assert_eq!(sql, "\"active\" IS NOT FALSE");
    }

    #[test]
    fn test_is_requires_null_or_boolean() {
        assert!(Condition::new("deleted_at", Op::Is, SqlValue::Null).check().is_ok());
        assert!(Condition::new("active", Op::IsNot, true).check().is_ok());
        let err = Condition::new("age", Op::Is, 5).check().unwrap_err();
        assert!(err.is_validation());
        assert!(Condition::new("age", Op::Gt, 5).check().is_ok());
    }

    #[test]
    fn test_operators_follow_dialect() {
        let (sql, params) = render(&Condition::new("a", Op::NullSafeEq, SqlValue::Null), Dialect::MySql);
        assert_eq!(sql, "`a` <=> ?");
        assert_eq!(params, vec![SqlValue::Null]);

        let (sql, _) = render(&Condition::new("a", Op::NullSafeEq, 1), Dialect::Postgres);
        assert_eq!(sql, "\"a\" IS NOT DISTINCT FROM $1");

        let (sql, _) = render(&Condition::new("name", Op::Regexp, "^A"), Dialect::MySql);
        assert_eq!(sql, "`name` REGEXP ?");
        let (sql, _) = render(&Condition::new("name", Op::NotRegexp, "^A"), Dialect::Postgres);
        assert_eq!(sql, "\"name\" !~ $1");
    }
}
