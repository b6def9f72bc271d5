use super::{predicate_methods, require_idents, require_table, write_alias, Record, Statement};
use crate::clauses::{write_joins, write_limit_offset, write_order_by, Join, Order, WhereClause};
use crate::error::{Result, SqlForgeError};
use crate::types::{CompiledQuery, Dialect, SqlValue, SqlWriter};

/// `UPDATE t [AS a] [JOIN ...] SET c = ?, ... [WHERE ...] [ORDER BY ...] [LIMIT n]`
///
/// SET values are bound before the WHERE values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    pub table: String,
    pub alias: Option<String>,
    pub joins: Vec<Join>,
    pub set: Record,
    pub predicates: WhereClause,
    pub order_by: Vec<(String, Order)>,
    pub limit: Option<u64>,
}

impl UpdateSpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set.push(column, value);
        self
    }

    pub fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Statement::compile(self, dialect)
    }
}

predicate_methods!(UpdateSpec);

impl Statement for UpdateSpec {
    fn validate(&self) -> Result<()> {
        require_table(&self.table)?;
        if self.set.is_empty() {
            return Err(SqlForgeError::validation("update requires set values"));
        }
        require_idents("set", self.set.columns())?;
        require_idents("where", self.predicates.columns())?;
        self.predicates.check()?;
        require_idents("orderBy", self.order_by.iter().map(|(c, _)| c.as_str()))
    }

    fn write(&self, w: &mut SqlWriter) {
        w.push_str("UPDATE ");
        w.push_ident(&self.table);
        write_alias(w, self.alias.as_deref());
        write_joins(w, &self.joins);

        w.push_str(" SET ");
        w.push_list(self.set.fields(), ", ", |w, (column, value)| {
            w.push_ident(column);
            w.push_str(" = ");
            w.push_param(value);
        });

        self.predicates.write(w);
        write_order_by(w, &self.order_by);
        write_limit_offset(w, self.limit, None);
    }
}
