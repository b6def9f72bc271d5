use super::{predicate_methods, require_idents, require_table, write_alias, Statement};
use crate::clauses::{write_joins, write_limit_offset, write_order_by, Join, Order, WhereClause};
use crate::error::Result;
use crate::types::{CompiledQuery, Dialect, SqlWriter};

/// `DELETE FROM t [AS a] [JOIN ...] [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET n]`
///
/// An empty predicate block deletes every row; nothing here guards against that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteSpec {
    pub table: String,
    pub alias: Option<String>,
    pub joins: Vec<Join>,
    pub predicates: WhereClause,
    pub order_by: Vec<(String, Order)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl DeleteSpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Statement::compile(self, dialect)
    }
}

predicate_methods!(DeleteSpec);

impl Statement for DeleteSpec {
    fn validate(&self) -> Result<()> {
        require_table(&self.table)?;
        require_idents("where", self.predicates.columns())?;
        self.predicates.check()?;
        require_idents("orderBy", self.order_by.iter().map(|(c, _)| c.as_str()))
    }

    fn write(&self, w: &mut SqlWriter) {
        w.push_str("DELETE FROM ");
        w.push_ident(&self.table);
        write_alias(w, self.alias.as_deref());
        write_joins(w, &self.joins);
        self.predicates.write(w);
        write_order_by(w, &self.order_by);
        write_limit_offset(w, self.limit, self.offset);
    }
}
