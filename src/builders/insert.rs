use super::{require_idents, require_table, Record, Statement};
use crate::error::{Result, SqlForgeError};
use crate::types::{CompiledQuery, Dialect, SqlWriter};

/// `INSERT INTO t (c1, c2, ...) VALUES (?, ?, ...)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertSpec {
    pub table: String,
    pub row: Record,
}

impl InsertSpec {
    pub fn new(table: impl Into<String>, row: Record) -> Self {
        Self {
            table: table.into(),
            row,
        }
    }

    pub fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Statement::compile(self, dialect)
    }
}

impl Statement for InsertSpec {
    fn validate(&self) -> Result<()> {
        require_table(&self.table)?;
        if self.row.is_empty() {
            return Err(SqlForgeError::validation(
                "insert requires at least one column value",
            ));
        }
        require_idents("insert row", self.row.columns())
    }

    fn write(&self, w: &mut SqlWriter) {
        let fields = self.row.fields();

        w.push_str("INSERT INTO ");
        w.push_ident(&self.table);
        w.push_str(" (");
        w.push_list(fields, ", ", |w, (column, _)| w.push_ident(column));
        w.push_str(") VALUES (");
        w.push_list(fields, ", ", |w, (_, value)| w.push_param(value));
        w.push_str(")");
    }
}
