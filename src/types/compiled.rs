use super::{Dialect, SqlValue};

/// SQL text plus its positional parameters, ready to hand to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Incremental writer shared by all statement assemblers.
///
/// Every bound value goes through [`SqlWriter::push_param`], which writes the
/// placeholder and records the value in the same step, so placeholder order and
/// parameter order cannot drift apart.
pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            params: Vec::new(),
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn push_ident(&mut self, ident: &str) {
        self.dialect.write_ident(&mut self.sql, ident);
    }

    pub(crate) fn push_param(&mut self, value: &SqlValue) {
        self.params.push(value.clone());
        self.dialect
            .write_placeholder(&mut self.sql, self.params.len());
    }

    /// Writes `items` separated by `sep`, rendering each with `f`.
    pub(crate) fn push_list<T>(
        &mut self,
        items: &[T],
        sep: &str,
        mut f: impl FnMut(&mut Self, &T),
    ) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            f(self, item);
        }
    }

    pub(crate) fn finish(self) -> CompiledQuery {
        CompiledQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}
