mod create_table;
mod delete;
mod insert;
mod presets;
mod record;
mod select;
mod update;

pub use create_table::{ColumnDef, CreateTable, Reference, TableSchema};
pub use delete::DeleteSpec;
pub use insert::InsertSpec;
pub use presets::{GroupQuery, OrderedQuery, Page};
pub use record::Record;
pub use select::QuerySpec;
pub use update::UpdateSpec;

use crate::error::{Result, SqlForgeError};
use crate::types::{CompiledQuery, Dialect, SqlWriter};

/// A statement descriptor that can be checked and rendered to SQL.
pub(crate) trait Statement {
    /// Rejects descriptors that cannot produce a meaningful statement.
    fn validate(&self) -> Result<()>;

    fn write(&self, w: &mut SqlWriter);

    fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        self.validate()?;
        let mut w = SqlWriter::new(dialect);
        self.write(&mut w);
        Ok(w.finish())
    }
}

pub(crate) fn require_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(SqlForgeError::validation("table name is required"));
    }
    Ok(())
}

/// Every identifier we interpolate must at least be non-empty.
pub(crate) fn require_idents<'a>(
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    if names.into_iter().any(|name| name.trim().is_empty()) {
        return Err(SqlForgeError::validation(format!(
            "{what} contains an empty column name"
        )));
    }
    Ok(())
}

/// Builder methods shared by every descriptor that carries a WHERE block,
/// joins and an ORDER BY list.
macro_rules! predicate_methods {
    ($spec:ty) => {
        impl $spec {
            /// Adds `column = value` to the AND-joined conditions.
            pub fn where_eq(
                mut self,
                column: impl Into<String>,
                value: impl Into<$crate::types::SqlValue>,
            ) -> Self {
                self.predicates
                    .all
                    .push($crate::clauses::Condition::eq(column, value));
                self
            }

            /// Adds `column = value` to the parenthesized OR block.
            pub fn or_eq(
                mut self,
                column: impl Into<String>,
                value: impl Into<$crate::types::SqlValue>,
            ) -> Self {
                self.predicates
                    .any
                    .push($crate::clauses::Condition::eq(column, value));
                self
            }

            /// Adds `column <op> value` to the AND-joined filters.
            pub fn filter(
                mut self,
                column: impl Into<String>,
                op: $crate::clauses::Op,
                value: impl Into<$crate::types::SqlValue>,
            ) -> Self {
                self.predicates
                    .filters
                    .push($crate::clauses::Condition::new(column, op, value));
                self
            }

            pub fn join(mut self, join: $crate::clauses::Join) -> Self {
                self.joins.push(join);
                self
            }

            pub fn order_by(mut self, column: impl Into<String>, order: $crate::clauses::Order) -> Self {
                self.order_by.push((column.into(), order));
                self
            }

            pub fn alias(mut self, alias: impl Into<String>) -> Self {
                self.alias = Some(alias.into());
                self
            }

            pub fn limit(mut self, n: u64) -> Self {
                self.limit = Some(n);
                self
            }
        }
    };
}

pub(crate) use predicate_methods;

/// ` AS <alias>` when an alias is set.
pub(crate) fn write_alias(w: &mut SqlWriter, alias: Option<&str>) {
    if let Some(alias) = alias.filter(|a| !a.is_empty()) {
        w.push_str(" AS ");
        w.push_ident(alias);
    }
}
