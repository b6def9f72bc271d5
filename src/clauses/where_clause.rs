use super::Condition;
use crate::error::Result;
use crate::types::SqlWriter;

/// The predicate block shared by SELECT, UPDATE and DELETE.
///
/// Renders as
/// `WHERE <all AND-joined> AND <filters AND-joined> AND (<any OR-joined>)`,
/// with each part omitted when empty. Parameters are bound in that order:
/// `all`, then `filters`, then `any`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Equality conditions joined with AND (`where`).
    pub all: Vec<Condition>,
    /// Operator conditions joined with AND (`filters`).
    pub filters: Vec<Condition>,
    /// Equality conditions joined with OR, parenthesized (`or`).
    pub any: Vec<Condition>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.filters.is_empty() && self.any.is_empty()
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.all
            .iter()
            .chain(&self.filters)
            .chain(&self.any)
            .map(|c| c.column.as_str())
    }

    pub(crate) fn check(&self) -> Result<()> {
        self.all
            .iter()
            .chain(&self.filters)
            .chain(&self.any)
            .try_for_each(Condition::check)
    }

    pub(crate) fn write(&self, w: &mut SqlWriter) {
        let has_and_block = !self.all.is_empty() || !self.filters.is_empty();

        if has_and_block {
            w.push_str(" WHERE ");
            w.push_list(&self.all, " AND ", |w, c| c.write(w));
            if !self.filters.is_empty() {
                if !self.all.is_empty() {
                    w.push_str(" AND ");
                }
                w.push_list(&self.filters, " AND ", |w, c| c.write(w));
            }
        }

        if !self.any.is_empty() {
            w.push_str(if has_and_block { " AND (" } else { " WHERE (" });
            w.push_list(&self.any, " OR ", |w, c| c.write(w));
            w.push_str(")");
        }
    }
}
