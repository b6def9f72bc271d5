//! Fixed-shape selectors kept for callers of the older single-purpose API.
//!
//! Each preset only fills in a [`QuerySpec`]; clause rendering lives in the
//! general SELECT assembler.

use super::{QuerySpec, Record};
use crate::clauses::{Combinator, Condition, Op, Order};
use crate::error::{Result, SqlForgeError};

/// Optional LIMIT / OFFSET of a preset.
///
/// A zero limit or offset counts as unset, so `Page::new().limit(0)` selects
/// every row. Use [`QuerySpec::limit`] directly for a literal `LIMIT 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    fn apply(self, mut spec: QuerySpec) -> QuerySpec {
        spec.limit = self.limit.filter(|n| *n > 0);
        spec.offset = self.offset.filter(|n| *n > 0);
        spec
    }
}

/// Puts equality conditions into the AND list or the OR block.
fn add_equalities(spec: &mut QuerySpec, conditions: &Record, combinator: Combinator) {
    let target = match combinator {
        Combinator::And => &mut spec.predicates.all,
        Combinator::Or => &mut spec.predicates.any,
    };
    target.extend(
        conditions
            .iter()
            .map(|(column, value)| Condition::eq(column, value.clone())),
    );
}

impl QuerySpec {
    /// `SELECT * FROM t`
    pub fn all(table: impl Into<String>, page: Page) -> Self {
        page.apply(QuerySpec::new(table))
    }

    /// `SELECT c1, c2 FROM t`; an empty column list selects `*`.
    pub fn only_columns<I, S>(table: impl Into<String>, columns: I, page: Page) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        page.apply(QuerySpec::new(table).columns(columns))
    }

    /// `SELECT * FROM t WHERE a = ? AND b = ?`
    pub fn by_where(table: impl Into<String>, conditions: &Record, page: Page) -> Self {
        let mut spec = QuerySpec::new(table);
        add_equalities(&mut spec, conditions, Combinator::And);
        page.apply(spec)
    }

    /// `SELECT * FROM t WHERE (a = ? OR b = ?)`
    pub fn by_or(table: impl Into<String>, conditions: &Record, page: Page) -> Self {
        let mut spec = QuerySpec::new(table);
        add_equalities(&mut spec, conditions, Combinator::Or);
        page.apply(spec)
    }
}

/// Grouped selection with equality WHERE and HAVING conditions.
///
/// The two combinators cover all four AND/OR pairings of the older
/// `findGroup*` functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupQuery {
    pub table: String,
    pub group_by: Vec<String>,
    /// Raw select items, e.g. `region`, `COUNT(*) AS n`; empty selects `*`.
    pub select: Vec<String>,
    pub where_: Record,
    pub where_combinator: Combinator,
    pub having: Record,
    pub having_combinator: Combinator,
    pub page: Page,
}

impl GroupQuery {
    pub fn new<I, S>(table: impl Into<String>, group_by: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            group_by: group_by.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn select<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn where_(mut self, conditions: Record, combinator: Combinator) -> Self {
        self.where_ = conditions;
        self.where_combinator = combinator;
        self
    }

    pub fn having(mut self, conditions: Record, combinator: Combinator) -> Self {
        self.having = conditions;
        self.having_combinator = combinator;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    pub fn to_spec(&self) -> Result<QuerySpec> {
        if self.table.trim().is_empty() || self.group_by.is_empty() {
            return Err(SqlForgeError::validation(
                "table name and group by columns are required",
            ));
        }

        let mut spec = QuerySpec::new(self.table.clone()).group_by(self.group_by.iter().cloned());
        spec.expressions = self.select.clone();
        add_equalities(&mut spec, &self.where_, self.where_combinator);
        spec.having = self
            .having
            .iter()
            .map(|(column, value)| Condition::new(column, Op::Eq, value.clone()))
            .collect();
        spec.having_combinator = self.having_combinator;
        Ok(self.page.apply(spec))
    }
}

/// Selection ordered by one optional column.
///
/// `ascending` / `descending` pick the direction used when none is given,
/// matching the older `findWithOrderASC*` / `findWithOrderDESC*` functions.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedQuery {
    pub table: String,
    pub where_: Record,
    pub where_combinator: Combinator,
    pub order_column: Option<String>,
    pub direction: Option<Order>,
    pub default_direction: Order,
    pub page: Page,
}

impl OrderedQuery {
    fn with_default(table: impl Into<String>, default_direction: Order) -> Self {
        Self {
            table: table.into(),
            where_: Record::new(),
            where_combinator: Combinator::And,
            order_column: None,
            direction: None,
            default_direction,
            page: Page::default(),
        }
    }

    pub fn ascending(table: impl Into<String>) -> Self {
        Self::with_default(table, Order::Asc)
    }

    pub fn descending(table: impl Into<String>) -> Self {
        Self::with_default(table, Order::Desc)
    }

    pub fn where_(mut self, conditions: Record, combinator: Combinator) -> Self {
        self.where_ = conditions;
        self.where_combinator = combinator;
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_column = Some(column.into());
        self
    }

    /// Overrides the preset's default direction.
    pub fn direction(mut self, order: Order) -> Self {
        self.direction = Some(order);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    pub fn to_spec(&self) -> Result<QuerySpec> {
        if self.table.trim().is_empty() {
            return Err(SqlForgeError::validation("table name is required"));
        }

        let mut spec = QuerySpec::new(self.table.clone());
        add_equalities(&mut spec, &self.where_, self.where_combinator);
        if let Some(column) = &self.order_column {
            spec.order_by
                .push((column.clone(), self.direction.unwrap_or(self.default_direction)));
        }
        Ok(self.page.apply(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dialect, SqlValue};

    fn sql(spec: &QuerySpec) -> String {
        spec.compile(Dialect::MySql).unwrap().sql
    }

    #[test]
    fn test_all_and_columns() {
        assert_eq!(
            sql(&QuerySpec::all("users", Page::new().limit(5).offset(10))),
            "SELECT * FROM `users` LIMIT 5 OFFSET 10"
        );
        assert_eq!(
            sql(&QuerySpec::only_columns("users", ["id", "name"], Page::new())),
            "SELECT `id`, `name` FROM `users`"
        );
        assert_eq!(
            sql(&QuerySpec::only_columns("users", Vec::<String>::new(), Page::new())),
            "SELECT * FROM `users`"
        );
    }

    #[test]
    fn test_zero_page_values_are_unset() {
        assert_eq!(
            sql(&QuerySpec::all("users", Page::new().limit(0).offset(0))),
            "SELECT * FROM `users`"
        );
        assert_eq!(
            sql(&QuerySpec::all("users", Page::new().limit(20).offset(0))),
            "SELECT * FROM `users` LIMIT 20"
        );
        assert_eq!(
            sql(&QuerySpec::new("users").limit(0)),
            "SELECT * FROM `users` LIMIT 0"
        );
    }

    #[test]
    fn test_by_where_and_by_or() {
        let conditions = Record::new().field("a", 1).field("b", 2);
        assert_eq!(
            sql(&QuerySpec::by_where("t", &conditions, Page::new())),
            "SELECT * FROM `t` WHERE `a` = ? AND `b` = ?"
        );
        assert_eq!(
            sql(&QuerySpec::by_or("t", &conditions, Page::new())),
            "SELECT * FROM `t` WHERE (`a` = ? OR `b` = ?)"
        );
        assert_eq!(
            sql(&QuerySpec::by_where("t", &Record::new(), Page::new().limit(3))),
            "SELECT * FROM `t` LIMIT 3"
        );
    }

    #[test]
    fn test_group_query_or_where_and_having() {
        let spec = GroupQuery::new("sales", ["region"])
            .select(["region", "SUM(amount) AS total"])
            .where_(
                Record::new().field("year", 2023).field("year", 2024),
                Combinator::Or,
            )
            .having(Record::new().field("region", "EU"), Combinator::And)
            .to_spec()
            .unwrap();

        let compiled = spec.compile(Dialect::MySql).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT region, SUM(amount) AS total FROM `sales` WHERE (`year` = ? OR `year` = ?) \
             GROUP BY `region` HAVING `region` = ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                SqlValue::Int32(2023),
                SqlValue::Int32(2024),
                SqlValue::from("EU")
            ]
        );
    }

    #[test]
    fn test_group_query_requires_group_by() {
        let err = GroupQuery::new("sales", Vec::<String>::new())
            .to_spec()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_ordered_query_defaults() {
        let asc = OrderedQuery::ascending("users")
            .order_by("name")
            .page(Page::new().limit(10))
            .to_spec()
            .unwrap();
        assert_eq!(sql(&asc), "SELECT * FROM `users` ORDER BY `name` ASC LIMIT 10");

        let desc = OrderedQuery::descending("users")
            .where_(Record::new().field("role", "admin"), Combinator::Or)
            .order_by("created_at")
            .to_spec()
            .unwrap();
        assert_eq!(
            sql(&desc),
            "SELECT * FROM `users` WHERE (`role` = ?) ORDER BY `created_at` DESC"
        );

        let overridden = OrderedQuery::descending("users")
            .order_by("id")
            .direction(Order::Asc)
            .to_spec()
            .unwrap();
        assert_eq!(sql(&overridden), "SELECT * FROM `users` ORDER BY `id` ASC");
    }

    #[test]
    fn test_ordered_query_without_order_column() {
        let spec = OrderedQuery::ascending("users").to_spec().unwrap();
        assert_eq!(sql(&spec), "SELECT * FROM `users`");
    }
}
