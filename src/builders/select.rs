use super::{predicate_methods, require_idents, require_table, write_alias, Statement};
use crate::clauses::{
    write_joins, write_limit_offset, write_order_by, Combinator, Condition, Join, Op, Order,
    WhereClause,
};
use crate::error::Result;
use crate::types::{CompiledQuery, Dialect, SqlValue, SqlWriter};

/// Description of a SELECT statement.
///
/// Clauses are always emitted in the same order:
/// `[WITH] SELECT [DISTINCT] ... FROM t [AS a] [JOIN ...] [WHERE ...] [GROUP BY ...]
/// [HAVING ...] [WINDOW ...] [ORDER BY ...] [LIMIT n] [OFFSET n]`.
///
/// `columns`, `group_by`, `order_by` and join columns are quoted identifiers.
/// `functions`, `expressions`, subqueries, the CTE and the window text are raw SQL
/// and must come from trusted code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub table: String,
    pub alias: Option<String>,
    /// CTE body, emitted as `WITH <text> ` before SELECT.
    pub with_clause: Option<String>,
    pub distinct: bool,
    pub columns: Vec<String>,
    pub functions: Vec<String>,
    pub expressions: Vec<String>,
    /// `(alias, subquery)` pairs, emitted as `(<subquery>) AS <alias>`.
    pub subqueries: Vec<(String, String)>,
    pub joins: Vec<Join>,
    pub predicates: WhereClause,
    pub group_by: Vec<String>,
    pub having: Vec<Condition>,
    pub having_combinator: Combinator,
    /// Named window definitions, emitted as `WINDOW <text>`.
    pub window: Option<String>,
    pub order_by: Vec<(String, Order)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QuerySpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn with_cte(mut self, cte: impl Into<String>) -> Self {
        self.with_clause = Some(cte.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Raw aggregate or window function call, e.g. `COUNT(*) AS total`.
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.functions.push(function.into());
        self
    }

    /// Raw select expression, e.g. `price * qty AS amount`.
    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expressions.push(expression.into());
        self
    }

    pub fn subquery(mut self, alias: impl Into<String>, sql: impl Into<String>) -> Self {
        self.subqueries.push((alias.into(), sql.into()));
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn having(
        mut self,
        column: impl Into<String>,
        op: Op,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.having.push(Condition::new(column, op, value));
        self
    }

    pub fn having_combinator(mut self, combinator: Combinator) -> Self {
        self.having_combinator = combinator;
        self
    }

    pub fn window(mut self, window: impl Into<String>) -> Self {
        self.window = Some(window.into());
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Render the statement for `dialect`.
    pub fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Statement::compile(self, dialect)
    }

    fn has_select_items(&self) -> bool {
        !(self.columns.is_empty()
            && self.functions.is_empty()
            && self.expressions.is_empty()
            && self.subqueries.is_empty())
    }

    fn write_select_list(&self, w: &mut SqlWriter) {
        if !self.has_select_items() {
            w.push_str("*");
            return;
        }

        let mut first = true;
        let mut sep = |w: &mut SqlWriter| {
            if !first {
                w.push_str(", ");
            }
            first = false;
        };

        for column in &self.columns {
            sep(w);
            w.push_ident(column);
        }
        for raw in self.functions.iter().chain(&self.expressions) {
            sep(w);
            w.push_str(raw);
        }
        for (alias, sql) in &self.subqueries {
            sep(w);
            w.push_str("(");
            w.push_str(sql);
            w.push_str(") AS ");
            w.push_ident(alias);
        }
    }
}

predicate_methods!(QuerySpec);

impl Statement for QuerySpec {
    fn validate(&self) -> Result<()> {
        require_table(&self.table)?;
        require_idents("columns", self.columns.iter().map(String::as_str))?;
        require_idents(
            "subqueries",
            self.subqueries.iter().map(|(alias, _)| alias.as_str()),
        )?;
        require_idents("where", self.predicates.columns())?;
        self.predicates.check()?;
        require_idents("groupBy", self.group_by.iter().map(String::as_str))?;
        require_idents("having", self.having.iter().map(|c| c.column.as_str()))?;
        self.having.iter().try_for_each(Condition::check)?;
        require_idents("orderBy", self.order_by.iter().map(|(c, _)| c.as_str()))
    }

    fn write(&self, w: &mut SqlWriter) {
        if let Some(cte) = self.with_clause.as_deref().filter(|c| !c.is_empty()) {
            w.push_str("WITH ");
            w.push_str(cte);
            w.push_str(" ");
        }

        w.push_str("SELECT ");
        if self.distinct {
            w.push_str("DISTINCT ");
        }
        self.write_select_list(w);

        w.push_str(" FROM ");
        w.push_ident(&self.table);
        write_alias(w, self.alias.as_deref());

        write_joins(w, &self.joins);
        self.predicates.write(w);

        if !self.group_by.is_empty() {
            w.push_str(" GROUP BY ");
            w.push_list(&self.group_by, ", ", |w, column| w.push_ident(column));
        }

        if !self.having.is_empty() {
            w.push_str(" HAVING ");
            w.push_list(&self.having, self.having_combinator.separator(), |w, c| {
                c.write(w)
            });
        }

        if let Some(window) = self.window.as_deref().filter(|t| !t.is_empty()) {
            w.push_str(" WINDOW ");
            w.push_str(window);
        }

        write_order_by(w, &self.order_by);
        write_limit_offset(w, self.limit, self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql(spec: &QuerySpec) -> CompiledQuery {
        spec.compile(Dialect::MySql).unwrap()
    }

    #[test]
    fn test_build_simple_select() {
        let compiled = mysql(&QuerySpec::new("users"));
        assert_eq!(compiled.sql, "SELECT * FROM `users`");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_build_select_with_where() {
        let compiled = mysql(&QuerySpec::new("users").where_eq("a", 1).where_eq("b", 2));

        assert_eq!(compiled.sql, "SELECT * FROM `users` WHERE `a` = ? AND `b` = ?");
        assert_eq!(compiled.params, vec![SqlValue::Int32(1), SqlValue::Int32(2)]);
    }

    #[test]
    fn test_build_select_with_where_and_filter() {
        let compiled = mysql(
            &QuerySpec::new("users")
                .where_eq("a", 1)
                .filter("c", Op::Gt, 5),
        );

        assert_eq!(compiled.sql, "SELECT * FROM `users` WHERE `a` = ? AND `c` > ?");
        assert_eq!(compiled.params, vec![SqlValue::Int32(1), SqlValue::Int32(5)]);
    }

    #[test]
    fn test_parameter_order_across_clauses() {
        let compiled = mysql(
            &QuerySpec::new("orders")
                .or_eq("status", "open")
                .having("total", Op::Gte, 100)
                .filter("region", Op::Eq, "EU")
                .where_eq("shop_id", 3)
                .group_by(["customer_id"]),
        );

        assert_eq!(
            compiled.sql,
            "SELECT * FROM `orders` WHERE `shop_id` = ? AND `region` = ? AND (`status` = ?) \
             GROUP BY `customer_id` HAVING `total` >= ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                SqlValue::Int32(3),
                SqlValue::from("EU"),
                SqlValue::from("open"),
                SqlValue::Int32(100),
            ]
        );
    }

    #[test]
    fn test_build_full_select() {
        let spec = QuerySpec::new("users")
            .with_cte("recent AS (SELECT id FROM logins)")
            .distinct()
            .alias("u")
            .columns(["u.id", "u.name"])
            .function("COUNT(o.id) AS orders")
            .expression("u.score * 2 AS doubled")
            .subquery("last_login", "SELECT MAX(at) FROM logins")
            .join(Join::left("orders").on("u.id", "orders.user_id"))
            .where_eq("u.active", true)
            .group_by(["u.id", "u.name"])
            .having("orders", Op::Gt, 1)
            .window("w AS (PARTITION BY u.team_id)")
            .order_by("u.name", Order::Desc)
            .limit(10)
            .offset(20);

        let compiled = mysql(&spec);
        assert_eq!(
            compiled.sql,
            "WITH recent AS (SELECT id FROM logins) SELECT DISTINCT `u`.`id`, `u`.`name`, \
             COUNT(o.id) AS orders, u.score * 2 AS doubled, \
             (SELECT MAX(at) FROM logins) AS `last_login` FROM `users` AS `u` \
             LEFT JOIN `orders` ON `u`.`id` = `orders`.`user_id` WHERE `u`.`active` = ? \
             GROUP BY `u`.`id`, `u`.`name` HAVING `orders` > ? \
             WINDOW w AS (PARTITION BY u.team_id) ORDER BY `u`.`name` DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(compiled.params, vec![SqlValue::Bool(true), SqlValue::Int32(1)]);
    }

    #[test]
    fn test_having_or_combinator() {
        let compiled = mysql(
            &QuerySpec::new("sales")
                .group_by(["region"])
                .having("region", Op::Eq, "EU")
                .having("region", Op::Eq, "US")
                .having_combinator(Combinator::Or),
        );
        assert!(compiled
            .sql
            .ends_with("HAVING `region` = ? OR `region` = ?"));
    }

    #[test]
    fn test_postgres_numbering() {
        let compiled = QuerySpec::new("users")
            .where_eq("a", 1)
            .or_eq("b", 2)
            .or_eq("c", 3)
            .compile(Dialect::Postgres)
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT * FROM \"users\" WHERE \"a\" = $1 AND (\"b\" = $2 OR \"c\" = $3)"
        );
    }

    #[test]
    fn test_missing_table_is_rejected() {
        let err = QuerySpec::default().compile(Dialect::MySql).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_empty_column_name_is_rejected() {
        let err = QuerySpec::new("users")
            .where_eq("", 1)
            .compile(Dialect::MySql)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let spec = QuerySpec::new("t")
            .where_eq("x", 1)
            .filter("y", Op::Like, "a%")
            .or_eq("z", 2);
        assert_eq!(mysql(&spec), mysql(&spec));
    }
}
