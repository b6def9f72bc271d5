use std::str::FromStr;

use crate::error::SqlForgeError;
use crate::types::SqlWriter;

/// Sort direction of an ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = SqlForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            _ => Err(SqlForgeError::validation(format!(
                "order direction must be ASC or DESC, got {s:?}"
            ))),
        }
    }
}

pub(crate) fn write_order_by(w: &mut SqlWriter, order_by: &[(String, Order)]) {
    if order_by.is_empty() {
        return;
    }
    w.push_str(" ORDER BY ");
    w.push_list(order_by, ", ", |w, (column, order)| {
        w.push_ident(column);
        w.push_str(" ");
        w.push_str(order.as_sql());
    });
}

pub(crate) fn write_limit_offset(w: &mut SqlWriter, limit: Option<u64>, offset: Option<u64>) {
    if let Some(limit) = limit {
        w.push_str(" LIMIT ");
        w.push_str(&limit.to_string());
    }
    if let Some(offset) = offset {
        w.push_str(" OFFSET ");
        w.push_str(&offset.to_string());
    }
}
