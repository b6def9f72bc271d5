mod condition;
mod join;
mod order;
mod where_clause;

pub(crate) use join::write_joins;
pub(crate) use order::{write_limit_offset, write_order_by};

pub use condition::{Combinator, Condition, Op};
pub use join::{Join, JoinKind, JoinOn};
pub use order::Order;
pub use where_clause::WhereClause;
