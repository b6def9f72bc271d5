use std::str::FromStr;

use tracing::debug;

use crate::error::SqlForgeError;
use crate::types::SqlWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

impl FromStr for JoinKind {
    type Err = SqlForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "INNER" => Ok(JoinKind::Inner),
            "LEFT" | "LEFT OUTER" => Ok(JoinKind::Left),
            "RIGHT" | "RIGHT OUTER" => Ok(JoinKind::Right),
            _ => Err(SqlForgeError::validation(format!(
                "unsupported join type {s:?}"
            ))),
        }
    }
}

/// Equality columns of a join's ON clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOn {
    pub left: String,
    pub right: String,
}

/// `<kind> JOIN <table> ON <left> = <right>`
///
/// A join without a table or without both ON columns is dropped from the
/// statement rather than reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: Option<JoinOn>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            on: None,
        }
    }

    pub fn inner(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, table)
    }

    pub fn left(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, table)
    }

    pub fn right(table: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, table)
    }

    pub fn on(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.on = Some(JoinOn {
            left: left.into(),
            right: right.into(),
        });
        self
    }

    fn complete_on(&self) -> Option<&JoinOn> {
        if self.table.trim().is_empty() {
            return None;
        }
        self.on
            .as_ref()
            .filter(|on| !on.left.trim().is_empty() && !on.right.trim().is_empty())
    }
}

pub(crate) fn write_joins(w: &mut SqlWriter, joins: &[Join]) {
    for join in joins {
        let Some(on) = join.complete_on() else {
            debug!(table = %join.table, "skipping join without table or ON columns");
            continue;
        };
        w.push_str(" ");
        w.push_str(join.kind.as_sql());
        w.push_str(" JOIN ");
        w.push_ident(&join.table);
        w.push_str(" ON ");
        w.push_ident(&on.left);
        w.push_str(" = ");
        w.push_ident(&on.right);
    }
}
