/// What a result column is decoded as before it is rendered as text.
///
/// Each driver maps its own column types onto these; `Other` falls through to
/// the driver's generic decode ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellKind {
    Signed,
    Unsigned,
    Float,
    Decimal,
    Bool,
    Date,
    Time,
    DateTime,
    DateTimeTz,
    Json,
    Text,
    Bytes,
    Other,
}

/// NULL renders as the literal `NULL`.
pub(crate) fn or_null<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}

pub(crate) fn bytes_or_null(value: Option<Vec<u8>>) -> String {
    value.map_or_else(
        || "NULL".to_string(),
        |bytes| String::from_utf8_lossy(&bytes).into_owned(),
    )
}
