use super::{require_table, Statement};
use crate::error::{Result, SqlForgeError};
use crate::types::{CompiledQuery, Dialect, SqlWriter};

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub table: String,
    pub column: String,
}

/// Definition of a single column.
///
/// `sql_type` is raw SQL (`VARCHAR(255)`, `INT AUTO_INCREMENT`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub references: Option<Reference>,
}

impl ColumnDef {
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(Reference {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

impl From<&str> for ColumnDef {
    fn from(sql_type: &str) -> Self {
        ColumnDef::new(sql_type)
    }
}

/// Ordered column definitions of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<(String, ColumnDef)>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, def: impl Into<ColumnDef>) -> Self {
        self.push(name, def);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, def: impl Into<ColumnDef>) {
        self.columns.push((name.into(), def.into()));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// `CREATE TABLE IF NOT EXISTS t (<columns>, <foreign keys>)`
///
/// Column clauses come first in schema order; one FOREIGN KEY clause per
/// referencing column follows them, also in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub table: String,
    pub schema: TableSchema,
}

impl CreateTable {
    pub fn new(table: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            table: table.into(),
            schema,
        }
    }

    pub fn compile(&self, dialect: Dialect) -> Result<CompiledQuery> {
        Statement::compile(self, dialect)
    }
}

impl Statement for CreateTable {
    fn validate(&self) -> Result<()> {
        require_table(&self.table)?;
        if self.schema.is_empty() {
            return Err(SqlForgeError::validation(
                "table schema must define at least one column",
            ));
        }
        for (name, def) in &self.schema.columns {
            if name.trim().is_empty() {
                return Err(SqlForgeError::validation("schema contains an empty column name"));
            }
            if def.sql_type.trim().is_empty() {
                return Err(SqlForgeError::validation(format!(
                    "column {name} has no type"
                )));
            }
            if let Some(reference) = &def.references {
                if reference.table.trim().is_empty() || reference.column.trim().is_empty() {
                    return Err(SqlForgeError::validation(format!(
                        "foreign key on column {name} needs a table and a column"
                    )));
                }
            }
        }
        Ok(())
    }

    fn write(&self, w: &mut SqlWriter) {
        let columns = &self.schema.columns;

        w.push_str("CREATE TABLE IF NOT EXISTS ");
        w.push_ident(&self.table);
        w.push_str(" (");
        w.push_list(columns, ", ", |w, (name, def)| {
            w.push_ident(name);
            w.push_str(" ");
            w.push_str(&def.sql_type);
            if def.not_null {
                w.push_str(" NOT NULL");
            }
            if def.primary_key {
                w.push_str(" PRIMARY KEY");
            }
        });

        for (name, reference) in columns
            .iter()
            .filter_map(|(name, def)| def.references.as_ref().map(|r| (name, r)))
        {
            w.push_str(", FOREIGN KEY (");
            w.push_ident(name);
            w.push_str(") REFERENCES ");
            w.push_ident(&reference.table);
            w.push_str("(");
            w.push_ident(&reference.column);
            w.push_str(")");
        }
        w.push_str(")");
    }
}
