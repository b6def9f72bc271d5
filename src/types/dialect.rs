use serde::Deserialize;

/// The SQL flavour a statement is rendered for.
///
/// Identifiers are always quoted so reserved words (`order`, `group`, ...) work as
/// table and column names. Quoting does not make caller-controlled identifiers safe:
/// only values are bound as parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB: `` `ident` `` and `?` placeholders.
    #[default]
    #[serde(alias = "mariadb")]
    MySql,
    /// PostgreSQL: `"ident"` and `$n` placeholders.
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres => '"',
        }
    }

    /// Appends a quoted identifier to `out`.
    ///
    /// Dotted names are quoted per segment, and a `*` segment is left bare so
    /// `*` and `u.*` keep their meaning.
    pub fn write_ident(self, out: &mut String, ident: &str) {
        let quote = self.quote_char();
        for (i, segment) in ident.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            if segment == "*" {
                out.push('*');
                continue;
            }
            out.push(quote);
            for ch in segment.chars() {
                if ch == quote {
                    out.push(quote);
                }
                out.push(ch);
            }
            out.push(quote);
        }
    }

    pub fn quote_ident(self, ident: &str) -> String {
        let mut out = String::with_capacity(ident.len() + 2);
        self.write_ident(&mut out, ident);
        out
    }

    /// Appends the placeholder for the `index`-th bound parameter (1-based).
    pub fn write_placeholder(self, out: &mut String, index: usize) {
        match self {
            Dialect::MySql => out.push('?'),
            Dialect::Postgres => {
                out.push('$');
                out.push_str(&index.to_string());
            }
        }
    }
}
