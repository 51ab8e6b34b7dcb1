use crate::engine::value::SqlValue;
use crate::structure::DataType;
use crate::util::sql_escape::{format_date, format_f64, format_time, format_timestamp, quote_string};
use std::fmt;

/// Family a dialect belongs to; dialect-specific logic gates on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialectKind {
    MySql,
    Postgres,
    Sqlite,
    Generic,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DialectKind::MySql => "mysql",
            DialectKind::Postgres => "postgresql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::Generic => "generic",
        })
    }
}

/// Static feature table of a target database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub sequences: bool,
    pub tablespaces: bool,
    pub auto_increment: bool,
    pub deferrable_constraints: bool,
    pub clustered_indexes: bool,
    pub cascade_drop: bool,
    pub primary_key_names: bool,
    pub requires_defining_columns_as_null: bool,
    pub create_or_replace_view: bool,
    /// Container levels above a relation: 0 none, 1 schema, 2 catalog + schema.
    pub max_container_depth: usize,
    pub max_identifier_length: Option<usize>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            sequences: true,
            tablespaces: false,
            auto_increment: true,
            deferrable_constraints: true,
            clustered_indexes: false,
            cascade_drop: true,
            primary_key_names: true,
            requires_defining_columns_as_null: false,
            create_or_replace_view: true,
            max_container_depth: 1,
            max_identifier_length: None,
        }
    }
}

impl Capabilities {
    pub fn supports_catalogs(&self) -> bool {
        self.max_container_depth >= 2
    }

    pub fn supports_schemas(&self) -> bool {
        self.max_container_depth >= 1
    }
}

/// Words every dialect treats as reserved.
pub const COMMON_RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "AS", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN", "CONSTRAINT",
    "CREATE", "CROSS", "DEFAULT", "DELETE", "DISTINCT", "DROP", "ELSE", "END", "EXISTS",
    "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTO",
    "IS", "JOIN", "KEY", "LEFT", "LIKE", "NOT", "NULL", "ON", "OR", "ORDER", "PRIMARY",
    "REFERENCES", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO", "UNION", "UNIQUE",
    "UPDATE", "USER", "VALUES", "WHEN", "WHERE", "WITH",
];

/// SQL dialect: capability flags plus identifier and literal formatting.
pub trait SqlDialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Dialect display name (used in logs and messages).
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> &Capabilities;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quote an identifier (table/column name).
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.quote_chars();
        let doubled: String = [close, close].iter().collect();
        format!("{}{}{}", open, name.replace(close, &doubled), close)
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        COMMON_RESERVED_WORDS
    }

    /// Form the catalog stores an unquoted identifier in.
    fn stored_case(&self, name: &str) -> String {
        name.to_string()
    }

    fn is_reserved_word(&self, word: &str) -> bool {
        COMMON_RESERVED_WORDS
            .iter()
            .chain(self.reserved_words().iter())
            .any(|w| w.eq_ignore_ascii_case(word))
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn current_date_time_function(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    /// Expression returning the next value of an already escaped sequence name.
    fn sequence_next_value(&self, escaped_sequence: &str) -> String {
        format!("NEXT VALUE FOR {}", escaped_sequence)
    }

    fn string_literal(&self, value: &str) -> String {
        quote_string(value)
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode(bytes))
    }

    fn float_literal(&self, value: f64) -> String {
        format_f64(value)
    }

    fn date_literal(&self, text: &str) -> String {
        format!("'{}'", text)
    }

    fn time_literal(&self, text: &str) -> String {
        format!("'{}'", text)
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("'{}'", text)
    }

    /// Convert a neutral `SqlValue` into a literal for this dialect.
    fn to_literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(v) => self.boolean_literal(*v).to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) => self.float_literal(*v),
            SqlValue::Decimal(v) => v.clone(),
            SqlValue::String(v) => self.string_literal(v),
            SqlValue::Bytes(bytes) => self.bytes_literal(bytes),
            SqlValue::Date { y, m, d } => self.date_literal(&format_date(*y, *m, *d)),
            SqlValue::Time { neg, h, m, s, us } => {
                self.time_literal(&format_time(*neg, *h, *m, *s, *us))
            }
            SqlValue::Timestamp {
                y,
                m,
                d,
                hh,
                mm,
                ss,
                us,
            } => self.timestamp_literal(&format_timestamp(*y, *m, *d, *hh, *mm, *ss, *us)),
            SqlValue::Function(function) => function.clone(),
            SqlValue::SequenceNextValue(sequence) => self.sequence_next_value(sequence),
        }
    }

    /// Column type as written in DDL.
    fn data_type_sql(&self, data_type: &DataType, _auto_increment: bool) -> String {
        data_type.to_string()
    }

    /// Build an INSERT ... VALUES statement from escaped names and raw values.
    fn insert_values_sql(&self, table: &str, columns: &[String], rows: &[Vec<SqlValue>]) -> String {
        let mut sql = String::new();
        sql.push_str("INSERT INTO ");
        sql.push_str(table);
        sql.push_str(" (");
        sql.push_str(&columns.join(", "));
        sql.push_str(") VALUES ");

        for (row_idx, row) in rows.iter().enumerate() {
            if row_idx > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (col_idx, value) in row.iter().enumerate() {
                if col_idx > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.to_literal(value));
            }
            sql.push(')');
        }
        sql
    }
}

/// True when `name` can be written without quotes.
pub fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::dialects::generic::GenericDialect;

    #[test]
    fn simple_identifiers() {
        assert!(is_simple_identifier("user_id"));
        assert!(!is_simple_identifier("1abc"));
        assert!(!is_simple_identifier("my table"));
        assert!(!is_simple_identifier(""));
    }

    #[test]
    fn default_literals() {
        let dialect = GenericDialect::default();
        assert_eq!(dialect.to_literal(&SqlValue::Bool(true)), "TRUE");
        assert_eq!(
            dialect.to_literal(&SqlValue::Function("CURRENT_TIMESTAMP".into())),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(
            dialect.to_literal(&SqlValue::SequenceNextValue("seq_a".into())),
            "NEXT VALUE FOR seq_a"
        );
        assert_eq!(dialect.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn insert_rows() {
        let dialect = GenericDialect::default();
        let sql = dialect.insert_values_sql(
            "t",
            &["a".to_string(), "b".to_string()],
            &[
                vec![SqlValue::Int(1), SqlValue::String("x".into())],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
        );
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (1, 'x'), (2, NULL)");
    }
}
