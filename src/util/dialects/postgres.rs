use crate::engine::dialect::{Capabilities, DialectKind, SqlDialect};
use crate::structure::{DataType, StandardType};
use crate::util::sql_escape::quote_string;

#[derive(Debug, Clone)]
pub struct PostgresDialect {
    capabilities: Capabilities,
}

pub static POSTGRES_DIALECT: PostgresDialect = PostgresDialect {
    capabilities: Capabilities {
        sequences: true,
        tablespaces: true,
        auto_increment: true,
        deferrable_constraints: true,
        clustered_indexes: false,
        cascade_drop: true,
        primary_key_names: true,
        requires_defining_columns_as_null: false,
        create_or_replace_view: true,
        max_container_depth: 1,
        max_identifier_length: Some(63),
    },
};

const POSTGRES_RESERVED_WORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BOTH", "CAST", "COLLATE", "CURRENT_DATE",
    "CURRENT_ROLE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFERRABLE", "DO",
    "FETCH", "FOR", "INITIALLY", "LATERAL", "LEADING", "LIMIT", "LOCALTIME", "OFFSET", "ONLY",
    "PLACING", "RETURNING", "SESSION_USER", "SOME", "SYMMETRIC", "TRAILING", "VARIADIC",
    "WINDOW",
];

impl SqlDialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        POSTGRES_RESERVED_WORDS
    }

    fn stored_case(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn current_date_time_function(&self) -> &'static str {
        "NOW()"
    }

    fn sequence_next_value(&self, escaped_sequence: &str) -> String {
        format!("nextval({})", quote_string(escaped_sequence))
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", hex::encode(bytes))
    }

    fn float_literal(&self, value: f64) -> String {
        if value.is_nan() {
            "'NaN'::float8".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "'Infinity'::float8".to_string()
            } else {
                "'-Infinity'::float8".to_string()
            }
        } else {
            value.to_string()
        }
    }

    fn date_literal(&self, text: &str) -> String {
        format!("DATE '{}'", text)
    }

    fn time_literal(&self, text: &str) -> String {
        format!("TIME '{}'", text)
    }

    fn timestamp_literal(&self, text: &str) -> String {
        format!("TIMESTAMP '{}'", text)
    }

    fn data_type_sql(&self, data_type: &DataType, _auto_increment: bool) -> String {
        let name = data_type.name.to_ascii_lowercase();
        match (name.as_str(), data_type.standard_type()) {
            ("datetime", _) => "TIMESTAMP".to_string(),
            ("tinyint", _) => "SMALLINT".to_string(),
            ("double", _) => "DOUBLE PRECISION".to_string(),
            ("clob", _) | ("longtext", _) => "TEXT".to_string(),
            (_, StandardType::Blob) => "BYTEA".to_string(),
            _ => data_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(POSTGRES_DIALECT.quote_identifier("users"), "\"users\"");
        assert_eq!(
            POSTGRES_DIALECT.quote_identifier("user\"table"),
            "\"user\"\"table\""
        );
    }

    #[test]
    fn typed_temporal_literals() {
        assert_eq!(
            POSTGRES_DIALECT.to_literal(&SqlValue::Date { y: 2024, m: 3, d: 9 }),
            "DATE '2024-03-09'"
        );
        assert_eq!(
            POSTGRES_DIALECT.to_literal(&SqlValue::Bytes(vec![0xde, 0xad])),
            "'\\xdead'::bytea"
        );
    }

    #[test]
    fn sequence_values_use_nextval() {
        assert_eq!(
            POSTGRES_DIALECT.to_literal(&SqlValue::SequenceNextValue("order_seq".into())),
            "nextval('order_seq')"
        );
    }

    #[test]
    fn maps_vendor_types() {
        assert_eq!(
            POSTGRES_DIALECT.data_type_sql(&DataType::new("datetime"), false),
            "TIMESTAMP"
        );
        assert_eq!(
            POSTGRES_DIALECT.data_type_sql(&DataType::new("blob"), false),
            "BYTEA"
        );
        assert_eq!(
            POSTGRES_DIALECT.data_type_sql(&DataType::parse("varchar(20)"), false),
            "VARCHAR(20)"
        );
    }
}
