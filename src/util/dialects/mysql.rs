use crate::engine::dialect::{Capabilities, DialectKind, SqlDialect};
use crate::structure::{DataType, StandardType};
use crate::util::sql_escape::{is_likely_text, quote_string_with_backslashes};

#[derive(Debug, Clone)]
pub struct MysqlDialect {
    capabilities: Capabilities,
}

pub static MYSQL_DIALECT: MysqlDialect = MysqlDialect {
    capabilities: Capabilities {
        sequences: false,
        tablespaces: false,
        auto_increment: true,
        deferrable_constraints: false,
        clustered_indexes: false,
        cascade_drop: false,
        primary_key_names: false,
        requires_defining_columns_as_null: false,
        create_or_replace_view: true,
        max_container_depth: 1,
        max_identifier_length: Some(64),
    },
};

const MYSQL_RESERVED_WORDS: &[&str] = &[
    "ACCESSIBLE", "DATABASE", "DATABASES", "DIV", "DUAL", "FULLTEXT", "GROUPS", "INTERVAL",
    "KEYS", "LIMIT", "LOCK", "MOD", "RANGE", "RANK", "READ", "REGEXP", "RLIKE", "ROWS",
    "SCHEMA", "SCHEMAS", "SHOW", "SPATIAL", "STRAIGHT_JOIN", "WRITE", "XOR", "ZEROFILL",
];

impl SqlDialect for MysqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        MYSQL_RESERVED_WORDS
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn current_date_time_function(&self) -> &'static str {
        "NOW()"
    }

    fn string_literal(&self, value: &str) -> String {
        quote_string_with_backslashes(value)
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            "''".to_string()
        } else if is_likely_text(bytes) {
            quote_string_with_backslashes(&String::from_utf8_lossy(bytes))
        } else {
            format!("0x{}", hex::encode(bytes))
        }
    }

    fn data_type_sql(&self, data_type: &DataType, _auto_increment: bool) -> String {
        match data_type.standard_type() {
            StandardType::Boolean => "BIT(1)".to_string(),
            StandardType::Text if data_type.name.eq_ignore_ascii_case("clob") => {
                "LONGTEXT".to_string()
            }
            StandardType::Uuid => "CHAR(36)".to_string(),
            _ => data_type.to_string(),
        }
    }
}
