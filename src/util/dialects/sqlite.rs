use crate::engine::dialect::{Capabilities, DialectKind, SqlDialect};
use crate::structure::DataType;

#[derive(Debug, Clone)]
pub struct SqliteDialect {
    capabilities: Capabilities,
}

pub static SQLITE_DIALECT: SqliteDialect = SqliteDialect {
    capabilities: Capabilities {
        sequences: false,
        tablespaces: false,
        auto_increment: false,
        deferrable_constraints: true,
        clustered_indexes: false,
        cascade_drop: false,
        primary_key_names: true,
        requires_defining_columns_as_null: false,
        create_or_replace_view: false,
        max_container_depth: 0,
        max_identifier_length: None,
    },
};

impl SqlDialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn data_type_sql(&self, data_type: &DataType, auto_increment: bool) -> String {
        if auto_increment && data_type.standard_type().is_integer() {
            return "INTEGER".to_string();
        }
        data_type.to_string()
    }
}
