pub mod generic;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use crate::engine::dialect::SqlDialect;
use std::sync::Arc;

/// Look up a built-in dialect by its short name.
pub fn dialect_by_name(name: &str) -> Option<Arc<dyn SqlDialect>> {
    match name.to_lowercase().as_str() {
        "mysql" | "mariadb" => Some(Arc::new(mysql::MYSQL_DIALECT.clone())),
        "postgres" | "postgresql" => Some(Arc::new(postgres::POSTGRES_DIALECT.clone())),
        "sqlite" => Some(Arc::new(sqlite::SQLITE_DIALECT.clone())),
        "generic" | "ansi" => Some(Arc::new(generic::GenericDialect::default())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dialect::DialectKind;

    #[test]
    fn resolves_aliases() {
        assert_eq!(dialect_by_name("Postgres").map(|d| d.kind()), Some(DialectKind::Postgres));
        assert_eq!(dialect_by_name("mariadb").map(|d| d.kind()), Some(DialectKind::MySql));
        assert!(dialect_by_name("oracle").is_none());
    }
}
