//! Database-specific overrides of generic logic.
//!
//! Each override applies only to its dialect and reports
//! [`PRIORITY_DATABASE`](super::PRIORITY_DATABASE), so it wins over the
//! generic logic for the same action. Overrides reuse the generic clause
//! builders and change only the fragments that differ.

mod mysql;
mod postgres;

pub use mysql::{MysqlAddAutoIncrementLogic, MysqlAddNotNullConstraintLogic};
pub use postgres::{
    PostgresAddAutoIncrementLogic, PostgresCreateSequenceLogic, PostgresDropTablesLogic,
};

use super::ActionLogicRegistry;
use crate::engine::dialect::DialectKind;
use crate::scope::Scope;

fn is_dialect(scope: &Scope, kind: DialectKind) -> bool {
    scope.database().dialect().kind() == kind
}

pub fn register(registry: &mut ActionLogicRegistry) {
    registry
        .register(MysqlAddAutoIncrementLogic)
        .register(MysqlAddNotNullConstraintLogic)
        .register(PostgresAddAutoIncrementLogic)
        .register(PostgresCreateSequenceLogic)
        .register(PostgresDropTablesLogic);
}
