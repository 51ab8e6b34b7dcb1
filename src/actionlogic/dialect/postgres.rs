use super::is_dialect;
use crate::action::{
    expect_action, Action, ActionKind, AddAutoIncrementAction, CreateSequenceAction,
    DropTablesAction,
};
use crate::actionlogic::generic::{
    clause, column_parts, execute_sql, AddAutoIncrementLogic, CreateSequenceLogic,
    DropTablesLogic,
};
use crate::actionlogic::{
    ActionLogic, ActionResult, AutoIncrementClause, ValidationErrors, PRIORITY_DATABASE,
};
use crate::engine::dialect::DialectKind;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{AutoIncrementInfo, DataType, ObjectType};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

/// Identity columns arrived in PostgreSQL 10.
const MIN_IDENTITY_VERSION: u32 = 10;

/// `DROP TABLE t CASCADE`.
pub struct PostgresDropTablesLogic;

#[async_trait]
impl ActionLogic for PostgresDropTablesLogic {
    fn name(&self) -> &str {
        "PostgresDropTablesLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::DropTables
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        is_dialect(scope, DialectKind::Postgres)
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DATABASE
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        DropTablesLogic.validate(action, scope)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<DropTablesAction>(action)?;
        let mut actions = Vec::with_capacity(action.tables.len());
        for table in &action.tables {
            let mut clauses =
                DropTablesLogic::drop_table_clauses(table, action.cascade_constraints, scope);
            if clauses.contains(clause::CASCADE) {
                clauses.replace(clause::CASCADE, "CASCADE")?;
            }
            actions.push(execute_sql(&clauses));
        }
        Ok(ActionResult::delegate_all(actions))
    }
}

/// `ALTER TABLE t ALTER COLUMN c ADD GENERATED BY DEFAULT AS IDENTITY`.
pub struct PostgresAddAutoIncrementLogic;

impl AutoIncrementClause for PostgresAddAutoIncrementLogic {
    fn auto_increment_clause(
        &self,
        info: &AutoIncrementInfo,
        data_type: Option<&DataType>,
        scope: &Scope,
    ) -> String {
        AddAutoIncrementLogic.auto_increment_clause(info, data_type, scope)
    }
}

#[async_trait]
impl ActionLogic for PostgresAddAutoIncrementLogic {
    fn name(&self) -> &str {
        "PostgresAddAutoIncrementLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddAutoIncrement
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        is_dialect(scope, DialectKind::Postgres)
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DATABASE
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        let mut errors = AddAutoIncrementLogic::base_validation(action, scope);
        if let Some(major) = scope.database().server_major_version() {
            if major < MIN_IDENTITY_VERSION {
                errors.add_error(format!(
                    "Identity columns require PostgreSQL {} or later, server is {}",
                    MIN_IDENTITY_VERSION, major
                ));
            }
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        let db = scope.database();
        let (table, name) = column_parts(&action.column)?;
        let info = AddAutoIncrementLogic::info(action);

        let mut clauses = StringClauses::new();
        clauses
            .append("ALTER TABLE")
            .append_keyed(clause::TABLE_NAME, db.escape_table_name(&table))
            .append("ALTER COLUMN")
            .append_keyed(clause::COLUMN_NAME, db.escape_object_name(name, ObjectType::Column))
            .append("ADD")
            .append_keyed(
                clause::AUTO_INCREMENT,
                self.auto_increment_clause(&info, action.data_type.as_ref(), scope),
            );
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }

    fn as_auto_increment(&self) -> Option<&dyn AutoIncrementClause> {
        Some(self)
    }
}

/// Adds `AS <type>` and an explicit `NO CYCLE`.
pub struct PostgresCreateSequenceLogic;

#[async_trait]
impl ActionLogic for PostgresCreateSequenceLogic {
    fn name(&self) -> &str {
        "PostgresCreateSequenceLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateSequence
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        is_dialect(scope, DialectKind::Postgres)
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DATABASE
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateSequenceAction>(action)?;
        Ok(CreateSequenceLogic::base_validation(action, scope))
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateSequenceAction>(action)?;
        let sequence = &action.sequence;
        let mut clauses = CreateSequenceLogic::create_sequence_clauses(sequence, scope);
        if let Some(data_type) = &sequence.data_type {
            clauses.insert_after(
                clause::SEQUENCE_NAME,
                clause::DATA_TYPE_AS,
                format!("AS {}", scope.database().data_type_sql(data_type, false)),
            )?;
        }
        if sequence.cycle == Some(false) {
            clauses.append_keyed(clause::CYCLE, "NO CYCLE");
        }
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}
