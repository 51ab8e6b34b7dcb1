use super::is_dialect;
use crate::action::{
    expect_action, Action, ActionKind, AddAutoIncrementAction, AddNotNullConstraintAction,
    AlterTableAction,
};
use crate::actionlogic::generic::{
    clause, column_parts, AddAutoIncrementLogic, AddNotNullConstraintLogic,
};
use crate::actionlogic::{
    ActionLogic, ActionResult, AutoIncrementClause, ValidationErrors, PRIORITY_DATABASE,
};
use crate::engine::dialect::DialectKind;
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{AutoIncrementInfo, DataType, ObjectName, ObjectType};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

/// `AUTO_INCREMENT` columns. The start value is a table option, so it is
/// set with a separate statement; the step is server-wide and cannot be set
/// per column.
pub struct MysqlAddAutoIncrementLogic;

impl AutoIncrementClause for MysqlAddAutoIncrementLogic {
    fn auto_increment_clause(
        &self,
        _info: &AutoIncrementInfo,
        _data_type: Option<&DataType>,
        _scope: &Scope,
    ) -> String {
        "AUTO_INCREMENT".to_string()
    }

    fn follow_up_actions(
        &self,
        column: &ObjectName,
        info: &AutoIncrementInfo,
        _scope: &Scope,
    ) -> Vec<Action> {
        match (info.start_with, column.container()) {
            (Some(start), Some(table)) => {
                let mut clauses = StringClauses::new();
                clauses.append_keyed(clause::START_WITH, format!("AUTO_INCREMENT={}", start));
                vec![AlterTableAction {
                    table: table.clone(),
                    clauses,
                }
                .into()]
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl ActionLogic for MysqlAddAutoIncrementLogic {
    fn name(&self) -> &str {
        "MysqlAddAutoIncrementLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddAutoIncrement
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        is_dialect(scope, DialectKind::MySql)
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DATABASE
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        let mut errors = AddAutoIncrementLogic::base_validation(action, scope);
        errors.check_disallowed_field("incrementBy", &action.increment_by, "mysql");
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        AddAutoIncrementLogic::modify_column(action, self, scope)
    }

    fn as_auto_increment(&self) -> Option<&dyn AutoIncrementClause> {
        Some(self)
    }
}

/// MySQL has no `SET NOT NULL`; the column is redefined with `MODIFY`.
pub struct MysqlAddNotNullConstraintLogic;

#[async_trait]
impl ActionLogic for MysqlAddNotNullConstraintLogic {
    fn name(&self) -> &str {
        "MysqlAddNotNullConstraintLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddNotNullConstraint
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        is_dialect(scope, DialectKind::MySql)
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DATABASE
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddNotNullConstraintAction>(action)?;
        let mut errors = AddNotNullConstraintLogic::base_validation(action);
        errors.check_required_field("dataType", &action.data_type);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddNotNullConstraintAction>(action)?;
        let db = scope.database();
        let (table, name) = column_parts(&action.column)?;
        let data_type = action
            .data_type
            .as_ref()
            .ok_or_else(|| ActionError::unexpected("dataType is required"))?;
        let mut actions: Vec<Action> = AddNotNullConstraintLogic::backfill(action, scope)?
            .into_iter()
            .collect();

        let mut clauses = StringClauses::new();
        clauses
            .append("MODIFY")
            .append_keyed(clause::COLUMN_NAME, db.escape_object_name(name, ObjectType::Column))
            .append_keyed(clause::DATA_TYPE, db.data_type_sql(data_type, false))
            .append_keyed(clause::NULLABLE, "NOT NULL");
        actions.push(AlterTableAction { table, clauses }.into());
        Ok(ActionResult::delegate_all(actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::AddColumnsAction;
    use crate::actionlogic::ActionLogicRegistry;
    use crate::structure::Column;
    use crate::testing::{offline_scope, offline_scope_with};
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use pretty_assertions::assert_eq;

    fn auto_increment(start_with: Option<i64>, increment_by: Option<i64>) -> Action {
        AddAutoIncrementAction {
            column: ObjectName::parse("shop.items.id"),
            data_type: Some(DataType::new("int")),
            start_with,
            increment_by,
        }
        .into()
    }

    #[tokio::test]
    async fn start_value_is_a_second_statement() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        assert_eq!(
            scope
                .registry()
                .plan_sql(&auto_increment(Some(50), None), &scope)
                .await
                .unwrap(),
            vec![
                "ALTER TABLE shop.items MODIFY id INT AUTO_INCREMENT".to_string(),
                "ALTER TABLE shop.items AUTO_INCREMENT=50".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn only_the_auto_increment_fragment_differs_from_generic() {
        let mut generic = ActionLogicRegistry::new();
        crate::actionlogic::generic::register(&mut generic);
        let generic_scope = offline_scope_with(&MYSQL_DIALECT, generic).await;
        assert_eq!(
            generic_scope
                .registry()
                .plan_sql(&auto_increment(Some(50), None), &generic_scope)
                .await
                .unwrap(),
            vec!["ALTER TABLE shop.items MODIFY id INT GENERATED BY DEFAULT AS IDENTITY \
                  (START WITH 50)"
                .to_string()]
        );

        let scope = offline_scope(&MYSQL_DIALECT).await;
        let sql = scope
            .registry()
            .plan_sql(&auto_increment(None, None), &scope)
            .await
            .unwrap();
        assert_eq!(sql, vec!["ALTER TABLE shop.items MODIFY id INT AUTO_INCREMENT".to_string()]);
    }

    #[tokio::test]
    async fn increment_is_disallowed() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let err = scope
            .execute(&auto_increment(None, Some(2)))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["incrementBy is not allowed on mysql".to_string()]
        );
    }

    #[tokio::test]
    async fn add_column_carries_the_override_validation() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let mut column = Column::new(ObjectName::parse("shop.items.id"), DataType::new("int"));
        column.auto_increment = Some(AutoIncrementInfo {
            start_with: None,
            increment_by: Some(3),
        });
        let action: Action = AddColumnsAction {
            columns: vec![column],
            ..Default::default()
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["incrementBy is not allowed on mysql".to_string()]
        );
    }

    #[tokio::test]
    async fn not_null_redefines_the_column() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = AddNotNullConstraintAction {
            column: ObjectName::parse("shop.items.name"),
            data_type: Some(DataType::parse("varchar(50)")),
            default_null_value: None,
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["ALTER TABLE shop.items MODIFY name VARCHAR(50) NOT NULL".to_string()]
        );

        let untyped: Action = AddNotNullConstraintAction {
            column: ObjectName::parse("shop.items.name"),
            ..Default::default()
        }
        .into();
        let err = scope.execute(&untyped).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["dataType is required".to_string()]
        );
    }
}
