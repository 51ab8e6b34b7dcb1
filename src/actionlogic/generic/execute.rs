use crate::action::{
    expect_action, Action, ActionKind, ExecuteSqlAction, QueryMetadataAction, QuerySqlAction,
};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::Result;
use crate::scope::Scope;
use async_trait::async_trait;

pub struct ExecuteSqlLogic;

#[async_trait]
impl ActionLogic for ExecuteSqlLogic {
    fn name(&self) -> &str {
        "ExecuteSqlLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::ExecuteSql
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<ExecuteSqlAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("sql", &action.sql);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<ExecuteSqlAction>(action)?;
        let count = scope.database().execute(&action.sql).await?;
        Ok(ActionResult::Update(count))
    }
}

pub struct QuerySqlLogic;

#[async_trait]
impl ActionLogic for QuerySqlLogic {
    fn name(&self) -> &str {
        "QuerySqlLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::QuerySql
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<QuerySqlAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("sql", &action.sql);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<QuerySqlAction>(action)?;
        let rows = scope.database().query(&action.sql).await?;
        Ok(ActionResult::Rows(rows))
    }
}

/// Introspection through the live connection's metadata calls.
pub struct QueryMetadataLogic;

#[async_trait]
impl ActionLogic for QueryMetadataLogic {
    fn name(&self) -> &str {
        "QueryMetadataLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::QueryMetadata
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        scope.database().is_live()
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<QueryMetadataAction>(action)?;
        let rows = scope.database().metadata(&action.query).await?;
        Ok(ActionResult::Rows(rows))
    }
}
