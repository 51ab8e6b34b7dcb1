use super::execute_sql;
use crate::action::{expect_action, Action, ActionKind, CreateViewAction, ExecuteSqlAction};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::ObjectType;
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

const VIEW_NAME: &str = "viewName";
const REPLACE: &str = "replace";
const SELECT: &str = "select";

/// `CREATE [OR REPLACE] VIEW`. Without OR REPLACE support a replacing
/// create becomes a drop followed by a plain create.
pub struct CreateViewLogic;

#[async_trait]
impl ActionLogic for CreateViewLogic {
    fn name(&self) -> &str {
        "CreateViewLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateView
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateViewAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("view", &action.view)
            .check_required_field("selectSql", &action.select_sql);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateViewAction>(action)?;
        let db = scope.database();
        let view_name = db.escape_qualified_name(&action.view, ObjectType::View);

        if action.replace_if_exists && !db.capabilities().create_or_replace_view {
            return Ok(ActionResult::Rewrite(vec![
                ExecuteSqlAction::new(format!("DROP VIEW IF EXISTS {}", view_name)).into(),
                CreateViewAction {
                    replace_if_exists: false,
                    ..action.clone()
                }
                .into(),
            ]));
        }

        let mut clauses = StringClauses::new();
        clauses.append("CREATE");
        if action.replace_if_exists {
            clauses.append_keyed(REPLACE, "OR REPLACE");
        }
        clauses
            .append("VIEW")
            .append_keyed(VIEW_NAME, view_name)
            .append("AS")
            .append_keyed(SELECT, action.select_sql.trim());
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::ObjectName;
    use crate::testing::offline_scope;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use crate::util::dialects::sqlite::SQLITE_DIALECT;

    fn active_users() -> Action {
        CreateViewAction {
            view: ObjectName::parse("public.active_users"),
            select_sql: "SELECT * FROM users WHERE active".into(),
            replace_if_exists: true,
        }
        .into()
    }

    #[tokio::test]
    async fn create_or_replace() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        assert_eq!(
            scope.registry().plan_sql(&active_users(), &scope).await.unwrap(),
            vec!["CREATE OR REPLACE VIEW public.active_users AS SELECT * FROM users WHERE active"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn replace_becomes_drop_and_create() {
        let scope = offline_scope(&SQLITE_DIALECT).await;
        assert_eq!(
            scope.registry().plan_sql(&active_users(), &scope).await.unwrap(),
            vec![
                "DROP VIEW IF EXISTS active_users".to_string(),
                "CREATE VIEW active_users AS SELECT * FROM users WHERE active".to_string(),
            ]
        );
    }
}
