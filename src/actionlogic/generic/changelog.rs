use super::data::joined_or_null;
use crate::action::{
    expect_action, Action, ActionKind, CreateChangeLogTableAction, CreateTableAction,
    ExecType, InsertDataAction, MarkChangeSetRanAction, UpdateDataAction,
};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::engine::value::SqlValue;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{Column, DataType, ObjectName, ObjectType, Table};
use async_trait::async_trait;

/// History table layout: column name, type and whether it is NOT NULL.
pub const CHANGELOG_COLUMNS: &[(&str, &str, bool)] = &[
    ("ID", "VARCHAR(255)", true),
    ("AUTHOR", "VARCHAR(255)", true),
    ("FILENAME", "VARCHAR(255)", true),
    ("DATEEXECUTED", "TIMESTAMP", true),
    ("ORDEREXECUTED", "INT", true),
    ("EXECTYPE", "VARCHAR(10)", true),
    ("MD5SUM", "VARCHAR(35)", false),
    ("DESCRIPTION", "VARCHAR(255)", false),
    ("COMMENTS", "VARCHAR(255)", false),
    ("TAG", "VARCHAR(255)", false),
    ("LIQUIBASE", "VARCHAR(20)", false),
    ("CONTEXTS", "VARCHAR(255)", false),
    ("LABELS", "VARCHAR(255)", false),
    ("DEPLOYMENT_ID", "VARCHAR(10)", false),
];

const MAX_TEXT: usize = 250;
const MAX_VERSION: usize = 20;

fn limit(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

fn text_or_null(value: Option<&str>) -> SqlValue {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => SqlValue::String(limit(v, MAX_TEXT)),
        None => SqlValue::Null,
    }
}

fn history_table(table: &ObjectName, scope: &Scope) -> ObjectName {
    if table.name.is_some() {
        table.clone()
    } else {
        scope.changelog_table()
    }
}

pub struct CreateChangeLogTableLogic;

#[async_trait]
impl ActionLogic for CreateChangeLogTableLogic {
    fn name(&self) -> &str {
        "CreateChangeLogTableLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateChangeLogTable
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateChangeLogTableAction>(action)?;
        let table = history_table(&action.table, scope);
        let columns = CHANGELOG_COLUMNS
            .iter()
            .map(|(name, data_type, not_null)| Column {
                nullable: Some(!not_null),
                ..Column::new(table.child(*name), DataType::parse(data_type))
            })
            .collect();
        Ok(ActionResult::delegate(CreateTableAction {
            table: Table::new(table),
            columns,
            ..Default::default()
        }))
    }
}

/// Records a change set in the history table.
pub struct MarkChangeSetRanLogic;

#[async_trait]
impl ActionLogic for MarkChangeSetRanLogic {
    fn name(&self) -> &str {
        "MarkChangeSetRanLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::MarkChangeSetRan
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<MarkChangeSetRanAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("changeSet.id", &action.change_set.id)
            .check_required_field("changeSet.author", &action.change_set.author)
            .check_required_field("changeSet.filePath", &action.change_set.file_path);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<MarkChangeSetRanAction>(action)?;
        if !action.exec_type.is_recorded() {
            return Ok(ActionResult::NoOp);
        }

        let db = scope.database();
        let change_set = &action.change_set;
        let table = scope.changelog_table();
        let now = SqlValue::Function(db.dialect().current_date_time_function().to_string());
        let checksum = text_or_null(change_set.checksum.as_deref());
        let comments = SqlValue::String(limit(
            change_set.comments.as_deref().unwrap_or_default(),
            MAX_TEXT,
        ));
        let deployment_id = text_or_null(action.deployment_id.as_deref());

        if action.previously_ran || action.exec_type == ExecType::Reran {
            let mut values = vec![
                ("DATEEXECUTED".to_string(), now),
                ("ORDEREXECUTED".to_string(), SqlValue::Int(i64::from(action.order_executed))),
                ("MD5SUM".to_string(), checksum),
                ("EXECTYPE".to_string(), SqlValue::String(action.exec_type.to_string())),
                ("DEPLOYMENT_ID".to_string(), deployment_id),
                ("COMMENTS".to_string(), comments),
                ("CONTEXTS".to_string(), joined_or_null(&change_set.contexts)),
                ("LABELS".to_string(), joined_or_null(&change_set.labels)),
            ];
            if let Some(tag) = &change_set.tag {
                values.push(("TAG".to_string(), SqlValue::String(tag.clone())));
            }
            let where_clause = ["ID", "AUTHOR", "FILENAME"]
                .iter()
                .map(|c| format!("{} = ?", db.escape_object_name(c, ObjectType::Column)))
                .collect::<Vec<_>>()
                .join(" AND ");
            return Ok(ActionResult::delegate(UpdateDataAction {
                table,
                values,
                where_clause: Some(where_clause),
                where_params: vec![
                    SqlValue::String(change_set.id.clone()),
                    SqlValue::String(change_set.author.clone()),
                    SqlValue::String(change_set.file_path.clone()),
                ],
            }));
        }

        let row: Vec<(&str, SqlValue)> = vec![
            ("ID", SqlValue::String(change_set.id.clone())),
            ("AUTHOR", SqlValue::String(change_set.author.clone())),
            ("FILENAME", SqlValue::String(change_set.file_path.clone())),
            ("DATEEXECUTED", now),
            ("ORDEREXECUTED", SqlValue::Int(i64::from(action.order_executed))),
            ("MD5SUM", checksum),
            ("DESCRIPTION", text_or_null(change_set.description.as_deref())),
            ("COMMENTS", comments),
            ("EXECTYPE", SqlValue::String(action.exec_type.to_string())),
            ("CONTEXTS", joined_or_null(&change_set.contexts)),
            ("LABELS", joined_or_null(&change_set.labels)),
            (
                "LIQUIBASE",
                SqlValue::String(limit(env!("CARGO_PKG_VERSION"), MAX_VERSION)),
            ),
            ("DEPLOYMENT_ID", deployment_id),
            ("TAG", text_or_null(change_set.tag.as_deref())),
        ];
        let (columns, values): (Vec<String>, Vec<SqlValue>) = row
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        Ok(ActionResult::delegate(InsertDataAction {
            table,
            columns,
            rows: vec![values],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ChangeSetRecord;
    use crate::testing::offline_scope;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;

    fn mark(exec_type: ExecType) -> Action {
        let mut change_set = ChangeSetRecord::new("1", "alice", "db/changelog.xml");
        change_set.checksum = Some("9:abc".into());
        change_set.contexts = vec!["dev".into(), "test".into()];
        MarkChangeSetRanAction {
            change_set,
            exec_type,
            order_executed: 4,
            deployment_id: Some("123".into()),
            previously_ran: false,
        }
        .into()
    }

    #[tokio::test]
    async fn skipped_and_failed_are_not_recorded() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        for exec in [ExecType::Skipped, ExecType::Failed] {
            let result = scope.execute(&mark(exec)).await.unwrap();
            assert!(matches!(result, ActionResult::NoOp));
            assert!(scope.registry().plan_sql(&mark(exec), &scope).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn first_run_inserts() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let sql = scope
            .registry()
            .plan_sql(&mark(ExecType::Executed), &scope)
            .await
            .unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with(
            "INSERT INTO public.DATABASECHANGELOG (ID, AUTHOR, FILENAME, DATEEXECUTED, ORDEREXECUTED"
        ));
        assert!(sql[0].contains("VALUES ('1', 'alice', 'db/changelog.xml', NOW(), 4, '9:abc', NULL, '', 'EXECUTED', 'dev,test', NULL, "));
    }

    #[tokio::test]
    async fn rerun_updates_by_identity() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let sql = scope
            .registry()
            .plan_sql(&mark(ExecType::Reran), &scope)
            .await
            .unwrap();
        assert_eq!(
            sql,
            vec!["UPDATE public.DATABASECHANGELOG SET DATEEXECUTED = NOW(), ORDEREXECUTED = 4, \
                  MD5SUM = '9:abc', EXECTYPE = 'RERAN', DEPLOYMENT_ID = '123', COMMENTS = '', \
                  CONTEXTS = 'dev,test', LABELS = NULL \
                  WHERE ID = '1' AND AUTHOR = 'alice' AND FILENAME = 'db/changelog.xml'"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn history_table_follows_scope_settings() {
        let scope = offline_scope(&POSTGRES_DIALECT)
            .await
            .with_value(crate::scope::CHANGELOG_TABLE_NAME, "history");
        let action: Action = CreateChangeLogTableAction::default().into();
        let sql = scope.registry().plan_sql(&action, &scope).await.unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with("CREATE TABLE public.history (ID VARCHAR(255) NOT NULL, "));
        assert!(sql[0].ends_with("DEPLOYMENT_ID VARCHAR(10))"));
    }
}
