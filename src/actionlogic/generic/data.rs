use super::{clause, execute_sql};
use crate::action::{
    expect_action, Action, ActionKind, ExecuteSqlAction, InsertDataAction, UpdateDataAction,
};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::engine::value::SqlValue;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::ObjectType;
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;
use std::collections::HashSet;

pub struct InsertDataLogic;

#[async_trait]
impl ActionLogic for InsertDataLogic {
    fn name(&self) -> &str {
        "InsertDataLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::InsertData
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<InsertDataAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("table", &action.table)
            .check_required_field("columns", &action.columns)
            .check_required_field("rows", &action.rows);
        for (idx, row) in action.rows.iter().enumerate() {
            if row.len() != action.columns.len() {
                errors.add_error(format!(
                    "row {} has {} values for {} columns",
                    idx + 1,
                    row.len(),
                    action.columns.len()
                ));
            }
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<InsertDataAction>(action)?;
        let db = scope.database();
        let columns: Vec<String> = action
            .columns
            .iter()
            .map(|c| db.escape_object_name(c, ObjectType::Column))
            .collect();
        let sql = db
            .dialect()
            .insert_values_sql(&db.escape_table_name(&action.table), &columns, &action.rows);
        Ok(ActionResult::delegate(ExecuteSqlAction::new(sql)))
    }
}

/// Replace each `?` outside quoted text with the next rendered parameter.
fn bind_params(condition: &str, params: &[String]) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut params = params.iter();
    let mut in_quotes = false;
    for ch in condition.chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            '?' if !in_quotes => match params.next() {
                Some(p) => out.push_str(p),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

fn placeholder_count(condition: &str) -> usize {
    let mut in_quotes = false;
    condition
        .chars()
        .filter(|&ch| {
            if ch == '\'' {
                in_quotes = !in_quotes;
            }
            ch == '?' && !in_quotes
        })
        .count()
}

pub struct UpdateDataLogic;

#[async_trait]
impl ActionLogic for UpdateDataLogic {
    fn name(&self) -> &str {
        "UpdateDataLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::UpdateData
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<UpdateDataAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("table", &action.table)
            .check_required_field("values", &action.values);
        let mut seen = HashSet::new();
        for (column, _) in &action.values {
            if !seen.insert(column.as_str()) {
                errors.add_error(format!("Column {} is assigned more than once", column));
            }
        }
        let placeholders = action.where_clause.as_deref().map_or(0, placeholder_count);
        if placeholders != action.where_params.len() {
            errors.add_error(format!(
                "whereClause has {} placeholders but {} parameters were given",
                placeholders,
                action.where_params.len()
            ));
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<UpdateDataAction>(action)?;
        let db = scope.database();

        let mut assignments = StringClauses::with_separator(", ");
        for (column, value) in &action.values {
            assignments.append_keyed(
                &clause::column(column),
                format!(
                    "{} = {}",
                    db.escape_object_name(column, ObjectType::Column),
                    db.literal(value)
                ),
            );
        }

        let mut clauses = StringClauses::new();
        clauses
            .append("UPDATE")
            .append_keyed(clause::TABLE_NAME, db.escape_table_name(&action.table))
            .append("SET")
            .append_clauses("values", assignments);
        if let Some(condition) = action.where_clause.as_deref().filter(|c| !c.trim().is_empty()) {
            let params: Vec<String> = action.where_params.iter().map(|v| db.literal(v)).collect();
            clauses.append_keyed(
                clause::WHERE,
                format!("WHERE {}", bind_params(condition.trim(), &params)),
            );
        }
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}

/// Comma-joined text, or NULL when there is nothing to join.
pub(crate) fn joined_or_null(values: &[String]) -> SqlValue {
    if values.is_empty() {
        SqlValue::Null
    } else {
        SqlValue::String(values.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::ObjectName;
    use crate::testing::offline_scope;
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;

    #[test]
    fn binds_placeholders_outside_quotes() {
        let params = vec!["'a'".to_string(), "7".to_string()];
        assert_eq!(
            bind_params("x = ? AND y <> '?' AND z = ?", &params),
            "x = 'a' AND y <> '?' AND z = 7"
        );
        assert_eq!(placeholder_count("x = ? AND y <> '?' AND z = ?"), 2);
    }

    #[tokio::test]
    async fn insert_rows() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = InsertDataAction {
            table: ObjectName::parse("shop.items"),
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![SqlValue::Int(1), SqlValue::String("pen".into())],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["INSERT INTO shop.items (id, name) VALUES (1, 'pen'), (2, NULL)".to_string()]
        );
    }

    #[tokio::test]
    async fn ragged_rows_fail_validation() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = InsertDataAction {
            table: ObjectName::new("items"),
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![SqlValue::Int(1)]],
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["row 1 has 1 values for 2 columns".to_string()]
        );
    }

    #[tokio::test]
    async fn update_with_parameters() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = UpdateDataAction {
            table: ObjectName::parse("public.users"),
            values: vec![
                ("active".into(), SqlValue::Bool(false)),
                ("note".into(), SqlValue::String("gone".into())),
            ],
            where_clause: Some("id = ? AND name = ?".into()),
            where_params: vec![SqlValue::Int(3), SqlValue::String("O'Hara".into())],
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["UPDATE public.users SET active = FALSE, note = 'gone' \
                  WHERE id = 3 AND name = 'O''Hara'"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn assignments_keep_every_column() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = UpdateDataAction {
            table: ObjectName::parse("public.users"),
            values: vec![
                ("Name".into(), SqlValue::String("a".into())),
                ("name".into(), SqlValue::String("b".into())),
                ("where".into(), SqlValue::Int(1)),
            ],
            where_clause: None,
            where_params: Vec::new(),
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["UPDATE public.users SET Name = 'a', name = 'b', \"where\" = 1".to_string()]
        );
    }

    #[tokio::test]
    async fn repeated_assignment_fails_validation() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = UpdateDataAction {
            table: ObjectName::new("users"),
            values: vec![("a".into(), SqlValue::Int(1)), ("a".into(), SqlValue::Int(2))],
            where_clause: None,
            where_params: Vec::new(),
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["Column a is assigned more than once".to_string()]
        );
    }

    #[tokio::test]
    async fn parameter_count_must_match() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = UpdateDataAction {
            table: ObjectName::new("users"),
            values: vec![("a".into(), SqlValue::Int(1))],
            where_clause: Some("id = ?".into()),
            where_params: Vec::new(),
        }
        .into();
        assert!(scope.execute(&action).await.unwrap_err().is_recoverable());
    }
}
