use super::constraint::column_list;
use super::{clause, execute_sql};
use crate::action::{expect_action, Action, ActionKind, CreateIndexesAction};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{Index, ObjectType};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

const INDEX_NAME: &str = "indexName";

pub struct CreateIndexesLogic;

impl CreateIndexesLogic {
    pub(crate) fn create_index_clauses(index: &Index, scope: &Scope) -> StringClauses {
        let db = scope.database();
        let mut clauses = StringClauses::new();
        clauses.append("CREATE");
        if index.unique {
            clauses.append("UNIQUE");
        }
        clauses
            .append("INDEX")
            .append_keyed(
                INDEX_NAME,
                db.escape_object_name(index.name.as_deref().unwrap_or_default(), ObjectType::Index),
            )
            .append("ON")
            .append_keyed(clause::TABLE_NAME, db.escape_table_name(&index.table))
            .append_keyed(clause::COLUMNS, column_list(&index.columns, scope));
        if let Some(ts) = index.tablespace.as_deref() {
            if db.capabilities().tablespaces {
                clauses.append_keyed(
                    clause::TABLESPACE,
                    format!("TABLESPACE {}", db.escape_object_name(ts, ObjectType::Table)),
                );
            }
        }
        clauses
    }
}

#[async_trait]
impl ActionLogic for CreateIndexesLogic {
    fn name(&self) -> &str {
        "CreateIndexesLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateIndexes
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateIndexesAction>(action)?;
        let db = scope.database();
        let mut errors = ValidationErrors::new();
        errors.check_required_field("indexes", &action.indexes);
        for index in &action.indexes {
            errors
                .check_required_field("index.name", &index.name)
                .check_required_field("index.table", &index.table)
                .check_required_field("index.columns", &index.columns)
                .check_identifier_length("index.name", index.name.as_deref(), db);
            if index.clustered == Some(true) && !db.capabilities().clustered_indexes {
                errors.add_warning(format!(
                    "Clustered indexes are not supported on {}, {} will be created non-clustered",
                    db.short_name(),
                    index.name.as_deref().unwrap_or_default()
                ));
            }
            if index.tablespace.is_some() && !db.capabilities().tablespaces {
                errors.add_warning(format!(
                    "Tablespaces are not supported on {}, ignoring the index tablespace",
                    db.short_name()
                ));
            }
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateIndexesAction>(action)?;
        let actions = action
            .indexes
            .iter()
            .map(|index| execute_sql(&Self::create_index_clauses(index, scope)))
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::ObjectName;
    use crate::testing::offline_scope;
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;

    fn email_index() -> Index {
        Index {
            name: Some("ix_users_email".into()),
            table: ObjectName::parse("public.users"),
            columns: vec!["email".into(), "tenant".into()],
            unique: true,
            clustered: Some(true),
            tablespace: Some("idx".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_unique_index_with_tablespace() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = CreateIndexesAction {
            indexes: vec![email_index()],
        }
        .into();
        let report = scope.registry().execute_reporting(&action, &scope).await.unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["CREATE UNIQUE INDEX ix_users_email ON public.users (email, tenant) TABLESPACE idx"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn tablespace_dropped_where_unsupported() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = CreateIndexesAction {
            indexes: vec![email_index()],
        }
        .into();
        let report = scope.registry().execute_reporting(&action, &scope).await.unwrap();
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["CREATE UNIQUE INDEX ix_users_email ON public.users (email, tenant)".to_string()]
        );
    }

    #[tokio::test]
    async fn long_index_name_fails_validation() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let name = format!("ix_{}", "a".repeat(61));
        let action: Action = CreateIndexesAction {
            indexes: vec![Index {
                name: Some(name.clone()),
                ..email_index()
            }],
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &[format!(
                "index.name {} is longer than the 63 characters allowed on postgresql",
                name
            )]
        );
    }

    #[tokio::test]
    async fn index_name_is_required() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = CreateIndexesAction {
            indexes: vec![Index {
                name: None,
                ..email_index()
            }],
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["index.name is required".to_string()]
        );
    }
}
