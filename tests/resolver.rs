use actionsql::action::{
    AddColumnsAction, ChangeSetRecord, CreateViewAction, DropTablesAction, ExecType,
    MarkChangeSetRanAction, SnapshotObjectsAction,
};
use actionsql::actionlogic::{PRIORITY_DATABASE, PRIORITY_DEFAULT};
use actionsql::engine::dialect::SqlDialect;
use actionsql::engine::offline::OfflineSession;
use actionsql::engine::value::Row;
use actionsql::engine::{ConnectionKind, DbSession, MetadataMethod, MetadataQuery};
use actionsql::structure::{AutoIncrementInfo, Column, DataType};
use actionsql::util::dialects::dialect_by_name;
use actionsql::{
    Action, ActionError, ActionKind, ActionLogic, ActionLogicRegistry, ActionResult, Database,
    DatabaseObject, ObjectName, ObjectReference, ObjectType, Result, Scope,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn dialect(name: &str) -> Arc<dyn SqlDialect> {
    dialect_by_name(name).unwrap()
}

async fn offline_scope(name: &str, registry: ActionLogicRegistry) -> Scope {
    let mut database = Database::new(dialect(name));
    database
        .set_session(Box::new(OfflineSession::new().with_default_schema("public")))
        .await
        .unwrap();
    Scope::new(Arc::new(database), Arc::new(registry))
}

async fn builtin_scope(name: &str) -> Scope {
    offline_scope(name, ActionLogicRegistry::with_builtins()).await
}

/// Live session answering foreign key metadata calls with fixed rows.
struct ImportedKeysSession {
    rows: Vec<Row>,
}

#[async_trait]
impl DbSession for ImportedKeysSession {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Live
    }

    async fn execute(&mut self, _sql: &str) -> Result<u64> {
        Ok(0)
    }

    async fn query(&mut self, _sql: &str) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn metadata(&mut self, query: &MetadataQuery) -> Result<Vec<Row>> {
        match query.method {
            MetadataMethod::ImportedKeys => Ok(self.rows.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn default_schema(&mut self) -> Result<Option<String>> {
        Ok(Some("public".to_string()))
    }

    async fn server_version(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}

struct FixedView {
    name: &'static str,
    priority: i32,
    result: fn() -> ActionResult,
}

#[async_trait]
impl ActionLogic for FixedView {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateView
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        self.priority
    }

    async fn execute(&self, _action: &Action, _scope: &Scope) -> Result<ActionResult> {
        Ok((self.result)())
    }
}

fn view() -> Action {
    CreateViewAction {
        view: "reports".into(),
        select_sql: "SELECT 1".into(),
        replace_if_exists: false,
    }
    .into()
}

fn auto_increment_column() -> Action {
    AddColumnsAction {
        columns: vec![Column {
            auto_increment: Some(AutoIncrementInfo {
                start_with: Some(100),
                increment_by: Some(5),
            }),
            nullable: Some(false),
            ..Column::new(ObjectName::parse("public.users.id"), DataType::new("integer"))
        }],
        ..Default::default()
    }
    .into()
}

#[tokio::test]
async fn auto_increment_clause_in_order() {
    let scope = builtin_scope("postgres").await;
    let sql = scope
        .registry()
        .plan_sql(&auto_increment_column(), &scope)
        .await
        .unwrap();
    assert_eq!(
        sql,
        vec!["ALTER TABLE public.users ADD id INTEGER GENERATED BY DEFAULT AS IDENTITY \
              (START WITH 100 INCREMENT BY 5) NOT NULL"
            .to_string()]
    );
}

#[tokio::test]
async fn auto_increment_dropped_with_warning_when_unsupported() {
    let scope = builtin_scope("sqlite").await;
    let report = scope
        .registry()
        .execute_reporting(&auto_increment_column(), &scope)
        .await
        .unwrap();
    assert_eq!(report.warnings.len(), 1);

    let sql = scope
        .registry()
        .plan_sql(&auto_increment_column(), &scope)
        .await
        .unwrap();
    assert_eq!(sql, vec!["ALTER TABLE users ADD id INTEGER NOT NULL".to_string()]);
}

#[tokio::test]
async fn cascade_drop_is_disallowed() {
    let scope = builtin_scope("mysql").await;
    let action: Action = DropTablesAction {
        tables: vec![ObjectName::new("A"), ObjectName::new("B")],
        cascade_constraints: true,
    }
    .into();
    let err = scope.execute(&action).await.unwrap_err();
    assert!(err.is_recoverable());
    let errors = err.validation_errors().unwrap().errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("cascadeConstraints"));
}

#[tokio::test]
async fn foreign_key_rows_merge_into_one_key() {
    let row = |base: &str, referenced: &str, position: i64| {
        Row::new()
            .with("PKTABLE_SCHEM", "public")
            .with("PKTABLE_NAME", "b")
            .with("PKCOLUMN_NAME", referenced)
            .with("FKTABLE_SCHEM", "public")
            .with("FKTABLE_NAME", "a")
            .with("FKCOLUMN_NAME", base)
            .with("FK_NAME", "fk_ab")
            .with("KEY_SEQ", position)
    };
    let mut database = Database::new(dialect("postgres"));
    database
        .set_session(Box::new(ImportedKeysSession {
            rows: vec![row("a2", "b2", 2), row("a1", "b1", 1)],
        }))
        .await
        .unwrap();
    let scope = Scope::new(
        Arc::new(database),
        Arc::new(ActionLogicRegistry::with_builtins()),
    );

    let action: Action =
        SnapshotObjectsAction::new(ObjectType::ForeignKey, ObjectReference::table("public.a"))
            .into();
    let objects = scope.execute(&action).await.unwrap().into_objects();
    assert_eq!(objects.len(), 1);
    let DatabaseObject::ForeignKey(fk) = &objects[0] else {
        panic!("expected a foreign key");
    };
    assert_eq!(fk.column_checks.len(), 2);
    assert_eq!(fk.base_columns(), vec!["a1", "a2"]);
    assert_eq!(fk.referenced_columns(), vec!["b1", "b2"]);
}

#[tokio::test]
async fn skipped_change_set_is_noop() {
    let scope = builtin_scope("postgres").await;
    let action: Action = MarkChangeSetRanAction {
        change_set: ChangeSetRecord::new("1", "alice", "db/changelog.xml"),
        exec_type: ExecType::Skipped,
        order_executed: 1,
        deployment_id: None,
        previously_ran: false,
    }
    .into();
    assert!(matches!(scope.execute(&action).await.unwrap(), ActionResult::NoOp));
    assert!(scope.registry().plan_sql(&action, &scope).await.unwrap().is_empty());
}

#[tokio::test]
async fn equal_priorities_are_reported() {
    let mut registry = ActionLogicRegistry::new();
    registry
        .register(FixedView {
            name: "first",
            priority: PRIORITY_DATABASE,
            result: || ActionResult::NoOp,
        })
        .register(FixedView {
            name: "second",
            priority: PRIORITY_DATABASE,
            result: || ActionResult::NoOp,
        });
    let scope = offline_scope("postgres", registry).await;
    let err = scope.execute(&view()).await.unwrap_err();
    assert!(matches!(err, ActionError::AmbiguousLogic { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn no_applicable_logic() {
    let scope = offline_scope("postgres", ActionLogicRegistry::new()).await;
    let err = scope.execute(&view()).await.unwrap_err();
    assert!(matches!(err, ActionError::NoLogic { action: ActionKind::CreateView }));
}

#[tokio::test]
async fn empty_rewrite_is_noop() {
    let mut registry = ActionLogicRegistry::new();
    registry.register(FixedView {
        name: "empty",
        priority: PRIORITY_DEFAULT,
        result: || ActionResult::Rewrite(Vec::new()),
    });
    let scope = offline_scope("postgres", registry).await;
    assert!(matches!(scope.execute(&view()).await.unwrap(), ActionResult::NoOp));
}

#[tokio::test]
async fn validation_reports_every_problem() {
    let scope = builtin_scope("postgres").await;
    let action: Action = AddColumnsAction {
        columns: vec![Column {
            name: ObjectName::new("orphan"),
            ..Default::default()
        }],
        ..Default::default()
    }
    .into();
    let err = scope.execute(&action).await.unwrap_err();
    assert_eq!(err.validation_errors().unwrap().errors().len(), 2);
}

#[tokio::test]
async fn generated_sql_is_stable() {
    let scope = builtin_scope("postgres").await;
    let first = scope
        .registry()
        .plan_sql(&auto_increment_column(), &scope)
        .await
        .unwrap();
    let second = scope
        .registry()
        .plan_sql(&auto_increment_column(), &scope)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn deep_names_truncate_to_container_depth() {
    let scope = builtin_scope("mysql").await;
    let action: Action = DropTablesAction {
        tables: vec![ObjectName::parse("srv.db.shop.items")],
        cascade_constraints: false,
    }
    .into();
    assert_eq!(
        scope.registry().plan_sql(&action, &scope).await.unwrap(),
        vec!["DROP TABLE shop.items".to_string()]
    );
}
