use crate::action::{expect_action, Action, ActionKind, ActionVariant, SnapshotObjectsAction};
use crate::actionlogic::{
    ActionLogic, ActionResult, ValidationErrors, PRIORITY_DEFAULT, PRIORITY_NOT_APPLICABLE,
};
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::ObjectReference;
use async_trait::async_trait;
use tracing::debug;

/// Answers snapshot requests from the stored snapshot of an offline
/// connection.
pub struct ReplaySnapshotLogic;

#[async_trait]
impl ActionLogic for ReplaySnapshotLogic {
    fn name(&self) -> &str {
        "ReplaySnapshotLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::SnapshotObjects
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        scope.database().is_offline()
    }

    fn priority(&self, action: &Action, _scope: &Scope) -> i32 {
        match SnapshotObjectsAction::from_action(action) {
            Some(action) if action.related_to.is_some() => PRIORITY_DEFAULT,
            _ => PRIORITY_NOT_APPLICABLE,
        }
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<SnapshotObjectsAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("relatedTo", &action.related_to);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<SnapshotObjectsAction>(action)?;
        let related = action
            .related_to
            .as_ref()
            .ok_or_else(|| ActionError::unexpected("relatedTo is required"))?;
        let stored = scope.database().replay_snapshot().await?.ok_or_else(|| {
            ActionError::unsupported("Offline connection has no stored snapshot to replay")
        })?;

        let related = ObjectReference {
            object_type: related.object_type,
            name: scope.database().stored_name(&related.name),
        };
        let objects: Vec<_> = stored
            .into_iter()
            .filter(|o| o.object_type() == action.type_to_snapshot && o.is_related_to(&related))
            .collect();
        debug!(related = %related, found = objects.len(), "Replayed stored snapshot");
        Ok(ActionResult::Objects(objects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actionlogic::ActionLogicRegistry;
    use crate::engine::offline::OfflineSession;
    use crate::engine::Database;
    use crate::structure::{Column, DataType, DatabaseObject, ObjectName, ObjectType, Table};
    use crate::testing::offline_scope;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use std::sync::Arc;

    async fn replay_scope(objects: Vec<DatabaseObject>) -> Scope {
        let mut database = Database::new(Arc::new(POSTGRES_DIALECT.clone()));
        database
            .set_session(Box::new(OfflineSession::new().with_snapshot(objects)))
            .await
            .unwrap();
        Scope::new(Arc::new(database), Arc::new(ActionLogicRegistry::with_builtins()))
    }

    #[tokio::test]
    async fn filters_stored_objects() {
        let scope = replay_scope(vec![
            DatabaseObject::Table(Table::new("public.users")),
            DatabaseObject::Table(Table::new("audit.users")),
            DatabaseObject::Column(Column::new(
                ObjectName::parse("public.users.id"),
                DataType::new("int"),
            )),
        ])
        .await;

        let tables: Action =
            SnapshotObjectsAction::new(ObjectType::Table, ObjectReference::schema("public"))
                .into();
        let found = scope.execute(&tables).await.unwrap().into_objects();
        assert_eq!(found, vec![DatabaseObject::Table(Table::new("public.users"))]);

        let columns: Action =
            SnapshotObjectsAction::new(ObjectType::Column, ObjectReference::table("users")).into();
        assert_eq!(scope.execute(&columns).await.unwrap().into_objects().len(), 1);
    }

    #[tokio::test]
    async fn needs_a_stored_snapshot() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action =
            SnapshotObjectsAction::new(ObjectType::Table, ObjectReference::table("users")).into();
        assert!(matches!(
            scope.execute(&action).await.unwrap_err(),
            ActionError::Unsupported(_)
        ));
    }
}
