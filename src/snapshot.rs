//! Convenience entry points for reading database structure.

use crate::action::{Action, SnapshotObjectsAction};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{DatabaseObject, ObjectName, ObjectReference, ObjectType};
use tracing::debug;

/// Objects of `object_type` related to `related_to`.
pub async fn snapshot(
    scope: &Scope,
    object_type: ObjectType,
    related_to: ObjectReference,
) -> Result<Vec<DatabaseObject>> {
    debug!(object_type = %object_type, related_to = %related_to, "Snapshotting");
    let action: Action = SnapshotObjectsAction::new(object_type, related_to).into();
    Ok(scope.execute(&action).await?.into_objects())
}

/// Objects of `object_type` in `schema`, or in the current schema.
pub async fn snapshot_schema(
    scope: &Scope,
    object_type: ObjectType,
    schema: Option<&str>,
) -> Result<Vec<DatabaseObject>> {
    let name = ObjectName::from_parts([schema.map(str::to_string)]);
    snapshot(scope, object_type, ObjectReference::schema(name)).await
}

/// Objects of `object_type` belonging to one table.
pub async fn snapshot_table(
    scope: &Scope,
    object_type: ObjectType,
    table: ObjectName,
) -> Result<Vec<DatabaseObject>> {
    snapshot(scope, object_type, ObjectReference::table(table)).await
}

/// Whether the table exists.
pub async fn table_exists(scope: &Scope, table: ObjectName) -> Result<bool> {
    Ok(!snapshot_table(scope, ObjectType::Table, table)
        .await?
        .is_empty())
}
