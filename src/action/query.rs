use crate::engine::{MetadataMethod, MetadataQuery};
use crate::structure::{ObjectReference, ObjectType};
use serde::Serialize;

/// Run one SQL statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSqlAction {
    pub sql: String,
}

impl ExecuteSqlAction {
    pub fn new(sql: impl Into<String>) -> Self {
        ExecuteSqlAction { sql: sql.into() }
    }
}

/// Run a query and return its rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySqlAction {
    pub sql: String,
}

impl QuerySqlAction {
    pub fn new(sql: impl Into<String>) -> Self {
        QuerySqlAction { sql: sql.into() }
    }
}

/// Call a catalog introspection method.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadataAction {
    #[serde(flatten)]
    pub query: MetadataQuery,
}

impl QueryMetadataAction {
    pub fn new(method: MetadataMethod) -> Self {
        QueryMetadataAction {
            query: MetadataQuery::new(method),
        }
    }
}

/// Read objects of one type that live in, or are, the related object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotObjectsAction {
    pub type_to_snapshot: ObjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_to: Option<ObjectReference>,
}

impl SnapshotObjectsAction {
    pub fn new(type_to_snapshot: ObjectType, related_to: ObjectReference) -> Self {
        SnapshotObjectsAction {
            type_to_snapshot,
            related_to: Some(related_to),
        }
    }
}
