//! Snapshot logic: turn catalog metadata rows into database objects.
//!
//! Each [`SnapshotRowMapper`] knows one metadata method and how to convert
//! its rows. [`SnapshotLogic`] wraps a mapper as an [`ActionLogic`] that
//! delegates to a [`QueryMetadataAction`] and converts the rows in a
//! [`ResultModifier`]. Offline connections with a stored snapshot are served
//! by [`ReplaySnapshotLogic`] instead.

mod columns;
mod foreign_keys;
mod primary_keys;
mod replay;
mod tables;

pub use columns::ColumnsMapper;
pub use foreign_keys::ForeignKeysMapper;
pub use primary_keys::PrimaryKeysMapper;
pub use replay::ReplaySnapshotLogic;
pub use tables::TablesMapper;

use super::{
    ActionLogic, ActionLogicRegistry, ActionResult, ResultModifier, ValidationErrors,
    PRIORITY_DEFAULT, PRIORITY_NOT_APPLICABLE,
};
use crate::action::{
    expect_action, Action, ActionKind, ActionVariant, QueryMetadataAction, SnapshotObjectsAction,
};
use crate::engine::value::Row;
use crate::engine::{MetadataMethod, MetadataQuery};
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{DatabaseObject, ObjectName, ObjectReference, ObjectType};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Conversion of one metadata method's rows into objects of one type.
pub trait SnapshotRowMapper: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn type_to_snapshot(&self) -> ObjectType;

    /// Object types accepted as the `relatedTo` reference.
    fn supported_related_types(&self) -> &'static [ObjectType];

    fn method(&self) -> MetadataMethod;

    /// Introspection call for the narrowest names `related` provides.
    fn create_snapshot_action(&self, related: &ObjectReference, scope: &Scope) -> Result<Action> {
        let target = SnapshotTarget::for_reference(related, scope)?;
        Ok(QueryMetadataAction {
            query: target.query(self.method(), scope),
        }
        .into())
    }

    fn convert_to_object(&self, row: &Row, scope: &Scope) -> Result<DatabaseObject>;

    /// Combine per-row objects that describe the same object.
    fn merge(&self, objects: Vec<DatabaseObject>) -> Vec<DatabaseObject> {
        objects
    }
}

/// Relation (and optional child name) a snapshot query is narrowed to.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SnapshotTarget {
    pub relation: ObjectName,
    pub child: Option<String>,
}

impl SnapshotTarget {
    pub fn for_reference(related: &ObjectReference, scope: &Scope) -> Result<Self> {
        let db = scope.database();
        let (relation, child) = match related.object_type {
            ObjectType::Catalog => {
                if db.capabilities().max_container_depth < 2 {
                    return Err(ActionError::unsupported(format!(
                        "Cannot snapshot catalogs on {}",
                        db.short_name()
                    )));
                }
                (related.name.child_opt(None).child_opt(None), None)
            }
            ObjectType::Schema => (related.name.child_opt(None), None),
            ObjectType::Table | ObjectType::View => (related.name.clone(), None),
            ObjectType::Column
            | ObjectType::PrimaryKey
            | ObjectType::ForeignKey
            | ObjectType::Index
            | ObjectType::UniqueConstraint => (
                related.name.container().cloned().unwrap_or_default(),
                related.name.name.clone(),
            ),
            ObjectType::Sequence => {
                return Err(ActionError::unexpected(format!(
                    "Unexpected relatedTo type: {}",
                    related.object_type
                )))
            }
        };
        Ok(SnapshotTarget { relation, child })
    }

    /// Positional arguments for `method`. The relation is cut down to the
    /// container levels the database models; with one level it is passed as
    /// the schema.
    pub fn query(&self, method: MetadataMethod, scope: &Scope) -> MetadataQuery {
        let db = scope.database();
        let depth = db.capabilities().max_container_depth.min(2);
        let parts = db.stored_name(&self.relation).as_list(depth + 1);
        let mut query = MetadataQuery::new(method);
        query.table = parts[depth].clone();
        match depth {
            0 => {}
            1 => query.schema = parts[0].clone(),
            _ => {
                query.catalog = parts[0].clone();
                query.schema = parts[1].clone();
            }
        }
        if method == MetadataMethod::Columns {
            query.column = self.child.as_deref().map(|c| db.stored_case(c));
        }
        query
    }
}

/// Trimmed text with blanks as `None`.
pub(crate) fn text(row: &Row, column: &str) -> Option<String> {
    row.get_string(column)
}

/// Comment text, with doubled quotes unescaped.
pub(crate) fn remarks(row: &Row) -> Option<String> {
    text(row, "REMARKS").map(|r| r.replace("''", "'"))
}

/// Qualified relation name from catalog, schema and name columns. A catalog
/// without a schema is the only container level.
pub(crate) fn relation_name(row: &Row, catalog: &str, schema: &str, name: &str) -> ObjectName {
    let catalog = text(row, catalog);
    let schema = text(row, schema);
    let name = text(row, name);
    if catalog.is_some() && schema.is_none() {
        ObjectName::from_parts([catalog, name])
    } else {
        ObjectName::from_parts([catalog, schema, name])
    }
}

/// Group objects by identity in first-seen order.
pub(crate) fn group_by_key<T, K, F, G>(items: Vec<T>, mut identity: F, mut absorb: G) -> Vec<T>
where
    K: PartialEq,
    F: FnMut(&T) -> K,
    G: FnMut(&mut T, T),
{
    let mut grouped: Vec<(K, T)> = Vec::new();
    for item in items {
        let key = identity(&item);
        match grouped.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, target)) => absorb(target, item),
            None => grouped.push((key, item)),
        }
    }
    grouped.into_iter().map(|(_, item)| item).collect()
}

/// Position order, unpositioned entries last by name.
pub(crate) fn position_key(position: Option<i32>, name: &str) -> (bool, i32, String) {
    (position.is_none(), position.unwrap_or_default(), name.to_string())
}

/// Snapshot logic for live connections, one per mapper.
pub struct SnapshotLogic<M: SnapshotRowMapper> {
    mapper: Arc<M>,
}

impl<M: SnapshotRowMapper> SnapshotLogic<M> {
    pub fn new(mapper: M) -> Self {
        SnapshotLogic {
            mapper: Arc::new(mapper),
        }
    }
}

struct SnapshotModifier<M: SnapshotRowMapper> {
    mapper: Arc<M>,
}

impl<M: SnapshotRowMapper> ResultModifier for SnapshotModifier<M> {
    fn modify(&self, result: ActionResult, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<SnapshotObjectsAction>(action)?;
        let rows = result.into_rows();
        let objects = rows
            .iter()
            .map(|row| self.mapper.convert_to_object(row, scope))
            .collect::<Result<Vec<_>>>()?;
        let mut objects = self.mapper.merge(objects);
        if let Some(related) = &action.related_to {
            if related.object_type == self.mapper.type_to_snapshot() {
                let related = ObjectReference {
                    object_type: related.object_type,
                    name: scope.database().stored_name(&related.name),
                };
                objects.retain(|object| object.is_related_to(&related));
            }
        }
        debug!(
            mapper = self.mapper.name(),
            rows = rows.len(),
            objects = objects.len(),
            "Converted metadata rows"
        );
        Ok(ActionResult::Objects(objects))
    }
}

#[async_trait]
impl<M: SnapshotRowMapper> ActionLogic for SnapshotLogic<M> {
    fn name(&self) -> &str {
        self.mapper.name()
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::SnapshotObjects
    }

    fn supports_scope(&self, scope: &Scope) -> bool {
        scope.database().is_live()
    }

    fn priority(&self, action: &Action, _scope: &Scope) -> i32 {
        let Some(action) = SnapshotObjectsAction::from_action(action) else {
            return PRIORITY_NOT_APPLICABLE;
        };
        match &action.related_to {
            Some(related)
                if action.type_to_snapshot == self.mapper.type_to_snapshot()
                    && self
                        .mapper
                        .supported_related_types()
                        .contains(&related.object_type) =>
            {
                PRIORITY_DEFAULT
            }
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
        let query = self.mapper.create_snapshot_action(related, scope)?;
        Ok(ActionResult::delegate_with(
            query,
            Arc::new(SnapshotModifier {
                mapper: Arc::clone(&self.mapper),
            }),
        ))
    }
}

/// Object types a relation-level snapshot accepts.
pub(crate) const RELATION_SCOPES: &[ObjectType] = &[
    ObjectType::Table,
    ObjectType::View,
    ObjectType::Schema,
    ObjectType::Catalog,
];

pub fn register(registry: &mut ActionLogicRegistry) {
    registry
        .register(SnapshotLogic::new(TablesMapper))
        .register(SnapshotLogic::new(ColumnsMapper))
        .register(SnapshotLogic::new(ForeignKeysMapper))
        .register(SnapshotLogic::new(PrimaryKeysMapper))
        .register(ReplaySnapshotLogic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;
    use crate::testing::{live_scope, FakeSession};
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use crate::util::dialects::sqlite::SQLITE_DIALECT;

    #[tokio::test]
    async fn over_qualified_names_are_truncated() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let related = ObjectReference::table("srv.db.public.users");
        let target = SnapshotTarget::for_reference(&related, &scope).unwrap();
        let query = target.query(MetadataMethod::Tables, &scope);
        assert_eq!(query.catalog, None);
        assert_eq!(query.schema.as_deref(), Some("public"));
        assert_eq!(query.table.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn schema_reference_is_a_wildcard_table() {
        let scope = live_scope(&MYSQL_DIALECT, FakeSession::default()).await;
        let target =
            SnapshotTarget::for_reference(&ObjectReference::schema("shop"), &scope).unwrap();
        let query = target.query(MetadataMethod::Tables, &scope);
        assert_eq!(query.schema.as_deref(), Some("shop"));
        assert_eq!(query.table, None);

        let sqlite = live_scope(&SQLITE_DIALECT, FakeSession::default()).await;
        let query = SnapshotTarget::for_reference(&ObjectReference::table("main.users"), &sqlite)
            .unwrap()
            .query(MetadataMethod::Tables, &sqlite);
        assert_eq!(query.schema, None);
        assert_eq!(query.table.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn catalogs_need_two_container_levels() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let related = ObjectReference::new(ObjectType::Catalog, "db");
        assert!(matches!(
            SnapshotTarget::for_reference(&related, &scope),
            Err(ActionError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn column_reference_narrows_the_column_argument() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let related = ObjectReference::new(ObjectType::Column, "public.users.email");
        let query = SnapshotTarget::for_reference(&related, &scope)
            .unwrap()
            .query(MetadataMethod::Columns, &scope);
        assert_eq!(query.table.as_deref(), Some("users"));
        assert_eq!(query.column.as_deref(), Some("email"));
    }

    #[test]
    fn catalog_without_schema_is_the_only_container() {
        let row = Row::new()
            .with("TABLE_CAT", "shop")
            .with("TABLE_SCHEM", SqlValue::Null)
            .with("TABLE_NAME", " items ");
        assert_eq!(
            relation_name(&row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME"),
            ObjectName::parse("shop.items")
        );
    }

    #[test]
    fn remarks_are_unescaped() {
        let row = Row::new().with("REMARKS", "it''s  ");
        assert_eq!(remarks(&row).as_deref(), Some("it's"));
    }
}
