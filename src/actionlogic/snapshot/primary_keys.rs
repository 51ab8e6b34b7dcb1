use super::{group_by_key, position_key, relation_name, text, SnapshotRowMapper};
use crate::engine::value::Row;
use crate::engine::MetadataMethod;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{DatabaseObject, ObjectType, PrimaryKey, PrimaryKeyColumn};

/// `getPrimaryKeys` rows, one per key column.
pub struct PrimaryKeysMapper;

impl SnapshotRowMapper for PrimaryKeysMapper {
    fn name(&self) -> &'static str {
        "SnapshotPrimaryKeysLogic"
    }

    fn type_to_snapshot(&self) -> ObjectType {
        ObjectType::PrimaryKey
    }

    fn supported_related_types(&self) -> &'static [ObjectType] {
        &[
            ObjectType::PrimaryKey,
            ObjectType::Table,
            ObjectType::Schema,
            ObjectType::Catalog,
        ]
    }

    fn method(&self) -> MetadataMethod {
        MetadataMethod::PrimaryKeys
    }

    fn convert_to_object(&self, row: &Row, _scope: &Scope) -> Result<DatabaseObject> {
        Ok(DatabaseObject::PrimaryKey(PrimaryKey {
            name: text(row, "PK_NAME"),
            table: relation_name(row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME"),
            columns: vec![PrimaryKeyColumn {
                name: text(row, "COLUMN_NAME").unwrap_or_default(),
                position: row.get_i32("KEY_SEQ"),
                descending: None,
            }],
            ..Default::default()
        }))
    }

    fn merge(&self, objects: Vec<DatabaseObject>) -> Vec<DatabaseObject> {
        let mut keys = Vec::new();
        let mut others = Vec::new();
        for object in objects {
            match object {
                DatabaseObject::PrimaryKey(pk) => keys.push(pk),
                other => others.push(other),
            }
        }

        let mut merged = group_by_key(keys, PrimaryKey::reference, |target, pk| {
            target.columns.extend(pk.columns)
        });
        for pk in &mut merged {
            pk.columns.sort_by_key(|c| position_key(c.position, &c.name));
        }
        merged
            .into_iter()
            .map(DatabaseObject::PrimaryKey)
            .chain(others)
            .collect()
    }
}
