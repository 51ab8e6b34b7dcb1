use super::{relation_name, remarks, text, SnapshotRowMapper, RELATION_SCOPES};
use crate::engine::value::Row;
use crate::engine::MetadataMethod;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{DatabaseObject, ObjectType, Table, View};

/// `getTables` rows. Rows typed `VIEW` become views.
pub struct TablesMapper;

impl SnapshotRowMapper for TablesMapper {
    fn name(&self) -> &'static str {
        "SnapshotTablesLogic"
    }

    fn type_to_snapshot(&self) -> ObjectType {
        ObjectType::Table
    }

    fn supported_related_types(&self) -> &'static [ObjectType] {
        RELATION_SCOPES
    }

    fn method(&self) -> MetadataMethod {
        MetadataMethod::Tables
    }

    fn convert_to_object(&self, row: &Row, _scope: &Scope) -> Result<DatabaseObject> {
        let name = relation_name(row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME");
        let is_view = text(row, "TABLE_TYPE").map_or(false, |t| t.eq_ignore_ascii_case("VIEW"));
        if is_view {
            return Ok(DatabaseObject::View(View {
                name,
                ..Default::default()
            }));
        }
        Ok(DatabaseObject::Table(Table {
            name,
            remarks: remarks(row),
            ..Default::default()
        }))
    }
}
