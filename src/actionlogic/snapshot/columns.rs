use super::{relation_name, remarks, text, SnapshotRowMapper};
use crate::engine::typemap::parse_default_value;
use crate::engine::value::Row;
use crate::engine::MetadataMethod;
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{
    AutoIncrementInfo, Column, DataType, DatabaseObject, ObjectType, StandardType,
};
use tracing::info;

/// JDBC `NULLABLE` codes.
const COLUMN_NO_NULLS: i64 = 0;
const COLUMN_NULLABLE: i64 = 1;

/// `getColumns` rows.
pub struct ColumnsMapper;

/// Tri-state nullability; unknown is reported and treated as nullable.
fn nullable(row: &Row, column: &Column) -> bool {
    match row.get_i64("NULLABLE") {
        Some(COLUMN_NO_NULLS) => false,
        Some(COLUMN_NULLABLE) => true,
        _ => {
            info!(column = %column.name, "Unknown nullable state, assuming nullable");
            true
        }
    }
}

/// `IS_AUTOINCREMENT`: absent or `NO` is plain, `YES` is auto-increment,
/// anything else is an encoding we do not understand.
fn auto_increment(row: &Row, column: &Column) -> Result<Option<AutoIncrementInfo>> {
    let Some(raw) = row.get("IS_AUTOINCREMENT").and_then(|v| v.as_text()) else {
        return Ok(None);
    };
    match raw.trim() {
        "YES" => Ok(Some(AutoIncrementInfo::default())),
        "NO" => Ok(None),
        "" => {
            info!(column = %column.name, "Unknown auto increment state, assuming not auto increment");
            Ok(None)
        }
        other => Err(ActionError::unexpected(format!(
            "Unknown is_autoincrement value: '{}'",
            other
        ))),
    }
}

fn data_type(row: &Row) -> Option<DataType> {
    let name = text(row, "TYPE_NAME")?;
    let mut data_type = DataType::new(name);
    match data_type.standard_type() {
        StandardType::Varchar | StandardType::Char => {
            if let Some(size) = row.get_i64("COLUMN_SIZE") {
                data_type.parameters.push(size.to_string());
            }
        }
        StandardType::Decimal => {
            if let Some(size) = row.get_i64("COLUMN_SIZE") {
                data_type.parameters.push(size.to_string());
                if let Some(digits) = row.get_i64("DECIMAL_DIGITS").filter(|d| *d > 0) {
                    data_type.parameters.push(digits.to_string());
                }
            }
        }
        _ => {}
    }
    Some(data_type)
}

impl SnapshotRowMapper for ColumnsMapper {
    fn name(&self) -> &'static str {
        "SnapshotColumnsLogic"
    }

    fn type_to_snapshot(&self) -> ObjectType {
        ObjectType::Column
    }

    fn supported_related_types(&self) -> &'static [ObjectType] {
        &[
            ObjectType::Column,
            ObjectType::Table,
            ObjectType::View,
            ObjectType::Schema,
            ObjectType::Catalog,
        ]
    }

    fn method(&self) -> MetadataMethod {
        MetadataMethod::Columns
    }

    fn convert_to_object(&self, row: &Row, scope: &Scope) -> Result<DatabaseObject> {
        let table = relation_name(row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME");
        let mut column = Column {
            name: table.child_opt(text(row, "COLUMN_NAME").as_deref()),
            remarks: remarks(row),
            position: row.get_i32("ORDINAL_POSITION"),
            data_type: data_type(row),
            ..Default::default()
        };
        column.nullable = Some(nullable(row, &column));
        if scope.database().capabilities().auto_increment {
            column.auto_increment = auto_increment(row, &column)?;
        }
        if !column.is_auto_increment() {
            column.default_value = text(row, "COLUMN_DEF")
                .and_then(|raw| parse_default_value(&raw, column.data_type.as_ref()));
        }
        Ok(DatabaseObject::Column(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, SnapshotObjectsAction};
    use crate::engine::value::SqlValue;
    use crate::structure::{ObjectName, ObjectReference};
    use crate::testing::{live_scope, FakeSession};
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use crate::util::dialects::sqlite::SQLITE_DIALECT;

    fn column_row(name: &str, nullable: i64, auto: Option<&str>) -> Row {
        Row::new()
            .with("TABLE_SCHEM", "public")
            .with("TABLE_NAME", "users")
            .with("COLUMN_NAME", name)
            .with("TYPE_NAME", "varchar")
            .with("COLUMN_SIZE", 40i64)
            .with("NULLABLE", nullable)
            .with("COLUMN_DEF", "'guest'::character varying")
            .with("ORDINAL_POSITION", 2i64)
            .with("IS_AUTOINCREMENT", auto.map(str::to_string))
    }

    #[tokio::test]
    async fn converts_column_rows() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let object = ColumnsMapper
            .convert_to_object(&column_row("name", 0, Some("NO")), &scope)
            .unwrap();
        let DatabaseObject::Column(column) = object else {
            panic!("expected a column");
        };
        assert_eq!(column.name, ObjectName::parse("public.users.name"));
        assert_eq!(column.data_type, Some(DataType::parse("varchar(40)")));
        assert_eq!(column.nullable, Some(false));
        assert_eq!(column.default_value, Some(SqlValue::String("guest".into())));
        assert_eq!(column.position, Some(2));
        assert!(!column.is_auto_increment());
    }

    #[tokio::test]
    async fn unknown_nullability_is_nullable() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let object = ColumnsMapper
            .convert_to_object(&column_row("name", 2, None), &scope)
            .unwrap();
        let DatabaseObject::Column(column) = object else {
            panic!("expected a column");
        };
        assert_eq!(column.nullable, Some(true));
    }

    #[tokio::test]
    async fn auto_increment_encodings() {
        let scope = live_scope(&POSTGRES_DIALECT, FakeSession::default()).await;
        let yes = ColumnsMapper
            .convert_to_object(&column_row("id", 0, Some("YES")), &scope)
            .unwrap();
        let DatabaseObject::Column(yes) = yes else {
            panic!("expected a column");
        };
        assert!(yes.is_auto_increment());
        assert_eq!(yes.default_value, None);

        let blank = ColumnsMapper
            .convert_to_object(&column_row("id", 0, Some(" ")), &scope)
            .unwrap();
        assert!(matches!(blank, DatabaseObject::Column(c) if !c.is_auto_increment()));

        let err = ColumnsMapper
            .convert_to_object(&column_row("id", 0, Some("MAYBE")), &scope)
            .unwrap_err();
        assert!(matches!(err, ActionError::Unexpected(_)));
    }

    #[tokio::test]
    async fn auto_increment_is_ignored_without_support() {
        let scope = live_scope(&SQLITE_DIALECT, FakeSession::default()).await;
        let object = ColumnsMapper
            .convert_to_object(&column_row("id", 0, Some("MAYBE")), &scope)
            .unwrap();
        assert!(matches!(object, DatabaseObject::Column(c) if !c.is_auto_increment()));
    }

    #[tokio::test]
    async fn single_column_lookup() {
        let session = FakeSession::default().with_rows(
            MetadataMethod::Columns,
            vec![column_row("name", 1, Some("NO"))],
        );
        let calls = session.calls.clone();
        let scope = live_scope(&POSTGRES_DIALECT, session).await;
        let action: Action = SnapshotObjectsAction::new(
            ObjectType::Column,
            ObjectReference::new(ObjectType::Column, "public.users.name"),
        )
        .into();
        let objects = scope.execute(&action).await.unwrap().into_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(calls.lock().unwrap()[0].column.as_deref(), Some("name"));
    }
}
