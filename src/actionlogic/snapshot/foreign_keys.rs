use super::{group_by_key, position_key, relation_name, text, SnapshotRowMapper};
use crate::engine::value::Row;
use crate::engine::MetadataMethod;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{
    DatabaseObject, ForeignKey, ForeignKeyColumnCheck, ObjectName, ObjectType, ReferentialAction,
};
use std::collections::HashMap;

/// JDBC `DEFERRABILITY` codes.
const INITIALLY_DEFERRED: i64 = 5;
const INITIALLY_IMMEDIATE: i64 = 6;
const NOT_DEFERRABLE: i64 = 7;

/// `getImportedKeys` rows, one per column pair. Pairs of the same key are
/// merged and ordered by `KEY_SEQ`.
pub struct ForeignKeysMapper;

impl SnapshotRowMapper for ForeignKeysMapper {
    fn name(&self) -> &'static str {
        "SnapshotForeignKeysLogic"
    }

    fn type_to_snapshot(&self) -> ObjectType {
        ObjectType::ForeignKey
    }

    fn supported_related_types(&self) -> &'static [ObjectType] {
        &[
            ObjectType::ForeignKey,
            ObjectType::Table,
            ObjectType::View,
            ObjectType::Schema,
            ObjectType::Catalog,
        ]
    }

    fn method(&self) -> MetadataMethod {
        MetadataMethod::ImportedKeys
    }

    fn convert_to_object(&self, row: &Row, _scope: &Scope) -> Result<DatabaseObject> {
        let (deferrable, initially_deferred) = match row.get_i64("DEFERRABILITY") {
            Some(INITIALLY_DEFERRED) => (Some(true), Some(true)),
            Some(INITIALLY_IMMEDIATE) => (Some(true), Some(false)),
            Some(NOT_DEFERRABLE) => (Some(false), Some(false)),
            _ => (None, None),
        };
        let check = ForeignKeyColumnCheck {
            base_column: text(row, "FKCOLUMN_NAME").unwrap_or_default(),
            referenced_column: text(row, "PKCOLUMN_NAME").unwrap_or_default(),
            position: row.get_i32("KEY_SEQ"),
        };
        Ok(DatabaseObject::ForeignKey(ForeignKey {
            name: text(row, "FK_NAME"),
            table: relation_name(row, "FKTABLE_CAT", "FKTABLE_SCHEM", "FKTABLE_NAME"),
            referenced_table: relation_name(row, "PKTABLE_CAT", "PKTABLE_SCHEM", "PKTABLE_NAME"),
            column_checks: vec![check],
            update_rule: row
                .get_i64("UPDATE_RULE")
                .and_then(ReferentialAction::from_metadata_code),
            delete_rule: row
                .get_i64("DELETE_RULE")
                .and_then(ReferentialAction::from_metadata_code),
            deferrable,
            initially_deferred,
            ..Default::default()
        }))
    }

    fn merge(&self, objects: Vec<DatabaseObject>) -> Vec<DatabaseObject> {
        let mut keys = Vec::new();
        let mut others = Vec::new();
        for object in objects {
            match object {
                DatabaseObject::ForeignKey(fk) => keys.push(fk),
                other => others.push(other),
            }
        }

        // Unnamed keys between the same tables are told apart by KEY_SEQ
        // starting over at 1.
        let mut unnamed: HashMap<(ObjectName, ObjectName), usize> = HashMap::new();
        let identity = |fk: &ForeignKey| {
            if fk.name.is_some() {
                return (fk.reference(), None, 0);
            }
            let restarts = fk.column_checks.first().and_then(|c| c.position) == Some(1);
            let pair = (fk.table.clone(), fk.referenced_table.clone());
            let ordinal = *unnamed
                .entry(pair)
                .and_modify(|ordinal| {
                    if restarts {
                        *ordinal += 1;
                    }
                })
                .or_insert(0);
            (fk.reference(), Some(fk.referenced_table.clone()), ordinal)
        };
        let mut merged = group_by_key(keys, identity, |target, fk| {
            target.column_checks.extend(fk.column_checks)
        });
        for fk in &mut merged {
            fk.column_checks
                .sort_by_key(|c| position_key(c.position, &c.base_column));
        }
        merged
            .into_iter()
            .map(DatabaseObject::ForeignKey)
            .chain(others)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, SnapshotObjectsAction};
    use crate::structure::{ObjectName, ObjectReference};
    use crate::testing::{bare_scope, live_scope, FakeSession};
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use pretty_assertions::assert_eq;

    fn fk_row(name: &str, base: &str, referenced: &str, position: Option<i64>) -> Row {
        let mut row = Row::new()
            .with("PKTABLE_SCHEM", "public")
            .with("PKTABLE_NAME", "b")
            .with("PKCOLUMN_NAME", referenced)
            .with("FKTABLE_SCHEM", "public")
            .with("FKTABLE_NAME", "a")
            .with("FKCOLUMN_NAME", base)
            .with("FK_NAME", name)
            .with("UPDATE_RULE", 3i64)
            .with("DELETE_RULE", 0i64)
            .with("DEFERRABILITY", 7i64);
        if let Some(position) = position {
            row.push("KEY_SEQ", position);
        }
        row
    }

    fn checks(object: &DatabaseObject) -> Vec<(String, Option<i32>)> {
        match object {
            DatabaseObject::ForeignKey(fk) => fk
                .column_checks
                .iter()
                .map(|c| (c.base_column.clone(), c.position))
                .collect(),
            other => panic!("expected a foreign key, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rows_of_one_key_are_merged() {
        let session = FakeSession::default().with_rows(
            MetadataMethod::ImportedKeys,
            vec![
                fk_row("fk_ab", "a1", "b1", Some(1)),
                fk_row("fk_ab", "a2", "b2", Some(2)),
            ],
        );
        let scope = live_scope(&POSTGRES_DIALECT, session).await;
        let action: Action =
            SnapshotObjectsAction::new(ObjectType::ForeignKey, ObjectReference::table("public.a"))
                .into();
        let objects = scope.execute(&action).await.unwrap().into_objects();

        assert_eq!(objects.len(), 1);
        let DatabaseObject::ForeignKey(fk) = &objects[0] else {
            panic!("expected a foreign key");
        };
        assert_eq!(fk.reference(), ObjectName::parse("public.a.fk_ab"));
        assert_eq!(fk.referenced_table, ObjectName::parse("public.b"));
        assert_eq!(fk.base_columns(), vec!["a1", "a2"]);
        assert_eq!(fk.referenced_columns(), vec!["b1", "b2"]);
        assert_eq!(fk.update_rule, Some(ReferentialAction::NoAction));
        assert_eq!(fk.delete_rule, Some(ReferentialAction::Cascade));
        assert_eq!(fk.deferrable, Some(false));
    }

    #[test]
    fn positions_order_the_checks() {
        let rows = [
            fk_row("fk", "c3", "r3", Some(3)),
            fk_row("fk", "c1", "r1", Some(1)),
            fk_row("fk", "c2", "r2", Some(2)),
            fk_row("other", "x", "y", None),
        ];
        let scope = bare_scope(&POSTGRES_DIALECT);
        let objects: Vec<DatabaseObject> = rows
            .iter()
            .map(|row| ForeignKeysMapper.convert_to_object(row, &scope).unwrap())
            .collect();
        let merged = ForeignKeysMapper.merge(objects);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            checks(&merged[0]),
            vec![
                ("c1".to_string(), Some(1)),
                ("c2".to_string(), Some(2)),
                ("c3".to_string(), Some(3)),
            ]
        );
    }

    #[test]
    fn unnamed_keys_split_where_positions_restart() {
        let scope = bare_scope(&POSTGRES_DIALECT);
        let unnamed = |base: &str, referenced: &str, position: i64| {
            fk_row("", base, referenced, Some(position))
        };
        let objects = [
            unnamed("a1", "b1", 1),
            unnamed("a2", "b2", 2),
            unnamed("c1", "b1", 1),
            unnamed("c2", "b3", 2),
        ]
        .iter()
        .map(|row| ForeignKeysMapper.convert_to_object(row, &scope).unwrap())
        .collect();
        let merged = ForeignKeysMapper.merge(objects);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            checks(&merged[0]),
            vec![("a1".to_string(), Some(1)), ("a2".to_string(), Some(2))]
        );
        assert_eq!(
            checks(&merged[1]),
            vec![("c1".to_string(), Some(1)), ("c2".to_string(), Some(2))]
        );
    }

    #[test]
    fn missing_positions_fall_back_to_names() {
        let scope = bare_scope(&POSTGRES_DIALECT);
        let objects = [
            fk_row("fk", "zeta", "r", None),
            fk_row("fk", "alpha", "r", None),
            fk_row("fk", "mid", "r", Some(1)),
        ]
        .iter()
        .map(|row| ForeignKeysMapper.convert_to_object(row, &scope).unwrap())
        .collect();
        let merged = ForeignKeysMapper.merge(objects);
        assert_eq!(
            checks(&merged[0]),
            vec![
                ("mid".to_string(), Some(1)),
                ("alpha".to_string(), None),
                ("zeta".to_string(), None),
            ]
        );
    }
}
