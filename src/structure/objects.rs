use super::{DataType, ObjectName, ObjectReference, ObjectType};
use crate::engine::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dialect-specific extras that have no dedicated field.
pub type Attributes = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub name: ObjectName,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: ObjectName,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Table {
    pub fn new(name: impl Into<ObjectName>) -> Self {
        Table {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoIncrementInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_with: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_by: Option<i64>,
}

/// A column; `name.container` is the owning relation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<AutoIncrementInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Column {
    pub fn new(name: impl Into<ObjectName>, data_type: DataType) -> Self {
        Column {
            name: name.into(),
            data_type: Some(data_type),
            ..Default::default()
        }
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment.is_some()
    }

    pub fn table(&self) -> Option<&ObjectName> {
        self.name.container()
    }

    pub fn simple_name(&self) -> Option<&str> {
        self.name.name()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
}

impl PrimaryKeyColumn {
    pub fn new(name: impl Into<String>) -> Self {
        PrimaryKeyColumn {
            name: name.into(),
            position: None,
            descending: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub table: ObjectName,
    pub columns: Vec<PrimaryKeyColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustered: Option<bool>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl PrimaryKey {
    pub fn new<I, S>(table: impl Into<ObjectName>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PrimaryKey {
            table: table.into(),
            columns: columns
                .into_iter()
                .enumerate()
                .map(|(idx, name)| PrimaryKeyColumn {
                    name: name.into(),
                    position: Some(idx as i32 + 1),
                    descending: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Identity used when merging per-column metadata rows.
    pub fn reference(&self) -> ObjectName {
        self.table.child_opt(self.name.as_deref())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Referential action for ON UPDATE / ON DELETE.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferentialAction {
    pub fn sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }

    /// Decode the numeric rule codes used by catalog metadata.
    pub fn from_metadata_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ReferentialAction::Cascade),
            1 => Some(ReferentialAction::Restrict),
            2 => Some(ReferentialAction::SetNull),
            3 => Some(ReferentialAction::NoAction),
            4 => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }
}

/// One base/referenced column pair of a foreign key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyColumnCheck {
    pub base_column: String,
    pub referenced_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl ForeignKeyColumnCheck {
    pub fn new(base_column: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        ForeignKeyColumnCheck {
            base_column: base_column.into(),
            referenced_column: referenced_column.into(),
            position: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub table: ObjectName,
    pub referenced_table: ObjectName,
    pub column_checks: Vec<ForeignKeyColumnCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferrable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initially_deferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl ForeignKey {
    pub fn reference(&self) -> ObjectName {
        self.table.child_opt(self.name.as_deref())
    }

    pub fn base_columns(&self) -> Vec<&str> {
        self.column_checks
            .iter()
            .map(|c| c.base_column.as_str())
            .collect()
    }

    pub fn referenced_columns(&self) -> Vec<&str> {
        self.column_checks
            .iter()
            .map(|c| c.referenced_column.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub table: ObjectName,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferrable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initially_deferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub table: ObjectName,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablespace: Option<String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<bool>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

/// Snapshot representation of any supported object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DatabaseObject {
    Catalog(Catalog),
    Schema(Schema),
    Table(Table),
    View(View),
    Column(Column),
    Sequence(Sequence),
    Index(Index),
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    UniqueConstraint(UniqueConstraint),
}

impl DatabaseObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            DatabaseObject::Catalog(_) => ObjectType::Catalog,
            DatabaseObject::Schema(_) => ObjectType::Schema,
            DatabaseObject::Table(_) => ObjectType::Table,
            DatabaseObject::View(_) => ObjectType::View,
            DatabaseObject::Column(_) => ObjectType::Column,
            DatabaseObject::Sequence(_) => ObjectType::Sequence,
            DatabaseObject::Index(_) => ObjectType::Index,
            DatabaseObject::PrimaryKey(_) => ObjectType::PrimaryKey,
            DatabaseObject::ForeignKey(_) => ObjectType::ForeignKey,
            DatabaseObject::UniqueConstraint(_) => ObjectType::UniqueConstraint,
        }
    }

    /// Fully qualified identity of this object.
    pub fn name(&self) -> ObjectName {
        match self {
            DatabaseObject::Catalog(o) => o.name.clone(),
            DatabaseObject::Schema(o) => o.name.clone(),
            DatabaseObject::Table(o) => o.name.clone(),
            DatabaseObject::View(o) => o.name.clone(),
            DatabaseObject::Column(o) => o.name.clone(),
            DatabaseObject::Sequence(o) => o.name.clone(),
            DatabaseObject::Index(o) => o.table.child_opt(o.name.as_deref()),
            DatabaseObject::PrimaryKey(o) => o.reference(),
            DatabaseObject::ForeignKey(o) => o.reference(),
            DatabaseObject::UniqueConstraint(o) => o.table.child_opt(o.name.as_deref()),
        }
    }

    pub fn reference(&self) -> ObjectReference {
        ObjectReference::new(self.object_type(), self.name())
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            DatabaseObject::Catalog(_) | DatabaseObject::Schema(_) => None,
            DatabaseObject::Table(o) => Some(&o.attributes),
            DatabaseObject::View(o) => Some(&o.attributes),
            DatabaseObject::Column(o) => Some(&o.attributes),
            DatabaseObject::Sequence(o) => Some(&o.attributes),
            DatabaseObject::Index(o) => Some(&o.attributes),
            DatabaseObject::PrimaryKey(o) => Some(&o.attributes),
            DatabaseObject::ForeignKey(o) => Some(&o.attributes),
            DatabaseObject::UniqueConstraint(o) => Some(&o.attributes),
        }
    }

    /// Whether this object is, or lives inside, the referenced object.
    pub fn is_related_to(&self, related: &ObjectReference) -> bool {
        let own = self.name();
        if related.object_type == self.object_type()
            || (related.object_type.is_relation() && self.object_type().is_relation())
        {
            return own.matches(&related.name);
        }
        let mut container = own.container();
        while let Some(level) = container {
            if level.name.is_some() && level.matches(&related.name) {
                return true;
            }
            container = level.container();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_is_related_to_its_table_and_schema() {
        let column = DatabaseObject::Column(Column::new(
            ObjectName::parse("public.users.id"),
            DataType::new("int"),
        ));
        assert!(column.is_related_to(&ObjectReference::table("users")));
        assert!(column.is_related_to(&ObjectReference::schema("public")));
        assert!(!column.is_related_to(&ObjectReference::table("orders")));
    }

    #[test]
    fn foreign_key_identity_is_table_scoped() {
        let fk = ForeignKey {
            name: Some("fk_a".into()),
            table: ObjectName::parse("s.orders"),
            referenced_table: ObjectName::parse("s.users"),
            ..Default::default()
        };
        assert_eq!(fk.reference(), ObjectName::parse("s.orders.fk_a"));
    }

    #[test]
    fn round_trips_tagged_json() {
        let object = DatabaseObject::Table(Table::new("public.users"));
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["type"], "table");
        let back: DatabaseObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, object);
    }
}
