use crate::engine::value::SqlValue;
use crate::structure::{
    Column, DataType, ForeignKey, Index, ObjectName, PrimaryKey, Sequence, Table,
    UniqueConstraint,
};
use crate::util::string_clauses::StringClauses;
use serde::Serialize;

/// `ALTER TABLE <table> <clauses>`; the clauses are built by the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterTableAction {
    pub table: ObjectName,
    pub clauses: StringClauses,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddColumnsAction {
    /// Columns to add; each name's container is the table.
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableAction {
    pub table: Table,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableAsSelectAction {
    pub table: ObjectName,
    pub select_sql: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTablesAction {
    pub tables: Vec<ObjectName>,
    #[serde(default)]
    pub cascade_constraints: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropColumnsAction {
    /// Column names qualified by their table.
    pub columns: Vec<ObjectName>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForeignKeysAction {
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPrimaryKeysAction {
    pub primary_keys: Vec<PrimaryKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUniqueConstraintsAction {
    pub unique_constraints: Vec<UniqueConstraint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAutoIncrementAction {
    pub column: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_with: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_by: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNotNullConstraintAction {
    pub column: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Value written into existing NULL rows before the constraint is added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_null_value: Option<SqlValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDefaultValueAction {
    pub column: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SqlValue>,
}

/// Move the distinct values of a column into a new lookup table and point
/// the column at it with a foreign key.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLookupTableAction {
    pub existing_column: ObjectName,
    /// Column of the new table; its container is the new table.
    pub new_column: ObjectName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_column_data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSequenceAction {
    pub sequence: Sequence,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropSequencesAction {
    pub sequences: Vec<ObjectName>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexesAction {
    pub indexes: Vec<Index>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateViewAction {
    pub view: ObjectName,
    pub select_sql: String,
    #[serde(default)]
    pub replace_if_exists: bool,
}
