use crate::engine::value::SqlValue;
use crate::structure::ObjectName;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDataAction {
    pub table: ObjectName,
    pub columns: Vec<String>,
    /// One value per column in each row.
    pub rows: Vec<Vec<SqlValue>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataAction {
    pub table: ObjectName,
    /// Column assignments in SET order.
    pub values: Vec<(String, SqlValue)>,
    /// Condition text; each `?` is replaced by the next of `where_params`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub where_params: Vec<SqlValue>,
}
