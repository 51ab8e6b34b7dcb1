use crate::error::{ActionError, Result};
use crate::structure::ObjectName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of running a change set, as stored in the history table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecType {
    #[default]
    Executed,
    Failed,
    Skipped,
    Reran,
    MarkRan,
}

impl ExecType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecType::Executed => "EXECUTED",
            ExecType::Failed => "FAILED",
            ExecType::Skipped => "SKIPPED",
            ExecType::Reran => "RERAN",
            ExecType::MarkRan => "MARK_RAN",
        }
    }

    /// Whether a history row is written for this outcome.
    pub fn is_recorded(&self) -> bool {
        !matches!(self, ExecType::Failed | ExecType::Skipped)
    }
}

impl fmt::Display for ExecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecType {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EXECUTED" => Ok(ExecType::Executed),
            "FAILED" => Ok(ExecType::Failed),
            "SKIPPED" => Ok(ExecType::Skipped),
            "RERAN" => Ok(ExecType::Reran),
            "MARK_RAN" => Ok(ExecType::MarkRan),
            other => Err(ActionError::unexpected(format!("Unknown exec type '{}'", other))),
        }
    }
}

/// Identity and descriptive fields of one change set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetRecord {
    pub id: String,
    pub author: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl ChangeSetRecord {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        ChangeSetRecord {
            id: id.into(),
            author: author.into(),
            file_path: file_path.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChangeLogTableAction {
    pub table: ObjectName,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkChangeSetRanAction {
    pub change_set: ChangeSetRecord,
    pub exec_type: ExecType,
    pub order_executed: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    /// The change set already has a history row that must be updated.
    #[serde(default)]
    pub previously_ran: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_types_round_trip_text() {
        for exec in [
            ExecType::Executed,
            ExecType::Failed,
            ExecType::Skipped,
            ExecType::Reran,
            ExecType::MarkRan,
        ] {
            assert_eq!(exec.as_str().parse::<ExecType>().unwrap(), exec);
        }
        assert!(!ExecType::Skipped.is_recorded());
        assert!(ExecType::MarkRan.is_recorded());
    }
}
