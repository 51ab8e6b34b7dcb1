//! Changelog history: the table recording which change sets ran where.
//!
//! [`ChangeLogHistory`] only builds actions and hands them to the scope, so
//! the same calls produce live statements or an offline script depending on
//! the connection behind the scope.

use crate::action::{
    Action, ChangeSetRecord, CreateChangeLogTableAction, ExecType, MarkChangeSetRanAction,
    QuerySqlAction, SnapshotObjectsAction,
};
use crate::actionlogic::generic::CHANGELOG_COLUMNS;
use crate::actionlogic::ActionResult;
use crate::engine::value::Row;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{ObjectReference, ObjectType};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One row of the history table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RanChangeSet {
    pub id: String,
    pub author: String,
    pub file_path: String,
    pub date_executed: Option<NaiveDateTime>,
    pub order_executed: Option<i32>,
    pub exec_type: ExecType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

fn split_list(row: &Row, column: &str) -> Vec<String> {
    row.get_string(column)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl RanChangeSet {
    fn from_row(row: &Row) -> Result<Self> {
        let exec_type = match row.get_string("EXECTYPE") {
            Some(text) => text.parse()?,
            None => ExecType::Executed,
        };
        Ok(RanChangeSet {
            id: row.get_string("ID").unwrap_or_default(),
            author: row.get_string("AUTHOR").unwrap_or_default(),
            file_path: row.get_string("FILENAME").unwrap_or_default(),
            date_executed: row.get("DATEEXECUTED").and_then(|v| v.as_datetime()),
            order_executed: row.get_i32("ORDEREXECUTED"),
            exec_type,
            checksum: row.get_string("MD5SUM"),
            description: row.get_string("DESCRIPTION"),
            comments: row.get_string("COMMENTS"),
            tag: row.get_string("TAG"),
            deployment_id: row.get_string("DEPLOYMENT_ID"),
            contexts: split_list(row, "CONTEXTS"),
            labels: split_list(row, "LABELS"),
        })
    }

    /// Whether this row records `change_set`.
    pub fn is_same_as(&self, change_set: &ChangeSetRecord) -> bool {
        self.id == change_set.id
            && self.author == change_set.author
            && self.file_path == change_set.file_path
    }
}

/// Reads and writes the history table of one deployment.
pub struct ChangeLogHistory {
    deployment_id: String,
    last_order: Mutex<Option<i32>>,
}

impl Default for ChangeLogHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeLogHistory {
    pub fn new() -> Self {
        // Ten digits to fit DEPLOYMENT_ID.
        let millis = Utc::now().timestamp_millis().to_string();
        let start = millis.len().saturating_sub(10);
        Self::with_deployment_id(&millis[start..])
    }

    pub fn with_deployment_id(deployment_id: impl Into<String>) -> Self {
        ChangeLogHistory {
            deployment_id: deployment_id.into(),
            last_order: Mutex::new(None),
        }
    }

    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    /// Create the history table unless it already exists. Offline
    /// connections cannot look, so the DDL is always emitted there.
    ///
    /// Returns whether the table was created.
    pub async fn ensure_table(&self, scope: &Scope) -> Result<bool> {
        let table = scope.changelog_table();
        if !scope.database().is_offline() {
            let lookup: Action = SnapshotObjectsAction::new(
                ObjectType::Table,
                ObjectReference::table(table.clone()),
            )
            .into();
            let existing = scope.execute(&lookup).await?.into_objects();
            if !existing.is_empty() {
                debug!(table = %table, "History table already exists");
                return Ok(false);
            }
        }

        info!(table = %table, "Creating history table");
        let create: Action = CreateChangeLogTableAction { table }.into();
        scope.execute(&create).await?;
        Ok(true)
    }

    /// Every recorded change set, oldest first. Offline connections have no
    /// history to read.
    pub async fn ran_change_sets(&self, scope: &Scope) -> Result<Vec<RanChangeSet>> {
        let db = scope.database();
        if db.is_offline() {
            debug!("Offline connection, no ran change sets");
            return Ok(Vec::new());
        }
        let columns: Vec<&str> = CHANGELOG_COLUMNS.iter().map(|(name, _, _)| *name).collect();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} ASC, {} ASC",
            db.escape_column_list(&columns),
            db.escape_table_name(&scope.changelog_table()),
            db.escape_object_name("DATEEXECUTED", ObjectType::Column),
            db.escape_object_name("ORDEREXECUTED", ObjectType::Column),
        );
        let query: Action = QuerySqlAction::new(sql).into();
        scope
            .execute(&query)
            .await?
            .into_rows()
            .iter()
            .map(RanChangeSet::from_row)
            .collect()
    }

    /// Record `change_set` with the next ORDEREXECUTED value.
    pub async fn mark_ran(
        &self,
        change_set: &ChangeSetRecord,
        exec_type: ExecType,
        scope: &Scope,
    ) -> Result<ActionResult> {
        let order_executed = self.next_order(scope).await?;
        let action: Action = MarkChangeSetRanAction {
            change_set: change_set.clone(),
            exec_type,
            order_executed,
            deployment_id: Some(self.deployment_id.clone()),
            previously_ran: exec_type == ExecType::Reran,
        }
        .into();
        debug!(id = %change_set.id, exec_type = %exec_type, order_executed, "Marking change set");
        scope.execute(&action).await
    }

    async fn next_order(&self, scope: &Scope) -> Result<i32> {
        let mut last = self.last_order.lock().await;
        let current = match *last {
            Some(order) => order,
            None => self.max_order(scope).await?,
        };
        let next = current + 1;
        *last = Some(next);
        Ok(next)
    }

    async fn max_order(&self, scope: &Scope) -> Result<i32> {
        let db = scope.database();
        if db.is_offline() {
            return Ok(0);
        }
        let sql = format!(
            "SELECT MAX({}) AS MAX_ORDER FROM {}",
            db.escape_object_name("ORDEREXECUTED", ObjectType::Column),
            db.escape_table_name(&scope.changelog_table()),
        );
        let query: Action = QuerySqlAction::new(sql).into();
        let rows = scope.execute(&query).await?.into_rows();
        Ok(rows
            .first()
            .and_then(|row| row.get_i32("MAX_ORDER"))
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;
    use crate::engine::MetadataMethod;
    use crate::testing::{live_scope, offline_scope, FakeSession};
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use chrono::NaiveDate;

    fn history_row(id: &str, order: i64, exec_type: &str) -> Row {
        Row::new()
            .with("ID", id)
            .with("AUTHOR", "alice")
            .with("FILENAME", "db/changelog.xml")
            .with(
                "DATEEXECUTED",
                SqlValue::from_datetime(
                    NaiveDate::from_ymd_opt(2024, 5, 1)
                        .unwrap()
                        .and_hms_opt(9, 0, 0)
                        .unwrap(),
                ),
            )
            .with("ORDEREXECUTED", order)
            .with("EXECTYPE", exec_type)
            .with("MD5SUM", "9:abc")
            .with("CONTEXTS", "dev, test")
            .with("LABELS", SqlValue::Null)
    }

    #[tokio::test]
    async fn creates_missing_table() {
        let session = FakeSession::default();
        let executed = session.executed.clone();
        let calls = session.calls.clone();
        let scope = live_scope(&POSTGRES_DIALECT, session).await;

        let history = ChangeLogHistory::with_deployment_id("1");
        assert!(history.ensure_table(&scope).await.unwrap());

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].method, MetadataMethod::Tables);
        assert_eq!(calls[0].table.as_deref(), Some("databasechangelog"));
        let executed = executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].starts_with("CREATE TABLE public.DATABASECHANGELOG (ID VARCHAR(255) NOT NULL"));
    }

    #[tokio::test]
    async fn existing_table_is_left_alone() {
        let session = FakeSession::default().with_rows(
            MetadataMethod::Tables,
            vec![Row::new()
                .with("TABLE_SCHEM", "public")
                .with("TABLE_NAME", "databasechangelog")],
        );
        let executed = session.executed.clone();
        let scope = live_scope(&POSTGRES_DIALECT, session).await;

        let history = ChangeLogHistory::with_deployment_id("1");
        assert!(!history.ensure_table(&scope).await.unwrap());
        assert!(!history.ensure_table(&scope).await.unwrap());
        assert!(executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn quoted_history_table_keeps_its_case() {
        let session = FakeSession::default().with_rows(
            MetadataMethod::Tables,
            vec![Row::new()
                .with("TABLE_SCHEM", "public")
                .with("TABLE_NAME", "Change Log")],
        );
        let calls = session.calls.clone();
        let executed = session.executed.clone();
        let scope = live_scope(&POSTGRES_DIALECT, session)
            .await
            .with_value(crate::scope::CHANGELOG_TABLE_NAME, "Change Log");

        assert!(!ChangeLogHistory::new().ensure_table(&scope).await.unwrap());
        assert_eq!(calls.lock().unwrap()[0].table.as_deref(), Some("Change Log"));
        assert!(executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_always_creates() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let history = ChangeLogHistory::with_deployment_id("1");
        assert!(history.ensure_table(&scope).await.unwrap());
        assert!(history.ran_change_sets(&scope).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_ran_change_sets() {
        let session = FakeSession::default()
            .with_query_rows(vec![history_row("1", 1, "EXECUTED"), history_row("2", 2, "MARK_RAN")]);
        let scope = live_scope(&POSTGRES_DIALECT, session).await;

        let ran = ChangeLogHistory::with_deployment_id("1")
            .ran_change_sets(&scope)
            .await
            .unwrap();
        assert_eq!(ran.len(), 2);
        assert_eq!(ran[0].id, "1");
        assert_eq!(ran[0].contexts, vec!["dev", "test"]);
        assert!(ran[0].labels.is_empty());
        assert_eq!(ran[0].checksum.as_deref(), Some("9:abc"));
        assert_eq!(
            ran[0].date_executed.map(|d| d.to_string()).as_deref(),
            Some("2024-05-01 09:00:00")
        );
        assert_eq!(ran[1].exec_type, ExecType::MarkRan);
        assert!(ran[1].is_same_as(&ChangeSetRecord::new("2", "alice", "db/changelog.xml")));
    }

    #[tokio::test]
    async fn unknown_exec_type_is_an_error() {
        let session = FakeSession::default().with_query_rows(vec![history_row("1", 1, "LOST")]);
        let scope = live_scope(&POSTGRES_DIALECT, session).await;
        assert!(ChangeLogHistory::new().ran_change_sets(&scope).await.is_err());
    }

    #[tokio::test]
    async fn marks_with_increasing_order() {
        let session = FakeSession::default()
            .with_query_rows(vec![Row::new().with("MAX_ORDER", 7i64)]);
        let executed = session.executed.clone();
        let scope = live_scope(&POSTGRES_DIALECT, session).await;
        let history = ChangeLogHistory::with_deployment_id("42");

        let first = ChangeSetRecord::new("1", "alice", "db/changelog.xml");
        let second = ChangeSetRecord::new("2", "alice", "db/changelog.xml");
        history.mark_ran(&first, ExecType::Executed, &scope).await.unwrap();
        history.mark_ran(&second, ExecType::Executed, &scope).await.unwrap();

        let executed = executed.lock().unwrap();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].contains("VALUES ('1', 'alice', 'db/changelog.xml', NOW(), 8, "));
        assert!(executed[1].contains("VALUES ('2', 'alice', 'db/changelog.xml', NOW(), 9, "));
        assert!(executed[1].contains("'42'"));
    }

    #[tokio::test]
    async fn offline_orders_start_at_one() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let history = ChangeLogHistory::with_deployment_id("42");
        let change_set = ChangeSetRecord::new("1", "alice", "db/changelog.xml");
        history
            .mark_ran(&change_set, ExecType::Executed, &scope)
            .await
            .unwrap();
        assert_eq!(history.next_order(&scope).await.unwrap(), 2);
    }
}
