//! Scopes and sessions shared by unit tests.

use crate::actionlogic::ActionLogicRegistry;
use crate::engine::dialect::SqlDialect;
use crate::engine::offline::OfflineSession;
use crate::engine::value::Row;
use crate::engine::{ConnectionKind, Database, DbSession, MetadataMethod, MetadataQuery};
use crate::error::Result;
use crate::scope::Scope;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Scope without a connection, for logic that only needs capabilities.
pub(crate) fn bare_scope<D>(dialect: &D) -> Scope
where
    D: SqlDialect + Clone + 'static,
{
    Scope::new(
        Arc::new(Database::new(Arc::new(dialect.clone()))),
        Arc::new(ActionLogicRegistry::with_builtins()),
    )
}

pub(crate) async fn offline_scope_with<D>(dialect: &D, registry: ActionLogicRegistry) -> Scope
where
    D: SqlDialect + Clone + 'static,
{
    let mut database = Database::new(Arc::new(dialect.clone()));
    database
        .set_session(Box::new(OfflineSession::new().with_default_schema("public")))
        .await
        .unwrap();
    Scope::new(Arc::new(database), Arc::new(registry))
}

pub(crate) async fn offline_scope<D>(dialect: &D) -> Scope
where
    D: SqlDialect + Clone + 'static,
{
    offline_scope_with(dialect, ActionLogicRegistry::with_builtins()).await
}

/// Live session answering metadata calls with canned rows and recording
/// every call it receives.
#[derive(Default)]
pub(crate) struct FakeSession {
    rows: HashMap<MetadataMethod, Vec<Row>>,
    query_rows: Vec<Row>,
    version: Option<String>,
    pub calls: Arc<Mutex<Vec<MetadataQuery>>>,
    pub executed: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn with_rows(mut self, method: MetadataMethod, rows: Vec<Row>) -> Self {
        self.rows.insert(method, rows);
        self
    }

    pub fn with_query_rows(mut self, rows: Vec<Row>) -> Self {
        self.query_rows = rows;
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }
}

#[async_trait]
impl DbSession for FakeSession {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Live
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(1)
    }

    async fn query(&mut self, _sql: &str) -> Result<Vec<Row>> {
        Ok(self.query_rows.clone())
    }

    async fn metadata(&mut self, query: &MetadataQuery) -> Result<Vec<Row>> {
        self.calls.lock().unwrap().push(query.clone());
        Ok(self.rows.get(&query.method).cloned().unwrap_or_default())
    }

    async fn default_schema(&mut self) -> Result<Option<String>> {
        Ok(Some("public".to_string()))
    }

    async fn server_version(&mut self) -> Result<Option<String>> {
        Ok(Some(self.version.clone().unwrap_or_else(|| "16.2".to_string())))
    }
}

pub(crate) async fn live_scope<D>(dialect: &D, session: FakeSession) -> Scope
where
    D: SqlDialect + Clone + 'static,
{
    let mut database = Database::new(Arc::new(dialect.clone()));
    database.set_session(Box::new(session)).await.unwrap();
    Scope::new(Arc::new(database), Arc::new(ActionLogicRegistry::with_builtins()))
}
