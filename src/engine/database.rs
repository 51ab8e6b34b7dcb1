//! Per-connection capability provider.
//!
//! A [`Database`] pairs a dialect's static capability table with an optional
//! session. Values that have to be asked of the server (version, current
//! schema) are read once when a session is attached and cached on the
//! instance until the session is replaced.

use super::dialect::{is_simple_identifier, Capabilities, SqlDialect};
use super::typemap;
use super::value::{Row, SqlValue};
use super::{ConnectionKind, DbEngine, DbSession, MetadataQuery};
use crate::error::{ActionError, Result};
use crate::structure::{DataType, DatabaseObject, ObjectName, ObjectType};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Session shared by every logic running inside one scope.
pub type SharedSession = Arc<Mutex<Box<dyn DbSession>>>;

/// When object names are wrapped in quote characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuotingStrategy {
    /// Quote only reserved words and names that are not plain identifiers.
    #[default]
    Legacy,
    QuoteAll,
}

pub struct Database {
    dialect: Arc<dyn SqlDialect>,
    session: Option<SharedSession>,
    connection_kind: Option<ConnectionKind>,
    quoting: QuotingStrategy,
    default_schema: Option<String>,
    server_version: Option<String>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.name())
            .field("connection_kind", &self.connection_kind)
            .field("quoting", &self.quoting)
            .field("default_schema", &self.default_schema)
            .field("server_version", &self.server_version)
            .finish()
    }
}

impl Database {
    /// A database with no connection; SQL can be generated but not run.
    pub fn new(dialect: Arc<dyn SqlDialect>) -> Self {
        Database {
            dialect,
            session: None,
            connection_kind: None,
            quoting: QuotingStrategy::default(),
            default_schema: None,
            server_version: None,
        }
    }

    /// Connect through an engine and attach the session.
    pub async fn connect(engine: &dyn DbEngine, url: &str) -> Result<Self> {
        let session = engine.connect(url).await?;
        let mut database = Database::new(engine.dialect());
        database.set_session(session).await?;
        Ok(database)
    }

    /// Attach a session, replacing any previous one and refreshing cached values.
    pub async fn set_session(&mut self, mut session: Box<dyn DbSession>) -> Result<()> {
        self.connection_kind = Some(session.kind());
        self.default_schema = session.default_schema().await?;
        self.server_version = session.server_version().await?;
        debug!(
            dialect = self.dialect.name(),
            default_schema = ?self.default_schema,
            server_version = ?self.server_version,
            "Attached session"
        );
        self.session = Some(Arc::new(Mutex::new(session)));
        Ok(())
    }

    pub fn with_quoting(mut self, quoting: QuotingStrategy) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.dialect.capabilities()
    }

    pub fn short_name(&self) -> String {
        self.dialect.kind().to_string()
    }

    pub fn connection_kind(&self) -> Option<ConnectionKind> {
        self.connection_kind
    }

    pub fn is_offline(&self) -> bool {
        self.connection_kind == Some(ConnectionKind::Offline)
    }

    pub fn is_live(&self) -> bool {
        self.connection_kind == Some(ConnectionKind::Live)
    }

    pub fn default_schema_name(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }

    /// Leading number of the server version string, e.g. `16` for "16.2".
    pub fn server_major_version(&self) -> Option<u32> {
        let version = self.server_version.as_deref()?;
        let digits: String = version
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    pub fn session(&self) -> Result<&SharedSession> {
        self.session
            .as_ref()
            .ok_or_else(|| ActionError::unsupported("Database has no open connection"))
    }

    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let mut session = self.session()?.lock().await;
        session.execute(sql).await
    }

    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut session = self.session()?.lock().await;
        session.query(sql).await
    }

    pub async fn metadata(&self, query: &MetadataQuery) -> Result<Vec<Row>> {
        let mut session = self.session()?.lock().await;
        session.metadata(query).await
    }

    /// Objects of the stored snapshot, when the session replays one.
    pub async fn replay_snapshot(&self) -> Result<Option<Vec<DatabaseObject>>> {
        let session = self.session()?.lock().await;
        Ok(session.replay_snapshot().map(<[DatabaseObject]>::to_vec))
    }

    /// Flush buffered session output, such as an offline script.
    pub async fn finish(&self) -> Result<()> {
        let mut session = self.session()?.lock().await;
        session.finish().await
    }

    fn needs_quotes(&self, name: &str) -> bool {
        match self.quoting {
            QuotingStrategy::QuoteAll => true,
            QuotingStrategy::Legacy => {
                !is_simple_identifier(name) || self.dialect.is_reserved_word(name)
            }
        }
    }

    /// Escape one name component according to the quoting strategy.
    pub fn escape_object_name(&self, name: &str, _object_type: ObjectType) -> String {
        if self.needs_quotes(name) {
            self.dialect.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// The name as the catalog holds it once written through
    /// [`Self::escape_object_name`]. Quoted names keep their case.
    pub fn stored_case(&self, name: &str) -> String {
        if self.needs_quotes(name) {
            name.to_string()
        } else {
            self.dialect.stored_case(name)
        }
    }

    pub fn stored_name(&self, name: &ObjectName) -> ObjectName {
        name.map_names(&|part: &str| self.stored_case(part))
    }

    /// Escape a qualified name, dropping container levels the database does
    /// not model and skipping unknown levels.
    pub fn escape_qualified_name(&self, name: &ObjectName, object_type: ObjectType) -> String {
        let depth = self.capabilities().max_container_depth;
        let levels = match object_type {
            ObjectType::Catalog | ObjectType::Schema => 1,
            ObjectType::Column => depth + 2,
            _ => depth + 1,
        };
        name.truncate(levels)
            .parts()
            .into_iter()
            .flatten()
            .map(|part| self.escape_object_name(&part, object_type))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn escape_table_name(&self, name: &ObjectName) -> String {
        self.escape_qualified_name(name, ObjectType::Table)
    }

    /// Comma separated escaped column names.
    pub fn escape_column_list<S: AsRef<str>>(&self, columns: &[S]) -> String {
        columns
            .iter()
            .map(|c| self.escape_object_name(c.as_ref(), ObjectType::Column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn literal(&self, value: &SqlValue) -> String {
        self.dialect.to_literal(value)
    }

    pub fn default_value_sql(&self, value: &SqlValue, data_type: Option<&DataType>) -> String {
        typemap::default_value_sql(value, data_type, self.dialect())
    }

    pub fn data_type_sql(&self, data_type: &DataType, auto_increment: bool) -> String {
        self.dialect.data_type_sql(data_type, auto_increment)
    }

    /// Whether `name` fits the database's identifier length limit.
    pub fn is_identifier_length_ok(&self, name: &str) -> bool {
        self.capabilities()
            .max_identifier_length
            .map_or(true, |max| name.chars().count() <= max)
    }
}
