pub mod database;
pub mod dialect;
pub mod mysql;
pub mod offline;
pub mod postgres;
pub mod typemap;
pub mod value;

use crate::error::{ActionError, Result};
use crate::structure::DatabaseObject;
use crate::engine::dialect::SqlDialect;
use crate::engine::value::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use database::{Database, QuotingStrategy, SharedSession};

/// How a session reaches its database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Connected to a running server that answers catalog metadata queries.
    Live,
    /// Statements are recorded instead of executed.
    Offline,
}

/// Catalog introspection methods, named after their JDBC counterparts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataMethod {
    Tables,
    Columns,
    ImportedKeys,
    PrimaryKeys,
}

impl fmt::Display for MetadataMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MetadataMethod::Tables => "getTables",
            MetadataMethod::Columns => "getColumns",
            MetadataMethod::ImportedKeys => "getImportedKeys",
            MetadataMethod::PrimaryKeys => "getPrimaryKeys",
        })
    }
}

/// One introspection call with its positional arguments.
///
/// `None` arguments are wildcards, except `schema` which means the
/// connection's current schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataQuery {
    pub method: MetadataMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl MetadataQuery {
    pub fn new(method: MetadataMethod) -> Self {
        MetadataQuery {
            method,
            catalog: None,
            schema: None,
            table: None,
            column: None,
        }
    }
}

/// Database engine trait for provider abstraction
#[async_trait]
pub trait DbEngine: Send + Sync {
    /// Connect to a database using the provider's URL format
    async fn connect(&self, url: &str) -> Result<Box<dyn DbSession>>;

    /// Dialect spoken by sessions of this engine.
    fn dialect(&self) -> Arc<dyn SqlDialect>;
}

/// Active database session for executing statements and introspection.
#[async_trait]
pub trait DbSession: Send {
    fn kind(&self) -> ConnectionKind;

    /// Execute a raw SQL statement, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a query and collect its rows.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Answer a catalog introspection call with JDBC-named columns.
    async fn metadata(&mut self, query: &MetadataQuery) -> Result<Vec<Row>>;

    async fn default_schema(&mut self) -> Result<Option<String>>;

    async fn server_version(&mut self) -> Result<Option<String>>;

    /// Stored snapshot served in place of live introspection.
    fn replay_snapshot(&self) -> Option<&[DatabaseObject]> {
        None
    }

    /// Flush any buffered output; the session stays usable.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Factory for creating database engines
pub fn create_engine(provider: &str) -> Result<Box<dyn DbEngine>> {
    match provider.to_lowercase().as_str() {
        "mysql" => Ok(Box::new(mysql::MysqlEngine)),
        "postgres" | "postgresql" => Ok(Box::new(postgres::PostgresEngine)),
        _ => Err(ActionError::unsupported(format!(
            "Unsupported database provider: {}",
            provider
        ))),
    }
}
