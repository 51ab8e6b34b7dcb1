//! Offline session: statements are recorded (and optionally written to a
//! script) instead of being executed, and snapshots come from a stored file.

use super::value::Row;
use super::{ConnectionKind, DbSession, MetadataQuery};
use crate::error::{ActionError, Result};
use crate::structure::DatabaseObject;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

#[derive(Default)]
pub struct OfflineSession {
    statements: Vec<String>,
    writer: Option<Box<dyn Write + Send>>,
    snapshot: Option<Vec<DatabaseObject>>,
    default_schema: Option<String>,
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

impl OfflineSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write each statement to `path`, gzip-compressed for `.gz` paths.
    pub fn with_output(mut self, path: &Path) -> Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        let writer: Box<dyn Write + Send> = if is_gzip(path) {
            Box::new(GzEncoder::new(file, Compression::default()))
        } else {
            Box::new(file)
        };
        self.writer = Some(writer);
        Ok(self)
    }

    pub fn with_snapshot(mut self, objects: Vec<DatabaseObject>) -> Self {
        self.snapshot = Some(objects);
        self
    }

    /// Load a stored snapshot: a JSON array of objects, optionally gzipped.
    pub fn load_snapshot(self, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if is_gzip(path) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let objects: Vec<DatabaseObject> = serde_json::from_reader(BufReader::new(reader))?;
        debug!(path = %path.display(), objects = objects.len(), "Loaded offline snapshot");
        Ok(self.with_snapshot(objects))
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Every statement executed so far, in order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[async_trait]
impl DbSession for OfflineSession {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Offline
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        debug!(sql, "Recording offline statement");
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{};", sql)?;
        }
        self.statements.push(sql.to_string());
        Ok(0)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        Err(ActionError::unsupported(format!(
            "Cannot run queries in offline mode: {}",
            sql
        )))
    }

    async fn metadata(&mut self, query: &MetadataQuery) -> Result<Vec<Row>> {
        Err(ActionError::unsupported(format!(
            "Cannot call {} in offline mode",
            query.method
        )))
    }

    async fn default_schema(&mut self) -> Result<Option<String>> {
        Ok(self.default_schema.clone())
    }

    async fn server_version(&mut self) -> Result<Option<String>> {
        Ok(None)
    }

    fn replay_snapshot(&self) -> Option<&[DatabaseObject]> {
        self.snapshot.as_deref()
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
