//! Layered, read-only context threaded through every resolution.
//!
//! A [`Scope`] carries the database being targeted, the logic registry and a
//! chain of value frames. Child scopes add frames; an existing scope is never
//! changed, so one scope can be shared by independent resolutions.

use crate::action::Action;
use crate::actionlogic::{ActionLogicRegistry, ActionResult};
use crate::engine::Database;
use crate::error::Result;
use crate::structure::ObjectName;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the changelog history table.
pub const CHANGELOG_TABLE_NAME: &str = "changeLogTableName";
/// Schema holding the changelog history table; the current schema when unset.
pub const CHANGELOG_SCHEMA_NAME: &str = "changeLogSchemaName";

pub const DEFAULT_CHANGELOG_TABLE: &str = "DATABASECHANGELOG";

#[derive(Debug)]
struct Frame {
    parent: Option<Arc<Frame>>,
    values: HashMap<String, Value>,
}

#[derive(Clone)]
pub struct Scope {
    database: Arc<Database>,
    registry: Arc<ActionLogicRegistry>,
    frame: Option<Arc<Frame>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("database", &self.database)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Scope {
    pub fn new(database: Arc<Database>, registry: Arc<ActionLogicRegistry>) -> Self {
        Scope {
            database,
            registry,
            frame: None,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn registry(&self) -> &ActionLogicRegistry {
        &self.registry
    }

    /// New scope whose lookups fall back to this one.
    pub fn child<I, K>(&self, values: I) -> Scope
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Scope {
            database: Arc::clone(&self.database),
            registry: Arc::clone(&self.registry),
            frame: Some(Arc::new(Frame {
                parent: self.frame.clone(),
                values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            })),
        }
    }

    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Scope {
        self.child([(key.into(), value.into())])
    }

    /// Closest value for `key`, searching from the innermost frame outwards.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut frame = self.frame.as_deref();
        while let Some(current) = frame {
            if let Some(value) = current.values.get(key) {
                return Some(value);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    /// String form of a value; non-string JSON values are rendered as JSON.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn changelog_table_name(&self) -> String {
        self.get_or(CHANGELOG_TABLE_NAME, DEFAULT_CHANGELOG_TABLE)
    }

    pub fn changelog_schema_name(&self) -> Option<String> {
        self.get_string(CHANGELOG_SCHEMA_NAME)
    }

    /// Qualified name of the changelog history table.
    pub fn changelog_table(&self) -> ObjectName {
        let schema = self
            .changelog_schema_name()
            .or_else(|| self.database.default_schema_name().map(str::to_string));
        ObjectName::from_parts([schema, Some(self.changelog_table_name())])
    }

    /// Resolve and run `action` in this scope.
    pub async fn execute(&self, action: &Action) -> Result<ActionResult> {
        self.registry.execute(action, self).await
    }
}
