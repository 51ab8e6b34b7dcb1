use crate::engine::value::SqlValue;
use crate::engine::Database;
use crate::error::{ActionError, Result};
use crate::structure::{DataType, ObjectName};
use std::fmt;
use tracing::warn;

/// Whether an attribute counts as supplied.
pub trait FieldValue {
    fn is_set(&self) -> bool;
}

impl<T> FieldValue for Option<T> {
    fn is_set(&self) -> bool {
        self.is_some()
    }
}

impl<T> FieldValue for Vec<T> {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}

impl FieldValue for String {
    fn is_set(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl FieldValue for &str {
    fn is_set(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl FieldValue for bool {
    fn is_set(&self) -> bool {
        *self
    }
}

impl FieldValue for ObjectName {
    fn is_set(&self) -> bool {
        self.name.is_some()
    }
}

impl FieldValue for DataType {
    fn is_set(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl FieldValue for SqlValue {
    fn is_set(&self) -> bool {
        !self.is_null()
    }
}

/// Every problem found with one action, collected in a single pass.
///
/// Errors block execution; warnings are reported and execution continues.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.errors.push(message.into());
        self
    }

    pub fn add_warning(&mut self, message: impl Into<String>) -> &mut Self {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
        self
    }

    pub fn add_unsupported_error(&mut self, feature: &str, database: &str) -> &mut Self {
        self.add_error(format!("{} is not supported on {}", feature, database))
    }

    pub fn check_required_field(&mut self, field: &str, value: &impl FieldValue) -> &mut Self {
        if !value.is_set() {
            self.add_error(format!("{} is required", field));
        }
        self
    }

    /// Error when a field the database cannot honour was supplied.
    pub fn check_disallowed_field(
        &mut self,
        field: &str,
        value: &impl FieldValue,
        database: &str,
    ) -> &mut Self {
        if value.is_set() {
            self.add_error(format!("{} is not allowed on {}", field, database));
        }
        self
    }

    /// Error when a name lacks the container it needs, e.g. a column without a table.
    pub fn check_required_container(&mut self, field: &str, name: &ObjectName) -> &mut Self {
        if name.container().map_or(true, |c| c.name.is_none()) {
            self.add_error(format!("{} must be qualified with its container", field));
        }
        self
    }

    /// Error when a name is longer than the database accepts.
    pub fn check_identifier_length(
        &mut self,
        field: &str,
        name: Option<&str>,
        db: &Database,
    ) -> &mut Self {
        if let (Some(name), Some(max)) = (name, db.capabilities().max_identifier_length) {
            if !db.is_identifier_length_ok(name) {
                self.add_error(format!(
                    "{} {} is longer than the {} characters allowed on {}",
                    field,
                    name,
                    max,
                    db.short_name()
                ));
            }
        }
        self
    }

    /// Error when a default value cannot be stored in the declared type.
    pub fn check_value_type(
        &mut self,
        field: &str,
        value: Option<&SqlValue>,
        data_type: Option<&DataType>,
    ) -> &mut Self {
        if let (Some(value), Some(data_type)) = (value, data_type) {
            if let Err(message) = crate::engine::typemap::check_value_matches_type(value, data_type) {
                self.add_error(format!("{}: {}", field, message));
            }
        }
        self
    }

    pub fn merge(&mut self, other: ValidationErrors) -> &mut Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// `Err(Validation)` when any error was recorded, otherwise the warnings.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.has_errors() {
            Err(ActionError::Validation(self))
        } else {
            Ok(self.warnings)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join("; "))?;
        if !self.warnings.is_empty() {
            write!(f, " (warnings: {})", self.warnings.join("; "))?;
        }
        Ok(())
    }
}
