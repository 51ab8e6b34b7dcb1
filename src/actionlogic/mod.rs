//! Logic handlers and the resolver that picks one per action.
//!
//! A logic declares the action kind it serves, whether it applies to a scope
//! and at what priority. The registry selects the single highest priority
//! applicable logic, validates the action with it and executes it, following
//! rewrite and delegate results until a terminal result is reached.

pub mod dialect;
pub mod generic;
mod registry;
mod result;
pub mod snapshot;
mod template;
mod validation;

pub use registry::{ActionLogicRegistry, ExecutionReport};
pub use result::{ActionResult, ResultModifier};
pub use template::TemplateLogic;
pub use validation::{FieldValue, ValidationErrors};

use crate::action::{Action, ActionKind};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{AutoIncrementInfo, DataType, ObjectName};
use async_trait::async_trait;

/// The logic does not apply and must not be selected.
pub const PRIORITY_NOT_APPLICABLE: i32 = -1;
/// Generic logic that works for any database.
pub const PRIORITY_DEFAULT: i32 = 1;
/// Logic specific to one database, preferred over the generic one.
pub const PRIORITY_DATABASE: i32 = 5;

#[async_trait]
pub trait ActionLogic: Send + Sync {
    /// Identifies the logic in logs and ambiguity errors.
    fn name(&self) -> &str;

    fn supported_action(&self) -> ActionKind;

    /// Cheap check on the scope, typically the database kind or connection.
    fn supports_scope(&self, _scope: &Scope) -> bool {
        true
    }

    fn priority(&self, _action: &Action, _scope: &Scope) -> i32 {
        PRIORITY_DEFAULT
    }

    /// Collect every problem with `action`; only errors block execution.
    fn validate(&self, _action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        Ok(ValidationErrors::new())
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult>;

    /// Auto-increment clause generation, for logics that can provide it.
    fn as_auto_increment(&self) -> Option<&dyn AutoIncrementClause> {
        None
    }
}

/// Column-definition fragment that makes a column auto-increment.
pub trait AutoIncrementClause: Send + Sync {
    fn auto_increment_clause(
        &self,
        info: &AutoIncrementInfo,
        data_type: Option<&DataType>,
        scope: &Scope,
    ) -> String;

    /// Statements that must follow the column definition, e.g. to set the
    /// start value where the clause cannot carry it.
    fn follow_up_actions(
        &self,
        _column: &ObjectName,
        _info: &AutoIncrementInfo,
        _scope: &Scope,
    ) -> Vec<Action> {
        Vec::new()
    }
}
