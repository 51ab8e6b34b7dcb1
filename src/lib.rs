//! Database-independent schema changes, resolved per database into SQL.
//!
//! Callers describe an [`Action`] and execute it in a [`Scope`]. The
//! [`ActionLogicRegistry`] picks the single best logic for the action and
//! the scope's database, and follows rewrites and delegations until the
//! action has been turned into statements, rows or snapshot objects.

pub mod action;
pub mod actionlogic;
pub mod changelog;
pub mod engine;
pub mod error;
pub mod scope;
pub mod snapshot;
pub mod structure;
pub mod util;

#[cfg(test)]
mod testing;

pub use action::{Action, ActionKind};
pub use actionlogic::{ActionLogic, ActionLogicRegistry, ActionResult, ValidationErrors};
pub use changelog::{ChangeLogHistory, RanChangeSet};
pub use engine::{create_engine, Database, QuotingStrategy};
pub use error::{ActionError, Result};
pub use scope::Scope;
pub use structure::{DatabaseObject, ObjectName, ObjectReference, ObjectType};
