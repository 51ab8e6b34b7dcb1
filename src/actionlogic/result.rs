use crate::action::Action;
use crate::engine::value::Row;
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::DatabaseObject;
use std::fmt;
use std::sync::Arc;

/// Post-processing applied to a delegated result before it is returned as
/// the result of the delegating action.
pub trait ResultModifier: Send + Sync {
    fn modify(&self, result: ActionResult, action: &Action, scope: &Scope) -> Result<ActionResult>;
}

/// Outcome of executing one logic.
///
/// `Rewrite` and `Delegate` are intermediate: the resolver keeps resolving
/// until only terminal variants remain.
#[derive(Clone)]
pub enum ActionResult {
    /// Replace the action with these actions, each resolved from scratch.
    Rewrite(Vec<Action>),
    /// Resolve these actions and return their result, optionally modified.
    Delegate {
        actions: Vec<Action>,
        modifier: Option<Arc<dyn ResultModifier>>,
    },
    Rows(Vec<Row>),
    Objects(Vec<DatabaseObject>),
    Update(u64),
    NoOp,
    /// Results of several sub-actions in emitted order.
    Compound(Vec<ActionResult>),
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Rewrite(actions) => f.debug_tuple("Rewrite").field(actions).finish(),
            ActionResult::Delegate { actions, modifier } => f
                .debug_struct("Delegate")
                .field("actions", actions)
                .field("modified", &modifier.is_some())
                .finish(),
            ActionResult::Rows(rows) => f.debug_tuple("Rows").field(rows).finish(),
            ActionResult::Objects(objects) => f.debug_tuple("Objects").field(objects).finish(),
            ActionResult::Update(count) => f.debug_tuple("Update").field(count).finish(),
            ActionResult::NoOp => f.write_str("NoOp"),
            ActionResult::Compound(results) => f.debug_tuple("Compound").field(results).finish(),
        }
    }
}

impl ActionResult {
    pub fn delegate(action: impl Into<Action>) -> Self {
        ActionResult::Delegate {
            actions: vec![action.into()],
            modifier: None,
        }
    }

    pub fn delegate_all(actions: Vec<Action>) -> Self {
        ActionResult::Delegate {
            actions,
            modifier: None,
        }
    }

    pub fn delegate_with(action: impl Into<Action>, modifier: Arc<dyn ResultModifier>) -> Self {
        ActionResult::Delegate {
            actions: vec![action.into()],
            modifier: Some(modifier),
        }
    }

    /// Collapse sub-results: none is a no-op, one is returned as is.
    pub fn combine(mut results: Vec<ActionResult>) -> Self {
        match results.len() {
            0 => ActionResult::NoOp,
            1 => results.remove(0),
            _ => ActionResult::Compound(results),
        }
    }

    /// Rows of this result, flattening compound results.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            ActionResult::Rows(rows) => rows,
            ActionResult::Compound(results) => {
                results.into_iter().flat_map(ActionResult::into_rows).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Objects of this result, flattening compound results.
    pub fn into_objects(self) -> Vec<DatabaseObject> {
        match self {
            ActionResult::Objects(objects) => objects,
            ActionResult::Compound(results) => results
                .into_iter()
                .flat_map(ActionResult::into_objects)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Total affected rows of update results.
    pub fn update_count(&self) -> u64 {
        match self {
            ActionResult::Update(count) => *count,
            ActionResult::Compound(results) => results.iter().map(ActionResult::update_count).sum(),
            _ => 0,
        }
    }
}
