use super::{ActionLogic, ActionResult, TemplateLogic, PRIORITY_NOT_APPLICABLE};
use crate::action::Action;
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Terminal result of a resolution plus every validation warning raised on
/// the way.
#[derive(Debug)]
pub struct ExecutionReport {
    pub result: ActionResult,
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct Resolution {
    /// Record SQL instead of running terminal statements and queries.
    planning: bool,
    warnings: Vec<String>,
    statements: Vec<String>,
}

#[derive(Default)]
pub struct ActionLogicRegistry {
    logics: Vec<Arc<dyn ActionLogic>>,
}

impl fmt::Debug for ActionLogicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.logics.iter().map(|l| l.name()))
            .finish()
    }
}

impl ActionLogicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the generic, snapshot and dialect-specific logic.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::generic::register(&mut registry);
        super::snapshot::register(&mut registry);
        super::dialect::register(&mut registry);
        registry
    }

    pub fn register<L: ActionLogic + 'static>(&mut self, logic: L) -> &mut Self {
        self.logics.push(Arc::new(logic));
        self
    }

    /// Parse and register a template-driven logic.
    pub fn register_template(&mut self, text: &str) -> Result<&mut Self> {
        let logic = TemplateLogic::parse(text)?;
        Ok(self.register(logic))
    }

    pub fn len(&self) -> usize {
        self.logics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logics.is_empty()
    }

    /// The single best logic for `action` in `scope`.
    ///
    /// Fails when nothing applies or when several logics share the top
    /// priority.
    pub fn logic_for(&self, action: &Action, scope: &Scope) -> Result<Arc<dyn ActionLogic>> {
        let kind = action.kind();
        let mut best_priority = PRIORITY_NOT_APPLICABLE;
        let mut best: Vec<&Arc<dyn ActionLogic>> = Vec::new();

        for logic in &self.logics {
            if logic.supported_action() != kind || !logic.supports_scope(scope) {
                continue;
            }
            let priority = logic.priority(action, scope);
            if priority <= PRIORITY_NOT_APPLICABLE {
                continue;
            }
            if priority > best_priority {
                best_priority = priority;
                best.clear();
            }
            if priority == best_priority {
                best.push(logic);
            }
        }

        match best.as_slice() {
            [] => Err(ActionError::NoLogic { action: kind }),
            [only] => Ok(Arc::clone(only)),
            tied => Err(ActionError::AmbiguousLogic {
                action: kind,
                priority: best_priority,
                candidates: tied.iter().map(|l| l.name().to_string()).collect(),
            }),
        }
    }

    /// Resolve `action` down to a terminal result.
    pub async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let mut run = Resolution::default();
        self.resolve(action, scope, &mut run).await
    }

    pub async fn execute_reporting(&self, action: &Action, scope: &Scope) -> Result<ExecutionReport> {
        let mut run = Resolution::default();
        let result = self.resolve(action, scope, &mut run).await?;
        Ok(ExecutionReport {
            result,
            warnings: run.warnings,
        })
    }

    /// SQL the action would run, in order, without touching the database.
    ///
    /// Queries and introspection calls are answered with no rows.
    pub async fn plan_sql(&self, action: &Action, scope: &Scope) -> Result<Vec<String>> {
        let mut run = Resolution {
            planning: true,
            ..Default::default()
        };
        self.resolve(action, scope, &mut run).await?;
        Ok(run.statements)
    }

    fn resolve<'a>(
        &'a self,
        action: &'a Action,
        scope: &'a Scope,
        run: &'a mut Resolution,
    ) -> BoxFuture<'a, Result<ActionResult>> {
        async move {
            if run.planning {
                match action {
                    Action::ExecuteSql(execute) => {
                        run.statements.push(execute.sql.clone());
                        return Ok(ActionResult::Update(0));
                    }
                    Action::QuerySql(_) | Action::QueryMetadata(_) => {
                        return Ok(ActionResult::Rows(Vec::new()));
                    }
                    _ => {}
                }
            }

            let logic = self.logic_for(action, scope)?;
            debug!(action = %action.kind(), logic = logic.name(), "Resolved action logic");

            let warnings = logic.validate(action, scope)?.into_result()?;
            run.warnings.extend(warnings);

            match logic.execute(action, scope).await? {
                ActionResult::Rewrite(actions) => {
                    let mut results = Vec::with_capacity(actions.len());
                    for sub in &actions {
                        results.push(self.resolve(sub, scope, run).await?);
                    }
                    Ok(ActionResult::combine(results))
                }
                ActionResult::Delegate { actions, modifier } => {
                    let mut results = Vec::with_capacity(actions.len());
                    for sub in &actions {
                        results.push(self.resolve(sub, scope, run).await?);
                    }
                    let result = ActionResult::combine(results);
                    match modifier {
                        Some(modifier) => modifier.modify(result, action, scope),
                        None => Ok(result),
                    }
                }
                terminal => Ok(terminal),
            }
        }
        .boxed()
    }
}
