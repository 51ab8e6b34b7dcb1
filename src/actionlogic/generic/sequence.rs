use super::{clause, execute_sql};
use crate::action::{expect_action, Action, ActionKind, CreateSequenceAction, DropSequencesAction};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{ObjectType, Sequence};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

fn require_sequences(errors: &mut ValidationErrors, scope: &Scope) {
    let db = scope.database();
    if !db.capabilities().sequences {
        errors.add_unsupported_error("Sequences", &db.short_name());
    }
}

pub struct CreateSequenceLogic;

impl CreateSequenceLogic {
    pub(crate) fn create_sequence_clauses(sequence: &Sequence, scope: &Scope) -> StringClauses {
        let db = scope.database();
        let mut clauses = StringClauses::new();
        clauses.append("CREATE SEQUENCE").append_keyed(
            clause::SEQUENCE_NAME,
            db.escape_qualified_name(&sequence.name, ObjectType::Sequence),
        );
        if let Some(v) = sequence.start_value {
            clauses.append_keyed(clause::START_WITH, format!("START WITH {}", v));
        }
        if let Some(v) = sequence.increment_by {
            clauses.append_keyed(clause::INCREMENT_BY, format!("INCREMENT BY {}", v));
        }
        if let Some(v) = sequence.min_value {
            clauses.append_keyed(clause::MIN_VALUE, format!("MINVALUE {}", v));
        }
        if let Some(v) = sequence.max_value {
            clauses.append_keyed(clause::MAX_VALUE, format!("MAXVALUE {}", v));
        }
        if sequence.cycle == Some(true) {
            clauses.append_keyed(clause::CYCLE, "CYCLE");
        }
        clauses
    }

    pub(crate) fn base_validation(action: &CreateSequenceAction, scope: &Scope) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_sequences(&mut errors, scope);
        errors.check_required_field("sequence.name", &action.sequence.name);
        if let (Some(min), Some(max)) = (action.sequence.min_value, action.sequence.max_value) {
            if min > max {
                errors.add_error(format!("sequence.minValue {} is greater than maxValue {}", min, max));
            }
        }
        errors
    }
}

#[async_trait]
impl ActionLogic for CreateSequenceLogic {
    fn name(&self) -> &str {
        "CreateSequenceLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateSequence
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateSequenceAction>(action)?;
        let mut errors = Self::base_validation(action, scope);
        if action.sequence.data_type.is_some() {
            errors.add_warning(format!(
                "Sequence data types are not supported on {}, ignoring it",
                scope.database().short_name()
            ));
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateSequenceAction>(action)?;
        let clauses = Self::create_sequence_clauses(&action.sequence, scope);
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}

pub struct DropSequencesLogic;

#[async_trait]
impl ActionLogic for DropSequencesLogic {
    fn name(&self) -> &str {
        "DropSequencesLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::DropSequences
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<DropSequencesAction>(action)?;
        let mut errors = ValidationErrors::new();
        require_sequences(&mut errors, scope);
        errors.check_required_field("sequences", &action.sequences);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<DropSequencesAction>(action)?;
        let db = scope.database();
        let actions = action
            .sequences
            .iter()
            .map(|name| {
                let mut clauses = StringClauses::new();
                clauses.append("DROP SEQUENCE").append_keyed(
                    clause::SEQUENCE_NAME,
                    db.escape_qualified_name(name, ObjectType::Sequence),
                );
                execute_sql(&clauses)
            })
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}
