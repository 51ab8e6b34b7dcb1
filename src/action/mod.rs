//! Typed action vocabulary exchanged between the resolver and its logic.
//!
//! Every action kind has its own struct; [`Action`] is the tagged union the
//! resolver dispatches on. Generic consumers that need by-name access (the
//! template logic) go through [`Action::attribute`].

mod changelog;
mod data;
mod query;
mod schema;

pub use changelog::{ChangeSetRecord, CreateChangeLogTableAction, ExecType, MarkChangeSetRanAction};
pub use data::{InsertDataAction, UpdateDataAction};
pub use query::{ExecuteSqlAction, QueryMetadataAction, QuerySqlAction, SnapshotObjectsAction};
pub use schema::{
    AddAutoIncrementAction, AddColumnsAction, AddDefaultValueAction, AddForeignKeysAction,
    AddLookupTableAction, AddNotNullConstraintAction, AddPrimaryKeysAction,
    AddUniqueConstraintsAction, AlterTableAction, CreateIndexesAction, CreateSequenceAction,
    CreateTableAction, CreateTableAsSelectAction, CreateViewAction, DropColumnsAction,
    DropSequencesAction, DropTablesAction,
};

use crate::error::{ActionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Implemented by every concrete action struct.
pub trait ActionVariant: Sized {
    const KIND: ActionKind;

    fn from_action(action: &Action) -> Option<&Self>;
}

/// Borrow the concrete action a logic was selected for.
///
/// The resolver only routes matching kinds, so a mismatch is a programming
/// error rather than bad input.
pub fn expect_action<T: ActionVariant>(action: &Action) -> Result<&T> {
    T::from_action(action).ok_or_else(|| {
        ActionError::unexpected(format!(
            "Expected {} action but got {}",
            T::KIND,
            action.kind()
        ))
    })
}

macro_rules! actions {
    ($($variant:ident($ty:ty) => $tag:literal,)+) => {
        /// One abstract intent, independent of the target database.
        #[derive(Clone, Debug, PartialEq, Serialize)]
        #[serde(tag = "action", rename_all = "camelCase")]
        pub enum Action {
            $($variant($ty),)+
        }

        /// Type tag of an [`Action`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum ActionKind {
            $($variant,)+
        }

        impl ActionKind {
            pub const ALL: &'static [ActionKind] = &[$(ActionKind::$variant,)+];

            pub fn name(&self) -> &'static str {
                match self {
                    $(ActionKind::$variant => $tag,)+
                }
            }
        }

        impl Action {
            pub fn kind(&self) -> ActionKind {
                match self {
                    $(Action::$variant(_) => ActionKind::$variant,)+
                }
            }
        }

        $(
            impl ActionVariant for $ty {
                const KIND: ActionKind = ActionKind::$variant;

                fn from_action(action: &Action) -> Option<&Self> {
                    match action {
                        Action::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Action {
                fn from(action: $ty) -> Self {
                    Action::$variant(action)
                }
            }
        )+
    };
}

actions! {
    ExecuteSql(ExecuteSqlAction) => "executeSql",
    QuerySql(QuerySqlAction) => "querySql",
    QueryMetadata(QueryMetadataAction) => "queryMetadata",
    SnapshotObjects(SnapshotObjectsAction) => "snapshotObjects",
    AlterTable(AlterTableAction) => "alterTable",
    AddColumns(AddColumnsAction) => "addColumns",
    CreateTable(CreateTableAction) => "createTable",
    CreateTableAsSelect(CreateTableAsSelectAction) => "createTableAsSelect",
    DropTables(DropTablesAction) => "dropTables",
    DropColumns(DropColumnsAction) => "dropColumns",
    AddForeignKeys(AddForeignKeysAction) => "addForeignKeys",
    AddPrimaryKeys(AddPrimaryKeysAction) => "addPrimaryKeys",
    AddUniqueConstraints(AddUniqueConstraintsAction) => "addUniqueConstraints",
    AddAutoIncrement(AddAutoIncrementAction) => "addAutoIncrement",
    AddNotNullConstraint(AddNotNullConstraintAction) => "addNotNullConstraint",
    AddDefaultValue(AddDefaultValueAction) => "addDefaultValue",
    AddLookupTable(AddLookupTableAction) => "addLookupTable",
    CreateSequence(CreateSequenceAction) => "createSequence",
    DropSequences(DropSequencesAction) => "dropSequences",
    CreateIndexes(CreateIndexesAction) => "createIndexes",
    CreateView(CreateViewAction) => "createView",
    InsertData(InsertDataAction) => "insertData",
    UpdateData(UpdateDataAction) => "updateData",
    CreateChangeLogTable(CreateChangeLogTableAction) => "createChangeLogTable",
    MarkChangeSetRan(MarkChangeSetRanAction) => "markChangeSetRan",
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ActionError::unexpected(format!("Unknown action '{}'", s)))
    }
}

impl Action {
    /// Attribute by its camelCase name; absent and null attributes are `None`.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        let value = serde_json::to_value(self).ok()?;
        value.get(name).filter(|v| !v.is_null()).cloned()
    }

    /// Attribute rendered as plain text, e.g. for template substitution.
    pub fn attribute_text(&self, name: &str) -> Option<String> {
        match self.attribute(name)? {
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Array(parts) if parts.iter().all(|p| p.is_string() || p.is_null()) => Some(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("."),
            ),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{ObjectName, Sequence};

    #[test]
    fn kinds_render_camel_case() {
        assert_eq!(ActionKind::DropTables.to_string(), "dropTables");
        assert_eq!(
            "CREATESEQUENCE".parse::<ActionKind>().unwrap(),
            ActionKind::CreateSequence
        );
        assert!("nope".parse::<ActionKind>().is_err());
    }

    #[test]
    fn expect_action_rejects_other_kinds() {
        let action: Action = ExecuteSqlAction::new("SELECT 1").into();
        assert_eq!(expect_action::<ExecuteSqlAction>(&action).unwrap().sql, "SELECT 1");
        let err = expect_action::<QuerySqlAction>(&action).unwrap_err();
        assert!(matches!(err, ActionError::Unexpected(_)));
    }

    #[test]
    fn attributes_by_name() {
        let action: Action = CreateSequenceAction {
            sequence: Sequence {
                name: ObjectName::parse("public.seq_users"),
                start_value: Some(10),
                ..Default::default()
            },
        }
        .into();
        let sequence = action.attribute("sequence").unwrap();
        assert_eq!(sequence["startValue"], 10);
        assert!(action.attribute("missing").is_none());

        let drop: Action = DropTablesAction {
            tables: vec![ObjectName::parse("a")],
            cascade_constraints: true,
        }
        .into();
        assert_eq!(drop.attribute_text("cascadeConstraints").as_deref(), Some("true"));
    }
}
