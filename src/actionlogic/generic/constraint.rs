use super::clause;
use crate::action::{
    expect_action, Action, ActionKind, AddForeignKeysAction, AddLookupTableAction,
    AddNotNullConstraintAction, AddPrimaryKeysAction, AddUniqueConstraintsAction,
    AlterTableAction, CreateTableAsSelectAction,
};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{
    ForeignKey, ForeignKeyColumnCheck, ObjectName, ObjectType, PrimaryKey, UniqueConstraint,
};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

/// `(a, b)` with escaped names.
pub(crate) fn column_list<S: AsRef<str>>(columns: &[S], scope: &Scope) -> String {
    format!("({})", scope.database().escape_column_list(columns))
}

/// `[CONSTRAINT n] FOREIGN KEY (..) REFERENCES r (..) [ON UPDATE ..] [ON DELETE ..] ...`
pub(crate) fn foreign_key_definition(fk: &ForeignKey, scope: &Scope) -> StringClauses {
    let db = scope.database();
    let mut clauses = StringClauses::new();
    if let Some(name) = &fk.name {
        clauses.append_keyed(
            clause::CONSTRAINT_NAME,
            format!("CONSTRAINT {}", db.escape_object_name(name, ObjectType::ForeignKey)),
        );
    }
    clauses
        .append("FOREIGN KEY")
        .append_keyed(clause::COLUMNS, column_list(&fk.base_columns(), scope))
        .append_keyed(
            clause::REFERENCES,
            format!(
                "REFERENCES {} {}",
                db.escape_table_name(&fk.referenced_table),
                column_list(&fk.referenced_columns(), scope)
            ),
        );
    if let Some(rule) = fk.update_rule {
        clauses.append_keyed(clause::ON_UPDATE, format!("ON UPDATE {}", rule.sql()));
    }
    if let Some(rule) = fk.delete_rule {
        clauses.append_keyed(clause::ON_DELETE, format!("ON DELETE {}", rule.sql()));
    }
    if db.capabilities().deferrable_constraints {
        if fk.deferrable == Some(true) {
            clauses.append_keyed(clause::DEFERRABLE, "DEFERRABLE");
        }
        if fk.initially_deferred == Some(true) {
            clauses.append_keyed(clause::INITIALLY_DEFERRED, "INITIALLY DEFERRED");
        }
    }
    clauses
}

/// `[CONSTRAINT n] PRIMARY KEY (..)`; the name is dropped where primary
/// keys cannot be named.
pub(crate) fn primary_key_definition(pk: &PrimaryKey, scope: &Scope) -> StringClauses {
    let db = scope.database();
    let mut clauses = StringClauses::new();
    if let Some(name) = pk.name.as_deref().filter(|_| db.capabilities().primary_key_names) {
        clauses.append_keyed(
            clause::CONSTRAINT_NAME,
            format!("CONSTRAINT {}", db.escape_object_name(name, ObjectType::PrimaryKey)),
        );
    }
    clauses
        .append("PRIMARY KEY")
        .append_keyed(clause::COLUMNS, column_list(&pk.column_names(), scope));
    clauses
}

pub(crate) fn unique_definition(uc: &UniqueConstraint, scope: &Scope) -> StringClauses {
    let db = scope.database();
    let mut clauses = StringClauses::new();
    if let Some(name) = &uc.name {
        clauses.append_keyed(
            clause::CONSTRAINT_NAME,
            format!(
                "CONSTRAINT {}",
                db.escape_object_name(name, ObjectType::UniqueConstraint)
            ),
        );
    }
    clauses
        .append("UNIQUE")
        .append_keyed(clause::COLUMNS, column_list(&uc.columns, scope));
    if db.capabilities().deferrable_constraints {
        if uc.deferrable == Some(true) {
            clauses.append_keyed(clause::DEFERRABLE, "DEFERRABLE");
        }
        if uc.initially_deferred == Some(true) {
            clauses.append_keyed(clause::INITIALLY_DEFERRED, "INITIALLY DEFERRED");
        }
    }
    clauses
}

/// Index tablespace for constraints, skipped where tablespaces do not exist.
fn index_tablespace(tablespace: Option<&str>, scope: &Scope) -> String {
    match tablespace {
        Some(ts) if scope.database().capabilities().tablespaces => format!(
            "USING INDEX TABLESPACE {}",
            scope.database().escape_object_name(ts, ObjectType::Table)
        ),
        _ => String::new(),
    }
}

fn alter_table(table: &ObjectName, clauses: StringClauses) -> Action {
    AlterTableAction {
        table: table.clone(),
        clauses,
    }
    .into()
}

pub(crate) fn validate_foreign_key(fk: &ForeignKey, errors: &mut ValidationErrors, scope: &Scope) {
    let db = scope.database();
    errors
        .check_required_field("foreignKey.table", &fk.table)
        .check_required_field("foreignKey.referencedTable", &fk.referenced_table)
        .check_required_field("foreignKey.columnChecks", &fk.column_checks)
        .check_identifier_length("foreignKey.name", fk.name.as_deref(), db);
    if !db.capabilities().deferrable_constraints {
        let short_name = db.short_name();
        errors
            .check_disallowed_field("deferrable", &fk.deferrable.unwrap_or(false), &short_name)
            .check_disallowed_field(
                "initiallyDeferred",
                &fk.initially_deferred.unwrap_or(false),
                &short_name,
            );
    }
}

pub(crate) fn validate_unique_constraint(
    uc: &UniqueConstraint,
    errors: &mut ValidationErrors,
    scope: &Scope,
) {
    let db = scope.database();
    errors
        .check_required_field("uniqueConstraint.table", &uc.table)
        .check_required_field("uniqueConstraint.columns", &uc.columns)
        .check_identifier_length("uniqueConstraint.name", uc.name.as_deref(), db);
    if !db.capabilities().deferrable_constraints {
        let short_name = db.short_name();
        errors
            .check_disallowed_field("deferrable", &uc.deferrable.unwrap_or(false), &short_name)
            .check_disallowed_field(
                "initiallyDeferred",
                &uc.initially_deferred.unwrap_or(false),
                &short_name,
            );
    }
}

pub struct AddForeignKeysLogic;

#[async_trait]
impl ActionLogic for AddForeignKeysLogic {
    fn name(&self) -> &str {
        "AddForeignKeysLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddForeignKeys
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddForeignKeysAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("foreignKeys", &action.foreign_keys);
        for fk in &action.foreign_keys {
            validate_foreign_key(fk, &mut errors, scope);
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddForeignKeysAction>(action)?;
        let actions = action
            .foreign_keys
            .iter()
            .map(|fk| {
                let mut clauses = StringClauses::new();
                clauses
                    .append("ADD")
                    .append_clauses("foreignKey", foreign_key_definition(fk, scope));
                alter_table(&fk.table, clauses)
            })
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}

pub struct AddPrimaryKeysLogic;

#[async_trait]
impl ActionLogic for AddPrimaryKeysLogic {
    fn name(&self) -> &str {
        "AddPrimaryKeysLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddPrimaryKeys
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddPrimaryKeysAction>(action)?;
        let db = scope.database();
        let mut errors = ValidationErrors::new();
        errors.check_required_field("primaryKeys", &action.primary_keys);
        for pk in &action.primary_keys {
            errors
                .check_required_field("primaryKey.table", &pk.table)
                .check_required_field("primaryKey.columns", &pk.columns)
                .check_identifier_length("primaryKey.name", pk.name.as_deref(), db);
            if pk.clustered == Some(true) && !db.capabilities().clustered_indexes {
                errors.add_warning(format!(
                    "Clustered primary keys are not supported on {}, {} will be created non-clustered",
                    db.short_name(),
                    pk.table
                ));
            }
            if pk.tablespace.is_some() && !db.capabilities().tablespaces {
                errors.add_warning(format!(
                    "Tablespaces are not supported on {}, ignoring the primary key tablespace",
                    db.short_name()
                ));
            }
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddPrimaryKeysAction>(action)?;
        let actions = action
            .primary_keys
            .iter()
            .map(|pk| {
                let mut clauses = StringClauses::new();
                clauses
                    .append("ADD")
                    .append_clauses(clause::PRIMARY_KEY, primary_key_definition(pk, scope))
                    .append_keyed(
                        clause::TABLESPACE,
                        index_tablespace(pk.tablespace.as_deref(), scope),
                    );
                alter_table(&pk.table, clauses)
            })
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}

pub struct AddUniqueConstraintsLogic;

#[async_trait]
impl ActionLogic for AddUniqueConstraintsLogic {
    fn name(&self) -> &str {
        "AddUniqueConstraintsLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddUniqueConstraints
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddUniqueConstraintsAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("uniqueConstraints", &action.unique_constraints);
        for uc in &action.unique_constraints {
            validate_unique_constraint(uc, &mut errors, scope);
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddUniqueConstraintsAction>(action)?;
        let actions = action
            .unique_constraints
            .iter()
            .map(|uc| {
                let mut clauses = StringClauses::new();
                clauses
                    .append("ADD")
                    .append_clauses("unique", unique_definition(uc, scope))
                    .append_keyed(
                        clause::TABLESPACE,
                        index_tablespace(uc.tablespace.as_deref(), scope),
                    );
                alter_table(&uc.table, clauses)
            })
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}

/// Creates a lookup table from the distinct values of an existing column and
/// constrains the column to it.
pub struct AddLookupTableLogic;

impl AddLookupTableLogic {
    fn parts(action: &AddLookupTableAction) -> Result<(ObjectName, &str, ObjectName, &str)> {
        let missing = || ActionError::unexpected("Lookup table columns must name their tables");
        let existing_table = action.existing_column.container().cloned().ok_or_else(missing)?;
        let existing_column = action.existing_column.name().ok_or_else(missing)?;
        let new_table = action.new_column.container().cloned().ok_or_else(missing)?;
        let new_column = action.new_column.name().ok_or_else(missing)?;
        Ok((existing_table, existing_column, new_table, new_column))
    }
}

#[async_trait]
impl ActionLogic for AddLookupTableLogic {
    fn name(&self) -> &str {
        "AddLookupTableLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddLookupTable
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddLookupTableAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("existingColumn", &action.existing_column)
            .check_required_container("existingColumn", &action.existing_column)
            .check_required_field("newColumn", &action.new_column)
            .check_required_container("newColumn", &action.new_column);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddLookupTableAction>(action)?;
        let db = scope.database();
        let (existing_table, existing_column, new_table, new_column) = Self::parts(action)?;

        let escaped_existing = db.escape_object_name(existing_column, ObjectType::Column);
        let select_sql = format!(
            "SELECT DISTINCT {} AS {} FROM {} WHERE {} IS NOT NULL",
            escaped_existing,
            db.escape_object_name(new_column, ObjectType::Column),
            db.escape_table_name(&existing_table),
            escaped_existing
        );

        let existing_table_name = existing_table.name().unwrap_or_default().to_uppercase();
        let new_table_name = new_table.name().unwrap_or_default().to_uppercase();
        let mut primary_key = PrimaryKey::new(new_table.clone(), [new_column]);
        primary_key.name = Some(format!("PK_{}", new_table_name));
        let foreign_key = ForeignKey {
            name: Some(
                action
                    .constraint_name
                    .clone()
                    .unwrap_or_else(|| format!("FK_{}_{}", existing_table_name, new_table_name)),
            ),
            table: existing_table.clone(),
            referenced_table: new_table.clone(),
            column_checks: vec![ForeignKeyColumnCheck {
                position: Some(1),
                ..ForeignKeyColumnCheck::new(existing_column, new_column)
            }],
            ..Default::default()
        };

        Ok(ActionResult::Rewrite(vec![
            CreateTableAsSelectAction {
                table: new_table,
                select_sql,
            }
            .into(),
            AddNotNullConstraintAction {
                column: action.new_column.clone(),
                data_type: action.new_column_data_type.clone(),
                default_null_value: None,
            }
            .into(),
            AddPrimaryKeysAction {
                primary_keys: vec![primary_key],
            }
            .into(),
            AddForeignKeysAction {
                foreign_keys: vec![foreign_key],
            }
            .into(),
        ]))
    }
}
