use super::{clause, execute_sql};
use crate::action::{
    expect_action, Action, ActionKind, AddAutoIncrementAction, AddColumnsAction,
    AddDefaultValueAction, AddForeignKeysAction, AddNotNullConstraintAction,
    AddPrimaryKeysAction, AddUniqueConstraintsAction, AlterTableAction, DropColumnsAction,
    UpdateDataAction,
};
use crate::actionlogic::generic::constraint::{validate_foreign_key, validate_unique_constraint};
use crate::actionlogic::{ActionLogic, ActionResult, AutoIncrementClause, ValidationErrors};
use crate::error::{ActionError, Result};
use crate::scope::Scope;
use crate::structure::{AutoIncrementInfo, Column, DataType, ObjectName, ObjectType};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;

/// Split a table-qualified column name into its table and column parts.
pub(crate) fn column_parts(column: &ObjectName) -> Result<(ObjectName, &str)> {
    match (column.container(), column.name()) {
        (Some(table), Some(name)) if table.name.is_some() => Ok((table.clone(), name)),
        _ => Err(ActionError::unexpected(format!(
            "Column '{}' is not qualified with its table",
            column
        ))),
    }
}

fn auto_increment_request(table: &ObjectName, column: &Column, info: &AutoIncrementInfo) -> Action {
    AddAutoIncrementAction {
        column: table.child(column.simple_name().unwrap_or_default()),
        data_type: column.data_type.clone(),
        start_with: info.start_with,
        increment_by: info.increment_by,
    }
    .into()
}

/// Checks for an auto-increment column inside a column definition.
///
/// Missing support only warns; the column is then created without the
/// clause.
pub(crate) fn validate_auto_increment(
    table: &ObjectName,
    column: &Column,
    errors: &mut ValidationErrors,
    scope: &Scope,
) -> Result<()> {
    let Some(info) = &column.auto_increment else {
        return Ok(());
    };
    let db = scope.database();
    if !db.capabilities().auto_increment {
        errors.add_warning(format!(
            "Auto-increment is not supported on {}, {} will be created without it",
            db.short_name(),
            column.name
        ));
        return Ok(());
    }
    if column.data_type.is_some() {
        let request = auto_increment_request(table, column, info);
        let logic = scope.registry().logic_for(&request, scope)?;
        errors.merge(logic.validate(&request, scope)?);
    }
    Ok(())
}

/// Auto-increment clause for a column definition plus the statements that
/// must follow it. `None` when the column is not auto-increment or the
/// database cannot do it.
pub(crate) fn auto_increment_parts(
    table: &ObjectName,
    column: &Column,
    scope: &Scope,
) -> Result<Option<(String, Vec<Action>)>> {
    let Some(info) = &column.auto_increment else {
        return Ok(None);
    };
    if !scope.database().capabilities().auto_increment {
        return Ok(None);
    }
    let request = auto_increment_request(table, column, info);
    let logic = scope.registry().logic_for(&request, scope)?;
    let generator = logic.as_auto_increment().ok_or_else(|| {
        ActionError::unexpected(format!(
            "{} cannot generate auto-increment clauses",
            logic.name()
        ))
    })?;
    let column_name = table.child(column.simple_name().unwrap_or_default());
    Ok(Some((
        generator.auto_increment_clause(info, column.data_type.as_ref(), scope),
        generator.follow_up_actions(&column_name, info, scope),
    )))
}

/// Column definition fragments shared by CREATE TABLE and ADD COLUMN.
pub(crate) fn column_definition(
    table: &ObjectName,
    column: &Column,
    scope: &Scope,
) -> Result<(StringClauses, Vec<Action>)> {
    let db = scope.database();
    let auto_increment = auto_increment_parts(table, column, scope)?;
    let name = column.simple_name().unwrap_or_default();

    let mut clauses = StringClauses::new();
    clauses.append_keyed(clause::COLUMN_NAME, db.escape_object_name(name, ObjectType::Column));
    if let Some(data_type) = &column.data_type {
        clauses.append_keyed(
            clause::DATA_TYPE,
            db.data_type_sql(data_type, column.is_auto_increment()),
        );
    }
    if let Some(default) = column.default_value.as_ref().filter(|_| !column.is_auto_increment()) {
        clauses.append_keyed(
            clause::DEFAULT_VALUE,
            format!(
                "DEFAULT {}",
                db.default_value_sql(default, column.data_type.as_ref())
            ),
        );
    }
    let follow_ups = match auto_increment {
        Some((text, follow_ups)) => {
            clauses.append_keyed(clause::AUTO_INCREMENT, text);
            follow_ups
        }
        None => Vec::new(),
    };
    match column.nullable {
        Some(false) => {
            clauses.append_keyed(clause::NULLABLE, "NOT NULL");
        }
        Some(true) if db.capabilities().requires_defining_columns_as_null => {
            clauses.append_keyed(clause::NULLABLE, "NULL");
        }
        _ => {}
    }
    Ok((clauses, follow_ups))
}

/// Validation shared by every logic that defines columns.
pub(crate) fn validate_column(
    table: &ObjectName,
    column: &Column,
    errors: &mut ValidationErrors,
    scope: &Scope,
) -> Result<()> {
    errors
        .check_required_field("column.name", &column.name)
        .check_required_field("column.dataType", &column.data_type)
        .check_value_type(
            "column.defaultValue",
            column.default_value.as_ref(),
            column.data_type.as_ref(),
        )
        .check_identifier_length("column.name", column.simple_name(), scope.database());
    validate_auto_increment(table, column, errors, scope)
}

pub struct AddColumnsLogic;

#[async_trait]
impl ActionLogic for AddColumnsLogic {
    fn name(&self) -> &str {
        "AddColumnsLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddColumns
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddColumnsAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("columns", &action.columns);
        for column in &action.columns {
            errors.check_required_container("column.name", &column.name);
            let table = column.table().cloned().unwrap_or_default();
            validate_column(&table, column, &mut errors, scope)?;
        }
        for uc in &action.unique_constraints {
            validate_unique_constraint(uc, &mut errors, scope);
        }
        for fk in &action.foreign_keys {
            validate_foreign_key(fk, &mut errors, scope);
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddColumnsAction>(action)?;
        let inline_pk = action
            .primary_key
            .as_ref()
            .filter(|pk| pk.columns.len() == 1)
            .and_then(|pk| pk.columns.first())
            .map(|c| c.name.as_str());

        let mut actions = Vec::new();
        let mut follow_ups = Vec::new();
        for column in &action.columns {
            let (table, _) = column_parts(&column.name)?;
            let (mut clauses, column_follow_ups) = column_definition(&table, column, scope)?;
            clauses.prepend("ADD");
            if inline_pk.is_some() && inline_pk == column.simple_name() {
                clauses.append_keyed(clause::PRIMARY_KEY, "PRIMARY KEY");
            }
            actions.push(AlterTableAction { table, clauses }.into());
            follow_ups.extend(column_follow_ups);
        }
        actions.extend(follow_ups);

        if let Some(pk) = action.primary_key.as_ref().filter(|pk| pk.columns.len() > 1) {
            actions.push(
                AddPrimaryKeysAction {
                    primary_keys: vec![pk.clone()],
                }
                .into(),
            );
        }
        if !action.unique_constraints.is_empty() {
            actions.push(
                AddUniqueConstraintsAction {
                    unique_constraints: action.unique_constraints.clone(),
                }
                .into(),
            );
        }
        if !action.foreign_keys.is_empty() {
            actions.push(
                AddForeignKeysAction {
                    foreign_keys: action.foreign_keys.clone(),
                }
                .into(),
            );
        }
        Ok(ActionResult::delegate_all(actions))
    }
}

pub struct DropColumnsLogic;

#[async_trait]
impl ActionLogic for DropColumnsLogic {
    fn name(&self) -> &str {
        "DropColumnsLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::DropColumns
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<DropColumnsAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("columns", &action.columns);
        for column in &action.columns {
            errors.check_required_container("columns", column);
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<DropColumnsAction>(action)?;
        let db = scope.database();
        let mut actions = Vec::with_capacity(action.columns.len());
        for column in &action.columns {
            let (table, name) = column_parts(column)?;
            let mut clauses = StringClauses::new();
            clauses.append("DROP COLUMN").append_keyed(
                clause::COLUMN_NAME,
                db.escape_object_name(name, ObjectType::Column),
            );
            actions.push(AlterTableAction { table, clauses }.into());
        }
        Ok(ActionResult::delegate_all(actions))
    }
}

/// `GENERATED BY DEFAULT AS IDENTITY [(START WITH x INCREMENT BY y)]`
pub(crate) fn identity_clause(info: &AutoIncrementInfo) -> String {
    let mut options = StringClauses::new();
    if let Some(start) = info.start_with {
        options.append_keyed(clause::START_WITH, format!("START WITH {}", start));
    }
    if let Some(step) = info.increment_by {
        options.append_keyed(clause::INCREMENT_BY, format!("INCREMENT BY {}", step));
    }
    if options.is_empty() {
        "GENERATED BY DEFAULT AS IDENTITY".to_string()
    } else {
        format!("GENERATED BY DEFAULT AS IDENTITY ({})", options)
    }
}

pub struct AddAutoIncrementLogic;

impl AddAutoIncrementLogic {
    pub(crate) fn base_validation(
        action: &AddAutoIncrementAction,
        scope: &Scope,
    ) -> ValidationErrors {
        let db = scope.database();
        let mut errors = ValidationErrors::new();
        if !db.capabilities().auto_increment {
            errors.add_unsupported_error("Auto-increment", &db.short_name());
        }
        errors
            .check_required_field("column", &action.column)
            .check_required_container("column", &action.column)
            .check_required_field("dataType", &action.data_type);
        errors
    }

    /// `ALTER TABLE t MODIFY c <type> <auto-increment clause>`, followed by
    /// whatever statements `auto_increment` needs after it.
    pub(crate) fn modify_column(
        action: &AddAutoIncrementAction,
        auto_increment: &dyn AutoIncrementClause,
        scope: &Scope,
    ) -> Result<ActionResult> {
        let db = scope.database();
        let (table, name) = column_parts(&action.column)?;
        let info = Self::info(action);

        let mut clauses = StringClauses::new();
        clauses
            .append("ALTER TABLE")
            .append_keyed(clause::TABLE_NAME, db.escape_table_name(&table))
            .append("MODIFY")
            .append_keyed(clause::COLUMN_NAME, db.escape_object_name(name, ObjectType::Column));
        if let Some(data_type) = &action.data_type {
            clauses.append_keyed(clause::DATA_TYPE, db.data_type_sql(data_type, true));
        }
        clauses.append_keyed(
            clause::AUTO_INCREMENT,
            auto_increment.auto_increment_clause(&info, action.data_type.as_ref(), scope),
        );

        let mut actions = vec![execute_sql(&clauses)];
        actions.extend(auto_increment.follow_up_actions(&action.column, &info, scope));
        Ok(ActionResult::delegate_all(actions))
    }

    pub(crate) fn info(action: &AddAutoIncrementAction) -> AutoIncrementInfo {
        AutoIncrementInfo {
            start_with: action.start_with,
            increment_by: action.increment_by,
        }
    }
}

impl AutoIncrementClause for AddAutoIncrementLogic {
    fn auto_increment_clause(
        &self,
        info: &AutoIncrementInfo,
        _data_type: Option<&DataType>,
        _scope: &Scope,
    ) -> String {
        identity_clause(info)
    }
}

#[async_trait]
impl ActionLogic for AddAutoIncrementLogic {
    fn name(&self) -> &str {
        "AddAutoIncrementLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddAutoIncrement
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        Ok(Self::base_validation(action, scope))
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddAutoIncrementAction>(action)?;
        Self::modify_column(action, self, scope)
    }

    fn as_auto_increment(&self) -> Option<&dyn AutoIncrementClause> {
        Some(self)
    }
}

pub struct AddNotNullConstraintLogic;

impl AddNotNullConstraintLogic {
    /// `UPDATE t SET c = <value> WHERE c IS NULL` when a backfill value is given.
    pub(crate) fn backfill(action: &AddNotNullConstraintAction, scope: &Scope) -> Result<Option<Action>> {
        let Some(value) = &action.default_null_value else {
            return Ok(None);
        };
        let (table, name) = column_parts(&action.column)?;
        let escaped = scope.database().escape_object_name(name, ObjectType::Column);
        Ok(Some(
            UpdateDataAction {
                table,
                values: vec![(name.to_string(), value.clone())],
                where_clause: Some(format!("{} IS NULL", escaped)),
                where_params: Vec::new(),
            }
            .into(),
        ))
    }

    pub(crate) fn base_validation(action: &AddNotNullConstraintAction) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("column", &action.column)
            .check_required_container("column", &action.column)
            .check_value_type(
                "defaultNullValue",
                action.default_null_value.as_ref(),
                action.data_type.as_ref(),
            );
        errors
    }
}

#[async_trait]
impl ActionLogic for AddNotNullConstraintLogic {
    fn name(&self) -> &str {
        "AddNotNullConstraintLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddNotNullConstraint
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddNotNullConstraintAction>(action)?;
        Ok(Self::base_validation(action))
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddNotNullConstraintAction>(action)?;
        let (table, name) = column_parts(&action.column)?;
        let mut actions: Vec<Action> = Self::backfill(action, scope)?.into_iter().collect();

        let mut clauses = StringClauses::new();
        clauses
            .append("ALTER COLUMN")
            .append_keyed(
                clause::COLUMN_NAME,
                scope.database().escape_object_name(name, ObjectType::Column),
            )
            .append_keyed(clause::NULLABLE, "SET NOT NULL");
        actions.push(AlterTableAction { table, clauses }.into());
        Ok(ActionResult::delegate_all(actions))
    }
}

pub struct AddDefaultValueLogic;

#[async_trait]
impl ActionLogic for AddDefaultValueLogic {
    fn name(&self) -> &str {
        "AddDefaultValueLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AddDefaultValue
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AddDefaultValueAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("column", &action.column)
            .check_required_container("column", &action.column)
            .check_required_field("defaultValue", &action.default_value)
            .check_value_type(
                "defaultValue",
                action.default_value.as_ref(),
                action.data_type.as_ref(),
            );
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AddDefaultValueAction>(action)?;
        let db = scope.database();
        let (table, name) = column_parts(&action.column)?;
        let value = action
            .default_value
            .as_ref()
            .ok_or_else(|| ActionError::unexpected("defaultValue is required"))?;

        let mut clauses = StringClauses::new();
        clauses
            .append("ALTER COLUMN")
            .append_keyed(clause::COLUMN_NAME, db.escape_object_name(name, ObjectType::Column))
            .append_keyed(
                clause::DEFAULT_VALUE,
                format!(
                    "SET DEFAULT {}",
                    db.default_value_sql(value, action.data_type.as_ref())
                ),
            );
        Ok(ActionResult::delegate(AlterTableAction { table, clauses }))
    }
}
