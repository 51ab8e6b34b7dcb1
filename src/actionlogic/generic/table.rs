use super::column::{column_definition, validate_column};
use super::constraint::{
    foreign_key_definition, primary_key_definition, unique_definition, validate_foreign_key,
    validate_unique_constraint,
};
use super::{clause, execute_sql};
use crate::action::{
    expect_action, Action, ActionKind, AlterTableAction, CreateTableAction,
    CreateTableAsSelectAction, DropTablesAction,
};
use crate::actionlogic::{ActionLogic, ActionResult, ValidationErrors};
use crate::error::Result;
use crate::scope::Scope;
use crate::structure::{ObjectName, ObjectType};
use crate::util::string_clauses::StringClauses;
use async_trait::async_trait;
use std::collections::HashSet;

pub struct AlterTableLogic;

#[async_trait]
impl ActionLogic for AlterTableLogic {
    fn name(&self) -> &str {
        "AlterTableLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::AlterTable
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<AlterTableAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors.check_required_field("table", &action.table);
        if action.clauses.is_empty() {
            errors.add_error("clauses is required");
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<AlterTableAction>(action)?;
        let mut clauses = StringClauses::new();
        clauses
            .append("ALTER TABLE")
            .append_keyed(
                clause::TABLE_NAME,
                scope.database().escape_table_name(&action.table),
            )
            .append_clauses(clause::ALTER_CLAUSES, action.clauses.clone());
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}

pub struct CreateTableLogic;

impl CreateTableLogic {
    /// The statement plus any statements its auto-increment columns need
    /// afterwards.
    pub(crate) fn create_table_clauses(
        action: &CreateTableAction,
        scope: &Scope,
    ) -> Result<(StringClauses, Vec<Action>)> {
        let db = scope.database();
        let table = &action.table.name;

        let mut body = StringClauses::parenthesized_list();
        let mut follow_ups = Vec::new();
        for column in &action.columns {
            let (definition, column_follow_ups) = column_definition(table, column, scope)?;
            let key = clause::column(column.simple_name().unwrap_or_default());
            body.append_clauses(&key, definition);
            follow_ups.extend(column_follow_ups);
        }
        if let Some(pk) = &action.primary_key {
            body.append_clauses(
                &clause::constraint(clause::PRIMARY_KEY, 0),
                primary_key_definition(pk, scope),
            );
        }
        for (idx, fk) in action.foreign_keys.iter().enumerate() {
            body.append_clauses(
                &clause::constraint("foreignKey", idx),
                foreign_key_definition(fk, scope),
            );
        }
        for (idx, uc) in action.unique_constraints.iter().enumerate() {
            body.append_clauses(
                &clause::constraint("unique", idx),
                unique_definition(uc, scope),
            );
        }

        let mut clauses = StringClauses::new();
        clauses
            .append("CREATE TABLE")
            .append_keyed(clause::TABLE_NAME, db.escape_table_name(table))
            .append_clauses(clause::COLUMNS, body);
        if let Some(ts) = action.table.tablespace.as_deref() {
            if db.capabilities().tablespaces {
                clauses.append_keyed(
                    clause::TABLESPACE,
                    format!("TABLESPACE {}", db.escape_object_name(ts, ObjectType::Table)),
                );
            }
        }
        Ok((clauses, follow_ups))
    }
}

#[async_trait]
impl ActionLogic for CreateTableLogic {
    fn name(&self) -> &str {
        "CreateTableLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateTable
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateTableAction>(action)?;
        let db = scope.database();
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("table", &action.table.name)
            .check_required_field("columns", &action.columns)
            .check_identifier_length("table", action.table.name.name(), db);
        if let Some(pk) = &action.primary_key {
            errors.check_identifier_length("primaryKey.name", pk.name.as_deref(), db);
        }
        let mut seen = HashSet::new();
        for column in &action.columns {
            validate_column(&action.table.name, column, &mut errors, scope)?;
            if let Some(name) = column.simple_name() {
                if !seen.insert(name) {
                    errors.add_error(format!(
                        "Column {} is defined more than once in {}",
                        name, action.table.name
                    ));
                }
            }
        }
        for fk in &action.foreign_keys {
            validate_foreign_key(fk, &mut errors, scope);
        }
        for uc in &action.unique_constraints {
            validate_unique_constraint(uc, &mut errors, scope);
        }
        if action.table.tablespace.is_some() && !db.capabilities().tablespaces {
            errors.add_warning(format!(
                "Tablespaces are not supported on {}, {} is created in the default tablespace",
                db.short_name(),
                action.table.name
            ));
        }
        if let Some(pk) = &action.primary_key {
            if pk.clustered == Some(true) && !db.capabilities().clustered_indexes {
                errors.add_warning(format!(
                    "Clustered primary keys are not supported on {}, {} will be created non-clustered",
                    db.short_name(),
                    action.table.name
                ));
            }
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateTableAction>(action)?;
        let (clauses, follow_ups) = Self::create_table_clauses(action, scope)?;
        let mut actions = vec![execute_sql(&clauses)];
        actions.extend(follow_ups);
        Ok(ActionResult::delegate_all(actions))
    }
}

pub struct CreateTableAsSelectLogic;

#[async_trait]
impl ActionLogic for CreateTableAsSelectLogic {
    fn name(&self) -> &str {
        "CreateTableAsSelectLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::CreateTableAsSelect
    }

    fn validate(&self, action: &Action, _scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<CreateTableAsSelectAction>(action)?;
        let mut errors = ValidationErrors::new();
        errors
            .check_required_field("table", &action.table)
            .check_required_field("selectSql", &action.select_sql);
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<CreateTableAsSelectAction>(action)?;
        let mut clauses = StringClauses::new();
        clauses
            .append("CREATE TABLE")
            .append_keyed(
                clause::TABLE_NAME,
                scope.database().escape_table_name(&action.table),
            )
            .append("AS")
            .append(action.select_sql.trim());
        Ok(ActionResult::delegate(execute_sql(&clauses)))
    }
}

pub struct DropTablesLogic;

impl DropTablesLogic {
    /// `DROP TABLE t [CASCADE CONSTRAINTS]`; the cascade fragment is keyed
    /// so other databases can swap in their own keyword.
    pub(crate) fn drop_table_clauses(table: &ObjectName, cascade: bool, scope: &Scope) -> StringClauses {
        let mut clauses = StringClauses::new();
        clauses
            .append("DROP TABLE")
            .append_keyed(clause::TABLE_NAME, scope.database().escape_table_name(table));
        if cascade {
            clauses.append_keyed(clause::CASCADE, "CASCADE CONSTRAINTS");
        }
        clauses
    }
}

#[async_trait]
impl ActionLogic for DropTablesLogic {
    fn name(&self) -> &str {
        "DropTablesLogic"
    }

    fn supported_action(&self) -> ActionKind {
        ActionKind::DropTables
    }

    fn validate(&self, action: &Action, scope: &Scope) -> Result<ValidationErrors> {
        let action = expect_action::<DropTablesAction>(action)?;
        let db = scope.database();
        let mut errors = ValidationErrors::new();
        errors.check_required_field("tables", &action.tables);
        if !db.capabilities().cascade_drop {
            errors.check_disallowed_field(
                "cascadeConstraints",
                &action.cascade_constraints,
                &db.short_name(),
            );
        }
        Ok(errors)
    }

    async fn execute(&self, action: &Action, scope: &Scope) -> Result<ActionResult> {
        let action = expect_action::<DropTablesAction>(action)?;
        let actions = action
            .tables
            .iter()
            .map(|table| {
                execute_sql(&Self::drop_table_clauses(
                    table,
                    action.cascade_constraints,
                    scope,
                ))
            })
            .collect();
        Ok(ActionResult::delegate_all(actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::SqlValue;
    use crate::structure::{
        AutoIncrementInfo, Column, DataType, ForeignKey, ForeignKeyColumnCheck, PrimaryKey, Table,
    };
    use crate::testing::offline_scope;
    use crate::util::dialects::generic::GenericDialect;
    use crate::util::dialects::mysql::MYSQL_DIALECT;
    use crate::util::dialects::postgres::POSTGRES_DIALECT;
    use crate::util::dialects::sqlite::SQLITE_DIALECT;
    use pretty_assertions::assert_eq;

    fn orders() -> CreateTableAction {
        let mut id = Column::new("id", DataType::new("int"));
        id.nullable = Some(false);
        id.auto_increment = Some(AutoIncrementInfo::default());
        id.default_value = Some(SqlValue::Int(0));
        let mut note = Column::new("note", DataType::parse("varchar(100)"));
        note.nullable = Some(true);
        let user_id = Column::new("user_id", DataType::new("int"));
        let mut table = Table::new(ObjectName::parse("public.orders"));
        table.tablespace = Some("fast".into());
        CreateTableAction {
            table,
            columns: vec![id, note, user_id],
            primary_key: Some(PrimaryKey::new(ObjectName::parse("public.orders"), ["id"])),
            foreign_keys: vec![ForeignKey {
                table: ObjectName::parse("public.orders"),
                referenced_table: ObjectName::parse("public.users"),
                column_checks: vec![ForeignKeyColumnCheck::new("user_id", "id")],
                ..Default::default()
            }],
            unique_constraints: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_table_on_postgres() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let sql = scope
            .registry()
            .plan_sql(&orders().into(), &scope)
            .await
            .unwrap();
        assert_eq!(
            sql,
            vec!["CREATE TABLE public.orders (id INT GENERATED BY DEFAULT AS IDENTITY NOT NULL, \
                  note VARCHAR(100), user_id INT, PRIMARY KEY (id), \
                  FOREIGN KEY (user_id) REFERENCES public.users (id)) TABLESPACE fast"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn create_table_defines_nullable_columns_when_required() {
        let dialect = GenericDialect::new(crate::engine::dialect::Capabilities {
            requires_defining_columns_as_null: true,
            auto_increment: false,
            ..Default::default()
        });
        let scope = offline_scope(&dialect).await;
        let report = scope
            .registry()
            .execute_reporting(&orders().into(), &scope)
            .await
            .unwrap();
        assert_eq!(report.warnings.len(), 2);
        let sql = scope
            .registry()
            .plan_sql(&orders().into(), &scope)
            .await
            .unwrap();
        assert_eq!(
            sql,
            vec!["CREATE TABLE public.orders (id INT NOT NULL, note VARCHAR(100) NULL, \
                  user_id INT, PRIMARY KEY (id), \
                  FOREIGN KEY (user_id) REFERENCES public.users (id))"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn mysql_start_value_follows_the_create() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let mut action = orders();
        action.table.tablespace = None;
        action.foreign_keys.clear();
        action.columns[0].auto_increment = Some(AutoIncrementInfo {
            start_with: Some(1000),
            increment_by: None,
        });
        let sql = scope
            .registry()
            .plan_sql(&action.into(), &scope)
            .await
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE public.orders (id INT AUTO_INCREMENT NOT NULL, note VARCHAR(100), \
                 user_id INT, PRIMARY KEY (id))"
                    .to_string(),
                "ALTER TABLE public.orders AUTO_INCREMENT=1000".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn columns_named_like_constraints_are_kept() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let table = ObjectName::parse("public.t");
        let action: Action = CreateTableAction {
            table: Table::new(table.clone()),
            columns: vec![
                Column::new("Id", DataType::new("int")),
                Column::new("id", DataType::new("int")),
                Column::new("primaryKey", DataType::new("int")),
                Column::new("unique0", DataType::new("int")),
            ],
            primary_key: Some(PrimaryKey::new(table, ["id"])),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["CREATE TABLE public.t (Id INT, id INT, primaryKey INT, unique0 INT, \
                  PRIMARY KEY (id))"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn repeated_column_fails_validation() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = CreateTableAction {
            table: Table::new(ObjectName::parse("public.t")),
            columns: vec![
                Column::new("a", DataType::new("int")),
                Column::new("a", DataType::new("text")),
            ],
            primary_key: None,
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["Column a is defined more than once in public.t".to_string()]
        );
    }

    #[tokio::test]
    async fn long_names_fail_validation() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let long = "x".repeat(64);
        let mut action = orders();
        action.table.tablespace = None;
        action.columns[2].name = ObjectName::new(long.as_str());
        action.foreign_keys[0].name = Some(format!("fk_{}", long));
        let err = scope.execute(&action.into()).await.unwrap_err();
        let errors = err.validation_errors().unwrap().errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            format!(
                "column.name {} is longer than the 63 characters allowed on postgresql",
                long
            )
        );
        assert!(errors[1].starts_with("foreignKey.name fk_x"));

        let mut action = orders();
        action.table.tablespace = None;
        action.columns[2].name = ObjectName::new("x".repeat(63));
        assert!(scope.execute(&action.into()).await.is_ok());
    }

    #[tokio::test]
    async fn create_table_as_select() {
        let scope = offline_scope(&SQLITE_DIALECT).await;
        let action: Action = CreateTableAsSelectAction {
            table: ObjectName::parse("main.copy"),
            select_sql: " SELECT * FROM src ".into(),
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["CREATE TABLE copy AS SELECT * FROM src".to_string()]
        );
    }

    #[tokio::test]
    async fn cascade_is_disallowed_without_support() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = DropTablesAction {
            tables: vec![ObjectName::new("a"), ObjectName::new("b")],
            cascade_constraints: true,
        }
        .into();
        let err = scope.execute(&action).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().errors(),
            &["cascadeConstraints is not allowed on mysql".to_string()]
        );
    }

    #[tokio::test]
    async fn drop_tables_one_statement_each() {
        let scope = offline_scope(&MYSQL_DIALECT).await;
        let action: Action = DropTablesAction {
            tables: vec![ObjectName::new("a"), ObjectName::new("b")],
            cascade_constraints: false,
        }
        .into();
        assert_eq!(
            scope.registry().plan_sql(&action, &scope).await.unwrap(),
            vec!["DROP TABLE a".to_string(), "DROP TABLE b".to_string()]
        );
    }

    #[tokio::test]
    async fn rendering_is_stable() {
        let scope = offline_scope(&POSTGRES_DIALECT).await;
        let action: Action = orders().into();
        let first = scope.registry().plan_sql(&action, &scope).await.unwrap();
        let second = scope.registry().plan_sql(&action, &scope).await.unwrap();
        assert_eq!(first, second);
    }
}
