//! Logic that works against any database, driven by its capability table.
//!
//! SQL-producing logic builds [`StringClauses`] with the keys in [`clause`]
//! so dialect overrides can replace single fragments.

mod changelog;
mod column;
mod constraint;
mod data;
mod execute;
mod index;
mod sequence;
mod table;
mod view;

pub(crate) use column::column_parts;
pub use changelog::{CreateChangeLogTableLogic, MarkChangeSetRanLogic, CHANGELOG_COLUMNS};
pub use column::{
    AddAutoIncrementLogic, AddColumnsLogic, AddDefaultValueLogic, AddNotNullConstraintLogic,
    DropColumnsLogic,
};
pub use constraint::{
    AddForeignKeysLogic, AddLookupTableLogic, AddPrimaryKeysLogic, AddUniqueConstraintsLogic,
};
pub use data::{InsertDataLogic, UpdateDataLogic};
pub use execute::{ExecuteSqlLogic, QueryMetadataLogic, QuerySqlLogic};
pub use index::CreateIndexesLogic;
pub use sequence::{CreateSequenceLogic, DropSequencesLogic};
pub use table::{AlterTableLogic, CreateTableAsSelectLogic, CreateTableLogic, DropTablesLogic};
pub use view::CreateViewLogic;

use super::ActionLogicRegistry;
use crate::action::{Action, ExecuteSqlAction};
use crate::util::string_clauses::StringClauses;

/// Keys of addressable fragments.
pub mod clause {
    pub const TABLE_NAME: &str = "tableName";
    pub const COLUMN_NAME: &str = "columnName";
    pub const COLUMNS: &str = "columns";
    pub const DATA_TYPE: &str = "dataType";
    pub const DEFAULT_VALUE: &str = "defaultValue";
    pub const AUTO_INCREMENT: &str = "autoIncrement";
    pub const NULLABLE: &str = "nullable";
    pub const PRIMARY_KEY: &str = "primaryKey";
    pub const CONSTRAINT_NAME: &str = "constraintName";
    pub const REFERENCES: &str = "references";
    pub const ON_UPDATE: &str = "onUpdate";
    pub const ON_DELETE: &str = "onDelete";
    pub const DEFERRABLE: &str = "deferrable";
    pub const INITIALLY_DEFERRED: &str = "initiallyDeferred";
    pub const TABLESPACE: &str = "tablespace";
    pub const CASCADE: &str = "cascade";
    pub const ALTER_CLAUSES: &str = "alterClauses";
    pub const SEQUENCE_NAME: &str = "sequenceName";
    pub const START_WITH: &str = "startWith";
    pub const INCREMENT_BY: &str = "incrementBy";
    pub const MIN_VALUE: &str = "minValue";
    pub const MAX_VALUE: &str = "maxValue";
    pub const CYCLE: &str = "cycle";
    pub const DATA_TYPE_AS: &str = "as";
    pub const WHERE: &str = "where";

    /// Key of one column's fragment in a column list or assignment list.
    pub fn column(name: &str) -> String {
        format!("column:{}", name)
    }

    /// Key of the n-th table-level constraint of a kind.
    pub fn constraint(kind: &str, idx: usize) -> String {
        format!("constraint:{}{}", kind, idx)
    }
}

/// Wrap rendered clauses as a statement to run.
pub(crate) fn execute_sql(clauses: &StringClauses) -> Action {
    ExecuteSqlAction::new(clauses.to_string()).into()
}

pub fn register(registry: &mut ActionLogicRegistry) {
    registry
        .register(ExecuteSqlLogic)
        .register(QuerySqlLogic)
        .register(QueryMetadataLogic)
        .register(AlterTableLogic)
        .register(CreateTableLogic)
        .register(CreateTableAsSelectLogic)
        .register(DropTablesLogic)
        .register(AddColumnsLogic)
        .register(DropColumnsLogic)
        .register(AddAutoIncrementLogic)
        .register(AddNotNullConstraintLogic)
        .register(AddDefaultValueLogic)
        .register(AddForeignKeysLogic)
        .register(AddPrimaryKeysLogic)
        .register(AddUniqueConstraintsLogic)
        .register(AddLookupTableLogic)
        .register(CreateSequenceLogic)
        .register(DropSequencesLogic)
        .register(CreateIndexesLogic)
        .register(CreateViewLogic)
        .register(InsertDataLogic)
        .register(UpdateDataLogic)
        .register(CreateChangeLogTableLogic)
        .register(MarkChangeSetRanLogic);
}
