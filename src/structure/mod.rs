//! Snapshot model: qualified names and the database objects they identify.

mod datatype;
mod name;
mod objects;

pub use datatype::{DataType, StandardType};
pub use name::{ObjectName, ObjectReference, ObjectType};
pub use objects::{
    Attributes, AutoIncrementInfo, Catalog, Column, DatabaseObject, ForeignKey,
    ForeignKeyColumnCheck, Index, PrimaryKey, PrimaryKeyColumn, ReferentialAction, Schema,
    Sequence, Table, UniqueConstraint, View,
};
