pub mod dialects;
pub mod sql_escape;
pub mod string_clauses;
