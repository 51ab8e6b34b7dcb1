use super::{ConnectionKind, DbEngine, DbSession, MetadataMethod, MetadataQuery};
use crate::engine::dialect::SqlDialect;
use crate::engine::value::{Row, SqlValue};
use crate::error::{ActionError, Result};
use crate::util::dialects::postgres::POSTGRES_DIALECT;
use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, Connection, Row as _, TypeInfo};
use std::sync::Arc;
use tracing::debug;

pub struct PostgresEngine;

#[async_trait]
impl DbEngine for PostgresEngine {
    async fn connect(&self, url: &str) -> Result<Box<dyn DbSession>> {
        let conn = PgConnection::connect(url)
            .await
            .map_err(|e| ActionError::execution("Failed to connect to PostgreSQL database", e))?;

        Ok(Box::new(PostgresSession { conn }))
    }

    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(POSTGRES_DIALECT.clone())
    }
}

pub struct PostgresSession {
    conn: PgConnection,
}

// Every projected column is cast to text or int8 so rows decode the same way
// regardless of the catalog's domain types.
const TABLES_SQL: &str = r#"SELECT NULL::text AS "TABLE_CAT", n.nspname::text AS "TABLE_SCHEM",
    c.relname::text AS "TABLE_NAME", 'TABLE'::text AS "TABLE_TYPE",
    pg_catalog.obj_description(c.oid, 'pg_class')::text AS "REMARKS"
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p')
  AND n.nspname = COALESCE($1::text, current_schema())
  AND ($2::text IS NULL OR c.relname = $2::text)
ORDER BY n.nspname, c.relname"#;

const COLUMNS_SQL: &str = r#"SELECT NULL::text AS "TABLE_CAT", c.table_schema::text AS "TABLE_SCHEM",
    c.table_name::text AS "TABLE_NAME", c.column_name::text AS "COLUMN_NAME",
    c.udt_name::text AS "TYPE_NAME",
    COALESCE(c.character_maximum_length, c.numeric_precision)::int8 AS "COLUMN_SIZE",
    c.numeric_scale::int8 AS "DECIMAL_DIGITS",
    (CASE c.is_nullable WHEN 'YES' THEN 1 WHEN 'NO' THEN 0 ELSE 2 END)::int8 AS "NULLABLE",
    c.column_default::text AS "COLUMN_DEF",
    c.ordinal_position::int8 AS "ORDINAL_POSITION",
    (CASE WHEN c.is_identity = 'YES' OR c.column_default LIKE 'nextval(%' THEN 'YES' ELSE 'NO' END)::text AS "IS_AUTOINCREMENT",
    pg_catalog.col_description(
        format('%I.%I', c.table_schema, c.table_name)::regclass::oid,
        c.ordinal_position::int)::text AS "REMARKS"
FROM information_schema.columns c
WHERE c.table_schema = COALESCE($1::text, current_schema())
  AND ($2::text IS NULL OR c.table_name = $2::text)
  AND ($3::text IS NULL OR c.column_name = $3::text)
ORDER BY c.table_schema, c.table_name, c.ordinal_position"#;

const IMPORTED_KEYS_SQL: &str = r#"SELECT NULL::text AS "PKTABLE_CAT", pn.nspname::text AS "PKTABLE_SCHEM",
    pc.relname::text AS "PKTABLE_NAME", pa.attname::text AS "PKCOLUMN_NAME",
    NULL::text AS "FKTABLE_CAT", fn.nspname::text AS "FKTABLE_SCHEM",
    fc.relname::text AS "FKTABLE_NAME", fa.attname::text AS "FKCOLUMN_NAME",
    k.pos::int8 AS "KEY_SEQ",
    (CASE con.confupdtype WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4 END)::int8 AS "UPDATE_RULE",
    (CASE con.confdeltype WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4 END)::int8 AS "DELETE_RULE",
    con.conname::text AS "FK_NAME", NULL::text AS "PK_NAME",
    (CASE WHEN con.condeferrable AND con.condeferred THEN 5 WHEN con.condeferrable THEN 6 ELSE 7 END)::int8 AS "DEFERRABILITY"
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class fc ON fc.oid = con.conrelid
JOIN pg_catalog.pg_namespace fn ON fn.oid = fc.relnamespace
JOIN pg_catalog.pg_class pc ON pc.oid = con.confrelid
JOIN pg_catalog.pg_namespace pn ON pn.oid = pc.relnamespace
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(fk_attnum, pk_attnum, pos)
JOIN pg_catalog.pg_attribute fa ON fa.attrelid = con.conrelid AND fa.attnum = k.fk_attnum
JOIN pg_catalog.pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = k.pk_attnum
WHERE con.contype = 'f'
  AND fn.nspname = COALESCE($1::text, current_schema())
  AND ($2::text IS NULL OR fc.relname = $2::text)
ORDER BY fn.nspname, fc.relname, con.conname, k.pos"#;

const PRIMARY_KEYS_SQL: &str = r#"SELECT NULL::text AS "TABLE_CAT", n.nspname::text AS "TABLE_SCHEM",
    c.relname::text AS "TABLE_NAME", a.attname::text AS "COLUMN_NAME",
    k.pos::int8 AS "KEY_SEQ", con.conname::text AS "PK_NAME"
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, pos)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE con.contype = 'p'
  AND n.nspname = COALESCE($1::text, current_schema())
  AND ($2::text IS NULL OR c.relname = $2::text)
ORDER BY n.nspname, c.relname, k.pos"#;

fn metadata_sql(method: MetadataMethod) -> &'static str {
    match method {
        MetadataMethod::Tables => TABLES_SQL,
        MetadataMethod::Columns => COLUMNS_SQL,
        MetadataMethod::ImportedKeys => IMPORTED_KEYS_SQL,
        MetadataMethod::PrimaryKeys => PRIMARY_KEYS_SQL,
    }
}

#[async_trait]
impl DbSession for PostgresSession {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Live
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        debug!(sql, "Executing statement");
        let result = sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| ActionError::execution("Failed to execute SQL statement", e))?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!(sql, "Running query");
        let rows = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ActionError::execution("Failed to run query", e))?;
        Ok(rows.iter().map(convert_row).collect())
    }

    async fn metadata(&mut self, query: &MetadataQuery) -> Result<Vec<Row>> {
        debug!(method = %query.method, schema = ?query.schema, table = ?query.table, "Reading metadata");
        let mut statement = sqlx::query(metadata_sql(query.method))
            .bind(query.schema.clone())
            .bind(query.table.clone());
        if query.method == MetadataMethod::Columns {
            statement = statement.bind(query.column.clone());
        }
        let rows = statement
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ActionError::execution(format!("Failed to call {}", query.method), e))?;
        Ok(rows.iter().map(convert_row).collect())
    }

    async fn default_schema(&mut self) -> Result<Option<String>> {
        let schema: Option<String> = sqlx::query_scalar("SELECT current_schema()::text")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(schema)
    }

    async fn server_version(&mut self) -> Result<Option<String>> {
        let version: String = sqlx::query_scalar("SHOW server_version")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(Some(version))
    }
}

fn convert_row(row: &PgRow) -> Row {
    let mut converted = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        converted.push(column.name(), convert_sqlx_value(row, idx));
    }
    converted
}

/// Convert a SQLx PostgreSQL row value to SqlValue, dispatching on the
/// reported column type since Postgres decoding is strict about widths.
fn convert_sqlx_value(row: &PgRow, index: usize) -> SqlValue {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    let type_name = row.columns()[index].type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "BOOL" => row.try_get::<Option<bool>, _>(index).map(|v| v.map(SqlValue::Bool)),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .map(|v| v.map(|v| SqlValue::Int(v.into()))),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .map(|v| v.map(|v| SqlValue::Int(v.into()))),
        "INT8" => row.try_get::<Option<i64>, _>(index).map(|v| v.map(SqlValue::Int)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .map(|v| v.map(|v| SqlValue::Float(v.into()))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index).map(|v| v.map(SqlValue::Float)),
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(index)
            .map(|v| v.map(|v| SqlValue::Decimal(v.to_string()))),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map(|v| v.map(SqlValue::from_date)),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map(|v| v.map(SqlValue::from_time)),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(|v| v.map(SqlValue::from_datetime)),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .map(|v| v.map(|v| SqlValue::from_datetime(v.naive_utc()))),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map(|v| v.map(SqlValue::Bytes)),
        _ => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(SqlValue::String)),
    };

    value.ok().flatten().unwrap_or(SqlValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_queries_use_standard_column_names() {
        for column in ["TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME", "REMARKS"] {
            assert!(TABLES_SQL.contains(&format!("AS \"{}\"", column)));
        }
        for column in ["NULLABLE", "IS_AUTOINCREMENT", "TYPE_NAME", "COLUMN_SIZE", "COLUMN_DEF"] {
            assert!(COLUMNS_SQL.contains(&format!("AS \"{}\"", column)));
        }
        for column in ["PKTABLE_NAME", "FKCOLUMN_NAME", "KEY_SEQ", "FK_NAME", "DEFERRABILITY"] {
            assert!(IMPORTED_KEYS_SQL.contains(&format!("AS \"{}\"", column)));
        }
        assert!(PRIMARY_KEYS_SQL.contains("AS \"PK_NAME\""));
    }

    #[test]
    fn columns_take_an_extra_argument() {
        assert!(COLUMNS_SQL.contains("$3"));
        assert!(!TABLES_SQL.contains("$3"));
    }
}
