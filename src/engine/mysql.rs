use super::{ConnectionKind, DbEngine, DbSession, MetadataMethod, MetadataQuery};
use crate::engine::dialect::SqlDialect;
use crate::engine::value::{Row, SqlValue};
use crate::error::{ActionError, Result};
use crate::util::dialects::mysql::MYSQL_DIALECT;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row as _};
use std::sync::Arc;
use tracing::debug;

pub struct MysqlEngine;

#[async_trait]
impl DbEngine for MysqlEngine {
    async fn connect(&self, url: &str) -> Result<Box<dyn DbSession>> {
        let conn = MySqlConnection::connect(url)
            .await
            .map_err(|e| ActionError::execution("Failed to connect to MySQL database", e))?;

        Ok(Box::new(MysqlSession { conn }))
    }

    fn dialect(&self) -> Arc<dyn SqlDialect> {
        Arc::new(MYSQL_DIALECT.clone())
    }
}

pub struct MysqlSession {
    conn: MySqlConnection,
}

// The single container level arrives in the schema argument and maps to a
// MySQL database; an absent schema means the current database.
const TABLES_SQL: &str = "SELECT NULL AS TABLE_CAT, TABLE_SCHEMA AS TABLE_SCHEM, \
     TABLE_NAME AS TABLE_NAME, 'TABLE' AS TABLE_TYPE, TABLE_COMMENT AS REMARKS \
     FROM information_schema.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_SCHEMA = COALESCE(?, DATABASE()) \
     AND (? IS NULL OR TABLE_NAME = ?) \
     ORDER BY TABLE_SCHEMA, TABLE_NAME";

const COLUMNS_SQL: &str = "SELECT NULL AS TABLE_CAT, TABLE_SCHEMA AS TABLE_SCHEM, \
     TABLE_NAME AS TABLE_NAME, COLUMN_NAME AS COLUMN_NAME, DATA_TYPE AS TYPE_NAME, \
     CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, DATETIME_PRECISION) AS SIGNED) AS COLUMN_SIZE, \
     CAST(NUMERIC_SCALE AS SIGNED) AS DECIMAL_DIGITS, \
     CAST(CASE IS_NULLABLE WHEN 'YES' THEN 1 WHEN 'NO' THEN 0 ELSE 2 END AS SIGNED) AS NULLABLE, \
     COLUMN_DEFAULT AS COLUMN_DEF, CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION, \
     CASE WHEN EXTRA LIKE '%auto_increment%' THEN 'YES' ELSE 'NO' END AS IS_AUTOINCREMENT, \
     COLUMN_COMMENT AS REMARKS \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) \
     AND (? IS NULL OR TABLE_NAME = ?) AND (? IS NULL OR COLUMN_NAME = ?) \
     ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION";

const IMPORTED_KEYS_SQL: &str = "SELECT NULL AS PKTABLE_CAT, \
     kcu.REFERENCED_TABLE_SCHEMA AS PKTABLE_SCHEM, kcu.REFERENCED_TABLE_NAME AS PKTABLE_NAME, \
     kcu.REFERENCED_COLUMN_NAME AS PKCOLUMN_NAME, NULL AS FKTABLE_CAT, \
     kcu.TABLE_SCHEMA AS FKTABLE_SCHEM, kcu.TABLE_NAME AS FKTABLE_NAME, \
     kcu.COLUMN_NAME AS FKCOLUMN_NAME, CAST(kcu.ORDINAL_POSITION AS SIGNED) AS KEY_SEQ, \
     CAST(CASE rc.UPDATE_RULE WHEN 'CASCADE' THEN 0 WHEN 'RESTRICT' THEN 1 \
       WHEN 'SET NULL' THEN 2 WHEN 'NO ACTION' THEN 3 WHEN 'SET DEFAULT' THEN 4 END AS SIGNED) AS UPDATE_RULE, \
     CAST(CASE rc.DELETE_RULE WHEN 'CASCADE' THEN 0 WHEN 'RESTRICT' THEN 1 \
       WHEN 'SET NULL' THEN 2 WHEN 'NO ACTION' THEN 3 WHEN 'SET DEFAULT' THEN 4 END AS SIGNED) AS DELETE_RULE, \
     kcu.CONSTRAINT_NAME AS FK_NAME, NULL AS PK_NAME, CAST(7 AS SIGNED) AS DEFERRABILITY \
     FROM information_schema.KEY_COLUMN_USAGE kcu \
     JOIN information_schema.REFERENTIAL_CONSTRAINTS rc \
       ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA \
      AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
      AND rc.TABLE_NAME = kcu.TABLE_NAME \
     WHERE kcu.REFERENCED_TABLE_NAME IS NOT NULL \
     AND kcu.TABLE_SCHEMA = COALESCE(?, DATABASE()) \
     AND (? IS NULL OR kcu.TABLE_NAME = ?) \
     ORDER BY kcu.TABLE_SCHEMA, kcu.TABLE_NAME, kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION";

const PRIMARY_KEYS_SQL: &str = "SELECT NULL AS TABLE_CAT, TABLE_SCHEMA AS TABLE_SCHEM, \
     TABLE_NAME AS TABLE_NAME, COLUMN_NAME AS COLUMN_NAME, \
     CAST(ORDINAL_POSITION AS SIGNED) AS KEY_SEQ, CONSTRAINT_NAME AS PK_NAME \
     FROM information_schema.KEY_COLUMN_USAGE \
     WHERE CONSTRAINT_NAME = 'PRIMARY' AND TABLE_SCHEMA = COALESCE(?, DATABASE()) \
     AND (? IS NULL OR TABLE_NAME = ?) \
     ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION";

fn metadata_sql(method: MetadataMethod) -> &'static str {
    match method {
        MetadataMethod::Tables => TABLES_SQL,
        MetadataMethod::Columns => COLUMNS_SQL,
        MetadataMethod::ImportedKeys => IMPORTED_KEYS_SQL,
        MetadataMethod::PrimaryKeys => PRIMARY_KEYS_SQL,
    }
}

#[async_trait]
impl DbSession for MysqlSession {
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
            .bind(query.table.clone())
            .bind(query.table.clone());
        if query.method == MetadataMethod::Columns {
            statement = statement
                .bind(query.column.clone())
                .bind(query.column.clone());
        }
        let rows = statement
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ActionError::execution(format!("Failed to call {}", query.method), e))?;
        Ok(rows.iter().map(convert_row).collect())
    }

    async fn default_schema(&mut self) -> Result<Option<String>> {
        let schema: Option<String> = sqlx::query_scalar("SELECT DATABASE()")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(schema)
    }

    async fn server_version(&mut self) -> Result<Option<String>> {
        let version: String = sqlx::query_scalar("SELECT VERSION()")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(Some(version))
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    let mut converted = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        converted.push(column.name(), convert_sqlx_value(row, idx));
    }
    converted
}

/// Convert a SQLx MySQL row value to SqlValue
fn convert_sqlx_value(row: &MySqlRow, index: usize) -> SqlValue {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Int);
    }
    if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(index) {
        return SqlValue::Bool(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(index) {
        return SqlValue::Float(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(index) {
        return SqlValue::from_datetime(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(index) {
        return SqlValue::from_date(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(index) {
        return SqlValue::from_time(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(index) {
        return SqlValue::String(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return SqlValue::Bytes(v);
    }

    SqlValue::Null
}
