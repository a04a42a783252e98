//! Postgres implementation of [`SyncStore`].

use crate::domain::entity::{ColumnType, EntityKind};
use crate::domain::source::{NewSource, SourceStatus, SyncSource};
use crate::storage::schema::{provenance_column_statements, CREATE_TABLE_STATEMENTS};
use crate::storage::{
    check_columns, conflict_key, CanonicalRecord, LookupEntry, StorageError, SyncStore,
    UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const SOURCE_COLUMNS: &str = "id, app_name, app_url, export_endpoint, last_sync_at, status";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and ensures every table the sync engine writes to exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, StorageError> {
        for statement in CREATE_TABLE_STATEMENTS {
            sqlx::query(statement).execute(&pool).await?;
        }
        for statement in provenance_column_statements() {
            sqlx::query(&statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SyncStore for PostgresStore {
    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn register_source(&self, source: &NewSource) -> Result<SyncSource, StorageError> {
        let sql = format!(
            "INSERT INTO sync_sources (app_name, app_url, export_endpoint, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (app_name) DO UPDATE SET
                app_url = EXCLUDED.app_url,
                export_endpoint = EXCLUDED.export_endpoint,
                status = EXCLUDED.status
             RETURNING {}",
            SOURCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&source.app_name)
            .bind(&source.app_url)
            .bind(&source.export_endpoint)
            .bind(SourceStatus::Registered.as_str())
            .fetch_one(&self.pool)
            .await?;
        source_from_row(&row)
    }

    async fn list_sources(&self) -> Result<Vec<SyncSource>, StorageError> {
        let sql = format!(
            "SELECT {} FROM sync_sources ORDER BY app_name",
            SOURCE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(source_from_row).collect()
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SyncSource>, StorageError> {
        let sql = format!("SELECT {} FROM sync_sources WHERE id = $1", SOURCE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(source_from_row).transpose()
    }

    async fn set_source_status(
        &self,
        id: Uuid,
        status: SourceStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE sync_sources
             SET status = $2, last_sync_at = COALESCE($3, last_sync_at)
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(last_sync_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::SourceNotFound(id));
        }
        Ok(())
    }

    async fn load_lookup(&self, kind: EntityKind) -> Result<Vec<LookupEntry>, StorageError> {
        let descriptor = kind.descriptor();
        let slug_expr = match descriptor.slug_column {
            Some(column) => format!("{}::text", column),
            None => "NULL::text".to_string(),
        };
        let sql = format!(
            "SELECT id::text AS id, {} AS slug, {}::text AS name FROM {}",
            slug_expr, descriptor.name_column, descriptor.table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(LookupEntry {
                id: row.try_get("id")?,
                slug: row.try_get("slug")?,
                name: row.try_get("name")?,
            });
        }
        Ok(entries)
    }

    async fn upsert(
        &self,
        kind: EntityKind,
        record: &CanonicalRecord,
    ) -> Result<UpsertOutcome, StorageError> {
        let descriptor = kind.descriptor();
        check_columns(descriptor, record)?;
        conflict_key(descriptor, record)?;

        let mut columns: Vec<&str> = Vec::with_capacity(record.len());
        let mut casted_placeholders: Vec<String> = Vec::with_capacity(record.len());
        let mut typed_values: Vec<(&str, ColumnType, &JsonValue)> = Vec::with_capacity(record.len());
        for (idx, (column, value)) in record.iter().enumerate() {
            let col_type = descriptor
                .column_type(column)
                .ok_or_else(|| StorageError::UnknownColumn {
                    table: descriptor.table,
                    column: column.clone(),
                })?;
            columns.push(column.as_str());
            casted_placeholders.push(format!("${}::{}", idx + 1, col_type.sql_cast()));
            typed_values.push((column.as_str(), col_type, value));
        }

        let mut set_clause = columns
            .iter()
            .filter(|c| **c != descriptor.natural_key)
            .map(|c| format!("{} = EXCLUDED.{}", c, c))
            .collect::<Vec<_>>()
            .join(", ");
        if set_clause.is_empty() {
            // DO NOTHING would suppress RETURNING on conflict.
            set_clause = format!(
                "{} = EXCLUDED.{}",
                descriptor.natural_key, descriptor.natural_key
            );
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) \
             ON CONFLICT ({}) DO UPDATE SET {} \
             RETURNING id::text AS id, (xmax = 0) AS inserted",
            descriptor.table,
            columns.join(", "),
            casted_placeholders.join(", "),
            descriptor.natural_key,
            set_clause
        );

        let mut query = sqlx::query(&sql);
        for (column, col_type, value) in typed_values {
            query = bind_value(query, column, col_type, value)?;
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(UpsertOutcome {
            id: row.try_get("id")?,
            inserted: row.try_get("inserted")?,
        })
    }
}

fn source_from_row(row: &PgRow) -> Result<SyncSource, StorageError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<SourceStatus>()
        .map_err(|message| StorageError::InvalidValue {
            column: "status".to_string(),
            message,
        })?;
    Ok(SyncSource {
        id: row.try_get("id")?,
        app_name: row.try_get("app_name")?,
        app_url: row.try_get("app_url")?,
        export_endpoint: row.try_get("export_endpoint")?,
        last_sync_at: row.try_get("last_sync_at")?,
        status,
    })
}

/// Binds one JSON value with the Rust type matching its column's cast.
fn bind_value<'q>(
    query: PgQuery<'q>,
    column: &str,
    col_type: ColumnType,
    value: &JsonValue,
) -> Result<PgQuery<'q>, StorageError> {
    if value.is_null() {
        return Ok(query.bind(None::<String>));
    }
    let invalid = |expected: &str| StorageError::InvalidValue {
        column: column.to_string(),
        message: format!("expected {}, got {}", expected, value),
    };
    let query = match col_type {
        ColumnType::Text | ColumnType::Uuid => query.bind(match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }),
        ColumnType::Int => query.bind(coerce_i64(value).ok_or_else(|| invalid("integer"))?),
        ColumnType::Float => query.bind(coerce_f64(value).ok_or_else(|| invalid("number"))?),
        ColumnType::Bool => query.bind(coerce_bool(value).ok_or_else(|| invalid("boolean"))?),
        ColumnType::Jsonb => query.bind(value.clone()),
        ColumnType::Timestamptz => {
            query.bind(coerce_timestamp(value).ok_or_else(|| invalid("RFC3339 timestamp"))?)
        }
    };
    Ok(query)
}

fn coerce_i64(v: &JsonValue) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return (f.fract() == 0.0).then_some(f as i64);
    }
    v.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

fn coerce_f64(v: &JsonValue) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn coerce_bool(v: &JsonValue) -> Option<bool> {
    if let Some(b) = v.as_bool() {
        return Some(b);
    }
    match v.as_str()?.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn coerce_timestamp(v: &JsonValue) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(v.as_str()?)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
