//! Statement execution.
//!
//! The compiler never talks to a database itself. It hands rendered
//! statements to an [`Executor`]; [`PgExecutor`] and [`MySqlExecutor`] are
//! the stock adapters over caller-owned sqlx pools. Values bind with their
//! native types and result columns decode by their reported type.

use crate::ast::{Row, Value, values::iso_string};
use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::SqlStatement;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, MySql, MySqlPool, PgPool, Postgres, Row as _, TypeInfo};
use std::future::Future;

/// What one statement produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    /// Driver-reported auto-increment id of the last inserted row.
    pub last_insert_id: Option<Value>,
}

impl QueryResponse {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows_affected: rows.len() as u64,
            rows,
            last_insert_id: None,
        }
    }

    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }

    pub fn with_last_insert_id(mut self, id: impl Into<Value>) -> Self {
        self.last_insert_id = Some(id.into());
        self
    }
}

/// Runs one rendered statement. Called once per statement; retries,
/// timeouts and transactions are the implementor's business.
pub trait Executor: Send + Sync {
    fn execute(&self, statement: &SqlStatement) -> impl Future<Output = WeaveResult<QueryResponse>> + Send;
}

/// Executes statements on a Postgres pool. MariaDB and MySQL use
/// [`MySqlExecutor`].
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Executor for PgExecutor {
    async fn execute(&self, statement: &SqlStatement) -> WeaveResult<QueryResponse> {
        let query = statement
            .bindings
            .iter()
            .fold(sqlx::query(&statement.sql), bind_pg);

        if statement.returns_rows {
            let rows: Vec<PgRow> = query.fetch_all(&self.pool).await.map_err(WeaveError::execution)?;
            Ok(QueryResponse::rows(rows.iter().map(pg_row_to_map).collect()))
        } else {
            let result = query.execute(&self.pool).await.map_err(WeaveError::execution)?;
            Ok(QueryResponse::affected(result.rows_affected()))
        }
    }
}

/// Executes statements on a MySQL or MariaDB pool.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl Executor for MySqlExecutor {
    async fn execute(&self, statement: &SqlStatement) -> WeaveResult<QueryResponse> {
        let query = statement
            .bindings
            .iter()
            .fold(sqlx::query(&statement.sql), bind_mysql);

        if statement.returns_rows {
            let rows: Vec<MySqlRow> = query.fetch_all(&self.pool).await.map_err(WeaveError::execution)?;
            Ok(QueryResponse::rows(rows.iter().map(mysql_row_to_map).collect()))
        } else {
            let result = query.execute(&self.pool).await.map_err(WeaveError::execution)?;
            let response = QueryResponse::affected(result.rows_affected());
            Ok(match i64::try_from(result.last_insert_id()) {
                Ok(id) if id > 0 => response.with_last_insert_id(id),
                _ => response,
            })
        }
    }
}

// NULL binds as a text NULL.
fn bind_pg<'q>(query: Query<'q, Postgres, PgArguments>, value: &Value) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::String(v) => query.bind(v.clone()),
        Value::DateTime(dt) => query.bind(*dt),
    }
}

fn bind_mysql<'q>(query: Query<'q, MySql, MySqlArguments>, value: &Value) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::String(v) => query.bind(v.clone()),
        Value::DateTime(dt) => query.bind(*dt),
    }
}

/// How a result column is read back into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Int16,
    Int32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Json,
    Timestamptz,
    Timestamp,
    Date,
    Time,
    Uuid,
    Text,
}

impl ColumnKind {
    fn postgres(type_name: &str) -> Self {
        match type_name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int16,
            "INT4" => Self::Int32,
            "INT8" => Self::Int64,
            "FLOAT4" => Self::Float32,
            "FLOAT8" => Self::Float64,
            "NUMERIC" => Self::Decimal,
            "JSON" | "JSONB" => Self::Json,
            "TIMESTAMPTZ" => Self::Timestamptz,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "UUID" => Self::Uuid,
            _ => Self::Text,
        }
    }

    fn mysql(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" => Self::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Self::Int64,
            name if name.ends_with(" UNSIGNED") => Self::UInt64,
            "FLOAT" => Self::Float32,
            "DOUBLE" => Self::Float64,
            "DECIMAL" => Self::Decimal,
            "JSON" => Self::Json,
            "TIMESTAMP" => Self::Timestamptz,
            "DATETIME" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            _ => Self::Text,
        }
    }
}

fn or_null<T>(value: Option<T>, to_json: impl FnOnce(T) -> JsonValue) -> JsonValue {
    value.map(to_json).unwrap_or(JsonValue::Null)
}

fn float(value: f64) -> JsonValue {
    or_null(serde_json::Number::from_f64(value), JsonValue::Number)
}

/// Decimals become JSON numbers when they fit, text otherwise.
fn decimal(value: Decimal) -> JsonValue {
    let text = value.normalize().to_string();
    match text.parse::<serde_json::Number>() {
        Ok(number) => JsonValue::Number(number),
        Err(_) => JsonValue::String(text),
    }
}

fn timestamp(value: DateTime<Utc>) -> JsonValue {
    JsonValue::String(iso_string(&value))
}

fn pg_cell(row: &PgRow, index: usize, kind: ColumnKind) -> Result<JsonValue, sqlx::Error> {
    Ok(match kind {
        ColumnKind::Bool => or_null(row.try_get::<Option<bool>, _>(index)?, JsonValue::Bool),
        ColumnKind::Int16 => or_null(row.try_get::<Option<i16>, _>(index)?, JsonValue::from),
        ColumnKind::Int32 => or_null(row.try_get::<Option<i32>, _>(index)?, JsonValue::from),
        ColumnKind::Int64 | ColumnKind::UInt64 => {
            or_null(row.try_get::<Option<i64>, _>(index)?, JsonValue::from)
        }
        ColumnKind::Float32 => or_null(row.try_get::<Option<f32>, _>(index)?, |v| float(f64::from(v))),
        ColumnKind::Float64 => or_null(row.try_get::<Option<f64>, _>(index)?, float),
        ColumnKind::Decimal => or_null(row.try_get::<Option<Decimal>, _>(index)?, decimal),
        ColumnKind::Json => or_null(row.try_get::<Option<JsonValue>, _>(index)?, |v| v),
        ColumnKind::Timestamptz => or_null(row.try_get::<Option<DateTime<Utc>>, _>(index)?, timestamp),
        ColumnKind::Timestamp => or_null(row.try_get::<Option<NaiveDateTime>, _>(index)?, |v| {
            timestamp(v.and_utc())
        }),
        ColumnKind::Date => or_null(row.try_get::<Option<NaiveDate>, _>(index)?, |v| {
            JsonValue::String(v.to_string())
        }),
        ColumnKind::Time => or_null(row.try_get::<Option<NaiveTime>, _>(index)?, |v| {
            JsonValue::String(v.to_string())
        }),
        ColumnKind::Uuid => or_null(row.try_get::<Option<Uuid>, _>(index)?, |v| {
            JsonValue::String(v.to_string())
        }),
        ColumnKind::Text => or_null(row.try_get::<Option<String>, _>(index)?, JsonValue::String),
    })
}

fn mysql_cell(row: &MySqlRow, index: usize, kind: ColumnKind) -> Result<JsonValue, sqlx::Error> {
    Ok(match kind {
        ColumnKind::Bool => or_null(row.try_get::<Option<bool>, _>(index)?, JsonValue::Bool),
        ColumnKind::Int16 | ColumnKind::Int32 | ColumnKind::Int64 => {
            or_null(row.try_get::<Option<i64>, _>(index)?, JsonValue::from)
        }
        ColumnKind::UInt64 => or_null(row.try_get::<Option<u64>, _>(index)?, JsonValue::from),
        ColumnKind::Float32 => or_null(row.try_get::<Option<f32>, _>(index)?, |v| float(f64::from(v))),
        ColumnKind::Float64 => or_null(row.try_get::<Option<f64>, _>(index)?, float),
        ColumnKind::Decimal => or_null(row.try_get::<Option<Decimal>, _>(index)?, decimal),
        ColumnKind::Json => or_null(row.try_get::<Option<JsonValue>, _>(index)?, |v| v),
        ColumnKind::Timestamptz => or_null(row.try_get::<Option<DateTime<Utc>>, _>(index)?, timestamp),
        ColumnKind::Timestamp => or_null(row.try_get::<Option<NaiveDateTime>, _>(index)?, |v| {
            timestamp(v.and_utc())
        }),
        ColumnKind::Date => or_null(row.try_get::<Option<NaiveDate>, _>(index)?, |v| {
            JsonValue::String(v.to_string())
        }),
        ColumnKind::Time => or_null(row.try_get::<Option<NaiveTime>, _>(index)?, |v| {
            JsonValue::String(v.to_string())
        }),
        ColumnKind::Uuid | ColumnKind::Text => {
            or_null(row.try_get::<Option<String>, _>(index)?, JsonValue::String)
        }
    })
}

/// A column the decoder cannot read comes back as null.
fn decoded(column: &str, type_name: &str, cell: Result<JsonValue, sqlx::Error>) -> JsonValue {
    cell.unwrap_or_else(|err| {
        tracing::debug!(column, type_name, error = %err, "column not decoded");
        JsonValue::Null
    })
}

/// Convert a PgRow to a column-ordered JSON map.
fn pg_row_to_map(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let type_name = column.type_info().name();
            let cell = pg_cell(row, column.ordinal(), ColumnKind::postgres(type_name));
            (column.name().to_string(), decoded(column.name(), type_name, cell))
        })
        .collect()
}

/// Convert a MySqlRow to a column-ordered JSON map.
fn mysql_row_to_map(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let type_name = column.type_info().name();
            let cell = mysql_cell(row, column.ordinal(), ColumnKind::mysql(type_name));
            (column.name().to_string(), decoded(column.name(), type_name, cell))
        })
        .collect()
}
