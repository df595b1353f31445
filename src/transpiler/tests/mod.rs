//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: reads, writes and the compiler entry points on Postgres
//! - `dialects`: quoting, placeholders, pagination and write forms per dialect
//! - `filters`: filter translation, connectives and containment
//! - `joins`: relationship joins and the two-stage read

mod core;
mod dialects;

use crate::ast::{QueryJson, Row};
use crate::transpiler::{Dialect, SqlStatement, ToSql};

fn compile(json: &QueryJson, dialect: Dialect) -> SqlStatement {
    json.to_sql_with_dialect(dialect).unwrap()
}

fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap()
}
