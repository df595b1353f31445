//! Result post-processing.
//!
//! Drivers hand JSON columns back as text. For every column the table
//! schema marks as JSON (or as a multi-user reference, which is stored as
//! a JSON array) the text is parsed back into structured data.

use crate::ast::{Row, Table};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A cell that claimed to be JSON but was not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonDecodeError {
    /// Index of the row in the result set.
    pub row: usize,
    /// Key of the cell as it appeared in the row.
    pub column: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Materialized {
    pub rows: Vec<Row>,
    /// Malformed cells; those cells are left as returned.
    pub errors: Vec<JsonDecodeError>,
}

/// Parse string-encoded JSON cells under both the qualified
/// (`table.column`) and bare (`column`) keys.
pub fn materialize_json_columns(table: &Table, rows: Vec<Row>) -> Materialized {
    let json_columns: Vec<&str> = table
        .schema
        .iter()
        .filter(|(_, field)| field.is_json())
        .map(|(name, _)| name.as_str())
        .collect();

    let mut errors = Vec::new();
    if json_columns.is_empty() {
        return Materialized { rows, errors };
    }

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(index, mut row)| {
            for column in &json_columns {
                for key in [format!("{}.{}", table.name, column), column.to_string()] {
                    let Some(JsonValue::String(text)) = row.get(&key) else {
                        continue;
                    };
                    match serde_json::from_str::<JsonValue>(text) {
                        Ok(parsed) => {
                            row.insert(key, parsed);
                        }
                        Err(err) => {
                            tracing::debug!(row = index, column = %key, error = %err, "json column did not parse");
                            errors.push(JsonDecodeError {
                                row: index,
                                column: key,
                                message: err.to_string(),
                            });
                        }
                    }
                }
            }
            row
        })
        .collect();

    Materialized { rows, errors }
}
