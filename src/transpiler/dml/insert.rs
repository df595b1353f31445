//! INSERT assembly.

use super::target_table;
use crate::ast::{Body, QueryJson, Value};
use crate::error::{WeaveError, WeaveResult};
use crate::normalize::normalize_body;
use crate::transpiler::dialect::{Dialect, GeneratedId};
use crate::transpiler::statement::{InsertQuery, Projection};

/// Build a single-row insert. Null fields are left to column defaults.
/// Oracle has no column-less insert, so there the body needs a value.
pub fn build_insert(json: &QueryJson, dialect: Dialect, returning: bool) -> WeaveResult<InsertQuery> {
    let values: Vec<(String, Value)> = match &json.body {
        Some(Body::Row(row)) => normalize_body(row)
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect(),
        Some(Body::Rows(_)) => {
            return Err(WeaveError::invalid("create takes a single row, use bulk create for lists"));
        }
        None => Vec::new(),
    };
    if values.is_empty() && !dialect.supports_empty_insert() {
        return Err(WeaveError::invalid(format!(
            "{dialect} cannot insert a row without at least one non-null value"
        )));
    }

    let identity = !returning && dialect.generated_id() == GeneratedId::IdentityColumn;
    Ok(InsertQuery::into_table(target_table(json, false))
        .values(values)
        .returning(returning.then_some(Projection::All))
        .select_identity(identity))
}

/// Build one multi-row insert over the union of all row columns.
pub fn build_bulk_insert(json: &QueryJson) -> WeaveResult<InsertQuery> {
    let rows = match &json.body {
        Some(Body::Rows(rows)) if !rows.is_empty() => rows,
        Some(Body::Rows(_)) => return Err(WeaveError::invalid("bulk create requires at least one row")),
        _ => return Err(WeaveError::invalid("bulk create body must be a list of rows")),
    };
    Ok(InsertQuery::into_table(target_table(json, false)).rows(rows.iter().map(normalize_body).collect()))
}
