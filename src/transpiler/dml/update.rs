//! UPDATE assembly.

use super::{filters_for, target_table};
use crate::ast::{Body, QueryJson};
use crate::error::{WeaveError, WeaveResult};
use crate::normalize::normalize_body;
use crate::transpiler::conditions::FilterPass;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::statement::{Projection, UpdateQuery};

/// Build an update of the body's fields. Nulls are written, so a field set
/// to null is cleared.
pub fn build_update(json: &QueryJson, dialect: Dialect, returning: bool) -> WeaveResult<UpdateQuery> {
    let assignments = match &json.body {
        Some(Body::Row(row)) => normalize_body(row),
        Some(Body::Rows(_)) => return Err(WeaveError::invalid("update takes a single row")),
        None => Vec::new(),
    };
    if assignments.is_empty() {
        return Err(WeaveError::invalid("update has no fields to set"));
    }

    Ok(UpdateQuery::table(target_table(json, false))
        .set(assignments)
        .filter(filters_for(json, dialect, FilterPass::Base, None))
        .returning(returning.then_some(Projection::All)))
}
