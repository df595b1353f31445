//! DELETE assembly.

use super::{filters_for, projection, target_table};
use crate::ast::QueryJson;
use crate::transpiler::conditions::FilterPass;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::statement::DeleteQuery;

/// Build a delete; with `returning` the deleted rows come back in the
/// requested projection.
pub fn build_delete(json: &QueryJson, dialect: Dialect, returning: bool) -> DeleteQuery {
    DeleteQuery::from_table(target_table(json, false))
        .filter(filters_for(json, dialect, FilterPass::Base, None))
        .returning(returning.then(|| projection(json, dialect)))
}
