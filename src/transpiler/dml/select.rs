//! SELECT assembly: the two-stage read.

use super::{filters_for, projection, target_table};
use crate::ast::QueryJson;
use crate::error::WeaveResult;
use crate::transpiler::conditions::FilterPass;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::joins::apply_joins;
use crate::transpiler::sorting::{apply_pagination, apply_sort, pagination};
use crate::transpiler::statement::SelectQuery;

/// Build a read.
///
/// The base table is paged, filtered and sorted in a derived table first,
/// so that joins fanning out to many rows cannot eat into the page. The
/// outer query then projects, joins, caps the row count and applies the
/// filters on joined tables.
pub fn build_select(json: &QueryJson, dialect: Dialect, max_rows: usize) -> WeaveResult<SelectQuery> {
    let table_name = json.table_name();
    let aliases = &json.table_aliases;
    let window = pagination(json.paginate.as_ref(), max_rows)?;

    let inner = apply_pagination(SelectQuery::table(target_table(json, true)), window)
        .filter(filters_for(json, dialect, FilterPass::Base, Some(aliases)));
    let inner = apply_sort(inner, json, dialect);

    let mut outer = SelectQuery::from_source(inner.into_subquery(json.alias_of(table_name)))
        .project(projection(json, dialect));
    if dialect.sorts_outer_query() {
        outer = apply_sort(outer, json, dialect);
    }

    let outer = apply_joins(
        outer,
        table_name,
        &json.relationships,
        json.endpoint.schema.as_deref(),
        aliases,
        max_rows,
    )?;
    Ok(outer.filter(filters_for(json, dialect, FilterPass::Relationship, Some(aliases))))
}
