//! DML (Data Manipulation Language) statement assembly.
//!
//! One builder per operation kind. Builders only assemble statement values;
//! rendering and parameter numbering happen in the compiler.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

use super::conditions::{FilterPass, FilterScope, apply_filters};
use super::dialect::Dialect;
use super::statement::{ColumnRef, Projection, SelectItem, TableRef, WhereClause};
use crate::ast::QueryJson;
use crate::normalize::normalize_filters;
use std::collections::BTreeMap;

/// The endpoint table, schema-qualified, optionally under its alias.
pub(crate) fn target_table(json: &QueryJson, aliased: bool) -> TableRef {
    let name = json.table_name();
    let table = TableRef::new(name).in_schema(json.endpoint.schema.as_deref());
    if aliased {
        table.alias(json.table_aliases.get(name).map(String::as_str))
    } else {
        table
    }
}

/// `*`, or each requested `table.column` under its own dotted name.
pub(crate) fn projection(json: &QueryJson, dialect: Dialect) -> Projection {
    let fields = match &json.resource {
        Some(resource) if !resource.fields.is_empty() => &resource.fields,
        _ => return Projection::All,
    };
    let schema = json.table().map(|t| &t.schema);
    let items = fields
        .iter()
        .map(|field| {
            let (column, name) = match field.split_once('.') {
                Some((table, column)) => (ColumnRef::new(table, column), column),
                None => (ColumnRef::bare(field.as_str()), field.as_str()),
            };
            let money_cast = dialect.casts_money()
                && schema
                    .and_then(|schema| schema.get(name))
                    .is_some_and(|f| f.is_money());
            SelectItem {
                column,
                alias: field.clone(),
                money_cast,
            }
        })
        .collect();
    Projection::Columns(items)
}

/// Normalized filters of one pass, or an empty clause.
pub(crate) fn filters_for(
    json: &QueryJson,
    dialect: Dialect,
    pass: FilterPass,
    aliases: Option<&BTreeMap<String, String>>,
) -> WhereClause {
    let Some(filters) = &json.filters else {
        return WhereClause::default();
    };
    let mut scope = FilterScope::new(json.table_name(), pass);
    if let Some(aliases) = aliases {
        scope = scope.with_aliases(aliases);
    }
    apply_filters(WhereClause::default(), &normalize_filters(filters), &scope, dialect)
}
