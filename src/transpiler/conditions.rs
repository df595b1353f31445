//! Filter translation: `SearchFilters` to WHERE predicates.

use super::dialect::{Dialect, JsonContainment};
use super::keys::canonical_key;
use super::statement::{ColumnRef, JsonFunction, Predicate, WhereClause};
use super::traits::SqlGenerator;
use crate::ast::{CompareOp, Filter, LogicalOp, SearchFilters, Value};
use std::collections::BTreeMap;

/// Context for parameterized query building.
#[derive(Debug, Default)]
pub struct ParamContext {
    /// Current parameter index (1-based for Postgres $1, $2, etc.)
    pub index: usize,
    /// Collected parameter values in order
    pub params: Vec<Value>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the placeholder for it.
    pub fn add_param(&mut self, value: Value, generator: &dyn SqlGenerator) -> String {
        self.index += 1;
        self.params.push(value);
        generator.placeholder(self.index)
    }
}

/// Which keys a filter pass picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPass {
    /// Bare keys, qualified with the base table.
    Base,
    /// `table.column` keys targeting joined tables.
    Relationship,
}

/// Where filter keys resolve to.
#[derive(Debug, Clone, Copy)]
pub struct FilterScope<'a> {
    pub base_table: &'a str,
    pub aliases: Option<&'a BTreeMap<String, String>>,
    pub pass: FilterPass,
}

impl<'a> FilterScope<'a> {
    pub fn new(base_table: &'a str, pass: FilterPass) -> Self {
        Self {
            base_table,
            aliases: None,
            pass,
        }
    }

    pub fn with_aliases(mut self, aliases: &'a BTreeMap<String, String>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    fn table_name<'k>(&'k self, table: &'k str) -> &'k str {
        self.aliases
            .and_then(|aliases| aliases.get(table))
            .map(String::as_str)
            .unwrap_or(table)
    }

    /// Column for a filter key, or `None` if the key belongs to the other pass.
    pub fn resolve(&self, key: &str) -> Option<ColumnRef> {
        let key = canonical_key(key);
        match (key.split_once('.'), self.pass) {
            (None, FilterPass::Base) => Some(ColumnRef::new(self.table_name(self.base_table), key)),
            (Some((table, column)), FilterPass::Relationship) => {
                Some(ColumnRef::new(self.table_name(table), column))
            }
            _ => None,
        }
    }
}

/// Translate every filter this pass owns and conjoin the result with `clause`.
///
/// With `all_or` set every emitted predicate is OR-ed, across categories.
pub fn apply_filters(
    clause: WhereClause,
    filters: &SearchFilters<Value>,
    scope: &FilterScope<'_>,
    dialect: Dialect,
) -> WhereClause {
    let op = if filters.all_or { LogicalOp::Or } else { LogicalOp::And };
    let translated = filters
        .filters
        .iter()
        .filter_map(|filter| {
            let column = scope.resolve(filter.key())?;
            translate(filter, column, dialect)
        })
        .fold(WhereClause::new(op), WhereClause::push);
    clause.and(translated)
}

fn translate(filter: &Filter<Value>, column: ColumnRef, dialect: Dialect) -> Option<Predicate> {
    let predicate = match filter {
        Filter::OneOf { values, .. } => Predicate::In {
            column,
            values: values.clone(),
        },
        Filter::String { value, .. } => like(column, value, dialect, |v| format!("{}%", v))?,
        Filter::Fuzzy { value, .. } => like(column, value, dialect, |v| format!("%{}%", v))?,
        Filter::Range { key, low, high } => {
            let low = low.as_ref().filter(|v| v.is_valid_bound());
            let high = high.as_ref().filter(|v| v.is_valid_bound());
            match (low, high) {
                (Some(low), Some(high)) => Predicate::Between {
                    column,
                    low: low.clone(),
                    high: high.clone(),
                },
                (Some(low), None) => Predicate::Compare {
                    column,
                    op: CompareOp::Gt,
                    value: low.clone(),
                },
                (None, Some(high)) => Predicate::Compare {
                    column,
                    op: CompareOp::Lt,
                    value: high.clone(),
                },
                (None, None) => {
                    tracing::debug!(key = %key, "range filter has no valid bound, skipping");
                    return None;
                }
            }
        }
        Filter::Equal { value: Value::Null, .. } => Predicate::IsNull { column, negated: false },
        Filter::Equal { value, .. } => Predicate::Compare {
            column,
            op: CompareOp::Eq,
            value: value.clone(),
        },
        Filter::NotEqual { value: Value::Null, .. } => Predicate::IsNull { column, negated: true },
        Filter::NotEqual { value, .. } => Predicate::Compare {
            column,
            op: CompareOp::Ne,
            value: value.clone(),
        },
        Filter::Empty { .. } => Predicate::IsNull { column, negated: false },
        Filter::NotEmpty { .. } => Predicate::IsNull { column, negated: true },
        Filter::Contains { key, values } | Filter::NotContains { key, values } => {
            if values.is_empty() {
                tracing::debug!(key = %key, "contains filter has no elements, skipping");
                return None;
            }
            let predicate = contains(column, values, false, dialect);
            if matches!(filter, Filter::NotContains { .. }) {
                Predicate::Not(Box::new(predicate))
            } else {
                predicate
            }
        }
        Filter::ContainsAny { key, values } => {
            if values.is_empty() {
                tracing::debug!(key = %key, "containsAny filter has no elements, skipping");
                return None;
            }
            contains(column, values, true, dialect)
        }
    };
    Some(predicate)
}

fn like(
    column: ColumnRef,
    value: &Value,
    dialect: Dialect,
    pattern: impl Fn(&str) -> String,
) -> Option<Predicate> {
    let text = value.as_text()?;
    let text = if dialect.native_ilike() { text } else { text.to_lowercase() };
    Some(Predicate::Like {
        column,
        pattern: Value::String(pattern(&text)),
    })
}

/// The elements as a JSON array document.
fn json_document(values: &[Value]) -> Value {
    let items: Vec<serde_json::Value> = values.iter().map(Value::to_json).collect();
    Value::String(serde_json::Value::Array(items).to_string())
}

fn contains(column: ColumnRef, values: &[Value], any: bool, dialect: Dialect) -> Predicate {
    match dialect.json_containment() {
        JsonContainment::Jsonb if any => Predicate::JsonbHasAny {
            column,
            values: values
                .iter()
                .map(|v| Value::String(v.as_text().unwrap_or_default()))
                .collect(),
        },
        JsonContainment::Jsonb => Predicate::JsonbContains {
            column,
            document: json_document(values),
        },
        JsonContainment::JsonFunctions => Predicate::JsonFunction {
            column,
            function: if any { JsonFunction::Overlaps } else { JsonFunction::Contains },
            document: json_document(values),
        },
        JsonContainment::LikeEmulation => Predicate::Group {
            op: if any { LogicalOp::Or } else { LogicalOp::And },
            predicates: values
                .iter()
                .map(|value| {
                    let pattern = match value {
                        Value::String(s) => format!("%\"{}\"%", s.to_lowercase()),
                        other => format!("%{}%", other),
                    };
                    Predicate::Like {
                        column: column.clone(),
                        pattern: Value::String(pattern),
                    }
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_pass() {
        let aliases = BTreeMap::from([("persons".to_string(), "a".to_string())]);
        let base = FilterScope::new("persons", FilterPass::Base).with_aliases(&aliases);
        assert_eq!(base.resolve("1:name"), Some(ColumnRef::new("a", "name")));
        assert_eq!(base.resolve("tasks.title"), None);

        let rel = FilterScope::new("persons", FilterPass::Relationship).with_aliases(&aliases);
        assert_eq!(rel.resolve("tasks.title"), Some(ColumnRef::new("tasks", "title")));
        assert_eq!(rel.resolve("name"), None);
    }

    #[test]
    fn test_param_context_numbers_from_one() {
        let generator = Dialect::SqlServer.generator();
        let mut ctx = ParamContext::new();
        assert_eq!(ctx.add_param(Value::Int(1), generator.as_ref()), "@p1");
        assert_eq!(ctx.add_param(Value::Int(2), generator.as_ref()), "@p2");
        assert_eq!(ctx.params.len(), 2);
    }
}
