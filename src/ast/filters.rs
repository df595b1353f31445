//! Search filters: one variant per operator category.
//!
//! The wire form is the mapping `category -> { key -> value }` plus an
//! `allOr` switch. Internally every entry becomes one [`Filter`], with the
//! payload shape fixed by its category. Categories are kept in the fixed
//! order below so that compiled SQL does not depend on how the caller
//! happened to order the document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Operator categories, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    OneOf,
    String,
    Fuzzy,
    Range,
    Equal,
    NotEqual,
    Empty,
    NotEmpty,
    Contains,
    NotContains,
    ContainsAny,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 11] = [
        FilterCategory::OneOf,
        FilterCategory::String,
        FilterCategory::Fuzzy,
        FilterCategory::Range,
        FilterCategory::Equal,
        FilterCategory::NotEqual,
        FilterCategory::Empty,
        FilterCategory::NotEmpty,
        FilterCategory::Contains,
        FilterCategory::NotContains,
        FilterCategory::ContainsAny,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::OneOf => "oneOf",
            FilterCategory::String => "string",
            FilterCategory::Fuzzy => "fuzzy",
            FilterCategory::Range => "range",
            FilterCategory::Equal => "equal",
            FilterCategory::NotEqual => "notEqual",
            FilterCategory::Empty => "empty",
            FilterCategory::NotEmpty => "notEmpty",
            FilterCategory::Contains => "contains",
            FilterCategory::NotContains => "notContains",
            FilterCategory::ContainsAny => "containsAny",
        }
    }
}

/// One predicate request. `V` is the leaf value type: raw JSON as received,
/// or bound [`crate::ast::Value`] after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<V = JsonValue> {
    /// Membership in a list.
    OneOf { key: String, values: Vec<V> },
    /// Case-insensitive starts-with.
    String { key: String, value: V },
    /// Case-insensitive substring.
    Fuzzy { key: String, value: V },
    /// Between / greater-than / less-than depending on which bounds are valid.
    Range {
        key: String,
        low: Option<V>,
        high: Option<V>,
    },
    Equal { key: String, value: V },
    NotEqual { key: String, value: V },
    Empty { key: String },
    NotEmpty { key: String },
    /// Array column holds every element.
    Contains { key: String, values: Vec<V> },
    /// Array column does not hold every element.
    NotContains { key: String, values: Vec<V> },
    /// Array column holds at least one element.
    ContainsAny { key: String, values: Vec<V> },
}

impl<V> Filter<V> {
    pub fn key(&self) -> &str {
        match self {
            Filter::OneOf { key, .. }
            | Filter::String { key, .. }
            | Filter::Fuzzy { key, .. }
            | Filter::Range { key, .. }
            | Filter::Equal { key, .. }
            | Filter::NotEqual { key, .. }
            | Filter::Empty { key }
            | Filter::NotEmpty { key }
            | Filter::Contains { key, .. }
            | Filter::NotContains { key, .. }
            | Filter::ContainsAny { key, .. } => key,
        }
    }

    pub fn category(&self) -> FilterCategory {
        match self {
            Filter::OneOf { .. } => FilterCategory::OneOf,
            Filter::String { .. } => FilterCategory::String,
            Filter::Fuzzy { .. } => FilterCategory::Fuzzy,
            Filter::Range { .. } => FilterCategory::Range,
            Filter::Equal { .. } => FilterCategory::Equal,
            Filter::NotEqual { .. } => FilterCategory::NotEqual,
            Filter::Empty { .. } => FilterCategory::Empty,
            Filter::NotEmpty { .. } => FilterCategory::NotEmpty,
            Filter::Contains { .. } => FilterCategory::Contains,
            Filter::NotContains { .. } => FilterCategory::NotContains,
            Filter::ContainsAny { .. } => FilterCategory::ContainsAny,
        }
    }

    /// Transform every leaf value, keeping keys and shapes.
    pub fn map_values<U>(self, mut f: impl FnMut(V) -> U) -> Filter<U> {
        match self {
            Filter::OneOf { key, values } => Filter::OneOf {
                key,
                values: values.into_iter().map(&mut f).collect(),
            },
            Filter::String { key, value } => Filter::String { key, value: f(value) },
            Filter::Fuzzy { key, value } => Filter::Fuzzy { key, value: f(value) },
            Filter::Range { key, low, high } => Filter::Range {
                key,
                low: low.map(&mut f),
                high: high.map(&mut f),
            },
            Filter::Equal { key, value } => Filter::Equal { key, value: f(value) },
            Filter::NotEqual { key, value } => Filter::NotEqual { key, value: f(value) },
            Filter::Empty { key } => Filter::Empty { key },
            Filter::NotEmpty { key } => Filter::NotEmpty { key },
            Filter::Contains { key, values } => Filter::Contains {
                key,
                values: values.into_iter().map(&mut f).collect(),
            },
            Filter::NotContains { key, values } => Filter::NotContains {
                key,
                values: values.into_iter().map(&mut f).collect(),
            },
            Filter::ContainsAny { key, values } => Filter::ContainsAny {
                key,
                values: values.into_iter().map(&mut f).collect(),
            },
        }
    }
}

/// The full filter set of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilters<V = JsonValue> {
    /// OR every predicate together instead of AND.
    pub all_or: bool,
    pub filters: Vec<Filter<V>>,
}

impl<V> Default for SearchFilters<V> {
    fn default() -> Self {
        Self {
            all_or: false,
            filters: Vec::new(),
        }
    }
}

impl<V> SearchFilters<V> {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn all_or(mut self, all_or: bool) -> Self {
        self.all_or = all_or;
        self
    }

    pub fn push(mut self, filter: Filter<V>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn map_values<U>(self, mut f: impl FnMut(V) -> U) -> SearchFilters<U> {
        SearchFilters {
            all_or: self.all_or,
            filters: self
                .filters
                .into_iter()
                .map(|filter| filter.map_values(&mut f))
                .collect(),
        }
    }
}

impl SearchFilters<JsonValue> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one_of(self, key: impl Into<String>, values: Vec<JsonValue>) -> Self {
        self.push(Filter::OneOf { key: key.into(), values })
    }

    pub fn string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Filter::String {
            key: key.into(),
            value: JsonValue::String(value.into()),
        })
    }

    pub fn fuzzy(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Filter::Fuzzy {
            key: key.into(),
            value: JsonValue::String(value.into()),
        })
    }

    pub fn range(
        self,
        key: impl Into<String>,
        low: Option<JsonValue>,
        high: Option<JsonValue>,
    ) -> Self {
        self.push(Filter::Range { key: key.into(), low, high })
    }

    pub fn equal(self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.push(Filter::Equal { key: key.into(), value: value.into() })
    }

    pub fn not_equal(self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.push(Filter::NotEqual { key: key.into(), value: value.into() })
    }

    pub fn empty(self, key: impl Into<String>) -> Self {
        self.push(Filter::Empty { key: key.into() })
    }

    pub fn not_empty(self, key: impl Into<String>) -> Self {
        self.push(Filter::NotEmpty { key: key.into() })
    }

    pub fn contains(self, key: impl Into<String>, values: Vec<JsonValue>) -> Self {
        self.push(Filter::Contains { key: key.into(), values })
    }

    pub fn not_contains(self, key: impl Into<String>, values: Vec<JsonValue>) -> Self {
        self.push(Filter::NotContains { key: key.into(), values })
    }

    pub fn contains_any(self, key: impl Into<String>, values: Vec<JsonValue>) -> Self {
        self.push(Filter::ContainsAny { key: key.into(), values })
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

type Entries = Map<String, JsonValue>;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchFilters {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    all_or: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    one_of: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fuzzy: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equal: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not_equal: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    empty: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not_empty: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    not_contains: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contains_any: Option<Entries>,
}

impl RawSearchFilters {
    fn entries(&self, category: FilterCategory) -> Option<&Entries> {
        match category {
            FilterCategory::OneOf => self.one_of.as_ref(),
            FilterCategory::String => self.string.as_ref(),
            FilterCategory::Fuzzy => self.fuzzy.as_ref(),
            FilterCategory::Range => self.range.as_ref(),
            FilterCategory::Equal => self.equal.as_ref(),
            FilterCategory::NotEqual => self.not_equal.as_ref(),
            FilterCategory::Empty => self.empty.as_ref(),
            FilterCategory::NotEmpty => self.not_empty.as_ref(),
            FilterCategory::Contains => self.contains.as_ref(),
            FilterCategory::NotContains => self.not_contains.as_ref(),
            FilterCategory::ContainsAny => self.contains_any.as_ref(),
        }
    }

    fn entries_mut(&mut self, category: FilterCategory) -> &mut Entries {
        let slot = match category {
            FilterCategory::OneOf => &mut self.one_of,
            FilterCategory::String => &mut self.string,
            FilterCategory::Fuzzy => &mut self.fuzzy,
            FilterCategory::Range => &mut self.range,
            FilterCategory::Equal => &mut self.equal,
            FilterCategory::NotEqual => &mut self.not_equal,
            FilterCategory::Empty => &mut self.empty,
            FilterCategory::NotEmpty => &mut self.not_empty,
            FilterCategory::Contains => &mut self.contains,
            FilterCategory::NotContains => &mut self.not_contains,
            FilterCategory::ContainsAny => &mut self.contains_any,
        };
        slot.get_or_insert_with(Map::new)
    }
}

fn as_list(value: &JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// `{}` is what clients send for an unset range bound.
fn range_bound(value: Option<&JsonValue>) -> Option<JsonValue> {
    match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Object(map)) if map.is_empty() => None,
        Some(other) => Some(other.clone()),
    }
}

fn text_payload(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(_) => Some(value.clone()),
        other => Some(JsonValue::String(other.to_string())),
    }
}

fn to_filter(category: FilterCategory, key: &str, value: &JsonValue) -> Option<Filter> {
    let key = key.to_string();
    let filter = match category {
        FilterCategory::OneOf => Filter::OneOf { key, values: as_list(value) },
        FilterCategory::String => Filter::String { key, value: text_payload(value)? },
        FilterCategory::Fuzzy => Filter::Fuzzy { key, value: text_payload(value)? },
        FilterCategory::Range => {
            let bounds = value.as_object()?;
            Filter::Range {
                key,
                low: range_bound(bounds.get("low")),
                high: range_bound(bounds.get("high")),
            }
        }
        FilterCategory::Equal => Filter::Equal { key, value: value.clone() },
        FilterCategory::NotEqual => Filter::NotEqual { key, value: value.clone() },
        FilterCategory::Empty => Filter::Empty { key },
        FilterCategory::NotEmpty => Filter::NotEmpty { key },
        FilterCategory::Contains if !value.is_null() => Filter::Contains { key, values: as_list(value) },
        FilterCategory::NotContains if !value.is_null() => {
            Filter::NotContains { key, values: as_list(value) }
        }
        FilterCategory::ContainsAny if !value.is_null() => {
            Filter::ContainsAny { key, values: as_list(value) }
        }
        FilterCategory::Contains | FilterCategory::NotContains | FilterCategory::ContainsAny => {
            return None;
        }
    };
    Some(filter)
}

impl From<RawSearchFilters> for SearchFilters {
    fn from(raw: RawSearchFilters) -> Self {
        let mut filters = Vec::new();
        for category in FilterCategory::ALL {
            if let Some(entries) = raw.entries(category) {
                filters.extend(
                    entries
                        .iter()
                        .filter_map(|(key, value)| to_filter(category, key, value)),
                );
            }
        }
        SearchFilters { all_or: raw.all_or, filters }
    }
}

impl From<&SearchFilters> for RawSearchFilters {
    fn from(filters: &SearchFilters) -> Self {
        let mut raw = RawSearchFilters {
            all_or: filters.all_or,
            ..Default::default()
        };
        for filter in &filters.filters {
            let value = match filter {
                Filter::OneOf { values, .. }
                | Filter::Contains { values, .. }
                | Filter::NotContains { values, .. }
                | Filter::ContainsAny { values, .. } => JsonValue::Array(values.clone()),
                Filter::String { value, .. }
                | Filter::Fuzzy { value, .. }
                | Filter::Equal { value, .. }
                | Filter::NotEqual { value, .. } => value.clone(),
                Filter::Range { low, high, .. } => {
                    let mut bounds = Map::new();
                    if let Some(low) = low {
                        bounds.insert("low".to_string(), low.clone());
                    }
                    if let Some(high) = high {
                        bounds.insert("high".to_string(), high.clone());
                    }
                    JsonValue::Object(bounds)
                }
                Filter::Empty { .. } | Filter::NotEmpty { .. } => JsonValue::Bool(true),
            };
            raw.entries_mut(filter.category())
                .insert(filter.key().to_string(), value);
        }
        raw
    }
}

impl<'de> Deserialize<'de> for SearchFilters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawSearchFilters::deserialize(deserializer).map(SearchFilters::from)
    }
}

impl Serialize for SearchFilters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawSearchFilters::from(self).serialize(serializer)
    }
}
