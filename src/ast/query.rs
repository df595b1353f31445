//! The query description consumed by the compiler.

use super::{Operation, RelationshipsJson, SearchFilters, SortDirection, Table};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A result or payload row: flat column -> value mapping.
pub type Row = Map<String, JsonValue>;

/// Identifies the target relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(default)]
    pub datasource_id: String,
    /// Table name.
    pub entity_id: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    /// Selectors in `table.column` form.
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub direction: SortDirection,
}

/// Ordered `field -> direction` mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortJson(pub Vec<(String, SortSpec)>);

impl SortJson {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.0.iter().map(|(field, spec)| (field.as_str(), spec.direction))
    }
}

impl<'de> Deserialize<'de> for SortJson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Map::<String, JsonValue>::deserialize(deserializer)?;
        entries
            .into_iter()
            .map(|(field, spec)| {
                serde_json::from_value::<SortSpec>(spec)
                    .map(|spec| (field, spec))
                    .map_err(D::Error::custom)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SortJson)
    }
}

impl Serialize for SortJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, spec) in &self.0 {
            map.serialize_entry(field, spec)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaginationJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl PaginationJson {
    /// The requested page size; zero counts as unset.
    pub fn row_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExtra {
    /// Equality filter identifying the written row, used to echo it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_filter: Option<SearchFilters>,
}

/// Write payload: one row for create/update, a list for bulk create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Row(Row),
    Rows(Vec<Row>),
}

/// The structured, dialect-neutral description of one data operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJson {
    pub endpoint: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginate: Option<PaginationJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipsJson>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub table_aliases: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<QueryMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<QueryExtra>,
}

impl QueryJson {
    pub fn new(table: impl Into<String>, operation: Operation) -> Self {
        Self {
            endpoint: Endpoint {
                datasource_id: String::new(),
                entity_id: table.into(),
                operation,
                schema: None,
            },
            resource: None,
            filters: None,
            sort: None,
            paginate: None,
            relationships: Vec::new(),
            table_aliases: BTreeMap::new(),
            meta: None,
            body: None,
            extra: None,
        }
    }

    pub fn read(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Read)
    }

    pub fn create(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Create)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Update)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(table, Operation::Delete)
    }

    pub fn bulk_create(table: impl Into<String>) -> Self {
        Self::new(table, Operation::BulkCreate)
    }

    pub fn operation(&self) -> Operation {
        self.endpoint.operation
    }

    pub fn table_name(&self) -> &str {
        &self.endpoint.entity_id
    }

    pub fn table(&self) -> Option<&Table> {
        self.meta.as_ref().and_then(|m| m.table.as_ref())
    }

    /// The name a table is referred to by in this query.
    pub fn alias_of<'a>(&'a self, table: &'a str) -> &'a str {
        self.table_aliases.get(table).map(String::as_str).unwrap_or(table)
    }

    pub fn id_filter(&self) -> Option<&SearchFilters> {
        self.extra.as_ref().and_then(|e| e.id_filter.as_ref())
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.endpoint.schema = Some(schema.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resource = Some(Resource {
            fields: fields.into_iter().map(|f| f.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort
            .get_or_insert_with(SortJson::default)
            .0
            .push((field.into(), SortSpec { direction }));
        self
    }

    pub fn paginate(mut self, page: Option<usize>, limit: Option<usize>) -> Self {
        self.paginate = Some(PaginationJson { page, limit });
        self
    }

    pub fn relationship(mut self, relationship: RelationshipsJson) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn alias(mut self, table: impl Into<String>, alias: impl Into<String>) -> Self {
        self.table_aliases.insert(table.into(), alias.into());
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.meta = Some(QueryMeta { table: Some(table) });
        self
    }

    pub fn body(mut self, row: Row) -> Self {
        self.body = Some(Body::Row(row));
        self
    }

    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.body = Some(Body::Rows(rows));
        self
    }

    pub fn with_id_filter(mut self, filter: SearchFilters) -> Self {
        self.extra = Some(QueryExtra {
            id_filter: Some(filter),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_wire_form() {
        let query: QueryJson = serde_json::from_value(json!({
            "endpoint": { "datasourceId": "ds", "entityId": "persons", "operation": "READ" },
            "resource": { "fields": ["persons.name"] },
            "sort": { "name": { "direction": "descending" }, "age": {} },
            "paginate": { "page": 2, "limit": 10 },
            "tableAliases": { "persons": "a" },
            "relationships": [{ "tableName": "tasks", "from": "id", "to": "person_id" }]
        }))
        .unwrap();
        assert_eq!(query.operation(), Operation::Read);
        assert_eq!(query.alias_of("persons"), "a");
        assert_eq!(query.alias_of("tasks"), "tasks");
        let sort: Vec<_> = query.sort.as_ref().unwrap().iter().collect();
        assert_eq!(
            sort,
            vec![("name", SortDirection::Descending), ("age", SortDirection::Ascending)]
        );
    }

    #[test]
    fn test_body_shapes() {
        let one: Body = serde_json::from_value(json!({ "name": "a" })).unwrap();
        assert!(matches!(one, Body::Row(_)));
        let many: Body = serde_json::from_value(json!([{ "name": "a" }, { "name": "b" }])).unwrap();
        assert!(matches!(many, Body::Rows(rows) if rows.len() == 2));
    }
}
