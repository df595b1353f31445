//! Table schema as supplied by the caller in `meta.table`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column types the compiler cares about. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    String,
    Longform,
    Options,
    Number,
    Boolean,
    Array,
    Datetime,
    Attachment,
    Link,
    Formula,
    Json,
    Bigint,
    BbReference,
    #[serde(other)]
    Other,
}

/// Subtypes refining a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSubtype {
    User,
    Users,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<FieldSubtype>,
    /// Native column type reported by the datasource, e.g. `money`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_type: Option<String>,
}

impl FieldSchema {
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Default::default()
        }
    }

    pub fn with_external_type(mut self, external_type: impl Into<String>) -> Self {
        self.external_type = Some(external_type.into());
        self
    }

    pub fn with_subtype(mut self, subtype: FieldSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Columns stored as JSON text: plain JSON and multi-user references.
    pub fn is_json(&self) -> bool {
        match self.field_type {
            FieldType::Json => true,
            FieldType::BbReference => self.subtype == Some(FieldSubtype::Users),
            _ => false,
        }
    }

    pub fn is_money(&self) -> bool {
        self.external_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("money"))
    }
}

/// The owning table of a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub schema: BTreeMap<String, FieldSchema>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary.push(column.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.schema.insert(name.into(), field);
        self
    }

    /// First primary key column, used for identity lookups and default ordering.
    pub fn first_primary(&self) -> Option<&str> {
        self.primary.first().map(String::as_str)
    }
}
