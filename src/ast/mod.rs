pub mod filters;
pub mod operators;
pub mod query;
pub mod relationships;
pub mod schema;
pub mod values;

pub use self::filters::{Filter, FilterCategory, SearchFilters};
pub use self::operators::{CompareOp, LogicalOp, Operation, SortDirection};
pub use self::query::{
    Body, Endpoint, PaginationJson, QueryExtra, QueryJson, QueryMeta, Resource, Row, SortJson,
    SortSpec,
};
pub use self::relationships::{JoinKey, RelationshipsJson};
pub use self::schema::{FieldSchema, FieldSubtype, FieldType, Table};
pub use self::values::Value;
