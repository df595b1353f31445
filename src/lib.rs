//! # sqlweave
//!
//! > **One query description, every SQL dialect.**
//!
//! sqlweave compiles a structured, dialect-neutral query description
//! ([`ast::QueryJson`]) into parameterized SQL for Postgres, MySQL,
//! MariaDB, SQL Server and Oracle, and emulates `RETURNING` on the
//! dialects that lack it.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlweave::prelude::*;
//!
//! let query = QueryJson::read("persons")
//!     .filters(SearchFilters::new().fuzzy("name", "ann"))
//!     .sort_by("name", SortDirection::Ascending)
//!     .paginate(Some(2), Some(10));
//!
//! let compiler = QueryCompiler::new(Dialect::MySQL, CompilerConfig::default());
//! let statement = compiler.compile(&query).unwrap();
//! assert!(statement.sql.contains("LOWER(`persons`.`name`) LIKE ?"));
//! assert_eq!(statement.bindings, vec![Value::from("%ann%")]);
//! ```
//!
//! ## Dialects
//!
//! | Dialect    | Quote     | Placeholder | Case-insensitive match | Returning |
//! |------------|-----------|-------------|------------------------|-----------|
//! | Postgres   | `"id"`    | `$1`        | `ILIKE`                | native    |
//! | MySQL      | `` `id` `` | `?`        | `LOWER(col) LIKE`      | emulated  |
//! | MariaDB    | `` `id` `` | `?`        | `LOWER(col) LIKE`      | emulated  |
//! | SQL Server | `[id]`    | `@p1`       | `LOWER(col) LIKE`      | emulated  |
//! | Oracle     | `"id"`    | `:1`        | `LOWER(col) LIKE`      | emulated  |

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod results;
pub mod returning;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::CompilerConfig;
    pub use crate::engine::{Executor, MySqlExecutor, PgExecutor, QueryResponse};
    pub use crate::error::*;
    pub use crate::results::{JsonDecodeError, Materialized, materialize_json_columns};
    pub use crate::returning::QueryOutput;
    pub use crate::transpiler::{CompileOptions, Dialect, QueryCompiler, SqlStatement, ToSql, quote};
}
