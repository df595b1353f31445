//! SQL Transpiler for query descriptions.
//!
//! Converts a [`QueryJson`] into one parameterized SQL statement for a
//! given [`Dialect`].

pub mod conditions;
pub mod dialect;
pub mod dml;
pub mod joins;
pub mod keys;
pub mod sorting;
pub mod sql;
pub mod statement;
pub mod traits;

#[cfg(test)]
mod tests;

use crate::ast::{Operation, QueryJson, Value};
use crate::config::CompilerConfig;
use crate::error::{WeaveError, WeaveResult};
use serde::Serialize;

pub use conditions::ParamContext;
pub use dialect::Dialect;
pub use keys::canonical_key;
pub use traits::{SqlGenerator, quote};

/// A rendered statement ready for a driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    pub sql: String,
    /// Bound values, in placeholder order.
    pub bindings: Vec<Value>,
    pub operation: Operation,
    /// Whether executing the statement yields rows.
    pub returns_rows: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Never emit RETURNING, even where the dialect has it.
    pub disable_returning: bool,
}

impl CompileOptions {
    pub fn disable_returning(mut self, disable: bool) -> Self {
        self.disable_returning = disable;
        self
    }
}

/// Compiles query descriptions for one dialect.
///
/// Stateless apart from its configuration, so it can be cloned freely and
/// shared across tasks.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    dialect: Dialect,
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(dialect: Dialect, config: CompilerConfig) -> Self {
        Self { dialect, config }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn compile(&self, json: &QueryJson) -> WeaveResult<SqlStatement> {
        self.compile_with(json, CompileOptions::default())
    }

    pub fn compile_with(&self, json: &QueryJson, options: CompileOptions) -> WeaveResult<SqlStatement> {
        let dialect = self.dialect;
        let generator = dialect.generator();
        let generator = generator.as_ref();
        let mut ctx = ParamContext::new();
        let returning = dialect.supports_returning() && !options.disable_returning;
        let operation = json.operation();

        let (sql, returns_rows) = match operation {
            Operation::Read => {
                let query = dml::select::build_select(json, dialect, self.config.max_rows)?;
                (query.render(generator, &mut ctx), true)
            }
            Operation::Create => {
                let query = dml::insert::build_insert(json, dialect, returning)?;
                let returns_rows = query.returning.is_some()
                    || (query.select_identity && generator.identity_select().is_some());
                (query.render(generator, &mut ctx), returns_rows)
            }
            Operation::BulkCreate => {
                let query = dml::insert::build_bulk_insert(json)?;
                (query.render(generator, &mut ctx), false)
            }
            Operation::Update => {
                let query = dml::update::build_update(json, dialect, returning)?;
                (query.render(generator, &mut ctx), query.returning.is_some())
            }
            Operation::Delete => {
                let query = dml::delete::build_delete(json, dialect, returning);
                (query.render(generator, &mut ctx), query.returning.is_some())
            }
            Operation::CreateTable | Operation::UpdateTable | Operation::DeleteTable => {
                return Err(WeaveError::UnsupportedOperation(operation.to_string()));
            }
        };

        Ok(SqlStatement {
            sql,
            bindings: ctx.params,
            operation,
            returns_rows,
        })
    }
}

/// Trait for compiling a query description with default configuration.
pub trait ToSql {
    /// Compile for Postgres.
    fn to_sql(&self) -> WeaveResult<SqlStatement> {
        self.to_sql_with_dialect(Dialect::default())
    }
    fn to_sql_with_dialect(&self, dialect: Dialect) -> WeaveResult<SqlStatement>;
}

impl ToSql for QueryJson {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> WeaveResult<SqlStatement> {
        QueryCompiler::new(dialect, CompilerConfig::default()).compile(self)
    }
}
