//! Executing compiled queries, emulating RETURNING where the dialect lacks it.
//!
//! On dialects without RETURNING the write runs bare and the affected row
//! is read back with a one-row lookup keyed on the row's identity. A delete
//! looks the row up before it runs, since the row is gone afterwards.

use crate::ast::{Operation, PaginationJson, QueryJson, Row, SearchFilters, Value};
use crate::engine::{Executor, QueryResponse};
use crate::error::{WeaveError, WeaveResult};
use crate::results::{JsonDecodeError, materialize_json_columns};
use crate::transpiler::dialect::GeneratedId;
use crate::transpiler::{CompileOptions, Dialect, QueryCompiler, SqlStatement};

/// What an executed query hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Read results, JSON columns materialized.
    Rows {
        rows: Vec<Row>,
        decode_errors: Vec<JsonDecodeError>,
    },
    /// The written (or deleted) row. Empty when its identity could not be
    /// resolved.
    Row(Row),
    /// Bulk writes return nothing.
    Empty,
}

impl QueryOutput {
    /// All rows of the output, regardless of shape.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows { rows, .. } => rows,
            QueryOutput::Row(row) if row.is_empty() => Vec::new(),
            QueryOutput::Row(row) => vec![row],
            QueryOutput::Empty => Vec::new(),
        }
    }
}

/// The log line written per statement when logging is enabled.
pub fn log_line(dialect: Dialect, statement: &SqlStatement) -> String {
    let values: Vec<String> = statement.bindings.iter().map(ToString::to_string).collect();
    format!(
        "[SQL] [{}] query=\"{}\" values=\"{}\"",
        dialect.to_string().to_uppercase(),
        statement.sql,
        values.join(", ")
    )
}

impl QueryCompiler {
    /// Compile and execute a query.
    pub async fn execute<E: Executor>(&self, json: &QueryJson, executor: &E) -> WeaveResult<QueryOutput> {
        self.execute_with(json, executor, |rows| rows).await
    }

    /// Compile and execute a query, passing every raw result set through
    /// `process` before it is interpreted.
    pub async fn execute_with<E, F>(&self, json: &QueryJson, executor: &E, process: F) -> WeaveResult<QueryOutput>
    where
        E: Executor,
        F: Fn(Vec<Row>) -> Vec<Row> + Send + Sync,
    {
        match json.operation() {
            Operation::Read => {
                let statement = self.compile(json)?;
                let rows = process(self.run(executor, &statement).await?.rows);
                Ok(match json.table() {
                    Some(table) => {
                        let materialized = materialize_json_columns(table, rows);
                        QueryOutput::Rows {
                            rows: materialized.rows,
                            decode_errors: materialized.errors,
                        }
                    }
                    None => QueryOutput::Rows {
                        rows,
                        decode_errors: Vec::new(),
                    },
                })
            }
            Operation::BulkCreate => {
                let statement = self.compile(json)?;
                self.run(executor, &statement).await?;
                Ok(QueryOutput::Empty)
            }
            Operation::Create | Operation::Update | Operation::Delete if self.dialect().supports_returning() => {
                let statement = self.compile(json)?;
                let rows = process(self.run(executor, &statement).await?.rows);
                Ok(QueryOutput::Row(rows.into_iter().next().unwrap_or_default()))
            }
            Operation::Create | Operation::Update | Operation::Delete => {
                self.execute_emulated(json, executor, &process).await
            }
            other @ (Operation::CreateTable | Operation::UpdateTable | Operation::DeleteTable) => {
                Err(WeaveError::UnsupportedOperation(other.to_string()))
            }
        }
    }

    async fn execute_emulated<E, F>(&self, json: &QueryJson, executor: &E, process: &F) -> WeaveResult<QueryOutput>
    where
        E: Executor,
        F: Fn(Vec<Row>) -> Vec<Row> + Send + Sync,
    {
        let statement = self.compile_with(json, CompileOptions::default().disable_returning(true))?;

        if json.operation() == Operation::Delete {
            let row = self.returning_row(json, json.id_filter(), executor, process).await?;
            self.run(executor, &statement).await?;
            return Ok(QueryOutput::Row(row));
        }

        let response = self.run(executor, &statement).await?;
        let identity = self.identity_filter(json, &response);
        let row = self.returning_row(json, identity.as_ref(), executor, process).await?;
        Ok(QueryOutput::Row(row))
    }

    /// The filter that finds the row just written: the generated id, else
    /// the primary key from the body (create only), else `extra.idFilter`.
    fn identity_filter(&self, json: &QueryJson, response: &QueryResponse) -> Option<SearchFilters> {
        let primary = json.table().and_then(|t| t.first_primary());
        if json.operation() == Operation::Create {
            if let Some(primary) = primary {
                let generated = match self.dialect().generated_id() {
                    GeneratedId::LastInsertId => response.last_insert_id.as_ref().map(Value::to_json),
                    GeneratedId::IdentityColumn => response
                        .rows
                        .first()
                        .and_then(|row| row.get("id"))
                        .filter(|id| !id.is_null())
                        .cloned(),
                    GeneratedId::None => None,
                };
                let from_body = || match &json.body {
                    Some(crate::ast::Body::Row(row)) => row.get(primary).filter(|v| !v.is_null()).cloned(),
                    _ => None,
                };
                if let Some(id) = generated.or_else(from_body) {
                    return Some(SearchFilters::new().equal(primary, id));
                }
            }
        }
        json.id_filter().cloned()
    }

    /// Read one row through `filter`, or an empty row without one.
    async fn returning_row<E, F>(
        &self,
        json: &QueryJson,
        filter: Option<&SearchFilters>,
        executor: &E,
        process: &F,
    ) -> WeaveResult<Row>
    where
        E: Executor,
        F: Fn(Vec<Row>) -> Vec<Row> + Send + Sync,
    {
        let Some(filter) = filter else {
            tracing::debug!(table = %json.table_name(), operation = %json.operation(), "no identity for returning row");
            return Ok(Row::new());
        };
        let statement = self.compile(&lookup_query(json, filter.clone()))?;
        let rows = process(self.run(executor, &statement).await?.rows);
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn run<E: Executor>(&self, executor: &E, statement: &SqlStatement) -> WeaveResult<QueryResponse> {
        if self.config().logging {
            tracing::info!("{}", log_line(self.dialect(), statement));
        }
        executor.execute(statement).await
    }
}

/// A single-row read of the query's table through `filter`.
fn lookup_query(json: &QueryJson, filter: SearchFilters) -> QueryJson {
    let mut lookup = QueryJson::read(json.table_name()).filters(filter);
    lookup.endpoint.datasource_id = json.endpoint.datasource_id.clone();
    lookup.endpoint.schema = json.endpoint.schema.clone();
    lookup.paginate = Some(PaginationJson {
        page: None,
        limit: Some(1),
    });
    lookup.meta = json.meta.clone();
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::ToSql;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_line_format() {
        let statement = QueryJson::read("persons")
            .filters(SearchFilters::new().equal("id", 5))
            .to_sql_with_dialect(Dialect::MySQL)
            .unwrap();
        assert_eq!(
            log_line(Dialect::MySQL, &statement),
            "[SQL] [MYSQL] query=\"SELECT * FROM (SELECT * FROM `persons` WHERE `persons`.`id` = ? LIMIT 5000) AS `persons`\" values=\"5\""
        );
    }

    #[test]
    fn test_lookup_is_single_row_read() {
        let json = QueryJson::update("persons").in_schema("crm");
        let lookup = lookup_query(&json, SearchFilters::new().equal("id", 1));
        assert_eq!(lookup.operation(), Operation::Read);
        assert_eq!(lookup.paginate.and_then(|p| p.limit), Some(1));
        assert_eq!(lookup.endpoint.schema.as_deref(), Some("crm"));
    }
}
