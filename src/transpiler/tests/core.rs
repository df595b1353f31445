//! Core transpiler tests (reads, creates, updates, deletes).

use super::{compile, row};
use crate::ast::*;
use crate::config::CompilerConfig;
use crate::error::WeaveError;
use crate::transpiler::{CompileOptions, Dialect, QueryCompiler, ToSql};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_simple_read() {
    let stmt = QueryJson::read("persons").to_sql().unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM (SELECT * FROM \"persons\" LIMIT 5000) AS \"persons\"");
    assert!(stmt.bindings.is_empty());
    assert!(stmt.returns_rows);
}

#[test]
fn test_read_fields_filter_sort_page() {
    let query = QueryJson::read("persons")
        .fields(["persons.name", "persons.age"])
        .filters(SearchFilters::new().equal("age", 30))
        .sort_by("name", SortDirection::Ascending)
        .paginate(Some(2), Some(10));
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "SELECT \"persons\".\"name\" AS \"persons.name\", \"persons\".\"age\" AS \"persons.age\" \
         FROM (SELECT * FROM \"persons\" WHERE \"persons\".\"age\" = $1 ORDER BY \"persons\".\"name\" ASC LIMIT 10 OFFSET 10) AS \"persons\" \
         ORDER BY \"persons\".\"name\" ASC"
    );
    assert_eq!(stmt.bindings, vec![Value::Int(30)]);
}

#[test]
fn test_read_in_schema() {
    let stmt = compile(&QueryJson::read("persons").in_schema("crm"), Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "SELECT * FROM (SELECT * FROM \"crm\".\"persons\" LIMIT 5000) AS \"persons\""
    );
}

#[test]
fn test_read_under_alias() {
    let query = QueryJson::read("persons")
        .alias("persons", "a")
        .filters(SearchFilters::new().equal("name", "Ann"));
    assert_eq!(
        compile(&query, Dialect::Postgres).sql,
        "SELECT * FROM (SELECT * FROM \"persons\" AS \"a\" WHERE \"a\".\"name\" = $1 LIMIT 5000) AS \"a\""
    );
}

#[test]
fn test_max_rows_from_config() {
    let compiler = QueryCompiler::new(Dialect::Postgres, CompilerConfig::default().max_rows(50));
    let stmt = compiler.compile(&QueryJson::read("persons")).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM (SELECT * FROM \"persons\" LIMIT 50) AS \"persons\"");
}

#[test]
fn test_money_cast_on_postgres_only() {
    let table = Table::new("persons")
        .primary_key("id")
        .field("salary", FieldSchema::of(FieldType::Number).with_external_type("money"));
    let query = QueryJson::read("persons")
        .with_table(table)
        .fields(["persons.salary", "persons.id"]);

    assert_eq!(
        compile(&query, Dialect::Postgres).sql,
        "SELECT \"persons\".\"salary\"::money::numeric AS \"persons.salary\", \"persons\".\"id\" AS \"persons.id\" \
         FROM (SELECT * FROM \"persons\" LIMIT 5000) AS \"persons\""
    );
    assert_eq!(
        compile(&query, Dialect::MySQL).sql,
        "SELECT `persons`.`salary` AS `persons.salary`, `persons`.`id` AS `persons.id` \
         FROM (SELECT * FROM `persons` LIMIT 5000) AS `persons`"
    );
}

#[test]
fn test_create_returning() {
    let query = QueryJson::create("persons").body(row(json!({ "name": "Ann", "age": null })));
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(stmt.sql, "INSERT INTO \"persons\" (\"name\") VALUES ($1) RETURNING *");
    assert_eq!(stmt.bindings, vec![Value::from("Ann")]);
    assert_eq!(stmt.operation, Operation::Create);
    assert!(stmt.returns_rows);
}

#[test]
fn test_create_without_returning() {
    let query = QueryJson::create("persons").body(row(json!({ "name": "Ann" })));
    let compiler = QueryCompiler::new(Dialect::Postgres, CompilerConfig::default());
    let stmt = compiler
        .compile_with(&query, CompileOptions::default().disable_returning(true))
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO \"persons\" (\"name\") VALUES ($1)");
    assert!(!stmt.returns_rows);
}

#[test]
fn test_create_with_empty_body() {
    let stmt = compile(&QueryJson::create("persons").body(Row::new()), Dialect::Postgres);
    assert_eq!(stmt.sql, "INSERT INTO \"persons\" DEFAULT VALUES RETURNING *");
}

#[test]
fn test_create_rejects_row_list() {
    let query = QueryJson::create("persons").rows(vec![row(json!({ "a": 1 }))]);
    assert!(matches!(query.to_sql(), Err(WeaveError::InvalidQuery(_))));
}

#[test]
fn test_create_binds_dates() {
    let query = QueryJson::create("persons").body(row(json!({ "born": "1990-01-02T03:04:05.000Z" })));
    let stmt = compile(&query, Dialect::Postgres);
    assert!(matches!(stmt.bindings[0], Value::DateTime(_)));
}

#[test]
fn test_bulk_create_unions_columns() {
    let query = QueryJson::bulk_create("persons").rows(vec![
        row(json!({ "a": 1 })),
        row(json!({ "a": 2, "b": 3 })),
    ]);
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "INSERT INTO \"persons\" (\"a\", \"b\") VALUES ($1, DEFAULT), ($2, $3)"
    );
    assert_eq!(stmt.bindings, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert!(!stmt.returns_rows);
}

#[test]
fn test_bulk_create_rejects_empty_and_single_rows() {
    let empty = QueryJson::bulk_create("persons").rows(Vec::new());
    assert!(matches!(empty.to_sql(), Err(WeaveError::InvalidQuery(_))));

    let single = QueryJson::bulk_create("persons").body(row(json!({ "a": 1 })));
    assert!(matches!(single.to_sql(), Err(WeaveError::InvalidQuery(_))));
}

#[test]
fn test_update_clears_only_null_column() {
    let query = QueryJson::update("tasks")
        .body(row(json!({ "person_id": null })))
        .filters(SearchFilters::new().equal("id", 3));
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "UPDATE \"tasks\" SET \"person_id\" = $1 WHERE \"tasks\".\"id\" = $2 RETURNING *"
    );
    assert_eq!(stmt.bindings, vec![Value::Null, Value::Int(3)]);
}

#[test]
fn test_update_ignores_alias() {
    let query = QueryJson::update("tasks")
        .alias("tasks", "t")
        .body(row(json!({ "title": "x" })))
        .filters(SearchFilters::new().equal("id", 3));
    assert_eq!(
        compile(&query, Dialect::Postgres).sql,
        "UPDATE \"tasks\" SET \"title\" = $1 WHERE \"tasks\".\"id\" = $2 RETURNING *"
    );
}

#[test]
fn test_update_without_fields_is_invalid() {
    let query = QueryJson::update("tasks").body(Row::new());
    assert!(matches!(query.to_sql(), Err(WeaveError::InvalidQuery(_))));
}

#[test]
fn test_delete_returning_projection() {
    let query = QueryJson::delete("persons")
        .fields(["persons.id"])
        .filters(SearchFilters::new().equal("id", 1));
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "DELETE FROM \"persons\" WHERE \"persons\".\"id\" = $1 RETURNING \"persons\".\"id\" AS \"persons.id\""
    );
    assert!(stmt.returns_rows);
}

#[test]
fn test_table_operations_unsupported() {
    for operation in [Operation::CreateTable, Operation::UpdateTable, Operation::DeleteTable] {
        let query = QueryJson::new("persons", operation);
        assert!(matches!(query.to_sql(), Err(WeaveError::UnsupportedOperation(_))));
    }
}

#[test]
fn test_compile_is_idempotent() {
    let query = QueryJson::read("persons")
        .filters(SearchFilters::new().fuzzy("name", "ann").one_of("id", vec![json!(1), json!(2)]))
        .relationship(RelationshipsJson::direct("tasks", "id", "person_id"))
        .paginate(Some(3), Some(20));
    let compiler = QueryCompiler::new(Dialect::SqlServer, CompilerConfig::default());
    assert_eq!(compiler.compile(&query).unwrap(), compiler.compile(&query).unwrap());
}

#[test]
fn test_compile_from_wire_json() {
    let query: QueryJson = serde_json::from_value(json!({
        "endpoint": { "datasourceId": "ds", "entityId": "persons", "operation": "READ" },
        "filters": { "equal": { "1:name": "Ann" }, "range": { "age": { "low": 18, "high": 65 } } },
        "paginate": { "page": 1, "limit": 10 }
    }))
    .unwrap();
    let stmt = compile(&query, Dialect::Postgres);
    assert_eq!(
        stmt.sql,
        "SELECT * FROM (SELECT * FROM \"persons\" WHERE \"persons\".\"age\" BETWEEN $1 AND $2 AND \"persons\".\"name\" = $3 LIMIT 10) AS \"persons\""
    );
    assert_eq!(stmt.bindings, vec![Value::Int(18), Value::Int(65), Value::from("Ann")]);
}
