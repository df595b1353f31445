//! SQL dialect tests (MySQL, MariaDB, SQL Server, Oracle).

use super::{compile, row};
use crate::ast::*;
use crate::error::WeaveError;
use crate::transpiler::{Dialect, ToSql};
use pretty_assertions::assert_eq;
use serde_json::json;

fn persons() -> Table {
    Table::new("persons").primary_key("id")
}

#[test]
fn test_placeholders_per_dialect() {
    let query = QueryJson::read("persons").filters(SearchFilters::new().equal("a", 1).equal("b", 2));
    let expected = [
        (Dialect::Postgres, "\"persons\".\"a\" = $1 AND \"persons\".\"b\" = $2"),
        (Dialect::MySQL, "`persons`.`a` = ? AND `persons`.`b` = ?"),
        (Dialect::MariaDB, "`persons`.`a` = ? AND `persons`.`b` = ?"),
        (Dialect::SqlServer, "[persons].[a] = @p1 AND [persons].[b] = @p2"),
        (Dialect::Oracle, "\"persons\".\"a\" = :1 AND \"persons\".\"b\" = :2"),
    ];
    for (dialect, clause) in expected {
        let stmt = compile(&query, dialect);
        assert!(stmt.sql.contains(clause), "{}: {}", dialect, stmt.sql);
        assert_eq!(stmt.bindings, vec![Value::Int(1), Value::Int(2)]);
    }
}

#[test]
fn test_mysql_pagination() {
    let query = QueryJson::read("persons").paginate(Some(3), Some(4));
    assert_eq!(
        compile(&query, Dialect::MySQL).sql,
        "SELECT * FROM (SELECT * FROM `persons` LIMIT 4 OFFSET 8) AS `persons`"
    );
}

#[test]
fn test_oracle_pagination() {
    let query = QueryJson::read("persons").paginate(Some(2), Some(4));
    assert_eq!(
        compile(&query, Dialect::Oracle).sql,
        "SELECT * FROM (SELECT * FROM \"persons\" OFFSET 4 ROWS FETCH NEXT 4 ROWS ONLY) \"persons\""
    );
}

#[test]
fn test_zero_limit_falls_back_to_max_rows() {
    let query = QueryJson::read("persons").with_table(persons()).paginate(None, Some(0));
    assert_eq!(
        compile(&query, Dialect::Postgres).sql,
        "SELECT * FROM (SELECT * FROM \"persons\" LIMIT 5000) AS \"persons\""
    );
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT TOP (5000) * FROM [persons]) AS [persons]"
    );
}

#[test]
fn test_page_beyond_addressable_rows_is_rejected() {
    let query = QueryJson::read("persons").paginate(Some(usize::MAX / 2), Some(10));
    for dialect in [Dialect::Postgres, Dialect::SqlServer, Dialect::Oracle] {
        assert!(
            matches!(query.to_sql_with_dialect(dialect), Err(WeaveError::InvalidQuery(_))),
            "{dialect}"
        );
    }
}

#[test]
fn test_sqlserver_first_page_uses_top() {
    let query = QueryJson::read("persons").with_table(persons()).paginate(Some(1), Some(10));
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT TOP (10) * FROM [persons] ORDER BY [persons].[id] ASC) AS [persons]"
    );
}

#[test]
fn test_sqlserver_orders_by_primary_key_to_page() {
    let query = QueryJson::read("persons").with_table(persons()).paginate(Some(2), Some(10));
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT * FROM [persons] ORDER BY [persons].[id] ASC OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY) AS [persons]"
    );
}

#[test]
fn test_sqlserver_keeps_requested_sort() {
    let query = QueryJson::read("persons")
        .with_table(persons())
        .sort_by("name", SortDirection::Descending)
        .paginate(Some(2), Some(10));
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT * FROM [persons] ORDER BY [persons].[name] DESC OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY) AS [persons]"
    );
}

#[test]
fn test_sqlserver_without_primary_key_orders_by_nothing() {
    let query = QueryJson::read("persons").paginate(Some(2), Some(10));
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT * FROM [persons] ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY) AS [persons]"
    );
}

#[test]
fn test_default_limit_without_page() {
    let query = QueryJson::read("persons").with_table(persons());
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT TOP (5000) * FROM [persons]) AS [persons]"
    );
}

#[test]
fn test_mysql_create_has_no_returning() {
    let query = QueryJson::create("persons").body(row(json!({ "name": "Ann" })));
    let stmt = compile(&query, Dialect::MySQL);
    assert_eq!(stmt.sql, "INSERT INTO `persons` (`name`) VALUES (?)");
    assert!(!stmt.returns_rows);
}

#[test]
fn test_mysql_empty_create() {
    let stmt = compile(&QueryJson::create("persons").body(Row::new()), Dialect::MariaDB);
    assert_eq!(stmt.sql, "INSERT INTO `persons` () VALUES ()");
}

#[test]
fn test_oracle_create_needs_a_value() {
    let empty = QueryJson::create("persons").body(Row::new());
    assert!(matches!(empty.to_sql_with_dialect(Dialect::Oracle), Err(WeaveError::InvalidQuery(_))));

    let all_null = QueryJson::create("persons").body(row(json!({ "name": null, "age": null })));
    assert!(matches!(all_null.to_sql_with_dialect(Dialect::Oracle), Err(WeaveError::InvalidQuery(_))));

    let stmt = compile(&QueryJson::create("persons").body(row(json!({ "name": "Ann" }))), Dialect::Oracle);
    assert_eq!(stmt.sql, "INSERT INTO \"persons\" (\"name\") VALUES (:1)");
}

#[test]
fn test_sqlserver_create_selects_identity() {
    let query = QueryJson::create("persons").body(row(json!({ "name": "Ann" })));
    let stmt = compile(&query, Dialect::SqlServer);
    assert_eq!(
        stmt.sql,
        "INSERT INTO [persons] ([name]) VALUES (@p1); SELECT SCOPE_IDENTITY() AS id"
    );
    assert!(stmt.returns_rows);
}

#[test]
fn test_oracle_bulk_create() {
    let query = QueryJson::bulk_create("persons").rows(vec![
        row(json!({ "a": 1 })),
        row(json!({ "b": 2 })),
    ]);
    assert_eq!(
        compile(&query, Dialect::Oracle).sql,
        "INSERT ALL INTO \"persons\" (\"a\", \"b\") VALUES (:1, NULL) INTO \"persons\" (\"a\", \"b\") VALUES (NULL, :2) SELECT 1 FROM DUAL"
    );
}

#[test]
fn test_update_and_delete_without_returning() {
    let update = QueryJson::update("persons")
        .body(row(json!({ "name": "Bo" })))
        .filters(SearchFilters::new().equal("id", 1));
    assert_eq!(
        compile(&update, Dialect::MySQL).sql,
        "UPDATE `persons` SET `name` = ? WHERE `persons`.`id` = ?"
    );

    let delete = QueryJson::delete("persons").filters(SearchFilters::new().equal("id", 1));
    let stmt = compile(&delete, Dialect::SqlServer);
    assert_eq!(stmt.sql, "DELETE FROM [persons] WHERE [persons].[id] = @p1");
    assert!(!stmt.returns_rows);
}

#[test]
fn test_oracle_alias_has_no_as() {
    let query = QueryJson::read("persons").alias("persons", "p");
    assert_eq!(
        compile(&query, Dialect::Oracle).sql,
        "SELECT * FROM (SELECT * FROM \"persons\" \"p\" FETCH NEXT 5000 ROWS ONLY) \"p\""
    );
}

#[test]
fn test_schema_quoting() {
    let query = QueryJson::read("persons").in_schema("crm");
    assert_eq!(
        compile(&query, Dialect::SqlServer).sql,
        "SELECT * FROM (SELECT TOP (5000) * FROM [crm].[persons]) AS [persons]"
    );
}
