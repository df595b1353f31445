//! Transpiler traits and utilities.

use super::dialect::Dialect;

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator: Send + Sync {
    /// Quote a single identifier segment, escaping the closing quote.
    fn quote_identifier(&self, name: &str) -> String;
    /// Generate the parameter placeholder (e.g., $1, ?, @p1) for a given index.
    fn placeholder(&self, index: usize) -> String;

    /// Case-insensitive pattern match. The caller lower-cases the pattern
    /// for dialects without `ILIKE`.
    fn like_insensitive(&self, column: &str, pattern: &str) -> String {
        format!("LOWER({}) LIKE {}", column, pattern)
    }

    fn table_alias(&self, target: &str, alias: &str) -> String {
        format!("{} AS {}", target, alias)
    }

    /// Row limit placed right after `SELECT` (T-SQL `TOP`).
    fn limit_prefix(&self, _limit: Option<usize>, _offset: Option<usize>) -> String {
        String::new()
    }

    /// Trailing limit/offset clause. `ordered` tells whether the query
    /// already carries an ORDER BY.
    fn limit_offset(&self, limit: Option<usize>, offset: Option<usize>, _ordered: bool) -> String {
        let mut sql = String::new();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(n) = offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        sql
    }

    /// Suffix of an INSERT that has no columns at all.
    fn empty_insert(&self) -> &'static str {
        " DEFAULT VALUES"
    }

    /// Cell used for a column a multi-row insert has no value for.
    fn missing_cell(&self) -> &'static str {
        "DEFAULT"
    }

    /// Join the row tuples of a multi-row insert.
    fn insert_rows(&self, target: &str, columns: &str, rows: &[String]) -> String {
        format!("INSERT INTO {} ({}) VALUES {}", target, columns, rows.join(", "))
    }

    /// Statement appended to an INSERT to surface the generated id.
    fn identity_select(&self) -> Option<&'static str> {
        None
    }
}

/// Quote a dotted path segment by segment: `a.b` -> `"a"."b"`.
pub fn quote_path(generator: &dyn SqlGenerator, path: &str) -> String {
    path.split('.')
        .map(|part| generator.quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote an identifier for a dialect, one dot-separated segment at a time.
pub fn quote(dialect: Dialect, identifier: &str) -> String {
    quote_path(dialect.generator().as_ref(), identifier)
}
