use crate::transpiler::traits::SqlGenerator;

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn like_insensitive(&self, column: &str, pattern: &str) -> String {
        format!("{} ILIKE {}", column, pattern)
    }
}
