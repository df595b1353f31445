use crate::transpiler::traits::SqlGenerator;

pub struct OracleGenerator;

impl SqlGenerator for OracleGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        // 1-based positional binds
        format!(":{}", index)
    }

    fn table_alias(&self, target: &str, alias: &str) -> String {
        // Oracle rejects AS before a table alias.
        format!("{} {}", target, alias)
    }

    fn limit_offset(&self, limit: Option<usize>, offset: Option<usize>, _ordered: bool) -> String {
        // 12c+ row limiting clause
        let mut sql = String::new();
        if let Some(off) = offset {
            sql.push_str(&format!(" OFFSET {} ROWS", off));
        }
        if let Some(lim) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", lim));
        }
        sql
    }

    fn missing_cell(&self) -> &'static str {
        "NULL"
    }

    fn insert_rows(&self, target: &str, columns: &str, rows: &[String]) -> String {
        if rows.len() <= 1 {
            return format!("INSERT INTO {} ({}) VALUES {}", target, columns, rows.join(", "));
        }
        let mut sql = String::from("INSERT ALL");
        for row in rows {
            sql.push_str(&format!(" INTO {} ({}) VALUES {}", target, columns, row));
        }
        sql.push_str(" SELECT 1 FROM DUAL");
        sql
    }
}
