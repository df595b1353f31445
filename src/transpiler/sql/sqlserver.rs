use crate::transpiler::traits::SqlGenerator;

pub struct SqlServerGenerator;

impl SqlGenerator for SqlServerGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn limit_prefix(&self, limit: Option<usize>, offset: Option<usize>) -> String {
        match (limit, offset) {
            (Some(n), None) => format!("TOP ({}) ", n),
            _ => String::new(),
        }
    }

    fn limit_offset(&self, limit: Option<usize>, offset: Option<usize>, ordered: bool) -> String {
        // OFFSET/FETCH is only legal after an ORDER BY.
        let Some(off) = offset else {
            return String::new();
        };
        let mut sql = String::new();
        if !ordered {
            sql.push_str(" ORDER BY (SELECT NULL)");
        }
        sql.push_str(&format!(" OFFSET {} ROWS", off));
        if let Some(lim) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", lim));
        }
        sql
    }

    fn identity_select(&self) -> Option<&'static str> {
        Some("SELECT SCOPE_IDENTITY() AS id")
    }
}
