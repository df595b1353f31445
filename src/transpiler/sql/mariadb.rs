use crate::transpiler::traits::SqlGenerator;

use super::mysql::MysqlGenerator;

/// MariaDB speaks the MySQL wire dialect.
pub struct MariaDbGenerator;

impl SqlGenerator for MariaDbGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        MysqlGenerator.quote_identifier(name)
    }

    fn placeholder(&self, index: usize) -> String {
        MysqlGenerator.placeholder(index)
    }

    fn empty_insert(&self) -> &'static str {
        MysqlGenerator.empty_insert()
    }
}
