use crate::error::{WeaveError, WeaveResult};
use crate::transpiler::sql::mariadb::MariaDbGenerator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::oracle::OracleGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlserver::SqlServerGenerator;
use crate::transpiler::traits::SqlGenerator;
use std::fmt;
use std::str::FromStr;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySQL,
    MariaDB,
    SqlServer,
    Oracle,
}

/// How array/JSON containment filters are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonContainment {
    /// `::jsonb @>` and `?|`.
    Jsonb,
    /// `JSON_CONTAINS` / `JSON_OVERLAPS`.
    JsonFunctions,
    /// One `LOWER(col) LIKE` per element.
    LikeEmulation,
}

/// Where the id of a freshly inserted row comes from when the dialect
/// cannot return the row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedId {
    /// Driver-reported `last_insert_id`.
    LastInsertId,
    /// The `id` column of the row produced by the identity select.
    IdentityColumn,
    None,
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySQL,
        Dialect::MariaDB,
        Dialect::SqlServer,
        Dialect::Oracle,
    ];

    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::Postgres => Box::new(PostgresGenerator),
            Dialect::MySQL => Box::new(MysqlGenerator),
            Dialect::MariaDB => Box::new(MariaDbGenerator),
            Dialect::SqlServer => Box::new(SqlServerGenerator),
            Dialect::Oracle => Box::new(OracleGenerator),
        }
    }

    /// Resolve a datasource source name (`POSTGRES`, `SQL_SERVER`, ...).
    pub fn for_source(source: &str) -> WeaveResult<Self> {
        match source {
            "POSTGRES" => Ok(Dialect::Postgres),
            "MYSQL" => Ok(Dialect::MySQL),
            "MARIADB" => Ok(Dialect::MariaDB),
            "SQL_SERVER" => Ok(Dialect::SqlServer),
            "ORACLE" => Ok(Dialect::Oracle),
            other => Err(WeaveError::UnknownDialect(format!(
                "{} (not a SQL datasource)",
                other
            ))),
        }
    }

    pub fn supports_returning(&self) -> bool {
        match self {
            Dialect::Postgres => true,
            Dialect::MySQL | Dialect::MariaDB | Dialect::SqlServer | Dialect::Oracle => false,
        }
    }

    pub fn native_ilike(&self) -> bool {
        match self {
            Dialect::Postgres => true,
            Dialect::MySQL | Dialect::MariaDB | Dialect::SqlServer | Dialect::Oracle => false,
        }
    }

    pub fn json_containment(&self) -> JsonContainment {
        match self {
            Dialect::Postgres => JsonContainment::Jsonb,
            Dialect::MySQL | Dialect::MariaDB => JsonContainment::JsonFunctions,
            Dialect::SqlServer | Dialect::Oracle => JsonContainment::LikeEmulation,
        }
    }

    /// Paginating without an explicit sort needs a deterministic order.
    pub fn requires_order_for_pagination(&self) -> bool {
        match self {
            Dialect::SqlServer => true,
            Dialect::Postgres | Dialect::MySQL | Dialect::MariaDB | Dialect::Oracle => false,
        }
    }

    /// ORDER BY may be repeated on the query wrapping a derived table.
    pub fn sorts_outer_query(&self) -> bool {
        match self {
            Dialect::SqlServer => false,
            Dialect::Postgres | Dialect::MySQL | Dialect::MariaDB | Dialect::Oracle => true,
        }
    }

    /// An INSERT may name no columns at all and take every default.
    pub fn supports_empty_insert(&self) -> bool {
        match self {
            Dialect::Oracle => false,
            Dialect::Postgres | Dialect::MySQL | Dialect::MariaDB | Dialect::SqlServer => true,
        }
    }

    pub fn casts_money(&self) -> bool {
        match self {
            Dialect::Postgres => true,
            Dialect::MySQL | Dialect::MariaDB | Dialect::SqlServer | Dialect::Oracle => false,
        }
    }

    pub fn generated_id(&self) -> GeneratedId {
        match self {
            Dialect::MySQL | Dialect::MariaDB => GeneratedId::LastInsertId,
            Dialect::SqlServer => GeneratedId::IdentityColumn,
            Dialect::Postgres | Dialect::Oracle => GeneratedId::None,
        }
    }
}

impl FromStr for Dialect {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySQL),
            "mariadb" => Ok(Dialect::MariaDB),
            "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::SqlServer),
            "oracle" | "oracledb" => Ok(Dialect::Oracle),
            _ => Err(WeaveError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "pg",
            Dialect::MySQL => "mysql",
            Dialect::MariaDB => "mariadb",
            Dialect::SqlServer => "mssql",
            Dialect::Oracle => "oracledb",
        };
        write!(f, "{}", name)
    }
}
