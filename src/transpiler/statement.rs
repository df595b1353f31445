//! Immutable statement values.
//!
//! Compiler stages build these by value and hand them on; nothing here
//! knows about `QueryJson`. Rendering walks the tree left to right so
//! parameters are numbered in the order they appear in the SQL text.

use super::conditions::ParamContext;
use super::traits::{SqlGenerator, quote_path};
use crate::ast::{CompareOp, LogicalOp, SortDirection, Value};

/// `table.column`, the table being a real name or an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn bare(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn render(&self, generator: &dyn SqlGenerator) -> String {
        match &self.table {
            Some(table) => format!(
                "{}.{}",
                quote_path(generator, table),
                quote_path(generator, &self.column)
            ),
            None => quote_path(generator, &self.column),
        }
    }
}

/// A table as it appears after FROM / JOIN / INTO.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            alias: None,
        }
    }

    pub fn in_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(str::to_string);
        self
    }

    /// Alias the table, unless the alias is the table's own name.
    pub fn alias(mut self, alias: Option<&str>) -> Self {
        self.alias = alias.filter(|a| *a != self.name).map(str::to_string);
        self
    }

    /// The name columns of this table are qualified with.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn render(&self, generator: &dyn SqlGenerator) -> String {
        let mut target = String::new();
        if let Some(schema) = &self.schema {
            target.push_str(&generator.quote_identifier(schema));
            target.push('.');
        }
        target.push_str(&generator.quote_identifier(&self.name));
        match &self.alias {
            Some(alias) => generator.table_alias(&target, &generator.quote_identifier(alias)),
            None => target,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(TableRef),
    /// A derived table.
    Subquery { query: Box<SelectQuery>, alias: String },
}

impl Source {
    fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        match self {
            Source::Table(table) => table.render(generator),
            Source::Subquery { query, alias } => {
                let inner = format!("({})", query.render(generator, ctx));
                generator.table_alias(&inner, &generator.quote_identifier(alias))
            }
        }
    }
}

/// `LEFT JOIN table ON a = b OR c = d`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: TableRef,
    pub on: Vec<(ColumnRef, ColumnRef)>,
}

impl JoinClause {
    fn render(&self, generator: &dyn SqlGenerator) -> String {
        let conditions: Vec<String> = self
            .on
            .iter()
            .map(|(left, right)| format!("{} = {}", left.render(generator), right.render(generator)))
            .collect();
        format!(
            "LEFT JOIN {} ON {}",
            self.table.render(generator),
            conditions.join(" OR ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

impl OrderTerm {
    fn render(&self, generator: &dyn SqlGenerator) -> String {
        let dir = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        format!("{} {}", self.column.render(generator), dir)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub column: ColumnRef,
    /// Output name, quoted as one identifier.
    pub alias: String,
    pub money_cast: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<SelectItem>),
}

impl Projection {
    fn render(&self, generator: &dyn SqlGenerator) -> String {
        match self {
            Projection::All => "*".to_string(),
            Projection::Columns(items) => items
                .iter()
                .map(|item| {
                    let cast = if item.money_cast { "::money::numeric" } else { "" };
                    format!(
                        "{}{} AS {}",
                        item.column.render(generator),
                        cast,
                        generator.quote_identifier(&item.alias)
                    )
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFunction {
    Contains,
    Overlaps,
}

/// A WHERE predicate. Every value is bound, never inlined.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    In { column: ColumnRef, values: Vec<Value> },
    Compare { column: ColumnRef, op: CompareOp, value: Value },
    Between { column: ColumnRef, low: Value, high: Value },
    IsNull { column: ColumnRef, negated: bool },
    /// Case-insensitive LIKE.
    Like { column: ColumnRef, pattern: Value },
    /// `col::jsonb @> doc::jsonb`
    JsonbContains { column: ColumnRef, document: Value },
    /// `col::jsonb ?| ARRAY[...]`
    JsonbHasAny { column: ColumnRef, values: Vec<Value> },
    JsonFunction {
        column: ColumnRef,
        function: JsonFunction,
        document: Value,
    },
    Group { op: LogicalOp, predicates: Vec<Predicate> },
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        match self {
            Predicate::In { values, .. } if values.is_empty() => "1 = 0".to_string(),
            Predicate::In { column, values } => {
                let col = column.render(generator);
                let params: Vec<String> = values
                    .iter()
                    .map(|v| ctx.add_param(v.clone(), generator))
                    .collect();
                format!("{} IN ({})", col, params.join(", "))
            }
            Predicate::Compare { column, op, value } => {
                let col = column.render(generator);
                format!("{} {} {}", col, op.as_sql(), ctx.add_param(value.clone(), generator))
            }
            Predicate::Between { column, low, high } => {
                let col = column.render(generator);
                let low = ctx.add_param(low.clone(), generator);
                let high = ctx.add_param(high.clone(), generator);
                format!("{} BETWEEN {} AND {}", col, low, high)
            }
            Predicate::IsNull { column, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", column.render(generator), not)
            }
            Predicate::Like { column, pattern } => {
                let col = column.render(generator);
                let p = ctx.add_param(pattern.clone(), generator);
                generator.like_insensitive(&col, &p)
            }
            Predicate::JsonbContains { column, document } => {
                let col = column.render(generator);
                let p = ctx.add_param(document.clone(), generator);
                format!("{}::jsonb @> {}::jsonb", col, p)
            }
            Predicate::JsonbHasAny { column, values } => {
                let col = column.render(generator);
                let params: Vec<String> = values
                    .iter()
                    .map(|v| ctx.add_param(v.clone(), generator))
                    .collect();
                format!("{}::jsonb ?| ARRAY[{}]", col, params.join(", "))
            }
            Predicate::JsonFunction { column, function, document } => {
                let name = match function {
                    JsonFunction::Contains => "JSON_CONTAINS",
                    JsonFunction::Overlaps => "JSON_OVERLAPS",
                };
                let col = column.render(generator);
                format!("{}({}, {})", name, col, ctx.add_param(document.clone(), generator))
            }
            Predicate::Group { predicates, .. } if predicates.len() == 1 => {
                predicates[0].render(generator, ctx)
            }
            Predicate::Group { op, predicates } => {
                let parts: Vec<String> = predicates.iter().map(|p| p.render(generator, ctx)).collect();
                format!("({})", parts.join(op.joiner()))
            }
            Predicate::Not(inner) => {
                let rendered = inner.render(generator, ctx);
                if inner.is_parenthesized() {
                    format!("NOT {}", rendered)
                } else {
                    format!("NOT ({})", rendered)
                }
            }
        }
    }

    fn is_parenthesized(&self) -> bool {
        matches!(self, Predicate::Group { predicates, .. } if predicates.len() > 1)
    }
}

/// Predicates joined by one connective.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereClause {
    pub op: LogicalOp,
    pub predicates: Vec<Predicate>,
}

impl WhereClause {
    pub fn new(op: LogicalOp) -> Self {
        Self {
            op,
            predicates: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Conjoin two clauses, keeping each one's own connective inside.
    pub fn and(self, other: WhereClause) -> WhereClause {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        WhereClause::new(LogicalOp::And)
            .push(self.into_predicate())
            .push(other.into_predicate())
    }

    fn into_predicate(self) -> Predicate {
        Predicate::Group {
            op: self.op,
            predicates: self.predicates,
        }
    }

    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        let parts: Vec<String> = self
            .predicates
            .iter()
            .map(|p| p.render(generator, ctx))
            .collect();
        parts.join(self.op.joiner())
    }

    fn render_clause(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.render(generator, ctx))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub source: Source,
    pub projection: Projection,
    pub joins: Vec<JoinClause>,
    pub filter: WhereClause,
    pub order: Vec<OrderTerm>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SelectQuery {
    pub fn from_source(source: Source) -> Self {
        Self {
            source,
            projection: Projection::All,
            joins: Vec::new(),
            filter: WhereClause::default(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn table(table: TableRef) -> Self {
        Self::from_source(Source::Table(table))
    }

    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(clause);
        self
    }

    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order.push(term);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Wrap this query as a derived table under `alias`.
    pub fn into_subquery(self, alias: impl Into<String>) -> Source {
        Source::Subquery {
            query: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        let mut sql = String::from("SELECT ");
        sql.push_str(&generator.limit_prefix(self.limit, self.offset));
        sql.push_str(&self.projection.render(generator));
        sql.push_str(" FROM ");
        sql.push_str(&self.source.render(generator, ctx));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render(generator));
        }

        sql.push_str(&self.filter.render_clause(generator, ctx));

        if !self.order.is_empty() {
            let terms: Vec<String> = self.order.iter().map(|t| t.render(generator)).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        sql.push_str(&generator.limit_offset(self.limit, self.offset, !self.order.is_empty()));
        sql
    }
}

/// One or more rows over a shared column list. `None` cells take the
/// column default.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
    pub returning: Option<Projection>,
    pub select_identity: bool,
}

impl InsertQuery {
    pub fn into_table(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            returning: None,
            select_identity: false,
        }
    }

    /// A single row of column/value pairs.
    pub fn values(mut self, values: Vec<(String, Value)>) -> Self {
        let (columns, row): (Vec<String>, Vec<Option<Value>>) =
            values.into_iter().map(|(c, v)| (c, Some(v))).unzip();
        self.columns = columns;
        self.rows = vec![row];
        self
    }

    /// Several rows; the column list is the union in first-seen order.
    pub fn rows(mut self, rows: Vec<Vec<(String, Value)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for (column, _) in row {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        self.rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|column| {
                        row.iter()
                            .position(|(c, _)| c == column)
                            .map(|i| row.swap_remove(i).1)
                    })
                    .collect()
            })
            .collect();
        self.columns = columns;
        self
    }

    pub fn returning(mut self, projection: Option<Projection>) -> Self {
        self.returning = projection;
        self
    }

    pub fn select_identity(mut self, enabled: bool) -> Self {
        self.select_identity = enabled;
        self
    }

    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        let target = self.table.render(generator);
        let mut sql = if self.columns.is_empty() {
            format!("INSERT INTO {}{}", target, generator.empty_insert())
        } else {
            let columns: Vec<String> = self
                .columns
                .iter()
                .map(|c| generator.quote_identifier(c))
                .collect();
            let tuples: Vec<String> = self
                .rows
                .iter()
                .map(|row| {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|cell| match cell {
                            Some(value) => ctx.add_param(value.clone(), generator),
                            None => generator.missing_cell().to_string(),
                        })
                        .collect();
                    format!("({})", cells.join(", "))
                })
                .collect();
            generator.insert_rows(&target, &columns.join(", "), &tuples)
        };

        if let Some(projection) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&projection.render(generator));
        }
        if self.select_identity {
            if let Some(identity) = generator.identity_select() {
                sql.push_str("; ");
                sql.push_str(identity);
            }
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub table: TableRef,
    pub assignments: Vec<(String, Value)>,
    pub filter: WhereClause,
    pub returning: Option<Projection>,
}

impl UpdateQuery {
    pub fn table(table: TableRef) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            filter: WhereClause::default(),
            returning: None,
        }
    }

    pub fn set(mut self, assignments: Vec<(String, Value)>) -> Self {
        self.assignments = assignments;
        self
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(clause);
        self
    }

    pub fn returning(mut self, projection: Option<Projection>) -> Self {
        self.returning = projection;
        self
    }

    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        let mut sql = format!("UPDATE {} SET ", self.table.render(generator));
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, value)| {
                format!(
                    "{} = {}",
                    generator.quote_identifier(column),
                    ctx.add_param(value.clone(), generator)
                )
            })
            .collect();
        sql.push_str(&sets.join(", "));
        sql.push_str(&self.filter.render_clause(generator, ctx));
        if let Some(projection) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&projection.render(generator));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub table: TableRef,
    pub filter: WhereClause,
    pub returning: Option<Projection>,
}

impl DeleteQuery {
    pub fn from_table(table: TableRef) -> Self {
        Self {
            table,
            filter: WhereClause::default(),
            returning: None,
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(clause);
        self
    }

    pub fn returning(mut self, projection: Option<Projection>) -> Self {
        self.returning = projection;
        self
    }

    pub fn render(&self, generator: &dyn SqlGenerator, ctx: &mut ParamContext) -> String {
        let mut sql = format!("DELETE FROM {}", self.table.render(generator));
        sql.push_str(&self.filter.render_clause(generator, ctx));
        if let Some(projection) = &self.returning {
            sql.push_str(" RETURNING ");
            sql.push_str(&projection.render(generator));
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Dialect;

    fn render_select(query: &SelectQuery, dialect: Dialect) -> (String, Vec<Value>) {
        let generator = dialect.generator();
        let mut ctx = ParamContext::new();
        let sql = query.render(generator.as_ref(), &mut ctx);
        (sql, ctx.params)
    }

    #[test]
    fn test_params_numbered_in_text_order() {
        let inner = SelectQuery::table(TableRef::new("persons"))
            .filter(WhereClause::new(LogicalOp::And).push(Predicate::Compare {
                column: ColumnRef::new("persons", "age"),
                op: CompareOp::Gt,
                value: Value::Int(18),
            }));
        let outer = SelectQuery::from_source(inner.into_subquery("persons")).filter(
            WhereClause::new(LogicalOp::And).push(Predicate::Compare {
                column: ColumnRef::new("tasks", "title"),
                op: CompareOp::Eq,
                value: Value::from("x"),
            }),
        );
        let (sql, params) = render_select(&outer, Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT * FROM \"persons\" WHERE \"persons\".\"age\" > $1) AS \"persons\" WHERE \"tasks\".\"title\" = $2"
        );
        assert_eq!(params, vec![Value::Int(18), Value::from("x")]);
    }

    #[test]
    fn test_empty_in_is_false() {
        let query = SelectQuery::table(TableRef::new("t")).filter(
            WhereClause::new(LogicalOp::And).push(Predicate::In {
                column: ColumnRef::bare("id"),
                values: vec![],
            }),
        );
        let (sql, params) = render_select(&query, Dialect::MySQL);
        assert_eq!(sql, "SELECT * FROM `t` WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_where_and_keeps_inner_connective() {
        let or = WhereClause::new(LogicalOp::Or)
            .push(Predicate::IsNull { column: ColumnRef::bare("a"), negated: false })
            .push(Predicate::IsNull { column: ColumnRef::bare("b"), negated: true });
        let and = WhereClause::new(LogicalOp::And)
            .push(Predicate::IsNull { column: ColumnRef::bare("c"), negated: false });
        let query = SelectQuery::table(TableRef::new("t")).filter(or).filter(and);
        let (sql, _) = render_select(&query, Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT * FROM \"t\" WHERE (\"a\" IS NULL OR \"b\" IS NOT NULL) AND \"c\" IS NULL"
        );
    }

    #[test]
    fn test_sqlserver_top_and_offset() {
        let top = SelectQuery::table(TableRef::new("t")).limit(5);
        assert_eq!(render_select(&top, Dialect::SqlServer).0, "SELECT TOP (5) * FROM [t]");
        let paged = SelectQuery::table(TableRef::new("t")).limit(5).offset(10);
        assert_eq!(
            render_select(&paged, Dialect::SqlServer).0,
            "SELECT * FROM [t] ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_bulk_insert_fills_missing_cells() {
        let insert = InsertQuery::into_table(TableRef::new("t")).rows(vec![
            vec![("a".to_string(), Value::Int(1))],
            vec![("b".to_string(), Value::Int(2)), ("a".to_string(), Value::Int(3))],
        ]);
        let generator = Dialect::Postgres.generator();
        let mut ctx = ParamContext::new();
        assert_eq!(
            insert.render(generator.as_ref(), &mut ctx),
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, DEFAULT), ($2, $3)"
        );
        assert_eq!(ctx.params, vec![Value::Int(1), Value::Int(3), Value::Int(2)]);

        let generator = Dialect::Oracle.generator();
        let mut ctx = ParamContext::new();
        assert_eq!(
            insert.render(generator.as_ref(), &mut ctx),
            "INSERT ALL INTO \"t\" (\"a\", \"b\") VALUES (:1, NULL) INTO \"t\" (\"a\", \"b\") VALUES (:2, :3) SELECT 1 FROM DUAL"
        );
    }
}
