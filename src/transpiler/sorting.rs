//! ORDER BY and LIMIT/OFFSET.

use super::dialect::Dialect;
use super::statement::{ColumnRef, OrderTerm, SelectQuery};
use crate::ast::{PaginationJson, QueryJson, SortDirection};
use crate::error::{WeaveError, WeaveResult};

/// Resolved row window of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: Option<usize>,
}

/// Turn `{page, limit}` into a row window. Pages are 1-based; a zero
/// offset is dropped. A missing or zero limit falls back to `max_rows`.
pub fn pagination(paginate: Option<&PaginationJson>, max_rows: usize) -> WeaveResult<Pagination> {
    let Some(limit) = paginate.and_then(PaginationJson::row_limit) else {
        return Ok(Pagination {
            limit: max_rows,
            offset: None,
        });
    };
    let offset = match paginate.and_then(|p| p.page) {
        Some(page) => page
            .saturating_sub(1)
            .checked_mul(limit)
            .ok_or_else(|| WeaveError::invalid(format!("page {page} of {limit} rows is out of range")))?,
        None => 0,
    };
    Ok(Pagination {
        limit,
        offset: (offset > 0).then_some(offset),
    })
}

pub fn apply_pagination(query: SelectQuery, window: Pagination) -> SelectQuery {
    let query = query.limit(window.limit);
    match window.offset {
        Some(offset) => query.offset(offset),
        None => query,
    }
}

/// Order by the requested fields of the (aliased) owning table. SQL Server
/// needs an order to page, so a limited read without a sort is ordered by
/// the first primary key column.
pub fn apply_sort(query: SelectQuery, json: &QueryJson, dialect: Dialect) -> SelectQuery {
    let table = json.table().map(|t| t.name.as_str()).unwrap_or(json.table_name());
    let aliased = json.alias_of(table);

    match &json.sort {
        Some(sort) if !sort.is_empty() => sort.iter().fold(query, |query, (field, direction)| {
            query.order_by(OrderTerm {
                column: ColumnRef::new(aliased, field),
                direction,
            })
        }),
        _ => {
            let limited = json.paginate.as_ref().and_then(PaginationJson::row_limit).is_some();
            let primary = json.table().and_then(|t| t.first_primary());
            match primary {
                Some(primary) if limited && dialect.requires_order_for_pagination() => {
                    tracing::debug!(table = %aliased, primary = %primary, "ordering by primary key for pagination");
                    query.order_by(OrderTerm {
                        column: ColumnRef::new(aliased, primary),
                        direction: SortDirection::Ascending,
                    })
                }
                _ => query,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offsets() {
        let offsets: Vec<Option<usize>> = (1..=3)
            .map(|page| {
                pagination(Some(&PaginationJson { page: Some(page), limit: Some(4) }), 5000)
                    .unwrap()
                    .offset
            })
            .collect();
        assert_eq!(offsets, vec![None, Some(4), Some(8)]);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(pagination(None, 5000).unwrap(), Pagination { limit: 5000, offset: None });
        assert_eq!(
            pagination(Some(&PaginationJson { page: Some(3), limit: None }), 100).unwrap(),
            Pagination { limit: 100, offset: None }
        );
        assert_eq!(
            pagination(Some(&PaginationJson { page: None, limit: Some(7) }), 100).unwrap(),
            Pagination { limit: 7, offset: None }
        );
    }

    #[test]
    fn test_zero_limit_is_unset() {
        assert_eq!(
            pagination(Some(&PaginationJson { page: Some(4), limit: Some(0) }), 100).unwrap(),
            Pagination { limit: 100, offset: None }
        );
    }

    #[test]
    fn test_offset_overflow_is_rejected() {
        let paginate = PaginationJson {
            page: Some(usize::MAX / 2),
            limit: Some(10),
        };
        assert!(matches!(pagination(Some(&paginate), 5000), Err(WeaveError::InvalidQuery(_))));
    }
}
