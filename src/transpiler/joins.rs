//! Relationship joins.

use super::statement::{ColumnRef, JoinClause, SelectQuery, TableRef};
use crate::ast::{JoinKey, RelationshipsJson};
use crate::error::{WeaveError, WeaveResult};
use std::collections::{BTreeMap, HashMap};

/// Group relationship edges by destination and join table, in order of
/// first appearance.
pub fn group_relationships(relationships: &[RelationshipsJson]) -> Vec<(JoinKey, Vec<&RelationshipsJson>)> {
    let mut groups: Vec<(JoinKey, Vec<&RelationshipsJson>)> = Vec::new();
    let mut index: HashMap<JoinKey, usize> = HashMap::new();
    for relationship in relationships {
        let key = relationship.key();
        match index.get(&key) {
            Some(&i) => groups[i].1.push(relationship),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![relationship]));
            }
        }
    }
    groups
}

struct JoinTargets<'a> {
    schema: Option<&'a str>,
    aliases: &'a BTreeMap<String, String>,
}

impl JoinTargets<'_> {
    fn table(&self, name: &str) -> TableRef {
        TableRef::new(name)
            .in_schema(self.schema)
            .alias(self.aliases.get(name).map(String::as_str))
    }

    fn reference<'n>(&'n self, name: &'n str) -> &'n str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// Add one LEFT JOIN per direct group, two per through group, then cap
/// the result at `max_rows`.
pub fn apply_joins(
    query: SelectQuery,
    from_table: &str,
    relationships: &[RelationshipsJson],
    schema: Option<&str>,
    aliases: &BTreeMap<String, String>,
    max_rows: usize,
) -> WeaveResult<SelectQuery> {
    if relationships.is_empty() {
        return Ok(query);
    }
    let targets = JoinTargets { schema, aliases };
    let mut query = query;

    for (key, edges) in group_relationships(relationships) {
        let to_ref = targets.reference(&key.to_table);
        let from_ref = |edge: &RelationshipsJson| -> String {
            targets
                .reference(edge.from_table.as_deref().unwrap_or(from_table))
                .to_string()
        };

        match &key.through {
            None => {
                let on = edges
                    .iter()
                    .map(|edge| {
                        (
                            ColumnRef::new(from_ref(edge), edge.from.as_str()),
                            ColumnRef::new(to_ref, edge.to.as_str()),
                        )
                    })
                    .collect();
                query = query.join(JoinClause {
                    table: targets.table(&key.to_table),
                    on,
                });
            }
            Some(through) => {
                let through_ref = targets.reference(through);
                let mut through_on = Vec::with_capacity(edges.len());
                let mut to_on = Vec::with_capacity(edges.len());
                for edge in &edges {
                    let (Some(from_primary), Some(to_primary)) = (&edge.from_primary, &edge.to_primary) else {
                        return Err(WeaveError::invalid(format!(
                            "relationship to '{}' through '{}' needs fromPrimary and toPrimary",
                            key.to_table, through
                        )));
                    };
                    through_on.push((
                        ColumnRef::new(from_ref(edge), from_primary.as_str()),
                        ColumnRef::new(through_ref, edge.from.as_str()),
                    ));
                    to_on.push((
                        ColumnRef::new(to_ref, to_primary.as_str()),
                        ColumnRef::new(through_ref, edge.to.as_str()),
                    ));
                }
                query = query
                    .join(JoinClause {
                        table: targets.table(through),
                        on: through_on,
                    })
                    .join(JoinClause {
                        table: targets.table(&key.to_table),
                        on: to_on,
                    });
            }
        }
    }

    Ok(query.limit(max_rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_keeps_first_appearance_order() {
        let relationships = vec![
            RelationshipsJson::direct("tasks", "id", "person_id"),
            RelationshipsJson::through("products", "tasks_products", ("id", "task_id"), ("id", "product_id")),
            RelationshipsJson::direct("tasks", "id", "reviewer_id"),
        ];
        let groups = group_relationships(&relationships);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.to_table, "tasks");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0.through.as_deref(), Some("tasks_products"));
    }

    #[test]
    fn test_through_without_primary_is_rejected() {
        let mut edge =
            RelationshipsJson::through("products", "tasks_products", ("id", "task_id"), ("id", "product_id"));
        edge.to_primary = None;
        let query = SelectQuery::table(TableRef::new("tasks"));
        let err = apply_joins(query, "tasks", &[edge], None, &BTreeMap::new(), 10).unwrap_err();
        assert!(matches!(err, WeaveError::InvalidQuery(_)));
    }
}
