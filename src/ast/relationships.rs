use serde::{Deserialize, Serialize};

/// One relationship edge, direct or through a join table.
///
/// For a direct edge the join condition is `from_table.from = to_table.to`.
/// For an edge through a join table it is
/// `from_table.from_primary = through.from` then
/// `to_table.to_primary = through.to`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipsJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_table: Option<String>,
    #[serde(alias = "tableName")]
    pub to_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_primary: Option<String>,
}

impl RelationshipsJson {
    pub fn direct(to_table: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            to_table: to_table.into(),
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn through(
        to_table: impl Into<String>,
        through: impl Into<String>,
        (from_primary, from): (&str, &str),
        (to_primary, to): (&str, &str),
    ) -> Self {
        Self {
            to_table: to_table.into(),
            through: Some(through.into()),
            from: from.to_string(),
            to: to.to_string(),
            from_primary: Some(from_primary.to_string()),
            to_primary: Some(to_primary.to_string()),
            ..Default::default()
        }
    }

    pub fn key(&self) -> JoinKey {
        JoinKey {
            to_table: self.to_table.clone(),
            through: self.through.clone(),
        }
    }
}

/// Grouping key: all edges to the same destination over the same join
/// table compile into one join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub to_table: String,
    pub through: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_aliases() {
        let rel: RelationshipsJson = serde_json::from_value(serde_json::json!({
            "tableName": "tasks",
            "from": "id",
            "to": "person_id"
        }))
        .unwrap();
        assert_eq!(rel, RelationshipsJson::direct("tasks", "id", "person_id"));
        assert_eq!(rel.key(), JoinKey { to_table: "tasks".into(), through: None });
    }
}
