use uuid::Uuid;
use serde::{Deserialize, Serialize};

/// One dictionary per node-cluster-type (spec.md §3): upserted by that FK,
/// never by its own primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlarmDictionary {
    pub alarm_dictionary_id: Uuid,
    pub alarm_dictionary_version: String,
    pub entity_type: String,
    pub vendor: String,
    pub node_cluster_type_id: Uuid,
    pub generation_id: i64,
}

impl crate::Storable for AlarmDictionary {
    const TABLE: &'static str = "alarm_dictionary";
    const PK_COLUMN: &'static str = "alarm_dictionary_id";
    const COLUMNS: &'static [&'static str] = &[
        "alarm_dictionary_id",
        "alarm_dictionary_version",
        "entity_type",
        "vendor",
        "node_cluster_type_id",
        "generation_id",
    ];
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = Some(&["node_cluster_type_id"]);
    const UPDATE_COLUMNS: Option<&'static [&'static str]> =
        Some(&["alarm_dictionary_version", "entity_type", "vendor", "generation_id"]);

    fn primary_key(&self) -> Uuid {
        self.alarm_dictionary_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.alarm_dictionary_id)
            .push(", ")
            .push_bind(&self.alarm_dictionary_version)
            .push(", ")
            .push_bind(&self.entity_type)
            .push(", ")
            .push_bind(&self.vendor)
            .push(", ")
            .push_bind(self.node_cluster_type_id)
            .push(", ")
            .push_bind(self.generation_id);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("alarm_dictionary_version = ")
            .push_bind(&self.alarm_dictionary_version)
            .push(", entity_type = ")
            .push_bind(&self.entity_type)
            .push(", vendor = ")
            .push_bind(&self.vendor)
            .push(", generation_id = ")
            .push_bind(self.generation_id);
    }
}
