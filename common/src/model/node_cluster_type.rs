use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Extensions;

/// The model+vendor+version descriptor that keys an alarm dictionary
/// (spec.md §3). `vendor`, `model`, `version` are mandatory on ingest —
/// enforced by `o2ims-collector`, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NodeClusterType {
    pub node_cluster_type_id: Uuid,
    pub name: String,
    pub extensions: Extensions,
}

impl NodeClusterType {
    pub fn vendor(&self) -> Option<&str> {
        self.extensions.get("vendor").and_then(|v| v.as_str())
    }

    pub fn model(&self) -> Option<&str> {
        self.extensions.get("model").and_then(|v| v.as_str())
    }

    pub fn version(&self) -> Option<&str> {
        self.extensions.get("version").and_then(|v| v.as_str())
    }

    /// `true` for the single hub cluster, matching spec.md §4.4 step 2's
    /// `model = "hub-cluster"` discriminator.
    pub fn is_hub_cluster(&self) -> bool {
        self.model() == Some("hub-cluster")
    }
}

impl crate::Storable for NodeClusterType {
    const TABLE: &'static str = "node_cluster_type";
    const PK_COLUMN: &'static str = "node_cluster_type_id";
    const COLUMNS: &'static [&'static str] = &["node_cluster_type_id", "name", "extensions"];

    fn primary_key(&self) -> Uuid {
        self.node_cluster_type_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.node_cluster_type_id)
            .push(", ")
            .push_bind(&self.name)
            .push(", ")
            .push_bind(&self.extensions);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("name = ")
            .push_bind(&self.name)
            .push(", extensions = ")
            .push_bind(&self.extensions);
    }
}
