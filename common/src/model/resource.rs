use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Extensions;

/// A single infrastructure resource (node, NIC, storage device, …) within a
/// resource pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub resource_id: Uuid,
    pub resource_type_id: Uuid,
    pub resource_pool_id: Uuid,
    pub description: Option<String>,
    pub extensions: Extensions,
    pub data_source_id: Uuid,
    pub generation_id: i64,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Status is derived from the extension bag rather than stored directly
    /// (spec.md §3: "status derived from extensions").
    pub fn status(&self) -> Option<&str> {
        self.extensions.get("status").and_then(|v| v.as_str())
    }
}

impl crate::Storable for Resource {
    const TABLE: &'static str = "resource";
    const PK_COLUMN: &'static str = "resource_id";
    const COLUMNS: &'static [&'static str] = &[
        "resource_id",
        "resource_type_id",
        "resource_pool_id",
        "description",
        "extensions",
        "data_source_id",
        "generation_id",
        "external_id",
        "created_at",
    ];
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = Some(&["data_source_id", "external_id"]);
    const UPDATE_COLUMNS: Option<&'static [&'static str]> =
        Some(&["resource_type_id", "resource_pool_id", "description", "extensions", "generation_id"]);

    fn primary_key(&self) -> Uuid {
        self.resource_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.resource_id)
            .push(", ")
            .push_bind(self.resource_type_id)
            .push(", ")
            .push_bind(self.resource_pool_id)
            .push(", ")
            .push_bind(&self.description)
            .push(", ")
            .push_bind(&self.extensions)
            .push(", ")
            .push_bind(self.data_source_id)
            .push(", ")
            .push_bind(self.generation_id)
            .push(", ")
            .push_bind(&self.external_id)
            .push(", ")
            .push_bind(self.created_at);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("resource_type_id = ")
            .push_bind(self.resource_type_id)
            .push(", resource_pool_id = ")
            .push_bind(self.resource_pool_id)
            .push(", description = ")
            .push_bind(&self.description)
            .push(", extensions = ")
            .push_bind(&self.extensions)
            .push(", generation_id = ")
            .push_bind(self.generation_id);
    }
}
