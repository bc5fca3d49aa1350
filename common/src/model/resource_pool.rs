use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Extensions;

/// A named grouping of hardware/virtual resources at a site, owned
/// exclusively by the collector (spec.md §3, §4.3).
///
/// Invariant: `(data_source_id, external_id)` is unique — enforced by the
/// repository's upsert conflict target, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResourcePool {
    pub resource_pool_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub o_cloud_site_id: Option<Uuid>,
    pub extensions: Extensions,
    pub data_source_id: Uuid,
    pub generation_id: i64,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

impl ResourcePool {
    /// The upstream CRD's free-form site locator, dropped from spec.md's
    /// distillation of §3 but present upstream; surfaced from the
    /// extension bag rather than as a first-class column (SPEC_FULL.md §3).
    pub fn global_location_id(&self) -> Option<&str> {
        self.extensions.get("globalLocationId").and_then(|v| v.as_str())
    }
}

impl crate::Storable for ResourcePool {
    const TABLE: &'static str = "resource_pool";
    const PK_COLUMN: &'static str = "resource_pool_id";
    const COLUMNS: &'static [&'static str] = &[
        "resource_pool_id",
        "name",
        "description",
        "o_cloud_site_id",
        "extensions",
        "data_source_id",
        "generation_id",
        "external_id",
        "created_at",
    ];
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = Some(&["data_source_id", "external_id"]);
    const UPDATE_COLUMNS: Option<&'static [&'static str]> =
        Some(&["name", "description", "o_cloud_site_id", "extensions", "generation_id"]);

    fn primary_key(&self) -> Uuid {
        self.resource_pool_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.resource_pool_id)
            .push(", ")
            .push_bind(&self.name)
            .push(", ")
            .push_bind(&self.description)
            .push(", ")
            .push_bind(self.o_cloud_site_id)
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
            .push("name = ")
            .push_bind(&self.name)
            .push(", description = ")
            .push_bind(&self.description)
            .push(", o_cloud_site_id = ")
            .push_bind(self.o_cloud_site_id)
            .push(", extensions = ")
            .push_bind(&self.extensions)
            .push(", generation_id = ")
            .push_bind(self.generation_id);
    }
}
