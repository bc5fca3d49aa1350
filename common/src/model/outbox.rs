use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::Type;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// A pending change event written in the same transaction as the change it
/// describes (spec.md §3, the "outbox" of the outbox pattern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataChangeEvent {
    pub data_change_event_id: Uuid,
    /// The table the change originated from, as an enum rather than a free
    /// string for `sqlx` type safety (SPEC_FULL.md §3).
    pub object_type: ObjectType,
    pub object_id: Uuid,
    pub operation: OutboxOperation,
    pub before: Option<Json>,
    pub after: Option<Json>,
    pub sequence: i64,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The tables a `DataChangeEvent` can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Display, EnumString)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectType {
    ResourcePool,
    Resource,
    NodeClusterType,
    AlarmDictionary,
    AlarmDefinition,
    AlarmEventRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Display, EnumString)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutboxOperation {
    Created,
    Updated,
    Deleted,
}

/// Single-row high-watermark used only as the catch-up sweep's bookmark
/// (spec.md §3; SPEC_FULL.md §9 Open Question (a) — the outbox/sequence
/// flow is authoritative, this is not a competing delivery mechanism).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationCursor {
    pub last_swept_sequence: i64,
    pub last_swept_at: DateTime<Utc>,
}

impl crate::Storable for DataChangeEvent {
    const TABLE: &'static str = "data_change_event";
    const PK_COLUMN: &'static str = "data_change_event_id";
    const COLUMNS: &'static [&'static str] = &[
        "data_change_event_id",
        "object_type",
        "object_id",
        "operation",
        "before",
        "after",
        "claimed_at",
        "created_at",
    ];
    // `sequence` is assigned by a database sequence, never bound here.

    fn primary_key(&self) -> Uuid {
        self.data_change_event_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.data_change_event_id)
            .push(", ")
            .push_bind(self.object_type.to_string())
            .push(", ")
            .push_bind(self.object_id)
            .push(", ")
            .push_bind(self.operation.to_string())
            .push(", ")
            .push_bind(&self.before)
            .push(", ")
            .push_bind(&self.after)
            .push(", ")
            .push_bind(self.claimed_at)
            .push(", ")
            .push_bind(self.created_at);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder.push("claimed_at = ").push_bind(self.claimed_at);
    }
}
