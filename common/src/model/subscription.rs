use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::alarm_event::NotificationEventType;

/// A registered callback with an event cursor for at-least-once delivery
/// (spec.md §3). `o2ims-notifier` owns `event_cursor`; no other crate
/// mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub subscription_id: Uuid,
    /// The ID the caller wants echoed back on delivery — distinct from
    /// `subscription_id`, matching the upstream provisioning model's
    /// explicit separation (SPEC_FULL.md §3).
    pub consumer_subscription_id: String,
    pub callback_url: String,
    pub filter: Option<NotificationEventType>,
    pub event_cursor: i64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// INCLUSION match: deliver when no filter is set, or the filter equals
    /// the notification's event type. Resolves SPEC_FULL.md §9 Open
    /// Question (b) — the upstream `Matches` reads as an inverted filter,
    /// treated here as inclusion per product intent.
    pub fn matches(&self, event_type: NotificationEventType) -> bool {
        self.filter.is_none() || self.filter == Some(event_type)
    }
}

impl crate::Storable for Subscription {
    const TABLE: &'static str = "subscription";
    const PK_COLUMN: &'static str = "subscription_id";
    const COLUMNS: &'static [&'static str] = &[
        "subscription_id",
        "consumer_subscription_id",
        "callback_url",
        "filter",
        "event_cursor",
        "created_at",
    ];
    // `callback_url` is unique; conflicts there surface as
    // `CoreError::Conflict` (spec.md §7), never silently upserted.
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = None;

    fn primary_key(&self) -> Uuid {
        self.subscription_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.subscription_id)
            .push(", ")
            .push_bind(&self.consumer_subscription_id)
            .push(", ")
            .push_bind(&self.callback_url)
            .push(", ")
            .push_bind(self.filter.map(|f| f.to_string()))
            .push(", ")
            .push_bind(self.event_cursor)
            .push(", ")
            .push_bind(self.created_at);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("callback_url = ")
            .push_bind(&self.callback_url)
            .push(", filter = ")
            .push_bind(self.filter.map(|f| f.to_string()))
            .push(", event_cursor = ")
            .push_bind(self.event_cursor);
    }
}
