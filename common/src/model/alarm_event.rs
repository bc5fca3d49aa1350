use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::Type;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// An occurrence of an alarm, keyed by `(fingerprint, alarm_raised_time)`
/// (spec.md §3). Written exclusively by `o2ims-alarm-events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlarmEventRecord {
    pub alarm_event_record_id: Uuid,
    pub alarm_definition_id: Option<Uuid>,
    pub probable_cause_id: Option<Uuid>,
    pub alarm_raised_time: DateTime<Utc>,
    pub alarm_changed_time: DateTime<Utc>,
    pub alarm_cleared_time: Option<DateTime<Utc>>,
    pub alarm_acknowledged: bool,
    pub alarm_acknowledged_time: Option<DateTime<Utc>>,
    pub perceived_severity: PerceivedSeverity,
    pub extensions: Json,
    pub object_id: Uuid,
    pub object_type_id: Uuid,
    /// Present upstream alongside `object_type_id` but dropped from
    /// spec.md's distillation (SPEC_FULL.md §3).
    pub resource_type_id: Option<Uuid>,
    pub notification_event_type: NotificationEventType,
    pub alarm_status: AlarmStatus,
    pub fingerprint: String,
    /// Monotone from `alarm_sequence_seq`; bumped by a database trigger on
    /// resolve-transition or `alarm_changed_time` change (spec.md §3, §8).
    pub alarm_sequence_number: i64,
    pub created_at: DateTime<Utc>,
    pub generation_id: i64,
    pub source: Source,
}

/// 0 (indeterminate) through 5 (critical), per spec.md §3's `(0..5)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "int2")]
#[repr(i16)]
pub enum PerceivedSeverity {
    Indeterminate = 0,
    Warning = 1,
    Minor = 2,
    Major = 3,
    Critical = 4,
    Cleared = 5,
}

impl PerceivedSeverity {
    /// Maps an upstream alert's `severity` label onto the dictionary's rank
    /// (spec.md §4.4 step 6, §4.5 step 1: "perceived_severity mapped from
    /// the label"). Unknown labels map to `Indeterminate` rather than
    /// failing the batch.
    pub fn from_label(label: &str) -> Self {
        match label {
            "warning" => Self::Warning,
            "minor" => Self::Minor,
            "major" => Self::Major,
            "critical" => Self::Critical,
            "cleared" => Self::Cleared,
            _ => Self::Indeterminate,
        }
    }
}

/// `firing` or `resolved` (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Display, EnumString)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlarmStatus {
    Firing,
    Resolved,
}

/// `caas` (Kubernetes-managed cluster) or `hardware` (bare-metal/hardware
/// monitoring), per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Display, EnumString)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Caas,
    Hardware,
}

/// The O2IMS notification event type discriminator carried on every alarm
/// event record and matched against a subscription's optional filter
/// (spec.md §4.6 step c, SPEC_FULL.md §9 Open Question (b)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Display, EnumString)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEventType {
    Create,
    Modify,
    Delete,
}

impl crate::Storable for AlarmEventRecord {
    const TABLE: &'static str = "alarm_event_record";
    const PK_COLUMN: &'static str = "alarm_event_record_id";
    const COLUMNS: &'static [&'static str] = &[
        "alarm_event_record_id",
        "alarm_definition_id",
        "probable_cause_id",
        "alarm_raised_time",
        "alarm_changed_time",
        "alarm_cleared_time",
        "alarm_acknowledged",
        "alarm_acknowledged_time",
        "perceived_severity",
        "extensions",
        "object_id",
        "object_type_id",
        "resource_type_id",
        "notification_event_type",
        "alarm_status",
        "fingerprint",
        "created_at",
        "generation_id",
        "source",
    ];
    // `alarm_sequence_number` is deliberately excluded: it is assigned by
    // the `alarm_sequence_seq`-backed trigger (spec.md §6), never bound by
    // the repository.
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = Some(&["fingerprint", "alarm_raised_time"]);
    const UPDATE_COLUMNS: Option<&'static [&'static str]> = Some(&[
        "alarm_definition_id",
        "probable_cause_id",
        "alarm_cleared_time",
        "perceived_severity",
        "extensions",
        "object_id",
        "object_type_id",
        "resource_type_id",
        "alarm_status",
        "generation_id",
    ]);

    fn primary_key(&self) -> Uuid {
        self.alarm_event_record_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.alarm_event_record_id)
            .push(", ")
            .push_bind(self.alarm_definition_id)
            .push(", ")
            .push_bind(self.probable_cause_id)
            .push(", ")
            .push_bind(self.alarm_raised_time)
            .push(", ")
            .push_bind(self.alarm_changed_time)
            .push(", ")
            .push_bind(self.alarm_cleared_time)
            .push(", ")
            .push_bind(self.alarm_acknowledged)
            .push(", ")
            .push_bind(self.alarm_acknowledged_time)
            .push(", ")
            .push_bind(self.perceived_severity as i16)
            .push(", ")
            .push_bind(&self.extensions)
            .push(", ")
            .push_bind(self.object_id)
            .push(", ")
            .push_bind(self.object_type_id)
            .push(", ")
            .push_bind(self.resource_type_id)
            .push(", ")
            .push_bind(self.notification_event_type.to_string())
            .push(", ")
            .push_bind(self.alarm_status.to_string())
            .push(", ")
            .push_bind(&self.fingerprint)
            .push(", ")
            .push_bind(self.created_at)
            .push(", ")
            .push_bind(self.generation_id)
            .push(", ")
            .push_bind(self.source.to_string());
    }

    /// On conflict, update only the fields spec.md §4.5 step 2 names:
    /// severity, cleared_time, status, object fields, definition/cause FKs,
    /// extensions. `alarm_changed_time`/`alarm_sequence_number` are left to
    /// the trigger.
    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("alarm_definition_id = ")
            .push_bind(self.alarm_definition_id)
            .push(", probable_cause_id = ")
            .push_bind(self.probable_cause_id)
            .push(", alarm_cleared_time = ")
            .push_bind(self.alarm_cleared_time)
            .push(", perceived_severity = ")
            .push_bind(self.perceived_severity as i16)
            .push(", extensions = ")
            .push_bind(&self.extensions)
            .push(", object_id = ")
            .push_bind(self.object_id)
            .push(", object_type_id = ")
            .push_bind(self.object_type_id)
            .push(", resource_type_id = ")
            .push_bind(self.resource_type_id)
            .push(", alarm_status = ")
            .push_bind(self.alarm_status.to_string())
            .push(", generation_id = ")
            .push_bind(self.generation_id);
    }
}
