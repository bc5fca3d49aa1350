use serde_json::Value as Json;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

/// A named, severity-stamped template of an alarm, resolved from a
/// monitoring rule by `o2ims-alarm-dictionary` (spec.md §4.4).
///
/// Invariant: `(alarm_dictionary_id, alarm_name, alarm_severity)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlarmDefinition {
    pub alarm_definition_id: Uuid,
    pub alarm_dictionary_id: Uuid,
    pub alarm_name: String,
    pub alarm_severity: i16,
    pub alarm_description: Option<String>,
    pub proposed_repair_action: Option<String>,
    /// The monitoring rule's `expr`, `for`, `keep_firing_for` and embedded
    /// node-cluster-type descriptor, stored together as one `jsonb` blob
    /// (spec.md §4.4 step 6: "additional fields").
    pub additional_fields: Json,
}

impl crate::Storable for AlarmDefinition {
    const TABLE: &'static str = "alarm_definition";
    const PK_COLUMN: &'static str = "alarm_definition_id";
    const COLUMNS: &'static [&'static str] = &[
        "alarm_definition_id",
        "alarm_dictionary_id",
        "alarm_name",
        "alarm_severity",
        "alarm_description",
        "proposed_repair_action",
        "additional_fields",
    ];
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> =
        Some(&["alarm_dictionary_id", "alarm_name", "alarm_severity"]);
    const UPDATE_COLUMNS: Option<&'static [&'static str]> =
        Some(&["alarm_description", "proposed_repair_action", "additional_fields"]);

    fn primary_key(&self) -> Uuid {
        self.alarm_definition_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.alarm_definition_id)
            .push(", ")
            .push_bind(self.alarm_dictionary_id)
            .push(", ")
            .push_bind(&self.alarm_name)
            .push(", ")
            .push_bind(self.alarm_severity)
            .push(", ")
            .push_bind(&self.alarm_description)
            .push(", ")
            .push_bind(&self.proposed_repair_action)
            .push(", ")
            .push_bind(&self.additional_fields);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push("alarm_description = ")
            .push_bind(&self.alarm_description)
            .push(", proposed_repair_action = ")
            .push_bind(&self.proposed_repair_action)
            .push(", additional_fields = ")
            .push_bind(&self.additional_fields);
    }
}
