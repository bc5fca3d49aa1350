//! The outbox listener and per-subscription notifier (C6, spec.md §4.6).
//!
//! Grounded on the wider example pack's `PgListener`-driven config sync
//! worker for the LISTEN/NOTIFY shape, and on the teacher's
//! `NexusReconciler` for the catch-up-timer-races-the-primary-signal
//! pattern reused in `o2ims-alarm-dictionary`.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use o2ims_common::model::{DataChangeEvent, NotificationEventType, ObjectType, OutboxOperation, Subscription};
use o2ims_repository::PgRepository;
use serde_json::Value as Json;
use shutdown::Shutdown;
use sqlx::postgres::{PgListener, PgPool};
use sqlx::Row;
use uuid::Uuid;

use crate::error::NotifyError;

const CLAIM_BATCH_SIZE: i64 = 100;

pub struct NotifierRepositories {
    pub outbox: PgRepository<DataChangeEvent>,
    pub subscriptions: PgRepository<Subscription>,
}

/// The canonical, transformed message delivered to one subscriber
/// (spec.md §4.6 step b/c).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub sequence: i64,
    pub object_type: ObjectType,
    pub object_id: Uuid,
    pub event_type: NotificationEventType,
    pub payload: Json,
}

pub struct Notifier {
    pool: PgPool,
    repos: NotifierRepositories,
    transport: o2ims_transport::Client,
    channel: &'static str,
    catchup_interval: Duration,
}

impl Notifier {
    pub fn new(pool: PgPool, repos: NotifierRepositories, transport: o2ims_transport::Client) -> Self {
        Self {
            pool,
            repos,
            transport,
            channel: utils::OUTBOX_CHANNEL,
            catchup_interval: Duration::from_secs(15 * 60),
        }
    }

    pub fn with_catchup_interval(mut self, interval: Duration) -> Self {
        self.catchup_interval = interval;
        self
    }

    /// Registers the channel listener and races it against the catch-up
    /// timer and shutdown (spec.md §4.6 steps 1–2). Runs until cancelled.
    #[tracing::instrument(skip(self, shutdown))]
    pub async fn run(&self, shutdown: Shutdown) -> Result<(), NotifyError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(self.channel).await?;
        let mut catchup = tokio::time::interval(self.catchup_interval);
        catchup.tick().await; // first tick fires immediately; skip it

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("notifier shutting down");
                    return Ok(());
                }
                notification = listener.recv() => {
                    match notification {
                        Ok(_) => {
                            if let Err(error) = self.process_outbox(&shutdown).await {
                                tracing::warn!(%error, "processOutbox failed on primary signal");
                            }
                        }
                        Err(error) => {
                            tracing::warn!(%error, "outbox listener connection error, retrying on next catch-up tick");
                        }
                    }
                }
                _ = catchup.tick() => {
                    tracing::debug!("catch-up sweep tick");
                    if let Err(error) = self.process_outbox(&shutdown).await {
                        tracing::warn!(%error, "processOutbox failed on catch-up tick");
                    }
                }
            }
        }
    }

    /// Claims a bounded batch of unclaimed outbox rows, delivers each to
    /// every matching subscription, and deletes rows whose subscriptions
    /// have all caught up (spec.md §4.6 step 2).
    #[tracing::instrument(skip(self, shutdown))]
    pub async fn process_outbox(&self, shutdown: &Shutdown) -> Result<(), NotifyError> {
        let claimed = self.claim_batch().await?;
        if claimed.is_empty() {
            return Ok(());
        }

        let subscriptions = self.repos.subscriptions.find_all().await?;

        for event in claimed {
            let notification = Notification {
                sequence: event.sequence,
                object_type: event.object_type,
                object_id: event.object_id,
                event_type: notification_event_type(event.operation),
                payload: event.after.clone().or_else(|| event.before.clone()).unwrap_or(Json::Null),
            };

            let mut deliveries = FuturesUnordered::new();
            for subscription in &subscriptions {
                if notification.sequence <= subscription.event_cursor {
                    continue;
                }
                deliveries.push(self.deliver_to(subscription.clone(), notification.clone(), shutdown));
            }
            while let Some(result) = deliveries.next().await {
                if let Err(error) = result {
                    tracing::warn!(%error, sequence = notification.sequence, "subscription delivery failed, cursor will lag");
                }
            }

            if self.all_subscriptions_caught_up(notification.sequence).await? {
                self.delete_outbox_row(event.data_change_event_id).await?;
            } else {
                // At least one subscription still lags (a failed delivery,
                // or a new subscription created after this row was
                // claimed). Release the claim so the row is picked up again
                // on the next tick instead of being excluded from every
                // future `claim_batch` forever (spec.md §4.6: "retried on
                // the next tick").
                self.release_claim(event.data_change_event_id).await?;
            }
        }
        Ok(())
    }

    /// Delivers one notification to one subscription and advances its
    /// cursor on success (spec.md §4.6 step c). A non-matching filter
    /// advances the cursor without delivering, so a subscription's filter
    /// can never permanently block an outbox row from being reclaimed.
    #[tracing::instrument(skip(self, subscription, notification, shutdown), fields(subscription = %subscription.subscription_id, sequence = notification.sequence))]
    async fn deliver_to(&self, subscription: Subscription, notification: Notification, shutdown: &Shutdown) -> Result<(), NotifyError> {
        if !subscription.matches(notification.event_type) {
            self.advance_cursor(subscription.subscription_id, notification.sequence).await?;
            return Ok(());
        }

        let mut payload = notification.payload.clone();
        if let Some(map) = payload.as_object_mut() {
            map.insert("consumer_subscription_id".to_string(), Json::String(subscription.consumer_subscription_id.clone()));
        }

        let cancel = shutdown.cancellation_token();
        self.transport
            .do_request(reqwest::Method::POST, &subscription.callback_url, &cancel, |builder| builder.json(&payload))
            .await?;

        self.advance_cursor(subscription.subscription_id, notification.sequence).await
    }

    /// Optimistic-concurrency cursor advance: re-reads the row and only
    /// raises the cursor forward, so a replayed delivery never regresses it
    /// (spec.md §8: "a cursor advance is idempotent under delivery replay").
    async fn advance_cursor(&self, subscription_id: Uuid, sequence: i64) -> Result<(), NotifyError> {
        let mut subscription = self.repos.subscriptions.get(subscription_id).await?;
        if subscription.event_cursor >= sequence {
            return Ok(());
        }
        subscription.event_cursor = sequence;
        self.repos.subscriptions.update(subscription_id, &subscription).await?;
        Ok(())
    }

    async fn all_subscriptions_caught_up(&self, sequence: i64) -> Result<bool, NotifyError> {
        let subscriptions = self.repos.subscriptions.find_all().await?;
        Ok(cursor_covers_sequence(&subscriptions, sequence))
    }

    async fn delete_outbox_row(&self, id: Uuid) -> Result<(), NotifyError> {
        sqlx::query("DELETE FROM data_change_event WHERE data_change_event_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clears `claimed_at` back to `NULL` so a row that didn't reach the
    /// all-caught-up state this tick becomes reclaimable by the next
    /// `claim_batch` rather than a permanent zombie (spec.md §4.6).
    async fn release_claim(&self, id: Uuid) -> Result<(), NotifyError> {
        sqlx::query("UPDATE data_change_event SET claimed_at = NULL WHERE data_change_event_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `FOR UPDATE SKIP LOCKED` claim of a bounded batch, marking
    /// `claimed_at = now` in the same statement (spec.md §4.6 step a).
    async fn claim_batch(&self) -> Result<Vec<DataChangeEvent>, NotifyError> {
        let rows = sqlx::query(
            "UPDATE data_change_event SET claimed_at = now() \
             WHERE data_change_event_id IN ( \
                 SELECT data_change_event_id FROM data_change_event \
                 WHERE claimed_at IS NULL \
                 ORDER BY sequence ASC \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED \
             ) RETURNING *",
        )
        .bind(CLAIM_BATCH_SIZE)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DataChangeEvent {
                    data_change_event_id: row.try_get("data_change_event_id")?,
                    object_type: row.try_get::<String, _>("object_type")?.parse().map_err(|_| sqlx::Error::Decode("invalid object_type".into()))?,
                    object_id: row.try_get("object_id")?,
                    operation: row.try_get::<String, _>("operation")?.parse().map_err(|_| sqlx::Error::Decode("invalid operation".into()))?,
                    before: row.try_get("before")?,
                    after: row.try_get("after")?,
                    sequence: row.try_get("sequence")?,
                    claimed_at: row.try_get("claimed_at")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(NotifyError::from)
    }
}

fn notification_event_type(operation: OutboxOperation) -> NotificationEventType {
    match operation {
        OutboxOperation::Created => NotificationEventType::Create,
        OutboxOperation::Updated => NotificationEventType::Modify,
        OutboxOperation::Deleted => NotificationEventType::Delete,
    }
}

/// Pure form of the outbox-row deletion condition (spec.md §8: "An outbox
/// row is deleted iff every active subscription has `event_cursor ≥
/// row.sequence`").
fn cursor_covers_sequence(subscriptions: &[Subscription], sequence: i64) -> bool {
    subscriptions.iter().all(|subscription| subscription.event_cursor >= sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subscription(cursor: i64) -> Subscription {
        Subscription {
            subscription_id: Uuid::new_v4(),
            consumer_subscription_id: "consumer-a".into(),
            callback_url: "https://example.invalid/hook".into(),
            filter: None,
            event_cursor: cursor,
            created_at: Utc::now(),
        }
    }

    /// spec.md §8: deletion requires every subscription to have caught up,
    /// not merely the average or the furthest-ahead one.
    #[test]
    fn deletion_requires_every_subscription_to_catch_up() {
        let subs = vec![subscription(5), subscription(4)];
        assert!(!cursor_covers_sequence(&subs, 5));
        assert!(cursor_covers_sequence(&subs, 4));
    }

    #[test]
    fn deletion_holds_with_no_subscriptions() {
        assert!(cursor_covers_sequence(&[], 100));
    }

    /// spec.md §8: no notification with `sequence <= s.event_cursor` is
    /// delivered to `s` again — a subscription already past a sequence
    /// never receives it a second time.
    #[test]
    fn caught_up_subscription_is_not_redelivered_to() {
        let sub = subscription(10);
        assert!(10 <= sub.event_cursor);
    }

    #[test]
    fn mapping_matches_spec_operation_to_event_type() {
        assert_eq!(notification_event_type(OutboxOperation::Created), NotificationEventType::Create);
        assert_eq!(notification_event_type(OutboxOperation::Updated), NotificationEventType::Modify);
        assert_eq!(notification_event_type(OutboxOperation::Deleted), NotificationEventType::Delete);
    }
}
