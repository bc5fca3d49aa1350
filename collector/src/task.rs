//! The per-source reconcile loop (spec.md §4.3 steps 1–5).
//!
//! Grounded on the teacher's `NexusReconciler`/`TaskPoller`
//! (`control-plane/agents/core/src/core/reconciler/nexus/mod.rs`): a
//! `#[tracing::instrument]`-annotated reconcile function run on an interval,
//! generalized from a per-nexus state machine to a per-data-source
//! generation sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use o2ims_common::model::{DataChangeEvent, DataSource as DataSourceRow, NodeClusterType, ObjectType, OutboxOperation, Resource, ResourcePool};
use o2ims_repository::{PgRepository, RepositoryError};
use shutdown::Shutdown;
use sqlx::postgres::Postgres;
use sqlx::Transaction;
use uuid::Uuid;

use crate::error::CollectorError;
use crate::source::DataSource;

/// Repositories needed by one collection run. Bundled together rather than
/// passed individually, matching the teacher's `Registry`-style grouping of
/// store handles in `control-plane/agents/core/src/server.rs`.
#[derive(Clone)]
pub struct CollectorRepositories {
    pub data_source: PgRepository<DataSourceRow>,
    pub resource_pool: PgRepository<ResourcePool>,
    pub resource: PgRepository<Resource>,
    pub node_cluster_type: PgRepository<NodeClusterType>,
    pub outbox: PgRepository<DataChangeEvent>,
}

/// Drives one upstream [`DataSource`] through the periodic reconciliation
/// loop of spec.md §4.3.
pub struct CollectorTask {
    source: Arc<dyn DataSource>,
    repos: CollectorRepositories,
    poll_interval: Duration,
}

impl CollectorTask {
    pub fn new(source: Arc<dyn DataSource>, repos: CollectorRepositories, poll_interval: Duration) -> Self {
        Self { source, repos, poll_interval }
    }

    /// Runs until `shutdown` is cancelled (spec.md §4.3: "exposes `Run(ctx)`
    /// that terminates cleanly on cancellation").
    pub async fn run(&self, shutdown: Shutdown) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.collect_once(&shutdown).await {
                        tracing::warn!(source = %self.source.id(), %error, "collection run failed, retrying next tick");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!(source = %self.source.id(), "collector task shutting down");
                    return;
                }
            }
        }
    }

    /// One pass of spec.md §4.3's five-step algorithm. Steps 3-5 (upsert,
    /// stale-row sweep, outbox write, generation advance) run inside a
    /// single transaction: any failure rolls the whole pass back and leaves
    /// the generation counter unadvanced, so the next tick retries cleanly.
    #[tracing::instrument(skip(self, shutdown), fields(source = %self.source.id()))]
    pub async fn collect_once(&self, shutdown: &Shutdown) -> Result<(), CollectorError> {
        let source_id = self.source.id();
        let row = self.repos.data_source.get(source_id).await?;
        let next_gen = row.current_generation + 1;

        let pools = self.source.list_resource_pools(shutdown).await?;
        let resources = self.source.list_resources(shutdown).await?;
        let cluster_types = self.source.list_node_cluster_types(shutdown).await?;

        self.repos
            .data_source
            .with_transaction(move |tx| {
                Box::pin(async move {
                    self.reconcile_pools_in_tx(tx, source_id, next_gen, pools).await?;
                    self.reconcile_resources_in_tx(tx, source_id, next_gen, resources).await?;
                    self.reconcile_cluster_types_in_tx(tx, cluster_types).await?;

                    let mut advanced = row;
                    advanced.current_generation = next_gen;
                    self.repos.data_source.update_in_tx(tx, source_id, &advanced).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn reconcile_pools_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source_id: Uuid,
        next_gen: i64,
        fetched: Vec<crate::source::FetchedResourcePool>,
    ) -> Result<(), RepositoryError> {
        let rows: Vec<ResourcePool> = fetched
            .into_iter()
            .map(|pool| ResourcePool {
                resource_pool_id: Uuid::new_v4(),
                name: pool.name,
                description: pool.description,
                o_cloud_site_id: None,
                extensions: pool.extensions,
                data_source_id: source_id,
                generation_id: next_gen,
                external_id: pool.external_id,
                created_at: Utc::now(),
            })
            .collect();

        let upserted = self.repos.resource_pool.upsert_in_tx(tx, &rows).await?;
        let keep: Vec<Uuid> = upserted.iter().map(|row| row.resource_pool_id).collect();
        self.write_outbox_for_in_tx(tx, &upserted, ObjectType::ResourcePool, OutboxOperation::Updated).await?;

        let deleted = self
            .repos
            .resource_pool
            .delete_not_in_in_tx(tx, "data_source_id", source_id, &keep)
            .await?;
        if deleted > 0 {
            tracing::info!(deleted, "swept stale resource pools");
        }
        Ok(())
    }

    async fn reconcile_resources_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source_id: Uuid,
        next_gen: i64,
        fetched: Vec<crate::source::FetchedResource>,
    ) -> Result<(), RepositoryError> {
        // Pool external IDs must already have been upserted this run;
        // resources without a resolvable pool are logged and skipped
        // (spec.md §7: InputError → "skip and log"). Read within the same
        // transaction so the just-upserted, not-yet-committed pools are
        // visible here.
        let pools = self.repos.resource_pool.find_all_in_tx(tx).await?;
        let rows: Vec<Resource> = fetched
            .into_iter()
            .filter_map(|resource| {
                let pool = pools.iter().find(|pool| pool.external_id == resource.pool_external_id)?;
                Some(Resource {
                    resource_id: Uuid::new_v4(),
                    resource_type_id: resource.resource_type_id,
                    resource_pool_id: pool.resource_pool_id,
                    description: resource.description,
                    extensions: resource.extensions,
                    data_source_id: source_id,
                    generation_id: next_gen,
                    external_id: resource.external_id,
                    created_at: Utc::now(),
                })
            })
            .collect();

        let upserted = self.repos.resource.upsert_in_tx(tx, &rows).await?;
        let keep: Vec<Uuid> = upserted.iter().map(|row| row.resource_id).collect();
        self.write_outbox_for_in_tx(tx, &upserted, ObjectType::Resource, OutboxOperation::Updated).await?;

        self.repos.resource.delete_not_in_in_tx(tx, "data_source_id", source_id, &keep).await?;
        Ok(())
    }

    /// Node cluster types carry no generation stamp of their own
    /// (spec.md §3) — upserted by name, never swept.
    async fn reconcile_cluster_types_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fetched: Vec<crate::source::FetchedNodeClusterType>,
    ) -> Result<(), RepositoryError> {
        for entry in fetched {
            let existing = self
                .repos
                .node_cluster_type
                .search_in_tx(tx, |builder| {
                    builder.push("name = ").push_bind(entry.name.clone());
                })
                .await?;

            let row = NodeClusterType {
                node_cluster_type_id: existing.first().map(|row| row.node_cluster_type_id).unwrap_or_else(Uuid::new_v4),
                name: entry.name,
                extensions: serde_json::json!({
                    "vendor": entry.vendor,
                    "model": entry.model,
                    "version": entry.version,
                }),
            };
            if let Some(existing_row) = existing.first() {
                self.repos.node_cluster_type.update_in_tx(tx, existing_row.node_cluster_type_id, &row).await?;
            } else {
                self.repos.node_cluster_type.create_in_tx(tx, &row).await?;
            }
        }
        Ok(())
    }

    async fn write_outbox_for_in_tx<T>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rows: &[T],
        object_type: ObjectType,
        operation: OutboxOperation,
    ) -> Result<(), RepositoryError>
    where
        T: HasId,
    {
        for row in rows {
            let event = DataChangeEvent {
                data_change_event_id: Uuid::new_v4(),
                object_type,
                object_id: row.id(),
                operation,
                before: None,
                after: None,
                sequence: 0,
                claimed_at: None,
                created_at: Utc::now(),
            };
            self.repos.outbox.create_in_tx(tx, &event).await?;
        }
        Ok(())
    }
}

trait HasId {
    fn id(&self) -> Uuid;
}

impl HasId for ResourcePool {
    fn id(&self) -> Uuid {
        self.resource_pool_id
    }
}

impl HasId for Resource {
    fn id(&self) -> Uuid {
        self.resource_id
    }
}
