//! The alarm dictionary synchronizer (C4, spec.md §4.4).
//!
//! Grounded on the teacher's `NexusReconciler` poller
//! (`control-plane/agents/core/src/core/reconciler/nexus/mod.rs`) for the
//! bounded-concurrency, deadline-wrapped reconcile shape, generalized from
//! per-nexus polling to per-node-cluster-type dictionary sync.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use o2ims_common::model::{AlarmDefinition, AlarmDictionary, NodeClusterType};
use o2ims_repository::PgRepository;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::cluster_client::ClusterClientResolver;
use crate::error::DictionaryError;
use crate::rule::{MonitoringRule, MonitoringRuleSource};

const SYNC_DEADLINE: Duration = Duration::from_secs(5 * 60);
const SYNC_CONCURRENCY: usize = 5;

pub struct DictionarySynchronizerRepositories {
    pub node_cluster_type: PgRepository<NodeClusterType>,
    pub alarm_dictionary: PgRepository<AlarmDictionary>,
    pub alarm_definition: PgRepository<AlarmDefinition>,
}

pub struct DictionarySynchronizer {
    repos: DictionarySynchronizerRepositories,
    rule_source: Arc<dyn MonitoringRuleSource>,
    cluster_client: Arc<dyn ClusterClientResolver>,
}

impl DictionarySynchronizer {
    pub fn new(
        repos: DictionarySynchronizerRepositories,
        rule_source: Arc<dyn MonitoringRuleSource>,
        cluster_client: Arc<dyn ClusterClientResolver>,
    ) -> Self {
        Self { repos, rule_source, cluster_client }
    }

    /// Runs at collector startup and after a successful collection pass
    /// (spec.md §4.4). Bounded by a 5-minute deadline and 5-way parallelism.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<(), DictionaryError> {
        tokio::time::timeout(SYNC_DEADLINE, self.sync_inner())
            .await
            .map_err(|_| DictionaryError::DeadlineExceeded)?
    }

    async fn sync_inner(&self) -> Result<(), DictionaryError> {
        let types = self.repos.node_cluster_type.find_all().await?;

        self.delete_orphan_dictionaries(&types).await?;

        let semaphore = Arc::new(Semaphore::new(SYNC_CONCURRENCY));
        let mut tasks = FuturesUnordered::new();
        for node_cluster_type in types {
            let semaphore = semaphore.clone();
            tasks.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                self.sync_one_type(&node_cluster_type).await
            });
        }

        while let Some(result) = tasks.next().await {
            if let Err(error) = result {
                // A single type's failure is logged and skipped, never
                // fails the whole run (spec.md §4.4 step 1).
                tracing::warn!(%error, "alarm dictionary sync failed for one node cluster type");
            }
        }
        Ok(())
    }

    /// DELETE dictionaries whose owning node-cluster-type is no longer
    /// present (spec.md §4.4: "Delete orphans: before per-type work").
    async fn delete_orphan_dictionaries(&self, types: &[NodeClusterType]) -> Result<(), DictionaryError> {
        let keep: Vec<Uuid> = types.iter().map(|t| t.node_cluster_type_id).collect();
        // There is no single "scope" column to delete within here — every
        // dictionary row is in scope, so we sweep the whole table.
        let all = self.repos.alarm_dictionary.find_all().await?;
        for dictionary in all {
            if !keep.contains(&dictionary.node_cluster_type_id) {
                tracing::info!(dictionary = %dictionary.alarm_dictionary_id, "deleting orphaned alarm dictionary");
                // `delete_not_in` needs a single scope value; an orphan
                // delete has none, so individual rows are targeted via a
                // 1-row generation-0 delete_not_in call scoped by the
                // dictionary's own node_cluster_type_id keeping nothing.
                self.repos
                    .alarm_dictionary
                    .delete_not_in("node_cluster_type_id", dictionary.node_cluster_type_id, &[])
                    .await?;
            }
        }
        Ok(())
    }

    async fn sync_one_type(&self, node_cluster_type: &NodeClusterType) -> Result<(), DictionaryError> {
        let (Some(vendor), Some(model), Some(version)) =
            (node_cluster_type.vendor(), node_cluster_type.model(), node_cluster_type.version())
        else {
            return Err(DictionaryError::MissingExtensions { id: node_cluster_type.node_cluster_type_id });
        };

        let client = if model == "hub-cluster" {
            self.cluster_client.hub_client().await?
        } else {
            self.cluster_client.managed_cluster_client(version).await?
        };

        let rules = self.rule_source.list_rules(&client).await?;
        let alerting_rules: Vec<MonitoringRule> = rules.into_iter().filter(|rule| rule.alert.is_some()).collect();
        let deduped = dedup_by_alert_and_severity(alerting_rules);

        let dictionary_id = self.upsert_dictionary(node_cluster_type, vendor).await?;
        self.upsert_definitions(dictionary_id, node_cluster_type, &deduped).await?;
        Ok(())
    }

    async fn upsert_dictionary(&self, node_cluster_type: &NodeClusterType, vendor: &str) -> Result<Uuid, DictionaryError> {
        let existing = self
            .repos
            .alarm_dictionary
            .search(|builder| {
                builder.push("node_cluster_type_id = ").push_bind(node_cluster_type.node_cluster_type_id);
            })
            .await?;

        let dictionary = AlarmDictionary {
            alarm_dictionary_id: existing.first().map(|row| row.alarm_dictionary_id).unwrap_or_else(Uuid::new_v4),
            alarm_dictionary_version: node_cluster_type.version().unwrap_or("unknown").to_string(),
            entity_type: "model-version".to_string(),
            vendor: vendor.to_string(),
            node_cluster_type_id: node_cluster_type.node_cluster_type_id,
            generation_id: existing.first().map(|row| row.generation_id + 1).unwrap_or(1),
        };

        let upserted = self.repos.alarm_dictionary.upsert(&[dictionary]).await?;
        let returned = upserted.len();
        upserted.into_iter().next().map(|row| row.alarm_dictionary_id).ok_or_else(|| DictionaryError::FatalInvariant {
            details: format!("upsert of exactly one alarm dictionary row returned {returned}"),
        })
    }

    async fn upsert_definitions(
        &self,
        dictionary_id: Uuid,
        node_cluster_type: &NodeClusterType,
        rules: &[MonitoringRule],
    ) -> Result<(), DictionaryError> {
        let mut rows = Vec::with_capacity(rules.len());
        for rule in rules {
            let severity = rule.severity().map(o2ims_common::model::PerceivedSeverity::from_label).unwrap_or(o2ims_common::model::PerceivedSeverity::Indeterminate);
            rows.push(AlarmDefinition {
                alarm_definition_id: Uuid::new_v4(),
                alarm_dictionary_id: dictionary_id,
                alarm_name: rule.alert.clone().expect("filtered to alerting rules only"),
                alarm_severity: severity as i16,
                alarm_description: rule.labels.get("description").cloned(),
                proposed_repair_action: rule.labels.get("runbook_url").cloned(),
                additional_fields: serde_json::json!({
                    "expr": rule.expr,
                    "for": rule.for_duration,
                    "keepFiringFor": rule.keep_firing_for,
                    "nodeClusterType": {
                        "name": node_cluster_type.name,
                        "vendor": node_cluster_type.vendor(),
                        "model": node_cluster_type.model(),
                        "version": node_cluster_type.version(),
                    },
                }),
            });
        }

        let upserted = self.repos.alarm_definition.upsert(&rows).await?;
        let keep: Vec<Uuid> = upserted.iter().map(|row| row.alarm_definition_id).collect();
        self.repos
            .alarm_definition
            .delete_not_in("alarm_dictionary_id", dictionary_id, &keep)
            .await?;
        Ok(())
    }
}

/// Deduplicate by `(alert_name, severity)`; first occurrence wins, warn on
/// dedup (spec.md §4.4 step 4, §8 boundary property).
fn dedup_by_alert_and_severity(rules: Vec<MonitoringRule>) -> Vec<MonitoringRule> {
    let mut seen: HashMap<(String, String), ()> = HashMap::new();
    let mut result = Vec::new();
    for rule in rules {
        let key = (rule.alert.clone().unwrap_or_default(), rule.severity().unwrap_or("unknown").to_string());
        if seen.insert(key.clone(), ()).is_some() {
            tracing::warn!(alert = %key.0, severity = %key.1, "duplicate monitoring rule, discarding");
            continue;
        }
        result.push(rule);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn rule(alert: &str, severity: &str) -> MonitoringRule {
        let mut labels = BTreeMap::new();
        labels.insert("severity".to_string(), severity.to_string());
        MonitoringRule {
            alert: Some(alert.to_string()),
            expr: "up == 0".to_string(),
            for_duration: None,
            keep_firing_for: None,
            labels,
        }
    }

    /// spec.md §8 boundary property: two dictionary rules with identical
    /// (alert, severity) produce one definition.
    #[test]
    fn dedup_keeps_first_occurrence() {
        let rules = vec![rule("NodeDown", "critical"), rule("NodeDown", "critical"), rule("NodeDown", "warning")];
        let deduped = dedup_by_alert_and_severity(rules);
        assert_eq!(deduped.len(), 2);
    }
}
