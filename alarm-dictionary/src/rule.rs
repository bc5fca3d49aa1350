//! Monitoring rules (spec.md §4.4). Modeled on a `PrometheusRule` CRD,
//! grounded on the teacher's `k8s/operators/src/diskpool/main.rs` — the
//! same `kube::Api<T>` + `CustomResourceExt` pattern, pointed at
//! `monitoring.coreos.com/v1` instead of the teacher's disk-pool CRD group.

use async_trait::async_trait;
use kube::{Api, CustomResource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DictionaryError;

/// One Prometheus alerting or recording rule, resolved into the shape
/// spec.md §4.4 needs: alerting rules declare `alert`, recording rules
/// declare `record` instead — only the former survive step 3's filter.
#[derive(Debug, Clone)]
pub struct MonitoringRule {
    pub alert: Option<String>,
    pub expr: String,
    pub for_duration: Option<String>,
    pub keep_firing_for: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl MonitoringRule {
    pub fn severity(&self) -> Option<&str> {
        self.labels.get("severity").map(String::as_str)
    }
}

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "monitoring.coreos.com", version = "v1", kind = "PrometheusRule", namespaced = true)]
pub struct PrometheusRuleSpec {
    pub groups: Vec<PrometheusRuleGroup>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
pub struct PrometheusRuleGroup {
    pub name: String,
    pub rules: Vec<PrometheusRuleEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
pub struct PrometheusRuleEntry {
    pub alert: Option<String>,
    pub record: Option<String>,
    pub expr: String,
    #[serde(rename = "for")]
    pub for_duration: Option<String>,
    pub keep_firing_for: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Resolves monitoring rules for one cluster (spec.md §4.4 step 2).
#[async_trait]
pub trait MonitoringRuleSource: Send + Sync {
    async fn list_rules(&self, client: &kube::Client) -> Result<Vec<MonitoringRule>, DictionaryError>;
}

/// Lists every `PrometheusRule` object in the target cluster and flattens
/// their rule groups.
pub struct PrometheusRuleSource;

#[async_trait]
impl MonitoringRuleSource for PrometheusRuleSource {
    async fn list_rules(&self, client: &kube::Client) -> Result<Vec<MonitoringRule>, DictionaryError> {
        let api: Api<PrometheusRule> = Api::all(client.clone());
        let objects = api
            .list(&Default::default())
            .await
            .map_err(|error| DictionaryError::RuleSource { details: error.to_string() })?;

        Ok(objects
            .items
            .into_iter()
            .flat_map(|object| object.spec.groups)
            .flat_map(|group| group.rules)
            .map(|entry| MonitoringRule {
                alert: entry.alert,
                expr: entry.expr,
                for_duration: entry.for_duration,
                keep_firing_for: entry.keep_firing_for,
                labels: entry.labels,
            })
            .collect())
    }
}
