//! Resolves a `kube::Client` for the cluster a node-cluster-type's
//! monitoring rules should be read from (spec.md §4.4 step 2).

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::config::Kubeconfig;

use crate::error::DictionaryError;

#[async_trait]
pub trait ClusterClientResolver: Send + Sync {
    /// `model = "hub-cluster"`: the hub's own API (spec.md §4.4 step 2).
    async fn hub_client(&self) -> Result<kube::Client, DictionaryError>;

    /// `model = "managed-cluster"`: a client for the single managed cluster
    /// whose `openshiftVersion` label equals `version` and
    /// `local-cluster != true` (spec.md §4.4 step 2). More than one match
    /// is a `FatalInvariantError` ("expected 1 record, got N"); zero
    /// matches is also fatal for this type's sync pass.
    async fn managed_cluster_client(&self, version: &str) -> Result<kube::Client, DictionaryError>;
}

/// Looks up the target `ManagedCluster` by label, then builds a client from
/// the `<cluster-name>-admin-kubeconfig` secret in the `<cluster-name>`
/// namespace — the common convention for reaching a managed cluster's API
/// from a hub (no concrete upstream system is assumed here).
pub struct KubeClusterClientResolver {
    hub: kube::Client,
}

impl KubeClusterClientResolver {
    pub fn new(hub: kube::Client) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ClusterClientResolver for KubeClusterClientResolver {
    async fn hub_client(&self) -> Result<kube::Client, DictionaryError> {
        Ok(self.hub.clone())
    }

    async fn managed_cluster_client(&self, version: &str) -> Result<kube::Client, DictionaryError> {
        let clusters: Api<crate::cluster_ref::ManagedClusterRef> = Api::all(self.hub.clone());
        let candidates = clusters
            .list(&ListParams::default().labels(&format!("openshiftVersion={version}")))
            .await
            .map_err(|error| DictionaryError::RuleSource { details: error.to_string() })?;

        let mut matches: Vec<_> = candidates
            .items
            .into_iter()
            .filter(|cluster| {
                cluster
                    .metadata
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get("local-cluster"))
                    .map(|value| value != "true")
                    .unwrap_or(true)
            })
            .collect();

        if matches.len() != 1 {
            return Err(DictionaryError::FatalInvariant {
                details: format!("expected 1 managed cluster for version {version}, got {}", matches.len()),
            });
        }
        let cluster = matches.remove(0);
        let name = cluster.metadata.name.unwrap_or_default();

        let secrets: Api<Secret> = Api::namespaced(self.hub.clone(), &name);
        let secret = secrets
            .get(&format!("{name}-admin-kubeconfig"))
            .await
            .map_err(|error| DictionaryError::RuleSource { details: error.to_string() })?;
        let kubeconfig_bytes = secret
            .data
            .and_then(|mut data| data.remove("kubeconfig"))
            .ok_or_else(|| DictionaryError::RuleSource { details: format!("{name}-admin-kubeconfig missing kubeconfig key") })?;

        let kubeconfig: Kubeconfig = serde_yaml::from_slice(&kubeconfig_bytes.0)
            .map_err(|error| DictionaryError::RuleSource { details: format!("invalid kubeconfig: {error}") })?;
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &Default::default())
            .await
            .map_err(|error| DictionaryError::RuleSource { details: error.to_string() })?;
        kube::Client::try_from(config).map_err(|error| DictionaryError::RuleSource { details: error.to_string() })
    }
}
