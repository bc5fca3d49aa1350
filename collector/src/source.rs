//! Upstream data sources for the collector (spec.md §4.3: "each data source
//! exposes a stable external ID per object; listing endpoints for pools,
//! resources, clusters, cluster-types"). The spec names no concrete
//! upstream system, so we supply a Kubernetes/ACM-backed implementation as a
//! design choice (SPEC_FULL.md §4.3); additional sources plug in by
//! implementing [`DataSource`] — the "tagged variants for data-source
//! kinds" principle of spec.md §9 applied one level up.

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Api, CustomResource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::CollectorError;
use shutdown::Shutdown;

/// A resource pool as reported by a data source, before the collector
/// stamps `data_source_id`/`generation_id` on it.
#[derive(Debug, Clone)]
pub struct FetchedResourcePool {
    pub external_id: String,
    pub name: String,
    pub description: Option<String>,
    pub extensions: Json,
}

#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub external_id: String,
    pub resource_type_id: uuid::Uuid,
    pub pool_external_id: String,
    pub description: Option<String>,
    pub extensions: Json,
}

#[derive(Debug, Clone)]
pub struct FetchedNodeClusterType {
    pub name: String,
    pub vendor: String,
    pub model: String,
    pub version: String,
}

/// One upstream inventory source, abstracted over C1 (spec.md §4.3).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// A stable identifier for this source's row in the `data_source`
    /// table (spec.md §4.3).
    fn id(&self) -> uuid::Uuid;

    async fn list_resource_pools(&self, cancel: &Shutdown) -> Result<Vec<FetchedResourcePool>, CollectorError>;
    async fn list_resources(&self, cancel: &Shutdown) -> Result<Vec<FetchedResource>, CollectorError>;
    async fn list_node_cluster_types(&self, cancel: &Shutdown) -> Result<Vec<FetchedNodeClusterType>, CollectorError>;
}

/// `open-cluster-management.io` `ManagedCluster`, listed via `kube` exactly
/// as the teacher's `k8s/operators/src/diskpool/main.rs` defines and reads
/// a CRD via `kube::Api` + `CustomResourceExt` — reused here for cluster
/// discovery instead of disk-pool reconciliation.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "cluster.open-cluster-management.io",
    version = "v1",
    kind = "ManagedCluster",
    namespaced = false
)]
pub struct ManagedClusterSpec {
    pub hub_accepts_client: bool,
}

pub struct KubernetesInventorySource {
    id: uuid::Uuid,
    client: kube::Client,
}

impl KubernetesInventorySource {
    pub fn new(id: uuid::Uuid, client: kube::Client) -> Self {
        Self { id, client }
    }

    fn label(meta: &ObjectMeta, key: &str) -> Option<String> {
        meta.labels.as_ref()?.get(key).cloned()
    }
}

#[async_trait]
impl DataSource for KubernetesInventorySource {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    #[tracing::instrument(skip(self, _cancel))]
    async fn list_resource_pools(&self, _cancel: &Shutdown) -> Result<Vec<FetchedResourcePool>, CollectorError> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        let clusters = api.list(&Default::default()).await.map_err(|error| CollectorError::Input {
            details: format!("listing ManagedCluster: {error}"),
        })?;

        Ok(clusters
            .items
            .into_iter()
            .map(|cluster| {
                let name = cluster.metadata.name.clone().unwrap_or_default();
                FetchedResourcePool {
                    external_id: name.clone(),
                    name,
                    description: None,
                    extensions: serde_json::json!({
                        "globalLocationId": Self::label(&cluster.metadata, "globalLocationId"),
                    }),
                }
            })
            .collect())
    }

    #[tracing::instrument(skip(self, _cancel))]
    async fn list_resources(&self, _cancel: &Shutdown) -> Result<Vec<FetchedResource>, CollectorError> {
        // The spec names no concrete node-level inventory endpoint for this
        // source; node-level resources are populated by a future `DataSource`
        // implementation (e.g. a hardware-management API). Nothing to
        // report for the Kubernetes/ACM source itself.
        Ok(Vec::new())
    }

    #[tracing::instrument(skip(self, _cancel))]
    async fn list_node_cluster_types(&self, _cancel: &Shutdown) -> Result<Vec<FetchedNodeClusterType>, CollectorError> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        let clusters = api.list(&Default::default()).await.map_err(|error| CollectorError::Input {
            details: format!("listing ManagedCluster: {error}"),
        })?;

        let mut types = Vec::new();
        for cluster in clusters.items {
            let is_local = Self::label(&cluster.metadata, "local-cluster").as_deref() == Some("true");
            let model = if is_local { "hub-cluster" } else { "managed-cluster" };
            let Some(version) = Self::label(&cluster.metadata, "openshiftVersion") else {
                tracing::warn!(cluster = ?cluster.metadata.name, "missing openshiftVersion label, skipping");
                continue;
            };
            let Some(vendor) = Self::label(&cluster.metadata, "vendor") else {
                tracing::warn!(cluster = ?cluster.metadata.name, "missing vendor label, skipping");
                continue;
            };
            types.push(FetchedNodeClusterType {
                name: format!("{model}-{version}"),
                vendor,
                model: model.to_string(),
                version,
            });
        }
        Ok(types)
    }
}
