use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::Client::new`] (spec.md §4.1, expanded in
/// SPEC_FULL.md §4.1). `serde::Deserialize` so it can be embedded directly
/// in `o2ims-agent`'s CLI config loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(with = "humantime_serde", default = "default_retry_base_delay")]
    pub retry_base_delay: Duration,
    #[serde(default)]
    pub tls: TlsConfig,
    pub auth: Option<AuthConfig>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> Duration {
    Duration::from_millis(500)
}

/// TLS 1.2 minimum is enforced unconditionally by [`crate::Client::new`];
/// everything here is additive (spec.md §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
    pub ca_bundle: Option<String>,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// Either the OAuth2 client-credentials triple, or the Kubernetes
/// service-account triple (spec.md §4.1: "NewClient fails with ErrConfig
/// when required fields are missing").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthConfig {
    Oauth {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
    },
    ServiceAccount {
        namespace: String,
        account_name: String,
    },
}
