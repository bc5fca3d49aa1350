//! HTTP client layer (C1): TLS config, bearer-token injection via OAuth2
//! client-credentials or a Kubernetes service-account `TokenRequest`, and
//! exponential-backoff retry on transient failures (spec.md §4.1).
//!
//! Grounded on the teacher's `LokiClient`
//! (`k8s/supportability/src/collect/logs/loki.rs`): a thin `reqwest::Client`
//! wrapper that builds requests against a configured base URL and polls over
//! HTTP, generalized here to add auth and retry.

mod auth;
mod config;
mod error;
mod retry;

pub use auth::{OauthTokenSource, ServiceAccountTokenSource, TokenSource};
pub use config::{AuthConfig, ClientConfig, TlsConfig};
pub use error::TransportError;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A configured request performer carrying an up-to-date bearer token and a
/// retry budget (spec.md §4.1).
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    server_url: reqwest::Url,
    auth: Option<Arc<dyn TokenSource>>,
    max_retries: u32,
    retry_base_delay: std::time::Duration,
}

impl Client {
    /// Build a client from `config`, failing with `TransportError::Config`
    /// when required fields are missing (spec.md §4.1).
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let server_url = config.server_url.parse::<reqwest::Url>().map_err(|error| {
            TransportError::Config {
                details: format!("invalid server_url: {error}"),
            }
        })?;

        let mut builder = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(config.timeout);

        if config.tls.insecure_skip_verify {
            tracing::warn!("TLS certificate verification disabled (insecure_skip_verify)");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ca) = &config.tls.ca_bundle {
            let cert = reqwest::Certificate::from_pem(ca.as_bytes())
                .map_err(|error| TransportError::Config { details: format!("invalid ca_bundle: {error}") })?;
            builder = builder.add_root_certificate(cert);
        }
        if let (Some(cert), Some(key)) = (&config.tls.client_cert, &config.tls.client_key) {
            let mut pem = cert.clone().into_bytes();
            pem.extend_from_slice(key.as_bytes());
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|error| TransportError::Config { details: format!("invalid client cert/key: {error}") })?;
            builder = builder.identity(identity);
        }

        let http = builder.build().map_err(|error| TransportError::Config {
            details: format!("failed to build HTTP client: {error}"),
        })?;

        let auth: Option<Arc<dyn TokenSource>> = match config.auth {
            Some(AuthConfig::Oauth { token_url, client_id, client_secret, scopes }) => {
                Some(Arc::new(OauthTokenSource::new(token_url, client_id, client_secret, scopes)?))
            }
            Some(AuthConfig::ServiceAccount { namespace, account_name }) => {
                Some(Arc::new(ServiceAccountTokenSource::new(namespace, account_name)))
            }
            None => None,
        };

        Ok(Self {
            http,
            server_url,
            auth,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Perform `request` relative to the configured server URL, injecting
    /// the current bearer token and retrying transient failures per
    /// spec.md §4.1. `cancel` aborts an in-progress retry sleep.
    #[instrument(skip(self, build_request, cancel), fields(path = %path, method = %method))]
    pub async fn do_request<F>(
        &self,
        method: reqwest::Method,
        path: &str,
        cancel: &CancellationToken,
        build_request: F,
    ) -> Result<reqwest::Response, TransportError>
    where
        F: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let url = self
            .server_url
            .join(path)
            .map_err(|error| TransportError::Config { details: format!("invalid path {path}: {error}") })?;

        retry::with_retry(self.max_retries, self.retry_base_delay, cancel, || async {
            let mut builder = self.http.request(method.clone(), url.clone());
            builder = build_request(builder);
            if let Some(auth) = &self.auth {
                let token = auth.token().await?;
                builder = builder.bearer_auth(token);
            }
            builder.send().await.map_err(TransportError::from)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(server_url: String) -> ClientConfig {
        ClientConfig {
            server_url,
            timeout: std::time::Duration::from_secs(5),
            max_retries: 2,
            retry_base_delay: std::time::Duration::from_millis(1),
            tls: TlsConfig::default(),
            auth: None,
        }
    }

    /// spec.md §8 boundary property: when the server returns 503 exactly
    /// N+1 times, the caller observes the final 503, not a retried 200.
    #[tokio::test]
    async fn retry_boundary_returns_final_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = Client::new(test_config(server.url())).expect("valid config");
        let cancel = CancellationToken::new();
        let response = client
            .do_request(reqwest::Method::GET, "/probe", &cancel, |b| b)
            .await
            .expect("final response returned, not an error");

        assert_eq!(response.status(), 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn success_short_circuits_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(test_config(server.url())).expect("valid config");
        let cancel = CancellationToken::new();
        let response = client
            .do_request(reqwest::Method::GET, "/probe", &cancel, |b| b)
            .await
            .expect("success response");

        assert_eq!(response.status(), 200);
        mock.assert_async().await;
    }
}
