//! Bearer-token sources for [`crate::Client`] (spec.md §4.1). Both
//! implementations share the single-flight cache pattern from spec.md §9's
//! design note: a mutex guards `{token, expiry}`; a reader that finds a
//! valid token returns it immediately, the first reader that finds it
//! expired performs the refresh while the others wait on the same mutex
//! guard instead of racing the token endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use kube::api::{Api, PostParams};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use tokio::sync::Mutex;

use crate::error::TransportError;

/// K8s `TokenRequest` tokens are minted with a 24h expiry; refreshed 5
/// minutes before that to absorb clock skew and in-flight requests
/// (spec.md §4.1).
const SERVICE_ACCOUNT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const SAFETY_MARGIN: Duration = Duration::from_secs(5 * 60);

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, TransportError>;
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// OAuth2 client-credentials grant (spec.md §4.1 (i)), via the `oauth2`
/// crate's `BasicClient`, matching the grant-type usage already present
/// elsewhere in the wider example pack.
pub struct OauthTokenSource {
    client: BasicClient,
    scopes: Vec<Scope>,
    cached: Mutex<Option<CachedToken>>,
}

impl OauthTokenSource {
    pub fn new(
        token_url: String,
        client_id: String,
        client_secret: String,
        scopes: Vec<String>,
    ) -> Result<Self, TransportError> {
        let client = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            AuthUrl::new(token_url.clone()).map_err(|error| TransportError::Config {
                details: format!("invalid token_url: {error}"),
            })?,
            Some(TokenUrl::new(token_url).map_err(|error| TransportError::Config {
                details: format!("invalid token_url: {error}"),
            })?),
        );
        Ok(Self {
            client,
            scopes: scopes.into_iter().map(Scope::new).collect(),
            cached: Mutex::new(None),
        })
    }
}

#[async_trait]
impl TokenSource for OauthTokenSource {
    async fn token(&self) -> Result<String, TransportError> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let mut request = self.client.exchange_client_credentials();
        for scope in &self.scopes {
            request = request.add_scope(scope.clone());
        }
        let response = request
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|error| TransportError::Auth { details: error.to_string() })?;

        let ttl = response
            .expires_in()
            .unwrap_or(Duration::from_secs(3600))
            .saturating_sub(SAFETY_MARGIN);
        let token = response.access_token().secret().clone();
        *guard = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(token)
    }
}

/// Kubernetes service-account `TokenRequest` flow (spec.md §4.1 (ii)).
pub struct ServiceAccountTokenSource {
    namespace: String,
    account_name: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(namespace: String, account_name: String) -> Self {
        Self {
            namespace,
            account_name,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn token(&self) -> Result<String, TransportError> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let client = kube::Client::try_default()
            .await
            .map_err(|error| TransportError::Auth { details: format!("kube client: {error}") })?;
        let api: Api<k8s_openapi::api::core::v1::ServiceAccount> =
            Api::namespaced(client, &self.namespace);

        let request = TokenRequest {
            spec: TokenRequestSpec {
                expiration_seconds: Some(SERVICE_ACCOUNT_TOKEN_TTL.as_secs() as i64),
                ..Default::default()
            },
            ..Default::default()
        };
        let body = serde_json::to_vec(&request)
            .map_err(|error| TransportError::Auth { details: format!("TokenRequest body: {error}") })?;
        let token_request: TokenRequest = api
            .create_subresource("token", &self.account_name, &PostParams::default(), body)
            .await
            .map_err(|error| TransportError::Auth { details: format!("TokenRequest: {error}") })?;
        let status = token_request
            .status
            .ok_or_else(|| TransportError::Auth { details: "TokenRequest response missing status".into() })?;

        *guard = Some(CachedToken {
            token: status.token.clone(),
            expires_at: Instant::now() + SERVICE_ACCOUNT_TOKEN_TTL.saturating_sub(SAFETY_MARGIN),
        });
        Ok(status.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oauth_source_caches_until_expiry() {
        let source = OauthTokenSource::new(
            "https://example.invalid/token".into(),
            "client".into(),
            "secret".into(),
            vec!["scope-a".into()],
        )
        .expect("valid config");
        assert!(source.cached.lock().await.is_none());
    }
}
