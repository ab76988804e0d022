//! Bearer token acquisition via the OAuth client-credentials grant.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::config::Credentials;
use crate::error::{Result, WclError};

/// Something that can mint a fresh access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
  async fn fetch_token(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: Option<String>,
}

/// Client-credentials exchange against the upstream OAuth endpoint.
pub struct OAuthTokenSource {
  http: reqwest::Client,
  token_url: Url,
  credentials: Credentials,
}

impl OAuthTokenSource {
  pub fn new(http: reqwest::Client, token_url: Url, credentials: Credentials) -> Self {
    Self {
      http,
      token_url,
      credentials,
    }
  }
}

#[async_trait]
impl TokenSource for OAuthTokenSource {
  async fn fetch_token(&self) -> Result<String> {
    tracing::debug!(url = %self.token_url, "Requesting access token");

    let response = self
      .http
      .post(self.token_url.clone())
      .header(ACCEPT, "application/json")
      .basic_auth(
        &self.credentials.client_id,
        Some(&self.credentials.client_secret),
      )
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await
      .map_err(|e| WclError::Auth(format!("Token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(WclError::Auth(format!(
        "Token endpoint returned HTTP {}: {}",
        status, body
      )));
    }

    let body: TokenResponse = response
      .json()
      .await
      .map_err(|e| WclError::Auth(format!("Failed to parse token response: {}", e)))?;

    body
      .access_token
      .filter(|t| !t.is_empty())
      .ok_or_else(|| WclError::Auth("Token response did not contain an access_token".to_string()))
  }
}

/// Holds the current access token and refreshes it on demand.
///
/// The held token is never checked for expiry; callers force a refresh when
/// the upstream rejects a request. Concurrent refreshes are allowed and the
/// last one to finish wins.
pub struct TokenProvider {
  source: Arc<dyn TokenSource>,
  token: RwLock<Option<String>>,
}

impl TokenProvider {
  pub fn new(source: Arc<dyn TokenSource>) -> Self {
    Self {
      source,
      token: RwLock::new(None),
    }
  }

  /// Return the held token, or fetch a new one when `force` is set or none is held.
  pub async fn get_token(&self, force: bool) -> Result<String> {
    if !force {
      if let Some(token) = self.token.read().await.as_ref() {
        return Ok(token.clone());
      }
    }

    let token = self.source.fetch_token().await?;
    *self.token.write().await = Some(token.clone());
    tracing::info!(forced = force, "Obtained upstream access token");

    Ok(token)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::wcl::testing::CountingTokens;
  use wiremock::matchers::{body_string_contains, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn credentials() -> Credentials {
    Credentials {
      client_id: "id".to_string(),
      client_secret: "secret".to_string(),
    }
  }

  async fn oauth_source(server: &MockServer) -> OAuthTokenSource {
    let url = Url::parse(&format!("{}/oauth/token", server.uri())).unwrap();
    OAuthTokenSource::new(reqwest::Client::new(), url, credentials())
  }

  #[tokio::test]
  async fn test_held_token_is_reused() {
    let source = Arc::new(CountingTokens::new());
    let provider = TokenProvider::new(source.clone());

    assert_eq!(provider.get_token(false).await.unwrap(), "token-1");
    assert_eq!(provider.get_token(false).await.unwrap(), "token-1");
    assert_eq!(source.fetches(), 1);
  }

  #[tokio::test]
  async fn test_forced_refresh_replaces_token() {
    let source = Arc::new(CountingTokens::new());
    let provider = TokenProvider::new(source.clone());

    provider.get_token(false).await.unwrap();
    assert_eq!(provider.get_token(true).await.unwrap(), "token-2");
    assert_eq!(provider.get_token(false).await.unwrap(), "token-2");
    assert_eq!(source.fetches(), 2);
  }

  #[tokio::test]
  async fn test_source_failure_is_auth_error() {
    let provider = TokenProvider::new(Arc::new(CountingTokens::failing()));
    let err = provider.get_token(false).await.unwrap_err();
    assert!(matches!(err, WclError::Auth(_)));
  }

  #[tokio::test]
  async fn test_client_credentials_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .and(header("authorization", "Basic aWQ6c2VjcmV0"))
      .and(header("accept", "application/json"))
      .and(body_string_contains("grant_type=client_credentials"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({"access_token": "abc", "token_type": "Bearer"})),
      )
      .expect(1)
      .mount(&server)
      .await;

    let token = oauth_source(&server).await.fetch_token().await.unwrap();
    assert_eq!(token, "abc");
  }

  #[tokio::test]
  async fn test_missing_access_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
      .mount(&server)
      .await;

    let err = oauth_source(&server).await.fetch_token().await.unwrap_err();
    assert!(matches!(err, WclError::Auth(_)));
  }

  #[tokio::test]
  async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/oauth/token"))
      .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
      .mount(&server)
      .await;

    let err = oauth_source(&server).await.fetch_token().await.unwrap_err();
    assert!(err.to_string().contains("401"));
  }
}
