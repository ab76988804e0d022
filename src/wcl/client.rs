use async_trait::async_trait;
use color_eyre::eyre::eyre;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::{Config, Credentials};
use crate::error::{Result, WclError};
use crate::wcl::api_types::GraphqlResponse;
use crate::wcl::token::{OAuthTokenSource, TokenProvider};

/// Body of a GraphQL POST
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
  pub query: String,
  pub variables: Value,
}

impl GraphqlRequest {
  pub fn new<V: Serialize + ?Sized>(document: &str, variables: &V) -> Result<Self> {
    Ok(Self {
      query: document.to_string(),
      variables: serde_json::to_value(variables)?,
    })
  }
}

/// Sends one authenticated GraphQL request and returns its `data`.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
  async fn execute(&self, token: &str, request: &GraphqlRequest) -> Result<Value>;
}

/// GraphQL over HTTPS with a bearer token.
pub struct HttpTransport {
  http: reqwest::Client,
  endpoint: Url,
}

impl HttpTransport {
  pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
    Self { http, endpoint }
  }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
  async fn execute(&self, token: &str, request: &GraphqlRequest) -> Result<Value> {
    let response = self
      .http
      .post(self.endpoint.clone())
      .bearer_auth(token)
      .json(request)
      .send()
      .await
      .map_err(|e| WclError::Upstream(format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(WclError::Upstream(format!("HTTP {}: {}", status, body)));
    }

    let envelope: GraphqlResponse = response
      .json()
      .await
      .map_err(|e| WclError::Upstream(format!("Invalid GraphQL response: {}", e)))?;

    envelope.into_data()
  }
}

/// WCL GraphQL client with one re-authenticating retry
#[derive(Clone)]
pub struct WclClient {
  tokens: Arc<TokenProvider>,
  transport: Arc<dyn GraphqlTransport>,
}

impl WclClient {
  pub fn new(tokens: Arc<TokenProvider>, transport: Arc<dyn GraphqlTransport>) -> Self {
    Self { tokens, transport }
  }

  /// Build a client talking to the real upstream endpoints.
  pub fn from_config(config: &Config, credentials: Credentials) -> color_eyre::Result<Self> {
    // gzip/deflate features make reqwest send Accept-Encoding and decode for us
    let http = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let source = OAuthTokenSource::new(http.clone(), config.wcl.token_url()?, credentials);
    let transport = HttpTransport::new(http, config.wcl.api_url()?);

    Ok(Self::new(
      Arc::new(TokenProvider::new(Arc::new(source))),
      Arc::new(transport),
    ))
  }

  /// Run a query and return its raw `data` object.
  ///
  /// A failed first attempt forces a token refresh and is retried exactly
  /// once with the same request body. The second failure is returned as is.
  pub async fn query<V: Serialize + ?Sized>(&self, document: &str, variables: &V) -> Result<Value> {
    let request = GraphqlRequest::new(document, variables)?;
    let token = self.tokens.get_token(false).await?;

    match self.transport.execute(&token, &request).await {
      Ok(data) => Ok(data),
      Err(first) => {
        tracing::warn!(error = %first, "Upstream query failed, re-authenticating and retrying once");

        let token = self.tokens.get_token(true).await?;
        self.transport.execute(&token, &request).await.map_err(|e| {
          tracing::error!(error = %e, "Upstream query failed after retry");
          e
        })
      }
    }
  }

  /// Run a query and deserialize its `data` into `T`.
  pub async fn query_as<T, V>(&self, document: &str, variables: &V) -> Result<T>
  where
    T: DeserializeOwned,
    V: Serialize + ?Sized,
  {
    let data = self.query(document, variables).await?;
    Ok(serde_json::from_value(data)?)
  }
}
