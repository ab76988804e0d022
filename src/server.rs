//! HTTP surface for the proxy.
//!
//! # Routes
//!
//! - `GET /` - Browser UI
//! - `GET /health` - Liveness check
//! - `POST /api/wcl/guild` - Look up a guild (body: `{"id": ...}` or `{"name", "server", "region"}`)
//! - `GET /api/wcl/guildRankings/{id}` - All members of a guild with zone rankings

use axum::{
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::{Html, IntoResponse},
  routing::{get, post},
  Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::WclError;
use crate::wcl::{CachedWclClient, GuildLookup, MemberFetcher};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared server state
pub struct AppState {
  pub guilds: CachedWclClient,
  pub members: MemberFetcher,
}

/// HTTP server for the proxy
pub struct ProxyServer {
  state: Arc<AppState>,
}

impl ProxyServer {
  pub fn new(state: AppState) -> Self {
    Self {
      state: Arc::new(state),
    }
  }

  fn router(state: Arc<AppState>) -> Router {
    Router::new()
      .route("/", get(index))
      .route("/health", get(health))
      .route("/api/wcl/guild", post(lookup_guild))
      .route("/api/wcl/guildRankings/{id}", get(guild_rankings))
      .with_state(state)
  }

  /// Run the server on the given address
  pub async fn run(self, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr, "Proxy listening");

    axum::serve(listener, Self::router(self.state)).await
  }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(error: &WclError) -> StatusCode {
  match error {
    WclError::Validation(_) => StatusCode::BAD_REQUEST,
    WclError::NotFound(_) => StatusCode::NOT_FOUND,
    WclError::Auth(_) | WclError::Upstream(_) | WclError::Decode(_) => StatusCode::BAD_GATEWAY,
    WclError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn api_error(error: WclError) -> ApiError {
  let status = status_for(&error);
  if status.is_server_error() {
    tracing::error!(status = status.as_u16(), error = %error, "Request failed");
  } else {
    tracing::debug!(status = status.as_u16(), error = %error, "Request rejected");
  }

  (
    status,
    Json(ErrorResponse {
      error: error.to_string(),
    }),
  )
}

// ============================================================================
// Input validation
// ============================================================================

fn is_absent(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) | Some(Value::Bool(false)) => true,
    Some(Value::String(s)) => s.is_empty(),
    Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    _ => false,
  }
}

fn required_string(body: &Value, field: &str) -> Result<String, WclError> {
  match body.get(field) {
    Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
    Some(v) if !is_absent(Some(v)) => Ok(v.to_string()),
    _ => Err(WclError::Validation(format!(
      "Param: '{}' is required",
      field
    ))),
  }
}

/// Turn a lookup request body into a `GuildLookup`.
///
/// A present `id` (number or numeric string) wins; otherwise `name`,
/// `server` and `region` are all required.
fn parse_lookup(body: &Value) -> Result<GuildLookup, WclError> {
  if body.is_null() {
    return Err(WclError::Validation("Missing body".to_string()));
  }

  let id = body.get("id");
  if !is_absent(id) {
    let parsed = match id {
      Some(Value::Number(n)) => n.as_i64(),
      Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
      _ => None,
    };
    return parsed
      .map(GuildLookup::ById)
      .ok_or_else(|| WclError::Validation("Param: 'id' must be a number".to_string()));
  }

  Ok(GuildLookup::ByName {
    name: required_string(body, "name")?,
    server: required_string(body, "server")?,
    region: required_string(body, "region")?,
  })
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> Html<&'static str> {
  Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
  Json(serde_json::json!({ "status": "ok" }))
}

async fn lookup_guild(
  State(state): State<Arc<AppState>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  let body: Value = if body.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&body)
      .map_err(|e| api_error(WclError::Validation(format!("Invalid JSON body: {}", e))))?
  };

  let lookup = parse_lookup(&body).map_err(api_error)?;
  tracing::debug!(?lookup, "Guild lookup");

  let result = state.guilds.lookup_guild(&lookup).await.map_err(api_error)?;
  tracing::info!(
    guild_id = result.data.id,
    source = result.source.as_str(),
    cached_at = ?result.cached_at,
    "Guild resolved"
  );

  Ok(([("x-cache", result.source.as_str())], Json(result.data)))
}

async fn guild_rankings(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let guild_id: i64 = id
    .trim()
    .parse()
    .map_err(|_| api_error(WclError::Validation("Invalid guild id".to_string())))?;

  let members = state
    .members
    .fetch_all_members(guild_id)
    .await
    .map_err(api_error)?;

  Ok(Json(members))
}
