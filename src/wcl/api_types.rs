//! Serde-deserializable types matching WCL GraphQL responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on what the proxy returns.

use serde::Deserialize;
use serde_json::Value;

use super::types::{Guild, GuildMember};
use crate::error::{Result, WclError};

// ============================================================================
// GraphQL envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
  pub data: Option<Value>,
  #[serde(default)]
  pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
  pub message: String,
}

impl GraphqlResponse {
  /// Unwrap `data`, turning GraphQL-level errors into upstream failures.
  pub fn into_data(self) -> Result<Value> {
    if let Some(first) = self.errors.first() {
      let message = match self.errors.len() {
        1 => first.message.clone(),
        n => format!("{} (and {} more)", first.message, n - 1),
      };
      return Err(WclError::Upstream(format!("GraphQL error: {}", message)));
    }

    match self.data {
      Some(data) if !data.is_null() => Ok(data),
      _ => Err(WclError::Upstream(
        "GraphQL response carried no data".to_string(),
      )),
    }
  }
}

// ============================================================================
// guildData { guild { ... } } wrapper shared by every query
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiGuildDataResponse<G> {
  #[serde(rename = "guildData")]
  pub guild_data: Option<ApiGuildData<G>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGuildData<G> {
  pub guild: Option<G>,
}

impl<G> ApiGuildDataResponse<G> {
  pub fn into_guild(self) -> Option<G> {
    self.guild_data.and_then(|d| d.guild)
  }
}

// ============================================================================
// Guild lookup
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiRegion {
  pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiServer {
  pub name: String,
  pub region: ApiRegion,
}

#[derive(Debug, Deserialize)]
pub struct ApiGuild {
  pub id: i64,
  pub name: String,
  pub server: ApiServer,
}

impl From<ApiGuild> for Guild {
  fn from(guild: ApiGuild) -> Self {
    Guild {
      id: guild.id,
      name: guild.name,
      server: guild.server.name,
      region: guild.server.region.slug,
    }
  }
}

/// Parse a guild lookup response. A null guild means no such guild exists.
pub fn parse_guild_response(data: Value) -> Result<Guild> {
  let response: ApiGuildDataResponse<ApiGuild> = serde_json::from_value(data)?;
  response
    .into_guild()
    .map(Guild::from)
    .ok_or_else(|| WclError::NotFound("Guild not found".to_string()))
}

// ============================================================================
// Guild members
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiMembersHolder<M> {
  pub members: Option<M>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMemberTotal {
  pub total: Option<u64>,
}

/// One page of the paginated members connection.
#[derive(Debug, Deserialize)]
pub struct ApiMemberPage {
  pub current_page: Option<u32>,
  #[serde(default)]
  pub has_more_pages: bool,
  #[serde(default)]
  pub data: Vec<GuildMember>,
}

pub type MemberTotalResponse = ApiGuildDataResponse<ApiMembersHolder<ApiMemberTotal>>;
pub type MemberPageResponse = ApiGuildDataResponse<ApiMembersHolder<ApiMemberPage>>;
