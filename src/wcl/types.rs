use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Guild summary returned by the lookup endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
  pub id: i64,
  pub name: String,
  /// Server display name
  pub server: String,
  /// Region slug, e.g. "US"
  pub region: String,
}

/// Guild member with raw zone rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildMember {
  #[serde(rename = "classID")]
  pub class_id: i64,
  pub name: String,
  pub id: i64,
  /// Passed through as-is; its shape depends on the zone
  #[serde(rename = "zoneRankings", default)]
  pub zone_rankings: Value,
}

/// The two ways a guild can be identified upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildLookup {
  ById(i64),
  ByName {
    name: String,
    server: String,
    region: String,
  },
}
