//! GraphQL documents sent upstream and their variable sets.

use serde::Serialize;

use super::types::GuildLookup;

/// Cache key prefix for guild lookups
pub const GUILD_KEY_PREFIX: &str = "guild";

pub const GUILD_QUERY: &str = r#"
query guild($id: Int, $name: String, $server: String, $region: String) {
  guildData {
    guild(id: $id, name: $name, serverSlug: $server, serverRegion: $region) {
      description
      id
      name
      server {
        id
        name
        slug
        region {
          id
          slug
        }
      }
    }
  }
}
"#;

pub const MEMBER_TOTAL_QUERY: &str = r#"
query guildMemberTotal($id: Int) {
  guildData {
    guild(id: $id) {
      members {
        total
      }
    }
  }
}
"#;

pub const GUILD_RANKINGS_QUERY: &str = r#"
query guildRankings($id: Int, $limit: Int, $page: Int, $difficulty: Int, $partition: Int) {
  guildData {
    guild(id: $id) {
      members(limit: $limit, page: $page) {
        current_page
        has_more_pages
        from
        last_page
        per_page
        to
        total
        data {
          classID
          name
          id
          zoneRankings(difficulty: $difficulty, partition: $partition)
        }
      }
    }
  }
}
"#;

/// Variables for `GUILD_QUERY`. Unset fields are omitted, so an id lookup
/// hashes the same as `{"id": n}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuildVariables {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub server: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub region: Option<String>,
}

impl From<&GuildLookup> for GuildVariables {
  fn from(lookup: &GuildLookup) -> Self {
    match lookup {
      GuildLookup::ById(id) => GuildVariables {
        id: Some(*id),
        ..Default::default()
      },
      GuildLookup::ByName {
        name,
        server,
        region,
      } => GuildVariables {
        id: None,
        name: Some(name.clone()),
        server: Some(server.clone()),
        region: Some(region.clone()),
      },
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberTotalVariables {
  pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingsVariables {
  pub id: i64,
  pub page: u32,
  pub limit: u32,
  pub difficulty: i32,
  pub partition: i32,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_id_lookup_omits_name_fields() {
    let vars = GuildVariables::from(&GuildLookup::ById(42));
    assert_eq!(serde_json::to_value(vars).unwrap(), json!({"id": 42}));
  }

  #[test]
  fn test_name_lookup_omits_id() {
    let vars = GuildVariables::from(&GuildLookup::ByName {
      name: "Echo".to_string(),
      server: "tarren-mill".to_string(),
      region: "EU".to_string(),
    });
    assert_eq!(
      serde_json::to_value(vars).unwrap(),
      json!({"name": "Echo", "server": "tarren-mill", "region": "EU"})
    );
  }
}
