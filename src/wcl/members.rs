//! Fetching every member of a guild across paginated ranking queries.

use futures::{stream, StreamExt, TryStreamExt};

use crate::config::MembersConfig;
use crate::error::{Result, WclError};

use super::api_types::{MemberPageResponse, MemberTotalResponse};
use super::client::WclClient;
use super::queries::{
  MemberTotalVariables, RankingsVariables, GUILD_RANKINGS_QUERY, MEMBER_TOTAL_QUERY,
};
use super::types::GuildMember;

/// Number of pages needed to hold `total` members.
pub fn page_count(total: u64, page_size: u32) -> u32 {
  total.div_ceil(u64::from(page_size.max(1))) as u32
}

/// Fans out one rankings query per page and joins the results.
#[derive(Clone)]
pub struct MemberFetcher {
  client: WclClient,
  settings: MembersConfig,
}

impl MemberFetcher {
  pub fn new(client: WclClient, settings: MembersConfig) -> Self {
    Self { client, settings }
  }

  /// Fetch all members of a guild with their zone rankings.
  ///
  /// Pages are requested concurrently, up to `concurrency` at a time (all of
  /// them when unset). Any failed page fails the whole fetch.
  pub async fn fetch_all_members(&self, guild_id: i64) -> Result<Vec<GuildMember>> {
    let total = self.member_total_or_empty(guild_id).await;
    if total == 0 {
      return Err(WclError::NotFound(format!(
        "No guild members found for id: {}",
        guild_id
      )));
    }

    let page_size = self.settings.page_size.max(1);
    let pages = page_count(total, page_size);
    let limit = self.settings.concurrency.unwrap_or(pages as usize).max(1);
    tracing::info!(guild_id, total, pages, limit, "Fetching guild member pages");

    let results: Vec<Vec<GuildMember>> = stream::iter(1..=pages)
      .map(|page| self.fetch_page(guild_id, page, page_size))
      .buffered(limit)
      .try_collect()
      .await?;

    Ok(results.into_iter().flatten().collect())
  }

  /// Total member count as reported upstream. A guild without a members
  /// connection counts as zero.
  async fn member_total(&self, guild_id: i64) -> Result<u64> {
    let response: MemberTotalResponse = self
      .client
      .query_as(MEMBER_TOTAL_QUERY, &MemberTotalVariables { id: guild_id })
      .await?;

    Ok(
      response
        .into_guild()
        .and_then(|g| g.members)
        .and_then(|m| m.total)
        .unwrap_or(0),
    )
  }

  /// Member total with the empty-guild fallback: a failed count query is
  /// logged and reported as zero members, never as the underlying error.
  async fn member_total_or_empty(&self, guild_id: i64) -> u64 {
    match self.member_total(guild_id).await {
      Ok(total) => total,
      Err(e) => {
        tracing::warn!(guild_id, error = %e, "Member total query failed, treating guild as empty");
        0
      }
    }
  }

  async fn fetch_page(&self, guild_id: i64, page: u32, page_size: u32) -> Result<Vec<GuildMember>> {
    let variables = RankingsVariables {
      id: guild_id,
      page,
      limit: page_size,
      difficulty: self.settings.difficulty,
      partition: self.settings.partition,
    };

    tracing::debug!(guild_id, page, "Fetching member page");
    let response: MemberPageResponse = self.client.query_as(GUILD_RANKINGS_QUERY, &variables).await?;

    match response.into_guild().and_then(|g| g.members) {
      Some(members) => {
        tracing::debug!(
          guild_id,
          page = members.current_page.unwrap_or(page),
          count = members.data.len(),
          has_more = members.has_more_pages,
          "Received member page"
        );
        Ok(members.data)
      }
      None => Ok(Vec::new()),
    }
  }
}
