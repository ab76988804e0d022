//! Warcraft Logs GraphQL client: token handling, retrying queries, cached
//! guild lookups and paginated member fetches.

pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
pub mod members;
pub mod queries;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cached_client::CachedWclClient;
pub use client::WclClient;
pub use members::MemberFetcher;
pub use types::GuildLookup;
