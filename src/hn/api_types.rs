//! Serde-deserializable types matching Hacker News API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

/// One item from the item-details endpoint.
///
/// Dead and deleted items come back with most fields missing, so everything
/// except `id` defaults. Job postings and Ask HN items have no `url`.
#[derive(Debug, Clone, Deserialize)]
pub struct HackerNewsItem {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub by: String,
  /// Creation time, seconds since the Unix epoch
  #[serde(default)]
  pub time: i64,
  #[serde(default)]
  pub score: i64,
  /// Total comment count
  #[serde(default)]
  pub descendants: u64,
  #[serde(default, rename = "type")]
  pub kind: String,
}
