//! The fetch-aggregate-cache core: turns "give me the best N stories" into a
//! bounded set of concurrent upstream calls and a three-tier cache.

use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::HnConfig;

use super::api_types::HackerNewsItem;
use super::client::Upstream;
use super::types::Story;

/// Best-stories aggregator over an [`Upstream`] transport.
///
/// Maintains three independent cache tiers: the ranked id list (one
/// well-known entry), per-story details keyed by id, and final ranked
/// results keyed by requested count. Each tier has its own TTL, so the
/// composed answer refreshes faster than the underlying identity of "which
/// stories are best".
pub struct StoryService<U> {
  upstream: U,
  config: HnConfig,
  /// Permit pool bounding simultaneously in-flight detail fetches
  permits: Arc<Semaphore>,
  ids_cache: TtlCache<(), Vec<u64>>,
  details_cache: TtlCache<u64, HackerNewsItem>,
  results_cache: TtlCache<usize, Vec<Story>>,
}

impl<U: Upstream> StoryService<U> {
  pub fn new(upstream: U, config: HnConfig) -> Self {
    let permits = Arc::new(Semaphore::new(config.max_concurrent_requests));
    Self {
      upstream,
      config,
      permits,
      ids_cache: TtlCache::new(),
      details_cache: TtlCache::new(),
      results_cache: TtlCache::new(),
    }
  }

  /// Get the best `count` stories, ordered by score descending.
  ///
  /// Total over every input: failures degrade to a shorter (possibly empty)
  /// result and are logged, never returned. Requesting more stories than
  /// exist returns all of them.
  pub async fn best_stories(&self, count: usize) -> Vec<Story> {
    if let Some(stories) = self.results_cache.get(&count) {
      info!("returning {} best stories from cache", count);
      return stories;
    }

    let ids = match self.best_story_ids().await {
      Ok(ids) => ids,
      Err(e) => {
        warn!("failed to fetch best story ids: {e}");
        return Vec::new();
      }
    };

    if ids.is_empty() {
      // Transient condition worth re-checking: nothing cached under the
      // final-result key.
      warn!("upstream returned no story ids");
      return Vec::new();
    }

    let take = count.min(ids.len());
    let fetches = ids[..take].iter().map(|&id| self.story_details(id));
    let mut items: Vec<HackerNewsItem> = join_all(fetches).await.into_iter().flatten().collect();

    // Stable sort: stories with equal scores keep the upstream list order
    items.sort_by(|a, b| b.score.cmp(&a.score));

    let stories: Vec<Story> = items.into_iter().map(Story::from).collect();

    self
      .results_cache
      .set(count, stories.clone(), self.config.full_result_ttl());

    stories
  }

  /// The ranked id list, from cache or upstream.
  async fn best_story_ids(&self) -> Result<Vec<u64>> {
    if let Some(ids) = self.ids_cache.get(&()) {
      debug!("story id list cache hit");
      return Ok(ids);
    }
    debug!("story id list cache miss");

    let body = self.upstream.fetch(&self.config.best_stories_url).await?;
    let ids: Vec<u64> =
      serde_json::from_str(&body).map_err(|e| eyre!("Failed to parse story id list: {}", e))?;

    self
      .ids_cache
      .set((), ids.clone(), self.config.story_ids_ttl());

    Ok(ids)
  }

  /// Details for one story, from cache or upstream.
  ///
  /// Returns `None` when the fetch fails or the story does not exist; the
  /// caller drops such stories from the batch instead of aborting it.
  async fn story_details(&self, id: u64) -> Option<HackerNewsItem> {
    if let Some(item) = self.details_cache.get(&id) {
      debug!("story {} details cache hit", id);
      return Some(item);
    }
    debug!("story {} details cache miss", id);

    // Held for the duration of the upstream call; released on every exit
    // path when the permit drops.
    let _permit = match self.permits.acquire().await {
      Ok(permit) => permit,
      // The semaphore is never closed
      Err(_) => return None,
    };

    match self.fetch_details(id).await {
      Ok(item) => item,
      Err(e) => {
        warn!("failed to fetch story {}: {e}", id);
        None
      }
    }
  }

  async fn fetch_details(&self, id: u64) -> Result<Option<HackerNewsItem>> {
    let body = self.upstream.fetch(&self.config.item_url(id)).await?;

    // The item endpoint answers a bare `null` for unknown ids
    let item: Option<HackerNewsItem> =
      serde_json::from_str(&body).map_err(|e| eyre!("Failed to parse story {}: {}", id, e))?;

    let Some(item) = item else {
      debug!("story {} does not exist upstream", id);
      return Ok(None);
    };

    self
      .details_cache
      .set(id, item.clone(), self.config.story_details_ttl());

    Ok(Some(item))
  }
}
