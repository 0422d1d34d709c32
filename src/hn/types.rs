//! Domain types for ranked stories.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::api_types::HackerNewsItem;

/// A ranked story as presented to callers.
///
/// Built once from a [`HackerNewsItem`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
  pub title: String,
  pub uri: String,
  pub posted_by: String,
  /// ISO-8601 creation time with UTC offset
  pub time: String,
  pub score: i64,
  pub comment_count: u64,
}

impl From<HackerNewsItem> for Story {
  fn from(item: HackerNewsItem) -> Self {
    Self {
      title: item.title,
      uri: item.url,
      posted_by: item.by,
      time: unix_to_iso8601(item.time),
      score: item.score,
      comment_count: item.descendants,
    }
  }
}

/// Convert epoch seconds to an ISO-8601 UTC string, e.g. `1609459200` →
/// `2021-01-01T00:00:00+00:00`.
///
/// Total over all inputs: epochs outside chrono's representable range clamp
/// to the epoch origin.
pub fn unix_to_iso8601(epoch_secs: i64) -> String {
  DateTime::<Utc>::from_timestamp(epoch_secs, 0)
    .unwrap_or_default()
    .format("%Y-%m-%dT%H:%M:%S%:z")
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unix_to_iso8601() {
    assert_eq!(unix_to_iso8601(1609459200), "2021-01-01T00:00:00+00:00");
    assert_eq!(unix_to_iso8601(1617235200), "2021-04-01T00:00:00+00:00");
    assert_eq!(unix_to_iso8601(0), "1970-01-01T00:00:00+00:00");
  }

  #[test]
  fn test_unix_to_iso8601_is_total() {
    // Out-of-range epochs clamp to the origin instead of failing
    assert_eq!(unix_to_iso8601(i64::MAX), "1970-01-01T00:00:00+00:00");
    assert_eq!(unix_to_iso8601(i64::MIN), "1970-01-01T00:00:00+00:00");
  }

  #[test]
  fn test_story_from_item() {
    let item = HackerNewsItem {
      id: 8863,
      title: "My YC app: Dropbox".to_string(),
      url: "http://www.getdropbox.com".to_string(),
      by: "dhouston".to_string(),
      time: 1609459200,
      score: 111,
      descendants: 71,
      kind: "story".to_string(),
    };

    let story = Story::from(item);
    assert_eq!(story.title, "My YC app: Dropbox");
    assert_eq!(story.uri, "http://www.getdropbox.com");
    assert_eq!(story.posted_by, "dhouston");
    assert_eq!(story.time, "2021-01-01T00:00:00+00:00");
    assert_eq!(story.score, 111);
    assert_eq!(story.comment_count, 71);
  }

  #[test]
  fn test_story_serializes_camel_case() {
    let story = Story {
      title: "A title".to_string(),
      uri: "https://example.com".to_string(),
      posted_by: "someone".to_string(),
      time: "2021-01-01T00:00:00+00:00".to_string(),
      score: 10,
      comment_count: 3,
    };

    let json = serde_json::to_value(&story).expect("should serialize");
    assert_eq!(json["postedBy"], "someone");
    assert_eq!(json["commentCount"], 3);
    assert_eq!(json["uri"], "https://example.com");
    assert_eq!(json["time"], "2021-01-01T00:00:00+00:00");
  }
}
