//! Type definitions for nextup.
//!
//! This module contains the catalog data the engine reads (translations,
//! seasons and episode folders) and the progress records it writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A quality tag such as `"1080p"`, used as a key into a stream map.
pub type QualityLabel = String;

/// Per-episode descriptor owned by the catalog layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeFolder {
    /// Episode title as scraped; may be empty.
    #[serde(default)]
    pub title: String,

    /// Map of quality label to stream URL.
    #[serde(default)]
    pub streams: BTreeMap<QualityLabel, String>,
}

impl EpisodeFolder {
    /// Create a folder from a title and `(quality, url)` pairs.
    pub fn new<'a>(title: &str, streams: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            title: title.to_string(),
            streams: streams
                .into_iter()
                .map(|(quality, url)| (quality.to_string(), url.to_string()))
                .collect(),
        }
    }
}

/// A dub or subtitle group offering its own season/episode tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Display name of the group (e.g. a studio name).
    pub group_label: String,

    /// Ordered seasons, each an ordered list of episodes.
    #[serde(default)]
    pub seasons: Vec<Vec<EpisodeFolder>>,
}

impl Translation {
    /// Create a translation from its label and season tree.
    pub fn new(group_label: &str, seasons: Vec<Vec<EpisodeFolder>>) -> Self {
        Self {
            group_label: group_label.to_string(),
            seasons,
        }
    }

    /// Look up an episode by 0-based season and episode index.
    pub fn episode(&self, season_index: usize, episode_index: usize) -> Option<&EpisodeFolder> {
        self.seasons
            .get(season_index)
            .and_then(|season| season.get(episode_index))
    }

    /// Total number of episodes across all seasons.
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(Vec::len).sum()
    }

    /// Position of the first episode, skipping empty seasons.
    pub fn first_episode(&self) -> Option<(usize, usize)> {
        self.seasons
            .iter()
            .position(|season| !season.is_empty())
            .map(|season_index| (season_index, 0))
    }
}

/// A series with every translation the catalog offers for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Catalog identifier used for progress keys.
    pub content_id: String,

    /// Display name of the series.
    #[serde(default)]
    pub title: String,

    /// Available translations, in catalog order.
    #[serde(default)]
    pub translations: Vec<Translation>,
}

impl Series {
    /// Find a translation by its group label.
    pub fn translation(&self, group_label: &str) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|t| t.group_label == group_label)
    }

    /// Every translation except the one labelled `group_label`.
    pub fn siblings(&self, group_label: &str) -> Vec<Translation> {
        self.translations
            .iter()
            .filter(|t| t.group_label != group_label)
            .cloned()
            .collect()
    }

    /// Format the series for display in selection menus.
    ///
    /// # Examples
    ///
    /// ```
    /// use nextup::types::Series;
    ///
    /// let series = Series {
    ///     content_id: "abc".to_string(),
    ///     title: "My Show".to_string(),
    ///     translations: vec![],
    /// };
    /// assert_eq!(series.to_display(), "My Show (0 translations)");
    /// ```
    pub fn to_display(&self) -> String {
        format!("{} ({} translations)", self.title, self.translations.len())
    }
}

/// Identifies one persisted progress record.
///
/// Season and episode are 1-based display numbers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressKey {
    /// A standalone title (movie).
    Title { content_id: String },
    /// One episode of a series.
    Episode {
        content_id: String,
        season: u32,
        episode: u32,
    },
}

impl ProgressKey {
    /// Key for a standalone title.
    pub fn title(content_id: &str) -> Self {
        ProgressKey::Title {
            content_id: content_id.to_string(),
        }
    }

    /// Key for an episode, using 1-based numbers.
    pub fn episode(content_id: &str, season: u32, episode: u32) -> Self {
        ProgressKey::Episode {
            content_id: content_id.to_string(),
            season,
            episode,
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressKey::Title { content_id } => write!(f, "{}", content_id),
            ProgressKey::Episode {
                content_id,
                season,
                episode,
            } => write!(f, "{}/s{}e{}", content_id, season, episode),
        }
    }
}

/// Persisted playback position for one title or episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Last known playback position.
    pub position_seconds: f64,
    /// Item duration as reported by the player.
    pub duration_seconds: f64,
    /// Whether the item counts as watched.
    #[serde(default)]
    pub watched: bool,
    /// Unix timestamp of the last write.
    pub updated_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(title: &str) -> EpisodeFolder {
        EpisodeFolder::new(title, [("720p", "http://example.com/720")])
    }

    #[test]
    fn test_translation_episode_lookup() {
        let translation = Translation::new("Studio", vec![vec![folder("A"), folder("B")]]);
        assert_eq!(translation.episode(0, 1).map(|f| f.title.as_str()), Some("B"));
        assert!(translation.episode(0, 2).is_none());
        assert!(translation.episode(1, 0).is_none());
        assert_eq!(translation.episode_count(), 2);
    }

    #[test]
    fn test_first_episode_skips_empty_seasons() {
        let translation = Translation::new("Studio", vec![vec![], vec![], vec![folder("A")]]);
        assert_eq!(translation.first_episode(), Some((2, 0)));

        let empty = Translation::new("Studio", vec![vec![]]);
        assert_eq!(empty.first_episode(), None);
    }

    #[test]
    fn test_series_siblings_exclude_current() {
        let series = Series {
            content_id: "s1".to_string(),
            title: "Show".to_string(),
            translations: vec![
                Translation::new("Alpha", vec![]),
                Translation::new("Beta", vec![]),
                Translation::new("Gamma", vec![]),
            ],
        };
        let siblings = series.siblings("Beta");
        assert_eq!(siblings.len(), 2);
        assert!(siblings.iter().all(|t| t.group_label != "Beta"));
        assert!(series.translation("Gamma").is_some());
        assert!(series.translation("Delta").is_none());
    }

    #[test]
    fn test_progress_key_display() {
        assert_eq!(ProgressKey::title("movie-1").to_string(), "movie-1");
        assert_eq!(ProgressKey::episode("show-1", 2, 10).to_string(), "show-1/s2e10");
    }

    #[test]
    fn test_translation_deserialization() {
        let json = r#"{
            "group_label": "Studio",
            "seasons": [[{"title": "Pilot", "streams": {"1080p": "u1"}}]]
        }"#;
        let translation: Translation = serde_json::from_str(json).unwrap();
        assert_eq!(translation.group_label, "Studio");
        assert_eq!(
            translation.episode(0, 0).and_then(|f| f.streams.get("1080p")),
            Some(&"u1".to_string())
        );
    }
}
