//! The immutable description of what is currently playing.

use crate::error::{AppError, Result};
use crate::stream::require_stream;
use crate::types::{EpisodeFolder, ProgressKey, QualityLabel, Translation};

/// A precomputed "next episode", one step ahead of the current context.
#[derive(Clone, Debug, PartialEq)]
pub struct NextEpisodeItem {
    pub season_index: usize,
    pub episode_index: usize,
    pub folder: EpisodeFolder,
    pub group_label: String,
    /// Quality the item was prefetched with.
    pub quality: Option<QualityLabel>,
}

impl NextEpisodeItem {
    /// 1-based season number.
    pub fn season_number(&self) -> u32 {
        display_number(self.season_index)
    }

    /// 1-based episode number.
    pub fn episode_number(&self) -> u32 {
        display_number(self.episode_index)
    }

    /// Title shown in the "play next" prompt.
    ///
    /// # Examples
    ///
    /// ```
    /// use nextup::context::NextEpisodeItem;
    /// use nextup::types::EpisodeFolder;
    ///
    /// let item = NextEpisodeItem {
    ///     season_index: 0,
    ///     episode_index: 4,
    ///     folder: EpisodeFolder::new("Reunion", []),
    ///     group_label: "Studio".to_string(),
    ///     quality: None,
    /// };
    /// assert_eq!(item.display_title(), "S1 E5 - Reunion");
    /// ```
    pub fn display_title(&self) -> String {
        episode_title(self.season_number(), self.episode_number(), &self.folder.title)
    }
}

/// What the engine is playing right now.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackContext {
    /// A movie or any other title without episodes.
    Standalone {
        content_id: String,
        title: String,
        group_label: String,
        quality: QualityLabel,
        stream_url: String,
    },
    /// One episode of a series. Numbers are 1-based.
    Episode {
        content_id: String,
        season_number: u32,
        episode_number: u32,
        group_label: String,
        quality: QualityLabel,
        stream_url: String,
        title: String,
        next_item: Option<NextEpisodeItem>,
    },
}

impl PlaybackContext {
    /// Build a standalone context, resolving its stream.
    pub fn standalone(
        content_id: &str,
        title: &str,
        group_label: &str,
        folder: &EpisodeFolder,
        preferred: Option<&str>,
    ) -> Result<Self> {
        let choice = require_stream(&folder.streams, preferred)?;
        Ok(PlaybackContext::Standalone {
            content_id: content_id.to_string(),
            title: title.to_string(),
            group_label: group_label.to_string(),
            quality: choice.quality,
            stream_url: choice.url,
        })
    }

    /// Build an episode context from 0-based indices into `translation`.
    ///
    /// The result has no next item; the engine computes it separately.
    pub fn episode(
        content_id: &str,
        translation: &Translation,
        season_index: usize,
        episode_index: usize,
        preferred: Option<&str>,
    ) -> Result<Self> {
        let folder = translation
            .episode(season_index, episode_index)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} has no season {} episode {}",
                    translation.group_label,
                    display_number(season_index),
                    display_number(episode_index)
                ))
            })?;
        let choice = require_stream(&folder.streams, preferred)?;

        Ok(PlaybackContext::Episode {
            content_id: content_id.to_string(),
            season_number: display_number(season_index),
            episode_number: display_number(episode_index),
            group_label: translation.group_label.clone(),
            quality: choice.quality,
            stream_url: choice.url,
            title: folder.title.clone(),
            next_item: None,
        })
    }

    pub fn content_id(&self) -> &str {
        match self {
            PlaybackContext::Standalone { content_id, .. }
            | PlaybackContext::Episode { content_id, .. } => content_id,
        }
    }

    pub fn stream_url(&self) -> &str {
        match self {
            PlaybackContext::Standalone { stream_url, .. }
            | PlaybackContext::Episode { stream_url, .. } => stream_url,
        }
    }

    pub fn group_label(&self) -> &str {
        match self {
            PlaybackContext::Standalone { group_label, .. }
            | PlaybackContext::Episode { group_label, .. } => group_label,
        }
    }

    pub fn quality(&self) -> &str {
        match self {
            PlaybackContext::Standalone { quality, .. }
            | PlaybackContext::Episode { quality, .. } => quality,
        }
    }

    pub fn next_item(&self) -> Option<&NextEpisodeItem> {
        match self {
            PlaybackContext::Standalone { .. } => None,
            PlaybackContext::Episode { next_item, .. } => next_item.as_ref(),
        }
    }

    pub fn is_episode(&self) -> bool {
        matches!(self, PlaybackContext::Episode { .. })
    }

    /// 0-based `(season_index, episode_index)` for episodes.
    pub fn episode_position(&self) -> Option<(usize, usize)> {
        match self {
            PlaybackContext::Standalone { .. } => None,
            PlaybackContext::Episode {
                season_number,
                episode_number,
                ..
            } => Some((tree_index(*season_number), tree_index(*episode_number))),
        }
    }

    pub fn display_title(&self) -> String {
        match self {
            PlaybackContext::Standalone { title, .. } => title.clone(),
            PlaybackContext::Episode {
                season_number,
                episode_number,
                title,
                ..
            } => episode_title(*season_number, *episode_number, title),
        }
    }

    /// Key under which this item's progress is stored.
    pub fn progress_key(&self) -> ProgressKey {
        match self {
            PlaybackContext::Standalone { content_id, .. } => ProgressKey::title(content_id),
            PlaybackContext::Episode {
                content_id,
                season_number,
                episode_number,
                ..
            } => ProgressKey::episode(content_id, *season_number, *episode_number),
        }
    }

    /// Copy of this context carrying `next_item`. Standalone contexts are
    /// returned unchanged.
    pub fn with_next_item(&self, item: Option<NextEpisodeItem>) -> Self {
        match self {
            PlaybackContext::Standalone { .. } => self.clone(),
            PlaybackContext::Episode {
                content_id,
                season_number,
                episode_number,
                group_label,
                quality,
                stream_url,
                title,
                ..
            } => PlaybackContext::Episode {
                content_id: content_id.clone(),
                season_number: *season_number,
                episode_number: *episode_number,
                group_label: group_label.clone(),
                quality: quality.clone(),
                stream_url: stream_url.clone(),
                title: title.clone(),
                next_item: item,
            },
        }
    }

    /// Produce the context for the next episode.
    ///
    /// Returns `Ok(None)` exactly when there is no next item, which includes
    /// every standalone context. The returned context has no next item of its
    /// own: lookahead is always one step.
    pub fn advance(&self, preferred: Option<&str>) -> Result<Option<PlaybackContext>> {
        let PlaybackContext::Episode {
            content_id,
            next_item: Some(next),
            ..
        } = self
        else {
            return Ok(None);
        };

        let choice = require_stream(&next.folder.streams, preferred)?;
        Ok(Some(PlaybackContext::Episode {
            content_id: content_id.clone(),
            season_number: next.season_number(),
            episode_number: next.episode_number(),
            group_label: next.group_label.clone(),
            quality: choice.quality,
            stream_url: choice.url,
            title: next.folder.title.clone(),
            next_item: None,
        }))
    }
}

fn display_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn tree_index(number: u32) -> usize {
    (number as usize).saturating_sub(1)
}

fn episode_title(season: u32, episode: u32, title: &str) -> String {
    if title.is_empty() {
        format!("S{} E{}", season, episode)
    } else {
        format!("S{} E{} - {}", season, episode, title)
    }
}
