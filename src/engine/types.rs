//! Engine type definitions for states, events and requests.

use crate::types::{EpisodeFolder, QualityLabel};

/// Identifier the engine assigns to every item it hands to the player.
///
/// Player notifications carry it back so stale or duplicate notifications
/// can be told apart from the item that is actually current.
pub type ItemId = u64;

/// Lifecycle of one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Resolving the first stream; also parked here while a quality
    /// fallback prompt is open.
    Starting,
    /// Playing with periodic progress saves
    Playing,
    /// Past the near-end ratio; a prompt may be showing
    NearEnd,
    /// Moving to the next context (never observed between events)
    Transitioning,
    /// The active translation has no continuation
    TranslationEnded,
    /// Torn down by the host
    Terminated,
}

/// What the host asks the engine to play first.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackRequest {
    /// A title without episodes.
    Standalone {
        content_id: String,
        title: String,
        group_label: String,
        folder: EpisodeFolder,
    },
    /// An episode of the host's active translation, by 0-based indices.
    Episode {
        content_id: String,
        season_index: usize,
        episode_index: usize,
    },
}

/// Position and duration as reported by the player, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub position: f64,
    pub duration: f64,
}

impl PositionSample {
    pub fn new(position: f64, duration: f64) -> Self {
        Self { position, duration }
    }

    /// Played fraction, or `None` while the duration is unknown.
    pub fn ratio(&self) -> Option<f64> {
        (self.duration.is_finite() && self.duration > 0.0).then(|| self.position / self.duration)
    }
}

/// One audio track offered by the current item.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub label: String,
    pub language: Option<String>,
    /// Whether the player picked this track by default.
    pub is_default: bool,
}

/// Notifications coming from the media player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The item is buffered and playable.
    ItemReady { item: ItemId },
    /// The player moved on its own to the queued item `item`.
    ItemTransitioned { item: ItemId },
    /// The item played to its end and nothing followed it.
    ItemEnded { item: ItemId },
    /// Result of a [`request_audio_tracks`] call.
    ///
    /// [`request_audio_tracks`]: super::MediaPlayer::request_audio_tracks
    AudioTracksLoaded {
        item: ItemId,
        tracks: Result<Vec<AudioTrack>, String>,
    },
}

/// Answers and requests coming from the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    NextEpisodeAccepted,
    NextEpisodeDismissed,
    /// Index into the options given to the audio track prompt.
    AudioTrackChosen(usize),
    /// Label picked from the quality fallback prompt.
    QualityChosen(QualityLabel),
    /// The host dismissed the player.
    Teardown,
}

/// Everything the engine reacts to, serialized onto one loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Tick,
    Player(PlayerEvent),
    Host(HostEvent),
}

impl From<PlayerEvent> for EngineEvent {
    fn from(event: PlayerEvent) -> Self {
        EngineEvent::Player(event)
    }
}

impl From<HostEvent> for EngineEvent {
    fn from(event: HostEvent) -> Self {
        EngineEvent::Host(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_unknown_duration() {
        assert_eq!(PositionSample::new(10.0, 0.0).ratio(), None);
        assert_eq!(PositionSample::new(10.0, f64::NAN).ratio(), None);
        assert_eq!(PositionSample::new(50.0, 100.0).ratio(), Some(0.5));
    }
}
