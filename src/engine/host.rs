//! Callbacks the engine makes into the host UI.

use super::types::AudioTrack;
use crate::types::{QualityLabel, Translation};

/// The host application around the player.
///
/// Prompt methods only show something; the user's answer is delivered later
/// as a [`HostEvent`](super::HostEvent).
pub trait HostUi {
    /// The translation tree currently active for the series.
    fn translation_provider(&self) -> Translation;

    /// Other translations of the same series, if the host knows them.
    fn sibling_translations(&self) -> Vec<Translation> {
        Vec::new()
    }

    /// Offer to play `title` next.
    fn on_next_episode_prompt(&mut self, title: &str);

    /// The translation runs out here but another group continues.
    fn on_switch_translation_prompt(&mut self) {}

    /// Playback moved on silently; highlight and scroll to this episode.
    fn on_sync_ui_to_episode(&mut self, season_index: usize, episode_index: usize);

    fn on_translation_ended(&mut self);

    /// More than two audio tracks; let the user choose.
    fn on_audio_track_prompt(&mut self, options: &[AudioTrack]);

    /// Neither the preferred quality nor any ranked fallback is available.
    fn on_quality_fallback(&mut self, available: &[QualityLabel]);
}
