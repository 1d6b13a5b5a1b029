//! The media player capability the engine drives.

use super::types::{ItemId, PositionSample};

/// Opaque decode/render pipeline.
///
/// Calls are commands only; everything the player has to say comes back as
/// [`PlayerEvent`](super::PlayerEvent)s on the engine's event channel.
pub trait MediaPlayer {
    /// Replace whatever is playing with `url`, paused at the start.
    fn load(&mut self, item: ItemId, url: &str);

    fn seek(&mut self, seconds: f64);

    fn play(&mut self);

    /// Queue `url` behind the current item so it can pre-buffer.
    fn enqueue(&mut self, item: ItemId, url: &str);

    /// Jump to the first queued item.
    fn skip_to_next(&mut self);

    /// Drop every queued item without playing it.
    fn clear_queue(&mut self);

    fn stop(&mut self);

    /// Position of the current item, `None` before anything is loaded.
    fn position(&self) -> Option<PositionSample>;

    /// Start loading the audio track list; the answer arrives as
    /// `PlayerEvent::AudioTracksLoaded`.
    fn request_audio_tracks(&mut self, item: ItemId);

    fn select_audio_track(&mut self, index: usize);
}
