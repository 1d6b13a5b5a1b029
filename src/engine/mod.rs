//! Episodic playback continuity engine.
//!
//! A [`PlaybackEngine`] owns one playback session. It starts the requested
//! item, pre-buffers the next episode, saves progress on a fixed cadence,
//! raises the "play next" prompt near the end of an episode and follows the
//! player into the next episode when it gets there.
//!
//! All inputs are [`EngineEvent`]s. [`PlaybackEngine::run`] serializes timer
//! ticks and the events arriving on a channel onto a single task, so the
//! engine itself needs no locks.

mod audio;
mod host;
mod player;
mod state;
mod types;

pub use host::HostUi;
pub use player::MediaPlayer;
pub use state::PlaybackEngine;
pub use types::{
    AudioTrack, EngineEvent, EngineState, HostEvent, ItemId, PlaybackRequest, PlayerEvent,
    PositionSample,
};

use log::debug;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

impl<P: MediaPlayer, H: HostUi> PlaybackEngine<P, H> {
    /// Drive the session until it is torn down.
    ///
    /// Ticks fire every `tick_interval` of wall time. Closing the channel
    /// counts as a teardown. The engine is handed back for inspection.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<EngineEvent>) -> Self {
        self.start();

        let period = self.settings().tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.state() != EngineState::Terminated {
            tokio::select! {
                _ = ticker.tick() => self.handle(EngineEvent::Tick),
                event = events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        debug!("Event channel closed, tearing down");
                        self.teardown();
                    }
                },
            }
        }

        self
    }
}
