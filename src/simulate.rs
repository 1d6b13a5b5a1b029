//! Simulated player and console host for the `play` command.
//!
//! The player keeps a virtual clock that a background task advances; the
//! host prints prompts and answers them on the user's behalf.

use log::{debug, info};
use nextup::engine::{
    AudioTrack, EngineEvent, HostEvent, HostUi, ItemId, MediaPlayer, PlayerEvent, PositionSample,
};
use nextup::types::{QualityLabel, Series, Translation};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time;

/// Playback state shared between the player handle and the clock task.
#[derive(Debug)]
pub struct Timeline {
    current: Option<ItemId>,
    queue: VecDeque<ItemId>,
    position: f64,
    duration: f64,
    playing: bool,
    announced: bool,
}

impl Timeline {
    pub fn new(duration: f64) -> Self {
        Self {
            current: None,
            queue: VecDeque::new(),
            position: 0.0,
            duration,
            playing: false,
            announced: false,
        }
    }

    fn switch_to(&mut self, item: Option<ItemId>) {
        self.current = item;
        self.position = 0.0;
        self.announced = false;
    }

    /// Move the clock forward by `seconds` and report what happened.
    fn advance(&mut self, seconds: f64) -> Option<PlayerEvent> {
        let current = self.current?;
        if !self.playing {
            return None;
        }
        if !self.announced {
            self.announced = true;
            return Some(PlayerEvent::ItemReady { item: current });
        }

        self.position = (self.position + seconds).min(self.duration);
        if self.position < self.duration {
            return None;
        }

        match self.queue.pop_front() {
            Some(next) => {
                self.switch_to(Some(next));
                Some(PlayerEvent::ItemTransitioned { item: next })
            }
            None => {
                self.playing = false;
                Some(PlayerEvent::ItemEnded { item: current })
            }
        }
    }
}

fn lock(timeline: &Mutex<Timeline>) -> MutexGuard<'_, Timeline> {
    timeline.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Advance `timeline` every 100ms of wall time, `speed` times faster.
pub fn spawn_clock(
    timeline: Arc<Mutex<Timeline>>,
    events: UnboundedSender<EngineEvent>,
    speed: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let step = Duration::from_millis(100);
        let mut ticker = time::interval(step);
        loop {
            ticker.tick().await;
            let event = lock(&timeline).advance(step.as_secs_f64() * speed);
            if let Some(event) = event {
                debug!("Player: {:?}", event);
                if events.send(event.into()).is_err() {
                    break;
                }
            }
        }
    })
}

/// Player handle the engine drives.
pub struct SimulatedPlayer {
    timeline: Arc<Mutex<Timeline>>,
    events: UnboundedSender<EngineEvent>,
}

impl SimulatedPlayer {
    pub fn new(timeline: Arc<Mutex<Timeline>>, events: UnboundedSender<EngineEvent>) -> Self {
        Self { timeline, events }
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn load(&mut self, item: ItemId, url: &str) {
        info!("Loading {}", url);
        let mut timeline = lock(&self.timeline);
        timeline.queue.clear();
        timeline.playing = false;
        timeline.switch_to(Some(item));
    }

    fn seek(&mut self, seconds: f64) {
        let mut timeline = lock(&self.timeline);
        timeline.position = seconds.clamp(0.0, timeline.duration);
    }

    fn play(&mut self) {
        lock(&self.timeline).playing = true;
    }

    fn enqueue(&mut self, item: ItemId, url: &str) {
        debug!("Queued {}", url);
        lock(&self.timeline).queue.push_back(item);
    }

    fn skip_to_next(&mut self) {
        let mut timeline = lock(&self.timeline);
        let next = timeline.queue.pop_front();
        timeline.switch_to(next);
        timeline.playing = true;
    }

    fn clear_queue(&mut self) {
        lock(&self.timeline).queue.clear();
    }

    fn stop(&mut self) {
        let mut timeline = lock(&self.timeline);
        timeline.playing = false;
        timeline.switch_to(None);
    }

    fn position(&self) -> Option<PositionSample> {
        let timeline = lock(&self.timeline);
        timeline
            .current
            .map(|_| PositionSample::new(timeline.position, timeline.duration))
    }

    fn request_audio_tracks(&mut self, item: ItemId) {
        let tracks = vec![
            AudioTrack {
                label: "Original".to_string(),
                language: Some("ja".to_string()),
                is_default: true,
            },
            AudioTrack {
                label: "English".to_string(),
                language: Some("en".to_string()),
                is_default: false,
            },
        ];
        let _ = self.events.send(
            PlayerEvent::AudioTracksLoaded {
                item,
                tracks: Ok(tracks),
            }
            .into(),
        );
    }

    fn select_audio_track(&mut self, index: usize) {
        println!("Audio track switched to #{}", index + 1);
    }
}

/// Host that prints to the terminal.
pub struct ConsoleHost {
    series: Series,
    active: String,
    events: UnboundedSender<EngineEvent>,
    auto_accept: bool,
}

impl ConsoleHost {
    pub fn new(
        series: Series,
        active: String,
        events: UnboundedSender<EngineEvent>,
        auto_accept: bool,
    ) -> Self {
        Self {
            series,
            active,
            events,
            auto_accept,
        }
    }

    fn send(&self, event: HostEvent) {
        let _ = self.events.send(event.into());
    }
}

impl HostUi for ConsoleHost {
    fn translation_provider(&self) -> Translation {
        self.series
            .translation(&self.active)
            .cloned()
            .unwrap_or_else(|| Translation::new(&self.active, Vec::new()))
    }

    fn sibling_translations(&self) -> Vec<Translation> {
        self.series.siblings(&self.active)
    }

    fn on_next_episode_prompt(&mut self, title: &str) {
        println!("Up next: {}", title);
        if self.auto_accept {
            self.send(HostEvent::NextEpisodeAccepted);
        }
    }

    fn on_switch_translation_prompt(&mut self) {
        println!(
            "{} has no more episodes, but another translation continues. Use --group to switch.",
            self.active
        );
    }

    fn on_sync_ui_to_episode(&mut self, season_index: usize, episode_index: usize) {
        println!("Now playing S{} E{}", season_index + 1, episode_index + 1);
    }

    fn on_translation_ended(&mut self) {
        println!("No more episodes in {}.", self.active);
        self.send(HostEvent::Teardown);
    }

    fn on_audio_track_prompt(&mut self, options: &[AudioTrack]) {
        for (i, track) in options.iter().enumerate() {
            println!("  [{}] {}", i + 1, track.label);
        }
        self.send(HostEvent::AudioTrackChosen(0));
    }

    fn on_quality_fallback(&mut self, available: &[QualityLabel]) {
        match available.first() {
            Some(label) => {
                println!("Preferred quality unavailable, using {}", label);
                self.send(HostEvent::QualityChosen(label.clone()));
            }
            None => {
                eprintln!("Error: no streams available.");
                self.send(HostEvent::Teardown);
            }
        }
    }
}
