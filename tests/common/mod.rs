//! Fakes shared by the integration tests.

#![allow(dead_code)]

use nextup::config::EngineSettings;
use nextup::engine::{
    AudioTrack, HostUi, ItemId, MediaPlayer, PlaybackEngine, PlaybackRequest, PositionSample,
};
use nextup::error::{AppError, Result};
use nextup::preferences::MemoryPreferences;
use nextup::progress::{MemoryProgressStore, ProgressStore};
use nextup::types::{EpisodeFolder, ProgressKey, ProgressRecord, Translation};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything observable the engine did, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(ItemId, String),
    Seek(f64),
    Play,
    Enqueue(ItemId, String),
    SkipToNext,
    ClearQueue,
    Stop,
    RequestAudio(ItemId),
    SelectAudio(usize),
    Persist(String, f64),
    Watched(String),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<Call>,
    pub position: Option<PositionSample>,
}

pub type Shared = Rc<RefCell<Recorder>>;

pub fn calls(shared: &Shared) -> Vec<Call> {
    shared.borrow().calls.clone()
}

pub fn set_position(shared: &Shared, position: f64, duration: f64) {
    shared.borrow_mut().position = Some(PositionSample::new(position, duration));
}

pub fn clear_calls(shared: &Shared) {
    shared.borrow_mut().calls.clear();
}

pub struct FakePlayer(pub Shared);

impl FakePlayer {
    fn push(&mut self, call: Call) {
        self.0.borrow_mut().calls.push(call);
    }
}

impl MediaPlayer for FakePlayer {
    fn load(&mut self, item: ItemId, url: &str) {
        self.push(Call::Load(item, url.to_string()));
    }

    fn seek(&mut self, seconds: f64) {
        self.push(Call::Seek(seconds));
    }

    fn play(&mut self) {
        self.push(Call::Play);
    }

    fn enqueue(&mut self, item: ItemId, url: &str) {
        self.push(Call::Enqueue(item, url.to_string()));
    }

    fn skip_to_next(&mut self) {
        self.push(Call::SkipToNext);
    }

    fn clear_queue(&mut self) {
        self.push(Call::ClearQueue);
    }

    fn stop(&mut self) {
        self.push(Call::Stop);
    }

    fn position(&self) -> Option<PositionSample> {
        self.0.borrow().position
    }

    fn request_audio_tracks(&mut self, item: ItemId) {
        self.push(Call::RequestAudio(item));
    }

    fn select_audio_track(&mut self, index: usize) {
        self.push(Call::SelectAudio(index));
    }
}

/// Memory store that also logs writes into the shared call list.
pub struct LoggingStore {
    inner: MemoryProgressStore,
    log: Shared,
}

impl ProgressStore for LoggingStore {
    fn get(&self, key: &ProgressKey) -> Option<ProgressRecord> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &ProgressKey, position_seconds: f64, duration_seconds: f64) -> Result<()> {
        self.log
            .borrow_mut()
            .calls
            .push(Call::Persist(key.to_string(), position_seconds));
        self.inner.set(key, position_seconds, duration_seconds)
    }

    fn set_watched(&mut self, key: &ProgressKey, watched: bool) -> Result<()> {
        if watched {
            self.log
                .borrow_mut()
                .calls
                .push(Call::Watched(key.to_string()));
        }
        self.inner.set_watched(key, watched)
    }
}

/// Store whose writes always fail, as with a full disk.
pub struct FailingStore;

impl ProgressStore for FailingStore {
    fn get(&self, _key: &ProgressKey) -> Option<ProgressRecord> {
        None
    }

    fn set(&mut self, key: &ProgressKey, _position: f64, _duration: f64) -> Result<()> {
        Err(AppError::Store(format!("cannot write {}", key)))
    }

    fn set_watched(&mut self, key: &ProgressKey, _watched: bool) -> Result<()> {
        Err(AppError::Store(format!("cannot write {}", key)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    NextPrompt(String),
    SwitchPrompt,
    Sync(usize, usize),
    TranslationEnded,
    AudioPrompt(usize),
    QualityFallback(Vec<String>),
}

pub struct FakeHost {
    pub translation: Translation,
    pub siblings: Vec<Translation>,
    pub calls: Vec<HostCall>,
}

impl HostUi for FakeHost {
    fn translation_provider(&self) -> Translation {
        self.translation.clone()
    }

    fn sibling_translations(&self) -> Vec<Translation> {
        self.siblings.clone()
    }

    fn on_next_episode_prompt(&mut self, title: &str) {
        self.calls.push(HostCall::NextPrompt(title.to_string()));
    }

    fn on_switch_translation_prompt(&mut self) {
        self.calls.push(HostCall::SwitchPrompt);
    }

    fn on_sync_ui_to_episode(&mut self, season_index: usize, episode_index: usize) {
        self.calls.push(HostCall::Sync(season_index, episode_index));
    }

    fn on_translation_ended(&mut self) {
        self.calls.push(HostCall::TranslationEnded);
    }

    fn on_audio_track_prompt(&mut self, options: &[AudioTrack]) {
        self.calls.push(HostCall::AudioPrompt(options.len()));
    }

    fn on_quality_fallback(&mut self, available: &[String]) {
        self.calls.push(HostCall::QualityFallback(available.to_vec()));
    }
}

pub type TestEngine = PlaybackEngine<FakePlayer, FakeHost>;

/// Episode folder with 1080p and 720p streams named after the title.
pub fn ep(title: &str) -> EpisodeFolder {
    EpisodeFolder {
        title: title.to_string(),
        streams: [
            ("1080p".to_string(), format!("{}@1080p", title)),
            ("720p".to_string(), format!("{}@720p", title)),
        ]
        .into_iter()
        .collect(),
    }
}

/// Translation whose season `s` has `shape[s]` episodes titled `S{s}E{e}`.
pub fn translation(label: &str, shape: &[usize]) -> Translation {
    Translation::new(
        label,
        shape
            .iter()
            .enumerate()
            .map(|(s, count)| {
                (0..*count)
                    .map(|e| ep(&format!("S{}E{}", s + 1, e + 1)))
                    .collect()
            })
            .collect(),
    )
}

pub fn episode_request(season_index: usize, episode_index: usize) -> PlaybackRequest {
    PlaybackRequest::Episode {
        content_id: "show".to_string(),
        season_index,
        episode_index,
    }
}

pub struct Harness {
    pub request: PlaybackRequest,
    pub translation: Translation,
    pub siblings: Vec<Translation>,
    pub store: MemoryProgressStore,
    pub preferred: Option<String>,
    pub settings: EngineSettings,
    pub failing_store: bool,
}

impl Harness {
    pub fn new(translation: Translation, request: PlaybackRequest) -> Self {
        Self {
            request,
            translation,
            siblings: Vec::new(),
            store: MemoryProgressStore::new(),
            preferred: None,
            settings: EngineSettings::default(),
            failing_store: false,
        }
    }

    pub fn siblings(mut self, siblings: Vec<Translation>) -> Self {
        self.siblings = siblings;
        self
    }

    pub fn saved(mut self, key: ProgressKey, position_seconds: f64) -> Self {
        self.store.insert(
            key,
            ProgressRecord {
                position_seconds,
                duration_seconds: 1000.0,
                watched: false,
                updated_at: 1,
            },
        );
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn failing_store(mut self) -> Self {
        self.failing_store = true;
        self
    }

    pub fn build(self) -> (TestEngine, Shared) {
        let shared: Shared = Rc::new(RefCell::new(Recorder::default()));
        let host = FakeHost {
            translation: self.translation,
            siblings: self.siblings,
            calls: Vec::new(),
        };
        let store: Box<dyn ProgressStore> = if self.failing_store {
            Box::new(FailingStore)
        } else {
            Box::new(LoggingStore {
                inner: self.store,
                log: shared.clone(),
            })
        };
        let engine = PlaybackEngine::new(
            self.request,
            FakePlayer(shared.clone()),
            host,
            store,
            Box::new(MemoryPreferences::new(self.preferred.as_deref())),
            self.settings,
        );
        (engine, shared)
    }
}

/// Build and start an engine at `(season_index, episode_index)` of `translation`.
pub fn started(translation: Translation, season_index: usize, episode_index: usize) -> (TestEngine, Shared) {
    let (mut engine, shared) =
        Harness::new(translation, episode_request(season_index, episode_index)).build();
    engine.start();
    (engine, shared)
}

pub fn position_of(calls: &[Call], wanted: &Call) -> usize {
    calls
        .iter()
        .position(|call| call == wanted)
        .unwrap_or_else(|| panic!("{:?} not found in {:?}", wanted, calls))
}
