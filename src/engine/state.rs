//! Playback session state and event handling.

use super::audio::{self, AudioDecision};
use super::host::HostUi;
use super::player::MediaPlayer;
use super::types::{
    AudioTrack, EngineEvent, EngineState, HostEvent, ItemId, PlaybackRequest, PlayerEvent,
    PositionSample,
};
use crate::config::EngineSettings;
use crate::context::{NextEpisodeItem, PlaybackContext};
use crate::error::{AppError, Result};
use crate::preferences::PreferenceStore;
use crate::progress::ProgressStore;
use crate::reachability::{Reachability, next_episode};
use crate::stream::resolve_stream;
use crate::types::{ProgressKey, Translation};
use log::{debug, info, warn};

/// Why the engine is moving to the next context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    /// The player already switched to the queued item.
    Natural,
    /// The current item ended and the player is idle.
    Ended,
    /// The user accepted the "play next" prompt.
    Accepted,
}

/// Work parked behind an open quality fallback prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Start,
    /// The advance plus the outgoing sample captured when it was first tried.
    Advance(Advance, Option<PositionSample>),
}

#[derive(Debug, Clone)]
struct QueuedItem {
    id: ItemId,
    url: String,
    ready: bool,
}

/// Coordinator owning one playback session.
///
/// The engine is single-writer: every input arrives through
/// [`handle`](Self::handle), one event at a time.
pub struct PlaybackEngine<P: MediaPlayer, H: HostUi> {
    player: P,
    host: H,
    progress: Box<dyn ProgressStore>,
    preferences: Box<dyn PreferenceStore>,
    settings: EngineSettings,
    request: PlaybackRequest,
    state: EngineState,
    context: Option<PlaybackContext>,
    current_item: Option<ItemId>,
    queued: Option<QueuedItem>,
    next_id: ItemId,
    last_sample: Option<PositionSample>,
    prompt_suppressed: bool,
    siblings_in_scope: bool,
    audio_checked: Option<ItemId>,
    audio_options: Vec<AudioTrack>,
    pending: Option<Pending>,
}

impl<P: MediaPlayer, H: HostUi> PlaybackEngine<P, H> {
    pub fn new(
        request: PlaybackRequest,
        player: P,
        host: H,
        progress: Box<dyn ProgressStore>,
        preferences: Box<dyn PreferenceStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            player,
            host,
            progress,
            preferences,
            settings,
            request,
            state: EngineState::Starting,
            context: None,
            current_item: None,
            queued: None,
            next_id: 1,
            last_sample: None,
            prompt_suppressed: false,
            siblings_in_scope: true,
            audio_checked: None,
            audio_options: Vec::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn context(&self) -> Option<&PlaybackContext> {
        self.context.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn progress(&self) -> &dyn ProgressStore {
        self.progress.as_ref()
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    /// Item id of what the player is playing.
    pub fn current_item(&self) -> Option<ItemId> {
        self.current_item
    }

    /// Item id of the pre-buffered next item.
    pub fn queued_item(&self) -> Option<ItemId> {
        self.queued.as_ref().map(|queued| queued.id)
    }

    /// Resolve the requested item and start playing it.
    ///
    /// Does nothing once the session has left `Starting`.
    pub fn start(&mut self) {
        if self.state != EngineState::Starting {
            return;
        }

        let context = match self.initial_context() {
            Ok(context) => context,
            Err(AppError::UnresolvableStream { available }) => {
                warn!("No playable quality for the requested item, asking the host");
                self.pending = Some(Pending::Start);
                self.host.on_quality_fallback(&available);
                return;
            }
            Err(e) => {
                warn!("Cannot start playback: {}", e);
                self.enter_translation_ended();
                return;
            }
        };

        info!(
            "Starting {} [{}] at {}",
            context.display_title(),
            context.group_label(),
            context.quality()
        );

        let id = self.allocate_id();
        self.player.load(id, context.stream_url());
        self.current_item = Some(id);
        self.resume_seek(&context);
        self.player.play();

        self.siblings_in_scope = true;
        let context = self.with_lookahead(context);
        self.context = Some(context);
        self.state = EngineState::Playing;
    }

    /// Feed one event into the state machine.
    pub fn handle(&mut self, event: impl Into<EngineEvent>) {
        let event = event.into();
        if self.state == EngineState::Terminated {
            debug!("Ignoring {:?} after teardown", event);
            return;
        }

        match event {
            EngineEvent::Tick => self.on_tick(),
            EngineEvent::Player(event) => self.on_player_event(event),
            EngineEvent::Host(event) => self.on_host_event(event),
        }
    }

    /// Persist the final position, drop the queue and stop the player.
    pub fn teardown(&mut self) {
        if self.state == EngineState::Terminated {
            return;
        }

        if let Some(context) = self.context.clone() {
            if let Some(sample) = self.player.position().or(self.last_sample) {
                self.persist(&context.progress_key(), sample);
            }
        }

        self.discard_queue();
        self.player.stop();
        self.audio_options.clear();
        self.pending = None;
        self.state = EngineState::Terminated;
        info!("Playback session terminated");
    }

    fn on_tick(&mut self) {
        if !matches!(
            self.state,
            EngineState::Playing | EngineState::NearEnd | EngineState::TranslationEnded
        ) {
            return;
        }
        let Some(context) = self.context.clone() else {
            return;
        };
        let Some(sample) = self.player.position() else {
            return;
        };

        self.last_sample = Some(sample);
        self.persist(&context.progress_key(), sample);

        let near_end = sample
            .ratio()
            .is_some_and(|ratio| ratio >= self.settings.near_end_ratio);
        if self.state == EngineState::Playing
            && context.is_episode()
            && near_end
            && !self.prompt_suppressed
        {
            self.enter_near_end();
        }
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::ItemReady { item } => {
                if self.current_item == Some(item) {
                    self.inspect_audio(item);
                } else if let Some(queued) = self.queued.as_mut().filter(|q| q.id == item) {
                    queued.ready = true;
                }
            }
            PlayerEvent::ItemTransitioned { item } => {
                let expected = self.queued_item() == Some(item);
                if expected && matches!(self.state, EngineState::Playing | EngineState::NearEnd) {
                    self.transition(Advance::Natural);
                } else {
                    debug!("Ignoring transition to item {}", item);
                }
            }
            PlayerEvent::ItemEnded { item } => {
                if self.current_item != Some(item)
                    || !matches!(self.state, EngineState::Playing | EngineState::NearEnd)
                {
                    debug!("Ignoring end of item {}", item);
                    return;
                }
                self.on_item_ended();
            }
            PlayerEvent::AudioTracksLoaded { item, tracks } => {
                if self.current_item != Some(item) {
                    debug!("Dropping audio tracks for stale item {}", item);
                    return;
                }
                match tracks {
                    Ok(tracks) => self.apply_audio_tracks(tracks),
                    Err(e) => debug!("Audio track load failed: {}", e),
                }
            }
        }
    }

    fn on_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::NextEpisodeAccepted => {
                let has_next = self
                    .context
                    .as_ref()
                    .is_some_and(|context| context.next_item().is_some());
                if self.state == EngineState::NearEnd && has_next {
                    self.transition(Advance::Accepted);
                }
            }
            HostEvent::NextEpisodeDismissed => {
                if self.state == EngineState::NearEnd {
                    self.prompt_suppressed = true;
                    self.state = EngineState::Playing;
                }
            }
            HostEvent::AudioTrackChosen(index) => {
                if index < self.audio_options.len() {
                    self.player.select_audio_track(index);
                    self.audio_options.clear();
                }
            }
            HostEvent::QualityChosen(quality) => {
                info!("Preferred quality set to {}", quality);
                if let Err(e) = self.preferences.set_preferred_quality(Some(quality)) {
                    warn!("Failed to save preferred quality: {}", e);
                }
                match self.pending.take() {
                    Some(Pending::Start) => self.start(),
                    Some(Pending::Advance(advance, sample)) => self.advance_with(advance, sample),
                    None => {}
                }
            }
            HostEvent::Teardown => self.teardown(),
        }
    }

    fn on_item_ended(&mut self) {
        let Some(context) = self.context.clone() else {
            return;
        };

        if context.next_item().is_some() {
            self.transition(Advance::Ended);
            return;
        }

        let sample = self.outgoing_sample(&context.progress_key(), Advance::Ended);
        self.persist_outgoing(&context, sample);
        if context.is_episode() {
            self.enter_translation_ended();
        }
    }

    fn enter_near_end(&mut self) {
        let Some(context) = self.context.clone() else {
            return;
        };
        self.state = EngineState::NearEnd;

        if let Some(next) = context.next_item() {
            self.host.on_next_episode_prompt(&next.display_title());
            return;
        }

        match self.reachability(&context) {
            Some(Reachability::EndOfTranslation) => {
                info!("{} ends here, another translation continues", context.group_label());
                self.host.on_switch_translation_prompt();
            }
            Some(Reachability::Available { .. }) => {
                // the tree grew since the lookahead ran
                let context = self.with_lookahead(context);
                if let Some(next) = context.next_item() {
                    self.host.on_next_episode_prompt(&next.display_title());
                }
                self.context = Some(context);
            }
            Some(Reachability::EndOfSeries) | None => self.enter_translation_ended(),
        }
    }

    fn transition(&mut self, advance: Advance) {
        if self.pending.is_some() {
            debug!("Quality prompt still open, not advancing");
            return;
        }
        let Some(outgoing) = self.context.as_ref() else {
            return;
        };
        let sample = self.outgoing_sample(&outgoing.progress_key(), advance);
        self.advance_with(advance, sample);
    }

    /// Move to the next context, strictly in this order: save the outgoing
    /// item, advance, switch the player, resume-seek, look one item ahead,
    /// sync the host.
    fn advance_with(&mut self, advance: Advance, sample: Option<PositionSample>) {
        let Some(outgoing) = self.context.clone() else {
            return;
        };
        let resume_state = self.state;
        self.state = EngineState::Transitioning;

        self.persist_outgoing(&outgoing, sample);

        let preferred = self.preferences.preferred_quality();
        let next = match outgoing.advance(preferred.as_deref()) {
            Ok(Some(next)) => next,
            Ok(None) => {
                self.enter_translation_ended();
                return;
            }
            Err(AppError::UnresolvableStream { available }) => {
                warn!("No playable quality for the next episode, asking the host");
                self.state = resume_state;
                self.pending = Some(Pending::Advance(advance, sample));
                self.host.on_quality_fallback(&available);
                return;
            }
            Err(e) => {
                warn!("Cannot advance: {}", e);
                self.state = resume_state;
                return;
            }
        };

        info!("Advancing to {}", next.display_title());
        self.switch_player_to(&next, advance);
        self.last_sample = None;
        self.prompt_suppressed = false;
        self.audio_options.clear();

        self.resume_seek(&next);

        self.siblings_in_scope = self.settings.lookahead_includes_siblings;
        let next = self.with_lookahead(next);

        if let Some((season_index, episode_index)) = next.episode_position() {
            self.host.on_sync_ui_to_episode(season_index, episode_index);
        }

        self.context = Some(next);
        self.state = EngineState::Playing;
    }

    fn switch_player_to(&mut self, next: &PlaybackContext, advance: Advance) {
        let queued = self.queued.take();

        if advance == Advance::Natural {
            self.current_item = queued.as_ref().map(|queued| queued.id);
            if let Some(queued) = queued.filter(|queued| queued.ready) {
                self.inspect_audio(queued.id);
            }
            return;
        }

        match queued {
            Some(queued) if queued.url == next.stream_url() => {
                self.player.skip_to_next();
                self.current_item = Some(queued.id);
                if queued.ready {
                    self.inspect_audio(queued.id);
                }
            }
            stale => {
                if stale.is_some() {
                    self.player.clear_queue();
                }
                let id = self.allocate_id();
                self.player.load(id, next.stream_url());
                self.player.play();
                self.current_item = Some(id);
            }
        }
    }

    /// Attach the next item to `context` and pre-buffer its stream.
    fn with_lookahead(&mut self, context: PlaybackContext) -> PlaybackContext {
        let Some((season_index, episode_index)) = context.episode_position() else {
            return context;
        };

        let translation = self.host.translation_provider();
        let siblings = self.scoped_siblings();
        let Reachability::Available {
            season_index: next_season,
            episode_index: next_episode_index,
            folder,
        } = next_episode(&translation, season_index, episode_index, &siblings)
        else {
            debug!("No next episode after {}", context.display_title());
            return context.with_next_item(None);
        };

        let preferred = self.preferences.preferred_quality();
        let choice = resolve_stream(&folder.streams, preferred.as_deref());
        let item = NextEpisodeItem {
            season_index: next_season,
            episode_index: next_episode_index,
            folder,
            group_label: translation.group_label.clone(),
            quality: choice.as_ref().map(|choice| choice.quality.clone()),
        };

        match choice {
            Some(choice) => {
                let id = self.allocate_id();
                debug!("Pre-buffering {} as item {}", item.display_title(), id);
                self.player.enqueue(id, &choice.url);
                self.queued = Some(QueuedItem {
                    id,
                    url: choice.url,
                    ready: false,
                });
            }
            None => debug!("Next episode has no ranked quality, not pre-buffering"),
        }

        context.with_next_item(Some(item))
    }

    fn reachability(&self, context: &PlaybackContext) -> Option<Reachability> {
        let (season_index, episode_index) = context.episode_position()?;
        let translation = self.host.translation_provider();
        Some(next_episode(
            &translation,
            season_index,
            episode_index,
            &self.scoped_siblings(),
        ))
    }

    fn scoped_siblings(&self) -> Vec<Translation> {
        if self.siblings_in_scope {
            self.host.sibling_translations()
        } else {
            Vec::new()
        }
    }

    fn enter_translation_ended(&mut self) {
        self.discard_queue();
        self.state = EngineState::TranslationEnded;
        info!("Active translation has no continuation");
        self.host.on_translation_ended();
    }

    fn discard_queue(&mut self) {
        if self.queued.take().is_some() {
            self.player.clear_queue();
        }
    }

    fn resume_seek(&mut self, context: &PlaybackContext) {
        let Some(record) = self.progress.get(&context.progress_key()) else {
            return;
        };
        if record.position_seconds > self.settings.resume_threshold_secs {
            debug!("Resuming {} at {:.1}s", context.display_title(), record.position_seconds);
            self.player.seek(record.position_seconds);
        }
    }

    /// Position to save for the item being left. Finished items count at
    /// their full duration, taken from the saved record when no sample was
    /// seen yet.
    fn outgoing_sample(&self, key: &ProgressKey, advance: Advance) -> Option<PositionSample> {
        let sample = match advance {
            // the player already reports the new item
            Advance::Natural => self.last_sample,
            Advance::Ended | Advance::Accepted => self.player.position().or(self.last_sample),
        };
        match advance {
            Advance::Natural | Advance::Ended => {
                let duration = sample.map(|sample| sample.duration).or_else(|| {
                    self.progress
                        .get(key)
                        .map(|record| record.duration_seconds)
                        .filter(|duration| *duration > 0.0)
                })?;
                Some(PositionSample::new(duration, duration))
            }
            Advance::Accepted => sample,
        }
    }

    /// Save the item being left and mark it watched.
    fn persist_outgoing(&mut self, outgoing: &PlaybackContext, sample: Option<PositionSample>) {
        let key = outgoing.progress_key();
        if let Some(sample) = sample {
            self.persist(&key, sample);
        }
        self.mark_watched(&key);
    }

    fn inspect_audio(&mut self, item: ItemId) {
        if self.audio_checked != Some(item) {
            self.audio_checked = Some(item);
            self.player.request_audio_tracks(item);
        }
    }

    fn persist(&mut self, key: &ProgressKey, sample: PositionSample) {
        if let Err(e) = self.progress.set(key, sample.position, sample.duration) {
            warn!("Failed to save progress for {}: {}", key, e);
        }
        let finished = sample
            .ratio()
            .is_some_and(|ratio| ratio >= self.settings.near_end_ratio);
        if finished {
            self.mark_watched(key);
        }
    }

    fn mark_watched(&mut self, key: &ProgressKey) {
        if self.progress.is_watched(key) {
            return;
        }
        if let Err(e) = self.progress.set_watched(key, true) {
            warn!("Failed to mark {} watched: {}", key, e);
        }
    }

    fn apply_audio_tracks(&mut self, tracks: Vec<AudioTrack>) {
        match audio::decide(&tracks, &self.settings.preferred_audio_language) {
            AudioDecision::Keep => {}
            AudioDecision::Select(index) => {
                debug!("Auto-selecting audio track {}", tracks[index].label);
                self.player.select_audio_track(index);
            }
            AudioDecision::Prompt => {
                self.host.on_audio_track_prompt(&tracks);
                self.audio_options = tracks;
            }
        }
    }

    fn initial_context(&self) -> Result<PlaybackContext> {
        let preferred = self.preferences.preferred_quality();
        match &self.request {
            PlaybackRequest::Standalone {
                content_id,
                title,
                group_label,
                folder,
            } => PlaybackContext::standalone(
                content_id,
                title,
                group_label,
                folder,
                preferred.as_deref(),
            ),
            PlaybackRequest::Episode {
                content_id,
                season_index,
                episode_index,
            } => {
                let translation = self.host.translation_provider();
                PlaybackContext::episode(
                    content_id,
                    &translation,
                    *season_index,
                    *episode_index,
                    preferred.as_deref(),
                )
            }
        }
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
