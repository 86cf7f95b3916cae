//! Top-level narration controller
//!
//! Owns the catalog, the scheduler, the overlay and the animation clock, and
//! pushes the resulting face image to a display sink. Everything runs on the
//! caller's thread: `update` is one cooperative pass that handles whatever
//! became due since the last call.

use std::sync::Arc;
use std::time::Duration;

use super::animation::{AnimationClock, AnimationConfig, FaceState};
use super::audio::AudioTransport;
use super::catalog::{StoryCatalog, StoryEntry, StorySource};
use super::clock::Clock;
use super::display::DisplaySink;
use super::overlay::EmotionOverlay;
use super::scheduler::{PlaybackScheduler, PlaybackState};
use super::types::{NarrationResult, EMOTION_DELAY};

/// Engine timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorConfig {
    pub animation: AnimationConfig,
    pub emotion_delay: Duration,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            emotion_delay: EMOTION_DELAY,
        }
    }
}

pub struct Narrator<A: AudioTransport, D: DisplaySink, C: Clock> {
    catalog: StoryCatalog,
    scheduler: PlaybackScheduler<A>,
    overlay: EmotionOverlay,
    animation: AnimationClock,
    display: D,
    clock: C,
    selected: Option<usize>,
}

impl<A: AudioTransport, D: DisplaySink, C: Clock> Narrator<A, D, C> {
    /// Create a narrator with an empty catalog. The idle face starts
    /// animating straight away.
    pub fn new(audio: A, display: D, clock: C, config: NarratorConfig) -> Self {
        let now = clock.now();
        Self {
            catalog: StoryCatalog::new(),
            scheduler: PlaybackScheduler::new(audio),
            overlay: EmotionOverlay::new(config.emotion_delay),
            animation: AnimationClock::new(config.animation, now),
            display,
            clock,
            selected: None,
        }
    }

    pub fn with_catalog(mut self, catalog: StoryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the catalog from a story source. On failure the current
    /// catalog and playback are left alone.
    pub fn load_catalog(&mut self, source: &dyn StorySource, index_ref: &str) -> NarrationResult<usize> {
        Ok(self.catalog.load(source, index_ref)?)
    }

    pub fn catalog(&self) -> &StoryCatalog {
        &self.catalog
    }

    pub fn stories(&self) -> Vec<StoryEntry> {
        self.catalog.entries()
    }

    /// Select story `index`; playback stays stopped until `resume`
    pub fn select_story(&mut self, index: usize) -> NarrationResult<()> {
        let story = self.catalog.get(index)?;
        let now = self.clock.now();

        self.overlay.clear();
        let result = self.scheduler.select_story(story);
        self.selected = result.is_ok().then_some(index);
        self.sync_animation(now);
        self.render(now);
        Ok(result?)
    }

    /// Start or continue the narration. Returns false if nothing started.
    pub fn resume(&mut self) -> NarrationResult<bool> {
        let now = self.clock.now();
        let started = self.scheduler.resume(now)?;
        if started {
            self.sync_animation(now);
            self.render(now);
        }
        Ok(started)
    }

    /// Pause the narration; the mouth snaps shut at once
    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        let paused = self.scheduler.pause();
        if paused {
            self.sync_animation(now);
            self.render(now);
        }
        paused
    }

    /// Pause when playing, resume otherwise. Returns whether it is playing now.
    pub fn toggle(&mut self) -> NarrationResult<bool> {
        if self.scheduler.is_playing() {
            self.pause();
        } else {
            self.resume()?;
        }
        Ok(self.scheduler.is_playing())
    }

    /// Select the current story again and play it from the start
    pub fn restart(&mut self) -> NarrationResult<bool> {
        let Some(story) = self.scheduler.story().map(Arc::clone) else {
            return Ok(false);
        };
        let now = self.clock.now();
        self.overlay.clear();
        self.scheduler.select_story(story)?;
        self.sync_animation(now);
        self.resume()
    }

    /// Service everything that is due
    pub fn update(&mut self) {
        let now = self.clock.now();
        let mut changed = false;

        while let Some(fired) = self.scheduler.poll(now) {
            log::debug!("Cue {} fired: {}", fired.index, fired.emotion);
            changed |= self.overlay.activate(&fired.emotion, now);
        }

        let ended = self.scheduler.poll_audio();
        if ended {
            self.sync_animation(now);
        }

        changed |= self.overlay.poll(now);
        let render_due = self.animation.render_due(now);

        // While paused or ended the shown face stays as it was frozen; only
        // the transition into the end snaps the mouth shut.
        if ended || (!self.scheduler.is_paused() && (render_due || changed)) {
            self.render(now);
        }
    }

    /// Earliest time `update` has work to do
    pub fn next_deadline(&self) -> Duration {
        let now = self.clock.now();
        [self.scheduler.next_deadline(), self.overlay.next_deadline()]
            .into_iter()
            .flatten()
            .fold(self.animation.next_deadline(now), Duration::min)
    }

    pub fn face_state(&self) -> FaceState {
        self.face_state_at(self.clock.now())
    }

    fn face_state_at(&self, now: Duration) -> FaceState {
        self.animation.face_state(
            now,
            self.overlay.current(),
            self.scheduler.mouth_forced_shut(),
            self.scheduler.is_paused(),
        )
    }

    fn sync_animation(&mut self, now: Duration) {
        if self.scheduler.is_paused() {
            self.animation.freeze(now);
        } else {
            self.animation.thaw(now);
        }
    }

    fn render(&mut self, now: Duration) {
        let state = self.face_state_at(now);
        let image = state.image(self.animation.images());
        self.display.show(image);
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn scheduler(&self) -> &PlaybackScheduler<A> {
        &self.scheduler
    }

    pub fn overlay(&self) -> &EmotionOverlay {
        &self.overlay
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
