//! Idle face animation
//!
//! Blink and mouth movement are fixed-period cycles with an "active"
//! sub-phase (eyes closed, mouth closed) at the start of each period. A
//! separate render cycle decides when the visible image is recomputed.
//! Cycles are computed from an origin rather than accumulated, and can be
//! frozen in place while playback is paused.

use std::time::Duration;

use super::overlay::Emotion;
use super::types::{BLINK_DURATION, BLINK_PERIOD, MOUTH_DURATION, MOUTH_PERIOD, RENDER_PERIOD};

/// Timing of the animation cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    pub blink_period: Duration,
    pub blink_duration: Duration,
    pub mouth_period: Duration,
    pub mouth_duration: Duration,
    pub render_period: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            blink_period: BLINK_PERIOD,
            blink_duration: BLINK_DURATION,
            mouth_period: MOUTH_PERIOD,
            mouth_duration: MOUTH_DURATION,
            render_period: RENDER_PERIOD,
        }
    }
}

/// A repeating cycle with an active sub-phase
///
/// The first period runs inactive; every later period starts with `active`
/// worth of active time.
#[derive(Debug, Clone, Copy)]
pub struct Cycle {
    period: Duration,
    active: Duration,
    origin: Duration,
    /// Elapsed time captured when frozen
    frozen_at: Option<Duration>,
}

impl Cycle {
    pub fn new(period: Duration, active: Duration, now: Duration) -> Self {
        Self {
            period,
            active: active.min(period),
            origin: now,
            frozen_at: None,
        }
    }

    fn elapsed(&self, now: Duration) -> Duration {
        match self.frozen_at {
            Some(elapsed) => elapsed,
            None => now.saturating_sub(self.origin),
        }
    }

    fn phase(&self, elapsed: Duration) -> Duration {
        let period = self.period.as_nanos();
        Duration::from_nanos((elapsed.as_nanos() % period) as u64)
    }

    /// Whether the cycle is inside its active sub-phase
    pub fn is_active(&self, now: Duration) -> bool {
        if self.period.is_zero() {
            return false;
        }
        let elapsed = self.elapsed(now);
        elapsed >= self.period && self.phase(elapsed) < self.active
    }

    /// Stop the cycle where it is
    pub fn freeze(&mut self, now: Duration) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(now.saturating_sub(self.origin));
        }
    }

    /// Continue the cycle from where it was frozen
    pub fn thaw(&mut self, now: Duration) {
        if let Some(elapsed) = self.frozen_at.take() {
            self.origin = now.saturating_sub(elapsed);
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }

    /// When `is_active` will next change value
    pub fn next_transition(&self, now: Duration) -> Option<Duration> {
        if self.frozen_at.is_some() || self.period.is_zero() {
            return None;
        }
        let elapsed = self.elapsed(now);
        if elapsed < self.period {
            return Some(self.origin + self.period);
        }
        let phase = self.phase(elapsed);
        if phase < self.active {
            Some(now + (self.active - phase))
        } else {
            Some(now + (self.period - phase))
        }
    }
}

/// Image ids for the four idle compositions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceImages {
    /// Indexed as `[blinking][mouth_closed]`
    table: [[String; 2]; 2],
}

impl FaceImages {
    pub fn new(
        open_talking: &str,
        open_shut: &str,
        blink_talking: &str,
        blink_shut: &str,
    ) -> Self {
        Self {
            table: [
                [open_talking.to_string(), open_shut.to_string()],
                [blink_talking.to_string(), blink_shut.to_string()],
            ],
        }
    }

    pub fn lookup(&self, blinking: bool, mouth_closed: bool) -> &str {
        &self.table[blinking as usize][mouth_closed as usize]
    }
}

impl Default for FaceImages {
    fn default() -> Self {
        Self::new(
            "face/eyes_open_mouth_open.png",
            "face/eyes_open_mouth_closed.png",
            "face/eyes_closed_mouth_open.png",
            "face/eyes_closed_mouth_closed.png",
        )
    }
}

/// Everything that decides the visible face at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceState {
    pub blinking: bool,
    pub mouth_closed: bool,
    pub overlay: Option<Emotion>,
    pub paused: bool,
}

impl FaceState {
    /// The image to show. An active overlay wins over the idle composition.
    pub fn image<'a>(&self, images: &'a FaceImages) -> &'a str {
        match self.overlay {
            Some(emotion) => emotion.image(),
            None => images.lookup(self.blinking, self.mouth_closed),
        }
    }
}

/// Drives the blink, mouth and render cycles
#[derive(Debug, Clone)]
pub struct AnimationClock {
    blink: Cycle,
    mouth: Cycle,
    render_period: Duration,
    next_render: Duration,
    images: FaceImages,
}

impl AnimationClock {
    /// Start all cycles at `now`; the first render is due immediately
    pub fn new(config: AnimationConfig, now: Duration) -> Self {
        Self {
            blink: Cycle::new(config.blink_period, config.blink_duration, now),
            mouth: Cycle::new(config.mouth_period, config.mouth_duration, now),
            render_period: config.render_period,
            next_render: now,
            images: FaceImages::default(),
        }
    }

    pub fn with_images(mut self, images: FaceImages) -> Self {
        self.images = images;
        self
    }

    pub fn images(&self) -> &FaceImages {
        &self.images
    }

    pub fn blinking(&self, now: Duration) -> bool {
        self.blink.is_active(now)
    }

    pub fn mouth_closed(&self, now: Duration) -> bool {
        self.mouth.is_active(now)
    }

    /// Freeze blink and mouth where they are
    pub fn freeze(&mut self, now: Duration) {
        self.blink.freeze(now);
        self.mouth.freeze(now);
    }

    pub fn thaw(&mut self, now: Duration) {
        self.blink.thaw(now);
        self.mouth.thaw(now);
    }

    pub fn is_frozen(&self) -> bool {
        self.blink.is_frozen()
    }

    /// Compose the face state from the cycles and the playback inputs
    pub fn face_state(
        &self,
        now: Duration,
        overlay: Option<Emotion>,
        force_mouth_shut: bool,
        paused: bool,
    ) -> FaceState {
        FaceState {
            blinking: self.blinking(now),
            mouth_closed: force_mouth_shut || self.mouth_closed(now),
            overlay,
            paused,
        }
    }

    /// Consume a render tick if one is due
    pub fn render_due(&mut self, now: Duration) -> bool {
        if now < self.next_render {
            return false;
        }
        self.next_render = now + self.render_period;
        true
    }

    /// Earliest time the clock needs servicing
    pub fn next_deadline(&self, now: Duration) -> Duration {
        [
            Some(self.next_render),
            self.blink.next_transition(now),
            self.mouth.next_transition(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(self.next_render)
    }
}
