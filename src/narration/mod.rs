//! Story narration engine
//!
//! This module drives a simulated robot face while a pre-recorded story is
//! narrated, switching to emotion images at the times the story lists.
//!
//! # Architecture
//!
//! The engine consists of:
//! - Timeline of emotion cues for the selected story
//! - Animation clock for blinking and mouth movement
//! - Emotion overlay that temporarily replaces the idle face
//! - Playback scheduler that arms cues against the audio position
//! - Story catalog loaded from an index of story documents
//!
//! # Threading
//!
//! Everything is single-threaded and cooperative. Delayed actions are
//! timers in a `TimerQueue` and only run from `Narrator::update`, so a timer
//! revoked by pause or story change can never fire afterwards.

pub mod animation;
pub mod audio;
pub mod catalog;
pub mod clock;
pub mod display;
pub mod narrator;
pub mod overlay;
pub mod scheduler;
pub mod timeline;
pub mod timer;
pub mod types;

pub use animation::{AnimationClock, AnimationConfig, Cycle, FaceImages, FaceState};
pub use audio::{AudioEvent, AudioTransport, SimulatedAudio};
pub use catalog::{FileStorySource, Story, StoryCatalog, StoryDocument, StoryEntry, StorySource};
pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{DisplaySink, LogDisplay, MemoryDisplay};
pub use narrator::{Narrator, NarratorConfig};
pub use overlay::{Emotion, EmotionOverlay};
pub use scheduler::{FiredCue, PlaybackScheduler, PlaybackState};
pub use timeline::{Cue, Timeline};
pub use timer::{TimerId, TimerQueue};
pub use types::{AudioError, CatalogError, NarrationError, NarrationResult};
