//! Emotion cue timeline for a loaded story
//!
//! Cues are kept in authoring order. Nothing here sorts or filters them; the
//! scheduler decides which cues to arm.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::catalog::Story;

/// A timed emotion cue, offset from the start of the narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Offset from narration start in seconds
    pub time: f64,
    /// Emotion key, resolved by the overlay
    pub emotion: String,
}

impl Cue {
    pub fn new(time: f64, emotion: &str) -> Self {
        Self {
            time,
            emotion: emotion.to_string(),
        }
    }
}

/// Cue sequence of the selected story plus per-cue consumption state
#[derive(Debug, Clone)]
pub struct Timeline {
    story: Arc<Story>,
    consumed: Vec<bool>,
}

impl Timeline {
    /// Install a story's cues with every cue unconsumed
    pub fn new(story: Arc<Story>) -> Self {
        let consumed = vec![false; story.cues.len()];
        Self { story, consumed }
    }

    pub fn story(&self) -> &Arc<Story> {
        &self.story
    }

    pub fn cues(&self) -> &[Cue] {
        &self.story.cues
    }

    pub fn cue(&self, index: usize) -> Option<&Cue> {
        self.story.cues.get(index)
    }

    /// Mark every cue as not yet shown
    pub fn reset(&mut self) {
        self.consumed.iter_mut().for_each(|c| *c = false);
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.get(index).copied().unwrap_or(false)
    }

    /// Mark a cue as shown. Returns false if it was already consumed.
    pub fn consume(&mut self, index: usize) -> bool {
        match self.consumed.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }

    /// Cues not yet shown, in authoring order
    pub fn unconsumed(&self) -> impl Iterator<Item = (usize, &Cue)> {
        self.story
            .cues
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.consumed[*i])
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.iter().filter(|c| **c).count()
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}
