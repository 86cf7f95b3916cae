//! Transient emotion overlay
//!
//! A fired cue puts an emotion on the face for a fixed time. Each activation
//! bumps a generation counter and replaces the pending auto-clear, so a clear
//! scheduled by an older activation can never remove a newer emotion.

use std::time::Duration;

use super::timer::TimerQueue;
use super::types::EMOTION_DELAY;

/// Emotions the face can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Joie,
    Tristesse,
    Colere,
    Peur,
    Surprise,
    Degout,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Joie,
        Emotion::Tristesse,
        Emotion::Colere,
        Emotion::Peur,
        Emotion::Surprise,
        Emotion::Degout,
    ];

    /// Resolve a cue key. Unknown keys have no display mapping.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "joie" => Some(Emotion::Joie),
            "tristesse" => Some(Emotion::Tristesse),
            "colere" | "colère" => Some(Emotion::Colere),
            "peur" => Some(Emotion::Peur),
            "surprise" => Some(Emotion::Surprise),
            "degout" | "dégoût" => Some(Emotion::Degout),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Emotion::Joie => "joie",
            Emotion::Tristesse => "tristesse",
            Emotion::Colere => "colere",
            Emotion::Peur => "peur",
            Emotion::Surprise => "surprise",
            Emotion::Degout => "degout",
        }
    }

    pub fn image(self) -> &'static str {
        match self {
            Emotion::Joie => "emotions/joie.png",
            Emotion::Tristesse => "emotions/tristesse.png",
            Emotion::Colere => "emotions/colere.png",
            Emotion::Peur => "emotions/peur.png",
            Emotion::Surprise => "emotions/surprise.png",
            Emotion::Degout => "emotions/degout.png",
        }
    }
}

/// The currently displayed emotion, if any, and its pending auto-clear
#[derive(Debug)]
pub struct EmotionOverlay {
    active: Option<Emotion>,
    generation: u64,
    delay: Duration,
    clears: TimerQueue<u64>,
}

impl EmotionOverlay {
    pub fn new(delay: Duration) -> Self {
        Self {
            active: None,
            generation: 0,
            delay,
            clears: TimerQueue::new(),
        }
    }

    /// Show the emotion for `key`. Returns false, changing nothing, when the
    /// key has no display mapping.
    pub fn activate(&mut self, key: &str, now: Duration) -> bool {
        let Some(emotion) = Emotion::from_key(key) else {
            log::debug!("Ignoring unknown emotion '{}'", key);
            return false;
        };

        self.generation += 1;
        self.clears.cancel_all();
        self.clears.schedule(now, self.delay, self.generation);
        self.active = Some(emotion);
        log::debug!("Overlay -> {} (generation {})", emotion.key(), self.generation);
        true
    }

    /// Run due auto-clears. Returns true if the overlay was cleared.
    pub fn poll(&mut self, now: Duration) -> bool {
        let mut cleared = false;
        while let Some((_, generation)) = self.clears.pop_due(now) {
            if generation == self.generation && self.active.is_some() {
                self.active = None;
                cleared = true;
            }
        }
        cleared
    }

    /// The single accessor the renderer reads
    pub fn current(&self) -> Option<Emotion> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Drop the overlay and its pending clear
    pub fn clear(&mut self) {
        self.clears.cancel_all();
        self.active = None;
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.clears.next_deadline()
    }
}

impl Default for EmotionOverlay {
    fn default() -> Self {
        Self::new(EMOTION_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn secs(v: u64) -> Duration {
        Duration::from_secs(v)
    }

    #[rstest]
    #[case("joie", Some(Emotion::Joie))]
    #[case("peur", Some(Emotion::Peur))]
    #[case("colère", Some(Emotion::Colere))]
    #[case("dégoût", Some(Emotion::Degout))]
    #[case("ennui", None)]
    #[case("", None)]
    fn test_emotion_from_key(#[case] key: &str, #[case] expected: Option<Emotion>) {
        assert_eq!(Emotion::from_key(key), expected);
    }

    #[test]
    fn test_keys_round_trip() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_key(emotion.key()), Some(emotion));
        }
    }

    #[test]
    fn test_activate_and_expire() {
        let mut overlay = EmotionOverlay::new(secs(3));
        assert!(overlay.activate("joie", secs(2)));
        assert_eq!(overlay.current(), Some(Emotion::Joie));

        assert!(!overlay.poll(secs(4)));
        assert!(overlay.is_active());

        assert!(overlay.poll(secs(5)));
        assert_eq!(overlay.current(), None);
    }

    #[test]
    fn test_unknown_emotion_keeps_state() {
        let mut overlay = EmotionOverlay::new(secs(3));
        overlay.activate("peur", secs(0));

        assert!(!overlay.activate("ennui", secs(1)));
        assert_eq!(overlay.current(), Some(Emotion::Peur));
        assert_eq!(overlay.next_deadline(), Some(secs(3)));
    }

    #[test]
    fn test_newer_activation_not_cleared_by_stale_timer() {
        let mut overlay = EmotionOverlay::new(secs(3));
        overlay.activate("joie", secs(0));
        overlay.activate("peur", secs(2));

        // The first activation's clear would have been at 3s
        assert!(!overlay.poll(secs(3)));
        assert_eq!(overlay.current(), Some(Emotion::Peur));

        assert!(overlay.poll(secs(5)));
        assert_eq!(overlay.current(), None);
    }

    #[test]
    fn test_clear() {
        let mut overlay = EmotionOverlay::default();
        overlay.activate("surprise", secs(0));
        overlay.clear();
        assert!(!overlay.is_active());
        assert_eq!(overlay.next_deadline(), None);
    }
}
