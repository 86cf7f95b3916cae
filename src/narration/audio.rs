//! Audio transport abstraction
//!
//! The scheduler only needs play/pause, the playback position and the
//! "ended" notification. `SimulatedAudio` provides that without any output
//! device, advancing with a `Clock`.

use std::collections::HashMap;
use std::time::Duration;

use super::clock::Clock;
use super::types::AudioError;

/// Notifications raised by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    /// Playback reached the end of the source
    Ended,
}

/// Media playback capability used by the scheduler
pub trait AudioTransport {
    /// Set the source; playback is stopped and rewound
    fn load(&mut self, source: &str) -> Result<(), AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    /// Playback position in seconds
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
    /// Next pending notification, if any
    fn poll_event(&mut self) -> Option<AudioEvent>;
}

/// Clock-driven transport with no output
#[derive(Debug)]
pub struct SimulatedAudio<C: Clock> {
    clock: C,
    durations: HashMap<String, f64>,
    default_duration: f64,
    source: Option<String>,
    duration: f64,
    /// Position when playback last started or paused
    base: f64,
    playing_since: Option<Duration>,
    ended_pending: bool,
}

impl<C: Clock> SimulatedAudio<C> {
    /// Sources without a registered duration play for `default_duration` seconds
    pub fn new(clock: C, default_duration: f64) -> Self {
        Self {
            clock,
            durations: HashMap::new(),
            default_duration,
            source: None,
            duration: default_duration,
            base: 0.0,
            playing_since: None,
            ended_pending: false,
        }
    }

    pub fn with_duration(mut self, source: &str, seconds: f64) -> Self {
        self.durations.insert(source.to_string(), seconds);
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn position_at(&self, now: Duration) -> f64 {
        let running = self
            .playing_since
            .map(|since| now.saturating_sub(since).as_secs_f64())
            .unwrap_or(0.0);
        (self.base + running).min(self.duration)
    }
}

impl<C: Clock> AudioTransport for SimulatedAudio<C> {
    fn load(&mut self, source: &str) -> Result<(), AudioError> {
        self.duration = self
            .durations
            .get(source)
            .copied()
            .unwrap_or(self.default_duration);
        self.source = Some(source.to_string());
        self.base = 0.0;
        self.playing_since = None;
        self.ended_pending = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.source.is_none() {
            return Err(AudioError::Open {
                source_ref: String::new(),
                reason: "no source loaded".to_string(),
            });
        }
        if self.playing_since.is_some() {
            return Ok(());
        }
        // A finished source plays again from the start
        if self.base >= self.duration {
            self.base = 0.0;
        }
        self.playing_since = Some(self.clock.now());
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing_since.is_some() {
            self.base = self.position_at(self.clock.now());
            self.playing_since = None;
        }
    }

    fn current_time(&self) -> f64 {
        self.position_at(self.clock.now())
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        if self.playing_since.is_some() && self.current_time() >= self.duration {
            self.base = self.duration;
            self.playing_since = None;
            self.ended_pending = true;
        }
        if self.ended_pending {
            self.ended_pending = false;
            return Some(AudioEvent::Ended);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::clock::ManualClock;

    fn secs(v: f64) -> Duration {
        Duration::from_secs_f64(v)
    }

    #[test]
    fn test_play_without_source_fails() {
        let mut audio = SimulatedAudio::new(ManualClock::new(), 10.0);
        assert!(audio.play().is_err());
    }

    #[test]
    fn test_position_advances_while_playing() {
        let clock = ManualClock::new();
        let mut audio = SimulatedAudio::new(clock.clone(), 10.0);
        audio.load("story.mp3").unwrap();

        clock.advance(secs(1.0));
        assert_eq!(audio.current_time(), 0.0);

        audio.play().unwrap();
        clock.advance(secs(2.5));
        assert!((audio.current_time() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_pause_holds_position() {
        let clock = ManualClock::new();
        let mut audio = SimulatedAudio::new(clock.clone(), 10.0);
        audio.load("story.mp3").unwrap();
        audio.play().unwrap();
        clock.advance(secs(3.0));
        audio.pause();
        clock.advance(secs(5.0));

        assert!(!audio.is_playing());
        assert!((audio.current_time() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ended_reported_once() {
        let clock = ManualClock::new();
        let mut audio = SimulatedAudio::new(clock.clone(), 10.0).with_duration("short.mp3", 2.0);
        audio.load("short.mp3").unwrap();
        assert_eq!(audio.duration(), 2.0);
        audio.play().unwrap();

        clock.advance(secs(1.0));
        assert_eq!(audio.poll_event(), None);

        clock.advance(secs(1.5));
        assert_eq!(audio.poll_event(), Some(AudioEvent::Ended));
        assert_eq!(audio.poll_event(), None);
        assert!(!audio.is_playing());
        assert_eq!(audio.current_time(), 2.0);
    }

    #[test]
    fn test_load_rewinds() {
        let clock = ManualClock::new();
        let mut audio = SimulatedAudio::new(clock.clone(), 10.0);
        audio.load("a.mp3").unwrap();
        audio.play().unwrap();
        clock.advance(secs(4.0));

        audio.load("b.mp3").unwrap();
        assert_eq!(audio.source(), Some("b.mp3"));
        assert_eq!(audio.current_time(), 0.0);
        assert!(!audio.is_playing());
    }
}
