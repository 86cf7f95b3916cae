//! Playback scheduler
//!
//! Keeps the emotion cues of the selected story in step with the narration
//! audio. On resume every unconsumed cue still ahead of the audio position
//! gets one armed trigger; pause, story change and the end of the audio
//! revoke every armed trigger before anything else changes.
//!
//! ```text
//!            select_story            resume
//!   Idle ───────────────▶ Paused ─────────────▶ Playing
//!                           ▲  ◀───────────────    │
//!                           │       pause          │ audio ended
//!             select_story  └──────── Ended ◀──────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::audio::{AudioEvent, AudioTransport};
use super::catalog::Story;
use super::timeline::Timeline;
use super::timer::TimerQueue;
use super::types::{secs, AudioError};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No story selected
    #[default]
    Idle,
    /// Audio playing, triggers armed
    Playing,
    /// Audio stopped, nothing armed
    Paused,
    /// Audio reached its end; only a new selection leaves this state
    Ended,
}

/// A cue whose trigger fired
#[derive(Debug, Clone, PartialEq)]
pub struct FiredCue {
    pub index: usize,
    pub emotion: String,
}

pub struct PlaybackScheduler<A: AudioTransport> {
    audio: A,
    timeline: Option<Timeline>,
    /// Armed triggers, keyed by cue index
    triggers: TimerQueue<usize>,
    state: PlaybackState,
}

impl<A: AudioTransport> PlaybackScheduler<A> {
    pub fn new(audio: A) -> Self {
        Self {
            audio,
            timeline: None,
            triggers: TimerQueue::new(),
            state: PlaybackState::Idle,
        }
    }

    /// Install a story, ready to play but not playing.
    ///
    /// Valid from any state. If the audio source cannot be set the scheduler
    /// falls back to `Idle`.
    pub fn select_story(&mut self, story: Arc<Story>) -> Result<(), AudioError> {
        let dropped = self.triggers.cancel_all();
        if dropped > 0 {
            log::debug!("Story change revoked {} armed cues", dropped);
        }

        if let Err(err) = self.audio.load(&story.narration) {
            self.timeline = None;
            self.state = PlaybackState::Idle;
            return Err(err);
        }

        let reselected = self
            .timeline
            .as_ref()
            .is_some_and(|timeline| Arc::ptr_eq(timeline.story(), &story));
        if reselected {
            if let Some(timeline) = self.timeline.as_mut() {
                timeline.reset();
            }
        } else {
            self.timeline = Some(Timeline::new(story));
        }
        self.state = PlaybackState::Paused;

        if let Some(timeline) = &self.timeline {
            log::info!(
                "Selected '{}' ({} cues)",
                timeline.story().name,
                timeline.len()
            );
        }
        Ok(())
    }

    /// Start the audio and arm the remaining cues.
    ///
    /// Returns false when there is nothing to resume: no story, already
    /// playing, or the narration has ended.
    pub fn resume(&mut self, now: Duration) -> Result<bool, AudioError> {
        match self.state {
            PlaybackState::Paused => {}
            PlaybackState::Ended => {
                log::debug!("Resume ignored: narration ended, select a story again");
                return Ok(false);
            }
            PlaybackState::Idle | PlaybackState::Playing => return Ok(false),
        }

        self.audio.play()?;
        self.arm(now);
        self.state = PlaybackState::Playing;
        Ok(true)
    }

    /// Stop the audio and revoke every armed cue. Revoked cues stay
    /// unconsumed so the next resume re-arms them.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.audio.pause();
        self.triggers.cancel_all();
        self.state = PlaybackState::Paused;
        true
    }

    /// Arm one trigger per unconsumed cue still ahead of the audio position.
    /// Cues at or behind the position are skipped, not caught up.
    fn arm(&mut self, now: Duration) {
        self.triggers.cancel_all();
        let Some(timeline) = &self.timeline else {
            return;
        };

        let position = self.audio.current_time();
        for (index, cue) in timeline.unconsumed() {
            let delay = cue.time - position;
            if delay > 0.0 {
                self.triggers.schedule(now, secs(delay), index);
            }
        }
        log::debug!(
            "Armed {} of {} cues at position {:.3}s",
            self.triggers.len(),
            timeline.len(),
            position
        );
    }

    /// Fire the next due trigger, marking its cue consumed
    pub fn poll(&mut self, now: Duration) -> Option<FiredCue> {
        while let Some((_, index)) = self.triggers.pop_due(now) {
            let Some(timeline) = self.timeline.as_mut() else {
                continue;
            };
            if !timeline.consume(index) {
                continue;
            }
            if let Some(cue) = timeline.cue(index) {
                return Some(FiredCue {
                    index,
                    emotion: cue.emotion.clone(),
                });
            }
        }
        None
    }

    /// Handle pending audio notifications. Returns true if playback ended.
    pub fn poll_audio(&mut self) -> bool {
        let mut ended = false;
        while let Some(event) = self.audio.poll_event() {
            match event {
                AudioEvent::Ended => ended |= self.on_audio_ended(),
            }
        }
        ended
    }

    fn on_audio_ended(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let dropped = self.triggers.cancel_all();
        self.state = PlaybackState::Ended;
        log::info!("Narration ended ({} cues left armed were dropped)", dropped);
        true
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Paused or ended: the face is held still
    pub fn is_paused(&self) -> bool {
        matches!(self.state, PlaybackState::Paused | PlaybackState::Ended)
    }

    /// The mouth is shut whenever the narration is not playing
    pub fn mouth_forced_shut(&self) -> bool {
        self.state != PlaybackState::Playing
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn story(&self) -> Option<&Arc<Story>> {
        self.timeline.as_ref().map(Timeline::story)
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Armed triggers as (cue index, fire time), in firing order
    pub fn armed(&self) -> Vec<(usize, Duration)> {
        self.triggers
            .iter()
            .map(|(_, deadline, index)| (*index, deadline))
            .collect()
    }

    pub fn armed_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.triggers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::audio::SimulatedAudio;
    use crate::narration::clock::{Clock, ManualClock};
    use crate::narration::timeline::Cue;

    fn story(name: &str, cues: &[(f64, &str)]) -> Arc<Story> {
        Arc::new(Story {
            name: name.to_string(),
            narration: format!("{}.mp3", name),
            preview: format!("{}_preview.mp3", name),
            cues: cues.iter().map(|(t, e)| Cue::new(*t, e)).collect(),
        })
    }

    fn setup() -> (ManualClock, PlaybackScheduler<SimulatedAudio<ManualClock>>) {
        let clock = ManualClock::new();
        let audio = SimulatedAudio::new(clock.clone(), 60.0);
        (clock, PlaybackScheduler::new(audio))
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_starts_idle() {
        let (clock, mut scheduler) = setup();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert!(!scheduler.resume(clock.now()).unwrap());
        assert!(!scheduler.pause());
    }

    #[test]
    fn test_select_does_not_autoplay() {
        let (_clock, mut scheduler) = setup();
        scheduler.select_story(story("loup", &[(2.0, "joie")])).unwrap();

        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert!(!scheduler.audio().is_playing());
        assert_eq!(scheduler.audio().source(), Some("loup.mp3"));
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn test_resume_arms_future_cues() {
        let (clock, mut scheduler) = setup();
        scheduler
            .select_story(story("loup", &[(2.0, "joie"), (5.0, "peur")]))
            .unwrap();

        assert!(scheduler.resume(clock.now()).unwrap());
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(scheduler.armed(), vec![(0, ms(2000)), (1, ms(5000))]);
    }

    #[test]
    fn test_fire_consumes_cue() {
        let (clock, mut scheduler) = setup();
        scheduler.select_story(story("loup", &[(2.0, "joie")])).unwrap();
        scheduler.resume(clock.now()).unwrap();

        clock.set(ms(1999));
        assert_eq!(scheduler.poll(clock.now()), None);
        assert!(!scheduler.timeline().unwrap().is_consumed(0));

        clock.set(ms(2000));
        assert_eq!(
            scheduler.poll(clock.now()),
            Some(FiredCue {
                index: 0,
                emotion: "joie".to_string()
            })
        );
        assert!(scheduler.timeline().unwrap().is_consumed(0));
        assert_eq!(scheduler.poll(clock.now()), None);
    }

    #[test]
    fn test_pause_revokes_and_resume_rearms_relative_to_position() {
        let (clock, mut scheduler) = setup();
        scheduler
            .select_story(story("loup", &[(2.0, "joie"), (5.0, "peur")]))
            .unwrap();
        scheduler.resume(clock.now()).unwrap();

        clock.set(ms(2000));
        scheduler.poll(clock.now());
        clock.set(ms(3000));
        assert!(scheduler.pause());
        assert_eq!(scheduler.armed_count(), 0);
        assert!(!scheduler.timeline().unwrap().is_consumed(1));

        // Ten seconds of wall time pass while paused
        clock.set(ms(13_000));
        scheduler.resume(clock.now()).unwrap();
        // The cue at 5s is 2s of audio away
        assert_eq!(scheduler.armed(), vec![(1, ms(15_000))]);
    }

    #[test]
    fn test_past_cues_skipped_on_resume() {
        let (clock, mut scheduler) = setup();
        scheduler
            .select_story(story("loup", &[(1.0, "joie"), (4.0, "peur")]))
            .unwrap();
        scheduler.resume(clock.now()).unwrap();
        clock.set(ms(500));
        scheduler.pause();

        // Play on past the first cue without ever polling it
        scheduler.resume(clock.now()).unwrap();
        assert_eq!(scheduler.armed(), vec![(0, ms(1000)), (1, ms(4000))]);
        clock.set(ms(2000));
        scheduler.pause();

        scheduler.resume(clock.now()).unwrap();
        assert_eq!(scheduler.armed(), vec![(1, ms(4000))]);
        assert!(!scheduler.timeline().unwrap().is_consumed(0));
    }

    #[test]
    fn test_unreachable_cue_time_does_not_panic() {
        let (clock, mut scheduler) = setup();
        scheduler
            .select_story(story("loup", &[(1e20, "joie"), (2.0, "peur")]))
            .unwrap();
        clock.set(ms(1000));
        assert!(scheduler.resume(clock.now()).unwrap());
        assert_eq!(scheduler.armed(), vec![(1, ms(3000)), (0, Duration::MAX)]);

        clock.set(ms(3000));
        assert_eq!(scheduler.poll(clock.now()).map(|c| c.index), Some(1));
        assert!(scheduler.poll(clock.now()).is_none());
    }

    #[test]
    fn test_double_resume_no_duplicates() {
        let (clock, mut scheduler) = setup();
        scheduler.select_story(story("loup", &[(2.0, "joie")])).unwrap();
        scheduler.resume(clock.now()).unwrap();
        assert!(!scheduler.resume(clock.now()).unwrap());
        assert_eq!(scheduler.armed_count(), 1);
    }

    #[test]
    fn test_double_pause() {
        let (clock, mut scheduler) = setup();
        scheduler.select_story(story("loup", &[(2.0, "joie")])).unwrap();
        scheduler.resume(clock.now()).unwrap();
        assert!(scheduler.pause());
        assert!(!scheduler.pause());
        scheduler.resume(clock.now()).unwrap();
        assert_eq!(scheduler.armed_count(), 1);
    }

    #[test]
    fn test_select_revokes_previous_story() {
        let (clock, mut scheduler) = setup();
        scheduler.select_story(story("loup", &[(2.0, "joie")])).unwrap();
        scheduler.resume(clock.now()).unwrap();

        clock.set(ms(1000));
        scheduler.select_story(story("ours", &[(9.0, "peur")])).unwrap();
        assert_eq!(scheduler.armed_count(), 0);

        clock.set(ms(3000));
        assert_eq!(scheduler.poll(clock.now()), None);
    }

    #[test]
    fn test_reselect_same_story_resets() {
        let (clock, mut scheduler) = setup();
        let loup = story("loup", &[(1.0, "joie")]);
        scheduler.select_story(Arc::clone(&loup)).unwrap();
        scheduler.resume(clock.now()).unwrap();
        clock.set(ms(1000));
        scheduler.poll(clock.now());
        assert!(scheduler.timeline().unwrap().is_consumed(0));

        scheduler.select_story(loup).unwrap();
        assert_eq!(scheduler.timeline().unwrap().consumed_count(), 0);
    }

    #[test]
    fn test_audio_end() {
        let clock = ManualClock::new();
        let audio = SimulatedAudio::new(clock.clone(), 60.0).with_duration("loup.mp3", 3.0);
        let mut scheduler = PlaybackScheduler::new(audio);
        scheduler
            .select_story(story("loup", &[(2.9, "joie"), (10.0, "peur")]))
            .unwrap();
        scheduler.resume(clock.now()).unwrap();

        clock.set(ms(3000));
        assert!(scheduler.poll_audio());
        assert_eq!(scheduler.state(), PlaybackState::Ended);
        assert_eq!(scheduler.armed_count(), 0);
        assert!(scheduler.mouth_forced_shut());

        assert!(!scheduler.resume(clock.now()).unwrap());
        assert!(!scheduler.audio().is_playing());
    }

    #[test]
    fn test_equal_times_both_fire() {
        let (clock, mut scheduler) = setup();
        scheduler
            .select_story(story("loup", &[(2.0, "joie"), (2.0, "peur")]))
            .unwrap();
        scheduler.resume(clock.now()).unwrap();
        clock.set(ms(2000));

        let first = scheduler.poll(clock.now()).unwrap();
        let second = scheduler.poll(clock.now()).unwrap();
        assert_eq!((first.index, second.index), (0, 1));
    }
}
