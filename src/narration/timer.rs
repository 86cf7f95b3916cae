//! One-shot timers for the cooperative scheduler
//!
//! Every delayed action in the engine (armed cues, overlay auto-clear) is a
//! timer in a `TimerQueue`. A timer is identified by a `TimerId` that stays
//! valid until the timer fires or is cancelled, and is never reused.

use std::time::Duration;

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Timer<A> {
    id: TimerId,
    deadline: Duration,
    action: A,
}

/// Queue of pending one-shot timers carrying an action of type `A`
#[derive(Debug)]
pub struct TimerQueue<A> {
    // Kept sorted by (deadline, id)
    timers: Vec<Timer<A>>,
    next_id: u64,
}

impl<A> TimerQueue<A> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `action` at an absolute deadline
    pub fn schedule_at(&mut self, deadline: Duration, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        // Equal deadlines keep scheduling order
        let pos = self
            .timers
            .iter()
            .position(|t| t.deadline > deadline)
            .unwrap_or(self.timers.len());
        self.timers.insert(pos, Timer { id, deadline, action });
        id
    }

    /// Schedule `action` to fire `delay` after `now`
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: A) -> TimerId {
        self.schedule_at(now.saturating_add(delay), action)
    }

    /// Revoke one timer, returning its action if it was still pending
    pub fn cancel(&mut self, id: TimerId) -> Option<A> {
        let pos = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(pos).action)
    }

    /// Revoke every pending timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, A)> {
        match self.timers.first() {
            Some(first) if first.deadline <= now => {
                let timer = self.timers.remove(0);
                Some((timer.id, timer.action))
            }
            _ => None,
        }
    }

    /// Deadline of the next timer to fire
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.first().map(|t| t.deadline)
    }

    /// Deadline of a specific pending timer
    pub fn deadline_of(&self, id: TimerId) -> Option<Duration> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.deadline)
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pending timers in firing order
    pub fn iter(&self) -> impl Iterator<Item = (TimerId, Duration, &A)> {
        self.timers.iter().map(|t| (t.id, t.deadline, &t.action))
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_queue_new() {
        let queue: TimerQueue<u32> = TimerQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn test_schedule_orders_by_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(300), "c");
        queue.schedule_at(ms(100), "a");
        queue.schedule_at(ms(200), "b");

        let order: Vec<_> = queue.iter().map(|(_, _, a)| *a).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(queue.next_deadline(), Some(ms(100)));
    }

    #[test]
    fn test_equal_deadlines_keep_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(500), 1);
        queue.schedule_at(ms(500), 2);
        queue.schedule_at(ms(500), 3);

        let mut fired = Vec::new();
        while let Some((_, action)) = queue.pop_due(ms(500)) {
            fired.push(action);
        }
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_schedule_saturates_far_deadline() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(ms(1000), Duration::MAX, ());
        assert_eq!(queue.deadline_of(id), Some(Duration::MAX));
        assert!(queue.pop_due(ms(1_000_000)).is_none());
    }

    #[test]
    fn test_schedule_relative() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(ms(1000), ms(250), ());
        assert_eq!(queue.deadline_of(id), Some(ms(1250)));
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(100), 'x');

        assert!(queue.pop_due(ms(99)).is_none());
        assert_eq!(queue.pop_due(ms(100)).map(|(_, a)| a), Some('x'));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_single() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule_at(ms(100), "a");
        let b = queue.schedule_at(ms(200), "b");

        assert_eq!(queue.cancel(a), Some("a"));
        assert_eq!(queue.cancel(a), None);
        assert!(!queue.contains(a));
        assert!(queue.contains(b));
        assert!(queue.pop_due(ms(150)).is_none());
    }

    #[test]
    fn test_cancel_all() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(ms(1), 1);
        queue.schedule_at(ms(2), 2);

        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.pop_due(ms(10)).is_none());
    }

    #[test]
    fn test_ids_never_reused() {
        let mut queue = TimerQueue::new();
        let first = queue.schedule_at(ms(1), ());
        queue.cancel_all();
        let second = queue.schedule_at(ms(1), ());
        assert_ne!(first, second);
        assert!(second.raw() > first.raw());
    }
}
