//! Target persistence: the sticky lock state machine.

use sightline_core::constants::GRACE_TICKS;
use sightline_core::events::TargetChange;
use sightline_core::types::{CandidateId, TargetLock};

/// Sticky-lock state machine. At most one transition happens per update,
/// and every transition yields the change the engine turns into an event.
#[derive(Debug)]
pub struct PersistenceTracker {
    lock: Option<TargetLock>,
    grace_ticks: u64,
}

impl Default for PersistenceTracker {
    fn default() -> Self {
        Self::new(GRACE_TICKS)
    }
}

impl PersistenceTracker {
    pub fn new(grace_ticks: u64) -> Self {
        Self {
            lock: None,
            grace_ticks,
        }
    }

    /// Currently locked target, if any.
    pub fn current(&self) -> Option<CandidateId> {
        self.lock.map(|l| l.target)
    }

    /// Full lock state.
    pub fn lock(&self) -> Option<TargetLock> {
        self.lock
    }

    /// Target earning the persistence bonus at `tick`: the locked candidate
    /// while its lock is still inside the grace window.
    pub fn bonus_target(&self, tick: u64) -> Option<CandidateId> {
        self.lock
            .filter(|l| tick.saturating_sub(l.lock_tick) < self.grace_ticks)
            .map(|l| l.target)
    }

    /// Advance one update with retargeting enabled.
    ///
    /// `best` is the top-scored candidate of the current detected set with
    /// the bonus applied, `lock_detected` whether the held target is in that
    /// set, `lock_alive` whether the host still knows the held id.
    pub fn update(
        &mut self,
        best: Option<CandidateId>,
        lock_detected: bool,
        lock_alive: bool,
        tick: u64,
    ) -> Option<TargetChange> {
        match self.lock {
            None => best.map(|id| self.acquire(id, tick)),
            Some(lock) => {
                if !lock_alive {
                    return Some(self.release());
                }
                if lock_detected {
                    match best {
                        // Something outbid the lock past its bonus.
                        Some(id) if id != lock.target => Some(self.acquire(id, tick)),
                        _ => {
                            self.refresh(lock.target, tick);
                            None
                        }
                    }
                } else if tick.saturating_sub(lock.lock_tick) < self.grace_ticks {
                    // Absent but riding the grace window; not stealable.
                    None
                } else {
                    Some(self.release())
                }
            }
        }
    }

    /// Advance one update without retargeting: refresh, grace, and liveness
    /// still apply, but nothing is acquired or switched.
    pub fn maintain(
        &mut self,
        lock_detected: bool,
        lock_alive: bool,
        tick: u64,
    ) -> Option<TargetChange> {
        let Some(lock) = self.lock else {
            return None;
        };
        if !lock_alive {
            return Some(self.release());
        }
        if lock_detected {
            self.refresh(lock.target, tick);
            None
        } else if tick.saturating_sub(lock.lock_tick) < self.grace_ticks {
            None
        } else {
            Some(self.release())
        }
    }

    /// Drop the lock immediately, bypassing grace.
    pub fn clear(&mut self) -> Option<TargetChange> {
        self.lock.take().map(|lock| TargetChange {
            new: None,
            previous: Some(lock.target),
        })
    }

    fn acquire(&mut self, id: CandidateId, tick: u64) -> TargetChange {
        let previous = self.current();
        self.lock = Some(TargetLock {
            target: id,
            lock_tick: tick,
        });
        TargetChange {
            new: Some(id),
            previous,
        }
    }

    fn refresh(&mut self, target: CandidateId, tick: u64) {
        self.lock = Some(TargetLock {
            target,
            lock_tick: tick,
        });
    }

    fn release(&mut self) -> TargetChange {
        let previous = self.current();
        self.lock = None;
        TargetChange {
            new: None,
            previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: CandidateId = CandidateId(1);
    const T2: CandidateId = CandidateId(2);

    #[test]
    fn test_acquires_first_detection() {
        let mut tracker = PersistenceTracker::new(12);
        let change = tracker.update(Some(T1), false, false, 5).unwrap();
        assert_eq!(change.new, Some(T1));
        assert_eq!(change.previous, None);
        assert_eq!(tracker.current(), Some(T1));
        assert_eq!(tracker.lock().unwrap().lock_tick, 5);
    }

    #[test]
    fn test_empty_set_acquires_nothing() {
        let mut tracker = PersistenceTracker::new(12);
        assert!(tracker.update(None, false, false, 0).is_none());
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_refresh_is_silent() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        assert!(tracker.update(Some(T1), true, true, 1).is_none());
        assert!(tracker.update(Some(T1), true, true, 2).is_none());
        assert_eq!(tracker.current(), Some(T1));
        assert_eq!(tracker.lock().unwrap().lock_tick, 2, "refresh moves the tick");
    }

    #[test]
    fn test_switch_to_outbidding_candidate() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let change = tracker.update(Some(T2), true, true, 1).unwrap();
        assert_eq!(change.new, Some(T2));
        assert_eq!(change.previous, Some(T1));
        assert_eq!(tracker.current(), Some(T2));
    }

    #[test]
    fn test_absence_within_grace_holds() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        for tick in 1..12 {
            // Another candidate may lead the scores; the absent lock is
            // still not stealable inside its grace window.
            assert!(
                tracker.update(Some(T2), false, true, tick).is_none(),
                "tick {tick} is inside the grace window"
            );
            assert_eq!(tracker.current(), Some(T1));
        }
    }

    #[test]
    fn test_grace_expiry_releases() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let change = tracker.update(None, false, true, 12).unwrap();
        assert_eq!(change.new, None);
        assert_eq!(change.previous, Some(T1));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_dead_reference_releases_inside_grace() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let change = tracker.update(None, false, false, 1).unwrap();
        assert_eq!(change.new, None);
        assert_eq!(change.previous, Some(T1));
    }

    #[test]
    fn test_reacquire_waits_for_next_update() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let released = tracker.update(Some(T2), false, false, 1).unwrap();
        assert_eq!(released.new, None, "release and acquire never share an update");

        let change = tracker.update(Some(T2), false, false, 2).unwrap();
        assert_eq!(change.new, Some(T2));
        assert_eq!(change.previous, None);
    }

    #[test]
    fn test_bonus_window_follows_refresh() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        assert_eq!(tracker.bonus_target(5), Some(T1));
        assert_eq!(tracker.bonus_target(11), Some(T1));
        assert_eq!(tracker.bonus_target(12), None, "grace exhausted");

        tracker.update(Some(T1), true, true, 10);
        assert_eq!(tracker.bonus_target(21), Some(T1), "refresh restarted the window");
    }

    #[test]
    fn test_clear_bypasses_grace() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let change = tracker.clear().unwrap();
        assert_eq!(change.new, None);
        assert_eq!(change.previous, Some(T1));
        assert!(tracker.clear().is_none(), "nothing left to report");
    }

    #[test]
    fn test_maintain_never_acquires() {
        let mut tracker = PersistenceTracker::new(12);
        assert!(tracker.maintain(false, false, 0).is_none());
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_maintain_refreshes_and_expires() {
        let mut tracker = PersistenceTracker::new(3);
        tracker.update(Some(T1), false, false, 0);
        assert!(tracker.maintain(true, true, 2).is_none());
        assert!(tracker.maintain(false, true, 4).is_none(), "4 - 2 is inside grace");
        let change = tracker.maintain(false, true, 5).unwrap();
        assert_eq!(change.new, None);
        assert_eq!(change.previous, Some(T1));
    }

    #[test]
    fn test_maintain_releases_dead_lock() {
        let mut tracker = PersistenceTracker::new(12);
        tracker.update(Some(T1), false, false, 0);
        let change = tracker.maintain(false, false, 1).unwrap();
        assert_eq!(change.previous, Some(T1));
        assert_eq!(tracker.current(), None);
    }
}
