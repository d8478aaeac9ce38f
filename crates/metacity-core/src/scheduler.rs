//! Deterministic timer bookkeeping.
//!
//! The [`Scheduler`] owns one deadline per [`ScheduledEvent`] kind. Given
//! the current time it reports which events are due and pushes each due
//! deadline one interval past `now`, so a stalled runner fires each kind
//! once rather than replaying every missed interval.

use chrono::{DateTime, Duration, Utc};

use crate::config::{TimingConfig, millis};

/// A periodic trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledEvent {
    /// Advance the economy.
    Tick,
    /// Resolve expired proposals.
    ExecuteProposals,
    /// Persist a snapshot.
    Autosave,
    /// Ask the flavor collaborator for fresh text.
    FlavorRefresh,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    event: ScheduledEvent,
    interval: Duration,
    next: DateTime<Utc>,
}

/// Deadlines for every periodic trigger.
#[derive(Debug, Clone)]
pub struct Scheduler {
    timers: Vec<Timer>,
}

impl Scheduler {
    /// Create a scheduler whose first deadlines are one interval after
    /// `start`.
    ///
    /// Proposal execution runs on the tick interval. An interval of zero
    /// disables that event.
    pub fn new(timing: &TimingConfig, start: DateTime<Utc>) -> Self {
        let intervals = [
            (ScheduledEvent::Tick, timing.tick_interval_ms),
            (ScheduledEvent::ExecuteProposals, timing.tick_interval_ms),
            (ScheduledEvent::Autosave, timing.autosave_interval_ms),
            (ScheduledEvent::FlavorRefresh, timing.flavor_refresh_ms),
        ];
        let timers = intervals
            .into_iter()
            .filter(|(_, ms)| *ms > 0)
            .map(|(event, ms)| {
                let interval = millis(ms);
                Timer {
                    event,
                    interval,
                    next: after(start, interval),
                }
            })
            .collect();
        Self { timers }
    }

    /// Events due at `now`, in declaration order, at most one of each.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<ScheduledEvent> {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            if now >= timer.next {
                due.push(timer.event);
                timer.next = after(now, timer.interval);
            }
        }
        due
    }

    /// The earliest pending deadline, or `None` if every event is disabled.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.iter().map(|t| t.next).min()
    }
}

fn after(instant: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    instant
        .checked_add_signed(interval)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
