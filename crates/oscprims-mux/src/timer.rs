use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{MuxError, Result};
use crate::listener::TimerListener;

/// A periodic timer as attached to the multiplexer.
#[derive(Clone)]
pub(crate) struct TimerRegistration {
    pub(crate) initial_delay: Duration,
    pub(crate) period: Duration,
    pub(crate) listener: Arc<dyn TimerListener>,
}

struct Scheduled {
    /// `None` once the next due time lies beyond what `Instant` can represent.
    due: Option<Instant>,
    period: Duration,
    listener: Arc<dyn TimerListener>,
}

/// Timers of one run, ordered by next due time.
///
/// Timers keep a fixed phase: after firing, a timer is rescheduled one period
/// after its previous due time, not after the time it actually fired. A timer
/// that fell behind therefore fires once per pass until it has caught up.
pub(crate) struct TimerQueue {
    entries: Vec<Scheduled>,
}

impl TimerQueue {
    pub(crate) fn new<'a>(
        timers: impl IntoIterator<Item = &'a TimerRegistration>,
        now: Instant,
    ) -> Self {
        let mut entries: Vec<Scheduled> = timers
            .into_iter()
            .map(|timer| Scheduled {
                due: now.checked_add(timer.initial_delay),
                period: timer.period,
                listener: Arc::clone(&timer.listener),
            })
            .collect();
        sort_by_due(&mut entries);
        Self { entries }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// How long the loop may wait before the earliest timer is due.
    ///
    /// `None` when no timer will ever come due; zero when one is already due.
    pub(crate) fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.entries
            .first()
            .and_then(|entry| entry.due)
            .map(|due| due.saturating_duration_since(now))
    }

    /// Fire every timer due at `now`, earliest first, each at most once.
    ///
    /// Stops early once `stop` is set by a listener. A listener error is
    /// returned immediately.
    pub(crate) fn fire_expired(&mut self, now: Instant, stop: &AtomicBool) -> Result<()> {
        let mut fired = false;
        for entry in self
            .entries
            .iter_mut()
            .take_while(|entry| entry.due.is_some_and(|due| due <= now))
        {
            trace!(period = ?entry.period, "timer expired");
            fired = true;
            let outcome = entry.listener.timer_expired();
            entry.due = entry.due.and_then(|due| due.checked_add(entry.period));
            outcome.map_err(MuxError::Listener)?;
            if stop.load(Ordering::Acquire) {
                break;
            }
        }
        if fired {
            sort_by_due(&mut self.entries);
        }
        Ok(())
    }
}

/// Stable sort, earliest first, timers that never come due last.
fn sort_by_due(entries: &mut [Scheduled]) {
    entries.sort_by_key(|entry| (entry.due.is_none(), entry.due));
}
