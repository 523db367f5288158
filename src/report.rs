// Presence Node: Report Gate
//
// The radio is the expensive part of a cycle, so it is only powered when the
// verdict differs from the last reported one. One attempt per state change;
// nothing is queued for later cycles.

use std::fmt;
use std::time::Duration;

use crate::error::ReportError;
use crate::events::{PresenceVerdict, ReportRecord};
use crate::sampler::Clock;
use crate::state::StateStore;

/// Network link plus remote key/value sink.
pub trait RemoteReporter {
    /// Bring the network up. Retries internally within a fixed budget.
    fn connect(&mut self) -> bool;
    fn push(&mut self, record: &ReportRecord) -> Result<(), ReportError>;
    /// Tear the network down. Safe to call after a failed `connect`.
    fn disconnect(&mut self);
}

impl<R: RemoteReporter + ?Sized> RemoteReporter for &mut R {
    fn connect(&mut self) -> bool {
        (**self).connect()
    }

    fn push(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        (**self).push(record)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}

/// When the retained state follows a report attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Retained state changes only once the sink accepted the value. A failed
    /// report is retried on the next wake.
    #[default]
    ConfirmedOnly,
    /// Retained state follows every attempt, delivered or not. A lost update
    /// is not retried until the verdict flips again.
    AtMostOnce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    /// The network path was engaged this cycle.
    pub reported: bool,
    /// The sink accepted the value.
    pub delivered: bool,
    /// Value the retained state should hold after this cycle.
    pub new_prior: bool,
    pub error: Option<ReportError>,
}

impl ReportOutcome {
    fn unchanged(prior: bool) -> Self {
        Self {
            reported: false,
            delivered: false,
            new_prior: prior,
            error: None,
        }
    }
}

pub struct ReportGate<R> {
    reporter: R,
    path: String,
    policy: DeliveryPolicy,
}

impl<R: RemoteReporter> ReportGate<R> {
    pub fn new(reporter: R, path: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            reporter,
            path: path.into(),
            policy,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Report `current` if it differs from `prior`.
    pub fn maybe_report(&mut self, current: PresenceVerdict, prior: bool) -> ReportOutcome {
        let present = current.is_present();
        if present == prior {
            log::info!("No state change detected. No update sent.");
            return ReportOutcome::unchanged(prior);
        }

        log::info!("State change detected. Updating {}...", self.path);
        let record = ReportRecord::new(&self.path, current);
        let result = self.deliver(&record);

        match &result {
            Ok(()) => log::info!("State updated: {} = {}", record.path, record.status),
            Err(e) => log::error!("Update of {} failed: {}", record.path, e),
        }

        let delivered = result.is_ok();
        let new_prior = match self.policy {
            DeliveryPolicy::ConfirmedOnly if !delivered => prior,
            _ => present,
        };

        ReportOutcome {
            reported: true,
            delivered,
            new_prior,
            error: result.err(),
        }
    }

    /// Load the retained state, report if needed, persist the outcome.
    pub fn sync<S: StateStore + ?Sized>(&mut self, current: PresenceVerdict, store: &mut S) -> ReportOutcome {
        let prior = store.load();
        let outcome = self.maybe_report(current, prior);
        if outcome.new_prior != prior {
            store.store(outcome.new_prior);
        }
        outcome
    }

    fn deliver(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        let result = if self.reporter.connect() {
            self.reporter.push(record)
        } else {
            Err(ReportError::ConnectFailed)
        };
        // Radio off on every path.
        self.reporter.disconnect();
        result
    }
}

/// Run `op` up to `attempts` times, waiting `backoff` between failures.
/// `op` receives the 1-based attempt number.
pub fn retry_bounded<T, E, C, F>(
    attempts: u32,
    backoff: Duration,
    clock: &mut C,
    mut op: F,
) -> Result<T, E>
where
    E: fmt::Display,
    C: Clock + ?Sized,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                log::debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                clock.wait(backoff);
                attempt += 1;
            }
        }
    }
}

/// Poll `ready` up to `attempts` times, `interval` apart. Returns whether it
/// became ready; the total wait never exceeds `attempts × interval`.
pub fn poll_bounded<C, F>(attempts: u32, interval: Duration, clock: &mut C, mut ready: F) -> bool
where
    C: Clock + ?Sized,
    F: FnMut(u32) -> bool,
{
    retry_bounded(attempts, interval, clock, |attempt| {
        if ready(attempt) {
            Ok(())
        } else {
            Err("not ready")
        }
    })
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;
    use crate::testing::{FakeClock, RecordingReporter};

    fn gate(reporter: RecordingReporter, policy: DeliveryPolicy) -> ReportGate<RecordingReporter> {
        ReportGate::new(reporter, "/presence", policy)
    }

    #[test]
    fn unchanged_verdict_stays_offline() {
        let mut gate = gate(RecordingReporter::healthy(), DeliveryPolicy::default());

        let outcome = gate.maybe_report(PresenceVerdict::Absent, false);

        assert_eq!(outcome, ReportOutcome::unchanged(false));
        assert_eq!(gate.reporter().connects, 0);
        assert!(gate.reporter().pushed.is_empty());
    }

    #[test]
    fn state_change_round_trip() {
        let mut gate = gate(RecordingReporter::healthy(), DeliveryPolicy::default());

        let first = gate.maybe_report(PresenceVerdict::Present, false);
        assert!(first.reported);
        assert!(first.delivered);
        assert!(first.new_prior);

        let second = gate.maybe_report(PresenceVerdict::Present, first.new_prior);
        assert!(!second.reported);
        assert!(second.new_prior);

        assert_eq!(gate.reporter().connects, 1);
        assert_eq!(
            gate.reporter().pushed,
            vec![ReportRecord { path: "/presence".into(), status: 1 }]
        );
    }

    #[test]
    fn absence_is_pushed_as_zero() {
        let mut gate = gate(RecordingReporter::healthy(), DeliveryPolicy::default());
        let outcome = gate.maybe_report(PresenceVerdict::Absent, true);
        assert!(outcome.delivered);
        assert!(!outcome.new_prior);
        assert_eq!(gate.reporter().pushed[0].status, 0);
    }

    #[test]
    fn connect_failure_skips_push_but_disconnects() {
        let mut gate = gate(RecordingReporter::offline(), DeliveryPolicy::ConfirmedOnly);

        let outcome = gate.maybe_report(PresenceVerdict::Present, false);

        assert!(outcome.reported);
        assert!(!outcome.delivered);
        assert!(!outcome.new_prior);
        assert_eq!(outcome.error, Some(ReportError::ConnectFailed));
        assert!(gate.reporter().pushed.is_empty());
        assert_eq!(gate.reporter().disconnects, 1);
    }

    #[test]
    fn rejected_write_keeps_prior_when_confirmed_only() {
        let reporter = RecordingReporter::rejecting(ReportError::WriteRejected { status: 401 });
        let mut gate = gate(reporter, DeliveryPolicy::ConfirmedOnly);

        let outcome = gate.maybe_report(PresenceVerdict::Present, false);

        assert!(!outcome.delivered);
        assert!(!outcome.new_prior);
        assert_eq!(gate.reporter().disconnects, 1);
    }

    #[test]
    fn rejected_write_still_advances_prior_when_at_most_once() {
        let reporter = RecordingReporter::rejecting(ReportError::WriteRejected { status: 500 });
        let mut gate = gate(reporter, DeliveryPolicy::AtMostOnce);

        let outcome = gate.maybe_report(PresenceVerdict::Present, false);

        assert!(outcome.reported);
        assert!(!outcome.delivered);
        assert!(outcome.new_prior);
    }

    #[test]
    fn sync_persists_only_changes() {
        let mut gate = gate(RecordingReporter::healthy(), DeliveryPolicy::default());
        let mut store = MemoryStore::default();

        gate.sync(PresenceVerdict::Absent, &mut store);
        assert_eq!(store.writes(), 0);

        gate.sync(PresenceVerdict::Present, &mut store);
        gate.sync(PresenceVerdict::Present, &mut store);
        assert!(store.load());
        assert_eq!(store.writes(), 1);
        assert_eq!(gate.reporter().connects, 1);
    }

    #[test]
    fn retry_stops_at_first_success() {
        let mut clock = FakeClock::new();
        let mut calls = 0;

        let result: Result<u32, &str> =
            retry_bounded(20, Duration::from_millis(500), &mut clock, |attempt| {
                calls += 1;
                if attempt < 3 {
                    Err("not yet")
                } else {
                    Ok(attempt)
                }
            });

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
        assert_eq!(clock.waits().len(), 2);
    }

    #[test]
    fn retry_gives_up_after_budget_without_trailing_wait() {
        let mut clock = FakeClock::new();
        let mut calls = 0;

        let result: Result<(), &str> =
            retry_bounded(20, Duration::from_millis(500), &mut clock, |_| {
                calls += 1;
                Err("down")
            });

        assert_eq!(result, Err("down"));
        assert_eq!(calls, 20);
        assert_eq!(clock.now(), Duration::from_millis(19 * 500));
    }

    #[test]
    fn polling_wait_is_capped_by_attempts_times_interval() {
        let mut clock = FakeClock::new();
        let mut polls = 0;

        let up = poll_bounded(20, Duration::from_millis(500), &mut clock, |_| {
            polls += 1;
            false
        });

        assert!(!up);
        assert_eq!(polls, 20);
        assert!(clock.now() <= Duration::from_millis(20 * 500));
    }

    #[test]
    fn polling_stops_once_ready() {
        let mut clock = FakeClock::new();

        let up = poll_bounded(20, Duration::from_millis(500), &mut clock, |attempt| attempt == 4);

        assert!(up);
        assert_eq!(clock.now(), Duration::from_millis(3 * 500));
    }
}
