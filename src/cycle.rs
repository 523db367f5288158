// Presence Node: Wake Cycle Controller
//
// One wake = SAMPLING -> CLASSIFYING -> REPORTING -> SLEEPING. The radio is
// only powered inside REPORTING when the verdict changed.
// There is no event loop: the device re-enters the firmware after every deep
// sleep and runs exactly one cycle. The retained state store is the only
// input that crosses from one cycle to the next.

use std::time::Duration;

use crate::classifier::PresenceClassifier;
use crate::config::{Config, SamplingConfig};
use crate::error::ConfigError;
use crate::events::{CyclePhase, PresenceVerdict};
use crate::report::{RemoteReporter, ReportGate, ReportOutcome};
use crate::sampler::{collect_window, Clock, DistanceSampler};
use crate::scheduler::{SleepScheduler, WakeTimer};
use crate::state::StateStore;

/// Everything decided during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub window_len: usize,
    pub close_count: usize,
    pub invalid_count: usize,
    pub verdict: PresenceVerdict,
    /// `None` when the verdict matched the retained state.
    pub report: Option<ReportOutcome>,
    pub sleep: Duration,
}

pub struct CycleController<D, C, S, R> {
    sampler: D,
    clock: C,
    store: S,
    gate: ReportGate<R>,
    classifier: PresenceClassifier,
    scheduler: SleepScheduler,
    sampling: SamplingConfig,
    phase: CyclePhase,
}

impl<D, C, S, R> CycleController<D, C, S, R>
where
    D: DistanceSampler,
    C: Clock,
    S: StateStore,
    R: RemoteReporter,
{
    /// Fails on a config `collect_window` or the classifier cannot honour,
    /// e.g. a zero sample interval that would never leave the window.
    pub fn new(config: &Config, sampler: D, clock: C, store: S, reporter: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sampler,
            clock,
            store,
            gate: ReportGate::new(reporter, config.sink.path.as_str(), config.sink.delivery),
            classifier: PresenceClassifier::new(&config.detection),
            scheduler: SleepScheduler::new(&config.sleep),
            sampling: config.sampling.clone(),
            phase: CyclePhase::default(),
        })
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reporter(&self) -> &R {
        self.gate.reporter()
    }

    /// Run one wake cycle up to (not including) the sleep call.
    pub fn run_cycle(&mut self) -> CycleSummary {
        self.enter(CyclePhase::Sampling);
        log::info!("Starting active sensor sampling cycle...");
        let window = collect_window(&mut self.sampler, &mut self.clock, &self.sampling);

        self.enter(CyclePhase::Classifying);
        let tally = self.classifier.tally(&window);
        let verdict = self.classifier.decide(&tally);
        log::info!(
            "Detection count: {} out of {} measurements ({} invalid).",
            tally.close,
            tally.total,
            tally.invalid
        );
        log::info!("Person present: {}", verdict.display_name());

        // The gate alone decides whether the radio comes up.
        self.enter(CyclePhase::Reporting);
        let outcome = self.gate.sync(verdict, &mut self.store);
        let report = outcome.reported.then_some(outcome);

        self.enter(CyclePhase::Sleeping);
        CycleSummary {
            window_len: tally.total,
            close_count: tally.close,
            invalid_count: tally.invalid,
            verdict,
            report,
            sleep: self.scheduler.duration_for(verdict),
        }
    }

    /// Run one cycle, then hand the device to the wake timer.
    pub fn run<T: WakeTimer + ?Sized>(mut self, timer: &mut T) -> ! {
        let summary = self.run_cycle();
        self.scheduler.sleep(summary.verdict, timer)
    }

    fn enter(&mut self, phase: CyclePhase) {
        log::debug!("Cycle phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
