// Presence Node: Test doubles for the hardware and network boundaries.

use std::time::Duration;

use crate::error::ReportError;
use crate::events::{ReportRecord, Sample};
use crate::report::RemoteReporter;
use crate::sampler::{Clock, DistanceSampler};

/// Replays a fixed script, then keeps returning `fallback`.
pub struct ScriptedSampler {
    script: Vec<Sample>,
    fallback: Sample,
    calls: usize,
}

impl ScriptedSampler {
    pub fn new(script: Vec<Sample>, fallback: Sample) -> Self {
        Self {
            script,
            fallback,
            calls: 0,
        }
    }

    pub fn repeating(sample: Sample) -> Self {
        Self::new(Vec::new(), sample)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DistanceSampler for ScriptedSampler {
    fn sample(&mut self) -> Sample {
        let sample = self.script.get(self.calls).copied().unwrap_or(self.fallback);
        self.calls += 1;
        sample
    }
}

/// Time only moves when someone waits. `overhead` is added to every wait to
/// model time spent in the sensor between delays.
#[derive(Debug, Default)]
pub struct FakeClock {
    now: Duration,
    overhead: Duration,
    waits: Vec<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overhead(overhead: Duration) -> Self {
        Self {
            overhead,
            ..Self::default()
        }
    }

    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn wait(&mut self, duration: Duration) {
        self.waits.push(duration);
        self.now += duration + self.overhead;
    }
}

#[derive(Debug)]
pub struct RecordingReporter {
    pub connect_ok: bool,
    pub push_result: Result<(), ReportError>,
    pub connects: usize,
    pub disconnects: usize,
    pub pushed: Vec<ReportRecord>,
}

impl RecordingReporter {
    pub fn healthy() -> Self {
        Self {
            connect_ok: true,
            push_result: Ok(()),
            connects: 0,
            disconnects: 0,
            pushed: Vec::new(),
        }
    }

    pub fn offline() -> Self {
        Self {
            connect_ok: false,
            ..Self::healthy()
        }
    }

    pub fn rejecting(error: ReportError) -> Self {
        Self {
            push_result: Err(error),
            ..Self::healthy()
        }
    }
}

impl RemoteReporter for RecordingReporter {
    fn connect(&mut self) -> bool {
        self.connects += 1;
        self.connect_ok
    }

    fn push(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        self.pushed.push(record.clone());
        self.push_result.clone()
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}
