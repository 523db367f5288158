// Presence Node: Distance Sampling
//
// Drives the ranging sensor for one active window at a fixed period and
// hands back the raw samples. Timing goes through `Clock` so the window
// logic runs without real waits off-device.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::{SamplingConfig, SOUND_CM_PER_US};
use crate::error::SensorError;
use crate::events::{Sample, SampleWindow};

/// One blocking ranging measurement, bounded by the echo timeout.
pub trait DistanceSampler {
    fn sample(&mut self) -> Sample;
}

impl<D: DistanceSampler + ?Sized> DistanceSampler for &mut D {
    fn sample(&mut self) -> Sample {
        (**self).sample()
    }
}

/// Monotonic time source plus a blocking delay.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
    fn wait(&mut self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep` (FreeRTOS delay on
/// the device).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wait(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Convert an echo pulse width into a sample. A zero width means the echo
/// never arrived.
pub fn echo_to_sample(echo: Duration) -> Sample {
    if echo.is_zero() {
        return Sample::Invalid;
    }
    Sample::Distance(echo.as_micros() as f32 * SOUND_CM_PER_US / 2.0)
}

/// Width of the next HIGH pulse on a polled input, `pulseIn`-style.
///
/// A pulse already in progress is skipped first. Everything, including that
/// skip, must finish within `timeout_us` of the first clock read.
pub fn pulse_width<L, N>(mut is_high: L, mut now_us: N, timeout_us: u32) -> Result<Duration, SensorError>
where
    L: FnMut() -> bool,
    N: FnMut() -> i64,
{
    let deadline = now_us() + timeout_us as i64;
    let mut wait_while = |level: bool, now_us: &mut N| -> Result<(), SensorError> {
        while is_high() == level {
            if now_us() >= deadline {
                return Err(SensorError::EchoTimeout { timeout_us });
            }
        }
        Ok(())
    };

    wait_while(true, &mut now_us)?; // stale pulse
    wait_while(false, &mut now_us)?; // rising edge
    let rise = now_us();
    wait_while(true, &mut now_us)?; // falling edge

    Ok(Duration::from_micros((now_us() - rise).max(0) as u64))
}

/// Sample until the active window has elapsed, waiting `sample_interval`
/// after every reading.
///
/// The loop checks elapsed time before each sample, so sensor overhead on top
/// of the interval can push the last sample past the window: a 5000 ms / 500 ms
/// window yields 10 samples with a fast sensor and 9 with a slow one.
pub fn collect_window<D, C>(sampler: &mut D, clock: &mut C, config: &SamplingConfig) -> SampleWindow
where
    D: DistanceSampler + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now();
    let mut window = Vec::with_capacity(config.expected_samples());

    while clock.now().saturating_sub(start) < config.active_window {
        let sample = sampler.sample();
        match sample {
            Sample::Distance(cm) => log::info!("Measured distance: {:.1} cm", cm),
            Sample::Invalid => log::warn!("No echo - sample marked invalid"),
        }
        window.push(sample);
        clock.wait(config.sample_interval);
    }

    window
}
