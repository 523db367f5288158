// Presence Node: HC-SR04 Ultrasonic Ranger
//
// Trigger pulse on TRIG, then time the HIGH pulse on ECHO with esp_timer.
// Every wait is bounded by the echo timeout; no echo = invalid sample.

use std::time::Duration;

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};

use crate::config::*;
use crate::error::SensorError;
use crate::events::Sample;
use crate::sampler::{echo_to_sample, pulse_width, DistanceSampler};

pub struct Hcsr04<'d> {
    trig: PinDriver<'d, AnyOutputPin, Output>,
    echo: PinDriver<'d, AnyInputPin, Input>,
    timeout_us: u32,
}

/// Microseconds since boot.
fn now_us() -> i64 {
    unsafe { esp_idf_sys::esp_timer_get_time() }
}

fn gpio_error(e: esp_idf_sys::EspError) -> SensorError {
    SensorError::Gpio(e.to_string())
}

impl<'d> Hcsr04<'d> {
    pub fn new(
        trig: PinDriver<'d, AnyOutputPin, Output>,
        echo: PinDriver<'d, AnyInputPin, Input>,
        timeout: Duration,
    ) -> Self {
        let timeout_us = timeout.as_micros().min(u32::MAX as u128) as u32;
        log::info!(
            "HC-SR04 on TRIG GPIO{} / ECHO GPIO{} (timeout {} µs)",
            PIN_TRIG,
            PIN_ECHO,
            timeout_us
        );
        Self {
            trig,
            echo,
            timeout_us,
        }
    }

    /// 2 µs low, 10 µs high, back low.
    fn trigger(&mut self) -> Result<(), SensorError> {
        self.trig.set_low().map_err(gpio_error)?;
        Ets::delay_us(TRIG_SETTLE_US);
        self.trig.set_high().map_err(gpio_error)?;
        Ets::delay_us(TRIG_PULSE_US);
        self.trig.set_low().map_err(gpio_error)?;
        Ok(())
    }

    /// Fire one ranging pulse and return the echo pulse width.
    pub fn measure(&mut self) -> Result<Duration, SensorError> {
        let timeout_us = self.timeout_us;

        // A late echo from the previous ping must not be timed as this one.
        let deadline = now_us() + timeout_us as i64;
        while self.echo.is_high() {
            if now_us() >= deadline {
                return Err(SensorError::EchoTimeout { timeout_us });
            }
        }

        self.trigger()?;
        let echo = &self.echo;
        pulse_width(|| echo.is_high(), now_us, timeout_us)
    }
}

impl DistanceSampler for Hcsr04<'_> {
    fn sample(&mut self) -> Sample {
        match self.measure() {
            Ok(echo) => echo_to_sample(echo),
            Err(e) => {
                log::debug!("HC-SR04: {}", e);
                Sample::Invalid
            }
        }
    }
}
