// Presence Node: Power Budget
//
// Back-of-envelope battery estimate for the current duty cycle. Logged once
// on cold boot so a configuration change that wrecks battery life shows up
// on the serial console.

use std::time::Duration;

use crate::config::{
    Config, ACTIVE_CURRENT_MA, BATTERY_CAPACITY_MAH, EXPECTED_PRESENCE_FRACTION, SLEEP_CURRENT_UA,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerProfile {
    /// Draw while awake (sampling, occasionally with Wi-Fi up).
    pub active_current_ma: f32,
    /// Draw in deep sleep.
    pub sleep_current_ua: f32,
}

impl Default for PowerProfile {
    fn default() -> Self {
        Self {
            active_current_ma: ACTIVE_CURRENT_MA,
            sleep_current_ua: SLEEP_CURRENT_UA,
        }
    }
}

/// Estimated figures for one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEstimate {
    pub average_current_ma: f32,
    pub daily_consumption_mah: f32,
    pub battery_life_hours: f32,
}

impl PowerProfile {
    /// Mean current of a single cycle: awake for `active`, then asleep.
    fn cycle_current_ma(&self, active: Duration, sleep: Duration) -> f32 {
        let active_s = active.as_secs_f32();
        let sleep_s = sleep.as_secs_f32();
        let total = active_s + sleep_s;
        if total == 0.0 {
            return self.active_current_ma;
        }
        let sleep_ma = self.sleep_current_ua / 1000.0;
        (self.active_current_ma * active_s + sleep_ma * sleep_s) / total
    }

    /// Average current when `presence_fraction` of cycles see a person.
    pub fn average_current_ma(&self, config: &Config, presence_fraction: f32) -> f32 {
        let fraction = presence_fraction.clamp(0.0, 1.0);
        let active = config.sampling.active_window;
        let person = self.cycle_current_ma(active, config.sleep.person);
        let no_person = self.cycle_current_ma(active, config.sleep.no_person);
        fraction * person + (1.0 - fraction) * no_person
    }

    pub fn daily_consumption_mah(&self, config: &Config, presence_fraction: f32) -> f32 {
        self.average_current_ma(config, presence_fraction) * 24.0
    }

    pub fn battery_life_hours(&self, config: &Config, presence_fraction: f32, capacity_mah: f32) -> f32 {
        let current = self.average_current_ma(config, presence_fraction);
        if current <= 0.0 {
            return f32::INFINITY;
        }
        capacity_mah / current
    }

    pub fn estimate(&self, config: &Config, presence_fraction: f32, capacity_mah: f32) -> BudgetEstimate {
        BudgetEstimate {
            average_current_ma: self.average_current_ma(config, presence_fraction),
            daily_consumption_mah: self.daily_consumption_mah(config, presence_fraction),
            battery_life_hours: self.battery_life_hours(config, presence_fraction, capacity_mah),
        }
    }
}

/// Log the estimate for the expected presence mix and battery.
pub fn log_estimate(config: &Config) -> BudgetEstimate {
    let estimate = PowerProfile::default().estimate(config, EXPECTED_PRESENCE_FRACTION, BATTERY_CAPACITY_MAH);
    log::info!(
        "Power budget: ~{:.1} mA average, {:.0} mAh/day, {:.0} h on {:.0} mAh ({:.0}% presence)",
        estimate.average_current_ma,
        estimate.daily_consumption_mah,
        estimate.battery_life_hours,
        BATTERY_CAPACITY_MAH,
        EXPECTED_PRESENCE_FRACTION * 100.0
    );
    estimate
}
