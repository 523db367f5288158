// Presence Node: Deep Sleep & Wake Cause (ESP-IDF only)

use std::time::Duration;

use crate::scheduler::WakeTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-on, reset or flash: retained memory is back to its defaults.
    ColdBoot,
    /// Deep-sleep timer expired: retained memory survived.
    Timer,
    Other(u32),
}

impl WakeCause {
    pub fn is_cold_boot(&self) -> bool {
        !matches!(self, Self::Timer)
    }
}

pub fn wake_cause() -> WakeCause {
    #[allow(non_upper_case_globals)]
    match unsafe { esp_idf_sys::esp_sleep_get_wakeup_cause() } {
        esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
        esp_idf_sys::esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => WakeCause::ColdBoot,
        other => WakeCause::Other(other as u32),
    }
}

/// Arm the RTC timer and enter deep sleep. The next wake restarts the
/// firmware from `main`.
pub fn enter_deep_sleep(duration: Duration) -> ! {
    let micros = duration.as_micros().min(u64::MAX as u128) as u64;
    unsafe {
        esp_idf_sys::esp_sleep_enable_timer_wakeup(micros);
        esp_idf_sys::esp_deep_sleep_start();
    }
}

/// `WakeTimer` backed by the ESP32 RTC timer.
pub struct DeepSleepTimer;

impl WakeTimer for DeepSleepTimer {
    fn sleep_for(&mut self, duration: Duration) -> ! {
        enter_deep_sleep(duration)
    }
}
