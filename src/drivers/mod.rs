// Presence Node: Device Drivers (ESP-IDF only)

pub mod hcsr04;
pub mod rtc_state;
