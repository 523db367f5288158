// Presence Node: Firmware Entry Point
//
// Every wake runs the same sequence, then deep sleeps:
//   1. Sample the ultrasonic ranger every 500 ms for 5 seconds.
//   2. Declare presence if at least 6 readings are closer than 50 cm.
//   3. Only if that differs from the retained state: Wi-Fi up, push 1/0 to
//      the database, Wi-Fi down.
//   4. Deep sleep 10 s (person) or 30 s (no person).
//
// Nothing here is fatal: any setup failure still ends in a timed deep sleep
// so the next wake gets a clean retry.

#[cfg(target_os = "espidf")]
fn main() {
    use std::time::Duration;

    use presence_node::config::NO_PERSON_SLEEP_MS;
    use presence_node::power;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    if let Err(e) = device::start() {
        log::error!("Cycle setup failed: {:?}", e);
        power::enter_deep_sleep(Duration::from_millis(NO_PERSON_SLEEP_MS));
    }
}

#[cfg(target_os = "espidf")]
mod device {
    use esp_idf_hal::gpio::{InputPin, OutputPin, PinDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use presence_node::drivers::hcsr04::Hcsr04;
    use presence_node::drivers::rtc_state::RtcStore;
    use presence_node::net::firebase::FirebaseReporter;
    use presence_node::net::wifi::WifiLink;
    use presence_node::power::{self, DeepSleepTimer};
    use presence_node::power_budget;
    use presence_node::sampler::SystemClock;
    use presence_node::{Config, CycleController};

    pub fn start() -> anyhow::Result<()> {
        log::info!("Presence node v{} awake", env!("CARGO_PKG_VERSION"));

        let wake = power::wake_cause();
        log::info!("Wake cause: {:?}", wake);

        let config = match Config::from_build_env() {
            Ok(config) => config,
            Err(e) => {
                log::error!("Invalid configuration ({}), using defaults", e);
                Config::default()
            }
        };
        if wake.is_cold_boot() {
            power_budget::log_estimate(&config);
        }

        // ---- Peripherals --------------------------------------------------
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        // Wi-Fi keeps RF calibration data in NVS; work without it if absent.
        let nvs = match EspDefaultNvsPartition::take() {
            Ok(nvs) => Some(nvs),
            Err(e) => {
                log::warn!("NVS unavailable ({}), Wi-Fi runs uncalibrated", e);
                None
            }
        };

        // ---- Ranger (TRIG = GPIO6 / D4, ECHO = GPIO7 / D5) ------------------
        let trig = PinDriver::output(peripherals.pins.gpio6.downgrade_output())?;
        let echo = PinDriver::input(peripherals.pins.gpio7.downgrade_input())?;
        let ranger = Hcsr04::new(trig, echo, config.sampling.echo_timeout);

        // ---- Network + sink (radio stays off until a report) ---------------
        let link = WifiLink::new(peripherals.modem, sysloop, nvs, &config.network)?;
        let reporter = FirebaseReporter::new(link, &config.sink);

        let store = RtcStore::new(wake.is_cold_boot());

        CycleController::new(&config, ranger, SystemClock::new(), store, reporter)?
            .run(&mut DeepSleepTimer)
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "presence-node is ESP-IDF firmware; build it for an *-espidf target. \
         Host builds only run the library tests."
    );
}
