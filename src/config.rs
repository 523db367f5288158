// Presence Node: Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V) + HC-SR04 ultrasonic ranger

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::InvalidSamplePolicy;
use crate::error::ConfigError;
use crate::report::DeliveryPolicy;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_TRIG: i32 = 6; // D4 - HC-SR04 trigger (OUTPUT)
pub const PIN_ECHO: i32 = 7; // D5 - HC-SR04 echo (INPUT)

// ---------------------------------------------------------------------------
// Ultrasonic ranger
// ---------------------------------------------------------------------------
pub const TRIG_SETTLE_US: u32 = 2;
pub const TRIG_PULSE_US: u32 = 10;
pub const ECHO_TIMEOUT_US: u32 = 30_000;
pub const SOUND_CM_PER_US: f32 = 0.034; // round trip, halve for range

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------
pub const OBJECT_THRESHOLD_CM: f32 = 50.0;
pub const REQUIRED_CLOSE_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const ACTIVE_WINDOW_MS: u64 = 5000;
pub const SAMPLE_INTERVAL_MS: u64 = 500;
pub const PERSON_SLEEP_MS: u64 = 10_000; // short: someone may leave soon
pub const NO_PERSON_SLEEP_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Network & remote sink
// ---------------------------------------------------------------------------
pub const WIFI_CONNECT_ATTEMPTS: u32 = 20;
pub const WIFI_CONNECT_BACKOFF_MS: u64 = 500;
pub const HTTP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SINK_PATH: &str = "/presence";

// ---------------------------------------------------------------------------
// Power profile (used for the cold-boot budget estimate)
// ---------------------------------------------------------------------------
pub const ACTIVE_CURRENT_MA: f32 = 80.0; // Wi-Fi capable, CPU awake
pub const SLEEP_CURRENT_UA: f32 = 10.0;
pub const BATTERY_CAPACITY_MAH: f32 = 500.0;
pub const EXPECTED_PRESENCE_FRACTION: f32 = 0.1;

/// Overrides captured at compile time, e.g.
/// `PRESENCE_WIFI_SSID=lab PRESENCE_DB_SECRET=... cargo build --release`.
const BUILD_ENV: [(&str, Option<&str>); 11] = [
    ("PRESENCE_WIFI_SSID", option_env!("PRESENCE_WIFI_SSID")),
    ("PRESENCE_WIFI_PASS", option_env!("PRESENCE_WIFI_PASS")),
    ("PRESENCE_DB_URL", option_env!("PRESENCE_DB_URL")),
    ("PRESENCE_DB_SECRET", option_env!("PRESENCE_DB_SECRET")),
    ("PRESENCE_DB_PATH", option_env!("PRESENCE_DB_PATH")),
    ("PRESENCE_THRESHOLD_CM", option_env!("PRESENCE_THRESHOLD_CM")),
    ("PRESENCE_REQUIRED_COUNT", option_env!("PRESENCE_REQUIRED_COUNT")),
    ("PRESENCE_ACTIVE_WINDOW_MS", option_env!("PRESENCE_ACTIVE_WINDOW_MS")),
    ("PRESENCE_SAMPLE_INTERVAL_MS", option_env!("PRESENCE_SAMPLE_INTERVAL_MS")),
    ("PRESENCE_PERSON_SLEEP_MS", option_env!("PRESENCE_PERSON_SLEEP_MS")),
    ("PRESENCE_NO_PERSON_SLEEP_MS", option_env!("PRESENCE_NO_PERSON_SLEEP_MS")),
];

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Distance below which a sample counts as "close".
    pub threshold_cm: f32,
    /// Minimum close samples in one window to declare presence.
    pub required_count: usize,
    pub invalid_samples: InvalidSamplePolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub active_window: Duration,
    pub sample_interval: Duration,
    pub echo_timeout: Duration,
}

impl SamplingConfig {
    /// Samples an ideal (zero-overhead) window holds: ceil(window / interval).
    pub fn expected_samples(&self) -> usize {
        let interval = self.sample_interval.as_micros();
        if interval == 0 {
            return 0;
        }
        self.active_window.as_micros().div_ceil(interval) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepConfig {
    pub person: Duration,
    pub no_person: Duration,
}

#[derive(Clone, PartialEq)]
pub struct NetworkConfig {
    pub ssid: String,
    pub passphrase: String,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
}

#[derive(Clone, PartialEq)]
pub struct SinkConfig {
    /// Database root, e.g. `https://example-rtdb.firebaseio.com/`.
    pub url: String,
    pub secret: String,
    pub path: String,
    pub delivery: DeliveryPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub detection: DetectionConfig,
    pub sampling: SamplingConfig,
    pub sleep: SleepConfig,
    pub network: NetworkConfig,
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection: DetectionConfig {
                threshold_cm: OBJECT_THRESHOLD_CM,
                required_count: REQUIRED_CLOSE_COUNT,
                invalid_samples: InvalidSamplePolicy::default(),
            },
            sampling: SamplingConfig {
                active_window: Duration::from_millis(ACTIVE_WINDOW_MS),
                sample_interval: Duration::from_millis(SAMPLE_INTERVAL_MS),
                echo_timeout: Duration::from_micros(ECHO_TIMEOUT_US as u64),
            },
            sleep: SleepConfig {
                person: Duration::from_millis(PERSON_SLEEP_MS),
                no_person: Duration::from_millis(NO_PERSON_SLEEP_MS),
            },
            network: NetworkConfig {
                ssid: String::new(),
                passphrase: String::new(),
                connect_attempts: WIFI_CONNECT_ATTEMPTS,
                connect_backoff: Duration::from_millis(WIFI_CONNECT_BACKOFF_MS),
            },
            sink: SinkConfig {
                url: String::new(),
                secret: String::new(),
                path: DEFAULT_SINK_PATH.to_owned(),
                delivery: DeliveryPolicy::default(),
            },
        }
    }
}

impl Config {
    /// Defaults plus whatever `PRESENCE_*` variables were set at build time.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_overrides(
            BUILD_ENV
                .iter()
                .filter_map(|(key, value)| value.map(|v| (*key, v))),
        )
    }

    pub fn from_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (key, value) in overrides {
            config.apply(key, value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply a single `PRESENCE_*` override.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "PRESENCE_WIFI_SSID" => self.network.ssid = value.to_owned(),
            "PRESENCE_WIFI_PASS" => self.network.passphrase = value.to_owned(),
            "PRESENCE_DB_URL" => self.sink.url = value.to_owned(),
            "PRESENCE_DB_SECRET" => self.sink.secret = value.to_owned(),
            "PRESENCE_DB_PATH" => self.sink.path = value.to_owned(),
            "PRESENCE_THRESHOLD_CM" => self.detection.threshold_cm = parse(key, value)?,
            "PRESENCE_REQUIRED_COUNT" => self.detection.required_count = parse(key, value)?,
            "PRESENCE_ACTIVE_WINDOW_MS" => {
                self.sampling.active_window = Duration::from_millis(parse(key, value)?)
            }
            "PRESENCE_SAMPLE_INTERVAL_MS" => {
                self.sampling.sample_interval = Duration::from_millis(parse(key, value)?)
            }
            "PRESENCE_PERSON_SLEEP_MS" => {
                self.sleep.person = Duration::from_millis(parse(key, value)?)
            }
            "PRESENCE_NO_PERSON_SLEEP_MS" => {
                self.sleep.no_person = Duration::from_millis(parse(key, value)?)
            }
            _ => return Err(ConfigError::UnknownKey(key.to_owned())),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let detection = &self.detection;
        if !(detection.threshold_cm > 0.0 && detection.threshold_cm.is_finite()) {
            return Err(ConfigError::invalid(
                "threshold_cm",
                format!("{} is not a positive distance", detection.threshold_cm),
            ));
        }
        if detection.required_count == 0 {
            return Err(ConfigError::invalid("required_count", "must be at least 1"));
        }

        let sampling = &self.sampling;
        if sampling.sample_interval.is_zero() {
            return Err(ConfigError::invalid("sample_interval", "must be non-zero"));
        }
        if sampling.sample_interval > sampling.active_window {
            return Err(ConfigError::invalid(
                "sample_interval",
                "longer than the active window",
            ));
        }
        let capacity = sampling.expected_samples();
        if detection.required_count > capacity {
            return Err(ConfigError::invalid(
                "required_count",
                format!(
                    "{} close samples needed but a window holds at most {}",
                    detection.required_count, capacity
                ),
            ));
        }

        if self.sleep.person.is_zero() || self.sleep.no_person.is_zero() {
            return Err(ConfigError::invalid("sleep", "durations must be non-zero"));
        }
        if self.sleep.person == self.sleep.no_person {
            return Err(ConfigError::invalid(
                "sleep",
                "person and no-person durations must differ",
            ));
        }

        if self.network.connect_attempts == 0 {
            return Err(ConfigError::invalid("connect_attempts", "must be at least 1"));
        }
        if !self.sink.path.starts_with('/') {
            return Err(ConfigError::invalid(
                "sink_path",
                format!("{:?} must start with '/'", self.sink.path),
            ));
        }
        if self.sink.path.len() < 2 {
            return Err(ConfigError::invalid("sink_path", "must name a key"));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

// Credentials stay out of logs.
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("ssid", &self.ssid)
            .field("passphrase", &"***")
            .field("connect_attempts", &self.connect_attempts)
            .field("connect_backoff", &self.connect_backoff)
            .finish()
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("url", &self.url)
            .field("secret", &"***")
            .field("path", &self.path)
            .field("delivery", &self.delivery)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.threshold_cm, 50.0);
        assert_eq!(config.detection.required_count, 6);
        assert_eq!(config.sleep.person, Duration::from_secs(10));
        assert_eq!(config.sleep.no_person, Duration::from_secs(30));
        assert_eq!(config.sink.path, "/presence");
    }

    #[test]
    fn default_window_holds_ten_samples() {
        assert_eq!(Config::default().sampling.expected_samples(), 10);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_overrides([
            ("PRESENCE_WIFI_SSID", "lab"),
            ("PRESENCE_THRESHOLD_CM", " 75.5 "),
            ("PRESENCE_REQUIRED_COUNT", "4"),
            ("PRESENCE_PERSON_SLEEP_MS", "5000"),
            ("PRESENCE_DB_PATH", "/lab4/presence"),
        ])
        .unwrap();
        assert_eq!(config.network.ssid, "lab");
        assert_eq!(config.detection.threshold_cm, 75.5);
        assert_eq!(config.detection.required_count, 4);
        assert_eq!(config.sleep.person, Duration::from_millis(5000));
        assert_eq!(config.sink.path, "/lab4/presence");
    }

    #[test]
    fn bad_number_is_a_parse_error() {
        let err = Config::from_overrides([("PRESENCE_REQUIRED_COUNT", "six")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Parse {
                key: "PRESENCE_REQUIRED_COUNT".into(),
                value: "six".into()
            }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = Config::default();
        assert_eq!(
            config.apply("PRESENCE_COLOUR", "blue"),
            Err(ConfigError::UnknownKey("PRESENCE_COLOUR".into()))
        );
    }

    #[test]
    fn equal_sleep_durations_are_rejected() {
        let err = Config::from_overrides([
            ("PRESENCE_PERSON_SLEEP_MS", "20000"),
            ("PRESENCE_NO_PERSON_SLEEP_MS", "20000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "sleep", .. }));
    }

    #[test]
    fn unreachable_required_count_is_rejected() {
        let mut config = Config::default();
        config.detection.required_count = 11;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "required_count", .. })
        ));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let mut config = Config::default();
        config.detection.threshold_cm = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn interval_longer_than_window_is_rejected() {
        let mut config = Config::default();
        config.sampling.sample_interval = Duration::from_secs(6);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "sample_interval", .. })
        ));
    }

    #[test]
    fn sink_path_must_be_absolute() {
        let mut config = Config::default();
        config.sink.path = "presence".into();
        assert!(config.validate().is_err());
        config.sink.path = "/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_hides_credentials() {
        let mut config = Config::default();
        config.network.passphrase = "hunter2".into();
        config.sink.secret = "db-secret".into();
        let text = format!("{:?}", config);
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("db-secret"));
    }
}
