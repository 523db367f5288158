// Presence Node: Error Types

use thiserror::Error;

/// Failures at the ranging boundary. The sampler turns every one of these
/// into [`crate::events::Sample::Invalid`]; they never leave the driver.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no echo within {timeout_us} µs")]
    EchoTimeout { timeout_us: u32 },
    #[error("GPIO error: {0}")]
    Gpio(String),
}

/// Why a state change could not be delivered to the remote sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("network connection failed, retry budget exhausted")]
    ConnectFailed,
    #[error("sink client initialisation failed: {0}")]
    ClientInit(String),
    #[error("sink rejected write (HTTP {status})")]
    WriteRejected { status: u16 },
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("cannot parse {key}={value:?}")]
    Parse { key: String, value: String },
    #[error("unknown configuration key {0}")]
    UnknownKey(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
