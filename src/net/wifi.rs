// Presence Node: Station-Mode Wi-Fi Link
//
// The driver is created once per wake but the radio is only started inside
// `connect`, and stopped again right after the report.

use anyhow::anyhow;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::config::NetworkConfig;
use crate::report::poll_bounded;
use crate::sampler::SystemClock;

pub struct WifiLink {
    wifi: BlockingWifi<EspWifi<'static>>,
    config: NetworkConfig,
    clock: SystemClock,
}

impl WifiLink {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &NetworkConfig,
    ) -> anyhow::Result<Self> {
        let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;

        let auth_method = if config.passphrase.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID {:?} is too long", config.ssid))?,
            password: config
                .passphrase
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("Wi-Fi passphrase is too long"))?,
            auth_method,
            ..Default::default()
        }))?;

        Ok(Self {
            wifi,
            config: config.clone(),
            clock: SystemClock::new(),
        })
    }

    /// Start the radio and issue a non-blocking association request.
    fn begin(&mut self) -> anyhow::Result<()> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    /// Association plus DHCP lease.
    fn is_up(&self) -> bool {
        self.wifi.wifi().is_up().unwrap_or(false)
    }

    /// Poll for the link `connect_attempts` times, `connect_backoff` apart,
    /// so the radio is on for at most attempts × backoff.
    pub fn connect(&mut self) -> bool {
        log::info!("Connecting to Wi-Fi '{}'", self.config.ssid);
        if let Err(e) = self.begin() {
            log::error!("Wi-Fi start failed: {}", e);
            return false;
        }

        let attempts = self.config.connect_attempts;
        let backoff = self.config.connect_backoff;
        let mut clock = self.clock;
        let up = poll_bounded(attempts, backoff, &mut clock, |attempt| {
            log::debug!("Wi-Fi poll {}/{}", attempt, attempts);
            self.is_up()
        });

        if up {
            match self.wifi.wifi().sta_netif().get_ip_info() {
                Ok(info) => log::info!("Wi-Fi connected. IP {}", info.ip),
                Err(e) => log::info!("Wi-Fi connected (IP unknown: {})", e),
            }
        } else {
            log::error!("Wi-Fi connection failed after {} polls", attempts);
        }
        up
    }

    pub fn disconnect(&mut self) {
        if let Ok(true) = self.wifi.is_connected() {
            if let Err(e) = self.wifi.disconnect() {
                log::warn!("Wi-Fi disconnect failed: {}", e);
            }
        }
        if let Ok(true) = self.wifi.is_started() {
            if let Err(e) = self.wifi.stop() {
                log::warn!("Wi-Fi stop failed: {}", e);
            }
        }
        log::info!("Wi-Fi off");
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
