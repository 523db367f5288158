// Presence Node: Realtime Database Sink
//
// One REST write per state change:
//   PUT {url}{path}.json?auth={secret}   body: 0 | 1
// authenticated with the database secret (legacy token), TLS verified
// against the ESP-IDF certificate bundle.

use std::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use embedded_svc::io::Write;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

use crate::config::{SinkConfig, HTTP_TIMEOUT_MS};
use crate::error::ReportError;
use crate::events::ReportRecord;
use crate::net::wifi::WifiLink;
use crate::report::RemoteReporter;

pub struct FirebaseReporter {
    link: WifiLink,
    url: String,
    secret: String,
    client: Option<Client<EspHttpConnection>>,
}

fn transport<E: core::fmt::Debug>(e: E) -> ReportError {
    ReportError::Transport(format!("{:?}", e))
}

impl FirebaseReporter {
    pub fn new(link: WifiLink, config: &SinkConfig) -> Self {
        Self {
            link,
            url: config.url.trim_end_matches('/').to_owned(),
            secret: config.secret.clone(),
            client: None,
        }
    }

    /// Build the HTTPS client on first use within a connected session.
    fn client(&mut self) -> Result<&mut Client<EspHttpConnection>, ReportError> {
        if self.client.is_none() {
            let connection = EspHttpConnection::new(&HttpConfiguration {
                timeout: Some(Duration::from_millis(HTTP_TIMEOUT_MS)),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            })
            .map_err(|e| ReportError::ClientInit(e.to_string()))?;
            log::info!("Database client initialised for {}", self.url);
            self.client = Some(Client::wrap(connection));
        }
        self.client
            .as_mut()
            .ok_or_else(|| ReportError::ClientInit("client unavailable".into()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}.json?auth={}", self.url, path, self.secret)
    }
}

impl RemoteReporter for FirebaseReporter {
    fn connect(&mut self) -> bool {
        self.link.connect()
    }

    fn push(&mut self, record: &ReportRecord) -> Result<(), ReportError> {
        if !self.link.is_connected() {
            log::warn!("Wi-Fi not connected. Cannot send update.");
            return Err(ReportError::ConnectFailed);
        }

        let endpoint = self.endpoint(&record.path);
        let body = record.status.to_string();
        let content_length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", content_length.as_str()),
        ];

        let client = self.client()?;
        let mut request = client
            .request(Method::Put, &endpoint, &headers)
            .map_err(transport)?;
        request.write_all(body.as_bytes()).map_err(transport)?;
        request.flush().map_err(transport)?;
        let response = request.submit().map_err(transport)?;

        match response.status() {
            200..=299 => Ok(()),
            status => Err(ReportError::WriteRejected { status }),
        }
    }

    fn disconnect(&mut self) {
        self.client = None;
        self.link.disconnect();
    }
}
