use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::{fs::File, io::AsyncReadExt};

use crate::options::{CallOptions, API_KEY_HEADER, CLIENT_ID_HEADER};
use crate::LroError;

fn default_poll_interval_ms() -> u64 {
    5000
}

/// Connection target and the defaults applied to every call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// `http(s)://host:port` or `unix:///path/to.sock`
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    client: ClientConfig,
}

impl ClientConfig {
    pub fn new(host: &str) -> Self {
        ClientConfig {
            host: host.to_string(),
            api_key: None,
            client_id: None,
            timeout_ms: None,
            poll_interval_ms: default_poll_interval_ms(),
            headers: BTreeMap::new(),
        }
    }

    /// Parse the `[client]` table of a TOML document.
    pub fn parse(contents: &str) -> Result<Self, LroError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| LroError::Config(e.to_string()))?;
        Ok(file.client)
    }

    /// Read the client config
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, LroError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .await
            .map_err(|e| LroError::Config(format!("{}: {e}", path.display())))?;
        let mut contents = vec![];
        file.read_to_end(&mut contents)
            .await
            .map_err(|e| LroError::Config(format!("{}: {e}", path.display())))?;
        let contents = std::str::from_utf8(&contents)
            .map_err(|e| LroError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(contents)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The options every call starts from, with the headers checked up front.
    pub fn call_options(&self) -> Result<CallOptions, LroError> {
        let mut options = CallOptions::new();
        if let Some(timeout_ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(api_key) = &self.api_key {
            options = options.with_header(API_KEY_HEADER, api_key);
        }
        if let Some(client_id) = &self.client_id {
            options = options.with_header(CLIENT_ID_HEADER, client_id);
        }
        for (name, value) in &self.headers {
            options = options.with_header(name, value);
        }
        options.validate()?;
        Ok(options)
    }
}
