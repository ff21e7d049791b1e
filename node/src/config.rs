use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::{fs::File, io::AsyncReadExt};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Invalid node config: {0}")]
    Invalid(String),
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    100
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    pub address: std::net::SocketAddr,
    /// When false, ListOperations answers UNIMPLEMENTED.
    #[serde(default = "default_true")]
    pub list_enabled: bool,
    /// When false, CancelOperation answers UNIMPLEMENTED.
    #[serde(default = "default_true")]
    pub cancel_enabled: bool,
    /// When false, DeleteOperation answers UNIMPLEMENTED.
    #[serde(default = "default_true")]
    pub delete_enabled: bool,
    /// Used when a list request leaves `page_size` at zero. At most `max_page_size`.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Operations created at start-up.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobConfig {
    pub duration_ms: u64,
    #[serde(default)]
    pub fail: bool,
}

impl JobConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            address: std::net::SocketAddr::from(([127, 0, 0, 1], 50051)),
            list_enabled: true,
            cancel_enabled: true,
            delete_enabled: true,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            jobs: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Config {
    node: NodeConfig,
}

impl NodeConfig {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.node.validate()?;
        Ok(config.node)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid(String::from(
                "max_page_size must be at least 1",
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size must be between 1 and max_page_size ({}), got {}",
                self.max_page_size, self.default_page_size
            )));
        }
        Ok(())
    }

    /// Read the lro node config
    pub async fn read(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let mut file = File::open(path).await?;
        let mut contents = vec![];
        file.read_to_end(&mut contents).await?;
        let contents = std::str::from_utf8(&contents)?;
        Ok(Self::parse(contents)?)
    }
}
