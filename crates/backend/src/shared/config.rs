use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Where the inventory store lives
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Import pipeline knobs
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Strict legacy rule set: Image_URL becomes a required column
    #[serde(default)]
    pub require_image_url: bool,
    /// Pause after every N upserted rows (0 disables the pause)
    #[serde(default = "default_throttle_every")]
    pub throttle_every: usize,
    #[serde(default = "default_throttle_pause_ms")]
    pub throttle_pause_ms: u64,
    #[serde(default = "default_progress_retention_hours")]
    pub progress_retention_hours: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            require_image_url: false,
            throttle_every: default_throttle_every(),
            throttle_pause_ms: default_throttle_pause_ms(),
            progress_retention_hours: default_progress_retention_hours(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_throttle_every() -> usize {
    5
}

fn default_throttle_pause_ms() -> u64 {
    100
}

fn default_progress_retention_hours() -> i64 {
    24
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[gateway]
base_url = "http://localhost:8080/api"
timeout_secs = 60

[import]
require_image_url = false
throttle_every = 5
throttle_pause_ms = 100
progress_retention_hours = 24
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.gateway.base_url.trim().is_empty() {
        anyhow::bail!("gateway.base_url must not be empty");
    }
    Ok(config)
}
