use anyhow::{bail, Result};
use clap::Parser;
use lib_stations::chat::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use lib_stations::RADIUS_POLICY_KM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "server_stations.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Charging station proximity stream server", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "STATIONS_PORT", help = "Port to listen on for client connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "STATIONS_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "STATIONS_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "STATIONS_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "STATIONS_UPDATE_INTERVAL_SECS", help = "Seconds between station updates pushed to a located client.")]
    pub update_interval_secs: Option<u64>,

    #[clap(long, env = "STATIONS_RADIUS_KM", help = "Only stations within this many kilometers are sent.")]
    pub radius_km: Option<f64>,

    #[clap(long, env = "STATIONS_FILE", help = "JSON array of stations replacing the built-in mock list.")]
    pub stations_file: Option<PathBuf>,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true, help = "API key for the chat backend. Chat is disabled without it.")]
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    #[clap(long, env = "STATIONS_GEMINI_MODEL", help = "Model name used for chat replies.")]
    pub gemini_model: Option<String>,

    #[clap(long, env = "STATIONS_GEMINI_BASE_URL", help = "Base URL of the generative language API.")]
    pub gemini_base_url: Option<String>,

    #[clap(long, env = "STATIONS_CHAT_TIMEOUT_SECS", help = "Timeout in seconds for one chat API request.")]
    pub chat_timeout_secs: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            update_interval_secs: other.update_interval_secs.or(self.update_interval_secs),
            radius_km: other.radius_km.or(self.radius_km),
            stations_file: other.stations_file.or(self.stations_file),
            gemini_api_key: other.gemini_api_key.or(self.gemini_api_key),
            gemini_model: other.gemini_model.or(self.gemini_model),
            gemini_base_url: other.gemini_base_url.or(self.gemini_base_url),
            chat_timeout_secs: other.chat_timeout_secs.or(self.chat_timeout_secs),
        }
    }

    fn defaults() -> Config {
        Config {
            port: Some(3000),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            update_interval_secs: Some(5),
            radius_km: Some(RADIUS_POLICY_KM),
            gemini_model: Some(DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: Some(DEFAULT_GEMINI_BASE_URL.to_string()),
            chat_timeout_secs: Some(30),
            ..Default::default()
        }
    }
}

/// Chat backend parameters; only present when an API key is configured.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub update_interval: Duration,
    pub radius_km: f64,
    pub stations_file: Option<PathBuf>,
    pub chat: Option<ChatSettings>,
    /// Things worth logging once the logger is up.
    pub notes: Vec<String>,
}

/// Defaults, then the JSON config file, then environment and CLI.
pub fn load_config() -> Result<Settings> {
    load_config_from(Config::parse())
}

pub fn load_config_from(cli: Config) -> Result<Settings> {
    let mut notes = Vec::new();
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = Config::defaults();
    if let Some(file_config) = read_config_file(&config_file_path, &mut notes) {
        current_config = current_config.merge(file_config);
    }
    current_config = current_config.merge(cli);

    resolve(current_config, notes)
}

fn read_config_file(path: &Path, notes: &mut Vec<String>) -> Option<Config> {
    if !path.exists() {
        notes.push(format!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        ));
        return None;
    }

    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => {
                notes.push(format!("Loaded config file {}", path.display()));
                Some(file_config)
            }
            Err(e) => {
                notes.push(format!(
                    "Failed to parse config file {}: {}. Falling back to other sources.",
                    path.display(),
                    e
                ));
                None
            }
        },
        Err(e) => {
            notes.push(format!(
                "Failed to read config file {}: {}. Falling back to other sources.",
                path.display(),
                e
            ));
            None
        }
    }
}

fn resolve(config: Config, notes: Vec<String>) -> Result<Settings> {
    let update_interval_secs = config.update_interval_secs.unwrap_or(5);
    if update_interval_secs == 0 {
        bail!("updateIntervalSecs must be at least 1");
    }

    let radius_km = config.radius_km.unwrap_or(RADIUS_POLICY_KM);
    if !radius_km.is_finite() || radius_km < 0.0 {
        bail!("radiusKm must be a non-negative number, got {}", radius_km);
    }

    let chat = config
        .gemini_api_key
        .filter(|key| !key.trim().is_empty())
        .map(|api_key| ChatSettings {
            api_key,
            model: config
                .gemini_model
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: config
                .gemini_base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout: Duration::from_secs(config.chat_timeout_secs.unwrap_or(30)),
        });

    Ok(Settings {
        port: config.port.unwrap_or(3000),
        log_dir: config.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
        log_level: config.log_level.unwrap_or_else(|| "info".to_string()),
        update_interval: Duration::from_secs(update_interval_secs),
        radius_km,
        stations_file: config.stations_file,
        chat,
        notes,
    })
}
