use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "finote", about = "Finote - local-first expense tracker engine")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "finote.toml")]
    pub config: String,

    /// Path to the durable blob database (overrides config file)
    #[arg(short, long)]
    pub data_path: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// User id to open a session for
    #[arg(short, long, default_value = "local")]
    pub user: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        path: default_data_path(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_data_path() -> String {
    "finote.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: default_storage(),
            logging: default_logging(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref path) = cli.data_path {
            config.storage.path = path.clone();
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }
}
