// ⚙️ Configuration - Environment first, CLI flags override
//
//   INVENTORY_DATA_DIR    data directory            (default: data)
//   INVENTORY_DB          list database             (default: <data_dir>/inventory.db)
//   INVENTORY_ITEM_CSV    master item list          (default: item_list.csv)
//   PORT                  API server port           (default: 3000)
//   INVENTORY_LOG_LEVEL   tracing filter            (default: info, RUST_LOG wins)
//   INVENTORY_LOG_FORMAT  pretty | json             (default: pretty)

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<LogFormat> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub item_csv: PathBuf,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Config {
            database: data_dir.join("inventory.db"),
            data_dir,
            item_csv: PathBuf::from("item_list.csv"),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through any key lookup (tests use a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(dir) = get("INVENTORY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.database = config.data_dir.join("inventory.db");
        }
        if let Some(db) = get("INVENTORY_DB") {
            config.database = PathBuf::from(db);
        }
        if let Some(csv) = get("INVENTORY_ITEM_CSV") {
            config.item_csv = PathBuf::from(csv);
        }
        if let Some(port) = get("PORT") {
            config.port = parse_port(&port)?;
        }
        if let Some(level) = get("INVENTORY_LOG_LEVEL") {
            config.log_level = level.trim().to_string();
        }
        if let Some(format) = get("INVENTORY_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format).ok_or(ConfigError::Invalid {
                key: "INVENTORY_LOG_FORMAT",
                value: format,
                reason: "expected 'pretty' or 'json'",
            })?;
        }

        Ok(config)
    }
}

pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::Invalid {
            key: "PORT",
            value: value.to_string(),
            reason: "expected a port number between 1 and 65535",
        }),
    }
}
