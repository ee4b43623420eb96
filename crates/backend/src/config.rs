use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// | Env Var          | Default            |
/// |------------------|--------------------|
/// | `HOST`           | `0.0.0.0`          |
/// | `PORT`           | `3000`             |
/// | `DB_PATH`        | `data/yacht.redb`  |
/// | `ASSETS_DIR`     | `assets`           |
/// | `SEED_DEMO_DATA` | `true`             |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    /// Load `seed.json` into an empty database on startup.
    pub seed_demo_data: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = match lookup("PORT") {
            None => 3000,
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a valid port number",
                value: raw,
            })?,
        };

        let db_path = PathBuf::from(lookup("DB_PATH").unwrap_or_else(|| "data/yacht.redb".into()));
        let assets_dir = PathBuf::from(lookup("ASSETS_DIR").unwrap_or_else(|| "assets".into()));

        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                name: "SEED_DEMO_DATA",
                expected: "true or false",
                value: raw,
            })?,
        };

        Ok(ServerConfig {
            host,
            port,
            db_path,
            assets_dir,
            seed_demo_data,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
