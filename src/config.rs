use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
    pub admin_enabled: bool,
    pub shutdown_grace: Duration,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            warn!("DATABASE_URL not set, polls will be kept in memory");
        }

        Ok(Self {
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "8000")?,
            database_url,
            max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            run_migrations: try_load(&lookup, "POLLS_RUN_MIGRATIONS", "true")?,
            admin_enabled: try_load(&lookup, "POLLS_ADMIN_ENABLED", "false")?,
            shutdown_grace: Duration::from_secs(try_load(&lookup, "SHUTDOWN_GRACE_SECS", "10")?),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:8000");
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
        assert!(!config.admin_enabled);
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("PORT", "3030"),
            ("DATABASE_URL", "postgres://localhost/polls"),
            ("POLLS_ADMIN_ENABLED", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/polls"));
        assert!(config.admin_enabled);
    }

    #[test]
    fn blank_database_url_means_memory() {
        let config = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn rejects_bad_port() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
