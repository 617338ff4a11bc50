use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
    pub feed: Feed,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: Server {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: Database {
                path: "daybook.db".to_string(),
                seed_demo_data: true,
            },
            session: Session { ttl_days: 30 },
            feed: Feed {
                default_limit: 50,
                max_limit: 200,
            },
        }
    }
}

impl Settings {
    /// Load settings from `settings.toml` (if present) and the environment.
    ///
    /// Environment variables win: `HOST`, `PORT`, `DATABASE_PATH`,
    /// `SESSION_TTL_DAYS` and `FEED_LIMIT`.
    pub fn new() -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port)?
            .set_default("database.path", defaults.database.path)?
            .set_default("database.seed_demo_data", defaults.database.seed_demo_data)?
            .set_default("session.ttl_days", defaults.session.ttl_days)?
            .set_default("feed.default_limit", defaults.feed.default_limit)?
            .set_default("feed.max_limit", defaults.feed.max_limit)?;

        let config_file_name = "settings.toml";
        for path in [
            PathBuf::from(config_file_name),
            PathBuf::from("daybook-server").join(config_file_name),
        ] {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        for (var, key) in [
            ("HOST", "server.host"),
            ("PORT", "server.port"),
            ("DATABASE_PATH", "database.path"),
            ("SESSION_TTL_DAYS", "session.ttl_days"),
            ("FEED_LIMIT", "feed.default_limit"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Clamp a requested feed size into `1..=max_limit`
    pub fn feed_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.feed.default_limit)
            .clamp(1, self.feed.max_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_feed_limit_clamps() {
        let settings = Settings::default();
        assert_eq!(settings.feed_limit(None), 50);
        assert_eq!(settings.feed_limit(Some(0)), 1);
        assert_eq!(settings.feed_limit(Some(10)), 10);
        assert_eq!(settings.feed_limit(Some(10_000)), 200);
    }

    proptest! {
        #[test]
        fn prop_feed_limit_stays_in_range(requested in any::<i64>()) {
            let settings = Settings::default();
            let limit = settings.feed_limit(Some(requested));
            prop_assert!(limit >= 1);
            prop_assert!(limit <= settings.feed.max_limit);
        }
    }
}
