use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Session data stored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub email: String,
    pub session_token: String,
    pub user_id: String,
}

/// Server configuration stored locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Configuration manager for the `~/.daybook` directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a config manager rooted at `~/.daybook`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Self::with_dir(home_dir.join(".daybook"))
    }

    /// Create a config manager rooted at an explicit directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn session_file(&self) -> PathBuf {
        self.config_dir.join("session.json")
    }

    fn server_config_file(&self) -> PathBuf {
        self.config_dir.join("server.json")
    }

    /// Save session data with owner-only permissions.
    ///
    /// Writes to a temporary file first and renames it into place.
    pub fn save_session(&self, session: &SessionData) -> Result<()> {
        let json =
            serde_json::to_string_pretty(session).context("Failed to serialize session data")?;

        let session_file = self.session_file();
        let temp_path = session_file.with_extension("tmp");

        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(json.as_bytes())
            .context("Failed to write session data")?;
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &session_file)
            .context("Failed to rename temporary session file")?;

        log::info!("Saved session to {}", session_file.display());
        Ok(())
    }

    /// Load session data. A corrupted file is treated as no session.
    pub fn load_session(&self) -> Result<Option<SessionData>> {
        let session_file = self.session_file();
        if !session_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&session_file).context("Failed to read session file")?;
        match serde_json::from_str::<SessionData>(&json) {
            Ok(session) if !session.session_token.trim().is_empty() => Ok(Some(session)),
            Ok(_) => {
                log::warn!("Session file has an empty token, treating as no session");
                Ok(None)
            }
            Err(e) => {
                log::warn!("Session file is corrupted ({}), treating as no session", e);
                Ok(None)
            }
        }
    }

    /// Returns `Ok(())` even if there is no session file
    pub fn delete_session(&self) -> Result<()> {
        let session_file = self.session_file();
        if session_file.exists() {
            fs::remove_file(&session_file).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", session_file.display());
        }
        Ok(())
    }

    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize server config")?;
        fs::write(self.server_config_file(), json).context("Failed to write server config file")?;
        Ok(())
    }

    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.server_config_file();
        if !config_file.exists() {
            return Ok(None);
        }

        let json =
            fs::read_to_string(&config_file).context("Failed to read server config file")?;
        let config: ServerConfig =
            serde_json::from_str(&json).context("Failed to parse server config")?;
        Ok(Some(config))
    }

    /// Resolve the server URL: command line first, then the saved config, then the default.
    ///
    /// A URL given on the command line is remembered for next time.
    pub fn determine_server_url(&self, cli_server: Option<&str>) -> String {
        if let Some(url) = cli_server {
            let config = ServerConfig {
                server_url: url.to_string(),
                last_updated: chrono::Utc::now(),
            };
            if let Err(e) = self.save_server_config(&config) {
                log::warn!("Failed to remember server URL: {}", e);
            }
            return url.to_string();
        }

        match self.load_server_config() {
            Ok(Some(config)) => config.server_url,
            Ok(None) => DEFAULT_SERVER_URL.to_string(),
            Err(e) => {
                log::warn!("Ignoring unreadable server config: {}", e);
                DEFAULT_SERVER_URL.to_string()
            }
        }
    }
}
