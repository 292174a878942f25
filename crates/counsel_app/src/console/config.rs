use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use counsel_core::{ConsoleSettings, Identity};
use counsel_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "counsel.ron";
const STATE_FILENAME: &str = ".counsel_state.ron";

/// Contents of `counsel.ron`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: ConsoleSettings,
    pub state_file: PathBuf,
    /// `file`, `terminal` or `both`.
    pub log_destination: String,
    pub log_level: String,
    pub log_file: PathBuf,
    /// Operator the backend reports as signed in.
    pub identity: Option<Identity>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: ConsoleSettings::default(),
            state_file: PathBuf::from(STATE_FILENAME),
            log_destination: "file".to_string(),
            log_level: "info".to_string(),
            log_file: PathBuf::from(counsel_logging::DEFAULT_LOG_FILE),
            identity: None,
        }
    }
}

/// Why a config file was not used. Reported after logging is up.
#[derive(Debug)]
pub enum ConfigIssue {
    Unreadable(io::Error),
    Malformed(String),
}

impl AppConfig {
    /// Reads `path`; a missing file yields defaults silently, any other
    /// problem yields defaults plus the issue.
    pub fn load(path: &Path) -> (Self, Option<ConfigIssue>) {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return (Self::default(), None),
            Err(err) => return (Self::default(), Some(ConfigIssue::Unreadable(err))),
        };
        match ron::from_str(&content) {
            Ok(config) => (config, None),
            Err(err) => (
                Self::default(),
                Some(ConfigIssue::Malformed(err.to_string())),
            ),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        LogDestination::parse(&self.log_destination).unwrap_or_default()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, issue) = AppConfig::load(&temp.path().join(CONFIG_FILENAME));
        assert_eq!(config, AppConfig::default());
        assert!(issue.is_none());
        assert_eq!(config.settings.list_limit, 500);
        assert_eq!(config.state_file, PathBuf::from(".counsel_state.ron"));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(
                settings: (contact_window_days: 14),
                log_destination: "both",
                identity: Some((uid: "u1", email: Some("c@school.org"))),
            )"#,
        )
        .unwrap();

        let (config, issue) = AppConfig::load(&path);
        assert!(issue.is_none());
        assert_eq!(config.settings.contact_window_days, 14);
        assert_eq!(config.settings.quick_list_len, 8);
        assert_eq!(config.log_destination(), LogDestination::Both);
        assert_eq!(config.identity.unwrap().uid, "u1");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        fs::write(&path, "(settings: [").unwrap();

        let (config, issue) = AppConfig::load(&path);
        assert_eq!(config, AppConfig::default());
        assert!(matches!(issue, Some(ConfigIssue::Malformed(_))));
    }

    #[test]
    fn unknown_log_settings_fall_back() {
        let config = AppConfig {
            log_destination: "syslog".to_string(),
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_destination(), LogDestination::File);
        assert_eq!(config.log_level(), LevelFilter::Info);
    }
}
