use crate::domain::{Plan, Session};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Freelancer identity recorded on the session
    #[serde(default = "default_identity")]
    pub identity: String,
    #[serde(default)]
    pub plan: Plan,
    /// How long a session stays valid after start-up
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    /// Live display refresh interval
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub default_hourly_rate: Option<f64>,
    #[serde(default)]
    pub desktop_notifications: bool,
    /// Emoji glyphs in the task list; ASCII when off
    #[serde(default = "default_use_emoji")]
    pub use_emoji: bool,
}

fn default_identity() -> String {
    std::env::var("USER").unwrap_or_else(|_| "freelancer".to_string())
}

fn default_session_hours() -> i64 {
    12
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_use_emoji() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            plan: Plan::Free,
            session_hours: default_session_hours(),
            tick_ms: default_tick_ms(),
            currency: default_currency(),
            default_hourly_rate: None,
            desktop_notifications: false,
            use_emoji: default_use_emoji(),
        }
    }
}

impl AppConfig {
    /// Open a session for the configured identity
    pub fn open_session(&self, now: DateTime<Utc>) -> Session {
        Session::open(
            self.identity.clone(),
            self.plan,
            now,
            Duration::hours(self.session_hours.max(1)),
        )
    }
}

/// Load configuration from config.json, defaults when the file doesn't exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config)
}

/// Save configuration to config.json
pub fn save_config<P: AsRef<Path>>(path: P, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = tempdir().unwrap();
        let config = load_config(temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config.tick_ms, 1000);
        assert_eq!(config.plan, Plan::Free);
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "identity": "ana", "plan": "paid" }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.identity, "ana");
        assert_eq!(config.plan, Plan::Paid);
        assert_eq!(config.session_hours, 12);
        assert!(config.default_hourly_rate.is_none());
        assert!(config.use_emoji);
    }

    #[test]
    fn test_ascii_glyphs_can_be_configured() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "use_emoji": false }"#).unwrap();

        assert!(!load_config(&path).unwrap().use_emoji);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.identity = "ana".to_string();
        config.default_hourly_rate = Some(75.0);
        config.tick_ms = 500;

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_open_session_uses_identity_and_hours() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut config = AppConfig::default();
        config.identity = "ana".to_string();
        config.session_hours = 2;

        let session = config.open_session(now);
        assert_eq!(session.identity, "ana");
        assert_eq!(session.expires_at, now + Duration::hours(2));
    }
}
