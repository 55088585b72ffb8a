//! Application configuration and persisted backup state.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$SMSMIME_CONFIG` (environment variable)
//! 2. `~/.config/smsmime/config.toml` (Linux/macOS)
//!    `%APPDATA%\smsmime\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Mutable state that must survive between runs (the reference token and
//! the date watermark) lives separately in `state.toml` inside the cache
//! directory, see [`PrefStore`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contacts::cache::DEFAULT_CACHE_SIZE;

/// Watermark used before the first backup: every real row date is greater.
pub const DEFAULT_MAX_SYNCED_DATE: i64 = -1;

/// Version string written into every converted message.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Backup conversion settings.
    pub backup: BackupConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// The device owner's address, used as sender of outgoing SMS.
    pub user_email: String,
    /// Override cache directory for state and logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Backup conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Set the `\Seen` flag on every backed-up message.
    pub mark_as_read: bool,
    /// Maximum number of messages converted per run.
    pub max_entries: usize,
    /// Number of resolved contacts kept in memory.
    pub person_cache_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_email: "me@sms.local".to_string(),
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            mark_as_read: true,
            max_entries: 500,
            person_cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SMSMIME_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("smsmime").join("config.toml"))
}

/// Return the cache directory for state and logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smsmime")
}

/// Return the persisted state file path.
pub fn state_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("state.toml")
}

// ── Preferences ─────────────────────────────────────────────────

/// Settings and state the converter reads, as an abstract store.
pub trait Preferences {
    /// The persisted reference token, if one was generated before.
    fn reference_uid(&self) -> Option<String>;
    fn set_reference_uid(&mut self, value: &str);
    /// Whether converted messages are flagged as seen.
    fn mark_as_read(&self) -> bool;
    /// Version string for the `X-smssync-version` header.
    fn version(&self) -> String;
    /// Highest row date already backed up.
    fn max_synced_date(&self) -> i64;
    fn set_max_synced_date(&mut self, value: i64);
}

/// Values persisted in `state.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    pub reference_uid: Option<String>,
    pub max_synced_date: i64,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            reference_uid: None,
            max_synced_date: DEFAULT_MAX_SYNCED_DATE,
        }
    }
}

/// File-backed [`Preferences`]: configuration plus `state.toml`.
///
/// Setters only change memory; call [`PrefStore::save`] to persist.
#[derive(Debug, Clone)]
pub struct PrefStore {
    path: PathBuf,
    state: SyncState,
    mark_as_read: bool,
}

impl PrefStore {
    /// Open the state file, starting fresh if it is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>, mark_as_read: bool) -> Self {
        let path = path.into();
        let state = read_state(&path).unwrap_or_default();
        Self {
            path,
            state,
            mark_as_read,
        }
    }

    /// Open the state file for a configuration.
    pub fn for_config(config: &Config) -> Self {
        Self::open(state_file_path(config), config.backup.mark_as_read)
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the state file, creating parent directories.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, contents)?;
        tracing::debug!(path = %self.path.display(), "Saved state");
        Ok(())
    }
}

fn read_state(path: &Path) -> Option<SyncState> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read state file");
            return None;
        }
    };
    match toml::from_str(&contents) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse state file");
            None
        }
    }
}

impl Preferences for PrefStore {
    fn reference_uid(&self) -> Option<String> {
        self.state.reference_uid.clone()
    }

    fn set_reference_uid(&mut self, value: &str) {
        self.state.reference_uid = Some(value.to_string());
    }

    fn mark_as_read(&self) -> bool {
        self.mark_as_read
    }

    fn version(&self) -> String {
        VERSION.to_string()
    }

    fn max_synced_date(&self) -> i64 {
        self.state.max_synced_date
    }

    fn set_max_synced_date(&mut self, value: i64) {
        self.state.max_synced_date = value;
    }
}

/// In-memory [`Preferences`] for embedding and tests.
#[derive(Debug, Clone)]
pub struct MemoryPrefs {
    pub reference_uid: Option<String>,
    pub mark_as_read: bool,
    pub version: String,
    pub max_synced_date: i64,
}

impl Default for MemoryPrefs {
    fn default() -> Self {
        Self {
            reference_uid: None,
            mark_as_read: true,
            version: VERSION.to_string(),
            max_synced_date: DEFAULT_MAX_SYNCED_DATE,
        }
    }
}

impl Preferences for MemoryPrefs {
    fn reference_uid(&self) -> Option<String> {
        self.reference_uid.clone()
    }

    fn set_reference_uid(&mut self, value: &str) {
        self.reference_uid = Some(value.to_string());
    }

    fn mark_as_read(&self) -> bool {
        self.mark_as_read
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn max_synced_date(&self) -> i64 {
        self.max_synced_date
    }

    fn set_max_synced_date(&mut self, value: i64) {
        self.max_synced_date = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.user_email, "me@sms.local");
        assert_eq!(cfg.general.log_level, "warn");
        assert!(cfg.backup.mark_as_read);
        assert_eq!(cfg.backup.person_cache_size, 500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[general]
user_email = "alice@example.com"

[backup]
mark_as_read = false
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.general.user_email, "alice@example.com");
        assert!(!cfg.backup.mark_as_read);
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.backup.max_entries, 500);
    }

    #[test]
    fn test_pref_store_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PrefStore::open(dir.path().join("state.toml"), true);
        assert_eq!(prefs.reference_uid(), None);
        assert_eq!(prefs.max_synced_date(), DEFAULT_MAX_SYNCED_DATE);
        assert!(prefs.mark_as_read());
        assert_eq!(prefs.version(), VERSION);
    }

    #[test]
    fn test_pref_store_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut prefs = PrefStore::open(&path, false);
        prefs.set_reference_uid("abc123");
        prefs.set_max_synced_date(1_262_304_000_000);
        prefs.save().unwrap();

        let reopened = PrefStore::open(&path, false);
        assert_eq!(reopened.reference_uid().as_deref(), Some("abc123"));
        assert_eq!(reopened.max_synced_date(), 1_262_304_000_000);
        assert_eq!(reopened.state(), prefs.state());
    }

    #[test]
    fn test_pref_store_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "max_synced_date = \"soon\"").unwrap();
        let prefs = PrefStore::open(&path, true);
        assert_eq!(prefs.max_synced_date(), DEFAULT_MAX_SYNCED_DATE);
    }
}
