//! # Gateway Settings
//!
//! Named configuration options and the stores that persist them.
//!
//! Options are plain strings, the way an operator form submits them.
//! Boolean options use `yes`/`no`. A [`Settings`] snapshot is read fresh
//! from the store on every call and is never cached.

use crate::error::{ApaError, ApaResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Option keys consumed and produced by the gateway
pub mod keys {
    pub const MWS_ACCESS_KEY: &str = "mws_access_key";
    pub const SECRET_KEY: &str = "secret_key";
    pub const PAYMENT_REGION: &str = "payment_region";
    pub const SANDBOX: &str = "sandbox";
    pub const ENABLE_LOGIN_APP: &str = "enable_login_app";
    pub const SELLER_ID: &str = "seller_id";
    pub const KEYS_VALIDATED: &str = "amazon_keys_setup_and_validated";

    pub const DATE_FORMAT: &str = "date_format";
    pub const TIME_FORMAT: &str = "time_format";
    pub const GMT_OFFSET: &str = "gmt_offset";
}

/// Read/write access to named configuration options.
///
/// Implementations must be durable for the lifetime they advertise and
/// safe to share across request handlers.
pub trait SettingsStore: Send + Sync {
    /// Read an option; `None` when it was never written
    fn get_option(&self, key: &str) -> Option<String>;

    /// Write an option
    fn update_option(&self, key: &str, value: &str) -> ApaResult<()>;
}

fn is_yes(value: Option<String>) -> bool {
    value.as_deref() == Some("yes")
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Snapshot of the gateway settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Stored region code (`us`, `gb`, `eu`, `jp`); empty when unset
    #[serde(default)]
    pub payment_region: String,

    /// Use the sandbox environment
    #[serde(default)]
    pub sandbox: bool,

    /// Load the login-app capable widget set
    #[serde(default)]
    pub enable_login_app: bool,

    /// Merchant seller id
    #[serde(default)]
    pub seller_id: String,

    /// MWS access key id
    #[serde(default)]
    pub mws_access_key: String,

    /// MWS secret key
    #[serde(default)]
    pub secret_key: String,
}

impl Settings {
    /// Read a fresh snapshot from the store
    pub fn load(store: &dyn SettingsStore) -> Self {
        Self {
            payment_region: store.get_option(keys::PAYMENT_REGION).unwrap_or_default(),
            sandbox: is_yes(store.get_option(keys::SANDBOX)),
            enable_login_app: is_yes(store.get_option(keys::ENABLE_LOGIN_APP)),
            seller_id: store.get_option(keys::SELLER_ID).unwrap_or_default(),
            mws_access_key: store.get_option(keys::MWS_ACCESS_KEY).unwrap_or_default(),
            secret_key: store.get_option(keys::SECRET_KEY).unwrap_or_default(),
        }
    }

    /// Persist every option of this snapshot
    pub fn save(&self, store: &dyn SettingsStore) -> ApaResult<()> {
        store.update_option(keys::PAYMENT_REGION, &self.payment_region)?;
        store.update_option(keys::SANDBOX, yes_no(self.sandbox))?;
        store.update_option(keys::ENABLE_LOGIN_APP, yes_no(self.enable_login_app))?;
        store.update_option(keys::SELLER_ID, &self.seller_id)?;
        store.update_option(keys::MWS_ACCESS_KEY, &self.mws_access_key)?;
        store.update_option(keys::SECRET_KEY, &self.secret_key)?;
        Ok(())
    }

    /// Builder: set region code
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.payment_region = region.into();
        self
    }

    /// Builder: toggle sandbox
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder: toggle login app widgets
    pub fn with_login_app(mut self, enabled: bool) -> Self {
        self.enable_login_app = enabled;
        self
    }

    /// Builder: set seller id
    pub fn with_seller_id(mut self, seller_id: impl Into<String>) -> Self {
        self.seller_id = seller_id.into();
        self
    }

    /// Builder: set API credentials
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.mws_access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    /// Access key with everything but the last four characters hidden
    pub fn masked_access_key(&self) -> String {
        mask(&self.mws_access_key)
    }
}

/// Hide all but the last four characters of a credential
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

/// Whether the last credential check succeeded
pub fn keys_validated(store: &dyn SettingsStore) -> bool {
    store.get_option(keys::KEYS_VALIDATED).as_deref() == Some("1")
}

const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";
const DEFAULT_TIME_FORMAT: &str = "%-I:%M %p";

/// Site date/time display options (strftime patterns + UTC offset in hours)
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeSettings {
    pub date_format: String,
    pub time_format: String,
    pub gmt_offset_hours: f64,
}

impl Default for DateTimeSettings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            gmt_offset_hours: 0.0,
        }
    }
}

impl DateTimeSettings {
    /// Read display options, falling back to defaults for unset or unusable values
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            date_format: store
                .get_option(keys::DATE_FORMAT)
                .filter(|f| is_valid_format(f))
                .unwrap_or(defaults.date_format),
            time_format: store
                .get_option(keys::TIME_FORMAT)
                .filter(|f| is_valid_format(f))
                .unwrap_or(defaults.time_format),
            gmt_offset_hours: store
                .get_option(keys::GMT_OFFSET)
                .and_then(|o| o.trim().parse().ok())
                .unwrap_or(defaults.gmt_offset_hours),
        }
    }

    /// Format an instant in site-local time as `<date> <time>`
    pub fn format(&self, now: DateTime<Utc>) -> String {
        let seconds = (self.gmt_offset_hours * 3600.0).round() as i32;
        let offset = FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix());
        let local = now.with_timezone(&offset);
        let pattern = format!("{} {}", self.date_format, self.time_format);
        local.format(&pattern).to_string()
    }
}

fn is_valid_format(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// In-memory settings store (tests, ephemeral deployments)
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    options: RwLock<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: preset an option
    pub fn with_option(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut options) = self.options.write() {
            options.insert(key.into(), value.into());
        }
        self
    }

    /// Seed the store from a settings snapshot
    pub fn from_settings(settings: &Settings) -> ApaResult<Self> {
        let store = Self::new();
        settings.save(&store)?;
        Ok(store)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_option(&self, key: &str) -> Option<String> {
        self.options.read().ok()?.get(key).cloned()
    }

    fn update_option(&self, key: &str, value: &str) -> ApaResult<()> {
        let mut options = self
            .options
            .write()
            .map_err(|_| ApaError::SettingsStore("settings lock poisoned".to_string()))?;
        options.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// TOML-file backed settings store. Every write is flushed to disk.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    options: RwLock<BTreeMap<String, String>>,
}

impl FileSettingsStore {
    /// Open a store, loading existing options if the file is present
    pub fn open(path: impl AsRef<Path>) -> ApaResult<Self> {
        let path = path.as_ref().to_path_buf();
        let options = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ApaError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ApaError::SettingsStore(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            options: RwLock::new(options),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, options: &BTreeMap<String, String>) -> ApaResult<()> {
        let content = toml::to_string(options)
            .map_err(|e| ApaError::Serialization(format!("Failed to encode settings: {}", e)))?;
        std::fs::write(&self.path, content).map_err(|e| {
            ApaError::SettingsStore(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_option(&self, key: &str) -> Option<String> {
        self.options.read().ok()?.get(key).cloned()
    }

    fn update_option(&self, key: &str, value: &str) -> ApaResult<()> {
        let mut options = self
            .options
            .write()
            .map_err(|_| ApaError::SettingsStore("settings lock poisoned".to_string()))?;

        // Memory only changes once the file has the new value
        let mut updated = options.clone();
        updated.insert(key.to_string(), value.to_string());
        self.flush(&updated)?;
        *options = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_settings_roundtrip_through_store() {
        let settings = Settings::default()
            .with_region("gb")
            .with_sandbox(true)
            .with_seller_id("A1SELLER")
            .with_credentials("AKIAEXAMPLE", "secret");

        let store = MemorySettingsStore::from_settings(&settings).unwrap();

        assert_eq!(store.get_option(keys::SANDBOX).as_deref(), Some("yes"));
        assert_eq!(store.get_option(keys::ENABLE_LOGIN_APP).as_deref(), Some("no"));
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_load_reads_fresh_values() {
        let store = MemorySettingsStore::new().with_option(keys::SELLER_ID, "first");
        assert_eq!(Settings::load(&store).seller_id, "first");

        store.update_option(keys::SELLER_ID, "second").unwrap();
        assert_eq!(Settings::load(&store).seller_id, "second");
    }

    #[test]
    fn test_only_yes_is_true() {
        let store = MemorySettingsStore::new()
            .with_option(keys::SANDBOX, "1")
            .with_option(keys::ENABLE_LOGIN_APP, "yes");
        let settings = Settings::load(&store);
        assert!(!settings.sandbox);
        assert!(settings.enable_login_app);
    }

    #[test]
    fn test_keys_validated_flag() {
        let store = MemorySettingsStore::new();
        assert!(!keys_validated(&store));
        store.update_option(keys::KEYS_VALIDATED, "1").unwrap();
        assert!(keys_validated(&store));
        store.update_option(keys::KEYS_VALIDATED, "0").unwrap();
        assert!(!keys_validated(&store));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("AKIAEXAMPLE1234"), "***********1234");
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn test_datetime_format_with_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 22, 30, 0).unwrap();
        let store = MemorySettingsStore::new()
            .with_option(keys::DATE_FORMAT, "%Y-%m-%d")
            .with_option(keys::TIME_FORMAT, "%H:%M")
            .with_option(keys::GMT_OFFSET, "2");

        let formatted = DateTimeSettings::load(&store).format(now);
        assert_eq!(formatted, "2024-03-06 00:30");
    }

    #[test]
    fn test_datetime_defaults_replace_bad_patterns() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 9, 5, 0).unwrap();
        let store = MemorySettingsStore::new().with_option(keys::DATE_FORMAT, "%Q");

        let clock = DateTimeSettings::load(&store);
        assert_eq!(clock.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(clock.format(now), "March 5, 2024 9:05 AM");
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let store = FileSettingsStore::open(&path).unwrap();
        assert!(store.get_option(keys::SELLER_ID).is_none());
        store.update_option(keys::SELLER_ID, "A1SELLER").unwrap();
        store.update_option(keys::KEYS_VALIDATED, "1").unwrap();
        drop(store);

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get_option(keys::SELLER_ID).as_deref(), Some("A1SELLER"));
        assert!(keys_validated(&reopened));
    }

    #[test]
    fn test_file_store_keeps_memory_in_step_with_disk() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("conf");
        std::fs::create_dir(&nested).unwrap();
        let path = nested.join("settings.toml");

        let store = FileSettingsStore::open(&path).unwrap();
        store.update_option(keys::SELLER_ID, "A1SELLER").unwrap();

        std::fs::remove_dir_all(&nested).unwrap();
        let err = store.update_option(keys::SELLER_ID, "A9OTHER").unwrap_err();

        assert!(matches!(err, ApaError::SettingsStore(_)));
        assert_eq!(store.get_option(keys::SELLER_ID).as_deref(), Some("A1SELLER"));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let err = FileSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, ApaError::Serialization(_)));
    }
}
