//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the settings store, shopper sessions and the credential
//! validator.

use apa_core::{
    FileSettingsStore, FixedStorefront, MemorySession, MemorySettingsStore, Settings,
    SettingsStore, Storefront,
};
use apa_mws::CredentialValidator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// TOML file holding gateway settings; in-memory when unset
    pub settings_path: Option<String>,
    /// Storefront base country (fallback for an unset payment region)
    pub base_country: String,
    /// Idle time after which a shopper session is dropped
    pub session_ttl_secs: u64,
    /// Most shopper sessions held at once; `0` disables sessions
    pub max_sessions: usize,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            settings_path: std::env::var("APA_SETTINGS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            base_country: std::env::var("APA_BASE_COUNTRY").unwrap_or_else(|_| "US".to_string()),
            session_ttl_secs: std::env::var("APA_SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            max_sessions: std::env::var("APA_MAX_SESSIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SESSIONS),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Two hours, roughly one checkout visit
pub const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: MemorySession,
    last_seen: Instant,
}

/// Shopper sessions keyed by the `apa_session` cookie.
///
/// Sessions idle for longer than the TTL are swept whenever a new one is
/// started. At capacity the least recently seen session makes room.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Start a new empty session and return its id
    pub fn start(&self) -> String {
        let now = Instant::now();
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());

        Self::sweep(&mut sessions, self.ttl, now);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }

        sessions.insert(
            id.clone(),
            SessionEntry {
                session: MemorySession::new(),
                last_seen: now,
            },
        );
        id
    }

    /// Whether `id` names a live session
    pub fn contains(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        sessions
            .get(id)
            .map(|entry| entry.last_seen.elapsed() <= self.ttl)
            .unwrap_or(false)
    }

    /// Run `f` with the session for `id`, or with `None` when there is none.
    /// A found session counts as seen.
    pub fn with_session<R>(
        &self,
        id: Option<&str>,
        f: impl FnOnce(Option<&mut MemorySession>) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        let entry = match id {
            Some(id) => sessions.get_mut(id),
            None => None,
        };
        match entry {
            Some(entry) => {
                entry.last_seen = Instant::now();
                f(Some(&mut entry.session))
            }
            None => f(None),
        }
    }

    /// Drop sessions idle for longer than the TTL as of `now`
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        Self::sweep(&mut sessions, self.ttl, now)
    }

    fn sweep(sessions: &mut HashMap<String, SessionEntry>, ttl: Duration, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Gateway settings store
    pub settings: Arc<dyn SettingsStore>,
    /// Storefront (base country)
    pub storefront: Arc<dyn Storefront>,
    /// Shopper sessions; `None` when sessions are disabled
    pub sessions: Option<SessionRegistry>,
    /// Credential validator run on settings save
    pub validator: Arc<CredentialValidator>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create AppState from the environment, validating against live MWS
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let settings: Arc<dyn SettingsStore> = match &config.settings_path {
            Some(path) => {
                let store = FileSettingsStore::open(path)
                    .map_err(|e| anyhow::anyhow!("Failed to open settings store: {}", e))?;
                tracing::info!("Loaded gateway settings from {}", path);
                Arc::new(store)
            }
            None => {
                tracing::warn!("APA_SETTINGS_PATH not set, settings will not survive a restart");
                Arc::new(MemorySettingsStore::new())
            }
        };

        let storefront: Arc<dyn Storefront> = Arc::new(FixedStorefront::new(&config.base_country));
        let validator = CredentialValidator::for_mws(storefront.clone());

        Ok(Self::from_parts(config, settings, storefront, validator))
    }

    /// Assemble state from explicit parts
    pub fn from_parts(
        config: AppConfig,
        settings: Arc<dyn SettingsStore>,
        storefront: Arc<dyn Storefront>,
        validator: CredentialValidator,
    ) -> Self {
        let sessions = (config.max_sessions > 0).then(|| {
            SessionRegistry::new(
                Duration::from_secs(config.session_ttl_secs),
                config.max_sessions,
            )
        });

        Self {
            settings,
            storefront,
            sessions,
            validator: Arc::new(validator),
            config,
        }
    }

    /// Fresh settings snapshot
    pub fn settings_snapshot(&self) -> Settings {
        Settings::load(self.settings.as_ref())
    }
}
