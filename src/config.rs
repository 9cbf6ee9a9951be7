//! Configuration sources and the typed application configuration.
//!
//! A [`ConfigProvider`] consults its sources in priority order; the first one
//! that knows a key wins. [`AppConfig::from_provider`] reads the shell's
//! settings from it and validates them.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the environment variables read by [`ConfigProvider::from_env`].
pub const ENV_PREFIX: &str = "WA";

/// Configuration lookup and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration key `{0}`")]
    Missing(String),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON configuration in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Parses a raw string the way environment variables are read.
    ///
    /// Digit strings that a number would not print back identically, such as
    /// `0812345678` or `+15551234567`, stay text so no digit is lost.
    pub fn parse(raw: &str) -> Self {
        if keeps_text_form(raw) {
            ConfigValue::String(raw.to_string())
        } else if let Ok(int_val) = raw.parse::<i64>() {
            ConfigValue::Integer(int_val)
        } else if let Ok(float_val) = raw.parse::<f64>() {
            ConfigValue::Float(float_val)
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            ConfigValue::Boolean(bool_val)
        } else {
            ConfigValue::String(raw.to_string())
        }
    }

    /// String form of scalar values. A phone number such as `15551234567`
    /// arrives from the environment as an integer and still reads as text.
    pub fn as_string(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Integer(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::Boolean(b) => Some(b.to_string()),
            ConfigValue::Array(_) | ConfigValue::Object(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            ConfigValue::Integer(1) => Some(true),
            ConfigValue::Integer(0) => Some(false),
            _ => None,
        }
    }

    /// Non-negative integer milliseconds as a duration.
    pub fn as_duration_ms(&self) -> Option<Duration> {
        self.as_i64()
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis)
    }
}

fn keeps_text_form(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let mut chars = unsigned.chars();
    raw.starts_with('+')
        || (chars.next() == Some('0') && chars.next().map_or(false, |c| c.is_ascii_digit()))
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Get a configuration value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// List all available keys
    fn keys(&self) -> Vec<String>;
}

/// Environment variable configuration source
///
/// Key `phone_number` with prefix `WA` reads `WA_PHONE_NUMBER`.
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let key = key.to_uppercase().replace('.', "_");
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        env::var(self.env_key(key)).ok().map(|value| ConfigValue::parse(&value))
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(key, _)| match &self.prefix {
                Some(prefix) => {
                    let prefix = format!("{}_", prefix.to_uppercase());
                    key.strip_prefix(&prefix).map(str::to_lowercase)
                }
                None => Some(key.to_lowercase()),
            })
            .collect()
    }
}

/// In-memory configuration source, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.values.insert(key.into(), value);
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// JSON file configuration source
///
/// The file holds one flat object; it is read on first lookup and again on
/// [`reload`](Self::reload).
#[derive(Debug)]
pub struct JsonConfigSource {
    /// File path to JSON configuration
    file_path: PathBuf,
    /// Cached parsed configuration
    config: RwLock<Option<HashMap<String, ConfigValue>>>,
}

impl JsonConfigSource {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            config: RwLock::new(None),
        }
    }

    /// Opens and parses the file right away, reporting any error.
    pub fn load(file_path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let source = Self::new(file_path);
        source.reload()?;
        Ok(source)
    }

    /// Reload configuration from file
    pub fn reload(&self) -> ConfigResult<()> {
        let content = std::fs::read_to_string(&self.file_path).map_err(|source| ConfigError::Io {
            path: self.file_path.clone(),
            source,
        })?;

        let parsed: HashMap<String, ConfigValue> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: self.file_path.clone(),
                source,
            })?;

        *self.config.write() = Some(parsed);
        Ok(())
    }
}

impl ConfigSource for JsonConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        if self.config.read().is_none() {
            if let Err(err) = self.reload() {
                tracing::warn!(error = %err, "configuration file unavailable");
                return None;
            }
        }

        self.config.read().as_ref()?.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.config
            .read()
            .as_ref()
            .map(|cfg| cfg.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Configuration provider consulting its sources in priority order.
pub struct ConfigProvider {
    /// Configuration sources in priority order
    sources: Vec<Box<dyn ConfigSource>>,
    /// Cached configuration values
    cache: RwLock<HashMap<String, ConfigValue>>,
}

impl fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProvider")
            .field("sources", &self.sources)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl ConfigProvider {
    /// Create a provider with no sources
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A provider reading `WA_*` environment variables.
    pub fn from_env() -> Self {
        Self::new().with_source(EnvironmentConfigSource::with_prefix(ENV_PREFIX))
    }

    /// Add a configuration source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
        self.invalidate_cache();
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// Get a configuration value, checking sources in priority order
    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.cache.read().get(key) {
            return Some(value.clone());
        }

        let value = self.sources.iter().find_map(|source| source.get(key))?;
        self.cache.write().insert(key.to_string(), value.clone());
        Some(value)
    }

    /// Get a string configuration value
    pub fn get_string(&self, key: &str) -> ConfigResult<String> {
        let value = self.get(key).ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        value
            .as_string()
            .ok_or_else(|| ConfigError::invalid(key, "expected a string"))
    }

    /// Optional string value; present but malformed is still an error.
    pub fn get_string_opt(&self, key: &str) -> ConfigResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_string()
                .map(Some)
                .ok_or_else(|| ConfigError::invalid(key, "expected a string")),
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_string_opt(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> ConfigResult<i64> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| ConfigError::invalid(key, "expected an integer")),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| ConfigError::invalid(key, "expected a boolean")),
        }
    }

    /// Get a duration configuration value (from milliseconds) with default
    pub fn get_duration_ms_or(&self, key: &str, default: Duration) -> ConfigResult<Duration> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_duration_ms()
                .ok_or_else(|| ConfigError::invalid(key, "expected non-negative milliseconds")),
        }
    }

    /// Clear the configuration cache (forces reload from sources)
    pub fn invalidate_cache(&self) {
        self.cache.write().clear();
    }

    /// Get all configuration keys from all sources
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().flat_map(|source| source.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl Default for ConfigProvider {
    fn default() -> Self {
        Self::from_env()
    }
}

/// How the session authenticates when no stored credentials exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingMode {
    /// Scan a QR code published on the `"qr"` event
    #[default]
    Qr,
    /// Request a pairing code for the configured phone number
    Code,
}

impl std::str::FromStr for PairingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qr" => Ok(PairingMode::Qr),
            "code" => Ok(PairingMode::Code),
            other => Err(ConfigError::invalid(
                "pairing_mode",
                format!("expected `qr` or `code`, got `{other}`"),
            )),
        }
    }
}

/// Typed settings of the application shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub phone_number: Option<String>,
    pub pairing_mode: PairingMode,
    #[serde(with = "duration_ms")]
    pub group_cache_ttl: Duration,
    #[serde(with = "duration_ms")]
    pub message_cache_ttl: Duration,
    pub message_cache_capacity: usize,
    /// `tracing` env-filter directive
    pub log: String,
    pub reconnect: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            phone_number: None,
            pairing_mode: PairingMode::Qr,
            group_cache_ttl: Duration::from_millis(300_000),
            message_cache_ttl: Duration::from_millis(600_000),
            message_cache_capacity: 1000,
            log: "info".to_string(),
            reconnect: true,
        }
    }
}

impl AppConfig {
    /// Reads and validates the settings. Absent keys take their defaults.
    pub fn from_provider(provider: &ConfigProvider) -> ConfigResult<Self> {
        let defaults = Self::default();

        let phone_number = provider
            .get_string_opt("phone_number")?
            .map(|number| number.trim().trim_start_matches('+').to_string())
            .filter(|number| !number.is_empty());
        let pairing_mode: PairingMode = match provider.get_string_opt("pairing_mode")? {
            Some(raw) => raw.parse()?,
            None => defaults.pairing_mode,
        };
        let capacity = provider.get_i64_or("message_cache_capacity", defaults.message_cache_capacity as i64)?;

        let config = Self {
            phone_number,
            pairing_mode,
            group_cache_ttl: provider.get_duration_ms_or("group_cache_ttl_ms", defaults.group_cache_ttl)?,
            message_cache_ttl: provider.get_duration_ms_or("message_cache_ttl_ms", defaults.message_cache_ttl)?,
            message_cache_capacity: usize::try_from(capacity)
                .map_err(|_| ConfigError::invalid("message_cache_capacity", "must not be negative"))?,
            log: provider.get_string_or("log", &defaults.log)?,
            reconnect: provider.get_bool_or("reconnect", defaults.reconnect)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pairing_mode == PairingMode::Code {
            let number = self
                .phone_number
                .as_deref()
                .ok_or_else(|| ConfigError::Missing("phone_number".to_string()))?;
            if !number.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::invalid("phone_number", "must contain digits only"));
            }
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
