//! Process configuration.
//!
//! Loaded once at startup from an optional YAML file, then overridden by the
//! environment (`HOST`, `PORT`, `USERNAME`, `HTTP_PORT`, and the presence of
//! `RAILWAY_ENVIRONMENT`). CLI flags are applied last by the caller. The
//! resulting [`Config`] is immutable for the life of the process.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use minewright_bridge_protocol::{BehaviorSettings, ModuleToggles};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Default config file, resolved relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "minewright.yaml";

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub modules: ModuleToggles,
    #[serde(default)]
    pub settings: BehaviorSettings,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A missing or empty file yields the defaults; `${VAR}` and
    /// `${VAR:-default}` references in the file are expanded from the
    /// environment before parsing.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }

    /// Apply the process environment on top of file values.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Same as [`Config::apply_env`], with the variable source injected.
    pub(crate) fn apply_env_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(raw) = var("PORT") {
            match raw.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %raw, "ignoring unparseable PORT"),
            }
        }
        if let Some(username) = var("USERNAME") {
            self.server.username = username;
        }
        // Deployment platforms set this; its presence turns the status
        // endpoint on.
        if var("RAILWAY_ENVIRONMENT").is_some() {
            self.http.enabled = true;
        }
        if let Some(raw) = var("HTTP_PORT") {
            match raw.parse() {
                Ok(port) => self.http.port = port,
                Err(_) => warn!(value = %raw, "ignoring unparseable HTTP_PORT"),
            }
        }
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

/// The game server to join and the identity to join with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    /// Game protocol version the bridge should speak.
    #[serde(default = "default_game_version")]
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            version: default_game_version(),
        }
    }
}

// ============================================================================
// ReconnectConfig
// ============================================================================

/// Reconnect backoff: delay grows linearly by `step_ms` per attempt, capped
/// at `cap_delay_ms`, and gives up for good after `max_attempts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default = "default_cap_delay_ms")]
    pub cap_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            step_ms: default_step_ms(),
            cap_delay_ms: default_cap_delay_ms(),
        }
    }
}

// ============================================================================
// HttpConfig
// ============================================================================

/// The status endpoint. Off unless enabled here or by the deployment
/// environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_http_port(),
        }
    }
}

// ============================================================================
// BridgeConfig
// ============================================================================

/// How to launch the bridge child process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeConfig {
    /// Executable to spawn. Connection details are appended as
    /// `--host/--port/--username/--game-version` flags.
    #[serde(default = "default_bridge_command")]
    pub command: String,
    /// Extra arguments placed before the connection flags.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            args: Vec::new(),
        }
    }
}

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    25565
}

fn default_username() -> String {
    "BotMaster".to_string()
}

fn default_game_version() -> String {
    "1.21.4".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_step_ms() -> u64 {
    2000
}

fn default_cap_delay_ms() -> u64 {
    30000
}

fn default_http_port() -> u16 {
    3000
}

fn default_bridge_command() -> String {
    "minewright-bridge".to_string()
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in the raw config text.
///
/// Supports shell-compatible syntax:
/// - `${VAR}` - required variable, errors if not set
/// - `${VAR:-default}` - optional variable with default value
/// - `${VAR:-}` - optional variable, empty string if not set
/// - `$$` - escaped `$` (only needed before `{` to prevent expansion)
///
/// Nested references (`${VAR:-${OTHER}}`) are not supported, and an unclosed
/// `${` is an error.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                out.push_str(&resolve_var_reference(&mut chars)?);
            }
            // A lone `$` (as in "$100") stays literal.
            _ => out.push('$'),
        }
    }

    Ok(out)
}

/// Consume a `NAME}` or `NAME:-default}` reference (the `${` is already
/// eaten) and resolve it against the environment.
fn resolve_var_reference(
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<String, ConfigError> {
    let mut name = String::new();
    let mut default: Option<String> = None;
    let mut closed = false;

    while let Some(c) = chars.next() {
        match c {
            '}' => {
                closed = true;
                break;
            }
            ':' if default.is_none() && chars.peek() == Some(&'-') => {
                chars.next();
                default = Some(String::new());
            }
            _ => match default.as_mut() {
                Some(d) => d.push(c),
                None => name.push(c),
            },
        }
    }

    if !closed {
        return Err(ConfigError::UnclosedVarReference);
    }

    match std::env::var(&name) {
        Ok(value) => Ok(value),
        Err(_) => default.ok_or(ConfigError::MissingEnvVar(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    // ------------------------------------------------------------------
    // Defaults and file loading
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = Config::load("/definitely/not/here.yaml").await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.server.username, "BotMaster");
        assert_eq!(config.reconnect.max_attempts, 5);
        assert_eq!(config.reconnect.step_ms, 2000);
        assert_eq!(config.reconnect.cap_delay_ms, 30000);
        assert!(!config.http.enabled);
        assert_eq!(config.http.port, 3000);
    }

    #[tokio::test]
    async fn empty_file_yields_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "server:\n  host: mc.example.net\nreconnect:\n  max_attempts: 3\n",
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "mc.example.net");
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.reconnect.step_ms, 2000);
        assert!(config.modules.pvp);
        assert_eq!(config.settings.attack_range, 3.5);
    }

    #[tokio::test]
    async fn modules_and_settings_parse() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "modules:\n  pvp: false\nsettings:\n  collect_distance: 48\n  emergency_food_level: 9\n",
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert!(!config.modules.pvp);
        assert!(config.modules.auto_eat);
        assert_eq!(config.settings.collect_distance, 48);
        assert_eq!(config.settings.emergency_food_level, 9);
    }

    #[tokio::test]
    async fn invalid_yaml_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "server: [unclosed\n").unwrap();

        let err = Config::load(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    // ------------------------------------------------------------------
    // Environment overrides
    // ------------------------------------------------------------------

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config.apply_env_from(env(&[
            ("HOST", "play.example.net"),
            ("PORT", "25570"),
            ("USERNAME", "Scout"),
        ]));

        assert_eq!(config.server.host, "play.example.net");
        assert_eq!(config.server.port, 25570);
        assert_eq!(config.server.username, "Scout");
    }

    #[test]
    fn unparseable_port_is_ignored() {
        let mut config = Config::default();
        config.apply_env_from(env(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, 25565);
    }

    #[test]
    fn railway_presence_enables_http() {
        let mut config = Config::default();
        assert!(!config.http.enabled);

        config.apply_env_from(env(&[("RAILWAY_ENVIRONMENT", "production")]));
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 3000);

        config.apply_env_from(env(&[
            ("RAILWAY_ENVIRONMENT", "production"),
            ("HTTP_PORT", "8080"),
        ]));
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn absent_env_changes_nothing() {
        let mut config = Config::default();
        config.apply_env_from(env(&[]));
        assert_eq!(config, Config::default());
    }

    // ------------------------------------------------------------------
    // Variable expansion
    // ------------------------------------------------------------------

    #[test]
    fn expand_resolves_set_variable() {
        // SAFETY: test-only variable name, not read concurrently.
        unsafe { std::env::set_var("MW_TEST_EXPAND_HOST", "mc.internal") };
        let out = expand_env_vars("host: ${MW_TEST_EXPAND_HOST}").unwrap();
        assert_eq!(out, "host: mc.internal");
        unsafe { std::env::remove_var("MW_TEST_EXPAND_HOST") };
    }

    #[test]
    fn expand_uses_default_when_unset() {
        let out = expand_env_vars("host: ${MW_TEST_NOT_SET:-localhost}").unwrap();
        assert_eq!(out, "host: localhost");

        let out = expand_env_vars("key: ${MW_TEST_NOT_SET:-}").unwrap();
        assert_eq!(out, "key: ");
    }

    #[test]
    fn expand_errors_on_missing_required_variable() {
        let err = expand_env_vars("host: ${MW_TEST_REQUIRED_MISSING}").unwrap_err();
        match err {
            ConfigError::MissingEnvVar(name) => assert_eq!(name, "MW_TEST_REQUIRED_MISSING"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn expand_errors_on_unclosed_reference() {
        let err = expand_env_vars("host: ${MW_TEST_UNCLOSED").unwrap_err();
        assert!(matches!(err, ConfigError::UnclosedVarReference));
    }

    #[test]
    fn expand_leaves_plain_dollars_alone() {
        assert_eq!(expand_env_vars("price: $100").unwrap(), "price: $100");
        assert_eq!(expand_env_vars("escape: $${HOME}").unwrap(), "escape: ${HOME}");
    }
}
