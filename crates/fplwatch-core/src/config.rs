// Configuration loading and parsing (config/fplwatch.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::metrics::safety::{SafetyPolicy, SafetyTier};

/// Name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "fplwatch.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub polling: PollingConfig,
    /// SQLite path for the session store. Empty means the platform data
    /// directory.
    pub db_path: String,
    pub safety: SafetyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig::default(),
            server: ServerConfig::default(),
            polling: PollingConfig::default(),
            db_path: "fplwatch.db".into(),
            safety: SafetyConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// fplwatch.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    server: ServerConfig,
    polling: PollingConfig,
    database: DatabaseSection,
    safety: SafetySection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SafetySection {
    fallback_total_players: u64,
    tiers: Vec<SafetyTier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Identical requests inside this window share one upstream call.
    #[serde(default)]
    pub dedupe_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://fantasy.premierleague.com/api".into(),
            timeout_secs: 10,
            user_agent: concat!("fplwatch/", env!("CARGO_PKG_VERSION")).into(),
            dedupe_secs: 5,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn dedupe_window(&self) -> Duration {
        Duration::from_secs(self.dedupe_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ws_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            ws_port: 9001,
        }
    }
}

/// Poll cadence per metric, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub team_secs: u64,
    pub live_points_secs: u64,
    pub safety_secs: u64,
    pub leagues_secs: u64,
    pub fixtures_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            team_secs: 30,
            live_points_secs: 15,
            safety_secs: 30,
            leagues_secs: 300,
            fixtures_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SafetyConfig {
    /// Population used for the rank percentile when bootstrap omits
    /// `total_players`.
    pub fallback_total_players: u64,
    pub policy: SafetyPolicy,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            fallback_total_players: 10_000_000,
            policy: SafetyPolicy::default(),
        }
    }
}

impl Config {
    /// Where the session database lives. Relative paths stay relative to
    /// the working directory; an empty path resolves to the platform data
    /// directory.
    pub fn resolve_db_path(&self) -> PathBuf {
        if !self.db_path.is_empty() {
            return PathBuf::from(&self.db_path);
        }
        directories::ProjectDirs::from("", "", "fplwatch")
            .map(|dirs| dirs.data_dir().join("fplwatch.db"))
            .unwrap_or_else(|| PathBuf::from("fplwatch.db"))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/fplwatch.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate configuration text. `path` is only used in errors.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let policy =
        SafetyPolicy::new(file.safety.tiers).map_err(|message| ConfigError::ValidationError {
            field: "safety.tiers".into(),
            message,
        })?;

    let config = Config {
        api: file.api,
        server: file.server,
        polling: file.polling,
        db_path: file.database.path,
        safety: SafetyConfig {
            fallback_total_players: file.safety.fallback_total_players,
            policy,
        },
    };

    validate(&config)?;
    Ok(config)
}

/// Seed `config/fplwatch.toml` from `defaults/fplwatch.toml` when it does
/// not exist yet. Returns the created path, or `None` when a config file was
/// already there. An existing file is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let copy_error = |message: String| ConfigError::DefaultsCopyError { message };
    let mut defaults = std::fs::File::open(&source).map_err(|e| {
        copy_error(format!(
            "no {} and no {} ({e}); run from the project root",
            target.display(),
            source.display()
        ))
    })?;

    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| copy_error(format!("failed to create {}: {e}", config_dir.display())))?;
    }

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(dest) => dest,
        // Created concurrently by another instance.
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(copy_error(format!("failed to create {}: {e}", target.display()))),
    };
    std::io::copy(&mut defaults, &mut dest)
        .map_err(|e| copy_error(format!("failed to write {}: {e}", target.display())))?;

    tracing::info!("created {} from defaults", target.display());
    Ok(Some(target))
}

/// Loads config relative to the current working directory, seeding it from
/// the defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.api.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "api.base_url",
            format!("must be an http(s) URL, got `{}`", config.api.base_url),
        ));
    }
    if config.api.timeout_secs == 0 {
        return Err(invalid("api.timeout_secs", "must be > 0"));
    }

    if config.server.port == 0 {
        return Err(invalid("server.port", "must be > 0"));
    }
    if config.server.ws_port == 0 {
        return Err(invalid("server.ws_port", "must be > 0"));
    }
    if config.server.port == config.server.ws_port {
        return Err(invalid(
            "server.ws_port",
            format!("must differ from server.port ({})", config.server.port),
        ));
    }

    let p = &config.polling;
    let intervals: &[(&str, u64)] = &[
        ("polling.team_secs", p.team_secs),
        ("polling.live_points_secs", p.live_points_secs),
        ("polling.safety_secs", p.safety_secs),
        ("polling.leagues_secs", p.leagues_secs),
        ("polling.fixtures_secs", p.fixtures_secs),
    ];
    for (name, secs) in intervals {
        if *secs == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    if config.safety.fallback_total_players == 0 {
        return Err(invalid("safety.fallback_total_players", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"
[api]
base_url = "https://fantasy.premierleague.com/api"
timeout_secs = 10
user_agent = "fplwatch/test"
dedupe_secs = 5

[server]
host = "127.0.0.1"
port = 8080
ws_port = 9001

[polling]
team_secs = 30
live_points_secs = 15
safety_secs = 30
leagues_secs = 300
fixtures_secs = 300

[database]
path = "fplwatch.db"

[safety]
fallback_total_players = 10000000

[[safety.tiers]]
below_rank = 10000
percent = 115

[[safety.tiers]]
below_rank = 100000
percent = 110

[[safety.tiers]]
below_rank = 1000000
percent = 105

[[safety.tiers]]
percent = 100
"#;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("test.toml"))
    }

    /// Helper: returns the workspace root holding `defaults/`.
    fn project_root() -> PathBuf {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        manifest
            .ancestors()
            .find(|p| p.join("defaults").join(CONFIG_FILE).exists())
            .map(Path::to_path_buf)
            .expect("cannot locate defaults/ above the crate directory")
    }

    #[test]
    fn parse_valid_config() {
        let config = parse(VALID).expect("valid config");
        assert_eq!(config.api.base_url, "https://fantasy.premierleague.com/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.api.dedupe_window(), Duration::from_secs(5));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.ws_port, 9001);
        assert_eq!(config.polling.live_points_secs, 15);
        assert_eq!(config.polling.team_secs, 30);
        assert_eq!(config.db_path, "fplwatch.db");
        assert_eq!(config.safety.fallback_total_players, 10_000_000);
        assert_eq!(config.safety.policy, SafetyPolicy::default());
    }

    #[test]
    fn shipped_defaults_match_builtin_defaults() {
        let root = project_root();
        let text = fs::read_to_string(root.join("defaults").join(CONFIG_FILE)).unwrap();
        let config = parse(&text).expect("shipped defaults should be valid");
        let builtin = Config::default();
        assert_eq!(config.api.base_url, builtin.api.base_url);
        assert_eq!(config.server.port, builtin.server.port);
        assert_eq!(config.polling.live_points_secs, builtin.polling.live_points_secs);
        assert_eq!(config.safety.policy, builtin.safety.policy);
        assert_eq!(config.safety.fallback_total_players, builtin.safety.fallback_total_players);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse("[api\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let text = VALID.replace("live_points_secs = 15", "live_points_secs = 0");
        match parse(&text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "polling.live_points_secs")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn same_ports_rejected() {
        let text = VALID.replace("ws_port = 9001", "ws_port = 8080");
        match parse(&text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "server.ws_port"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn non_http_base_url_rejected() {
        let text = VALID.replace(
            "base_url = \"https://fantasy.premierleague.com/api\"",
            "base_url = \"ftp://example.com\"",
        );
        match parse(&text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "api.base_url"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn bounded_last_tier_rejected() {
        let text = VALID.replace("[[safety.tiers]]\npercent = 100", "[[safety.tiers]]\nbelow_rank = 5000000\npercent = 100");
        match parse(&text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "safety.tiers"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_dedupe_defaults_to_zero() {
        let text = VALID.replace("dedupe_secs = 5\n", "");
        let config = parse(&text).unwrap();
        assert_eq!(config.api.dedupe_secs, 0);
    }

    #[test]
    fn config_file_is_seeded_once() {
        let tmp = std::env::temp_dir().join("fplwatch_config_copy_test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), VALID).unwrap();

        let created = ensure_config_file(&tmp).unwrap();
        assert_eq!(created, Some(tmp.join("config").join(CONFIG_FILE)));

        // Local edits survive a second run.
        fs::write(tmp.join("config").join(CONFIG_FILE), VALID.replace("port = 8080", "port = 8181")).unwrap();
        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.server.port, 8181);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn existing_config_needs_no_defaults() {
        let tmp = std::env::temp_dir().join("fplwatch_config_existing_test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), VALID).unwrap();

        assert_eq!(ensure_config_file(&tmp).unwrap(), None);
        assert!(!tmp.join("defaults").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_directories_is_error() {
        let tmp = std::env::temp_dir().join("fplwatch_config_missing_test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_file(&tmp).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::FileNotFound { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn db_path_resolution() {
        let mut config = Config::default();
        assert_eq!(config.resolve_db_path(), PathBuf::from("fplwatch.db"));
        config.db_path.clear();
        assert!(config.resolve_db_path().ends_with("fplwatch.db"));
    }
}
