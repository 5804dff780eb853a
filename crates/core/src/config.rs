use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub campaigns: CampaignConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Sender address, falling back to the login username when no explicit
    /// from-address is configured.
    pub fn sender_address(&self) -> &str {
        self.from_address.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or(&self.username)
    }
}

/// Default windows and thresholds for the campaign operations; callers can
/// still pass explicit values per invocation.
#[derive(Clone, Debug)]
pub struct CampaignConfig {
    pub birthday_days_ahead: i64,
    pub inactive_days_since: i64,
    pub overview_limit: i64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://tavolo.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: String::new(),
                password: String::new().into(),
                from_address: None,
                from_name: None,
            },
            campaigns: CampaignConfig {
                birthday_days_ahead: 7,
                inactive_days_since: 30,
                overview_limit: 200,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, then an optional `tavolo.toml` patch, then
    /// `TAVOLO_*` environment overrides, then programmatic overrides, then
    /// validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tavolo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(smtp) = patch.smtp {
            if let Some(host) = smtp.host {
                self.smtp.host = host;
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(username) = smtp.username {
                self.smtp.username = username;
            }
            if let Some(password) = smtp.password {
                self.smtp.password = password.into();
            }
            if let Some(from_address) = smtp.from_address {
                self.smtp.from_address = Some(from_address);
            }
            if let Some(from_name) = smtp.from_name {
                self.smtp.from_name = Some(from_name);
            }
        }

        if let Some(campaigns) = patch.campaigns {
            if let Some(birthday_days_ahead) = campaigns.birthday_days_ahead {
                self.campaigns.birthday_days_ahead = birthday_days_ahead;
            }
            if let Some(inactive_days_since) = campaigns.inactive_days_since {
                self.campaigns.inactive_days_since = inactive_days_since;
            }
            if let Some(overview_limit) = campaigns.overview_limit {
                self.campaigns.overview_limit = overview_limit;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TAVOLO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TAVOLO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TAVOLO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TAVOLO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TAVOLO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TAVOLO_SMTP_HOST") {
            self.smtp.host = value;
        }
        if let Some(value) = read_env("TAVOLO_SMTP_PORT") {
            self.smtp.port = parse_u16("TAVOLO_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("TAVOLO_SMTP_USERNAME") {
            self.smtp.username = value;
        }
        if let Some(value) = read_env("TAVOLO_SMTP_PASSWORD") {
            self.smtp.password = value.into();
        }
        if let Some(value) = read_env("TAVOLO_SMTP_FROM_ADDRESS") {
            self.smtp.from_address = Some(value);
        }
        if let Some(value) = read_env("TAVOLO_SMTP_FROM_NAME") {
            self.smtp.from_name = Some(value);
        }

        if let Some(value) = read_env("TAVOLO_CAMPAIGNS_BIRTHDAY_DAYS_AHEAD") {
            self.campaigns.birthday_days_ahead =
                parse_i64("TAVOLO_CAMPAIGNS_BIRTHDAY_DAYS_AHEAD", &value)?;
        }
        if let Some(value) = read_env("TAVOLO_CAMPAIGNS_INACTIVE_DAYS_SINCE") {
            self.campaigns.inactive_days_since =
                parse_i64("TAVOLO_CAMPAIGNS_INACTIVE_DAYS_SINCE", &value)?;
        }
        if let Some(value) = read_env("TAVOLO_CAMPAIGNS_OVERVIEW_LIMIT") {
            self.campaigns.overview_limit = parse_i64("TAVOLO_CAMPAIGNS_OVERVIEW_LIMIT", &value)?;
        }

        if let Some(value) = read_env("TAVOLO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TAVOLO_SERVER_PORT") {
            self.server.port = parse_u16("TAVOLO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TAVOLO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TAVOLO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("TAVOLO_LOGGING_LEVEL").or_else(|| read_env("TAVOLO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TAVOLO_LOGGING_FORMAT").or_else(|| read_env("TAVOLO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(smtp_host) = overrides.smtp_host {
            self.smtp.host = smtp_host;
        }
        if let Some(smtp_username) = overrides.smtp_username {
            self.smtp.username = smtp_username;
        }
        if let Some(smtp_password) = overrides.smtp_password {
            self.smtp.password = smtp_password.into();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_smtp(&self.smtp)?;
        validate_campaigns(&self.campaigns)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tavolo.toml"), PathBuf::from("config/tavolo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_smtp(smtp: &SmtpConfig) -> Result<(), ConfigError> {
    if smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be greater than zero".to_string()));
    }

    // The transport itself rejects an unset host at construction time;
    // validation only requires the parts to be consistent.
    if !smtp.host.trim().is_empty() {
        if smtp.username.trim().is_empty() {
            return Err(ConfigError::Validation(
                "smtp.username is required when smtp.host is set".to_string(),
            ));
        }
        if smtp.password.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "smtp.password is required when smtp.host is set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_campaigns(campaigns: &CampaignConfig) -> Result<(), ConfigError> {
    if campaigns.birthday_days_ahead < 0 {
        return Err(ConfigError::Validation(
            "campaigns.birthday_days_ahead must not be negative".to_string(),
        ));
    }

    if campaigns.inactive_days_since < 0 {
        return Err(ConfigError::Validation(
            "campaigns.inactive_days_since must not be negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    smtp: Option<SmtpPatch>,
    campaigns: Option<CampaignsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    from_address: Option<String>,
    from_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CampaignsPatch {
    birthday_days_ahead: Option<i64>,
    inactive_days_since: Option<i64>,
    overview_limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
