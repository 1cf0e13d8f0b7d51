use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub whatsapp: WhatsappConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Twilio channel settings. Signature validation is opt-in: the webhook is
/// accepted unverified when `validate_signature` is false, matching a local
/// development setup without a public URL.
#[derive(Clone, Debug)]
pub struct WhatsappConfig {
    pub auth_token: Option<SecretString>,
    pub public_url: Option<String>,
    pub validate_signature: bool,
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
    pub auth_token: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
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
                url: "sqlite://zafra.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            whatsapp: WhatsappConfig {
                auth_token: None,
                public_url: None,
                validate_signature: false,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("zafra.toml"));
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

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(auth_token_value) = whatsapp.auth_token {
                self.whatsapp.auth_token = Some(secret_value(auth_token_value));
            }
            if let Some(public_url) = whatsapp.public_url {
                self.whatsapp.public_url = Some(public_url);
            }
            if let Some(validate_signature) = whatsapp.validate_signature {
                self.whatsapp.validate_signature = validate_signature;
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
        if let Some(value) = read_env("ZAFRA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ZAFRA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("ZAFRA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ZAFRA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ZAFRA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ZAFRA_WHATSAPP_AUTH_TOKEN") {
            self.whatsapp.auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("ZAFRA_WHATSAPP_PUBLIC_URL") {
            self.whatsapp.public_url = Some(value);
        }
        if let Some(value) = read_env("ZAFRA_WHATSAPP_VALIDATE_SIGNATURE") {
            self.whatsapp.validate_signature =
                parse_bool("ZAFRA_WHATSAPP_VALIDATE_SIGNATURE", &value)?;
        }

        if let Some(value) = read_env("ZAFRA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ZAFRA_SERVER_PORT") {
            self.server.port = parse_u16("ZAFRA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ZAFRA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ZAFRA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("ZAFRA_LOGGING_LEVEL").or_else(|| read_env("ZAFRA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("ZAFRA_LOGGING_FORMAT").or_else(|| read_env("ZAFRA_LOG_FORMAT"));
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
        if let Some(auth_token) = overrides.auth_token {
            self.whatsapp.auth_token = Some(secret_value(auth_token));
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("zafra.toml"), PathBuf::from("config/zafra.toml")]
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

fn validate_whatsapp(whatsapp: &WhatsappConfig) -> Result<(), ConfigError> {
    if whatsapp.validate_signature {
        let missing_token = whatsapp
            .auth_token
            .as_ref()
            .map(|token| token.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_token {
            return Err(ConfigError::Validation(
                "whatsapp.auth_token is required when whatsapp.validate_signature is true. \
                 Get it from the Twilio console under Account > API keys & tokens"
                    .to_string(),
            ));
        }

        let missing_url = whatsapp
            .public_url
            .as_ref()
            .map(|url| url.trim().is_empty())
            .unwrap_or(true);
        if missing_url {
            return Err(ConfigError::Validation(
                "whatsapp.public_url is required when whatsapp.validate_signature is true \
                 (Twilio signs the full public webhook URL)"
                    .to_string(),
            ));
        }
    }

    if let Some(public_url) = &whatsapp.public_url {
        if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "whatsapp.public_url must start with http:// or https://".to_string(),
            ));
        }
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

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    whatsapp: Option<WhatsappPatch>,
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
struct WhatsappPatch {
    auth_token: Option<String>,
    public_url: Option<String>,
    validate_signature: Option<bool>,
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

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("zafra.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        file.write_all(contents.as_bytes()).expect("write config");
        (dir, path)
    }

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::default();
        config.validate().expect("defaults must be valid");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(!config.whatsapp.validate_signature);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let (_dir, path) = write_config(
            r#"
            [database]
            url = "sqlite://custom.db"
            max_connections = 2

            [server]
            port = 8088

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load config");

        assert_eq!(config.database.url, "sqlite://custom.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here/zafra.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect_err("must fail");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn programmatic_overrides_beat_file_values() {
        let (_dir, path) = write_config("[database]\nurl = \"sqlite://from-file.db\"\n");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                auth_token: Some("twilio-token".to_string()),
                ..ConfigOverrides::default()
            },
        })
        .expect("load config");

        assert_eq!(config.database.url, "sqlite::memory:");
        let token = config.whatsapp.auth_token.expect("token set");
        assert_eq!(token.expose_secret(), "twilio-token");
    }

    #[test]
    fn env_interpolation_resolves_placeholders() {
        std::env::set_var("ZAFRA_TEST_INTERP_DB", "sqlite://interp.db");
        let (_dir, path) = write_config("[database]\nurl = \"${ZAFRA_TEST_INTERP_DB}\"\n");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load config");
        std::env::remove_var("ZAFRA_TEST_INTERP_DB");

        assert_eq!(config.database.url, "sqlite://interp.db");
    }

    #[test]
    fn env_interpolation_fails_for_unset_variable() {
        let (_dir, path) = write_config("[database]\nurl = \"${ZAFRA_TEST_UNSET_VAR}\"\n");

        let error = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect_err("must fail");

        assert!(matches!(error, ConfigError::MissingEnvInterpolation { var } if var == "ZAFRA_TEST_UNSET_VAR"));
    }

    #[test]
    fn signature_validation_requires_token_and_public_url() {
        let mut config = AppConfig::default();
        config.whatsapp.validate_signature = true;

        let error = config.validate().expect_err("token missing");
        assert!(error.to_string().contains("whatsapp.auth_token"));

        config.whatsapp.auth_token = Some("twilio-token".to_string().into());
        let error = config.validate().expect_err("public url missing");
        assert!(error.to_string().contains("whatsapp.public_url"));

        config.whatsapp.public_url = Some("https://bot.example.com/whatsapp".to_string());
        config.validate().expect("complete signature config is valid");
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://localhost/zafra".to_string();

        let error = config.validate().expect_err("must fail");
        assert!(matches!(error, ConfigError::Validation(message) if message.contains("database.url")));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();

        assert!(config.validate().is_err());
    }
}
