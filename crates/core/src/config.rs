use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["packdeal.toml", "config/packdeal.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Credentials and endpoint details for the store's admin GraphQL API.
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub shop_domain: String,
    pub access_token: SecretString,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn graphql_endpoint(&self) -> String {
        format!("https://{}/admin/api/{}/graphql.json", self.shop_domain.trim(), self.api_version)
    }
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
    pub catalog_shop_domain: Option<String>,
    pub catalog_access_token: Option<String>,
    pub catalog_api_version: Option<String>,
    pub server_port: Option<u16>,
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
                url: "sqlite://packdeal.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            catalog: CatalogConfig {
                shop_domain: String::new(),
                access_token: String::new().into(),
                api_version: "2025-01".to_string(),
                timeout_secs: 15,
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
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

        if let Some(catalog) = patch.catalog {
            if let Some(shop_domain) = catalog.shop_domain {
                self.catalog.shop_domain = shop_domain;
            }
            if let Some(access_token) = catalog.access_token {
                self.catalog.access_token = secret_value(access_token);
            }
            if let Some(api_version) = catalog.api_version {
                self.catalog.api_version = api_version;
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("PACKDEAL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("PACKDEAL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("PACKDEAL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("PACKDEAL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("PACKDEAL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PACKDEAL_CATALOG_SHOP_DOMAIN") {
            self.catalog.shop_domain = value;
        }
        if let Some(value) = read_env("PACKDEAL_CATALOG_ACCESS_TOKEN") {
            self.catalog.access_token = secret_value(value);
        }
        if let Some(value) = read_env("PACKDEAL_CATALOG_API_VERSION") {
            self.catalog.api_version = value;
        }
        if let Some(value) = read_env("PACKDEAL_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("PACKDEAL_CATALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PACKDEAL_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PACKDEAL_SERVER_PORT") {
            self.server.port = parse_u16("PACKDEAL_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("PACKDEAL_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("PACKDEAL_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("PACKDEAL_LOGGING_LEVEL").or_else(|| read_env("PACKDEAL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PACKDEAL_LOGGING_FORMAT").or_else(|| read_env("PACKDEAL_LOG_FORMAT"));
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
        if let Some(shop_domain) = overrides.catalog_shop_domain {
            self.catalog.shop_domain = shop_domain;
        }
        if let Some(access_token) = overrides.catalog_access_token {
            self.catalog.access_token = secret_value(access_token);
        }
        if let Some(api_version) = overrides.catalog_api_version {
            self.catalog.api_version = api_version;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_catalog(&self.catalog)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path if given, otherwise the
/// well-known candidates relative to the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
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

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    let shop_domain = catalog.shop_domain.trim();
    if shop_domain.is_empty() {
        return Err(ConfigError::Validation(
            "catalog.shop_domain is required (e.g. `my-store.myshopify.com`)".to_string(),
        ));
    }
    if shop_domain.contains("://") || shop_domain.contains('/') {
        return Err(ConfigError::Validation(
            "catalog.shop_domain must be a bare host without scheme or path".to_string(),
        ));
    }

    if catalog.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.access_token is required. Create an Admin API access token for the app with the `read_products` scope".to_string(),
        ));
    }

    if !is_api_version(&catalog.api_version) {
        return Err(ConfigError::Validation(format!(
            "catalog.api_version must look like `YYYY-MM` or be `unstable`, got `{}`",
            catalog.api_version
        )));
    }

    if catalog.timeout_secs == 0 || catalog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn is_api_version(value: &str) -> bool {
    if value == "unstable" {
        return true;
    }

    let Some((year, month)) = value.split_once('-') else {
        return false;
    };
    year.len() == 4
        && year.chars().all(|ch| ch.is_ascii_digit())
        && month.len() == 2
        && matches!(month.parse::<u8>(), Ok(1..=12))
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    catalog: Option<CatalogPatch>,
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
struct CatalogPatch {
    shop_domain: Option<String>,
    access_token: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
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
