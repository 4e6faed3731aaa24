use std::env;
use std::fs;
use std::path::Path;

use packdeal_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let access_token = redact_token(config.catalog.access_token.expose_secret());
    let fields: [(&str, String, &str); 13] = [
        ("database.url", config.database.url.clone(), "PACKDEAL_DATABASE_URL"),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            "PACKDEAL_DATABASE_MAX_CONNECTIONS",
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "PACKDEAL_DATABASE_TIMEOUT_SECS",
        ),
        ("catalog.shop_domain", config.catalog.shop_domain.clone(), "PACKDEAL_CATALOG_SHOP_DOMAIN"),
        ("catalog.access_token", access_token, "PACKDEAL_CATALOG_ACCESS_TOKEN"),
        ("catalog.api_version", config.catalog.api_version.clone(), "PACKDEAL_CATALOG_API_VERSION"),
        (
            "catalog.timeout_secs",
            config.catalog.timeout_secs.to_string(),
            "PACKDEAL_CATALOG_TIMEOUT_SECS",
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            "PACKDEAL_SERVER_BIND_ADDRESS",
        ),
        ("server.port", config.server.port.to_string(), "PACKDEAL_SERVER_PORT"),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "PACKDEAL_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        ("logging.level", config.logging.level.clone(), "PACKDEAL_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "PACKDEAL_LOGGING_FORMAT"),
        ("catalog.endpoint", config.catalog.graphql_endpoint(), ""),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in &fields {
        let source = if env_key.is_empty() {
            "derived".to_string()
        } else {
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(key, value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the token type prefix (`shpat_`, `shpca_`) and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_') {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_keep_only_their_type_prefix() {
        assert_eq!(redact_token("shpat_0123456789abcdef"), "shpat_***");
        assert_eq!(redact_token("opaque"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_config_documents() {
        let doc: toml::Value =
            "[catalog]\nshop_domain = \"demo.myshopify.com\"\n".parse().expect("toml");
        assert!(contains_path(&doc, "catalog.shop_domain"));
        assert!(!contains_path(&doc, "catalog.access_token"));
    }
}
