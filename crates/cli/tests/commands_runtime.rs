use std::env;
use std::sync::{Mutex, OnceLock};

use packdeal_cli::commands::{doctor, list, migrate, quote, seed};
use serde_json::Value;

const VALID_ENV: &[(&str, &str)] = &[
    ("PACKDEAL_CATALOG_SHOP_DOMAIN", "demo.myshopify.com"),
    ("PACKDEAL_CATALOG_ACCESS_TOKEN", "shpat_test"),
    ("PACKDEAL_DATABASE_URL", "sqlite::memory:"),
];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(VALID_ENV, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_access_token() {
    with_env(&[("PACKDEAL_CATALOG_SHOP_DOMAIN", "demo.myshopify.com")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_each_demo_pack() {
    with_env(VALID_ENV, || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("demo pack set ready (3 created):"));
        assert!(message.contains(
            "  - Summer Essentials: created (Two-item seasonal bundle at a modest discount)"
        ));
        assert!(message.contains("  - Starter Kit: created (Three-item onboarding bundle)"));
        assert!(message
            .contains("  - Clearance Duo: created (Upper-bound discount giving the pair away)"));
    });
}

#[test]
fn seed_is_idempotent_across_runs_against_a_file_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("packdeal.db").display());
    let vars = [
        ("PACKDEAL_CATALOG_SHOP_DOMAIN", "demo.myshopify.com"),
        ("PACKDEAL_CATALOG_ACCESS_TOKEN", "shpat_test"),
        ("PACKDEAL_DATABASE_URL", url.as_str()),
    ];

    with_env(&vars, || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_message = parse_payload(&first.output)["message"].as_str().map(str::to_string);
        assert!(first_message.unwrap_or_default().contains("(3 created)"));

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        let second_message = second_payload["message"].as_str().unwrap_or("");
        assert!(second_message.contains("(0 created)"));
        assert!(second_message.contains("  - Starter Kit: already present"));

        let listed = list::run();
        assert_eq!(listed.exit_code, 0, "expected list success");
        let listed_payload = parse_payload(&listed.output);
        assert_eq!(listed_payload["message"], "3 pack(s) stored");
        let rows = listed_payload["details"].as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().any(|row| row["name"] == "Starter Kit" && row["product_count"] == 3));
    });
}

#[test]
fn quote_prices_a_selection_offline() {
    with_env(&[], || {
        let result = quote::run("10", &["20.00".to_string(), "30.00".to_string()]);
        assert_eq!(result.exit_code, 0, "quote needs no configuration");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["details"]["product_count"], 2);
        assert_eq!(payload["details"]["total"], "45.00");
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");

        let checks = payload["checks"].as_array().cloned().unwrap_or_default();
        let statuses: Vec<(&str, &str)> = checks
            .iter()
            .map(|check| {
                (check["name"].as_str().unwrap_or(""), check["status"].as_str().unwrap_or(""))
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("config_validation", "fail"),
                ("catalog_credentials", "skipped"),
                ("database_connectivity", "skipped"),
            ]
        );
    });
}

#[test]
fn doctor_passes_with_valid_env() {
    with_env(VALID_ENV, || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(3));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PACKDEAL_DATABASE_URL",
        "PACKDEAL_DATABASE_MAX_CONNECTIONS",
        "PACKDEAL_DATABASE_TIMEOUT_SECS",
        "PACKDEAL_CATALOG_SHOP_DOMAIN",
        "PACKDEAL_CATALOG_ACCESS_TOKEN",
        "PACKDEAL_CATALOG_API_VERSION",
        "PACKDEAL_CATALOG_TIMEOUT_SECS",
        "PACKDEAL_SERVER_BIND_ADDRESS",
        "PACKDEAL_SERVER_PORT",
        "PACKDEAL_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PACKDEAL_LOGGING_LEVEL",
        "PACKDEAL_LOGGING_FORMAT",
        "PACKDEAL_LOG_LEVEL",
        "PACKDEAL_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
