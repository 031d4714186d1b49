// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use bc_config::{load_with_env, CliOverrides, ConfigError, ConsoleConfig};
use bc_domain_types::TerminalPolicy;
use bc_rest_client::AuthScheme;

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
}

#[test]
fn defaults_apply_without_file_or_env() {
    let (config, report) = load_with_env(None, None, env(&[])).unwrap();
    assert_eq!(config, ConsoleConfig::default());
    assert_eq!(config.poll_interval_ms, 3000);
    assert_eq!(config.health_interval(), Duration::from_secs(30));
    assert!(report.file.is_none());
    assert!(report.env_keys.is_empty());
}

#[test]
fn file_layer_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
server-url = "https://console.example.net"
auth-scheme = "bearer"
poll-interval-ms = 1000
terminal-policy = "strict"
reserved-commands = ["heartbeat", "sync_state"]
"#,
    );

    let (config, report) = load_with_env(Some(&path), None, env(&[])).unwrap();
    assert_eq!(report.file.as_deref(), Some(path.as_path()));
    assert_eq!(config.server_url, "https://console.example.net");
    assert_eq!(config.auth_scheme, AuthScheme::Bearer);
    assert_eq!(config.terminal_policy, TerminalPolicy::Strict);

    let settings = config.session_settings();
    assert_eq!(settings.poller.interval, Duration::from_secs(1));
    assert!(settings.visibility.is_reserved("heartbeat"));
    assert!(settings.visibility.is_reserved("return_results"));
    assert!(!settings.visibility.is_reserved("whoami"));
}

#[test]
fn default_file_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let (config, report) = load_with_env(None, Some(&missing), env(&[])).unwrap();
    assert_eq!(config, ConsoleConfig::default());
    assert!(report.file.is_none());
}

#[test]
fn explicit_file_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = load_with_env(Some(&missing), None, env(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingFile(path) if path == missing));
}

#[test]
fn env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "server-url = \"https://file.example.net\"\npoll-interval-ms = 1000\n",
    );

    let (config, report) = load_with_env(
        Some(&path),
        None,
        env(&[
            ("BC_SERVER_URL", "https://env.example.net"),
            ("BC_POLL_INTERVAL_MS", "250"),
            ("BC_RETRY_WARN_AFTER", "7"),
            ("BC_RESERVED_COMMANDS", "heartbeat, sync_state"),
        ]),
    )
    .unwrap();

    assert_eq!(config.server_url, "https://env.example.net");
    assert_eq!(config.poll_interval_ms, 250);
    assert_eq!(config.retry_policy().warn_after, 7);
    assert_eq!(config.reserved_commands, ["heartbeat", "sync_state"]);
    assert_eq!(report.env_keys.len(), 4);
}

#[test]
fn cli_overrides_env() {
    let (mut config, _) = load_with_env(
        None,
        None,
        env(&[("BC_SERVER_URL", "https://env.example.net"), ("BC_TOKEN", "eyJ.env")]),
    )
    .unwrap();

    config.apply(&CliOverrides {
        server_url: Some("http://127.0.0.1:9000".to_string()),
        auth_scheme: Some(AuthScheme::Bearer),
        ..CliOverrides::default()
    });

    assert_eq!(config.server_url().unwrap().as_str(), "http://127.0.0.1:9000/");
    let auth = config.auth();
    assert!(auth.is_authenticated());
    assert_eq!(auth.scheme(), AuthScheme::Bearer);
}

#[test]
fn invalid_values_are_rejected() {
    let err = load_with_env(None, None, env(&[("BC_SERVER_URL", "not a url")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "server-url", .. }));

    let err = load_with_env(None, None, env(&[("BC_POLL_INTERVAL_MS", "0")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "poll-interval-ms", .. }));

    let err = load_with_env(None, None, env(&[("BC_POLL_INTERVAL_MS", "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::Deserialize(_)));
}

#[test]
fn malformed_toml_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "server-url = \n");
    let err = load_with_env(Some(&path), None, env(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { path: p, .. } if p == path));
}
