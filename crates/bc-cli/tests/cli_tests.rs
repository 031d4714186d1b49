// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use bc_cli::backend::Context;
use bc_cli::commands::{HistoryArgs, SendArgs};
use bc_cli::{agents, Cli, Commands, Parser};
use bc_config::ConsoleConfig;
use bc_domain_types::{CommandType, TerminalPolicy};
use bc_rest_client::AuthScheme;

fn demo_context() -> Context {
    Context {
        config: ConsoleConfig::default(),
        mock: true,
        json: false,
    }
}

#[test]
fn global_flags_become_overrides() {
    let cli = Cli::try_parse_from([
        "becon",
        "--server-url",
        "http://10.0.0.5:8080",
        "--auth-scheme",
        "bearer",
        "--terminal-policy",
        "strict",
        "history",
        "agent-001",
        "--poll-interval-ms",
        "500",
    ])
    .unwrap();

    let overrides = cli.connection.overrides();
    assert_eq!(overrides.server_url.as_deref(), Some("http://10.0.0.5:8080"));
    assert_eq!(overrides.auth_scheme, Some(AuthScheme::Bearer));
    assert_eq!(overrides.terminal_policy, Some(TerminalPolicy::Strict));
    assert_eq!(overrides.poll_interval_ms, Some(500));
    assert!(overrides.token.is_none());
    assert!(matches!(cli.command, Commands::History(HistoryArgs { ref agent, refresh: false }) if agent == "agent-001"));
}

#[test]
fn send_joins_command_words() {
    let cli = Cli::try_parse_from([
        "becon", "send", "agent-001", "--type", "intern", "--wait", "ls", "-la", "/tmp",
    ])
    .unwrap();

    let Commands::Send(args) = cli.command else {
        panic!("expected send");
    };
    assert_eq!(args.command.join(" "), "ls -la /tmp");
    assert_eq!(args.command_type, CommandType::Intern);
    assert!(args.wait);
    assert_eq!(args.timeout_secs, 120);
}

#[test]
fn send_requires_command_text() {
    assert!(Cli::try_parse_from(["becon", "send", "agent-001"]).is_err());
}

#[tokio::test]
async fn agents_lists_demo_backend() {
    agents::run(&demo_context()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn send_and_wait_completes_on_demo_backend() {
    let args = SendArgs {
        agent: "agent-001".to_string(),
        command: vec!["whoami".to_string()],
        command_type: CommandType::Shell,
        wait: true,
        timeout_secs: 60,
    };
    args.run(&demo_context()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_when_command_never_finishes() {
    let ctx = Context {
        config: ConsoleConfig {
            poll_interval_ms: 60_000,
            ..ConsoleConfig::default()
        },
        ..demo_context()
    };
    let args = SendArgs {
        agent: "agent-001".to_string(),
        command: vec!["sleep".to_string(), "600".to_string()],
        command_type: CommandType::Shell,
        wait: true,
        timeout_secs: 5,
    };
    let err = args.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("still Pending after 5s"));
}

#[tokio::test(start_paused = true)]
async fn wait_timeout_reports_latest_status() {
    // Demo commands report running on the first fetch and complete on the second
    let ctx = Context {
        config: ConsoleConfig {
            poll_interval_ms: 3_000,
            ..ConsoleConfig::default()
        },
        ..demo_context()
    };
    let args = SendArgs {
        agent: "agent-001".to_string(),
        command: vec!["sleep".to_string(), "600".to_string()],
        command_type: CommandType::Shell,
        wait: true,
        timeout_secs: 5,
    };
    let err = args.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("still Running after 5s"));
}

#[tokio::test]
async fn history_with_refresh_on_demo_backend() {
    HistoryArgs {
        agent: "agent-001".to_string(),
        refresh: true,
    }
    .run(&demo_context())
    .await
    .unwrap();
}
