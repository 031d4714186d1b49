// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::time::Duration;

use bc_client_api::ClientApiError;
use bc_client_mock::{history_record, CommandRecordExt, MockConsoleApi};
use bc_core::{
    BackendStatus, ConsoleSession, CoreError, DisplayForm, HealthMonitor, PollEvent, PollerConfig,
    RetryPolicy, SessionSettings, VisibilityFilter,
};
use bc_domain_types::{CommandType, StatusCode};
use bc_rest_api_contract::HealthResponse;
use chrono::{Duration as ChronoDuration, Utc};

fn settings() -> SessionSettings {
    SessionSettings {
        poller: PollerConfig {
            interval: Duration::from_secs(3),
            retry: RetryPolicy::every_tick(),
        },
        ..SessionSettings::default()
    }
}

fn scripted_mock() -> MockConsoleApi {
    let now = Utc::now();
    let mock = MockConsoleApi::new();
    mock.set_history(
        "agent-1",
        vec![
            history_record("h-1", "whoami", "shell", "cs_cmpltd", now - ChronoDuration::minutes(10))
                .with_output(r#"["root"]"#, "list"),
            history_record("h-2", "return_results", "intern", "cs_pndg", now),
            history_record("h-3", "uptime", "shell", "cs_rng", now - ChronoDuration::minutes(1)),
        ],
    );
    mock.set_history(
        "agent-2",
        vec![history_record("h-3", "uptime", "shell", "cs_rng", now)],
    );
    mock
}

#[tokio::test]
async fn submit_without_agent_is_rejected() {
    let session = ConsoleSession::new(MockConsoleApi::new(), settings());
    let err = session.submit("whoami", CommandType::Shell).await.unwrap_err();
    assert_eq!(err, CoreError::NoActiveAgent);
    assert_eq!(session.refresh().await.unwrap_err(), CoreError::NoActiveAgent);
}

#[tokio::test]
async fn selecting_agent_seeds_visible_timeline() {
    let session = ConsoleSession::new(scripted_mock(), settings());

    assert_eq!(session.select_agent("agent-1").await.unwrap(), 3);
    assert_eq!(session.active_agent().await.as_deref(), Some("agent-1"));

    let timeline = session.timeline().await;
    let ids: Vec<_> = timeline.iter().map(|row| row.entry.id()).collect();
    assert_eq!(ids, ["h-3", "h-1"]);
    assert_eq!(timeline[1].rendered, Some(DisplayForm::List(vec!["root".to_string()])));
    assert_eq!(timeline[0].rendered, None);

    // The reserved command is still tracked
    let ledger = session.ledger();
    let ledger = ledger.read().await;
    assert!(ledger.get("h-2").is_some());
    assert_eq!(ledger.non_terminal().count(), 2);
}

#[tokio::test]
async fn extra_reserved_names_are_hidden() {
    let settings = SessionSettings {
        visibility: VisibilityFilter::with_reserved(["uptime"]),
        ..settings()
    };
    let session = ConsoleSession::new(scripted_mock(), settings);
    session.select_agent("agent-1").await.unwrap();

    let timeline = session.timeline().await;
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].entry.command(), "whoami");
}

#[tokio::test]
async fn history_failure_still_starts_session() {
    let mock = MockConsoleApi::new();
    mock.fail_history("agent-1", ClientApiError::Network("refused".to_string()));
    let session = ConsoleSession::new(mock.clone(), settings());

    let err = session.select_agent("agent-1").await.unwrap_err();
    assert!(matches!(err, CoreError::Transport(ClientApiError::Network(_))));
    assert_eq!(session.active_agent().await.as_deref(), Some("agent-1"));
    assert!(session.timeline().await.is_empty());

    let entry = session.submit("whoami", CommandType::Shell).await.unwrap();
    assert_eq!(session.timeline().await[0].entry.id(), entry.id());
}

#[tokio::test]
async fn refresh_merges_and_notifies_subscribers() {
    let mock = scripted_mock();
    mock.respond("h-3", "cs_cmpltd", Some(r#"{"load":"0.42"}"#), Some("key_value"));
    mock.respond("h-2", "cs_cmpltd", None, None);
    let session = ConsoleSession::new(mock.clone(), settings());
    let mut events = session.subscribe();
    session.select_agent("agent-1").await.unwrap();

    let stats = session.refresh().await.unwrap();
    assert_eq!(stats.issued, 2);

    let mut updated = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PollEvent::Updated { id, status } = event {
            assert_eq!(status, StatusCode::COMPLETED);
            updated.push(id);
        }
    }
    updated.sort();
    assert_eq!(updated, ["h-2", "h-3"]);

    let timeline = session.timeline().await;
    assert_eq!(
        timeline[0].rendered,
        Some(DisplayForm::KeyValue(vec![("load".to_string(), "0.42".to_string())]))
    );
}

#[tokio::test(start_paused = true)]
async fn switching_agents_discards_in_flight_results() {
    let mock = scripted_mock();
    mock.respond("h-3", "cs_cmpltd", Some("late"), None);
    let gate = mock.hold_results("h-3");
    let session = ConsoleSession::new(mock.clone(), settings());

    session.select_agent("agent-1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(mock.result_calls("h-3"), 1);

    session.select_agent("agent-2").await.unwrap();
    gate.release();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let ledger = session.ledger();
    let ledger = ledger.read().await;
    assert_eq!(ledger.agent_id(), "agent-2");
    assert_eq!(ledger.get("h-3").unwrap().status(), &StatusCode::parse("cs_rng"));
}

#[tokio::test]
async fn deselect_clears_ledger_and_stops_polling() {
    let mock = scripted_mock();
    let session = ConsoleSession::new(mock.clone(), settings());
    session.select_agent("agent-1").await.unwrap();

    session.deselect().await;
    assert_eq!(session.active_agent().await, None);
    assert!(session.timeline().await.is_empty());
    assert!(session.ledger().read().await.is_detached());
}

#[tokio::test(start_paused = true)]
async fn health_monitor_tracks_backend_status() {
    let mock = MockConsoleApi::new();
    mock.set_health(Err(ClientApiError::Network("connection refused".to_string())));
    let mut monitor = HealthMonitor::new(mock.clone(), Duration::from_secs(30));
    let mut status = monitor.subscribe();
    assert_eq!(monitor.current(), BackendStatus::Checking);

    monitor.start();
    status.changed().await.unwrap();
    assert!(matches!(&*status.borrow(), BackendStatus::Error(_)));

    mock.set_health(Ok(HealthResponse {
        status: "ok".to_string(),
        message: Some("Server is healthy".to_string()),
    }));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(monitor.current(), BackendStatus::Ok(Some("Server is healthy".to_string())));
    assert_eq!(mock.health_calls(), 2);

    monitor.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(mock.health_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn health_monitor_with_zero_interval_keeps_probing() {
    let mock = MockConsoleApi::new();
    let mut monitor = HealthMonitor::new(mock.clone(), Duration::ZERO);
    monitor.start();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(mock.health_calls() >= 2);
    assert_eq!(monitor.current(), BackendStatus::Ok(Some("mock server".to_string())));
    monitor.stop();
}
