//! # Lifecycle Integration Tests
//!
//! Drives `GameServerSdk` end to end against a scripted agent: start-up,
//! allocation, termination and the heartbeat loop's resilience.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lib_gsdk::configs::keys::*;
use lib_gsdk::{
    ConfigSource, ConnectedPlayer, GameHealth, GameServerSdk, GameState, GsdkConfiguration,
    InitializationError, TransportError,
};
use project_tests::{
    PATIENCE, Script, ScriptedFactory, fast_options, scripted_sdk, valid_config, wait_until,
};

/// A configuration source that takes a while, like a slow disk.
struct SlowConfiguration(Duration);

impl ConfigSource for SlowConfiguration {
    fn load(&self) -> Result<GsdkConfiguration, InitializationError> {
        thread::sleep(self.0);
        Ok(valid_config())
    }
}

#[test]
fn start_loads_every_static_field() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, factory) = scripted_sdk(valid_config(), &script);

    sdk.start()?;
    assert_eq!(sdk.lifecycle_state(), GameState::Initializing);

    let settings = sdk.get_config_settings()?;
    assert_eq!(settings.get("GSMSBASEURL"), Some("127.0.0.1:56001"));
    assert_eq!(settings.get(HEARTBEAT_ENDPOINT_KEY), Some("127.0.0.1:56001"));
    assert_eq!(settings.get(LEGACY_HEARTBEAT_ENDPOINT_KEY), Some("127.0.0.1:56001"));
    assert_eq!(settings.get("instanceid"), Some("host-42"));
    assert_eq!(settings.get(LEGACY_SERVER_ID_KEY), Some("host-42"));
    assert_eq!(settings.get(VM_ID_KEY), Some("vm-1"));
    assert_eq!(settings.get("LOGFOLDER"), Some("/data/GameLogs"));
    assert_eq!(settings.get(SHARED_CONTENT_FOLDER_KEY), Some("/data/SharedContent"));
    assert_eq!(settings.get(CERTIFICATE_FOLDER_KEY), Some("/data/Certificates"));
    assert_eq!(settings.get("servercert"), Some("ABCDEF"));
    assert_eq!(settings.get("mode"), Some("ranked"));
    assert_eq!(settings.get("GamePort"), Some("7777"));
    assert_eq!(settings.get(TITLE_ID_KEY), Some("title-1"));
    assert_eq!(settings.get(BUILD_ID_KEY), Some("build-1"));
    assert_eq!(settings.get(REGION_KEY), Some("WestEurope"));
    assert!(!settings.contains_key(SESSION_ID_KEY));

    let endpoints = factory.opened_endpoints();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].heartbeat_url, "http://127.0.0.1:56001/v1/sessionHosts/host-42");

    sdk.close();
    Ok(())
}

#[test]
fn missing_required_fields_fail_without_opening_a_transport() {
    let script = Script::new();
    let config = GsdkConfiguration {
        heartbeat_endpoint: String::new(),
        ..valid_config()
    };
    let (sdk, factory) = scripted_sdk(config, &script);

    assert!(matches!(
        sdk.start(),
        Err(InitializationError::MissingField("heartbeatEndpoint"))
    ));
    assert!(matches!(sdk.ready_for_players(), Err(InitializationError::MissingField(_))));
    assert!(sdk.get_config_settings().is_err());
    assert_eq!(sdk.lifecycle_state(), GameState::Uninitialized);
    assert_eq!(factory.open_count(), 0);
    assert_eq!(script.heartbeat_count(), 0);

    let config = GsdkConfiguration {
        session_host_id: String::new(),
        ..valid_config()
    };
    let (sdk, factory) = scripted_sdk(config, &script);
    assert!(matches!(
        sdk.start(),
        Err(InitializationError::MissingField("sessionHostId"))
    ));
    assert_eq!(factory.open_count(), 0);
}

#[test]
fn repeated_start_opens_one_transport() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, factory) = scripted_sdk(valid_config(), &script);

    sdk.start()?;
    sdk.start()?;
    sdk.get_config_settings()?;
    assert_eq!(factory.open_count(), 1);

    assert!(wait_until(PATIENCE, || script.heartbeat_count() >= 2));
    assert_eq!(script.info_posts().len(), 1);
    assert_eq!(script.info_posts()[0].flavor, "Rust");
    Ok(())
}

#[test]
fn ready_for_players_returns_true_once_active() -> anyhow::Result<()> {
    let script = Script::new();
    script
        .respond(r#"{"operation":"Continue"}"#)
        .respond(
            r#"{"operation":"Active","sessionConfig":{
                "sessionId":"9a1f","sessionCookie":"cookie!",
                "initialPlayers":["alice","bob"],
                "metadata":{"mapName":"harbor"}}}"#,
        );
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    assert!(sdk.ready_for_players()?);
    assert_eq!(sdk.lifecycle_state(), GameState::Active);

    let settings = sdk.get_config_settings()?;
    assert_eq!(settings.get("SessionId"), Some("9a1f"));
    assert_eq!(settings.get(SESSION_COOKIE_KEY), Some("cookie!"));
    assert_eq!(settings.get("mapname"), Some("harbor"));
    assert_eq!(settings.get(LOG_FOLDER_KEY), Some("/data/GameLogs"));
    assert_eq!(sdk.get_initial_players()?, vec!["alice", "bob"]);

    // A second call returns immediately.
    assert!(sdk.ready_for_players()?);
    Ok(())
}

#[test]
fn standing_by_is_reported_to_the_agent() -> anyhow::Result<()> {
    let script = Script::new();
    for _ in 0..5 {
        script.respond("{}");
    }
    script.respond(r#"{"operation":"Active"}"#);
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    assert!(sdk.ready_for_players()?);
    let states: Vec<GameState> = script
        .requests()
        .iter()
        .map(|r| r.current_game_state)
        .collect();
    assert!(states.contains(&GameState::StandingBy));
    Ok(())
}

#[test]
fn terminate_releases_ready_and_runs_shutdown_once() -> anyhow::Result<()> {
    let script = Script::new();
    script
        .respond(r#"{"operation":"Terminate"}"#)
        .respond(r#"{"operation":"Terminate"}"#)
        .respond(r#"{"operation":"Active"}"#);
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    let shutdowns = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&shutdowns);
    sdk.register_shutdown_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!sdk.ready_for_players()?);
    assert!(wait_until(PATIENCE, || script.heartbeat_count() >= 4));

    assert_eq!(sdk.lifecycle_state(), GameState::Terminating);
    assert!(wait_until(PATIENCE, || shutdowns.load(Ordering::SeqCst) == 1));
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

    // Already terminating: no blocking.
    assert!(!sdk.ready_for_players()?);
    Ok(())
}

#[test]
fn shutdown_callback_may_close_the_sdk() -> anyhow::Result<()> {
    let script = Script::new();
    script.respond(r#"{"operation":"Terminate"}"#);
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);
    let sdk = Arc::new(sdk);

    let closed = Arc::new(AtomicUsize::new(0));
    let weak = Arc::downgrade(&sdk);
    let counter = Arc::clone(&closed);
    sdk.register_shutdown_callback(move || {
        if let Some(sdk) = weak.upgrade() {
            sdk.close();
        }
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!sdk.ready_for_players()?);
    assert!(wait_until(PATIENCE, || closed.load(Ordering::SeqCst) == 1));
    assert_eq!(sdk.lifecycle_state(), GameState::Terminated);
    Ok(())
}

#[test]
fn failed_heartbeats_keep_state_and_loop_running() -> anyhow::Result<()> {
    let script = Script::new();
    script
        .fail(TransportError::Network("connection refused".into()))
        .fail(TransportError::Status {
            status: 500,
            body: None,
        });
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    sdk.start()?;
    assert!(wait_until(PATIENCE, || script.heartbeat_count() >= 4));
    assert_eq!(sdk.lifecycle_state(), GameState::Initializing);
    Ok(())
}

#[test]
fn close_releases_a_blocked_caller() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);
    let sdk = Arc::new(sdk);

    let waiter = {
        let sdk = Arc::clone(&sdk);
        thread::spawn(move || sdk.ready_for_players())
    };

    assert!(wait_until(PATIENCE, || sdk.lifecycle_state() == GameState::StandingBy));
    sdk.close();

    let released = waiter.join().map_err(|_| anyhow::anyhow!("waiter panicked"))?;
    assert!(!released?);
    assert_eq!(sdk.lifecycle_state(), GameState::Terminated);

    // Closing twice is harmless.
    sdk.close();
    Ok(())
}

#[test]
fn close_during_start_is_not_undone() -> anyhow::Result<()> {
    let script = Script::new();
    let factory = ScriptedFactory::new(Arc::clone(&script));
    let sdk = Arc::new(GameServerSdk::new(
        fast_options(),
        SlowConfiguration(Duration::from_millis(300)),
        factory,
    ));

    let starter = {
        let sdk = Arc::clone(&sdk);
        thread::spawn(move || sdk.start())
    };
    thread::sleep(Duration::from_millis(50));
    sdk.close();

    starter.join().map_err(|_| anyhow::anyhow!("start panicked"))??;
    assert_eq!(sdk.lifecycle_state(), GameState::Terminated);

    thread::sleep(Duration::from_millis(200));
    assert_eq!(script.heartbeat_count(), 0);
    assert!(script.info_posts().is_empty());

    // Still closed: later calls neither restart nor block.
    sdk.start()?;
    assert!(!sdk.ready_for_players()?);
    assert_eq!(script.heartbeat_count(), 0);
    Ok(())
}

#[test]
fn panicking_shutdown_callback_keeps_heartbeats_going() -> anyhow::Result<()> {
    let script = Script::new();
    script.respond(r#"{"operation":"Terminate"}"#);
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    sdk.register_shutdown_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        panic!("shutdown exploded");
    });

    assert!(!sdk.ready_for_players()?);
    assert!(wait_until(PATIENCE, || ran.load(Ordering::SeqCst) == 1));

    let after_terminate = script.heartbeat_count();
    assert!(wait_until(PATIENCE, || script.heartbeat_count() >= after_terminate + 3));
    assert_eq!(sdk.lifecycle_state(), GameState::Terminating);
    assert!(script
        .requests()
        .iter()
        .skip(after_terminate)
        .all(|r| r.current_game_state == GameState::Terminating));
    Ok(())
}

#[test]
fn heartbeats_carry_health_and_players() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    let healthy = Arc::new(Mutex::new(true));
    let flag = Arc::clone(&healthy);
    sdk.register_health_callback(move || *flag.lock().unwrap());
    sdk.update_connected_players(vec![ConnectedPlayer::new("p1"), ConnectedPlayer::new("p2")]);

    sdk.start()?;
    assert!(wait_until(PATIENCE, || {
        script.requests().iter().any(|r| {
            r.current_game_health == GameHealth::Healthy
                && r.current_players.iter().map(|p| p.player_id.as_str()).eq(["p1", "p2"])
        })
    }));

    *healthy.lock().unwrap() = false;
    sdk.update_connected_players(Vec::new());
    assert!(wait_until(PATIENCE, || {
        script
            .requests()
            .iter()
            .any(|r| r.current_game_health == GameHealth::Unhealthy && r.current_players.is_empty())
    }));
    Ok(())
}

#[test]
fn panicking_health_callback_reports_unhealthy() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);
    sdk.register_health_callback(|| panic!("health check exploded"));

    sdk.start()?;
    assert!(wait_until(PATIENCE, || script.heartbeat_count() >= 2));
    assert!(script
        .requests()
        .iter()
        .all(|r| r.current_game_health == GameHealth::Unhealthy));
    Ok(())
}

#[test]
fn initial_players_are_empty_before_allocation() -> anyhow::Result<()> {
    let script = Script::new();
    let (sdk, _factory) = scripted_sdk(valid_config(), &script);

    assert!(sdk.get_initial_players()?.is_empty());
    assert_eq!(sdk.get_logs_directory()?, "/data/GameLogs");
    assert_eq!(sdk.get_shared_content_directory()?, "/data/SharedContent");
    sdk.log_message("host says hello");
    Ok(())
}
