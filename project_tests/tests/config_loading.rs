//! # Configuration Loading Tests
//!
//! Exercises the JSON file and environment loaders through the SDK, with
//! `tempfile` directories standing in for the agent's mounts.

use std::fs;

use lib_gsdk::configs::keys::*;
use lib_gsdk::{
    ConfigSource, DefaultConfiguration, EnvironmentConfiguration, GameServerSdk, InitializationError,
    JsonFileConfiguration,
};
use project_tests::{Script, ScriptedFactory, env_from, fast_options};

const AGENT_FILE: &str = r#"{
    "heartbeatEndpoint": "localhost:56001",
    "sessionHostId": "serverid",
    "vmId": "vm-1",
    "logFolder": "/data/GameLogs",
    "sharedContentFolder": "/data/SharedContent",
    "certificateFolder": null,
    "gameCertificates": {},
    "buildMetadata": { "phase": "beta" },
    "gamePorts": { "gameport": 7777 },
    "publicIpV4Address": "20.30.40.50",
    "fullyQualifiedDomainName": "host.example.net",
    "gameServerConnectionInfo": {
        "publicIpV4Adress": "20.30.40.50",
        "gamePortsConfiguration": [
            { "name": "gameport", "serverListeningPort": 7777, "clientConnectionPort": 31000 }
        ]
    }
}"#;

#[test]
fn sdk_reads_the_agent_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gsdkConfig.json");
    fs::write(&path, AGENT_FILE)?;
    let path_text = path.to_string_lossy().to_string();

    let env = env_from(&[
        (GSDK_CONFIG_FILE_ENV_VAR, path_text.as_str()),
        (TITLE_ID_ENV_VAR, "ABC123"),
        (BUILD_ID_ENV_VAR, "build-7"),
        (REGION_ENV_VAR, "NorthEurope"),
    ]);
    let factory = ScriptedFactory::new(Script::new());
    let sdk = GameServerSdk::new(fast_options(), DefaultConfiguration::with_env(env), factory.clone());

    let settings = sdk.get_config_settings()?;
    assert_eq!(settings.get(SERVER_ID_KEY), Some("serverid"));
    assert_eq!(settings.get("Phase"), Some("beta"));
    assert_eq!(settings.get("gameport"), Some("7777"));
    assert_eq!(settings.get(TITLE_ID_KEY), Some("ABC123"));
    assert_eq!(settings.get(REGION_KEY), Some("NorthEurope"));
    assert_eq!(settings.get(CERTIFICATE_FOLDER_KEY), Some(""));
    assert_eq!(settings.get(PUBLIC_IP_V4_ADDRESS_KEY), Some("20.30.40.50"));

    assert_eq!(sdk.get_logs_directory()?, "/data/GameLogs");
    assert_eq!(sdk.get_shared_content_directory()?, "/data/SharedContent");

    let info = sdk.get_game_server_connection_info()?;
    assert_eq!(info.public_ip_v4_address, "20.30.40.50");
    assert_eq!(info.game_ports_configuration.len(), 1);
    assert_eq!(info.game_ports_configuration[0].name, "gameport");
    assert_eq!(info.game_ports_configuration[0].server_listening_port, 7777);
    assert_eq!(info.game_ports_configuration[0].client_connection_port, 31000);

    assert_eq!(factory.opened_endpoints()[0].info_url, "http://localhost:56001/v1/metrics/serverid/gsdkinfo");
    Ok(())
}

#[test]
fn environment_only_configuration() -> anyhow::Result<()> {
    let env = env_from(&[
        (HEARTBEAT_ENDPOINT_ENV_VAR, "10.0.0.4:56001"),
        (SERVER_ID_ENV_VAR, "legacy-host"),
        (LOG_FOLDER_ENV_VAR, "/logs"),
        (SHARED_CONTENT_FOLDER_ENV_VAR, "/shared"),
    ]);

    let config = EnvironmentConfiguration::with_env(env.clone()).load()?;
    assert!(config.validate().is_ok());
    assert_eq!(config.session_host_id, "legacy-host");
    assert!(config.game_ports.is_empty());

    let sdk = GameServerSdk::new(
        fast_options(),
        DefaultConfiguration::with_env(env),
        ScriptedFactory::new(Script::new()),
    );
    assert_eq!(sdk.get_logs_directory()?, "/logs");
    assert_eq!(sdk.get_shared_content_directory()?, "/shared");
    assert!(sdk.get_game_server_connection_info()?.game_ports_configuration.is_empty());
    Ok(())
}

#[test]
fn empty_environment_is_rejected() {
    let factory = ScriptedFactory::new(Script::new());
    let sdk = GameServerSdk::new(
        fast_options(),
        DefaultConfiguration::with_env(env_from(&[])),
        factory.clone(),
    );

    assert!(matches!(
        sdk.start(),
        Err(InitializationError::MissingField("heartbeatEndpoint"))
    ));
    assert_eq!(factory.open_count(), 0);
}

#[test]
fn named_file_that_is_missing_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("absent.json");

    let err = JsonFileConfiguration::with_env(&path, env_from(&[]))
        .load()
        .unwrap_err();
    assert!(matches!(err, InitializationError::ConfigFileNotFound(p) if p == path));
    Ok(())
}

#[test]
fn blank_required_values_in_the_file_are_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("gsdkConfig.json");
    fs::write(&path, r#"{ "heartbeatEndpoint": "localhost:56001", "sessionHostId": "" }"#)?;

    let factory = ScriptedFactory::new(Script::new());
    let sdk = GameServerSdk::new(
        fast_options(),
        JsonFileConfiguration::with_env(&path, env_from(&[])),
        factory.clone(),
    );
    assert!(matches!(
        sdk.start(),
        Err(InitializationError::MissingField("sessionHostId"))
    ));
    assert_eq!(factory.open_count(), 0);
    Ok(())
}
