//! Well-known `ConfigMap` keys and environment variable names.

// Only available after allocation (once `ready_for_players` returns true).
pub const SESSION_COOKIE_KEY: &str = "sessionCookie";
pub const SESSION_ID_KEY: &str = "sessionId";

pub const HEARTBEAT_ENDPOINT_KEY: &str = "gsmsBaseUrl";
pub const SERVER_ID_KEY: &str = "instanceId";
/// Legacy alias of [`HEARTBEAT_ENDPOINT_KEY`].
pub const LEGACY_HEARTBEAT_ENDPOINT_KEY: &str = "heartbeatEndpoint";
/// Legacy alias of [`SERVER_ID_KEY`].
pub const LEGACY_SERVER_ID_KEY: &str = "serverId";

pub const LOG_FOLDER_KEY: &str = "logFolder";
pub const SHARED_CONTENT_FOLDER_KEY: &str = "sharedContentFolder";
pub const CERTIFICATE_FOLDER_KEY: &str = "certificateFolder";
pub const TITLE_ID_KEY: &str = "titleId";
pub const BUILD_ID_KEY: &str = "buildId";
pub const REGION_KEY: &str = "region";
pub const VM_ID_KEY: &str = "vmId";
pub const PUBLIC_IP_V4_ADDRESS_KEY: &str = "publicIpV4Address";
pub const FULLY_QUALIFIED_DOMAIN_NAME_KEY: &str = "fullyQualifiedDomainName";

/// Names the JSON configuration file written by the agent.
pub const GSDK_CONFIG_FILE_ENV_VAR: &str = "GSDK_CONFIG_FILE";

pub const HEARTBEAT_ENDPOINT_ENV_VAR: &str = "HEARTBEAT_ENDPOINT";
pub const SERVER_ID_ENV_VAR: &str = "SESSION_HOST_ID";
pub const LOG_FOLDER_ENV_VAR: &str = "GSDK_LOG_FOLDER";
pub const SHARED_CONTENT_FOLDER_ENV_VAR: &str = "SHARED_CONTENT_FOLDER";

// Always set as environment variables, even alongside the JSON file.
pub const TITLE_ID_ENV_VAR: &str = "PF_TITLE_ID";
pub const BUILD_ID_ENV_VAR: &str = "PF_BUILD_ID";
pub const REGION_ENV_VAR: &str = "PF_REGION";
