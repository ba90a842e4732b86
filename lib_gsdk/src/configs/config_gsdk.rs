//! # Static GSDK Configuration
//!
//! Resolves the one-time configuration the agent provides to a game server:
//! heartbeat endpoint, instance id, folders, certificates, ports and build
//! metadata. The agent writes a JSON file and names it in `GSDK_CONFIG_FILE`;
//! older agents only set environment variables. Title, build and region ids
//! always come from the environment.
//!
//! Every loader implements [`ConfigSource`]. Loading never validates; the
//! engine calls [`GsdkConfiguration::validate`] so that all sources fail the
//! same way when the endpoint or instance id is missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fmt, fs};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::configs::config_map::ConfigMap;
use crate::configs::keys::*;
use crate::errors::InitializationError;
use crate::model::{null_as_default, GameServerConnectionInfo};

/// Environment lookup used by the loaders. Returns `None` for unset variables.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads the real process environment.
pub fn process_env() -> EnvLookup {
    Arc::new(|name: &str| env::var(name).ok())
}

fn non_empty(env: &EnvLookup, name: &str) -> String {
    env(name).filter(|v| !v.is_empty()).unwrap_or_default()
}

/// The static configuration of this game server instance.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GsdkConfiguration {
    /// Host (and optional port) of the agent, e.g. `127.0.0.1:56001`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub heartbeat_endpoint: String,
    #[serde(default, alias = "serverId", deserialize_with = "null_as_default")]
    pub session_host_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vm_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_folder: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shared_content_folder: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certificate_folder: String,
    /// Certificate name -> thumbprint.
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_certificates: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub build_metadata: HashMap<String, String>,
    /// Port name -> port number, kept as text.
    #[serde(default, deserialize_with = "deserialize_ports")]
    pub game_ports: HashMap<String, String>,
    #[serde(default, alias = "IpV4Address", deserialize_with = "null_as_default")]
    pub public_ip_v4_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fully_qualified_domain_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_server_connection_info: GameServerConnectionInfo,

    /// From `PF_TITLE_ID`.
    #[serde(skip)]
    pub title_id: String,
    /// From `PF_BUILD_ID`.
    #[serde(skip)]
    pub build_id: String,
    /// From `PF_REGION`.
    #[serde(skip)]
    pub region: String,
}

/// Ports are numbers in newer agent files and strings in older ones.
fn deserialize_ports<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name, s)),
            Value::Number(n) => Some((name, n.to_string())),
            _ => None,
        })
        .collect())
}

impl GsdkConfiguration {
    /// Checks the values the engine cannot run without.
    pub fn validate(&self) -> Result<(), InitializationError> {
        if self.heartbeat_endpoint.trim().is_empty() {
            return Err(InitializationError::MissingField("heartbeatEndpoint"));
        }
        if self.session_host_id.trim().is_empty() {
            return Err(InitializationError::MissingField("sessionHostId"));
        }
        Ok(())
    }

    /// Fills title, build and region ids from the environment.
    pub fn with_environment_ids(mut self, env: &EnvLookup) -> Self {
        self.title_id = non_empty(env, TITLE_ID_ENV_VAR);
        self.build_id = non_empty(env, BUILD_ID_ENV_VAR);
        self.region = non_empty(env, REGION_ENV_VAR);
        self
    }

    /// Builds the initial settings map.
    ///
    /// Certificates, metadata and ports go in first so the well-known keys
    /// below always win a name clash.
    pub fn to_config_map(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        map.extend(self.game_certificates.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        map.extend(self.build_metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        map.extend(self.game_ports.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        map.insert(HEARTBEAT_ENDPOINT_KEY, self.heartbeat_endpoint.as_str());
        map.insert(SERVER_ID_KEY, self.session_host_id.as_str());
        map.insert(LEGACY_HEARTBEAT_ENDPOINT_KEY, self.heartbeat_endpoint.as_str());
        map.insert(LEGACY_SERVER_ID_KEY, self.session_host_id.as_str());
        map.insert(VM_ID_KEY, self.vm_id.as_str());
        map.insert(LOG_FOLDER_KEY, self.log_folder.as_str());
        map.insert(SHARED_CONTENT_FOLDER_KEY, self.shared_content_folder.as_str());
        map.insert(CERTIFICATE_FOLDER_KEY, self.certificate_folder.as_str());
        map.insert(TITLE_ID_KEY, self.title_id.as_str());
        map.insert(BUILD_ID_KEY, self.build_id.as_str());
        map.insert(REGION_KEY, self.region.as_str());
        map.insert(PUBLIC_IP_V4_ADDRESS_KEY, self.public_ip_v4_address.as_str());
        map.insert(
            FULLY_QUALIFIED_DOMAIN_NAME_KEY,
            self.fully_qualified_domain_name.as_str(),
        );
        map
    }
}

impl fmt::Display for GsdkConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GsdkConfiguration
    Heartbeat endpoint: {},
    Session host id: {},
    Log folder: {},
    Shared content folder: {},
    Certificates: {},
    Ports: {:?}
",
            self.heartbeat_endpoint,
            self.session_host_id,
            self.log_folder,
            self.shared_content_folder,
            self.game_certificates.len(),
            self.game_ports
        )
    }
}

/// Anything that can produce the static configuration.
pub trait ConfigSource: Send + Sync {
    /// Loads the configuration. Called once, on the first `start`.
    fn load(&self) -> Result<GsdkConfiguration, InitializationError>;
}

/// A configuration supplied directly by the host process.
#[derive(Debug, Clone)]
pub struct StaticConfiguration(pub GsdkConfiguration);

impl ConfigSource for StaticConfiguration {
    fn load(&self) -> Result<GsdkConfiguration, InitializationError> {
        Ok(self.0.clone())
    }
}

/// The JSON file written by the agent.
pub struct JsonFileConfiguration {
    path: PathBuf,
    env: EnvLookup,
}

impl JsonFileConfiguration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_env(path, process_env())
    }

    pub fn with_env(path: impl Into<PathBuf>, env: EnvLookup) -> Self {
        Self {
            path: path.into(),
            env,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for JsonFileConfiguration {
    fn load(&self) -> Result<GsdkConfiguration, InitializationError> {
        if !self.path.is_file() {
            return Err(InitializationError::ConfigFileNotFound(self.path.clone()));
        }

        let content =
            fs::read_to_string(&self.path).map_err(|source| InitializationError::ConfigFileRead {
                path: self.path.clone(),
                source,
            })?;

        let config: GsdkConfiguration = serde_json::from_str(&content).map_err(|source| {
            InitializationError::ConfigFileParse {
                path: self.path.clone(),
                source,
            }
        })?;

        Ok(config.with_environment_ids(&self.env))
    }
}

/// Legacy configuration carried entirely in environment variables.
///
/// Certificates, ports and metadata were only added with the JSON file, so
/// they are always empty here.
pub struct EnvironmentConfiguration {
    env: EnvLookup,
}

impl EnvironmentConfiguration {
    pub fn new() -> Self {
        Self::with_env(process_env())
    }

    pub fn with_env(env: EnvLookup) -> Self {
        Self { env }
    }
}

impl Default for EnvironmentConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvironmentConfiguration {
    fn load(&self) -> Result<GsdkConfiguration, InitializationError> {
        let config = GsdkConfiguration {
            heartbeat_endpoint: non_empty(&self.env, HEARTBEAT_ENDPOINT_ENV_VAR),
            session_host_id: non_empty(&self.env, SERVER_ID_ENV_VAR),
            log_folder: non_empty(&self.env, LOG_FOLDER_ENV_VAR),
            shared_content_folder: non_empty(&self.env, SHARED_CONTENT_FOLDER_ENV_VAR),
            ..Default::default()
        };
        Ok(config.with_environment_ids(&self.env))
    }
}

/// The production lookup: the `GSDK_CONFIG_FILE` file if it exists,
/// otherwise environment variables.
pub struct DefaultConfiguration {
    env: EnvLookup,
}

impl DefaultConfiguration {
    pub fn new() -> Self {
        Self::with_env(process_env())
    }

    pub fn with_env(env: EnvLookup) -> Self {
        Self { env }
    }
}

impl Default for DefaultConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for DefaultConfiguration {
    fn load(&self) -> Result<GsdkConfiguration, InitializationError> {
        match (self.env)(GSDK_CONFIG_FILE_ENV_VAR).filter(|f| !f.trim().is_empty()) {
            Some(file_name) if Path::new(&file_name).is_file() => {
                log::debug!("Loading GSDK configuration from {}", file_name);
                JsonFileConfiguration::with_env(file_name, Arc::clone(&self.env)).load()
            }
            _ => {
                log::debug!("No GSDK configuration file; reading environment variables");
                EnvironmentConfiguration::with_env(Arc::clone(&self.env)).load()
            }
        }
    }
}
