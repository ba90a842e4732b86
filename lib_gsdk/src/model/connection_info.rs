use serde::{Deserialize, Serialize};

use super::null_as_default;

/// How clients reach this game server, and which ports it should listen on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameServerConnectionInfo {
    /// Public IPv4 address. Older agents misspell it `publicIpV4Adress`.
    #[serde(
        default,
        alias = "publicIpV4Adress",
        alias = "IpV4Address",
        deserialize_with = "null_as_default"
    )]
    pub public_ip_v4_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_ports_configuration: Vec<GamePort>,
}

/// A named port from the build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePort {
    /// Friendly name given in the build configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Port the server listens on (maps externally to `client_connection_port`).
    #[serde(default)]
    pub server_listening_port: u16,
    /// Public port clients connect to.
    #[serde(default)]
    pub client_connection_port: u16,
}
