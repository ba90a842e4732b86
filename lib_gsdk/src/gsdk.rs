//! # Game Server SDK
//!
//! The entry point a game server links against. Construct one
//! [`GameServerSdk`], register callbacks, then call
//! [`GameServerSdk::ready_for_players`] from the main thread once the server
//! can accept players.
//!
//! ```no_run
//! use lib_gsdk::GameServerSdk;
//!
//! let sdk = GameServerSdk::default();
//! sdk.register_shutdown_callback(|| println!("shutting down"));
//! if sdk.ready_for_players().unwrap_or(false) {
//!     let settings = sdk.get_config_settings().unwrap_or_default();
//!     println!("session: {:?}", settings.get("sessionId"));
//! }
//! ```
//!
//! Setters never start the engine. Accessors that need configuration start
//! it on first use and report an [`InitializationError`] if that fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::configs::keys::{LOG_FOLDER_KEY, SHARED_CONTENT_FOLDER_KEY};
use crate::configs::{ConfigMap, ConfigSource};
use crate::core::{GsdkOptions, HeartbeatEngine, TransportFactory};
use crate::errors::InitializationError;
use crate::model::{ConnectedPlayer, GameServerConnectionInfo, GameState, MaintenanceSchedule};

/// Target used by [`GameServerSdk::log_message`].
pub const HOST_LOG_TARGET: &str = "gsdk";

pub struct GameServerSdk {
    engine: HeartbeatEngine,
}

impl GameServerSdk {
    /// Builds an SDK over any configuration source and transport.
    pub fn new(
        options: GsdkOptions,
        config_source: impl ConfigSource + 'static,
        transport_factory: impl TransportFactory + 'static,
    ) -> Self {
        Self {
            engine: HeartbeatEngine::new(
                options,
                Box::new(config_source),
                Box::new(transport_factory),
            ),
        }
    }

    /// Production wiring: agent-provided configuration, HTTP transport.
    #[cfg(feature = "retrieve")]
    pub fn with_options(options: GsdkOptions) -> Self {
        let factory = crate::retrieve::HttpTransportFactory::from(&options);
        Self::new(options, crate::configs::DefaultConfiguration::new(), factory)
    }

    /// Starts the engine. Idempotent.
    pub fn start(&self) -> Result<(), InitializationError> {
        self.engine.start()
    }

    /// Signals that the server can take players and blocks until it is
    /// allocated (`true`) or told to terminate (`false`).
    pub fn ready_for_players(&self) -> Result<bool, InitializationError> {
        self.engine.ready_for_players()
    }

    /// A snapshot of all settings, including session keys once allocated.
    pub fn get_config_settings(&self) -> Result<ConfigMap, InitializationError> {
        self.engine.start()?;
        Ok(self.engine.config_settings())
    }

    /// Replaces the players reported on the next heartbeat.
    pub fn update_connected_players(&self, players: Vec<ConnectedPlayer>) {
        self.engine.update_connected_players(players);
    }

    /// Runs once, on its own thread, when the agent asks the server to terminate.
    pub fn register_shutdown_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.engine.register_shutdown_callback(Arc::new(callback));
    }

    /// Polled on every heartbeat; `false` reports the server unhealthy.
    pub fn register_health_callback<F>(&self, callback: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.engine.register_health_callback(Arc::new(callback));
    }

    /// Called once per distinct scheduled maintenance time.
    pub fn register_maintenance_callback<F>(&self, callback: F)
    where
        F: Fn(DateTime<Utc>) + Send + Sync + 'static,
    {
        self.engine.register_maintenance_callback(Arc::new(callback));
    }

    /// Called once per distinct maintenance schedule.
    pub fn register_maintenance_v2_callback<F>(&self, callback: F)
    where
        F: Fn(&MaintenanceSchedule) + Send + Sync + 'static,
    {
        self.engine.register_maintenance_v2_callback(Arc::new(callback));
    }

    /// Players the matchmaker placed in this session. Empty until allocated.
    pub fn get_initial_players(&self) -> Result<Vec<String>, InitializationError> {
        self.engine.start()?;
        Ok(self.engine.initial_players())
    }

    /// Folder for game logs that should be uploaded with the SDK's own.
    pub fn get_logs_directory(&self) -> Result<String, InitializationError> {
        self.setting(LOG_FOLDER_KEY)
    }

    /// Folder shared by every server on the same host.
    pub fn get_shared_content_directory(&self) -> Result<String, InitializationError> {
        self.setting(SHARED_CONTENT_FOLDER_KEY)
    }

    pub fn get_game_server_connection_info(
        &self,
    ) -> Result<GameServerConnectionInfo, InitializationError> {
        self.engine.start()?;
        Ok(self.engine.connection_info())
    }

    /// The last maintenance schedule received, if any.
    pub fn get_maintenance_schedule(&self) -> Option<MaintenanceSchedule> {
        self.engine.maintenance_schedule()
    }

    pub fn lifecycle_state(&self) -> GameState {
        self.engine.state()
    }

    /// Writes a host message to the SDK log.
    pub fn log_message(&self, message: &str) {
        log::info!(target: HOST_LOG_TARGET, "{}", message);
    }

    /// Stops heartbeating and releases any `ready_for_players` waiter.
    /// Also runs on drop.
    pub fn close(&self) {
        self.engine.close();
    }

    fn setting(&self, key: &str) -> Result<String, InitializationError> {
        self.engine.start()?;
        Ok(self
            .engine
            .config_settings()
            .get(key)
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(feature = "retrieve")]
impl Default for GameServerSdk {
    fn default() -> Self {
        Self::with_options(GsdkOptions::default())
    }
}
