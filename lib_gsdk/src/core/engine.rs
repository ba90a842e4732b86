//! # Heartbeat Engine
//!
//! Owns the lifecycle state machine and the background heartbeat thread.
//!
//! The thread wakes once per interval, or early when a state change asks for
//! an out-of-band heartbeat, sends the current state, health and players, and
//! merges the agent's answer back into shared state. Callers on any thread
//! read that state through snapshots and block in
//! [`HeartbeatEngine::ready_for_players`] until allocation or termination.
//!
//! State, the heartbeat-request flag and the running flag sit behind one
//! mutex with one condition variable, so every waiter re-checks its own
//! predicate on each wake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::configs::keys::{SESSION_COOKIE_KEY, SESSION_ID_KEY};
use crate::configs::{ConfigMap, ConfigSource, GsdkConfiguration};
use crate::core::callbacks::{
    Callbacks, HealthCallback, MaintenanceCallback, MaintenanceV2Callback, ShutdownCallback,
};
use crate::core::options::GsdkOptions;
use crate::core::transport::{AgentEndpoints, GsdkInfo, Transport, TransportFactory};
use crate::errors::InitializationError;
use crate::model::{
    parse_utc_timestamp, ConnectedPlayer, GameOperation, GameServerConnectionInfo, GameState,
    HeartbeatRequest, HeartbeatResponse, MaintenanceSchedule, SessionConfig,
};

const HEARTBEAT_THREAD_NAME: &str = "gsdk-heartbeat";
const SHUTDOWN_THREAD_NAME: &str = "gsdk-shutdown";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Lifecycle {
    state: GameState,
    heartbeat_requested: bool,
    running: bool,
    interval: Duration,
}

#[derive(Debug, Default)]
struct SessionTracker {
    session_id: Option<String>,
    initial_players: Vec<String>,
}

/// What has already been handed to the maintenance callbacks.
#[derive(Debug, Default)]
struct MaintenanceTracker {
    delivered_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    delivered_schedule: Option<MaintenanceSchedule>,
}

/// State shared between the façade and the heartbeat thread.
pub(crate) struct Shared {
    options: GsdkOptions,
    lifecycle: Mutex<Lifecycle>,
    signal: Condvar,
    config: RwLock<ConfigMap>,
    connection_info: RwLock<GameServerConnectionInfo>,
    connected_players: Mutex<Vec<ConnectedPlayer>>,
    session: Mutex<SessionTracker>,
    schedule: RwLock<Option<MaintenanceSchedule>>,
    maintenance: Mutex<MaintenanceTracker>,
    callbacks: Callbacks,
    shutdown_fired: AtomicBool,
}

impl Shared {
    pub(crate) fn new(options: GsdkOptions) -> Self {
        let interval = options.heartbeat_interval;
        Self {
            options,
            lifecycle: Mutex::new(Lifecycle {
                state: GameState::Uninitialized,
                heartbeat_requested: false,
                running: false,
                interval,
            }),
            signal: Condvar::new(),
            config: RwLock::new(ConfigMap::new()),
            connection_info: RwLock::new(GameServerConnectionInfo::default()),
            connected_players: Mutex::new(Vec::new()),
            session: Mutex::new(SessionTracker::default()),
            schedule: RwLock::new(None),
            maintenance: Mutex::new(MaintenanceTracker::default()),
            callbacks: Callbacks::new(),
            shutdown_fired: AtomicBool::new(false),
        }
    }

    fn state(&self) -> GameState {
        lock(&self.lifecycle).state
    }

    fn interval(&self) -> Duration {
        lock(&self.lifecycle).interval
    }

    /// Moves to `next` unless that is a no-op or the engine is already
    /// terminating. Returns `true` when the state changed.
    fn set_state(&self, next: GameState) -> bool {
        let mut lifecycle = lock(&self.lifecycle);
        let current = lifecycle.state;
        if current == next {
            return false;
        }
        if matches!(current, GameState::Terminating | GameState::Terminated) {
            log::info!("Ignoring transition {} -> {}: server is shutting down", current, next);
            return false;
        }

        log::info!("Game state changed: {} -> {}", current, next);
        lifecycle.state = next;
        lifecycle.heartbeat_requested = true;
        drop(lifecycle);
        self.signal.notify_all();

        if next == GameState::Terminating {
            self.fire_shutdown();
        }
        true
    }

    /// Runs the shutdown handler at most once, off the heartbeat thread.
    fn fire_shutdown(&self) {
        if self.shutdown_fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(handler) = self.callbacks.shutdown_handler() else {
            log::info!("Terminate received with no shutdown callback registered");
            return;
        };

        let spawned = thread::Builder::new()
            .name(SHUTDOWN_THREAD_NAME.to_string())
            .spawn(move || Callbacks::run_shutdown(handler));
        if let Err(e) = spawned {
            log::error!("Failed to spawn shutdown callback thread: {}", e);
        }
    }

    fn build_request(&self) -> HeartbeatRequest {
        HeartbeatRequest {
            current_game_state: self.state(),
            current_game_health: self.callbacks.health(),
            current_players: lock(&self.connected_players).clone(),
        }
    }

    /// Merges one agent response into shared state.
    ///
    /// Session data is merged before the operation is applied, so a caller
    /// woken by `Active` already sees the session keys.
    pub(crate) fn apply_response(&self, response: HeartbeatResponse) {
        let interval = self
            .options
            .effective_interval(response.next_heartbeat_interval_ms);
        lock(&self.lifecycle).interval = interval;

        if let Some(session) = &response.session_config {
            self.merge_session(session);
        }

        if let Some(raw) = response.next_scheduled_maintenance_utc.as_deref() {
            self.deliver_maintenance_timestamp(raw);
        }

        if let Some(schedule) = response.maintenance_schedule {
            self.deliver_maintenance_schedule(schedule);
        }

        match response.operation {
            None | Some(GameOperation::Continue) => {}
            Some(GameOperation::Active) => {
                self.set_state(GameState::Active);
            }
            Some(GameOperation::Terminate) => {
                self.set_state(GameState::Terminating);
            }
            Some(GameOperation::Other(op)) => {
                log::warn!("Unhandled operation received: {}", op);
            }
        }
    }

    /// The config write guard is held until the session tracker is updated,
    /// so a new `sessionId` is never visible next to the previous session's
    /// initial players.
    fn merge_session(&self, session: &SessionConfig) {
        let mut config = write(&self.config);
        config.insert_if_not_empty(SESSION_ID_KEY, session.session_id.as_deref());
        config.insert_if_not_empty(SESSION_COOKIE_KEY, session.session_cookie.as_deref());
        config.extend(session.string_metadata());

        let mut tracker = lock(&self.session);
        if let Some(id) = session.session_id.as_deref().filter(|id| !id.is_empty()) {
            if tracker.session_id.as_deref() != Some(id) {
                if tracker.session_id.is_some() {
                    log::info!("New session {} started; resetting initial players", id);
                    tracker.initial_players.clear();
                }
                tracker.session_id = Some(id.to_string());
            }
        }
        if tracker.initial_players.is_empty() && !session.initial_players.is_empty() {
            tracker.initial_players = session.initial_players.clone();
        }
    }

    fn deliver_maintenance_timestamp(&self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let Some(at) = parse_utc_timestamp(raw) else {
            log::warn!("Unparsable maintenance timestamp: {}", raw);
            return;
        };
        if lock(&self.maintenance).delivered_timestamp == Some(at) {
            return;
        }

        // Not cached until it reaches a handler, so a late registration still
        // gets the current notice.
        if self.callbacks.maintenance(at) {
            lock(&self.maintenance).delivered_timestamp = Some(at);
        }
    }

    fn deliver_maintenance_schedule(&self, schedule: MaintenanceSchedule) {
        *write(&self.schedule) = Some(schedule.clone());

        if lock(&self.maintenance).delivered_schedule.as_ref() == Some(&schedule) {
            return;
        }
        if self.callbacks.maintenance_v2(&schedule) {
            lock(&self.maintenance).delivered_schedule = Some(schedule);
        }
    }
}

/// The heartbeat loop body. Returns when the engine is closed.
fn run(shared: Arc<Shared>, transport: Box<dyn Transport>) {
    log::info!("Heartbeat thread started");

    if let Err(e) = transport.send_info(&GsdkInfo::default()) {
        log::warn!("Failed to send SDK info: {}", e);
    }

    loop {
        {
            let lifecycle = lock(&shared.lifecycle);
            let interval = lifecycle.interval;
            let (mut lifecycle, _) = shared
                .signal
                .wait_timeout_while(lifecycle, interval, |l| l.running && !l.heartbeat_requested)
                .unwrap_or_else(PoisonError::into_inner);
            if !lifecycle.running {
                break;
            }
            lifecycle.heartbeat_requested = false;
        }

        let request = shared.build_request();
        log::debug!(
            "Sending heartbeat: state={} health={:?} players={}",
            request.current_game_state,
            request.current_game_health,
            request.current_players.len()
        );

        match transport.send_heartbeat(&request) {
            Ok(response) => shared.apply_response(response),
            Err(e) => log::warn!("Heartbeat failed: {}", e),
        }
    }

    log::info!("Heartbeat thread stopped");
}

/// The lifecycle engine behind [`crate::GameServerSdk`].
pub struct HeartbeatEngine {
    shared: Arc<Shared>,
    config_source: Box<dyn ConfigSource>,
    transport_factory: Box<dyn TransportFactory>,
    start_guard: Mutex<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatEngine {
    pub fn new(
        options: GsdkOptions,
        config_source: Box<dyn ConfigSource>,
        transport_factory: Box<dyn TransportFactory>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(options)),
            config_source,
            transport_factory,
            start_guard: Mutex::new(()),
            worker: Mutex::new(None),
        }
    }

    /// Loads configuration, opens the transport and spawns the heartbeat
    /// thread. Later calls return `Ok(())` without doing anything.
    ///
    /// # Errors
    /// Any [`InitializationError`]. The engine stays `Uninitialized` and the
    /// next call tries again.
    pub fn start(&self) -> Result<(), InitializationError> {
        let _guard = lock(&self.start_guard);
        if self.shared.state() != GameState::Uninitialized {
            return Ok(());
        }

        let config = self.config_source.load()?;
        config.validate()?;
        self.install_file_log(&config);
        log::info!("{}", config);

        let endpoints = AgentEndpoints::new(&config.heartbeat_endpoint, &config.session_host_id);
        let transport = self.transport_factory.open(&endpoints)?;

        {
            // `close` may have run while configuration was loading.
            let mut lifecycle = lock(&self.shared.lifecycle);
            if lifecycle.state != GameState::Uninitialized {
                log::info!("Engine closed during start; heartbeat thread not started");
                return Ok(());
            }
            *write(&self.shared.config) = config.to_config_map();
            *write(&self.shared.connection_info) = config.game_server_connection_info.clone();
            lifecycle.state = GameState::Initializing;
            lifecycle.running = true;
            lifecycle.heartbeat_requested = true;
        }

        // Held across the spawn so a concurrent `close` finds the handle to join.
        let mut worker = lock(&self.worker);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(HEARTBEAT_THREAD_NAME.to_string())
            .spawn(move || run(shared, transport));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                log::info!("GSDK started; heartbeating to {}", endpoints.heartbeat_url);
                Ok(())
            }
            Err(e) => {
                let mut lifecycle = lock(&self.shared.lifecycle);
                if lifecycle.state == GameState::Initializing {
                    lifecycle.state = GameState::Uninitialized;
                    *write(&self.shared.config) = ConfigMap::new();
                }
                lifecycle.running = false;
                Err(InitializationError::Spawn(e))
            }
        }
    }

    #[cfg(feature = "loggers")]
    fn install_file_log(&self, config: &GsdkConfiguration) {
        if !self.shared.options.file_logging {
            return;
        }
        match crate::loggers::gsdk_log::start_file_log(
            &config.log_folder,
            self.shared.options.debug_logs,
        ) {
            Ok(path) => log::info!("GSDK log file: {}", path.display()),
            Err(e) => log::debug!("GSDK file logger not installed: {}", e),
        }
    }

    #[cfg(not(feature = "loggers"))]
    fn install_file_log(&self, _config: &GsdkConfiguration) {}

    /// Blocks until the instance is allocated (`true`) or told to terminate
    /// (`false`). Closing the engine releases the caller with `false`.
    pub fn ready_for_players(&self) -> Result<bool, InitializationError> {
        self.start()?;

        let mut lifecycle = lock(&self.shared.lifecycle);
        match lifecycle.state {
            GameState::Active => return Ok(true),
            GameState::Terminating | GameState::Terminated | GameState::Uninitialized => {
                return Ok(false)
            }
            GameState::Initializing => {
                log::info!("Game state changed: {} -> {}", lifecycle.state, GameState::StandingBy);
                lifecycle.state = GameState::StandingBy;
                lifecycle.heartbeat_requested = true;
                self.shared.signal.notify_all();
            }
            GameState::StandingBy => {}
        }

        let lifecycle = self
            .shared
            .signal
            .wait_while(lifecycle, |l| {
                l.running && !matches!(l.state, GameState::Active | GameState::Terminating)
            })
            .unwrap_or_else(PoisonError::into_inner);
        Ok(lifecycle.state == GameState::Active)
    }

    pub fn state(&self) -> GameState {
        self.shared.state()
    }

    /// Current heartbeat interval, after the agent's last request.
    pub fn heartbeat_interval(&self) -> Duration {
        self.shared.interval()
    }

    pub fn config_settings(&self) -> ConfigMap {
        read(&self.shared.config).clone()
    }

    pub fn connection_info(&self) -> GameServerConnectionInfo {
        read(&self.shared.connection_info).clone()
    }

    pub fn initial_players(&self) -> Vec<String> {
        lock(&self.shared.session).initial_players.clone()
    }

    pub fn maintenance_schedule(&self) -> Option<MaintenanceSchedule> {
        read(&self.shared.schedule).clone()
    }

    /// Replaces the player list sent on the next heartbeat.
    pub fn update_connected_players(&self, players: Vec<ConnectedPlayer>) {
        *lock(&self.shared.connected_players) = players;
    }

    pub fn register_shutdown_callback(&self, handler: ShutdownCallback) {
        self.shared.callbacks.set_shutdown(handler);
    }

    pub fn register_health_callback(&self, handler: HealthCallback) {
        self.shared.callbacks.set_health(handler);
    }

    pub fn register_maintenance_callback(&self, handler: MaintenanceCallback) {
        self.shared.callbacks.set_maintenance(handler);
    }

    pub fn register_maintenance_v2_callback(&self, handler: MaintenanceV2Callback) {
        self.shared.callbacks.set_maintenance_v2(handler);
    }

    /// Stops the heartbeat thread and marks the engine `Terminated`.
    ///
    /// Idempotent. Waits for an in-flight heartbeat to finish, except when
    /// called from the heartbeat thread itself.
    pub fn close(&self) {
        {
            let mut lifecycle = lock(&self.shared.lifecycle);
            if lifecycle.state != GameState::Terminated {
                log::info!("Game state changed: {} -> {}", lifecycle.state, GameState::Terminated);
            }
            lifecycle.state = GameState::Terminated;
            lifecycle.running = false;
        }
        self.shared.signal.notify_all();

        let Some(handle) = lock(&self.worker).take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::error!("Heartbeat thread panicked");
        }
    }
}

impl Drop for HeartbeatEngine {
    fn drop(&mut self) {
        self.close();
    }
}
