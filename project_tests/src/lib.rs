//! # Shared Test Doubles
//!
//! Scripted transports, fixtures and polling helpers used by the integration
//! tests in `tests/`. Nothing here touches the network or the process
//! environment.

#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lib_gsdk::configs::EnvLookup;
use lib_gsdk::{
    AgentEndpoints, GameServerSdk, GsdkConfiguration, GsdkInfo, GsdkOptions, HeartbeatRequest,
    HeartbeatResponse, StaticConfiguration, Transport, TransportError, TransportFactory,
};

/// Responses the fake agent will give, and what it was sent.
#[derive(Default)]
pub struct Script {
    responses: Mutex<VecDeque<Result<HeartbeatResponse, TransportError>>>,
    requests: Mutex<Vec<HeartbeatRequest>>,
    info_posts: Mutex<Vec<GsdkInfo>>,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response given as agent JSON.
    pub fn respond(&self, json: &str) -> &Self {
        let response = serde_json::from_str(json).unwrap_or_else(|e| panic!("bad fixture {json}: {e}"));
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HeartbeatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn heartbeat_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn info_posts(&self) -> Vec<GsdkInfo> {
        self.info_posts.lock().unwrap().clone()
    }
}

/// Plays back a [`Script`]; once it runs dry every heartbeat gets an empty
/// (`Continue`) response.
pub struct ScriptedTransport {
    script: Arc<Script>,
}

impl Transport for ScriptedTransport {
    fn send_heartbeat(&self, request: &HeartbeatRequest) -> Result<HeartbeatResponse, TransportError> {
        self.script.requests.lock().unwrap().push(request.clone());
        self.script
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HeartbeatResponse::default()))
    }

    fn send_info(&self, info: &GsdkInfo) -> Result<(), TransportError> {
        self.script.info_posts.lock().unwrap().push(info.clone());
        Ok(())
    }
}

/// Hands out [`ScriptedTransport`]s and counts how often it was asked to.
#[derive(Clone)]
pub struct ScriptedFactory {
    script: Arc<Script>,
    opened: Arc<AtomicUsize>,
    endpoints: Arc<Mutex<Vec<AgentEndpoints>>>,
}

impl ScriptedFactory {
    pub fn new(script: Arc<Script>) -> Self {
        Self {
            script,
            opened: Arc::new(AtomicUsize::new(0)),
            endpoints: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn opened_endpoints(&self) -> Vec<AgentEndpoints> {
        self.endpoints.lock().unwrap().clone()
    }
}

impl TransportFactory for ScriptedFactory {
    fn open(&self, endpoints: &AgentEndpoints) -> Result<Box<dyn Transport>, TransportError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoints.clone());
        Ok(Box::new(ScriptedTransport {
            script: Arc::clone(&self.script),
        }))
    }
}

/// Short intervals, no file logger.
pub fn fast_options() -> GsdkOptions {
    GsdkOptions {
        heartbeat_interval: Duration::from_millis(20),
        file_logging: false,
        ..Default::default()
    }
}

/// A complete configuration, as the agent would write it.
pub fn valid_config() -> GsdkConfiguration {
    GsdkConfiguration {
        heartbeat_endpoint: "127.0.0.1:56001".to_string(),
        session_host_id: "host-42".to_string(),
        vm_id: "vm-1".to_string(),
        log_folder: "/data/GameLogs".to_string(),
        shared_content_folder: "/data/SharedContent".to_string(),
        certificate_folder: "/data/Certificates".to_string(),
        game_certificates: HashMap::from([("serverCert".to_string(), "ABCDEF".to_string())]),
        build_metadata: HashMap::from([("Mode".to_string(), "ranked".to_string())]),
        game_ports: HashMap::from([("gameport".to_string(), "7777".to_string())]),
        title_id: "title-1".to_string(),
        build_id: "build-1".to_string(),
        region: "WestEurope".to_string(),
        ..Default::default()
    }
}

/// An SDK wired to a scripted agent.
pub fn scripted_sdk(config: GsdkConfiguration, script: &Arc<Script>) -> (GameServerSdk, ScriptedFactory) {
    let factory = ScriptedFactory::new(Arc::clone(script));
    let sdk = GameServerSdk::new(fast_options(), StaticConfiguration(config), factory.clone());
    (sdk, factory)
}

/// An environment made of the given pairs only.
pub fn env_from(pairs: &[(&str, &str)]) -> EnvLookup {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Arc::new(move |name: &str| vars.get(name).cloned())
}

/// Polls `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Generous upper bound for anything the heartbeat thread should do.
pub const PATIENCE: Duration = Duration::from_secs(5);
