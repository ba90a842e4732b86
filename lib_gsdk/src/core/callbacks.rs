//! # Callback Slots
//!
//! One optional handler per kind. Handlers are cloned out of their slot
//! before they run, so a handler may re-register itself (or another kind)
//! without deadlocking. A panicking handler is caught and logged.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::model::{GameHealth, MaintenanceSchedule};

pub type ShutdownCallback = Arc<dyn Fn() + Send + Sync>;
/// Returns `true` while the server is healthy.
pub type HealthCallback = Arc<dyn Fn() -> bool + Send + Sync>;
/// Receives the next scheduled maintenance time.
pub type MaintenanceCallback = Arc<dyn Fn(DateTime<Utc>) + Send + Sync>;
pub type MaintenanceV2Callback = Arc<dyn Fn(&MaintenanceSchedule) + Send + Sync>;

struct Slot<F: ?Sized>(Mutex<Option<Arc<F>>>);

impl<F: ?Sized> Slot<F> {
    fn empty() -> Self {
        Slot(Mutex::new(None))
    }

    fn set(&self, handler: Arc<F>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn get(&self) -> Option<Arc<F>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Runs `f`, turning a panic into `None`.
fn guarded<R>(kind: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            log::error!("{} callback panicked", kind);
            None
        }
    }
}

pub(crate) struct Callbacks {
    shutdown: Slot<dyn Fn() + Send + Sync>,
    health: Slot<dyn Fn() -> bool + Send + Sync>,
    maintenance: Slot<dyn Fn(DateTime<Utc>) + Send + Sync>,
    maintenance_v2: Slot<dyn Fn(&MaintenanceSchedule) + Send + Sync>,
}

impl Callbacks {
    pub(crate) fn new() -> Self {
        Self {
            shutdown: Slot::empty(),
            health: Slot::empty(),
            maintenance: Slot::empty(),
            maintenance_v2: Slot::empty(),
        }
    }

    pub(crate) fn set_shutdown(&self, handler: ShutdownCallback) {
        self.shutdown.set(handler);
    }

    pub(crate) fn set_health(&self, handler: HealthCallback) {
        self.health.set(handler);
    }

    pub(crate) fn set_maintenance(&self, handler: MaintenanceCallback) {
        self.maintenance.set(handler);
    }

    pub(crate) fn set_maintenance_v2(&self, handler: MaintenanceV2Callback) {
        self.maintenance_v2.set(handler);
    }

    /// Returns the shutdown handler, if any, for the caller to run.
    pub(crate) fn shutdown_handler(&self) -> Option<ShutdownCallback> {
        self.shutdown.get()
    }

    pub(crate) fn run_shutdown(handler: ShutdownCallback) {
        guarded("Shutdown", || handler());
    }

    /// `Healthy` with no handler registered, `Unhealthy` if the handler panics.
    pub(crate) fn health(&self) -> GameHealth {
        match self.health.get() {
            None => GameHealth::Healthy,
            Some(handler) => guarded("Health", || handler())
                .map(GameHealth::from)
                .unwrap_or(GameHealth::Unhealthy),
        }
    }

    /// Returns `true` when a handler received the timestamp.
    pub(crate) fn maintenance(&self, at: DateTime<Utc>) -> bool {
        match self.maintenance.get() {
            Some(handler) => {
                guarded("Maintenance", || handler(at));
                true
            }
            None => false,
        }
    }

    /// Returns `true` when a handler received the schedule.
    pub(crate) fn maintenance_v2(&self, schedule: &MaintenanceSchedule) -> bool {
        match self.maintenance_v2.get() {
            Some(handler) => {
                guarded("Maintenance V2", || handler(schedule));
                true
            }
            None => false,
        }
    }
}
