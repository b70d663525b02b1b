use std::sync::{Arc, Mutex, OnceLock, PoisonError};

static DEBUG_LOGGER: OnceLock<Arc<Mutex<DebugLogger>>> = OnceLock::new();

/// How many recent messages are kept for the status area.
const LOG_CAPACITY: usize = 3;

#[derive(Clone)]
pub struct DebugLogger {
    logs: Arc<Mutex<Vec<String>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Get the global DebugLogger instance
    pub fn global() -> Arc<Mutex<DebugLogger>> {
        DEBUG_LOGGER
            .get_or_init(|| Arc::new(Mutex::new(DebugLogger::new(false))))
            .clone()
    }

    /// Initialize the global DebugLogger with a specific enabled state.
    /// Must run before the first `log_global`, later calls are ignored.
    pub fn init(enabled: bool) {
        DEBUG_LOGGER.get_or_init(|| Arc::new(Mutex::new(DebugLogger::new(enabled))));
    }

    pub fn new(enabled: bool) -> Self {
        DebugLogger {
            logs: Arc::new(Mutex::new(Vec::new())),
            enabled,
        }
    }

    pub fn log(&self, message: String) {
        if !self.enabled {
            return;
        }
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        logs.push(message);
        if logs.len() > LOG_CAPACITY {
            let excess = logs.len() - LOG_CAPACITY;
            logs.drain(..excess);
        }
    }

    pub fn get_logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .map(|logs| logs.clone())
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Handle sharing the global log buffer.
    pub fn handle() -> DebugLogger {
        Self::global()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log from anywhere, including audio callbacks, without holding a reference
    pub fn log_global(message: impl Into<String>) {
        Self::handle().log(message.into());
    }
}
