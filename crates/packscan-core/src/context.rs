//! Shared session context
//!
//! The original front end kept the online flag, the timer lists and the user
//! setup as ambient globals. Here they live in one explicit context object
//! owned by the orchestrator and handed to each component, so a test can
//! build a fully isolated engine with doubles at every seam.

use std::sync::{Arc, RwLock};

use crate::connectivity::ConnectivityMonitor;
use crate::core_types::UserConfig;
use crate::jitter::JitterSource;
use crate::surface::UiSurface;
use crate::timers::TimerRegistry;

pub struct ScanContext {
    pub connectivity: Arc<ConnectivityMonitor>,
    pub timers: Arc<TimerRegistry>,
    pub surface: Arc<dyn UiSurface>,
    pub jitter: Arc<dyn JitterSource>,
    user_config: RwLock<Option<UserConfig>>,
}

impl ScanContext {
    pub fn new(
        connectivity: Arc<ConnectivityMonitor>,
        timers: Arc<TimerRegistry>,
        surface: Arc<dyn UiSurface>,
        jitter: Arc<dyn JitterSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connectivity,
            timers,
            surface,
            jitter,
            user_config: RwLock::new(None),
        })
    }

    pub fn user_config(&self) -> Option<UserConfig> {
        self.user_config.read().unwrap().clone()
    }

    pub fn has_user_config(&self) -> bool {
        self.user_config.read().unwrap().is_some()
    }

    pub(crate) fn set_user_config(&self, config: UserConfig) {
        *self.user_config.write().unwrap() = Some(config);
    }
}
