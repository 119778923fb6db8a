//! Cooldown deadline persistence and live countdown
//!
//! The cooldown deadline is the only state that must survive a restart. It
//! lives behind [`CooldownStore`] as an epoch-millisecond string under a
//! single key. The manager owns the single 1-second countdown tick;
//! activating a new countdown always cancels the previous one first.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::context::ScanContext;
use crate::core_types::now_ms;
use crate::errors::ScanError;
use crate::timers::TaskId;

const STORE_KEY: &str = "cooldownEnd";

/// Seconds left until `deadline_ms`, never negative, rounded up so a
/// deadline 1ms away still reads as one full second.
pub fn remaining_secs(deadline_ms: i64, now_ms: i64) -> i64 {
    let delta = deadline_ms - now_ms;
    if delta <= 0 {
        0
    } else {
        (delta + 999) / 1000
    }
}

/// Formats whole seconds as `m:ss`.
pub fn format_remaining(secs: i64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub trait CooldownStore: Send + Sync {
    fn load(&self) -> Result<Option<i64>, ScanError>;
    fn save(&self, deadline_ms: i64) -> Result<(), ScanError>;
    fn clear(&self) -> Result<(), ScanError>;
}

/// Volatile store for tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    deadline: Mutex<Option<i64>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn load(&self) -> Result<Option<i64>, ScanError> {
        Ok(*self.deadline.lock().unwrap())
    }

    fn save(&self, deadline_ms: i64) -> Result<(), ScanError> {
        *self.deadline.lock().unwrap() = Some(deadline_ms);
        Ok(())
    }

    fn clear(&self) -> Result<(), ScanError> {
        *self.deadline.lock().unwrap() = None;
        Ok(())
    }
}

/// JSON key/value file store. The deadline is written as a string value
/// under the `cooldownEnd` key; unknown keys are preserved.
#[derive(Debug, Clone)]
pub struct FileCooldownStore {
    path: PathBuf,
}

impl FileCooldownStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> Result<HashMap<String, String>, ScanError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ScanError::Persistence(format!(
                    "Corrupt state file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), ScanError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| ScanError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CooldownStore for FileCooldownStore {
    fn load(&self) -> Result<Option<i64>, ScanError> {
        let map = self.read_map()?;
        match map.get(STORE_KEY) {
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|e| {
                ScanError::Persistence(format!("Invalid persisted deadline '{}': {}", raw, e))
            }),
            None => Ok(None),
        }
    }

    fn save(&self, deadline_ms: i64) -> Result<(), ScanError> {
        let mut map = self.read_map()?;
        map.insert(STORE_KEY.to_string(), deadline_ms.to_string());
        self.write_map(&map)
    }

    fn clear(&self) -> Result<(), ScanError> {
        let mut map = self.read_map()?;
        if map.remove(STORE_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

pub struct CooldownManager {
    ctx: Arc<ScanContext>,
    store: Arc<dyn CooldownStore>,
    tick_task: Mutex<Option<TaskId>>,
}

impl CooldownManager {
    pub fn new(ctx: Arc<ScanContext>, store: Arc<dyn CooldownStore>) -> Self {
        Self {
            ctx,
            store,
            tick_task: Mutex::new(None),
        }
    }

    /// Whether a persisted deadline is still in the future.
    pub fn is_active(&self) -> Result<bool, ScanError> {
        Ok(self
            .store
            .load()?
            .is_some_and(|deadline| now_ms() < deadline))
    }

    /// Remaining seconds of the persisted deadline, 0 when none is active.
    pub fn remaining(&self) -> Result<i64, ScanError> {
        Ok(self
            .store
            .load()?
            .map_or(0, |deadline| remaining_secs(deadline, now_ms())))
    }

    /// Persist `deadline_ms` and start the countdown tick. Scan triggers
    /// stay disabled until the countdown reaches zero.
    pub fn activate(&self, deadline_ms: i64) -> Result<(), ScanError> {
        self.store.save(deadline_ms)?;
        self.ctx.surface.set_triggers_enabled(false);
        log::info!(
            "Cooldown active, {}s remaining",
            remaining_secs(deadline_ms, now_ms())
        );

        let previous = self.tick_task.lock().unwrap().take();
        if let Some(previous) = previous {
            self.ctx.timers.cancel(previous);
        }

        let ctx = Arc::clone(&self.ctx);
        let store = Arc::clone(&self.store);
        // First render happens now, not one second from now.
        let _ = Self::tick(&ctx, &store, deadline_ms);
        let id = self
            .ctx
            .timers
            .schedule_repeating(Duration::from_secs(1), move || {
                Self::tick(&ctx, &store, deadline_ms)
            });
        *self.tick_task.lock().unwrap() = Some(id);
        Ok(())
    }

    /// Called on every application (re)initialization. Resumes a persisted
    /// countdown that is still in the future, otherwise clears stale state
    /// and sets the triggers from configuration presence. Idempotent.
    pub fn check_existing(&self) -> Result<(), ScanError> {
        match self.store.load()? {
            Some(deadline) if now_ms() < deadline => self.activate(deadline),
            stale => {
                if stale.is_some() {
                    self.store.clear()?;
                }
                self.ctx
                    .surface
                    .set_triggers_enabled(self.ctx.has_user_config());
                Ok(())
            }
        }
    }

    fn tick(ctx: &Arc<ScanContext>, store: &Arc<dyn CooldownStore>, deadline_ms: i64) -> ControlFlow<()> {
        let remaining = remaining_secs(deadline_ms, now_ms());
        ctx.surface.render_countdown(&format_remaining(remaining));
        if remaining > 0 {
            return ControlFlow::Continue(());
        }

        if let Err(e) = store.clear() {
            log::warn!("Failed to clear expired cooldown: {}", e);
        }
        ctx.surface.render_countdown("");
        if ctx.has_user_config() {
            ctx.surface.set_triggers_enabled(true);
        }
        log::info!("Cooldown expired, triggers restored");
        ControlFlow::Break(())
    }
}
