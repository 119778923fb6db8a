//! Timer registry owning every delayed and repeating callback
//!
//! All delayed work in the engine is registered here so one `cancel_all`
//! deterministically stops everything outstanding, including sub-tasks
//! spawned mid-sequence. Cancellation uses a token epoch: each registered
//! task holds a child of the current epoch token, `cancel_all` cancels the
//! epoch and installs a fresh one, so work scheduled afterwards runs
//! normally.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle identifying one registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Timeout,
    Interval,
}

/// How a registered sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Elapsed,
    Cancelled,
}

impl TimerOutcome {
    pub fn is_cancelled(self) -> bool {
        self == TimerOutcome::Cancelled
    }
}

struct ScheduledTask {
    #[allow(dead_code)]
    kind: TaskKind,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

struct RegistryState {
    next_id: u64,
    epoch: CancellationToken,
    tasks: HashMap<TaskId, ScheduledTask>,
}

pub struct TimerRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                next_id: 0,
                epoch: CancellationToken::new(),
                tasks: HashMap::new(),
            })),
        }
    }

    fn register(&self, kind: TaskKind) -> (TaskId, CancellationToken) {
        let mut state = self.state.lock().unwrap();
        let id = TaskId(state.next_id);
        state.next_id += 1;
        let token = state.epoch.child_token();
        state.tasks.insert(
            id,
            ScheduledTask {
                kind,
                token: token.clone(),
                handle: None,
            },
        );
        (id, token)
    }

    fn attach_handle(&self, id: TaskId, handle: JoinHandle<()>) {
        let mut state = self.state.lock().unwrap();
        match state.tasks.get_mut(&id) {
            // The task may have finished and deregistered itself before we
            // got the lock back, in which case the handle is already done.
            Some(task) => task.handle = Some(handle),
            None => drop(handle),
        }
    }

    fn deregister_in(state: &Arc<Mutex<RegistryState>>, id: TaskId) {
        state.lock().unwrap().tasks.remove(&id);
    }

    /// One-shot inline suspension point. Resolves [`TimerOutcome::Cancelled`]
    /// immediately if `cancel_all` fires while waiting.
    pub async fn sleep(&self, delay: Duration) -> TimerOutcome {
        let (id, token) = self.register(TaskKind::Timeout);
        let _guard = Deregister {
            state: Arc::clone(&self.state),
            id,
        };
        tokio::select! {
            _ = tokio::time::sleep(delay) => TimerOutcome::Elapsed,
            _ = token.cancelled() => TimerOutcome::Cancelled,
        }
    }

    /// Spawn a one-shot callback after `delay`.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let (id, token) = self.register(TaskKind::Timeout);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    Self::deregister_in(&state, id);
                    callback();
                }
                _ = token.cancelled() => {
                    Self::deregister_in(&state, id);
                }
            }
        });
        self.attach_handle(id, handle);
        id
    }

    /// Spawn a repeating callback, first fired one full interval from now.
    /// The callback returns [`ControlFlow::Break`] to stop itself.
    pub fn schedule_repeating<F>(&self, interval: Duration, mut callback: F) -> TaskId
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (id, token) = self.register(TaskKind::Interval);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        if callback().is_break() {
                            break;
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
            Self::deregister_in(&state, id);
        });
        self.attach_handle(id, handle);
        id
    }

    /// Cancel a single task. Unknown ids are ignored, so holding on to the
    /// id of a task that already completed is harmless.
    pub fn cancel(&self, id: TaskId) {
        let task = self.state.lock().unwrap().tasks.remove(&id);
        if let Some(task) = task {
            task.token.cancel();
        }
    }

    /// Cancel every outstanding task and start a fresh epoch. No registered
    /// task survives this call.
    pub fn cancel_all(&self) {
        let drained: Vec<ScheduledTask> = {
            let mut state = self.state.lock().unwrap();
            state.epoch.cancel();
            state.epoch = CancellationToken::new();
            state.tasks.drain().map(|(_, task)| task).collect()
        };
        let count = drained.len();
        for task in drained {
            task.token.cancel();
            if let Some(handle) = task.handle {
                handle.abort();
            }
        }
        if count > 0 {
            log::debug!("Timer registry cancelled {} outstanding task(s)", count);
        }
    }

    /// Number of currently registered tasks.
    pub fn outstanding(&self) -> usize {
        self.state.lock().unwrap().tasks.len()
    }
}

/// Removes a sleep entry from the task table even if the awaiting future is
/// dropped mid-suspension.
struct Deregister {
    state: Arc<Mutex<RegistryState>>,
    id: TaskId,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        TimerRegistry::deregister_in(&self.state, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn sleep_elapses_and_deregisters() {
        let registry = TimerRegistry::new();
        let outcome = registry.sleep(Duration::from_millis(50)).await;
        assert_eq!(outcome, TimerOutcome::Elapsed);
        assert_eq!(registry.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_interrupts_inflight_sleep() {
        let registry = Arc::new(TimerRegistry::new());
        let sleeper = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.sleep(Duration::from_secs(60)).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(registry.outstanding(), 1);

        registry.cancel_all();
        let outcome = sleeper.await.unwrap();
        assert_eq!(outcome, TimerOutcome::Cancelled);
        assert_eq!(registry.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_callback_fires_once() {
        let registry = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        registry.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(registry.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_suppresses_pending_callback() {
        let registry = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        registry.schedule(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.cancel_all();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(registry.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_callback_ticks_until_break() {
        let registry = TimerRegistry::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        registry.schedule_repeating(Duration::from_secs(1), move || {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(registry.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_one_repeating_task_only() {
        let registry = TimerRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        let first_id = registry.schedule_repeating(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        let counter = Arc::clone(&second);
        registry.schedule_repeating(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        registry.cancel(first_id);
        let frozen = first.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) > frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_epoch_after_cancel_all() {
        let registry = TimerRegistry::new();
        registry.cancel_all();

        let outcome = registry.sleep(Duration::from_millis(10)).await;
        assert_eq!(outcome, TimerOutcome::Elapsed);
    }
}
