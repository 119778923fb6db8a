//! Percentage progress driver for an active scan
//!
//! Advances 0 to 100 over a fixed wall-clock duration in equal steps,
//! independent of the status line animation. The two share nothing but the
//! connectivity flag and the timer registry, so a connection drop stops the
//! counter at its current percent with no coordination.

use std::sync::Arc;
use std::time::Duration;

use crate::context::ScanContext;
use crate::surface::CueKind;

/// Fixed total duration of one progress run.
pub const PROGRESS_DURATION_MS: u64 = 15_000;
const PROGRESS_STEPS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    Completed,
    Interrupted,
}

struct ProgressState {
    percent: u8,
}

pub struct ProgressDriver {
    ctx: Arc<ScanContext>,
}

impl ProgressDriver {
    pub fn new(ctx: Arc<ScanContext>) -> Self {
        Self { ctx }
    }

    /// Drive the counter to 100, emitting a tick cue at every multiple of
    /// ten. Stops at the current percent if connectivity drops.
    pub async fn run(&self) -> ProgressOutcome {
        let step = Duration::from_millis(PROGRESS_DURATION_MS / PROGRESS_STEPS);
        let mut state = ProgressState { percent: 0 };

        loop {
            if !self.ctx.connectivity.is_online() {
                log::debug!("Progress interrupted at {}%", state.percent);
                return ProgressOutcome::Interrupted;
            }

            self.ctx.surface.render_progress(state.percent);
            if state.percent % 10 == 0 {
                self.ctx.surface.notify_cue(CueKind::Tick);
            }

            if self.ctx.timers.sleep(step).await.is_cancelled() {
                log::debug!("Progress interrupted at {}%", state.percent);
                return ProgressOutcome::Interrupted;
            }

            if state.percent == 100 {
                return ProgressOutcome::Completed;
            }
            state.percent += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::jitter::FixedJitter;
    use crate::surface::UiSurface;
    use crate::test_utils::RecordingSurface;
    use crate::timers::TimerRegistry;

    fn test_context(surface: Arc<RecordingSurface>) -> (Arc<ScanContext>, Arc<ConnectivityMonitor>) {
        let timers = Arc::new(TimerRegistry::new());
        let surface: Arc<dyn UiSurface> = surface;
        let connectivity = Arc::new(ConnectivityMonitor::new(
            Arc::clone(&timers),
            Arc::clone(&surface),
            true,
        ));
        let ctx = ScanContext::new(
            Arc::clone(&connectivity),
            timers,
            surface,
            Arc::new(FixedJitter(0)),
        );
        (ctx, connectivity)
    }

    #[tokio::test(start_paused = true)]
    async fn advances_strictly_by_one_with_ticks_at_tens() {
        let recorder = Arc::new(RecordingSurface::new());
        let (ctx, _) = test_context(Arc::clone(&recorder));
        let driver = ProgressDriver::new(ctx);

        let started = tokio::time::Instant::now();
        let outcome = driver.run().await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, ProgressOutcome::Completed);
        let rendered = recorder.progress();
        let expected: Vec<u8> = (0..=100).collect();
        assert_eq!(rendered, expected);

        let ticks = recorder
            .cues()
            .iter()
            .filter(|cue| **cue == CueKind::Tick)
            .count();
        assert_eq!(ticks, 11);

        // One sleep per percent, 101 in total at 150ms each.
        let total = Duration::from_millis(PROGRESS_DURATION_MS);
        let step = Duration::from_millis(PROGRESS_DURATION_MS / PROGRESS_STEPS);
        assert!(elapsed >= total);
        assert!(elapsed <= total + 2 * step);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_stops_at_current_percent() {
        let recorder = Arc::new(RecordingSurface::new());
        let (ctx, connectivity) = test_context(Arc::clone(&recorder));
        let driver = ProgressDriver::new(Arc::clone(&ctx));

        let handle = tokio::spawn(async move { driver.run().await });
        tokio::time::sleep(Duration::from_millis(4000)).await;
        connectivity.set_online(false);

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, ProgressOutcome::Interrupted);

        let rendered = recorder.progress();
        assert!(rendered.len() < 101);
        assert!(rendered.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
