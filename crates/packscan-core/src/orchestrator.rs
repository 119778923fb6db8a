//! Scan session orchestration and lifecycle management
//!
//! Drives one session at a time through
//! `Idle -> Connecting -> AwaitingServer -> {Maintenance | Success | Error} -> Idle`.
//! The connecting phase runs the status script through the typewriter while
//! the progress driver advances concurrently; the two are linked only by the
//! shared connectivity flag. Every terminal state is handled locally: the
//! orchestrator renders the matching indication, restores trigger state, and
//! returns the session to idle without tearing anything else down.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::context::ScanContext;
use crate::cooldown::CooldownManager;
use crate::core_types::{AnalysisRequest, ResultOutcome, ScanKind, ScanPhase, Tier, UserConfig};
use crate::errors::ScanError;
use crate::progress::{ProgressDriver, ProgressOutcome};
use crate::remote::AnalysisClient;
use crate::surface::{CueKind, ViewKind};
use crate::typewriter::{RenderOutcome, TypewriterAnimator};

/// Settle delay between the confirmation line and the results hand-off.
const SUCCESS_SETTLE_MS: u64 = 1_200;
/// Delay before the post-result auto-navigation action.
const AUTO_NAVIGATE_MS: u64 = 4_000;

const SUCCESS_LINE: &str = "[✓ CONNECTED TO GAME SERVER SUCCESSFULLY]";

fn connection_script(user: &UserConfig, kind: ScanKind) -> Vec<String> {
    vec![
        "CONNECTING TO SERVER".to_string(),
        "[>] Initializing secure connection...".to_string(),
        "[>] Establishing encrypted tunnel...".to_string(),
        format!("[>] Connecting to {} server...", user.continent),
        format!("[>] Device: {} detected", user.device_type),
        "[>] Authenticating credentials...".to_string(),
        "[>] Spoofing user agent...".to_string(),
        "[>] Bypassing firewall restrictions...".to_string(),
        "[>] Exploiting zero-day vulnerability...".to_string(),
        "[>] Establishing backdoor access...".to_string(),
        "[>] Bypassing security protocols...".to_string(),
        "[>] Accessing game server database...".to_string(),
        "[>] Injecting analysis module...".to_string(),
        format!("[>] Scanning {} box data...", kind),
        "[>] Extracting pack metadata...".to_string(),
        "[>] Running quantum probability simulation...".to_string(),
        "[>] Optimizing hack parameters...".to_string(),
        "[>] Processing server response...".to_string(),
        "[>] Decrypting package information...".to_string(),
        "[>] Analyzing probability algorithms...".to_string(),
        "[>] Calculating success rate...".to_string(),
        "[>] Finalizing connection...".to_string(),
    ]
}

fn is_marked_line(line: &str) -> bool {
    line.contains("CONNECTING TO SERVER") || line.contains("Connecting to")
}

fn tier_cue(tier: Tier) -> CueKind {
    match tier {
        Tier::Bad => CueKind::Error,
        Tier::Weak => CueKind::Tick,
        Tier::Medium => CueKind::Pop,
        Tier::Good => CueKind::Success,
    }
}

pub struct ScanOrchestrator {
    ctx: Arc<ScanContext>,
    client: Arc<dyn AnalysisClient>,
    cooldown: Arc<CooldownManager>,
    typewriter: TypewriterAnimator,
    phase: Mutex<ScanPhase>,
}

impl ScanOrchestrator {
    pub fn new(
        ctx: Arc<ScanContext>,
        client: Arc<dyn AnalysisClient>,
        cooldown: Arc<CooldownManager>,
    ) -> Self {
        let typewriter = TypewriterAnimator::new(Arc::clone(&ctx));
        Self {
            ctx,
            client,
            cooldown,
            typewriter,
            phase: Mutex::new(ScanPhase::Idle),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        *self.phase.lock().unwrap()
    }

    pub fn cooldown(&self) -> &CooldownManager {
        &self.cooldown
    }

    fn set_phase(&self, phase: ScanPhase) {
        *self.phase.lock().unwrap() = phase;
    }

    /// Store the user setup, enable the triggers, then re-check any
    /// persisted cooldown, which may disable them again right away.
    pub fn confirm_setup(&self, config: UserConfig) -> Result<(), ScanError> {
        if config.device_type.trim().is_empty() || config.continent.trim().is_empty() {
            self.ctx.surface.notify_cue(CueKind::Error);
            self.ctx.surface.show_view(ViewKind::Failure);
            return Err(ScanError::ConfigurationMissing);
        }
        log::info!(
            "Setup confirmed: device={}, continent={}",
            config.device_type,
            config.continent
        );
        self.ctx.set_user_config(config);
        self.ctx.surface.hide_view(ViewKind::Setup);
        self.ctx.surface.set_triggers_enabled(true);
        self.ctx.surface.notify_cue(CueKind::Success);
        self.cooldown.check_existing()
    }

    /// Run one full scan session. Guard failures reject immediately without
    /// creating a session; every other failure is surfaced through the UI
    /// before the matching error is returned.
    pub async fn start_scan(&self, kind: ScanKind) -> Result<ResultOutcome, ScanError> {
        if !self.ctx.connectivity.is_online() {
            self.ctx.surface.notify_cue(CueKind::Error);
            return Err(ScanError::ConnectivityLost);
        }
        let user = match self.ctx.user_config() {
            Some(user) => user,
            None => {
                self.ctx.surface.notify_cue(CueKind::Error);
                self.ctx.surface.show_view(ViewKind::Failure);
                return Err(ScanError::ConfigurationMissing);
            }
        };
        if self.cooldown.is_active()? {
            let remaining = self.cooldown.remaining()?;
            log::info!("Scan rejected, cooldown has {}s remaining", remaining);
            self.ctx.surface.notify_cue(CueKind::Error);
            return Err(ScanError::CooldownActive(remaining));
        }
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase != ScanPhase::Idle {
                return Err(ScanError::SessionActive);
            }
            *phase = ScanPhase::Connecting;
        }

        let result = self.run_session(kind, user).await;
        self.set_phase(ScanPhase::Idle);
        result
    }

    async fn run_session(
        &self,
        kind: ScanKind,
        user: UserConfig,
    ) -> Result<ResultOutcome, ScanError> {
        log::info!("Scan session started: kind={}", kind);
        let surface = &self.ctx.surface;
        surface.set_triggers_enabled(false);
        surface.show_view(ViewKind::Connecting);
        surface.notify_cue(CueKind::Connect);

        let progress = ProgressDriver::new(Arc::clone(&self.ctx));
        let progress_handle = tokio::spawn(async move { progress.run().await });

        for line in connection_script(&user, kind) {
            if !self.ctx.connectivity.is_online() {
                return self.abandon_session(progress_handle).await;
            }
            let outcome = self.typewriter.render_line(&line, is_marked_line(&line)).await;
            if outcome == RenderOutcome::Interrupted {
                return self.abandon_session(progress_handle).await;
            }
        }
        if !self.ctx.connectivity.is_online() {
            return self.abandon_session(progress_handle).await;
        }

        self.set_phase(ScanPhase::AwaitingServer);
        let request = AnalysisRequest {
            scan_type: kind.to_string(),
            user_config: user,
        };
        let response = match self.client.analyze(request).await {
            Ok(response) => response,
            Err(e) => return self.fail_session(e),
        };
        if !self.ctx.connectivity.is_online() {
            return self.abandon_session(progress_handle).await;
        }

        if response.maintenance {
            self.set_phase(ScanPhase::Maintenance);
            log::info!("Server reported a maintenance window, no cooldown set");
            surface.hide_view(ViewKind::Connecting);
            surface.show_view(ViewKind::Maintenance);
            surface.notify_cue(CueKind::Error);
            surface.set_triggers_enabled(self.ctx.has_user_config());
            return Err(ScanError::MaintenanceActive);
        }

        let outcome = match response.into_outcome() {
            Ok(outcome) => outcome,
            Err(e) => return self.fail_session(e),
        };
        self.set_phase(ScanPhase::Success);
        self.complete_session(outcome).await
    }

    async fn abandon_session(
        &self,
        progress_handle: JoinHandle<ProgressOutcome>,
    ) -> Result<ResultOutcome, ScanError> {
        // The driver observes the same flag and cancelled timers; it winds
        // down on its own within one step.
        let _ = progress_handle.await;
        self.ctx.surface.hide_view(ViewKind::Connecting);
        log::info!("Scan session abandoned after connectivity loss");
        Err(ScanError::ConnectivityLost)
    }

    fn fail_session(&self, err: ScanError) -> Result<ResultOutcome, ScanError> {
        self.set_phase(ScanPhase::Error);
        log::error!("Scan session failed: {}", err);
        let surface = &self.ctx.surface;
        surface.hide_view(ViewKind::Connecting);
        surface.show_view(ViewKind::Failure);
        surface.notify_cue(CueKind::Error);
        surface.set_triggers_enabled(self.ctx.has_user_config());
        Err(err)
    }

    async fn complete_session(&self, outcome: ResultOutcome) -> Result<ResultOutcome, ScanError> {
        let surface = &self.ctx.surface;
        surface.notify_cue(CueKind::Success);
        if self.typewriter.render_line(SUCCESS_LINE, false).await == RenderOutcome::Interrupted {
            surface.hide_view(ViewKind::Connecting);
            log::info!("Scan session abandoned after connectivity loss");
            return Err(ScanError::ConnectivityLost);
        }
        let _ = self
            .ctx
            .timers
            .sleep(Duration::from_millis(SUCCESS_SETTLE_MS))
            .await;

        surface.hide_view(ViewKind::Connecting);
        surface.show_view(ViewKind::Results);
        surface.display_outcome(&outcome);
        surface.notify_cue(tier_cue(outcome.tier));

        self.cooldown.activate(outcome.cooldown_deadline)?;

        let navigate_surface = Arc::clone(&self.ctx.surface);
        self.ctx
            .timers
            .schedule(Duration::from_millis(AUTO_NAVIGATE_MS), move || {
                navigate_surface.show_view(ViewKind::Referral);
            });

        log::info!(
            "Scan session succeeded: {}% ({:?})",
            outcome.percentage,
            outcome.tier
        );
        Ok(outcome)
    }
}
