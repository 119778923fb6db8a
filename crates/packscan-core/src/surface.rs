//! Abstract UI surface consumed by the engine
//!
//! The engine never renders anything itself. Every visible effect goes
//! through [`UiSurface`], which a front end implements concretely (terminal,
//! DOM, test recorder). This keeps the orchestrator headless: the tests run
//! full sessions against a recording double.

use crate::core_types::ResultOutcome;

/// Modal-style views the front end can show or hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Device/continent selection.
    Setup,
    /// The main trigger screen.
    Main,
    /// Console log plus progress bar of an active session.
    Connecting,
    /// Outcome display after a successful session.
    Results,
    /// Server-declared maintenance indication.
    Maintenance,
    /// Generic failure indication.
    Failure,
    /// Full-screen offline indication.
    Offline,
    /// Post-result referral destination.
    Referral,
}

/// Audio cue kinds, one per sound effect of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    Tick,
    Pop,
    Connect,
    Success,
    Error,
    Startup,
}

/// Rendering operations the engine invokes. Implementations must be cheap
/// and non-blocking; they are called from inside timing loops.
pub trait UiSurface: Send + Sync {
    /// Enable or disable every scan trigger at once.
    fn set_triggers_enabled(&self, enabled: bool);

    /// Render the current state of the active console line. Called with a
    /// growing prefix while a line is being revealed; `marked` carries the
    /// transient in-progress marker and is always false on the final call
    /// for a line.
    fn render_line(&self, text: &str, marked: bool);

    /// Render the progress counter, 0 to 100.
    fn render_progress(&self, percent: u8);

    /// Render the cooldown countdown, formatted `m:ss`. An empty string
    /// clears the countdown display.
    fn render_countdown(&self, text: &str);

    fn show_view(&self, view: ViewKind);

    fn hide_view(&self, view: ViewKind);

    /// Emit an audio cue. Consumed externally, never awaited.
    fn notify_cue(&self, cue: CueKind);

    /// Hand a terminal outcome over for display alongside the cooldown.
    fn display_outcome(&self, outcome: &ResultOutcome);
}
