//! Test doubles shared by the unit and integration tests.

use std::sync::Mutex;

use crate::core_types::ResultOutcome;
use crate::surface::{CueKind, UiSurface, ViewKind};

mod mock_analysis_server;
pub use mock_analysis_server::MockAnalysisServer;

type RenderHook = Box<dyn Fn(usize, &str) + Send>;

/// UI surface that records every call instead of rendering, so orchestration
/// can be asserted headlessly. The optional render hook runs after each
/// `render_line` call and is how tests inject mid-animation events such as a
/// simulated connectivity drop.
#[derive(Default)]
pub struct RecordingSurface {
    lines: Mutex<Vec<(String, bool)>>,
    progress: Mutex<Vec<u8>>,
    countdowns: Mutex<Vec<String>>,
    cues: Mutex<Vec<CueKind>>,
    shown: Mutex<Vec<ViewKind>>,
    hidden: Mutex<Vec<ViewKind>>,
    triggers: Mutex<Vec<bool>>,
    outcomes: Mutex<Vec<ResultOutcome>>,
    render_hook: Mutex<Option<RenderHook>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a hook called with the running `render_line` call count
    /// (1-based, including the current call) and the rendered text.
    pub fn set_render_hook<F>(&self, hook: F)
    where
        F: Fn(usize, &str) + Send + 'static,
    {
        *self.render_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn lines(&self) -> Vec<(String, bool)> {
        self.lines.lock().unwrap().clone()
    }

    /// Texts of lines that rendered to completion.
    pub fn completed_lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(text, _)| text.ends_with('\n'))
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().unwrap().clone()
    }

    pub fn countdowns(&self) -> Vec<String> {
        self.countdowns.lock().unwrap().clone()
    }

    pub fn cues(&self) -> Vec<CueKind> {
        self.cues.lock().unwrap().clone()
    }

    pub fn shown(&self) -> Vec<ViewKind> {
        self.shown.lock().unwrap().clone()
    }

    pub fn hidden(&self) -> Vec<ViewKind> {
        self.hidden.lock().unwrap().clone()
    }

    /// Last trigger state set, if any.
    pub fn triggers_enabled(&self) -> Option<bool> {
        self.triggers.lock().unwrap().last().copied()
    }

    pub fn outcomes(&self) -> Vec<ResultOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl UiSurface for RecordingSurface {
    fn set_triggers_enabled(&self, enabled: bool) {
        self.triggers.lock().unwrap().push(enabled);
    }

    fn render_line(&self, text: &str, marked: bool) {
        let count = {
            let mut lines = self.lines.lock().unwrap();
            lines.push((text.to_string(), marked));
            lines.len()
        };
        let hook = self.render_hook.lock().unwrap();
        if let Some(hook) = hook.as_ref() {
            hook(count, text);
        }
    }

    fn render_progress(&self, percent: u8) {
        self.progress.lock().unwrap().push(percent);
    }

    fn render_countdown(&self, text: &str) {
        self.countdowns.lock().unwrap().push(text.to_string());
    }

    fn show_view(&self, view: ViewKind) {
        self.shown.lock().unwrap().push(view);
    }

    fn hide_view(&self, view: ViewKind) {
        self.hidden.lock().unwrap().push(view);
    }

    fn notify_cue(&self, cue: CueKind) {
        self.cues.lock().unwrap().push(cue);
    }

    fn display_outcome(&self, outcome: &ResultOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}
