//! Console implementation of the UI surface.
//!
//! Status lines rewrite themselves in place while they grow; the progress
//! bar and countdown go to stderr so they do not fight the typewriter for
//! the same terminal line. Audio cues degrade to a terminal bell for the
//! prominent ones and a debug log line otherwise.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use packscan_core::core_types::ResultOutcome;
use packscan_core::surface::{CueKind, UiSurface, ViewKind};

#[derive(Default)]
pub struct ConsoleSurface {
    triggers_enabled: AtomicBool,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggers_enabled(&self) -> bool {
        self.triggers_enabled.load(Ordering::SeqCst)
    }
}

impl UiSurface for ConsoleSurface {
    fn set_triggers_enabled(&self, enabled: bool) {
        self.triggers_enabled.store(enabled, Ordering::SeqCst);
        log::debug!("Scan triggers {}", if enabled { "enabled" } else { "disabled" });
    }

    fn render_line(&self, text: &str, marked: bool) {
        let mut stdout = std::io::stdout().lock();
        match text.strip_suffix('\n') {
            Some(done) => {
                let _ = writeln!(stdout, "\r{}  ", done);
            }
            None => {
                let _ = write!(stdout, "\r{}{}", text, if marked { " ." } else { "  " });
            }
        }
        let _ = stdout.flush();
    }

    fn render_progress(&self, percent: u8) {
        let mut stderr = std::io::stderr().lock();
        let filled = usize::from(percent) / 5;
        let _ = write!(stderr, "\r[{:<20}] {:>3}%", "=".repeat(filled), percent);
        if percent == 100 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }

    fn render_countdown(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        if text.is_empty() {
            let _ = writeln!(stderr, "\rCooldown finished, scans available again.");
        } else {
            let _ = write!(stderr, "\r[COOL DOWN] {} - Please wait   ", text);
        }
        let _ = stderr.flush();
    }

    fn show_view(&self, view: ViewKind) {
        match view {
            ViewKind::Connecting => println!("--- CONNECTING ---"),
            ViewKind::Results => println!("--- SCAN RESULT ---"),
            ViewKind::Maintenance => {
                println!("--- MAINTENANCE ---");
                println!("The analysis servers are under maintenance. Try again later.");
            }
            ViewKind::Failure => {
                println!("--- ERROR ---");
                println!("Server connection error.");
            }
            ViewKind::Offline => println!("--- NO CONNECTION ---"),
            ViewKind::Referral => println!("Join the community channel for more: t.me/packscan"),
            ViewKind::Setup | ViewKind::Main => {}
        }
    }

    fn hide_view(&self, view: ViewKind) {
        log::debug!("View hidden: {:?}", view);
    }

    fn notify_cue(&self, cue: CueKind) {
        match cue {
            CueKind::Success | CueKind::Error => {
                let mut stderr = std::io::stderr().lock();
                let _ = write!(stderr, "\x07");
                let _ = stderr.flush();
            }
            _ => {}
        }
        log::debug!("Audio cue: {:?}", cue);
    }

    fn display_outcome(&self, outcome: &ResultOutcome) {
        println!();
        println!("  Probability: {}%", outcome.percentage);
        println!("  {}", outcome.message);
        println!();
    }
}
