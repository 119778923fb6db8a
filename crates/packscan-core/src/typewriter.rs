//! Character-by-character line rendering with punctuation-aware pacing
//!
//! One [`AnimationSession`] exists per rendered line. The base delay is
//! drawn once per session, per-character delays are derived from it, and the
//! shared connectivity flag is polled before every character so a line stops
//! exactly where it was when the connection dropped. Lines render strictly
//! sequentially; the caller awaits each line before starting the next.

use std::sync::Arc;
use std::time::Duration;

use crate::context::ScanContext;
use crate::jitter::JitterSource;

/// Settle delay appended after a completed line.
const LINE_SETTLE_MS: u64 = 350;
/// Extra delay a newline character adds to its computed delay.
const NEWLINE_EXTRA_MS: u64 = 220;

/// How a line render ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Interrupted,
}

struct AnimationSession {
    chars: Vec<char>,
    cursor: usize,
    base_delay_ms: u64,
    cancelled: bool,
}

impl AnimationSession {
    fn new(text: &str, jitter: &dyn JitterSource) -> Self {
        Self {
            chars: text.chars().collect(),
            cursor: 0,
            base_delay_ms: 18 + jitter.jitter_ms(45),
            cancelled: false,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.cursor + 1).copied()
    }
}

fn char_delay_ms(base: u64, ch: char, next: Option<char>, jitter: &dyn JitterSource) -> u64 {
    let delay = if ch == '.' && next == Some('.') {
        base + 40
    } else if matches!(ch, '.' | '!' | '?') {
        base + 180
    } else if matches!(ch, ',' | ';' | ':') {
        base + 120
    } else if ch == ' ' {
        base + 10
    } else {
        base + jitter.jitter_ms(40)
    };
    if ch == '\n' {
        delay + NEWLINE_EXTRA_MS
    } else {
        delay
    }
}

pub struct TypewriterAnimator {
    ctx: Arc<ScanContext>,
}

impl TypewriterAnimator {
    pub fn new(ctx: Arc<ScanContext>) -> Self {
        Self { ctx }
    }

    /// Reveal `text` one character at a time through the UI surface.
    ///
    /// `marked` attaches the transient in-progress marker; it is removed on
    /// the final render whether the line completed or was interrupted. On
    /// connectivity loss the partial text stays visible and the call
    /// resolves without completing the line.
    pub async fn render_line(&self, text: &str, marked: bool) -> RenderOutcome {
        let mut session = AnimationSession::new(text, self.ctx.jitter.as_ref());
        let mut visible = String::with_capacity(text.len() + 1);

        while let Some(ch) = session.current() {
            if !self.ctx.connectivity.is_online() {
                session.cancelled = true;
                break;
            }

            visible.push(ch);
            self.ctx.surface.render_line(&visible, marked);

            let delay = char_delay_ms(
                session.base_delay_ms,
                ch,
                session.peek_next(),
                self.ctx.jitter.as_ref(),
            );
            if self
                .ctx
                .timers
                .sleep(Duration::from_millis(delay))
                .await
                .is_cancelled()
            {
                session.cursor += 1;
                session.cancelled = true;
                break;
            }
            session.cursor += 1;
        }

        if session.cancelled {
            log::debug!(
                "Line render interrupted at {}/{} characters",
                session.cursor,
                session.chars.len()
            );
            self.ctx.surface.render_line(&visible, false);
            return RenderOutcome::Interrupted;
        }

        visible.push('\n');
        self.ctx.surface.render_line(&visible, false);
        let _ = self
            .ctx
            .timers
            .sleep(Duration::from_millis(LINE_SETTLE_MS))
            .await;
        RenderOutcome::Completed
    }
}
