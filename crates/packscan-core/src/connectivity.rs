//! Connectivity monitor driving offline/offline-recovery transitions
//!
//! The monitor is the single writer of the shared online flag. Everything
//! else polls the flag at its suspension points, so going offline needs no
//! preemption: the monitor cancels the timer registry, which wakes every
//! in-flight sleep, and each component observes the flag before doing any
//! further work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::surface::{CueKind, UiSurface, ViewKind};
use crate::timers::TimerRegistry;

pub struct ConnectivityMonitor {
    online: AtomicBool,
    timers: Arc<TimerRegistry>,
    surface: Arc<dyn UiSurface>,
    status_tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Starts in the given state without emitting transition effects.
    pub fn new(timers: Arc<TimerRegistry>, surface: Arc<dyn UiSurface>, online: bool) -> Self {
        let (status_tx, _) = watch::channel(online);
        Self {
            online: AtomicBool::new(online),
            timers,
            surface,
            status_tx,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Observe status transitions. The embedding front end uses this to
    /// re-arm its background polling after a reconnect.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.status_tx.subscribe()
    }

    /// Feed an external connectivity signal. Repeated signals for the
    /// current state are ignored.
    pub fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }
        if online {
            self.handle_online();
        } else {
            self.handle_offline();
        }
        let _ = self.status_tx.send(online);
    }

    fn handle_offline(&self) {
        log::warn!("Connectivity lost, cancelling all scheduled work");
        self.surface.notify_cue(CueKind::Error);
        self.timers.cancel_all();
        self.surface.show_view(ViewKind::Offline);
        self.surface.hide_view(ViewKind::Main);
    }

    fn handle_online(&self) {
        log::info!("Connectivity restored");
        self.surface.notify_cue(CueKind::Startup);
        self.surface.hide_view(ViewKind::Offline);
        self.surface.show_view(ViewKind::Main);
    }
}
