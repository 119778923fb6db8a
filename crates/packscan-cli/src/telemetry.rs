//! Decorative background telemetry.
//!
//! Clock, ping probe and drifting visitor counters, all scheduled through
//! the timer registry so a connectivity drop stops them with everything
//! else. `start` is called once at startup and again after every reconnect.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use packscan_core::context::ScanContext;

const PROBE_URL: &str = "https://www.google.com/favicon.ico";
/// Consecutive probe failures before the connection counts as lost.
const OFFLINE_THRESHOLD: u32 = 2;

/// Probe the network once. Used both by the periodic ping task and by the
/// reconnect loop in main.
pub async fn probe(http: &reqwest::Client) -> bool {
    http.head(PROBE_URL).send().await.is_ok()
}

pub struct Telemetry {
    ctx: Arc<ScanContext>,
    http: reqwest::Client,
    online_users: Arc<AtomicI64>,
    new_today: Arc<AtomicI64>,
}

impl Telemetry {
    pub fn new(ctx: Arc<ScanContext>) -> Self {
        let mut rng = rand::rng();
        Self {
            ctx,
            http: reqwest::Client::new(),
            online_users: Arc::new(AtomicI64::new(1900 + rng.random_range(0..151))),
            new_today: Arc::new(AtomicI64::new(200 + rng.random_range(0..101))),
        }
    }

    /// Register the background loops with the timer registry. Previous
    /// loops are assumed gone (a reconnect implies a prior `cancel_all`).
    pub fn start(&self) {
        self.start_clock();
        self.start_ping();
        self.start_counters();
        log::debug!("Background telemetry armed");
    }

    fn start_clock(&self) {
        self.ctx
            .timers
            .schedule_repeating(Duration::from_secs(1), || {
                log::trace!("server time {}", chrono::Local::now().format("%H:%M:%S"));
                ControlFlow::Continue(())
            });
    }

    fn start_ping(&self) {
        let connectivity = Arc::clone(&self.ctx.connectivity);
        let http = self.http.clone();
        let failures = Arc::new(AtomicU32::new(0));
        self.ctx
            .timers
            .schedule_repeating(Duration::from_secs(2), move || {
                let connectivity = Arc::clone(&connectivity);
                let http = http.clone();
                let failures = Arc::clone(&failures);
                tokio::spawn(async move {
                    let started = std::time::Instant::now();
                    if probe(&http).await {
                        failures.store(0, Ordering::SeqCst);
                        let ping = (started.elapsed().as_millis() as u64).min(150);
                        log::debug!("ping {}ms", ping);
                    } else {
                        let failed = failures.fetch_add(1, Ordering::SeqCst) + 1;
                        log::debug!("ping probe failed ({} consecutive)", failed);
                        if failed >= OFFLINE_THRESHOLD {
                            connectivity.set_online(false);
                        }
                    }
                });
                ControlFlow::Continue(())
            });
    }

    fn start_counters(&self) {
        let mut rng = rand::rng();

        let users = Arc::clone(&self.online_users);
        let users_interval = Duration::from_millis(5_000 + rng.random_range(0..5_000));
        self.ctx.timers.schedule_repeating(users_interval, move || {
            let mut rng = rand::rng();
            let delta: i64 = rng.random_range(1..6);
            let delta = if rng.random_bool(0.5) { delta } else { -delta };
            let previous = users
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                    Some((v + delta).clamp(1900, 2100))
                })
                .unwrap_or_default();
            log::debug!("online users: {}", (previous + delta).clamp(1900, 2100));
            ControlFlow::Continue(())
        });

        let new_today = Arc::clone(&self.new_today);
        let today_interval = Duration::from_millis(30_000 + rng.random_range(0..30_000));
        self.ctx.timers.schedule_repeating(today_interval, move || {
            let delta = if rand::rng().random_bool(0.5) { 2 } else { 1 };
            let value = new_today.fetch_add(delta, Ordering::SeqCst) + delta;
            log::debug!("new today: +{}", value);
            ControlFlow::Continue(())
        });
    }
}
