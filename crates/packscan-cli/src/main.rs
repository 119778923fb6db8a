use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use packscan_core::{
    ConfigLoader, ConnectivityMonitor, CooldownManager, FileCooldownStore, HttpAnalysisClient,
    ScanContext, ScanError, ScanKind, ScanOrchestrator, ThreadRngJitter, TimerRegistry, UiSurface,
    UserConfig,
};

mod console;
mod telemetry;

use console::ConsoleSurface;
use telemetry::Telemetry;

#[derive(Parser, Debug)]
#[clap(name = "packscan", author, version = "0.1.0", about = "Interactive pack scan simulator")]
struct Cli {
    /// Scan kind to run: epic, showtime or potw
    scan: String,

    #[clap(long, short, default_value = "packscan.yaml", help = "Configuration file path")]
    config: String,

    #[clap(long, help = "Analysis endpoint base URL, overrides the config file")]
    endpoint: Option<String>,

    #[clap(long, help = "Persisted state file path, overrides the config file")]
    state_file: Option<PathBuf>,

    #[clap(long, short, help = "Log level, overrides the config file")]
    log_level: Option<String>,

    #[clap(long, default_value = "Android", help = "Device type for the scan setup")]
    device: String,

    #[clap(long, default_value = "Europe", help = "Continent for the scan setup")]
    continent: String,
}

fn default_state_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("packscan")
        .join("state.json")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::from_file(&cli.config).await?;

    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    env_logger::Builder::new()
        .filter_level(log_level.parse().unwrap_or(LevelFilter::Info))
        .init();

    let kind: ScanKind = cli.scan.parse()?;
    let endpoint = cli.endpoint.unwrap_or_else(|| config.endpoint.clone());
    let state_path = cli
        .state_file
        .or(config.state_path)
        .unwrap_or_else(default_state_path);
    log::debug!("Using endpoint {} and state file {}", endpoint, state_path.display());

    let surface = Arc::new(ConsoleSurface::new());
    let surface_dyn: Arc<dyn UiSurface> = Arc::clone(&surface) as Arc<dyn UiSurface>;
    let timers = Arc::new(TimerRegistry::new());
    let connectivity = Arc::new(ConnectivityMonitor::new(
        Arc::clone(&timers),
        Arc::clone(&surface_dyn),
        true,
    ));
    let ctx = ScanContext::new(
        Arc::clone(&connectivity),
        timers,
        surface_dyn,
        Arc::new(ThreadRngJitter),
    );
    let store = Arc::new(FileCooldownStore::new(state_path));
    let cooldown = Arc::new(CooldownManager::new(Arc::clone(&ctx), store));
    let client = Arc::new(HttpAnalysisClient::new(endpoint));
    let orchestrator = ScanOrchestrator::new(Arc::clone(&ctx), client, Arc::clone(&cooldown));

    let telemetry = Arc::new(Telemetry::new(Arc::clone(&ctx)));
    telemetry.start();
    spawn_reconnect_watcher(
        Arc::clone(&connectivity),
        Arc::clone(&cooldown),
        Arc::clone(&telemetry),
    );

    orchestrator.confirm_setup(UserConfig {
        device_type: cli.device,
        continent: cli.continent,
    })?;

    // The setup re-check may have resumed a persisted cooldown, which keeps
    // the scan triggers disabled just like the front end's buttons.
    if !surface.triggers_enabled() {
        println!(
            "Scans are currently unavailable: {}s cooldown remaining.",
            cooldown.remaining()?
        );
        return Ok(());
    }

    match orchestrator.start_scan(kind).await {
        Ok(outcome) => {
            // Let the auto-navigation action and the first countdown ticks
            // land before exiting; the cooldown itself is persisted.
            tokio::time::sleep(Duration::from_millis(4_500)).await;
            log::info!(
                "Scan complete: {}% probability, cooldown persisted ({}s left)",
                outcome.percentage,
                cooldown.remaining()?
            );
            Ok(())
        }
        Err(ScanError::CooldownActive(secs)) => {
            println!("A cooldown from a previous scan is still active: {}s remaining.", secs);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn spawn_reconnect_watcher(
    connectivity: Arc<ConnectivityMonitor>,
    cooldown: Arc<CooldownManager>,
    telemetry: Arc<Telemetry>,
) {
    let mut status = connectivity.subscribe();
    // External signal source; lives outside the registry so it survives the
    // mass cancellation that an offline transition triggers.
    tokio::spawn(async move {
        let http = reqwest::Client::new();
        while status.changed().await.is_ok() {
            let online = *status.borrow();
            if online {
                if let Err(e) = cooldown.check_existing() {
                    log::warn!("Cooldown re-check after reconnect failed: {}", e);
                }
                telemetry.start();
            } else {
                loop {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    if telemetry::probe(&http).await {
                        connectivity.set_online(true);
                        break;
                    }
                }
            }
        }
    });
}
