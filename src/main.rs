use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gravimon::config::{Config, Settings};
use gravimon::inspect::PlatformInspector;
use gravimon::monitor::{Monitor, MonitorEvent};
use gravimon::state::{QuotaStore, SnapshotView};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    let store = QuotaStore::shared(Duration::from_secs(settings.refresh_interval_secs));
    let inspector = Arc::new(PlatformInspector::new());
    let monitor = Monitor::new(&settings, store.clone(), inspector);

    if cli.once {
        monitor.refresh_now().await;
        render(&store.view());
        return Ok(());
    }

    // Prime the cache without waiting for the first tick
    monitor.manual_refresh();

    let mut events = monitor.start();
    while let Some(event) = events.recv().await {
        match event {
            MonitorEvent::Updated => render(&store.view()),
            MonitorEvent::Tick => render_countdown(&store.view()),
        }
    }

    Ok(())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gravimon=debug")
    } else {
        EnvFilter::new("gravimon=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn render(view: &SnapshotView) {
    if view.is_error {
        println!("no quota data (is Antigravity running?)");
        return;
    }

    for record in &view.records {
        let reset = record
            .reset_time
            .as_deref()
            .map(|t| format!("  resets {}", t))
            .unwrap_or_default();
        println!(
            "{:<30} {:>6.1}% remaining{}",
            record.label,
            record.remaining_percent(),
            reset
        );
    }
    render_countdown(view);
}

fn render_countdown(view: &SnapshotView) {
    if view.is_loading {
        println!("refreshing...");
    } else {
        println!("next refresh in {}s", view.countdown_seconds);
    }
}
