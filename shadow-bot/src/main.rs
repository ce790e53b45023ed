mod events;
mod maintenance;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shadow_commands::CommandRegistry;
use shadow_core::{BotConfig, Data};
use shadow_database::Database;
use shadow_database::impls::command_logs::ensure_commands_registered;
use shadow_database::impls::settings::load_progression_settings;
use shadow_whatsapp::{BridgeClient, ReconnectPolicy, spawn_event_pump};

const EVENT_QUEUE_CAPACITY: usize = 256;
const REPORT_QUEUE_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env();
    init_tracing(&config.log_level);
    config.validate()?;

    info!(
        name = %config.name,
        version = %config.version,
        environment = %config.environment,
        features = ?config.enabled_features(),
        "starting shadow bot"
    );

    let db = Database::connect(&config.paths.db_path).await?;
    let db_info = db.info().await?;
    for table in &db_info.tables {
        info!(table = %table.name, records = table.records, "database table");
    }

    let progression = load_progression_settings(&db, config.progression).await?;
    info!(
        level_up_threshold = progression.level_up_threshold,
        max_warnings = progression.max_warnings,
        experience_per_command = progression.experience_per_command,
        diamonds_per_command = progression.diamonds_per_command,
        "progression settings loaded"
    );

    let registry = CommandRegistry::new();
    let inserted = ensure_commands_registered(&db, &registry.names()).await?;
    info!(commands = registry.len(), inserted, "command registry ready");

    let client = BridgeClient::new(&config.whatsapp.bridge_url, config.whatsapp.poll_timeout)?;
    let mut policy = ReconnectPolicy::new(
        config.whatsapp.reconnect_max_attempts,
        config.whatsapp.reconnect_delay,
    );

    let config = Arc::new(config);
    let data = Data::new(db, Arc::new(client.clone()), config.clone(), progression);

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let pump = spawn_event_pump(client, event_tx, std::convert::identity);

    // Background jobs only report back; the loop below applies their results.
    let (report_tx, mut report_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
    let jobs = maintenance::spawn_maintenance(data.clone(), report_tx);

    info!(bridge = %config.whatsapp.bridge_url, "shadow is entering the garden");

    let outcome = loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    warn!("event queue closed");
                    break Ok(());
                };
                if let Err(source) = events::handle_event(&registry, &data, &mut policy, event).await {
                    break Err(source);
                }
            }
            Some(report) = report_rx.recv() => {
                maintenance::record_report(&data, report).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break Ok(());
            }
        }
    };

    pump.abort();
    for job in jobs {
        job.abort();
    }

    outcome
}

fn init_tracing(log_level: &str) {
    let max_level = log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(move |metadata| {
        let target = metadata.target();

        if *metadata.level() > max_level {
            return false;
        }

        !(target.starts_with("sqlx::query")
            || target.starts_with("hyper")
            || target.starts_with("reqwest"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();
}
