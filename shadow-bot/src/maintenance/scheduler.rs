use std::time::Duration;

use shadow_core::Data;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::maintenance::MaintenanceReport;
use crate::maintenance::backup::create_backup;
use crate::maintenance::memory::check_memory;

/// Start the periodic jobs enabled in the configuration. Each waits one full
/// interval before its first run.
pub fn spawn_maintenance(data: Data, reports: mpsc::Sender<MaintenanceReport>) -> Vec<JoinHandle<()>> {
    let mut jobs = Vec::new();

    if data.config.backup.enabled {
        let period = data.config.backup.interval;
        info!(interval_secs = period.as_secs(), keep = data.config.backup.max_files, "scheduled backups enabled");
        jobs.push(spawn_backup_job(data.clone(), period, reports.clone()));
    } else {
        info!("scheduled backups disabled (set BACKUP_ENABLED=true to enable)");
    }

    let period = data.config.memory.check_interval;
    info!(interval_secs = period.as_secs(), "memory checks enabled");
    jobs.push(spawn_memory_job(data, period, reports));

    jobs
}

fn spawn_backup_job(
    data: Data,
    period: Duration,
    reports: mpsc::Sender<MaintenanceReport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let result = create_backup(&data).await.map_err(|source| format!("{source:#}"));
            if reports.send(MaintenanceReport::Backup(result)).await.is_err() {
                debug!("maintenance receiver dropped; stopping backup job");
                return;
            }
        }
    })
}

fn spawn_memory_job(
    data: Data,
    period: Duration,
    reports: mpsc::Sender<MaintenanceReport>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let summary = check_memory(&data).await;
            if reports.send(MaintenanceReport::Memory(summary)).await.is_err() {
                debug!("maintenance receiver dropped; stopping memory job");
                return;
            }
        }
    })
}
