//! Background housekeeping. Jobs run on their own tasks and report back over a
//! channel; the main loop records the outcome in `Data::maintenance`.

pub mod backup;
pub mod memory;
mod scheduler;

use shadow_core::{BackupSummary, Data, MemorySummary};
use tracing::{debug, error, info, warn};

pub use scheduler::spawn_maintenance;

#[derive(Debug)]
pub enum MaintenanceReport {
    Backup(Result<BackupSummary, String>),
    Memory(MemorySummary),
}

pub async fn record_report(data: &Data, report: MaintenanceReport) {
    let mut status = data.maintenance.write().await;

    match report {
        MaintenanceReport::Backup(Ok(summary)) => {
            info!(files = ?summary.files, pruned = summary.pruned, "backup completed");
            status.last_backup = Some(summary);
            status.last_backup_error = None;
        }
        MaintenanceReport::Backup(Err(message)) => {
            error!(error = %message, "backup failed");
            status.last_backup_error = Some(message);
        }
        MaintenanceReport::Memory(summary) => {
            if summary.over_threshold {
                warn!(
                    resident_bytes = ?summary.resident_bytes,
                    removed_files = summary.removed_files,
                    purged_limits = summary.purged_limits,
                    "memory above threshold; cleaned up"
                );
            } else {
                debug!(resident_bytes = ?summary.resident_bytes, "memory check passed");
            }
            status.last_memory_check = Some(summary);
        }
    }
}
