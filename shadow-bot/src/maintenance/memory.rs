use std::time::Duration;

use shadow_core::config::PathsConfig;
use shadow_core::{Data, MemorySummary};
use shadow_database::impls::rate_limit::purge_expired_limits;
use shadow_utils::housekeeping::{remove_files_older_than, resident_memory_bytes};
use shadow_utils::time::now_unix_secs;
use tracing::info;

const HOUR: u64 = 60 * 60;
const TEMP_MAX_AGE: Duration = Duration::from_secs(24 * HOUR);
const SESSION_MAX_AGE: Duration = Duration::from_secs(7 * 24 * HOUR);
const LOG_MAX_AGE: Duration = Duration::from_secs(30 * 24 * HOUR);

/// Session files the WhatsApp login cannot be restored without.
const PROTECTED_SESSION_FILES: &[&str] = &["creds.json", "keys.json"];

pub async fn check_memory(data: &Data) -> MemorySummary {
    check_memory_with(data, resident_memory_bytes()).await
}

/// Compare `resident_bytes` with the configured threshold and clean up when it
/// is exceeded.
pub async fn check_memory_with(data: &Data, resident_bytes: Option<u64>) -> MemorySummary {
    let threshold = data.config.memory.threshold_bytes;
    let over_threshold = resident_bytes.is_some_and(|bytes| bytes > threshold);

    let mut summary = MemorySummary {
        checked_at: now_unix_secs(),
        resident_bytes,
        over_threshold,
        ..Default::default()
    };
    if !over_threshold {
        return summary;
    }

    info!(resident_bytes = ?resident_bytes, threshold, "memory above threshold; cleaning up");
    summary.removed_files = clean_aged_files(&data.config.paths).await;
    // Stands in for a GC pass.
    summary.purged_limits = purge_expired_limits(&data.db);
    summary
}

/// Delete aged temp, session and log files. Returns how many were removed.
pub async fn clean_aged_files(paths: &PathsConfig) -> usize {
    let temp = remove_files_older_than(&paths.temp_dir, TEMP_MAX_AGE, &[]).await;
    let session =
        remove_files_older_than(&paths.session_dir, SESSION_MAX_AGE, PROTECTED_SESSION_FILES).await;
    let logs = remove_files_older_than(&paths.logs_dir, LOG_MAX_AGE, &[]).await;

    if temp + session + logs > 0 {
        info!(temp, session, logs, "removed aged files");
    }
    temp + session + logs
}
