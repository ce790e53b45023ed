/// Format seconds as an Arabic uptime string (e.g. "1 يوم, 2 ساعة, 5 دقيقة").
pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{} يوم", days));
    }
    if hours > 0 {
        parts.push(format!("{} ساعة", hours));
    }
    if minutes > 0 {
        parts.push(format!("{} دقيقة", minutes));
    }
    if seconds > 0 {
        parts.push(format!("{} ثانية", seconds));
    }

    if parts.is_empty() {
        "0 ثانية".to_owned()
    } else {
        parts.join(", ")
    }
}

/// Round a retry delay up to the coarsest whole unit (seconds, minutes, hours).
pub fn format_time_remaining(total_seconds: u64) -> String {
    if total_seconds < 60 {
        format!("{} ثانية", total_seconds)
    } else if total_seconds < 3_600 {
        format!("{} دقيقة", total_seconds.div_ceil(60))
    } else {
        format!("{} ساعة", total_seconds.div_ceil(3_600))
    }
}

/// Render a fixed-width progress bar for `current` out of `required`.
pub fn progress_bar(current: u64, required: u64, width: usize) -> String {
    let filled = if required == 0 {
        width
    } else {
        let ratio = current.min(required) as f64 / required as f64;
        ((ratio * width as f64).floor() as usize).min(width)
    };

    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Whole megabytes, rounded to nearest.
pub fn megabytes(bytes: u64) -> u64 {
    (bytes + 512 * 1024) / (1024 * 1024)
}
