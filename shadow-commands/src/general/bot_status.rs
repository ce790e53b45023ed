use shadow_core::{BoxFuture, CommandContext, Error, MaintenanceStatus};
use shadow_database::model::users::Role;
use shadow_utils::formatting::{format_uptime, megabytes};
use shadow_utils::housekeeping::resident_memory_bytes;
use shadow_utils::time::format_unix_date;

use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "حالة_البوت",
    desc: "حالة شادو في الظل",
    category: "developer",
    usage: ".حالة_البوت",
    required_role: Role::Developer,
};

pub fn command() -> Command {
    Command {
        meta: &META,
        handler,
    }
}

fn handler(ctx: CommandContext<'_>) -> BoxFuture<'_, Result<(), Error>> {
    Box::pin(run(ctx))
}

async fn run(ctx: CommandContext<'_>) -> Result<(), Error> {
    let config = ctx.config();
    let database = if ctx.db().health_check().await {
        "سليمة"
    } else {
        "غير متاحة"
    };
    let memory = resident_memory_bytes()
        .map(|bytes| format!("{} MB", megabytes(bytes)))
        .unwrap_or_else(|| "غير متاح".to_owned());
    let maintenance = ctx.data.maintenance.read().await.clone();
    let features = config.enabled_features();

    let text = format!(
        "╭─────────────────────────\n\
         │ 🌑 *حالة {bot} في الظل*\n\
         ├─────────────────────────\n\
         │ 🟢 *الحالة:* متصل بحديقة الظل\n\
         │ ⏱️ *وقت في الظل:* {uptime}\n\
         │ 💾 *ذاكرة الظل:* {memory}\n\
         │ 🗄️ *قاعدة البيانات:* {database}\n\
         │ 🚦 *حدود المعدل النشطة:* {buckets}\n\
         │ 🔢 *معرف الظل:* {pid}\n\
         │ 🏷️ *إصدار شادو:* {version} ({environment})\n\
         │ ⚙️ *الميزات:* {features}\n\
         ├─────────────────────────\n\
         {maintenance}\n\
         ╰─────────────────────────",
        bot = config.name,
        uptime = format_uptime(ctx.data.uptime_secs()),
        buckets = ctx.db().cache().len(),
        pid = std::process::id(),
        version = config.version,
        environment = config.environment,
        features = if features.is_empty() {
            "-".to_owned()
        } else {
            features.join(", ")
        },
        maintenance = maintenance_lines(&maintenance),
    );

    ctx.reply(text).await
}

fn maintenance_lines(status: &MaintenanceStatus) -> String {
    let backup = match (&status.last_backup, &status.last_backup_error) {
        (_, Some(error)) => format!("│ 💾 *آخر نسخة احتياطية:* فشلت ({error})"),
        (Some(backup), None) => format!(
            "│ 💾 *آخر نسخة احتياطية:* {} ({} ملفات)",
            format_unix_date(backup.finished_at),
            backup.files.len()
        ),
        (None, None) => "│ 💾 *آخر نسخة احتياطية:* لم تتم بعد".to_owned(),
    };

    let memory = match &status.last_memory_check {
        Some(check) => format!(
            "│ 🧹 *آخر فحص للذاكرة:* {} (حذف {} ملفات)",
            format_unix_date(check.checked_at),
            check.removed_files
        ),
        None => "│ 🧹 *آخر فحص للذاكرة:* لم يتم بعد".to_owned(),
    };

    format!("{backup}\n{memory}")
}
