use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::stats::general_stats;
use shadow_database::impls::users::top_users_by_level;
use shadow_database::model::users::Role;
use shadow_utils::formatting::{format_uptime, megabytes};
use shadow_utils::housekeeping::resident_memory_bytes;
use shadow_utils::time::now_unix_secs;

use crate::{Command, CommandMeta};

const LEADERBOARD_SIZE: u32 = 3;
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

pub const META: CommandMeta = CommandMeta {
    name: "الاحصائيات",
    desc: "إحصائيات حديقة الظل",
    category: "general",
    usage: ".الاحصائيات",
    required_role: Role::User,
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
    let stats = general_stats(ctx.db(), now_unix_secs()).await?;
    let leaders = top_users_by_level(ctx.db(), LEADERBOARD_SIZE).await?;
    let leaderboard = if leaders.is_empty() {
        "│ لا يوجد سكان في الظل بعد".to_owned()
    } else {
        leaders
            .iter()
            .zip(MEDALS)
            .map(|(user, medal)| {
                format!(
                    "│ {medal} {} (مستوى {})",
                    user.display_label(),
                    user.level
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let memory = resident_memory_bytes()
        .map(|bytes| format!("{} MB", megabytes(bytes)))
        .unwrap_or_else(|| "غير متاح".to_owned());

    let text = format!(
        "╭─────────────────────────\n\
         │ 🌑 *إحصائيات حديقة الظل*\n\
         ├─────────────────────────\n\
         │ 👥 *سكان الظل:* {total}\n\
         │ 👑 *حراس الظل:* {admins}\n\
         │ 🔧 *أسياد الظل:* {developers}\n\
         │ 🚫 *المنفيون من الظل:* {blocked}\n\
         │ 🟢 *النشطون هذا الأسبوع:* {active}\n\
         │ 🏘️ *مجموعات الظل:* {groups}\n\
         │ 📈 *متوسط قوة الظل:* {average}\n\
         │ 🏆 *أعلى مستوى ظل:* {max_level}\n\
         │ ⚡ *أوامر الظل المستخدمة:* {usage}\n\
         │ 📆 *أوامر اليوم:* {today}\n\
         ├─────────────────────────\n\
         │ 🏅 *أقوى سكان الظل:*\n\
         {leaderboard}\n\
         ├─────────────────────────\n\
         │ 🌑 *معلومات {bot}:*\n\
         │ ⏱️ *وقت في الظل:* {uptime}\n\
         │ 💾 *ذاكرة الظل:* {memory}\n\
         │ 🔢 *إصدار الظل:* {version}\n\
         ╰─────────────────────────",
        total = stats.total_users,
        admins = stats.admin_users,
        developers = stats.developer_users,
        blocked = stats.blocked_users,
        active = stats.active_users,
        groups = stats.total_groups,
        average = stats.average_experience.round(),
        max_level = stats.max_level,
        usage = stats.total_command_usage,
        today = stats.commands_today,
        bot = ctx.config().name,
        uptime = format_uptime(ctx.data.uptime_secs()),
        version = ctx.config().version,
    );

    ctx.reply(text).await
}
