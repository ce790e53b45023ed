use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::rate_limit::user_limit_status;
use shadow_database::model::users::Role;
use shadow_utils::formatting::progress_bar;
use shadow_utils::time::{days_between, format_unix_date, now_unix_secs};

use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "معلوماتي",
    desc: "اكتشف قوتك في الظل",
    category: "general",
    usage: ".معلوماتي",
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
    let user = ctx.user;
    let settings = &ctx.data.progression;
    let progress = user.level_progress(settings.level_up_threshold);
    let joined_days = days_between(user.registered_at, now_unix_secs());
    let limits = user_limit_status(ctx.db(), &ctx.config().rate_limits, &user.identity);

    let text = format!(
        "╭─────────────────────────\n\
         │ 🌑 *ملف الظل الشخصي*\n\
         ├─────────────────────────\n\
         │ 📝 *الاسم:* {name}\n\
         │ 🆔 *هوية الظل:* @{identity}\n\
         │ 👑 *رتبة الظل:* {role}\n\
         │ 🏆 *مستوى الظل:* {level}\n\
         │ 🌟 *قوة الظل:* {experience}\n\
         │ 💎 *جواهر الظل:* {diamonds}\n\
         │ ⚠️ *تحذيرات الظل:* {warnings}/{max_warnings}\n\
         │ 📊 *أوامر الظل المستخدمة:* {commands}\n\
         │ 🚦 *أوامر متبقية الآن:* {limit_remaining}/{limit_max}\n\
         │ 📅 *دخول حديقة الظل:* {joined}\n\
         │ 🗓️ *أيام في الظل:* {joined_days} يوم\n\
         ├─────────────────────────\n\
         │ 📈 *تقدم قوة الظل:*\n\
         │ ▓{bar}▓\n\
         │ {current}/{required} ({remaining} متبقي)\n\
         ╰─────────────────────────",
        name = user.display_label(),
        identity = ctx.message.sender,
        role = user.role.title(),
        level = user.level,
        experience = user.experience,
        diamonds = user.diamonds,
        warnings = user.warnings,
        max_warnings = settings.max_warnings,
        commands = user.total_commands_used,
        limit_remaining = limits.commands.remaining,
        limit_max = ctx.config().rate_limits.command.max_hits,
        joined = format_unix_date(user.registered_at),
        bar = progress_bar(progress.current, progress.required, 10),
        current = progress.current,
        required = progress.required,
        remaining = progress.remaining,
    );

    ctx.reply_mentioning_sender(text).await
}
