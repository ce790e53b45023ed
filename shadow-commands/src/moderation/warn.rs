use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::users::warn_user;
use shadow_database::model::users::Role;
use shadow_utils::parse::join_reason;

use crate::moderation::{reply_refusal, target_identity};
use crate::replies::usage_message;
use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "تحذير",
    desc: "تحذير مستخدم في حديقة الظل",
    category: "admin",
    usage: ".تحذير 1234567890 [السبب]",
    required_role: Role::Admin,
};

const DEFAULT_REASON: &str = "مخالفة قوانين الظل";

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
    let Some(target) = target_identity(ctx.args) else {
        ctx.reply(usage_message("حدد هوية من تريد تحذيره في الظل", META.usage))
            .await?;
        return Ok(());
    };
    let reason = join_reason(&ctx.args[1..], DEFAULT_REASON);
    let max_warnings = ctx.data.progression.max_warnings;

    let result = match warn_user(ctx.db(), ctx.user, &target, &reason, max_warnings).await {
        Ok(result) => result,
        Err(error) => return reply_refusal(&ctx, "فشل في تحذير المستخدم", error).await,
    };

    if result.outcome.ignored {
        ctx.reply(format!(
            "🌑 {} منفي من الظل بالفعل، لم يتم احتساب التحذير",
            result.user.display_label()
        ))
        .await?;
        return Ok(());
    }

    let mut text = format!(
        "⚠️ تم تحذير المستخدم في حديقة الظل\n👤 المحذر: {}\n📝 السبب: {reason}\n🔢 التحذيرات: {}/{max_warnings}",
        result.user.display_label(),
        result.outcome.warnings,
    );
    if result.outcome.auto_blocked {
        text.push_str("\n🚫 تم نفي المستخدم من الظل لتجاوز الحد الأقصى للتحذيرات");
    }

    ctx.reply(text).await
}
