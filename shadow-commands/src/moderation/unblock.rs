use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::rate_limit::reset_user_limits;
use shadow_database::impls::users::unblock_user;
use shadow_database::model::users::Role;

use crate::moderation::{reply_refusal, target_identity};
use crate::replies::usage_message;
use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "الغاء_حظر",
    desc: "إعادة مستخدم لحديقة الظل",
    category: "developer",
    usage: ".الغاء_حظر 1234567890",
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
    let Some(target) = target_identity(ctx.args) else {
        ctx.reply(usage_message(
            "حدد هوية من تريد إعادته لحديقة الظل",
            META.usage,
        ))
        .await?;
        return Ok(());
    };

    match unblock_user(ctx.db(), ctx.user, &target).await {
        Ok(restored) => {
            reset_user_limits(ctx.db(), &target);
            ctx.reply(format!(
                "✅ تم إعادة المستخدم لحديقة الظل\n👤 العائد: {}",
                restored.display_label()
            ))
            .await
        }
        Err(error) => reply_refusal(&ctx, "فشل في إعادة المستخدم للظل", error).await,
    }
}
