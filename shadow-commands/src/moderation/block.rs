use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::users::block_user;
use shadow_database::model::users::Role;
use shadow_utils::parse::join_reason;

use crate::moderation::{reply_refusal, target_identity};
use crate::replies::usage_message;
use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "حظر",
    desc: "نفي مستخدم من حديقة الظل",
    category: "developer",
    usage: ".حظر 1234567890 [السبب]",
    required_role: Role::Developer,
};

const DEFAULT_REASON: &str = "نفي من حديقة الظل";

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
        ctx.reply(usage_message("حدد هوية من تريد نفيه من الظل", META.usage))
            .await?;
        return Ok(());
    };
    let reason = join_reason(&ctx.args[1..], DEFAULT_REASON);

    match block_user(ctx.db(), ctx.user, &target, &reason).await {
        Ok(blocked) => {
            ctx.reply(format!(
                "✅ تم نفي المستخدم من حديقة الظل\n👤 المنفي: {}\n📝 السبب: {reason}",
                blocked.display_label()
            ))
            .await
        }
        Err(error) => reply_refusal(&ctx, "فشل في نفي المستخدم من الظل", error).await,
    }
}
