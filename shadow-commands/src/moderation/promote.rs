use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::users::promote_to_admin;
use shadow_database::model::users::Role;

use crate::moderation::{reply_refusal, target_identity};
use crate::replies::usage_message;
use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "ترقية",
    desc: "ترقية مستخدم إلى حارس للظل",
    category: "developer",
    usage: ".ترقية 1234567890",
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
        ctx.reply(usage_message("حدد هوية من تريد ترقيته في الظل", META.usage))
            .await?;
        return Ok(());
    };

    match promote_to_admin(ctx.db(), ctx.user, &target).await {
        Ok(promoted) => {
            ctx.reply(format!(
                "👑 أصبح {} حارساً للظل",
                promoted.display_label()
            ))
            .await
        }
        Err(error) => reply_refusal(&ctx, "فشل في ترقية المستخدم", error).await,
    }
}
