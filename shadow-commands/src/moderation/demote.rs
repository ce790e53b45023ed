use shadow_core::{BoxFuture, CommandContext, Error};
use shadow_database::impls::users::demote_from_admin;
use shadow_database::model::users::Role;

use crate::moderation::{reply_refusal, target_identity};
use crate::replies::usage_message;
use crate::{Command, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "تنزيل",
    desc: "إزالة صلاحيات حارس الظل",
    category: "developer",
    usage: ".تنزيل 1234567890",
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
        ctx.reply(usage_message("حدد هوية الحارس الذي تريد تنزيله", META.usage))
            .await?;
        return Ok(());
    };

    match demote_from_admin(ctx.db(), ctx.user, &target).await {
        Ok(demoted) => {
            ctx.reply(format!(
                "✅ تم إزالة صلاحيات الحارس عن {}",
                demoted.display_label()
            ))
            .await
        }
        Err(error) => reply_refusal(&ctx, "فشل في تنزيل المشرف", error).await,
    }
}
