pub mod block;
pub mod demote;
pub mod promote;
pub mod unblock;
pub mod warn;

use shadow_core::{CommandContext, Error};
use shadow_database::model::users::ModerationError;
use shadow_utils::parse::normalize_phone_number;

/// Digits of the first argument, the target's bare identity.
pub(crate) fn target_identity(args: &[String]) -> Option<String> {
    args.first().and_then(|raw| normalize_phone_number(raw))
}

/// Reply with a moderation refusal; any other error is handed back to the router.
pub(crate) async fn reply_refusal(
    ctx: &CommandContext<'_>,
    failure: &str,
    error: Error,
) -> Result<(), Error> {
    match error.downcast_ref::<ModerationError>() {
        Some(refusal) => ctx.reply(format!("❌ {failure}: {refusal}")).await,
        None => Err(error),
    }
}
