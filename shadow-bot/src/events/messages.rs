use shadow_commands::{CommandRegistry, dispatch};
use shadow_core::{Data, Error};
use shadow_database::impls::groups::upsert_group;
use shadow_database::impls::rate_limit::check_message_limit;
use shadow_database::impls::users::get_or_create_user;
use shadow_database::model::users::ProfileHints;
use shadow_whatsapp::{InboundMessage, RawMessage, extract_message_info};
use tracing::{debug, error, info};

/// Handle one inbound message end to end. Failures are logged and dropped so
/// the next message is processed normally.
pub async fn handle_message(registry: &CommandRegistry, data: &Data, raw: &RawMessage) {
    let Some(message) = extract_message_info(raw) else {
        return;
    };

    let limit = check_message_limit(&data.db, &data.config.rate_limits, &message.sender);
    if !limit.allowed {
        return;
    }

    if let Err(source) = process_message(registry, data, &message).await {
        error!(?source, user = %message.sender, chat = %message.chat, "failed to handle message");
    }
}

async fn process_message(
    registry: &CommandRegistry,
    data: &Data,
    message: &InboundMessage,
) -> Result<(), Error> {
    let hints = ProfileHints {
        display_name: message.push_name.clone(),
        username: message.username.clone(),
    };
    let role_hint = data.config.role_hint(&message.sender);
    let user = get_or_create_user(&data.db, &message.sender, &hints, role_hint).await?;

    if let Some(block) = &user.block {
        info!(user = %user.identity, name = %user.display_label(), reason = %block.reason, "message from blocked user ignored");
        return Ok(());
    }

    if let Some(group) = &message.group {
        upsert_group(&data.db, group).await?;
    }

    let outcome = dispatch(registry, data, message, &user).await?;
    debug!(user = %user.identity, ?outcome, "message handled");
    Ok(())
}
