use shadow_core::Data;
use shadow_utils::DISPLAY_PREFIX;
use shadow_whatsapp::ParticipantAction;
use shadow_whatsapp::jid::local_part;
use tracing::{debug, error};

fn welcome_text(participant: &str) -> String {
    format!(
        "🌑 *مرحباً بك في حديقة الظل!*\n\n\
         👋 أهلاً وسهلاً @{}\n\
         🌑 أنا شادو، الذي في حديقة الظل\n\
         📝 اكتب \"{DISPLAY_PREFIX}اوامر\" لاكتشاف أوامر الظل\n\n\
         مرحباً بك في عالم الظل! 🌟",
        local_part(participant)
    )
}

fn goodbye_text(participant: &str) -> String {
    format!(
        "🌑 *وداعاً من حديقة الظل!*\n\n\
         @{} غادر حديقة الظل\n\
         نتمنى له رحلة آمنة! 🌟",
        local_part(participant)
    )
}

/// Greet joining members (when enabled) and see leaving members off.
pub async fn handle_group_participants(
    data: &Data,
    group: &str,
    participants: &[String],
    action: ParticipantAction,
) {
    debug!(%group, ?action, count = participants.len(), "group participants update");

    for participant in participants {
        let text = match action {
            ParticipantAction::Add if data.config.welcome_message => welcome_text(participant),
            ParticipantAction::Remove => goodbye_text(participant),
            _ => continue,
        };

        let mentions = [participant.clone()];
        if let Err(source) = data.transport.send_text(group, &text, &mentions).await {
            error!(?source, %group, %participant, ?action, "failed to send participant notice");
        }
    }
}
