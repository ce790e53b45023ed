pub mod connection;
pub mod group_participants;
pub mod messages;

use shadow_commands::CommandRegistry;
use shadow_core::{Data, Error};
use shadow_whatsapp::{ReconnectPolicy, TransportEvent};

/// Route one transport event. Only connection failures the policy gives up on
/// are returned; everything else is logged where it happens.
pub async fn handle_event(
    registry: &CommandRegistry,
    data: &Data,
    policy: &mut ReconnectPolicy,
    event: TransportEvent,
) -> Result<(), Error> {
    match event {
        TransportEvent::Message(raw) => {
            messages::handle_message(registry, data, &raw).await;
        }
        TransportEvent::GroupParticipants {
            group,
            participants,
            action,
        } => {
            group_participants::handle_group_participants(data, &group, &participants, action)
                .await;
        }
        TransportEvent::ConnectionOpen { me } => {
            connection::handle_open(policy, me.as_deref());
        }
        TransportEvent::ConnectionClosed { logged_out, reason } => {
            connection::handle_close(data, policy, logged_out, reason.as_deref()).await?;
        }
        TransportEvent::Qr { code } => {
            connection::handle_qr(data, &code).await;
        }
    }

    Ok(())
}
