use shadow_core::{Data, Error};
use shadow_whatsapp::{ReconnectDecision, ReconnectPolicy};
use tracing::{error, info, warn};

pub fn handle_open(policy: &mut ReconnectPolicy, me: Option<&str>) {
    policy.on_open();
    info!(me = me.unwrap_or("unknown"), "connected to WhatsApp");
}

/// Apply the reconnect policy to a closed connection. Returns an error when the
/// session is logged out or the retry budget is spent, which ends the process.
pub async fn handle_close(
    data: &Data,
    policy: &mut ReconnectPolicy,
    logged_out: bool,
    reason: Option<&str>,
) -> Result<(), Error> {
    warn!(logged_out, reason = reason.unwrap_or("unknown"), "connection closed");

    match policy.on_close(logged_out) {
        ReconnectDecision::Retry { attempt, delay } => {
            info!(attempt, delay_secs = delay.as_secs(), "reconnecting");
            tokio::time::sleep(delay).await;
            if let Err(source) = data.transport.reconnect().await {
                warn!(?source, attempt, "reconnect request failed");
            }
            Ok(())
        }
        ReconnectDecision::LoggedOut => {
            error!("session logged out; re-authentication required");
            anyhow::bail!("WhatsApp session logged out")
        }
        ReconnectDecision::GiveUp { attempts } => {
            error!(attempts, "giving up on reconnecting");
            anyhow::bail!("failed to reconnect after {attempts} attempts")
        }
    }
}

/// Log a login QR code and, when configured, request a pairing code instead.
pub async fn handle_qr(data: &Data, code: &str) {
    info!(%code, "scan the QR code to log in");

    let whatsapp = &data.config.whatsapp;
    if !whatsapp.pairing_code {
        return;
    }
    let Some(phone) = whatsapp.phone_number.as_deref() else {
        return;
    };

    match data.transport.request_pairing_code(phone).await {
        Ok(pairing) => info!(%pairing, phone, "pairing code issued"),
        Err(source) => error!(?source, phone, "failed to request pairing code"),
    }
}
