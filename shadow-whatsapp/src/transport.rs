use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound calls the bot makes into the messaging client.
///
/// Methods return boxed futures so the trait stays object safe and can be
/// shared as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Send a text message to a chat, optionally mentioning users.
    fn send_text<'a>(
        &'a self,
        chat: &'a str,
        text: &'a str,
        mentions: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Ask the client for a pairing code for `phone` instead of a QR login.
    fn request_pairing_code<'a>(&'a self, phone: &'a str) -> BoxFuture<'a, anyhow::Result<String>>;

    /// Tear down and re-open the underlying connection.
    fn reconnect(&self) -> BoxFuture<'_, anyhow::Result<()>>;
}
