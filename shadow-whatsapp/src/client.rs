use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::TransportEvent;
use crate::transport::{BoxFuture, Transport};

const PUMP_RETRY_DELAY: Duration = Duration::from_secs(3);

/// HTTP client for the bridge process that owns the WhatsApp session.
#[derive(Clone, Debug)]
pub struct BridgeClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

#[derive(Serialize)]
struct SendTextRequest<'a> {
    chat: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "no_mentions")]
    mentions: &'a [String],
}

fn no_mentions(mentions: &&[String]) -> bool {
    mentions.is_empty()
}

#[derive(Serialize)]
struct PairingRequest<'a> {
    phone: &'a str,
}

#[derive(Deserialize)]
struct PairingResponse {
    code: String,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>, poll_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .context("failed to build bridge http client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            poll_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Long-poll the bridge for pending events. An empty batch means the poll
    /// timed out with nothing to report.
    pub async fn poll_events(&self) -> anyhow::Result<Vec<TransportEvent>> {
        let response = self
            .client
            .get(self.url("/events"))
            .query(&[("timeout", self.poll_timeout.as_secs())])
            .send()
            .await
            .context("failed to poll bridge events")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("bridge event poll failed: {status} - {body}");
        }

        response
            .json::<Vec<TransportEvent>>()
            .await
            .context("failed to decode bridge events")
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<reqwest::Response> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to call bridge {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("bridge {path} failed: {status} - {body}");
        }

        Ok(response)
    }
}

impl Transport for BridgeClient {
    fn send_text<'a>(
        &'a self,
        chat: &'a str,
        text: &'a str,
        mentions: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.post_json(
                "/messages",
                &SendTextRequest {
                    chat,
                    text,
                    mentions,
                },
            )
            .await?;
            Ok(())
        })
    }

    fn request_pairing_code<'a>(&'a self, phone: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            let response = self
                .post_json("/pairing-code", &PairingRequest { phone })
                .await?;
            let pairing = response
                .json::<PairingResponse>()
                .await
                .context("failed to decode pairing code")?;
            Ok(pairing.code)
        })
    }

    fn reconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.post_json("/reconnect", &serde_json::json!({})).await?;
            Ok(())
        })
    }
}

/// Poll the bridge forever, forwarding each event through `wrap` into `tx`.
/// Stops once the receiving side is dropped.
pub fn spawn_event_pump<E, F>(client: BridgeClient, tx: mpsc::Sender<E>, wrap: F) -> JoinHandle<()>
where
    E: Send + 'static,
    F: Fn(TransportEvent) -> E + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match client.poll_events().await {
                Ok(events) => {
                    if !events.is_empty() {
                        debug!(count = events.len(), "received bridge events");
                    }
                    for event in events {
                        if tx.send(wrap(event)).await.is_err() {
                            debug!("event receiver dropped; stopping bridge pump");
                            return;
                        }
                    }
                }
                Err(source) => {
                    if tx.is_closed() {
                        return;
                    }
                    warn!(?source, "bridge poll failed; retrying");
                    tokio::time::sleep(PUMP_RETRY_DELAY).await;
                }
            }
        }
    })
}
