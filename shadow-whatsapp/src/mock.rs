//! In-process transport that records outbound calls.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::transport::{BoxFuture, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentText {
    pub chat: String,
    pub text: String,
    pub mentions: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentText>>,
    pairing_requests: Mutex<Vec<String>>,
    reconnects: AtomicUsize,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentText> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent().pop().map(|sent| sent.text)
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }

    pub fn pairing_requests(&self) -> Vec<String> {
        self.pairing_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send_text<'a>(
        &'a self,
        chat: &'a str,
        text: &'a str,
        mentions: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            if self.fail_sends.load(Ordering::SeqCst) {
                anyhow::bail!("send rejected by recording transport");
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(SentText {
                    chat: chat.to_owned(),
                    text: text.to_owned(),
                    mentions: mentions.to_vec(),
                });
            }
            Ok(())
        })
    }

    fn request_pairing_code<'a>(&'a self, phone: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            if let Ok(mut requests) = self.pairing_requests.lock() {
                requests.push(phone.to_owned());
            }
            Ok("ABCD-1234".to_owned())
        })
    }

    fn reconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
