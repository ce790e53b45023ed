//! Boundary to the WhatsApp network.
//!
//! The multi-device protocol itself lives in an external bridge process; this
//! crate only models the events it emits, the calls the bot makes back into
//! it, and the reconnect policy applied to its connection.

pub mod client;
pub mod event;
pub mod jid;
pub mod message;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod reconnect;
pub mod transport;

pub use client::{BridgeClient, spawn_event_pump};
pub use event::{MessageContent, ParticipantAction, RawMessage, TransportEvent};
pub use message::{InboundMessage, extract_message_info};
pub use reconnect::{ReconnectDecision, ReconnectPolicy};
pub use transport::{BoxFuture, Transport};
