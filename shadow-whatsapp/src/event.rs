use serde::{Deserialize, Serialize};

/// Everything the messaging client reports to the bot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    ConnectionOpen {
        #[serde(default)]
        me: Option<String>,
    },
    ConnectionClosed {
        #[serde(default)]
        logged_out: bool,
        #[serde(default)]
        reason: Option<String>,
    },
    Qr {
        code: String,
    },
    Message(RawMessage),
    GroupParticipants {
        group: String,
        participants: Vec<String>,
        action: ParticipantAction,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

/// A message as delivered by the client, before normalisation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub remote_jid: String,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub push_name: Option<String>,
    #[serde(default)]
    pub verified_biz_name: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub timestamp: u64,
    pub content: MessageContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Conversation {
        text: String,
    },
    ExtendedText {
        text: String,
    },
    Image {
        #[serde(default)]
        caption: Option<String>,
    },
    Video {
        #[serde(default)]
        caption: Option<String>,
    },
    #[serde(other)]
    Other,
}
