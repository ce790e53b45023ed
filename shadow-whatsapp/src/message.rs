use crate::event::{MessageContent, RawMessage};
use crate::jid;

/// A text-bearing message normalised for command handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    /// Chat to reply into (the group for group messages).
    pub chat: String,
    /// Bare sender identity, without the user-server suffix.
    pub sender: String,
    pub push_name: String,
    pub username: String,
    pub content: String,
    pub group: Option<String>,
    pub timestamp: u64,
}

impl InboundMessage {
    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }

    /// Full address of the sender, for mentions.
    pub fn sender_jid(&self) -> String {
        jid::user_jid(&self.sender)
    }
}

/// Pull the text and addressing out of a raw message. Messages sent by the bot
/// itself, media without captions and other non-text kinds yield `None`.
pub fn extract_message_info(raw: &RawMessage) -> Option<InboundMessage> {
    if raw.from_me {
        return None;
    }

    let text = match &raw.content {
        MessageContent::Conversation { text } | MessageContent::ExtendedText { text } => {
            text.as_str()
        }
        MessageContent::Image { caption } | MessageContent::Video { caption } => {
            caption.as_deref()?
        }
        MessageContent::Other => return None,
    };

    let content = text.trim();
    if content.is_empty() {
        return None;
    }

    let is_group = jid::is_group(&raw.remote_jid);
    let sender_jid = if is_group {
        raw.participant.as_deref()?
    } else {
        raw.remote_jid.as_str()
    };

    Some(InboundMessage {
        id: raw.id.clone(),
        chat: raw.remote_jid.clone(),
        sender: jid::user_identity(sender_jid).to_owned(),
        push_name: raw.push_name.clone().unwrap_or_default(),
        username: raw.verified_biz_name.clone().unwrap_or_default(),
        content: content.to_owned(),
        group: is_group.then(|| raw.remote_jid.clone()),
        timestamp: raw.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::extract_message_info;
    use crate::event::{MessageContent, RawMessage};

    fn raw(remote_jid: &str, participant: Option<&str>, content: MessageContent) -> RawMessage {
        RawMessage {
            id: "M1".to_owned(),
            remote_jid: remote_jid.to_owned(),
            participant: participant.map(str::to_owned),
            push_name: Some("Delta".to_owned()),
            verified_biz_name: None,
            from_me: false,
            timestamp: 42,
            content,
        }
    }

    #[test]
    fn private_text_uses_chat_as_sender() {
        let message = raw(
            "966500000001@s.whatsapp.net",
            None,
            MessageContent::Conversation {
                text: "  .اوامر  ".to_owned(),
            },
        );

        let info = extract_message_info(&message).unwrap();
        assert_eq!(info.sender, "966500000001");
        assert_eq!(info.content, ".اوامر");
        assert_eq!(info.chat, "966500000001@s.whatsapp.net");
        assert!(!info.is_group());
        assert_eq!(info.push_name, "Delta");
    }

    #[test]
    fn group_messages_use_participant() {
        let message = raw(
            "120363@g.us",
            Some("966500000002@s.whatsapp.net"),
            MessageContent::ExtendedText {
                text: "hi".to_owned(),
            },
        );

        let info = extract_message_info(&message).unwrap();
        assert_eq!(info.sender, "966500000002");
        assert_eq!(info.group.as_deref(), Some("120363@g.us"));
        assert_eq!(info.sender_jid(), "966500000002@s.whatsapp.net");
    }

    #[test]
    fn captions_count_as_text() {
        let message = raw(
            "1@s.whatsapp.net",
            None,
            MessageContent::Video {
                caption: Some("!help".to_owned()),
            },
        );
        assert_eq!(extract_message_info(&message).map(|info| info.content), Some("!help".to_owned()));
    }

    #[test]
    fn skips_untextual_and_own_messages() {
        let no_caption = raw("1@s.whatsapp.net", None, MessageContent::Image { caption: None });
        assert!(extract_message_info(&no_caption).is_none());

        let other = raw("1@s.whatsapp.net", None, MessageContent::Other);
        assert!(extract_message_info(&other).is_none());

        let mut own = raw(
            "1@s.whatsapp.net",
            None,
            MessageContent::Conversation {
                text: "hello".to_owned(),
            },
        );
        own.from_me = true;
        assert!(extract_message_info(&own).is_none());

        let anonymous_group = raw(
            "1@g.us",
            None,
            MessageContent::Conversation {
                text: "hello".to_owned(),
            },
        );
        assert!(extract_message_info(&anonymous_group).is_none());
    }
}
