//! Bus event types — messages flowing between channels and the router.

use chrono::{DateTime, Utc};

/// An inbound message from a channel to the router.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Channel name (e.g. "discord", "cli").
    pub channel: String,
    /// Sender identifier within the channel.
    pub sender_id: String,
    /// Chat/conversation identifier. Conversation state is keyed on this.
    pub chat_id: String,
    /// Raw text content of the message.
    pub content: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
    /// Whether the author is a bot account (including ourselves).
    pub author_is_bot: bool,
    /// Whether the message arrived in a direct-message conversation.
    pub is_direct: bool,
    /// Whether the message mentions the bot user.
    pub mentions_bot: bool,
}

impl InboundMessage {
    /// Create a new inbound message with minimal required fields.
    ///
    /// All routing flags start `false`: a plain, non-addressed human message.
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        InboundMessage {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            author_is_bot: false,
            is_direct: false,
            mentions_bot: false,
        }
    }

    /// Mark the author as a bot account.
    pub fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }

    /// Mark the message as a direct message.
    pub fn direct(mut self) -> Self {
        self.is_direct = true;
        self
    }

    /// Mark the message as mentioning the bot.
    pub fn mentioning_bot(mut self) -> Self {
        self.mentions_bot = true;
        self
    }

    /// Whether the message is addressed to the bot (mention or DM).
    pub fn is_addressed(&self) -> bool {
        self.mentions_bot || self.is_direct
    }
}

/// An outbound message from the router to a channel.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    /// Target channel name.
    pub channel: String,
    /// Target chat/conversation identifier.
    pub chat_id: String,
    /// Text content to send. Already within the platform length ceiling.
    pub content: String,
}

impl OutboundMessage {
    /// Create a new outbound message.
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        OutboundMessage {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
        }
    }

    /// Build a reply addressed to the conversation an inbound message came from.
    pub fn reply_to(inbound: &InboundMessage, content: impl Into<String>) -> Self {
        OutboundMessage::new(&inbound.channel, &inbound.chat_id, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_creation() {
        let msg = InboundMessage::new("discord", "user_42", "chan_99", "Hello!");

        assert_eq!(msg.channel, "discord");
        assert_eq!(msg.sender_id, "user_42");
        assert_eq!(msg.chat_id, "chan_99");
        assert_eq!(msg.content, "Hello!");
        assert!(!msg.author_is_bot);
        assert!(!msg.is_direct);
        assert!(!msg.mentions_bot);
    }

    #[test]
    fn test_addressed_flags() {
        let plain = InboundMessage::new("discord", "u", "c", "hi");
        assert!(!plain.is_addressed());

        let mentioned = InboundMessage::new("discord", "u", "c", "hi").mentioning_bot();
        assert!(mentioned.is_addressed());

        let dm = InboundMessage::new("discord", "u", "c", "hi").direct();
        assert!(dm.is_addressed());
    }

    #[test]
    fn test_from_bot_flag() {
        let msg = InboundMessage::new("discord", "bot", "c", "beep").from_bot();
        assert!(msg.author_is_bot);
    }

    #[test]
    fn test_outbound_message_creation() {
        let msg = OutboundMessage::new("discord", "chan_99", "Here's your answer!");

        assert_eq!(msg.channel, "discord");
        assert_eq!(msg.chat_id, "chan_99");
        assert_eq!(msg.content, "Here's your answer!");
    }

    #[test]
    fn test_reply_targets_origin() {
        let inbound = InboundMessage::new("cli", "local", "default", "question");
        let reply = OutboundMessage::reply_to(&inbound, "answer");

        assert_eq!(reply.channel, "cli");
        assert_eq!(reply.chat_id, "default");
        assert_eq!(reply.content, "answer");
    }
}
