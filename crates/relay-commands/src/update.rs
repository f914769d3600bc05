//! Inbound platform updates and command extraction.
//!
//! Only the fields the relay reads are modeled; everything else in the update
//! payload is ignored during deserialization.

use crate::request::CommandRequest;
use relay_common::{ConversationId, RequesterId};
use serde::Deserialize;
use tracing::debug;

/// Entity type marking a `/command` inside message text.
const BOT_COMMAND: &str = "bot_command";

/// One update delivered to the webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Platform sequence number.
    #[serde(default)]
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    #[serde(default)]
    pub message: Option<Message>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Special entities (commands, mentions, ...) in the text.
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
}

/// A marked span of message text. Offsets count UTF-16 code units.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    /// Entity type, e.g. `bot_command`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start, in UTF-16 code units.
    pub offset: usize,
    /// Length, in UTF-16 code units.
    pub length: usize,
}

/// A platform user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User id.
    pub id: i64,
    /// Public handle, without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
    /// First name; always present on the platform.
    #[serde(default)]
    pub first_name: String,
}

/// A chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id; negative for groups.
    pub id: i64,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type")]
    pub kind: String,
}

impl Chat {
    /// Whether replies in this chat need an @-mention.
    pub fn is_group(&self) -> bool {
        matches!(self.kind.as_str(), "group" | "supergroup")
    }
}

impl User {
    /// Handle if set, first name otherwise.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

impl Message {
    /// The text of the first command entity.
    pub fn command(&self) -> Option<String> {
        let text = self.text.as_deref()?;
        let entity = self.entities.iter().find(|entity| entity.kind == BOT_COMMAND)?;
        utf16_slice(text, entity.offset, entity.length)
    }
}

/// Slices `text` by UTF-16 code unit positions.
fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let slice = units.get(offset..end)?;
    String::from_utf16(slice).ok()
}

/// Recognizes reading commands by prefix.
///
/// The suffix after the prefix is ignored, so `/tarot`, `/tarot@some_bot`
/// and `/tarot_now` all reach the same handler.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    /// Create a parser recognizing commands that start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The recognized prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Extracts a reading command, or `None` when the update is not one.
    pub fn parse(&self, update: &Update) -> Option<CommandRequest> {
        let message = update.message.as_ref()?;
        let command = message.command()?;
        debug!(update_id = update.update_id, %command, "Received command");

        if !command.starts_with(&self.prefix) {
            return None;
        }
        let Some(from) = message.from.as_ref() else {
            debug!(update_id = update.update_id, "Command without sender ignored");
            return None;
        };

        Some(CommandRequest {
            requester: RequesterId(from.id),
            conversation: ConversationId(message.chat.id),
            display_name: from.display_name().to_string(),
            is_group: message.chat.is_group(),
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(text: &str, offset: usize, length: usize, chat_type: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "text": text,
                "entities": [{"type": "bot_command", "offset": offset, "length": length}],
                "from": {"id": 111, "is_bot": false, "first_name": "Ada", "username": "ada"},
                "chat": {"id": -999, "type": chat_type, "title": "Readers"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parses_group_command() {
        let parser = CommandParser::new("/tarot");
        let request = parser.parse(&update("/tarot", 0, 6, "supergroup")).unwrap();

        assert_eq!(request.requester, RequesterId(111));
        assert_eq!(request.conversation, ConversationId(-999));
        assert_eq!(request.display_name, "ada");
        assert!(request.is_group);
        assert_eq!(request.command, "/tarot");
    }

    #[test]
    fn test_suffix_is_ignored() {
        let parser = CommandParser::new("/tarot");
        let request = parser
            .parse(&update("/tarot@reader_bot please", 0, 17, "private"))
            .unwrap();
        assert_eq!(request.command, "/tarot@reader_bot");
        assert!(!request.is_group);
    }

    #[test]
    fn test_other_commands_are_ignored() {
        let parser = CommandParser::new("/tarot");
        assert!(parser.parse(&update("/start", 0, 6, "private")).is_none());
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        // The crystal ball is two UTF-16 units, so the command starts at 3.
        let parser = CommandParser::new("/tarot");
        let request = parser.parse(&update("🔮 /tarot", 3, 6, "group")).unwrap();
        assert_eq!(request.command, "/tarot");
    }

    #[test]
    fn test_entity_out_of_range() {
        let parser = CommandParser::new("/tarot");
        assert!(parser.parse(&update("/tarot", 2, 10, "private")).is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_first_name() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "message": {
                "text": "/tarot",
                "entities": [{"type": "bot_command", "offset": 0, "length": 6}],
                "from": {"id": 3, "first_name": "Grace"},
                "chat": {"id": 3, "type": "private"}
            }
        }))
        .unwrap();

        let request = CommandParser::new("/tarot").parse(&update).unwrap();
        assert_eq!(request.display_name, "Grace");
    }

    #[test]
    fn test_non_message_updates() {
        let parser = CommandParser::new("/tarot");

        let edited: Update =
            serde_json::from_value(json!({"update_id": 2, "edited_message": {}})).unwrap();
        assert!(parser.parse(&edited).is_none());

        let plain: Update = serde_json::from_value(json!({
            "update_id": 3,
            "message": {"text": "/tarot", "chat": {"id": 1, "type": "private"}, "from": {"id": 1, "first_name": "x"}}
        }))
        .unwrap();
        // No command entity, so not a command.
        assert!(parser.parse(&plain).is_none());
    }
}
