//! The transient request handled for one inbound command.

use relay_common::{ConversationId, RequesterId};

/// A recognized command, extracted from one platform update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// User who issued the command.
    pub requester: RequesterId,
    /// Chat the command was issued in.
    pub conversation: ConversationId,
    /// Name used for the @-mention in groups.
    pub display_name: String,
    /// Whether the chat is a group.
    pub is_group: bool,
    /// The literal command token, e.g. `/tarot@some_bot`.
    pub command: String,
}

impl CommandRequest {
    /// Where replies go: the group in group chats, the requester otherwise.
    pub fn target(&self) -> ConversationId {
        if self.is_group {
            self.conversation
        } else {
            self.requester.into()
        }
    }

    /// `@name` in group chats, empty otherwise.
    pub fn mention(&self) -> String {
        if self.is_group {
            format!("@{}", self.display_name)
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(is_group: bool) -> CommandRequest {
        CommandRequest {
            requester: RequesterId(7),
            conversation: ConversationId(-500),
            display_name: "seer".to_string(),
            is_group,
            command: "/tarot".to_string(),
        }
    }

    #[test]
    fn test_group_targets_conversation() {
        let group = request(true);
        assert_eq!(group.target(), ConversationId(-500));
        assert_eq!(group.mention(), "@seer");
    }

    #[test]
    fn test_direct_targets_requester() {
        let direct = request(false);
        assert_eq!(direct.target(), ConversationId(7));
        assert_eq!(direct.mention(), "");
    }
}
