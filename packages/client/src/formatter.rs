//! Event formatting utilities for client display.

use tayori_server::infrastructure::dto::websocket::{
    ChatMessage, ServerEvent, TypingNotice, UserStatusPayload,
};
use tayori_shared::time::timestamp_to_rfc3339;

/// Event formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any event pushed by the relay
    ///
    /// # Arguments
    ///
    /// * `event` - The decoded event
    /// * `current_user_id` - The user this CLI speaks for (to mark as "me")
    pub fn format_event(event: &ServerEvent, current_user_id: &str) -> String {
        match event {
            ServerEvent::UserStatus(status) => Self::format_user_status(status, current_user_id),
            ServerEvent::MessageNew(message) => Self::format_chat_message(message, current_user_id),
            ServerEvent::UserTyping(notice) => Self::format_typing(notice),
        }
    }

    /// Format a presence transition
    pub fn format_user_status(status: &UserStatusPayload, current_user_id: &str) -> String {
        let me_suffix = if status.user_id == current_user_id {
            " (me)"
        } else {
            ""
        };
        if status.online {
            format!("\n+ {}{} is online\n", status.user_id, me_suffix)
        } else {
            match status.last_seen {
                Some(last_seen) => format!(
                    "\n- {}{} went offline, last seen {}\n",
                    status.user_id,
                    me_suffix,
                    timestamp_to_rfc3339(last_seen)
                ),
                None => format!("\n- {}{} went offline\n", status.user_id, me_suffix),
            }
        }
    }

    /// Format a chat message
    ///
    /// The display name wins over the sender id when the gateway provided one.
    pub fn format_chat_message(message: &ChatMessage, current_user_id: &str) -> String {
        let from = message
            .sender_display_name()
            .unwrap_or(&message.sender_id);
        let me_suffix = if message.sender_id == current_user_id {
            " (me)"
        } else {
            ""
        };
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            from, me_suffix, message.content, message.created_at
        )
    }

    /// Format a typing indicator
    pub fn format_typing(notice: &TypingNotice) -> String {
        if notice.typing {
            format!("\n… {} is typing\n", notice.from_user_id)
        } else {
            format!("\n… {} stopped typing\n", notice.from_user_id)
        }
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(room_id: &str, created_at: &str) -> String {
        format!("sent to #{} at {}\n", room_id, created_at)
    }
}
