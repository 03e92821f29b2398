//! Event formatting for the interactive client display.

use std::io::Write;

use formpulse_shared::protocol::{
    CommentAddedEvent, ConnectedEvent, ErrorEvent, JoinedTemplateEvent, LikeAction,
    LikeToggledEvent, NewCommentEvent, TemplateActivityEvent, UserJoinedEvent, UserLeftEvent,
};
use formpulse_shared::time::timestamp_to_rfc3339;

/// Event formatter for client display
pub struct EventFormatter;

impl EventFormatter {
    pub fn format_connected(event: &ConnectedEvent) -> String {
        let who = match &event.user_name {
            Some(name) => format!("as {}", name),
            None => "anonymously".to_string(),
        };
        format!(
            "\nConnected {} at {}\n",
            who,
            timestamp_to_rfc3339(event.connected_at)
        )
    }

    pub fn format_joined(event: &JoinedTemplateEvent) -> String {
        format!(
            "\nWatching template {} ({})\n",
            event.template_id, event.message
        )
    }

    pub fn format_user_joined(event: &UserJoinedEvent) -> String {
        format!(
            "\n+ {} started watching at {}\n",
            event.user_name,
            timestamp_to_rfc3339(event.joined_at)
        )
    }

    pub fn format_user_left(event: &UserLeftEvent) -> String {
        format!(
            "\n- {} stopped watching at {}\n",
            event.user_name,
            timestamp_to_rfc3339(event.left_at)
        )
    }

    pub fn format_new_comment(event: &NewCommentEvent) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             at {}\n\
             ------------------------------------------------------------\n",
            event.comment.author_name,
            event.comment.content,
            timestamp_to_rfc3339(event.comment.created_at)
        )
    }

    pub fn format_comment_added(event: &CommentAddedEvent) -> String {
        format!(
            "\ncomment sent at {}\n",
            timestamp_to_rfc3339(event.comment.created_at)
        )
    }

    pub fn format_like_toggled(event: &LikeToggledEvent) -> String {
        let verb = match event.action {
            LikeAction::Added => "liked",
            LikeAction::Removed => "unliked",
        };
        format!(
            "\n{} {} this template ({} likes)\n",
            event.user_name, verb, event.total_likes
        )
    }

    pub fn format_activity(event: &TemplateActivityEvent) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str(&format!(
            "Template {} ({} likes)\n",
            event.template_id, event.likes_count
        ));
        if event.recent_comments.is_empty() {
            output.push_str("(No comments yet)\n");
        } else {
            for comment in &event.recent_comments {
                output.push_str(&format!(
                    "@{}: {} ({})\n",
                    comment.author_name,
                    comment.content,
                    timestamp_to_rfc3339(comment.created_at)
                ));
            }
        }
        output.push_str("============================================================\n");
        output
    }

    pub fn format_error(event: &ErrorEvent) -> String {
        match &event.error_code {
            Some(code) => format!("\n! [{}] {}\n", code, event.message),
            None => format!("\n! {}\n", event.message),
        }
    }
}

/// Redisplay the prompt after printing an event over it.
pub fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpulse_shared::protocol::CommentRecord;
    use uuid::Uuid;

    fn comment(author: &str, content: &str) -> CommentRecord {
        CommentRecord {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_name: author.to_string(),
            content: content.to_string(),
            created_at: 1672531200000,
        }
    }

    #[test]
    fn test_format_connected_anonymous() {
        let result = EventFormatter::format_connected(&ConnectedEvent {
            connection_id: "c1".to_string(),
            user_id: None,
            user_name: None,
            is_authenticated: false,
            connected_at: 1672531200000,
        });

        assert!(result.contains("Connected anonymously"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_connected_authenticated() {
        let result = EventFormatter::format_connected(&ConnectedEvent {
            connection_id: "c1".to_string(),
            user_id: Some(Uuid::new_v4()),
            user_name: Some("alice".to_string()),
            is_authenticated: true,
            connected_at: 1672531200000,
        });

        assert!(result.contains("Connected as alice"));
    }

    #[test]
    fn test_format_new_comment() {
        let result = EventFormatter::format_new_comment(&NewCommentEvent {
            comment: comment("alice", "Hello, world!"),
            template_id: Uuid::new_v4(),
            added_at: 1672531200000,
        });

        assert!(result.contains("@alice: Hello, world!"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_like_toggled() {
        let result = EventFormatter::format_like_toggled(&LikeToggledEvent {
            template_id: Uuid::new_v4(),
            total_likes: 3,
            is_liked: true,
            action: LikeAction::Added,
            user_id: Uuid::new_v4(),
            user_name: "bob".to_string(),
            updated_at: 1672531200000,
        });

        assert!(result.contains("bob liked"));
        assert!(result.contains("3 likes"));
    }

    #[test]
    fn test_format_activity_without_comments() {
        let result = EventFormatter::format_activity(&TemplateActivityEvent {
            template_id: Uuid::new_v4(),
            recent_comments: vec![],
            likes_count: 0,
            user_liked: false,
            loaded_at: 1672531200000,
        });

        assert!(result.contains("(No comments yet)"));
        assert!(result.contains("0 likes"));
    }

    #[test]
    fn test_format_error_with_code() {
        let result = EventFormatter::format_error(&ErrorEvent {
            message: "Authentication required to add comments".to_string(),
            error_code: Some("AUTH_REQUIRED".to_string()),
            occurred_at: 0,
        });

        assert!(result.contains("[AUTH_REQUIRED]"));
        assert!(result.contains("Authentication required"));
    }
}
