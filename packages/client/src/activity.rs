//! Template-watching layer over the hub client.

use std::sync::{Arc, Mutex};

use formpulse_shared::protocol::{ClientInvocation, TemplateId};

use crate::{error::ClientError, hub_client::HubClient};

/// Tracks which template the client is watching and keeps the server-side
/// invariant visible locally: at most one watched template per connection.
/// Joining a new template leaves the previous one first.
#[derive(Clone)]
pub struct TemplateActivityClient {
    hub: HubClient,
    current: Arc<Mutex<Option<TemplateId>>>,
}

impl TemplateActivityClient {
    pub fn new(hub: HubClient) -> Self {
        Self {
            hub,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn hub(&self) -> &HubClient {
        &self.hub
    }

    /// The template this client last joined, if any. After a reconnect the
    /// membership is gone server-side; the caller re-issues the join with
    /// this value.
    pub fn last_watched(&self) -> Option<TemplateId> {
        *self.current.lock().expect("watched template lock poisoned")
    }

    /// Start watching a template, leaving the previously watched one first.
    /// Joining the currently watched template is a no-op.
    pub fn join_template(&self, template_id: TemplateId) -> Result<(), ClientError> {
        let mut current = self.current.lock().expect("watched template lock poisoned");
        if *current == Some(template_id) {
            return Ok(());
        }
        if let Some(previous) = *current {
            self.hub.invoke(&ClientInvocation::LeaveTemplateGroup {
                template_id: previous,
            })?;
            *current = None;
        }
        self.hub
            .invoke(&ClientInvocation::JoinTemplateGroup { template_id })?;
        *current = Some(template_id);
        Ok(())
    }

    /// Stop watching the current template. A no-op when none is watched.
    pub fn leave_template(&self) -> Result<(), ClientError> {
        let mut current = self.current.lock().expect("watched template lock poisoned");
        let Some(template_id) = *current else {
            return Ok(());
        };
        self.hub
            .invoke(&ClientInvocation::LeaveTemplateGroup { template_id })?;
        *current = None;
        Ok(())
    }

    /// Comment on the watched template.
    pub fn add_comment(&self, content: &str) -> Result<(), ClientError> {
        let template_id = self.last_watched().ok_or(ClientError::NotWatching)?;
        self.hub.invoke(&ClientInvocation::AddComment {
            template_id,
            content: content.to_string(),
        })
    }

    /// Toggle this user's like on the watched template.
    pub fn toggle_like(&self) -> Result<(), ClientError> {
        let template_id = self.last_watched().ok_or(ClientError::NotWatching)?;
        self.hub
            .invoke(&ClientInvocation::ToggleLike { template_id })
    }

    /// Request the activity snapshot of any accessible template; watching it
    /// is not required for reads.
    pub fn get_template_activity(&self, template_id: TemplateId) -> Result<(), ClientError> {
        self.hub
            .invoke(&ClientInvocation::GetTemplateActivity { template_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn disconnected_client() -> TemplateActivityClient {
        TemplateActivityClient::new(HubClient::new("ws://127.0.0.1:8080/hub", None))
    }

    #[test]
    fn test_join_while_disconnected_keeps_no_watched_template() {
        let activity = disconnected_client();

        let result = activity.join_template(Uuid::new_v4());

        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert_eq!(activity.last_watched(), None);
    }

    #[test]
    fn test_add_comment_without_watched_template() {
        let activity = disconnected_client();

        let result = activity.add_comment("hello");

        assert!(matches!(result, Err(ClientError::NotWatching)));
    }

    #[test]
    fn test_toggle_like_without_watched_template() {
        let activity = disconnected_client();
        assert!(matches!(
            activity.toggle_like(),
            Err(ClientError::NotWatching)
        ));
    }

    #[test]
    fn test_leave_without_watched_template_is_noop() {
        let activity = disconnected_client();
        assert!(activity.leave_template().is_ok());
    }
}
