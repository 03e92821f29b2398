//! Routing tables for live connections and template groups.
//!
//! Three maps, mutated together and only ever under the hub's single lock:
//! connection registry, template groups, and the reverse `watching` map. The
//! two-map group representation (connection -> template, template -> set of
//! connections) is deliberate: no back-pointers between objects, so a
//! disconnect can never leave a dangling reference.
//!
//! Invariant: a connection appears in at most one group, and it is in
//! `groups[t]` exactly when `watching[c] == t`.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use formpulse_shared::protocol::{Identity, TemplateId};

use crate::domain::ConnectionId;

/// Registry entry for one live connection.
pub struct ConnectionEntry {
    /// Outbox feeding the connection's WebSocket push task.
    pub sender: mpsc::UnboundedSender<String>,
    /// Bound at handshake; `None` for anonymous connections.
    pub identity: Option<Identity>,
    /// Unix epoch milliseconds.
    pub connected_at: i64,
}

/// Result of a join, as seen by the membership tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The connection already watches this template; nothing changed.
    AlreadyWatching,
    /// The connection now watches this template. `previous` is the template
    /// it was implicitly removed from, if any.
    Moved { previous: Option<TemplateId> },
}

/// All mutable hub state. Every method is synchronous; callers hold the hub
/// lock for the whole mutation so membership transitions stay linearizable.
#[derive(Default)]
pub struct HubState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    groups: HashMap<TemplateId, HashSet<ConnectionId>>,
    watching: HashMap<ConnectionId, TemplateId>,
}

impl HubState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_connection(&mut self, connection_id: ConnectionId, entry: ConnectionEntry) {
        self.connections.insert(connection_id, entry);
    }

    /// Bind an authenticated identity to a registered connection.
    /// Returns `false` when the connection is unknown.
    pub fn bind_identity(&mut self, connection_id: ConnectionId, identity: Identity) -> bool {
        match self.connections.get_mut(&connection_id) {
            Some(entry) => {
                entry.identity = Some(identity);
                true
            }
            None => false,
        }
    }

    pub fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        self.connections
            .get(&connection_id)?
            .identity
            .clone()
    }

    pub fn watched_template(&self, connection_id: ConnectionId) -> Option<TemplateId> {
        self.watching.get(&connection_id).copied()
    }

    /// Remove the connection from the registry and from whatever group it
    /// was in. Returns the template it was watching, if any.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<TemplateId> {
        self.connections.remove(&connection_id);
        let previous = self.watching.remove(&connection_id);
        if let Some(template_id) = previous {
            self.remove_member(template_id, connection_id);
        }
        previous
    }

    /// Move the connection into `template_id`'s group, leaving its previous
    /// group first. Returns `None` for an unregistered connection.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        template_id: TemplateId,
    ) -> Option<JoinOutcome> {
        if !self.connections.contains_key(&connection_id) {
            return None;
        }

        if self.watching.get(&connection_id) == Some(&template_id) {
            return Some(JoinOutcome::AlreadyWatching);
        }

        let previous = self.watching.insert(connection_id, template_id);
        if let Some(previous_template) = previous {
            self.remove_member(previous_template, connection_id);
        }
        self.groups
            .entry(template_id)
            .or_default()
            .insert(connection_id);

        Some(JoinOutcome::Moved { previous })
    }

    /// Remove the connection from `template_id`'s group. Returns whether it
    /// was a member.
    pub fn leave(&mut self, connection_id: ConnectionId, template_id: TemplateId) -> bool {
        if self.watching.get(&connection_id) != Some(&template_id) {
            return false;
        }
        self.watching.remove(&connection_id);
        self.remove_member(template_id, connection_id);
        true
    }

    pub fn members_of(&self, template_id: TemplateId) -> Vec<ConnectionId> {
        self.groups
            .get(&template_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn sender_of(&self, connection_id: ConnectionId) -> Option<mpsc::UnboundedSender<String>> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.sender.clone())
    }

    /// Snapshot of the member senders for one fan-out.
    pub fn group_senders(
        &self,
        template_id: TemplateId,
        exclude: Option<ConnectionId>,
    ) -> Vec<(ConnectionId, mpsc::UnboundedSender<String>)> {
        let Some(members) = self.groups.get(&template_id) else {
            return Vec::new();
        };
        members
            .iter()
            .filter(|id| Some(**id) != exclude)
            .filter_map(|id| {
                self.connections
                    .get(id)
                    .map(|entry| (*id, entry.sender.clone()))
            })
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn remove_member(&mut self, template_id: TemplateId, connection_id: ConnectionId) {
        if let Some(members) = self.groups.get_mut(&template_id) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.groups.remove(&template_id);
            }
        }
    }
}
