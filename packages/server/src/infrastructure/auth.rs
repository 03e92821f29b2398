//! Token verification for the connection handshake.

use std::collections::HashMap;

use formpulse_shared::protocol::Identity;

use crate::domain::IdentityVerifier;

/// Fixed token-to-identity table.
///
/// The real platform validates a JWT issued elsewhere; that exchange is out
/// of scope here, so the server is configured with the tokens it accepts.
/// Unknown tokens yield an unauthenticated connection rather than a rejected
/// handshake.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

impl IdentityVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_known_token_resolves_identity() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            user_name: "alice".to_string(),
        };
        let verifier = StaticTokenVerifier::new().with_token("alice-token", identity.clone());

        assert_eq!(verifier.verify("alice-token"), Some(identity));
    }

    #[test]
    fn test_unknown_token_is_anonymous() {
        let verifier = StaticTokenVerifier::new();
        assert_eq!(verifier.verify("nope"), None);
    }
}
