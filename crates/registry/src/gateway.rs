use crate::error::{require_token, RegistryError};
use core_types::Participant;
use database::ParticipantRepository;
use std::sync::Arc;

/// Turns a presented credential into the participant it belongs to.
///
/// Consumers depend on this trait rather than on token lookup directly, so a signed or
/// expiring credential scheme can be dropped in later.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credential: &str) -> Result<Participant, RegistryError>;
}

/// Plain token equality against the participant store. Tokens are never hashed,
/// rotated, or expired.
pub struct TokenAuthenticator {
    repo: ParticipantRepository,
}

impl TokenAuthenticator {
    pub fn new(repo: ParticipantRepository) -> Self {
        Self { repo }
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, credential: &str) -> Result<Participant, RegistryError> {
        self.repo
            .find_by_token(credential)
            .ok_or_else(|| RegistryError::Auth("invalid token".to_string()))
    }
}

/// The registry's only authentication entry point.
#[derive(Clone)]
pub struct ResolutionGateway {
    authenticator: Arc<dyn Authenticator>,
}

impl ResolutionGateway {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Resolves a token to its participant: blank → `Validation`, unknown → `Auth`.
    pub fn resolve(&self, token: &str) -> Result<Participant, RegistryError> {
        let token = require_token(token)?;
        self.authenticator.authenticate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_with(participant: &Participant) -> ResolutionGateway {
        let repo = ParticipantRepository::in_memory();
        repo.upsert(participant.clone()).unwrap();
        ResolutionGateway::new(Arc::new(TokenAuthenticator::new(repo)))
    }

    #[test]
    fn blank_token_is_a_validation_error() {
        let gateway = gateway_with(&Participant::new("tok", "Ada", "ada@example.com"));
        assert!(matches!(gateway.resolve(""), Err(RegistryError::Validation(_))));
        assert!(matches!(gateway.resolve("   "), Err(RegistryError::Validation(_))));
    }

    #[test]
    fn unknown_token_is_an_auth_error() {
        let gateway = gateway_with(&Participant::new("tok", "Ada", "ada@example.com"));
        let err = gateway.resolve("unknown-token").unwrap_err();
        assert!(matches!(err, RegistryError::Auth(_)));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn known_token_returns_the_full_record() {
        let participant = Participant::new("tok", "Ada", "ada@example.com");
        let gateway = gateway_with(&participant);
        assert_eq!(gateway.resolve("tok").unwrap(), participant);
    }

    struct DenyAll;

    impl Authenticator for DenyAll {
        fn authenticate(&self, _credential: &str) -> Result<Participant, RegistryError> {
            Err(RegistryError::Auth("denied".to_string()))
        }
    }

    #[test]
    fn authenticator_is_pluggable() {
        let gateway = ResolutionGateway::new(Arc::new(DenyAll));
        assert!(matches!(gateway.resolve("anything"), Err(RegistryError::Auth(_))));
    }
}
