use crate::cell::ReactiveCell;
use crate::config::Config;
use crate::models::{LoginResponse, User};
use crate::persisted::PersistedCell;
use crate::storage::{DurableStorage, open_storage};
use secrecy::SecretString;
use std::rc::Rc;

/// Client session state: the bearer token and the signed-in user.
///
/// Built once at startup and passed to whatever needs it. The token is
/// mirrored to durable storage; the user lives only as long as the context.
pub struct SessionContext {
    token: PersistedCell,
    user: ReactiveCell<Option<User>>,
}

impl SessionContext {
    pub fn new(storage: Rc<dyn DurableStorage>, token_key: &str) -> Self {
        SessionContext {
            token: PersistedCell::new(storage, token_key),
            user: ReactiveCell::new(None),
        }
    }

    /// Opens the configured storage backend and restores the stored token.
    pub fn from_config(config: &Config) -> Self {
        let storage = open_storage(&config.storage);
        Self::new(storage, config.token_key())
    }

    pub fn token(&self) -> &PersistedCell {
        &self.token
    }

    pub fn user(&self) -> &ReactiveCell<Option<User>> {
        &self.user
    }

    /// Stores the token first, then the user, so user subscribers can rely on
    /// the token already being in place.
    pub fn login(&self, token: &str, user: Option<User>) {
        tracing::info!(
            "Logging in{}",
            user.as_ref()
                .map(|u| format!(" as {}", u.username))
                .unwrap_or_default()
        );
        self.token.set(Some(token.to_string()));
        self.user.set(user);
    }

    pub fn login_with_response(&self, response: &LoginResponse, user: Option<User>) {
        if !response.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(
                "Unexpected token type {}, storing the token anyway",
                response.token_type
            );
        }
        self.login(&response.access_token, user);
    }

    /// Clears the user, then the token.
    pub fn logout(&self) {
        tracing::info!("Logging out");
        self.user.set(None);
        self.token.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .with(|token| token.as_deref().is_some_and(|t| !t.is_empty()))
    }

    /// `Bearer <token>` when a token is present.
    pub fn authorization_header(&self) -> Option<SecretString> {
        self.token
            .get()
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::new(format!("Bearer {}", t)))
    }
}
