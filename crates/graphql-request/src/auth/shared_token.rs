use std::{
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use secrecy::{ExposeSecret, SecretString};

use super::{AuthHandler, bearer::set_bearer};
use crate::{AuthenticationError, OutboundRequest};

/// An access token obtained from an authorization server, e.g. through an OAuth2 refresh flow.
pub struct AccessToken {
    token: SecretString,
    expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken {
            token: SecretString::new(token.into()),
            expires_at: None,
        }
    }

    /// A lifetime too long to represent as an [`Instant`] means the token never expires.
    #[must_use]
    pub fn expires_in(mut self, lifetime: Duration) -> Self {
        self.expires_at = Instant::now().checked_add(lifetime);
        self
    }

    #[must_use]
    pub fn expires_at(mut self, instant: Instant) -> Self {
        self.expires_at = Some(instant);
        self
    }

    // A leeway reaching past the end of representable time expires every token that has an expiry.
    fn is_usable_at(&self, now: Instant, leeway: Duration) -> bool {
        self.expires_at
            .is_none_or(|expires_at| now.checked_add(leeway).is_some_and(|limit| limit < expires_at))
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Slot holding the current access token. Clones share the same slot.
///
/// Whatever refreshes credentials writes here; every [`SharedToken`] reading from it picks the new
/// token up on its next build.
#[derive(Clone, Debug, Default)]
pub struct TokenStore {
    current: Arc<RwLock<Option<Arc<AccessToken>>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AccessToken) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    pub fn set(&self, token: AccessToken) {
        *self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(token));
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn get(&self) -> Option<Arc<AccessToken>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Bearer authentication with a token refreshed out of band.
///
/// Fails when the store is empty or its token expires within the leeway, which lets the caller
/// refresh the store and build again.
#[derive(Clone, Debug)]
pub struct SharedToken {
    store: TokenStore,
    leeway: Duration,
}

impl SharedToken {
    pub fn new(store: TokenStore) -> Self {
        SharedToken {
            store,
            leeway: Duration::ZERO,
        }
    }

    /// Treat tokens as expired this long before their actual expiry.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }
}

impl AuthHandler for SharedToken {
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        let Some(token) = self.store.get() else {
            return Err(AuthenticationError::new("No access token available"));
        };

        if !token.is_usable_at(Instant::now(), self.leeway) {
            return Err(AuthenticationError::new("Access token has expired"));
        }

        set_bearer(request, token.token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::empty_request;

    #[test]
    fn empty_store() {
        let handler = SharedToken::new(TokenStore::new());
        let err = handler.apply_auth(&mut empty_request()).unwrap_err();

        insta::assert_snapshot!(err, @"No access token available");
    }

    #[test]
    fn expired_then_refreshed() {
        let store = TokenStore::with_token(AccessToken::new("old").expires_at(Instant::now()));
        let handler = SharedToken::new(store.clone());

        let mut request = empty_request();
        let err = handler.apply_auth(&mut request).unwrap_err();
        insta::assert_snapshot!(err, @"Access token has expired");
        assert!(request.headers().is_empty());

        store.set(AccessToken::new("new").expires_in(Duration::from_secs(3600)));
        handler.apply_auth(&mut request).unwrap();
        assert_eq!(request.headers()[http::header::AUTHORIZATION], "Bearer new");
    }

    #[test]
    fn leeway_expires_tokens_early() {
        let store = TokenStore::with_token(AccessToken::new("tok").expires_in(Duration::from_secs(10)));

        let strict = SharedToken::new(store.clone()).with_leeway(Duration::from_secs(60));
        assert!(strict.apply_auth(&mut empty_request()).is_err());

        let lenient = SharedToken::new(store);
        assert!(lenient.apply_auth(&mut empty_request()).is_ok());
    }

    #[test]
    fn tokens_without_expiry_never_expire() {
        let store = TokenStore::with_token(AccessToken::new("forever"));
        let handler = SharedToken::new(store.clone()).with_leeway(Duration::from_secs(3600));
        assert!(handler.apply_auth(&mut empty_request()).is_ok());

        store.clear();
        assert!(handler.store().get().is_none());
        assert!(handler.apply_auth(&mut empty_request()).is_err());
    }

    #[test]
    fn unbounded_leeway_expires_the_token() {
        let store = TokenStore::with_token(AccessToken::new("tok").expires_in(Duration::from_secs(3600)));
        let handler = SharedToken::new(store.clone()).with_leeway(Duration::MAX);

        let err = handler.apply_auth(&mut empty_request()).unwrap_err();
        insta::assert_snapshot!(err, @"Access token has expired");

        store.set(AccessToken::new("forever"));
        assert!(handler.apply_auth(&mut empty_request()).is_ok());
    }

    #[test]
    fn unbounded_lifetime_never_expires() {
        let token = AccessToken::new("tok").expires_in(Duration::MAX);
        assert!(token.expires_at.is_none());

        let handler = SharedToken::new(TokenStore::with_token(token)).with_leeway(Duration::from_secs(3600));
        handler.apply_auth(&mut empty_request()).unwrap();
    }
}
