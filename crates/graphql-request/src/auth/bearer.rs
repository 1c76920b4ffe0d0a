use secrecy::{ExposeSecret, SecretString};

use super::{AuthHandler, sensitive_header_value};
use crate::{AuthenticationError, OutboundRequest};

/// Sends a static token as `Authorization: Bearer <token>`.
pub struct BearerToken {
    token: SecretString,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken {
            token: SecretString::new(token.into()),
        }
    }
}

impl From<SecretString> for BearerToken {
    fn from(token: SecretString) -> Self {
        BearerToken { token }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").finish_non_exhaustive()
    }
}

impl AuthHandler for BearerToken {
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        set_bearer(request, self.token.expose_secret())
    }
}

pub(super) fn set_bearer(request: &mut OutboundRequest, token: &str) -> Result<(), AuthenticationError> {
    if token.is_empty() {
        return Err(AuthenticationError::new("Bearer token is empty"));
    }

    let value = sensitive_header_value(&format!("Bearer {token}"))?;
    request.headers_mut().insert(http::header::AUTHORIZATION, value);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::empty_request;

    #[test]
    fn sets_authorization() {
        let mut request = empty_request();
        request
            .headers_mut()
            .insert(http::header::AUTHORIZATION, http::HeaderValue::from_static("stale"));

        BearerToken::new("fresh").apply_auth(&mut request).unwrap();

        assert_eq!(request.headers()[http::header::AUTHORIZATION], "Bearer fresh");
        assert_eq!(request.headers().get_all(http::header::AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut request = empty_request();
        let err = BearerToken::new("").apply_auth(&mut request).unwrap_err();

        insta::assert_snapshot!(err, @"Bearer token is empty");
        assert!(request.headers().is_empty());
    }

    #[test]
    fn debug_does_not_leak_the_token() {
        let handler = BearerToken::new("super-secret");
        assert!(!format!("{handler:?}").contains("super-secret"));
    }
}
