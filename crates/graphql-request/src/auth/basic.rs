use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};

use super::{AuthHandler, sensitive_header_value};
use crate::{AuthenticationError, OutboundRequest};

/// HTTP basic authentication, `Authorization: Basic base64(username:password)`.
pub struct BasicAuth {
    username: String,
    password: SecretString,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicAuth {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AuthHandler for BasicAuth {
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        // RFC 7617: the user-id cannot contain a colon.
        if self.username.contains(':') {
            return Err(AuthenticationError::new("Basic auth username cannot contain ':'"));
        }

        let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password.expose_secret()));
        let value = sensitive_header_value(&format!("Basic {credentials}"))?;
        request.headers_mut().insert(http::header::AUTHORIZATION, value);

        Ok(())
    }
}
