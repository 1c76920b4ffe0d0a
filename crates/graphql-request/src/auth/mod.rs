//! Authentication applied to outgoing requests.
//!
//! The builder only knows the [`AuthHandler`] trait. New schemes are added by implementing it, or by
//! passing a closure.

mod api_key;
mod basic;
mod bearer;
mod shared_token;

pub use api_key::{ApiKey, ApiKeyLocation};
pub use basic::BasicAuth;
pub use bearer::BearerToken;
pub use shared_token::{AccessToken, SharedToken, TokenStore};

use crate::{AuthenticationError, OutboundRequest};

/// Applies proof of identity to a request.
///
/// Called once per build, after the default and caller headers were set, so anything it writes takes
/// precedence. It may modify any part of the request.
pub trait AuthHandler: Send + Sync {
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError>;
}

impl<F> AuthHandler for F
where
    F: Fn(&mut OutboundRequest) -> Result<(), AuthenticationError> + Send + Sync,
{
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        self(request)
    }
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthHandler for NoAuth {
    fn apply_auth(&self, _: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        Ok(())
    }
}

fn sensitive_header_value(value: &str) -> Result<http::HeaderValue, AuthenticationError> {
    let mut value = http::HeaderValue::from_str(value)
        .map_err(|_| AuthenticationError::new("Credential contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
pub(crate) fn empty_request() -> OutboundRequest {
    http::Request::post("https://api.example.com/graphql")
        .body(bytes::Bytes::new())
        .unwrap()
}
