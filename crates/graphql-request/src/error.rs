use std::{borrow::Cow, fmt};

/// Errors returned by [`RequestBuilder::build`](crate::RequestBuilder::build).
///
/// A failed build never yields a partial request, and leaves the builder untouched: calling `build`
/// again is always safe.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    RequestConstruction(#[from] RequestConstructionError),
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
}

impl BuildError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, BuildError::Authentication(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Failed to serialize the request body: {0}")]
    Json(#[from] serde_json::Error),
    /// Variables must end up as a JSON object on the wire.
    #[error("Variables must serialize to a JSON object, got {found}")]
    VariablesNotAnObject { found: &'static str },
    #[error("Variables contain {value}, which cannot be represented in JSON")]
    NonFiniteNumber { value: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum RequestConstructionError {
    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("Invalid header name `{name}`")]
    InvalidHeaderName { name: String },
    #[error("Invalid value for header `{name}`")]
    InvalidHeaderValue { name: String },
}

impl RequestConstructionError {
    pub(crate) fn invalid_endpoint(endpoint: &str, reason: impl ToString) -> Self {
        RequestConstructionError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Opaque failure reported by an [`AuthHandler`](crate::AuthHandler).
///
/// The builder never inspects it. Handlers either give a message or wrap their own error type,
/// which can be recovered with [`AuthenticationError::into_source`].
pub struct AuthenticationError {
    inner: Inner,
}

enum Inner {
    Message(Cow<'static, str>),
    Source(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl AuthenticationError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        AuthenticationError {
            inner: Inner::Message(message.into()),
        }
    }

    pub fn from_source(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        AuthenticationError {
            inner: Inner::Source(source.into()),
        }
    }

    /// The handler's own error, if it provided one.
    pub fn into_source(self) -> Option<Box<dyn std::error::Error + Send + Sync + 'static>> {
        match self.inner {
            Inner::Message(_) => None,
            Inner::Source(source) => Some(source),
        }
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Message(message) => f.write_str(message),
            Inner::Source(source) => source.fmt(f),
        }
    }
}

impl fmt::Debug for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Message(message) => f.debug_tuple("AuthenticationError").field(message).finish(),
            Inner::Source(source) => f.debug_tuple("AuthenticationError").field(source).finish(),
        }
    }
}

impl std::error::Error for AuthenticationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.inner {
            Inner::Message(_) => None,
            Inner::Source(source) => Some(source.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("token endpoint unreachable")]
    struct Unreachable;

    #[test]
    fn authentication_error_is_displayed_unchanged() {
        let error = BuildError::from(AuthenticationError::new("credential expired"));
        insta::assert_snapshot!(error, @"credential expired");

        let error = BuildError::from(AuthenticationError::from_source(Unreachable));
        insta::assert_snapshot!(error, @"token endpoint unreachable");
    }

    #[test]
    fn authentication_error_keeps_the_handler_error() {
        let error = AuthenticationError::from_source(Unreachable);
        assert!(std::error::Error::source(&error).is_some());

        let source = error.into_source().unwrap();
        assert!(source.downcast_ref::<Unreachable>().is_some());

        assert!(AuthenticationError::new("nope").into_source().is_none());
    }

    #[test]
    fn request_construction_messages() {
        let error = RequestConstructionError::invalid_endpoint("not a url", "relative URL without a base");
        insta::assert_snapshot!(error, @"Invalid endpoint `not a url`: relative URL without a base");

        let error = RequestConstructionError::InvalidHeaderName {
            name: "bad header".into(),
        };
        insta::assert_snapshot!(error, @"Invalid header name `bad header`");
    }

    #[test]
    fn variables_not_an_object_message() {
        let error = BuildError::from(SerializationError::VariablesNotAnObject { found: "an array" });
        assert!(!error.is_authentication());
        insta::assert_snapshot!(error, @"Variables must serialize to a JSON object, got an array");
    }
}
