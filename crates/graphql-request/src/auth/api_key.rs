use secrecy::{ExposeSecret, SecretString};

use super::{AuthHandler, sensitive_header_value};
use crate::{AuthenticationError, OutboundRequest};

const DEFAULT_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyLocation {
    /// Sent as the value of this header.
    Header(String),
    /// Appended to the request URI as this query parameter.
    Query(String),
}

impl Default for ApiKeyLocation {
    fn default() -> Self {
        ApiKeyLocation::Header(DEFAULT_HEADER.to_string())
    }
}

/// A static API key, sent in a header (`X-API-Key` by default) or in the query string.
pub struct ApiKey {
    key: SecretString,
    location: ApiKeyLocation,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey {
            key: SecretString::new(key.into()),
            location: ApiKeyLocation::default(),
        }
    }

    #[must_use]
    pub fn in_header(mut self, name: impl Into<String>) -> Self {
        self.location = ApiKeyLocation::Header(name.into());
        self
    }

    #[must_use]
    pub fn in_query(mut self, parameter: impl Into<String>) -> Self {
        self.location = ApiKeyLocation::Query(parameter.into());
        self
    }

    pub fn location(&self) -> &ApiKeyLocation {
        &self.location
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl AuthHandler for ApiKey {
    fn apply_auth(&self, request: &mut OutboundRequest) -> Result<(), AuthenticationError> {
        let key = self.key.expose_secret();

        match &self.location {
            ApiKeyLocation::Header(name) => {
                let name = http::HeaderName::try_from(name.as_str())
                    .map_err(|_| AuthenticationError::new(format!("Invalid API key header name `{name}`")))?;
                request.headers_mut().insert(name, sensitive_header_value(key)?);
            }
            ApiKeyLocation::Query(parameter) => {
                let mut url = url::Url::parse(&request.uri().to_string()).map_err(AuthenticationError::from_source)?;
                url.query_pairs_mut().append_pair(parameter, key);

                *request.uri_mut() = url
                    .as_str()
                    .parse()
                    .map_err(|err: http::uri::InvalidUri| AuthenticationError::from_source(err))?;
            }
        }

        Ok(())
    }
}
