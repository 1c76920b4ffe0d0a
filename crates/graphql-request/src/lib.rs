//! Builds authenticated GraphQL-over-HTTP requests.
//!
//! A [`RequestBuilder`] holds an endpoint, a query, its variables, extra headers and an optional
//! [`AuthHandler`]. Each call to [`RequestBuilder::build`] produces a new POST [`OutboundRequest`] with a
//! `{"query": ..., "variables": {...}}` JSON body, bound to an [`ExecutionContext`]. Sending it is left to
//! the caller's HTTP client.
//!
//! ```
//! use std::sync::Arc;
//!
//! use graphql_request::{BearerToken, ExecutionContext, RequestBuilder};
//!
//! let builder = RequestBuilder::new(
//!     "https://api.example.com/graphql",
//!     "query { viewer { id } }",
//!     None,
//!     None,
//!     Some(Arc::new(BearerToken::new("tok"))),
//! )
//! .with_variable("limit", 10)
//! .with_header("X-Trace", "abc");
//!
//! let request = builder.build(&ExecutionContext::new()).unwrap();
//! assert_eq!(request.headers()["authorization"], "Bearer tok");
//! ```

mod auth;
mod builder;
mod config;
mod context;
mod error;
mod finite;
mod request;

pub use auth::{
    AccessToken, ApiKey, ApiKeyLocation, AuthHandler, BasicAuth, BearerToken, NoAuth, SharedToken, TokenStore,
};
pub use builder::{Headers, RequestBuilder, Variables};
pub use config::{AuthConfig, GraphqlRequestConfig};
pub use context::{ExecutionContext, Interrupted};
pub use error::{AuthenticationError, BuildError, RequestConstructionError, SerializationError};
#[cfg(feature = "reqwest")]
pub use request::into_reqwest;
pub use request::{OutboundRequest, OutboundRequestExt};
