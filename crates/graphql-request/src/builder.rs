use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use headers::HeaderMapExt;
use serde::Serialize;
use serde_json::Value;

use crate::{
    AuthHandler, BuildError, ExecutionContext, OutboundRequest, RequestConstructionError, SerializationError,
    finite::ensure_finite,
};

/// Parameter bindings of a query, sent as the `variables` object.
pub type Variables = serde_json::Map<String, Value>;

/// Caller-supplied headers. Names are matched case-insensitively once applied to a request.
pub type Headers = BTreeMap<String, String>;

/// Holds everything needed to produce GraphQL-over-HTTP requests for one query.
///
/// A builder is read-only once constructed and can be shared to build any number of independent
/// requests. Every request is a POST whose body is `{"query": ..., "variables": {...}}`. Headers are
/// applied in three passes, each overriding the previous one:
///
/// 1. `Content-Type: application/json` and `Accept: application/json`,
/// 2. the caller's headers,
/// 3. the authentication handler, if any.
///
/// Variables default to a JSON map but any serializable type producing a JSON object can be used
/// through [`RequestBuilder::typed`].
#[derive(Clone)]
pub struct RequestBuilder<V = Variables> {
    endpoint: String,
    query: String,
    variables: V,
    headers: Headers,
    auth: Option<Arc<dyn AuthHandler>>,
}

impl RequestBuilder<Variables> {
    /// Missing variables or headers are replaced by empty ones. Nothing is validated until
    /// [`RequestBuilder::build`].
    pub fn new(
        endpoint: impl Into<String>,
        query: impl Into<String>,
        variables: Option<Variables>,
        headers: Option<Headers>,
        auth: Option<Arc<dyn AuthHandler>>,
    ) -> Self {
        Self::typed(endpoint, query, variables, headers, auth)
    }

    /// Adds or replaces a variable.
    ///
    /// `serde_json` converts NaN and infinite floats to `null` here, before the builder ever sees
    /// them. Use [`RequestBuilder::try_with_variable`] to reject them instead.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Adds or replaces a variable from any serializable value, failing on values JSON cannot
    /// represent.
    pub fn try_with_variable(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, SerializationError> {
        ensure_finite(&value)?;
        let value = serde_json::to_value(value)?;
        self.variables.insert(name.into(), value);
        Ok(self)
    }
}

impl<V: Default> RequestBuilder<V> {
    /// Same as [`RequestBuilder::new`] with user-defined variables.
    pub fn typed(
        endpoint: impl Into<String>,
        query: impl Into<String>,
        variables: Option<V>,
        headers: Option<Headers>,
        auth: Option<Arc<dyn AuthHandler>>,
    ) -> Self {
        RequestBuilder {
            endpoint: endpoint.into(),
            query: query.into(),
            variables: variables.unwrap_or_default(),
            headers: headers.unwrap_or_default(),
            auth,
        }
    }
}

impl<V> RequestBuilder<V> {
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: impl AuthHandler + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    #[must_use]
    pub fn without_auth(mut self) -> Self {
        self.auth = None;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &V {
        &self.variables
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn auth(&self) -> Option<&Arc<dyn AuthHandler>> {
        self.auth.as_ref()
    }
}

#[derive(Serialize)]
struct GraphqlBody<'a> {
    query: &'a str,
    variables: &'a Variables,
}

impl<V: Serialize> RequestBuilder<V> {
    /// Assembles a new request bound to `ctx`. No I/O is performed, the builder is left untouched and
    /// no partial request is returned on error.
    pub fn build(&self, ctx: &ExecutionContext) -> Result<OutboundRequest, BuildError> {
        let body = self.serialize_body()?;

        let mut request = http::Request::new(body);
        *request.method_mut() = http::Method::POST;
        *request.uri_mut() = self.uri()?;
        request.extensions_mut().insert(ctx.clone());

        request.headers_mut().typed_insert(headers::ContentType::json());
        request
            .headers_mut()
            .insert(http::header::ACCEPT, http::HeaderValue::from_static("application/json"));

        self.overlay_headers(&mut request)?;

        if let Some(auth) = &self.auth {
            auth.apply_auth(&mut request).inspect_err(|err| {
                tracing::debug!(endpoint = %self.endpoint, error = %err, "Authentication failed");
            })?;
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            body_size = request.body().len(),
            "Built GraphQL request"
        );

        Ok(request)
    }

    fn serialize_body(&self) -> Result<Bytes, SerializationError> {
        ensure_finite(&self.variables)?;

        let variables = match serde_json::to_value(&self.variables)? {
            Value::Object(variables) => variables,
            // Serializing `None` or unit-like variables yields null, sent as an empty object.
            Value::Null => Variables::new(),
            other => {
                return Err(SerializationError::VariablesNotAnObject {
                    found: json_kind(&other),
                });
            }
        };

        let body = serde_json::to_vec(&GraphqlBody {
            query: &self.query,
            variables: &variables,
        })?;

        Ok(body.into())
    }

    fn uri(&self) -> Result<http::Uri, RequestConstructionError> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|err| RequestConstructionError::invalid_endpoint(&self.endpoint, err))?;

        url.as_str()
            .parse()
            .map_err(|err: http::uri::InvalidUri| RequestConstructionError::invalid_endpoint(&self.endpoint, err))
    }

    fn overlay_headers(&self, request: &mut OutboundRequest) -> Result<(), RequestConstructionError> {
        let mut applied = HashSet::with_capacity(self.headers.len());

        for (name, value) in &self.headers {
            let header_name = http::HeaderName::try_from(name.as_str())
                .map_err(|_| RequestConstructionError::InvalidHeaderName { name: name.clone() })?;
            let header_value = http::HeaderValue::try_from(value.as_str())
                .map_err(|_| RequestConstructionError::InvalidHeaderValue { name: name.clone() })?;

            if !applied.insert(header_name.clone()) {
                tracing::warn!(
                    header = %header_name,
                    kept = %name,
                    "Header provided several times with different casing"
                );
            }

            request.headers_mut().insert(header_name, header_value);
        }

        Ok(())
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for RequestBuilder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("endpoint", &self.endpoint)
            .field("query", &self.query)
            .field("variables", &self.variables)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("authenticated", &self.auth.is_some())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
