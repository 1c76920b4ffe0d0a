use bytes::Bytes;

use crate::ExecutionContext;

/// A fully assembled GraphQL-over-HTTP request, ready for any HTTP transport.
///
/// The [`ExecutionContext`] it was built with travels in its extensions.
pub type OutboundRequest = http::Request<Bytes>;

pub trait OutboundRequestExt {
    /// The context the request was built with, if it went through a [`RequestBuilder`](crate::RequestBuilder).
    fn execution_context(&self) -> Option<&ExecutionContext>;
}

impl OutboundRequestExt for OutboundRequest {
    fn execution_context(&self) -> Option<&ExecutionContext> {
        self.extensions().get::<ExecutionContext>()
    }
}

/// Converts a built request for the reqwest client. The time left in the execution context becomes the
/// request timeout.
#[cfg(feature = "reqwest")]
pub fn into_reqwest(request: OutboundRequest) -> Result<reqwest::Request, crate::RequestConstructionError> {
    let timeout = request.execution_context().and_then(ExecutionContext::remaining);
    let (parts, body) = request.into_parts();

    let uri = parts.uri.to_string();
    let url = url::Url::parse(&uri).map_err(|err| crate::RequestConstructionError::invalid_endpoint(&uri, err))?;

    let mut req = reqwest::Request::new(parts.method, url);
    *req.headers_mut() = parts.headers;
    *req.body_mut() = Some(body.into());
    *req.timeout_mut() = timeout;

    Ok(req)
}
