use std::collections::HashMap;

use super::method::HttpMethod;

/// A fully assembled request description, ready to hand to the HTTP layer.
/// Computing one is side-effect free; nothing is sent until
/// [`client::send_request`](super::client::send_request) is called.
#[derive(Debug, Clone)]
pub struct SynthesizedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Body text plus the `Content-Type` it implies. `None` for methods that
    /// do not carry a body.
    pub body: Option<RequestPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    pub content: String,
    pub content_type: String,
}
