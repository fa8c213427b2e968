//! HTTP transport types for the wishlist service.
//!
//! # Design
//! Requests and responses are plain data. `WishlistRequests` builds
//! `HttpRequest` values without touching the network; a `Fetch`
//! implementation (see `cache`) executes them and hands back an
//! `HttpResponse`. Keeping the wire shapes as data makes every request the
//! client emits inspectable in tests.
//!
//! All fields use owned types so values can be recorded, cached and replayed
//! without lifetime concerns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the form body back into its fields. Used by tests and by the
    /// in-memory cache to build lookup keys.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.body.as_deref().map(form_decode).unwrap_or_default()
    }

    /// Value of a single form field, if present.
    pub fn form_field(&self, name: &str) -> Option<String> {
        self.form_fields()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// The only success criterion: a 2xx transport status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Encode `pairs` as an `application/x-www-form-urlencoded` body, keeping
/// field order.
pub fn form_encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Inverse of `form_encode`. Malformed escapes are kept verbatim.
pub fn form_decode(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

/// `Basic` authorization header value for `user:password`.
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

// Form encoding writes spaces as '+', unlike plain percent-encoding.
fn encode_component(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|c| c.into_owned())
        .unwrap_or(spaced)
}
