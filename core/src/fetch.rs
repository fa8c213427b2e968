//! The seam between the client and the network.

use crate::cache::CacheOptions;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one request, honouring (or ignoring) the call's cache hints.
///
/// Non-2xx statuses are data, not errors: implementations return them as an
/// `HttpResponse` and leave interpretation to the client. `Err` means no
/// response was obtained at all.
pub trait Fetch {
    fn fetch(
        &self,
        request: &HttpRequest,
        options: &CacheOptions,
    ) -> Result<HttpResponse, TransportError>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(
        &self,
        request: &HttpRequest,
        options: &CacheOptions,
    ) -> Result<HttpResponse, TransportError> {
        (**self).fetch(request, options)
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_fetch::UreqFetcher;

#[cfg(feature = "ureq")]
mod ureq_fetch {
    use tracing::debug;

    use super::Fetch;
    use crate::cache::CacheOptions;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking fetcher backed by a `ureq` agent. Always fetches fresh; wrap
    /// it in `MemoryCache` to honour cache strategies.
    #[derive(Clone)]
    pub struct UreqFetcher {
        agent: ureq::Agent,
    }

    impl UreqFetcher {
        pub fn new() -> Self {
            // 4xx/5xx come back as data so the client can name the failure.
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Fetch for UreqFetcher {
        fn fetch(
            &self,
            request: &HttpRequest,
            options: &CacheOptions,
        ) -> Result<HttpResponse, TransportError> {
            debug!(
                op = options.display_name,
                method = request.method.as_str(),
                path = %request.path,
                "sending request"
            );

            let result = match request.method {
                HttpMethod::Post => {
                    let mut builder = self.agent.post(&request.path);
                    for (name, value) in &request.headers {
                        builder = builder.header(name.as_str(), value.as_str());
                    }
                    match &request.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };

            let mut response = result.map_err(|e| TransportError(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
