//! The inbound request as far as the client cares about it.

/// Query parameters of the page request that triggered the client call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    useremail: Option<String>,
}

impl RequestContext {
    /// Read the `useremail` query parameter from a full or relative URL.
    /// Empty values count as absent.
    pub fn from_url(url: &str) -> Self {
        let query = url
            .split_once('?')
            .map(|(_, q)| q.split_once('#').map_or(q, |(q, _)| q))
            .unwrap_or("");
        let useremail = crate::http::form_decode(query)
            .into_iter()
            .find(|(k, _)| k == "useremail")
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty());
        Self { useremail }
    }

    pub fn with_useremail(email: &str) -> Self {
        Self {
            useremail: Some(email.to_string()),
        }
    }

    pub fn useremail(&self) -> Option<&str> {
        self.useremail.as_deref()
    }
}
