//! Stateless request builder for the wishlist service.
//!
//! # Design
//! `WishlistRequests` holds only the service configuration. Each endpoint has
//! one `build_*` method producing an `HttpRequest`; nothing here reads the
//! session or touches the network, so every request shape can be asserted on
//! directly. `WishlistClient` layers identity handling and I/O on top.

use serde::Serialize;
use uuid::Uuid;

use crate::config::WishlistConfig;
use crate::error::WishlistError;
use crate::http::{basic_auth, form_encode, HttpMethod, HttpRequest, CONTENT_TYPE_FORM};
use crate::types::{AddEntry, DeleteEntry, ItemRef};

/// `user-agent` the list endpoints expect on writes.
pub const LIST_USER_AGENT: &str = "headlesswebApp";

/// The identity pair sent with every list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub regid: &'a str,
    pub sessionid: &'a str,
}

#[derive(Clone, Copy)]
enum Headers {
    Form,
    FormJson,
    ListWrite,
}

#[derive(Clone)]
pub struct WishlistRequests {
    endpoint: String,
    pid: String,
    rest_api_key: String,
    user_agent_type: String,
}

impl std::fmt::Debug for WishlistRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistRequests")
            .field("endpoint", &self.endpoint)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl WishlistRequests {
    pub fn new(config: &WishlistConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            pid: config.pid.clone(),
            rest_api_key: config.rest_api_key.clone(),
            user_agent_type: config.user_agent_type.clone(),
        }
    }

    /// Identity bootstrap. An email ties the identity to a known shopper;
    /// otherwise `uuid` serves as the anonymous handle.
    pub fn build_generate_regid(&self, useremail: Option<&str>, uuid: Uuid) -> HttpRequest {
        let uuid = uuid.to_string();
        let mut fields = vec![("useragenttype", self.user_agent_type.as_str())];
        match useremail {
            Some(email) => fields.push(("useremail", email)),
            None => fields.push(("uuid", uuid.as_str())),
        }
        self.admin_post("generate-regid", &fields)
    }

    pub fn build_create_list(&self, lname: &str, creds: Credentials<'_>) -> HttpRequest {
        self.list_post(
            "create",
            Headers::ListWrite,
            &[
                ("lname", lname),
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
            ],
        )
    }

    pub fn build_update_list(
        &self,
        item: &ItemRef,
        lid: &str,
        creds: Credentials<'_>,
    ) -> Result<HttpRequest, WishlistError> {
        let additions = to_json(&[AddEntry::from(item)])?;
        Ok(self.list_post(
            "update-ctx",
            Headers::ListWrite,
            &[
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
                ("lid", lid),
                ("a", additions.as_str()),
            ],
        ))
    }

    pub fn build_remove_item(
        &self,
        item: &ItemRef,
        lid: &str,
        creds: Credentials<'_>,
    ) -> Result<HttpRequest, WishlistError> {
        let deletions = to_json(&[DeleteEntry::from(item)])?;
        Ok(self.list_post(
            "update-ctx",
            Headers::ListWrite,
            &[
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
                ("lid", lid),
                ("d", deletions.as_str()),
            ],
        ))
    }

    pub fn build_fetch_lists(&self, creds: Credentials<'_>) -> HttpRequest {
        self.list_post(
            "fetch-lists",
            Headers::FormJson,
            &[("regid", creds.regid), ("sessionid", creds.sessionid)],
        )
    }

    pub fn build_fetch_list_with_contents(&self, lid: &str, creds: Credentials<'_>) -> HttpRequest {
        self.list_post(
            "fetch-list-with-contents",
            Headers::Form,
            &[
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
                ("lid", lid),
            ],
        )
    }

    pub fn build_guest_validate_sync(&self, regid: &str, useremail: &str) -> HttpRequest {
        self.admin_post(
            "guest-validate-sync",
            &[
                ("regid", regid),
                ("useremail", useremail),
                ("useragenttype", self.user_agent_type.as_str()),
            ],
        )
    }

    pub fn build_mark_public(&self, lid: &str, creds: Credentials<'_>) -> HttpRequest {
        self.list_post(
            "markPublic",
            Headers::Form,
            &[
                ("lid", lid),
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
            ],
        )
    }

    pub fn build_email_share(
        &self,
        lid: &str,
        sender_name: &str,
        recipient_email: &str,
        creds: Credentials<'_>,
    ) -> HttpRequest {
        self.list_post(
            "emailList",
            Headers::Form,
            &[
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
                ("lid", lid),
                ("fromname", sender_name),
                ("toemail", recipient_email),
            ],
        )
    }

    pub fn build_report_share(
        &self,
        lid: &str,
        medium: &str,
        sender_name: &str,
        creds: Credentials<'_>,
    ) -> HttpRequest {
        self.list_post(
            "reportShare",
            Headers::Form,
            &[
                ("regid", creds.regid),
                ("sessionid", creds.sessionid),
                ("lid", lid),
                ("fromname", sender_name),
                ("medium", medium),
            ],
        )
    }

    fn list_post(&self, action: &str, headers: Headers, fields: &[(&str, &str)]) -> HttpRequest {
        let mut header_list = vec![("content-type".to_string(), CONTENT_TYPE_FORM.to_string())];
        if matches!(headers, Headers::FormJson | Headers::ListWrite) {
            header_list.push(("accept".to_string(), "application/json".to_string()));
        }
        if matches!(headers, Headers::ListWrite) {
            header_list.push(("user-agent".to_string(), LIST_USER_AGENT.to_string()));
        }
        HttpRequest {
            method: HttpMethod::Post,
            path: format!(
                "{}/api/v3/lists/{action}?pid={}",
                self.endpoint,
                urlencoding::encode(&self.pid)
            ),
            headers: header_list,
            body: Some(form_encode(fields)),
        }
    }

    fn admin_post(&self, action: &str, fields: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/storeadmin/v3/user/{action}", self.endpoint),
            headers: vec![
                (
                    "authorization".to_string(),
                    basic_auth(&self.pid, &self.rest_api_key),
                ),
                ("content-type".to_string(), CONTENT_TYPE_FORM.to_string()),
            ],
            body: Some(form_encode(fields)),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, WishlistError> {
    serde_json::to_string(value).map_err(|e| WishlistError::Serialization(e.to_string()))
}
