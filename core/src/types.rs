//! Domain DTOs for the wishlist service.
//!
//! # Design
//! Only the fields the client acts on are typed (`regid`, `sessionid`,
//! `lid`, `lname`). Everything else the service returns is kept in `extra`
//! so callers rendering pages see the full record. Types are defined
//! independently from the mock-server crate; integration tests catch drift.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ListNameError;

pub const LIST_NAME_MIN: usize = 3;
pub const LIST_NAME_MAX: usize = 50;

/// Identity pair assigned by `generate-regid`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub regid: String,
    pub sessionid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One named wishlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistList {
    pub lid: String,
    #[serde(default)]
    pub lname: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of merging the current regid with an email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestSync {
    pub regid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The product/variant pair an update targets, plus its storefront URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub product_id: u64,
    pub variant_id: u64,
    pub product_url: String,
}

impl ItemRef {
    pub fn new(product_id: u64, variant_id: u64, product_url: impl Into<String>) -> Self {
        Self {
            product_id,
            variant_id,
            product_url: product_url.into(),
        }
    }
}

/// Entry of an `a` (add) array. Field order is the wire order.
#[derive(Debug, Serialize)]
pub(crate) struct AddEntry<'a> {
    pub epi: u64,
    pub empi: u64,
    pub du: &'a str,
    pub cprops: OriginProps<'a>,
    pub note: Option<&'a str>,
    pub qty: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct OriginProps<'a> {
    pub ou: &'a str,
}

/// Entry of a `d` (delete) array.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteEntry<'a> {
    pub epi: u64,
    pub empi: u64,
    pub du: &'a str,
}

impl<'a> From<&'a ItemRef> for AddEntry<'a> {
    fn from(item: &'a ItemRef) -> Self {
        AddEntry {
            epi: item.variant_id,
            empi: item.product_id,
            du: &item.product_url,
            cprops: OriginProps {
                ou: &item.product_url,
            },
            note: None,
            qty: 1,
        }
    }
}

impl<'a> From<&'a ItemRef> for DeleteEntry<'a> {
    fn from(item: &'a ItemRef) -> Self {
        DeleteEntry {
            epi: item.variant_id,
            empi: item.product_id,
            du: &item.product_url,
        }
    }
}

/// Inline error body returned by the soft-degrading reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub error: String,
}

/// Outcome of a read that must not fail the page it feeds.
///
/// Serializes untagged: either the data itself or `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SoftResult<T> {
    Ok(T),
    Err(ErrorPayload),
}

impl<T> SoftResult<T> {
    pub(crate) fn error(message: impl Into<String>) -> Self {
        SoftResult::Err(ErrorPayload {
            error: message.into(),
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SoftResult::Ok(_))
    }

    /// HTTP status a route handler should answer with.
    pub fn status(&self) -> u16 {
        match self {
            SoftResult::Ok(_) => 200,
            SoftResult::Err(_) => 500,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            SoftResult::Ok(value) => Some(value),
            SoftResult::Err(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorPayload> {
        match self {
            SoftResult::Ok(_) => None,
            SoftResult::Err(payload) => Some(payload),
        }
    }
}

/// Check a proposed list name the way the storefront UI does before it
/// calls `create_list`. The client itself passes names through unchecked.
pub fn validate_list_name(name: &str, existing: &[WishlistList]) -> Result<(), ListNameError> {
    let len = name.chars().count();
    if len == 0 {
        return Err(ListNameError::Empty);
    }
    if len < LIST_NAME_MIN {
        return Err(ListNameError::TooShort);
    }
    if len > LIST_NAME_MAX {
        return Err(ListNameError::TooLong);
    }
    if existing.iter().any(|list| list.lname == name) {
        return Err(ListNameError::Duplicate);
    }
    Ok(())
}
