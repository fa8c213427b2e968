//! Error types for the wishlist client.
//!
//! # Design
//! Failures are named after the operation that failed, not after the HTTP
//! status that caused them: callers react to "create failed" or "sharing
//! failed", and the status/body detail travels along in `reason` for logs.
//! The two soft-degrading reads never produce these; they return
//! `SoftResult::Err` instead.

use std::fmt;

use thiserror::Error;

/// Errors returned by `WishlistClient` operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The anonymous/identified registration identity could not be obtained.
    #[error("failed to generate regid: {0}")]
    Bootstrap(String),

    /// A list read or write was rejected or never reached the service.
    #[error("wishlist {kind} failed: {reason}")]
    ListOperation { kind: ListOp, reason: String },

    /// A sharing call was rejected or never reached the service.
    #[error("wishlist share ({kind}) failed: {reason}")]
    ShareOperation { kind: ShareOp, reason: String },

    /// An item payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl WishlistError {
    /// Operation name carried by the failure.
    pub fn operation(&self) -> &'static str {
        match self {
            WishlistError::Bootstrap(_) => "bootstrap",
            WishlistError::ListOperation { kind, .. } => kind.as_str(),
            WishlistError::ShareOperation { kind, .. } => kind.as_str(),
            WishlistError::Serialization(_) => "serialize",
        }
    }
}

/// List operations that fail hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Create,
    Update,
    Remove,
    FetchContents,
}

impl ListOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOp::Create => "create",
            ListOp::Update => "update",
            ListOp::Remove => "remove",
            ListOp::FetchContents => "fetchContents",
        }
    }
}

impl fmt::Display for ListOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sharing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOp {
    MarkPublic,
    Email,
    ReportShare,
}

impl ShareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareOp::MarkPublic => "markPublic",
            ShareOp::Email => "email",
            ShareOp::ReportShare => "reportShare",
        }
    }
}

impl fmt::Display for ShareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// A list name rejected by `validate_list_name`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ListNameError {
    #[error("Please enter a wishlist name.")]
    Empty,
    #[error("Name must be at least 3 characters long")]
    TooShort,
    #[error("Name must be at most 50 characters long")]
    TooLong,
    #[error("A wishlist with that name already exists")]
    Duplicate,
}
