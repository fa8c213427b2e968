//! Client for an external wishlist service, bound to one visitor session.
//!
//! # Overview
//! A storefront route handler builds a `WishlistClient` per request from the
//! service `WishlistConfig`, the inbound `RequestContext`, the visitor's
//! `Session` and a `Fetch` implementation, then invokes one operation. The
//! client makes sure an anonymous (or email-bound) identity exists in the
//! session before every call, shapes the form-encoded request, and names the
//! failure when the service says no.
//!
//! # Design
//! - `WishlistRequests` is stateless: `build_*` methods produce plain-data
//!   `HttpRequest`s, so request shapes are testable without I/O.
//! - Network access sits behind `Fetch`. `UreqFetcher` is the blocking
//!   default; `MemoryCache` layers per-call `CacheStrategy` handling on top.
//! - The session is an injected capability, never global state.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod http;
pub mod requests;
pub mod session;
pub mod types;

pub use cache::{CacheOptions, CacheStrategy, MemoryCache};
pub use client::WishlistClient;
pub use config::WishlistConfig;
pub use context::RequestContext;
pub use error::{ListNameError, ListOp, ShareOp, TransportError, WishlistError};
pub use fetch::Fetch;
#[cfg(feature = "ureq")]
pub use fetch::UreqFetcher;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use requests::{Credentials, WishlistRequests};
pub use session::{clear_identity, MemorySession, Session, SessionKey};
pub use types::{
    validate_list_name, ErrorPayload, GuestSync, Identity, ItemRef, SoftResult, WishlistList,
};
