//! Cache hints carried by every outbound call, and an in-process cache.
//!
//! # Design
//! The client never caches anything itself. Each call carries a fixed
//! per-operation key and a `CacheStrategy` chosen by the caller; whichever
//! `Fetch` implementation sits behind the client decides what to do with
//! them. `MemoryCache` is one such implementation, wrapping another fetcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::fetch::Fetch;
use crate::http::{HttpRequest, HttpResponse};

/// How long a response may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Always fetch fresh. The default for every call.
    #[default]
    None,
    /// One second fresh, nine more seconds stale.
    Short,
    /// One hour fresh, 23 more hours stale.
    Long,
    Custom {
        max_age: u64,
        stale_while_revalidate: u64,
    },
}

impl CacheStrategy {
    fn window(&self) -> Option<(u64, u64)> {
        match *self {
            CacheStrategy::None => None,
            CacheStrategy::Short => Some((1, 9)),
            CacheStrategy::Long => Some((3600, 82800)),
            CacheStrategy::Custom {
                max_age,
                stale_while_revalidate,
            } => Some((max_age, stale_while_revalidate)),
        }
    }

    /// `Cache-Control` rendering of the strategy.
    pub fn cache_control(&self) -> String {
        match self.window() {
            None => "no-store".to_string(),
            Some((max_age, swr)) => {
                format!("public, max-age={max_age}, stale-while-revalidate={swr}")
            }
        }
    }

    /// Total time an entry may be served, or `None` when caching is off.
    pub fn ttl(&self) -> Option<Duration> {
        self.window()
            .map(|(max_age, swr)| Duration::from_secs(max_age + swr))
    }
}

/// Per-call cache hints passed alongside each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Fixed string per operation kind, e.g. `fetch-lists`.
    pub key: &'static str,
    pub strategy: CacheStrategy,
    /// Name used in logs.
    pub display_name: &'static str,
}

struct Entry {
    response: HttpResponse,
    stored_at: Instant,
    ttl: Duration,
}

/// A `Fetch` wrapper that reuses successful responses for the lifetime the
/// call's `CacheStrategy` allows.
///
/// Entries are keyed by the call's cache key plus the request path and body,
/// so two visitors never share a response. Clones share the same entries.
pub struct MemoryCache<F> {
    inner: F,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl<F: Fetch> MemoryCache<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry whose lifetime has passed.
    pub fn purge_expired(&self) {
        self.entries
            .lock()
            .retain(|_, entry| entry.stored_at.elapsed() < entry.ttl);
    }

    fn entry_key(request: &HttpRequest, options: &CacheOptions) -> String {
        format!(
            "{}\n{}\n{}",
            options.key,
            request.path,
            request.body.as_deref().unwrap_or_default()
        )
    }
}

impl<F: Fetch + Clone> Clone for MemoryCache<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<F: Fetch> Fetch for MemoryCache<F> {
    fn fetch(
        &self,
        request: &HttpRequest,
        options: &CacheOptions,
    ) -> Result<HttpResponse, TransportError> {
        let Some(ttl) = options.strategy.ttl() else {
            return self.inner.fetch(request, options);
        };

        let key = Self::entry_key(request, options);
        if let Some(entry) = self.entries.lock().get(&key) {
            if entry.stored_at.elapsed() < entry.ttl {
                debug!(cache_key = options.key, op = options.display_name, "cache hit");
                return Ok(entry.response.clone());
            }
        }

        let response = self.inner.fetch(request, options)?;
        if response.is_success() {
            self.entries.lock().insert(
                key,
                Entry {
                    response: response.clone(),
                    stored_at: Instant::now(),
                    ttl,
                },
            );
        }
        Ok(response)
    }
}
