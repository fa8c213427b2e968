//! Visitor session seam.
//!
//! The web framework owns the session and persists it between requests; the
//! client only reads and writes two keys through the `Session` trait.

use std::collections::HashMap;

/// The keys the client touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    RegId,
    SessionId,
}

impl SessionKey {
    /// Name under which the framework stores the value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::RegId => "regId",
            SessionKey::SessionId => "sessionId",
        }
    }
}

/// Key/value capability over the current visitor's session.
pub trait Session {
    fn get(&self, key: SessionKey) -> Option<String>;
    fn set(&mut self, key: SessionKey, value: String);
    fn unset(&mut self, key: SessionKey);
}

impl<S: Session + ?Sized> Session for &mut S {
    fn get(&self, key: SessionKey) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: SessionKey, value: String) {
        (**self).set(key, value)
    }

    fn unset(&mut self, key: SessionKey) {
        (**self).unset(key)
    }
}

/// Drop the visitor's registration identity, as the logout flow does.
///
/// Only `regId` is removed; the next bootstrap replaces `sessionId`.
pub fn clear_identity<S: Session + ?Sized>(session: &mut S) {
    session.unset(SessionKey::RegId);
}

/// In-memory session, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<SessionKey, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that already carries an identity pair.
    pub fn with_identity(regid: &str, sessionid: &str) -> Self {
        let mut session = Self::new();
        session.set(SessionKey::RegId, regid.to_string());
        session.set(SessionKey::SessionId, sessionid.to_string());
        session
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Session for MemorySession {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values.get(&key).cloned()
    }

    fn set(&mut self, key: SessionKey, value: String) {
        self.values.insert(key, value);
    }

    fn unset(&mut self, key: SessionKey) {
        self.values.remove(&key);
    }
}
