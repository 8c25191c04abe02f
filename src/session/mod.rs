// Read-only access to the bearer credential, plus the in-memory store the binary uses

use std::sync::RwLock;

use chrono::{DateTime, Utc};

/// A credential as handed out by the login endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

pub trait SessionStore: Send + Sync {
    fn credential(&self) -> Option<Credential>;

    /// Bearer token if present, non-empty and not expired.
    fn bearer_token(&self) -> Option<String> {
        self.credential()
            .filter(|c| !c.token.is_empty() && !c.is_expired(Utc::now()))
            .map(|c| c.token)
    }
}

#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Option<Credential>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemorySession {
            inner: RwLock::new(Some(Credential::new(token))),
        }
    }

    pub fn login(&self, credential: Credential) {
        tracing::debug!(expires_at = ?credential.expires_at, "session credential stored");
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(credential);
        }
    }

    pub fn logout(&self) {
        tracing::debug!("session cleared");
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }
}

impl SessionStore for MemorySession {
    fn credential(&self) -> Option<Credential> {
        self.inner.read().ok().and_then(|c| c.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn empty_session_has_no_token() {
        let s = MemorySession::new();
        assert_eq!(s.bearer_token(), None);
    }

    #[test]
    fn login_then_logout() {
        let s = MemorySession::new();
        s.login(Credential::new("abc"));
        assert_eq!(s.bearer_token().as_deref(), Some("abc"));
        s.logout();
        assert_eq!(s.bearer_token(), None);
    }

    #[test]
    fn expired_token_counts_as_absent() {
        let s = MemorySession::new();
        s.login(Credential {
            token: "old".into(),
            expires_at: Some(Utc::now() - Duration::minutes(5)),
        });
        assert_eq!(s.bearer_token(), None);

        s.login(Credential {
            token: "fresh".into(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        });
        assert_eq!(s.bearer_token().as_deref(), Some("fresh"));
    }

    #[test]
    fn blank_token_counts_as_absent() {
        let s = MemorySession::with_token("");
        assert_eq!(s.bearer_token(), None);
    }
}
