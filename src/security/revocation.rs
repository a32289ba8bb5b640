use chrono::Utc;
use dashmap::DashMap;

/// Entries for tokens that already expired still get a short lifetime so a
/// double revoke observably hits the set before pruning.
const EXPIRED_TOKEN_GRACE_SECS: i64 = 60;

/// In-process denylist of revoked token ids (`jti` → revoked-until).
///
/// Tokens are stateless, so logout and refresh rotation record the token id
/// here and validation refuses anything it finds. Entries outlive the token's
/// own expiry by nothing: once `exp` passes, signature validation rejects the
/// token anyway, so stale entries are dropped lazily on lookup.
#[derive(Debug, Default)]
pub struct RevocationSet {
    entries: DashMap<String, i64>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a token id revoked until the token's own expiry.
    pub fn insert(&self, jti: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        let until = expires_at.max(now + EXPIRED_TOKEN_GRACE_SECS);
        self.entries.insert(jti.to_string(), until);
    }

    /// True while the id is still inside its revocation window. Expired
    /// entries are removed on the way out.
    pub fn contains(&self, jti: &str) -> bool {
        let now = Utc::now().timestamp();
        match self.entries.get(jti).map(|entry| *entry.value()) {
            Some(until) if until > now => true,
            Some(_) => {
                self.entries.remove(jti);
                false
            }
            None => false,
        }
    }

    /// Drops every entry whose window has passed.
    pub fn prune(&self) {
        let now = Utc::now().timestamp();
        self.entries.retain(|_, until| *until > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn insert_raw(&self, jti: &str, until: i64) {
        self.entries.insert(jti.to_string(), until);
    }
}
