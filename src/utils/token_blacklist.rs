use std::time::Duration;

use moka::future::Cache;

/// Bearer tokens invalidated by logout. Entries outlive the token itself by at most the
/// configured access-token lifetime, after which the signature check rejects it anyway.
#[derive(Clone)]
pub struct TokenBlacklist {
    revoked: Cache<String, ()>,
}

impl TokenBlacklist {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            revoked: Cache::builder()
                .max_capacity(1_000_000)
                .time_to_live(token_ttl)
                .build(),
        }
    }

    pub async fn revoke(&self, token: &str) {
        self.revoked.insert(token.to_string(), ()).await;
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.revoked.contains_key(token)
    }
}
