// db/cache.rs
use redis::{aio::ConnectionManager, AsyncCommands};
use std::sync::Arc;

const REVOKED_TOKEN_PREFIX: &str = "revoked_token";

pub fn revoked_token_key(token: &str) -> String {
    format!("{}:{}", REVOKED_TOKEN_PREFIX, token)
}

/// Redis-backed blacklist of logged-out JWTs.
pub struct TokenBlacklist;

impl TokenBlacklist {
    /// Keeps the entry only as long as the token itself would have lived.
    pub async fn revoke(
        redis: &Arc<ConnectionManager>,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn
            .set_ex(revoked_token_key(token), "1", ttl_seconds as usize)
            .await?;
        tracing::debug!("Token revoked (TTL: {}s)", ttl_seconds);
        Ok(())
    }

    pub async fn is_revoked(
        redis: &Arc<ConnectionManager>,
        token: &str,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        conn.exists(revoked_token_key(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoked_token_key() {
        assert_eq!(revoked_token_key("abc.def"), "revoked_token:abc.def");
    }
}
