//! Redis match cache. Keys are `match:{fingerprint}`, values the finished match as JSON.
//!
//! The cache is best-effort: callers log failures and carry on with the database.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;

pub fn match_cache_key(fingerprint: &str) -> String {
    format!("match:{fingerprint}")
}

/// Returns the cached value for a fingerprint. An entry that no longer
/// deserializes is treated as a miss.
pub async fn get_cached_match<T: DeserializeOwned>(
    redis: &redis::Client,
    fingerprint: &str,
) -> Result<Option<T>, AppError> {
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    let raw: Option<String> = conn
        .get(match_cache_key(fingerprint))
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;

    Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
}

pub async fn cache_match<T: Serialize>(
    redis: &redis::Client,
    fingerprint: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), AppError> {
    let payload = serde_json::to_string(value).map_err(|e| AppError::Cache(e.to_string()))?;
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    conn.set_ex::<_, _, ()>(match_cache_key(fingerprint), payload, ttl_secs)
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    Ok(())
}
