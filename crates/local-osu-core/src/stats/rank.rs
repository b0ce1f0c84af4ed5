use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Result;

pub const OSU_DAILY_API: &str = "https://osudaily.net/api";
pub const RATE_LIMIT_MESSAGE: &str = "Only 1 request per second is authorized";

/// Returned whenever the real rank can't be known.
pub const UNKNOWN_RANK: i32 = 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankError {
    /// Transient: the caller should wait and ask again.
    #[error("rank service rate limit exceeded")]
    RateLimited,
}

/// Global rank estimate for a pp value.
pub trait RankLookup: Send + Sync {
    fn rank(&self, pp: i64, mode: u8) -> impl Future<Output = std::result::Result<i32, RankError>> + Send;
}

/// osu!daily's pp → rank endpoint.
pub struct OsuDailyClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OsuDailyClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: OSU_DAILY_API.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl RankLookup for OsuDailyClient {
    async fn rank(&self, pp: i64, mode: u8) -> std::result::Result<i32, RankError> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(UNKNOWN_RANK);
        };

        let url = format!("{}/pp.php", self.base_url);
        let params = [
            ("k", key.to_string()),
            ("t", "pp".to_string()),
            ("v", pp.to_string()),
            ("m", mode.to_string()),
        ];

        let response = match self.client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Rank lookup request failed: {}", e);
                return Ok(UNKNOWN_RANK);
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Rank lookup body could not be read: {}", e);
                return Ok(UNKNOWN_RANK);
            }
        };

        interpret_rank_response(status, &body)
    }
}

/// Turn an osu!daily response into a rank. Anything other than a usable
/// `rank` field yields [`UNKNOWN_RANK`], except the rate-limit error.
pub fn interpret_rank_response(status: u16, body: &[u8]) -> std::result::Result<i32, RankError> {
    if status != 200 {
        debug!("Rank lookup returned status {}", status);
        return Ok(UNKNOWN_RANK);
    }

    let json: Value = match serde_json::from_slice(body) {
        Ok(json) => json,
        Err(e) => {
            debug!("Rank lookup payload is not JSON: {}", e);
            return Ok(UNKNOWN_RANK);
        }
    };

    if json.get("error").and_then(Value::as_str) == Some(RATE_LIMIT_MESSAGE) {
        return Err(RankError::RateLimited);
    }

    let rank = match json.get("rank") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    Ok(rank
        .and_then(|r| i32::try_from(r).ok())
        .unwrap_or(UNKNOWN_RANK))
}

/// How long to keep asking a rate-limited rank service.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub backoff: f64,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    /// 1s, doubling up to 30s, at most 8 attempts.
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            backoff: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: Some(8),
        }
    }
}

impl RetryPolicy {
    /// Fixed one second wait, never gives up.
    pub fn unbounded() -> Self {
        Self {
            delay: Duration::from_secs(1),
            backoff: 1.0,
            max_delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }

    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            delay: Duration::ZERO,
            backoff: 1.0,
            max_delay: Duration::ZERO,
            max_attempts: Some(max_attempts),
        }
    }

    /// Wait before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff.max(1.0).powi(retry.min(64) as i32);
        let delay = self.delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Ask `lookup` until it answers or the policy runs out. `None` means every
/// attempt was rate limited.
pub async fn lookup_with_retry<L: RankLookup>(
    lookup: &L,
    pp: i64,
    mode: u8,
    policy: &RetryPolicy,
) -> Option<i32> {
    let mut attempt: u32 = 0;
    loop {
        match lookup.rank(pp, mode).await {
            Ok(rank) => return Some(rank),
            Err(e) => {
                attempt += 1;
                if policy.max_attempts.is_some_and(|max| attempt >= max) {
                    warn!("Giving up on rank lookup after {} attempts: {}", attempt, e);
                    return None;
                }
                let wait = policy.delay_for(attempt - 1);
                debug!("Rank lookup attempt {} failed ({}), retrying in {:?}", attempt, e, wait);
                tokio::time::sleep(wait).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RateLimitedThen {
        failures: u32,
        calls: AtomicU32,
    }

    impl RankLookup for RateLimitedThen {
        async fn rank(&self, _pp: i64, _mode: u8) -> std::result::Result<i32, RankError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(RankError::RateLimited)
            } else {
                Ok(4321)
            }
        }
    }

    #[test]
    fn test_interpret_rank_response() {
        assert_eq!(interpret_rank_response(200, br#"{"rank": 1500}"#), Ok(1500));
        assert_eq!(interpret_rank_response(200, br#"{"rank": "77"}"#), Ok(77));
        assert_eq!(interpret_rank_response(500, br#"{"rank": 1500}"#), Ok(UNKNOWN_RANK));
        assert_eq!(interpret_rank_response(200, b"<html>"), Ok(UNKNOWN_RANK));
        assert_eq!(interpret_rank_response(200, b"{}"), Ok(UNKNOWN_RANK));
        assert_eq!(
            interpret_rank_response(200, br#"{"error": "invalid key"}"#),
            Ok(UNKNOWN_RANK)
        );
        assert_eq!(
            interpret_rank_response(
                200,
                br#"{"error": "Only 1 request per second is authorized"}"#
            ),
            Err(RankError::RateLimited)
        );
    }

    #[tokio::test]
    async fn test_no_api_key_always_unknown() {
        let client = OsuDailyClient::new(None, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(!client.is_enabled());
        for (pp, mode) in [(0, 0), (491, 0), (12_000, 3)] {
            assert_eq!(client.rank(pp, mode).await, Ok(UNKNOWN_RANK));
        }

        let blank = OsuDailyClient::new(Some("  ".to_string()), Duration::from_secs(1)).unwrap();
        assert_eq!(blank.rank(100, 0).await, Ok(UNKNOWN_RANK));
    }

    #[tokio::test]
    async fn test_retry_until_answer() {
        let lookup = RateLimitedThen {
            failures: 3,
            calls: AtomicU32::new(0),
        };
        let rank = lookup_with_retry(&lookup, 491, 0, &RetryPolicy::immediate(10)).await;
        assert_eq!(rank, Some(4321));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let lookup = RateLimitedThen {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let rank = lookup_with_retry(&lookup, 491, 0, &RetryPolicy::immediate(3)).await;
        assert_eq!(rank, None);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_backs_off_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));

        let fixed = RetryPolicy::unbounded();
        assert_eq!(fixed.delay_for(50), Duration::from_secs(1));
    }
}
