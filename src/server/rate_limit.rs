use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::core::config::RateLimitSettings;
use crate::core::errors::ApiError;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Checks between sweeps of idle buckets.
const SWEEP_EVERY: u64 = 1_024;

type KeyedLimiter = DefaultKeyedRateLimiter<String, StateInformationMiddleware>;

/// Quota state after an accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the bucket is full again
    pub reset_after_secs: u64,
}

impl RateLimitStatus {
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(self.limit));
        headers.insert(
            HeaderName::from_static(REMAINING_HEADER),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static(RESET_HEADER),
            HeaderValue::from(self.reset_after_secs),
        );
    }
}

/// Per-caller request limiter for the RAG routes.
///
/// Buckets are held in process memory, so limits apply per instance.
#[derive(Clone)]
pub struct RequestLimiter {
    limiter: Option<Arc<KeyedLimiter>>,
    quota: Option<Quota>,
    requests_per_minute: u32,
    checks: Arc<AtomicU64>,
    clock: DefaultClock,
}

impl RequestLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let quota = match (settings.enabled, NonZeroU32::new(settings.requests_per_minute)) {
            (true, Some(per_minute)) => Some(Quota::per_minute(per_minute)),
            (true, None) => {
                tracing::warn!("rate_limit.requests_per_minute is 0; rate limiting disabled");
                None
            }
            (false, _) => None,
        };
        let limiter = quota.map(|quota| {
            Arc::new(RateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>())
        });

        Self {
            limiter,
            quota,
            requests_per_minute: settings.requests_per_minute,
            checks: Arc::new(AtomicU64::new(0)),
            clock: DefaultClock::default(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(&RateLimitSettings {
            enabled: false,
            requests_per_minute: 0,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Count one request against `key`.
    ///
    /// Returns the remaining quota, or `None` when limiting is disabled.
    pub fn check(&self, key: &str) -> Result<Option<RateLimitStatus>, ApiError> {
        let (Some(limiter), Some(quota)) = (&self.limiter, self.quota) else {
            return Ok(None);
        };
        self.sweep_if_due(limiter);

        match limiter.check_key(&key.to_string()) {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity();
                let used = self.requests_per_minute.saturating_sub(remaining);
                Ok(Some(RateLimitStatus {
                    limit: self.requests_per_minute,
                    remaining,
                    reset_after_secs: ceil_secs(quota.replenish_interval() * used),
                }))
            }
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                tracing::warn!("Rate limit exceeded for {}", key);
                Err(ApiError::TooManyRequests {
                    retry_after_secs: ceil_secs(wait).max(1),
                })
            }
        }
    }

    /// Number of buckets currently held.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    fn sweep_if_due(&self, limiter: &KeyedLimiter) {
        let count = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if count % SWEEP_EVERY == 0 {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests_per_minute: u32) -> RequestLimiter {
        RequestLimiter::new(&RateLimitSettings {
            enabled: true,
            requests_per_minute,
        })
    }

    #[test]
    fn allows_up_to_quota_and_counts_down() {
        let limiter = limiter(10);

        let first = limiter.check("rag_qa:alice").unwrap().unwrap();
        assert_eq!(first.limit, 10);
        assert_eq!(first.remaining, 9);
        assert!((6..=7).contains(&first.reset_after_secs));

        for _ in 1..10 {
            assert!(limiter.check("rag_qa:alice").is_ok());
        }
    }

    #[test]
    fn rejects_over_quota_with_retry_after() {
        let limiter = limiter(2);
        assert!(limiter.check("rag_qa:alice").is_ok());
        let last = limiter.check("rag_qa:alice").unwrap().unwrap();
        assert_eq!(last.remaining, 0);

        match limiter.check("rag_qa:alice") {
            Err(ApiError::TooManyRequests { retry_after_secs }) => {
                assert!((1..=30).contains(&retry_after_secs));
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1);
        assert!(limiter.check("rag_qa:alice").is_ok());
        assert!(limiter.check("rag_qa:alice").is_err());
        assert!(limiter.check("rag_qa:bob").is_ok());
        assert!(limiter.check("rag_select:alice").is_ok());
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn disabled_limiter_never_rejects() {
        let limiter = RequestLimiter::new(&RateLimitSettings {
            enabled: false,
            requests_per_minute: 1,
        });
        assert!(!limiter.is_enabled());
        for _ in 0..5 {
            assert!(matches!(limiter.check("rag_qa:alice"), Ok(None)));
        }
        assert!(matches!(RequestLimiter::disabled().check("x"), Ok(None)));
    }

    #[test]
    fn status_headers_are_written() {
        let status = RateLimitStatus {
            limit: 10,
            remaining: 4,
            reset_after_secs: 36,
        };
        let mut headers = HeaderMap::new();

        status.write_headers(&mut headers);

        assert_eq!(headers.get(LIMIT_HEADER).unwrap(), "10");
        assert_eq!(headers.get(REMAINING_HEADER).unwrap(), "4");
        assert_eq!(headers.get(RESET_HEADER).unwrap(), "36");
    }
}
