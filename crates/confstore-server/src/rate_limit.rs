use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::RateLimitConfig;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Process-wide token bucket shared by every route.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// A full bucket holding `burst` tokens, refilled at
    /// `requests_per_minute / 60` tokens per second.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    fn starting_at(config: &RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.burst.max(1));
        Self {
            capacity,
            refill_per_sec: f64::from(config.requests_per_minute) / 60.0,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Middleware rejecting requests with 429 once the bucket is empty.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.try_acquire() {
        tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
    }
    next.run(request).await
}
