// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-client token-bucket admission control.
//!
//! Each client key owns one bucket of `capacity` tokens. Every full
//! `refill_period` adds `refill_tokens` tokens at once, capped at the
//! capacity. Buckets are created full on first sight and removed by
//! [`RateLimiter::sweep_idle`] once untouched for the idle TTL.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use parley_config::model::RateLimitConfig;
use parley_core::ParleyError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::AppState;

/// Client key used when neither the identity header nor the peer address
/// is available.
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u64 },
    /// The bucket is empty; the next token arrives after `retry_after`.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: u64,
    last_refill: Instant,
    last_seen: Instant,
}

impl Bucket {
    fn full(capacity: u64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant, capacity: u64, refill_tokens: u64, period: Duration) {
        // A full bucket banks no time toward its next refill.
        if self.tokens >= capacity {
            self.tokens = capacity;
            self.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last_refill);
        let periods = elapsed.as_nanos() / period.as_nanos().max(1);
        if periods == 0 {
            return;
        }

        let added = u64::try_from(periods)
            .unwrap_or(u64::MAX)
            .saturating_mul(refill_tokens);
        self.tokens = self.tokens.saturating_add(added).min(capacity);
        if self.tokens == capacity {
            self.last_refill = now;
        } else {
            // Not full, so `periods` is below `capacity` and fits.
            self.last_refill += period * u32::try_from(periods).unwrap_or(u32::MAX);
        }
    }
}

/// Concurrent map of client key to token bucket.
///
/// Get-or-create and consume happen under the map shard's entry lock, so
/// a bucket is created at most once per key and no consume is lost.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u64,
    refill_tokens: u64,
    refill_period: Duration,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(capacity: u64, refill_tokens: u64, refill_period: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            refill_tokens,
            refill_period: refill_period.max(Duration::from_millis(1)),
            buckets: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.capacity, config.refill_tokens, config.refill_period())
    }

    /// Takes one token from `client`'s bucket.
    pub fn admit(&self, client: &str) -> Admission {
        self.admit_at(client, Instant::now())
    }

    pub fn admit_at(&self, client: &str, now: Instant) -> Admission {
        let mut bucket = self
            .buckets
            .entry(client.to_owned())
            .or_insert_with(|| Bucket::full(self.capacity, now));

        bucket.refill(now, self.capacity, self.refill_tokens, self.refill_period);
        bucket.last_seen = now;

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            Admission::Allowed {
                remaining: bucket.tokens,
            }
        } else {
            let since_refill = now.saturating_duration_since(bucket.last_refill);
            Admission::Rejected {
                retry_after: self.refill_period.saturating_sub(since_refill),
            }
        }
    }

    /// Removes buckets not touched within `idle_ttl`. Returns how many
    /// were removed.
    pub fn sweep_idle(&self, now: Instant, idle_ttl: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < idle_ttl);
        before.saturating_sub(self.buckets.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Runs [`RateLimiter::sweep_idle`] every `interval` until `cancel` fires.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    idle_ttl: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = limiter.sweep_idle(Instant::now(), idle_ttl);
                    if removed > 0 {
                        debug!(removed, remaining = limiter.tracked_clients(), "swept idle rate-limit buckets");
                    }
                }
            }
        }
    })
}

/// Identity header value if present and non-empty, else the peer IP.
pub fn client_key(headers: &HeaderMap, identity_header: &str, peer: Option<SocketAddr>) -> String {
    headers
        .get(identity_header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Axum middleware rejecting requests whose client bucket is empty.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.limiter.as_deref() else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(
        request.headers(),
        &state.config.rate_limit.identity_header,
        peer,
    );

    match limiter.admit(&client) {
        Admission::Allowed { .. } => next.run(request).await,
        Admission::Rejected { retry_after } => {
            warn!(path = %request.uri().path(), "rate limit exceeded");
            ApiError(ParleyError::RateLimited {
                client,
                retry_after,
            })
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: u64, refill: u64, period_secs: u64) -> RateLimiter {
        RateLimiter::new(capacity, refill, Duration::from_secs(period_secs))
    }

    #[test]
    fn sixth_request_is_rejected_with_capacity_five() {
        let rl = limiter(5, 5, 60);
        let now = Instant::now();
        for i in 0..5 {
            assert!(rl.admit_at("alice", now).is_allowed(), "request {i}");
        }
        assert!(!rl.admit_at("alice", now).is_allowed());
    }

    #[test]
    fn clients_have_independent_buckets() {
        let rl = limiter(1, 1, 60);
        let now = Instant::now();
        assert!(rl.admit_at("alice", now).is_allowed());
        assert!(!rl.admit_at("alice", now).is_allowed());
        assert!(rl.admit_at("bob", now).is_allowed());
        assert_eq!(rl.tracked_clients(), 2);
    }

    #[test]
    fn refill_adds_tokens_per_full_period() {
        let rl = limiter(3, 1, 10);
        let start = Instant::now();
        for _ in 0..3 {
            rl.admit_at("c", start);
        }
        assert!(!rl.admit_at("c", start + Duration::from_secs(9)).is_allowed());

        let later = start + Duration::from_secs(10);
        assert_eq!(rl.admit_at("c", later), Admission::Allowed { remaining: 0 });
        assert!(!rl.admit_at("c", later).is_allowed());

        // Two more periods bring two tokens.
        let much_later = later + Duration::from_secs(20);
        assert_eq!(rl.admit_at("c", much_later), Admission::Allowed { remaining: 1 });
    }

    #[test]
    fn full_bucket_restarts_refill_clock() {
        let start = Instant::now();
        let mut bucket = Bucket::full(2, start);
        let first_spend = start + Duration::from_secs(7);
        bucket.refill(first_spend, 2, 1, Duration::from_secs(10));
        assert_eq!(bucket.last_refill, first_spend);
        assert_eq!(bucket.tokens, 2);

        bucket.tokens = 1;
        // Ten seconds after the spend, not after creation.
        bucket.refill(start + Duration::from_secs(12), 2, 1, Duration::from_secs(10));
        assert_eq!(bucket.tokens, 1);
        bucket.refill(first_spend + Duration::from_secs(10), 2, 1, Duration::from_secs(10));
        assert_eq!(bucket.tokens, 2);
    }

    #[test]
    fn refill_never_exceeds_capacity() {
        let rl = limiter(2, 5, 1);
        let start = Instant::now();
        rl.admit_at("c", start);
        let later = start + Duration::from_secs(100);
        assert_eq!(rl.admit_at("c", later), Admission::Allowed { remaining: 1 });
    }

    #[test]
    fn rejection_reports_time_until_next_refill() {
        let rl = limiter(1, 1, 30);
        let start = Instant::now();
        rl.admit_at("c", start);
        match rl.admit_at("c", start + Duration::from_secs(12)) {
            Admission::Rejected { retry_after } => assert_eq!(retry_after, Duration::from_secs(18)),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn sweep_removes_only_idle_buckets() {
        let rl = limiter(5, 5, 60);
        let start = Instant::now();
        rl.admit_at("old", start);
        rl.admit_at("fresh", start + Duration::from_secs(50));

        let removed = rl.sweep_idle(start + Duration::from_secs(70), Duration::from_secs(60));
        assert_eq!(removed, 1);
        assert_eq!(rl.tracked_clients(), 1);
    }

    #[test]
    fn concurrent_first_sight_creates_one_bucket() {
        let rl = Arc::new(limiter(100, 1, 3600));
        let now = Instant::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let rl = Arc::clone(&rl);
                std::thread::spawn(move || {
                    (0..10).filter(|_| rl.admit_at("shared", now).is_allowed()).count()
                })
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 80);
        assert_eq!(rl.tracked_clients(), 1);
        assert_eq!(rl.admit_at("shared", now), Admission::Allowed { remaining: 19 });
    }

    #[test]
    fn client_key_prefers_identity_header() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        assert_eq!(client_key(&headers, "X-API-Key", Some(peer)), "10.0.0.7");
        assert_eq!(client_key(&headers, "X-API-Key", None), "unknown");

        headers.insert("x-api-key", "tenant-a".parse().unwrap());
        assert_eq!(client_key(&headers, "X-API-Key", Some(peer)), "tenant-a");

        headers.insert("x-api-key", "  ".parse().unwrap());
        assert_eq!(client_key(&headers, "X-API-Key", Some(peer)), "10.0.0.7");
    }
}
