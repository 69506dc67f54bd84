//! Send throttle: per-endpoint cooldown between push notifications.
//!
//! After a reminder goes out, its endpoint enters a cooldown during which no
//! further reminder is sent, so overlapping or retried runs never flood a
//! device. Two backends:
//!
//! - [`SendThrottle`]: in-process map behind a mutex. Stale records are swept
//!   on every successful check, which bounds the map without a timer task.
//! - [`RedisThrottle`]: `SET key 1 NX PX cooldown` so every notifier instance
//!   shares one cooldown; Redis TTL expiry replaces the sweep.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;

/// Default cooldown duration in seconds (5 minutes).
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 300;

/// Records older than this are dropped by the sweep (1 hour).
pub const EVICTION_HORIZON_SECONDS: i64 = 3600;

/// Gate consulted by the dispatcher before each send.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Returns `true` and starts a new cooldown for `key` if it is not
    /// currently cooling down, `false` (with no state change) otherwise.
    async fn check_and_set(&self, key: &str, now: DateTime<Utc>) -> bool;
}

/// In-process throttle shared by every run in this process.
pub struct SendThrottle {
    cooldown: Duration,
    eviction_horizon: Duration,
    last_sent: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SendThrottle {
    pub fn new() -> Self {
        Self::with_cooldown_secs(DEFAULT_COOLDOWN_SECONDS)
    }

    pub fn with_cooldown_secs(cooldown_secs: u64) -> Self {
        let cooldown = cooldown_duration(cooldown_secs);
        Self {
            cooldown,
            // A record must outlive its own cooldown.
            eviction_horizon: cooldown.max(Duration::seconds(EVICTION_HORIZON_SECONDS)),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically check the cooldown for `key` and, if it has elapsed (or no
    /// record exists), record `now` as the last send.
    pub fn allow(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut last_sent = self.last_sent.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(last) = last_sent.get(key)
            && now - *last < self.cooldown
        {
            tracing::debug!(
                endpoint = %preview(key),
                elapsed_secs = (now - *last).num_seconds(),
                "Send suppressed, endpoint in cooldown"
            );
            return false;
        }

        last_sent.insert(key.to_string(), now);

        let before = last_sent.len();
        let horizon = self.eviction_horizon;
        last_sent.retain(|_, sent_at| now - *sent_at <= horizon);
        let evicted = before - last_sent.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted stale send records");
        }

        true
    }

    /// Number of endpoints currently tracked.
    pub fn len(&self) -> usize {
        self.last_sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SendThrottle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Throttle for SendThrottle {
    async fn check_and_set(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.allow(key, now)
    }
}

/// Redis-backed throttle for multi-instance deployments.
///
/// Redis keeps its own clock for the TTL, so `now` is not consulted.
pub struct RedisThrottle {
    redis: ConnectionManager,
    cooldown_ms: u64,
}

impl RedisThrottle {
    pub fn new(redis: ConnectionManager, cooldown_secs: u64) -> Self {
        Self {
            redis,
            cooldown_ms: cooldown_millis(cooldown_secs),
        }
    }

    fn key(endpoint: &str) -> String {
        format!("push:cooldown:{}", endpoint)
    }
}

#[async_trait]
impl Throttle for RedisThrottle {
    async fn check_and_set(&self, key: &str, _now: DateTime<Utc>) -> bool {
        let mut redis = self.redis.clone();

        // SET key "1" NX PX cooldown_ms
        // Returns Some("OK") if key was set (not in cooldown)
        // Returns None if key already exists (in cooldown)
        let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(Self::key(key))
            .arg("1")
            .arg("NX")
            .arg("PX")
            .arg(self.cooldown_ms)
            .query_async(&mut redis)
            .await;

        match result {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!(endpoint = %preview(key), "Send suppressed, endpoint in cooldown");
                false
            }
            Err(e) => {
                // A missed reminder is worse than a duplicate one.
                tracing::warn!(error = %e, endpoint = %preview(key), "Cooldown check failed, allowing send");
                true
            }
        }
    }
}

/// Cooldown as a `Duration`, saturating instead of wrapping on huge inputs.
fn cooldown_duration(cooldown_secs: u64) -> Duration {
    i64::try_from(cooldown_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Cooldown in milliseconds, capped at the largest `PX` Redis accepts.
fn cooldown_millis(cooldown_secs: u64) -> u64 {
    cooldown_secs.saturating_mul(1000).min(i64::MAX as u64)
}

/// Short, log-safe prefix of an endpoint URL.
pub fn preview(endpoint: &str) -> String {
    match endpoint.char_indices().nth(40) {
        Some((idx, _)) => format!("{}...", &endpoint[..idx]),
        None => endpoint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_second_send_within_cooldown_denied() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(!throttle.allow("ep1", t0() + Duration::minutes(2)));
        assert!(!throttle.allow("ep1", t0() + Duration::minutes(4)));
    }

    #[test]
    fn test_send_after_cooldown_allowed() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(throttle.allow("ep1", t0() + Duration::minutes(6)));
    }

    #[test]
    fn test_exact_cooldown_boundary_allowed() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(throttle.allow("ep1", t0() + Duration::minutes(5)));
    }

    #[test]
    fn test_denied_call_does_not_extend_cooldown() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(!throttle.allow("ep1", t0() + Duration::minutes(4)));
        // Cooldown still counts from t0, not from the denied attempt.
        assert!(throttle.allow("ep1", t0() + Duration::minutes(5)));
    }

    #[test]
    fn test_independent_endpoints() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(throttle.allow("ep2", t0()));
        assert!(!throttle.allow("ep1", t0() + Duration::seconds(1)));
    }

    #[test]
    fn test_stale_records_evicted_on_next_allow() {
        let throttle = SendThrottle::new();
        assert!(throttle.allow("ep1", t0()));
        assert!(throttle.allow("ep2", t0() + Duration::minutes(30)));
        assert_eq!(throttle.len(), 2);

        // ep1 is now over an hour old; any successful allow sweeps it.
        assert!(throttle.allow("ep3", t0() + Duration::minutes(61)));
        assert_eq!(throttle.len(), 2);
        assert!(throttle.allow("ep1", t0() + Duration::minutes(62)));
    }

    #[test]
    fn test_custom_cooldown() {
        let throttle = SendThrottle::with_cooldown_secs(60);
        assert!(throttle.allow("ep1", t0()));
        assert!(!throttle.allow("ep1", t0() + Duration::seconds(59)));
        assert!(throttle.allow("ep1", t0() + Duration::seconds(60)));
    }

    #[test]
    fn test_huge_cooldown_never_disables_throttle() {
        for secs in [u64::MAX, i64::MAX as u64, (i64::MAX / 1000) as u64 + 1] {
            let throttle = SendThrottle::with_cooldown_secs(secs);
            assert!(throttle.allow("ep1", t0()));
            assert!(!throttle.allow("ep1", t0() + Duration::seconds(1)), "{secs}");
            assert!(!throttle.allow("ep1", t0() + Duration::days(365)), "{secs}");
        }
    }

    #[test]
    fn test_long_cooldown_survives_sweep() {
        let throttle = SendThrottle::with_cooldown_secs(2 * 3600);
        assert!(throttle.allow("ep1", t0()));
        assert!(throttle.allow("ep2", t0() + Duration::minutes(90)));
        assert!(!throttle.allow("ep1", t0() + Duration::minutes(100)));
        assert!(throttle.allow("ep1", t0() + Duration::hours(2)));
    }

    #[test]
    fn test_cooldown_millis_saturates() {
        assert_eq!(cooldown_millis(300), 300_000);
        assert_eq!(cooldown_millis(u64::MAX), i64::MAX as u64);
        assert_eq!(cooldown_millis(i64::MAX as u64 / 1000 + 1), i64::MAX as u64);
    }

    #[tokio::test]
    async fn test_trait_delegates_to_allow() {
        let throttle = SendThrottle::new();
        assert!(throttle.check_and_set("ep1", t0()).await);
        assert!(!throttle.check_and_set("ep1", t0() + Duration::minutes(2)).await);
    }

    #[test]
    fn test_concurrent_callers_get_one_slot() {
        let throttle = std::sync::Arc::new(SendThrottle::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let throttle = throttle.clone();
                std::thread::spawn(move || throttle.allow("shared", t0()))
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 1);
    }

    #[test]
    fn test_preview_truncates() {
        let long = "https://fcm.googleapis.com/fcm/send/".to_string() + &"x".repeat(100);
        let short = preview(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), 43);
        assert_eq!(preview("ep1"), "ep1");
    }
}
