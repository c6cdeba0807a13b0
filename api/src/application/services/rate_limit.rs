//! Per-client request limiting over a rolling window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Remaining allowance for one client after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest counted request leaves the window.
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed(Quota),
    Limited(Quota),
}

/// Keeps the arrival instants of each client's accepted requests and admits a
/// new one only while fewer than `max` fall inside the trailing `window`.
/// Rejected requests are not recorded.
pub struct SlidingWindowLimiter {
    window: Duration,
    max: u32,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            hits: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut entry = self.hits.entry(client.to_string()).or_default();
        let hits = entry.value_mut();
        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        let allowed = (hits.len() as u32) < self.max;
        if allowed {
            hits.push_back(now);
        }

        let used = hits.len() as u32;
        let reset_after = hits
            .front()
            .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(self.window);
        let quota = Quota {
            limit: self.max,
            remaining: self.max.saturating_sub(used),
            reset_after,
        };
        if allowed {
            Decision::Allowed(quota)
        } else {
            Decision::Limited(quota)
        }
    }

    /// Forgets clients whose every counted request has aged out.
    pub fn prune_idle(&self, now: Instant) -> usize {
        let before = self.hits.len();
        self.hits.retain(|_, hits| {
            hits.back()
                .map(|latest| now.saturating_duration_since(*latest) < self.window)
                .unwrap_or(false)
        });
        before - self.hits.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    #[test]
    fn hundred_and_first_request_is_limited() {
        let limiter = SlidingWindowLimiter::new(TEN_MINUTES, 100);
        let start = Instant::now();
        for i in 0..100 {
            let at = start + Duration::from_secs(i);
            assert!(matches!(limiter.check_at("10.0.0.1", at), Decision::Allowed(_)));
        }
        match limiter.check_at("10.0.0.1", start + Duration::from_secs(120)) {
            Decision::Limited(quota) => {
                assert_eq!(quota.remaining, 0);
                assert_eq!(quota.reset_after, Duration::from_secs(480));
            }
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = SlidingWindowLimiter::new(TEN_MINUTES, 1);
        let now = Instant::now();
        assert!(matches!(limiter.check_at("a", now), Decision::Allowed(_)));
        assert!(matches!(limiter.check_at("b", now), Decision::Allowed(_)));
        assert!(matches!(limiter.check_at("a", now), Decision::Limited(_)));
    }

    #[test]
    fn window_rolls_forward() {
        let limiter = SlidingWindowLimiter::new(TEN_MINUTES, 2);
        let start = Instant::now();
        limiter.check_at("c", start);
        limiter.check_at("c", start + Duration::from_secs(300));
        assert!(matches!(
            limiter.check_at("c", start + Duration::from_secs(599)),
            Decision::Limited(_)
        ));
        // The first request ages out at exactly ten minutes.
        match limiter.check_at("c", start + TEN_MINUTES) {
            Decision::Allowed(quota) => assert_eq!(quota.remaining, 0),
            other => panic!("expected allowance, got {other:?}"),
        }
    }

    #[test]
    fn rejected_requests_do_not_extend_the_block() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();
        limiter.check_at("d", start);
        for s in 1..10 {
            limiter.check_at("d", start + Duration::from_secs(s));
        }
        assert!(matches!(
            limiter.check_at("d", start + Duration::from_secs(10)),
            Decision::Allowed(_)
        ));
    }

    #[test]
    fn prune_drops_idle_clients() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 5);
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("fresh", start + Duration::from_secs(50));
        let removed = limiter.prune_idle(start + Duration::from_secs(70));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
