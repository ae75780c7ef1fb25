//! Per-address sliding-window admission control.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Length of the trailing window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Tracked addresses inspected per eviction, bounding its cost at capacity.
const EVICTION_SAMPLE: usize = 64;

/// Accepted-request timestamps for one address, oldest first.
#[derive(Debug, Default)]
struct Window {
    hits: VecDeque<Instant>,
}

impl Window {
    fn purge(&mut self, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= WINDOW {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn last_seen(&self) -> Option<Instant> {
        self.hits.back().copied()
    }
}

/// Sliding-window rate limiter keyed by source IP.
///
/// Each address is locked independently (per DashMap shard), so admissions
/// from different clients rarely contend.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<IpAddr, Window>,
    enabled: bool,
    limit: usize,
    max_tracked: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            enabled: config.enabled,
            limit: config.requests_per_second as usize,
            max_tracked: config.max_tracked_addresses,
        }
    }

    /// Decide whether a request from `addr` arriving at `now` may proceed.
    ///
    /// Entries older than [`WINDOW`] are purged first. An admitted request is
    /// recorded; a rejected one is not.
    pub fn admit(&self, addr: IpAddr, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        if self.max_tracked > 0
            && !self.windows.contains_key(&addr)
            && self.windows.len() >= self.max_tracked
        {
            self.evict_stalest(now);
        }

        let mut window = self.windows.entry(addr).or_default();
        window.purge(now);
        if window.hits.len() < self.limit {
            window.hits.push_back(now);
            true
        } else {
            false
        }
    }

    /// Forget addresses with no hits left in the window. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.purge(now);
            !window.hits.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of addresses currently tracked.
    pub fn tracked_addresses(&self) -> usize {
        self.windows.len()
    }

    /// Evict the least recently seen address among a bounded sample, or the
    /// first sampled address whose window has already emptied.
    fn evict_stalest(&self, now: Instant) {
        // Find first, remove after: holding an iterator guard across
        // `remove` would deadlock on the shard lock.
        let mut stalest: Option<(IpAddr, Option<Instant>)> = None;
        for entry in self.windows.iter().take(EVICTION_SAMPLE) {
            let last_seen = entry.value().last_seen();
            let idle = last_seen.map_or(true, |t| now.saturating_duration_since(t) >= WINDOW);
            if idle || stalest.map_or(true, |(_, seen)| last_seen < seen) {
                stalest = Some((*entry.key(), last_seen));
            }
            if idle {
                break;
            }
        }

        if let Some((addr, _)) = stalest {
            self.windows.remove(&addr);
            tracing::debug!(client = %addr, "Evicted rate limit window");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(limit: u32, max_tracked: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            requests_per_second: limit,
            max_tracked_addresses: max_tracked,
        })
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = limiter(10, 0);
        let now = Instant::now();
        for _ in 0..10 {
            assert!(limiter.admit(ip(1), now));
        }
        assert!(!limiter.admit(ip(1), now));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 0);
        let start = Instant::now();
        assert!(limiter.admit(ip(1), start));
        assert!(limiter.admit(ip(1), start + Duration::from_millis(500)));
        assert!(!limiter.admit(ip(1), start + Duration::from_millis(900)));

        // The first hit is exactly one second old and drops out.
        assert!(limiter.admit(ip(1), start + Duration::from_secs(1)));
        assert!(!limiter.admit(ip(1), start + Duration::from_millis(1100)));
    }

    #[test]
    fn test_rejections_are_not_recorded() {
        let limiter = limiter(1, 0);
        let start = Instant::now();
        assert!(limiter.admit(ip(1), start));
        for ms in [100, 200, 300, 900] {
            assert!(!limiter.admit(ip(1), start + Duration::from_millis(ms)));
        }
        assert!(limiter.admit(ip(1), start + Duration::from_millis(1000)));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = limiter(1, 0);
        let now = Instant::now();
        assert!(limiter.admit(ip(1), now));
        assert!(!limiter.admit(ip(1), now));
        assert!(limiter.admit(ip(2), now));
    }

    #[test]
    fn test_disabled_admits_everything() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            requests_per_second: 1,
            max_tracked_addresses: 0,
        });
        let now = Instant::now();
        for _ in 0..100 {
            assert!(limiter.admit(ip(1), now));
        }
        assert_eq!(limiter.tracked_addresses(), 0);
    }

    #[test]
    fn test_sweep_drops_idle_addresses() {
        let limiter = limiter(5, 0);
        let start = Instant::now();
        limiter.admit(ip(1), start);
        limiter.admit(ip(2), start + Duration::from_millis(800));

        assert_eq!(limiter.sweep(start + Duration::from_millis(1200)), 1);
        assert_eq!(limiter.tracked_addresses(), 1);
    }

    #[test]
    fn test_capacity_evicts_least_recently_seen() {
        let limiter = limiter(5, 2);
        let start = Instant::now();
        limiter.admit(ip(1), start);
        limiter.admit(ip(2), start + Duration::from_millis(10));
        limiter.admit(ip(1), start + Duration::from_millis(20));

        limiter.admit(ip(3), start + Duration::from_millis(30));
        assert_eq!(limiter.tracked_addresses(), 2);
        assert!(limiter.windows.contains_key(&ip(1)));
        assert!(!limiter.windows.contains_key(&ip(2)));
        assert!(limiter.windows.contains_key(&ip(3)));
    }

    #[test]
    fn test_capacity_holds_for_large_tables() {
        let limiter = limiter(5, 1000);
        let start = Instant::now();
        for i in 0..1000u32 {
            let addr = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i));
            assert!(limiter.admit(addr, start));
        }

        let later = start + Duration::from_millis(500);
        for i in 1000..1100u32 {
            let addr = IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i));
            assert!(limiter.admit(addr, later));
            assert_eq!(limiter.tracked_addresses(), 1000);
        }
        // Newcomers only evict older addresses, never each other.
        for i in 1000..1100u32 {
            assert!(limiter.windows.contains_key(&IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i))));
        }
    }

    #[test]
    fn test_capacity_prefers_idle_addresses() {
        let limiter = limiter(5, 2);
        let start = Instant::now();
        limiter.admit(ip(1), start);
        limiter.admit(ip(2), start + Duration::from_millis(900));

        // ip(1)'s window has emptied by now; ip(2) still has a live hit.
        limiter.admit(ip(3), start + Duration::from_millis(1500));
        assert!(!limiter.windows.contains_key(&ip(1)));
        assert!(limiter.windows.contains_key(&ip(2)));
        assert!(limiter.windows.contains_key(&ip(3)));
    }
}
