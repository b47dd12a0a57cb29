use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct LimiterState {
    clients: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Sliding-window limiter keyed by client address. Clients idle for a full
/// window are dropped at most once per window.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    inner: Arc<Mutex<LimiterState>>,
    window: Duration,
    max_requests: usize,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LimiterState {
                clients: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests: max_requests.max(1),
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.lock().clients.len()
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut guard = self.inner.lock();
        if now.saturating_duration_since(guard.last_sweep) >= self.window {
            let window = self.window;
            guard.clients.retain(|_, queue| {
                queue
                    .back()
                    .is_some_and(|latest| now.saturating_duration_since(*latest) < window)
            });
            guard.last_sweep = now;
        }

        let queue = guard.clients.entry(key.to_string()).or_default();
        while let Some(front) = queue.front() {
            if now.saturating_duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.max_requests {
            let retry_after = queue
                .front()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        queue.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_requests - queue.len(),
        }
    }
}
