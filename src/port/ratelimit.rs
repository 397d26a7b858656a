use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token bucket guard for rate limited log statements: `burst` tokens
/// refill evenly over `window`.
#[derive(Debug)]
pub struct RateLimit {
    burst: u32,
    window: Duration,
    state: Mutex<RateLimitState>,
}

#[derive(Debug)]
struct RateLimitState {
    tokens: u32,
    last_refill: Option<Instant>,
}

impl RateLimit {
    pub fn new(burst: u32, window: Duration) -> RateLimit {
        let burst = burst.max(1);
        RateLimit {
            burst,
            window,
            state: Mutex::new(RateLimitState {
                tokens: burst,
                last_refill: None,
            }),
        }
    }

    /// Takes a token if one is available. Returns `false` when the guarded
    /// statement should be suppressed.
    pub fn check(&self) -> bool {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        match state.last_refill {
            None => state.last_refill = Some(now),
            Some(last) => {
                let interval = self.window / self.burst;
                if !interval.is_zero() {
                    let refills = (now.saturating_duration_since(last).as_nanos()
                        / interval.as_nanos())
                    .min(self.burst as u128) as u32;
                    if refills > 0 {
                        state.tokens = (state.tokens + refills).min(self.burst);
                        state.last_refill = Some(last + interval * refills);
                    }
                }
            }
        }

        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }
}
