use log::info;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Spotify tolerates roughly 180 requests per rolling minute per client.
pub const MAX_CALLS_PER_WINDOW: u32 = 180;
pub const WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window call governor.
///
/// `record_call` must run once before every outbound API request. When the
/// counter reaches the ceiling inside the window, the caller sleeps out the
/// window remainder; the counter and window start are then reset whether or
/// not a wait occurred. The reset-on-ceiling slightly undercounts, which only
/// makes the governor more conservative than the service-side limit.
#[derive(Debug)]
pub struct RateGovernor {
    ceiling: u32,
    window: Duration,
    calls: u32,
    window_start: Instant,
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::with_limits(MAX_CALLS_PER_WINDOW, WINDOW)
    }

    /// Governor with custom limits, used by tests and available for callers
    /// that need a stricter quota.
    pub fn with_limits(ceiling: u32, window: Duration) -> Self {
        Self {
            ceiling,
            window,
            calls: 0,
            window_start: Instant::now(),
        }
    }

    /// Counts one outbound call, sleeping out the window remainder when the
    /// ceiling is reached before the window has elapsed.
    pub async fn record_call(&mut self) {
        self.calls += 1;
        if self.calls >= self.ceiling {
            let elapsed = self.window_start.elapsed();
            if elapsed < self.window {
                let wait = self.window - elapsed;
                info!(
                    "Rate limit reached. Waiting for {:.2} seconds.",
                    wait.as_secs_f64()
                );
                sleep(wait).await;
            }
            self.calls = 0;
            self.window_start = Instant::now();
        }
    }

    /// Calls recorded in the current window.
    pub fn calls_in_window(&self) -> u32 {
        self.calls
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn below_ceiling_never_waits() {
        let mut governor = RateGovernor::with_limits(10, Duration::from_secs(60));
        let before = Instant::now();

        for _ in 0..9 {
            governor.record_call().await;
        }

        assert_eq!(Instant::now(), before);
        assert_eq!(governor.calls_in_window(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_waits_out_window_remainder() {
        let mut governor = RateGovernor::with_limits(180, Duration::from_secs(60));

        // Simulate 10 seconds of work before the ceiling is hit.
        advance(Duration::from_secs(10)).await;

        let before = Instant::now();
        for _ in 0..180 {
            governor.record_call().await;
        }

        // The 180th call sleeps the remaining 50 seconds of the window.
        assert_eq!(Instant::now() - before, Duration::from_secs(50));
        assert_eq!(governor.calls_in_window(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn next_call_after_reset_does_not_wait() {
        let mut governor = RateGovernor::with_limits(180, Duration::from_secs(60));

        advance(Duration::from_secs(10)).await;
        for _ in 0..180 {
            governor.record_call().await;
        }

        let before = Instant::now();
        governor.record_call().await;

        assert_eq!(Instant::now(), before);
        assert_eq!(governor.calls_in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_after_window_elapsed_restarts_without_wait() {
        let mut governor = RateGovernor::with_limits(5, Duration::from_secs(60));

        for _ in 0..4 {
            governor.record_call().await;
        }
        advance(Duration::from_secs(61)).await;

        let before = Instant::now();
        governor.record_call().await;

        assert_eq!(Instant::now(), before);
        assert_eq!(governor.calls_in_window(), 0);
    }
}
