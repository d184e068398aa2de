use std::time::{Duration, Instant};

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(75);

/// Limits discrete actions to one per `delay` of monotonic wall time,
/// independent of how often it is polled.
#[derive(Debug, Clone)]
pub struct StepThrottle {
    delay: Duration,
    last_step: Option<Instant>,
}

impl Default for StepThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

impl StepThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_step: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_step {
            Some(last) => now.saturating_duration_since(last) >= self.delay,
            None => true,
        }
    }

    pub fn record_step(&mut self, now: Instant) {
        self.last_step = Some(now);
    }

    pub fn clear(&mut self) {
        self.last_step = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_is_always_ready() {
        let throttle = StepThrottle::default();
        assert!(throttle.is_ready(Instant::now()));
    }

    #[test]
    fn steps_are_spaced_by_delay_regardless_of_poll_rate() {
        let mut throttle = StepThrottle::new(Duration::from_millis(75));
        let base = Instant::now();
        throttle.record_step(base);

        for poll_ms in [1, 16, 32, 74] {
            assert!(!throttle.is_ready(base + Duration::from_millis(poll_ms)), "{poll_ms}");
        }
        assert!(throttle.is_ready(base + Duration::from_millis(75)));
        assert!(throttle.is_ready(base + Duration::from_millis(500)));
    }

    #[test]
    fn clock_going_backwards_does_not_unlock() {
        let mut throttle = StepThrottle::new(Duration::from_millis(75));
        let base = Instant::now() + Duration::from_secs(1);
        throttle.record_step(base);
        assert!(!throttle.is_ready(base - Duration::from_millis(10)));
    }

    #[test]
    fn clear_forgets_previous_step() {
        let mut throttle = StepThrottle::new(Duration::from_millis(75));
        let base = Instant::now();
        throttle.record_step(base);
        throttle.clear();
        assert!(throttle.is_ready(base));
    }
}
