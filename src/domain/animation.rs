// Progress animation - linear approach of a displayed value toward a target
use std::time::Duration;

/// Interpolates `target * min(1, elapsed / duration)` from the moment the
/// target was last set. Times are offsets from any fixed origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressAnimator {
    current: f64,
    target: f64,
    start: Duration,
    duration: Duration,
    epsilon: f64,
}

impl ProgressAnimator {
    pub fn new(duration: Duration, epsilon: f64) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            start: Duration::ZERO,
            duration,
            epsilon: epsilon.abs(),
        }
    }

    /// Restarts the animation at `now` when the target moved materially.
    /// Returns whether a restart happened.
    pub fn set_target(&mut self, target: f64, now: Duration) -> bool {
        if !target.is_finite() || (target - self.target).abs() < self.epsilon {
            return false;
        }
        self.target = target;
        self.start = now;
        self.current = 0.0;
        true
    }

    pub fn tick(&mut self, now: Duration) -> f64 {
        self.current = self.target * self.fraction(now);
        self.current
    }

    /// Normalised progress in [0, 1]. Ticks earlier than the start count as 0.
    pub fn fraction(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.fraction(now) >= 1.0
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_endpoints() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        animator.set_target(84.0, ms(500));

        assert_eq!(animator.tick(ms(500)), 0.0);
        assert_eq!(animator.tick(ms(1500)), 84.0);
        assert!(animator.is_finished(ms(1500)));
    }

    #[test]
    fn test_linear_midpoint_and_clamp() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        animator.set_target(80.0, ms(0));

        assert_eq!(animator.tick(ms(250)), 20.0);
        assert_eq!(animator.tick(ms(500)), 40.0);
        assert!(!animator.is_finished(ms(999)));
        assert_eq!(animator.tick(ms(10_000)), 80.0);
    }

    #[test]
    fn test_monotonic_approach() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        animator.set_target(63.0, ms(0));

        let mut previous = 0.0;
        for t in (0..=1200).step_by(16) {
            let value = animator.tick(ms(t));
            assert!(value >= previous);
            assert!(value <= 63.0);
            previous = value;
        }
        assert_eq!(previous, 63.0);
    }

    #[test]
    fn test_restart_on_material_change_only() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        assert!(animator.set_target(80.0, ms(0)));
        animator.tick(ms(1000));

        assert!(!animator.set_target(80.2, ms(2000)));
        assert_eq!(animator.tick(ms(2000)), 80.0);

        assert!(animator.set_target(40.0, ms(2000)));
        assert_eq!(animator.tick(ms(2000)), 0.0);
        assert_eq!(animator.tick(ms(2500)), 20.0);
    }

    #[test]
    fn test_tick_before_start_and_zero_duration() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        animator.set_target(50.0, ms(3000));
        assert_eq!(animator.tick(ms(1000)), 0.0);

        let mut instant = ProgressAnimator::new(Duration::ZERO, 0.5);
        instant.set_target(50.0, ms(0));
        assert_eq!(instant.tick(ms(0)), 50.0);
    }

    #[test]
    fn test_non_finite_target_ignored() {
        let mut animator = ProgressAnimator::new(ms(1000), 0.5);
        assert!(!animator.set_target(f64::NAN, ms(0)));
        assert_eq!(animator.target(), 0.0);
    }
}
