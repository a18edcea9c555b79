//! Reduce-on-plateau learning rate schedule.

use crate::config::PlateauConfig;

/// Multiplies the learning rate by `factor` once the monitored loss has not
/// improved by a relative `threshold` for more than `patience` epochs.
#[derive(Debug, Clone)]
pub struct ReduceOnPlateau {
    config: PlateauConfig,
    lr: f64,
    best: f64,
    num_bad_epochs: usize,
    cooldown_counter: usize,
}

impl ReduceOnPlateau {
    /// Create a schedule starting at `initial_lr`.
    pub fn new(config: PlateauConfig, initial_lr: f64) -> Self {
        Self {
            config,
            lr: initial_lr,
            best: f64::INFINITY,
            num_bad_epochs: 0,
            cooldown_counter: 0,
        }
    }

    /// Current learning rate.
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Override the current learning rate, e.g. when resuming.
    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }

    /// Best loss seen so far.
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Record the loss of one epoch and return the learning rate to use next.
    pub fn step(&mut self, loss: f64) -> f64 {
        if loss < self.best * (1.0 - self.config.threshold) {
            self.best = loss;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs > self.config.patience {
            let reduced = (self.lr * self.config.factor).max(self.config.min_lr);
            if self.lr - reduced > f64::EPSILON {
                log::info!("Reducing learning rate from {:.3e} to {:.3e}", self.lr, reduced);
                self.lr = reduced;
            }
            self.cooldown_counter = self.config.cooldown;
            self.num_bad_epochs = 0;
        }

        self.lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> ReduceOnPlateau {
        ReduceOnPlateau::new(PlateauConfig::new().with_patience(2), 1e-3)
    }

    #[test]
    fn test_improving_loss_keeps_rate() {
        let mut sched = schedule();
        for loss in [1.0, 0.9, 0.8, 0.7, 0.6] {
            assert_eq!(sched.step(loss), 1e-3);
        }
        assert_eq!(sched.best(), 0.6);
    }

    #[test]
    fn test_plateau_reduces_after_patience() {
        let mut sched = schedule();
        sched.step(1.0);
        // within 5% of the best does not count as an improvement
        assert_eq!(sched.step(0.97), 1e-3);
        assert_eq!(sched.step(0.99), 1e-3);
        let lr = sched.step(0.98);
        assert!((lr - 2e-4).abs() < 1e-12);
        assert_eq!(sched.best(), 1.0);
    }

    #[test]
    fn test_min_lr_floor() {
        let config = PlateauConfig::new().with_patience(0).with_min_lr(1e-4);
        let mut sched = ReduceOnPlateau::new(config, 1e-3);
        sched.step(1.0);
        for _ in 0..5 {
            sched.step(1.0);
        }
        assert!((sched.lr() - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_cooldown_delays_counting() {
        let config = PlateauConfig::new().with_patience(0).with_cooldown(2);
        let mut sched = ReduceOnPlateau::new(config, 1.0);
        sched.step(1.0);
        assert!((sched.step(1.0) - 0.2).abs() < 1e-12);
        assert!((sched.step(1.0) - 0.2).abs() < 1e-12);
        assert!((sched.step(1.0) - 0.2).abs() < 1e-12);
        assert!((sched.step(1.0) - 0.04).abs() < 1e-12);
    }
}
