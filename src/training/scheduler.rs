//! Learning Rate Scheduling
//!
//! Reduce-on-plateau scheduling: when the monitored metric stops improving
//! for `patience` consecutive epochs, the learning rate is multiplied by a
//! reduction factor. The training loop monitors validation loss.

use serde::{Deserialize, Serialize};

/// Direction of improvement for the monitored metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateauMode {
    /// Metric should decrease (e.g., loss)
    Min,
    /// Metric should increase (e.g., accuracy)
    Max,
}

/// Stateful reduce-on-plateau scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceOnPlateau {
    best_metric: f64,
    epochs_without_improvement: usize,
    current_lr: f64,
    reduction_factor: f64,
    patience: usize,
    min_delta: f64,
    min_lr: f64,
    mode: PlateauMode,
}

impl ReduceOnPlateau {
    /// Create a new scheduler
    pub fn new(
        initial_lr: f64,
        reduction_factor: f64,
        patience: usize,
        min_lr: f64,
        mode: PlateauMode,
    ) -> Self {
        let best_metric = match mode {
            PlateauMode::Min => f64::INFINITY,
            PlateauMode::Max => f64::NEG_INFINITY,
        };

        Self {
            best_metric,
            epochs_without_improvement: 0,
            current_lr: initial_lr,
            reduction_factor,
            patience,
            min_delta: 1e-4,
            min_lr,
            mode,
        }
    }

    /// Scheduler monitoring validation loss with the standard settings
    /// (factor 0.1, patience 2)
    pub fn on_validation_loss(initial_lr: f64, patience: usize) -> Self {
        Self::new(initial_lr, 0.1, patience, 0.0, PlateauMode::Min)
    }

    /// Update with a new metric value; returns the learning rate to use for
    /// the next epoch
    pub fn step(&mut self, metric: f64) -> f64 {
        let improved = match self.mode {
            PlateauMode::Min => metric < self.best_metric - self.min_delta,
            PlateauMode::Max => metric > self.best_metric + self.min_delta,
        };

        if improved {
            self.best_metric = metric;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;

            if self.epochs_without_improvement >= self.patience {
                let new_lr = (self.current_lr * self.reduction_factor).max(self.min_lr);
                if new_lr < self.current_lr {
                    self.current_lr = new_lr;
                    self.epochs_without_improvement = 0;
                }
            }
        }

        self.current_lr
    }

    /// Get the current learning rate
    pub fn lr(&self) -> f64 {
        self.current_lr
    }

    /// Best metric value seen so far
    pub fn best(&self) -> f64 {
        self.best_metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_resets_patience() {
        let mut scheduler = ReduceOnPlateau::on_validation_loss(0.01, 2);

        assert_eq!(scheduler.step(1.0), 0.01);
        assert_eq!(scheduler.step(0.9), 0.01);
        assert_eq!(scheduler.step(0.95), 0.01); // 1 stale epoch
        assert_eq!(scheduler.step(0.8), 0.01); // improvement resets
        assert_eq!(scheduler.step(0.85), 0.01); // 1 stale epoch
    }

    #[test]
    fn test_reduction_after_patience() {
        let mut scheduler = ReduceOnPlateau::on_validation_loss(0.01, 2);

        scheduler.step(1.0);
        scheduler.step(1.1); // stale 1
        let lr = scheduler.step(1.2); // stale 2 -> reduce

        assert!((lr - 0.001).abs() < 1e-12);
        assert!((scheduler.lr() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_min_lr_floor() {
        let mut scheduler = ReduceOnPlateau::new(0.01, 0.1, 1, 0.005, PlateauMode::Min);

        scheduler.step(1.0);
        let lr = scheduler.step(2.0); // reduce, clamped to min_lr

        assert!((lr - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_max_mode() {
        let mut scheduler = ReduceOnPlateau::new(0.1, 0.5, 1, 0.0, PlateauMode::Max);

        scheduler.step(0.5); // best
        scheduler.step(0.6); // improvement
        let lr = scheduler.step(0.55); // stale -> reduce

        assert!((lr - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_min_delta_guards_tiny_improvements() {
        let mut scheduler = ReduceOnPlateau::on_validation_loss(0.01, 1);

        scheduler.step(1.0);
        // Improvement below min_delta counts as stale
        let lr = scheduler.step(1.0 - 1e-6);
        assert!((lr - 0.001).abs() < 1e-12);
    }
}
