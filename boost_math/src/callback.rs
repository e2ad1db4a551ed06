//! Early stopping on a validation metric

/// Tracks a lower-is-better validation metric and signals when no
/// improvement has been seen for `patience` rounds.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best_value: Option<f64>,
    best_round: usize,
    current_round: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_value: None,
            best_round: 0,
            current_round: 0,
        }
    }

    /// Record the metric for the current round.
    ///
    /// Returns `true` once `patience` rounds have passed without improvement.
    pub fn should_stop(&mut self, value: f64) -> bool {
        let is_improvement = self.best_value.map_or(true, |best| value < best);
        if is_improvement {
            self.best_value = Some(value);
            self.best_round = self.current_round;
        }

        self.current_round += 1;
        self.current_round - self.best_round > self.patience
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Zero-based round at which the best value was observed
    pub fn best_round(&self) -> usize {
        self.best_round
    }
}
