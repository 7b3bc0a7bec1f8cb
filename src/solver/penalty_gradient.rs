use super::{Score, SearchStrategy};
use crate::error::{GeneratorError, GeneratorResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyGradientOptions {
    /// Weight of the relative constraint violation in the merit function.
    pub penalty: f64,
    /// Finite difference step in unit-cube coordinates.
    pub finite_difference_step: f64,
    /// Longest line search step in unit-cube coordinates.
    pub max_step: f64,
    pub line_search_points: usize,
}

impl Default for PenaltyGradientOptions {
    fn default() -> Self {
        Self {
            penalty: 1e3,
            finite_difference_step: 1e-6,
            max_step: 0.2,
            line_search_points: 8,
        }
    }
}

enum Phase {
    Gradient,
    LineSearch,
}

/// Projected steepest descent on an exterior penalty merit function.
///
/// Iterations alternate between a batch of forward (or, at the upper bound,
/// backward) differences and a batch of geometrically shrinking steps along the
/// projected descent direction.
pub struct PenaltyGradient {
    options: PenaltyGradientOptions,
    tolerance: f64,
    x: Array1<f64>,
    merit: Option<f64>,
    scale: Option<f64>,
    phase: Phase,
    offsets: Vec<f64>,
    direction: Array1<f64>,
    step: f64,
    trials: Vec<Array1<f64>>,
    converged: bool,
}

impl PenaltyGradient {
    pub fn new(
        options: PenaltyGradientOptions,
        initial: Array1<f64>,
        tolerance: f64,
    ) -> GeneratorResult<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(options.penalty)
            && positive(options.finite_difference_step)
            && positive(options.max_step)
            && options.line_search_points > 0)
        {
            return Err(GeneratorError::config(format!(
                "invalid penalty gradient options: {options:?}"
            )));
        }
        let n = initial.len();
        Ok(Self {
            options,
            tolerance,
            x: initial,
            merit: None,
            scale: None,
            phase: Phase::Gradient,
            offsets: Vec::new(),
            direction: Array1::zeros(n),
            step: options.max_step,
            trials: Vec::new(),
            converged: false,
        })
    }

    fn merit(&self, score: &Score) -> f64 {
        if !score.objective.is_finite() || !score.violation.is_finite() {
            return f64::INFINITY;
        }
        score.objective / self.scale.unwrap_or(1.0) + self.options.penalty * score.violation
    }

    fn gradient_batch(&mut self) -> Vec<Array1<f64>> {
        let h = self.options.finite_difference_step;
        self.offsets = self
            .x
            .iter()
            .map(|&x| if x + h <= 1.0 { h } else { -h })
            .collect();
        let mut batch = Vec::with_capacity(self.x.len() + 1);
        batch.push(self.x.clone());
        for (j, &offset) in self.offsets.iter().enumerate() {
            let mut x = self.x.clone();
            x[j] += offset;
            batch.push(x);
        }
        batch
    }

    fn line_search_batch(&self) -> Vec<Array1<f64>> {
        (0..self.options.line_search_points)
            .map(|k| {
                let alpha = self.step * 0.5f64.powi(k as i32);
                (&self.x + &(&self.direction * alpha)).mapv(|u| u.clamp(0.0, 1.0))
            })
            .collect()
    }

    fn accept_gradient(&mut self, scores: &[Score]) {
        // normalize the objective with its magnitude at the first finite evaluation
        if self.scale.is_none() && scores[0].objective.is_finite() {
            let magnitude = scores[0].objective.abs();
            self.scale = Some(if magnitude > 0.0 { magnitude } else { 1.0 });
        }
        let merit = self.merit(&scores[0]);
        self.merit = Some(merit);
        if !merit.is_finite() {
            self.converged = true;
            return;
        }
        let gradient: Array1<f64> = scores[1..]
            .iter()
            .zip(&self.offsets)
            .map(|(score, &offset)| {
                let m = self.merit(score);
                if m.is_finite() {
                    (m - merit) / offset
                } else {
                    // step into a non-physical region: push away from it
                    offset.signum() * 1e6
                }
            })
            .collect();

        // project onto the box: drop components that would leave it
        let mut direction = -gradient;
        for (d, &x) in direction.iter_mut().zip(&self.x) {
            if (x <= 0.0 && *d < 0.0) || (x >= 1.0 && *d > 0.0) {
                *d = 0.0;
            }
        }
        let norm = direction.mapv(|d| d * d).sum().sqrt();
        if norm <= self.tolerance {
            self.converged = true;
            return;
        }
        self.direction = direction / norm;
        self.phase = Phase::LineSearch;
    }

    fn accept_line_search(&mut self, scores: &[Score]) {
        let current = self.merit.unwrap_or(f64::INFINITY);
        let trials = std::mem::take(&mut self.trials);
        let best = trials
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(k, (x, score))| (k, x, self.merit(score)))
            .min_by(|a, b| a.2.total_cmp(&b.2));

        match best {
            Some((k, x, merit)) if merit < current => {
                let improvement = current - merit;
                self.x = x;
                self.merit = Some(merit);
                // widen after a full step, otherwise continue from the accepted length
                let accepted = self.step * 0.5f64.powi(k as i32);
                self.step = if k == 0 {
                    (2.0 * accepted).min(self.options.max_step)
                } else {
                    accepted
                };
                if improvement <= self.tolerance * current.abs().max(1.0) {
                    self.converged = true;
                }
            }
            _ => {
                self.step *= 0.5f64.powi(self.options.line_search_points as i32);
                if self.step <= self.tolerance {
                    self.converged = true;
                }
            }
        }
        self.phase = Phase::Gradient;
    }
}

impl SearchStrategy for PenaltyGradient {
    fn propose(&mut self) -> Vec<Array1<f64>> {
        self.trials = match self.phase {
            Phase::Gradient => self.gradient_batch(),
            Phase::LineSearch => self.line_search_batch(),
        };
        self.trials.clone()
    }

    fn accept(&mut self, scores: &[Score]) {
        match self.phase {
            Phase::Gradient => self.accept_gradient(scores),
            Phase::LineSearch => self.accept_line_search(scores),
        }
    }

    fn converged(&self) -> bool {
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic(x: &Array1<f64>) -> Score {
        // minimum at (0.7, 0.2), constrained to x0 <= 0.5
        let objective = 1.0 + (x[0] - 0.7).powi(2) + (x[1] - 0.2).powi(2);
        let violation = (x[0] - 0.5).max(0.0) / 0.5;
        Score {
            objective,
            violation,
            feasible: violation == 0.0,
        }
    }

    fn run(mut strategy: PenaltyGradient, f: fn(&Array1<f64>) -> Score) -> Array1<f64> {
        for _ in 0..500 {
            let batch = strategy.propose();
            let scores: Vec<_> = batch.iter().map(f).collect();
            strategy.accept(&scores);
            if strategy.converged() {
                break;
            }
        }
        strategy.x
    }

    #[test]
    fn descends_to_unconstrained_minimum() {
        let f = |x: &Array1<f64>| Score {
            objective: 1.0 + (x[0] - 0.7).powi(2) + (x[1] - 0.2).powi(2),
            violation: 0.0,
            feasible: true,
        };
        let strategy =
            PenaltyGradient::new(Default::default(), Array1::from(vec![0.1, 0.9]), 1e-10).unwrap();
        let x = run(strategy, f);
        assert!((x[0] - 0.7).abs() < 1e-3);
        assert!((x[1] - 0.2).abs() < 1e-3);
    }

    #[test]
    fn penalty_limits_constraint_violation() {
        let strategy =
            PenaltyGradient::new(Default::default(), Array1::from(vec![0.1, 0.9]), 1e-10).unwrap();
        let x = run(strategy, quadratic);
        assert!(x[0] < 0.5 + 1e-3);
        assert!(x[1] < 0.8);
    }

    #[test]
    fn stays_inside_the_cube() {
        let f = |x: &Array1<f64>| Score {
            objective: -x.sum(),
            violation: 0.0,
            feasible: true,
        };
        let strategy =
            PenaltyGradient::new(Default::default(), Array1::from(vec![0.5, 0.5]), 1e-8).unwrap();
        let x = run(strategy, f);
        assert!(x.iter().all(|&u| (0.0..=1.0).contains(&u)));
        assert!(x.iter().all(|&u| u > 0.99));
    }
}
