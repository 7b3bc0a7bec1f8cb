use super::{Score, SearchStrategy};
use crate::error::{GeneratorError, GeneratorResult};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferentialEvolutionOptions {
    pub population_size: usize,
    /// Scale factor of the difference vector.
    pub differential_weight: f64,
    pub crossover_probability: f64,
    /// Generations without improvement of the best feasible objective after
    /// which the search stops.
    pub stall_generations: usize,
}

impl Default for DifferentialEvolutionOptions {
    fn default() -> Self {
        Self {
            population_size: 40,
            differential_weight: 0.7,
            crossover_probability: 0.9,
            stall_generations: 50,
        }
    }
}

/// DE/rand/1/bin with feasibility-first selection.
///
/// The initial design is the first member of the population; the others are
/// drawn uniformly from the unit cube.
pub struct DifferentialEvolution {
    options: DifferentialEvolutionOptions,
    tolerance: f64,
    rng: StdRng,
    initial: Array1<f64>,
    population: Vec<Array1<f64>>,
    scores: Vec<Score>,
    trials: Vec<Array1<f64>>,
    best: Option<f64>,
    stall: usize,
}

impl DifferentialEvolution {
    pub fn new(
        options: DifferentialEvolutionOptions,
        initial: Array1<f64>,
        seed: u64,
        tolerance: f64,
    ) -> GeneratorResult<Self> {
        if options.population_size < 4 {
            return Err(GeneratorError::config(
                "differential evolution needs a population of at least 4",
            ));
        }
        if !(options.differential_weight > 0.0 && options.differential_weight <= 2.0) {
            return Err(GeneratorError::config(format!(
                "differential weight must be in (0, 2], got {}",
                options.differential_weight
            )));
        }
        if !(0.0..=1.0).contains(&options.crossover_probability) {
            return Err(GeneratorError::config(format!(
                "crossover probability must be in [0, 1], got {}",
                options.crossover_probability
            )));
        }
        if options.stall_generations == 0 {
            return Err(GeneratorError::config(
                "stall_generations must be positive",
            ));
        }
        Ok(Self {
            options,
            tolerance,
            rng: StdRng::seed_from_u64(seed),
            initial,
            population: Vec::new(),
            scores: Vec::new(),
            trials: Vec::new(),
            best: None,
            stall: 0,
        })
    }

    /// Lowest objective of the feasible members.
    fn best_feasible(&self) -> Option<f64> {
        self.scores
            .iter()
            .filter(|s| s.feasible)
            .map(|s| s.objective)
            .min_by(f64::total_cmp)
    }

    fn update_stall(&mut self) {
        let best = self.best_feasible();
        self.stall = match (self.best, best) {
            (Some(previous), Some(current))
                if previous - current <= self.tolerance * previous.abs().max(1.0) =>
            {
                self.stall + 1
            }
            _ => 0,
        };
        self.best = best;
    }

    fn initialize(&mut self) -> Vec<Array1<f64>> {
        let n = self.initial.len();
        let mut population = Vec::with_capacity(self.options.population_size);
        population.push(self.initial.clone());
        for _ in 1..self.options.population_size {
            population.push(Array1::from_shape_fn(n, |_| self.rng.gen::<f64>()));
        }
        population
    }

    /// Three distinct members other than `target`.
    fn donors(&mut self, target: usize) -> [usize; 3] {
        let n = self.population.len();
        let mut picks = [target; 3];
        for k in 0..3 {
            loop {
                let r = self.rng.gen_range(0..n);
                if r != target && !picks[..k].contains(&r) {
                    picks[k] = r;
                    break;
                }
            }
        }
        picks
    }

    fn trial(&mut self, target: usize) -> Array1<f64> {
        let [a, b, c] = self.donors(target);
        let f = self.options.differential_weight;
        let mutant = &self.population[a] + &((&self.population[b] - &self.population[c]) * f);
        let x = &self.population[target];
        let n = x.len();
        let j_rand = self.rng.gen_range(0..n);
        let mut trial = x.clone();
        for j in 0..n {
            if j == j_rand || self.rng.gen::<f64>() < self.options.crossover_probability {
                // bounce back into the cube
                trial[j] = if mutant[j] < 0.0 {
                    x[j] * self.rng.gen::<f64>()
                } else if mutant[j] > 1.0 {
                    x[j] + (1.0 - x[j]) * self.rng.gen::<f64>()
                } else {
                    mutant[j]
                };
            }
        }
        trial
    }
}

impl SearchStrategy for DifferentialEvolution {
    fn propose(&mut self) -> Vec<Array1<f64>> {
        self.trials = if self.scores.is_empty() {
            self.initialize()
        } else {
            (0..self.population.len()).map(|i| self.trial(i)).collect()
        };
        self.trials.clone()
    }

    fn accept(&mut self, scores: &[Score]) {
        let trials = std::mem::take(&mut self.trials);
        if self.scores.is_empty() {
            self.population = trials;
            self.scores = scores.to_vec();
            self.best = self.best_feasible();
            return;
        }
        for (i, (trial, score)) in trials.into_iter().zip(scores).enumerate() {
            if score.compare(&self.scores[i]) != Ordering::Greater {
                self.population[i] = trial;
                self.scores[i] = *score;
            }
        }
        self.update_stall();
    }

    /// The best feasible objective stalled, or the whole population is feasible
    /// and its objective spread is below the tolerance.
    fn converged(&self) -> bool {
        if self.best.is_some() && self.stall >= self.options.stall_generations {
            return true;
        }
        if self.scores.is_empty() || !self.scores.iter().all(|s| s.feasible) {
            return false;
        }
        let (min, max) = self
            .scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), s| {
                (min.min(s.objective), max.max(s.objective))
            });
        max - min <= self.tolerance * min.abs().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(x: &Array1<f64>) -> Score {
        Score {
            objective: x.mapv(|x| (x - 0.3).powi(2)).sum(),
            violation: 0.0,
            feasible: true,
        }
    }

    #[test]
    fn minimizes_sphere() {
        let mut de = DifferentialEvolution::new(
            Default::default(),
            Array1::from(vec![0.9, 0.9, 0.9]),
            7,
            1e-10,
        )
        .unwrap();
        for _ in 0..300 {
            let batch = de.propose();
            assert!(batch.iter().flatten().all(|u| (0.0..=1.0).contains(u)));
            let scores: Vec<_> = batch.iter().map(sphere).collect();
            de.accept(&scores);
            if de.converged() {
                break;
            }
        }
        let best = de
            .scores
            .iter()
            .map(|s| s.objective)
            .fold(f64::INFINITY, f64::min);
        assert!(best < 1e-6);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let initial = Array1::from(vec![0.5, 0.5]);
        let mut a = DifferentialEvolution::new(Default::default(), initial.clone(), 3, 1e-6).unwrap();
        let mut b = DifferentialEvolution::new(Default::default(), initial, 3, 1e-6).unwrap();
        assert_eq!(a.propose(), b.propose());
    }

    #[test]
    fn stops_when_the_best_stalls() {
        let options = DifferentialEvolutionOptions {
            stall_generations: 5,
            ..Default::default()
        };
        let mut de = DifferentialEvolution::new(options, Array1::from(vec![0.5, 0.5]), 1, 1e-6)
            .unwrap();
        // only the initial design is feasible, so the spread test never applies
        let initial = Array1::from(vec![0.5, 0.5]);
        let score = |x: &Array1<f64>| {
            let distance = (x - &initial).mapv(f64::abs).sum();
            Score {
                objective: 1.0,
                violation: distance,
                feasible: distance == 0.0,
            }
        };
        let mut generations = 0;
        while !de.converged() {
            let batch = de.propose();
            let scores: Vec<_> = batch.iter().map(score).collect();
            de.accept(&scores);
            generations += 1;
            assert!(generations < 100);
        }
        assert_eq!(generations, 6);
        assert_eq!(de.stall, 5);
    }

    #[test]
    fn rejects_small_population() {
        let options = DifferentialEvolutionOptions {
            population_size: 3,
            ..Default::default()
        };
        assert!(DifferentialEvolution::new(options, Array1::zeros(2), 0, 1e-6).is_err());
    }
}
