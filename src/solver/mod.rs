//! Optimization driver with interchangeable search strategies.
//!
//! The driver owns the search state. Each iteration it asks a [SearchStrategy]
//! for a batch of candidates in the unit cube of the bounded design variables,
//! evaluates the batch in parallel, and hands the scores back to the strategy.
use crate::constants::PhysicalConstants;
use crate::constraints::{check, ConstraintEvaluation, ConstraintLimits};
use crate::cost::cost_of;
use crate::design::DesignVector;
use crate::error::{GeneratorError, GeneratorResult};
use crate::machine::{evaluate, EvaluationResult};
use crate::materials::MaterialProperties;
use crate::variables::DesignBounds;
use itertools::Itertools;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

mod differential_evolution;
mod penalty_gradient;
pub use differential_evolution::{DifferentialEvolution, DifferentialEvolutionOptions};
pub use penalty_gradient::{PenaltyGradient, PenaltyGradientOptions};

/// Quantity minimized by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Costs,
    Mass,
    ActiveMass,
    Losses,
    /// Drivetrain efficiency, maximized.
    Efficiency,
}

impl Objective {
    /// Value to be minimized.
    pub fn value(&self, result: &EvaluationResult, cost: f64) -> f64 {
        match self {
            Self::Costs => cost,
            Self::Mass => result.masses.total,
            Self::ActiveMass => result.masses.active,
            Self::Losses => result.losses.total,
            Self::Efficiency => -result.overall_efficiency,
        }
    }
}

impl FromStr for Objective {
    type Err = GeneratorError;

    fn from_str(name: &str) -> GeneratorResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "costs" => Ok(Self::Costs),
            "mass" => Ok(Self::Mass),
            "active_mass" => Ok(Self::ActiveMass),
            "losses" => Ok(Self::Losses),
            "efficiency" => Ok(Self::Efficiency),
            _ => Err(GeneratorError::config(format!(
                "unknown objective '{name}' (expected one of costs, mass, active_mass, losses, efficiency)"
            ))),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Costs => "costs",
            Self::Mass => "mass",
            Self::ActiveMass => "active_mass",
            Self::Losses => "losses",
            Self::Efficiency => "efficiency",
        };
        write!(f, "{name}")
    }
}

/// Objective value and constraint violation of an evaluated candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub objective: f64,
    /// Sum of relative constraint violations.
    pub violation: f64,
    pub feasible: bool,
}

impl Score {
    /// Score of a candidate the evaluator rejected as non-physical.
    pub fn rejected() -> Self {
        Self {
            objective: f64::INFINITY,
            violation: f64::INFINITY,
            feasible: false,
        }
    }

    /// Feasibility-first ordering: feasible candidates by objective, feasible
    /// before infeasible, infeasible candidates by violation.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.feasible, other.feasible) {
            (true, true) => self.objective.total_cmp(&other.objective),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.violation.total_cmp(&other.violation),
        }
    }

    pub fn better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }
}

/// A search strategy working in the unit cube `[0, 1]^n`.
pub trait SearchStrategy {
    /// Candidates to evaluate next.
    fn propose(&mut self) -> Vec<Array1<f64>>;

    /// Scores of the last proposed batch, in proposal order.
    fn accept(&mut self, scores: &[Score]);

    fn converged(&self) -> bool;
}

/// The available search strategies and their parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy")]
pub enum SolverKind {
    DifferentialEvolution(DifferentialEvolutionOptions),
    PenaltyGradient(PenaltyGradientOptions),
}

impl Default for SolverKind {
    fn default() -> Self {
        Self::DifferentialEvolution(Default::default())
    }
}

impl SolverKind {
    fn build(
        &self,
        initial: Array1<f64>,
        seed: u64,
        tolerance: f64,
    ) -> GeneratorResult<Box<dyn SearchStrategy>> {
        Ok(match self {
            Self::DifferentialEvolution(options) => Box::new(DifferentialEvolution::new(
                *options, initial, seed, tolerance,
            )?),
            Self::PenaltyGradient(options) => {
                Box::new(PenaltyGradient::new(*options, initial, tolerance)?)
            }
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::DifferentialEvolution(_) => "differential evolution",
            Self::PenaltyGradient(_) => "penalty gradient",
        }
    }
}

/// Iteration budget and strategy selection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    #[serde(rename = "timeout [s]")]
    pub timeout: Option<f64>,
    pub seed: u64,
    pub solver: SolverKind,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tolerance: 1e-6,
            timeout: None,
            seed: 0,
            solver: SolverKind::default(),
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> GeneratorResult<()> {
        if self.max_iter == 0 {
            return Err(GeneratorError::config("max_iter must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(GeneratorError::config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if let Some(timeout) = self.timeout {
            if !(timeout.is_finite() && timeout >= 0.0) {
                return Err(GeneratorError::config(format!(
                    "timeout must be non-negative, got {timeout}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    Converged,
    MaxIter,
    Infeasible,
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "CONVERGED"),
            Self::MaxIter => write!(f, "MAX_ITER"),
            Self::Infeasible => write!(f, "INFEASIBLE"),
        }
    }
}

/// The best iterate of an optimization run.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizationOutcome {
    pub design: DesignVector,
    /// `None` if the evaluator rejected every candidate as non-physical.
    pub result: Option<EvaluationResult>,
    pub cost: Option<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub status: OptimizationStatus,
    pub constraints: ConstraintEvaluation,
    /// Names and relative magnitudes of the violated constraints.
    pub violations: Vec<(String, f64)>,
}

enum Assessment {
    Evaluated {
        result: Box<EvaluationResult>,
        cost: f64,
        constraints: ConstraintEvaluation,
    },
    Rejected(String),
}

struct Candidate {
    design: DesignVector,
    assessment: Assessment,
    score: Score,
}

/// Runs optimizations of generator designs for fixed materials, constants, and limits.
pub struct OptimizationDriver {
    materials: MaterialProperties,
    constants: PhysicalConstants,
    limits: ConstraintLimits,
    options: SolverOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl OptimizationDriver {
    pub fn new(
        materials: MaterialProperties,
        constants: PhysicalConstants,
        limits: ConstraintLimits,
        options: SolverOptions,
    ) -> GeneratorResult<Self> {
        constants.validate()?;
        limits.validate()?;
        options.validate()?;
        Ok(Self {
            materials,
            constants,
            limits,
            options,
            cancel: None,
        })
    }

    /// Attaches a flag that stops the run before the next iteration once set.
    pub fn with_cancellation(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn assess(&self, design: DesignVector, objective: Objective) -> GeneratorResult<Candidate> {
        let evaluated = evaluate(&design, &self.materials, &self.constants).and_then(|result| {
            let cost = cost_of(&result.masses, self.materials.costs())?;
            Ok((result, cost))
        });
        let (result, cost) = match evaluated {
            Ok(evaluated) => evaluated,
            Err(e) if e.is_infeasible_candidate() => {
                return Ok(Candidate {
                    design,
                    assessment: Assessment::Rejected(e.to_string()),
                    score: Score::rejected(),
                })
            }
            Err(e) => return Err(e),
        };
        let constraints = check(&result, &self.limits);
        let score = Score {
            objective: objective.value(&result, cost),
            violation: constraints.total_violation(),
            feasible: constraints.feasible(),
        };
        Ok(Candidate {
            design,
            assessment: Assessment::Evaluated {
                result: Box::new(result),
                cost,
                constraints,
            },
            score,
        })
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(AtomicOrdering::Relaxed))
    }

    /// Searches the box `bounds` around `initial` for the feasible design that
    /// minimizes the objective named `objective`.
    ///
    /// Non-convergence is reported through the status of the outcome. Only
    /// invalid configurations produce an error.
    pub fn optimize(
        &self,
        initial: &DesignVector,
        bounds: &DesignBounds,
        objective: &str,
    ) -> GeneratorResult<OptimizationOutcome> {
        let objective: Objective = objective.parse()?;
        let space = bounds.search_space(initial)?;
        let mut strategy =
            self.options
                .solver
                .build(space.initial_point(), self.options.seed, self.options.tolerance)?;
        let timeout = self.options.timeout.map(Duration::from_secs_f64);
        let start = Instant::now();

        info!(
            "optimizing {} {objective} with {} over {} variables",
            initial.machine_type(),
            self.options.solver.name(),
            space.dimension()
        );

        let mut best = self.assess(*initial, objective)?;
        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.options.max_iter {
            if self.cancelled() {
                warn!("optimization cancelled after {iterations} iterations");
                break;
            }
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                warn!("optimization timed out after {iterations} iterations");
                break;
            }

            let batch = strategy.propose();
            let candidates = batch
                .par_iter()
                .map(|u| self.assess(space.design(u)?, objective))
                .collect::<GeneratorResult<Vec<_>>>()?;
            let scores: Vec<_> = candidates.iter().map(|c| c.score).collect();
            strategy.accept(&scores);
            for candidate in candidates {
                if candidate.score.better_than(&best.score) {
                    best = candidate;
                }
            }
            iterations += 1;
            debug!(
                "iteration {iterations}: objective {:.6e}, violation {:.3e}, feasible {}",
                best.score.objective, best.score.violation, best.score.feasible
            );

            if strategy.converged() {
                converged = true;
                break;
            }
        }

        let status = if !best.score.feasible {
            OptimizationStatus::Infeasible
        } else if converged {
            OptimizationStatus::Converged
        } else {
            OptimizationStatus::MaxIter
        };
        let outcome = match best.assessment {
            Assessment::Evaluated {
                result,
                cost,
                constraints,
            } => OptimizationOutcome {
                design: best.design,
                result: Some(*result),
                cost: Some(cost),
                objective: best.score.objective,
                iterations,
                status,
                violations: constraints.violations(),
                constraints,
            },
            Assessment::Rejected(reason) => OptimizationOutcome {
                design: best.design,
                result: None,
                cost: None,
                objective: best.score.objective,
                iterations,
                status,
                constraints: ConstraintEvaluation::default(),
                violations: vec![(reason, f64::INFINITY)],
            },
        };

        if status == OptimizationStatus::Infeasible {
            warn!(
                "no feasible design after {iterations} iterations, violated: {}",
                outcome
                    .violations
                    .iter()
                    .map(|(name, v)| format!("{name} ({v:.3e})"))
                    .join(", ")
            );
        } else {
            info!(
                "optimization finished with status {status} after {iterations} iterations, {objective} = {:.6e}",
                outcome.objective
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(objective: f64, violation: f64, feasible: bool) -> Score {
        Score {
            objective,
            violation,
            feasible,
        }
    }

    #[test]
    fn feasibility_first_ranking() {
        let feasible = score(10.0, 0.0, true);
        let cheap_infeasible = score(1.0, 0.1, false);
        assert!(feasible.better_than(&cheap_infeasible));
        assert!(score(5.0, 0.0, true).better_than(&feasible));
        assert!(cheap_infeasible.better_than(&score(0.5, 0.2, false)));
        assert!(cheap_infeasible.better_than(&Score::rejected()));
    }

    #[test]
    fn objective_names() {
        assert_eq!("costs".parse::<Objective>().unwrap(), Objective::Costs);
        assert_eq!("Active_Mass".parse::<Objective>().unwrap(), Objective::ActiveMass);
        assert!("torque".parse::<Objective>().is_err());
    }

    #[test]
    fn solver_options_from_json() {
        let options: SolverOptions = serde_json::from_str(
            r#"{"max_iter": 50, "solver": {"strategy": "PenaltyGradient"}}"#,
        )
        .unwrap();
        assert_eq!(options.max_iter, 50);
        assert!(matches!(options.solver, SolverKind::PenaltyGradient(_)));
        assert!(options.validate().is_ok());
    }
}
