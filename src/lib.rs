#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Sizing of squirrel-cage and doubly-fed induction generators for wind
//! turbine drivetrains.
//!
//! A [DesignVector] is evaluated by a closed-form electromagnetic model
//! ([evaluate]) into an [EvaluationResult], which feeds the [cost] model, the
//! [constraints] and the [mechanical] summary. The [OptimizationDriver]
//! searches the bounded design space for a feasible design minimizing a
//! selected [Objective].
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod constants;
pub mod constraints;
pub mod cost;
pub mod design;
mod error;
pub mod machine;
pub mod materials;
pub mod mechanical;
pub mod report;
pub mod solver;
mod variables;

pub use constants::PhysicalConstants;
pub use constraints::{check, ConstraintEvaluation, ConstraintLimits};
pub use cost::{cost, cost_of, CostCoefficients};
pub use design::{DesignVector, DfigDesign, MachineType, RatedConditions, ScigDesign};
pub use error::{GeneratorError, GeneratorResult};
pub use machine::{evaluate, EvaluationResult, LossBreakdown, MassBreakdown};
pub use materials::MaterialProperties;
pub use mechanical::{to_mechanical, MechanicalSummary};
pub use solver::{
    Objective, OptimizationDriver, OptimizationOutcome, OptimizationStatus, SolverKind,
    SolverOptions,
};
pub use variables::{DesignBounds, SearchSpace, Variable};

/// A full optimization problem consisting of an initial [DesignVector], the
/// bounds of the design variables, and the name of the objective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProblem {
    pub design: DesignVector,
    pub bounds: DesignBounds,
    pub objective: String,
    #[serde(default)]
    pub materials: MaterialProperties,
    #[serde(default)]
    pub constants: PhysicalConstants,
    #[serde(default)]
    pub limits: ConstraintLimits,
    #[serde(default)]
    pub options: SolverOptions,
}

impl OptimizationProblem {
    /// A problem with default materials, constants, limits, and solver options.
    pub fn new(design: DesignVector, bounds: DesignBounds, objective: &str) -> Self {
        Self {
            design,
            bounds,
            objective: objective.into(),
            materials: Default::default(),
            constants: Default::default(),
            limits: Default::default(),
            options: Default::default(),
        }
    }

    pub fn from_json<P: AsRef<Path>>(file: P) -> GeneratorResult<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }

    pub fn to_json<P: AsRef<Path>>(&self, file: P) -> GeneratorResult<()> {
        Ok(serde_json::to_writer_pretty(
            BufWriter::new(File::create(file)?),
            self,
        )?)
    }

    /// Evaluates the initial design.
    pub fn evaluate(&self) -> GeneratorResult<EvaluationResult> {
        evaluate(&self.design, &self.materials, &self.constants)
    }

    pub fn driver(&self) -> GeneratorResult<OptimizationDriver> {
        OptimizationDriver::new(self.materials, self.constants, self.limits, self.options)
    }

    pub fn optimize(&self) -> GeneratorResult<OptimizationOutcome> {
        self.driver()?
            .optimize(&self.design, &self.bounds, &self.objective)
    }
}
