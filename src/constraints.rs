use crate::error::{GeneratorError, GeneratorResult};
use crate::machine::EvaluationResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Closed interval `[lower, upper]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
}

impl Band {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    fn validate(&self, name: &str) -> GeneratorResult<()> {
        if self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper {
            Ok(())
        } else {
            Err(GeneratorError::config(format!(
                "invalid limits for {name}: [{}, {}]",
                self.lower, self.upper
            )))
        }
    }
}

/// Diameter ratio band (outer stator diameter over airgap diameter) for a pole-pair count.
pub fn diameter_ratio_band(pole_pairs: usize) -> Band {
    match pole_pairs {
        1 => Band::new(1.65, 1.69),
        2 => Band::new(1.46, 1.49),
        3 => Band::new(1.37, 1.40),
        4 => Band::new(1.27, 1.30),
        _ => Band::new(1.20, 1.24),
    }
}

/// Targets and limits of the constraint set in SI units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintLimits {
    /// Minimum drivetrain efficiency.
    #[serde(rename = "efficiency_target [%]")]
    pub efficiency_target: f64,
    #[serde(rename = "phase_voltage [V]")]
    pub phase_voltage: Band,
    #[serde(rename = "airgap_flux_density [T]")]
    pub airgap_flux_density: Band,
    /// Saturation ceiling for yoke and tooth flux densities.
    #[serde(rename = "max_flux_density [T]")]
    pub max_flux_density: f64,
    #[serde(rename = "max_specific_current_loading [A/m]")]
    pub max_specific_current_loading: f64,
    #[serde(rename = "max_current_density [A/m^2]")]
    pub max_current_density: f64,
    pub aspect_ratio: Band,
    pub slot_aspect_ratio: Band,
    /// Excitation current ratio of doubly-fed machines.
    pub current_ratio: Band,
}

impl Default for ConstraintLimits {
    fn default() -> Self {
        Self {
            efficiency_target: 93.0,
            phase_voltage: Band::new(500.0, 5000.0),
            airgap_flux_density: Band::new(0.7, 1.2),
            max_flux_density: 2.0,
            max_specific_current_loading: 60e3,
            max_current_density: 6e6,
            aspect_ratio: Band::new(0.5, 1.5),
            slot_aspect_ratio: Band::new(4.0, 10.0),
            current_ratio: Band::new(0.1, 0.3),
        }
    }
}

impl ConstraintLimits {
    pub fn validate(&self) -> GeneratorResult<()> {
        self.phase_voltage.validate("phase voltage")?;
        self.airgap_flux_density.validate("airgap flux density")?;
        self.aspect_ratio.validate("aspect ratio")?;
        self.slot_aspect_ratio.validate("slot aspect ratio")?;
        self.current_ratio.validate("current ratio")?;
        for (name, value) in [
            ("efficiency target", self.efficiency_target),
            ("maximum flux density", self.max_flux_density),
            ("maximum specific current loading", self.max_specific_current_loading),
            ("maximum current density", self.max_current_density),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeneratorError::config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Direction of a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Relation {
    fn is_strict(self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
        };
        write!(f, "{symbol}")
    }
}

/// Signed residual of a single constraint.
///
/// The residual is positive on the satisfied side of the limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintResidual {
    pub value: f64,
    pub relation: Relation,
    pub limit: f64,
    pub residual: f64,
    pub satisfied: bool,
}

impl ConstraintResidual {
    pub fn new(value: f64, relation: Relation, limit: f64) -> Self {
        let residual = match relation {
            Relation::GreaterThan | Relation::GreaterOrEqual => value - limit,
            Relation::LessThan | Relation::LessOrEqual => limit - value,
        };
        let satisfied = if relation.is_strict() {
            residual > 0.0
        } else {
            residual >= 0.0
        };
        Self {
            value,
            relation,
            limit,
            residual,
            satisfied,
        }
    }

    /// Violation relative to the magnitude of the limit; zero if satisfied.
    pub fn violation(&self) -> f64 {
        if self.satisfied {
            return 0.0;
        }
        let scale = if self.limit.abs() > 0.0 {
            self.limit.abs()
        } else {
            1.0
        };
        (-self.residual).max(0.0) / scale
    }
}

/// Named residuals of all constraints, in catalogue order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEvaluation(IndexMap<String, ConstraintResidual>);

impl Deref for ConstraintEvaluation {
    type Target = IndexMap<String, ConstraintResidual>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ConstraintEvaluation {
    fn push(&mut self, name: &str, value: f64, relation: Relation, limit: f64) {
        self.0
            .insert(name.into(), ConstraintResidual::new(value, relation, limit));
    }

    fn push_band(&mut self, name: &str, value: f64, band: Band) {
        self.push(
            &format!("{name}_min"),
            value,
            Relation::GreaterOrEqual,
            band.lower,
        );
        self.push(
            &format!("{name}_max"),
            value,
            Relation::LessOrEqual,
            band.upper,
        );
    }

    pub fn feasible(&self) -> bool {
        self.0.values().all(|c| c.satisfied)
    }

    /// Names and relative magnitudes of all violated constraints.
    pub fn violations(&self) -> Vec<(String, f64)> {
        self.0
            .iter()
            .filter(|(_, c)| !c.satisfied)
            .map(|(name, c)| (name.clone(), c.violation()))
            .collect()
    }

    /// Sum of relative violations.
    pub fn total_violation(&self) -> f64 {
        self.0.values().map(ConstraintResidual::violation).sum()
    }
}

/// Evaluates the constraint catalogue for an evaluated design.
pub fn check(result: &EvaluationResult, limits: &ConstraintLimits) -> ConstraintEvaluation {
    use Relation::*;
    let mut c = ConstraintEvaluation::default();
    let b_max = limits.max_flux_density;

    c.push(
        "overall_efficiency",
        result.overall_efficiency,
        GreaterOrEqual,
        limits.efficiency_target,
    );
    c.push(
        "phase_voltage_min",
        result.phase_voltage,
        GreaterThan,
        limits.phase_voltage.lower,
    );
    c.push(
        "phase_voltage_max",
        result.phase_voltage,
        LessThan,
        limits.phase_voltage.upper,
    );
    c.push(
        "torque",
        result.torque_constraint.from_shear_stress,
        LessThan,
        result.torque_constraint.from_geometry,
    );
    c.push_band(
        "airgap_flux_density",
        result.airgap_flux_density,
        limits.airgap_flux_density,
    );
    c.push(
        "stator_yoke_flux_density",
        result.stator_yoke_flux_density,
        LessThan,
        b_max,
    );
    c.push(
        "rotor_yoke_flux_density",
        result.rotor_yoke_flux_density,
        LessThan,
        b_max,
    );
    c.push(
        "rotor_tooth_flux_density",
        result.rotor_tooth_flux_density,
        LessThan,
        b_max,
    );
    c.push(
        "stator_tooth_flux_density",
        result.stator_tooth_flux_density,
        LessThan,
        b_max,
    );
    c.push(
        "specific_current_loading",
        result.specific_current_loading,
        LessThan,
        limits.max_specific_current_loading,
    );
    c.push(
        "stator_current_density",
        result.stator_current_density,
        LessOrEqual,
        limits.max_current_density,
    );
    c.push(
        "rotor_current_density",
        result.rotor_current_density,
        LessOrEqual,
        limits.max_current_density,
    );
    c.push_band("aspect_ratio", result.aspect_ratio, limits.aspect_ratio);
    c.push_band(
        "diameter_ratio",
        result.diameter_ratio,
        diameter_ratio_band(result.pole_pairs),
    );
    c.push_band(
        "stator_slot_aspect_ratio",
        result.stator_slot_aspect_ratio,
        limits.slot_aspect_ratio,
    );
    c.push_band(
        "rotor_slot_aspect_ratio",
        result.rotor_slot_aspect_ratio,
        limits.slot_aspect_ratio,
    );
    if let Some(ratio) = result.current_ratio {
        c.push_band("current_ratio", ratio, limits.current_ratio);
    }
    c
}
