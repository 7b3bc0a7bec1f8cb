use crate::machine::EvaluationResult;
use serde::{Deserialize, Serialize};

/// Generator properties consumed by a drivetrain assembly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MechanicalSummary {
    #[serde(rename = "mass [kg]")]
    pub mass: f64,
    #[serde(rename = "center_of_mass [m]")]
    pub center_of_mass: [f64; 3],
    #[serde(rename = "inertia [kg m^2]")]
    pub inertia: [f64; 3],
}

/// Places the generator directly behind the upstream component on the shaft axis.
///
/// `upstream_cm` is the center of mass of the upstream component (usually the
/// high-speed shaft) and `upstream_length` its axial length. The generator is
/// centered half its core length behind the end of that component.
pub fn to_mechanical(
    result: &EvaluationResult,
    upstream_cm: [f64; 3],
    upstream_length: f64,
) -> MechanicalSummary {
    let [x, y, z] = upstream_cm;
    MechanicalSummary {
        mass: result.masses.total,
        center_of_mass: [
            x + upstream_length / 2.0 + result.core_length / 2.0,
            y,
            z,
        ],
        inertia: result.inertia,
    }
}
