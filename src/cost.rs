use crate::error::{GeneratorError, GeneratorResult};
use crate::machine::MassBreakdown;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct CostCoefficientsJSON {
    copper: f64,
    iron: f64,
    structural_steel: f64,
}

/// Specific material costs (currency per kg).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CostCoefficientsJSON")]
#[serde(into = "CostCoefficientsJSON")]
pub struct CostCoefficients {
    copper: f64,
    iron: f64,
    structural_steel: f64,
}

impl TryFrom<CostCoefficientsJSON> for CostCoefficients {
    type Error = GeneratorError;

    fn try_from(json: CostCoefficientsJSON) -> GeneratorResult<Self> {
        Self::new(json.copper, json.iron, json.structural_steel)
    }
}

impl From<CostCoefficients> for CostCoefficientsJSON {
    fn from(costs: CostCoefficients) -> Self {
        Self {
            copper: costs.copper,
            iron: costs.iron,
            structural_steel: costs.structural_steel,
        }
    }
}

impl Default for CostCoefficients {
    fn default() -> Self {
        Self {
            copper: 4.786,
            iron: 0.556,
            structural_steel: 0.50139,
        }
    }
}

impl CostCoefficients {
    pub fn new(copper: f64, iron: f64, structural_steel: f64) -> GeneratorResult<Self> {
        for (name, c) in [
            ("copper", copper),
            ("iron", iron),
            ("structural steel", structural_steel),
        ] {
            if !(c.is_finite() && c >= 0.0) {
                return Err(GeneratorError::config(format!(
                    "specific cost of {name} must be non-negative, got {c}"
                )));
            }
        }
        Ok(Self {
            copper,
            iron,
            structural_steel,
        })
    }

    pub fn copper(&self) -> f64 {
        self.copper
    }

    pub fn iron(&self) -> f64 {
        self.iron
    }

    pub fn structural_steel(&self) -> f64 {
        self.structural_steel
    }
}

/// Material cost of a generator. Manufacturing costs are excluded.
pub fn cost(
    copper_mass: f64,
    iron_mass: f64,
    structural_mass: f64,
    costs: &CostCoefficients,
) -> GeneratorResult<f64> {
    for (component, value) in [
        ("copper", copper_mass),
        ("iron", iron_mass),
        ("structural", structural_mass),
    ] {
        if value.is_nan() || value < 0.0 {
            return Err(GeneratorError::NegativeMass { component, value });
        }
    }
    let active = copper_mass * costs.copper + iron_mass * costs.iron;
    Ok(active + structural_mass * costs.structural_steel)
}

/// Material cost of an evaluated mass breakdown.
pub fn cost_of(masses: &MassBreakdown, costs: &CostCoefficients) -> GeneratorResult<f64> {
    cost(masses.copper, masses.iron, masses.structural, costs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weighted_sum() {
        let costs = CostCoefficients::new(2.0, 1.0, 0.5).unwrap();
        assert_relative_eq!(cost(10.0, 20.0, 40.0, &costs).unwrap(), 60.0);
    }

    #[test]
    fn negative_mass_is_rejected() {
        let costs = CostCoefficients::default();
        assert!(matches!(
            cost(1.0, 1.0, -1.0, &costs),
            Err(GeneratorError::NegativeMass {
                component: "structural",
                ..
            })
        ));
    }

    #[test]
    fn negative_coefficients_are_rejected() {
        assert!(CostCoefficients::new(-4.786, 0.556, 0.5).is_err());
        assert!(CostCoefficients::new(4.786, 0.556, f64::NAN).is_err());
    }
}
