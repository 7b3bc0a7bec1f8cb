use crate::cost::CostCoefficients;
use crate::error::{GeneratorError, GeneratorResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct MaterialPropertiesJSON {
    #[serde(rename = "iron_density [kg/m^3]")]
    iron_density: f64,
    #[serde(rename = "copper_density [kg/m^3]")]
    copper_density: f64,
    #[serde(rename = "structural_steel_density [kg/m^3]")]
    structural_steel_density: f64,
    #[serde(rename = "specific_costs [1/kg]")]
    costs: CostCoefficients,
}

/// Densities and specific costs of the generator materials.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialPropertiesJSON")]
#[serde(into = "MaterialPropertiesJSON")]
pub struct MaterialProperties {
    iron_density: f64,
    copper_density: f64,
    /// Informational only. The structural mass follows an empirical regression
    /// on the active mass and does not depend on this density.
    structural_steel_density: f64,
    costs: CostCoefficients,
}

impl TryFrom<MaterialPropertiesJSON> for MaterialProperties {
    type Error = GeneratorError;

    fn try_from(json: MaterialPropertiesJSON) -> GeneratorResult<Self> {
        Self::new(
            json.iron_density,
            json.copper_density,
            json.structural_steel_density,
            json.costs,
        )
    }
}

impl From<MaterialProperties> for MaterialPropertiesJSON {
    fn from(materials: MaterialProperties) -> Self {
        Self {
            iron_density: materials.iron_density,
            copper_density: materials.copper_density,
            structural_steel_density: materials.structural_steel_density,
            costs: materials.costs,
        }
    }
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            iron_density: 7700.0,
            copper_density: 8900.0,
            structural_steel_density: 7850.0,
            costs: CostCoefficients::default(),
        }
    }
}

impl MaterialProperties {
    pub fn new(
        iron_density: f64,
        copper_density: f64,
        structural_steel_density: f64,
        costs: CostCoefficients,
    ) -> GeneratorResult<Self> {
        for (name, density) in [
            ("iron", iron_density),
            ("copper", copper_density),
            ("structural steel", structural_steel_density),
        ] {
            if !(density.is_finite() && density > 0.0) {
                return Err(GeneratorError::config(format!(
                    "{name} density must be positive, got {density}"
                )));
            }
        }
        Ok(Self {
            iron_density,
            copper_density,
            structural_steel_density,
            costs,
        })
    }

    pub fn from_json<P: AsRef<Path>>(file: P) -> GeneratorResult<Self> {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn iron_density(&self) -> f64 {
        self.iron_density
    }

    pub fn copper_density(&self) -> f64 {
        self.copper_density
    }

    /// Not used by the evaluator; see the structural mass regression.
    pub fn structural_steel_density(&self) -> f64 {
        self.structural_steel_density
    }

    pub fn costs(&self) -> &CostCoefficients {
        &self.costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_density() {
        let costs = CostCoefficients::default();
        assert!(MaterialProperties::new(0.0, 8900.0, 7850.0, costs).is_err());
        assert!(MaterialProperties::new(7700.0, -1.0, 7850.0, costs).is_err());
        assert!(MaterialProperties::new(7700.0, 8900.0, 7850.0, costs).is_ok());
    }

    #[test]
    fn json_roundtrip_validates() {
        let json = serde_json::to_string(&MaterialProperties::default()).unwrap();
        let materials: MaterialProperties = serde_json::from_str(&json).unwrap();
        assert_eq!(materials, MaterialProperties::default());

        let invalid = json.replace("7700.0", "-7700.0");
        assert!(serde_json::from_str::<MaterialProperties>(&invalid).is_err());
    }
}
