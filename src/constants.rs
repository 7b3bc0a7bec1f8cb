use crate::error::{GeneratorError, GeneratorResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Physical and empirical constants shared by both machine types.
///
/// All values are in SI base units. The defaults reproduce the reference
/// design family; a run that overrides them must do so for every evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    #[serde(rename = "vacuum_permeability [H/m]")]
    pub vacuum_permeability: f64,
    pub phases: usize,
    pub pole_pairs: usize,
    #[serde(rename = "copper_resistivity [Ohm m]")]
    pub copper_resistivity: f64,
    /// Specific hysteresis loss at 1.5 T and the reference frequency.
    #[serde(rename = "specific_hysteresis_loss [W/kg]")]
    pub specific_hysteresis_loss: f64,
    /// Specific eddy-current loss at 1.5 T and the reference frequency.
    #[serde(rename = "specific_eddy_loss [W/kg]")]
    pub specific_eddy_loss: f64,
    #[serde(rename = "iron_loss_flux_density [T]")]
    pub iron_loss_flux_density: f64,
    pub skin_effect_factor: f64,
    pub saturation_factor: f64,
    pub power_factor: f64,
    #[serde(rename = "shear_stress [Pa]")]
    pub shear_stress: f64,
    #[serde(rename = "wedge_height [m]")]
    pub wedge_height: f64,
    #[serde(rename = "slot_opening [m]")]
    pub slot_opening: f64,
    pub slot_width_ratio: f64,
    pub coil_span_ratio: f64,
    pub conductors_per_coil: f64,
    pub parallel_paths: f64,
    #[serde(rename = "end_winding_angle [deg]")]
    pub end_winding_angle: f64,
    /// Stator slot fill factor for airgap diameters above 2 m.
    pub large_slot_fill: f64,
    pub small_slot_fill: f64,
    /// Additional losses as a fraction of rated power.
    pub additional_loss_fraction: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            vacuum_permeability: 4.0e-7 * PI,
            phases: 3,
            pole_pairs: 3,
            copper_resistivity: 1.8e-8 * 1.4,
            specific_hysteresis_loss: 4.0,
            specific_eddy_loss: 1.0,
            iron_loss_flux_density: 1.5,
            skin_effect_factor: 1.2,
            saturation_factor: 0.3,
            power_factor: 0.9,
            shear_stress: 21.5e3,
            wedge_height: 0.005,
            slot_opening: 0.004,
            slot_width_ratio: 0.45,
            coil_span_ratio: 12.0 / 15.0,
            conductors_per_coil: 2.0,
            parallel_paths: 2.0,
            end_winding_angle: 40.0,
            large_slot_fill: 0.65,
            small_slot_fill: 0.4,
            additional_loss_fraction: 0.005,
        }
    }
}

impl PhysicalConstants {
    /// Rejects counts of zero, non-positive coefficients, and ratios outside their range.
    pub fn validate(&self) -> GeneratorResult<()> {
        if self.phases == 0 || self.pole_pairs == 0 {
            return Err(GeneratorError::config(format!(
                "phases and pole pairs must be positive, got {} and {}",
                self.phases, self.pole_pairs
            )));
        }
        for (name, value) in [
            ("vacuum permeability", self.vacuum_permeability),
            ("copper resistivity", self.copper_resistivity),
            ("specific hysteresis loss", self.specific_hysteresis_loss),
            ("specific eddy loss", self.specific_eddy_loss),
            ("iron loss flux density", self.iron_loss_flux_density),
            ("skin effect factor", self.skin_effect_factor),
            ("shear stress", self.shear_stress),
            ("wedge height", self.wedge_height),
            ("slot opening", self.slot_opening),
            ("conductors per coil", self.conductors_per_coil),
            ("parallel paths", self.parallel_paths),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeneratorError::config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        // (name, value, upper bound, bound included)
        for (name, value, upper, closed) in [
            ("power factor", self.power_factor, 1.0, true),
            ("coil span ratio", self.coil_span_ratio, 1.0, true),
            ("large slot fill", self.large_slot_fill, 1.0, true),
            ("small slot fill", self.small_slot_fill, 1.0, true),
            ("slot width ratio", self.slot_width_ratio, 1.0, false),
            ("end winding angle [deg]", self.end_winding_angle, 90.0, false),
        ] {
            let below = if closed { value <= upper } else { value < upper };
            if !(value > 0.0 && below) {
                let bracket = if closed { ']' } else { ')' };
                return Err(GeneratorError::config(format!(
                    "{name} must be in (0, {upper}{bracket}, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("saturation factor", self.saturation_factor),
            ("additional loss fraction", self.additional_loss_fraction),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GeneratorError::config(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn phases_f64(&self) -> f64 {
        self.phases as f64
    }

    /// Stator slot fill factor for the given airgap diameter.
    pub fn stator_slot_fill(&self, airgap_diameter: f64) -> f64 {
        if airgap_diameter > 2.0 {
            self.large_slot_fill
        } else {
            self.small_slot_fill
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PhysicalConstants::default().validate().is_ok());
    }

    #[test]
    fn invalid_constants_are_rejected() {
        let invalid = [
            PhysicalConstants {
                pole_pairs: 0,
                ..Default::default()
            },
            PhysicalConstants {
                phases: 0,
                ..Default::default()
            },
            PhysicalConstants {
                copper_resistivity: -1.8e-8,
                ..Default::default()
            },
            PhysicalConstants {
                small_slot_fill: 1.2,
                ..Default::default()
            },
            PhysicalConstants {
                slot_width_ratio: 1.0,
                ..Default::default()
            },
            PhysicalConstants {
                additional_loss_fraction: f64::NAN,
                ..Default::default()
            },
        ];
        for constants in invalid {
            assert!(matches!(
                constants.validate(),
                Err(GeneratorError::Configuration(_))
            ));
        }
    }
}
