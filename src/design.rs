use crate::error::{GeneratorError, GeneratorResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two induction machine topologies that can be sized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineType {
    /// Squirrel-cage induction generator
    #[serde(rename = "SCIG")]
    Scig,
    /// Doubly-fed induction generator
    #[serde(rename = "DFIG")]
    Dfig,
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scig => write!(f, "SCIG"),
            Self::Dfig => write!(f, "DFIG"),
        }
    }
}

/// Operating point imposed by the drivetrain. Never optimized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatedConditions {
    #[serde(rename = "machine_rating [W]")]
    pub machine_rating: f64,
    #[serde(rename = "rated_speed [rpm]")]
    pub rated_speed: f64,
    pub gearbox_efficiency: f64,
}

impl RatedConditions {
    pub fn new(machine_rating: f64, rated_speed: f64, gearbox_efficiency: f64) -> Self {
        Self {
            machine_rating,
            rated_speed,
            gearbox_efficiency,
        }
    }
}

/// Design variables of a squirrel-cage induction generator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScigDesign {
    #[serde(rename = "airgap_radius [m]")]
    pub airgap_radius: f64,
    #[serde(rename = "core_length [m]")]
    pub core_length: f64,
    #[serde(rename = "stator_slot_height [m]")]
    pub stator_slot_height: f64,
    #[serde(rename = "rotor_slot_height [m]")]
    pub rotor_slot_height: f64,
    /// No-load (magnetizing) current
    #[serde(rename = "magnetizing_current [A]")]
    pub magnetizing_current: f64,
    #[serde(rename = "stator_yoke_flux_density [T]")]
    pub stator_yoke_flux_density: f64,
    #[serde(flatten)]
    pub rated: RatedConditions,
}

impl ScigDesign {
    pub fn new(
        airgap_radius: f64,
        core_length: f64,
        stator_slot_height: f64,
        rotor_slot_height: f64,
        magnetizing_current: f64,
        stator_yoke_flux_density: f64,
        rated: RatedConditions,
    ) -> Self {
        Self {
            airgap_radius,
            core_length,
            stator_slot_height,
            rotor_slot_height,
            magnetizing_current,
            stator_yoke_flux_density,
            rated,
        }
    }
}

/// Design variables of a doubly-fed induction generator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DfigDesign {
    #[serde(rename = "airgap_radius [m]")]
    pub airgap_radius: f64,
    #[serde(rename = "core_length [m]")]
    pub core_length: f64,
    #[serde(rename = "stator_slot_height [m]")]
    pub stator_slot_height: f64,
    #[serde(rename = "rotor_slot_height [m]")]
    pub rotor_slot_height: f64,
    /// Rated slip, negative in generator operation.
    pub slip: f64,
    #[serde(rename = "stator_yoke_flux_density [T]")]
    pub stator_yoke_flux_density: f64,
    /// Rotor excitation current
    #[serde(rename = "excitation_current [A]")]
    pub excitation_current: f64,
    #[serde(flatten)]
    pub rated: RatedConditions,
}

impl DfigDesign {
    pub fn new(
        airgap_radius: f64,
        core_length: f64,
        stator_slot_height: f64,
        rotor_slot_height: f64,
        slip: f64,
        stator_yoke_flux_density: f64,
        excitation_current: f64,
        rated: RatedConditions,
    ) -> Self {
        Self {
            airgap_radius,
            core_length,
            stator_slot_height,
            rotor_slot_height,
            slip,
            stator_yoke_flux_density,
            excitation_current,
            rated,
        }
    }
}

const SCIG_VARIABLES: [&str; 6] = [
    "airgap_radius",
    "core_length",
    "stator_slot_height",
    "rotor_slot_height",
    "magnetizing_current",
    "stator_yoke_flux_density",
];

const DFIG_VARIABLES: [&str; 7] = [
    "airgap_radius",
    "core_length",
    "stator_slot_height",
    "rotor_slot_height",
    "slip",
    "stator_yoke_flux_density",
    "excitation_current",
];

/// A candidate generator design. A new candidate is always a new value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "machine")]
pub enum DesignVector {
    #[serde(rename = "SCIG")]
    Scig(ScigDesign),
    #[serde(rename = "DFIG")]
    Dfig(DfigDesign),
}

impl DesignVector {
    pub fn machine_type(&self) -> MachineType {
        match self {
            Self::Scig(_) => MachineType::Scig,
            Self::Dfig(_) => MachineType::Dfig,
        }
    }

    pub fn rated(&self) -> &RatedConditions {
        match self {
            Self::Scig(d) => &d.rated,
            Self::Dfig(d) => &d.rated,
        }
    }

    pub fn airgap_radius(&self) -> f64 {
        match self {
            Self::Scig(d) => d.airgap_radius,
            Self::Dfig(d) => d.airgap_radius,
        }
    }

    pub fn core_length(&self) -> f64 {
        match self {
            Self::Scig(d) => d.core_length,
            Self::Dfig(d) => d.core_length,
        }
    }

    /// Names of the optimizable variables, in the order of [DesignVector::values].
    pub fn variable_names(&self) -> &'static [&'static str] {
        match self {
            Self::Scig(_) => &SCIG_VARIABLES,
            Self::Dfig(_) => &DFIG_VARIABLES,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Scig(d) => vec![
                d.airgap_radius,
                d.core_length,
                d.stator_slot_height,
                d.rotor_slot_height,
                d.magnetizing_current,
                d.stator_yoke_flux_density,
            ],
            Self::Dfig(d) => vec![
                d.airgap_radius,
                d.core_length,
                d.stator_slot_height,
                d.rotor_slot_height,
                d.slip,
                d.stator_yoke_flux_density,
                d.excitation_current,
            ],
        }
    }

    /// Returns a new design of the same machine type with all variables replaced.
    ///
    /// `values` must be ordered like [DesignVector::variable_names]. Rated
    /// conditions are carried over unchanged.
    pub fn with_values(&self, values: &[f64]) -> GeneratorResult<Self> {
        let expected = self.variable_names().len();
        if values.len() != expected {
            return Err(GeneratorError::config(format!(
                "{} design has {expected} variables, got {} values",
                self.machine_type(),
                values.len()
            )));
        }
        Ok(match self {
            Self::Scig(d) => Self::Scig(ScigDesign::new(
                values[0], values[1], values[2], values[3], values[4], values[5], d.rated,
            )),
            Self::Dfig(d) => Self::Dfig(DfigDesign::new(
                values[0], values[1], values[2], values[3], values[4], values[5], values[6],
                d.rated,
            )),
        })
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.variable_names()
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values()[i])
    }
}

impl From<ScigDesign> for DesignVector {
    fn from(design: ScigDesign) -> Self {
        Self::Scig(design)
    }
}

impl From<DfigDesign> for DesignVector {
    fn from(design: DfigDesign) -> Self {
        Self::Dfig(design)
    }
}
