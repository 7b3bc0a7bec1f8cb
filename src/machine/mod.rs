//! Electromagnetic design evaluation of induction generators.
//!
//! Every machine type runs a fixed, dependency-ordered sequence of closed-form
//! stages. The stages that both topologies share are collected here; the
//! machine-specific pipelines live in [scig] and [dfig].
use crate::constants::PhysicalConstants;
use crate::design::{DesignVector, MachineType, RatedConditions};
use crate::error::{finite, positive, GeneratorResult};
use crate::materials::MaterialProperties;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub mod dfig;
pub mod scig;

/// Evaluates a candidate design.
///
/// The evaluation is a pure function of its arguments. A [Domain](crate::GeneratorError::Domain)
/// error marks the candidate as infeasible, invalid `constants` are a
/// [Configuration](crate::GeneratorError::Configuration) error.
pub fn evaluate(
    design: &DesignVector,
    materials: &MaterialProperties,
    constants: &PhysicalConstants,
) -> GeneratorResult<EvaluationResult> {
    constants.validate()?;
    let result = match design {
        DesignVector::Scig(d) => scig::evaluate(d, materials, constants)?,
        DesignVector::Dfig(d) => dfig::evaluate(d, materials, constants)?,
    };
    result.check_finite()?;
    Ok(result)
}

/// Masses of the generator (kg).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MassBreakdown {
    pub copper: f64,
    pub stator_teeth: f64,
    pub stator_yoke: f64,
    pub rotor_teeth: f64,
    pub rotor_yoke: f64,
    pub iron: f64,
    pub active: f64,
    pub structural: f64,
    pub total: f64,
}

/// Losses at the rated operating point (W).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub stator_copper: f64,
    pub rotor_copper: f64,
    pub hysteresis: f64,
    pub eddy_current: f64,
    pub iron: f64,
    /// Brush voltage drop of the slip rings; zero for a squirrel cage.
    pub brush: f64,
    pub additional: f64,
    pub total: f64,
}

/// Two independent estimates of the rated torque, expressed as r²·l.
///
/// The shear-stress sizing rule holds if `from_shear_stress < from_geometry`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TorqueConstraint {
    pub from_shear_stress: f64,
    pub from_geometry: f64,
}

/// All derived quantities of a single design evaluation in SI units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub machine_type: MachineType,
    pub rated: RatedConditions,

    // pole and slot layout
    pub pole_pairs: usize,
    pub slots_per_pole_per_phase: f64,
    pub rotor_slots_per_pole_per_phase: f64,
    pub stator_slots: f64,
    pub rotor_slots: f64,
    pub pole_pitch: f64,
    pub stator_slot_pitch: f64,
    pub rotor_slot_pitch: f64,
    pub frequency: f64,
    pub slip: f64,

    // geometry
    pub airgap_radius: f64,
    pub core_length: f64,
    pub airgap_length: f64,
    pub rotor_radius: f64,
    pub stator_slot_height: f64,
    pub stator_slot_width: f64,
    pub stator_tooth_width: f64,
    pub rotor_slot_height: f64,
    pub rotor_slot_width: f64,
    pub rotor_tooth_width: f64,
    pub min_rotor_tooth_width: f64,
    pub stator_yoke_height: f64,
    pub rotor_yoke_height: f64,
    /// Length of one stator end connection.
    pub stator_end_winding_length: f64,
    pub outer_diameter: f64,
    pub carter_coefficient: f64,
    pub effective_airgap: f64,

    // magnetic loading
    pub airgap_flux_density: f64,
    pub airgap_flux_density_fundamental: f64,
    pub stator_yoke_flux_density: f64,
    pub rotor_yoke_flux_density: f64,
    pub stator_tooth_flux_density: f64,
    pub rotor_tooth_flux_density: f64,

    // windings and equivalent circuit
    pub winding_factor: f64,
    pub rotor_winding_factor: Option<f64>,
    pub stator_turns: f64,
    pub rotor_turns: Option<f64>,
    pub stator_resistance: f64,
    pub rotor_resistance: f64,
    pub stator_leakage_inductance: f64,
    pub rotor_leakage_inductance: f64,
    pub magnetizing_inductance: f64,

    // rated electrical quantities
    pub phase_voltage: f64,
    pub stator_current: f64,
    pub rotor_current: f64,
    pub magnetizing_current: f64,
    /// Excitation to rated stator current ratio of a doubly-fed machine.
    pub current_ratio: Option<f64>,
    pub stator_conductor_area: f64,
    pub rotor_conductor_area: f64,
    pub stator_current_density: f64,
    pub rotor_current_density: f64,
    pub specific_current_loading: f64,

    pub masses: MassBreakdown,
    pub losses: LossBreakdown,
    pub electrical_power: f64,
    /// Generator efficiency in percent.
    pub efficiency: f64,
    /// Drivetrain efficiency (generator times gearbox) in percent.
    pub overall_efficiency: f64,

    // geometric ratios
    pub aspect_ratio: f64,
    pub diameter_ratio: f64,
    pub stator_slot_aspect_ratio: f64,
    pub rotor_slot_aspect_ratio: f64,

    pub rated_torque: f64,
    pub torque_constraint: TorqueConstraint,

    // mechanical summary
    pub outer_radius: f64,
    /// Moments of inertia `[Ixx, Iyy, Izz]` about the generator's center of mass.
    pub inertia: [f64; 3],
}

impl EvaluationResult {
    fn check_finite(&self) -> GeneratorResult<()> {
        finite("efficiency", self.efficiency)?;
        finite("phase voltage", self.phase_voltage)?;
        finite("stator current", self.stator_current)?;
        finite("rotor current", self.rotor_current)?;
        finite("total mass", self.masses.total)?;
        finite("total losses", self.losses.total)?;
        finite("rotor tooth flux density", self.rotor_tooth_flux_density)?;
        finite("specific current loading", self.specific_current_loading)?;
        finite("stator current density", self.stator_current_density)?;
        finite("rotor current density", self.rotor_current_density)?;
        finite("stator leakage inductance", self.stator_leakage_inductance)?;
        finite("rotor leakage inductance", self.rotor_leakage_inductance)?;
        finite("magnetizing inductance", self.magnetizing_inductance)?;
        for inertia in self.inertia {
            finite("moment of inertia", inertia)?;
        }
        Ok(())
    }
}

/// Checks the design inputs shared by both machine types.
pub(crate) fn check_inputs(
    airgap_radius: f64,
    core_length: f64,
    stator_slot_height: f64,
    rotor_slot_height: f64,
    stator_yoke_flux_density: f64,
    rated: &RatedConditions,
) -> GeneratorResult<()> {
    positive("airgap radius", airgap_radius)?;
    positive("core length", core_length)?;
    positive("stator slot height", stator_slot_height)?;
    positive("rotor slot height", rotor_slot_height)?;
    positive("stator yoke flux density", stator_yoke_flux_density)?;
    positive("machine rating", rated.machine_rating)?;
    positive("rated speed", rated.rated_speed)?;
    positive("gearbox efficiency", rated.gearbox_efficiency)?;
    Ok(())
}

/// Pole pitch, slot counts, and slot pitches.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PoleLayout {
    pub pole_pairs: usize,
    pub q1: f64,
    pub pole_pitch: f64,
    pub stator_slots: f64,
    pub rotor_slots: f64,
    pub stator_slot_pitch: f64,
    pub rotor_slot_pitch: f64,
}

impl PoleLayout {
    pub fn new(
        airgap_diameter: f64,
        airgap_length: f64,
        q1: f64,
        q2: f64,
        constants: &PhysicalConstants,
    ) -> GeneratorResult<Self> {
        let m = constants.phases_f64();
        let pole_pairs = constants.pole_pairs;
        let p = pole_pairs as f64;
        let pole_pitch = PI * airgap_diameter / (2.0 * p);
        let stator_slots = 2.0 * m * p * q1;
        let rotor_slots = 2.0 * p * m * q2;
        let stator_slot_pitch = pole_pitch / m / q1;
        let rotor_slot_pitch = PI * (airgap_diameter - 2.0 * airgap_length) / rotor_slots;
        positive("rotor slot pitch", rotor_slot_pitch)?;
        Ok(Self {
            pole_pairs,
            q1,
            pole_pitch,
            stator_slots,
            rotor_slots,
            stator_slot_pitch,
            rotor_slot_pitch,
        })
    }

    pub fn p(&self) -> f64 {
        self.pole_pairs as f64
    }

    /// Synchronous electrical frequency at the rated speed.
    pub fn frequency(&self, rated_speed: f64) -> f64 {
        rated_speed * self.pole_pairs as f64 / 60.0
    }
}

/// Empirical airgap length as a function of the machine rating.
pub(crate) fn airgap_length(machine_rating: f64) -> f64 {
    (0.1 + 0.012 * machine_rating.powf(1.0 / 3.0)) * 1e-3
}

/// Chording and distribution factors of a distributed winding.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WindingFactor {
    pub chording: f64,
    pub distribution: f64,
}

impl WindingFactor {
    pub fn new(coil_span_ratio: f64, slots_per_pole_per_phase: f64) -> Self {
        let q = slots_per_pole_per_phase;
        Self {
            chording: (PI * 0.5 * coil_span_ratio).sin(),
            distribution: (PI / 6.0).sin() / q / (PI / 6.0 / q).sin(),
        }
    }

    pub fn total(&self) -> f64 {
        self.chording * self.distribution
    }
}

/// Slot and tooth widths of stator and rotor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotGeometry {
    pub stator_slot_width: f64,
    pub stator_tooth_width: f64,
    pub rotor_slot_width: f64,
    pub rotor_tooth_width: f64,
    pub min_rotor_tooth_width: f64,
}

impl SlotGeometry {
    pub fn new(
        layout: &PoleLayout,
        airgap_diameter: f64,
        airgap_length: f64,
        rotor_slot_height: f64,
        constants: &PhysicalConstants,
    ) -> GeneratorResult<Self> {
        let ratio = constants.slot_width_ratio;
        let stator_slot_width = ratio * layout.stator_slot_pitch;
        let rotor_slot_width = ratio * layout.rotor_slot_pitch;

        // rotor teeth are narrowest at the slot bottom
        let min_rotor_slot_pitch =
            PI * (airgap_diameter - 2.0 * (airgap_length + rotor_slot_height)) / layout.rotor_slots;
        let min_rotor_tooth_width = min_rotor_slot_pitch - ratio * min_rotor_slot_pitch;

        Ok(Self {
            stator_slot_width: positive("stator slot width", stator_slot_width)?,
            stator_tooth_width: positive(
                "stator tooth width",
                layout.stator_slot_pitch - stator_slot_width,
            )?,
            rotor_slot_width: positive("rotor slot width", rotor_slot_width)?,
            rotor_tooth_width: positive(
                "rotor tooth width",
                layout.rotor_slot_pitch - rotor_slot_width,
            )?,
            min_rotor_tooth_width: positive("minimum rotor tooth width", min_rotor_tooth_width)?,
        })
    }
}

/// Carter's coefficient of a slotted surface with equivalent slot opening `opening`.
pub(crate) fn carter_coefficient(
    slot_pitch: f64,
    opening: f64,
    airgap_length: f64,
) -> GeneratorResult<f64> {
    let ratio = 2.0 * opening / airgap_length;
    let gamma = ratio.powi(2) / (5.0 + ratio);
    let denominator = positive(
        "Carter coefficient denominator",
        slot_pitch - airgap_length * gamma * 0.5,
    )?;
    Ok(slot_pitch / denominator)
}

/// Peak airgap flux density of the fundamental produced by `turns` carrying `current`.
pub(crate) fn fundamental_airgap_flux_density(
    turns: f64,
    current: f64,
    winding: &WindingFactor,
    pole_pairs: f64,
    effective_airgap: f64,
    constants: &PhysicalConstants,
) -> f64 {
    constants.vacuum_permeability * 3.0 * turns * current * 2f64.sqrt()
        * winding.chording
        * winding.distribution
        / (PI * pole_pairs * effective_airgap * (1.0 + constants.saturation_factor))
}

/// Back-iron height carrying half the pole flux at the peak yoke flux density.
pub(crate) fn yoke_height(airgap_flux_density: f64, pole_pitch: f64, yoke_flux_density: f64) -> f64 {
    airgap_flux_density * pole_pitch / (yoke_flux_density * PI)
}

/// Length of one stator end connection for the cosine `end_winding_cos` of the
/// end-winding angle.
pub(crate) fn stator_end_winding_length(
    pole_pitch: f64,
    stator_slot_height: f64,
    end_winding_cos: f64,
    constants: &PhysicalConstants,
) -> f64 {
    2.0 * (0.015 + constants.coil_span_ratio * pole_pitch / 2.0 / end_winding_cos)
        + PI * stator_slot_height
}

/// Stator winding copper of either machine type.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StatorWinding {
    pub end_winding_length: f64,
    pub conductor_length: f64,
    pub conductor_area: f64,
    pub resistance: f64,
}

impl StatorWinding {
    pub fn new(
        turns: f64,
        layout: &PoleLayout,
        airgap_diameter: f64,
        core_length: f64,
        stator_slot_height: f64,
        stator_slot_width: f64,
        end_winding_cos: f64,
        constants: &PhysicalConstants,
    ) -> GeneratorResult<Self> {
        let end_winding_length = stator_end_winding_length(
            layout.pole_pitch,
            stator_slot_height,
            end_winding_cos,
            constants,
        );
        let conductor_length =
            2.0 * turns * (end_winding_length + core_length) / constants.parallel_paths;
        let slot_area = stator_slot_width * (stator_slot_height - constants.wedge_height);
        let fill = constants.stator_slot_fill(airgap_diameter);
        let conductor_area = positive(
            "stator conductor area",
            slot_area * layout.q1 * layout.p() * fill / turns,
        )?;
        let resistance = positive(
            "stator resistance",
            conductor_length * constants.copper_resistivity / conductor_area,
        )?;
        Ok(Self {
            end_winding_length,
            conductor_length,
            conductor_area,
            resistance,
        })
    }
}

/// Iron masses of the four lamination regions.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IronMasses {
    pub stator_teeth: f64,
    pub stator_yoke: f64,
    pub rotor_teeth: f64,
    pub rotor_yoke: f64,
}

impl IronMasses {
    /// `rotor_slot_factor` is the number of slots removed from the rotor tooth ring
    /// per pole pair and phase.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        airgap_radius: f64,
        rotor_radius: f64,
        core_length: f64,
        layout: &PoleLayout,
        slots: &SlotGeometry,
        stator_slot_height: f64,
        rotor_slot_height: f64,
        stator_yoke_height: f64,
        rotor_yoke_height: f64,
        rotor_slot_factor: f64,
        constants: &PhysicalConstants,
        iron_density: f64,
    ) -> GeneratorResult<Self> {
        let m = constants.phases_f64();
        let p = layout.p();
        let (r_s, r_r, l) = (airgap_radius, rotor_radius, core_length);
        let (h_s, h_r) = (stator_slot_height, rotor_slot_height);

        positive(
            "rotor yoke inner radius",
            r_r - rotor_slot_height - rotor_yoke_height,
        )?;

        let stator_teeth = l * PI * ((r_s + h_s).powi(2) - r_s.powi(2))
            - 2.0 * m * layout.q1 * p * slots.stator_slot_width * h_s * l;
        let stator_yoke =
            l * PI * ((r_s + h_s + stator_yoke_height).powi(2) - (r_s + h_s).powi(2));
        let rotor_teeth = PI * l * (r_r.powi(2) - (r_r - h_r).powi(2))
            - 2.0 * m * rotor_slot_factor * p * slots.rotor_slot_width * h_r * l;
        let rotor_yoke = l * PI * ((r_r - h_r).powi(2) - (r_r - h_r - rotor_yoke_height).powi(2));

        Ok(Self {
            stator_teeth: positive("stator teeth volume", stator_teeth)? * iron_density,
            stator_yoke: stator_yoke * iron_density,
            rotor_teeth: positive("rotor teeth volume", rotor_teeth)? * iron_density,
            rotor_yoke: rotor_yoke * iron_density,
        })
    }

    pub fn total(&self) -> f64 {
        self.stator_teeth + self.stator_yoke + self.rotor_teeth + self.rotor_yoke
    }
}

/// Peak flux densities of the lamination regions.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FluxDensities {
    pub stator_yoke: f64,
    pub stator_teeth: f64,
    pub rotor_yoke: f64,
    pub rotor_teeth: f64,
}

/// Hysteresis and eddy-current losses of all lamination regions.
///
/// Returns `(hysteresis, eddy)`. Each term scales with the square of the peak
/// flux density relative to the reference flux density and with the ratio of the
/// electrical frequency to `reference_frequency`. Rotor regions see the slip frequency.
pub(crate) fn iron_losses(
    iron: &IronMasses,
    flux: &FluxDensities,
    electrical_angular_frequency: f64,
    reference_frequency: f64,
    slip: f64,
    constants: &PhysicalConstants,
) -> (f64, f64) {
    let b_ref = constants.iron_loss_flux_density;
    let p_h = constants.specific_hysteresis_loss;
    let p_e = constants.specific_eddy_loss;
    let stator_ratio = electrical_angular_frequency / (2.0 * PI * reference_frequency);
    let rotor_ratio = slip.abs() * electrical_angular_frequency / (2.0 * PI * reference_frequency);

    let regions = [
        (iron.stator_yoke, flux.stator_yoke, stator_ratio),
        (iron.stator_teeth, flux.stator_teeth, stator_ratio),
        (iron.rotor_yoke, flux.rotor_yoke, rotor_ratio),
        (iron.rotor_teeth, flux.rotor_teeth, rotor_ratio),
    ];
    regions
        .into_iter()
        .fold((0.0, 0.0), |(hysteresis, eddy), (mass, b, ratio)| {
            let scale = mass * (b / b_ref).powi(2);
            (
                hysteresis + scale * (p_h * ratio),
                eddy + scale * (p_e * ratio.powi(2)),
            )
        })
}

/// Assembles the mass breakdown from active masses and a structural regression
/// `a·M² + b·M + c` on the active mass `M`.
pub(crate) fn mass_breakdown(copper: f64, iron: &IronMasses, structural: [f64; 3]) -> MassBreakdown {
    let iron_total = iron.total();
    let active = copper + iron_total;
    let [a, b, c] = structural;
    let structural = a * active.powi(2) + b * active + c;
    MassBreakdown {
        copper,
        stator_teeth: iron.stator_teeth,
        stator_yoke: iron.stator_yoke,
        rotor_teeth: iron.rotor_teeth,
        rotor_yoke: iron.rotor_yoke,
        iron: iron_total,
        active,
        structural,
        total: active + structural,
    }
}

/// Moments of inertia of a solid cylinder about its center of mass.
pub(crate) fn cylinder_inertia(mass: f64, radius: f64, length: f64) -> [f64; 3] {
    let axial = 0.5 * mass * radius.powi(2);
    let transverse = 0.25 * mass * radius.powi(2) + (1.0 / 12.0) * mass * length.powi(2);
    [axial, transverse, transverse]
}

/// Torque estimate from the target tangential shear stress, as r²·l.
pub(crate) fn shear_stress_torque_constraint(
    rated_torque: f64,
    airgap_radius: f64,
    core_length: f64,
    constants: &PhysicalConstants,
) -> TorqueConstraint {
    TorqueConstraint {
        from_shear_stress: rated_torque / (2.0 * PI * constants.shear_stress),
        from_geometry: airgap_radius.powi(2) * core_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn winding_factor_of_reference_winding() {
        let k = WindingFactor::new(12.0 / 15.0, 6.0);
        assert_relative_eq!(k.chording, (0.4 * PI).sin(), max_relative = 1e-15);
        assert!(k.distribution < 1.0 && k.distribution > 0.95);
        assert!(k.total() < k.chording);
    }

    #[test]
    fn carter_coefficient_exceeds_unity() {
        let k = carter_coefficient(0.02, 0.002, 0.002).unwrap();
        assert!(k > 1.0);
        assert!(carter_coefficient(0.001, 0.5, 0.002).is_err());
    }

    #[test]
    fn airgap_of_five_megawatt_machine() {
        assert_relative_eq!(airgap_length(5e6), 0.002151971136012036, max_relative = 1e-12);
    }

    #[test]
    fn pole_layout_slot_counts() {
        let layout = PoleLayout::new(0.4, 0.002, 6.0, 4.0, &PhysicalConstants::default()).unwrap();
        assert_eq!(layout.stator_slots, 108.0);
        assert_eq!(layout.rotor_slots, 72.0);
        assert_eq!(layout.frequency(1200.0), 60.0);
        assert_relative_eq!(layout.rotor_slot_pitch * 72.0, PI * 0.396, max_relative = 1e-14);
    }

    #[test]
    fn narrow_rotor_teeth_are_a_domain_error() {
        let constants = PhysicalConstants::default();
        let layout = PoleLayout::new(0.4, 0.002, 6.0, 4.0, &constants).unwrap();
        assert!(SlotGeometry::new(&layout, 0.4, 0.002, 0.3, &constants).is_err());
    }

    #[test]
    fn cylinder_inertia_is_symmetric() {
        let [ixx, iyy, izz] = cylinder_inertia(1000.0, 0.5, 1.2);
        assert_relative_eq!(ixx, 125.0);
        assert_relative_eq!(iyy, 62.5 + 120.0);
        assert_eq!(iyy, izz);
    }
}
