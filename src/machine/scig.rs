//! Squirrel-cage induction generator.
use super::{
    airgap_length, carter_coefficient, check_inputs, cylinder_inertia,
    fundamental_airgap_flux_density, iron_losses, mass_breakdown, shear_stress_torque_constraint,
    yoke_height, EvaluationResult, FluxDensities, IronMasses, LossBreakdown, PoleLayout,
    SlotGeometry, StatorWinding, WindingFactor,
};
use crate::constants::PhysicalConstants;
use crate::design::{MachineType, ScigDesign};
use crate::error::{positive, GeneratorResult};
use crate::materials::MaterialProperties;
use std::f64::consts::PI;

const STATOR_SLOTS_PER_POLE_PER_PHASE: f64 = 6.0;
const ROTOR_SLOTS_PER_POLE_PER_PHASE: f64 = 4.0;
const RATED_SLIP: f64 = -0.002;
const GRID_FREQUENCY: f64 = 60.0;
/// Ratio of slot width to equivalent slot opening, stator and rotor.
const SLOT_OPENING_RATIO: f64 = 5.0;
const BAR_CURRENT_DENSITY: f64 = 6e6;
const END_RING_CURRENT_DENSITY: f64 = 0.8 * BAR_CURRENT_DENSITY;
const END_RING_CLEARANCE: f64 = 0.003;
/// Structural mass regression on the active mass.
const STRUCTURAL_MASS: [f64; 3] = [0.0001, 0.8841, -132.5];

pub(crate) fn evaluate(
    design: &ScigDesign,
    materials: &MaterialProperties,
    constants: &PhysicalConstants,
) -> GeneratorResult<EvaluationResult> {
    let ScigDesign {
        airgap_radius: r_s,
        core_length: l_s,
        stator_slot_height: h_s,
        rotor_slot_height: h_r,
        magnetizing_current: i_0,
        stator_yoke_flux_density: b_symax,
        rated,
    } = *design;
    check_inputs(r_s, l_s, h_s, h_r, b_symax, &rated)?;
    positive("magnetizing current", i_0)?;

    let m = constants.phases_f64();
    let mu_0 = constants.vacuum_permeability;
    let rho_cu = constants.copper_resistivity;
    let h_w = constants.wedge_height;
    let y_tau_p = constants.coil_span_ratio;
    let power = rated.machine_rating;
    let s_n = RATED_SLIP;
    let (q1, q2) = (
        STATOR_SLOTS_PER_POLE_PER_PHASE,
        ROTOR_SLOTS_PER_POLE_PER_PHASE,
    );

    // layout and slots
    let dia = 2.0 * r_s;
    let g = airgap_length(power);
    let layout = PoleLayout::new(dia, g, q1, q2, constants)?;
    let p = layout.p();
    let (tau_p, tau_s, tau_r, q_r) = (
        layout.pole_pitch,
        layout.stator_slot_pitch,
        layout.rotor_slot_pitch,
        layout.rotor_slots,
    );
    let winding = WindingFactor::new(y_tau_p, q1);
    let k_wd = winding.total();
    let slots = SlotGeometry::new(&layout, dia, g, h_r, constants)?;
    let (b_s, b_r) = (slots.stator_slot_width, slots.rotor_slot_width);
    positive("stator conductor height", h_s - h_w)?;
    positive("rotor bar height", h_r - h_w)?;

    // airgap
    let k_c = carter_coefficient(tau_s, b_s / SLOT_OPENING_RATIO, g)?
        * carter_coefficient(tau_r, b_r / SLOT_OPENING_RATIO, g)?;
    let g_eff = k_c * g;
    let om_m = 2.0 * PI * rated.rated_speed / 60.0;
    let om_e = p * om_m;

    // magnetic loading
    let n_s = (2.0 * p * q1 * constants.conductors_per_coil / constants.parallel_paths).round();
    let b_g1 = fundamental_airgap_flux_density(n_s, i_0, &winding, p, g_eff, constants);
    let b_g = b_g1 * k_c;
    let h_ys = yoke_height(b_g, tau_p, b_symax);
    let h_yr = h_ys;
    let d_se = dia + 2.0 * (h_ys + h_s + h_w);
    let b_tsmax = tau_s * b_g / slots.stator_tooth_width;
    let b_trmax = b_g * tau_r / slots.min_rotor_tooth_width;

    let end_winding_cos = constants.end_winding_angle.to_radians().cos();
    let stator = StatorWinding::new(n_s, &layout, dia, l_s, h_s, b_s, end_winding_cos, constants)?;
    let r_s_phase = stator.resistance;

    // rated operating point
    let p_e = power / (1.0 - s_n);
    let e_p = positive(
        "phase voltage",
        om_m * n_s * k_wd * r_s * l_s * b_g1 * 2f64.sqrt(),
    )?;
    let rated_torque = p * (power - s_n * power) / (2.0 * PI * GRID_FREQUENCY * (1.0 - s_n));
    let i_srated = power / m / e_p / constants.power_factor;

    // rotor cage
    let a_bar = b_r * (h_r - h_w);
    let k_rm = (PI * mu_0 * GRID_FREQUENCY / 2.0 / rho_cu).sqrt() * h_r;
    let i_bar = 2.0 * m * n_s * k_wd * i_srated / q_r;
    let r_bar = rho_cu * k_rm * l_s / a_bar;
    let ring_sin = (PI * p / q_r).sin();
    let i_ring = i_bar / (2.0 * ring_sin);
    let a_ring = i_ring / END_RING_CURRENT_DENSITY;
    let ring_height = h_r;
    let ring_width = a_ring / ring_height;
    let d_ring = positive("end ring diameter", dia - 2.0 * g - END_RING_CLEARANCE)?;
    let l_ring = PI * (d_ring - ring_height) / q_r;
    let r_ring = rho_cu * l_ring / (2.0 * a_ring * ring_sin.powi(2));
    let referral = 4.0 * m * (k_wd * n_s).powi(2) / q_r;
    let r_rotor = positive("rotor resistance", (r_bar + r_ring) * referral)?;

    // inductances
    let b_so = constants.slot_opening;
    let b_ro = constants.slot_opening;
    let c = 2.0 * mu_0 * l_s * n_s.powi(2) / p / q1;
    let tooth_tip = g * k_c / b_so;
    let stator_slot_leakage = c * ((h_s - h_w) / (3.0 * b_s) + h_w / b_so);
    let stator_end_leakage =
        c * 0.34 * q1 * (stator.end_winding_length - 0.64 * tau_p * y_tau_p) / l_s;
    let stator_tip_leakage = c * (5.0 * tooth_tip / (5.0 + 4.0 * tooth_tip));
    let l_s_sigma = stator_slot_leakage + stator_end_leakage + stator_tip_leakage;
    let l_sm = 6.0 * mu_0 * l_s * tau_p * (k_wd * n_s).powi(2)
        / (PI.powi(2) * p * g_eff * (1.0 + constants.saturation_factor));

    let lambda_ring = 2.3 * d_ring / (4.0 * q_r * l_s * ring_sin.powi(2))
        * (4.7 * dia / (ring_width + 2.0 * ring_height)).ln();
    let lambda_bar = h_r / 3.0 / b_r + h_w / b_ro;
    let ring_segment = PI * dia / q_r;
    let rotor_slot_leakage = mu_0 * l_s * ((h_r - h_w) / (3.0 * b_r) + h_w / b_ro);
    let rotor_end_leakage = mu_0 * (l_s * lambda_bar + 2.0 * lambda_ring * ring_segment);
    let rotor_tip_leakage = mu_0 * l_s * (0.9 * tau_r * 0.09 / g_eff);
    let l_r_sigma = (rotor_slot_leakage + rotor_tip_leakage + rotor_end_leakage) * referral;

    // currents
    let i_r = positive("rotor current", -s_n * p_e / m / r_rotor)?.sqrt();
    let i_sm = e_p / (2.0 * PI * GRID_FREQUENCY * l_sm);
    let i_s = (i_r.powi(2) + i_sm.powi(2)).sqrt();
    let a_1 = 2.0 * m * n_s * i_s / PI / (2.0 * r_s);

    // masses
    let stator_copper_volume = m * stator.conductor_length * stator.conductor_area;
    let rotor_copper_volume =
        q_r * l_s * a_bar + PI * (d_ring * a_ring - a_ring * ring_height);
    let copper = (stator_copper_volume + rotor_copper_volume) * materials.copper_density();
    let r_r = r_s - g;
    let iron = IronMasses::new(
        r_s,
        r_r,
        l_s,
        &layout,
        &slots,
        h_s,
        h_r,
        h_ys,
        h_yr,
        q2,
        constants,
        materials.iron_density(),
    )?;
    let masses = mass_breakdown(copper, &iron, STRUCTURAL_MASS);

    // losses
    let flux = FluxDensities {
        stator_yoke: b_symax,
        stator_teeth: b_tsmax,
        rotor_yoke: b_symax,
        rotor_teeth: b_trmax,
    };
    let (hysteresis, eddy_current) =
        iron_losses(&iron, &flux, om_e, GRID_FREQUENCY, s_n, constants);
    let stator_copper = m * i_s.powi(2) * r_s_phase * constants.skin_effect_factor;
    let rotor_copper = m * i_r.powi(2) * r_rotor;
    let additional = constants.additional_loss_fraction * power;
    let total = stator_copper + rotor_copper + hysteresis + eddy_current + additional;
    let losses = LossBreakdown {
        stator_copper,
        rotor_copper,
        hysteresis,
        eddy_current,
        iron: hysteresis + eddy_current,
        brush: 0.0,
        additional,
        total,
    };
    let efficiency = (p_e - total) * 100.0 / p_e;

    Ok(EvaluationResult {
        machine_type: MachineType::Scig,
        rated,
        pole_pairs: layout.pole_pairs,
        slots_per_pole_per_phase: q1,
        rotor_slots_per_pole_per_phase: q2,
        stator_slots: layout.stator_slots,
        rotor_slots: q_r,
        pole_pitch: tau_p,
        stator_slot_pitch: tau_s,
        rotor_slot_pitch: tau_r,
        frequency: layout.frequency(rated.rated_speed),
        slip: s_n,
        airgap_radius: r_s,
        core_length: l_s,
        airgap_length: g,
        rotor_radius: r_r,
        stator_slot_height: h_s,
        stator_slot_width: b_s,
        stator_tooth_width: slots.stator_tooth_width,
        rotor_slot_height: h_r,
        rotor_slot_width: b_r,
        rotor_tooth_width: slots.rotor_tooth_width,
        min_rotor_tooth_width: slots.min_rotor_tooth_width,
        stator_yoke_height: h_ys,
        rotor_yoke_height: h_yr,
        stator_end_winding_length: stator.end_winding_length,
        outer_diameter: d_se,
        carter_coefficient: k_c,
        effective_airgap: g_eff,
        airgap_flux_density: b_g,
        airgap_flux_density_fundamental: b_g1,
        stator_yoke_flux_density: b_symax,
        rotor_yoke_flux_density: b_symax,
        stator_tooth_flux_density: b_tsmax,
        rotor_tooth_flux_density: b_trmax,
        winding_factor: k_wd,
        rotor_winding_factor: None,
        stator_turns: n_s,
        rotor_turns: None,
        stator_resistance: r_s_phase,
        rotor_resistance: r_rotor,
        stator_leakage_inductance: l_s_sigma,
        rotor_leakage_inductance: l_r_sigma,
        magnetizing_inductance: l_sm,
        phase_voltage: e_p,
        stator_current: i_s,
        rotor_current: i_r,
        magnetizing_current: i_sm,
        current_ratio: None,
        stator_conductor_area: stator.conductor_area,
        rotor_conductor_area: a_bar,
        stator_current_density: i_s / stator.conductor_area,
        rotor_current_density: i_r / a_bar,
        specific_current_loading: a_1,
        masses,
        losses,
        electrical_power: p_e,
        efficiency,
        overall_efficiency: efficiency * rated.gearbox_efficiency,
        aspect_ratio: l_s / dia,
        diameter_ratio: d_se / dia,
        stator_slot_aspect_ratio: h_s / b_s,
        rotor_slot_aspect_ratio: h_r / b_r,
        rated_torque,
        torque_constraint: shear_stress_torque_constraint(rated_torque, r_s, l_s, constants),
        outer_radius: d_se / 2.0,
        inertia: cylinder_inertia(masses.total, d_se / 2.0, l_s),
    })
}
