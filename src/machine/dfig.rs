//! Doubly-fed induction generator with a wound, slip-ring fed rotor.
use super::{
    airgap_length, carter_coefficient, check_inputs, cylinder_inertia,
    fundamental_airgap_flux_density, iron_losses, mass_breakdown, shear_stress_torque_constraint,
    yoke_height, EvaluationResult, FluxDensities, IronMasses, LossBreakdown, PoleLayout,
    SlotGeometry, StatorWinding, WindingFactor,
};
use crate::constants::PhysicalConstants;
use crate::design::{DfigDesign, MachineType};
use crate::error::{positive, GeneratorError, GeneratorResult};
use crate::materials::MaterialProperties;
use std::f64::consts::PI;

const STATOR_SLOTS_PER_POLE_PER_PHASE: f64 = 5.0;
const ROTOR_SLOTS_PER_POLE_PER_PHASE: f64 = 4.0;
const ROTOR_COIL_SPAN_RATIO: f64 = 10.0 / 12.0;
const GRID_FREQUENCY: f64 = 60.0;
const IRON_LOSS_REFERENCE_FREQUENCY: f64 = 50.0;
const STATOR_SLOT_OPENING_RATIO: f64 = 3.0;
const ROTOR_SLOT_OPENING_RATIO: f64 = 5.0;
const STATOR_TOOTH_TIP_FACTOR: f64 = 0.0042;
const ROTOR_TOOTH_TIP_FACTOR: f64 = 0.0062;
const ROTOR_SLOT_FILL: f64 = 0.55;
/// Voltage drop across the brushes of one phase.
const BRUSH_VOLTAGE_DROP: f64 = 1.0;
const STRUCTURAL_MASS: [f64; 3] = [0.0002, 0.6457, 645.24];

pub(crate) fn evaluate(
    design: &DfigDesign,
    materials: &MaterialProperties,
    constants: &PhysicalConstants,
) -> GeneratorResult<EvaluationResult> {
    let DfigDesign {
        airgap_radius: r_s,
        core_length: l_s,
        stator_slot_height: h_s,
        rotor_slot_height: h_r,
        slip: s_n,
        stator_yoke_flux_density: b_symax,
        excitation_current: i_f,
        rated,
    } = *design;
    check_inputs(r_s, l_s, h_s, h_r, b_symax, &rated)?;
    positive("excitation current", i_f)?;
    if !(s_n.is_finite() && s_n < 0.0) {
        return Err(GeneratorError::Domain {
            quantity: "slip",
            value: s_n,
        });
    }

    let m = constants.phases_f64();
    let mu_0 = constants.vacuum_permeability;
    let rho_cu = constants.copper_resistivity;
    let h_w = constants.wedge_height;
    let y_tau_p = constants.coil_span_ratio;
    let y_tau_r = ROTOR_COIL_SPAN_RATIO;
    let n_c1 = constants.conductors_per_coil;
    let a1 = constants.parallel_paths;
    let power = rated.machine_rating;
    let (q1, q2) = (
        STATOR_SLOTS_PER_POLE_PER_PHASE,
        ROTOR_SLOTS_PER_POLE_PER_PHASE,
    );
    // stator to rotor turns ratio that keeps the rotor voltage at slip level
    let k_rs = 1.0 / -s_n;

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
    let stator_winding = WindingFactor::new(y_tau_p, q1);
    let rotor_winding = WindingFactor::new(y_tau_r, q2);
    let (k_wd1, k_wd2) = (stator_winding.total(), rotor_winding.total());
    let slots = SlotGeometry::new(&layout, dia, g, h_r, constants)?;
    let (b_s, b_r) = (slots.stator_slot_width, slots.rotor_slot_width);
    positive("stator conductor height", h_s - h_w)?;
    positive("rotor conductor height", h_r - h_w)?;

    // airgap
    let w_s = b_s / STATOR_SLOT_OPENING_RATIO;
    let w_r = b_r / ROTOR_SLOT_OPENING_RATIO;
    let k_c = carter_coefficient(tau_s, w_s, g)? * carter_coefficient(tau_r, w_r, g)?;
    let g_eff = k_c * g;
    let om_e = p * 2.0 * PI * rated.rated_speed / 60.0;

    // turns
    let w_1a = (2.0 * p * q1 * n_c1 / a1).round();
    let w_2 = positive("rotor turns", (w_1a * k_wd1 * k_rs / k_wd2).round())?;
    let n_c2 = w_2 / (q_r / m);

    // magnetic loading
    let b_g1 = fundamental_airgap_flux_density(w_2, i_f, &rotor_winding, p, g_eff, constants);
    let b_g = b_g1 * k_c;
    let h_ys = yoke_height(b_g, tau_p, b_symax);
    let h_yr = h_ys;
    let d_se = dia + 2.0 * (h_ys + h_s);
    let b_tsmax = b_g * tau_s / slots.stator_tooth_width;
    let b_trmax = b_g * tau_r / slots.min_rotor_tooth_width;

    // the stator end connection takes the angle value in radians, the rotor one in degrees
    let stator_end_cos = constants.end_winding_angle.cos();
    let stator = StatorWinding::new(w_1a, &layout, dia, l_s, h_s, b_s, stator_end_cos, constants)?;

    // inductances
    let b_so = constants.slot_opening;
    let b_ro = constants.slot_opening;
    let k_01 = 1.0 - 0.033 * (w_s.powi(2) / g / tau_s);
    let k_02 = 1.0 - 0.033 * (w_r.powi(2) / g / tau_r);
    let c = 2.0 * mu_0 * l_s * n_c1.powi(2) * layout.stator_slots / m / a1.powi(2);
    let l_s_sigma = c * ((h_s - h_w) / (3.0 * b_s) + h_w / b_so)
        + c * 0.34 * q1 * (stator.end_winding_length - 0.64 * tau_p * y_tau_p) / l_s
        + c * (0.9 * tau_s * q1 * k_wd1 * k_01 * STATOR_TOOTH_TIP_FACTOR / g_eff);
    let l_sm = 6.0 * mu_0 * l_s * tau_p * (k_wd1 * w_1a).powi(2)
        / (PI.powi(2) * p * g_eff * (1.0 + constants.saturation_factor));

    let angle = constants.end_winding_angle.to_radians();
    let l_fr = (0.015 + y_tau_r * tau_r / 2.0 / angle.cos()) + PI * h_r;
    let cr = mu_0 * l_s * (2.0 * n_c2).powi(2) * q_r / m;
    let l_r_sigma = (cr * ((h_r - h_w) / (3.0 * b_r) + h_w / b_ro)
        + cr * (0.9 * tau_s * q2 * k_wd2 * k_02 * ROTOR_TOOTH_TIP_FACTOR / g_eff)
        + cr * 0.34 * q2 * (l_fr - 0.64 * tau_r * y_tau_r) / l_s)
        / k_rs.powi(2);

    // rotor winding, referred to the stator
    let a_cur = positive(
        "rotor conductor area",
        ROTOR_SLOT_FILL * p * q2 * b_r * (h_r - h_w) / w_2,
    )?;
    let l_cur = 2.0 * w_2 * (l_fr + l_s);
    let r_rotor = positive("rotor resistance", rho_cu * l_cur / a_cur / k_rs.powi(2))?;

    // rated operating point
    let om_s = (120.0 * GRID_FREQUENCY / p) * 2.0 * PI / 60.0;
    let p_e = power / (1.0 - s_n);
    let e_p = positive(
        "phase voltage",
        om_s * w_1a * k_wd1 * r_s * l_s * b_g1,
    )?;
    let i_srated = power / m / e_p / k_rs;
    let i_sm = e_p / (2.0 * PI * GRID_FREQUENCY * (l_s_sigma + l_sm));
    let i_r = p_e / (m * e_p);
    let i_s = (i_r.powi(2) + i_sm.powi(2)).sqrt();
    let current_ratio = i_f / i_srated;
    let a_1 = 2.0 * m * w_1a * i_s / PI / (2.0 * r_s);
    // rated torque from the machine rating, with the 0.2 % generator margin
    let rated_torque = power * 1.002 * p / (2.0 * PI * GRID_FREQUENCY * (1.0 - s_n));

    // masses
    let stator_copper_volume = m * stator.conductor_length * stator.conductor_area;
    let rotor_copper_volume = m * l_cur * a_cur;
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
        q1,
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
    let (hysteresis, eddy_current) = iron_losses(
        &iron,
        &flux,
        om_e,
        IRON_LOSS_REFERENCE_FREQUENCY,
        s_n,
        constants,
    );
    let stator_copper = m * i_s.powi(2) * stator.resistance * constants.skin_effect_factor;
    let rotor_copper = m * i_r.powi(2) * r_rotor;
    let brush = m * BRUSH_VOLTAGE_DROP * i_r;
    let additional = constants.additional_loss_fraction * power;
    let total = stator_copper + rotor_copper + hysteresis + eddy_current + brush + additional;
    let losses = LossBreakdown {
        stator_copper,
        rotor_copper,
        hysteresis,
        eddy_current,
        iron: hysteresis + eddy_current,
        brush,
        additional,
        total,
    };
    let efficiency = (p_e - total) * 100.0 / p_e;

    Ok(EvaluationResult {
        machine_type: MachineType::Dfig,
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
        winding_factor: k_wd1,
        rotor_winding_factor: Some(k_wd2),
        stator_turns: w_1a,
        rotor_turns: Some(w_2),
        stator_resistance: stator.resistance,
        rotor_resistance: r_rotor,
        stator_leakage_inductance: l_s_sigma,
        rotor_leakage_inductance: l_r_sigma,
        magnetizing_inductance: l_sm,
        phase_voltage: e_p,
        stator_current: i_s,
        rotor_current: i_r,
        magnetizing_current: i_sm,
        current_ratio: Some(current_ratio),
        stator_conductor_area: stator.conductor_area,
        rotor_conductor_area: a_cur,
        stator_current_density: i_s / stator.conductor_area,
        rotor_current_density: i_r / a_cur,
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
