//! Result table for an external presentation layer. All values are SI.
use crate::constraints::{diameter_ratio_band, Band, ConstraintLimits};
use crate::design::DesignVector;
use crate::machine::EvaluationResult;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub parameter: &'static str,
    pub value: f64,
    pub limit: Option<String>,
    pub unit: &'static str,
}

fn row(parameter: &'static str, value: f64, unit: &'static str) -> ReportRow {
    ReportRow {
        parameter,
        value,
        limit: None,
        unit,
    }
}

fn limited(parameter: &'static str, value: f64, limit: String, unit: &'static str) -> ReportRow {
    ReportRow {
        parameter,
        value,
        limit: Some(limit),
        unit,
    }
}

fn band(b: Band) -> String {
    format!("{}-{}", b.lower, b.upper)
}

/// Ordered report rows for an evaluated design.
pub fn rows(
    design: &DesignVector,
    result: &EvaluationResult,
    cost: f64,
    limits: &ConstraintLimits,
) -> Vec<ReportRow> {
    let b_max = format!("<{}", limits.max_flux_density);
    let j_max = format!("<={}", limits.max_current_density);
    let mut rows = vec![
        row("Rating", design.rated().machine_rating, "W"),
        row("Air gap diameter", 2.0 * result.airgap_radius, "m"),
        row("Stator length", result.core_length, "m"),
        limited(
            "Lambda ratio",
            result.aspect_ratio,
            band(limits.aspect_ratio),
            "-",
        ),
        limited(
            "Diameter ratio",
            result.diameter_ratio,
            band(diameter_ratio_band(result.pole_pairs)),
            "-",
        ),
        row("Pole pitch", result.pole_pitch, "m"),
        row("Number of stator slots", result.stator_slots, "-"),
        row("Stator slot height", result.stator_slot_height, "m"),
        row("Stator slot width", result.stator_slot_width, "m"),
        limited(
            "Stator slot aspect ratio",
            result.stator_slot_aspect_ratio,
            band(limits.slot_aspect_ratio),
            "-",
        ),
        row("Stator tooth width", result.stator_tooth_width, "m"),
        row("Stator yoke height", result.stator_yoke_height, "m"),
        row("Rotor slots", result.rotor_slots, "-"),
        row("Rotor slot height", result.rotor_slot_height, "m"),
        row("Rotor slot width", result.rotor_slot_width, "m"),
        row("Rotor tooth width", result.rotor_tooth_width, "m"),
        row("Rotor yoke height", result.rotor_yoke_height, "m"),
        limited(
            "Rotor slot aspect ratio",
            result.rotor_slot_aspect_ratio,
            band(limits.slot_aspect_ratio),
            "-",
        ),
        limited(
            "Peak air gap flux density",
            result.airgap_flux_density,
            band(limits.airgap_flux_density),
            "T",
        ),
        row(
            "Peak air gap flux density fundamental",
            result.airgap_flux_density_fundamental,
            "T",
        ),
        limited(
            "Peak stator yoke flux density",
            result.stator_yoke_flux_density,
            b_max.clone(),
            "T",
        ),
        limited(
            "Peak rotor yoke flux density",
            result.rotor_yoke_flux_density,
            b_max.clone(),
            "T",
        ),
        limited(
            "Peak stator tooth flux density",
            result.stator_tooth_flux_density,
            b_max.clone(),
            "T",
        ),
        limited(
            "Peak rotor tooth flux density",
            result.rotor_tooth_flux_density,
            b_max,
            "T",
        ),
        row("Pole pairs", result.pole_pairs as f64, "-"),
        row("Generator output frequency", result.frequency, "Hz"),
        limited(
            "Generator output phase voltage",
            result.phase_voltage,
            band(limits.phase_voltage),
            "V",
        ),
        row("Generator output phase current", result.stator_current, "A"),
        row("Slip", result.slip, "-"),
        row("Stator turns", result.stator_turns, "-"),
        row("Stator conductor cross-section", result.stator_conductor_area, "m^2"),
        limited(
            "Stator current density",
            result.stator_current_density,
            j_max.clone(),
            "A/m^2",
        ),
        limited(
            "Specific current loading",
            result.specific_current_loading,
            format!("<{}", limits.max_specific_current_loading),
            "A/m",
        ),
        row("Stator resistance", result.stator_resistance, "Ohm"),
        row("Stator leakage inductance", result.stator_leakage_inductance, "H"),
        row("Excited magnetic inductance", result.magnetizing_inductance, "H"),
        row("Magnetization current", result.magnetizing_current, "A"),
    ];
    if let Some(turns) = result.rotor_turns {
        rows.push(row("Rotor turns", turns, "-"));
    }
    rows.extend([
        row("Rotor conductor cross-section", result.rotor_conductor_area, "m^2"),
        row("Rotor current", result.rotor_current, "A"),
        limited(
            "Rotor current density",
            result.rotor_current_density,
            j_max,
            "A/m^2",
        ),
        row("Rotor resistance", result.rotor_resistance, "Ohm"),
        row("Rotor leakage inductance", result.rotor_leakage_inductance, "H"),
    ]);
    if let Some(ratio) = result.current_ratio {
        rows.push(limited(
            "Current ratio",
            ratio,
            band(limits.current_ratio),
            "-",
        ));
    }
    rows.extend([
        row("Generator efficiency", result.efficiency, "%"),
        limited(
            "Overall drivetrain efficiency",
            result.overall_efficiency,
            format!(">={}", limits.efficiency_target),
            "%",
        ),
        row("Copper mass", result.masses.copper, "kg"),
        row("Iron mass", result.masses.iron, "kg"),
        row("Active mass", result.masses.active, "kg"),
        row("Structural mass", result.masses.structural, "kg"),
        row("Total mass", result.masses.total, "kg"),
        row("Total losses", result.losses.total, "W"),
        row("Total material cost", cost, "-"),
    ]);
    rows
}
