use approx::assert_relative_eq;
use std::f64::consts::PI;
use windgen_sizing::*;

fn reference_design(slip: f64) -> DesignVector {
    DfigDesign::new(
        0.65,
        0.6,
        0.1,
        0.065,
        slip,
        1.3,
        32.0,
        RatedConditions::new(5e6, 1200.0, 0.955),
    )
    .into()
}

fn evaluate_default(design: &DesignVector) -> GeneratorResult<EvaluationResult> {
    evaluate(
        design,
        &MaterialProperties::default(),
        &PhysicalConstants::default(),
    )
}

#[test]
fn test_reference_values() -> anyhow::Result<()> {
    let r = evaluate_default(&reference_design(-0.3))?;
    let tol = 1e-6;
    assert_eq!(r.machine_type, MachineType::Dfig);
    assert_eq!(r.frequency, 60.0);
    assert_eq!(r.slip, -0.3);
    assert_eq!(r.stator_turns, 30.0);
    assert_eq!(r.rotor_turns, Some(98.0));

    assert_relative_eq!(r.airgap_flux_density, 0.5865801622293267, max_relative = tol);
    assert_relative_eq!(
        r.airgap_flux_density_fundamental,
        0.5139251639182322,
        max_relative = tol
    );
    assert_relative_eq!(r.stator_yoke_height, 0.09776336037155445, max_relative = tol);
    assert_relative_eq!(r.stator_tooth_flux_density, 1.0665093858715033, max_relative = tol);
    assert_relative_eq!(r.rotor_tooth_flux_density, 1.1854479541579281, max_relative = tol);

    assert_relative_eq!(r.phase_voltage, 1374.9831131671592, max_relative = tol);
    assert_relative_eq!(r.stator_current, 944.4131706120795, max_relative = tol);
    assert_relative_eq!(r.rotor_current, 932.4123836678863, max_relative = tol);
    assert_relative_eq!(r.magnetizing_current, 150.07792512002283, max_relative = tol);
    assert_relative_eq!(r.stator_resistance, 0.0002487823330174787, max_relative = tol);
    assert_relative_eq!(r.rotor_resistance, 0.003675297765125658, max_relative = tol);
    assert_relative_eq!(r.stator_leakage_inductance, 3.5638512198250345e-5, max_relative = tol);
    assert_relative_eq!(r.rotor_leakage_inductance, 0.0003164196320871883, max_relative = tol);
    assert_relative_eq!(r.magnetizing_inductance, 0.0242667762670379, max_relative = tol);
    assert_relative_eq!(r.specific_current_loading, 41623.76060972362, max_relative = tol);
    assert_relative_eq!(r.stator_current_density, 2.4341380473522585e6, max_relative = tol);
    assert_relative_eq!(r.rotor_current_density, 9.069970932462438e6, max_relative = tol);
    assert_relative_eq!(r.current_ratio.unwrap(), 0.08799891924269818, max_relative = tol);

    assert_relative_eq!(r.masses.copper, 496.9411926727633, max_relative = tol);
    assert_relative_eq!(r.masses.iron, 5438.872466253834, max_relative = tol);
    assert_relative_eq!(r.masses.structural, 11524.771638268818, max_relative = tol);
    assert_relative_eq!(r.masses.total, 17460.585297195415, max_relative = tol);
    assert_relative_eq!(r.losses.total, 54790.013671607245, max_relative = tol);
    assert_relative_eq!(r.losses.brush, 3.0 * r.rotor_current, max_relative = 1e-12);
    assert_relative_eq!(r.efficiency, 98.57545964453821, max_relative = tol);
    assert_relative_eq!(r.overall_efficiency, 94.13956396053399, max_relative = tol);

    assert_relative_eq!(
        r.torque_constraint.from_shear_stress,
        0.22702107783904843,
        max_relative = tol
    );
    assert_relative_eq!(r.torque_constraint.from_geometry, 0.2535, max_relative = tol);
    assert_relative_eq!(r.diameter_ratio, 1.3042513236485451, max_relative = tol);
    assert_relative_eq!(r.stator_slot_aspect_ratio, 4.897075172058319, max_relative = tol);
    assert_relative_eq!(r.rotor_slot_aspect_ratio, 2.554937785421917, max_relative = tol);
    Ok(())
}

#[test]
fn test_slip_must_be_negative() {
    for slip in [0.0, 0.1, f64::NAN] {
        assert!(matches!(
            evaluate_default(&reference_design(slip)),
            Err(GeneratorError::Domain {
                quantity: "slip",
                ..
            })
        ));
    }
}

#[test]
fn test_invariants() -> anyhow::Result<()> {
    let r = evaluate_default(&reference_design(-0.1))?;
    assert_eq!(r.frequency, 1200.0 * 3.0 / 60.0);
    assert_relative_eq!(r.masses.active, r.masses.copper + r.masses.iron, max_relative = 1e-9);
    assert_relative_eq!(
        r.masses.total,
        r.masses.active + r.masses.structural,
        max_relative = 1e-9
    );
    assert_eq!(r.overall_efficiency, r.efficiency * 0.955);
    Ok(())
}

#[test]
fn test_current_ratio_constraint() -> anyhow::Result<()> {
    let r = evaluate_default(&reference_design(-0.3))?;
    let constraints = check(&r, &ConstraintLimits::default());
    let ratio = &constraints["current_ratio_min"];
    assert!(!ratio.satisfied);
    assert_relative_eq!(ratio.residual, r.current_ratio.unwrap() - 0.1);
    assert!(constraints["current_ratio_max"].satisfied);
    assert!(!constraints["rotor_current_density"].satisfied);
    assert!(!constraints["aspect_ratio_min"].satisfied);
    assert!(!constraints.feasible());
    Ok(())
}

/// The two machine models disagree on the unit of the 40 degree end-winding
/// angle: the doubly-fed stator end connection evaluates `cos(40)` with the
/// value taken as radians, while its rotor end connection and the squirrel-cage
/// stator use degrees. Each model keeps its own net formula.
#[test]
fn test_end_winding_angle_conventions() -> anyhow::Result<()> {
    let dfig = evaluate_default(&reference_design(-0.3))?;
    let tau_p = dfig.pole_pitch;
    assert_relative_eq!(
        dfig.stator_end_winding_length,
        2.0 * (0.015 + 0.8 * tau_p / 2.0 / 40f64.cos()) + PI * 0.1,
        max_relative = 1e-12
    );
    // cos(40 rad) < 0 shortens the end connection below the slot height term
    assert!(dfig.stator_end_winding_length < PI * 0.1);

    let scig: DesignVector = ScigDesign::new(
        0.65,
        0.6,
        0.1,
        0.065,
        140.0,
        1.3,
        RatedConditions::new(5e6, 1200.0, 0.955),
    )
    .into();
    let scig = evaluate_default(&scig)?;
    assert_relative_eq!(
        scig.stator_end_winding_length,
        2.0 * (0.015 + 0.8 * scig.pole_pitch / 2.0 / 40f64.to_radians().cos()) + PI * 0.1,
        max_relative = 1e-12
    );
    Ok(())
}

/// The rated torque of the doubly-fed machine is taken from the machine rating
/// with a 1.002 overload factor.
#[test]
fn test_rated_torque_from_machine_rating() -> anyhow::Result<()> {
    let r = evaluate_default(&reference_design(-0.3))?;
    let torque = 5e6 * 1.002 * 3.0 / (2.0 * PI * 60.0 * 1.3);
    assert_relative_eq!(r.rated_torque, torque, max_relative = 1e-12);
    assert_relative_eq!(
        r.torque_constraint.from_shear_stress,
        torque / (2.0 * PI * 21.5e3),
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn test_short_core_is_rejected() {
    // the negative stator end connection outweighs a short core
    let design: DesignVector = DfigDesign::new(
        0.65,
        0.2,
        0.1,
        0.065,
        -0.3,
        1.3,
        32.0,
        RatedConditions::new(5e6, 1200.0, 0.955),
    )
    .into();
    let err = evaluate_default(&design).unwrap_err();
    assert!(err.is_infeasible_candidate());
}
