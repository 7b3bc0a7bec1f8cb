use proptest::prelude::*;
use windgen_sizing::*;

fn scig_design() -> impl Strategy<Value = DesignVector> {
    (
        0.2..1.0f64,
        0.4..2.0f64,
        0.04..0.1f64,
        0.04..0.1f64,
        5.0..200.0f64,
        1.0..2.0f64,
        500.0..2000.0f64,
    )
        .prop_map(|(r_s, l_s, h_s, h_r, i_0, b_y, speed)| {
            ScigDesign::new(
                r_s,
                l_s,
                h_s,
                h_r,
                i_0,
                b_y,
                RatedConditions::new(5e6, speed, 0.955),
            )
            .into()
        })
}

fn dfig_design() -> impl Strategy<Value = DesignVector> {
    (
        0.2..1.0f64,
        0.4..2.0f64,
        0.04..0.1f64,
        0.04..0.1f64,
        -0.3..-0.002f64,
        1.0..2.0f64,
        5.0..100.0f64,
        500.0..2000.0f64,
    )
        .prop_map(|(r_s, l_s, h_s, h_r, slip, b_y, i_f, speed)| {
            DfigDesign::new(
                r_s,
                l_s,
                h_s,
                h_r,
                slip,
                b_y,
                i_f,
                RatedConditions::new(5e6, speed, 0.955),
            )
            .into()
        })
}

fn check_result(design: &DesignVector) -> Result<(), TestCaseError> {
    let speed = design.rated().rated_speed;
    match evaluate(
        design,
        &MaterialProperties::default(),
        &PhysicalConstants::default(),
    ) {
        Ok(r) => {
            prop_assert_eq!(r.machine_type, design.machine_type());
            prop_assert_eq!(r.frequency, speed * 3.0 / 60.0);
            prop_assert!(r.efficiency.is_finite());
            prop_assert!(r.phase_voltage.is_finite());
            prop_assert!(r.stator_current.is_finite() && r.rotor_current.is_finite());
            prop_assert!(r.losses.total.is_finite());
            prop_assert!(r.inertia.iter().all(|i| i.is_finite()));

            let m = &r.masses;
            prop_assert!((m.active - (m.copper + m.iron)).abs() <= 1e-9 * m.active.abs());
            prop_assert!((m.total - (m.active + m.structural)).abs() <= 1e-9 * m.total.abs());
            prop_assert_eq!(r.overall_efficiency, r.efficiency * 0.955);
            if check(&r, &ConstraintLimits::default()).feasible() {
                prop_assert!(0.0 < r.efficiency && r.efficiency < 100.0);
            }
        }
        Err(e) => prop_assert!(e.is_infeasible_candidate(), "unexpected error: {}", e),
    }
    Ok(())
}

proptest! {
    #[test]
    fn scig_results_are_finite_or_rejected(design in scig_design()) {
        check_result(&design)?;
    }

    #[test]
    fn dfig_results_are_finite_or_rejected(design in dfig_design()) {
        check_result(&design)?;
    }

    #[test]
    fn evaluation_is_deterministic(design in scig_design()) {
        let materials = MaterialProperties::default();
        let constants = PhysicalConstants::default();
        let first = evaluate(&design, &materials, &constants);
        let second = evaluate(&design, &materials, &constants);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "evaluation is not deterministic"),
        }
    }

    #[test]
    fn positive_slip_is_rejected(slip in 0.0..0.5f64) {
        let design: DesignVector = DfigDesign::new(
            0.65,
            0.6,
            0.1,
            0.065,
            slip,
            1.3,
            32.0,
            RatedConditions::new(5e6, 1200.0, 0.955),
        )
        .into();
        let rejected = matches!(
            evaluate(&design, &MaterialProperties::default(), &PhysicalConstants::default()),
            Err(GeneratorError::Domain { quantity: "slip", .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn costs_scale_with_mass(design in scig_design(), factor in 1.0..10.0f64) {
        let costs = CostCoefficients::default();
        if let Ok(r) = evaluate(&design, &MaterialProperties::default(), &PhysicalConstants::default()) {
            let mut scaled = r.masses;
            scaled.copper *= factor;
            scaled.iron *= factor;
            scaled.structural *= factor;
            let base = cost_of(&r.masses, &costs);
            let more = cost_of(&scaled, &costs);
            if let (Ok(base), Ok(more)) = (base, more) {
                prop_assert!(more >= base);
            }
        }
    }
}
