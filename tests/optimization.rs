use approx::assert_relative_eq;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use windgen_sizing::solver::PenaltyGradientOptions;
use windgen_sizing::*;

fn scenario_a() -> DesignVector {
    ScigDesign::new(
        0.55,
        1.3,
        0.09,
        0.05,
        140.0,
        1.4,
        RatedConditions::new(5e6, 1200.0, 0.955),
    )
    .into()
}

fn assert_within_bounds(design: &DesignVector, bounds: &DesignBounds) {
    for (name, variable) in bounds.iter() {
        let value = design.value(name).unwrap();
        assert!(
            variable.lobnd() <= value && value <= variable.upbnd(),
            "{name} = {value} outside [{}, {}]",
            variable.lobnd(),
            variable.upbnd()
        );
    }
}

#[test]
fn test_scenario_b() -> anyhow::Result<()> {
    let problem = OptimizationProblem::from_json("tests/problem.json")?;
    assert_eq!(problem.design, scenario_a());
    assert_eq!(problem.bounds, DesignBounds::reference(MachineType::Scig));

    let outcome = problem.optimize()?;
    assert_ne!(outcome.status, OptimizationStatus::MaxIter);
    assert!(outcome.iterations < problem.options.max_iter);
    assert_within_bounds(&outcome.design, &problem.bounds);
    match outcome.status {
        OptimizationStatus::Infeasible => assert!(!outcome.violations.is_empty()),
        OptimizationStatus::Converged | OptimizationStatus::MaxIter => {
            let r = outcome.result.as_ref().unwrap();
            assert!(outcome.violations.is_empty());
            assert!(outcome.constraints.feasible());
            assert!(r.overall_efficiency >= 93.0);
            assert!(r.rotor_tooth_flux_density < 2.0);
            assert!(r.stator_tooth_flux_density < 2.0);
            assert!(r.rotor_yoke_flux_density < 2.0);
            assert!(r.torque_constraint.from_shear_stress < r.torque_constraint.from_geometry);

            let cost = outcome.cost.unwrap();
            assert_relative_eq!(outcome.objective, cost);
            assert_relative_eq!(cost, cost_of(&r.masses, problem.materials.costs())?);
        }
    }
    Ok(())
}

#[test]
fn test_reproducible_with_seed() -> anyhow::Result<()> {
    let mut problem = OptimizationProblem::from_json("tests/problem.json")?;
    problem.options.max_iter = 20;
    let first = problem.optimize()?;
    let second = problem.optimize()?;
    assert_eq!(first.design, second.design);
    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.objective.to_bits(), second.objective.to_bits());
    Ok(())
}

#[test]
fn test_unknown_objective() -> anyhow::Result<()> {
    let problem = OptimizationProblem::new(
        scenario_a(),
        DesignBounds::reference(MachineType::Scig),
        "torque",
    );
    assert!(matches!(
        problem.optimize(),
        Err(GeneratorError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_unknown_design_variable() {
    let mut bounds = DesignBounds::reference(MachineType::Scig);
    bounds.insert("slip".into(), Variable::continuous(-0.3, -0.002));
    let problem = OptimizationProblem::new(scenario_a(), bounds, "costs");
    assert!(matches!(
        problem.optimize(),
        Err(GeneratorError::Configuration(_))
    ));
}

#[test]
fn test_invalid_constants() {
    let mut problem = OptimizationProblem::new(
        scenario_a(),
        DesignBounds::reference(MachineType::Scig),
        "costs",
    );
    problem.constants.pole_pairs = 0;
    assert!(matches!(
        problem.driver(),
        Err(GeneratorError::Configuration(_))
    ));
    assert!(matches!(
        problem.optimize(),
        Err(GeneratorError::Configuration(_))
    ));
    assert!(matches!(
        problem.evaluate(),
        Err(GeneratorError::Configuration(_))
    ));
}

#[test]
fn test_cancelled_before_start() -> anyhow::Result<()> {
    let problem = OptimizationProblem::new(
        scenario_a(),
        DesignBounds::reference(MachineType::Scig),
        "costs",
    );
    let cancel = Arc::new(AtomicBool::new(true));
    let outcome = problem
        .driver()?
        .with_cancellation(cancel)
        .optimize(&problem.design, &problem.bounds, &problem.objective)?;
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.status, OptimizationStatus::Infeasible);
    assert_eq!(outcome.design, scenario_a());
    assert_eq!(
        outcome.violations[0].0,
        "rotor_slot_aspect_ratio_min".to_string()
    );
    Ok(())
}

#[test]
fn test_timeout() -> anyhow::Result<()> {
    let mut problem = OptimizationProblem::new(
        scenario_a(),
        DesignBounds::reference(MachineType::Scig),
        "mass",
    );
    problem.options.timeout = Some(0.0);
    let outcome = problem.optimize()?;
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.result.is_some());

    problem.options.timeout = Some(-1.0);
    assert!(matches!(
        problem.optimize(),
        Err(GeneratorError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn test_penalty_gradient() -> anyhow::Result<()> {
    let mut problem = OptimizationProblem::new(
        scenario_a(),
        DesignBounds::reference(MachineType::Scig),
        "costs",
    );
    problem.options.max_iter = 40;
    problem.options.solver = SolverKind::PenaltyGradient(PenaltyGradientOptions::default());
    let initial = check(&problem.evaluate()?, &problem.limits).total_violation();

    let outcome = problem.optimize()?;
    assert!(outcome.iterations <= 40);
    assert_within_bounds(&outcome.design, &problem.bounds);
    assert!(outcome.result.is_some());
    assert!(outcome.constraints.total_violation() <= initial);
    Ok(())
}

#[test]
fn test_dfig_optimization() -> anyhow::Result<()> {
    let design: DesignVector = DfigDesign::new(
        0.65,
        0.6,
        0.1,
        0.065,
        -0.3,
        1.3,
        32.0,
        RatedConditions::new(5e6, 1200.0, 0.955),
    )
    .into();
    let mut problem =
        OptimizationProblem::new(design, DesignBounds::reference(MachineType::Dfig), "efficiency");
    problem.options.max_iter = 30;
    problem.options.seed = 7;

    let outcome = problem.optimize()?;
    assert_eq!(outcome.design.machine_type(), MachineType::Dfig);
    assert_within_bounds(&outcome.design, &problem.bounds);
    assert_eq!(outcome.design.rated(), design.rated());
    let r = outcome.result.as_ref().unwrap();
    assert!(r.current_ratio.is_some());
    // efficiency is maximized through its negative
    assert_eq!(outcome.objective, -r.overall_efficiency);
    assert_eq!(
        outcome.status == OptimizationStatus::Infeasible,
        !outcome.violations.is_empty()
    );
    Ok(())
}

#[test]
fn test_json_round_trip() -> anyhow::Result<()> {
    let problem = OptimizationProblem::from_json("tests/problem.json")?;
    let path = std::env::temp_dir().join("windgen_sizing_problem.json");
    problem.to_json(&path)?;
    let restored = OptimizationProblem::from_json(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(problem, restored);
    Ok(())
}

#[test]
fn test_material_file() -> anyhow::Result<()> {
    let materials = MaterialProperties::from_json("tests/materials.json")?;
    assert_eq!(materials, MaterialProperties::default());
    assert!(MaterialProperties::from_json("tests/missing.json").is_err());
    Ok(())
}
