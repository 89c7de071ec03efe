//! American and Bermudan puts under Black-Scholes.

use pricer_fdm::boundary::BoundaryConditionSet;
use pricer_fdm::inner_value::{InnerValueCalculator, LogInnerValueCalculator};
use pricer_fdm::market::FlatCurve;
use pricer_fdm::meshers::{Concentration, Fdm1dMesher, FdmMesherComposite};
use pricer_fdm::operators::FdmBlackScholesOp;
use pricer_fdm::schemes::FdmSchemeDesc;
use pricer_fdm::solver::{Fdm1dSolution, Fdm1dimSolver, FdmSolverConfig};
use pricer_fdm::step_conditions::{
    AmericanStepCondition, BermudanStepCondition, StepConditionComposite,
};
use std::sync::Arc;

const STRIKE: f64 = 100.0;
const RATE: f64 = 0.05;
const VOL: f64 = 0.2;
const MATURITY: f64 = 1.0;

enum Exercise {
    European,
    Bermudan(Vec<f64>),
    American,
}

fn mesher() -> FdmMesherComposite {
    FdmMesherComposite::new(vec![Fdm1dMesher::concentrating(
        STRIKE.ln() - 1.5,
        STRIKE.ln() + 1.5,
        201,
        Some(Concentration::new(STRIKE.ln(), 0.1)),
    )
    .unwrap()])
    .unwrap()
}

fn put_calculator(mesher: &FdmMesherComposite) -> Arc<LogInnerValueCalculator> {
    Arc::new(LogInnerValueCalculator::new(mesher, 0, |s| (STRIKE - s).max(0.0)).unwrap())
}

fn solve_put(exercise: Exercise) -> Fdm1dSolution {
    let mesher = mesher();
    let op = FdmBlackScholesOp::new(
        &mesher,
        0,
        Arc::new(FlatCurve::new(RATE)),
        Arc::new(FlatCurve::new(0.0)),
        VOL,
    )
    .unwrap();
    let payoff = put_calculator(&mesher);
    let conditions = match exercise {
        Exercise::European => StepConditionComposite::new(),
        Exercise::Bermudan(dates) => StepConditionComposite::new()
            .with(BermudanStepCondition::new(dates, payoff.clone()).unwrap()),
        Exercise::American => {
            StepConditionComposite::new().with(AmericanStepCondition::new(payoff.clone()))
        }
    };
    let config = FdmSolverConfig::builder()
        .maturity(MATURITY)
        .time_steps(100)
        .damping_steps(2)
        .scheme(FdmSchemeDesc::crank_nicolson())
        .build()
        .unwrap();

    Fdm1dimSolver::new(
        config,
        &mesher,
        op,
        BoundaryConditionSet::new(),
        conditions,
        payoff.as_ref(),
    )
    .unwrap()
    .solve()
    .unwrap()
}

#[test]
fn test_american_put_dominates_european_and_intrinsic() {
    let american = solve_put(Exercise::American);
    let european = solve_put(Exercise::European);
    let intrinsic = put_calculator(&mesher());

    for (i, (a, e)) in american.values().iter().zip(european.values()).enumerate() {
        assert!(a + 1e-12 >= *e, "node {}: american {} < european {}", i, a, e);
        let exercise = intrinsic.inner_value(i, 0.0).unwrap();
        assert!(a + 1e-12 >= exercise, "node {}: {} below intrinsic {}", i, a, exercise);
    }
}

#[test]
fn test_american_put_price() {
    // binomial reference 6.0904, European 5.5735
    let x = STRIKE.ln();
    let american = solve_put(Exercise::American).interpolate_at(x).unwrap();
    let european = solve_put(Exercise::European).interpolate_at(x).unwrap();
    assert!((american - 6.0904).abs() < 2e-2, "american {}", american);
    assert!((european - 5.5735).abs() < 5e-3, "european {}", european);
}

#[test]
fn test_bermudan_put_lies_between() {
    let x = 95f64.ln();
    let bermudan = solve_put(Exercise::Bermudan(vec![0.25, 0.5, 0.75]))
        .interpolate_at(x)
        .unwrap();
    let american = solve_put(Exercise::American).interpolate_at(x).unwrap();
    let european = solve_put(Exercise::European).interpolate_at(x).unwrap();
    assert!(bermudan > european + 1e-3, "bermudan {} european {}", bermudan, european);
    assert!(bermudan < american, "bermudan {} american {}", bermudan, american);
}
