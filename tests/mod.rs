#[macro_use]
extern crate approx;

use bayes_em::fit::*;
use bayes_em::fit::em::log_likelihood;
use bayes_em::fit::multistart::{random_start, MultiStart, best};
use bayes_em::prob::*;
use bayes_em::sample::Counts;
use rand::SeedableRng;
use rand::rngs::StdRng;

const EPS : f64 = 1E-10;

fn scenario() -> Counts {
    Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [4, 1, 2, 3])
}

fn start() -> ParameterSet {
    ParameterSet::new(0.7, [[0.7, 0.8], [0.3, 0.4]]).unwrap()
}

#[test]
fn scenario_run() {
    let counts = scenario();
    assert_eq!(counts.total(), 63);
    let mut em = ExpectMax::new(&counts, start(), EmConfig::default()).unwrap();
    let ll0 = em.log_lik();
    assert_relative_eq!(ll0, log_likelihood(&counts, &start()).unwrap(), epsilon = EPS);
    let fit = em.run().unwrap();
    assert!(fit.iterations > 0 && fit.iterations < DEFAULT_MAX_ITER);
    assert_relative_eq!(fit.trace[0], ll0, epsilon = EPS);
    for w in fit.trace.windows(2) {
        assert!(w[1] >= w[0] - 1E-9);
    }
    assert!(fit.log_lik > ll0);
    assert_abs_diff_eq!(fit.trace[fit.trace.len() - 1], fit.trace[fit.trace.len() - 2], epsilon = 0.001);
    for v in fit.params.as_array().iter() {
        assert!(*v >= 0.0 && *v <= 1.0);
    }
}

#[test]
fn complete_data_reduces_to_frequencies() {
    let counts = Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [0; 4]);
    let mut em = ExpectMax::new(&counts, start(), EmConfig::default()).unwrap();
    let expected = *em.e_step().unwrap();
    assert!(expected.iter().all(|c| *c == 0.0 ));
    let p = em.m_step().unwrap();

    // Reference gender: combinations 0..4 (25 records); other gender: 4..8 (28 records).
    assert_relative_eq!(p.p_gender0(), 25.0 / 53.0, epsilon = EPS);
    // Height at reference: effect bit 0b10 set (combinations 2, 3 and 6, 7).
    assert_relative_eq!(p.p_effect(0, 0), 10.0 / 25.0, epsilon = EPS);
    assert_relative_eq!(p.p_effect(1, 0), 13.0 / 28.0, epsilon = EPS);
    // Weight at reference: effect bit 0b01 set (combinations 1, 3 and 5, 7).
    assert_relative_eq!(p.p_effect(0, 1), 7.0 / 25.0, epsilon = EPS);
    assert_relative_eq!(p.p_effect(1, 1), 21.0 / 28.0, epsilon = EPS);

    // The estimate does not depend on the starting point, so the second cycle is a no-op.
    let fit = em.run().unwrap();
    assert_eq!(fit.iterations, 2);
    assert_relative_eq!(fit.params.max_abs_diff(&p), 0.0, epsilon = EPS);
}

#[test]
fn fixed_point_is_stable() {
    let counts = scenario();
    let cfg = EmConfig::new().tolerance(1E-9).max_iter(100_000);
    let mut em = ExpectMax::new(&counts, start(), cfg).unwrap();
    let fit = em.run().unwrap();
    let step = em.step().unwrap();
    assert!(step.delta <= 1E-9);
    assert!(em.params().max_abs_diff(&fit.params) < 1E-3);
}

#[test]
fn fixed_point_at_default_tolerance() {
    let counts = scenario();
    let mut em = ExpectMax::new(&counts, start(), EmConfig::default()).unwrap();
    let fit = em.run().unwrap();
    let step = em.step().unwrap();
    assert!(step.delta <= DEFAULT_TOLERANCE, "Next delta {}", step.delta);
    assert!(em.params().max_abs_diff(&fit.params) < 1E-3);
    for v in em.params().as_array().iter() {
        assert!(*v > 0.0 && *v < 1.0);
    }
}

#[test]
fn monotone_from_random_starts() {
    let counts = scenario();
    let mut rng = StdRng::seed_from_u64(2021);
    for _ in 0..20 {
        let p = random_start(&mut rng);
        let mut em = ExpectMax::new(&counts, p, EmConfig::default()).unwrap();
        let mut last = em.log_lik();
        let fit = em.run_with(&mut |s : &Step| {
            assert!(s.log_lik >= last - 1E-9, "{} < {}", s.log_lik, last);
            last = s.log_lik;
        });
        if let Ok(fit) = fit {
            assert_relative_eq!(fit.log_lik, last, epsilon = EPS);
        }
    }
}

#[test]
fn boundary_start_rejected() {
    let counts = scenario();
    for i in 0..5 {
        for edge in [0.0, 1.0].iter() {
            let mut v = start().as_array();
            v[i] = *edge;
            let p = ParameterSet::from_slice(&v).unwrap();
            match ExpectMax::new(&counts, p, EmConfig::default()) {
                Err(EmError::BoundaryStart(q)) => assert_eq!(q, p),
                other => panic!("Unexpected {:?}", other)
            }
        }
    }
}

#[test]
fn zero_likelihood_at_boundary() {
    let counts = scenario();
    // Every record would have to carry the reference gender.
    let p = ParameterSet::new(1.0, [[0.5, 0.5], [0.5, 0.5]]).unwrap();
    match log_likelihood(&counts, &p) {
        Err(EmError::ZeroLikelihood { bucket : Bucket::Observed(4), count : 3 }) => { },
        other => panic!("Unexpected {:?}", other)
    }
    // Height can never be at its reference value under either gender.
    let p = ParameterSet::new(0.5, [[0.0, 0.5], [0.0, 0.5]]).unwrap();
    match log_likelihood(&Counts::new([0; 8], [0, 0, 2, 0]), &p) {
        Err(EmError::ZeroLikelihood { bucket : Bucket::Missing(2), count : 2 }) => { },
        other => panic!("Unexpected {:?}", other)
    }
    // Impossible outcomes with no records do not count.
    assert!(log_likelihood(&Counts::new([0; 8], [1, 1, 0, 0]), &p).unwrap().is_finite());
}

#[test]
fn estimator_interface() {
    let counts = scenario();
    let mut em = ExpectMax::new(&counts, start(), EmConfig::default()).unwrap();
    assert!(em.posterior().is_none());
    let p = *em.fit().unwrap();
    assert_eq!(em.posterior(), Some(&p));
    assert_eq!(em.params(), &p);
}

#[test]
fn runs_share_counts() {
    let counts = scenario();
    let before = counts.clone();
    let mut a = ExpectMax::new(&counts, start(), EmConfig::default()).unwrap();
    let mut b = ExpectMax::new(&counts, ParameterSet::default(), EmConfig::default()).unwrap();
    let fa = a.run().unwrap();
    let fb = b.run().unwrap();
    assert_eq!(fa, fb);
    assert_eq!(counts, before);
}

#[test]
fn records_to_estimate() {
    let text = "g h w\n\
        0 1 1\n0 1 1\n0 1 0\n0 0 1\n0 0 0\n\
        1 0 0\n1 0 0\n1 0 1\n1 1 0\n1 0 0\n\
        - 1 1\n- 0 0\n- 1 0\n";
    let counts = Counts::from_reader(text.as_bytes(), true).unwrap();
    assert_eq!(counts.total(), 13);
    assert_eq!(counts.n_missing(), 3);
    let mut rng = StdRng::seed_from_u64(5);
    let outcomes = MultiStart::new(EmConfig::default())
        .with_start(ParameterSet::default())
        .random_starts(5)
        .run(&counts, &mut rng, |ix, _| LogObserver::new(format!("start {}", ix)));
    assert_eq!(outcomes.len(), 6);
    let (_, fit) = best(&outcomes).unwrap();
    let fitted = outcomes.iter().filter_map(|o| o.result.as_ref().ok() );
    for other in fitted {
        assert!(fit.log_lik >= other.log_lik);
    }
}
