/// Probability of a single binary realization under a Bernoulli parameter theta,
/// where theta is the probability of the reference outcome. The complementary
/// outcome always carries 1 - theta.
pub fn bernoulli_prob(is_reference : bool, theta : f64) -> f64 {
    if is_reference {
        theta
    } else {
        1. - theta
    }
}

/// Log-probability counterpart of bernoulli_prob. Returns -inf when the informed
/// outcome is impossible under theta.
pub fn bernoulli_log_prob(is_reference : bool, theta : f64) -> f64 {
    bernoulli_prob(is_reference, theta).ln()
}

/// Whether theta is a valid Bernoulli parameter (a finite value in the closed unit interval).
pub fn is_probability(theta : f64) -> bool {
    theta.is_finite() && theta >= 0.0 && theta <= 1.0
}

/// Whether theta sits exactly at one of the degenerate endpoints 0 or 1.
pub fn is_boundary(theta : f64) -> bool {
    theta == 0.0 || theta == 1.0
}

#[test]
fn complement() {
    for theta in (0..=10).map(|i| 0.1 * i as f64) {
        let s = bernoulli_prob(true, theta) + bernoulli_prob(false, theta);
        assert_abs_diff_eq!(s, 1.0, epsilon = 1E-12);
    }
}

#[test]
fn log_prob_impossible() {
    assert_eq!(bernoulli_log_prob(true, 0.0), std::f64::NEG_INFINITY);
    assert_eq!(bernoulli_log_prob(false, 1.0), std::f64::NEG_INFINITY);
    assert_abs_diff_eq!(bernoulli_log_prob(true, 0.5), 0.5f64.ln(), epsilon = 1E-12);
}

#[test]
fn domain() {
    assert!(is_probability(0.0) && is_probability(1.0) && is_probability(0.3));
    assert!(!is_probability(-0.01) && !is_probability(1.01) && !is_probability(std::f64::NAN));
    assert!(is_boundary(0.0) && is_boundary(1.0) && !is_boundary(0.5));
}
