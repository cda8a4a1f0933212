use super::*;
use crate::fit::EmError;
use serde::Serialize;
use std::fmt::{self, Display};

/// Parameters of the gender -> (height, weight) network: the marginal probability of the
/// reference gender and, for each gender row, the probability of each effect variable taking
/// its reference value. Each value is its own Bernoulli parameter, so no normalization holds
/// between them. A ParameterSet is never mutated: every M-step builds a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterSet {

    p_gender0 : f64,

    /// p_effect[g][i]: P(effect i = reference | gender row g); g = 0 is the reference gender,
    /// i = 0 is height and i = 1 is weight.
    p_effect : [[f64; 2]; 2]

}

/// Labels of the five parameters, in the order used by as_array and from_slice.
pub const PARAMETER_NAMES : [&str; 5] = [
    "P(gender=0)",
    "P(height=1|gender=0)",
    "P(weight=1|gender=0)",
    "P(height=1|gender=1)",
    "P(weight=1|gender=1)"
];

impl ParameterSet {

    /// Validates that all five values lie in [0, 1].
    pub fn new(p_gender0 : f64, p_effect : [[f64; 2]; 2]) -> Result<Self, EmError> {
        let params = Self { p_gender0, p_effect };
        for v in params.as_array().iter() {
            if !is_probability(*v) {
                return Err(EmError::ParameterBounds(*v));
            }
        }
        Ok(params)
    }

    /// Builds a parameter set from five values ordered as PARAMETER_NAMES.
    pub fn from_slice(values : &[f64]) -> Result<Self, EmError> {
        if values.len() != 5 {
            return Err(EmError::ParameterCount(values.len()));
        }
        Self::new(values[0], [[values[1], values[2]], [values[3], values[4]]])
    }

    pub fn p_gender0(&self) -> f64 {
        self.p_gender0
    }

    pub fn p_effect(&self, gender_row : usize, var : usize) -> f64 {
        self.p_effect[gender_row][var]
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.p_gender0,
            self.p_effect[0][0],
            self.p_effect[0][1],
            self.p_effect[1][0],
            self.p_effect[1][1]
        ]
    }

    /// Builds a parameter set from values already known to lie in (0, 1), such as
    /// draws from the open unit interval.
    pub(crate) fn from_open_unit(v : [f64; 5]) -> Self {
        debug_assert!(v.iter().all(|x| *x > 0.0 && *x < 1.0 ));
        Self { p_gender0 : v[0], p_effect : [[v[1], v[2]], [v[3], v[4]]] }
    }

    /// True when no value sits exactly at 0 or 1.
    pub fn is_interior(&self) -> bool {
        self.as_array().iter().all(|v| !is_boundary(*v) )
    }

    /// Largest absolute difference between matching parameters.
    pub fn max_abs_diff(&self, other : &ParameterSet) -> f64 {
        self.as_array().iter()
            .zip(other.as_array().iter())
            .map(|(a, b)| (a - b).abs() )
            .fold(0.0, f64::max)
    }

    /// Joint probability of a fully observed (gender, height, weight) combination.
    pub fn complete_likelihood(&self, full : usize) -> f64 {
        let row = gender_row(full);
        let effects = effect_part(full);
        let mut p = bernoulli_prob(gender_is_reference(full), self.p_gender0);
        for var in 0..N_EFFECT_VARS {
            p *= bernoulli_prob(effect_is_reference(effects, var), self.p_effect[row][var]);
        }
        p
    }

    /// Marginal probability of an effect combination, summing over both genders.
    pub fn incomplete_likelihood(&self, effects : usize) -> f64 {
        self.complete_likelihood(full_combo(true, effects)) +
            self.complete_likelihood(full_combo(false, effects))
    }

    /// P(gender = reference | effects) by Bayes' rule. Returns None when both gender
    /// hypotheses assign zero probability to the effect combination.
    pub fn posterior_gender_is_reference(&self, effects : usize) -> Option<f64> {
        let joint_ref = self.complete_likelihood(full_combo(true, effects));
        let marginal = joint_ref + self.complete_likelihood(full_combo(false, effects));
        if marginal > 0.0 {
            Some(joint_ref / marginal)
        } else {
            None
        }
    }

}

/// The fixed starting point used as the first of a multi-start sequence.
impl Default for ParameterSet {

    fn default() -> Self {
        Self {
            p_gender0 : 0.7,
            p_effect : [[0.7, 0.8], [0.3, 0.4]]
        }
    }

}

impl Display for ParameterSet {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.as_array();
        for (i, (name, v)) in PARAMETER_NAMES.iter().zip(values.iter()).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {:.6}", name, v)?;
        }
        Ok(())
    }

}

#[cfg(test)]
fn interior_grid() -> Vec<ParameterSet> {
    let vals = [0.05, 0.3, 0.5, 0.81, 0.97];
    let mut sets = Vec::new();
    for (i, g) in vals.iter().enumerate() {
        for (j, a) in vals.iter().enumerate() {
            let b = vals[(i + j) % vals.len()];
            let c = vals[(2 * i + j + 1) % vals.len()];
            let d = vals[(i + 3 * j + 2) % vals.len()];
            sets.push(ParameterSet::new(*g, [[*a, b], [c, d]]).unwrap());
        }
    }
    sets
}

#[test]
fn joint_sums_to_one() {
    for p in interior_grid() {
        let s : f64 = (0..N_FULL).map(|i| p.complete_likelihood(i) ).sum();
        assert_abs_diff_eq!(s, 1.0, epsilon = 1E-12);
        let s : f64 = (0..N_EFFECT).map(|j| p.incomplete_likelihood(j) ).sum();
        assert_abs_diff_eq!(s, 1.0, epsilon = 1E-12);
    }
}

#[test]
fn posterior_is_probability() {
    for p in interior_grid() {
        for j in 0..N_EFFECT {
            let post = p.posterior_gender_is_reference(j).unwrap();
            assert!(post >= 0.0 && post <= 1.0);
            // Both hypotheses reconstruct the marginal.
            let joint_ref = p.complete_likelihood(j);
            let joint_other = p.complete_likelihood(j + 4);
            assert_abs_diff_eq!(joint_ref + joint_other, p.incomplete_likelihood(j), epsilon = 1E-12);
            assert_abs_diff_eq!(post * p.incomplete_likelihood(j), joint_ref, epsilon = 1E-12);
        }
    }
}

#[test]
fn complete_likelihood_terms() {
    let p = ParameterSet::default();
    // 0b000: reference gender, height and weight both at the complement.
    assert_abs_diff_eq!(p.complete_likelihood(0), 0.7 * 0.3 * 0.2, epsilon = 1E-12);
    // 0b011: reference gender, both effects at reference.
    assert_abs_diff_eq!(p.complete_likelihood(3), 0.7 * 0.7 * 0.8, epsilon = 1E-12);
    // 0b110: other gender, height at reference, weight not.
    assert_abs_diff_eq!(p.complete_likelihood(6), 0.3 * 0.3 * 0.6, epsilon = 1E-12);
}

#[test]
fn zero_denominator() {
    let p = ParameterSet::new(0.5, [[1.0, 1.0], [1.0, 1.0]]).unwrap();
    assert!(p.posterior_gender_is_reference(0).is_none());
    assert!(p.posterior_gender_is_reference(3).is_some());
}

#[test]
fn bounds() {
    assert!(ParameterSet::new(1.2, [[0.5, 0.5], [0.5, 0.5]]).is_err());
    assert!(ParameterSet::new(0.5, [[0.5, -0.1], [0.5, 0.5]]).is_err());
    assert!(ParameterSet::from_slice(&[0.5, 0.5]).is_err());
    let p = ParameterSet::from_slice(&[0.5, 0.1, 0.2, 0.3, 0.4]).unwrap();
    assert_eq!(p.p_effect(1, 0), 0.3);
    assert!(p.is_interior());
    assert!(!ParameterSet::new(0.0, [[0.5, 0.5], [0.5, 0.5]]).unwrap().is_interior());
}
