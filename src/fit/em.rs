use crate::prob::*;
use crate::sample::Counts;
use super::*;
use log::{debug, info};
use serde::Serialize;
use std::fmt::{self, Display};

/// Report of a single E/M cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Step {

    /// 1-based index of the cycle that just finished.
    pub iteration : usize,

    /// Log-likelihood of the parameters produced by this cycle.
    pub log_lik : f64,

    /// Absolute change in log-likelihood relative to the previous parameters.
    pub delta : f64

}

impl Display for Step {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}{:<20.6}{:.6}", self.iteration, self.log_lik, self.delta)
    }

}

/// Outcome of a converged EM run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fit {

    pub params : ParameterSet,

    pub log_lik : f64,

    pub iterations : usize,

    /// Log-likelihood of the starting parameters followed by the log-likelihood
    /// after each iteration.
    pub trace : Vec<f64>

}

/// Observed-data log-likelihood of the counts under params: every fully observed record
/// contributes the log of its complete likelihood, and every gender-missing record the log
/// of its marginal over both genders. Empty buckets contribute nothing, so a zero likelihood
/// only fails when at least one record falls in that bucket.
pub fn log_likelihood(counts : &Counts, params : &ParameterSet) -> Result<f64, EmError> {
    let mut ll = 0.0;
    for (full, &n) in counts.observed().iter().enumerate() {
        if n == 0 {
            continue;
        }
        let lik = params.complete_likelihood(full);
        if lik <= 0.0 {
            return Err(EmError::ZeroLikelihood { bucket : Bucket::Observed(full), count : n });
        }
        ll += n as f64 * lik.ln();
    }
    for (effects, &n) in counts.missing().iter().enumerate() {
        if n == 0 {
            continue;
        }
        let lik = params.incomplete_likelihood(effects);
        if lik <= 0.0 {
            return Err(EmError::ZeroLikelihood { bucket : Bucket::Missing(effects), count : n });
        }
        ll += n as f64 * lik.ln();
    }
    Ok(ll)
}

/// The expectation maximization algorithm (Dempster, Laird & Rubin, 1977) applied to
/// the gender -> (height, weight) network when gender is missing for part of the records.
///
/// The E-step splits each gender-missing count between both genders in proportion to the
/// posterior probability of the reference gender given the observed effects. The M-step
/// re-estimates the five Bernoulli parameters as relative frequencies over the observed
/// counts plus those soft counts. Each cycle never decreases the observed-data
/// log-likelihood, and iterations stop when its change falls to the configured tolerance.
///
/// One instance binds one dataset (borrowed, never modified) and one starting point;
/// independent runs over the same counts just build independent instances.
///
/// # References
/// Dempster, A. P., Laird, N. M., & Rubin, D. B.
/// ([1977](https://rss.onlinelibrary.wiley.com/doi/abs/10.1111/j.2517-6161.1977.tb01600.x)).
/// Maximum Likelihood from Incomplete Data
/// Via the EM Algorithm. Journal of the Royal Statistical Society: Series B (Methodological),
/// 39(1), 1-22. doi: 10.1111/j.2517-6161.1977.tb01600.x
#[derive(Debug, Clone)]
pub struct ExpectMax<'a> {

    counts : &'a Counts,

    config : EmConfig,

    params : ParameterSet,

    /// Soft counts for gender-missing records, laid out by 3-bit combination.
    expected : [f64; N_FULL],

    log_lik : f64,

    iteration : usize,

    trace : Vec<f64>,

    converged : bool

}

impl<'a> ExpectMax<'a> {

    /// Binds the estimator to the counts and starting parameters, evaluating the starting
    /// log-likelihood and running a first E-step, so the expected counts always partition the
    /// gender-missing counts. Starting parameters with any value at exactly 0 or 1 are rejected.
    pub fn new(counts : &'a Counts, start : ParameterSet, config : EmConfig) -> Result<Self, EmError> {
        if counts.total() == 0 {
            return Err(EmError::DegenerateDataset("no records"));
        }
        if !start.is_interior() {
            return Err(EmError::BoundaryStart(start));
        }
        let log_lik = log_likelihood(counts, &start)?;
        let mut em = Self {
            counts,
            config,
            params : start,
            expected : [0.0; N_FULL],
            log_lik,
            iteration : 0,
            trace : vec![log_lik],
            converged : false
        };
        em.e_step()?;
        Ok(em)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn log_lik(&self) -> f64 {
        self.log_lik
    }

    pub fn iterations(&self) -> usize {
        self.iteration
    }

    pub fn expected_counts(&self) -> &[f64; N_FULL] {
        &self.expected
    }

    pub fn config(&self) -> &EmConfig {
        &self.config
    }

    /// Replaces the stopping rule used by subsequent calls to run(.).
    pub fn set_config(&mut self, config : EmConfig) {
        self.config = config;
    }

    /// Log-likelihood of the bound counts under the informed parameters.
    pub fn log_likelihood(&self, params : &ParameterSet) -> Result<f64, EmError> {
        log_likelihood(self.counts, params)
    }

    /// Splits every gender-missing count into an expected reference-gender share (lower half
    /// of the buffer) and the remaining other-gender share (upper half).
    pub fn e_step(&mut self) -> Result<&[f64; N_FULL], EmError> {
        for (effects, &n) in self.counts.missing().iter().enumerate() {
            let ref_ix = full_combo(true, effects);
            let other_ix = full_combo(false, effects);
            if n == 0 {
                self.expected[ref_ix] = 0.0;
                self.expected[other_ix] = 0.0;
                continue;
            }
            let post = self.params.posterior_gender_is_reference(effects)
                .ok_or(EmError::ZeroLikelihood { bucket : Bucket::Missing(effects), count : n })?;
            let n = n as f64;
            self.expected[ref_ix] = post * n;
            self.expected[other_ix] = n - self.expected[ref_ix];
        }
        Ok(&self.expected)
    }

    /// Closed-form re-estimation from observed counts plus the expected counts of the last
    /// E-step. Fails if either gender ends up with no (soft) records at all.
    pub fn m_step(&self) -> Result<ParameterSet, EmError> {
        let total = self.counts.total() as f64;
        if total == 0.0 {
            return Err(EmError::DegenerateDataset("no records"));
        }

        // Indexed by gender row, then by effect variable.
        let mut sum_gender = [0.0; 2];
        let mut sum_effect = [[0.0; N_EFFECT_VARS]; 2];
        for (full, &n) in self.counts.observed().iter().enumerate() {
            let w = n as f64 + self.expected[full];
            let row = gender_row(full);
            let effects = effect_part(full);
            sum_gender[row] += w;
            for var in 0..N_EFFECT_VARS {
                if effect_is_reference(effects, var) {
                    sum_effect[row][var] += w;
                }
            }
        }

        // sum_gender[1] == total - sum_gender[0]
        if sum_gender[0] <= 0.0 {
            return Err(EmError::DegenerateDataset("no records assigned to the reference gender"));
        }
        if sum_gender[1] <= 0.0 {
            return Err(EmError::DegenerateDataset("no records assigned to the other gender"));
        }
        let mut p_effect = [[0.0; N_EFFECT_VARS]; 2];
        for row in 0..2 {
            for var in 0..N_EFFECT_VARS {
                p_effect[row][var] = sum_effect[row][var] / sum_gender[row];
            }
        }
        ParameterSet::new(sum_gender[0] / total, p_effect)
    }

    /// Runs one E/M cycle, adopting the new parameters and their log-likelihood.
    pub fn step(&mut self) -> Result<Step, EmError> {
        self.e_step()?;
        let next = self.m_step()?;
        let log_lik = self.log_likelihood(&next)?;
        let delta = (log_lik - self.log_lik).abs();
        self.params = next;
        self.log_lik = log_lik;
        self.iteration += 1;
        self.trace.push(log_lik);
        debug!("EM iteration {}: log-likelihood {} (delta {})", self.iteration, log_lik, delta);
        Ok(Step { iteration : self.iteration, log_lik, delta })
    }

    /// Iterates until the log-likelihood delta is at or below the tolerance.
    pub fn run(&mut self) -> Result<Fit, EmError> {
        self.run_with(&mut Silent)
    }

    /// Same as run(.), reporting every iteration to the observer.
    pub fn run_with<O>(&mut self, observer : &mut O) -> Result<Fit, EmError>
    where
        O : Observer + ?Sized
    {
        self.converged = false;
        observer.start(self.log_lik);
        let mut delta = std::f64::INFINITY;
        let mut n_run = 0;
        loop {
            if n_run >= self.config.max_iter {
                return Err(EmError::NonConvergence { iterations : n_run, delta });
            }
            let step = self.step()?;
            n_run += 1;
            delta = step.delta;
            observer.observe(&step);
            if delta <= self.config.tolerance {
                self.converged = true;
                info!(
                    "EM converged after {} iterations (log-likelihood {:.6})",
                    self.iteration,
                    self.log_lik
                );
                return Ok(self.current_fit());
            }
        }
    }

    fn current_fit(&self) -> Fit {
        Fit {
            params : self.params,
            log_lik : self.log_lik,
            iterations : self.iteration,
            trace : self.trace.clone()
        }
    }

}

impl<'a> Estimator<ParameterSet> for ExpectMax<'a> {

    type Error = EmError;

    fn fit<'b>(&'b mut self) -> Result<&'b ParameterSet, EmError> {
        self.run()?;
        Ok(&self.params)
    }

    fn posterior<'b>(&'b self) -> Option<&'b ParameterSet> {
        if self.converged {
            Some(&self.params)
        } else {
            None
        }
    }

}

#[cfg(test)]
fn scenario() -> (Counts, ParameterSet) {
    (Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [4, 1, 2, 3]), ParameterSet::default())
}

#[test]
fn expected_counts_partition_missing() {
    let (counts, start) = scenario();
    let mut em = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    let expected = *em.e_step().unwrap();
    for j in 0..N_EFFECT {
        assert!(expected[j] >= 0.0 && expected[j + 4] >= 0.0);
        assert_abs_diff_eq!(expected[j] + expected[j + 4], counts.missing()[j] as f64, epsilon = 1E-12);
    }
}

#[test]
fn e_step_matches_posterior() {
    let (counts, start) = scenario();
    let mut em = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    em.e_step().unwrap();
    let post = start.posterior_gender_is_reference(3).unwrap();
    assert_abs_diff_eq!(em.expected_counts()[3], 3.0 * post, epsilon = 1E-12);
}

#[test]
fn scenario_converges_monotonically() {
    let (counts, start) = scenario();
    let mut em = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    let mut steps = Vec::new();
    let fit = em.run_with(&mut |s : &Step| steps.push(*s) ).unwrap();
    assert!(fit.iterations >= 1);
    assert_eq!(steps.len(), fit.iterations);
    assert_eq!(fit.trace.len(), fit.iterations + 1);
    for w in fit.trace.windows(2) {
        assert!(w[1] >= w[0] - 1E-9, "Log-likelihood decreased: {} -> {}", w[0], w[1]);
    }
    for v in fit.params.as_array().iter() {
        assert!(*v >= 0.0 && *v <= 1.0);
    }
    assert!(steps.last().unwrap().delta <= DEFAULT_TOLERANCE);
    assert_eq!(em.posterior(), Some(&fit.params));
}

#[test]
fn degenerate_partition() {
    // Only reference-gender records and no missing data: the other gender gets no mass.
    let counts = Counts::new([3, 1, 0, 2, 0, 0, 0, 0], [0; 4]);
    let mut em = ExpectMax::new(&counts, ParameterSet::default(), EmConfig::default()).unwrap();
    em.e_step().unwrap();
    match em.m_step() {
        Err(EmError::DegenerateDataset(_)) => { },
        other => panic!("Unexpected {:?}", other)
    }
}

#[test]
fn empty_dataset() {
    let counts = Counts::default();
    match ExpectMax::new(&counts, ParameterSet::default(), EmConfig::default()) {
        Err(EmError::DegenerateDataset(_)) => { },
        other => panic!("Unexpected {:?}", other)
    }
}

#[test]
fn iteration_cap() {
    let (counts, start) = scenario();
    let cfg = EmConfig::default().tolerance(0.0).max_iter(3);
    let mut em = ExpectMax::new(&counts, start, cfg).unwrap();
    match em.run() {
        Err(EmError::NonConvergence { iterations : 3, .. }) => { },
        other => panic!("Unexpected {:?}", other)
    }
    assert_eq!(em.iterations(), 3);
    assert!(em.posterior().is_none());
}

#[test]
fn m_step_right_after_new() {
    let (counts, start) = scenario();
    let em = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    for j in 0..N_EFFECT {
        let e = em.expected_counts();
        assert_abs_diff_eq!(e[j] + e[j + 4], counts.missing()[j] as f64, epsilon = 1E-12);
    }
    let p = em.m_step().unwrap();

    // Same statistics computed by hand from observed plus expected counts.
    let e = *em.expected_counts();
    let w : Vec<f64> = (0..N_FULL).map(|i| counts.observed()[i] as f64 + e[i] ).collect();
    let sum_ref = w[0] + w[1] + w[2] + w[3];
    let sum_other = 63.0 - sum_ref;
    assert_abs_diff_eq!(sum_other, w[4] + w[5] + w[6] + w[7], epsilon = 1E-9);
    assert_abs_diff_eq!(p.p_gender0(), sum_ref / 63.0, epsilon = 1E-12);
    assert_abs_diff_eq!(p.p_effect(0, 0), (w[2] + w[3]) / sum_ref, epsilon = 1E-12);
    assert_abs_diff_eq!(p.p_effect(0, 1), (w[1] + w[3]) / sum_ref, epsilon = 1E-12);
    assert_abs_diff_eq!(p.p_effect(1, 0), (w[6] + w[7]) / sum_other, epsilon = 1E-12);
    assert_abs_diff_eq!(p.p_effect(1, 1), (w[5] + w[7]) / sum_other, epsilon = 1E-12);

    // Identical to an explicit E-step followed by the M-step.
    let mut again = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    again.e_step().unwrap();
    assert_eq!(again.m_step().unwrap(), p);
}

#[test]
fn failed_rerun_clears_posterior() {
    let (counts, start) = scenario();
    let mut em = ExpectMax::new(&counts, start, EmConfig::default()).unwrap();
    em.run().unwrap();
    assert!(em.posterior().is_some());
    // A negative tolerance can never be met.
    em.set_config(EmConfig::default().tolerance(-1.0).max_iter(2));
    assert_eq!(em.config().max_iter, 2);
    match em.run() {
        Err(EmError::NonConvergence { iterations : 2, .. }) => { },
        other => panic!("Unexpected {:?}", other)
    }
    assert!(em.posterior().is_none());
}
