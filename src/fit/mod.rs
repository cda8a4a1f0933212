use crate::prob::ParameterSet;
use std::fmt::{self, Display};
use thiserror::Error;

/// Convergence settings shared by the estimators.
mod config;

pub use config::*;

/// Per-iteration reporting hooks.
mod observer;

pub use observer::*;

/// Expectation maximization for the gender -> (height, weight) network
/// with missing gender labels.
pub mod em;

pub use em::{ExpectMax, Fit, Step};

/// Repeated EM runs from a sequence of (possibly random) starting points.
pub mod multistart;

/// Tabular summaries of multi-start results.
pub mod report;

/// Trait shared by inference algorithms, parametrized by the resulting estimate. The data
/// is bound when the estimator is built, so fit(.) only runs the algorithm.
pub trait Estimator<D> {

    type Error;

    /// Runs the inference algorithm, returning a reference to the estimate
    /// held by the estimator.
    fn fit<'a>(&'a mut self) -> Result<&'a D, Self::Error>;

    /// If fit(.) has been called successfully at least once, returns the current
    /// estimate without changing the algorithm state.
    fn posterior<'a>(&'a self) -> Option<&'a D>;

}

/// Count bucket whose likelihood term is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {

    /// Fully observed records, by 3-bit combination.
    Observed(usize),

    /// Gender-missing records, by 2-bit effect combination.
    Missing(usize)

}

impl Display for Bucket {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Observed(c) => write!(f, "observed combination {:03b}", c),
            Bucket::Missing(c) => write!(f, "gender-missing combination -{:02b}", c)
        }
    }

}

/// Failures of a single EM run. None of them touch the dataset counts, so a driver can
/// move on to another starting point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmError {

    #[error("Informed parameter value {0} outside distribution domain")]
    ParameterBounds(f64),

    #[error("Expected 5 parameter values, found {0}")]
    ParameterCount(usize),

    #[error("Starting parameters have a value at exactly 0 or 1 ({0})")]
    BoundaryStart(ParameterSet),

    #[error("Degenerate dataset: {0}")]
    DegenerateDataset(&'static str),

    #[error("Zero likelihood for {bucket} ({count} records)")]
    ZeroLikelihood { bucket : Bucket, count : u64 },

    #[error("No convergence after {iterations} iterations (last delta {delta})")]
    NonConvergence { iterations : usize, delta : f64 }

}
