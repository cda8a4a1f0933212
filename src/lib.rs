#[cfg(test)]
#[macro_use]
extern crate approx;

/// Parameters of the gender -> (height, weight) Bayesian network, the bit layout of
/// observation combinations and the likelihood/posterior queries derived from them.
pub mod prob;

/// Records and their aggregation into sufficient statistics (observed and gender-missing counts).
pub mod sample;

/// Maximum-likelihood estimation with missing gender labels: the expectation maximization
/// estimator, its stopping configuration and observers, multi-start runs and result reports.
pub mod fit;
