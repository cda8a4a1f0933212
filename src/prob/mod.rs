/// Bernoulli terms for a single binary variable.
mod bernoulli;

pub use bernoulli::*;

/// Bit layout of the observation combination indices.
mod combo;

pub use combo::*;

/// Parameter set of the gender -> (height, weight) network and its likelihood queries.
mod params;

pub use params::*;
