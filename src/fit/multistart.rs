use crate::prob::ParameterSet;
use crate::sample::Counts;
use super::*;
use log::warn;
use rand::Rng;
use rand::distributions::Open01;

/// Draws a starting point with every parameter uniform on the open interval (0, 1),
/// so no value lands on a degenerate endpoint.
pub fn random_start<R>(rng : &mut R) -> ParameterSet
where
    R : Rng + ?Sized
{
    let mut v = [0.0; 5];
    for x in v.iter_mut() {
        *x = rng.sample(Open01);
    }
    ParameterSet::from_open_unit(v)
}

/// Result of one run of a multi-start sequence. Failed runs are kept so the
/// caller can report them next to the successful ones.
#[derive(Debug, Clone)]
pub struct StartOutcome {

    pub index : usize,

    pub start : ParameterSet,

    pub result : Result<Fit, EmError>

}

/// Runs EM from a list of fixed starting points followed by a number of random ones.
/// The randomness is supplied by the caller; each run gets its own estimator over
/// the same borrowed counts.
#[derive(Debug, Clone)]
pub struct MultiStart {
    config : EmConfig,
    starts : Vec<ParameterSet>,
    n_random : usize
}

impl MultiStart {

    pub fn new(config : EmConfig) -> Self {
        Self { config, starts : Vec::new(), n_random : 0 }
    }

    /// Appends a fixed starting point.
    pub fn with_start(mut self, start : ParameterSet) -> Self {
        self.starts.push(start);
        self
    }

    /// Number of random starting points drawn after the fixed ones.
    pub fn random_starts(mut self, n : usize) -> Self {
        self.n_random = n;
        self
    }

    /// Fixed starting points followed by n_random draws from rng.
    pub fn starts<R>(&self, rng : &mut R) -> Vec<ParameterSet>
    where
        R : Rng + ?Sized
    {
        let mut starts = self.starts.clone();
        for _ in 0..self.n_random {
            starts.push(random_start(rng));
        }
        starts
    }

    /// Runs every start to completion (or failure). observer_for(i) builds the observer
    /// that receives the reports of the i-th run.
    pub fn run<R, O, F>(&self, counts : &Counts, rng : &mut R, mut observer_for : F) -> Vec<StartOutcome>
    where
        R : Rng + ?Sized,
        O : Observer,
        F : FnMut(usize, &ParameterSet) -> O
    {
        self.starts(rng).into_iter()
            .enumerate()
            .map(|(index, start)| {
                let mut observer = observer_for(index, &start);
                let result = ExpectMax::new(counts, start, self.config)
                    .and_then(|mut em| em.run_with(&mut observer) );
                if let Err(e) = &result {
                    warn!("Starting parameter set {} failed: {}", index, e);
                }
                StartOutcome { index, start, result }
            })
            .collect()
    }

}

/// Successful run with the highest final log-likelihood, if any run succeeded.
pub fn best(outcomes : &[StartOutcome]) -> Option<(&StartOutcome, &Fit)> {
    outcomes.iter()
        .filter_map(|o| o.result.as_ref().ok().map(|fit| (o, fit)) )
        .fold(None, |best : Option<(&StartOutcome, &Fit)>, (o, fit)| {
            match best {
                Some((_, b)) if b.log_lik >= fit.log_lik => best,
                _ => Some((o, fit))
            }
        })
}

#[test]
fn random_starts_are_interior() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let p = random_start(&mut rng);
        assert!(p.is_interior());
        assert!(p.as_array().iter().all(|v| *v > 0.0 && *v < 1.0 ));
    }
}

#[test]
fn failed_start_does_not_stop_sequence() {
    use rand::SeedableRng;
    let counts = Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [4, 1, 2, 3]);
    let boundary = ParameterSet::new(1.0, [[0.5, 0.5], [0.5, 0.5]]).unwrap();
    let driver = MultiStart::new(EmConfig::default())
        .with_start(boundary)
        .with_start(ParameterSet::default())
        .random_starts(3);
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    let outcomes = driver.run(&counts, &mut rng, |_, _| Silent);
    assert_eq!(outcomes.len(), 5);
    match &outcomes[0].result {
        Err(EmError::BoundaryStart(_)) => { },
        other => panic!("Unexpected {:?}", other)
    }
    assert!(outcomes[1..].iter().all(|o| o.result.is_ok() ));
    let (o, fit) = best(&outcomes).unwrap();
    assert!(o.index >= 1);
    for other in outcomes.iter().filter_map(|o| o.result.as_ref().ok() ) {
        assert!(fit.log_lik >= other.log_lik);
    }
}

#[test]
fn seeded_starts_are_reproducible() {
    use rand::SeedableRng;
    let driver = MultiStart::new(EmConfig::default()).random_starts(4);
    let a = driver.starts(&mut rand::rngs::StdRng::seed_from_u64(99));
    let b = driver.starts(&mut rand::rngs::StdRng::seed_from_u64(99));
    assert_eq!(a, b);
    assert_eq!(a.len(), 4);
}
