use bayes_em::fit::{EmConfig, Observer, Step};
use bayes_em::fit::multistart::{self, MultiStart};
use bayes_em::fit::report;
use bayes_em::prob::ParameterSet;
use bayes_em::sample::Counts;
use anyhow::{bail, Context};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use std::path::PathBuf;
use structopt::*;

/// Estimate P(gender) and P(height, weight | gender) by expectation maximization
/// from records where the gender may be missing.
#[derive(StructOpt, Debug)]
struct Opts {

    /// Record file: one "gender height weight" line per observation ('0', '1' or '-'
    /// for a missing gender), after a header line.
    #[structopt(parse(from_os_str))]
    input : PathBuf,

    /// First starting point, in the order P(gender=0), P(height=1|gender=0),
    /// P(weight=1|gender=0), P(height=1|gender=1), P(weight=1|gender=1).
    #[structopt(long, number_of_values = 5)]
    start : Option<Vec<f64>>,

    /// Number of random starting points tried after the first one.
    #[structopt(long, default_value = "5")]
    random_starts : usize,

    /// Seed for the random starting points (taken from entropy if absent).
    #[structopt(long)]
    seed : Option<u64>,

    /// JSON file with "tolerance" and/or "max_iter".
    #[structopt(long, parse(from_os_str))]
    config : Option<PathBuf>,

    #[structopt(long)]
    tolerance : Option<f64>,

    #[structopt(long)]
    max_iter : Option<usize>,

    /// The input has no header line.
    #[structopt(long)]
    no_header : bool,

    /// Also write starting and final parameters of every run as CSV.
    #[structopt(long, parse(from_os_str))]
    csv : Option<PathBuf>,

    /// Do not print per-iteration progress.
    #[structopt(short, long)]
    quiet : bool

}

/// Prints the iteration/log-likelihood/delta table of a single run.
struct ProgressTable {
    quiet : bool
}

impl Observer for ProgressTable {

    fn start(&mut self, log_lik : f64) {
        if !self.quiet {
            println!("{:<12}{:<20}{}", "Iteration", "log_likelihood", "delta");
            println!("{}", Step { iteration : 0, log_lik, delta : 0.0 });
        }
    }

    fn observe(&mut self, step : &Step) {
        if !self.quiet {
            println!("{}", step);
        }
    }

}

fn load_config(opts : &Opts) -> anyhow::Result<EmConfig> {
    let mut config = match &opts.config {
        Some(path) => EmConfig::load(path)
            .with_context(|| format!("Error reading configuration {}", path.display()))?,
        None => EmConfig::default()
    };
    if let Some(tol) = opts.tolerance {
        config.tolerance = tol;
    }
    if let Some(max_iter) = opts.max_iter {
        config.max_iter = max_iter;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::from_args();
    let config = load_config(&opts)?;

    let counts = Counts::from_path(&opts.input, !opts.no_header)
        .with_context(|| format!("Error reading records from {}", opts.input.display()))?;
    info!("Read {} records ({} with missing gender)", counts.total(), counts.n_missing());

    let first = match &opts.start {
        Some(values) => ParameterSet::from_slice(values).context("Invalid starting parameters")?,
        None => ParameterSet::default()
    };
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy()
    };

    let quiet = opts.quiet;
    let outcomes = MultiStart::new(config)
        .with_start(first)
        .random_starts(opts.random_starts)
        .run(&counts, &mut rng, |ix, start| {
            if !quiet {
                println!("Starting parameter set {}: {}", ix, start);
            }
            ProgressTable { quiet }
        });

    for outcome in outcomes.iter() {
        println!("Starting parameter set {}", outcome.index);
        print!("{}", report::format_table(outcome));
    }

    if let Some(path) = &opts.csv {
        let f = File::create(path)
            .with_context(|| format!("Error creating {}", path.display()))?;
        report::write_csv(&report::result_rows(&outcomes), f)?;
    }

    match multistart::best(&outcomes) {
        Some((outcome, fit)) => {
            println!(
                "Best: starting parameter set {} (log-likelihood {:.6}, {} iterations)",
                outcome.index,
                fit.log_lik,
                fit.iterations
            );
            println!("{}", fit.params);
            Ok(())
        },
        None => bail!("No starting parameter set converged")
    }
}
