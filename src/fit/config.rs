use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Convergence tolerance used when none is informed.
pub const DEFAULT_TOLERANCE : f64 = 0.001;

/// Iteration cap used when none is informed.
pub const DEFAULT_MAX_ITER : usize = 1000;

/// Stopping rule for the EM loop: iterations stop once the absolute change in
/// log-likelihood is at or below tolerance, and fail once max_iter iterations ran
/// without reaching it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmConfig {

    pub tolerance : f64,

    pub max_iter : usize

}

impl EmConfig {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn tolerance(mut self, tolerance : f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn max_iter(mut self, max_iter : usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Reads a JSON object with optional "tolerance" and "max_iter" fields.
    pub fn from_json(content : &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn load<P>(path : P) -> Result<Self, anyhow::Error>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        let cfg : EmConfig = serde_json::from_reader(BufReader::new(f))?;
        Ok(cfg)
    }

}

impl Default for EmConfig {

    fn default() -> Self {
        Self { tolerance : DEFAULT_TOLERANCE, max_iter : DEFAULT_MAX_ITER }
    }

}

#[test]
fn partial_json() {
    let cfg = EmConfig::from_json(r#"{ "max_iter" : 50 }"#).unwrap();
    assert_eq!(cfg.max_iter, 50);
    assert_eq!(cfg.tolerance, DEFAULT_TOLERANCE);
    let cfg = EmConfig::from_json("{}").unwrap();
    assert_eq!(cfg, EmConfig::default());
}

#[test]
fn builder() {
    let cfg = EmConfig::new().tolerance(1E-6).max_iter(10);
    assert_eq!(cfg.tolerance, 1E-6);
    assert_eq!(cfg.max_iter, 10);
}
