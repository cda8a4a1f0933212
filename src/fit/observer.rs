use super::em::Step;
use log::info;

/// Receives one report per EM iteration. The estimators never print by themselves;
/// anything shown to the user goes through an observer.
pub trait Observer {

    /// Called once before the first iteration with the starting log-likelihood.
    fn start(&mut self, _log_lik : f64) { }

    fn observe(&mut self, step : &Step);

}

/// Observer that ignores all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Observer for Silent {

    fn observe(&mut self, _step : &Step) { }

}

/// Any closure over a step report works as an observer.
impl<F> Observer for F
where
    F : FnMut(&Step)
{

    fn observe(&mut self, step : &Step) {
        self(step)
    }

}

/// Forwards reports to the log facade at info level, prefixed by a label
/// identifying the run.
#[derive(Debug, Clone)]
pub struct LogObserver {
    label : String
}

impl LogObserver {

    pub fn new(label : impl Into<String>) -> Self {
        Self { label : label.into() }
    }

}

impl Observer for LogObserver {

    fn start(&mut self, log_lik : f64) {
        info!("{}: start log-likelihood {:.6}", self.label, log_lik);
    }

    fn observe(&mut self, step : &Step) {
        info!("{}: {}", self.label, step);
    }

}
