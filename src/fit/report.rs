use super::multistart::StartOutcome;
use crate::prob::PARAMETER_NAMES;
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::io;

/// One parameter of one run: where it started and where it ended. Failed runs
/// carry no final value and report their error instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {

    pub start_index : usize,

    pub parameter : &'static str,

    pub starting : f64,

    #[serde(rename = "final")]
    pub fitted : Option<f64>,

    pub log_lik : Option<f64>,

    pub iterations : Option<usize>,

    pub error : Option<String>

}

/// Flattens the outcomes into five rows per run.
pub fn result_rows(outcomes : &[StartOutcome]) -> Vec<ResultRow> {
    let mut rows = Vec::with_capacity(outcomes.len() * PARAMETER_NAMES.len());
    for o in outcomes.iter() {
        let starting = o.start.as_array();
        let fitted = o.result.as_ref().ok().map(|fit| fit.params.as_array() );
        for (i, name) in PARAMETER_NAMES.iter().enumerate() {
            rows.push(ResultRow {
                start_index : o.index,
                parameter : *name,
                starting : starting[i],
                fitted : fitted.map(|f| f[i] ),
                log_lik : o.result.as_ref().ok().map(|fit| fit.log_lik ),
                iterations : o.result.as_ref().ok().map(|fit| fit.iterations ),
                error : o.result.as_ref().err().map(|e| e.to_string() )
            });
        }
    }
    rows
}

/// Writes the rows as CSV (with header) to any writer.
pub fn write_csv<W>(rows : &[ResultRow], wtr : W) -> Result<(), csv::Error>
where
    W : io::Write
{
    let mut wtr = csv::Writer::from_writer(wtr);
    for row in rows.iter() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Human-readable table of starting against final parameters for a single run.
pub fn format_table(outcome : &StartOutcome) -> String {
    let mut s = String::new();
    let starting = outcome.start.as_array();
    match &outcome.result {
        Ok(fit) => {
            let fitted = fit.params.as_array();
            let _ = writeln!(s, "{:>40}\t{:>20}\t{:>20}", "Probability", "Starting parameter", "Final parameter");
            for (i, name) in PARAMETER_NAMES.iter().enumerate() {
                let _ = writeln!(s, "{:>40}\t{:>20.6}\t{:>20.6}", name, starting[i], fitted[i]);
            }
            let _ = writeln!(s, "{:>40}\t{:>20}\t{:>20.6}", "log-likelihood", "", fit.log_lik);
        },
        Err(e) => {
            let _ = writeln!(s, "Starting parameter set {} failed: {}", outcome.index, e);
        }
    }
    s
}

#[cfg(test)]
fn outcomes() -> Vec<StartOutcome> {
    use crate::prob::ParameterSet;
    use crate::sample::Counts;
    use super::*;
    let counts = Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [4, 1, 2, 3]);
    let boundary = ParameterSet::new(0.0, [[0.5, 0.5], [0.5, 0.5]]).unwrap();
    let mut rng = rand::thread_rng();
    multistart::MultiStart::new(EmConfig::default())
        .with_start(ParameterSet::default())
        .with_start(boundary)
        .run(&counts, &mut rng, |_, _| Silent)
}

#[test]
fn rows_per_run() {
    let rows = result_rows(&outcomes());
    assert_eq!(rows.len(), 10);
    assert!(rows[..5].iter().all(|r| r.fitted.is_some() && r.error.is_none() ));
    assert!(rows[5..].iter().all(|r| r.fitted.is_none() && r.error.is_some() ));
    assert_eq!(rows[1].parameter, PARAMETER_NAMES[1]);
    assert_eq!(rows[1].starting, 0.7);
}

#[test]
fn csv_output() {
    let rows = result_rows(&outcomes());
    let mut buf = Vec::new();
    write_csv(&rows, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "start_index,parameter,starting,final,log_lik,iterations,error"
    );
    assert_eq!(text.lines().count(), 11);
}

#[test]
fn table_output() {
    let outs = outcomes();
    let ok = format_table(&outs[0]);
    assert!(ok.contains("P(gender=0)") && ok.contains("log-likelihood"));
    let failed = format_table(&outs[1]);
    assert!(failed.contains("failed"));
}
