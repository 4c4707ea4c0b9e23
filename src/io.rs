//! Solution files and search-progress export.
//!
//! A solution file lists the non-empty routes, numbered from 1, followed by
//! the penalized cost and, when known, the elapsed seconds:
//!
//! ```text
//! Route #1: 3 1 2
//! Route #2: 5 4
//! Cost 1234.5
//! Time 2.75
//! ```
//!
//! The search-progress log is a headerless `;`-separated CSV with one
//! record per improvement of the best solution:
//! `instance;seed;cost;elapsed_seconds`.

use crate::error::{HgsError, HgsResult};
use crate::individual::Individual;
use crate::params::Params;
use crate::population::ProgressSample;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Routes and cost read back from a solution file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionRecord {
    pub routes: Vec<Vec<usize>>,
    pub cost: f64,
}

impl SolutionRecord {
    /// Evaluated individual with these routes.
    ///
    /// # Errors
    ///
    /// [`HgsError::InvalidInstance`] when the routes do not visit every
    /// client of the instance exactly once or need more vehicles than the
    /// fleet has.
    pub fn to_individual(&self, params: &Params) -> HgsResult<Individual> {
        if self.routes.len() > params.nb_vehicles {
            return Err(HgsError::InvalidInstance(format!(
                "solution uses {} routes, fleet has {} vehicles",
                self.routes.len(),
                params.nb_vehicles
            )));
        }
        let mut seen = vec![false; params.nb_clients + 1];
        for &client in self.routes.iter().flatten() {
            if client == 0 || client > params.nb_clients {
                return Err(HgsError::InvalidInstance(format!(
                    "client {client} is outside 1..={}",
                    params.nb_clients
                )));
            }
            if seen[client] {
                return Err(HgsError::InvalidInstance(format!(
                    "client {client} is visited twice"
                )));
            }
            seen[client] = true;
        }
        if let Some(missing) = seen.iter().skip(1).position(|&s| !s) {
            return Err(HgsError::InvalidInstance(format!(
                "client {} is not visited",
                missing + 1
            )));
        }
        Ok(Individual::from_routes(params, self.routes.clone()))
    }
}

/// Writes the non-empty routes and the penalized cost of a solution.
pub fn write_solution<W: Write>(
    writer: &mut W,
    individual: &Individual,
    elapsed: Option<Duration>,
) -> HgsResult<()> {
    for (k, route) in individual.non_empty_routes().enumerate() {
        write!(writer, "Route #{}:", k + 1)?;
        for client in route {
            write!(writer, " {client}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "Cost {}", individual.penalized_cost())?;
    if let Some(elapsed) = elapsed {
        writeln!(writer, "Time {}", elapsed.as_secs_f64())?;
    }
    Ok(())
}

/// [`write_solution`] to a file, replacing it.
pub fn write_solution_file<P: AsRef<Path>>(
    path: P,
    individual: &Individual,
    elapsed: Option<Duration>,
) -> HgsResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_solution(&mut writer, individual, elapsed)?;
    writer.flush()?;
    Ok(())
}

/// Reads a solution file.
///
/// Blank lines are skipped and a `Time` line after the cost is accepted.
///
/// # Errors
///
/// [`HgsError::Parse`] on an unknown keyword, a malformed route or cost,
/// a route after the cost, or a missing cost line.
pub fn read_solution<R: BufRead>(reader: R) -> HgsResult<SolutionRecord> {
    let mut routes = Vec::new();
    let mut cost = None;
    let mut last_line = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        last_line = line_no;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "Route" => {
                if cost.is_some() {
                    return Err(HgsError::parse(line_no, "route listed after the cost"));
                }
                match tokens.next() {
                    Some(label) if label.starts_with('#') && label.ends_with(':') => {}
                    _ => return Err(HgsError::parse(line_no, "expected `#<k>:` after `Route`")),
                }
                let route = tokens
                    .map(|t| {
                        t.parse::<usize>().map_err(|_| {
                            HgsError::parse(line_no, format!("invalid client index `{t}`"))
                        })
                    })
                    .collect::<HgsResult<Vec<usize>>>()?;
                routes.push(route);
            }
            "Cost" => {
                let value = tokens
                    .next()
                    .ok_or_else(|| HgsError::parse(line_no, "missing cost value"))?;
                let value = value
                    .parse::<f64>()
                    .map_err(|_| HgsError::parse(line_no, format!("invalid cost `{value}`")))?;
                cost = Some(value);
            }
            "Time" if cost.is_some() => {}
            other => {
                return Err(HgsError::parse(line_no, format!("unexpected keyword `{other}`")));
            }
        }
    }

    let cost = cost.ok_or_else(|| HgsError::parse(last_line + 1, "missing `Cost` line"))?;
    Ok(SolutionRecord { routes, cost })
}

/// [`read_solution`] from a file.
pub fn read_solution_file<P: AsRef<Path>>(path: P) -> HgsResult<SolutionRecord> {
    let path = path.as_ref();
    File::open(path)
        .map_err(HgsError::from)
        .and_then(|file| read_solution(BufReader::new(file)))
        .inspect_err(|err| warn!(path = %path.display(), %err, "unreadable solution file"))
}

/// Writes the search progress as `instance;seed;cost;elapsed_seconds` records.
pub fn export_search_progress<P: AsRef<Path>>(
    path: P,
    instance_name: &str,
    seed: u64,
    progress: &[ProgressSample],
) -> HgsResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)?;
    let seed = seed.to_string();
    for sample in progress {
        let cost = sample.cost.to_string();
        let elapsed = sample.elapsed.as_secs_f64().to_string();
        writer.write_record([instance_name, seed.as_str(), cost.as_str(), elapsed.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
