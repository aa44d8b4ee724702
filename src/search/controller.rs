use std::rc::Rc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

use crate::color::{Color, Coloring, ColoringInstance};
use crate::config::{InitialColoring, RunConfig};
use crate::search::conflicts::{nb_colors, nb_conflicts};
use crate::search::greedy::greedy_coloring;
use crate::search::greedy_dsatur::greedy_dsatur;
use crate::search::reduction::normalize;

/** outcome of an engine for a given color budget k.
Failing to remove every conflict is a normal outcome, not an error.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// color budget
    pub k: usize,
    /// best coloring found (colors smaller than k)
    pub coloring: Coloring,
    /// conflicts of the coloring
    pub nb_conflicts: usize,
    /// distinct colors of the coloring
    pub nb_colors: usize,
}

impl Attempt {
    /// true iff the coloring has no conflict
    pub fn is_feasible(&self) -> bool { self.nb_conflicts == 0 }
}

/** search engine driven by the run controller */
pub trait ColoringEngine {
    /// name displayed in logs and reports
    fn name(&self) -> &str;

    /** searches a coloring with at most k colors, starting from (or seeded by) a coloring
    that may use more than k colors.
    */
    fn attempt(&mut self, inst:Rc<dyn ColoringInstance>, k:usize, seed:&[Color]) -> Attempt;
}

/** what is reported for every attempt */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// color budget
    pub k: usize,
    /// conflicts of the result
    pub nb_conflicts: usize,
    /// distinct colors of the result
    pub nb_colors: usize,
    /// time spent (seconds)
    pub elapsed_secs: f64,
}

/** result of a decremental search */
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    /// attempts in chronological order
    pub attempts: Vec<AttemptRecord>,
    /// best conflict-free coloring and its number of colors
    pub best: Option<(Coloring, usize)>,
    /// true iff the known optimum was reached
    pub reached_optimum: bool,
    /// total time spent (seconds)
    pub elapsed_secs: f64,
}

impl RunResult {
    /// number of colors of the conflict-free attempts, in chronological order
    pub fn successful_ks(&self) -> Vec<usize> {
        self.attempts.iter()
            .filter(|a| a.nb_conflicts == 0)
            .map(|a| a.nb_colors)
            .collect()
    }

    /// number of colors of the best conflict-free coloring
    pub fn best_nb_colors(&self) -> Option<usize> {
        self.best.as_ref().map(|(_,nb)| *nb)
    }
}

/**
Decremental search: starting with k = number of colors of the initial coloring, asks the
engine for a conflict-free coloring with k colors. After each success, restarts from the
result with one color less than it uses. Stops at the first failure, when no color
remains, or when the known optimum is reached.
*/
pub fn decremental_search(
    inst:Rc<dyn ColoringInstance>,
    engine:&mut dyn ColoringEngine,
    initial:&[Color],
    known_optimum:Option<usize>,
) -> RunResult {
    let time_init = Instant::now();
    let mut res = RunResult::default();
    if nb_conflicts(inst.as_ref(), initial) == 0 {
        res.best = Some((normalize(initial), nb_colors(initial)));
    }
    let mut seed:Coloring = initial.to_vec();
    let mut k = nb_colors(initial);
    while k >= 1 {
        info!(engine = engine.name(), k, "trying with {} colors", k);
        let time_attempt = Instant::now();
        let attempt = engine.attempt(inst.clone(), k, &seed);
        let elapsed_secs = time_attempt.elapsed().as_secs_f64();
        info!(
            k, nb_conflicts = attempt.nb_conflicts, nb_colors = attempt.nb_colors,
            elapsed_secs, "attempt finished"
        );
        res.attempts.push(AttemptRecord {
            k,
            nb_conflicts: attempt.nb_conflicts,
            nb_colors: attempt.nb_colors,
            elapsed_secs,
        });
        if !attempt.is_feasible() {
            info!(k, best = ?res.best_nb_colors(), "failed, keeping the previous coloring");
            break;
        }
        let nb = attempt.nb_colors;
        res.best = Some((attempt.coloring.clone(), nb));
        if known_optimum.map_or(false, |opt| nb <= opt) {
            info!(nb_colors = nb, "known optimum reached");
            res.reached_optimum = true;
            break;
        }
        seed = attempt.coloring;
        k = nb - 1;
    }
    res.elapsed_secs = time_init.elapsed().as_secs_f64();
    res
}


/** best, mean and standard deviation of the number of colors of the runs */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// fewest colors over the runs
    pub best: Option<usize>,
    /// mean number of colors
    pub mean: Option<f64>,
    /// sample standard deviation (0 with less than two runs)
    pub std_dev: f64,
}

impl Summary {
    /// computes the statistics over the runs that found a conflict-free coloring
    pub fn from_runs(runs:&[RunResult]) -> Self {
        let values:Vec<f64> = runs.iter()
            .filter_map(|r| r.best_nb_colors())
            .map(|v| v as f64)
            .collect();
        if values.is_empty() { return Self::default(); }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.)).sqrt()
        } else { 0. };
        Self {
            best: runs.iter().filter_map(|r| r.best_nb_colors()).min(),
            mean: Some(mean),
            std_dev,
        }
    }
}

/** results of independent runs, exported by the executables */
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// engine used
    pub engine: String,
    /// instance name
    pub instance: String,
    /// every run, in chronological order
    pub runs: Vec<RunResult>,
    /// statistics over the runs
    pub summary: Summary,
    /// known chromatic number, if any
    pub known_optimum: Option<usize>,
}

impl RunReport {
    /// best conflict-free coloring over the runs
    pub fn best(&self) -> Option<&(Coloring, usize)> {
        self.runs.iter()
            .filter_map(|r| r.best.as_ref())
            .min_by_key(|(_,nb)| *nb)
    }
}

/// builds the initial coloring of a run
pub fn initial_coloring<R:Rng>(inst:&dyn ColoringInstance, initial:InitialColoring, rng:&mut R) -> Coloring {
    match initial {
        InitialColoring::FirstFit { order } => greedy_coloring(inst, order, rng),
        InitialColoring::Dsatur => greedy_dsatur(inst),
    }
}

/**
Performs independent decremental searches, each from a fresh greedy coloring
(first-fit or DSATUR, as configured).
Stops early if a run reaches the known optimum.
*/
pub fn repeated_runs(
    inst:Rc<dyn ColoringInstance>,
    instance_name:&str,
    engine:&mut dyn ColoringEngine,
    config:&RunConfig,
    known_optimum:Option<usize>,
) -> RunReport {
    let mut rng = match config.seed {
        None => StdRng::from_entropy(),
        Some(seed) => StdRng::seed_from_u64(seed),
    };
    let mut runs = Vec::with_capacity(config.nb_runs);
    for run in 0..config.nb_runs {
        let initial = initial_coloring(inst.as_ref(), config.initial, &mut rng);
        info!(run = run+1, nb_colors = nb_colors(&initial), "starting run from a greedy coloring");
        let res = decremental_search(inst.clone(), engine, &initial, known_optimum);
        let reached_optimum = res.reached_optimum;
        runs.push(res);
        if reached_optimum {
            info!(run = run+1, "optimum reached, skipping the remaining runs");
            break;
        }
    }
    let summary = Summary::from_runs(&runs);
    info!(
        engine = engine.name(), best = ?summary.best, mean = ?summary.mean,
        std_dev = summary.std_dev, optimum = ?known_optimum, "runs finished"
    );
    RunReport {
        engine: engine.name().to_string(),
        instance: instance_name.to_string(),
        runs,
        summary,
        known_optimum,
    }
}
