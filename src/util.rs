use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::ArgMatches;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    color::{checker, coloring_to_solution, CheckerResult, Color, ColoringInstance},
    compact_instance::CompactInstance,
    config::SolverConfig,
    dimacs::write_solution,
    error::AppError,
    search::controller::RunReport,
};

/** installs the log subscriber (RUST_LOG, "info" by default) */
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/** values read from the command line */
#[derive(Debug)]
pub struct Params {
    /// instance name (file name without extension)
    pub inst_name: String,
    /// instance
    pub instance: Rc<dyn ColoringInstance>,
    /// solver configuration (defaults, overridden by the configuration file and the arguments)
    pub config: SolverConfig,
    /// known chromatic number of the instance, if any
    pub known_optimum: Option<usize>,
    /// where to write the best solution
    pub sol_file: Option<String>,
    /// where to write the statistics (JSON)
    pub perf_file: Option<String>,
    /// where to write the statistics (CSV)
    pub csv_file: Option<String>,
    /// where to write the colored graph (Graphviz)
    pub dot_file: Option<String>,
}

/// instance name of a path ("insts/myciel3.col" -> "myciel3")
pub fn instance_name<P:AsRef<Path>>(path:P) -> String {
    path.as_ref().file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn parse_arg<T:std::str::FromStr>(main_args:&ArgMatches, name:&str) -> Result<Option<T>, AppError> {
    match main_args.value_of(name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| AppError::InvalidArgument {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/** reads the command line input: loads the instance, the configuration and the known optimum */
pub fn read_params(main_args:&ArgMatches) -> Result<Params, AppError> {
    let inst_filename = main_args.value_of("instance").unwrap_or_default();
    let inst_name = instance_name(inst_filename);
    // read the configuration
    let mut config = match main_args.value_of("config") {
        None => SolverConfig::default(),
        Some(filename) => {
            info!("reading configuration from {}", filename);
            SolverConfig::from_file(filename)?
        }
    };
    if let Some(seed) = parse_arg::<u64>(main_args, "seed")? { config.run.seed = Some(seed); }
    if let Some(nb_runs) = parse_arg::<usize>(main_args, "runs")? { config.run.nb_runs = nb_runs; }
    config.validate()?;
    // read the known optimum
    let known_optimum = match main_args.value_of("optima") {
        None => None,
        Some(filename) => {
            let optima = read_known_optima(filename)?;
            let res = optima.get(&inst_name).copied();
            match res {
                None => warn!("no known optimum for {} in {}", inst_name, filename),
                Some(opt) => info!("known optimum for {}: {}", inst_name, opt),
            }
            res
        }
    };
    let output = |name:&str| main_args.value_of(name).map(|e| {
        info!("printing {} in: {}", name, e);
        e.to_string()
    });
    let sol_file = output("solution");
    let perf_file = output("perf");
    let csv_file = output("csv");
    let dot_file = output("dot");
    // read instance file
    let instance:Rc<dyn ColoringInstance> = Rc::new(CompactInstance::from_file(inst_filename)?);
    println!("instance {}:", inst_name);
    instance.display_statistics();
    println!("=======================");
    Ok(Params { inst_name, instance, config, known_optimum, sol_file, perf_file, csv_file, dot_file })
}

/** parses a known optima table: a header row, then `name,value` records */
pub fn parse_known_optima(content:&str) -> Result<HashMap<String, usize>, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());
    let mut res = HashMap::new();
    for record in reader.deserialize::<(String, usize)>() {
        let (name, value) = record.map_err(|e| AppError::KnownOptima {
            line: e.position().map_or(0, |p| p.line() as usize),
            msg: e.to_string(),
        })?;
        res.insert(name, value);
    }
    Ok(res)
}

/** reads a known optima file */
pub fn read_known_optima<P:AsRef<Path>>(filename:P) -> Result<HashMap<String, usize>, AppError> {
    let path = filename.as_ref();
    let content = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(), source
    })?;
    parse_known_optima(&content)
}

/** writes a report as CSV: one row per attempt (`run,k,conflicts,colors,elapsed`), then the
summary rows (`best`, `mean`, `std_dev` and `optimum` when known).
*/
pub fn write_report_csv<W:io::Write>(report:&RunReport, out:W) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
    writer.write_record(["run", "k", "conflicts", "colors", "elapsed"])?;
    for (i,run) in report.runs.iter().enumerate() {
        for attempt in &run.attempts {
            writer.write_record(&[
                (i+1).to_string(),
                attempt.k.to_string(),
                attempt.nb_conflicts.to_string(),
                attempt.nb_colors.to_string(),
                format!("{:.3}", attempt.elapsed_secs),
            ])?;
        }
    }
    if let Some(best) = report.summary.best { writer.write_record(&["best".to_string(), best.to_string()])?; }
    if let Some(mean) = report.summary.mean { writer.write_record(&["mean".to_string(), format!("{:.2}", mean)])?; }
    writer.write_record(&["std_dev".to_string(), format!("{:.2}", report.summary.std_dev)])?;
    if let Some(opt) = report.known_optimum { writer.write_record(&["optimum".to_string(), opt.to_string()])?; }
    writer.flush()?;
    Ok(())
}

/** Graphviz representation of a colored graph (colors are cycled over a 12-color scheme) */
pub fn to_dot(inst:&dyn ColoringInstance, coloring:&[Color]) -> String {
    let mut res = String::from("graph coloring {\n\tnode [style=filled, colorscheme=set312];\n");
    for v in inst.vertices() {
        let _ = writeln!(res, "\t{} [label=\"{}\", fillcolor={}];", v, v, coloring[v] % 12 + 1);
    }
    for (u,v) in inst.edges() {
        if coloring[*u] == coloring[*v] {
            let _ = writeln!(res, "\t{} -- {} [color=red, penwidth=2];", u, v);
        } else {
            let _ = writeln!(res, "\t{} -- {};", u, v);
        }
    }
    res += "}\n";
    res
}

fn write_file(filename:&str, content:&str) -> Result<(), AppError> {
    fs::write(filename, content).map_err(|source| AppError::Io { path: PathBuf::from(filename), source })
}

/// exports search results to files
pub fn export_results(
    params:&Params,
    coloring:&[Color],
    stats:&Value,
    report:Option<&RunReport>,
) -> Result<(), AppError> {
    let instance = params.instance.as_ref();
    // export statistics
    if let Some(filename) = &params.perf_file {
        write_file(filename, &serde_json::to_string_pretty(stats)?)?;
    }
    if let (Some(filename), Some(report)) = (&params.csv_file, report) {
        let file = fs::File::create(filename).map_err(|source| AppError::Io {
            path: PathBuf::from(filename), source
        })?;
        write_report_csv(report, file)?;
    }
    // export solution
    if let Some(filename) = &params.sol_file {
        let solution = coloring_to_solution(coloring);
        match checker(instance, &solution) {
            CheckerResult::Ok(_) => {},
            checker_result => warn!("invalid solution (reason: {:?})", checker_result),
        };
        write_solution(filename, &solution).map_err(|source| AppError::Io {
            path: PathBuf::from(filename), source
        })?;
    }
    if let Some(filename) = &params.dot_file {
        write_file(filename, &to_dot(instance, coloring))?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::search::controller::{AttemptRecord, RunResult, Summary};

    #[test]
    fn test_instance_name() {
        assert_eq!(instance_name("insts/myciel3.col"), "myciel3");
        assert_eq!(instance_name("queen5_5"), "queen5_5");
    }

    #[test]
    fn test_known_optima() {
        let optima = read_known_optima("insts/known_optima.csv").unwrap();
        assert_eq!(optima.get("myciel3"), Some(&4));
        assert_eq!(optima.get("queen5_5"), Some(&5));
        assert_eq!(optima.get("unknown"), None);
        assert!(matches!(
            parse_known_optima("instance,optimum\nmyciel3,four\n"),
            Err(AppError::KnownOptima { line: 2, .. })
        ));
        assert!(matches!(
            parse_known_optima("instance,optimum\nmyciel3;4\n"),
            Err(AppError::KnownOptima { .. })
        ));
        assert!(matches!(read_known_optima("insts/missing.csv"), Err(AppError::Io { .. })));
    }

    #[test]
    fn test_known_optima_quoted_names() {
        let optima = parse_known_optima("instance,optimum\n\"le450,25c\",25\n myciel3 , 4 \n\n").unwrap();
        assert_eq!(optima.len(), 2);
        assert_eq!(optima.get("le450,25c"), Some(&25));
        assert_eq!(optima.get("myciel3"), Some(&4));
    }

    #[test]
    fn test_csv_layout() {
        let record = |k, nb_conflicts, nb_colors| AttemptRecord { k, nb_conflicts, nb_colors, elapsed_secs: 0.5 };
        let runs = vec![
            RunResult {
                attempts: vec![record(7,0,7), record(6,0,6), record(5,3,5)],
                best: Some((vec![], 6)),
                ..Default::default()
            },
            RunResult {
                attempts: vec![record(8,0,8), record(7,1,7)],
                best: Some((vec![], 8)),
                ..Default::default()
            },
            RunResult { attempts: vec![record(4,3,4)], ..Default::default() },
        ];
        let report = RunReport {
            engine: "tabucol".to_string(),
            instance: "test".to_string(),
            summary: Summary::from_runs(&runs),
            runs,
            known_optimum: Some(5),
        };
        let mut buffer = Vec::new();
        write_report_csv(&report, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "run,k,conflicts,colors,elapsed\n\
            1,7,0,7,0.500\n1,6,0,6,0.500\n1,5,3,5,0.500\n\
            2,8,0,8,0.500\n2,7,1,7,0.500\n\
            3,4,3,4,0.500\n\
            best,6\nmean,7.00\nstd_dev,1.41\noptimum,5\n"
        );
    }

    #[test]
    fn test_to_dot() {
        let inst = CompactInstance::from_file("insts/grid2x2.col").unwrap();
        let dot = to_dot(&inst, &[0,1,1,1]);
        assert!(dot.starts_with("graph coloring {"));
        assert!(dot.contains("\t0 [label=\"0\", fillcolor=1];"));
        assert!(dot.contains("\t0 -- 1;"));
        assert!(dot.contains("\t1 -- 3 [color=red, penwidth=2];"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
