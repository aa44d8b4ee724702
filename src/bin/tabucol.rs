use clap::{App, load_yaml};
use tracing::{error, info};

use metacolor::error::AppError;
use metacolor::search::controller::repeated_runs;
use metacolor::search::tabucol::TabuEngine;
use metacolor::util::{export_results, init_logging, read_params};


fn run() -> Result<(), AppError> {
    // parse arguments
    let yaml = load_yaml!("tabucol.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    let params = read_params(&main_args)?;

    // solve it
    let mut engine = TabuEngine::new(params.config.tabu.clone());
    let report = repeated_runs(
        params.instance.clone(),
        &params.inst_name,
        &mut engine,
        &params.config.run,
        params.known_optimum,
    );
    let stats = serde_json::to_value(&report)?;

    // export results
    match report.best() {
        None => { info!("no conflict-free coloring found"); Ok(()) },
        Some((coloring, nb)) => {
            info!(nb_colors = *nb, "best coloring");
            export_results(&params, coloring, &stats, Some(&report))
        }
    }
}

/** colors an instance using the decremental TABUCOL */
pub fn main() {
    init_logging();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
