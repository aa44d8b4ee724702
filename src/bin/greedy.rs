use std::time::Instant;

use clap::{App, load_yaml};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::{error, info};

use metacolor::error::AppError;
use metacolor::search::conflicts::nb_colors;
use metacolor::config::InitialColoring;
use metacolor::search::greedy::{greedy_coloring, VertexOrder};
use metacolor::search::greedy_dsatur::greedy_dsatur;
use metacolor::util::{export_results, init_logging, read_params};


fn run() -> Result<(), AppError> {
    // parse arguments
    let yaml = load_yaml!("greedy.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    let params = read_params(&main_args)?;
    let mut rng = match params.config.run.seed {
        None => StdRng::from_entropy(),
        Some(seed) => StdRng::seed_from_u64(seed),
    };

    // solve it
    let order = match params.config.run.initial {
        InitialColoring::FirstFit { order } => order,
        InitialColoring::Dsatur => VertexOrder::default(),
    };
    let t_start = Instant::now();
    let first_fit = greedy_coloring(params.instance.as_ref(), order, &mut rng);
    let dsatur = greedy_dsatur(params.instance.as_ref());
    let duration = t_start.elapsed().as_secs_f32();
    let (nb_first_fit, nb_dsatur) = (nb_colors(&first_fit), nb_colors(&dsatur));
    info!(
        order = ?order, first_fit = nb_first_fit, dsatur = nb_dsatur,
        "greedy took {:.3} seconds", duration
    );
    let best = if nb_dsatur <= nb_first_fit { &dsatur } else { &first_fit };
    let stats = json!({
        "primal_list": vec![nb_first_fit, nb_dsatur],
        "nb_colors": nb_colors(best),
        "known_optimum": params.known_optimum,
        "time_searched": duration,
        "inst_name": params.inst_name,
    });

    // export results
    export_results(&params, best, &stats, None)
}

/** colors an instance using the greedy constructors */
pub fn main() {
    init_logging();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
