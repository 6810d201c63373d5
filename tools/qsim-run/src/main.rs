mod output;
mod plot;

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use env_logger::Builder;

use qsim_station::analytic::mmc_metrics;
use qsim_station::{run_experiment_n_workers, ExperimentConfig, ExperimentSummary};

use crate::output::save_experiment;
use crate::plot::plot_sweep;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs replicated experiments with the M/M/c service station model
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs all replications of one configuration
    Run(Common),
    /// Runs the configuration once per server count and plots the results
    Sweep {
        #[command(flatten)]
        common: Common,

        /// Server counts to try
        #[arg(short, long, value_delimiter = ',', default_values_t = vec![1, 2, 3, 4])]
        servers: Vec<u32>,
    },
}

#[derive(Args, Debug)]
struct Common {
    /// Path to JSON or YAML file with experiment configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Directory for produced results
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Number of threads to use (default - use all available cores)
    #[arg(short, long, default_value_t = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))]
    threads: usize,
}

fn load_config(path: &Path) -> Result<ExperimentConfig, Box<dyn Error>> {
    let data = std::fs::read_to_string(path).map_err(|e| format!("can't read file {}: {}", path.display(), e))?;
    let config: ExperimentConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&data)?,
        _ => serde_json::from_str(&data)?,
    };
    Ok(config)
}

fn run_one_config(config: &ExperimentConfig, common: &Common) -> Result<ExperimentSummary, Box<dyn Error>> {
    println!(
        "Experiment: {}  |  replications: {}",
        config.experiment_name, config.replications
    );
    let experiment = run_experiment_n_workers(
        &config.station,
        config.replications,
        config.seed_base,
        common.threads,
    )?;
    for (i, result) in experiment.results.iter().enumerate() {
        println!(
            "  rep {}/{}  avg_wait={:.4} min  util={:.2}%",
            i + 1,
            config.replications,
            result.summary.avg_wait_min,
            result.summary.utilization_pct
        );
    }
    let paths = save_experiment(&common.output, config, &experiment)?;

    println!("\n--- Summary ---");
    println!("Saved per-rep CSV:   {}", paths.runs_csv.display());
    println!("Saved summary CSV:   {}", paths.summary_csv.display());
    println!("Saved summary JSON:  {}", paths.summary_json.display());
    if let Some(seconds) = experiment.summary.wall_clock_seconds() {
        println!("Wall clock seconds:  {:.3}", seconds);
    }
    let station = &config.station;
    if let Some(reference) = mmc_metrics(
        station.arrival_rate_per_hour,
        station.service_rate_per_hour,
        station.servers,
    ) {
        println!(
            "M/M/c reference:     util={:.1}%  Wq={:.2} min  W={:.2} min  (simulated: util={:.1}%  Wq={:.2} min  W={:.2} min)",
            reference.utilization_pct,
            reference.wait_min,
            reference.total_min,
            experiment.summary.utilization_pct,
            experiment.summary.avg_wait_min,
            experiment.summary.avg_total_min
        );
    }
    Ok(experiment.summary)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Run(common) => {
            let config = load_config(&common.config)?;
            run_one_config(&config, &common)?;
        }
        Command::Sweep { common, servers } => {
            let base = load_config(&common.config)?;
            let mut points = Vec::with_capacity(servers.len());
            for &c in &servers {
                let mut config = base.clone();
                config.experiment_name = format!("{}_c{}", base.experiment_name, c);
                config.station.servers = c;
                let summary = run_one_config(&config, &common)?;
                points.push((c, summary));
                println!();
            }
            let chart = common
                .output
                .join("summary")
                .join(format!("{}_sweep.png", base.experiment_name));
            plot_sweep(&chart, &points)?;
            println!("Saved sweep chart:   {}", chart.display());
        }
    }
    Ok(())
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
