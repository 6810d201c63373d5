use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use qsim_station::{Experiment, ExperimentConfig, ExperimentSummary, ReplicationResult};

pub(crate) struct OutputPaths {
    pub runs_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// One row of the per-replication table.
#[derive(Serialize)]
struct RunRow {
    rep: usize,
    avg_wait_min: f64,
    p95_wait_min: Option<f64>,
    avg_service_min: f64,
    avg_total_min: f64,
    avg_queue_len: f64,
    utilization_pct: f64,
    throughput_per_hour: f64,
    arrivals: u64,
    completions: u64,
    servers: u32,
    arrival_rate_per_hour: f64,
    service_rate_per_hour: f64,
    hours: f64,
    seed: u64,
}

impl RunRow {
    fn new(rep: usize, result: &ReplicationResult, config: &ExperimentConfig) -> Self {
        let s = &result.summary;
        Self {
            rep,
            avg_wait_min: round(s.avg_wait_min, 4),
            p95_wait_min: s.p95_wait_min.map(|x| round(x, 4)),
            avg_service_min: round(s.avg_service_min, 4),
            avg_total_min: round(s.avg_total_min, 4),
            avg_queue_len: round(s.avg_queue_len, 4),
            utilization_pct: round(s.utilization_pct, 2),
            throughput_per_hour: round(s.throughput_per_hour, 4),
            arrivals: s.arrivals,
            completions: s.completions,
            servers: config.station.servers,
            arrival_rate_per_hour: config.station.arrival_rate_per_hour,
            service_rate_per_hour: config.station.service_rate_per_hour,
            hours: config.station.hours,
            seed: result.seed,
        }
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    #[serde(flatten)]
    summary: &'a ExperimentSummary,
    parameters: &'a ExperimentConfig,
    wall_clock_seconds: Option<f64>,
}

fn round(x: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (x * scale).round() / scale
}

/// Writes the per-replication table and the aggregate summary under `root`.
pub(crate) fn save_experiment(
    root: &Path,
    config: &ExperimentConfig,
    experiment: &Experiment,
) -> Result<OutputPaths, Box<dyn std::error::Error>> {
    let run_dir = root.join("runs").join(&config.experiment_name);
    let summary_dir = root.join("summary");
    fs::create_dir_all(&run_dir)?;
    fs::create_dir_all(&summary_dir)?;

    let runs_csv = run_dir.join("runs.csv");
    let mut wtr = csv::Writer::from_path(&runs_csv)?;
    for (i, result) in experiment.results.iter().enumerate() {
        wtr.serialize(RunRow::new(i + 1, result, config))?;
    }
    wtr.flush()?;

    let summary = &experiment.summary;
    let wall_clock_seconds = summary.wall_clock_seconds().map(|s| round(s, 3));

    let summary_csv = summary_dir.join(format!("{}.csv", config.experiment_name));
    let mut wtr = csv::Writer::from_path(&summary_csv)?;
    let fields: [(&str, String); 12] = [
        ("replications", summary.replications.to_string()),
        ("avg_wait_min", summary.avg_wait_min.to_string()),
        ("p95_wait_min", summary.p95_wait_min.map(|x| x.to_string()).unwrap_or_default()),
        ("avg_service_min", summary.avg_service_min.to_string()),
        ("avg_total_min", summary.avg_total_min.to_string()),
        ("avg_queue_len", summary.avg_queue_len.to_string()),
        ("utilization_pct", summary.utilization_pct.to_string()),
        ("throughput_per_hour", summary.throughput_per_hour.to_string()),
        ("arrivals", summary.arrivals.to_string()),
        ("completions", summary.completions.to_string()),
        ("servers", config.station.servers.to_string()),
        ("wall_clock_seconds", wall_clock_seconds.map(|x| x.to_string()).unwrap_or_default()),
    ];
    for (key, value) in fields {
        wtr.write_record([key, value.as_str()])?;
    }
    wtr.flush()?;

    let summary_json = summary_dir.join(format!("{}.json", config.experiment_name));
    let output = SummaryOutput {
        summary,
        parameters: config,
        wall_clock_seconds,
    };
    File::create(&summary_json)?.write_all(serde_json::to_string_pretty(&output)?.as_bytes())?;

    Ok(OutputPaths {
        runs_csv,
        summary_csv,
        summary_json,
    })
}
