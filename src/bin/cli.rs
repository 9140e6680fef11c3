//! critmass CLI - crowd length from logger snapshots
//!
//! Usage:
//!   critmass-cli run <files...> [--city <name>] [--output <file>]
//!   critmass-cli batch <folder> [--output <file>]
//!   critmass-cli cities
//!
//! `run` merges the given snapshots into one point set; `batch` treats every
//! file as an independent snapshot and writes one summary row per file.

use clap::{Args, Parser, Subcommand};
use critmass::batch::{collect_input_files, process_files, BatchRecord};
use critmass::io::load_merged;
use critmass::{BoundingBox, City, MassMetrics, MassResult, Pipeline, PipelineConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "critmass-cli")]
#[command(about = "Measure the length of a crowd ride from GPS snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute clusters and the crowd length for one (merged) snapshot
    Run {
        /// Snapshot JSON file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the JSON summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Process every snapshot in a folder independently
    Batch {
        /// Folder containing snapshot files
        folder: PathBuf,

        /// File extensions to include
        #[arg(long, default_values_t = vec!["json".to_string(), "txt".to_string()])]
        ext: Vec<String>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process files on all cores (needs the `parallel` feature)
        #[arg(long)]
        parallel: bool,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// List bounding-box presets
    Cities,
}

/// Overrides applied on top of the config file (or defaults).
#[derive(Args)]
struct Tuning {
    /// JSON config file (partial configs are fine)
    #[arg(long)]
    config: Option<PathBuf>,

    /// City preset for the bounding box
    #[arg(long)]
    city: Option<String>,

    /// Bounding box, all four edges together
    #[arg(long, requires_all = ["lat_max", "lon_min", "lon_max"])]
    lat_min: Option<f64>,
    #[arg(long, requires_all = ["lat_min", "lon_min", "lon_max"])]
    lat_max: Option<f64>,
    #[arg(long, requires_all = ["lat_min", "lat_max", "lon_max"])]
    lon_min: Option<f64>,
    #[arg(long, requires_all = ["lat_min", "lat_max", "lon_min"])]
    lon_max: Option<f64>,

    /// Neighbor index for the outlier filter
    #[arg(long)]
    k: Option<usize>,

    /// MAD multiplier for the outlier filter
    #[arg(long)]
    n_sigmas: Option<f64>,

    /// Edge length (m) after which the long-edge penalty applies
    #[arg(long)]
    l0: Option<f64>,

    /// Extra cost per meter beyond L0
    #[arg(long)]
    penalty_factor: Option<f64>,

    /// Turn cost in meters per radian
    #[arg(long)]
    angle_bias: Option<f64>,

    /// Flat cost per hop in meters
    #[arg(long)]
    step_penalty: Option<f64>,

    /// Minimum cost per hop in meters
    #[arg(long)]
    min_edge_cost: Option<f64>,

    /// Ignore fixes older than this many seconds before the newest fix
    #[arg(long)]
    max_age: Option<i64>,
}

impl Tuning {
    fn to_config(&self) -> critmass::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(city) = &self.city {
            config.bounds = Some(City::preset(city)?.bounds);
        }
        if let (Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)) =
            (self.lat_min, self.lat_max, self.lon_min, self.lon_max)
        {
            config.bounds = Some(BoundingBox::new(lat_min, lat_max, lon_min, lon_max));
        }
        if let Some(k) = self.k {
            config.filter.k = k;
        }
        if let Some(n) = self.n_sigmas {
            config.filter.n_sigmas = n;
        }
        if let Some(l0) = self.l0 {
            config.graph.l0_m = l0;
        }
        if let Some(p) = self.penalty_factor {
            config.graph.penalty_factor = p;
        }
        if let Some(a) = self.angle_bias {
            config.routing.angle_bias_m_per_rad = a;
        }
        if let Some(s) = self.step_penalty {
            config.routing.step_penalty_m = s;
        }
        if let Some(m) = self.min_edge_cost {
            config.routing.min_edge_cost_m = m;
        }
        if self.max_age.is_some() {
            config.max_fix_age_s = self.max_age;
        }

        config.validate()?;
        Ok(config)
    }
}

/// JSON summary of a single run.
#[derive(Serialize)]
struct RunSummary {
    metrics: MassMetrics,
    cluster_sizes: Vec<usize>,
    /// Path as [longitude, latitude] pairs
    path: Vec<[f64; 2]>,
    outliers: Vec<String>,
}

impl RunSummary {
    fn from_result(result: &MassResult) -> Self {
        Self {
            metrics: result.metrics(),
            cluster_sizes: result.cluster_sizes(),
            path: result.path_line().coords().map(|c| [c.x, c.y]).collect(),
            outliers: result.outliers.iter().map(|f| f.id.clone()).collect(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Run {
            files,
            output,
            tuning,
        } => run_single(&files, output.as_deref(), &tuning),
        Commands::Batch {
            folder,
            ext,
            output,
            parallel,
            tuning,
        } => run_batch(&folder, &ext, output.as_deref(), parallel, &tuning),
        Commands::Cities => {
            for name in City::names() {
                if let Ok(city) = City::preset(name) {
                    let b = city.bounds;
                    println!(
                        "{:<10} lat [{:.2}, {:.2}]  lon [{:.2}, {:.2}]",
                        name, b.min_lat, b.max_lat, b.min_lng, b.max_lng
                    );
                }
            }
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_single(files: &[PathBuf], output: Option<&Path>, tuning: &Tuning) -> Result<(), String> {
    let config = tuning.to_config().map_err(|e| e.to_string())?;
    let fixes = load_merged(files).map_err(|e| e.to_string())?;
    log::info!("Loaded {} fixes from {} file(s)", fixes.len(), files.len());

    let result = Pipeline::new(config).run(&fixes).map_err(|e| e.to_string())?;

    println!("\n{}", "=".repeat(60));
    println!("CROWD MASS");
    println!("{}", "=".repeat(60));
    let m = result.metrics();
    println!("  Fixes:            {} ({} after pre-filters)", m.n_input, m.n_bbox);
    println!("  Inliers:          {} ({} outliers)", m.n_filtered, m.n_outliers);
    println!("  Clusters:         {} (largest {})", m.n_clusters, m.largest_cluster_size);
    println!("  Radius:           {:.1}m", m.connection_radius_m);
    println!("  Length:           {:.2}km", m.length_m / 1000.0);

    write_json(&RunSummary::from_result(&result), output)
}

fn run_batch(
    folder: &Path,
    extensions: &[String],
    output: Option<&Path>,
    parallel: bool,
    tuning: &Tuning,
) -> Result<(), String> {
    let config = tuning.to_config().map_err(|e| e.to_string())?;
    let exts: Vec<&str> = extensions.iter().map(String::as_str).collect();
    let files = collect_input_files(folder, &exts).map_err(|e| e.to_string())?;
    if files.is_empty() {
        return Err(format!(
            "No files matched in {} with extensions {:?}",
            folder.display(),
            extensions
        ));
    }

    let records = if parallel {
        process_parallel(&files, &config)
    } else {
        process_files(&files, &config)
    };

    for (i, r) in records.iter().enumerate() {
        match &r.error {
            None => println!(
                "  [{}/{}] {} - {:.2}km, largest cluster {}",
                i + 1,
                records.len(),
                r.file.display(),
                r.metrics.length_m / 1000.0,
                r.metrics.largest_cluster_size
            ),
            Some(e) => println!("  [{}/{}] {} - ERROR: {}", i + 1, records.len(), r.file.display(), e),
        }
    }

    write_json(&records, output)
}

#[cfg(feature = "parallel")]
fn process_parallel(files: &[PathBuf], config: &PipelineConfig) -> Vec<BatchRecord> {
    critmass::batch::process_files_parallel(files, config)
}

#[cfg(not(feature = "parallel"))]
fn process_parallel(files: &[PathBuf], config: &PipelineConfig) -> Vec<BatchRecord> {
    log::warn!("Built without the `parallel` feature, processing sequentially");
    process_files(files, config)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), String> {
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value).map_err(|e| e.to_string())?;
            writer.flush().map_err(|e| e.to_string())?;
            println!("\nWrote {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
            println!("{json}");
        }
    }
    Ok(())
}
