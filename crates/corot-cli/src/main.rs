use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use corot_core::{ModeTimeSeries, Quaternion, angular_velocity, corotating_frame, mode_count};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "corot", about = "Corotating-frame and angular-velocity tool for mode series")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a waveform file
    Info {
        /// Input waveform JSON
        input: PathBuf,
    },

    /// Compute the angular-velocity field
    Omega {
        /// Input waveform JSON
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Compute the corotating frame
    Frame {
        /// Input waveform JSON
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Absolute integration tolerance
        #[arg(long, default_value_t = corot_core::DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Align the averaged dominant eigenvector with z over this
        /// fractional window of the inspiral, e.g. --align 0.1 0.9
        #[arg(long, num_args = 2, value_names = ["F1", "F2"])]
        align: Option<Vec<f64>>,
    },
}

/// On-disk waveform: complex entries as [re, im] pairs, one row of modes
/// per time sample. `data_dot` is optional; without it the derivative is
/// computed by finite differences.
#[derive(Deserialize)]
struct WaveformFile {
    t: Vec<f64>,
    ell_min: i64,
    ell_max: i64,
    data: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    data_dot: Option<Vec<Vec<[f64; 2]>>>,
}

#[derive(Serialize)]
struct OmegaOutput {
    t: Vec<f64>,
    omega: Vec<[f64; 3]>,
}

#[derive(Serialize)]
struct FrameOutput {
    t: Vec<f64>,
    frame: Vec<[f64; 4]>,
}

fn flatten(rows: &[Vec<[f64; 2]>], n_times: usize, n_modes: usize) -> Result<Vec<Complex64>> {
    if rows.len() != n_times {
        bail!("{} data rows for {} time samples", rows.len(), n_times);
    }
    let mut flat = Vec::with_capacity(n_times * n_modes);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_modes {
            bail!("row {i} has {} modes, expected {n_modes}", row.len());
        }
        flat.extend(row.iter().map(|&[re, im]| Complex64::new(re, im)));
    }
    Ok(flat)
}

fn load_waveform(path: &Path) -> Result<ModeTimeSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: WaveformFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let n_times = file.t.len();
    let n_modes = mode_count(file.ell_min, file.ell_max);
    let data = flatten(&file.data, n_times, n_modes)?;
    let w = match &file.data_dot {
        Some(rows) => ModeTimeSeries::with_data_dot(
            file.t,
            file.ell_min,
            file.ell_max,
            data,
            flatten(rows, n_times, n_modes)?,
        )?,
        None => ModeTimeSeries::new(file.t, file.ell_min, file.ell_max, data)?,
    };
    tracing::debug!(
        n_times = w.n_times(),
        n_modes = w.n_modes(),
        "loaded waveform"
    );
    Ok(w)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, value)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<()> {
    let w = load_waveform(input)?;
    println!("samples:       {}", w.n_times());
    println!("modes:         {} (ell {}..{})", w.n_modes(), w.ell_min(), w.ell_max());
    println!("time span:     [{}, {}]", w.t()[0], w.t()[w.n_times() - 1]);
    println!("max norm time: {}", w.max_norm_time());
    Ok(())
}

fn cmd_omega(input: &Path, output: Option<&Path>) -> Result<()> {
    let w = load_waveform(input)?;
    let omega = angular_velocity(&w).context("angular-velocity solve failed")?;
    let out = OmegaOutput {
        t: w.t().to_vec(),
        omega: omega.iter().map(|v| [v.x, v.y, v.z]).collect(),
    };
    write_json(&out, output)
}

fn cmd_frame(
    input: &Path,
    output: Option<&Path>,
    tolerance: f64,
    align: Option<&[f64]>,
) -> Result<()> {
    let w = load_waveform(input)?;
    let region = align.map(|f| (f[0], f[1]));
    let frame = corotating_frame(&w, Quaternion::identity(), tolerance, region)
        .context("corotating-frame construction failed")?;
    let out = FrameOutput {
        t: w.t().to_vec(),
        frame: frame.iter().map(|r| [r.w, r.x, r.y, r.z]).collect(),
    };
    write_json(&out, output)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Info { input } => cmd_info(input),
        Commands::Omega { input, output } => cmd_omega(input, output.as_deref()),
        Commands::Frame {
            input,
            output,
            tolerance,
            align,
        } => cmd_frame(input, output.as_deref(), *tolerance, align.as_deref()),
    }
}
