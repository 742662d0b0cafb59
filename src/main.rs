use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use std::path::PathBuf;

use predator_prey_common::{ArchiveFormat, SimulationConfig};
use predator_prey_engine::{save_snapshot_archive, FileSink, Landscape, PredatorPreySimulation};

/// Command-line arguments. Every flag overrides the matching value of `--config`,
/// which in turn overrides the built-in defaults.
#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate hare and puma populations on a landscape", long_about = None)]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input landscape file
    #[arg(short = 'f', long)]
    landscape_file: Option<PathBuf>,

    /// Birth rate of hares [default: 0.08]
    #[arg(short = 'r', long)]
    birth_hares: Option<f64>,

    /// Rate at which pumas eat hares [default: 0.04]
    #[arg(short = 'a', long)]
    death_hares: Option<f64>,

    /// Diffusion rate of hares [default: 0.2]
    #[arg(short = 'k', long)]
    diffusion_hares: Option<f64>,

    /// Birth rate of pumas [default: 0.02]
    #[arg(short = 'b', long)]
    birth_pumas: Option<f64>,

    /// Rate at which pumas starve [default: 0.06]
    #[arg(short = 'm', long)]
    death_pumas: Option<f64>,

    /// Diffusion rate of pumas [default: 0.2]
    #[arg(short = 'l', long)]
    diffusion_pumas: Option<f64>,

    /// Time step size [default: 0.4]
    #[arg(long)]
    delta_t: Option<f64>,

    /// Number of time steps between outputs [default: 10]
    #[arg(short = 't', long)]
    time_step: Option<u64>,

    /// Simulated time to run for [default: 500]
    #[arg(short = 'd', long)]
    duration: Option<f64>,

    /// Random seed for initial hare densities, 0 for no hares [default: 1]
    #[arg(long)]
    hare_seed: Option<u64>,

    /// Random seed for initial puma densities, 0 for no pumas [default: 1]
    #[arg(long)]
    puma_seed: Option<u64>,

    /// Directory receiving averages.csv and the map files [default: .]
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Do not write per-report PPM map files
    #[arg(long)]
    no_maps: bool,

    /// Also save all snapshots as json, bincode or messagepack
    #[arg(long)]
    format: Option<ArchiveFormat>,
}

impl Args {
    /// Builds the effective configuration: defaults, then `--config`, then flags.
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };

        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut config.hares.birth_rate, self.birth_hares);
        set(&mut config.hares.predation_rate, self.death_hares);
        set(&mut config.hares.diffusion_rate, self.diffusion_hares);
        set(&mut config.hares.seed, self.hare_seed);
        set(&mut config.pumas.birth_rate, self.birth_pumas);
        set(&mut config.pumas.starvation_rate, self.death_pumas);
        set(&mut config.pumas.diffusion_rate, self.diffusion_pumas);
        set(&mut config.pumas.seed, self.puma_seed);
        set(&mut config.timing.dt, self.delta_t);
        set(&mut config.timing.report_interval_steps, self.time_step);
        set(&mut config.timing.duration, self.duration);
        set(&mut config.output.directory, self.output_dir);
        if self.landscape_file.is_some() {
            config.landscape.file = self.landscape_file;
        }
        if self.format.is_some() {
            config.output.format = self.format;
        }
        if self.no_maps {
            config.output.write_maps = false;
        }

        Ok(config)
    }
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    info!("Starting predator-prey simulation...");

    // --- Load Configuration ---
    let config = args.into_config()?;
    let params = config.sim_params().context("Invalid simulation parameters")?;

    // --- Load Landscape ---
    let landscape_file = config
        .landscape
        .file
        .as_ref()
        .context("No landscape file given (use --landscape-file or [landscape] file)")?;
    let landscape = Landscape::load(landscape_file)
        .with_context(|| format!("Failed to load landscape '{}'", landscape_file.display()))?;
    info!("Width: {} Height: {}", landscape.width(), landscape.height());
    info!("Number of land-only squares: {}", landscape.land_cell_count());

    // --- Run ---
    let mut sim = PredatorPreySimulation::new(params, landscape);
    let mut sink = FileSink::new(&config.output);
    sim.run(&mut sink).context("Simulation aborted")?;

    // --- Save Recorded Data ---
    save_snapshot_archive(sim.get_recorded_snapshots(), &config.output)
        .context("Failed to save snapshot archive")?;

    info!("Simulation Complete.");
    Ok(())
}
