use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::error::SimulationError;
use crate::sim_params::SimParams;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// Hare population parameters
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct HareConfig {
    #[serde(default = "default_hare_birth_rate")]
    pub birth_rate: f64,
    #[serde(default = "default_hare_predation_rate")]
    pub predation_rate: f64, // Rate at which pumas eat hares
    #[serde(default = "default_diffusion_rate")]
    pub diffusion_rate: f64,
    #[serde(default = "default_seed")]
    pub seed: u64, // 0 = no hares
}

// Puma population parameters
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PumaConfig {
    #[serde(default = "default_puma_birth_rate")]
    pub birth_rate: f64,
    #[serde(default = "default_puma_starvation_rate")]
    pub starvation_rate: f64,
    #[serde(default = "default_diffusion_rate")]
    pub diffusion_rate: f64,
    #[serde(default = "default_seed")]
    pub seed: u64, // 0 = no pumas
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_duration")]
    pub duration: f64, // Simulated time units, not steps
    #[serde(default = "default_report_interval_steps")]
    pub report_interval_steps: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct LandscapeConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Serialization used for the end-of-run snapshot archive.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Json,
    Bincode,
    MessagePack,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Json => "json",
            ArchiveFormat::Bincode => "bin",
            ArchiveFormat::MessagePack => "msgpack",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ArchiveFormat::Json),
            "bincode" => Ok(ArchiveFormat::Bincode),
            "messagepack" | "msgpack" => Ok(ArchiveFormat::MessagePack),
            other => Err(SimulationError::InvalidParameter(format!(
                "unknown archive format '{}' (expected json, bincode or messagepack)",
                other
            ))),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveFormat::Json => "json",
            ArchiveFormat::Bincode => "bincode",
            ArchiveFormat::MessagePack => "messagepack",
        };
        f.write_str(name)
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_averages_filename")]
    pub averages_filename: String,
    #[serde(default = "default_write_maps")]
    pub write_maps: bool,
    #[serde(default = "default_base_filename")]
    pub base_filename: String, // Prefix of the snapshot archive
    #[serde(default)]
    pub format: Option<ArchiveFormat>, // None = no archive
}

// Main simulation configuration structure, loaded from a TOML file.
// Every section may be omitted; missing values fall back to the defaults below.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub hares: HareConfig,
    #[serde(default)]
    pub pumas: PumaConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub landscape: LandscapeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for HareConfig {
    fn default() -> Self {
        HareConfig {
            birth_rate: default_hare_birth_rate(),
            predation_rate: default_hare_predation_rate(),
            diffusion_rate: default_diffusion_rate(),
            seed: default_seed(),
        }
    }
}

impl Default for PumaConfig {
    fn default() -> Self {
        PumaConfig {
            birth_rate: default_puma_birth_rate(),
            starvation_rate: default_puma_starvation_rate(),
            diffusion_rate: default_diffusion_rate(),
            seed: default_seed(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            dt: default_dt(),
            duration: default_duration(),
            report_interval_steps: default_report_interval_steps(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: default_output_directory(),
            averages_filename: default_averages_filename(),
            write_maps: default_write_maps(),
            base_filename: default_base_filename(),
            format: None,
        }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    ///
    /// Only syntax is checked here; ranges are checked by [`Self::sim_params`]
    /// once command-line overrides have been applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Validates the configuration and converts it into the parameters used at runtime.
    pub fn sim_params(&self) -> Result<SimParams, SimulationError> {
        let rates = [
            ("hares.birth_rate", self.hares.birth_rate),
            ("hares.predation_rate", self.hares.predation_rate),
            ("hares.diffusion_rate", self.hares.diffusion_rate),
            ("pumas.birth_rate", self.pumas.birth_rate),
            ("pumas.starvation_rate", self.pumas.starvation_rate),
            ("pumas.diffusion_rate", self.pumas.diffusion_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} must be a finite, non-negative number (got {})", name, value)));
            }
        }

        let dt = self.timing.dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(invalid(format!("timing.dt must be positive (got {})", dt)));
        }
        let duration = self.timing.duration;
        if !duration.is_finite() || duration < 0.0 {
            return Err(invalid(format!("timing.duration must be non-negative (got {})", duration)));
        }
        if self.timing.report_interval_steps == 0 {
            return Err(invalid("timing.report_interval_steps must be at least 1"));
        }

        let total_steps = (duration / dt).floor();
        if total_steps > u64::MAX as f64 {
            return Err(invalid(format!("duration / dt is too large ({})", total_steps)));
        }

        Ok(SimParams {
            hare_birth_rate: self.hares.birth_rate,
            hare_predation_rate: self.hares.predation_rate,
            hare_diffusion_rate: self.hares.diffusion_rate,
            hare_seed: self.hares.seed,
            puma_birth_rate: self.pumas.birth_rate,
            puma_starvation_rate: self.pumas.starvation_rate,
            puma_diffusion_rate: self.pumas.diffusion_rate,
            puma_seed: self.pumas.seed,
            dt,
            duration,
            total_steps: total_steps as u64,
            report_interval_steps: self.timing.report_interval_steps,
        })
    }
}

fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidParameter(message.into())
}

// Default functions, matching the documented command-line defaults
fn default_hare_birth_rate() -> f64 {
    0.08
}

fn default_hare_predation_rate() -> f64 {
    0.04
}

fn default_puma_birth_rate() -> f64 {
    0.02
}

fn default_puma_starvation_rate() -> f64 {
    0.06
}

fn default_diffusion_rate() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    1
}

fn default_dt() -> f64 {
    0.4
}

fn default_duration() -> f64 {
    500.0
}

fn default_report_interval_steps() -> u64 {
    10
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_averages_filename() -> String {
    "averages.csv".to_string()
}

fn default_write_maps() -> bool {
    true
}

fn default_base_filename() -> String {
    "predator_prey".to_string()
}
