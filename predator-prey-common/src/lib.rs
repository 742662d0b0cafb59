pub mod config;
pub mod error;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{
    ArchiveFormat, HareConfig, LandscapeConfig, OutputConfig, PumaConfig, SimulationConfig,
    TimingConfig,
};
pub use error::SimulationError;
pub use sim_params::SimParams;
pub use snapshot::AggregateSnapshot;
