//! Reaction-diffusion simulation of hare and puma populations on a land/water grid.

pub mod aggregate;
pub mod density;
pub mod landscape;
pub mod output;
pub mod simulation;
pub mod stencil;

pub use density::DensityField;
pub use landscape::{Coord, Landscape, NeighborCounts};
pub use output::{save_snapshot_archive, FileSink};
pub use simulation::{Frame, NullSink, PredatorPreySimulation, ReportSink};
pub use predator_prey_common::{AggregateSnapshot, SimParams, SimulationConfig, SimulationError};
