use serde::{Deserialize, Serialize};

/// Landscape-wide population statistics at one reported timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    /// Timestep index the statistics were taken at.
    pub step: u64,
    /// Elapsed simulated time (`step * dt`).
    pub time: f64,
    /// Mean hare density over land cells (0 when there is no land).
    pub mean_hares: f64,
    /// Mean puma density over land cells (0 when there is no land).
    pub mean_pumas: f64,
    /// Largest hare density anywhere on the grid.
    pub max_hares: f64,
    /// Largest puma density anywhere on the grid.
    pub max_pumas: f64,
}
