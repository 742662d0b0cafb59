use crate::density::DensityField;
use crate::landscape::Landscape;
use predator_prey_common::{AggregateSnapshot, SimParams};

/// Mean density per land cell. Water contributes nothing to the sum since it is
/// always zero. Defined as 0 when there is no land at all.
pub fn mean_density(densities: &[f64], land_cells: usize) -> f64 {
    if land_cells == 0 {
        return 0.0;
    }
    densities.iter().sum::<f64>() / land_cells as f64
}

/// Largest density anywhere on the grid (0 for an unpopulated grid).
pub fn max_density(densities: &[f64]) -> f64 {
    densities.iter().copied().fold(0.0, f64::max)
}

/// Landscape-wide statistics of the current generations, labelled with `step`.
pub fn capture(
    step: u64,
    params: &SimParams,
    landscape: &Landscape,
    hares: &DensityField,
    pumas: &DensityField,
) -> AggregateSnapshot {
    let land_cells = landscape.land_cell_count();
    AggregateSnapshot {
        step,
        time: params.time_at(step),
        mean_hares: mean_density(hares.current(), land_cells),
        mean_pumas: mean_density(pumas.current(), land_cells),
        max_hares: max_density(hares.current()),
        max_pumas: max_density(pumas.current()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landscape::Coord;
    use predator_prey_common::SimulationConfig;

    #[test]
    fn mean_divides_by_land_cells_only() {
        let landscape = Landscape::parse("3 1\n1 0 1\n").unwrap();
        let mut hares = DensityField::zeros(&landscape);
        hares.set(Coord::new(0, 0), 1.0);
        hares.set(Coord::new(0, 2), 2.0);
        assert_eq!(mean_density(hares.current(), landscape.land_cell_count()), 1.5);
        assert_eq!(max_density(hares.current()), 2.0);
    }

    #[test]
    fn all_water_means_are_zero() {
        let landscape = Landscape::parse("2 2\n0 0\n0 0\n").unwrap();
        let params = SimulationConfig::default().sim_params().unwrap();
        let hares = DensityField::seeded(&landscape, 9);
        let pumas = DensityField::seeded(&landscape, 10);

        let snapshot = capture(0, &params, &landscape, &hares, &pumas);
        assert_eq!(snapshot.mean_hares, 0.0);
        assert_eq!(snapshot.mean_pumas, 0.0);
        assert_eq!(snapshot.max_hares, 0.0);
        assert_eq!(snapshot.max_pumas, 0.0);
    }

    #[test]
    fn snapshot_time_is_step_times_dt() {
        let landscape = Landscape::parse("1 1\n1\n").unwrap();
        let mut config = SimulationConfig::default();
        config.timing.dt = 0.5;
        let params = config.sim_params().unwrap();
        let field = DensityField::zeros(&landscape);

        let snapshot = capture(30, &params, &landscape, &field, &field);
        assert_eq!(snapshot.step, 30);
        assert_eq!(snapshot.time, 15.0);
    }
}
