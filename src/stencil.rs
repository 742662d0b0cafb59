//! Explicit (forward-Euler) update of the hare/puma reaction-diffusion system.
//!
//! For every land cell, with `N` its land-neighbour count:
//!
//! ```text
//! H' = H + dt * ( r_h*H - a*H*P + k_h*(sum(H_nbr) - N*H) )
//! P' = P + dt * ( r_p*H*P - m*P + k_p*(sum(P_nbr) - N*P) )
//! ```
//!
//! Negative results are floored at zero. No stability check is made on `dt`.

use crate::density::DensityField;
use crate::landscape::{Landscape, NeighborCounts};
use predator_prey_common::SimParams;

/// Rates entering the discretised equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub hare_birth: f64,      // r_h
    pub hare_predation: f64,  // a
    pub hare_diffusion: f64,  // k_h
    pub puma_birth: f64,      // r_p
    pub puma_starvation: f64, // m
    pub puma_diffusion: f64,  // k_p
    pub dt: f64,
}

impl From<&SimParams> for Rates {
    fn from(params: &SimParams) -> Self {
        Rates {
            hare_birth: params.hare_birth_rate,
            hare_predation: params.hare_predation_rate,
            hare_diffusion: params.hare_diffusion_rate,
            puma_birth: params.puma_birth_rate,
            puma_starvation: params.puma_starvation_rate,
            puma_diffusion: params.puma_diffusion_rate,
            dt: params.dt,
        }
    }
}

/// Inputs of the update rule for a single land cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInputs {
    pub hares: f64,
    pub pumas: f64,
    pub hare_neighbor_sum: f64,
    pub puma_neighbor_sum: f64,
    pub land_neighbors: u8,
}

/// Next-timestep `(hares, pumas)` of one land cell.
#[inline(always)]
pub fn next_cell(cell: CellInputs, rates: &Rates) -> (f64, f64) {
    let CellInputs { hares: h, pumas: p, .. } = cell;
    let n = f64::from(cell.land_neighbors);

    let hare_change = rates.hare_birth * h - rates.hare_predation * h * p
        + rates.hare_diffusion * (cell.hare_neighbor_sum - n * h);
    let puma_change = rates.puma_birth * h * p - rates.puma_starvation * p
        + rates.puma_diffusion * (cell.puma_neighbor_sum - n * p);

    let next_h = h + rates.dt * hare_change;
    let next_p = p + rates.dt * puma_change;

    // Densities never go negative.
    let floor = |v: f64| if v < 0.0 { 0.0 } else { v };
    (floor(next_h), floor(next_p))
}

/// Advances both species by one timestep, writing into their next generation.
///
/// Reads only the current generations, so traversal order does not matter.
/// Water and halo cells are not visited. The caller swaps generations afterwards.
pub fn update(
    landscape: &Landscape,
    neighbors: &NeighborCounts,
    rates: &Rates,
    hares: &mut DensityField,
    pumas: &mut DensityField,
) {
    let stride = landscape.stride();
    let land_neighbors = neighbors.as_slice();
    let (hares_in, hares_out) = hares.split_generations();
    let (pumas_in, pumas_out) = pumas.split_generations();

    for (_, idx) in landscape.land_cells() {
        let cell = CellInputs {
            hares: hares_in[idx],
            pumas: pumas_in[idx],
            hare_neighbor_sum: hares_in[idx - stride]
                + hares_in[idx + stride]
                + hares_in[idx - 1]
                + hares_in[idx + 1],
            puma_neighbor_sum: pumas_in[idx - stride]
                + pumas_in[idx + stride]
                + pumas_in[idx - 1]
                + pumas_in[idx + 1],
            land_neighbors: land_neighbors[idx],
        };
        let (next_h, next_p) = next_cell(cell, rates);
        hares_out[idx] = next_h;
        pumas_out[idx] = next_p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landscape::Coord;

    fn still() -> Rates {
        Rates {
            hare_birth: 0.0,
            hare_predation: 0.0,
            hare_diffusion: 0.0,
            puma_birth: 0.0,
            puma_starvation: 0.0,
            puma_diffusion: 0.0,
            dt: 0.4,
        }
    }

    fn step(landscape: &Landscape, rates: &Rates, hares: &mut DensityField, pumas: &mut DensityField) {
        update(landscape, &landscape.neighbor_counts(), rates, hares, pumas);
        hares.swap();
        pumas.swap();
    }

    #[test]
    fn zero_rates_leave_densities_unchanged() {
        let landscape = Landscape::parse("3 3\n1 1 0\n1 1 1\n0 1 1\n").unwrap();
        let mut hares = DensityField::seeded(&landscape, 11);
        let mut pumas = DensityField::seeded(&landscape, 12);
        let before_h = hares.current().to_vec();
        let before_p = pumas.current().to_vec();

        step(&landscape, &still(), &mut hares, &mut pumas);

        assert_eq!(hares.current(), &before_h[..]);
        assert_eq!(pumas.current(), &before_p[..]);
    }

    #[test]
    fn isolated_cell_grows_exponentially() {
        let landscape = Landscape::parse("1 1\n1\n").unwrap();
        let mut hares = DensityField::seeded(&landscape, 5);
        let mut pumas = DensityField::seeded(&landscape, 0);
        let h = hares.get(Coord::new(0, 0));
        let rates = Rates { hare_birth: 0.1, hare_diffusion: 0.3, puma_diffusion: 0.3, ..still() };

        step(&landscape, &rates, &mut hares, &mut pumas);

        assert_eq!(hares.get(Coord::new(0, 0)), h + 0.4 * (0.1 * h));
        assert_eq!(pumas.get(Coord::new(0, 0)), 0.0);
    }

    #[test]
    fn predation_overshoot_is_clamped_to_zero() {
        let rates = Rates { hare_birth: 0.1, hare_predation: 10.0, dt: 1.0, ..still() };
        let cell = CellInputs {
            hares: 2.0,
            pumas: 3.0,
            hare_neighbor_sum: 0.0,
            puma_neighbor_sum: 0.0,
            land_neighbors: 0,
        };
        let (h, p) = next_cell(cell, &rates);
        assert_eq!(h, 0.0);
        assert_eq!(p, 3.0);
    }

    #[test]
    fn starvation_overshoot_is_clamped_to_zero() {
        let rates = Rates { puma_starvation: 2.0, dt: 1.0, ..still() };
        let cell = CellInputs {
            hares: 0.0,
            pumas: 1.0,
            hare_neighbor_sum: 0.0,
            puma_neighbor_sum: 0.0,
            land_neighbors: 0,
        };
        assert_eq!(next_cell(cell, &rates), (0.0, 0.0));
    }

    #[test]
    fn diffusion_moves_density_between_land_cells_only() {
        // Two land cells separated from a third by water.
        let landscape = Landscape::parse("4 1\n1 1 0 1\n").unwrap();
        let mut hares = DensityField::zeros(&landscape);
        let mut pumas = DensityField::zeros(&landscape);
        hares.set(Coord::new(0, 0), 4.0);
        let rates = Rates { hare_diffusion: 0.25, dt: 1.0, ..still() };

        step(&landscape, &rates, &mut hares, &mut pumas);

        assert_eq!(hares.get(Coord::new(0, 0)), 3.0);
        assert_eq!(hares.get(Coord::new(0, 1)), 1.0);
        assert_eq!(hares.get(Coord::new(0, 2)), 0.0);
        assert_eq!(hares.get(Coord::new(0, 3)), 0.0);
        let total: f64 = hares.current().iter().sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn update_is_independent_of_traversal_order() {
        // A row-major in-place update would feed the new left neighbour into the right cell.
        let landscape = Landscape::parse("2 1\n1 1\n").unwrap();
        let mut hares = DensityField::zeros(&landscape);
        let mut pumas = DensityField::zeros(&landscape);
        hares.set(Coord::new(0, 0), 2.0);
        let rates = Rates { hare_diffusion: 0.5, dt: 1.0, ..still() };

        step(&landscape, &rates, &mut hares, &mut pumas);

        assert_eq!(hares.get(Coord::new(0, 0)), 1.0);
        assert_eq!(hares.get(Coord::new(0, 1)), 1.0);
    }

    #[test]
    fn water_cells_stay_zero() {
        let landscape = Landscape::parse("3 3\n1 0 1\n0 1 0\n1 1 1\n").unwrap();
        let mut hares = DensityField::seeded(&landscape, 1);
        let mut pumas = DensityField::seeded(&landscape, 2);
        let rates = Rates {
            hare_birth: 0.08,
            hare_predation: 0.04,
            hare_diffusion: 0.2,
            puma_birth: 0.02,
            puma_starvation: 0.06,
            puma_diffusion: 0.2,
            dt: 0.4,
        };
        for _ in 0..20 {
            step(&landscape, &rates, &mut hares, &mut pumas);
        }
        for (idx, &is_land) in landscape.storage().iter().enumerate() {
            if !is_land {
                assert_eq!(hares.current()[idx], 0.0);
                assert_eq!(pumas.current()[idx], 0.0);
            }
        }
    }
}
