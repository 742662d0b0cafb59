use crate::landscape::{Coord, Landscape};
use rand::prelude::*;

/// Upper bound (exclusive) of the randomised initial density on a land cell.
pub const MAX_INITIAL_DENSITY: f64 = 5.0;

/// Per-cell density of one species over the haloed grid, double-buffered.
///
/// The two generations live in `buffers`; `current` names the one holding the
/// state at the present timestep. The stencil pass reads `current` and writes
/// the other buffer, then [`DensityField::swap`] flips the index. Water and
/// halo cells are zero in both generations and never written.
#[derive(Debug, Clone)]
pub struct DensityField {
    stride: usize,
    buffers: [Vec<f64>; 2],
    current: usize,
}

impl DensityField {
    /// A field that is zero everywhere.
    pub fn zeros(landscape: &Landscape) -> Self {
        let len = landscape.storage_len();
        DensityField {
            stride: landscape.stride(),
            buffers: [vec![0.0; len], vec![0.0; len]],
            current: 0,
        }
    }

    /// Randomised initial densities drawn from a generator seeded with `seed`.
    ///
    /// Land cells receive uniform values in `[0, MAX_INITIAL_DENSITY)`, visited in
    /// row-major order. A seed of 0 means the species is absent: the field stays zero.
    pub fn seeded(landscape: &Landscape, seed: u64) -> Self {
        if seed == 0 {
            return Self::zeros(landscape);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        Self::randomised(landscape, &mut rng)
    }

    /// Fills every land cell with a draw from `rng`; water stays zero.
    pub fn randomised<R: Rng>(landscape: &Landscape, rng: &mut R) -> Self {
        let mut field = Self::zeros(landscape);
        let current = &mut field.buffers[0];
        for (_, idx) in landscape.land_cells() {
            current[idx] = rng.random_range(0.0..MAX_INITIAL_DENSITY);
        }
        // "next" starts as a copy; it is fully overwritten on land by the first update.
        field.buffers[1] = field.buffers[0].clone();
        field
    }

    /// Index (0 or 1) of the generation holding the present state.
    pub fn generation(&self) -> usize {
        self.current
    }

    /// Densities at the present timestep, in storage order.
    pub fn current(&self) -> &[f64] {
        &self.buffers[self.current]
    }

    /// Density of an interior cell at the present timestep.
    pub fn get(&self, coord: Coord) -> f64 {
        self.current()[(coord.row + 1) * self.stride + coord.col + 1]
    }

    /// Read access to the present generation and write access to the next one.
    pub fn split_generations(&mut self) -> (&[f64], &mut [f64]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Makes the next generation current. No data moves.
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Overwrites the present density of an interior cell.
    pub fn set(&mut self, coord: Coord, value: f64) {
        let idx = (coord.row + 1) * self.stride + coord.col + 1;
        self.buffers[self.current][idx] = value;
    }
}
