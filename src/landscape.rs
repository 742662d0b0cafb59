use predator_prey_common::SimulationError;
use std::io::BufRead;
use std::path::Path;

/// A cell position in interior coordinates: `(0, 0)` is the top-left cell of
/// the declared landscape, not of the haloed storage grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

/// Land/water classification of every cell, surrounded by a one-cell water halo.
///
/// Storage is row-major over `(height + 2) x (width + 2)` cells. Interior cell
/// `(row, col)` lives at storage `(row + 1, col + 1)`, so the four orthogonal
/// neighbours of any interior cell are always addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landscape {
    width: usize,
    height: usize,
    land: Vec<bool>,
    land_cells: usize,
}

impl Landscape {
    /// Builds a landscape from `width * height` interior classifications in row-major order.
    pub fn new(width: usize, height: usize, interior: &[bool]) -> Result<Self, SimulationError> {
        let storage_len = haloed_len(width, height)
            .ok_or_else(|| SimulationError::malformed(0, format!("landscape {}x{} is too large", width, height)))?;
        // Cannot overflow once the haloed size fits.
        let cell_count = width * height;
        if interior.len() != cell_count {
            return Err(SimulationError::malformed(
                0,
                format!("expected {} cells for a {}x{} landscape, got {}", cell_count, width, height, interior.len()),
            ));
        }

        let stride = width + 2;
        let mut land = vec![false; storage_len];
        for (row, cells) in interior.chunks(width.max(1)).take(height).enumerate() {
            let start = (row + 1) * stride + 1;
            land[start..start + cells.len()].copy_from_slice(cells);
        }
        let land_cells = interior.iter().filter(|&&is_land| is_land).count();

        Ok(Landscape { width, height, land, land_cells })
    }

    /// Parses the textual landscape format: a `"<W> <H>"` header line followed by
    /// `H` rows of `W` whitespace-separated `0`/`1` tokens.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SimulationError> {
        let mut lines = reader.lines().enumerate();

        let (width, height) = match lines.next() {
            Some((_, line)) => parse_header(&read_line(line, 1)?)?,
            None => return Err(SimulationError::malformed(1, "missing \"<width> <height>\" header")),
        };

        // Grows with the rows actually read, never with the declared size.
        let mut interior = Vec::new();
        let mut rows = 0;
        for (idx, line) in lines {
            let line_no = idx + 1;
            let line = read_line(line, line_no)?;
            if line.trim().is_empty() {
                continue;
            }
            if rows == height {
                return Err(SimulationError::malformed(
                    line_no,
                    format!("found more than the declared {} rows", height),
                ));
            }

            let start = interior.len();
            for token in line.split_whitespace() {
                match token {
                    "0" => interior.push(false),
                    "1" => interior.push(true),
                    other => {
                        return Err(SimulationError::malformed(
                            line_no,
                            format!("cell value '{}' is neither 0 nor 1", other),
                        ))
                    }
                }
            }
            let found = interior.len() - start;
            if found != width {
                return Err(SimulationError::malformed(
                    line_no,
                    format!("expected {} columns, found {}", width, found),
                ));
            }
            rows += 1;
        }

        if rows != height {
            return Err(SimulationError::malformed(
                rows + 2,
                format!("expected {} rows, found {}", height, rows),
            ));
        }

        Self::new(width, height, &interior)
    }

    /// Parses a landscape held in memory.
    pub fn parse(text: &str) -> Result<Self, SimulationError> {
        Self::from_reader(text.as_bytes())
    }

    /// Reads and parses a landscape file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| SimulationError::landscape_io(path, e))?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Interior width `W`.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior height `H`.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row length of the haloed storage grid.
    pub fn stride(&self) -> usize {
        self.width + 2
    }

    /// Number of cells in the haloed storage grid.
    pub fn storage_len(&self) -> usize {
        self.land.len()
    }

    /// Number of land cells.
    pub fn land_cell_count(&self) -> usize {
        self.land_cells
    }

    // Maps an interior coordinate to its storage index.
    #[inline(always)]
    pub fn index(&self, coord: Coord) -> usize {
        debug_assert!(coord.row < self.height && coord.col < self.width);
        (coord.row + 1) * self.stride() + coord.col + 1
    }

    #[inline(always)]
    pub fn is_land(&self, coord: Coord) -> bool {
        self.land[self.index(coord)]
    }

    /// Land flags of the full haloed grid, in storage order.
    pub fn storage(&self) -> &[bool] {
        &self.land
    }

    /// Interior coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Coord::new(row, col)))
    }

    /// Interior land cells in row-major order, paired with their storage index.
    pub fn land_cells(&self) -> impl Iterator<Item = (Coord, usize)> + '_ {
        self.coords()
            .map(move |coord| (coord, self.index(coord)))
            .filter(move |&(_, idx)| self.land[idx])
    }

    /// Precomputes the land-neighbour count of every storage cell.
    pub fn neighbor_counts(&self) -> NeighborCounts {
        NeighborCounts::new(self)
    }
}

/// Number of land cells among the four orthogonal neighbours of every storage cell.
///
/// Used as the diffusion normalisation term; computed once and reused every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborCounts {
    stride: usize,
    counts: Vec<u8>,
}

impl NeighborCounts {
    pub fn new(landscape: &Landscape) -> Self {
        let stride = landscape.stride();
        let rows = landscape.height() + 2;
        let land = landscape.storage();

        // Only halo cells can have neighbours outside the grid; those count as water.
        let land_at = |row: isize, col: isize| -> u8 {
            if row < 0 || col < 0 || row as usize >= rows || col as usize >= stride {
                0
            } else {
                land[row as usize * stride + col as usize] as u8
            }
        };

        let mut counts = vec![0u8; land.len()];
        for row in 0..rows {
            for col in 0..stride {
                let (r, c) = (row as isize, col as isize);
                counts[row * stride + col] =
                    land_at(r - 1, c) + land_at(r + 1, c) + land_at(r, c - 1) + land_at(r, c + 1);
            }
        }

        NeighborCounts { stride, counts }
    }

    /// Land-neighbour count of an interior cell.
    pub fn get(&self, coord: Coord) -> u8 {
        self.counts[(coord.row + 1) * self.stride + coord.col + 1]
    }

    /// Counts in storage order.
    pub fn as_slice(&self) -> &[u8] {
        &self.counts
    }
}

fn read_line(line: std::io::Result<String>, line_no: usize) -> Result<String, SimulationError> {
    line.map_err(|e| SimulationError::malformed(line_no, format!("unreadable line: {}", e)))
}

fn parse_header(line: &str) -> Result<(usize, usize), SimulationError> {
    let mut tokens = line.split_whitespace();
    let mut dimension = |name: &str| -> Result<usize, SimulationError> {
        let token = tokens
            .next()
            .ok_or_else(|| SimulationError::malformed(1, format!("header is missing the {}", name)))?;
        token
            .parse::<usize>()
            .map_err(|_| SimulationError::malformed(1, format!("{} '{}' is not a non-negative integer", name, token)))
    };
    let width = dimension("width")?;
    let height = dimension("height")?;
    if tokens.next().is_some() {
        return Err(SimulationError::malformed(1, "header must contain exactly \"<width> <height>\""));
    }
    if width.checked_mul(height).is_none() || haloed_len(width, height).is_none() {
        return Err(SimulationError::malformed(1, format!("landscape {}x{} is too large", width, height)));
    }
    Ok((width, height))
}

/// Storage cells of a `width x height` landscape plus halo, or `None` when a
/// density field of that size could not be addressed.
fn haloed_len(width: usize, height: usize) -> Option<usize> {
    let len = width.checked_add(2)?.checked_mul(height.checked_add(2)?)?;
    let bytes = len.checked_mul(std::mem::size_of::<f64>())?;
    (bytes <= isize::MAX as usize).then_some(len)
}
