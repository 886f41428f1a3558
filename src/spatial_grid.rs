/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct used as a broad phase for
 * neighbor lookups. It divides a cube around the origin into uniform cells
 * so a query only has to look at the 27 cells around the observer instead
 * of the whole population.
 *
 * Coordinates outside the cube are clamped into the border cells. Clamping
 * never moves two points more than one cell apart, so every pair closer than
 * a cell size still lands in adjacent cells. Query results are sorted, which
 * keeps neighbor sums in the same order as a brute-force scan.
 */

use glam::DVec3;

// Upper bound on cells per axis; larger worlds get larger cells.
const MAX_CELLS_PER_AXIS: usize = 64;

pub struct SpatialGrid {
    pub cell_size: f64,
    pub grid_size: usize,
    half_extent: f64,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Creates an empty grid covering `[-half_extent, half_extent]^3` with cells
    /// at least `min_cell_size` wide.
    pub fn new(min_cell_size: f64, half_extent: f64) -> Self {
        let extent = 2.0 * half_extent.max(f64::EPSILON);
        let cell_size = Self::cell_size_for(min_cell_size, extent);
        let grid_size = ((extent / cell_size).ceil() as usize).clamp(1, MAX_CELLS_PER_AXIS);

        Self {
            cell_size,
            grid_size,
            half_extent,
            cells: vec![Vec::new(); grid_size * grid_size * grid_size],
        }
    }

    fn cell_size_for(min_cell_size: f64, extent: f64) -> f64 {
        min_cell_size.max(extent / MAX_CELLS_PER_AXIS as f64)
    }

    /// True when a grid built with these arguments would have this grid's layout.
    pub fn has_layout(&self, min_cell_size: f64, half_extent: f64) -> bool {
        let extent = 2.0 * half_extent.max(f64::EPSILON);
        self.half_extent == half_extent && self.cell_size == Self::cell_size_for(min_cell_size, extent)
    }

    /// Empties the grid and inserts every position, in index order, keeping the cell allocations.
    pub fn refill(&mut self, positions: impl IntoIterator<Item = DVec3>) {
        self.clear();
        for (i, position) in positions.into_iter().enumerate() {
            self.insert(i, position);
        }
    }

    /// Builds a grid and inserts every position, in index order.
    pub fn build(min_cell_size: f64, half_extent: f64, positions: impl IntoIterator<Item = DVec3>) -> Self {
        let mut grid = Self::new(min_cell_size, half_extent);
        grid.refill(positions);
        grid
    }

    #[inline]
    fn axis_cell(&self, coordinate: f64) -> usize {
        let max = (self.grid_size - 1) as f64;
        // NaN clamps to 0 via the `as` cast.
        ((coordinate + self.half_extent) / self.cell_size).floor().clamp(0.0, max) as usize
    }

    #[inline]
    fn cell_coords(&self, position: DVec3) -> [usize; 3] {
        [
            self.axis_cell(position.x),
            self.axis_cell(position.y),
            self.axis_cell(position.z),
        ]
    }

    #[inline]
    fn cell_index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.grid_size + y) * self.grid_size + x
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: DVec3) {
        let cell = self.cell_index(self.cell_coords(position));
        self.cells[cell].push(index);
    }

    /// Indices stored in the cell containing `position` and its 26 neighbors, ascending.
    pub fn nearby_indices(&self, position: DVec3) -> Vec<usize> {
        let [cx, cy, cz] = self.cell_coords(position);
        let span = |c: usize| c.saturating_sub(1)..=(c + 1).min(self.grid_size - 1);

        let mut result = Vec::new();
        for z in span(cz) {
            for y in span(cy) {
                for x in span(cx) {
                    result.extend_from_slice(&self.cells[self.cell_index([x, y, z])]);
                }
            }
        }
        result.sort_unstable();
        result
    }
}
