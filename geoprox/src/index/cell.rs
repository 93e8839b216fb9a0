//! Grid geometry: mapping coordinates and bounding boxes to cells.

use std::ops::RangeInclusive;

use super::error::IndexError;
use crate::coord::Coordinate;
use crate::geo::BoundingBox;

/// Key of a grid cell: `(row, column)` counted from the south-west corner
/// (-90°, -180°).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub row: i32,
    pub col: i32,
}

/// Fixed-size lat/lon grid covering the globe.
///
/// Rows and columns are clamped at the far edges, so latitude 90 lands in the
/// last row and longitude 180 lands in the last column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    cell_size: f64,
    rows: i32,
    cols: i32,
}

impl GridGeometry {
    /// Creates a grid with square cells of `cell_size_deg` degrees.
    pub fn new(cell_size_deg: f64) -> Result<Self, IndexError> {
        if !cell_size_deg.is_finite() || cell_size_deg <= 0.0 || cell_size_deg > 90.0 {
            return Err(IndexError::InvalidCellSize(cell_size_deg));
        }

        Ok(Self {
            cell_size: cell_size_deg,
            rows: (180.0 / cell_size_deg).ceil() as i32,
            cols: (360.0 / cell_size_deg).ceil() as i32,
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Total number of cells in the grid.
    pub fn total_cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    #[inline]
    fn row_of(&self, lat: f64) -> i32 {
        (((lat + 90.0) / self.cell_size).floor() as i32).clamp(0, self.rows - 1)
    }

    #[inline]
    fn col_of(&self, lon: f64) -> i32 {
        (((lon + 180.0) / self.cell_size).floor() as i32).clamp(0, self.cols - 1)
    }

    /// Cell containing a coordinate.
    #[inline]
    pub fn key_for(&self, coord: &Coordinate) -> CellKey {
        CellKey {
            row: self.row_of(coord.latitude()),
            col: self.col_of(coord.longitude()),
        }
    }

    /// Rows overlapped by the box.
    pub fn rows_for(&self, bbox: &BoundingBox) -> RangeInclusive<i32> {
        self.row_of(bbox.min_lat)..=self.row_of(bbox.max_lat)
    }

    /// Column ranges overlapped by the box; two when it crosses the antimeridian.
    pub fn col_ranges_for(&self, bbox: &BoundingBox) -> Vec<RangeInclusive<i32>> {
        bbox.lon_ranges()
            .into_iter()
            .map(|(lo, hi)| self.col_of(lo)..=self.col_of(hi))
            .collect()
    }

    /// Number of cells the box overlaps.
    pub fn cells_in_box(&self, bbox: &BoundingBox) -> usize {
        let rows = self.rows_for(bbox);
        let row_count = (rows.end() - rows.start() + 1).max(0) as usize;
        let col_count: usize = self
            .col_ranges_for(bbox)
            .iter()
            .map(|r| (r.end() - r.start() + 1).max(0) as usize)
            .sum();
        row_count * col_count
    }
}

impl Default for GridGeometry {
    /// 1° cells: 180 rows by 360 columns.
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            rows: 180,
            cols: 360,
        }
    }
}
