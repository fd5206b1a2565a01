//! Grid geometry: maps image pixel positions onto fixed-interval grid cells.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Both grid intervals must be strictly positive
    #[error("Invalid grid interval ({x}, {y}): both values must be > 0")]
    InvalidInterval { x: i64, y: i64 },
}

/// One rectangle of the grid overlay, clipped to the image bounds.
///
/// Stored on disk as `[xmin, ymin, xmax, ymax]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct GridCell {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
}

impl GridCell {
    pub fn new(xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> u32 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> u32 {
        self.ymax.saturating_sub(self.ymin)
    }

    /// Closed containment, so degenerate boundary cells still contain their edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.xmin as f64..=self.xmax as f64).contains(&x)
            && (self.ymin as f64..=self.ymax as f64).contains(&y)
    }
}

impl From<[u32; 4]> for GridCell {
    fn from([xmin, ymin, xmax, ymax]: [u32; 4]) -> Self {
        Self::new(xmin, ymin, xmax, ymax)
    }
}

impl From<GridCell> for [u32; 4] {
    fn from(cell: GridCell) -> Self {
        [cell.xmin, cell.ymin, cell.xmax, cell.ymax]
    }
}

/// Validated `(x, y)` grid spacing in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridInterval {
    pub x: u32,
    pub y: u32,
}

impl GridInterval {
    pub fn new(x: i64, y: i64) -> Result<Self, GridError> {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(ix), Ok(iy)) if ix > 0 && iy > 0 => Ok(Self { x: ix, y: iy }),
            _ => Err(GridError::InvalidInterval { x, y }),
        }
    }
}

/// Resolve the grid cell under a (possibly fractional) pixel position.
///
/// Positions outside the image are clamped onto its bounds first, so a click
/// past the right or bottom edge yields the degenerate boundary cell.
pub fn resolve_cell(
    pixel_x: f64,
    pixel_y: f64,
    interval_x: i64,
    interval_y: i64,
    image_width: u32,
    image_height: u32,
) -> Result<GridCell, GridError> {
    let interval = GridInterval::new(interval_x, interval_y)?;
    Ok(resolve_in(pixel_x, pixel_y, interval, image_width, image_height))
}

/// Same as [`resolve_cell`] with an already validated interval.
pub fn resolve_in(
    pixel_x: f64,
    pixel_y: f64,
    interval: GridInterval,
    image_width: u32,
    image_height: u32,
) -> GridCell {
    let xmin = snap(pixel_x, interval.x, image_width);
    let ymin = snap(pixel_y, interval.y, image_height);
    GridCell {
        xmin,
        ymin,
        xmax: xmin.saturating_add(interval.x).min(image_width),
        ymax: ymin.saturating_add(interval.y).min(image_height),
    }
}

fn snap(pos: f64, interval: u32, bound: u32) -> u32 {
    // NaN falls through to 0 via the saturating cast.
    let pos = pos.clamp(0.0, bound as f64).floor() as u32;
    interval * (pos / interval)
}

/// Index and centre of one full grid cell, for on-screen numbering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLabel {
    pub index: usize,
    pub center_x: f32,
    pub center_y: f32,
}

/// Row-major numbering of the full cells of the grid. Partial cells on the
/// right and bottom edges are left unnumbered.
pub fn cell_labels(interval: GridInterval, image_width: u32, image_height: u32) -> Vec<CellLabel> {
    let nx = (image_width / interval.x) as usize;
    let ny = (image_height / interval.y) as usize;
    let mut labels = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        let center_y = interval.y as f32 / 2.0 + j as f32 * interval.y as f32;
        for i in 0..nx {
            labels.push(CellLabel {
                index: i + j * nx,
                center_x: interval.x as f32 / 2.0 + i as f32 * interval.x as f32,
                center_y,
            });
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_interior_cell() {
        let cell = resolve_cell(250.0, 40.0, 100, 100, 300, 250).unwrap();
        assert_eq!(cell, GridCell::new(200, 0, 300, 100));
    }

    #[test]
    fn test_resolve_clips_past_right_edge() {
        let cell = resolve_cell(310.0, 240.0, 100, 100, 300, 250).unwrap();
        assert_eq!(cell, GridCell::new(300, 200, 300, 250));
        assert_eq!(cell.width(), 0);
        assert_eq!(cell.height(), 50);
    }

    #[test]
    fn test_resolve_floors_fractional_pixels() {
        let cell = resolve_cell(99.999, 100.0, 100, 100, 300, 250).unwrap();
        assert_eq!(cell, GridCell::new(0, 100, 100, 200));
    }

    #[test]
    fn test_resolve_negative_clamps_to_origin() {
        let cell = resolve_cell(-12.5, -0.1, 40, 30, 300, 250).unwrap();
        assert_eq!(cell, GridCell::new(0, 0, 40, 30));
    }

    #[test]
    fn test_resolve_rejects_non_positive_interval() {
        assert_eq!(
            resolve_cell(1.0, 1.0, 0, 10, 100, 100),
            Err(GridError::InvalidInterval { x: 0, y: 10 })
        );
        assert!(resolve_cell(1.0, 1.0, 10, -5, 100, 100).is_err());
    }

    #[test]
    fn test_resolved_cell_contains_pixel_and_respects_interval() {
        let (w, h) = (317u32, 203u32);
        for &(ix, iy) in &[(1i64, 1i64), (7, 13), (50, 50), (100, 64), (400, 400)] {
            let mut y = 0.0;
            while y < h as f64 {
                let mut x = 0.0;
                while x < w as f64 {
                    let cell = resolve_cell(x, y, ix, iy, w, h).unwrap();
                    assert!(cell.contains(x, y), "{cell:?} should contain ({x}, {y})");
                    assert!(cell.width() as i64 <= ix);
                    assert!(cell.height() as i64 <= iy);
                    assert!(cell.xmax <= w && cell.ymax <= h);
                    assert_eq!(cell.xmin as i64 % ix, 0);
                    assert_eq!(cell.ymin as i64 % iy, 0);
                    x += 9.5;
                }
                y += 6.25;
            }
        }
    }

    #[test]
    fn test_edge_cells_are_smaller() {
        let cell = resolve_cell(299.0, 249.0, 100, 100, 300, 250).unwrap();
        assert_eq!(cell, GridCell::new(200, 200, 300, 250));
        assert_eq!(cell.height(), 50);
    }

    #[test]
    fn test_cell_serializes_as_array() {
        let cell = GridCell::new(200, 0, 300, 100);
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, "[200,0,300,100]");
        let back: GridCell = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell);
    }

    #[test]
    fn test_cell_labels_skip_partial_cells() {
        let interval = GridInterval::new(100, 100).unwrap();
        let labels = cell_labels(interval, 300, 250);
        // 3 columns, 2 full rows
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0].index, 0);
        assert_eq!((labels[0].center_x, labels[0].center_y), (50.0, 50.0));
        assert_eq!(labels[4].index, 4);
        assert_eq!((labels[4].center_x, labels[4].center_y), (150.0, 150.0));
    }
}
