// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hexagonal grid indexing service.
//!
//! Pure functions mapping geographic points, boxes and tracks to H3 cell
//! identifiers. No state, no I/O; every contract violation fails
//! synchronously with a descriptive error instead of clamping.

use geo::LineString;
use h3o::{
    geom::{ContainmentMode, PolyfillConfig, Polygon, ToCells},
    CellIndex, LatLng, Resolution,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Coarsest supported grid resolution.
pub const MIN_RESOLUTION: u8 = 0;
/// Finest supported grid resolution.
pub const MAX_RESOLUTION: u8 = 15;

/// A geographic bounding box in degrees.
///
/// Valid when all coordinates are in range, `south <= north` and
/// `west <= east`. Boxes straddling the antimeridian (numerically
/// `west > east`) are unsupported and rejected by the contract check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Check the input contract described on the type.
    pub fn validate(&self) -> Result<(), GridError> {
        check_coordinate(self.south, self.west)?;
        check_coordinate(self.north, self.east)?;
        if self.south > self.north {
            return Err(GridError::InvalidBox("south must not exceed north"));
        }
        if self.west > self.east {
            return Err(GridError::InvalidBox(
                "west must not exceed east (antimeridian boxes are unsupported)",
            ));
        }
        Ok(())
    }

    /// Whether the box degenerates to a single point.
    fn is_point(&self) -> bool {
        self.south == self.north && self.west == self.east
    }
}

/// Errors from grid operations. All are input-contract violations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("coordinate out of range: ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("grid resolution must be an integer between 0 and 15, got {0}")]
    InvalidResolution(u8),

    #[error("invalid bounding box: {0}")]
    InvalidBox(&'static str),

    #[error("malformed cell identifier: {0}")]
    InvalidCell(String),

    #[error("failed to build coverage geometry: {0}")]
    Geometry(String),
}

fn check_coordinate(lat: f64, lon: f64) -> Result<(), GridError> {
    let in_range =
        lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
    if !in_range {
        return Err(GridError::InvalidCoordinate { lat, lon });
    }
    Ok(())
}

fn parse_resolution(res: u8) -> Result<Resolution, GridError> {
    Resolution::try_from(res).map_err(|_| GridError::InvalidResolution(res))
}

/// Cell containing a single point, as a lowercase hex identifier.
pub fn cell_for_point(lat: f64, lon: f64, res: u8) -> Result<String, GridError> {
    let resolution = parse_resolution(res)?;
    check_coordinate(lat, lon)?;
    let coord = LatLng::new(lat, lon).map_err(|_| GridError::InvalidCoordinate { lat, lon })?;
    Ok(coord.to_cell(resolution).to_string())
}

fn bbox_polygon(bbox: &BoundingBox) -> Result<Polygon, GridError> {
    // Closed ring in (lon, lat) order.
    let ring = LineString::from(vec![
        (bbox.west, bbox.south),
        (bbox.east, bbox.south),
        (bbox.east, bbox.north),
        (bbox.west, bbox.north),
        (bbox.west, bbox.south),
    ]);
    Polygon::from_degrees(geo::Polygon::new(ring, vec![]))
        .map_err(|e| GridError::Geometry(e.to_string()))
}

fn coverage_config(resolution: Resolution) -> PolyfillConfig {
    // Covers mode: every cell overlapping the box is included, so even a
    // box smaller than one cell produces a non-empty set.
    PolyfillConfig::new(resolution).containment_mode(ContainmentMode::Covers)
}

/// Upper bound on the number of cells [`cells_for_bbox`] would return.
///
/// Cheap to compute; lets callers refuse oversized viewports before any
/// coverage is materialized.
pub fn bbox_cell_estimate(bbox: &BoundingBox, res: u8) -> Result<usize, GridError> {
    bbox.validate()?;
    let resolution = parse_resolution(res)?;
    if bbox.is_point() {
        return Ok(1);
    }
    let polygon = bbox_polygon(bbox)?;
    Ok(polygon.max_cells_count(coverage_config(resolution)))
}

/// Cells whose areas intersect the bounding box, at the given resolution.
///
/// The result is a sorted set; callers must not attach meaning to the
/// enumeration order beyond determinism. A degenerate point box yields
/// exactly the one cell containing the point.
pub fn cells_for_bbox(bbox: &BoundingBox, res: u8) -> Result<BTreeSet<String>, GridError> {
    bbox.validate()?;
    let resolution = parse_resolution(res)?;

    if bbox.is_point() {
        let mut cells = BTreeSet::new();
        cells.insert(cell_for_point(bbox.south, bbox.west, res)?);
        return Ok(cells);
    }

    let polygon = bbox_polygon(bbox)?;
    Ok(polygon
        .to_cells(coverage_config(resolution))
        .map(|c| c.to_string())
        .collect())
}

/// Validate a cell identifier and return its parsed index.
pub fn parse_cell(id: &str) -> Result<CellIndex, GridError> {
    id.parse::<CellIndex>()
        .map_err(|_| GridError::InvalidCell(id.to_string()))
}

/// Cells covered by a GPS track at the given resolution.
///
/// Consecutive samples are connected through the grid so a sparse track
/// still yields a contiguous cell path. Grid paths are undefined across
/// pentagon distortions; those segments fall back to their endpoint cells.
pub fn cells_for_track(line: &LineString<f64>, res: u8) -> Result<BTreeSet<String>, GridError> {
    let resolution = parse_resolution(res)?;
    let mut cells = BTreeSet::new();
    let mut prev: Option<CellIndex> = None;

    for coord in line.coords() {
        let (lat, lon) = (coord.y, coord.x);
        check_coordinate(lat, lon)?;
        let cell = LatLng::new(lat, lon)
            .map_err(|_| GridError::InvalidCoordinate { lat, lon })?
            .to_cell(resolution);

        if let Some(prev_cell) = prev {
            if prev_cell != cell {
                if let Ok(path) = prev_cell.grid_path_cells(cell) {
                    for step in path.flatten() {
                        cells.insert(step.to_string());
                    }
                }
            }
        }

        cells.insert(cell.to_string());
        prev = Some(cell);
    }

    Ok(cells)
}
