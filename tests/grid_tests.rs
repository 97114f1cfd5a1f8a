// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Grid indexer properties.
//!
//! The unit tests in `services/grid.rs` cover contract rejections; these
//! check the coverage properties callers rely on.

use hexclaim::services::grid::{self, BoundingBox};

fn mission_district() -> BoundingBox {
    BoundingBox {
        south: 37.748,
        north: 37.768,
        west: -122.426,
        east: -122.406,
    }
}

#[test]
fn test_positive_area_box_has_nonempty_coverage() {
    for res in [5, 7, 9] {
        let cells = grid::cells_for_bbox(&mission_district(), res).unwrap();
        assert!(!cells.is_empty(), "res {} must yield cells", res);
    }
}

#[test]
fn test_coverage_is_deterministic_across_calls() {
    let first = grid::cells_for_bbox(&mission_district(), 8).unwrap();
    for _ in 0..5 {
        assert_eq!(grid::cells_for_bbox(&mission_district(), 8).unwrap(), first);
    }
}

#[test]
fn test_finer_resolution_yields_more_cells() {
    let coarse = grid::cells_for_bbox(&mission_district(), 6).unwrap();
    let fine = grid::cells_for_bbox(&mission_district(), 9).unwrap();
    assert!(fine.len() > coarse.len());
}

#[test]
fn test_all_returned_ids_are_well_formed() {
    let cells = grid::cells_for_bbox(&mission_district(), 8).unwrap();
    for cell in &cells {
        grid::parse_cell(cell).expect("indexer output must parse as a cell");
    }
}

#[test]
fn test_point_box_yields_the_containing_cell() {
    let bbox = BoundingBox {
        south: 37.758,
        north: 37.758,
        west: -122.416,
        east: -122.416,
    };
    let cells = grid::cells_for_bbox(&bbox, 9).unwrap();

    assert_eq!(cells.len(), 1);
    let direct = grid::cell_for_point(37.758, -122.416, 9).unwrap();
    assert!(cells.contains(&direct));
}

#[test]
fn test_every_interior_sample_is_covered() {
    let bbox = mission_district();
    let cells = grid::cells_for_bbox(&bbox, 9).unwrap();

    // Sample a small lattice of interior points; each must land in a
    // covered cell.
    for i in 1..5 {
        for j in 1..5 {
            let lat = bbox.south + (bbox.north - bbox.south) * (i as f64 / 5.0);
            let lon = bbox.west + (bbox.east - bbox.west) * (j as f64 / 5.0);
            let cell = grid::cell_for_point(lat, lon, 9).unwrap();
            assert!(
                cells.contains(&cell),
                "interior point ({}, {}) not covered",
                lat,
                lon
            );
        }
    }
}
