//! C3: locate the sinks of the flow forest — coastline and map-border land
//! cells (spec.md §4.3). Grounded on `original_source/rivers.py`'s
//! `find_start_points` for the quad-tree pruning idea, reworked to scan any
//! leaf region (not just an exact 3x3 window) so it stays correct on the
//! degenerate thin maps spec.md's own scenarios exercise (S3 is a single
//! row).

use crate::grid::Grid;
use crate::rng::Rng;

/// One sink of the flow forest: a land cell adjacent to sea or on the map
/// border. `key` is `height + jitter`, the value the flow-tree builder (C4)
/// seeds its priority queue with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartPoint {
    pub x: u32,
    pub y: u32,
    pub key: f64,
}

fn add_start(
    heightmap: &Grid<f64>,
    x: usize,
    y: usize,
    sea_level: f64,
    visited: &mut [bool],
    starts: &mut Vec<StartPoint>,
    rng: &mut Rng,
) {
    let height = heightmap.get(x, y);
    if height <= sea_level {
        return;
    }
    let idx = y * heightmap.w + x;
    if visited[idx] {
        return;
    }
    visited[idx] = true;
    let key = height + rng.next_f64();
    starts.push(StartPoint { x: x as u32, y: y as u32, key });
}

/// Recursively bisects the longer axis of `(x0, y0, rw, rh)`, pruning
/// subregions that are entirely sea or entirely land (no coastline can lie
/// inside them), and at small leaves tests every land cell's 4-neighbours
/// directly for sea adjacency.
fn scan_region(
    heightmap: &Grid<f64>,
    sea_level: f64,
    x0: usize,
    y0: usize,
    rw: usize,
    rh: usize,
    visited: &mut [bool],
    starts: &mut Vec<StartPoint>,
    rng: &mut Rng,
) {
    if rw == 0 || rh == 0 {
        return;
    }

    let mut any_sea = false;
    let mut any_land = false;
    'scan: for y in y0..y0 + rh {
        for x in x0..x0 + rw {
            if heightmap.get(x, y) <= sea_level {
                any_sea = true;
            } else {
                any_land = true;
            }
            if any_sea && any_land {
                break 'scan;
            }
        }
    }
    if !any_sea || !any_land {
        return; // uniform region: no coastline inside, per spec.md §4.3.
    }

    if rw.max(rh) <= 3 {
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                if heightmap.get(x, y) <= sea_level {
                    continue;
                }
                let coastal = (x > 0 && heightmap.get(x - 1, y) <= sea_level)
                    || (y > 0 && heightmap.get(x, y - 1) <= sea_level)
                    || (x + 1 < heightmap.w && heightmap.get(x + 1, y) <= sea_level)
                    || (y + 1 < heightmap.h && heightmap.get(x, y + 1) <= sea_level);
                if coastal {
                    add_start(heightmap, x, y, sea_level, visited, starts, rng);
                }
            }
        }
        return;
    }

    if rw < rh {
        let cut = rh / 2;
        scan_region(heightmap, sea_level, x0, y0, rw, cut + 1, visited, starts, rng);
        scan_region(heightmap, sea_level, x0, y0 + cut, rw, rh - cut, visited, starts, rng);
    } else {
        let cut = rw / 2;
        scan_region(heightmap, sea_level, x0, y0, cut + 1, rh, visited, starts, rng);
        scan_region(heightmap, sea_level, x0 + cut, y0, rw - cut, rh, visited, starts, rng);
    }
}

/// Returns every start point: land cells adjacent to sea (found via the
/// quad-tree pruned scan) plus land cells on the outer map border (found by
/// a direct perimeter scan — the quad-tree only proves coastal adjacency,
/// not border membership, matching the two separate passes in
/// `rivers.py`).
///
/// Row-border and column-border membership are each gated on the opposite
/// dimension being greater than 1; otherwise a 1-row (or 1-column) map would
/// have every cell satisfy "row 0 or row Y-1" trivially, which would make
/// every interior cell a root instead of just the two ends (see spec.md
/// scenario S3, a 1x10 row, and DESIGN.md).
pub fn find_start_points(heightmap: &Grid<f64>, sea_level: f64, rng: &mut Rng) -> Vec<StartPoint> {
    let w = heightmap.w;
    let h = heightmap.h;
    let mut visited = vec![false; w * h];
    let mut starts = Vec::new();

    scan_region(heightmap, sea_level, 0, 0, w, h, &mut visited, &mut starts, rng);

    if h > 1 {
        for x in 0..w {
            add_start(heightmap, x, 0, sea_level, &mut visited, &mut starts, rng);
            add_start(heightmap, x, h - 1, sea_level, &mut visited, &mut starts, rng);
        }
    }
    if w > 1 {
        let y_range = if h > 1 { 1..h - 1 } else { 0..h };
        for y in y_range {
            add_start(heightmap, 0, y, sea_level, &mut visited, &mut starts, rng);
            add_start(heightmap, w - 1, y, sea_level, &mut visited, &mut starts, rng);
        }
    }

    tracing::debug!(count = starts.len(), "start points located");
    starts
}
