//! C6: convert drainage into a variable-width boolean river mask (spec.md
//! §4.6). Grounded on `original_source/rivers.py`'s `draw_river`: an
//! axis-aligned cross clipped by a height ceiling, cheaper than a disk and
//! monotone under increasing drainage.

use crate::error::{GeomgError, Result};
use crate::grid::Grid;

/// Produces a boolean mask the same shape as `heightmap`. Sea cells are
/// never visited; a land cell whose drainage reaches `river_limit` paints
/// either itself (`rsize <= 1`) or a height-clipped cross of half-width
/// `rsize - 1` centered on it.
///
/// Rejects `river_limit <= 0` with `InvalidInput` (spec.md §7): at
/// `river_limit == 0` every land cell would satisfy `water >= river_limit`,
/// `water / river_limit` divides by zero, and the resulting `rsize` blows
/// up the cross span's `usize` arithmetic below.
pub fn rasterize_rivers(
    heightmap: &Grid<f64>,
    sea_level: f64,
    drainage: &[u32],
    river_limit: f64,
    river_power: f64,
    max_river_hdiff: f64,
) -> Result<Vec<bool>> {
    if !(river_limit > 0.0) {
        return Err(GeomgError::InvalidInput("river_limit must be positive".into()));
    }

    let w = heightmap.w;
    let h = heightmap.h;
    let mut mask = vec![false; w * h];

    for y in 0..h {
        for x in 0..w {
            if heightmap.get(x, y) <= sea_level {
                continue;
            }
            let water = drainage[y * w + x] as f64;
            if water < river_limit {
                continue;
            }
            let rsize = (water / river_limit).powf(river_power).floor() as i64;
            if rsize <= 1 {
                mask[y * w + x] = true;
                continue;
            }

            let hmax = heightmap.get(x, y) + max_river_hdiff;
            let r = (rsize - 1) as usize;

            let xmin = x.saturating_sub(r);
            let xmax = (x + r + 1).min(w);
            for xi in xmin..xmax {
                if heightmap.get(xi, y) <= hmax {
                    mask[y * w + xi] = true;
                }
            }

            let ymin = y.saturating_sub(r);
            let ymax = (y + r + 1).min(h);
            for yi in ymin..ymax {
                if heightmap.get(x, yi) <= hmax {
                    mask[yi * w + x] = true;
                }
            }
        }
    }

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::{accumulate_drainage, build_flow_tree, find_start_points};
    use crate::rng::Rng;

    #[test]
    fn flat_island_has_no_rivers() {
        // S1: river_limit of 10000 is unreachable for an 8x8 island.
        let grid = Grid::from_vec(8, 8, vec![10.0; 64]);
        let mut rng = Rng::new(30);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (drainage, _) = accumulate_drainage(&flow, 8, 8, &starts);
        let mask = rasterize_rivers(&grid, 0.0, &drainage, 10000.0, 0.25, 40.0).unwrap();
        assert!(mask.iter().all(|&v| !v));
    }

    #[test]
    fn river_mask_is_a_subset_of_land() {
        let w = 12usize;
        let h = 12usize;
        let values: Vec<f64> = (0..w * h).map(|i| (i % 9) as f64 - 2.0).collect();
        let grid = Grid::from_vec(w, h, values);
        let mut rng = Rng::new(31);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (drainage, _) = accumulate_drainage(&flow, w as u32, h as u32, &starts);
        let mask = rasterize_rivers(&grid, 0.0, &drainage, 3.0, 0.5, 5.0).unwrap();

        for y in 0..h {
            for x in 0..w {
                if mask[y * w + x] {
                    assert!(grid.get(x, y) > 0.0);
                }
            }
        }
    }

    #[test]
    fn v_valley_endpoints_drain_the_whole_row() {
        // S3: both endpoints are roots, and drainage sums to the full row.
        let grid = Grid::from_vec(10, 1, vec![5.0, 4.0, 3.0, 2.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut rng = Rng::new(32);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        assert_eq!(starts.len(), 2);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (drainage, _max) = accumulate_drainage(&flow, 10, 1, &starts);
        let total: u32 = starts.iter().map(|s| drainage[s.x as usize]).sum();
        assert_eq!(total, 10);

        let mask = rasterize_rivers(&grid, 0.0, &drainage, 3.0, 1.0, 2.0).unwrap();
        // Any painted cell must itself have drainage >= 1 and lie on land.
        for x in 0..10 {
            if mask[x] {
                assert!(grid.get(x, 0) > 0.0);
            }
        }
    }

    #[test]
    fn single_cell_rsize_paints_only_itself() {
        let grid = Grid::from_vec(5, 5, vec![10.0; 25]);
        let drainage = vec![4u32; 25];
        // (4/4)^1 = 1 -> rsize <= 1, paints only the cell itself.
        let mask = rasterize_rivers(&grid, 0.0, &drainage, 4.0, 1.0, 100.0).unwrap();
        assert_eq!(mask.iter().filter(|&&v| v).count(), 25);
    }

    #[test]
    fn non_positive_river_limit_is_rejected() {
        let grid = Grid::from_vec(4, 4, vec![10.0; 16]);
        let drainage = vec![1u32; 16];
        assert!(matches!(
            rasterize_rivers(&grid, 0.0, &drainage, 0.0, 1.0, 10.0),
            Err(GeomgError::InvalidInput(_))
        ));
        assert!(matches!(
            rasterize_rivers(&grid, 0.0, &drainage, -5.0, 1.0, 10.0),
            Err(GeomgError::InvalidInput(_))
        ));
    }
}
