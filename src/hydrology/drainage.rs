//! C5: post-order accumulation of drainage over the flow forest (spec.md
//! §4.5). Uses an explicit heap-allocated stack rather than native
//! recursion — flow paths can exceed 65,536 cells, well past a typical OS
//! thread stack (spec.md §9 "Deep recursion → explicit stack").

use super::flow_tree::{FlowGrid, EAST, NORTH, SOUTH, WEST};
use super::start_points::StartPoint;

/// Computes `water[y,x] = 1 + sum(water[child])` for every cell reachable
/// from `roots`, and the maximum observed drainage across all roots (a
/// diagnostic, spec.md §4.5).
pub fn accumulate_drainage(flow: &FlowGrid, w: u32, h: u32, roots: &[StartPoint]) -> (Vec<u32>, u32) {
    let w = w as usize;
    let h = h as usize;
    let mut water = vec![0u32; w * h];
    let mut max_water = 0u32;

    // Two-phase iterative post-order: a node is pushed unexpanded, then
    // re-pushed expanded with all its children pushed unexpanded after it.
    // Children (being later on the stack) always pop and finish before the
    // parent's expanded entry is reached again, so `water` is always
    // populated for every child by the time the parent sums them.
    let mut stack: Vec<(usize, usize, bool)> = Vec::new();

    for root in roots {
        stack.push((root.x as usize, root.y as usize, false));

        while let Some((x, y, expanded)) = stack.pop() {
            let bits = flow[y * w + x];
            if expanded {
                let mut total = 1u32;
                if bits & WEST != 0 {
                    total += water[y * w + (x - 1)];
                }
                if bits & NORTH != 0 {
                    total += water[(y - 1) * w + x];
                }
                if bits & EAST != 0 {
                    total += water[y * w + (x + 1)];
                }
                if bits & SOUTH != 0 {
                    total += water[(y + 1) * w + x];
                }
                water[y * w + x] = total;
                if total > max_water {
                    max_water = total;
                }
            } else {
                stack.push((x, y, true));
                if bits & WEST != 0 {
                    stack.push((x - 1, y, false));
                }
                if bits & NORTH != 0 {
                    stack.push((x, y - 1, false));
                }
                if bits & EAST != 0 {
                    stack.push((x + 1, y, false));
                }
                if bits & SOUTH != 0 {
                    stack.push((x, y + 1, false));
                }
            }
        }
    }

    (water, max_water)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::hydrology::{build_flow_tree, find_start_points};
    use crate::rng::Rng;

    #[test]
    fn single_peak_drainage_sum_and_leaf() {
        // S2: 5x5, h[2,2]=5, else 1, sea_level=0.
        let mut values = vec![1.0f64; 25];
        values[2 * 5 + 2] = 5.0;
        let grid = Grid::from_vec(5, 5, values);
        let mut rng = Rng::new(20);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (water, max_water) = accumulate_drainage(&flow, 5, 5, &starts);

        let total: u32 = starts.iter().map(|s| water[s.y as usize * 5 + s.x as usize]).sum();
        assert_eq!(total, 25);

        let peak = water[2 * 5 + 2];
        assert_eq!(peak, 1, "the peak has no lower neighbour to claim as a child");

        assert!(max_water >= 9 && max_water <= 25);
    }

    #[test]
    fn drainage_sum_matches_land_cell_count() {
        let w = 8usize;
        let h = 8usize;
        let values: Vec<f64> = (0..w * h).map(|i| (i % 7) as f64 + 1.0).collect();
        let grid = Grid::from_vec(w, h, values);
        let mut rng = Rng::new(21);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (water, _max) = accumulate_drainage(&flow, w as u32, h as u32, &starts);

        let total: u32 = starts
            .iter()
            .map(|s| water[s.y as usize * w + s.x as usize])
            .sum();
        assert_eq!(total as usize, w * h);
    }

    #[test]
    fn deep_chain_does_not_overflow_the_stack() {
        // A 1x100_000 strip: one root at each end, a long single chain in
        // between. Exercises the explicit-stack requirement (spec.md §9).
        let len = 100_000usize;
        let mut values = vec![0.0f64; len];
        for (i, v) in values.iter_mut().enumerate() {
            let d = i.min(len - 1 - i);
            *v = 1.0 + d as f64; // peak in the middle, descending to both ends.
        }
        let grid = Grid::from_vec(len, 1, values);
        let mut rng = Rng::new(22);
        let starts = find_start_points(&grid, 0.0, &mut rng);
        let flow = build_flow_tree(&grid, 0.0, &starts, &mut rng);
        let (water, _max) = accumulate_drainage(&flow, len as u32, 1, &starts);

        let total: u32 = starts.iter().map(|s| water[s.y as usize * len + s.x as usize]).sum();
        assert_eq!(total as usize, len);
    }
}
