//! C4: rising-altitude flood producing the 4-bit flow-direction grid
//! (spec.md §4.4). Grounded on `original_source/rivers.py`'s heap loop
//! (`process_neighbors`/`try_push`) for the algorithm, and on the min-heap
//! idiom in `other_examples/45d609fd_jgeibel-forge__src-world-generator-hydrology.rs.rs`'s
//! `FloatOrd` (and the teacher's own `FloodEntry` in the original
//! `hydrology.rs`) for expressing a min-heap over `BinaryHeap`, which is a
//! max-heap by default.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::grid::Grid;
use crate::rng::Rng;

use super::start_points::StartPoint;

/// One byte per cell; only the low 4 bits are used (spec.md §9 "packed
/// 4-bit-per-cell layout is not worth the bit-twiddling complexity").
/// Bit 0 = west child `(y,x-1)`, bit 1 = north child `(y-1,x)`, bit 2 =
/// east child `(y,x+1)`, bit 3 = south child `(y+1,x)`.
pub type FlowGrid = Vec<u8>;

pub const WEST: u8 = 1;
pub const NORTH: u8 = 2;
pub const EAST: u8 = 4;
pub const SOUTH: u8 = 8;

#[derive(Clone, Copy, Debug)]
struct HeapEntry {
    key: f64,
    y: u32,
    x: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.y == other.y && self.x == other.x
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert the comparison so pop() returns
        // the lowest `(key, y, x)` tuple, matching spec.md's min-heap.
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.y.cmp(&self.y))
            .then_with(|| other.x.cmp(&self.x))
    }
}

/// Builds the flow-direction grid by popping the minimum-keyed frontier
/// cell and discovering its unvisited land neighbours, each pushed with a
/// freshly jittered `height + U` key (spec.md §4.4).
pub fn build_flow_tree(
    heightmap: &Grid<f64>,
    sea_level: f64,
    start_points: &[StartPoint],
    rng: &mut Rng,
) -> FlowGrid {
    let w = heightmap.w;
    let h = heightmap.h;
    let mut visited = vec![false; w * h];
    let mut flow = vec![0u8; w * h];
    let mut heap = BinaryHeap::with_capacity(start_points.len());

    for sp in start_points {
        visited[sp.y as usize * w + sp.x as usize] = true;
        heap.push(HeapEntry { key: sp.key, y: sp.y, x: sp.x });
    }

    let mut remaining = w * h - start_points.len();
    let total = remaining;

    while let Some(entry) = heap.pop() {
        let x = entry.x as usize;
        let y = entry.y as usize;
        let mut bits = 0u8;

        let mut try_claim = |nx: usize, ny: usize, bit: u8, visited: &mut [bool], heap: &mut BinaryHeap<HeapEntry>, rng: &mut Rng| {
            let idx = ny * w + nx;
            if visited[idx] {
                return 0u8;
            }
            let height = heightmap.get(nx, ny);
            if height <= sea_level {
                return 0u8;
            }
            visited[idx] = true;
            heap.push(HeapEntry {
                key: height + rng.next_f64(),
                y: ny as u32,
                x: nx as u32,
            });
            bit
        };

        if x > 0 {
            bits |= try_claim(x - 1, y, WEST, &mut visited, &mut heap, rng);
        }
        if y > 0 {
            bits |= try_claim(x, y - 1, NORTH, &mut visited, &mut heap, rng);
        }
        if x + 1 < w {
            bits |= try_claim(x + 1, y, EAST, &mut visited, &mut heap, rng);
        }
        if y + 1 < h {
            bits |= try_claim(x, y + 1, SOUTH, &mut visited, &mut heap, rng);
        }

        flow[y * w + x] = bits;

        if bits.count_ones() > 0 {
            remaining -= bits.count_ones() as usize;
            if total > 0 && remaining % 1_000_000 == 0 {
                tracing::trace!(remaining, queue_len = heap.len(), "flow tree progress");
            }
        }
    }

    flow
}
