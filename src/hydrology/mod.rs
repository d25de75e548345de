//! The hydrology engine: start-point location (C3), flow-tree construction
//! (C4), drainage accumulation (C5) and river rasterization (C6) — spec.md
//! §4.3-§4.6. The four stages run in a fixed sequential pipeline; none of
//! them suspend or retry (spec.md §5).

pub mod drainage;
pub mod flow_tree;
pub mod rivers;
pub mod start_points;

pub use drainage::accumulate_drainage;
pub use flow_tree::{build_flow_tree, FlowGrid};
pub use rivers::rasterize_rivers;
pub use start_points::{find_start_points, StartPoint};

use crate::error::{GeomgError, Result};
use crate::grid::Grid;
use crate::rng::Rng;

/// The tunable parameters of the hydrology pipeline (spec.md §4.6, §9
/// "mutable module state → explicit context": no file-based config, these
/// are explicit struct fields the caller sets directly).
#[derive(Clone, Copy, Debug)]
pub struct HydrologyParams {
    pub sea_level: f64,
    pub river_limit: f64,
    pub river_power: f64,
    pub max_river_hdiff: f64,
}

/// Result of running the full C3->C4->C5->C6 pipeline once.
pub struct HydrologyOutput {
    pub flow: FlowGrid,
    pub drainage: Vec<u32>,
    pub max_water: u32,
    pub river_mask: Vec<bool>,
}

/// Runs start-point discovery, flow-tree construction, drainage
/// accumulation and river rasterization in sequence over one heightmap.
///
/// Validates the spec.md §7 `InvalidInput` preconditions this pipeline
/// depends on before running it: an empty heightmap (checked here, since
/// C3 has no guard of its own), and `river_limit <= 0` (checked by
/// `rasterize_rivers` and propagated, since that's where the division and
/// the overflow-prone cross-span arithmetic actually live).
pub fn run(heightmap: &Grid<f64>, params: &HydrologyParams, seed: u64) -> Result<HydrologyOutput> {
    if heightmap.w == 0 || heightmap.h == 0 {
        return Err(GeomgError::InvalidInput("heightmap is empty".into()));
    }

    let mut rng = Rng::new(seed);

    let starts = find_start_points(heightmap, params.sea_level, &mut rng);
    tracing::info!(count = starts.len(), "found start points");

    let flow = build_flow_tree(heightmap, params.sea_level, &starts, &mut rng);

    let (drainage, max_water) =
        accumulate_drainage(&flow, heightmap.w as u32, heightmap.h as u32, &starts);
    tracing::info!(max_water, "accumulated drainage");

    let river_mask = rasterize_rivers(
        heightmap,
        params.sea_level,
        &drainage,
        params.river_limit,
        params.river_power,
        params.max_river_hdiff,
    )?;

    Ok(HydrologyOutput {
        flow,
        drainage,
        max_water,
        river_mask,
    })
}
