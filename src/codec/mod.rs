//! The GEOMG container format: per-layer tiling and compression (C1, see
//! [`tile`]) behind a single-file container with a shared tile grid (C2,
//! see [`container`]). Fully specified in spec.md §4.1-§4.2.

pub mod container;
pub mod tile;

pub use container::ContainerBuilder;
pub use tile::{write_layer, LayerType, TileView};

pub const MAGIC: &[u8; 5] = b"GEOMG";
pub const VERSION: u8 = 0x02;
