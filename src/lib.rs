//! GEOMG: a tiled raster codec plus a priority-driven hydrology engine,
//! converting georeferenced elevation (and optional river/land-cover)
//! rasters into the compact, tile-indexed, compressed GEOMG container
//! consumed by a downstream voxel-terrain generator.
//!
//! The hydrology engine ([`hydrology`]) derives a flow forest from every
//! land pixel toward the sea, accumulates drainage, and rasterizes a
//! variable-width river mask. The codec ([`codec`]) serializes one or more
//! aligned raster layers into the GEOMG container format.

pub mod codec;
pub mod error;
pub mod grid;
pub mod hydrology;
pub mod legend;
pub mod raster;
pub mod rng;

pub use error::{GeomgError, Result};
pub use raster::{ElementType, Raster, RasterProvider};
