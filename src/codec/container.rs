//! C2: the container header and layer ordering (spec.md §4.2). Grounded on
//! `original_source/database.py`'s `generate()`, extended to version `0x02`
//! with the projection descriptor and geotransform fields.

use std::io::Write;

use crate::error::{GeomgError, Result};
use crate::raster::RasterProvider;

use super::tile::{self, LayerType, Transform};
use super::{MAGIC, VERSION};

struct LayerEntry<'a> {
    layer_type: LayerType,
    raster: &'a dyn RasterProvider,
    metadata: Vec<u8>,
    transform: Option<&'a Transform<'a>>,
}

/// Owns the ordered, tag-deduplicated layer list for one container (spec.md
/// §9 "mutable module state → explicit context": the source's global
/// `layer_count` becomes this builder's field).
pub struct ContainerBuilder<'a> {
    frag: u16,
    proj: String,
    geotransform: [f64; 6],
    x: u32,
    y: u32,
    layers: Vec<LayerEntry<'a>>,
}

impl<'a> ContainerBuilder<'a> {
    pub fn new(frag: u16, proj: impl Into<String>, geotransform: [f64; 6], x: u32, y: u32) -> Result<Self> {
        if frag == 0 {
            return Err(GeomgError::InvalidInput("frag must be nonzero".into()));
        }
        if x == 0 || y == 0 {
            return Err(GeomgError::InvalidInput("container dimensions must be nonzero".into()));
        }
        Ok(Self {
            frag,
            proj: proj.into(),
            geotransform,
            x,
            y,
            layers: Vec::new(),
        })
    }

    /// Dimensions padded up to a multiple of `frag`, shared by every layer.
    pub fn padded_dims(&self) -> (u32, u32) {
        let frag = self.frag as u32;
        (self.x.div_ceil(frag) * frag, self.y.div_ceil(frag) * frag)
    }

    /// Registers a layer. Rejects a second layer with the same tag
    /// (spec.md §3: "at most one layer per tag").
    pub fn add_layer(
        &mut self,
        layer_type: LayerType,
        raster: &'a dyn RasterProvider,
        metadata: Vec<u8>,
        transform: Option<&'a Transform<'a>>,
    ) -> Result<()> {
        if self.layers.iter().any(|l| l.layer_type == layer_type) {
            return Err(GeomgError::InvalidInput(format!(
                "duplicate layer tag {}",
                layer_type.tag()
            )));
        }
        if self.layers.len() >= 255 {
            return Err(GeomgError::TooManyLayers);
        }
        self.layers.push(LayerEntry {
            layer_type,
            raster,
            metadata,
            transform,
        });
        Ok(())
    }

    /// Emits the container header, then each layer in ascending tag order
    /// via [`tile::write_layer`].
    pub fn write<W: Write>(mut self, sink: &mut W) -> Result<()> {
        if self.layers.len() > 255 {
            return Err(GeomgError::TooManyLayers);
        }
        self.layers.sort_by_key(|l| l.layer_type.tag());

        let (padded_x, padded_y) = self.padded_dims();
        if padded_x > u16::MAX as u32 || padded_y > u16::MAX as u32 {
            return Err(GeomgError::InvalidInput(
                "padded dimensions exceed the format's 16-bit fields".into(),
            ));
        }

        for l in &self.layers {
            if l.raster.dims() != (padded_x, padded_y) {
                return Err(GeomgError::UnalignedLayer);
            }
        }

        let proj_bytes = self.proj.as_bytes();
        if proj_bytes.len() > u16::MAX as usize {
            return Err(GeomgError::InvalidInput("projection descriptor too long".into()));
        }

        sink.write_all(MAGIC)?;
        sink.write_all(&[VERSION])?;
        sink.write_all(&self.frag.to_le_bytes())?;
        sink.write_all(&(padded_x as u16).to_le_bytes())?;
        sink.write_all(&(padded_y as u16).to_le_bytes())?;
        sink.write_all(&(proj_bytes.len() as u16).to_le_bytes())?;
        sink.write_all(proj_bytes)?;
        for v in &self.geotransform {
            sink.write_all(&v.to_le_bytes())?;
        }
        sink.write_all(&[self.layers.len() as u8])?;

        tracing::info!(
            frag = self.frag,
            x = padded_x,
            y = padded_y,
            layers = self.layers.len(),
            "writing container"
        );

        for l in &self.layers {
            tile::write_layer(sink, l.raster, l.layer_type, &l.metadata, self.frag, l.transform)?;
        }

        Ok(())
    }
}
