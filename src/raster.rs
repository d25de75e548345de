//! The `RasterProvider` contract (spec.md §6) and a concrete in-memory
//! raster that implements it. Reprojection, resampling and format decoding
//! live outside the core — callers hand us an already-aligned 2-D raster
//! through this trait.

use crate::error::{GeomgError, Result};

/// Closed set of element kinds the codec and hydrology engine understand
/// (spec.md §9 "Duck-typed raster element type → tagged variant").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ElementType {
    /// Element width in bytes.
    pub fn width(self) -> u8 {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::U64 | ElementType::I64 | ElementType::F64 => 8,
        }
    }

    /// The `k` half of the `number_type` byte: 0 unsigned, 1 signed, 2 float.
    fn kind_code(self) -> u8 {
        match self {
            ElementType::U8 | ElementType::U16 | ElementType::U32 | ElementType::U64 => 0,
            ElementType::I8 | ElementType::I16 | ElementType::I32 | ElementType::I64 => 1,
            ElementType::F32 | ElementType::F64 => 2,
        }
    }

    /// Single-byte `number_type` encoding from spec.md §4.1: `k*16 + w`.
    pub fn number_type_byte(self) -> u8 {
        self.kind_code() * 16 + self.width()
    }

    /// Inverse of [`number_type_byte`](Self::number_type_byte).
    pub fn from_number_type_byte(b: u8) -> Result<Self> {
        let k = b / 16;
        let w = b % 16;
        Ok(match (k, w) {
            (0, 1) => ElementType::U8,
            (0, 2) => ElementType::U16,
            (0, 4) => ElementType::U32,
            (0, 8) => ElementType::U64,
            (1, 1) => ElementType::I8,
            (1, 2) => ElementType::I16,
            (1, 4) => ElementType::I32,
            (1, 8) => ElementType::I64,
            (2, 4) => ElementType::F32,
            (2, 8) => ElementType::F64,
            _ => return Err(GeomgError::InvalidInput(format!("unsupported number_type byte {b:#04x}"))),
        })
    }

    /// Decode one element at `bytes[0..width]` (little-endian) to an `f64`,
    /// used by the hydrology engine which compares heights numerically
    /// regardless of the raster's storage type.
    pub fn decode_f64(self, bytes: &[u8]) -> f64 {
        match self {
            ElementType::U8 => bytes[0] as f64,
            ElementType::U16 => u16::from_le_bytes(bytes[..2].try_into().unwrap()) as f64,
            ElementType::U32 => u32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ElementType::U64 => u64::from_le_bytes(bytes[..8].try_into().unwrap()) as f64,
            ElementType::I8 => bytes[0] as i8 as f64,
            ElementType::I16 => i16::from_le_bytes(bytes[..2].try_into().unwrap()) as f64,
            ElementType::I32 => i32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ElementType::I64 => i64::from_le_bytes(bytes[..8].try_into().unwrap()) as f64,
            ElementType::F32 => f32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ElementType::F64 => f64::from_le_bytes(bytes[..8].try_into().unwrap()),
        }
    }

    /// Encode an `f64` back into `width` little-endian bytes, truncating or
    /// rounding as the target type requires. Used by the river-mask and
    /// boolean-layer writers which synthesize a raster from a computed
    /// array rather than from a decoded one.
    pub fn encode_f64(self, v: f64, out: &mut [u8]) {
        match self {
            ElementType::U8 => out[0] = v as u8,
            ElementType::U16 => out[..2].copy_from_slice(&(v as u16).to_le_bytes()),
            ElementType::U32 => out[..4].copy_from_slice(&(v as u32).to_le_bytes()),
            ElementType::U64 => out[..8].copy_from_slice(&(v as u64).to_le_bytes()),
            ElementType::I8 => out[0] = (v as i8) as u8,
            ElementType::I16 => out[..2].copy_from_slice(&(v as i16).to_le_bytes()),
            ElementType::I32 => out[..4].copy_from_slice(&(v as i32).to_le_bytes()),
            ElementType::I64 => out[..8].copy_from_slice(&(v as i64).to_le_bytes()),
            ElementType::F32 => out[..4].copy_from_slice(&(v as f32).to_le_bytes()),
            ElementType::F64 => out[..8].copy_from_slice(&v.to_le_bytes()),
        }
    }
}

/// The external raster contract (spec.md §6). Reprojection and resampling
/// between coordinate reference systems happen upstream of this trait;
/// implementors hand the core an already-aligned 2-D raster. `Sync` so tile
/// compression (spec.md §5) can read tiles from multiple threads.
pub trait RasterProvider: Sync {
    fn dims(&self) -> (u32, u32);
    fn element_type(&self) -> ElementType;
    fn projection(&self) -> &str;
    /// GDAL convention: `x = a + b*px + c*py`, `y = d + e*px + f*py`.
    fn geotransform(&self) -> [f64; 6];
    /// Dense row-major little-endian buffer of the requested window.
    /// Implementors should zero-fill any portion of the window that falls
    /// outside the raster's logical extent (the tile writer relies on this
    /// for the padded-edge-tile rule, spec.md §9 open question 1).
    fn read_region(&self, x: u32, y: u32, w: u32, h: u32) -> Vec<u8>;
}

/// A concrete, owned, in-memory raster: the type tests and small-to-medium
/// pipelines build directly. Backed by a flat little-endian byte buffer
/// rather than a typed `Vec<T>` so one struct serves all ten element kinds.
#[derive(Clone, Debug)]
pub struct Raster {
    width: u32,
    height: u32,
    element_type: ElementType,
    projection: String,
    geotransform: [f64; 6],
    data: Vec<u8>,
}

impl Raster {
    pub fn new(
        width: u32,
        height: u32,
        element_type: ElementType,
        projection: impl Into<String>,
        geotransform: [f64; 6],
        data: Vec<u8>,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * element_type.width() as usize;
        if data.len() != expected {
            return Err(GeomgError::InvalidInput(format!(
                "raster buffer is {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            element_type,
            projection: projection.into(),
            geotransform,
            data,
        })
    }

    /// Build a raster from an `f64` height field, re-encoded into `element_type`.
    pub fn from_f64(
        width: u32,
        height: u32,
        element_type: ElementType,
        projection: impl Into<String>,
        geotransform: [f64; 6],
        values: &[f64],
    ) -> Result<Self> {
        let ew = element_type.width() as usize;
        let mut data = vec![0u8; values.len() * ew];
        for (i, &v) in values.iter().enumerate() {
            element_type.encode_f64(v, &mut data[i * ew..(i + 1) * ew]);
        }
        Raster::new(width, height, element_type, projection, geotransform, data)
    }

    /// Value at `(x, y)` decoded to `f64`, regardless of storage type.
    pub fn value_f64(&self, x: u32, y: u32) -> f64 {
        let ew = self.element_type.width() as usize;
        let off = (y as usize * self.width as usize + x as usize) * ew;
        self.element_type.decode_f64(&self.data[off..off + ew])
    }

}

impl RasterProvider for Raster {
    fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn projection(&self) -> &str {
        &self.projection
    }

    fn geotransform(&self) -> [f64; 6] {
        self.geotransform
    }

    fn read_region(&self, x: u32, y: u32, w: u32, h: u32) -> Vec<u8> {
        let ew = self.element_type.width() as usize;
        let mut out = vec![0u8; w as usize * h as usize * ew];
        for row in 0..h {
            let sy = y + row;
            if sy >= self.height {
                continue;
            }
            let cols = if x < self.width { (self.width - x).min(w) } else { 0 };
            if cols == 0 {
                continue;
            }
            let src_off = (sy as usize * self.width as usize + x as usize) * ew;
            let dst_off = (row as usize * w as usize) * ew;
            let n = cols as usize * ew;
            out[dst_off..dst_off + n].copy_from_slice(&self.data[src_off..src_off + n]);
        }
        out
    }
}
