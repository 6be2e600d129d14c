// Geo/paint blob codec.
// Blobs are base64 of zlib-compressed bytes; decoded content is handled as
// lowercase hex digits. A geo grid is GEO_SIZE cells, two digits per cell,
// row-major with (0, 0) in the top left.
use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{Error, Result};

/// Geo grid width and height in cells.
pub const GEO_SIZE: (usize, usize) = (81, 46);

/// Paint grid width and height.
pub const PAINT_SIZE: (usize, usize) = (162, 92);

/// base64 → zlib inflate → hex digits.
pub fn decode(data: &str) -> Result<String> {
    let compressed = STANDARD.decode(data.trim())?;
    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| Error::Decode(format!("zlib: {}", e)))?;
    Ok(hex::encode(raw))
}

/// Inverse of [`decode`].
pub fn encode(digits: &str) -> Result<String> {
    let raw = hex::decode(digits)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

pub type GeoCell = [char; 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geo {
    cells: Vec<GeoCell>,
}

/// Decodes a screen's geo blob.
pub fn geo(data: &str) -> Result<Geo> {
    Geo::from_hex(&decode(data)?)
}

impl Geo {
    pub const WIDTH: usize = GEO_SIZE.0;
    pub const HEIGHT: usize = GEO_SIZE.1;

    pub fn from_hex(digits: &str) -> Result<Self> {
        let expected = 2 * Self::WIDTH * Self::HEIGHT;
        if digits.len() != expected {
            return Err(Error::DataIntegrity(format!(
                "data size incorrect ({} hex digits, expected {}), possibly not geo data",
                digits.len(),
                expected
            )));
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::DataIntegrity(format!(
                "geo data contains non-hex character {:?}",
                bad
            )));
        }
        let chars: Vec<char> = digits.chars().collect();
        let cells = chars.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
        Ok(Self { cells })
    }

    pub fn width(&self) -> usize {
        Self::WIDTH
    }

    pub fn height(&self) -> usize {
        Self::HEIGHT
    }

    fn offset(x: usize, y: usize) -> Result<usize> {
        if x >= Self::WIDTH {
            return Err(Error::IndexOutOfRange(format!(
                "x value must be between 0 and {}, got {}",
                Self::WIDTH - 1,
                x
            )));
        }
        if y >= Self::HEIGHT {
            return Err(Error::IndexOutOfRange(format!(
                "y value must be between 0 and {}, got {}",
                Self::HEIGHT - 1,
                y
            )));
        }
        Ok(y * Self::WIDTH + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<GeoCell> {
        Ok(self.cells[Self::offset(x, y)?])
    }

    pub fn set(&mut self, x: usize, y: usize, cell: GeoCell) -> Result<()> {
        if !cell.iter().all(char::is_ascii_hexdigit) {
            return Err(Error::wrong_kind("geo cell", "two hex digits"));
        }
        let i = Self::offset(x, y)?;
        self.cells[i] = [cell[0].to_ascii_lowercase(), cell[1].to_ascii_lowercase()];
        Ok(())
    }

    /// `(x, y, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, GeoCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (i % Self::WIDTH, i / Self::WIDTH, *c))
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, GeoCell> {
        self.cells.chunks_exact(Self::WIDTH)
    }

    pub fn to_hex(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    /// Blob suitable for `ScreenRecord::set_geo`.
    pub fn encode(&self) -> Result<String> {
        encode(&self.to_hex())
    }
}
