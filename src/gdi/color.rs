//! Pixel format conversion.
//!
//! Every pixel read from a bitmap is decoded into the canonical [`Rgba`] form,
//! combined there by the raster engine, and encoded back into the native
//! depth of the destination. Supported depth classes:
//!
//! | bpp | class       | raw sample                             |
//! |-----|-------------|----------------------------------------|
//! | 1   | indexed     | palette index 0/1, rows packed MSB first |
//! | 8   | indexed     | palette index                          |
//! | 16  | packed RGB  | `RRRRRGGG GGGBBBBB` (5-6-5, no alpha)  |
//! | 24  | packed RGB  | bytes `B, G, R`                        |
//! | 32  | RGBA        | bytes `B, G, R, A`                     |
//!
//! Multi-byte samples are little-endian. Reductions are deterministic: 16-bit
//! channels truncate, indexed targets pick the nearest palette entry by
//! squared RGB distance with ties going to the lowest index.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::objects::Palette;
use crate::common::error::{Error, Result};

/// Color as carried by drawing orders, encoded `0x00BBGGRR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self((r as u32) | ((g as u32) << 8) | ((b as u32) << 16))
    }

    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Canonical form, fully opaque.
    #[inline]
    pub const fn to_rgba(self) -> Rgba {
        Rgba::new(self.red(), self.green(), self.blue(), 0xFF)
    }
}

impl From<Rgba> for Color {
    fn from(px: Rgba) -> Self {
        Color::rgb(px.r, px.g, px.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red(), self.green(), self.blue())
    }
}

/// Canonical pixel representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack into the 32-bit word the raster engine operates on.
    #[inline]
    pub const fn to_word(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16) | ((self.a as u32) << 24)
    }

    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self {
            r: (word & 0xFF) as u8,
            g: ((word >> 8) & 0xFF) as u8,
            b: ((word >> 16) & 0xFF) as u8,
            a: (word >> 24) as u8,
        }
    }

    #[inline]
    fn distance_sq(self, other: Rgba) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Bit-depth family of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthClass {
    Mono,
    Indexed8,
    Rgb16,
    Rgb24,
    Rgba32,
}

impl DepthClass {
    pub fn from_bpp(bits_per_pixel: u32) -> Result<Self> {
        match bits_per_pixel {
            1 => Ok(Self::Mono),
            8 => Ok(Self::Indexed8),
            16 => Ok(Self::Rgb16),
            24 => Ok(Self::Rgb24),
            32 => Ok(Self::Rgba32),
            other => Err(Error::UnsupportedDepth(format!(
                "{} bits per pixel",
                other
            ))),
        }
    }

    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Indexed8 => 8,
            Self::Rgb16 => 16,
            Self::Rgb24 => 24,
            Self::Rgba32 => 32,
        }
    }

    /// Bytes per stored sample. Monochrome samples occupy one bit of a byte.
    pub const fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel().div_ceil(8)
    }

    /// Smallest scanline, in bytes, that holds `width` pixels.
    pub const fn min_stride(self, width: u32) -> usize {
        ((width as usize) * (self.bits_per_pixel() as usize)).div_ceil(8)
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Mono | Self::Indexed8)
    }

    /// Bits of a raw sample that hold a palette index.
    pub const fn index_mask(self) -> Option<u32> {
        match self {
            Self::Mono => Some(0x01),
            Self::Indexed8 => Some(0xFF),
            _ => None,
        }
    }

    /// Decode a raw sample value into canonical form.
    pub fn decode(self, raw: u32, palette: Option<&Palette>) -> Result<Rgba> {
        match self {
            Self::Mono | Self::Indexed8 => {
                let palette = require_palette(self, palette)?;
                let index = if self == Self::Mono { raw & 1 } else { raw & 0xFF };
                palette
                    .entry(index as usize)
                    .ok_or_else(|| {
                        Error::UnsupportedDepth(format!(
                            "index {} outside palette of {} entries",
                            index,
                            palette.len()
                        ))
                    })
            },
            Self::Rgb16 => {
                let r5 = ((raw >> 11) & 0x1F) as u8;
                let g6 = ((raw >> 5) & 0x3F) as u8;
                let b5 = (raw & 0x1F) as u8;
                Ok(Rgba::new(
                    (r5 << 3) | (r5 >> 2),
                    (g6 << 2) | (g6 >> 4),
                    (b5 << 3) | (b5 >> 2),
                    0xFF,
                ))
            },
            Self::Rgb24 => Ok(Rgba::new(
                ((raw >> 16) & 0xFF) as u8,
                ((raw >> 8) & 0xFF) as u8,
                (raw & 0xFF) as u8,
                0xFF,
            )),
            Self::Rgba32 => Ok(Rgba::new(
                ((raw >> 16) & 0xFF) as u8,
                ((raw >> 8) & 0xFF) as u8,
                (raw & 0xFF) as u8,
                (raw >> 24) as u8,
            )),
        }
    }

    /// Encode a canonical pixel into a raw sample value.
    pub fn encode(self, px: Rgba, palette: Option<&Palette>) -> Result<u32> {
        match self {
            Self::Mono | Self::Indexed8 => {
                let palette = require_palette(self, palette)?;
                let limit = if self == Self::Mono { 2 } else { 256 };
                nearest_index(palette, px, limit)
            },
            Self::Rgb16 => {
                Ok(((px.r as u32 >> 3) << 11) | ((px.g as u32 >> 2) << 5) | (px.b as u32 >> 3))
            },
            Self::Rgb24 => Ok(((px.r as u32) << 16) | ((px.g as u32) << 8) | px.b as u32),
            Self::Rgba32 => Ok(((px.a as u32) << 24)
                | ((px.r as u32) << 16)
                | ((px.g as u32) << 8)
                | px.b as u32),
        }
    }

    /// Fail early when this depth cannot be converted without a palette.
    pub fn check_palette(self, palette: Option<&Palette>) -> Result<()> {
        if self.is_indexed() {
            require_palette(self, palette)?;
        }
        Ok(())
    }
}

impl fmt::Display for DepthClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bpp", self.bits_per_pixel())
    }
}

fn require_palette(depth: DepthClass, palette: Option<&Palette>) -> Result<&Palette> {
    match palette {
        Some(p) if !p.is_empty() => Ok(p),
        Some(_) => Err(Error::UnsupportedDepth(format!("{} with an empty palette", depth))),
        None => Err(Error::UnsupportedDepth(format!("{} requires a palette", depth))),
    }
}

fn nearest_index(palette: &Palette, px: Rgba, limit: usize) -> Result<u32> {
    let mut best = 0usize;
    let mut best_distance = u32::MAX;
    for (index, entry) in palette.entries().iter().take(limit).enumerate() {
        let distance = entry.to_rgba().distance_sq(px);
        if distance < best_distance {
            best = index;
            best_distance = distance;
            if distance == 0 {
                break;
            }
        }
    }
    Ok(best as u32)
}

/// Decode a little-endian sample into canonical form.
///
/// For the monochrome class the lowest bit of the first byte is the index.
pub fn to_canonical(depth: DepthClass, raw: &[u8], palette: Option<&Palette>) -> Result<Rgba> {
    let width = depth.bytes_per_pixel() as usize;
    if raw.len() < width {
        return Err(Error::UnsupportedDepth(format!(
            "{} sample needs {} bytes, got {}",
            depth,
            width,
            raw.len()
        )));
    }
    let value = raw[..width]
        .iter()
        .rev()
        .fold(0u32, |acc, &byte| (acc << 8) | byte as u32);
    depth.decode(value, palette)
}

/// Encode a canonical pixel into little-endian sample bytes.
pub fn from_canonical(
    depth: DepthClass,
    px: Rgba,
    palette: Option<&Palette>,
) -> Result<SmallVec<[u8; 4]>> {
    let value = depth.encode(px, palette)?;
    let width = depth.bytes_per_pixel() as usize;
    Ok(value.to_le_bytes()[..width].iter().copied().collect())
}
