//! Brush patterns.
//!
//! A brush is flattened into a [`PatternTile`] before a fill starts. The tile
//! is anchored at the surface origin and repeats in both directions. Cells the
//! brush does not paint (hatch gaps, the 1-bits of a monochrome pattern) take
//! the background color in opaque mode and stay untouched in transparent
//! mode.

use smallvec::SmallVec;

use super::color::{Color, Rgba};
use super::dc::BackgroundMode;
use super::objects::{Bitmap, Brush, BrushStyle, Palette};
use crate::common::error::{Error, Result};

/// Hatch patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum HatchStyle {
    Horizontal = 0,
    Vertical = 1,
    FDiagonal = 2,
    BDiagonal = 3,
    Cross = 4,
    DiagCross = 5,
}

impl HatchStyle {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Horizontal),
            1 => Some(Self::Vertical),
            2 => Some(Self::FDiagonal),
            3 => Some(Self::BDiagonal),
            4 => Some(Self::Cross),
            5 => Some(Self::DiagCross),
            _ => None,
        }
    }

    /// Row masks of the 8x8 cell; bit `0x80 >> x` marks a hatch pixel.
    pub fn rows(self) -> [u8; 8] {
        let mut rows = [0u8; 8];
        for (y, row) in rows.iter_mut().enumerate() {
            *row = match self {
                Self::Horizontal => {
                    if y == 4 {
                        0xFF
                    } else {
                        0x00
                    }
                },
                Self::Vertical => 0x08,
                Self::FDiagonal => 0x80 >> y,
                Self::BDiagonal => 0x01 << y,
                Self::Cross => {
                    if y == 4 {
                        0xFF
                    } else {
                        0x08
                    }
                },
                Self::DiagCross => (0x80 >> y) | (0x01 << y),
            };
        }
        rows
    }

    #[inline]
    pub fn is_set(self, x: i32, y: i32) -> bool {
        let row = self.rows()[y.rem_euclid(8) as usize];
        row & (0x80 >> x.rem_euclid(8)) != 0
    }
}

/// DC state that decides how unpainted pattern cells are treated.
#[derive(Debug, Clone, Copy)]
pub struct PatternColors {
    pub text: Color,
    pub background: Color,
    pub mode: BackgroundMode,
}

impl PatternColors {
    fn gap(&self) -> Option<Rgba> {
        match self.mode {
            BackgroundMode::Opaque => Some(self.background.to_rgba()),
            BackgroundMode::Transparent => None,
        }
    }
}

/// Flattened brush; `None` cells are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTile {
    width: i32,
    height: i32,
    cells: SmallVec<[Option<Rgba>; 64]>,
}

impl PatternTile {
    pub fn solid(color: Color) -> Self {
        let mut cells = SmallVec::new();
        cells.push(Some(color.to_rgba()));
        Self {
            width: 1,
            height: 1,
            cells,
        }
    }

    pub fn hatched(hatch: HatchStyle, color: Color, colors: &PatternColors) -> Self {
        let fore = Some(color.to_rgba());
        let gap = colors.gap();
        let cells = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .map(|(x, y)| if hatch.is_set(x, y) { fore } else { gap })
            .collect();
        Self {
            width: 8,
            height: 8,
            cells,
        }
    }

    /// Tile from a pattern bitmap.
    ///
    /// Monochrome patterns paint their 0-bits with the text color and treat
    /// their 1-bits as background. Other depths are decoded with `palette`.
    pub fn from_bitmap(
        bitmap: &Bitmap,
        palette: Option<&Palette>,
        colors: &PatternColors,
    ) -> Result<Self> {
        let (width, height) = (bitmap.width() as i32, bitmap.height() as i32);
        if width == 0 || height == 0 {
            return Err(Error::Geometry("empty pattern bitmap".to_string()));
        }
        let mono = bitmap.depth() == super::color::DepthClass::Mono;
        let mut cells = SmallVec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let raw = bitmap.read_raw(x as u32, y as u32);
                let cell = if mono {
                    if raw == 0 {
                        Some(colors.text.to_rgba())
                    } else {
                        colors.gap()
                    }
                } else {
                    Some(bitmap.depth().decode(raw, palette)?)
                };
                cells.push(cell);
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Flatten `brush`; `None` for a null brush, which paints nothing.
    pub fn from_brush(
        brush: &Brush,
        pattern: Option<&Bitmap>,
        palette: Option<&Palette>,
        colors: &PatternColors,
    ) -> Result<Option<Self>> {
        match brush.style {
            BrushStyle::Null => Ok(None),
            BrushStyle::Solid => Ok(Some(Self::solid(brush.color))),
            BrushStyle::Hatched => {
                let hatch = brush
                    .hatch
                    .ok_or_else(|| Error::InvalidHandle("hatched brush has no hatch style".to_string()))?;
                Ok(Some(Self::hatched(hatch, brush.color, colors)))
            },
            BrushStyle::Pattern => {
                let bitmap = pattern.ok_or_else(|| Error::not_selected("pattern bitmap"))?;
                Self::from_bitmap(bitmap, palette, colors).map(Some)
            },
        }
    }

    /// Pattern pixel for surface position `(x, y)`.
    #[inline]
    pub fn sample(&self, x: i32, y: i32) -> Option<Rgba> {
        let tx = x.rem_euclid(self.width);
        let ty = y.rem_euclid(self.height);
        self.cells[(ty * self.width + tx) as usize]
    }
}
