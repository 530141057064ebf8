// GDI object store
//
// Bitmaps, pens, brushes, palettes and regions live in one arena and are
// addressed by generational handles. Device contexts refer to objects only
// through those handles, so a deleted object can never be reached through a
// stale reference.

use super::arena::{Arena, RawHandle};
use super::color::{Color, DepthClass, Rgba};
use super::pattern::HatchStyle;
use super::region::{Rect, Region};
use crate::common::error::{Error, ObjectKind, Result};

/// Opaque handle to an object in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GdiHandle(pub(crate) RawHandle);

impl GdiHandle {
    /// Integer form for callers that pass handles through untyped channels.
    pub fn to_raw(self) -> u64 {
        self.0.to_u64()
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(RawHandle::from_u64(raw))
    }
}

/// Pen styles from GDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PenStyle {
    #[default]
    Solid = 0,
    Dash = 1,
    Null = 5,
}

impl PenStyle {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value & 0xFF {
            0 => Some(Self::Solid),
            1 => Some(Self::Dash),
            5 => Some(Self::Null),
            _ => None,
        }
    }
}

/// Brush styles from GDI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum BrushStyle {
    #[default]
    Solid = 0,
    Null = 1,
    Hatched = 2,
    Pattern = 3,
}

impl BrushStyle {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Solid),
            1 => Some(Self::Null),
            2 => Some(Self::Hatched),
            3 => Some(Self::Pattern),
            _ => None,
        }
    }
}

/// Pixel surface with an explicit scanline stride.
///
/// Rows are stored top-down. Samples wider than a byte are little-endian;
/// monochrome rows are packed most significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    depth: DepthClass,
    stride: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Zero-filled bitmap with the tightest stride for its depth.
    pub fn new(width: u32, height: u32, bits_per_pixel: u32) -> Result<Self> {
        let depth = DepthClass::from_bpp(bits_per_pixel)?;
        Self::with_stride(width, height, bits_per_pixel, depth.min_stride(width))
    }

    /// Zero-filled bitmap whose rows carry padding up to `stride` bytes.
    pub fn with_stride(width: u32, height: u32, bits_per_pixel: u32, stride: usize) -> Result<Self> {
        let len = Self::validate(width, height, bits_per_pixel, stride)?;
        Ok(Self {
            width,
            height,
            depth: DepthClass::from_bpp(bits_per_pixel)?,
            stride,
            data: vec![0; len],
        })
    }

    /// Bitmap over existing pixel data; `data` must hold `stride * height` bytes.
    pub fn from_data(
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let len = Self::validate(width, height, bits_per_pixel, stride)?;
        if data.len() != len {
            return Err(Error::Geometry(format!(
                "pixel buffer of {} bytes, expected {}",
                data.len(),
                len
            )));
        }
        Ok(Self {
            width,
            height,
            depth: DepthClass::from_bpp(bits_per_pixel)?,
            stride,
            data,
        })
    }

    fn validate(width: u32, height: u32, bits_per_pixel: u32, stride: usize) -> Result<usize> {
        let depth = DepthClass::from_bpp(bits_per_pixel)?;
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(Error::Geometry(format!("bitmap {}x{} too large", width, height)));
        }
        let min = depth.min_stride(width);
        if stride < min {
            return Err(Error::Geometry(format!(
                "stride {} below minimum {} for {} pixels at {}",
                stride, min, width, depth
            )));
        }
        stride
            .checked_mul(height as usize)
            .ok_or_else(|| Error::Geometry("bitmap size overflows".to_string()))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> DepthClass {
        self.depth
    }

    #[inline]
    pub fn bits_per_pixel(&self) -> u32 {
        self.depth.bits_per_pixel()
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> u32 {
        self.depth.bytes_per_pixel()
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw pixel buffer, `stride * height` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.width as i32,
            height: self.height as i32,
        }
    }

    /// Raw sample at `(x, y)`. Coordinates must be inside the bitmap.
    pub fn read_raw(&self, x: u32, y: u32) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        let row = y as usize * self.stride;
        match self.depth {
            DepthClass::Mono => {
                let byte = self.data[row + (x as usize >> 3)];
                ((byte >> (7 - (x & 7))) & 1) as u32
            },
            depth => {
                let width = depth.bytes_per_pixel() as usize;
                let start = row + x as usize * width;
                self.data[start..start + width]
                    .iter()
                    .rev()
                    .fold(0u32, |acc, &byte| (acc << 8) | byte as u32)
            },
        }
    }

    /// Store a raw sample at `(x, y)`. Coordinates must be inside the bitmap.
    pub fn write_raw(&mut self, x: u32, y: u32, raw: u32) {
        debug_assert!(x < self.width && y < self.height);
        let row = y as usize * self.stride;
        match self.depth {
            DepthClass::Mono => {
                let byte = &mut self.data[row + (x as usize >> 3)];
                let mask = 0x80u8 >> (x & 7);
                if raw & 1 != 0 {
                    *byte |= mask;
                } else {
                    *byte &= !mask;
                }
            },
            depth => {
                let width = depth.bytes_per_pixel() as usize;
                let start = row + x as usize * width;
                self.data[start..start + width].copy_from_slice(&raw.to_le_bytes()[..width]);
            },
        }
    }

    /// Canonical pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32, palette: Option<&Palette>) -> Result<Rgba> {
        self.depth.decode(self.read_raw(x, y), palette)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba, palette: Option<&Palette>) -> Result<()> {
        let raw = self.depth.encode(px, palette)?;
        self.write_raw(x, y, raw);
        Ok(())
    }

    /// Export the surface as an RGBA image.
    #[cfg(feature = "imgconv")]
    pub fn to_rgba_image(&self, palette: Option<&Palette>) -> Result<image::RgbaImage> {
        self.depth.check_palette(palette)?;
        let mut img = image::RgbaImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let px = self.pixel(x, y, palette)?;
                img.put_pixel(x, y, image::Rgba([px.r, px.g, px.b, px.a]));
            }
        }
        Ok(img)
    }
}

/// Pen object for drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pen {
    pub style: PenStyle,
    pub width: u32,
    pub color: Color,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            style: PenStyle::Solid,
            width: 1,
            color: Color::BLACK,
        }
    }
}

impl Pen {
    pub fn new(style: PenStyle, width: u32, color: Color) -> Self {
        Self {
            style,
            width: width.max(1),
            color,
        }
    }

    /// Create pen from wire values; unknown styles fall back to solid.
    pub fn from_wire(style: u32, width: u32, colorref: u32) -> Self {
        Self::new(
            PenStyle::from_u32(style).unwrap_or(PenStyle::Solid),
            width,
            Color(colorref),
        )
    }
}

/// Brush object for filling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brush {
    pub style: BrushStyle,
    pub color: Color,
    pub hatch: Option<HatchStyle>,
    /// Pattern bitmap, shared with the store; not owned by the brush
    pub pattern: Option<GdiHandle>,
}

impl Default for Brush {
    fn default() -> Self {
        Self::solid(Color::WHITE)
    }
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Self {
            style: BrushStyle::Solid,
            color,
            hatch: None,
            pattern: None,
        }
    }

    pub fn null() -> Self {
        Self {
            style: BrushStyle::Null,
            color: Color::BLACK,
            hatch: None,
            pattern: None,
        }
    }

    pub fn hatched(hatch: HatchStyle, color: Color) -> Self {
        Self {
            style: BrushStyle::Hatched,
            color,
            hatch: Some(hatch),
            pattern: None,
        }
    }

    pub fn pattern(bitmap: GdiHandle) -> Self {
        Self {
            style: BrushStyle::Pattern,
            color: Color::BLACK,
            hatch: None,
            pattern: Some(bitmap),
        }
    }
}

/// Ordered color table for indexed depths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: Vec<Color>,
}

impl Palette {
    pub fn new(entries: Vec<Color>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Color] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<Rgba> {
        self.entries.get(index).map(|c| c.to_rgba())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// GDI Object types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdiObject {
    Bitmap(Bitmap),
    Pen(Pen),
    Brush(Brush),
    Palette(Palette),
    Region(Region),
}

impl GdiObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Bitmap(_) => ObjectKind::Bitmap,
            Self::Pen(_) => ObjectKind::Pen,
            Self::Brush(_) => ObjectKind::Brush,
            Self::Palette(_) => ObjectKind::Palette,
            Self::Region(_) => ObjectKind::Region,
        }
    }
}

macro_rules! typed_accessors {
    ($($get:ident, $get_mut:ident => $variant:ident($ty:ty);)*) => {
        $(
            pub fn $get(&self, handle: GdiHandle) -> Result<&$ty> {
                match self.get(handle)? {
                    GdiObject::$variant(object) => Ok(object),
                    other => Err(Error::wrong_kind(ObjectKind::$variant, other.kind())),
                }
            }

            pub fn $get_mut(&mut self, handle: GdiHandle) -> Result<&mut $ty> {
                match self.get_mut(handle)? {
                    GdiObject::$variant(object) => Ok(object),
                    other => Err(Error::wrong_kind(ObjectKind::$variant, other.kind())),
                }
            }
        )*
    };
}

/// GDI object store
///
/// Exclusive owner of every drawable object. Lookups are O(1) and validate
/// both the handle generation and the object kind.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Arena<GdiObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
        }
    }

    /// Store an object and return its handle.
    pub fn create(&mut self, object: GdiObject) -> GdiHandle {
        GdiHandle(self.objects.insert(object))
    }

    pub fn get(&self, handle: GdiHandle) -> Result<&GdiObject> {
        self.objects
            .get(handle.0)
            .ok_or_else(|| stale(handle))
    }

    pub fn get_mut(&mut self, handle: GdiHandle) -> Result<&mut GdiObject> {
        self.objects
            .get_mut(handle.0)
            .ok_or_else(|| stale(handle))
    }

    pub fn kind(&self, handle: GdiHandle) -> Result<ObjectKind> {
        self.get(handle).map(GdiObject::kind)
    }

    pub fn exists(&self, handle: GdiHandle) -> bool {
        self.objects.get(handle.0).is_some()
    }

    /// Remove an object and hand it back to the caller.
    pub fn remove(&mut self, handle: GdiHandle) -> Result<GdiObject> {
        self.objects.remove(handle.0).ok_or_else(|| stale(handle))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() == 0
    }

    /// Handles of brushes whose pattern is `bitmap`.
    pub(crate) fn brushes_using(&self, bitmap: GdiHandle) -> Vec<GdiHandle> {
        self.objects
            .iter()
            .filter_map(|(raw, object)| match object {
                GdiObject::Brush(brush) if brush.pattern == Some(bitmap) => Some(GdiHandle(raw)),
                _ => None,
            })
            .collect()
    }

    typed_accessors! {
        bitmap, bitmap_mut => Bitmap(Bitmap);
        pen, pen_mut => Pen(Pen);
        brush, brush_mut => Brush(Brush);
        palette, palette_mut => Palette(Palette);
        region, region_mut => Region(Region);
    }
}

fn stale(handle: GdiHandle) -> Error {
    Error::InvalidHandle(format!(
        "object {}:{} is not live",
        handle.0.index, handle.0.generation
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_creation() {
        let pen = Pen::from_wire(0, 2, 0x0000FF); // Red, 2px wide
        assert_eq!(pen.style, PenStyle::Solid);
        assert_eq!(pen.width, 2);
        assert_eq!(pen.color, Color::RED);
        assert_eq!(Pen::from_wire(1, 0, 0).width, 1);
        assert_eq!(Pen::from_wire(1, 0, 0).style, PenStyle::Dash);
        assert_eq!(PenStyle::from_u32(5), Some(PenStyle::Null));
        assert_eq!(PenStyle::from_u32(2), None);
    }

    #[test]
    fn test_brush_styles() {
        assert_eq!(BrushStyle::from_u32(2), Some(BrushStyle::Hatched));
        assert_eq!(BrushStyle::from_u32(9), None);
        let brush = Brush::hatched(HatchStyle::Cross, Color::GREEN);
        assert_eq!(brush.style, BrushStyle::Hatched);
        assert_eq!(brush.hatch, Some(HatchStyle::Cross));
    }

    #[test]
    fn test_object_store() {
        let mut store = ObjectStore::new();

        let handle = store.create(GdiObject::Pen(Pen::default()));
        assert!(store.exists(handle));
        assert_eq!(store.kind(handle).unwrap(), ObjectKind::Pen);
        assert!(store.pen(handle).is_ok());

        assert!(store.remove(handle).is_ok());
        assert!(!store.exists(handle));
        assert!(matches!(store.pen(handle), Err(Error::InvalidHandle(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_invalid_handle() {
        let mut store = ObjectStore::new();
        let pen = store.create(GdiObject::Pen(Pen::default()));
        let err = store.brush(pen).unwrap_err();
        assert_eq!(err, Error::wrong_kind(ObjectKind::Brush, ObjectKind::Pen));
    }

    #[test]
    fn test_raw_handle_roundtrip() {
        let mut store = ObjectStore::new();
        let handle = store.create(GdiObject::Region(Region::Null));
        assert_eq!(GdiHandle::from_raw(handle.to_raw()), handle);
    }

    #[test]
    fn test_bitmap_stride_validation() {
        assert!(Bitmap::with_stride(10, 2, 24, 29).is_err());
        let bitmap = Bitmap::with_stride(10, 2, 24, 32).unwrap();
        assert_eq!(bitmap.stride(), 32);
        assert_eq!(bitmap.data().len(), 64);
        assert_eq!(bitmap.bytes_per_pixel(), 3);
        assert!(matches!(Bitmap::new(4, 4, 12), Err(Error::UnsupportedDepth(_))));
        assert!(Bitmap::from_data(2, 2, 8, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn test_bitmap_raw_access() {
        let mut bitmap = Bitmap::with_stride(3, 2, 16, 8).unwrap();
        bitmap.write_raw(2, 1, 0xBEEF);
        assert_eq!(bitmap.read_raw(2, 1), 0xBEEF);
        assert_eq!(&bitmap.data()[12..14], &[0xEF, 0xBE]);

        let mut mono = Bitmap::new(10, 1, 1).unwrap();
        mono.write_raw(0, 0, 1);
        mono.write_raw(9, 0, 1);
        assert_eq!(mono.data(), &[0x80, 0x40]);
        mono.write_raw(0, 0, 0);
        assert_eq!(mono.read_raw(0, 0), 0);
        assert_eq!(mono.read_raw(9, 0), 1);
    }

    #[test]
    fn test_bitmap_canonical_access() {
        let mut bitmap = Bitmap::new(2, 2, 32).unwrap();
        let px = Rgba::new(10, 20, 30, 40);
        bitmap.set_pixel(1, 1, px, None).unwrap();
        assert_eq!(bitmap.pixel(1, 1, None).unwrap(), px);

        let mut indexed = Bitmap::new(2, 2, 8).unwrap();
        assert!(indexed.set_pixel(0, 0, px, None).is_err());
        let palette = Palette::new(vec![Color::BLACK, Color::WHITE]);
        indexed
            .set_pixel(0, 0, Color::WHITE.to_rgba(), Some(&palette))
            .unwrap();
        assert_eq!(indexed.read_raw(0, 0), 1);
    }

    #[test]
    fn test_brushes_using_pattern() {
        let mut store = ObjectStore::new();
        let bitmap = store.create(GdiObject::Bitmap(Bitmap::new(8, 8, 1).unwrap()));
        let brush = store.create(GdiObject::Brush(Brush::pattern(bitmap)));
        store.create(GdiObject::Brush(Brush::solid(Color::RED)));
        assert_eq!(store.brushes_using(bitmap), vec![brush]);
    }
}
