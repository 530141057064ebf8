// Device Context (DC) state
//
// A device context bundles the current drawing state: the selected surface,
// pen, brush, clip region and palette, plus colors, modes and the pen
// position. Selections are handles into the object store; the DC never owns
// the objects it refers to.

use serde::{Deserialize, Serialize};

use super::arena::RawHandle;
use super::color::Color;
use super::objects::GdiHandle;
use super::options::GdiOptions;
use super::region::{Point, Rect};
use super::rop::Rop2;
use crate::common::error::ObjectKind;

/// Opaque handle to a device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DcHandle(pub(crate) RawHandle);

impl DcHandle {
    pub fn to_raw(self) -> u64 {
        self.0.to_u64()
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(RawHandle::from_u64(raw))
    }
}

/// Background mix mode
///
/// Discriminants are the wire values of the Windows GDI `SetBkMode` call
/// (`TRANSPARENT = 1`, `OPAQUE = 2`). libgdi's `gdi.h` numbers them the
/// other way round, so hosts built on those constants must translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u32)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    Transparent = 1,
    #[default]
    Opaque = 2,
}

impl BackgroundMode {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Transparent),
            2 => Some(Self::Opaque),
            _ => None,
        }
    }
}

/// Current pen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenPosition {
    /// Nothing has set the position since the DC was created
    #[default]
    Undefined,
    Positioned(Point),
}

impl PenPosition {
    pub fn point(&self) -> Option<Point> {
        match self {
            Self::Undefined => None,
            Self::Positioned(p) => Some(*p),
        }
    }
}

/// Device Context state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContext {
    // Selected objects
    pub(crate) surface: Option<GdiHandle>,
    pub(crate) pen: Option<GdiHandle>,
    pub(crate) brush: Option<GdiHandle>,
    pub(crate) clip: Option<GdiHandle>,
    pub(crate) palette: Option<GdiHandle>,

    // Colors
    pub bk_color: Color,
    pub text_color: Color,

    // Modes
    pub bk_mode: BackgroundMode,
    pub draw_mode: Rop2,

    pub(crate) position: PenPosition,

    // Union of everything drawn since the last take
    pub(crate) damage: Option<Rect>,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new(&GdiOptions::default())
    }
}

impl DeviceContext {
    pub fn new(options: &GdiOptions) -> Self {
        Self {
            surface: None,
            pen: None,
            brush: None,
            clip: None,
            palette: None,
            bk_color: options.default_bk_color,
            text_color: options.default_text_color,
            bk_mode: options.default_bk_mode,
            draw_mode: options.default_rop2,
            position: PenPosition::Undefined,
            damage: None,
        }
    }

    pub fn surface(&self) -> Option<GdiHandle> {
        self.surface
    }

    pub fn pen(&self) -> Option<GdiHandle> {
        self.pen
    }

    pub fn brush(&self) -> Option<GdiHandle> {
        self.brush
    }

    pub fn clip(&self) -> Option<GdiHandle> {
        self.clip
    }

    pub fn palette(&self) -> Option<GdiHandle> {
        self.palette
    }

    pub fn position(&self) -> PenPosition {
        self.position
    }

    pub fn damage(&self) -> Option<Rect> {
        self.damage
    }

    fn slot_mut(&mut self, kind: ObjectKind) -> &mut Option<GdiHandle> {
        match kind {
            ObjectKind::Bitmap => &mut self.surface,
            ObjectKind::Pen => &mut self.pen,
            ObjectKind::Brush => &mut self.brush,
            ObjectKind::Region => &mut self.clip,
            ObjectKind::Palette => &mut self.palette,
        }
    }

    /// Swap the selection for `kind`, returning the previous one.
    pub(crate) fn exchange(&mut self, kind: ObjectKind, handle: Option<GdiHandle>) -> Option<GdiHandle> {
        std::mem::replace(self.slot_mut(kind), handle)
    }

    pub(crate) fn references(&self, handle: GdiHandle) -> bool {
        [self.surface, self.pen, self.brush, self.clip, self.palette]
            .contains(&Some(handle))
    }

    /// Drop every reference to `handle`.
    pub(crate) fn release(&mut self, handle: GdiHandle) {
        for slot in [
            &mut self.surface,
            &mut self.pen,
            &mut self.brush,
            &mut self.clip,
            &mut self.palette,
        ] {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }

    pub(crate) fn add_damage(&mut self, rect: Rect) {
        self.damage = Some(match self.damage {
            Some(existing) => existing.union(&rect),
            None => rect,
        });
    }

    pub(crate) fn take_damage(&mut self) -> Option<Rect> {
        self.damage.take()
    }
}
