//! Software GDI engine.
//!
//! [`Gdi`] owns every drawable object, every device context, the engine
//! options and the diagnostics hook. Drawing orders decoded by the protocol
//! layer resolve their handles here, get clipped against the device context,
//! and are composited pixel by pixel by the raster engine in [`rop`].
//!
//! # Example
//!
//! ```
//! use rgdi::gdi::{Color, Gdi, Rop3};
//!
//! let mut gdi = Gdi::new();
//! let dc = gdi.create_dc();
//! let surface = gdi.create_bitmap(64, 64, 32)?;
//! gdi.select(dc, surface)?;
//!
//! let brush = gdi.create_solid_brush(Color::RED);
//! gdi.select(dc, brush)?;
//! gdi.pat_blt(dc, 8, 8, 16, 16, Rop3::PATCOPY)?;
//!
//! assert_eq!(gdi.get_pixel(dc, 10, 10)?, Color::RED);
//! # Ok::<(), rgdi::Error>(())
//! ```

pub(crate) mod arena;
pub mod color;
pub mod dc;
pub mod drawing;
pub mod line;
pub mod logging;
pub mod objects;
pub mod options;
pub mod orders;
pub mod pattern;
pub mod region;
pub mod rop;

pub use color::{Color, DepthClass, Rgba, from_canonical, to_canonical};
pub use dc::{BackgroundMode, DcHandle, DeviceContext, PenPosition};
pub use logging::{GdiLogger, LogFacade, NullLogger};
pub use objects::{
    Bitmap, Brush, BrushStyle, GdiHandle, GdiObject, ObjectStore, Palette, Pen, PenStyle,
};
pub use options::{DeletePolicy, GdiOptions};
pub use orders::DrawOrder;
pub use pattern::HatchStyle;
pub use region::{Point, Rect, Region};
pub use rop::{Rop2, Rop3, RopOperands};

use log::Level;

use self::arena::Arena;
use self::logging::gdi_log;
use crate::common::error::{Error, ObjectKind, Result};

/// GDI engine state for one session.
pub struct Gdi {
    store: ObjectStore,
    dcs: Arena<DeviceContext>,
    options: GdiOptions,
    logger: Box<dyn GdiLogger>,
}

impl Default for Gdi {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Gdi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gdi")
            .field("objects", &self.store.len())
            .field("dcs", &self.dcs.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Gdi {
    pub fn new() -> Self {
        Self::with_options(GdiOptions::default())
    }

    pub fn with_options(options: GdiOptions) -> Self {
        Self {
            store: ObjectStore::new(),
            dcs: Arena::new(),
            options,
            logger: Box::new(LogFacade),
        }
    }

    /// Replace the diagnostics hook.
    pub fn with_logger(mut self, logger: impl GdiLogger + 'static) -> Self {
        self.logger = Box::new(logger);
        self
    }

    pub fn options(&self) -> &GdiOptions {
        &self.options
    }

    /// Read access to the object store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Rendered surface of a bitmap handle.
    pub fn bitmap(&self, handle: GdiHandle) -> Result<&Bitmap> {
        self.store.bitmap(handle)
    }

    pub fn bitmap_mut(&mut self, handle: GdiHandle) -> Result<&mut Bitmap> {
        self.store.bitmap_mut(handle)
    }

    // Device contexts

    pub fn create_dc(&mut self) -> DcHandle {
        let handle = DcHandle(self.dcs.insert(DeviceContext::new(&self.options)));
        gdi_log!(self.logger, Level::Debug, "created dc {:?}", handle);
        handle
    }

    /// New DC sharing the colors, modes and palette of `dc`.
    pub fn create_compatible_dc(&mut self, dc: DcHandle) -> Result<DcHandle> {
        let template = self.dc(dc)?;
        let mut fresh = DeviceContext::new(&self.options);
        fresh.bk_color = template.bk_color;
        fresh.text_color = template.text_color;
        fresh.bk_mode = template.bk_mode;
        fresh.draw_mode = template.draw_mode;
        fresh.palette = template.palette;
        let handle = DcHandle(self.dcs.insert(fresh));
        gdi_log!(self.logger, Level::Debug, "created dc {:?} compatible with {:?}", handle, dc);
        Ok(handle)
    }

    /// Destroy a DC. Its selected objects stay in the store.
    pub fn delete_dc(&mut self, dc: DcHandle) -> Result<()> {
        if self.dcs.remove(dc.0).is_none() {
            return Err(self.report("delete_dc", stale_dc(dc)));
        }
        gdi_log!(self.logger, Level::Debug, "deleted dc {:?}", dc);
        Ok(())
    }

    pub fn dc(&self, dc: DcHandle) -> Result<&DeviceContext> {
        self.dcs.get(dc.0).ok_or_else(|| stale_dc(dc))
    }

    pub(crate) fn dc_mut(&mut self, dc: DcHandle) -> Result<&mut DeviceContext> {
        self.dcs.get_mut(dc.0).ok_or_else(|| stale_dc(dc))
    }

    // Object creation

    /// Store an object; pattern brushes must name a live bitmap.
    pub fn create(&mut self, object: GdiObject) -> Result<GdiHandle> {
        if let GdiObject::Brush(Brush {
            style: BrushStyle::Pattern,
            pattern,
            ..
        }) = &object
        {
            let bitmap = pattern.ok_or_else(|| Error::not_selected("pattern bitmap"))?;
            self.store.bitmap(bitmap)?;
        }
        let kind = object.kind();
        let handle = self.store.create(object);
        gdi_log!(self.logger, Level::Debug, "created {} {:?}", kind, handle);
        Ok(handle)
    }

    pub fn create_bitmap(&mut self, width: u32, height: u32, bits_per_pixel: u32) -> Result<GdiHandle> {
        let bitmap = Bitmap::new(width, height, bits_per_pixel)?;
        self.create(GdiObject::Bitmap(bitmap))
    }

    /// Bitmap with the depth of the surface selected into `dc`.
    pub fn create_compatible_bitmap(&mut self, dc: DcHandle, width: u32, height: u32) -> Result<GdiHandle> {
        let surface = self.dc(dc)?.surface.ok_or_else(|| Error::not_selected("bitmap"))?;
        let bpp = self.store.bitmap(surface)?.bits_per_pixel();
        self.create_bitmap(width, height, bpp)
    }

    pub fn create_pen(&mut self, style: PenStyle, width: u32, color: Color) -> GdiHandle {
        self.store_infallible(GdiObject::Pen(Pen::new(style, width, color)))
    }

    pub fn create_solid_brush(&mut self, color: Color) -> GdiHandle {
        self.store_infallible(GdiObject::Brush(Brush::solid(color)))
    }

    pub fn create_hatch_brush(&mut self, hatch: HatchStyle, color: Color) -> GdiHandle {
        self.store_infallible(GdiObject::Brush(Brush::hatched(hatch, color)))
    }

    pub fn create_null_brush(&mut self) -> GdiHandle {
        self.store_infallible(GdiObject::Brush(Brush::null()))
    }

    pub fn create_pattern_brush(&mut self, bitmap: GdiHandle) -> Result<GdiHandle> {
        self.create(GdiObject::Brush(Brush::pattern(bitmap)))
    }

    pub fn create_palette(&mut self, entries: Vec<Color>) -> GdiHandle {
        self.store_infallible(GdiObject::Palette(Palette::new(entries)))
    }

    pub fn create_rect_region(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<GdiHandle> {
        let rect = Rect::new(x, y, width, height)?;
        self.create(GdiObject::Region(Region::Rect(rect)))
    }

    pub fn create_null_region(&mut self) -> GdiHandle {
        self.store_infallible(GdiObject::Region(Region::Null))
    }

    fn store_infallible(&mut self, object: GdiObject) -> GdiHandle {
        let kind = object.kind();
        let handle = self.store.create(object);
        gdi_log!(self.logger, Level::Debug, "created {} {:?}", kind, handle);
        handle
    }

    // Selection and deletion

    /// Select an object into `dc`, returning the previous selection of the
    /// same kind.
    pub fn select(&mut self, dc: DcHandle, handle: GdiHandle) -> Result<Option<GdiHandle>> {
        let result = self.store.kind(handle).and_then(|kind| {
            let previous = self.dc_mut(dc)?.exchange(kind, Some(handle));
            Ok((kind, previous))
        });
        match result {
            Ok((kind, previous)) => {
                gdi_log!(self.logger, Level::Debug, "dc {:?} selected {} {:?}", dc, kind, handle);
                Ok(previous)
            },
            Err(e) => Err(self.report("select", e)),
        }
    }

    /// Clear the selection of `kind` in `dc`, returning what was selected.
    pub fn deselect(&mut self, dc: DcHandle, kind: ObjectKind) -> Result<Option<GdiHandle>> {
        Ok(self.dc_mut(dc)?.exchange(kind, None))
    }

    /// Delete an object from the store.
    ///
    /// An object still selected into a DC is refused under
    /// [`DeletePolicy::Reject`]; under [`DeletePolicy::Orphan`] every DC
    /// reference to it is nulled first. Pattern brushes built on a deleted
    /// bitmap lose their pattern either way.
    pub fn delete(&mut self, handle: GdiHandle) -> Result<()> {
        let kind = match self.store.kind(handle) {
            Ok(kind) => kind,
            Err(e) => return Err(self.report("delete", e)),
        };
        let holders = self.dcs.iter().filter(|(_, dc)| dc.references(handle)).count();
        if holders > 0 {
            match self.options.delete_policy {
                DeletePolicy::Reject => {
                    return Err(self.report(
                        "delete",
                        Error::ObjectInUse { kind, dcs: holders },
                    ));
                },
                DeletePolicy::Orphan => {
                    for (_, dc) in self.dcs.iter_mut() {
                        dc.release(handle);
                    }
                    gdi_log!(
                        self.logger,
                        Level::Warn,
                        "orphaned {} {:?} selected into {} dc(s)",
                        kind,
                        handle,
                        holders
                    );
                },
            }
        }
        if kind == ObjectKind::Bitmap {
            for brush in self.store.brushes_using(handle) {
                if let Ok(brush) = self.store.brush_mut(brush) {
                    brush.pattern = None;
                }
            }
        }
        self.store.remove(handle)?;
        gdi_log!(self.logger, Level::Debug, "deleted {} {:?}", kind, handle);
        Ok(())
    }

    // DC state

    /// Set the background color, returning the old one.
    pub fn set_bk_color(&mut self, dc: DcHandle, color: Color) -> Result<Color> {
        let dc = self.dc_mut(dc)?;
        Ok(std::mem::replace(&mut dc.bk_color, color))
    }

    /// Set the text color, returning the old one.
    pub fn set_text_color(&mut self, dc: DcHandle, color: Color) -> Result<Color> {
        let dc = self.dc_mut(dc)?;
        Ok(std::mem::replace(&mut dc.text_color, color))
    }

    pub fn set_bk_mode(&mut self, dc: DcHandle, mode: BackgroundMode) -> Result<BackgroundMode> {
        let dc = self.dc_mut(dc)?;
        Ok(std::mem::replace(&mut dc.bk_mode, mode))
    }

    /// Set the stroke draw mode, returning the old one.
    pub fn set_rop2(&mut self, dc: DcHandle, rop: Rop2) -> Result<Rop2> {
        let dc = self.dc_mut(dc)?;
        Ok(std::mem::replace(&mut dc.draw_mode, rop))
    }

    /// Area written through `dc` since the last call, for repainting.
    pub fn take_damage(&mut self, dc: DcHandle) -> Result<Option<Rect>> {
        Ok(self.dc_mut(dc)?.take_damage())
    }

    /// Log a failed operation and hand the error back.
    pub(crate) fn report(&self, operation: &str, error: Error) -> Error {
        gdi_log!(self.logger, Level::Warn, "{} failed: {}", operation, error);
        error
    }
}

fn stale_dc(dc: DcHandle) -> Error {
    Error::InvalidHandle(format!(
        "device context {}:{} is not live",
        dc.0.index, dc.0.generation
    ))
}
