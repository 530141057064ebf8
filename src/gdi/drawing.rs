//! Primitive drawing operations.
//!
//! Every operation validates its handles, geometry and depth conversions
//! before it touches a pixel, then computes all outputs and only afterwards
//! writes them. A failing operation therefore leaves the surface as it was.

use log::Level;

use super::color::{Color, DepthClass, Rgba};
use super::dc::{BackgroundMode, DcHandle, DeviceContext, PenPosition};
use super::line::stroke;
use super::logging::gdi_log;
use super::objects::{Bitmap, GdiHandle, GdiObject, Palette};
use super::pattern::{PatternColors, PatternTile};
use super::region::{Point, Rect, Region};
use super::rop::Rop3;
use super::Gdi;
use crate::common::error::{Error, ObjectKind, Result};

/// Source operand of a blit: a DC and the point mapped to the target origin.
#[derive(Debug, Clone, Copy)]
struct Source {
    dc: DcHandle,
    origin: Point,
}

/// Pending raw write at a surface position.
type PendingWrite = (u32, u32, u32);

impl Gdi {
    /// Restrict `target` to the surface of `dc` and its clip region.
    ///
    /// Returns `Ok(None)` when nothing remains to draw. A target reaching
    /// outside the surface is a geometry error unless
    /// [`clamp_to_surface`](super::GdiOptions::clamp_to_surface) is set.
    pub fn clip(&self, dc: DcHandle, target: &Rect) -> Result<Option<Rect>> {
        let state = self.dc(dc)?;
        let (_, surface) = self.surface_of(state)?;
        let bounds = surface.bounds();
        if !self.options.clamp_to_surface && !bounds.contains_rect(target) {
            return Err(out_of_bounds(target, &bounds));
        }
        let Some(visible) = bounds.intersect(target) else {
            return Ok(None);
        };
        Ok(self.clip_region(state)?.clip(&visible))
    }

    /// Combine a source area, the DC brush and the destination with `rop`.
    ///
    /// `src` may be `None` when `rop` does not read the source, but a given
    /// `src` must be a live DC either way. The brush of
    /// `dest` supplies the pattern operand.
    #[allow(clippy::too_many_arguments)]
    pub fn bit_blt(
        &mut self,
        dest: DcHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        src: Option<DcHandle>,
        x_src: i32,
        y_src: i32,
        rop: Rop3,
    ) -> Result<()> {
        let result = Rect::target(x, y, width, height).and_then(|target| {
            if let Some(src) = src {
                self.dc(src)?;
            }
            let source = src.map(|dc| Source {
                dc,
                origin: Point::new(x_src, y_src),
            });
            let tile = self.selected_tile(dest, rop)?;
            self.compose(dest, target, source, rop, tile)
        });
        result.map_err(|e| self.report("bit_blt", e))
    }

    /// Fill a rectangle from the DC brush and the destination with `rop`.
    pub fn pat_blt(&mut self, dc: DcHandle, x: i32, y: i32, width: i32, height: i32, rop: Rop3) -> Result<()> {
        let result = Rect::target(x, y, width, height).and_then(|target| {
            if rop.uses_source() {
                return Err(Error::InvalidHandle(format!(
                    "{:?} reads a source but pat_blt has none",
                    rop
                )));
            }
            let tile = self.selected_tile(dc, rop)?;
            self.compose(dc, target, None, rop, tile)
        });
        result.map_err(|e| self.report("pat_blt", e))
    }

    /// Overwrite `rect` with `brush`, ignoring the DC brush and draw mode.
    pub fn fill_rect(&mut self, dc: DcHandle, rect: &Rect, brush: GdiHandle) -> Result<()> {
        let result = Rect::target(rect.x, rect.y, rect.width, rect.height).and_then(|target| {
            let tile = self.brush_tile(self.dc(dc)?, brush)?;
            self.compose(dc, target, None, Rop3::PATCOPY, tile)
        });
        result.map_err(|e| self.report("fill_rect", e))
    }

    /// Set the pen position, returning the previous one.
    pub fn move_to(&mut self, dc: DcHandle, x: i32, y: i32) -> Result<PenPosition> {
        let state = self.dc_mut(dc)?;
        Ok(std::mem::replace(
            &mut state.position,
            PenPosition::Positioned(Point::new(x, y)),
        ))
    }

    /// Stroke from the pen position to `(x, y)` with the selected pen.
    pub fn line_to(&mut self, dc: DcHandle, x: i32, y: i32) -> Result<()> {
        let end = Point::new(x, y);
        let result = self.stroke_line(dc, end);
        if result.is_ok() {
            self.dc_mut(dc)?.position = PenPosition::Positioned(end);
        }
        result.map_err(|e| self.report("line_to", e))
    }

    /// Combine `color` into one pixel with the DC draw mode.
    ///
    /// Returns the color actually stored, after depth conversion. A pixel
    /// outside the clip region is left alone and reported unchanged.
    pub fn set_pixel(&mut self, dc: DcHandle, x: i32, y: i32, color: Color) -> Result<Color> {
        let result = self.plot(dc, Point::new(x, y), color);
        result.map_err(|e| self.report("set_pixel", e))
    }

    pub fn get_pixel(&self, dc: DcHandle, x: i32, y: i32) -> Result<Color> {
        let state = self.dc(dc)?;
        let (_, surface) = self.surface_of(state)?;
        if !surface.bounds().contains_point(x, y) {
            return Err(point_out_of_bounds(x, y, &surface.bounds()));
        }
        let palette = self.palette_of(state)?;
        let px = surface.pixel(x as u32, y as u32, palette)?;
        Ok(Color::from(px))
    }

    /// Replace the clip with a fresh rectangular region, or clear it.
    ///
    /// Returns the handle of the new region, which the caller owns.
    pub fn set_clip_rect(&mut self, dc: DcHandle, rect: Option<Rect>) -> Result<Option<GdiHandle>> {
        self.dc(dc)?;
        let Some(rect) = rect else {
            self.deselect(dc, ObjectKind::Region)?;
            return Ok(None);
        };
        let region = self.create(GdiObject::Region(Region::Rect(Rect::new(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        )?)))?;
        self.select(dc, region)?;
        Ok(Some(region))
    }

    // Resolution helpers

    fn surface_of(&self, state: &DeviceContext) -> Result<(GdiHandle, &Bitmap)> {
        let handle = state.surface.ok_or_else(|| Error::not_selected("bitmap"))?;
        Ok((handle, self.store.bitmap(handle)?))
    }

    fn palette_of(&self, state: &DeviceContext) -> Result<Option<&Palette>> {
        state.palette.map(|h| self.store.palette(h)).transpose()
    }

    fn clip_region(&self, state: &DeviceContext) -> Result<Region> {
        match state.clip {
            Some(handle) => self.store.region(handle).copied(),
            None => Ok(Region::Null),
        }
    }

    fn brush_tile(&self, state: &DeviceContext, brush: GdiHandle) -> Result<Option<PatternTile>> {
        let brush = self.store.brush(brush)?;
        let pattern = brush.pattern.map(|h| self.store.bitmap(h)).transpose()?;
        let colors = PatternColors {
            text: state.text_color,
            background: state.bk_color,
            mode: state.bk_mode,
        };
        PatternTile::from_brush(brush, pattern, self.palette_of(state)?, &colors)
    }

    /// Pattern of the DC brush, when `rop` reads one.
    fn selected_tile(&self, dc: DcHandle, rop: Rop3) -> Result<Option<PatternTile>> {
        if !rop.uses_pattern() {
            return Ok(None);
        }
        let state = self.dc(dc)?;
        let brush = state.brush.ok_or_else(|| Error::not_selected("brush"))?;
        self.brush_tile(state, brush)
    }

    // Raster paths

    fn compose(
        &mut self,
        dest: DcHandle,
        target: Rect,
        source: Option<Source>,
        rop: Rop3,
        tile: Option<PatternTile>,
    ) -> Result<()> {
        let area = self.clip(dest, &target)?;
        let state = self.dc(dest)?;
        let (surface_handle, surface) = self.surface_of(state)?;
        let palette = self.palette_of(state)?;
        let depth = surface.depth();
        depth.check_palette(palette)?;

        let index_mask = depth.index_mask().filter(|_| {
            !rop.uses_pattern()
                && (rop.uses_dest() || rop.uses_source())
                && source.is_none_or(|source| !rop.uses_source() || self.shares_format(source, depth, state))
        });
        let snapshot = match (rop.uses_source(), source) {
            (false, _) => None,
            (true, None) => return Err(Error::not_selected("source device context")),
            (true, Some(source)) => {
                Some(self.snapshot(source, &target, area.as_ref(), index_mask.is_some())?)
            },
        };

        let Some(area) = area else {
            gdi_log!(self.logger, Level::Trace, "{:?} on {:?} clipped away", rop, dest);
            return Ok(());
        };
        if rop.uses_pattern() && tile.is_none() {
            gdi_log!(self.logger, Level::Trace, "{:?} on {:?} with null brush", rop, dest);
            return Ok(());
        }

        let mut writes: Vec<PendingWrite> = Vec::with_capacity(area.area() as usize);
        let mut index = 0usize;
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let s = snapshot.as_ref().map_or(0, |words| words[index]);
                index += 1;
                let p = match tile.as_ref().map(|t| t.sample(x, y)) {
                    Some(None) => continue,
                    Some(Some(px)) => px.to_word(),
                    None => 0,
                };
                let raw = match index_mask {
                    Some(mask) => {
                        let d = if rop.uses_dest() { surface.read_raw(x as u32, y as u32) } else { 0 };
                        rop.apply(d, s, p) & mask
                    },
                    None => {
                        let d = if rop.uses_dest() {
                            surface.pixel(x as u32, y as u32, palette)?.to_word()
                        } else {
                            0
                        };
                        depth.encode(Rgba::from_word(rop.apply(d, s, p)), palette)?
                    },
                };
                writes.push((x as u32, y as u32, raw));
            }
        }

        self.commit(dest, surface_handle, &writes, area)
    }

    /// Whether `source` draws from a surface with `depth` and the palette of `dest`.
    fn shares_format(&self, source: Source, depth: DepthClass, dest: &DeviceContext) -> bool {
        self.dc(source.dc)
            .and_then(|state| Ok((self.surface_of(state)?.1.depth(), state.palette)))
            .is_ok_and(|(src_depth, palette)| src_depth == depth && palette == dest.palette)
    }

    /// Source pixels behind `area`, row-major: raw samples when `raw`,
    /// canonical words otherwise.
    fn snapshot(&self, source: Source, target: &Rect, area: Option<&Rect>, raw: bool) -> Result<Vec<u32>> {
        let state = self.dc(source.dc)?;
        let (_, surface) = self.surface_of(state)?;
        let palette = self.palette_of(state)?;
        surface.depth().check_palette(palette)?;

        let wanted = Rect::new(source.origin.x, source.origin.y, target.width, target.height)?;
        if !surface.bounds().contains_rect(&wanted) {
            return Err(out_of_bounds(&wanted, &surface.bounds()));
        }
        let Some(area) = area else {
            return Ok(Vec::new());
        };
        let dx = source.origin.x as i64 - target.x as i64;
        let dy = source.origin.y as i64 - target.y as i64;
        let mut words = Vec::with_capacity(area.area() as usize);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let (sx, sy) = ((x as i64 + dx) as u32, (y as i64 + dy) as u32);
                let word = if raw {
                    surface.read_raw(sx, sy)
                } else {
                    surface.pixel(sx, sy, palette)?.to_word()
                };
                words.push(word);
            }
        }
        Ok(words)
    }

    fn stroke_line(&mut self, dc: DcHandle, end: Point) -> Result<()> {
        let state = self.dc(dc)?;
        let start = match state.position {
            PenPosition::Positioned(point) => point,
            PenPosition::Undefined if self.options.strict_pen_position => {
                return Err(Error::Geometry("pen position is undefined".to_string()));
            },
            PenPosition::Undefined => Point::new(0, 0),
        };
        let pen = *self
            .store
            .pen(state.pen.ok_or_else(|| Error::not_selected("pen"))?)?;
        let (surface_handle, surface) = self.surface_of(state)?;
        let bounds = surface.bounds();
        if !self.options.clamp_to_surface {
            for point in [start, end] {
                if !bounds.contains_point(point.x, point.y) {
                    return Err(point_out_of_bounds(point.x, point.y, &bounds));
                }
            }
        }
        let palette = self.palette_of(state)?;
        let depth = surface.depth();
        depth.check_palette(palette)?;
        let clip = self.clip_region(state)?;

        let fore = pen.color.to_rgba().to_word();
        let gap = match state.bk_mode {
            BackgroundMode::Opaque => Some(state.bk_color.to_rgba().to_word()),
            BackgroundMode::Transparent => None,
        };
        let Some(window) = clip.clip(&bounds) else {
            gdi_log!(self.logger, Level::Trace, "line on {:?} clipped away", dc);
            return Ok(());
        };
        let mut writes: Vec<PendingWrite> = Vec::new();
        let mut touched: Option<Rect> = None;
        for px in stroke(start, end, pen.style, pen.width, window) {
            let Point { x, y } = px.point;
            let Some(color) = (if px.on { Some(fore) } else { gap }) else {
                continue;
            };
            let raw = mix_pixel(surface, depth, palette, state, x, y, color)?;
            writes.push((x as u32, y as u32, raw));
            let dot = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            touched = Some(touched.map_or(dot, |r| r.union(&dot)));
        }

        match touched {
            Some(area) => self.commit(dc, surface_handle, &writes, area),
            None => {
                gdi_log!(self.logger, Level::Trace, "line on {:?} drew nothing", dc);
                Ok(())
            },
        }
    }

    fn plot(&mut self, dc: DcHandle, point: Point, color: Color) -> Result<Color> {
        let state = self.dc(dc)?;
        let (surface_handle, surface) = self.surface_of(state)?;
        let bounds = surface.bounds();
        if !bounds.contains_point(point.x, point.y) {
            return Err(point_out_of_bounds(point.x, point.y, &bounds));
        }
        let palette = self.palette_of(state)?;
        let depth = surface.depth();
        depth.check_palette(palette)?;
        let (x, y) = (point.x as u32, point.y as u32);
        if !self.clip_region(state)?.contains_point(point.x, point.y) {
            return Ok(Color::from(surface.pixel(x, y, palette)?));
        }

        let raw = mix_pixel(surface, depth, palette, state, point.x, point.y, color.to_rgba().to_word())?;
        let stored = Color::from(depth.decode(raw, palette)?);
        let dot = Rect {
            x: point.x,
            y: point.y,
            width: 1,
            height: 1,
        };
        self.commit(dc, surface_handle, &[(x, y, raw)], dot)?;
        Ok(stored)
    }

    /// Write computed pixels and record the damage.
    fn commit(&mut self, dc: DcHandle, surface: GdiHandle, writes: &[PendingWrite], area: Rect) -> Result<()> {
        let bitmap = self.store.bitmap_mut(surface)?;
        for &(x, y, raw) in writes {
            bitmap.write_raw(x, y, raw);
        }
        self.dc_mut(dc)?.add_damage(area);
        Ok(())
    }
}

/// Raw value of `color` combined into `(x, y)` with the DC draw mode.
fn mix_pixel(
    surface: &Bitmap,
    depth: DepthClass,
    palette: Option<&Palette>,
    state: &DeviceContext,
    x: i32,
    y: i32,
    color: u32,
) -> Result<u32> {
    let d = surface.pixel(x as u32, y as u32, palette)?.to_word();
    depth.encode(Rgba::from_word(state.draw_mode.apply(d, color)), palette)
}

fn out_of_bounds(rect: &Rect, bounds: &Rect) -> Error {
    Error::Geometry(format!(
        "{}x{} at ({}, {}) exceeds {}x{} surface",
        rect.width, rect.height, rect.x, rect.y, bounds.width, bounds.height
    ))
}

fn point_out_of_bounds(x: i32, y: i32, bounds: &Rect) -> Error {
    Error::Geometry(format!(
        "({}, {}) is outside {}x{} surface",
        x, y, bounds.width, bounds.height
    ))
}
