//! rgdi - A software GDI raster compositor
//!
//! This library replays remote-desktop drawing orders onto in-memory bitmaps
//! the way the Windows Graphics Device Interface would have rendered them.
//!
//! # Features
//!
//! - **Object store**: Bitmaps, pens, brushes, palettes and clip regions behind
//!   generation-checked handles
//! - **Device contexts**: Selected objects, colors, modes and pen position
//! - **Raster operations**: All 256 ternary (ROP3) and 16 binary (ROP2) codes
//! - **Depth conversion**: 1, 8, 16, 24 and 32 bits per pixel
//! - **Drawing primitives**: BitBlt, PatBlt, FillRect, LineTo, SetPixel
//!
//! # Example - Compositing an order stream
//!
//! ```
//! use rgdi::gdi::{Color, DrawOrder, Gdi, Rect, Rop3};
//!
//! # fn main() -> Result<(), rgdi::Error> {
//! let mut gdi = Gdi::new();
//! let screen = gdi.create_dc();
//! let frame = gdi.create_bitmap(320, 200, 32)?;
//! gdi.select(screen, frame)?;
//!
//! let brush = gdi.create_solid_brush(Color::BLUE);
//! let order = DrawOrder::FillRect {
//!     dc: screen,
//!     rect: Rect::new(0, 0, 320, 200)?,
//!     brush,
//! };
//! assert_eq!(gdi.execute(&order), 0);
//!
//! // Copy the top-left corner onto itself, inverted
//! gdi.bit_blt(screen, 0, 0, 16, 16, Some(screen), 0, 0, Rop3::NOTSRCCOPY)?;
//! assert_eq!(gdi.get_pixel(screen, 0, 0)?, Color::rgb(255, 255, 0));
//!
//! // Repaint only what changed
//! let dirty = gdi.take_damage(screen)?;
//! assert_eq!(dirty, Some(Rect::new(0, 0, 320, 200)?));
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Diagnostics go to the [`log`] facade under the `rgdi` target unless a
//! different [`GdiLogger`](gdi::GdiLogger) is installed with
//! [`Gdi::with_logger`](gdi::Gdi::with_logger).

/// Shared error type and status codes
pub mod common;

/// The GDI engine: objects, device contexts, raster operations and drawing
pub mod gdi;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use gdi::{Color, DcHandle, DrawOrder, Gdi, GdiHandle, GdiOptions, Rect, Rop2, Rop3};
