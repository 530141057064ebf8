//! Decoded drawing orders.
//!
//! The protocol layer turns wire orders into [`DrawOrder`] values and hands
//! them to [`Gdi::execute`], which answers with the numeric status code the
//! caller reports back.

use serde::{Deserialize, Serialize};

use super::Gdi;
use super::color::Color;
use super::dc::DcHandle;
use super::objects::GdiHandle;
use super::region::Rect;
use super::rop::{Rop2, Rop3};
use crate::common::error::{Result, STATUS_SUCCESS, status_of};

/// One drawing order, with handles already resolved to engine handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum DrawOrder {
    BitBlt {
        #[serde(with = "dc_handle")]
        dest: DcHandle,
        rect: Rect,
        #[serde(with = "opt_dc_handle")]
        src: Option<DcHandle>,
        x_src: i32,
        y_src: i32,
        rop: u32,
    },
    PatBlt {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        rect: Rect,
        rop: u32,
    },
    FillRect {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        rect: Rect,
        #[serde(with = "gdi_handle")]
        brush: GdiHandle,
    },
    MoveTo {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        x: i32,
        y: i32,
    },
    LineTo {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        x: i32,
        y: i32,
    },
    SetPixel {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        x: i32,
        y: i32,
        color: Color,
    },
    SetRop2 {
        #[serde(with = "dc_handle")]
        dc: DcHandle,
        rop: Rop2,
    },
}

impl Gdi {
    /// Run one order.
    pub fn apply(&mut self, order: &DrawOrder) -> Result<()> {
        match *order {
            DrawOrder::BitBlt {
                dest,
                rect,
                src,
                x_src,
                y_src,
                rop,
            } => self.bit_blt(
                dest,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                src,
                x_src,
                y_src,
                Rop3(rop),
            ),
            DrawOrder::PatBlt { dc, rect, rop } => {
                self.pat_blt(dc, rect.x, rect.y, rect.width, rect.height, Rop3(rop))
            },
            DrawOrder::FillRect { dc, rect, brush } => self.fill_rect(dc, &rect, brush),
            DrawOrder::MoveTo { dc, x, y } => self.move_to(dc, x, y).map(drop),
            DrawOrder::LineTo { dc, x, y } => self.line_to(dc, x, y),
            DrawOrder::SetPixel { dc, x, y, color } => self.set_pixel(dc, x, y, color).map(drop),
            DrawOrder::SetRop2 { dc, rop } => self.set_rop2(dc, rop).map(drop),
        }
    }

    /// Run one order and report its status code; `0` is success.
    pub fn execute(&mut self, order: &DrawOrder) -> i32 {
        status_of(&self.apply(order))
    }

    /// Run orders in sequence, stopping at the first failure.
    ///
    /// Returns the number of orders that succeeded and the final status.
    pub fn execute_all<'a, I>(&mut self, orders: I) -> (usize, i32)
    where
        I: IntoIterator<Item = &'a DrawOrder>,
    {
        let mut done = 0;
        for order in orders {
            let status = self.execute(order);
            if status != STATUS_SUCCESS {
                return (done, status);
            }
            done += 1;
        }
        (done, STATUS_SUCCESS)
    }
}

macro_rules! raw_handle_serde {
    ($module:ident, $handle:ty) => {
        mod $module {
            use serde::{Deserialize, Deserializer, Serializer};

            pub fn serialize<S: Serializer>(handle: &$handle, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(handle.to_raw())
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$handle, D::Error> {
                u64::deserialize(deserializer).map(<$handle>::from_raw)
            }
        }
    };
}

raw_handle_serde!(dc_handle, crate::gdi::dc::DcHandle);
raw_handle_serde!(gdi_handle, crate::gdi::objects::GdiHandle);

mod opt_dc_handle {
    use crate::gdi::dc::DcHandle;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(handle: &Option<DcHandle>, serializer: S) -> Result<S::Ok, S::Error> {
        match handle {
            Some(handle) => serializer.serialize_some(&handle.to_raw()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DcHandle>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|raw| raw.map(DcHandle::from_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;
    use crate::gdi::PenStyle;

    fn setup() -> (Gdi, DcHandle) {
        let mut gdi = Gdi::new();
        let dc = gdi.create_dc();
        let surface = gdi.create_bitmap(16, 16, 32).unwrap();
        gdi.select(dc, surface).unwrap();
        (gdi, dc)
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect::new(x, y, w, h).unwrap()
    }

    #[test]
    fn test_execute_reports_status_codes() {
        let (mut gdi, dc) = setup();
        let ok = DrawOrder::PatBlt {
            dc,
            rect: rect(0, 0, 4, 4),
            rop: Rop3::WHITENESS.0,
        };
        assert_eq!(gdi.execute(&ok), 0);

        let geometry = DrawOrder::PatBlt {
            dc,
            rect: rect(0, 0, 32, 4),
            rop: Rop3::WHITENESS.0,
        };
        assert_eq!(gdi.execute(&geometry), Error::Geometry(String::new()).status());

        let stale = DrawOrder::LineTo {
            dc: DcHandle::from_raw(u64::MAX),
            x: 1,
            y: 1,
        };
        assert_eq!(gdi.execute(&stale), Error::InvalidHandle(String::new()).status());
    }

    #[test]
    fn test_bare_table_byte_is_accepted() {
        let (mut gdi, dc) = setup();
        let order = DrawOrder::PatBlt {
            dc,
            rect: rect(0, 0, 2, 2),
            rop: 0xFF,
        };
        assert_eq!(gdi.execute(&order), 0);
        assert_eq!(gdi.get_pixel(dc, 1, 1).unwrap(), Color::WHITE);
    }

    #[test]
    fn test_execute_all_stops_at_failure() {
        let (mut gdi, dc) = setup();
        let pen = gdi.create_pen(PenStyle::Solid, 1, Color::RED);
        gdi.select(dc, pen).unwrap();
        let orders = [
            DrawOrder::MoveTo { dc, x: 0, y: 0 },
            DrawOrder::LineTo { dc, x: 5, y: 0 },
            DrawOrder::LineTo { dc, x: 99, y: 0 },
            DrawOrder::LineTo { dc, x: 0, y: 5 },
        ];
        let (done, status) = gdi.execute_all(&orders);
        assert_eq!(done, 2);
        assert_eq!(status, Error::Geometry(String::new()).status());
        assert_eq!(gdi.get_pixel(dc, 5, 0).unwrap(), Color::RED);
        assert_eq!(gdi.get_pixel(dc, 0, 5).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_fill_and_blit_orders() {
        let (mut gdi, dc) = setup();
        let brush = gdi.create_solid_brush(Color::BLUE);
        let orders = [
            DrawOrder::FillRect {
                dc,
                rect: rect(0, 0, 4, 4),
                brush,
            },
            DrawOrder::BitBlt {
                dest: dc,
                rect: rect(8, 8, 4, 4),
                src: Some(dc),
                x_src: 0,
                y_src: 0,
                rop: Rop3::SRCCOPY.0,
            },
            DrawOrder::SetRop2 { dc, rop: Rop2::NOT },
            DrawOrder::SetPixel {
                dc,
                x: 15,
                y: 15,
                color: Color::RED,
            },
        ];
        assert_eq!(gdi.execute_all(&orders), (4, 0));
        assert_eq!(gdi.get_pixel(dc, 11, 11).unwrap(), Color::BLUE);
        // NOT ignores the pen color
        assert_eq!(gdi.get_pixel(dc, 15, 15).unwrap(), Color::WHITE);
    }
}
