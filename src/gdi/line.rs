//! Integer line rasterization.
//!
//! Lines are walked lazily and only inside a drawing window, so neither the
//! length of a line nor the width of its pen bounds the work done; the
//! window does.

use super::objects::PenStyle;
use super::region::{Point, Rect};

/// Pixels drawn per dash.
pub const DASH_ON: u32 = 18;
/// Pixels skipped between dashes.
pub const DASH_OFF: u32 = 6;

/// One pixel of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokePixel {
    pub point: Point,
    /// Whether the pen style paints this pixel; gaps may still take the
    /// background color in opaque mode
    pub on: bool,
}

/// Bresenham walk from `start` to `end`, both inclusive.
///
/// Step `k` sits `k` pixels along the major axis and
/// `round(k * minor_len / major_len)` along the minor axis, with halves
/// rounding up, so any step can be reached without walking the ones before.
#[derive(Debug, Clone)]
pub struct Bresenham {
    major_origin: i64,
    minor_origin: i64,
    major_sign: i64,
    minor_sign: i64,
    major_len: i64,
    minor_len: i64,
    x_major: bool,
    /// Next step to emit
    step: i64,
    /// Last step to emit, inclusive
    last: i64,
    /// Minor offset at `step`
    minor: i64,
    /// Numerator remainder at `step`, below `2 * major_len`
    rem: i64,
}

impl Bresenham {
    pub fn new(start: Point, end: Point) -> Self {
        let dx = i64::from(end.x) - i64::from(start.x);
        let dy = i64::from(end.y) - i64::from(start.y);
        let x_major = dx.abs() >= dy.abs();
        let (major_origin, minor_origin, major_delta, minor_delta) = if x_major {
            (start.x, start.y, dx, dy)
        } else {
            (start.y, start.x, dy, dx)
        };
        let mut walk = Self {
            major_origin: i64::from(major_origin),
            minor_origin: i64::from(minor_origin),
            major_sign: if major_delta < 0 { -1 } else { 1 },
            minor_sign: if minor_delta < 0 { -1 } else { 1 },
            major_len: major_delta.abs(),
            minor_len: minor_delta.abs(),
            x_major,
            step: 0,
            last: major_delta.abs(),
            minor: 0,
            rem: 0,
        };
        walk.seek(0);
        walk
    }

    /// Whether the line advances one column per step.
    pub fn x_major(&self) -> bool {
        self.x_major
    }

    /// Jump to `step` without visiting the steps before it.
    fn seek(&mut self, step: i64) {
        self.step = step;
        if self.major_len == 0 {
            self.minor = 0;
            self.rem = 0;
            return;
        }
        let denom = 2 * i128::from(self.major_len);
        let num = 2 * i128::from(step) * i128::from(self.minor_len) + i128::from(self.major_len);
        // the quotient never exceeds minor_len and the remainder stays below denom
        self.minor = (num / denom) as i64;
        self.rem = (num % denom) as i64;
    }

    /// Keep only the steps whose major coordinate lies in `lo..=hi`.
    ///
    /// Step numbers are kept, so dash phases stay anchored at the start.
    pub fn restrict_major(&mut self, lo: i64, hi: i64) {
        let (first, last) = if self.major_sign > 0 {
            (lo - self.major_origin, hi - self.major_origin)
        } else {
            (self.major_origin - hi, self.major_origin - lo)
        };
        let first = first.max(self.step);
        let last = last.min(self.last);
        if first > last {
            self.step = self.last + 1;
            return;
        }
        self.seek(first);
        self.last = last;
    }

    /// Next step number and its pixel.
    pub fn advance(&mut self) -> Option<(i64, Point)> {
        if self.step > self.last {
            return None;
        }
        let step = self.step;
        // both coordinates lie between the endpoints, so they fit in i32
        let major = (self.major_origin + self.major_sign * step) as i32;
        let minor = (self.minor_origin + self.minor_sign * self.minor) as i32;
        let point = if self.x_major {
            Point::new(major, minor)
        } else {
            Point::new(minor, major)
        };

        self.step += 1;
        self.rem += 2 * self.minor_len;
        if self.major_len > 0 && self.rem >= 2 * self.major_len {
            self.rem -= 2 * self.major_len;
            self.minor += 1;
        }
        Some((step, point))
    }
}

impl Iterator for Bresenham {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        self.advance().map(|(_, point)| point)
    }
}

#[inline]
fn dash_on(step: i64) -> bool {
    step.rem_euclid(i64::from(DASH_ON + DASH_OFF)) < i64::from(DASH_ON)
}

/// The pixels inside `window` that a pen of `style` and `width` covers
/// between two points.
///
/// Width is replicated across the minor axis by `(width - 1) / 2` pixels on
/// each side. A null pen covers nothing. Each pixel is yielded at most once.
pub fn stroke(
    start: Point,
    end: Point,
    style: PenStyle,
    width: u32,
    window: Rect,
) -> impl Iterator<Item = StrokePixel> {
    let mut walk = Bresenham::new(start, end);
    let x_major = walk.x_major();
    let half = i64::from((width.max(1) - 1) / 2);
    let columns = (i64::from(window.x), i64::from(window.right()) - 1);
    let rows = (i64::from(window.y), i64::from(window.bottom()) - 1);
    let (major, minor) = if x_major { (columns, rows) } else { (rows, columns) };
    walk.restrict_major(major.0, major.1);

    let drawn = style != PenStyle::Null;
    std::iter::from_fn(move || walk.advance())
        .take_while(move |_| drawn)
        .flat_map(move |(step, center)| {
            let on = style != PenStyle::Dash || dash_on(step);
            let c = i64::from(if x_major { center.y } else { center.x });
            let lo = (-half).max(minor.0 - c);
            let hi = half.min(minor.1 - c);
            (lo..=hi).map(move |offset| {
                let m = (c + offset) as i32;
                let point = if x_major {
                    Point::new(center.x, m)
                } else {
                    Point::new(m, center.y)
                };
                StrokePixel { point, on }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
        Bresenham::new(Point::new(start.0, start.1), Point::new(end.0, end.1))
            .map(|p| (p.x, p.y))
            .collect()
    }

    fn everywhere() -> Rect {
        Rect::new(-1000, -1000, 2000, 2000).unwrap()
    }

    fn pixels(start: (i32, i32), end: (i32, i32), style: PenStyle, width: u32, window: Rect) -> Vec<StrokePixel> {
        stroke(Point::new(start.0, start.1), Point::new(end.0, end.1), style, width, window).collect()
    }

    #[test]
    fn test_horizontal_inclusive() {
        assert_eq!(points((0, 0), (4, 0)), vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
    }

    #[test]
    fn test_single_point() {
        assert_eq!(points((3, 3), (3, 3)), vec![(3, 3)]);
    }

    #[test]
    fn test_diagonal_and_reverse() {
        assert_eq!(points((0, 0), (3, 3)), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(points((3, 0), (0, 0)), vec![(3, 0), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn test_steep_line_visits_every_row() {
        let pts = points((0, 0), (2, 7));
        assert_eq!(pts.len(), 8);
        for (row, (_, y)) in pts.iter().enumerate() {
            assert_eq!(*y, row as i32);
        }
        assert_eq!(pts.last(), Some(&(2, 7)));
    }

    #[test]
    fn test_width_replicates_across_minor_axis() {
        let px = pixels((0, 5), (2, 5), PenStyle::Solid, 3, everywhere());
        assert_eq!(px.len(), 9);
        assert!(px.iter().any(|p| p.point == Point::new(1, 4)));
        assert!(px.iter().any(|p| p.point == Point::new(1, 6)));

        let vertical = pixels((5, 0), (5, 2), PenStyle::Solid, 3, everywhere());
        assert!(vertical.iter().any(|p| p.point == Point::new(4, 1)));

        // even widths round down
        assert_eq!(pixels((0, 0), (2, 0), PenStyle::Solid, 2, everywhere()).len(), 3);
    }

    #[test]
    fn test_dash_runs() {
        let end = (DASH_ON + DASH_OFF) as i32;
        let px = pixels((0, 0), (end, 0), PenStyle::Dash, 1, everywhere());
        let on = px.iter().filter(|p| p.on).count();
        assert_eq!(on as u32, DASH_ON + 1);
        assert!(px[DASH_ON as usize - 1].on);
        assert!(!px[DASH_ON as usize].on);
    }

    #[test]
    fn test_null_pen() {
        assert!(pixels((0, 0), (9, 9), PenStyle::Null, 1, everywhere()).is_empty());
    }

    #[test]
    fn test_window_limits_pen_width() {
        let window = Rect::new(0, 0, 4, 10).unwrap();
        let px = pixels((0, 5), (3, 5), PenStyle::Solid, u32::MAX, window);
        assert_eq!(px.len(), 40);
        assert!(px.iter().all(|p| window.contains_point(p.point.x, p.point.y)));
    }

    #[test]
    fn test_width_at_coordinate_limit() {
        let window = Rect::new(0, i32::MAX - 1, 2, 1).unwrap();
        let px = pixels((0, i32::MAX), (1, i32::MAX), PenStyle::Solid, 3, window);
        let pts: Vec<_> = px.iter().map(|p| (p.point.x, p.point.y)).collect();
        assert_eq!(pts, vec![(0, i32::MAX - 1), (1, i32::MAX - 1)]);

        let px = pixels((i32::MIN, 0), (i32::MIN, 1), PenStyle::Solid, 5, everywhere());
        assert!(px.is_empty());
    }

    #[test]
    fn test_long_line_walks_only_the_window() {
        let window = Rect::new(0, 0, 4, 1).unwrap();
        let px = pixels((0, 0), (i32::MAX, 0), PenStyle::Solid, 1, window);
        let xs: Vec<_> = px.iter().map(|p| p.point.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);

        let window = Rect::new(0, 0, 1, 1).unwrap();
        let px = pixels((i32::MIN, i32::MIN), (i32::MAX, i32::MAX), PenStyle::Solid, 1, window);
        assert_eq!(px.len(), 1);
        assert_eq!(px[0].point, Point::new(0, 0));
    }

    #[test]
    fn test_window_keeps_dash_phase() {
        let window = Rect::new(-12, 0, 8, 1).unwrap();
        let px = pixels((-30, 0), (30, 0), PenStyle::Dash, 1, window);
        let runs: Vec<_> = px.iter().map(|p| (p.point.x, p.on)).collect();
        assert_eq!(
            runs,
            vec![
                (-12, false),
                (-11, false),
                (-10, false),
                (-9, false),
                (-8, false),
                (-7, false),
                (-6, true),
                (-5, true),
            ]
        );
    }

    #[test]
    fn test_window_on_reversed_line() {
        let window = Rect::new(2, -5, 3, 10).unwrap();
        let xs: Vec<_> = pixels((10, 0), (0, 0), PenStyle::Solid, 1, window)
            .iter()
            .map(|p| p.point.x)
            .collect();
        assert_eq!(xs, vec![4, 3, 2]);
    }

    #[test]
    fn test_seek_matches_walk() {
        let start = Point::new(-7, 3);
        let end = Point::new(40, -11);
        let full: Vec<Point> = Bresenham::new(start, end).collect();
        for first in 0..full.len() {
            let mut walk = Bresenham::new(start, end);
            walk.seek(first as i64);
            assert_eq!(walk.collect::<Vec<_>>(), full[first..].to_vec());
        }
    }
}
