//! Weather glyphs built from primitive shapes.
//!
//! [`compose`] turns an [`IconType`] into an ordered list of [`Shape`]
//! instructions positioned relative to an anchor (the glyph's top-left
//! corner). Later shapes paint over earlier ones, which is how the cloud
//! outlines get their white interiors.
//!
//! Composition is pure: the same arguments always produce the same list, so
//! the terminal renderer can rasterize exactly what the panel shows.
//!
//! | Icon | Glyph |
//! |------|-------|
//! | ClearSky | large sun |
//! | FewClouds | large sun, small cloud bottom-right |
//! | ScatteredClouds | small sun behind a large cloud |
//! | BrokenClouds | large cloud, small cloud in front |
//! | ShowerRain | large cloud, two raindrops |
//! | Rain | small sun, large cloud, two raindrops |
//! | Thunderstorm | large cloud, lightning bolt |
//! | Snow | large cloud, three snowflakes |
//! | Mist | six stacked bands |

use embedded_graphics::prelude::{Point, Size};

use crate::config::BaseColor;
use crate::traits::IconType;

/// Bounding box of a large glyph.
pub const LARGE_GLYPH: Size = Size::new(70, 60);

/// Bounding box of a small glyph.
pub const SMALL_GLYPH: Size = Size::new(35, 30);

/// Bounding box of the closed eye.
pub const EYE_GLYPH: Size = Size::new(170, 112);

// ============================================================================
// Instruction types
// ============================================================================

/// Palette entry a shape is painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ink {
    /// Foreground.
    Black,
    /// Background, used for negative space.
    White,
    /// Red accent.
    Red,
    /// Yellow accent.
    Yellow,
}

/// Accent colour available to a glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Accent {
    /// No accent; accent parts are drawn black.
    #[default]
    Monochrome,
    /// Red accent.
    Red,
    /// Yellow accent.
    Yellow,
}

impl Accent {
    /// Ink used for accent parts.
    pub fn ink(self) -> Ink {
        match self {
            Accent::Monochrome => Ink::Black,
            Accent::Red => Ink::Red,
            Accent::Yellow => Ink::Yellow,
        }
    }
}

impl From<BaseColor> for Accent {
    fn from(color: BaseColor) -> Self {
        match color {
            BaseColor::Black => Accent::Monochrome,
            BaseColor::Red => Accent::Red,
            BaseColor::Yellow => Accent::Yellow,
        }
    }
}

/// Glyph scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconSize {
    /// Main weather icon.
    Large,
    /// Forecast slot icon, half size.
    Small,
}

impl IconSize {
    /// Bounding box at this size.
    pub fn extent(self) -> Size {
        match self {
            IconSize::Large => LARGE_GLYPH,
            IconSize::Small => SMALL_GLYPH,
        }
    }
}

/// One drawing instruction in absolute coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Filled circle.
    Circle {
        /// Top-left of the bounding square.
        top_left: Point,
        /// Diameter in pixels.
        diameter: u32,
        /// Fill.
        ink: Ink,
    },
    /// Filled rectangle with rounded corners.
    RoundedRect {
        /// Top-left corner.
        top_left: Point,
        /// Width and height.
        size: Size,
        /// Corner radius.
        radius: u32,
        /// Fill.
        ink: Ink,
    },
    /// Straight stroke.
    Line {
        /// First endpoint.
        start: Point,
        /// Second endpoint.
        end: Point,
        /// Stroke width.
        width: u32,
        /// Stroke colour.
        ink: Ink,
    },
    /// Filled polygon, even-odd rule.
    Polygon {
        /// Vertices in order; the path closes itself.
        points: Vec<Point>,
        /// Fill.
        ink: Ink,
    },
    /// Circular arc stroke. Angles in degrees, clockwise from 3 o'clock.
    Arc {
        /// Top-left of the circle's bounding square.
        top_left: Point,
        /// Circle diameter.
        diameter: u32,
        /// Start angle.
        start_deg: i32,
        /// Sweep angle.
        sweep_deg: i32,
        /// Stroke width.
        width: u32,
        /// Stroke colour.
        ink: Ink,
    },
}

// ============================================================================
// Composition
// ============================================================================

/// Build the glyph for `icon` with its top-left corner at `anchor`.
pub fn compose(icon: IconType, anchor: Point, size: IconSize, accent: Accent) -> Vec<Shape> {
    let mut pen = Pen::new(anchor, size, accent);
    match icon {
        IconType::ClearSky => pen.large_sun(7, 0),
        IconType::FewClouds => {
            pen.large_sun(7, 0);
            pen.small_cloud(26, 31);
        }
        IconType::ScatteredClouds => {
            pen.small_sun(0, 0);
            pen.large_cloud(0, 5);
        }
        IconType::BrokenClouds => {
            pen.large_cloud(0, 0);
            pen.small_cloud(30, 25);
        }
        IconType::ShowerRain => {
            pen.large_cloud(0, 0);
            pen.raindrop(25, 45);
            pen.raindrop(42, 45);
        }
        IconType::Rain => {
            pen.small_sun(0, 0);
            pen.large_cloud(0, 5);
            pen.raindrop(25, 50);
            pen.raindrop(42, 50);
        }
        IconType::Thunderstorm => {
            pen.large_cloud(0, 0);
            pen.lightning(30, 45);
        }
        IconType::Snow => {
            pen.large_cloud(0, 0);
            pen.snowflake(12, 45);
            pen.snowflake(26, 50);
            pen.snowflake(40, 45);
        }
        IconType::Mist => pen.mist(5, 0),
    }
    pen.shapes
}

/// The goodnight glyph: a closed eye with four lashes.
pub fn closed_eye(anchor: Point, accent: Accent) -> Vec<Shape> {
    let mut pen = Pen::new(anchor, IconSize::Large, accent);
    let ink = accent.ink();
    let arc = Shape::Arc {
        top_left: pen.at(10, -60),
        diameter: 150,
        start_deg: 20,
        sweep_deg: 140,
        width: 8,
        ink,
    };
    pen.shapes.push(arc);
    for (from, to) in [
        ((146, 58), (167, 72)),
        ((111, 85), (119, 109)),
        ((59, 85), (51, 109)),
        ((24, 58), (3, 72)),
    ] {
        pen.line(from, to, 8, ink);
    }
    pen.shapes
}

/// Maps design coordinates (large glyph space) onto the canvas.
struct Pen {
    anchor: Point,
    num: i32,
    den: i32,
    accent: Accent,
    shapes: Vec<Shape>,
}

impl Pen {
    fn new(anchor: Point, size: IconSize, accent: Accent) -> Self {
        let (num, den) = match size {
            IconSize::Large => (1, 1),
            IconSize::Small => (1, 2),
        };
        Self {
            anchor,
            num,
            den,
            accent,
            shapes: Vec::new(),
        }
    }

    fn at(&self, x: i32, y: i32) -> Point {
        self.anchor + Point::new(x * self.num / self.den, y * self.num / self.den)
    }

    fn len(&self, v: u32) -> u32 {
        (v * self.num as u32 / self.den as u32).max(1)
    }

    fn circle(&mut self, x: i32, y: i32, diameter: u32, ink: Ink) {
        let shape = Shape::Circle {
            top_left: self.at(x, y),
            diameter: self.len(diameter),
            ink,
        };
        self.shapes.push(shape);
    }

    fn line(&mut self, (x0, y0): (i32, i32), (x1, y1): (i32, i32), width: u32, ink: Ink) {
        let shape = Shape::Line {
            start: self.at(x0, y0),
            end: self.at(x1, y1),
            width: self.len(width),
            ink,
        };
        self.shapes.push(shape);
    }

    fn polygon(&mut self, points: &[(i32, i32)], ink: Ink) {
        let points = points.iter().map(|&(x, y)| self.at(x, y)).collect();
        self.shapes.push(Shape::Polygon { points, ink });
    }

    fn large_sun(&mut self, x: i32, y: i32) {
        let ink = self.accent.ink();
        // Rays: top, bottom, left, right
        self.polygon(&[(x + 29, y), (x + 34, y + 16), (x + 24, y + 16)], ink);
        self.polygon(&[(x + 29, y + 56), (x + 34, y + 46), (x + 24, y + 46)], ink);
        self.polygon(&[(x, y + 28), (x + 17, y + 23), (x + 17, y + 33)], ink);
        self.polygon(&[(x + 57, y + 28), (x + 41, y + 23), (x + 41, y + 33)], ink);
        self.line((x + 10, y + 10), (x + 47, y + 47), 5, ink);
        self.line((x + 10, y + 47), (x + 47, y + 10), 5, ink);
        self.circle(x + 12, y + 12, 33, Ink::White);
        self.circle(x + 17, y + 17, 23, ink);
    }

    fn small_sun(&mut self, x: i32, y: i32) {
        let ink = self.accent.ink();
        self.line((x + 5, y + 5), (x + 25, y + 25), 5, ink);
        self.line((x + 5, y + 25), (x + 25, y + 5), 5, ink);
        self.polygon(&[(x + 11, y + 10), (x, y + 15), (x + 20, y + 19)], ink);
        self.polygon(&[(x + 15, y), (x + 10, y + 10), (x + 20, y + 10)], ink);
        self.polygon(&[(x + 20, y + 10), (x + 30, y + 15), (x + 20, y + 20)], ink);
        self.circle(x + 5, y + 5, 20, ink);
        self.circle(x + 10, y + 10, 10, Ink::White);
    }

    fn large_cloud(&mut self, x: i32, y: i32) {
        for (dx, dy, d) in [(0, 20, 20), (5, 10, 30), (15, 0, 40), (35, 10, 30)] {
            self.circle(x + dx, y + dy, d, Ink::Black);
        }
        for (dx, dy, d) in [(5, 25, 10), (10, 15, 20), (20, 5, 30), (40, 15, 20)] {
            self.circle(x + dx, y + dy, d, Ink::White);
        }
    }

    fn small_cloud(&mut self, x: i32, y: i32) {
        for (dx, dy, d) in [(0, 10, 11), (5, 5, 16), (10, 0, 21), (20, 5, 16)] {
            self.circle(x + dx, y + dy, d, Ink::Black);
        }
        for (dx, dy, d) in [(3, 13, 5), (8, 8, 10), (13, 3, 15), (23, 8, 10)] {
            self.circle(x + dx, y + dy, d, Ink::White);
        }
    }

    fn raindrop(&mut self, x: i32, y: i32) {
        self.circle(x + 3, y + 3, 5, Ink::Black);
        self.polygon(
            &[(x, y), (x + 6, y + 6), (x + 7, y + 3), (x + 3, y)],
            Ink::Black,
        );
    }

    fn lightning(&mut self, x: i32, y: i32) {
        let ink = self.accent.ink();
        self.polygon(
            &[
                (x, y),
                (x + 8, y),
                (x + 12, y + 6),
                (x + 6, y + 6),
                (x + 8, y + 12),
                (x, y + 4),
                (x + 7, y + 4),
            ],
            ink,
        );
    }

    fn snowflake(&mut self, x: i32, y: i32) {
        self.line((x + 5, y), (x + 5, y + 8), 2, Ink::Black);
        self.line((x + 1, y + 1), (x + 10, y + 6), 2, Ink::Black);
        self.line((x + 1, y + 6), (x + 10, y + 1), 2, Ink::Black);
    }

    fn mist(&mut self, x: i32, y: i32) {
        for (x0, x1, dy) in [
            (22, 40, 0),
            (4, 47, 8),
            (15, 60, 16),
            (0, 55, 24),
            (9, 51, 32),
            (20, 40, 40),
        ] {
            let shape = Shape::RoundedRect {
                top_left: self.at(x + x0, y + dy),
                size: Size::new(self.len((x1 - x0) as u32), self.len(4)),
                radius: self.len(2),
                ink: Ink::Black,
            };
            self.shapes.push(shape);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(shapes: &[Shape], origin: Point, extent: Size) -> bool {
        let inside = |p: &Point| {
            p.x >= origin.x
                && p.y >= origin.y
                && p.x <= origin.x + extent.width as i32
                && p.y <= origin.y + extent.height as i32
        };
        shapes.iter().all(|shape| match shape {
            Shape::Circle {
                top_left, diameter, ..
            } => inside(top_left) && inside(&(*top_left + Point::new(*diameter as i32, *diameter as i32))),
            Shape::RoundedRect { top_left, size, .. } => {
                inside(top_left) && inside(&(*top_left + *size))
            }
            Shape::Line { start, end, .. } => inside(start) && inside(end),
            Shape::Polygon { points, .. } => points.iter().all(inside),
            Shape::Arc { .. } => true,
        })
    }

    #[test]
    fn composition_is_deterministic() {
        for icon in IconType::ALL {
            let a = compose(icon, Point::new(30, 90), IconSize::Large, Accent::Red);
            let b = compose(icon, Point::new(30, 90), IconSize::Large, Accent::Red);
            assert_eq!(a, b);
            assert_eq!(format!("{a:?}"), format!("{b:?}"));
        }
    }

    #[test]
    fn glyphs_stay_inside_their_box() {
        let anchor = Point::new(100, 100);
        for icon in IconType::ALL {
            for size in [IconSize::Large, IconSize::Small] {
                let shapes = compose(icon, anchor, size, Accent::Yellow);
                assert!(!shapes.is_empty());
                assert!(within(&shapes, anchor, size.extent()), "{icon:?} {size:?}");
            }
        }
    }

    #[test]
    fn anchor_translates_everything() {
        let a = compose(IconType::Rain, Point::zero(), IconSize::Large, Accent::Monochrome);
        let b = compose(IconType::Rain, Point::new(10, 20), IconSize::Large, Accent::Monochrome);
        assert_eq!(a.len(), b.len());
        match (&a[0], &b[0]) {
            (Shape::Line { start: s0, .. }, Shape::Line { start: s1, .. }) => {
                assert_eq!(*s1 - *s0, Point::new(10, 20));
            }
            other => panic!("unexpected first shapes {other:?}"),
        }
    }

    #[test]
    fn accent_only_on_accent_parts() {
        let mono = compose(IconType::ClearSky, Point::zero(), IconSize::Large, Accent::Monochrome);
        let red = compose(IconType::ClearSky, Point::zero(), IconSize::Large, Accent::Red);
        let ink = |s: &Shape| match s {
            Shape::Circle { ink, .. }
            | Shape::RoundedRect { ink, .. }
            | Shape::Line { ink, .. }
            | Shape::Polygon { ink, .. }
            | Shape::Arc { ink, .. } => *ink,
        };
        assert!(mono.iter().all(|s| matches!(ink(s), Ink::Black | Ink::White)));
        assert!(red.iter().any(|s| ink(s) == Ink::Red));

        let cloud = compose(IconType::BrokenClouds, Point::zero(), IconSize::Large, Accent::Red);
        assert!(cloud.iter().all(|s| ink(s) != Ink::Red));
    }

    #[test]
    fn distinct_icons_distinct_glyphs() {
        let glyphs: Vec<_> = IconType::ALL
            .iter()
            .map(|&icon| compose(icon, Point::zero(), IconSize::Large, Accent::Monochrome))
            .collect();
        for (i, a) in glyphs.iter().enumerate() {
            for b in &glyphs[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn mist_is_rounded_bands() {
        let shapes = compose(IconType::Mist, Point::zero(), IconSize::Large, Accent::Red);
        assert_eq!(shapes.len(), 6);
        assert!(shapes.iter().all(|s| matches!(s, Shape::RoundedRect { .. })));
    }

    #[test]
    fn closed_eye_is_only_arc_user() {
        for icon in IconType::ALL {
            let shapes = compose(icon, Point::zero(), IconSize::Large, Accent::Yellow);
            assert!(!shapes.iter().any(|s| matches!(s, Shape::Arc { .. })));
        }
        let eye = closed_eye(Point::zero(), Accent::Yellow);
        assert_eq!(eye.len(), 5);
        assert!(matches!(eye[0], Shape::Arc { ink: Ink::Yellow, .. }));
        assert!(within(&eye, Point::zero(), EYE_GLYPH));
    }
}
