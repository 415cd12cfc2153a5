//! Off-screen RGB framebuffer.
//!
//! [`Canvas`] is an `embedded-graphics` draw target. The raster sinks draw
//! text and glyphs into it, and the terminal sink uses a small one to
//! rasterize glyphs before turning them into half-block characters.

use core::convert::Infallible;

use embedded_graphics::geometry::Angle;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Arc, Circle, Line, Polyline, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle,
    RoundedRectangle, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};

use crate::icons::{Ink, Shape};

/// Panel width in pixels.
pub const CANVAS_WIDTH: u32 = 400;

/// Panel height in pixels.
pub const CANVAS_HEIGHT: u32 = 300;

/// Colour each ink is painted with.
pub fn ink_color(ink: Ink) -> Rgb888 {
    match ink {
        Ink::Black => Rgb888::new(0, 0, 0),
        Ink::White => Rgb888::new(255, 255, 255),
        Ink::Red => Rgb888::new(255, 0, 0),
        Ink::Yellow => Rgb888::new(255, 255, 85),
    }
}

/// Drawing into a [`Canvas`] cannot fail.
fn infallible(result: Result<(), Infallible>) {
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Fixed-size RGB framebuffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Size::new(CANVAS_WIDTH, CANVAS_HEIGHT))
    }
}

impl Canvas {
    /// A white canvas of `size`.
    pub fn new(size: Size) -> Self {
        let len = size.width as usize * size.height as usize;
        Self {
            size,
            pixels: vec![ink_color(Ink::White); len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    /// Colour at `point`, or `None` outside the canvas.
    pub fn pixel(&self, point: Point) -> Option<Rgb888> {
        self.index(point).map(|i| self.pixels[i])
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Pixels of exactly `color`.
    pub fn count(&self, color: Rgb888) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Pixels of `color` inside `area`.
    pub fn count_in(&self, area: &Rectangle, color: Rgb888) -> usize {
        area.points()
            .filter_map(|p| self.pixel(p))
            .filter(|&p| p == color)
            .count()
    }

    /// Draw a single line of text with its top-left corner at `position`.
    pub fn text(&mut self, text: &str, position: Point, font: &MonoFont<'_>, ink: Ink) {
        let style = MonoTextStyle::new(font, ink_color(ink));
        infallible(
            Text::with_baseline(text, position, style, Baseline::Top)
                .draw(self)
                .map(|_| ()),
        );
    }

    /// Stroke a frame of `width` pixels along the canvas edge.
    pub fn border(&mut self, width: u32, ink: Ink) {
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(ink_color(ink))
            .stroke_width(width)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        let frame = Rectangle::new(Point::zero(), self.size);
        infallible(frame.into_styled(style).draw(self));
    }

    /// Paint glyph instructions in order.
    pub fn paint(&mut self, shapes: &[Shape]) {
        for shape in shapes {
            match shape {
                Shape::Circle {
                    top_left,
                    diameter,
                    ink,
                } => infallible(
                    Circle::new(*top_left, *diameter)
                        .into_styled(PrimitiveStyle::with_fill(ink_color(*ink)))
                        .draw(self),
                ),
                Shape::RoundedRect {
                    top_left,
                    size,
                    radius,
                    ink,
                } => infallible(
                    RoundedRectangle::with_equal_corners(
                        Rectangle::new(*top_left, *size),
                        Size::new(*radius, *radius),
                    )
                    .into_styled(PrimitiveStyle::with_fill(ink_color(*ink)))
                    .draw(self),
                ),
                Shape::Line {
                    start,
                    end,
                    width,
                    ink,
                } => infallible(
                    Line::new(*start, *end)
                        .into_styled(PrimitiveStyle::with_stroke(ink_color(*ink), *width))
                        .draw(self),
                ),
                Shape::Polygon { points, ink } => self.fill_polygon(points, ink_color(*ink)),
                Shape::Arc {
                    top_left,
                    diameter,
                    start_deg,
                    sweep_deg,
                    width,
                    ink,
                } => infallible(
                    Arc::new(
                        *top_left,
                        *diameter,
                        Angle::from_degrees(*start_deg as f32),
                        Angle::from_degrees(*sweep_deg as f32),
                    )
                    .into_styled(PrimitiveStyle::with_stroke(ink_color(*ink), *width))
                    .draw(self),
                ),
            }
        }
    }

    /// Even-odd scanline fill, sampling pixel centres, plus a one pixel
    /// outline so thin spikes stay visible.
    fn fill_polygon(&mut self, points: &[Point], color: Rgb888) {
        let Some(first) = points.first().copied() else {
            return;
        };
        let (min_y, max_y) = points
            .iter()
            .fold((first.y, first.y), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

        let edges: Vec<(Point, Point)> = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
            .collect();

        let mut crossings: Vec<f32> = Vec::with_capacity(edges.len());
        for y in min_y..=max_y {
            let scan = y as f32 + 0.5;
            crossings.clear();
            for &(a, b) in &edges {
                let (ay, by) = (a.y as f32, b.y as f32);
                if (ay <= scan && by > scan) || (by <= scan && ay > scan) {
                    let t = (scan - ay) / (by - ay);
                    crossings.push(a.x as f32 + t * (b.x - a.x) as f32);
                }
            }
            crossings.sort_by(f32::total_cmp);
            for pair in crossings.chunks_exact(2) {
                let start = (pair[0] - 0.5).ceil() as i32;
                let end = (pair[1] - 0.5).floor() as i32;
                if end >= start {
                    let span = Rectangle::new(
                        Point::new(start, y),
                        Size::new((end - start + 1) as u32, 1),
                    );
                    infallible(self.fill_solid(&span, color));
                }
            }
        }

        let outline = PrimitiveStyle::with_stroke(color, 1);
        infallible(Polyline::new(points).into_styled(outline).draw(self));
        if let Some(&last) = points.last() {
            infallible(Line::new(last, first).into_styled(outline).draw(self));
        }
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}
