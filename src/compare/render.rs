//! Rasterisation of vector snapshots onto a shared pixel frame.

use geo::{BoundingRect as _, Coord, Geometry, LineString, Rect};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

const BACKGROUND: Luma<u8> = Luma([255]);
const STROKE: Luma<u8> = Luma([0]);

/// Union of the bounding rectangles of every geometry.
pub fn total_bounds(geometries: &[Geometry<f64>]) -> Option<Rect<f64>> {
    geometries
        .iter()
        .filter_map(|g| g.bounding_rect())
        .reduce(union)
}

pub fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Maps world coordinates into a fixed-size canvas, north up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub bounds: Rect<f64>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(bounds: Rect<f64>, width: u32, height: u32) -> Self {
        Self {
            bounds,
            width,
            height,
        }
    }

    /// A zero-extent axis collapses onto the canvas centre line.
    pub fn to_pixel(&self, c: Coord<f64>) -> (f32, f32) {
        let span_x = f64::from(self.width.saturating_sub(1));
        let span_y = f64::from(self.height.saturating_sub(1));
        let dx = self.bounds.width();
        let dy = self.bounds.height();

        let px = if dx > 0.0 {
            (c.x - self.bounds.min().x) / dx * span_x
        } else {
            span_x / 2.0
        };
        let py = if dy > 0.0 {
            (self.bounds.max().y - c.y) / dy * span_y
        } else {
            span_y / 2.0
        };
        (px as f32, py as f32)
    }
}

/// Every stroked path of a geometry; points carry no stroke.
fn polylines(geometry: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
    match geometry {
        Geometry::Line(line) => out.push(LineString::from(vec![line.start, line.end])),
        Geometry::LineString(ls) => out.push(ls.clone()),
        Geometry::MultiLineString(mls) => out.extend(mls.0.iter().cloned()),
        Geometry::Polygon(polygon) => {
            out.push(polygon.exterior().clone());
            out.extend(polygon.interiors().iter().cloned());
        }
        Geometry::MultiPolygon(mp) => {
            for polygon in &mp.0 {
                polylines(&Geometry::Polygon(polygon.clone()), out);
            }
        }
        Geometry::Rect(rect) => polylines(&Geometry::Polygon(rect.to_polygon()), out),
        Geometry::Triangle(tri) => polylines(&Geometry::Polygon(tri.to_polygon()), out),
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                polylines(g, out);
            }
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
    }
}

fn to_point(x: f32, y: f32) -> Point<i32> {
    Point::new(x.round() as i32, y.round() as i32)
}

fn draw_stroke(canvas: &mut GrayImage, a: (f32, f32), b: (f32, f32), half_width: f32) {
    draw_line_segment_mut(canvas, a, b, STROKE);
    if half_width < 1.0 {
        return;
    }

    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len > f32::EPSILON {
        let (nx, ny) = (-dy / len * half_width, dx / len * half_width);
        let quad = [
            to_point(a.0 + nx, a.1 + ny),
            to_point(b.0 + nx, b.1 + ny),
            to_point(b.0 - nx, b.1 - ny),
            to_point(a.0 - nx, a.1 - ny),
        ];
        if quad[0] != quad[3] {
            draw_polygon_mut(canvas, &quad, STROKE);
        }
    }

    let radius = half_width.round() as i32;
    for end in [a, b] {
        draw_filled_circle_mut(
            canvas,
            (end.0.round() as i32, end.1.round() as i32),
            radius,
            STROKE,
        );
    }
}

/// Draws every geometry as uniform black strokes on a white canvas.
pub fn render(geometries: &[Geometry<f64>], frame: &Frame, stroke_width: f64) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(frame.width, frame.height, BACKGROUND);
    let half_width = (stroke_width / 2.0) as f32;

    let mut lines = Vec::new();
    for geometry in geometries {
        polylines(geometry, &mut lines);
    }

    for line in &lines {
        for segment in line.lines() {
            let a = frame.to_pixel(segment.start);
            let b = frame.to_pixel(segment.end);
            draw_stroke(&mut canvas, a, b, half_width);
        }
    }

    canvas
}
