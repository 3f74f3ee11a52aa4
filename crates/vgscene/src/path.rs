// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Path data conversion and shape outlines.

use std::f64::consts::FRAC_PI_2;

use float_cmp::ApproxEqUlps;
use kurbo::Shape;
use tiny_skia::{Path, PathBuilder, PathSegment, Point, Rect};
use vgtypes::PathSegment as Segment;

use crate::tree::NodeKind;

/// Longer paths are truncated.
const MAX_SEGMENTS: usize = 32767;

/// The previous command kind, for smooth curves reflection.
#[derive(Clone, Copy)]
enum Prev {
    Other,
    /// The second control point of a cubic curve.
    Cubic(f64, f64),
    /// The control point of a quadratic curve.
    Quad(f64, f64),
}

/// Parses path data into an absolute path.
///
/// Parsing stops at the first error, keeping the segments parsed so far.
/// Returns `None` when there is nothing to draw.
pub(crate) fn parse_path(text: &str) -> Option<Path> {
    let mut builder = PathBuilder::new();

    // Current point.
    let (mut px, mut py) = (0.0f64, 0.0f64);
    // Subpath start.
    let (mut mx, mut my) = (0.0f64, 0.0f64);
    let mut prev = Prev::Other;
    let mut count = 0;

    for segment in vgtypes::PathParser::from(text) {
        let segment = match segment {
            Ok(v) => v,
            Err(_) => break,
        };

        count += 1;
        if count > MAX_SEGMENTS {
            log::warn!("A path has more than {} segments. The rest is ignored.", MAX_SEGMENTS);
            break;
        }

        let rel = |abs: bool, x: f64, y: f64| if abs { (x, y) } else { (px + x, py + y) };

        match segment {
            Segment::MoveTo { abs, x, y } => {
                let (x, y) = rel(abs, x, y);
                builder.move_to(x as f32, y as f32);
                px = x;
                py = y;
                mx = x;
                my = y;
                prev = Prev::Other;
            }
            Segment::LineTo { abs, x, y } => {
                let (x, y) = rel(abs, x, y);
                builder.line_to(x as f32, y as f32);
                px = x;
                py = y;
                prev = Prev::Other;
            }
            Segment::HorizontalLineTo { abs, x } => {
                let x = if abs { x } else { px + x };
                builder.line_to(x as f32, py as f32);
                px = x;
                prev = Prev::Other;
            }
            Segment::VerticalLineTo { abs, y } => {
                let y = if abs { y } else { py + y };
                builder.line_to(px as f32, y as f32);
                py = y;
                prev = Prev::Other;
            }
            Segment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (x1, y1) = rel(abs, x1, y1);
                let (x2, y2) = rel(abs, x2, y2);
                let (x, y) = rel(abs, x, y);
                cubic_to(&mut builder, x1, y1, x2, y2, x, y);
                px = x;
                py = y;
                prev = Prev::Cubic(x2, y2);
            }
            Segment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let (x1, y1) = match prev {
                    Prev::Cubic(cx, cy) => (px * 2.0 - cx, py * 2.0 - cy),
                    _ => (px, py),
                };
                let (x2, y2) = rel(abs, x2, y2);
                let (x, y) = rel(abs, x, y);
                cubic_to(&mut builder, x1, y1, x2, y2, x, y);
                px = x;
                py = y;
                prev = Prev::Cubic(x2, y2);
            }
            Segment::Quadratic { abs, x1, y1, x, y } => {
                let (x1, y1) = rel(abs, x1, y1);
                let (x, y) = rel(abs, x, y);
                builder.quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
                px = x;
                py = y;
                prev = Prev::Quad(x1, y1);
            }
            Segment::SmoothQuadratic { abs, x, y } => {
                let (x1, y1) = match prev {
                    Prev::Quad(cx, cy) => (px * 2.0 - cx, py * 2.0 - cy),
                    _ => (px, py),
                };
                let (x, y) = rel(abs, x, y);
                builder.quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
                px = x;
                py = y;
                prev = Prev::Quad(x1, y1);
            }
            Segment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let (x, y) = rel(abs, x, y);
                arc_to(&mut builder, (px, py), rx, ry, x_axis_rotation, large_arc, sweep, (x, y));
                px = x;
                py = y;
                prev = Prev::Other;
            }
            Segment::ClosePath { .. } => {
                builder.close();
                px = mx;
                py = my;
                prev = Prev::Other;
            }
        }
    }

    builder.finish()
}

#[inline]
fn cubic_to(builder: &mut PathBuilder, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
    builder.cubic_to(x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32);
}

/// Appends an SVG elliptical arc as a list of cubic curves.
///
/// The arc is split into `ceil(|sweep| / 90°)` segments.
/// Degenerate arcs become lines.
#[allow(clippy::too_many_arguments)]
fn arc_to(
    builder: &mut PathBuilder,
    from: (f64, f64),
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: (f64, f64),
) {
    let svg_arc = kurbo::SvgArc {
        from: kurbo::Point::new(from.0, from.1),
        to: kurbo::Point::new(to.0, to.1),
        radii: kurbo::Vec2::new(rx, ry),
        x_rotation: x_axis_rotation.to_radians(),
        large_arc,
        sweep,
    };

    let arc = match kurbo::Arc::from_svg_arc(&svg_arc) {
        Some(arc) => arc,
        None => {
            if !(from.0.approx_eq_ulps(&to.0, 4) && from.1.approx_eq_ulps(&to.1, 4)) {
                builder.line_to(to.0 as f32, to.1 as f32);
            }
            return;
        }
    };

    let count = (arc.sweep_angle.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let delta = arc.sweep_angle / count as f64;
    let k = 4.0 / 3.0 * (delta / 4.0).tan();

    let (sin_rot, cos_rot) = arc.x_rotation.sin_cos();
    let point = |angle: f64, rx: f64, ry: f64| -> (f64, f64) {
        let (sin, cos) = angle.sin_cos();
        let x = rx * cos;
        let y = ry * sin;
        (
            arc.center.x + x * cos_rot - y * sin_rot,
            arc.center.y + x * sin_rot + y * cos_rot,
        )
    };
    let derivative = |angle: f64| -> (f64, f64) {
        let (sin, cos) = angle.sin_cos();
        let x = -arc.radii.x * sin;
        let y = arc.radii.y * cos;
        (x * cos_rot - y * sin_rot, x * sin_rot + y * cos_rot)
    };

    let mut angle = arc.start_angle;
    let mut start = from;
    for i in 0..count {
        let next_angle = angle + delta;
        let end = if i + 1 == count {
            to
        } else {
            point(next_angle, arc.radii.x, arc.radii.y)
        };

        let d1 = derivative(angle);
        let d2 = derivative(next_angle);
        cubic_to(
            builder,
            start.0 + k * d1.0,
            start.1 + k * d1.1,
            end.0 - k * d2.0,
            end.1 - k * d2.1,
            end.0,
            end.1,
        );

        angle = next_angle;
        start = end;
    }
}

/// Converts a shape node into a path.
///
/// Returns `None` for non-shape nodes and empty paths.
pub(crate) fn shape_to_path(kind: &NodeKind) -> Option<Path> {
    match *kind {
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            rx,
            ry,
        } => rect_to_path(x, y, width, height, rx, ry),
        NodeKind::Circle { cx, cy, r } => ellipse_to_path(cx, cy, r, r),
        NodeKind::Ellipse { cx, cy, rx, ry } => ellipse_to_path(cx, cy, rx, ry),
        NodeKind::Line { x1, y1, x2, y2 } => {
            let mut builder = PathBuilder::new();
            builder.move_to(x1, y1);
            builder.line_to(x2, y2);
            builder.finish()
        }
        NodeKind::Path(ref path) => path.as_deref().cloned(),
        NodeKind::Polyline(ref points) => points_to_path(points, false),
        NodeKind::Polygon(ref points) => points_to_path(points, true),
        _ => None,
    }
}

fn rect_to_path(x: f32, y: f32, width: f32, height: f32, rx: f32, ry: f32) -> Option<Path> {
    if rx.approx_eq_ulps(&0.0, 4) || ry.approx_eq_ulps(&0.0, 4) {
        return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, width, height)?));
    }

    let (x, y, w, h) = (x as f64, y as f64, width as f64, height as f64);
    let (rx, ry) = (rx as f64, ry as f64);

    let mut builder = PathBuilder::new();
    builder.move_to((x + rx) as f32, y as f32);
    builder.line_to((x + w - rx) as f32, y as f32);
    arc_to(&mut builder, (x + w - rx, y), rx, ry, 0.0, false, true, (x + w, y + ry));
    builder.line_to((x + w) as f32, (y + h - ry) as f32);
    arc_to(&mut builder, (x + w, y + h - ry), rx, ry, 0.0, false, true, (x + w - rx, y + h));
    builder.line_to((x + rx) as f32, (y + h) as f32);
    arc_to(&mut builder, (x + rx, y + h), rx, ry, 0.0, false, true, (x, y + h - ry));
    builder.line_to(x as f32, (y + ry) as f32);
    arc_to(&mut builder, (x, y + ry), rx, ry, 0.0, false, true, (x + rx, y));
    builder.close();
    builder.finish()
}

pub(crate) fn ellipse_to_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    let (cx, cy, rx, ry) = (cx as f64, cy as f64, rx as f64, ry as f64);

    let mut builder = PathBuilder::new();
    builder.move_to((cx + rx) as f32, cy as f32);
    arc_to(&mut builder, (cx + rx, cy), rx, ry, 0.0, false, true, (cx, cy + ry));
    arc_to(&mut builder, (cx, cy + ry), rx, ry, 0.0, false, true, (cx - rx, cy));
    arc_to(&mut builder, (cx - rx, cy), rx, ry, 0.0, false, true, (cx, cy - ry));
    arc_to(&mut builder, (cx, cy - ry), rx, ry, 0.0, false, true, (cx + rx, cy));
    builder.close();
    builder.finish()
}

pub(crate) fn points_to_path(points: &[(f32, f32)], close: bool) -> Option<Path> {
    let mut builder = PathBuilder::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            builder.move_to(x, y);
        } else {
            builder.line_to(x, y);
        }
    }

    if close {
        builder.close();
    }

    builder.finish()
}

/// Calculates an exact path bounding box.
///
/// Unlike `Path::bounds`, control points outside the curve are not included.
pub(crate) fn path_bbox(path: &Path) -> Option<Rect> {
    let bbox = to_bez_path(path).bounding_box();
    Rect::from_ltrb(bbox.x0 as f32, bbox.y0 as f32, bbox.x1 as f32, bbox.y1 as f32)
}

/// Calculates a path bounding box after transformation.
pub(crate) fn transformed_path_bbox(path: &Path, ts: tiny_skia::Transform) -> Option<Rect> {
    let path = path.clone().transform(ts)?;
    path_bbox(&path)
}

fn to_bez_path(path: &Path) -> kurbo::BezPath {
    let p = |p: Point| kurbo::Point::new(p.x as f64, p.y as f64);

    let mut bez = kurbo::BezPath::new();
    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p0) => bez.move_to(p(p0)),
            PathSegment::LineTo(p0) => bez.line_to(p(p0)),
            PathSegment::QuadTo(p0, p1) => bez.quad_to(p(p0), p(p1)),
            PathSegment::CubicTo(p0, p1, p2) => bez.curve_to(p(p0), p(p1), p(p2)),
            PathSegment::Close => bez.close_path(),
        }
    }

    bez
}
