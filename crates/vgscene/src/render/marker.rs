// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::f32::consts::{FRAC_PI_2, PI};

use tiny_skia::{Path, PathSegment, Point, Rect, Size, Transform};

use super::{apply_style, render_children, Canvas, Context, RenderState};
use crate::geom;
use crate::tree::{MarkerOrientation, NodeId, NodeKind};

/// A path vertex with the directions of the adjacent segments in radians.
#[derive(Clone, Copy, Debug)]
struct Vertex {
    pos: Point,
    incoming: Option<f32>,
    outgoing: Option<f32>,
}

impl Vertex {
    fn new(pos: Point) -> Self {
        Vertex {
            pos,
            incoming: None,
            outgoing: None,
        }
    }

    /// Returns a bisector of the adjacent segments in degrees.
    fn angle(&self) -> f32 {
        match (self.incoming, self.outgoing) {
            (Some(in_a), Some(out_a)) => {
                let d = (out_a - in_a) * 0.5;

                let mut angle = in_a + d;
                if FRAC_PI_2 < d.abs() {
                    angle -= PI;
                }

                normalize(angle).to_degrees()
            }
            (Some(a), None) | (None, Some(a)) => a.to_degrees(),
            (None, None) => 0.0,
        }
    }
}

fn normalize(rad: f32) -> f32 {
    let v = rad % (PI * 2.0);
    if v < 0.0 {
        v + PI * 2.0
    } else {
        v
    }
}

fn direction(from: Point, to: Point) -> Option<f32> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx == 0.0 && dy == 0.0 {
        return None;
    }

    let rad = dy.atan2(dx);
    if rad.is_nan() {
        None
    } else {
        Some(normalize(rad))
    }
}

/// Appends a segment that ends at `to`.
///
/// Tangents are taken from the first and the last distinct control points.
fn connect(list: &mut Vec<Vertex>, from: Point, c1: Point, c2: Point, to: Point) {
    let outgoing = direction(from, c1)
        .or_else(|| direction(from, c2))
        .or_else(|| direction(from, to));
    let incoming = direction(c2, to)
        .or_else(|| direction(c1, to))
        .or_else(|| direction(from, to));

    if let Some(last) = list.last_mut() {
        last.outgoing = outgoing;
    }

    list.push(Vertex {
        pos: to,
        incoming,
        outgoing: None,
    });
}

fn collect_vertices(path: &Path) -> Vec<Vertex> {
    let mut list: Vec<Vertex> = Vec::new();
    let mut prev = Point::zero();
    let mut start = Point::zero();
    let mut start_idx = 0;

    for seg in path.segments() {
        match seg {
            PathSegment::MoveTo(p) => {
                list.push(Vertex::new(p));
                start = p;
                start_idx = list.len() - 1;
                prev = p;
            }
            PathSegment::LineTo(p) => {
                connect(&mut list, prev, prev, p, p);
                prev = p;
            }
            PathSegment::QuadTo(p1, p) => {
                connect(&mut list, prev, p1, p1, p);
                prev = p;
            }
            PathSegment::CubicTo(p1, p2, p) => {
                connect(&mut list, prev, p1, p2, p);
                prev = p;
            }
            PathSegment::Close => {
                if prev != start {
                    connect(&mut list, prev, prev, start, start);
                }

                // The closing vertex joins the first segment of the subpath.
                let first_out = list[start_idx].outgoing;
                let last_in = list.last().and_then(|v| v.incoming);
                if let Some(last) = list.last_mut() {
                    last.outgoing = first_out;
                }
                list[start_idx].incoming = last_in;

                prev = start;
            }
        }
    }

    list
}

/// Draws `marker-start`, `marker-mid` and `marker-end` of a shape.
pub(crate) fn render(
    ctx: &mut Context,
    id: NodeId,
    path: &Path,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) {
    let doc = ctx.doc;
    let attrs = doc.node(id).attributes();
    let link = |id: &Option<String>| id.as_deref().and_then(|id| doc.element_by_id(id));

    let start = link(&attrs.marker_start);
    let mid = link(&attrs.marker_mid);
    let end = link(&attrs.marker_end);
    if start.is_none() && mid.is_none() && end.is_none() {
        return;
    }

    let vertices = collect_vertices(path);
    let last = match vertices.len().checked_sub(1) {
        Some(v) => v,
        None => return,
    };

    if let Some(marker) = start {
        draw_marker(ctx, marker, &vertices[0], true, state, canvas);
    }

    if let Some(marker) = mid {
        for v in vertices.iter().take(last).skip(1) {
            draw_marker(ctx, marker, v, false, state, canvas);
        }
    }

    if let Some(marker) = end {
        draw_marker(ctx, marker, &vertices[last], false, state, canvas);
    }
}

fn draw_marker(
    ctx: &mut Context,
    marker_id: NodeId,
    vertex: &Vertex,
    is_start: bool,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) {
    if ctx.active.contains(&marker_id) {
        log::debug!("Recursive marker detected. Skipped.");
        return;
    }

    let doc = ctx.doc;
    let node = doc.node(marker_id);
    let (ref_x, ref_y, width, height, view_box, aspect, orientation, stroke_width_units) =
        match node.kind() {
            NodeKind::Marker {
                ref_x,
                ref_y,
                width,
                height,
                view_box,
                aspect,
                orientation,
                stroke_width_units,
            } => (
                *ref_x,
                *ref_y,
                *width,
                *height,
                *view_box,
                *aspect,
                *orientation,
                *stroke_width_units,
            ),
            _ => return,
        };

    let angle = match orientation {
        MarkerOrientation::AutoStartReverse if is_start => (vertex.angle() + 180.0) % 360.0,
        MarkerOrientation::Auto | MarkerOrientation::AutoStartReverse => vertex.angle(),
        MarkerOrientation::Angle(angle) => angle,
    };

    let stroke_scale = if stroke_width_units {
        state.stroke_width
    } else {
        1.0
    };

    let size = match Size::from_wh(width * stroke_scale, height * stroke_scale) {
        Some(v) => v,
        None => return,
    };

    let mut ts = state.transform.pre_translate(vertex.pos.x, vertex.pos.y);
    if angle != 0.0 {
        ts = ts.pre_concat(Transform::from_rotate(angle));
    }

    ts = match view_box {
        Some(vb) => {
            let (sx, sy) = geom::view_box_to_transform(vb, aspect, size).get_scale();
            ts.pre_scale(sx, sy)
        }
        None => ts.pre_scale(stroke_scale, stroke_scale),
    };
    ts = ts.pre_translate(-ref_x, -ref_y);

    canvas.save();

    // `overflow` is `hidden` by default.
    if node.attributes().clip != Some(false) {
        let clip = match view_box {
            Some(vb) => Some(vb.to_rect()),
            None => Rect::from_xywh(0.0, 0.0, width, height),
        };

        if let Some(clip) = clip {
            canvas.set_transform(ts);
            canvas.set_clip_rect(clip);
        }
    }

    let base = RenderState::new(doc, ts);
    let marker_state = apply_style(ctx, marker_id, &base);

    ctx.active.push(marker_id);
    render_children(ctx, marker_id, &marker_state, canvas);
    ctx.active.pop();

    canvas.restore();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(text: &str) -> Vec<f32> {
        let path = crate::path::parse_path(text).unwrap();
        collect_vertices(&path)
            .iter()
            .map(|v| v.angle().round())
            .collect()
    }

    #[test]
    fn polyline() {
        assert_eq!(angles("M 0 0 L 10 0 L 10 10"), vec![0.0, 45.0, 90.0]);
    }

    #[test]
    fn closed_subpath() {
        let path = crate::path::parse_path("M 0 0 L 10 0 L 10 10 Z").unwrap();
        let list = collect_vertices(&path);
        assert_eq!(list.len(), 4);
        assert_eq!(list[3].pos, Point::from_xy(0.0, 0.0));
        assert!(list[0].incoming.is_some());
        assert!(list[3].outgoing.is_some());
    }

    #[test]
    fn straight_line() {
        assert_eq!(angles("M 0 0 L 10 10"), vec![45.0, 45.0]);
    }
}
