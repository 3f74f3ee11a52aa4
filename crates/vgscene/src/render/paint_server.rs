// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use tiny_skia::{IntSize, NonZeroRect, Point, Transform};

use super::{apply_style, render_children, Brush, Context, GradientStop, PixmapCanvas, RenderState};
use crate::geom;
use crate::tree::{Color, Gradient, GradientKind, NodeId, NodeKind, Paint, PaintStyle, Units};

/// Converts a paint into a brush.
///
/// `bbox` is the bounding box of the painted element in its user space.
/// Returns `None` when nothing should be painted.
pub(crate) fn brush(
    ctx: &mut Context,
    paint: &Paint,
    state: &RenderState,
    bbox: Option<NonZeroRect>,
) -> Option<Brush> {
    match paint {
        Paint::None => None,
        Paint::Color(c) => Some(Brush::Color(to_color(*c))),
        Paint::CurrentColor => Some(Brush::Color(to_color(state.color))),
        // Resolved during loading.
        Paint::Server { .. } => None,
        Paint::Style(PaintStyle::Solid(c)) => Some(Brush::Color(to_color(*c))),
        Paint::Style(PaintStyle::Gradient(g)) => gradient_brush(g, bbox),
        Paint::Style(PaintStyle::Pattern(id)) => pattern_brush(ctx, *id, state, bbox),
    }
}

fn to_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.red, c.green, c.blue, c.alpha)
}

fn gradient_brush(g: &Gradient, bbox: Option<NonZeroRect>) -> Option<Brush> {
    let stops: Vec<GradientStop> = g
        .stops
        .iter()
        .map(|stop| {
            let mut color = to_color(stop.color);
            color.apply_opacity(stop.opacity);
            GradientStop {
                offset: stop.offset,
                color,
            }
        })
        .collect();

    match stops.as_slice() {
        [] => return None,
        [stop] => return Some(Brush::Color(stop.color)),
        _ => {}
    }

    let transform = match g.units {
        Units::ObjectBoundingBox => {
            let bbox = bbox.or_else(|| {
                log::warn!("Gradient '{}' on a zero-sized shape is not allowed.", g.id);
                None
            })?;
            Transform::from_bbox(bbox).pre_concat(g.transform)
        }
        Units::UserSpaceOnUse => g.transform,
    };

    let brush = match g.kind {
        GradientKind::Linear { x1, y1, x2, y2 } => Brush::LinearGradient {
            start: Point::from_xy(x1, y1),
            end: Point::from_xy(x2, y2),
            stops,
            spread: g.spread,
            transform,
        },
        GradientKind::Radial { cx, cy, r, fx, fy } => Brush::RadialGradient {
            center: Point::from_xy(cx, cy),
            focal: Point::from_xy(fx, fy),
            radius: r,
            stops,
            spread: g.spread,
            transform,
        },
    };

    Some(brush)
}

/// Renders a pattern tile at the device scale.
fn pattern_brush(
    ctx: &mut Context,
    id: NodeId,
    state: &RenderState,
    bbox: Option<NonZeroRect>,
) -> Option<Brush> {
    if ctx.active.contains(&id) {
        log::debug!("Recursive pattern detected. Skipped.");
        return None;
    }

    let doc = ctx.doc;
    let (rect, units, content_units, pattern_ts, view_box, aspect) = match doc.node(id).kind() {
        NodeKind::Pattern {
            rect,
            units,
            content_units,
            transform,
            view_box,
            aspect,
        } => (*rect, *units, *content_units, *transform, *view_box, *aspect),
        _ => return None,
    };

    let rect = match units {
        Units::ObjectBoundingBox => geom::bbox_transform(rect, bbox?)?,
        Units::UserSpaceOnUse => rect,
    };

    let (sx, sy) = state.transform.pre_concat(pattern_ts).get_scale();

    let img_size = IntSize::from_wh(
        (rect.width() * sx).round() as u32,
        (rect.height() * sy).round() as u32,
    )?;

    if img_size.width() as u64 * img_size.height() as u64 > doc.options().max_layer_size {
        log::warn!("Pattern '{}' tile is too large. Skipped.", doc.node(id).attributes().id);
        return None;
    }

    let mut canvas = PixmapCanvas::new(img_size.width(), img_size.height())?;

    let mut content_ts = Transform::from_scale(sx, sy);
    if let Some(view_box) = view_box {
        let ts = geom::view_box_to_transform(view_box, aspect, rect.size());
        content_ts = content_ts.pre_concat(ts);
    } else if content_units == Units::ObjectBoundingBox {
        let bbox = bbox?;
        content_ts = content_ts.pre_scale(bbox.width(), bbox.height());
    }

    let base = RenderState::new(doc, content_ts);
    let pattern_state = apply_style(ctx, id, &base);

    ctx.active.push(id);
    render_children(ctx, id, &pattern_state, &mut canvas);
    ctx.active.pop();

    let transform = pattern_ts
        .pre_translate(rect.x(), rect.y())
        .pre_scale(1.0 / sx, 1.0 / sy);

    Some(Brush::Pattern {
        image: Rc::new(canvas.into_pixmap()),
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{SpreadMethod, Stop};

    fn gradient(units: Units, stops: Vec<Stop>) -> Gradient {
        Gradient {
            id: "lg".to_string(),
            kind: GradientKind::Linear {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
            },
            units,
            transform: Transform::identity(),
            spread: SpreadMethod::Pad,
            stops,
        }
    }

    fn stop(offset: f32, color: Color) -> Stop {
        Stop {
            offset,
            color,
            opacity: 1.0,
        }
    }

    #[test]
    fn single_stop_is_solid() {
        let g = gradient(Units::UserSpaceOnUse, vec![stop(0.5, Color::red())]);
        match gradient_brush(&g, None) {
            Some(Brush::Color(c)) => assert_eq!(c, tiny_skia::Color::from_rgba8(255, 0, 0, 255)),
            _ => panic!("expected a solid brush"),
        }
    }

    #[test]
    fn no_stops() {
        let g = gradient(Units::UserSpaceOnUse, Vec::new());
        assert!(gradient_brush(&g, None).is_none());
    }

    #[test]
    fn bbox_units() {
        let stops = vec![stop(0.0, Color::red()), stop(1.0, Color::black())];
        let g = gradient(Units::ObjectBoundingBox, stops);
        assert!(gradient_brush(&g, None).is_none());

        let bbox = NonZeroRect::from_xywh(10.0, 20.0, 30.0, 40.0);
        match gradient_brush(&g, bbox) {
            Some(Brush::LinearGradient { transform, .. }) => {
                assert_eq!(transform, Transform::from_row(30.0, 0.0, 0.0, 40.0, 10.0, 20.0));
            }
            _ => panic!("expected a linear gradient"),
        }
    }
}
