// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tiny_skia::{NonZeroRect, Rect, Size, Transform};

use crate::tree::{Align, AspectRatio};

/// Converts a view box into a transform that maps it onto the viewport of `size`.
pub(crate) fn view_box_to_transform(
    view_box: NonZeroRect,
    aspect: AspectRatio,
    size: Size,
) -> Transform {
    let vr = view_box;

    let sx = size.width() / vr.width();
    let sy = size.height() / vr.height();

    let (sx, sy) = if aspect.align == Align::None {
        (sx, sy)
    } else {
        let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
        (s, s)
    };

    let x = -vr.x() * sx;
    let y = -vr.y() * sy;
    let w = size.width() - vr.width() * sx;
    let h = size.height() - vr.height() * sy;

    let (tx, ty) = aligned_pos(aspect.align, x, y, w, h);
    Transform::from_row(sx, 0.0, 0.0, sy, tx, ty)
}

/// Returns object aligned position.
pub(crate) fn aligned_pos(align: Align, x: f32, y: f32, w: f32, h: f32) -> (f32, f32) {
    match align {
        Align::None => (x, y),
        Align::XMinYMin => (x, y),
        Align::XMidYMin => (x + w / 2.0, y),
        Align::XMaxYMin => (x + w, y),
        Align::XMinYMid => (x, y + h / 2.0),
        Align::XMidYMid => (x + w / 2.0, y + h / 2.0),
        Align::XMaxYMid => (x + w, y + h / 2.0),
        Align::XMinYMax => (x, y + h),
        Align::XMidYMax => (x + w / 2.0, y + h),
        Align::XMaxYMax => (x + w, y + h),
    }
}

/// Maps a rect in `objectBoundingBox` units onto the bounding box.
pub(crate) fn bbox_transform(rect: NonZeroRect, bbox: NonZeroRect) -> Option<NonZeroRect> {
    NonZeroRect::from_xywh(
        rect.x() * bbox.width() + bbox.x(),
        rect.y() * bbox.height() + bbox.y(),
        rect.width() * bbox.width(),
        rect.height() * bbox.height(),
    )
}

/// Returns the bounding box of a transformed rect.
pub(crate) fn transform_rect(rect: Rect, ts: Transform) -> Option<Rect> {
    if ts.is_identity() {
        return Some(rect);
    }

    let mut points = [
        tiny_skia::Point::from_xy(rect.left(), rect.top()),
        tiny_skia::Point::from_xy(rect.right(), rect.top()),
        tiny_skia::Point::from_xy(rect.right(), rect.bottom()),
        tiny_skia::Point::from_xy(rect.left(), rect.bottom()),
    ];
    ts.map_points(&mut points);

    let mut left = f32::MAX;
    let mut top = f32::MAX;
    let mut right = f32::MIN;
    let mut bottom = f32::MIN;
    for p in &points {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }

    Rect::from_ltrb(left, top, right, bottom)
}

/// Returns a union of two rects.
pub(crate) fn union_rect(a: Rect, b: Rect) -> Rect {
    Rect::from_ltrb(
        a.left().min(b.left()),
        a.top().min(b.top()),
        a.right().max(b.right()),
        a.bottom().max(b.bottom()),
    )
    .unwrap_or(a)
}

/// Returns a transform that places a document of `size` with `view_box`
/// onto a target of `target` pixels.
///
/// An explicit view box is stretched to the target, unless `keep_aspect`
/// is set. An implicit one is always scaled uniformly and centered.
pub(crate) fn fit_to_target(
    view_box: NonZeroRect,
    aspect: AspectRatio,
    explicit_view_box: bool,
    keep_aspect: bool,
    target: Size,
) -> Transform {
    let aspect = if explicit_view_box && !keep_aspect {
        AspectRatio {
            align: Align::None,
            ..aspect
        }
    } else if !explicit_view_box {
        AspectRatio {
            defer: false,
            align: Align::XMidYMid,
            slice: false,
        }
    } else {
        aspect
    };

    view_box_to_transform(view_box, aspect, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspect(align: Align, slice: bool) -> AspectRatio {
        AspectRatio {
            defer: false,
            align,
            slice,
        }
    }

    #[test]
    fn view_box_meet() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 100.0, 50.0).unwrap();
        let size = Size::from_wh(200.0, 200.0).unwrap();
        let ts = view_box_to_transform(vb, aspect(Align::XMidYMid, false), size);
        assert_eq!(ts, Transform::from_row(2.0, 0.0, 0.0, 2.0, 0.0, 50.0));
    }

    #[test]
    fn view_box_slice() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 100.0, 50.0).unwrap();
        let size = Size::from_wh(200.0, 200.0).unwrap();
        let ts = view_box_to_transform(vb, aspect(Align::XMinYMin, true), size);
        assert_eq!(ts, Transform::from_row(4.0, 0.0, 0.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn view_box_stretch() {
        let vb = NonZeroRect::from_xywh(10.0, 10.0, 100.0, 50.0).unwrap();
        let size = Size::from_wh(200.0, 200.0).unwrap();
        let ts = view_box_to_transform(vb, aspect(Align::None, false), size);
        assert_eq!(ts, Transform::from_row(2.0, 0.0, 0.0, 4.0, -20.0, -40.0));
    }

    #[test]
    fn implicit_view_box_is_centered() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 100.0, 50.0).unwrap();
        let target = Size::from_wh(200.0, 200.0).unwrap();
        let ts = fit_to_target(vb, aspect(Align::None, false), false, false, target);
        assert_eq!(ts, Transform::from_row(2.0, 0.0, 0.0, 2.0, 0.0, 50.0));

        let ts = fit_to_target(vb, aspect(Align::XMidYMid, false), true, false, target);
        assert_eq!(ts, Transform::from_row(2.0, 0.0, 0.0, 4.0, 0.0, 0.0));
    }

    #[test]
    fn rect_bbox() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap();
        let r = transform_rect(r, Transform::from_rotate(90.0)).unwrap();
        assert!((r.left() + 20.0).abs() < 1e-4);
        assert!((r.right() - 0.0).abs() < 1e-4);
        assert!((r.bottom() - 10.0).abs() < 1e-4);
    }
}
