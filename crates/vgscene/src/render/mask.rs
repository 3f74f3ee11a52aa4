// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tiny_skia::{NonZeroRect, Pixmap, Transform};

use super::{apply_style, render_children, Canvas, Context, PixmapCanvas, RenderState};
use crate::geom;
use crate::tree::{NodeId, NodeKind, Units};

/// Applies a luminance mask to a premultiplied layer.
///
/// `transform` maps the masked element user space onto the layer.
/// A mask with its own mask is replaced by the inner one.
pub(crate) fn apply(
    ctx: &mut Context,
    mask_id: NodeId,
    bbox: Option<NonZeroRect>,
    transform: Transform,
    layer: &mut Pixmap,
) {
    let doc = ctx.doc;
    let mask_id = match doc.node(mask_id).attributes().mask.as_deref() {
        Some(inner) => match doc.element_by_id(inner) {
            Some(inner_id) if !ctx.active.contains(&inner_id) => inner_id,
            _ => mask_id,
        },
        None => mask_id,
    };

    if ctx.active.contains(&mask_id) {
        log::debug!("Recursive mask detected. Skipped.");
        return;
    }

    let (rect, units, content_units) = match doc.node(mask_id).kind() {
        NodeKind::Mask {
            rect,
            units,
            content_units,
        } => (*rect, *units, *content_units),
        _ => return,
    };

    let rect = match units {
        Units::ObjectBoundingBox => match bbox.and_then(|bbox| geom::bbox_transform(rect, bbox)) {
            Some(v) => v,
            None => {
                // An `objectBoundingBox` mask on a zero-sized element hides it.
                layer.fill(tiny_skia::Color::TRANSPARENT);
                return;
            }
        },
        Units::UserSpaceOnUse => rect,
    };

    let mut content_ts = transform;
    if content_units == Units::ObjectBoundingBox {
        match bbox {
            Some(bbox) => content_ts = content_ts.pre_concat(Transform::from_bbox(bbox)),
            None => {
                layer.fill(tiny_skia::Color::TRANSPARENT);
                return;
            }
        }
    }

    let mut mask_canvas = match PixmapCanvas::new(layer.width(), layer.height()) {
        Some(v) => v,
        None => return,
    };

    // Mask content is clipped to the mask region.
    mask_canvas.set_transform(transform);
    mask_canvas.set_clip_rect(rect.to_rect());

    let base = RenderState::new(doc, content_ts);
    let state = apply_style(ctx, mask_id, &base);

    ctx.active.push(mask_id);
    render_children(ctx, mask_id, &state, &mut mask_canvas);
    ctx.active.pop();

    let mask_pixmap = mask_canvas.into_pixmap();
    let mask = tiny_skia::Mask::from_pixmap(mask_pixmap.as_ref(), tiny_skia::MaskType::Luminance);
    layer.apply_mask(&mask);
}
