// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tiny_skia::{NonZeroRect, Transform};

use super::{apply_style, make_pen, paint_server, Canvas, Context, FontQuery, RenderState};
use crate::tree::{FontStyle, NodeId, NodeKind, SvgFont, TextAnchor};

const LINE_SPACING: f32 = 1.2;

#[derive(Clone, Copy, Debug)]
struct Cursor {
    x: f32,
    y: f32,
    /// Where a new line starts.
    line_x: f32,
}

/// Renders a `text` or a `textArea` element.
pub(crate) fn render(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let mut cursor = match *ctx.doc.node(id).kind() {
        NodeKind::Text { x, y } => Cursor { x, y, line_x: x },
        // A text area is positioned by its top edge.
        NodeKind::Textarea { x, y, .. } => Cursor {
            x,
            y: y + state.font_size,
            line_x: x,
        },
        _ => return,
    };

    canvas.save();
    render_spans(ctx, id, state, &mut cursor, canvas);
    canvas.restore();
}

fn render_spans(
    ctx: &mut Context,
    id: NodeId,
    state: &RenderState,
    cursor: &mut Cursor,
    canvas: &mut dyn Canvas,
) {
    let doc = ctx.doc;
    for &child in doc.node(id).children() {
        let node = doc.node(child);
        match node.kind() {
            NodeKind::TextRun(text) => render_run(ctx, text, state, cursor, canvas),
            NodeKind::TBreak => {
                cursor.x = cursor.line_x;
                cursor.y += state.font_size * LINE_SPACING;
            }
            NodeKind::Tspan { x, y, dx, dy } => {
                if !node.attributes().display {
                    continue;
                }

                if let Some(x) = *x {
                    cursor.x = x;
                    cursor.line_x = x;
                }
                if let Some(y) = *y {
                    cursor.y = y;
                }
                cursor.x += dx;
                cursor.y += dy;

                if ctx.enter() {
                    let span_state = apply_style(ctx, child, state);
                    render_spans(ctx, child, &span_state, cursor, canvas);
                    ctx.leave();
                }
            }
            _ => {}
        }
    }
}

fn svg_font<'a>(ctx: &Context<'a>, state: &RenderState) -> Option<&'a SvgFont> {
    let doc = ctx.doc;
    state
        .font_families
        .iter()
        .find_map(|family| doc.font(family))
        .map(|font| font.as_ref())
}

fn svg_font_width(font: &SvgFont, text: &str, scale: f32) -> f32 {
    text.chars()
        .filter_map(|c| font.glyph(c))
        .map(|g| g.horiz_adv_x * scale)
        .sum()
}

fn render_run(
    ctx: &mut Context,
    text: &str,
    state: &RenderState,
    cursor: &mut Cursor,
    canvas: &mut dyn Canvas,
) {
    if let Some(font) = svg_font(ctx, state) {
        render_svg_font_run(ctx, font, text, state, cursor, canvas);
        return;
    }

    let query = FontQuery {
        families: &state.font_families,
        size: state.font_size,
        weight: state.extra.font_weight,
        italic: state.font_style != FontStyle::Normal,
    };

    let width = canvas.measure_text(text, &query);
    let x = cursor.x - anchor_shift(state.extra.text_anchor, width.unwrap_or(0.0));

    if !state.visible {
        cursor.x += width.unwrap_or(0.0);
        return;
    }

    let bbox = width.and_then(|w| {
        NonZeroRect::from_xywh(x, cursor.y - state.font_size, w, state.font_size)
    });

    state.setup_canvas(canvas);
    let brush = paint_server::brush(ctx, &state.fill, state, bbox);
    let has_brush = brush.is_some();
    canvas.set_brush(brush);
    canvas.set_pen(None);
    canvas.set_opacity(state.opacity * state.extra.fill_opacity);

    let advance = if has_brush {
        canvas.draw_text(text, x, cursor.y, &query)
    } else {
        None
    };

    match advance.or(width) {
        Some(advance) => cursor.x += advance,
        None => log::debug!("The canvas cannot draw '{}'.", text),
    }
}

fn render_svg_font_run(
    ctx: &mut Context,
    font: &SvgFont,
    text: &str,
    state: &RenderState,
    cursor: &mut Cursor,
    canvas: &mut dyn Canvas,
) {
    let scale = state.font_size / font.units_per_em;
    let width = svg_font_width(font, text, scale);
    let start_x = cursor.x - anchor_shift(state.extra.text_anchor, width);
    cursor.x += width;

    if !state.visible {
        return;
    }

    let ascent = font.ascent * scale;
    let descent = font.descent * scale;
    let bbox = NonZeroRect::from_xywh(start_x, cursor.y - ascent, width, ascent - descent);

    state.setup_canvas(canvas);
    let fill = paint_server::brush(ctx, &state.fill, state, bbox);
    let pen = make_pen(ctx, state, bbox);

    let mut x = start_x;
    for c in text.chars() {
        let glyph = match font.glyph(c) {
            Some(v) => v,
            None => continue,
        };

        // Glyphs are defined with the Y axis pointing up.
        let ts = Transform::from_row(scale, 0.0, 0.0, -scale, x, cursor.y);
        x += glyph.horiz_adv_x * scale;

        let path = match glyph.path.as_ref().and_then(|p| tiny_skia::Path::clone(p).transform(ts)) {
            Some(v) => v,
            None => continue,
        };

        if let Some(ref brush) = fill {
            canvas.set_brush(Some(brush.clone()));
            canvas.set_pen(None);
            canvas.set_opacity(state.opacity * state.extra.fill_opacity);
            canvas.draw_path(&path, state.extra.fill_rule);
        }

        if let Some(ref pen) = pen {
            canvas.set_brush(None);
            canvas.set_pen(Some(pen.clone()));
            canvas.set_opacity(state.opacity * state.extra.stroke_opacity);
            canvas.draw_path(&path, state.extra.fill_rule);
        }
    }
}

fn anchor_shift(anchor: TextAnchor, width: f32) -> f32 {
    match anchor {
        TextAnchor::Start => 0.0,
        TextAnchor::Middle => width / 2.0,
        TextAnchor::End => width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PixmapCanvas;
    use crate::tree::Document;

    const FONT: &str = "
        <font horiz-adv-x='500'>
            <font-face font-family='Box' units-per-em='1000' ascent='1000' descent='0'/>
            <glyph unicode='a' d='M 0 0 L 500 0 L 500 1000 L 0 1000 Z'/>
            <missing-glyph horiz-adv-x='250'/>
        </font>";

    fn render_doc(body: &str) -> tiny_skia::Pixmap {
        let text = format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='40' height='20'>{}{}</svg>",
            FONT, body
        );
        let doc = Document::from_str(&text, &crate::Options::default()).unwrap();
        let mut canvas = PixmapCanvas::new(40, 20).unwrap();
        doc.render(&mut canvas, None, 0.0);
        canvas.into_pixmap()
    }

    fn alpha(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn glyph_width() {
        let doc = Document::from_str(
            &format!("<svg xmlns='http://www.w3.org/2000/svg'>{}</svg>", FONT),
            &crate::Options::default(),
        )
        .unwrap();
        let font = doc.font("Box").unwrap();
        assert_eq!(svg_font_width(font, "aa", 0.5), 500.0);
        assert_eq!(svg_font_width(font, "ab", 0.5), 375.0);
    }

    #[test]
    fn svg_font_glyphs() {
        let pixmap = render_doc("<text x='0' y='10' font-family='Box' font-size='10'>aa</text>");
        assert_eq!(alpha(&pixmap, 2, 5), 255);
        assert_eq!(alpha(&pixmap, 7, 5), 255);
        assert_eq!(alpha(&pixmap, 12, 5), 0);
        assert_eq!(alpha(&pixmap, 2, 15), 0);
    }

    #[test]
    fn anchor_end() {
        let pixmap = render_doc(
            "<text x='20' y='10' font-family='Box' font-size='10' text-anchor='end'>a</text>",
        );
        assert_eq!(alpha(&pixmap, 17, 5), 255);
        assert_eq!(alpha(&pixmap, 22, 5), 0);
    }

    #[test]
    fn line_break() {
        let pixmap = render_doc(
            "<textArea x='0' y='0' font-family='Box' font-size='8'>a<tbreak/>a</textArea>",
        );
        // The second line starts at 8 * 1.2 below the first one.
        assert_eq!(alpha(&pixmap, 2, 4), 255);
        assert_eq!(alpha(&pixmap, 2, 14), 255);
        assert_eq!(alpha(&pixmap, 6, 14), 0);
    }

    #[test]
    fn system_font_is_declined() {
        let pixmap = render_doc("<text x='0' y='10' font-family='Serif'>text</text>");
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }
}
