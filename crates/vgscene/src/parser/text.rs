// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::rc::Rc;

use super::convert::State;
use super::node::SvgNode;
use super::{units, AId, EId};
use crate::tree::{Glyph, NodeKind, SvgFont};

/// Returns the first value of a coordinates list.
fn first_coordinate(node: SvgNode, aid: AId, state: &State) -> Option<f32> {
    units::convert_list(node, aid, state).and_then(|list| list.first().copied())
}

pub(crate) fn convert_text(node: SvgNode, state: &State) -> NodeKind {
    NodeKind::Text {
        x: first_coordinate(node, AId::X, state).unwrap_or(0.0),
        y: first_coordinate(node, AId::Y, state).unwrap_or(0.0),
    }
}

pub(crate) fn convert_tspan(node: SvgNode, state: &State) -> NodeKind {
    NodeKind::Tspan {
        x: first_coordinate(node, AId::X, state),
        y: first_coordinate(node, AId::Y, state),
        dx: first_coordinate(node, AId::Dx, state).unwrap_or(0.0),
        dy: first_coordinate(node, AId::Dy, state).unwrap_or(0.0),
    }
}

pub(crate) fn convert_text_area(node: SvgNode, state: &State) -> NodeKind {
    let size = |aid: AId| -> Option<f32> {
        match node.attribute::<&str>(aid) {
            Some("auto") | None => None,
            Some(_) => units::convert_attr(node, aid, state).filter(|n| *n > 0.0),
        }
    };

    NodeKind::Textarea {
        x: units::convert_attr(node, AId::X, state).unwrap_or(0.0),
        y: units::convert_attr(node, AId::Y, state).unwrap_or(0.0),
        width: size(AId::Width),
        height: size(AId::Height),
    }
}

/// Converts a `font` element into an SVG font.
///
/// Returns `None` when there is no `font-face` with a family name.
pub(crate) fn convert_font(node: SvgNode) -> Option<SvgFont> {
    let horiz_adv_x = node.attribute::<f32>(AId::HorizAdvX).unwrap_or(0.0);

    let mut font = SvgFont {
        family: String::new(),
        units_per_em: 1000.0,
        horiz_adv_x,
        ascent: 800.0,
        descent: -200.0,
        glyphs: HashMap::new(),
        missing_glyph: None,
    };

    for (eid, child) in node.element_children() {
        match eid {
            EId::FontFace => {
                if let Some(family) = child.attribute::<&str>(AId::FontFamily) {
                    font.family = family.trim().trim_matches(|c| c == '\'' || c == '"').to_string();
                }

                if let Some(n) = child.attribute::<f32>(AId::UnitsPerEm) {
                    if n > 0.0 {
                        font.units_per_em = n;
                    }
                }

                font.ascent = child.attribute(AId::Ascent).unwrap_or(font.ascent);
                font.descent = child.attribute(AId::Descent).unwrap_or(font.descent);
            }
            EId::Glyph => {
                let mut chars = match child.attribute::<&str>(AId::Unicode) {
                    Some(v) => v.chars(),
                    None => continue,
                };

                // Ligatures are not supported.
                let c = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => continue,
                };

                font.glyphs.entry(c).or_insert_with(|| convert_glyph(child, horiz_adv_x));
            }
            EId::MissingGlyph => {
                font.missing_glyph = Some(convert_glyph(child, horiz_adv_x));
            }
            _ => {}
        }
    }

    if font.family.is_empty() {
        log::warn!("A font without a family name. Skipped.");
        return None;
    }

    Some(font)
}

fn convert_glyph(node: SvgNode, font_horiz_adv_x: f32) -> Glyph {
    Glyph {
        path: node
            .attribute::<&str>(AId::D)
            .and_then(crate::path::parse_path)
            .map(Rc::new),
        horiz_adv_x: node.attribute(AId::HorizAdvX).unwrap_or(font_horiz_adv_x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font() {
        let mut source = crate::xml::RoxmlSource::parse(
            "<svg><font horiz-adv-x='500'>\
                <font-face font-family='\"Test\"' units-per-em='100' ascent='80'/>\
                <missing-glyph d='M0 0 L10 10'/>\
                <glyph unicode='a' horiz-adv-x='40' d='M0 0 L10 0 L10 10 Z'/>\
                <glyph unicode='a' horiz-adv-x='99'/>\
                <glyph unicode='ab'/>\
             </font></svg>",
        )
        .unwrap();
        let doc = super::super::builder::build(&mut source).unwrap();
        let font = convert_font(SvgNode::new(&doc, 1)).unwrap();

        assert_eq!(font.family, "Test");
        assert_eq!(font.units_per_em, 100.0);
        assert_eq!(font.ascent, 80.0);
        assert_eq!(font.glyphs.len(), 1);
        assert_eq!(font.glyph('a').unwrap().horiz_adv_x, 40.0);
        assert!(font.glyph('a').unwrap().path.is_some());
        assert_eq!(font.glyph('z').unwrap().horiz_adv_x, 500.0);
    }
}
