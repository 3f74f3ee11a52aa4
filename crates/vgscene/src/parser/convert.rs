// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use tiny_skia::{NonZeroRect, Size};
use vgtypes::{Length, LengthUnit as Unit};

use super::node::SvgNode;
use super::{animation, filter, image, paint_server, style, text, units};
use super::{AId, EId, Error, Options, OptionLog, RawDocument};
use crate::tree::{
    CommonAttrs, Document, MarkerOrientation, NodeId, NodeKind, PaintStyle, StyleSlots, Units,
};

#[derive(Clone, Copy)]
pub(crate) struct State<'a> {
    pub(crate) opt: &'a Options,
    /// A view box of the nearest viewport. Used by percentages.
    pub(crate) view_box: NonZeroRect,
    /// An inherited `font-size`. Used by `em` and `ex` units.
    pub(crate) font_size: f32,
}

/// Converts a raw tree into a `Document`.
///
/// References are not resolved yet.
pub(crate) fn convert_doc(raw: &RawDocument, opt: &Options) -> Result<Document, Error> {
    let svg = SvgNode::new(raw, raw.root());
    let (size, view_box) = resolve_svg_size(svg, opt);
    let rect = view_box.unwrap_or_else(|| size.to_non_zero_rect(0.0, 0.0));

    let mut doc = Document::new(opt.clone(), size, rect);
    doc.explicit_view_box = view_box.is_some();
    doc.aspect = svg.attribute(AId::PreserveAspectRatio).unwrap_or_default();

    let state = State {
        opt,
        view_box: rect,
        font_size: opt.font_size,
    };

    let root = doc.root();
    convert_element(svg, EId::Svg, root, &state, &mut doc);

    if doc.root_element().is_none() {
        return Err(Error::NotAnSvg);
    }

    Ok(doc)
}

/// Resolves the root element size.
///
/// Missing `width` and `height` are `100%`. Percentages are relative to the
/// `viewBox` or to `Options::default_size` when there is no `viewBox`.
fn resolve_svg_size(svg: SvgNode, opt: &Options) -> (Size, Option<NonZeroRect>) {
    let view_box = convert_view_box(svg);
    let base = view_box.map(|r| r.size()).unwrap_or(opt.default_size);

    let mut state = State {
        opt,
        view_box: base.to_non_zero_rect(0.0, 0.0),
        font_size: opt.font_size,
    };
    state.font_size = units::resolve_font_size(svg, &state).unwrap_or(opt.font_size);

    let def = Length::new(100.0, Unit::Percent);
    let conv = |aid: AId, base: f32| -> f32 {
        let length = match svg.attribute::<&str>(aid) {
            Some("auto") | None => def,
            Some(_) => svg.attribute(aid).unwrap_or(def),
        };

        if length.unit == Unit::Percent {
            base * (length.number as f32) / 100.0
        } else {
            units::convert_user_length(length, aid, &state)
        }
    };

    let size = Size::from_wh(conv(AId::Width, base.width()), conv(AId::Height, base.height()))
        .log_none(|| log::warn!("Invalid SVG size. The default one will be used."))
        .unwrap_or(base);

    (size, view_box)
}

pub(crate) fn convert_view_box(node: SvgNode) -> Option<NonZeroRect> {
    let vb: vgtypes::ViewBox = node.attribute(AId::ViewBox)?;
    NonZeroRect::from_xywh(vb.x as f32, vb.y as f32, vb.w as f32, vb.h as f32)
}

/// Converts `x`, `y`, `width` and `height` with zero defaults.
pub(crate) fn convert_rect(node: SvgNode, units: Units, state: &State) -> Option<NonZeroRect> {
    let conv = |aid: AId| -> f32 {
        let length = node.attribute::<Length>(aid).unwrap_or(Length::zero());
        units::convert_length(length, aid, units, state)
    };

    NonZeroRect::from_xywh(conv(AId::X), conv(AId::Y), conv(AId::Width), conv(AId::Height))
}

/// Converts a filter or mask region.
///
/// Defaults to `-10% -10% 120% 120%`.
pub(crate) fn convert_region(node: SvgNode, units: Units, state: &State) -> Option<NonZeroRect> {
    let conv = |aid: AId, def: f64| -> f32 {
        let length = node
            .attribute::<Length>(aid)
            .unwrap_or(Length::new(def, Unit::Percent));
        units::convert_length(length, aid, units, state)
    };

    NonZeroRect::from_xywh(
        conv(AId::X, -10.0),
        conv(AId::Y, -10.0),
        conv(AId::Width, 120.0),
        conv(AId::Height, 120.0),
    )
}

fn convert_children(parent: SvgNode, parent_id: NodeId, state: &State, doc: &mut Document) {
    for child in parent.children() {
        match child.tag_name() {
            Some(eid) => convert_element(child, eid, parent_id, state, doc),
            None => {
                if let Some(text) = child.text() {
                    let attrs = CommonAttrs {
                        display: true,
                        ..CommonAttrs::default()
                    };
                    doc.append(
                        parent_id,
                        NodeKind::TextRun(text.to_string()),
                        attrs,
                        StyleSlots::default(),
                    );
                }
            }
        }
    }
}

fn convert_element(node: SvgNode, eid: EId, parent_id: NodeId, state: &State, doc: &mut Document) {
    let state = State {
        font_size: units::resolve_font_size(node, state).unwrap_or(state.font_size),
        ..*state
    };

    // Elements that only fill registries.
    match eid {
        EId::Font => {
            if let Some(font) = text::convert_font(node) {
                doc.fonts
                    .entry(font.family.clone())
                    .or_insert_with(|| Rc::new(font));
            }
            return;
        }
        EId::SolidColor => {
            let id = node.element_id();
            if !id.is_empty() {
                let color = paint_server::convert_solid_color(node);
                doc.paint_styles
                    .entry(id.to_string())
                    .or_insert(PaintStyle::Solid(color));
            }
            return;
        }
        EId::LinearGradient | EId::RadialGradient => {
            if !node.element_id().is_empty() {
                doc.gradient_defs
                    .push(paint_server::convert_gradient(node, &state));
            }
            return;
        }
        EId::FontFace | EId::Glyph | EId::MissingGlyph | EId::Stop | EId::Style => return,
        _ => {}
    }

    if eid.is_animation() {
        if let Some(anim) = animation::convert(eid, node) {
            let attrs = CommonAttrs {
                id: node.element_id().to_string(),
                display: true,
                ..CommonAttrs::default()
            };
            doc.append(parent_id, NodeKind::Animate(anim), attrs, StyleSlots::default());
        }
        return;
    }

    let kind = match convert_kind(eid, node, parent_id, &state, doc) {
        Some(kind) => kind,
        None => return,
    };

    let child_view_box = match &kind {
        NodeKind::Svg {
            view_box: Some(vb), ..
        }
        | NodeKind::Symbol {
            view_box: Some(vb), ..
        }
        | NodeKind::Marker {
            view_box: Some(vb), ..
        }
        | NodeKind::Pattern {
            view_box: Some(vb), ..
        } => *vb,
        NodeKind::Svg {
            width: Some(w),
            height: Some(h),
            ..
        } if node.parent_element().is_some() => {
            NonZeroRect::from_xywh(0.0, 0.0, *w, *h).unwrap_or(state.view_box)
        }
        _ => state.view_box,
    };

    let attrs = style::convert_common(node);
    let style = style::convert_style(node, &state);
    let id = doc.append(parent_id, kind, attrs, style);

    let element_id = node.element_id();
    if !element_id.is_empty() {
        doc.ids.entry(element_id.to_string()).or_insert(id);

        if eid == EId::Pattern {
            doc.paint_styles
                .entry(element_id.to_string())
                .or_insert(PaintStyle::Pattern(id));
        }
    }

    let child_state = State {
        view_box: child_view_box,
        ..state
    };
    convert_children(node, id, &child_state, doc);
}

fn convert_kind(
    eid: EId,
    node: SvgNode,
    parent_id: NodeId,
    state: &State,
    doc: &Document,
) -> Option<NodeKind> {
    let kind = match eid {
        EId::Svg => convert_svg(node, state),
        EId::G | EId::A => NodeKind::Group,
        EId::Defs => NodeKind::Defs,
        EId::Switch => NodeKind::Switch,
        EId::Symbol => NodeKind::Symbol {
            view_box: convert_view_box(node),
            aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
        },
        EId::Marker => convert_marker(node, state)?,
        EId::Pattern => paint_server::convert_pattern(node, state)?,
        EId::Mask => convert_mask(node, state)?,
        EId::Filter => filter::convert_filter(node, state)?,
        EId::FeMergeNode => filter::convert_merge_node(node),
        _ if eid.is_filter_primitive() => {
            let primitive_units = match doc.node(parent_id).kind() {
                NodeKind::Filter {
                    primitive_units, ..
                } => *primitive_units,
                _ => Units::UserSpaceOnUse,
            };
            filter::convert_primitive(eid, node, primitive_units, state)
        }
        EId::Rect => convert_rect_shape(node, state)?,
        EId::Circle => {
            let r = units::convert_attr_or(node, AId::R, Length::zero(), state);
            if !r.is_valid_length() {
                log::warn!("Circle '{}' has an invalid 'r' value. Skipped.", node.element_id());
                return None;
            }

            NodeKind::Circle {
                cx: units::convert_attr_or(node, AId::Cx, Length::zero(), state),
                cy: units::convert_attr_or(node, AId::Cy, Length::zero(), state),
                r,
            }
        }
        EId::Ellipse => {
            let (rx, ry) = resolve_rx_ry(node, state);
            if !rx.is_valid_length() || !ry.is_valid_length() {
                log::warn!("Ellipse '{}' has an invalid radius. Skipped.", node.element_id());
                return None;
            }

            NodeKind::Ellipse {
                cx: units::convert_attr_or(node, AId::Cx, Length::zero(), state),
                cy: units::convert_attr_or(node, AId::Cy, Length::zero(), state),
                rx,
                ry,
            }
        }
        EId::Line => NodeKind::Line {
            x1: units::convert_attr_or(node, AId::X1, Length::zero(), state),
            y1: units::convert_attr_or(node, AId::Y1, Length::zero(), state),
            x2: units::convert_attr_or(node, AId::X2, Length::zero(), state),
            y2: units::convert_attr_or(node, AId::Y2, Length::zero(), state),
        },
        EId::Path => NodeKind::Path(
            node.attribute::<&str>(AId::D)
                .and_then(crate::path::parse_path)
                .map(Rc::new),
        ),
        EId::Polygon => NodeKind::Polygon(Rc::new(convert_points(node, "Polygon")?)),
        EId::Polyline => NodeKind::Polyline(Rc::new(convert_points(node, "Polyline")?)),
        EId::Image => image::convert(node, state)?,
        EId::Use => convert_use(node, state)?,
        EId::Text => text::convert_text(node, state),
        EId::TextArea => text::convert_text_area(node, state),
        EId::Tspan => text::convert_tspan(node, state),
        EId::TBreak => NodeKind::TBreak,
        _ => return None,
    };

    Some(kind)
}

trait IsValidLength {
    fn is_valid_length(&self) -> bool;
}

impl IsValidLength for f32 {
    #[inline]
    fn is_valid_length(&self) -> bool {
        *self > 0.0 && self.is_finite()
    }
}

fn convert_svg(node: SvgNode, state: &State) -> NodeKind {
    let size = |aid: AId| -> Option<f32> {
        match node.attribute::<&str>(aid) {
            Some("auto") => None,
            // A nested `svg` is `100%` by default.
            None => Some(units::convert_user_length(
                Length::new(100.0, Unit::Percent),
                aid,
                state,
            )),
            Some(_) => units::convert_attr(node, aid, state),
        }
    };

    NodeKind::Svg {
        x: units::convert_attr_or(node, AId::X, Length::zero(), state),
        y: units::convert_attr_or(node, AId::Y, Length::zero(), state),
        width: size(AId::Width).filter(|n| n.is_valid_length()),
        height: size(AId::Height).filter(|n| n.is_valid_length()),
        view_box: convert_view_box(node),
        aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
    }
}

fn convert_rect_shape(node: SvgNode, state: &State) -> Option<NodeKind> {
    let width = units::convert_attr_or(node, AId::Width, Length::zero(), state);
    let height = units::convert_attr_or(node, AId::Height, Length::zero(), state);
    if !width.is_valid_length() || !height.is_valid_length() {
        log::warn!("Rect '{}' has an invalid size. Skipped.", node.element_id());
        return None;
    }

    let (rx, ry) = resolve_rx_ry(node, state);

    Some(NodeKind::Rect {
        x: units::convert_attr_or(node, AId::X, Length::zero(), state),
        y: units::convert_attr_or(node, AId::Y, Length::zero(), state),
        width,
        height,
        // Clamp rx/ry to the half of the width/height.
        rx: rx.min(width / 2.0),
        ry: ry.min(height / 2.0),
    })
}

/// Resolves `rx` and `ry`.
///
/// A missing or negative radius takes the value of the other one.
fn resolve_rx_ry(node: SvgNode, state: &State) -> (f32, f32) {
    let mut rx_opt = node.attribute::<Length>(AId::Rx);
    let mut ry_opt = node.attribute::<Length>(AId::Ry);

    // Remove negative values first.
    if let Some(v) = rx_opt {
        if v.number.is_sign_negative() {
            rx_opt = None;
        }
    }
    if let Some(v) = ry_opt {
        if v.number.is_sign_negative() {
            ry_opt = None;
        }
    }

    match (rx_opt, ry_opt) {
        (None, None) => (0.0, 0.0),
        (Some(rx), None) => {
            let rx = units::convert_user_length(rx, AId::Rx, state);
            (rx, rx)
        }
        (None, Some(ry)) => {
            let ry = units::convert_user_length(ry, AId::Ry, state);
            (ry, ry)
        }
        (Some(rx), Some(ry)) => (
            units::convert_user_length(rx, AId::Rx, state),
            units::convert_user_length(ry, AId::Ry, state),
        ),
    }
}

/// Parses `points`. An odd trailing coordinate is ignored.
fn convert_points(node: SvgNode, name: &str) -> Option<Vec<(f32, f32)>> {
    let text = match node.attribute::<&str>(AId::Points) {
        Some(text) => text,
        None => {
            log::warn!("{} '{}' has no 'points'. Skipped.", name, node.element_id());
            return None;
        }
    };

    let mut numbers = Vec::new();
    for n in vgtypes::NumberListParser::from(text) {
        match n {
            Ok(n) => numbers.push(n as f32),
            Err(_) => break,
        }
    }

    let points: Vec<(f32, f32)> = numbers.chunks_exact(2).map(|p| (p[0], p[1])).collect();

    // `polyline` and `polygon` elements must contain at least 2 points.
    if points.len() < 2 {
        log::warn!("{} '{}' has less than 2 points. Skipped.", name, node.element_id());
        return None;
    }

    Some(points)
}

fn convert_marker(node: SvgNode, state: &State) -> Option<NodeKind> {
    let width = units::convert_attr_or(node, AId::MarkerWidth, Length::new_number(3.0), state);
    let height = units::convert_attr_or(node, AId::MarkerHeight, Length::new_number(3.0), state);
    if !width.is_valid_length() || !height.is_valid_length() {
        log::warn!("Marker '{}' has an invalid size. Skipped.", node.element_id());
        return None;
    }

    let orientation = match node.attribute::<&str>(AId::Orient) {
        Some("auto") => MarkerOrientation::Auto,
        Some("auto-start-reverse") => MarkerOrientation::AutoStartReverse,
        Some(value) => {
            let value = value.trim();
            let value = value.strip_suffix("deg").unwrap_or(value);
            MarkerOrientation::Angle(vgtypes::scan_number(value).0 as f32)
        }
        None => MarkerOrientation::Angle(0.0),
    };

    Some(NodeKind::Marker {
        ref_x: units::convert_attr_or(node, AId::RefX, Length::zero(), state),
        ref_y: units::convert_attr_or(node, AId::RefY, Length::zero(), state),
        width,
        height,
        view_box: convert_view_box(node),
        aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
        orientation,
        stroke_width_units: node.attribute::<&str>(AId::MarkerUnits) != Some("userSpaceOnUse"),
    })
}

fn convert_mask(node: SvgNode, state: &State) -> Option<NodeKind> {
    let units = node
        .attribute(AId::MaskUnits)
        .unwrap_or(Units::ObjectBoundingBox);
    let content_units = node
        .attribute(AId::MaskContentUnits)
        .unwrap_or(Units::UserSpaceOnUse);

    let rect = convert_region(node, units, state)
        .log_none(|| log::warn!("Mask '{}' has an invalid size. Skipped.", node.element_id()))?;

    Some(NodeKind::Mask {
        rect,
        units,
        content_units,
    })
}

fn convert_use(node: SvgNode, state: &State) -> Option<NodeKind> {
    let href = node
        .attribute::<&str>(AId::Href)
        .and_then(|v| vgtypes::IRI::from_str(v).ok())
        .log_none(|| log::warn!("Use '{}' has an invalid link. Skipped.", node.element_id()))?;

    Some(NodeKind::Use {
        x: units::convert_attr_or(node, AId::X, Length::zero(), state),
        y: units::convert_attr_or(node, AId::Y, Length::zero(), state),
        width: units::convert_attr(node, AId::Width, state).filter(|n| n.is_valid_length()),
        height: units::convert_attr(node, AId::Height, state).filter(|n| n.is_valid_length()),
        href: href.0.to_string(),
        target: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(text: &str) -> Document {
        let mut source = crate::xml::RoxmlSource::parse(text).unwrap();
        let raw = super::super::builder::build(&mut source).unwrap();
        convert_doc(&raw, &Options::default()).unwrap()
    }

    fn kind_of<'a>(doc: &'a Document, id: &str) -> &'a NodeKind {
        doc.node(doc.element_by_id(id).unwrap()).kind()
    }

    macro_rules! test_size {
        ($name:ident, $text:expr, $width:expr, $height:expr, $explicit:expr) => {
            #[test]
            fn $name() {
                let doc = convert($text);
                assert_eq!(doc.size().width(), $width);
                assert_eq!(doc.size().height(), $height);
                assert_eq!(doc.explicit_view_box, $explicit);
            }
        };
    }

    #[rustfmt::skip] test_size!(size_explicit, "<svg width='20' height='30'/>", 20.0, 30.0, false);
    #[rustfmt::skip] test_size!(size_from_view_box, "<svg viewBox='0 0 40 50'/>", 40.0, 50.0, true);
    #[rustfmt::skip] test_size!(size_percent_of_view_box, "<svg width='50%' viewBox='0 0 40 50'/>", 20.0, 50.0, true);
    #[rustfmt::skip] test_size!(size_default, "<svg/>", 100.0, 100.0, false);
    #[rustfmt::skip] test_size!(size_invalid, "<svg width='0' height='10'/>", 100.0, 100.0, false);
    #[rustfmt::skip] test_size!(size_units, "<svg width='1in' height='2pt'/>", 90.0, 2.5, false);

    #[test]
    fn rect_radius() {
        let doc = convert(
            "<svg>\
                <rect id='r1' width='10' height='20' rx='8'/>\
                <rect id='r2' width='10' height='20' rx='-1' ry='2'/>\
             </svg>",
        );

        match kind_of(&doc, "r1") {
            NodeKind::Rect { rx, ry, .. } => assert_eq!((*rx, *ry), (5.0, 8.0)),
            _ => panic!("invalid kind"),
        }

        match kind_of(&doc, "r2") {
            NodeKind::Rect { rx, ry, .. } => assert_eq!((*rx, *ry), (2.0, 2.0)),
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn invalid_shapes_are_skipped() {
        let doc = convert(
            "<svg>\
                <rect id='r' width='0' height='10'/>\
                <circle id='c' r='-1'/>\
                <polyline id='p' points='10 20'/>\
                <ellipse id='e' rx='5'/>\
             </svg>",
        );

        assert!(!doc.element_exists("r"));
        assert!(!doc.element_exists("c"));
        assert!(!doc.element_exists("p"));
        assert!(doc.element_exists("e"));
    }

    #[test]
    fn points() {
        let doc = convert("<svg><polygon id='p' points='0,0 10,0 10,10 5'/></svg>");
        match kind_of(&doc, "p") {
            NodeKind::Polygon(points) => {
                assert_eq!(points.as_slice(), &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn first_id_wins() {
        let doc = convert("<svg><g id='a'/><rect id='a' width='1' height='1'/></svg>");
        assert!(matches!(kind_of(&doc, "a"), NodeKind::Group));
    }

    #[test]
    fn registries() {
        let doc = convert(
            "<svg>\
                <solidColor id='sc' solid-color='red'/>\
                <linearGradient id='lg'/>\
                <pattern id='pat' width='10' height='10'/>\
                <font><font-face font-family='MyFont'/></font>\
             </svg>",
        );

        assert!(matches!(doc.paint_style("sc"), Some(PaintStyle::Solid(_))));
        assert!(matches!(doc.paint_style("pat"), Some(PaintStyle::Pattern(_))));
        assert_eq!(doc.gradient_defs.len(), 1);
        assert!(doc.font("MyFont").is_some());
        assert!(!doc.element_exists("lg"));
    }

    #[test]
    fn percent_uses_nearest_view_box() {
        let doc = convert(
            "<svg viewBox='0 0 200 100'>\
                <rect id='r1' width='50%' height='50%'/>\
                <svg viewBox='0 0 10 10'><rect id='r2' width='50%' height='50%'/></svg>\
             </svg>",
        );

        match kind_of(&doc, "r1") {
            NodeKind::Rect { width, height, .. } => assert_eq!((*width, *height), (100.0, 50.0)),
            _ => panic!("invalid kind"),
        }

        match kind_of(&doc, "r2") {
            NodeKind::Rect { width, height, .. } => assert_eq!((*width, *height), (5.0, 5.0)),
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn em_units() {
        let doc = convert("<svg font-size='10'><g font-size='2em'><circle id='c' r='1em'/></g></svg>");
        match kind_of(&doc, "c") {
            NodeKind::Circle { r, .. } => assert_eq!(*r, 20.0),
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn marker() {
        let doc = convert(
            "<svg><marker id='m' orient='45deg' markerUnits='userSpaceOnUse'/></svg>",
        );
        match kind_of(&doc, "m") {
            NodeKind::Marker {
                width,
                orientation,
                stroke_width_units,
                ..
            } => {
                assert_eq!(*width, 3.0);
                assert_eq!(*orientation, MarkerOrientation::Angle(45.0));
                assert!(!stroke_width_units);
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn primitive_units_are_inherited() {
        let doc = convert(
            "<svg><filter primitiveUnits='objectBoundingBox'>\
                <feOffset id='o' x='0.5'/>\
             </filter></svg>",
        );
        match kind_of(&doc, "o") {
            NodeKind::FilterPrimitive { subregion, .. } => {
                assert_eq!(subregion.x, Some(crate::tree::Coord::Relative(0.5)));
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn text_runs_and_animations() {
        let doc = convert(
            "<svg><text id='t'>Hello<tspan>world</tspan></text>\
             <rect id='r' width='1' height='1'><set attributeName='fill' to='red'/></rect></svg>",
        );

        let text = doc.element_by_id("t").unwrap();
        let children = doc.node(text).children();
        assert_eq!(children.len(), 2);
        assert!(matches!(doc.node(children[0]).kind(), NodeKind::TextRun(s) if s == "Hello"));

        let rect = doc.element_by_id("r").unwrap();
        let children = doc.node(rect).children();
        assert_eq!(children.len(), 1);
        assert!(matches!(doc.node(children[0]).kind(), NodeKind::Animate(_)));
    }
}
