// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use super::convert::State;
use super::node::{FromValue, SvgNode};
use super::{units, AId};
use crate::tree::{
    CommonAttrs, CompositeMode, FillRule, FillSlot, FontSlot, FontStyle, FontWeight,
    ImageRendering, LineCap, LineJoin, Paint, ShapeRendering, StrokeSlot, StyleSlots, TextAnchor,
};

impl FromValue<'_> for LineCap {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

impl FromValue<'_> for LineJoin {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "miter" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

impl FromValue<'_> for FillRule {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "nonzero" => Some(FillRule::NonZero),
            "evenodd" => Some(FillRule::EvenOdd),
            _ => None,
        }
    }
}

impl FromValue<'_> for TextAnchor {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "start" => Some(TextAnchor::Start),
            "middle" => Some(TextAnchor::Middle),
            "end" => Some(TextAnchor::End),
            _ => None,
        }
    }
}

impl FromValue<'_> for FontStyle {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }
}

impl FromValue<'_> for FontWeight {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "normal" => Some(FontWeight::Absolute(400)),
            "bold" => Some(FontWeight::Absolute(700)),
            "bolder" => Some(FontWeight::Bolder),
            "lighter" => Some(FontWeight::Lighter),
            _ => match value.parse::<u16>() {
                Ok(n) if (1..=1000).contains(&n) => Some(FontWeight::Absolute(n)),
                _ => None,
            },
        }
    }
}

impl FromValue<'_> for ImageRendering {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "auto" | "optimizeQuality" => Some(ImageRendering::OptimizeQuality),
            "optimizeSpeed" | "pixelated" | "crisp-edges" => Some(ImageRendering::OptimizeSpeed),
            _ => None,
        }
    }
}

impl FromValue<'_> for ShapeRendering {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "optimizeSpeed" => Some(ShapeRendering::OptimizeSpeed),
            "crispEdges" => Some(ShapeRendering::CrispEdges),
            "auto" | "geometricPrecision" => Some(ShapeRendering::GeometricPrecision),
            _ => None,
        }
    }
}

impl FromValue<'_> for CompositeMode {
    fn parse(aid: AId, value: &str) -> Option<Self> {
        if aid == AId::CompOp {
            let mode = match value {
                "clear" => CompositeMode::Clear,
                "src" => CompositeMode::Source,
                "dst" => CompositeMode::Destination,
                "src-over" => CompositeMode::SourceOver,
                "dst-over" => CompositeMode::DestinationOver,
                "src-in" => CompositeMode::SourceIn,
                "dst-in" => CompositeMode::DestinationIn,
                "src-out" => CompositeMode::SourceOut,
                "dst-out" => CompositeMode::DestinationOut,
                "src-atop" => CompositeMode::SourceAtop,
                "dst-atop" => CompositeMode::DestinationAtop,
                "xor" => CompositeMode::Xor,
                "plus" => CompositeMode::Plus,
                _ => return parse_blend_mode(value),
            };

            return Some(mode);
        }

        match value {
            "normal" => Some(CompositeMode::SourceOver),
            _ => parse_blend_mode(value),
        }
    }
}

fn parse_blend_mode(value: &str) -> Option<CompositeMode> {
    let mode = match value {
        "multiply" => CompositeMode::Multiply,
        "screen" => CompositeMode::Screen,
        "overlay" => CompositeMode::Overlay,
        "darken" => CompositeMode::Darken,
        "lighten" => CompositeMode::Lighten,
        "color-dodge" => CompositeMode::ColorDodge,
        "color-burn" => CompositeMode::ColorBurn,
        "hard-light" => CompositeMode::HardLight,
        "soft-light" => CompositeMode::SoftLight,
        "difference" => CompositeMode::Difference,
        "exclusion" => CompositeMode::Exclusion,
        "hue" => CompositeMode::Hue,
        "saturation" => CompositeMode::Saturation,
        "color" => CompositeMode::Color,
        "luminosity" => CompositeMode::Luminosity,
        _ => return None,
    };

    Some(mode)
}

/// An opacity is clamped to the `0..=1` range.
fn convert_opacity(node: SvgNode, aid: AId) -> Option<f32> {
    node.attribute::<f32>(aid).map(|n| n.clamp(0.0, 1.0))
}

pub(crate) fn convert_common(node: SvgNode) -> CommonAttrs {
    let id = node.element_id().to_string();
    let classes = node
        .attribute::<&str>(AId::Class)
        .map(|v| v.split_whitespace().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let visibility = match node.attribute::<&str>(AId::Visibility) {
        Some("visible") => Some(true),
        Some("hidden") | Some("collapse") => Some(false),
        Some(value) => {
            log::warn!("Failed to parse {} value: '{}'.", AId::Visibility, value);
            None
        }
        None => None,
    };

    let clip = match node.attribute::<&str>(AId::Overflow) {
        Some("visible") | Some("auto") => Some(false),
        Some("hidden") | Some("scroll") => Some(true),
        Some(value) => {
            log::warn!("Failed to parse {} value: '{}'.", AId::Overflow, value);
            None
        }
        None => None,
    };

    CommonAttrs {
        id,
        classes,
        visibility,
        display: node.attribute::<&str>(AId::Display) != Some("none"),
        required_features: convert_string_list(node, AId::RequiredFeatures, ' '),
        required_extensions: convert_string_list(node, AId::RequiredExtensions, ' '),
        system_language: convert_string_list(node, AId::SystemLanguage, ','),
        required_formats: convert_string_list(node, AId::RequiredFormats, ' '),
        required_fonts: convert_string_list(node, AId::RequiredFonts, ','),
        mask: convert_link(node, AId::Mask),
        filter: convert_link(node, AId::Filter),
        marker_start: convert_link(node, AId::MarkerStart),
        marker_mid: convert_link(node, AId::MarkerMid),
        marker_end: convert_link(node, AId::MarkerEnd),
        clip,
    }
}

/// A present, but empty list is kept, since it must fail conditional processing.
fn convert_string_list(node: SvgNode, aid: AId, separator: char) -> Option<Vec<String>> {
    let value = node.attribute::<&str>(aid)?;
    let list = if separator == ' ' {
        value.split_whitespace().map(|s| s.to_string()).collect()
    } else {
        value
            .split(separator)
            .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"'))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    };

    Some(list)
}

fn convert_link(node: SvgNode, aid: AId) -> Option<String> {
    let value = node.attribute::<&str>(aid)?;
    if value == "none" {
        return None;
    }

    match vgtypes::FuncIRI::from_str(value) {
        Ok(link) => Some(link.0.to_string()),
        Err(_) => {
            log::warn!("Failed to parse {} value: '{}'.", aid, value);
            None
        }
    }
}

pub(crate) fn convert_style(node: SvgNode, state: &State) -> StyleSlots {
    StyleSlots {
        fill: FillSlot {
            paint: convert_paint(node, AId::Fill),
            opacity: convert_opacity(node, AId::FillOpacity),
            rule: node.attribute(AId::FillRule),
        },
        stroke: convert_stroke(node, state),
        font: convert_font(node, state),
        transform: node.attribute(AId::Transform),
        opacity: convert_opacity(node, AId::Opacity),
        composite: node
            .attribute(AId::CompOp)
            .or_else(|| node.attribute(AId::MixBlendMode)),
        image_rendering: node.attribute(AId::ImageRendering),
        shape_rendering: node.attribute(AId::ShapeRendering),
        color: node.attribute(AId::Color),
    }
}

/// Parses a `fill` or `stroke` value.
///
/// A malformed value is treated as `inherit`.
pub(crate) fn convert_paint(node: SvgNode, aid: AId) -> Option<Paint> {
    let paint = node.attribute::<vgtypes::Paint>(aid)?;
    match paint {
        vgtypes::Paint::None => Some(Paint::None),
        vgtypes::Paint::Inherit => None,
        vgtypes::Paint::CurrentColor => Some(Paint::CurrentColor),
        vgtypes::Paint::Color(color) => Some(Paint::Color(color)),
        vgtypes::Paint::FuncIRI(id, fallback) => Some(Paint::Server {
            id: id.to_string(),
            fallback,
        }),
    }
}

fn convert_stroke(node: SvgNode, state: &State) -> StrokeSlot {
    let width = units::convert_attr(node, AId::StrokeWidth, state).and_then(|w| {
        if w.is_finite() && w >= 0.0 {
            Some(w)
        } else {
            log::warn!("Negative 'stroke-width' is not allowed. Ignored.");
            None
        }
    });

    // Must be bigger than 1.
    let miter_limit = node
        .attribute::<f32>(AId::StrokeMiterlimit)
        .map(|n| if n < 1.0 { 1.0 } else { n });

    let cosmetic = match node.attribute::<&str>(AId::VectorEffect) {
        Some("non-scaling-stroke") => Some(true),
        Some(_) => Some(false),
        None => None,
    };

    StrokeSlot {
        paint: convert_paint(node, AId::Stroke),
        width,
        opacity: convert_opacity(node, AId::StrokeOpacity),
        cap: node.attribute(AId::StrokeLinecap),
        join: node.attribute(AId::StrokeLinejoin),
        miter_limit,
        dasharray: convert_dasharray(node, state).map(Rc::new),
        dashoffset: units::convert_attr(node, AId::StrokeDashoffset, state),
        cosmetic,
    }
}

/// Parses `stroke-dasharray`.
///
/// `none`, negative values and an all-zero list disable dashing.
/// An odd list is repeated twice.
fn convert_dasharray(node: SvgNode, state: &State) -> Option<Vec<f32>> {
    if node.attribute::<&str>(AId::StrokeDasharray)? == "none" {
        return Some(Vec::new());
    }

    let mut list = units::convert_list(node, AId::StrokeDasharray, state)?;

    if list.iter().any(|n| n.is_sign_negative() || !n.is_finite()) {
        return Some(Vec::new());
    }

    if list.iter().all(|n| *n == 0.0) {
        return Some(Vec::new());
    }

    if list.len() % 2 != 0 {
        let mut tmp = list.clone();
        list.append(&mut tmp);
    }

    Some(list)
}

fn convert_font(node: SvgNode, state: &State) -> FontSlot {
    let families = node.attribute::<&str>(AId::FontFamily).map(|value| {
        let list: Vec<String> = value
            .split(',')
            .map(|s| s.trim().trim_matches(|c| c == '\'' || c == '"').trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        Rc::new(list)
    });

    FontSlot {
        families,
        size: units::resolve_font_size(node, state),
        style: node.attribute(AId::FontStyle),
        weight: node.attribute(AId::FontWeight),
        anchor: node.attribute(AId::TextAnchor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RawDocument;
    use crate::Options;

    fn parse(text: &str) -> RawDocument {
        let mut source = crate::xml::RoxmlSource::parse(text).unwrap();
        super::super::builder::build(&mut source).unwrap()
    }

    fn state(opt: &Options) -> State {
        State {
            opt,
            view_box: tiny_skia::NonZeroRect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap(),
            font_size: 12.0,
        }
    }

    #[test]
    fn paints() {
        let doc = parse(
            "<svg><rect fill='url(#g) red' stroke='currentColor'/><rect fill='qwe' stroke='none'/></svg>",
        );
        let opt = Options::default();

        let style = convert_style(SvgNode::new(&doc, 1), &state(&opt));
        assert!(matches!(
            style.fill.paint,
            Some(Paint::Server { ref id, fallback: Some(vgtypes::PaintFallback::Color(_)) }) if id == "g"
        ));
        assert!(matches!(style.stroke.paint, Some(Paint::CurrentColor)));

        let style = convert_style(SvgNode::new(&doc, 2), &state(&opt));
        assert!(style.fill.paint.is_none());
        assert!(matches!(style.stroke.paint, Some(Paint::None)));
    }

    #[test]
    fn dasharray() {
        let doc = parse(
            "<svg>\
                <path stroke-dasharray='5'/>\
                <path stroke-dasharray='0 0'/>\
                <path stroke-dasharray='1 -2'/>\
                <path stroke-dasharray='none'/>\
            </svg>",
        );
        let opt = Options::default();
        let dash = |id| convert_dasharray(SvgNode::new(&doc, id), &state(&opt)).unwrap();

        assert_eq!(dash(1), vec![5.0, 5.0]);
        assert!(dash(2).is_empty());
        assert!(dash(3).is_empty());
        assert!(dash(4).is_empty());
    }

    #[test]
    fn opacity_is_clamped() {
        let doc = parse("<svg opacity='2' fill-opacity='-1'/>");
        let opt = Options::default();
        let style = convert_style(SvgNode::new(&doc, 0), &state(&opt));
        assert_eq!(style.opacity, Some(1.0));
        assert_eq!(style.fill.opacity, Some(0.0));
    }

    #[test]
    fn common() {
        let doc = parse(
            "<svg><g id='a' class='x y' visibility='hidden' display='none' \
                     systemLanguage='en-US, fr' requiredFeatures='' mask='url(#m)' overflow='hidden'/></svg>",
        );
        let attrs = convert_common(SvgNode::new(&doc, 1));

        assert_eq!(attrs.id, "a");
        assert_eq!(attrs.classes, vec!["x", "y"]);
        assert_eq!(attrs.visibility, Some(false));
        assert!(!attrs.display);
        assert_eq!(attrs.system_language, Some(vec!["en-US".to_string(), "fr".to_string()]));
        assert_eq!(attrs.required_features, Some(Vec::new()));
        assert_eq!(attrs.mask.as_deref(), Some("m"));
        assert_eq!(attrs.clip, Some(true));
    }

    #[test]
    fn composite_mode() {
        assert_eq!(CompositeMode::parse(AId::CompOp, "dst-in"), Some(CompositeMode::DestinationIn));
        assert_eq!(CompositeMode::parse(AId::CompOp, "multiply"), Some(CompositeMode::Multiply));
        assert_eq!(CompositeMode::parse(AId::MixBlendMode, "normal"), Some(CompositeMode::SourceOver));
        assert_eq!(CompositeMode::parse(AId::MixBlendMode, "src"), None);
    }
}
