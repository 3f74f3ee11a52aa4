// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use vgtypes::{Length, LengthUnit as Unit};

use super::convert::{self, State};
use super::node::{FromValue, SvgNode};
use super::{units, AId, EId, OptionLog};
use crate::tree::{
    Color, Gradient, GradientDef, GradientKind, NodeKind, SpreadMethod, Stop, Units,
};

impl FromValue<'_> for SpreadMethod {
    fn parse(_: AId, value: &str) -> Option<Self> {
        match value {
            "pad" => Some(SpreadMethod::Pad),
            "reflect" => Some(SpreadMethod::Reflect),
            "repeat" => Some(SpreadMethod::Repeat),
            _ => None,
        }
    }
}

/// Collects a gradient definition.
///
/// Attributes are resolved later, after `href` chains are followed.
pub(crate) fn convert_gradient(node: SvgNode, state: &State) -> GradientDef {
    let href = node
        .attribute::<&str>(AId::Href)
        .and_then(|v| vgtypes::IRI::from_str(v).ok())
        .map(|v| v.0.to_string());

    GradientDef {
        id: node.element_id().to_string(),
        linear: node.tag_name() == Some(EId::LinearGradient),
        x1: node.attribute(AId::X1),
        y1: node.attribute(AId::Y1),
        x2: node.attribute(AId::X2),
        y2: node.attribute(AId::Y2),
        cx: node.attribute(AId::Cx),
        cy: node.attribute(AId::Cy),
        r: node.attribute(AId::R),
        fx: node.attribute(AId::Fx),
        fy: node.attribute(AId::Fy),
        units: node.attribute(AId::GradientUnits),
        transform: node.attribute(AId::GradientTransform),
        spread: node.attribute(AId::SpreadMethod),
        stops: convert_stops(node),
        href,
        view_box: state.view_box,
        font_size: state.font_size,
    }
}

/// Converts a gradient definition, with inherited attributes already copied,
/// into a final gradient.
pub(crate) fn finish_gradient(def: &GradientDef, opt: &crate::Options) -> Gradient {
    let state = State {
        opt,
        view_box: def.view_box,
        font_size: def.font_size,
    };

    let units = def.units.unwrap_or(Units::ObjectBoundingBox);
    let conv = |length: Option<Length>, aid: AId, def: Length| {
        units::convert_length(length.unwrap_or(def), aid, units, &state)
    };

    let kind = if def.linear {
        GradientKind::Linear {
            x1: conv(def.x1, AId::X1, Length::zero()),
            y1: conv(def.y1, AId::Y1, Length::zero()),
            x2: conv(def.x2, AId::X2, Length::new(100.0, Unit::Percent)),
            y2: conv(def.y2, AId::Y2, Length::zero()),
        }
    } else {
        let half = Length::new(50.0, Unit::Percent);
        let cx = conv(def.cx, AId::Cx, half);
        let cy = conv(def.cy, AId::Cy, half);
        GradientKind::Radial {
            cx,
            cy,
            r: conv(def.r, AId::R, half),
            // The focal point defaults to the center.
            fx: def.fx.map_or(cx, |v| conv(Some(v), AId::Fx, half)),
            fy: def.fy.map_or(cy, |v| conv(Some(v), AId::Fy, half)),
        }
    };

    Gradient {
        id: def.id.clone(),
        kind,
        units,
        transform: def.transform.unwrap_or_default(),
        spread: def.spread.unwrap_or_default(),
        stops: def.stops.clone(),
    }
}

fn convert_stops(grad: SvgNode) -> Vec<Stop> {
    let mut stops = Vec::new();
    for (eid, stop) in grad.element_children() {
        if eid != EId::Stop {
            continue;
        }

        // `number` can be either a number or a percentage.
        let offset = stop.attribute::<Length>(AId::Offset).unwrap_or(Length::zero());
        let offset = match offset.unit {
            Unit::None => offset.number as f32,
            Unit::Percent => offset.number as f32 / 100.0,
            _ => {
                log::warn!("Invalid stop offset: {:?}.", offset);
                0.0
            }
        };

        let color = match stop.attribute::<&str>(AId::StopColor) {
            Some("currentColor") => stop
                .attribute::<Color>(AId::Color)
                .or_else(|| grad.attribute(AId::Color))
                .unwrap_or_else(Color::black),
            Some(_) => stop.attribute(AId::StopColor).unwrap_or_else(Color::black),
            None => Color::black(),
        };

        let opacity = stop
            .attribute::<f32>(AId::StopOpacity)
            .map(|n| n.clamp(0.0, 1.0))
            .unwrap_or(1.0);

        push_stop(
            &mut stops,
            Stop {
                offset,
                color: Color::new_rgb(color.red, color.green, color.blue),
                opacity: opacity * (color.alpha as f32 / 255.0),
            },
        );
    }

    stops
}

/// Appends a stop, keeping offsets clamped and strictly increasing.
pub(crate) fn push_stop(stops: &mut Vec<Stop>, mut stop: Stop) {
    stop.offset = stop.offset.clamp(0.0, 1.0);
    if let Some(prev) = stops.last() {
        if stop.offset <= prev.offset && prev.offset < 1.0 {
            stop.offset = (prev.offset + 1e-7).min(1.0);
        } else if stop.offset < prev.offset {
            stop.offset = prev.offset;
        }
    }

    stops.push(stop);
}

/// Returns a `solidColor` value with `solid-opacity` stored in the alpha channel.
pub(crate) fn convert_solid_color(node: SvgNode) -> Color {
    let color = node.attribute::<Color>(AId::SolidColor).unwrap_or_else(Color::black);
    let opacity = node
        .attribute::<f32>(AId::SolidOpacity)
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(1.0);

    let alpha = (color.alpha as f32 * opacity).round() as u8;
    Color::new_rgba(color.red, color.green, color.blue, alpha)
}

pub(crate) fn convert_pattern(node: SvgNode, state: &State) -> Option<NodeKind> {
    let units = node
        .attribute(AId::PatternUnits)
        .unwrap_or(Units::ObjectBoundingBox);
    let content_units = node
        .attribute(AId::PatternContentUnits)
        .unwrap_or(Units::UserSpaceOnUse);

    let rect = convert::convert_rect(node, units, state)
        .log_none(|| log::warn!("Pattern '{}' has an invalid size. Skipped.", node.element_id()))?;

    Some(NodeKind::Pattern {
        rect,
        units,
        content_units,
        transform: node.attribute(AId::PatternTransform).unwrap_or_default(),
        view_box: convert::convert_view_box(node),
        aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
    })
}
