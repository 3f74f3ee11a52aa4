// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use vgtypes::{Length, LengthUnit as Unit};

use super::convert::{self, State};
use super::node::SvgNode;
use super::{units, AId, EId, OptionLog};
use crate::tree::{
    Color, ColorMatrixKind, CompositeOperator, Coord, Input, NodeKind, PrimitiveKind, Subregion,
    Units,
};

pub(crate) fn convert_filter(node: SvgNode, state: &State) -> Option<NodeKind> {
    let units = node
        .attribute(AId::FilterUnits)
        .unwrap_or(Units::ObjectBoundingBox);
    let primitive_units = node
        .attribute(AId::PrimitiveUnits)
        .unwrap_or(Units::UserSpaceOnUse);

    let rect = convert::convert_region(node, units, state)
        .log_none(|| log::warn!("Filter '{}' has an invalid region. Skipped.", node.element_id()))?;

    Some(NodeKind::Filter {
        rect,
        units,
        primitive_units,
        supported: true,
    })
}

/// Converts a filter primitive.
///
/// `primitive_units` come from the parent `filter` element.
pub(crate) fn convert_primitive(
    eid: EId,
    fe: SvgNode,
    primitive_units: Units,
    state: &State,
) -> NodeKind {
    let kind = match eid {
        EId::FeFlood => convert_flood(fe),
        EId::FeOffset => PrimitiveKind::Offset {
            dx: fe.attribute(AId::Dx).unwrap_or(0.0),
            dy: fe.attribute(AId::Dy).unwrap_or(0.0),
        },
        EId::FeColorMatrix => {
            PrimitiveKind::ColorMatrix(convert_color_matrix_kind(fe).unwrap_or_default())
        }
        EId::FeGaussianBlur => convert_blur(fe),
        EId::FeComposite => PrimitiveKind::Composite(convert_composite_operator(fe)),
        EId::FeMerge => PrimitiveKind::Merge,
        _ => PrimitiveKind::Unsupported,
    };

    NodeKind::FilterPrimitive {
        subregion: convert_subregion(fe, primitive_units, state),
        input: resolve_input(fe, AId::In),
        input2: resolve_input(fe, AId::In2),
        result: fe.attribute::<&str>(AId::Result).unwrap_or("").to_string(),
        kind,
    }
}

pub(crate) fn convert_merge_node(node: SvgNode) -> NodeKind {
    NodeKind::MergeNode {
        input: resolve_input(node, AId::In),
    }
}

/// An edge is relative for `objectBoundingBox` primitive units and for percentages.
fn convert_subregion(fe: SvgNode, primitive_units: Units, state: &State) -> Subregion {
    let conv = |aid: AId| -> Option<Coord> {
        let length = fe.attribute::<Length>(aid)?;
        if primitive_units == Units::ObjectBoundingBox || length.unit == Unit::Percent {
            let n = units::convert_length(length, aid, Units::ObjectBoundingBox, state);
            Some(Coord::Relative(n))
        } else {
            Some(Coord::Absolute(units::convert_user_length(length, aid, state)))
        }
    };

    Subregion {
        x: conv(AId::X),
        y: conv(AId::Y),
        width: conv(AId::Width),
        height: conv(AId::Height),
    }
}

/// An absent input refers to the previous result.
fn resolve_input(node: SvgNode, aid: AId) -> Input {
    match node.attribute::<&str>(aid).map(str::trim) {
        Some("SourceGraphic") => Input::SourceGraphic,
        Some("SourceAlpha") => Input::SourceAlpha,
        Some(name) => Input::Reference(name.to_string()),
        None => Input::Reference(String::new()),
    }
}

fn convert_flood(fe: SvgNode) -> PrimitiveKind {
    let color = fe.attribute::<Color>(AId::FloodColor).unwrap_or_else(Color::black);
    let opacity = fe
        .attribute::<f32>(AId::FloodOpacity)
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(1.0);

    PrimitiveKind::Flood {
        color: Color::new_rgb(color.red, color.green, color.blue),
        opacity: opacity * (color.alpha as f32 / 255.0),
    }
}

fn convert_color_matrix_kind(fe: SvgNode) -> Option<ColorMatrixKind> {
    match fe.attribute(AId::Type) {
        Some("saturate") => {
            let n = values(fe).and_then(|list| list.first().copied()).unwrap_or(1.0);
            Some(ColorMatrixKind::Saturate(n.clamp(0.0, 1.0) as f64))
        }
        Some("hueRotate") => {
            let n = values(fe).and_then(|list| list.first().copied()).unwrap_or(0.0);
            Some(ColorMatrixKind::HueRotate(n as f64))
        }
        Some("luminanceToAlpha") => Some(ColorMatrixKind::LuminanceToAlpha),
        _ => {
            // Fallback to `matrix`.
            let list = values(fe)?;
            if list.len() != 20 {
                return None;
            }

            let mut matrix = [0.0; 20];
            for (m, n) in matrix.iter_mut().zip(list) {
                *m = n as f64;
            }

            Some(ColorMatrixKind::Matrix(matrix))
        }
    }
}

fn values(fe: SvgNode) -> Option<Vec<f32>> {
    fe.attribute::<Vec<f32>>(AId::Values)
}

fn convert_blur(fe: SvgNode) -> PrimitiveKind {
    let text = fe.attribute(AId::StdDeviation).unwrap_or("0 0");
    let mut parser = vgtypes::NumberListParser::from(text);

    let n1 = parser.next().and_then(|n| n.ok());
    let n2 = parser.next().and_then(|n| n.ok());
    // `stdDeviation` must have no more than two values.
    // Otherwise we should fallback to `0 0`.
    let n3 = parser.next().and_then(|n| n.ok());

    let (std_dev_x, std_dev_y) = match (n1, n2, n3) {
        (Some(n1), Some(n2), None) => (n1, n2),
        (Some(n1), None, None) => (n1, n1),
        _ => (0.0, 0.0),
    };

    let positive = |n: f64| if n.is_sign_negative() { 0.0 } else { n as f32 };

    PrimitiveKind::GaussianBlur {
        std_dev_x: positive(std_dev_x),
        std_dev_y: positive(std_dev_y),
    }
}

fn convert_composite_operator(fe: SvgNode) -> CompositeOperator {
    match fe.attribute(AId::Operator).unwrap_or("over") {
        "in" => CompositeOperator::In,
        "out" => CompositeOperator::Out,
        "atop" => CompositeOperator::Atop,
        "xor" => CompositeOperator::Xor,
        "lighter" => CompositeOperator::Lighter,
        "arithmetic" => CompositeOperator::Arithmetic {
            k1: fe.attribute(AId::K1).unwrap_or(0.0),
            k2: fe.attribute(AId::K2).unwrap_or(0.0),
            k3: fe.attribute(AId::K3).unwrap_or(0.0),
            k4: fe.attribute(AId::K4).unwrap_or(0.0),
        },
        _ => CompositeOperator::Over,
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

    fn primitive(text: &str, primitive_units: Units) -> NodeKind {
        let doc = parse(text);
        let opt = Options::default();
        let state = State {
            opt: &opt,
            view_box: tiny_skia::NonZeroRect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap(),
            font_size: 12.0,
        };
        let node = SvgNode::new(&doc, 2);
        convert_primitive(node.tag_name().unwrap(), node, primitive_units, &state)
    }

    #[test]
    fn blur() {
        let kind = primitive(
            "<svg><filter><feGaussianBlur stdDeviation='2 -1' result='b'/></filter></svg>",
            Units::UserSpaceOnUse,
        );
        match kind {
            NodeKind::FilterPrimitive { kind, result, input, .. } => {
                assert_eq!(kind, PrimitiveKind::GaussianBlur { std_dev_x: 2.0, std_dev_y: 0.0 });
                assert_eq!(result, "b");
                assert_eq!(input, Input::Reference(String::new()));
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn malformed_matrix_is_identity() {
        let kind = primitive(
            "<svg><filter><feColorMatrix values='1 2 3' in='SourceAlpha'/></filter></svg>",
            Units::UserSpaceOnUse,
        );
        match kind {
            NodeKind::FilterPrimitive { kind, input, .. } => {
                assert_eq!(kind, PrimitiveKind::ColorMatrix(ColorMatrixKind::default()));
                assert_eq!(input, Input::SourceAlpha);
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn subregion() {
        let kind = primitive(
            "<svg><filter><feFlood x='10' y='50%' width='0.5'/></filter></svg>",
            Units::UserSpaceOnUse,
        );
        match kind {
            NodeKind::FilterPrimitive { subregion, .. } => {
                assert_eq!(subregion.x, Some(Coord::Absolute(10.0)));
                assert_eq!(subregion.y, Some(Coord::Relative(0.5)));
                assert_eq!(subregion.width, Some(Coord::Absolute(0.5)));
                assert_eq!(subregion.height, None);
            }
            _ => panic!("invalid kind"),
        }

        let kind = primitive(
            "<svg><filter><feFlood x='0.25'/></filter></svg>",
            Units::ObjectBoundingBox,
        );
        match kind {
            NodeKind::FilterPrimitive { subregion, .. } => {
                assert_eq!(subregion.x, Some(Coord::Relative(0.25)));
            }
            _ => panic!("invalid kind"),
        }
    }

    #[test]
    fn arithmetic() {
        let kind = primitive(
            "<svg><filter><feComposite operator='arithmetic' k2='0.5' k3='0.5'/></filter></svg>",
            Units::UserSpaceOnUse,
        );
        match kind {
            NodeKind::FilterPrimitive { kind, .. } => {
                assert_eq!(
                    kind,
                    PrimitiveKind::Composite(CompositeOperator::Arithmetic {
                        k1: 0.0,
                        k2: 0.5,
                        k3: 0.5,
                        k4: 0.0
                    })
                );
            }
            _ => panic!("invalid kind"),
        }
    }
}
