// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use vgtypes::{Length, LengthUnit as Unit};

use super::convert::State;
use super::node::SvgNode;
use super::AId;
use crate::tree::Units;

/// The viewport dimension a percentage of an attribute refers to.
enum Axis {
    Horizontal,
    Vertical,
    Diagonal,
}

fn percent_axis(aid: AId) -> Axis {
    match aid {
        AId::Cx | AId::Dx | AId::Fx | AId::MarkerWidth | AId::RefX | AId::Rx | AId::Width
        | AId::X | AId::X1 | AId::X2 => Axis::Horizontal,
        AId::Cy | AId::Dy | AId::Fy | AId::MarkerHeight | AId::RefY | AId::Ry | AId::Height
        | AId::Y | AId::Y1 | AId::Y2 => Axis::Vertical,
        _ => Axis::Diagonal,
    }
}

/// Scales a number by a unit that doesn't depend on the viewport.
///
/// Returns `None` for percentages.
fn scale_by_unit(n: f32, unit: Unit, font_size: f32) -> Option<f32> {
    let n = match unit {
        Unit::None | Unit::Px | Unit::Pc => n,
        Unit::Em => n * font_size,
        Unit::Ex => n * font_size * 0.5,
        Unit::In | Unit::Cm | Unit::Mm | Unit::Pt => n * unit.factor() as f32,
        Unit::Percent => return None,
    };

    Some(n)
}

/// Converts a length into user units.
///
/// Unitless values use `Options::default_unit`. Percentages are fractions
/// in bounding box units and refer to the nearest view box otherwise.
#[inline(never)]
pub(crate) fn convert_length(length: Length, aid: AId, object_units: Units, state: &State) -> f32 {
    let n = length.number as f32;
    let unit = match length.unit {
        Unit::None => state.opt.default_unit,
        unit => unit,
    };

    if let Some(n) = scale_by_unit(n, unit, state.font_size) {
        return n;
    }

    if object_units == Units::ObjectBoundingBox {
        return n / 100.0;
    }

    let (w, h) = (state.view_box.width(), state.view_box.height());
    let base = match percent_axis(aid) {
        Axis::Horizontal => w,
        Axis::Vertical => h,
        Axis::Diagonal => ((w * w + h * h) / 2.0).sqrt(),
    };

    base * n / 100.0
}

#[inline]
pub(crate) fn convert_user_length(length: Length, aid: AId, state: &State) -> f32 {
    convert_length(length, aid, Units::UserSpaceOnUse, state)
}

/// Parses and converts a length attribute in user space.
pub(crate) fn convert_attr(node: SvgNode, aid: AId, state: &State) -> Option<f32> {
    node.attribute::<Length>(aid)
        .map(|length| convert_user_length(length, aid, state))
}

/// Same as `convert_attr`, but falls back to a default length.
pub(crate) fn convert_attr_or(node: SvgNode, aid: AId, def: Length, state: &State) -> f32 {
    let length = node.attribute::<Length>(aid).unwrap_or(def);
    convert_user_length(length, aid, state)
}

#[inline(never)]
pub(crate) fn convert_list(node: SvgNode, aid: AId, state: &State) -> Option<Vec<f32>> {
    let text = node.attribute::<&str>(aid)?;
    let mut list = Vec::new();
    for length in vgtypes::LengthListParser::from(text) {
        match length {
            Ok(length) => list.push(convert_user_length(length, aid, state)),
            Err(_) => {
                log::warn!("Failed to parse {} value: '{}'.", aid, text);
                return None;
            }
        }
    }

    Some(list)
}

/// Resolves `font-size` against the inherited one.
pub(crate) fn resolve_font_size(node: SvgNode, state: &State) -> Option<f32> {
    let value = node.attribute::<&str>(AId::FontSize)?;
    let parent = state.font_size;
    if let Some(length) = node.try_attribute::<Length>(AId::FontSize) {
        let n = length.number as f32;
        // A percentage refers to the inherited size.
        let size = scale_by_unit(n, length.unit, parent).unwrap_or(n * parent / 100.0);
        return Some(size).filter(|s| s.is_finite() && *s >= 0.0);
    }

    convert_named_font_size(value, parent)
}

fn convert_named_font_size(name: &str, parent_font_size: f32) -> Option<f32> {
    let factor = match name {
        "xx-small" => -3,
        "x-small" => -2,
        "small" => -1,
        "medium" => 0,
        "large" => 1,
        "x-large" => 2,
        "xx-large" => 3,
        "smaller" => -1,
        "larger" => 1,
        _ => {
            log::warn!("Invalid 'font-size' value: '{}'.", name);
            return None;
        }
    };

    // Absolute keywords are relative to the medium size of 12.
    let base = if name == "smaller" || name == "larger" {
        parent_font_size
    } else {
        12.0
    };

    Some(base * 1.2f32.powi(factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;

    fn state(opt: &Options) -> State {
        State {
            opt,
            view_box: tiny_skia::NonZeroRect::from_xywh(0.0, 0.0, 200.0, 100.0).unwrap(),
            font_size: 10.0,
        }
    }

    #[rustfmt::skip]
    macro_rules! test {
        ($name:ident, $aid:expr, $units:expr, $length:expr, $result:expr) => {
            #[test]
            fn $name() {
                let opt = Options::default();
                let length: Length = $length.parse().unwrap();
                let n = convert_length(length, $aid, $units, &state(&opt));
                assert!((n - $result).abs() < 0.001, "{} != {}", n, $result);
            }
        };
    }

    test!(px,           AId::X,      Units::UserSpaceOnUse,    "5",    5.0);
    test!(mm,           AId::X,      Units::UserSpaceOnUse,    "1mm",  3.543307);
    test!(inch,         AId::X,      Units::UserSpaceOnUse,    "1in",  90.0);
    test!(em,           AId::X,      Units::UserSpaceOnUse,    "2em",  20.0);
    test!(ex,           AId::X,      Units::UserSpaceOnUse,    "2ex",  10.0);
    test!(percent_x,    AId::Width,  Units::UserSpaceOnUse,    "50%",  100.0);
    test!(percent_y,    AId::Height, Units::UserSpaceOnUse,    "50%",  50.0);
    test!(percent_diag, AId::R,      Units::UserSpaceOnUse,    "10%",  15.811388);
    test!(percent_obb,  AId::X,      Units::ObjectBoundingBox, "50%",  0.5);
    test!(number_obb,   AId::X,      Units::ObjectBoundingBox, "0.25", 0.25);

    #[test]
    fn default_unit() {
        let opt = Options {
            default_unit: Unit::Mm,
            ..Options::default()
        };
        let n = convert_length(Length::new_number(1.0), AId::X, Units::UserSpaceOnUse, &state(&opt));
        assert!((n - 3.543307).abs() < 0.001);
    }

    #[test]
    fn named_font_size() {
        assert_eq!(convert_named_font_size("medium", 30.0), Some(12.0));
        assert_eq!(convert_named_font_size("larger", 10.0), Some(12.0));
        assert_eq!(convert_named_font_size("huge", 10.0), None);
    }
}
