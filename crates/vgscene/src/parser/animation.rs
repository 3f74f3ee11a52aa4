// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use super::node::SvgNode;
use super::{AId, EId};
use crate::animation::{Animation, AnimationTarget, TransformType};
use crate::tree::Color;

/// Converts an animation element.
///
/// Returns `None` for unsupported or malformed animations.
pub(crate) fn convert(eid: EId, node: SvgNode) -> Option<Animation> {
    let start = match node.attribute::<&str>(AId::Begin) {
        Some("indefinite") => {
            log::warn!("Animations without a start time are not supported. Skipped.");
            return None;
        }
        Some(value) => match parse_clock(value) {
            Some(n) => n,
            None => {
                log::warn!("Unsupported animation begin: '{}'. Skipped.", value);
                return None;
            }
        },
        None => 0.0,
    };

    let duration = match node.attribute::<&str>(AId::Dur) {
        Some("indefinite") | None => 0.0,
        Some(value) => parse_clock(value).filter(|n| *n >= 0.0).unwrap_or(0.0),
    };

    let iteration_count = match node.attribute::<&str>(AId::RepeatCount) {
        Some("indefinite") => -1.0,
        Some(value) => f64::from_str(value.trim())
            .ok()
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or(1.0),
        None => 1.0,
    };

    let target = match eid {
        EId::AnimateTransform => convert_transform_target(node)?,
        EId::Set => convert_target(node, node.attribute::<&str>(AId::To).map(|v| vec![v]))?,
        _ => convert_target(node, keyframes(node))?,
    };

    let key_times = node
        .attribute::<&str>(AId::KeyTimes)
        .map(|v| {
            v.split(';')
                .filter_map(|s| f64::from_str(s.trim()).ok())
                .map(|n| n.clamp(0.0, 1.0))
                .collect()
        })
        .unwrap_or_default();

    Some(Animation {
        start,
        // A `set` without a duration lasts forever.
        duration,
        iteration_count,
        freeze: node.attribute::<&str>(AId::Fill) == Some("freeze"),
        additive: node.attribute::<&str>(AId::Additive) == Some("sum"),
        key_times,
        target,
    })
}

/// Collects raw keyframe values from `values` or `from`/`to`/`by`.
fn keyframes<'a>(node: SvgNode<'a>) -> Option<Vec<&'a str>> {
    if let Some(values) = node.attribute::<&str>(AId::Values) {
        let list: Vec<&str> = values
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        return if list.is_empty() { None } else { Some(list) };
    }

    let from = node.attribute::<&str>(AId::From);
    let to = node.attribute::<&str>(AId::To);
    match (from, to) {
        (Some(from), Some(to)) => Some(vec![from, to]),
        (Some(from), None) if node.has_attribute(AId::By) => Some(vec![from]),
        (None, Some(to)) => Some(vec![to]),
        _ => None,
    }
}

fn convert_target(node: SvgNode, values: Option<Vec<&str>>) -> Option<AnimationTarget> {
    let name = node.attribute::<&str>(AId::AttributeName)?;
    let list = match values {
        Some(list) => list,
        None => {
            log::warn!("Animation of '{}' has no values. Skipped.", name);
            return None;
        }
    };

    let colors = || -> Option<Vec<Color>> {
        let mut colors = Vec::with_capacity(list.len());
        for v in &list {
            colors.push(Color::from_str(v).ok()?);
        }
        colors.extend(by_color(node, colors.first().copied()));
        Some(colors)
    };

    let target = match name {
        "fill" => AnimationTarget::Fill(colors()?),
        "stroke" => AnimationTarget::Stroke(colors()?),
        "opacity" => {
            let mut list: Vec<f32> = list
                .iter()
                .map(|v| f32::from_str(v).ok().map(|n| n.clamp(0.0, 1.0)))
                .collect::<Option<_>>()?;
            if let Some(by) = node.attribute::<f32>(AId::By) {
                if list.len() == 1 {
                    list.push((list[0] + by).clamp(0.0, 1.0));
                }
            }
            AnimationTarget::Opacity(list)
        }
        _ => {
            log::warn!("Animation of '{}' is not supported. Skipped.", name);
            return None;
        }
    };

    Some(target)
}

/// Returns a `from + by` color for a single keyframe.
fn by_color(node: SvgNode, from: Option<Color>) -> Option<Color> {
    if node.has_attribute(AId::Values) || node.has_attribute(AId::To) {
        return None;
    }

    let from = from?;
    let by = node.attribute::<Color>(AId::By)?;
    Some(Color::new_rgba(
        from.red.saturating_add(by.red),
        from.green.saturating_add(by.green),
        from.blue.saturating_add(by.blue),
        from.alpha,
    ))
}

fn convert_transform_target(node: SvgNode) -> Option<AnimationTarget> {
    let kind = match node.attribute::<&str>(AId::Type).unwrap_or("translate") {
        "translate" => TransformType::Translate,
        "scale" => TransformType::Scale,
        "rotate" => TransformType::Rotate,
        "skewX" => TransformType::SkewX,
        "skewY" => TransformType::SkewY,
        value => {
            log::warn!("Unsupported animateTransform type: '{}'. Skipped.", value);
            return None;
        }
    };

    let mut list = Vec::new();
    if let Some(values) = node.attribute::<&str>(AId::Values) {
        for value in values.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            list.push(parse_transform_value(kind, value)?);
        }
    } else {
        let from = node
            .attribute::<&str>(AId::From)
            .and_then(|v| parse_transform_value(kind, v));
        let to = node
            .attribute::<&str>(AId::To)
            .and_then(|v| parse_transform_value(kind, v));
        let by = node
            .attribute::<&str>(AId::By)
            .and_then(|v| parse_transform_value(kind, v));

        match (from, to, by) {
            (Some(from), Some(to), _) => list.extend([from, to]),
            (Some(from), None, Some(by)) => {
                let to = match kind {
                    TransformType::Scale => [from[0] * by[0], from[1] * by[1], 0.0],
                    _ => [from[0] + by[0], from[1] + by[1], from[2] + by[2]],
                };
                list.extend([from, to]);
            }
            (None, Some(to), _) => list.push(to),
            _ => {}
        }
    }

    if list.is_empty() {
        log::warn!("animateTransform has no values. Skipped.");
        return None;
    }

    Some(AnimationTarget::Transform(kind, list))
}

/// Normalizes a transform value into three numbers.
fn parse_transform_value(kind: TransformType, text: &str) -> Option<[f32; 3]> {
    let mut numbers = Vec::with_capacity(3);
    for n in vgtypes::NumberListParser::from(text) {
        numbers.push(n.ok()? as f32);
    }

    let get = |i: usize| numbers.get(i).copied();
    let value = match kind {
        TransformType::Translate => [get(0)?, get(1).unwrap_or(0.0), 0.0],
        TransformType::Scale => {
            let sx = get(0)?;
            [sx, get(1).unwrap_or(sx), 0.0]
        }
        TransformType::Rotate => [get(0)?, get(1).unwrap_or(0.0), get(2).unwrap_or(0.0)],
        TransformType::SkewX | TransformType::SkewY => [get(0)?, 0.0, 0.0],
    };

    Some(value)
}

/// Parses a SMIL clock value into seconds.
///
/// Supports full (`01:02:03.5`), partial (`02:03`) and timecount
/// (`5s`, `300ms`, `2min`, `1h`, `4`) values.
fn parse_clock(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.contains(':') {
        let mut total = 0.0;
        let mut parts = 0;
        for part in text.split(':') {
            let n = f64::from_str(part.trim()).ok()?;
            total = total * 60.0 + n;
            parts += 1;
        }

        return if parts <= 3 { Some(total) } else { None };
    }

    let (number, factor) = if let Some(n) = text.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = text.strip_suffix("min") {
        (n, 60.0)
    } else if let Some(n) = text.strip_suffix('h') {
        (n, 3600.0)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1.0)
    } else {
        (text, 1.0)
    };

    let n = f64::from_str(number.trim()).ok()?;
    if n.is_finite() {
        Some(n * factor)
    } else {
        None
    }
}
