// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Keyframe animations.
//!
//! Animations are evaluated against an elapsed time in seconds,
//! which is passed to the renderer by the caller.

use vgtypes::Color;

/// A transform animation type.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum TransformType {
    Translate,
    Scale,
    Rotate,
    SkewX,
    SkewY,
}

/// An animated property with its keyframe values.
#[derive(Clone, PartialEq, Debug)]
pub enum AnimationTarget {
    /// `fill` color.
    Fill(Vec<Color>),
    /// `stroke` color.
    Stroke(Vec<Color>),
    /// Element's `opacity`.
    Opacity(Vec<f32>),
    /// `animateTransform`.
    ///
    /// Each value is normalized into three numbers:
    /// `tx ty _`, `sx sy _`, `angle cx cy`, `angle _ _`.
    Transform(TransformType, Vec<[f32; 3]>),
}

impl AnimationTarget {
    fn len(&self) -> usize {
        match self {
            AnimationTarget::Fill(list) | AnimationTarget::Stroke(list) => list.len(),
            AnimationTarget::Opacity(list) => list.len(),
            AnimationTarget::Transform(_, list) => list.len(),
        }
    }
}

/// An interpolated animation value.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum AnimatedValue {
    Fill(Color),
    Stroke(Color),
    Opacity(f32),
    Transform(TransformType, [f32; 3]),
}

/// An `animate`, `animateColor`, `animateTransform` or `set` element.
#[derive(Clone, PartialEq, Debug)]
pub struct Animation {
    /// Start time in seconds.
    pub start: f64,
    /// Simple duration in seconds.
    ///
    /// Zero means that the animation holds its first value once started.
    pub duration: f64,
    /// Number of repeats. Negative for an infinite animation.
    pub iteration_count: f64,
    /// Keep the final value once finished. `fill="freeze"`.
    pub freeze: bool,
    /// Add to the underlying value instead of replacing it. `additive="sum"`.
    pub additive: bool,
    /// Keyframe times in the `0..=1` range.
    ///
    /// Empty for evenly spaced keyframes.
    pub key_times: Vec<f64>,
    /// Animated property.
    pub target: AnimationTarget,
}

impl Animation {
    /// Returns a repeat-normalized progress in the `0..=1` range.
    ///
    /// Returns `None` when the animation has not started yet
    /// or is finished without freezing.
    pub fn progress(&self, elapsed: f64) -> Option<f64> {
        let time = elapsed - self.start;
        if !time.is_finite() || time < 0.0 {
            return None;
        }

        if self.duration <= 0.0 {
            return Some(0.0);
        }

        let repeats = time / self.duration;
        if self.iteration_count >= 0.0 && repeats >= self.iteration_count {
            if !self.freeze {
                return None;
            }

            let last = self.iteration_count.fract();
            return Some(if last == 0.0 { 1.0 } else { last });
        }

        Some(repeats.fract())
    }

    /// Returns an animated value at the specified time.
    pub fn value_at(&self, elapsed: f64) -> Option<AnimatedValue> {
        let progress = self.progress(elapsed)?;
        let (idx, t) = self.keyframe(progress)?;

        let value = match self.target {
            AnimationTarget::Fill(ref list) => {
                AnimatedValue::Fill(interpolate_color(list[idx], pick_next(list, idx), t))
            }
            AnimationTarget::Stroke(ref list) => {
                AnimatedValue::Stroke(interpolate_color(list[idx], pick_next(list, idx), t))
            }
            AnimationTarget::Opacity(ref list) => {
                AnimatedValue::Opacity(lerp(list[idx], pick_next(list, idx), t))
            }
            AnimationTarget::Transform(kind, ref list) => {
                let from = list[idx];
                let to = pick_next(list, idx);
                AnimatedValue::Transform(
                    kind,
                    [
                        lerp(from[0], to[0], t),
                        lerp(from[1], to[1], t),
                        lerp(from[2], to[2], t),
                    ],
                )
            }
        };

        Some(value)
    }

    /// Finds a keyframe interval for the progress.
    ///
    /// Returns the interval start index and a local fraction.
    fn keyframe(&self, progress: f64) -> Option<(usize, f32)> {
        let count = self.target.len();
        match count {
            0 => return None,
            1 => return Some((0, 0.0)),
            _ => {}
        }

        let time_at = |i: usize| -> f64 {
            if self.key_times.len() == count {
                self.key_times[i]
            } else {
                i as f64 / (count - 1) as f64
            }
        };

        for i in 0..count - 1 {
            let start = time_at(i);
            let end = time_at(i + 1);
            if progress < end || i == count - 2 {
                let span = end - start;
                let t = if span > 0.0 {
                    ((progress - start) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                };

                return Some((i, t as f32));
            }
        }

        None
    }
}

#[inline]
fn pick_next<T: Copy>(list: &[T], idx: usize) -> T {
    list.get(idx + 1).copied().unwrap_or(list[idx])
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn interpolate_color(from: Color, to: Color, t: f32) -> Color {
    let c = |a: u8, b: u8| -> u8 { lerp(a as f32, b as f32, t).round().clamp(0.0, 255.0) as u8 };

    Color::new_rgba(
        c(from.red, to.red),
        c(from.green, to.green),
        c(from.blue, to.blue),
        c(from.alpha, to.alpha),
    )
}

/// Accumulated transform animations of a single element.
///
/// Components are combined as `translate * rotate * scale * skew`,
/// so a skew is applied to a point first.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AnimatedTransform {
    translate: (f32, f32),
    scale: (f32, f32),
    rotate: [f32; 3],
    skew: (f32, f32),
    /// Replaces element's own transform.
    pub replace: bool,
}

impl Default for AnimatedTransform {
    fn default() -> Self {
        AnimatedTransform {
            translate: (0.0, 0.0),
            scale: (1.0, 1.0),
            rotate: [0.0; 3],
            skew: (0.0, 0.0),
            replace: false,
        }
    }
}

impl AnimatedTransform {
    /// Adds an animated value.
    pub fn push(&mut self, kind: TransformType, value: [f32; 3], additive: bool) {
        if !additive {
            self.replace = true;
        }

        match kind {
            TransformType::Translate => {
                self.translate.0 += value[0];
                self.translate.1 += value[1];
            }
            TransformType::Scale => {
                self.scale.0 *= value[0];
                self.scale.1 *= value[1];
            }
            TransformType::Rotate => {
                self.rotate[0] += value[0];
                self.rotate[1] = value[1];
                self.rotate[2] = value[2];
            }
            TransformType::SkewX => self.skew.0 += value[0],
            TransformType::SkewY => self.skew.1 += value[0],
        }
    }

    /// Builds a transform matrix.
    pub fn to_transform(&self) -> tiny_skia::Transform {
        let [angle, cx, cy] = self.rotate;
        let rotate = tiny_skia::Transform::from_translate(cx, cy)
            .pre_concat(tiny_skia::Transform::from_rotate(angle))
            .pre_translate(-cx, -cy);

        let skew = tiny_skia::Transform::from_row(
            1.0,
            self.skew.1.to_radians().tan(),
            self.skew.0.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        );

        tiny_skia::Transform::from_translate(self.translate.0, self.translate.1)
            .pre_concat(rotate)
            .pre_scale(self.scale.0, self.scale.1)
            .pre_concat(skew)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn animation(target: AnimationTarget) -> Animation {
        Animation {
            start: 1.0,
            duration: 2.0,
            iteration_count: 1.0,
            freeze: false,
            additive: false,
            key_times: Vec::new(),
            target,
        }
    }

    #[test]
    fn progress() {
        let mut anim = animation(AnimationTarget::Opacity(vec![0.0, 1.0]));
        assert_eq!(anim.progress(0.5), None);
        assert_eq!(anim.progress(1.0), Some(0.0));
        assert_eq!(anim.progress(2.0), Some(0.5));
        assert_eq!(anim.progress(3.0), None);

        anim.freeze = true;
        assert_eq!(anim.progress(10.0), Some(1.0));

        anim.iteration_count = -1.0;
        assert_eq!(anim.progress(6.0), Some(0.5));
    }

    #[test]
    fn set_holds_forever() {
        let mut anim = animation(AnimationTarget::Fill(vec![Color::red()]));
        anim.duration = 0.0;
        assert_eq!(anim.value_at(0.0), None);
        assert_eq!(anim.value_at(1000.0), Some(AnimatedValue::Fill(Color::red())));
    }

    #[test]
    fn color_interpolation() {
        let anim = animation(AnimationTarget::Fill(vec![
            Color::new_rgb(0, 0, 0),
            Color::new_rgb(200, 100, 0),
        ]));
        assert_eq!(
            anim.value_at(2.0),
            Some(AnimatedValue::Fill(Color::new_rgb(100, 50, 0)))
        );
    }

    #[test]
    fn key_times() {
        let mut anim = animation(AnimationTarget::Opacity(vec![0.0, 1.0, 0.0]));
        anim.key_times = vec![0.0, 0.25, 1.0];
        match anim.value_at(1.25) {
            Some(AnimatedValue::Opacity(n)) => assert!(approx_eq!(f32, n, 0.5, epsilon = 1e-6)),
            v => panic!("unexpected value: {:?}", v),
        }

        match anim.value_at(2.25) {
            Some(AnimatedValue::Opacity(n)) => assert!(approx_eq!(f32, n, 0.5, epsilon = 1e-6)),
            v => panic!("unexpected value: {:?}", v),
        }
    }

    #[test]
    fn transform_order() {
        let mut ts = AnimatedTransform::default();
        ts.push(TransformType::Translate, [10.0, 0.0, 0.0], true);
        ts.push(TransformType::Scale, [2.0, 2.0, 0.0], true);
        assert!(!ts.replace);

        let mut p = [tiny_skia::Point::from_xy(1.0, 0.0)];
        ts.to_transform().map_points(&mut p);
        assert_eq!(p[0], tiny_skia::Point::from_xy(12.0, 0.0));
    }

    #[test]
    fn rotate_about_center() {
        let mut ts = AnimatedTransform::default();
        ts.push(TransformType::Rotate, [90.0, 5.0, 5.0], false);
        assert!(ts.replace);

        let mut p = [tiny_skia::Point::from_xy(10.0, 5.0)];
        ts.to_transform().map_points(&mut p);
        assert!(approx_eq!(f32, p[0].x, 5.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, p[0].y, 10.0, epsilon = 1e-4));
    }
}
