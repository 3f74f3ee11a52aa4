// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;

use crate::{clamp_unit, unit_to_u8, ImageRef, ImageRefMut, RGBA8};

/// Performs an arithmetic composition: `k1*i1*i2 + k2*i1 + k3*i2 + k4`.
///
/// - `src1` and `src2` image pixels should have an **unpremultiplied alpha**.
/// - `dest` image pixels will have an **unpremultiplied alpha**.
///
/// Every channel, alpha included, is computed independently and clamped to `0..=1`.
///
/// # Panics
///
/// When `src1`, `src2` and `dest` have different sizes.
pub fn arithmetic_composite(
    k1: f64,
    k2: f64,
    k3: f64,
    k4: f64,
    src1: ImageRef,
    src2: ImageRef,
    dest: ImageRefMut,
) {
    assert!(src1.width == src2.width && src1.width == dest.width);
    assert!(src1.height == src2.height && src1.height == dest.height);

    let calc = |i1: u8, i2: u8| {
        let i1 = i1 as f64 / 255.0;
        let i2 = i2 as f64 / 255.0;
        clamp_unit(k1 * i1 * i2 + k2 * i1 + k3 * i2 + k4)
    };

    let pixels = src1.data.iter().zip(src2.data.iter());
    for ((c1, c2), out) in pixels.zip(dest.data.iter_mut()) {
        let a = calc(c1.a, c2.a);
        if a.approx_eq_ulps(&0.0, 4) {
            *out = RGBA8::default();
            continue;
        }

        *out = RGBA8 {
            r: unit_to_u8(calc(c1.r, c2.r)),
            g: unit_to_u8(calc(c1.g, c2.g)),
            b: unit_to_u8(calc(c1.b, c2.b)),
            a: unit_to_u8(a),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(k: [f64; 4], p1: RGBA8, p2: RGBA8) -> RGBA8 {
        let s1 = [p1];
        let s2 = [p2];
        let mut out = [RGBA8::default()];
        arithmetic_composite(
            k[0],
            k[1],
            k[2],
            k[3],
            ImageRef::new(&s1, 1, 1),
            ImageRef::new(&s2, 1, 1),
            ImageRefMut::new(&mut out, 1, 1),
        );
        out[0]
    }

    #[test]
    fn picks_first_input() {
        let p = RGBA8::new(10, 20, 30, 255);
        assert_eq!(run([0.0, 1.0, 0.0, 0.0], p, RGBA8::new(1, 2, 3, 4)), p);
    }

    #[test]
    fn sum_is_clamped() {
        let p = RGBA8::new(200, 200, 200, 255);
        assert_eq!(run([0.0, 1.0, 1.0, 0.0], p, p), RGBA8::new(255, 255, 255, 255));
    }

    #[test]
    fn zero_alpha_clears() {
        let p = RGBA8::new(200, 200, 200, 255);
        assert_eq!(run([0.0, 0.0, 0.0, 0.0], p, p), RGBA8::default());
    }

    #[test]
    fn multiply() {
        let white = RGBA8::new(255, 255, 255, 255);
        let gray = RGBA8::new(128, 128, 128, 255);
        assert_eq!(run([1.0, 0.0, 0.0, 0.0], white, gray), gray);
    }
}
