// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{ImageRefMut, RGBA8};

const STEPS: usize = 3;

/// A single box pass: pixels taken to the left and to the right of the center.
type BoxExtent = (usize, usize);

/// Returns the three box passes approximating a gaussian with `sigma`.
///
/// The box size is `d = floor(sigma * 3 * sqrt(2 * PI) / 4 + 0.5)`.
/// An odd `d` gives three centered boxes of size `d`.
/// An even `d` gives two boxes of size `d`, the first one shifted to the left
/// and the second one to the right, followed by a centered box of size `d + 1`.
pub fn box_sizes(sigma: f64) -> [(usize, usize); STEPS] {
    if sigma.is_nan() || sigma <= 0.0 {
        return [(0, 0); STEPS];
    }

    let d = (sigma * 3.0 * (2.0 * std::f64::consts::PI).sqrt() / 4.0 + 0.5).floor() as usize;
    if d <= 1 {
        return [(0, 0); STEPS];
    }

    let half = d / 2;
    if d % 2 == 1 {
        [(half, half); STEPS]
    } else {
        [(half, half - 1), (half - 1, half), (half, half)]
    }
}

/// Applies a box blur.
///
/// Input image pixels should have a **premultiplied alpha**.
///
/// A negative or zero `sigma_x`/`sigma_y` disables the blur along that axis.
/// Pixels outside the image are treated as transparent black.
///
/// # Allocations
///
/// Allocates a single row or column of the image.
pub fn box_blur(sigma_x: f64, sigma_y: f64, src: ImageRefMut) {
    let boxes_x = box_sizes(sigma_x);
    let boxes_y = box_sizes(sigma_y);

    let width = src.width as usize;
    let height = src.height as usize;
    if width == 0 || height == 0 {
        return;
    }

    let mut line = Vec::with_capacity(width.max(height));
    for (bx, by) in boxes_x.iter().zip(boxes_y.iter()) {
        if *bx != (0, 0) {
            for y in 0..height {
                blur_line(*bx, src.data, y * width, 1, width, &mut line);
            }
        }

        if *by != (0, 0) {
            for x in 0..width {
                blur_line(*by, src.data, x, width, height, &mut line);
            }
        }
    }
}

/// Blurs `len` pixels that start at `start` and are `step` pixels apart.
fn blur_line(
    (left, right): BoxExtent,
    data: &mut [RGBA8],
    start: usize,
    step: usize,
    len: usize,
    line: &mut Vec<RGBA8>,
) {
    line.clear();
    line.extend((0..len).map(|i| data[start + i * step]));

    // Out of image pixels are transparent, so the box size is constant.
    let area = (left as u64) + (right as u64) + 1;
    let avg = |v: u64| ((v + area / 2) / area).min(255) as u8;

    let mut sum = [0u64; 4];
    let add = |sum: &mut [u64; 4], p: RGBA8| {
        sum[0] += p.r as u64;
        sum[1] += p.g as u64;
        sum[2] += p.b as u64;
        sum[3] += p.a as u64;
    };

    for p in line.iter().take(right.saturating_add(1)) {
        add(&mut sum, *p);
    }

    for x in 0..len {
        data[start + x * step] = RGBA8 {
            r: avg(sum[0]),
            g: avg(sum[1]),
            b: avg(sum[2]),
            a: avg(sum[3]),
        };

        if let Some(p) = x.checked_add(right + 1).and_then(|i| line.get(i)) {
            add(&mut sum, *p);
        }

        if x >= left {
            let p = line[x - left];
            sum[0] -= p.r as u64;
            sum[1] -= p.g as u64;
            sum[2] -= p.b as u64;
            sum[3] -= p.a as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        // d = 2: two shifted boxes and a centered one of size 3.
        assert_eq!(box_sizes(1.0), [(1, 0), (0, 1), (1, 1)]);
        // d = 5
        assert_eq!(box_sizes(2.5), [(2, 2), (2, 2), (2, 2)]);
        assert_eq!(box_sizes(0.0), [(0, 0); 3]);
        assert_eq!(box_sizes(-1.0), [(0, 0); 3]);
        assert_eq!(box_sizes(f64::NAN), [(0, 0); 3]);
    }

    #[test]
    fn zero_sigma_is_noop() {
        let mut data = vec![RGBA8::new(0, 0, 0, 0); 9];
        data[4] = RGBA8::new(255, 0, 0, 255);
        let expected = data.clone();
        box_blur(0.0, 0.0, ImageRefMut::new(&mut data, 3, 3));
        assert_eq!(data, expected);
    }

    #[test]
    fn uniform_interior_is_kept() {
        let mut data = vec![RGBA8::new(100, 100, 100, 255); 21 * 21];
        box_blur(1.0, 1.0, ImageRefMut::new(&mut data, 21, 21));
        assert_eq!(data[10 * 21 + 10], RGBA8::new(100, 100, 100, 255));
        // Edges fade into the transparent outside.
        assert!(data[0].a < 255);
    }

    #[test]
    fn box_average() {
        let mut data = vec![RGBA8::new(0, 0, 0, 0); 7];
        data[3] = RGBA8::new(0, 0, 0, 150);
        // d = 3, three centered passes.
        box_blur(1.5, 0.0, ImageRefMut::new(&mut data, 7, 1));
        let alpha: Vec<u8> = data.iter().map(|p| p.a).collect();
        assert_eq!(alpha, [6, 17, 33, 39, 33, 17, 6]);
    }

    #[test]
    fn huge_sigma_on_a_large_image() {
        let (w, h) = (4096, 64);
        let mut data = vec![RGBA8::new(255, 255, 255, 255); w * h];
        box_blur(1_000_000.0, 1_000_000.0, ImageRefMut::new(&mut data, w as u32, h as u32));
        // Most of the box lies outside the image.
        assert!(data.iter().all(|p| p.a < 8));
    }

    #[test]
    fn spreads_a_single_pixel() {
        let mut data = vec![RGBA8::new(0, 0, 0, 0); 15 * 15];
        data[7 * 15 + 7] = RGBA8::new(255, 255, 255, 255);
        box_blur(2.5, 0.0, ImageRefMut::new(&mut data, 15, 15));

        // Horizontal only.
        assert_eq!(data[6 * 15 + 7].a, 0);
        assert!(data[7 * 15 + 5].a > 0);
        assert!(data[7 * 15 + 7].a < 255);
    }
}
