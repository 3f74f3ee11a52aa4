// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`vgfilters` holds the per-pixel kernels behind the `vgscene` filter pipeline.

The crate only transforms pixel buffers. Regions, inputs, primitive order and
coordinate systems are the caller's business.

Kernels:

- [`color_matrix`] for `feColorMatrix`
- [`arithmetic_composite`] for the arithmetic `feComposite` operator
- [`box_blur`], a three-pass approximation of `feGaussianBlur`

Fills, offsets, merges and the other `feComposite` operators are plain
layer operations and are left to the 2D library.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

pub use rgb::RGBA8;

mod box_blur;
mod color_matrix;
mod composite;

pub use box_blur::{box_blur, box_sizes};
pub use color_matrix::{color_matrix, ColorMatrix};
pub use composite::arithmetic_composite;

/// A borrowed RGBA image.
///
/// Whether channels are premultiplied depends on the kernel.
#[derive(Clone, Copy, Debug)]
pub struct ImageRef<'a> {
    data: &'a [RGBA8],
    width: u32,
    height: u32,
}

impl<'a> ImageRef<'a> {
    /// Wraps a pixel buffer.
    ///
    /// # Panics
    ///
    /// When `data` doesn't hold exactly `width * height` pixels.
    #[inline]
    pub fn new(data: &'a [RGBA8], width: u32, height: u32) -> Self {
        assert_eq!(data.len(), pixel_count(width, height));
        ImageRef {
            data,
            width,
            height,
        }
    }
}

/// A mutably borrowed RGBA image.
#[derive(Debug)]
pub struct ImageRefMut<'a> {
    data: &'a mut [RGBA8],
    width: u32,
    height: u32,
}

impl<'a> ImageRefMut<'a> {
    /// Wraps a mutable pixel buffer.
    ///
    /// # Panics
    ///
    /// When `data` doesn't hold exactly `width * height` pixels.
    #[inline]
    pub fn new(data: &'a mut [RGBA8], width: u32, height: u32) -> Self {
        assert_eq!(data.len(), pixel_count(width, height));
        ImageRefMut {
            data,
            width,
            height,
        }
    }
}

#[inline]
fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Converts straight alpha into premultiplied alpha.
pub fn multiply_alpha(data: &mut [RGBA8]) {
    for p in data {
        let k = p.a as f64 / 255.0;
        *p = scale_rgb(*p, k);
    }
}

/// Converts premultiplied alpha into straight alpha.
///
/// Fully transparent pixels are left untouched.
pub fn demultiply_alpha(data: &mut [RGBA8]) {
    for p in data.iter_mut().filter(|p| p.a != 0) {
        let k = 255.0 / p.a as f64;
        *p = scale_rgb(*p, k);
    }
}

fn scale_rgb(p: RGBA8, k: f64) -> RGBA8 {
    let scale = |c: u8| (c as f64 * k + 0.5).min(255.0) as u8;
    RGBA8::new(scale(p.r), scale(p.g), scale(p.b), p.a)
}

/// Clamps a channel value to `0..=1`.
#[inline]
fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Converts a `0..=1` channel value into a byte.
#[inline]
fn unit_to_u8(v: f64) -> u8 {
    (clamp_unit(v) * 255.0 + 0.5) as u8
}
