// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{clamp_unit, unit_to_u8, ImageRefMut, RGBA8};

/// An `feColorMatrix` operation.
#[derive(Clone, Copy, Debug)]
pub enum ColorMatrix<'a> {
    /// A row-major 5×4 matrix.
    Matrix(&'a [f64; 20]),
    /// Desaturation. `0` is grayscale, `1` keeps the image as is.
    Saturate(f64),
    /// A hue rotation in degrees.
    HueRotate(f64),
    /// Moves the luminance into alpha and clears the color.
    LuminanceToAlpha,
}

type Rows = [[f64; 5]; 4];

const KEEP_ALPHA: [f64; 5] = [0.0, 0.0, 0.0, 1.0, 0.0];

impl ColorMatrix<'_> {
    fn rows(&self) -> Rows {
        match *self {
            ColorMatrix::Matrix(m) => {
                let mut rows = [[0.0; 5]; 4];
                for (row, values) in rows.iter_mut().zip(m.chunks_exact(5)) {
                    row.copy_from_slice(values);
                }
                rows
            }
            ColorMatrix::Saturate(s) => {
                let s = clamp_unit(s);
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0, 0.0],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0, 0.0],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0, 0.0],
                    KEEP_ALPHA,
                ]
            }
            ColorMatrix::HueRotate(angle) => {
                let (sin, cos) = angle.to_radians().sin_cos();
                [
                    [
                        0.213 + 0.787 * cos - 0.213 * sin,
                        0.715 - 0.715 * cos - 0.715 * sin,
                        0.072 - 0.072 * cos + 0.928 * sin,
                        0.0,
                        0.0,
                    ],
                    [
                        0.213 - 0.213 * cos + 0.143 * sin,
                        0.715 + 0.285 * cos + 0.140 * sin,
                        0.072 - 0.072 * cos - 0.283 * sin,
                        0.0,
                        0.0,
                    ],
                    [
                        0.213 - 0.213 * cos - 0.787 * sin,
                        0.715 - 0.715 * cos + 0.715 * sin,
                        0.072 + 0.928 * cos + 0.072 * sin,
                        0.0,
                        0.0,
                    ],
                    KEEP_ALPHA,
                ]
            }
            ColorMatrix::LuminanceToAlpha => [
                [0.0; 5],
                [0.0; 5],
                [0.0; 5],
                [0.2125, 0.7154, 0.0721, 0.0, 0.0],
            ],
        }
    }
}

/// Applies a color matrix.
///
/// Pixels must have a **straight (unpremultiplied) alpha**.
pub fn color_matrix(matrix: ColorMatrix, src: ImageRefMut) {
    let rows = matrix.rows();
    for pixel in src.data.iter_mut() {
        let input = [
            pixel.r as f64 / 255.0,
            pixel.g as f64 / 255.0,
            pixel.b as f64 / 255.0,
            pixel.a as f64 / 255.0,
            1.0,
        ];

        let channel = |row: &[f64; 5]| unit_to_u8(row.iter().zip(&input).map(|(k, v)| k * v).sum());
        *pixel = RGBA8::new(
            channel(&rows[0]),
            channel(&rows[1]),
            channel(&rows[2]),
            channel(&rows[3]),
        );
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    fn apply(matrix: ColorMatrix, pixel: RGBA8) -> RGBA8 {
        let mut data = [pixel];
        color_matrix(matrix, ImageRefMut::new(&mut data, 1, 1));
        data[0]
    }

    #[test]
    fn identity_matrix() {
        let m = [
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        let p = RGBA8::new(10, 120, 250, 200);
        assert_eq!(apply(ColorMatrix::Matrix(&m), p), p);
    }

    #[test]
    fn offsets_are_added() {
        let m = [
            0.0, 0.0, 0.0, 0.0, 1.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 0.5, 0.0,
        ];
        assert_eq!(apply(ColorMatrix::Matrix(&m), RGBA8::new(255, 0, 0, 255)),
                   RGBA8::new(255, 0, 255, 128));
    }

    #[test]
    fn saturate_zero_is_grayscale() {
        let p = apply(ColorMatrix::Saturate(0.0), RGBA8::new(255, 0, 0, 77));
        assert_eq!(p.r, p.g);
        assert_eq!(p.g, p.b);
        assert_eq!(p.a, 77);
    }

    #[test]
    fn hue_rotate_zero_is_identity() {
        let p = RGBA8::new(30, 60, 90, 255);
        assert_eq!(apply(ColorMatrix::HueRotate(0.0), p), p);
    }

    #[test]
    fn luminance_to_alpha() {
        assert_eq!(apply(ColorMatrix::LuminanceToAlpha, RGBA8::new(255, 255, 255, 255)),
                   RGBA8::new(0, 0, 0, 255));
        assert_eq!(apply(ColorMatrix::LuminanceToAlpha, RGBA8::new(0, 0, 0, 255)),
                   RGBA8::new(0, 0, 0, 0));
    }
}
