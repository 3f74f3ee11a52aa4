// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filter primitives.

use super::Color;

/// A subregion edge.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Coord {
    /// A fraction of the element's bounding box.
    Relative(f32),
    /// A user space value.
    Absolute(f32),
}

/// A primitive subregion. Unset edges default to the filter region.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
#[allow(missing_docs)]
pub struct Subregion {
    pub x: Option<Coord>,
    pub y: Option<Coord>,
    pub width: Option<Coord>,
    pub height: Option<Coord>,
}

/// A filter primitive input.
#[derive(Clone, PartialEq, Debug)]
pub enum Input {
    /// The unfiltered element.
    SourceGraphic,
    /// The alpha channel of the unfiltered element.
    SourceAlpha,
    /// A named result of a previous primitive.
    ///
    /// An empty name refers to the most recent result.
    Reference(String),
}

/// A color matrix kind.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum ColorMatrixKind {
    Matrix([f64; 20]),
    Saturate(f64),
    HueRotate(f64),
    LuminanceToAlpha,
}

impl Default for ColorMatrixKind {
    fn default() -> Self {
        #[rustfmt::skip]
        let identity = [
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        ColorMatrixKind::Matrix(identity)
    }
}

/// An `feComposite` operator.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum CompositeOperator {
    Over,
    In,
    Out,
    Atop,
    Xor,
    Lighter,
    Arithmetic { k1: f64, k2: f64, k3: f64, k4: f64 },
}

/// A filter primitive kind.
#[derive(Clone, PartialEq, Debug)]
pub enum PrimitiveKind {
    /// `feFlood`
    Flood {
        /// Flood color.
        color: Color,
        /// Flood opacity in the `0..=1` range.
        opacity: f32,
    },
    /// `feOffset`, in primitive units.
    Offset {
        /// Horizontal offset.
        dx: f32,
        /// Vertical offset.
        dy: f32,
    },
    /// `feColorMatrix`
    ColorMatrix(ColorMatrixKind),
    /// `feGaussianBlur`, in primitive units.
    GaussianBlur {
        /// Horizontal standard deviation.
        std_dev_x: f32,
        /// Vertical standard deviation.
        std_dev_y: f32,
    },
    /// `feComposite`
    Composite(CompositeOperator),
    /// `feMerge`. Inputs are stored in `MergeNode` children.
    Merge,
    /// A known primitive we cannot render.
    Unsupported,
}
