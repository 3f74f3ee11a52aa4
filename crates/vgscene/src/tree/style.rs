// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

pub use vgtypes::{Color, PaintFallback};

use super::NodeId;

/// A fill rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A line cap.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// A line join.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// A spread method.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// A coordinate system of a paint server, mask, filter or pattern.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum Units {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

/// An image rendering hint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum ImageRendering {
    #[default]
    OptimizeQuality,
    OptimizeSpeed,
}

/// A shape rendering hint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum ShapeRendering {
    OptimizeSpeed,
    CrispEdges,
    #[default]
    GeometricPrecision,
}

impl ShapeRendering {
    /// Checks if anti-aliasing should be enabled.
    pub fn use_shape_antialiasing(self) -> bool {
        match self {
            ShapeRendering::OptimizeSpeed => false,
            ShapeRendering::CrispEdges => false,
            ShapeRendering::GeometricPrecision => true,
        }
    }
}

/// A text anchor.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A font style.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// A font weight.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FontWeight {
    /// A numeric weight in the `1..=1000` range.
    Absolute(u16),
    /// One step bolder than the inherited weight.
    Bolder,
    /// One step lighter than the inherited weight.
    Lighter,
}

impl FontWeight {
    /// Resolves a weight relative to the inherited one.
    pub fn resolve(self, parent: u16) -> u16 {
        match self {
            FontWeight::Absolute(w) => w,
            FontWeight::Bolder => match parent {
                0..=349 => 400,
                350..=549 => 700,
                _ => 900,
            },
            FontWeight::Lighter => match parent {
                0..=549 => 100,
                550..=749 => 400,
                _ => 700,
            },
        }
    }
}

/// A compositing mode set via `comp-op` or `mix-blend-mode`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[allow(missing_docs)]
pub enum CompositeMode {
    Clear,
    Source,
    Destination,
    #[default]
    SourceOver,
    DestinationOver,
    SourceIn,
    DestinationIn,
    SourceOut,
    DestinationOut,
    SourceAtop,
    DestinationAtop,
    Xor,
    Plus,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// A paint value of a `fill` or `stroke` slot.
#[derive(Clone, Debug)]
pub enum Paint {
    /// Nothing is painted.
    None,
    /// A plain color.
    Color(Color),
    /// The top of the color stack.
    CurrentColor,
    /// A not yet resolved `url(#id)` link.
    ///
    /// Never present after a document was loaded.
    Server {
        /// A paint server ID.
        id: String,
        /// A fallback used when the link cannot be resolved.
        fallback: Option<PaintFallback>,
    },
    /// A resolved paint server.
    Style(PaintStyle),
}

/// A shared paint server.
#[derive(Clone, Debug)]
pub enum PaintStyle {
    /// A `solidColor` element. Color's alpha holds `solid-opacity`.
    Solid(Color),
    /// A linear or radial gradient.
    Gradient(Rc<Gradient>),
    /// A `pattern` element.
    Pattern(NodeId),
}

/// A gradient stop.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Stop {
    /// Always in the `0..=1` range and never decreasing inside a gradient.
    pub offset: f32,
    /// Stop color.
    pub color: Color,
    /// Stop opacity in the `0..=1` range.
    pub opacity: f32,
}

/// A gradient geometry.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum GradientKind {
    Linear {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Radial {
        cx: f32,
        cy: f32,
        r: f32,
        fx: f32,
        fy: f32,
    },
}

/// A fully resolved gradient.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct Gradient {
    pub id: String,
    pub kind: GradientKind,
    pub units: Units,
    pub transform: tiny_skia::Transform,
    pub spread: SpreadMethod,
    pub stops: Vec<Stop>,
}

/// Fill properties. `None` means inherited.
#[derive(Clone, Default, Debug)]
#[allow(missing_docs)]
pub struct FillSlot {
    pub paint: Option<Paint>,
    pub opacity: Option<f32>,
    pub rule: Option<FillRule>,
}

/// Stroke properties. `None` means inherited.
#[derive(Clone, Default, Debug)]
#[allow(missing_docs)]
pub struct StrokeSlot {
    pub paint: Option<Paint>,
    pub width: Option<f32>,
    pub opacity: Option<f32>,
    pub cap: Option<LineCap>,
    pub join: Option<LineJoin>,
    pub miter_limit: Option<f32>,
    /// An empty list disables dashing.
    pub dasharray: Option<Rc<Vec<f32>>>,
    pub dashoffset: Option<f32>,
    /// `vector-effect="non-scaling-stroke"`
    pub cosmetic: Option<bool>,
}

/// Font properties. `None` means inherited.
#[derive(Clone, Default, Debug)]
#[allow(missing_docs)]
pub struct FontSlot {
    pub families: Option<Rc<Vec<String>>>,
    pub size: Option<f32>,
    pub style: Option<FontStyle>,
    pub weight: Option<FontWeight>,
    pub anchor: Option<TextAnchor>,
}

/// Style properties of a node.
///
/// Each property is either set on the node or inherited from the render state.
#[derive(Clone, Default, Debug)]
pub struct StyleSlots {
    /// Fill properties.
    pub fill: FillSlot,
    /// Stroke properties.
    pub stroke: StrokeSlot,
    /// Font properties.
    pub font: FontSlot,
    /// Node's own transform. Not inherited, but concatenated.
    pub transform: Option<tiny_skia::Transform>,
    /// Node's opacity. Multiplied into the inherited one.
    pub opacity: Option<f32>,
    /// A compositing mode.
    pub composite: Option<CompositeMode>,
    /// An image rendering hint.
    pub image_rendering: Option<ImageRendering>,
    /// A shape rendering hint.
    pub shape_rendering: Option<ShapeRendering>,
    /// A value for `currentColor`.
    pub color: Option<Color>,
}
