// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Known element names.
///
/// Names are matched by their qualified text, so `svg:rect` is not a `rect`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EId {
    A,
    Animate,
    AnimateColor,
    AnimateTransform,
    Circle,
    Defs,
    Ellipse,
    FeColorMatrix,
    FeComposite,
    FeFlood,
    FeGaussianBlur,
    FeMerge,
    FeMergeNode,
    FeOffset,
    /// A known filter primitive we cannot render.
    FeUnsupported,
    Filter,
    Font,
    FontFace,
    G,
    Glyph,
    Image,
    Line,
    LinearGradient,
    Marker,
    Mask,
    MissingGlyph,
    Path,
    Pattern,
    Polygon,
    Polyline,
    RadialGradient,
    Rect,
    Set,
    SolidColor,
    Stop,
    Style,
    Svg,
    Switch,
    Symbol,
    TBreak,
    Text,
    TextArea,
    Tspan,
    Use,
}

impl EId {
    pub fn from_str(text: &str) -> Option<EId> {
        let id = match text {
            "a" => EId::A,
            "animate" => EId::Animate,
            "animateColor" => EId::AnimateColor,
            "animateTransform" => EId::AnimateTransform,
            "circle" => EId::Circle,
            "defs" => EId::Defs,
            "ellipse" => EId::Ellipse,
            "feColorMatrix" => EId::FeColorMatrix,
            "feComposite" => EId::FeComposite,
            "feFlood" => EId::FeFlood,
            "feGaussianBlur" => EId::FeGaussianBlur,
            "feMerge" => EId::FeMerge,
            "feMergeNode" => EId::FeMergeNode,
            "feOffset" => EId::FeOffset,
            "feBlend"
            | "feComponentTransfer"
            | "feConvolveMatrix"
            | "feDiffuseLighting"
            | "feDisplacementMap"
            | "feDropShadow"
            | "feImage"
            | "feMorphology"
            | "feSpecularLighting"
            | "feTile"
            | "feTurbulence" => EId::FeUnsupported,
            "filter" => EId::Filter,
            "font" => EId::Font,
            "font-face" => EId::FontFace,
            "g" => EId::G,
            "glyph" => EId::Glyph,
            "image" => EId::Image,
            "line" => EId::Line,
            "linearGradient" => EId::LinearGradient,
            "marker" => EId::Marker,
            "mask" => EId::Mask,
            "missing-glyph" => EId::MissingGlyph,
            "path" => EId::Path,
            "pattern" => EId::Pattern,
            "polygon" => EId::Polygon,
            "polyline" => EId::Polyline,
            "radialGradient" => EId::RadialGradient,
            "rect" => EId::Rect,
            "set" => EId::Set,
            "solidColor" => EId::SolidColor,
            "stop" => EId::Stop,
            "style" => EId::Style,
            "svg" => EId::Svg,
            "switch" => EId::Switch,
            "symbol" => EId::Symbol,
            "tbreak" => EId::TBreak,
            "text" => EId::Text,
            "textArea" => EId::TextArea,
            "tspan" => EId::Tspan,
            "use" => EId::Use,
            _ => return None,
        };

        Some(id)
    }

    #[inline]
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            EId::Circle
                | EId::Ellipse
                | EId::Line
                | EId::Path
                | EId::Polygon
                | EId::Polyline
                | EId::Rect
        )
    }

    /// Elements that can hold arbitrary graphics.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            EId::A
                | EId::Defs
                | EId::G
                | EId::Marker
                | EId::Mask
                | EId::Pattern
                | EId::Svg
                | EId::Switch
                | EId::Symbol
        )
    }

    #[inline]
    pub fn is_filter_primitive(&self) -> bool {
        matches!(
            self,
            EId::FeColorMatrix
                | EId::FeComposite
                | EId::FeFlood
                | EId::FeGaussianBlur
                | EId::FeMerge
                | EId::FeOffset
                | EId::FeUnsupported
        )
    }

    #[inline]
    pub fn is_gradient(&self) -> bool {
        matches!(self, EId::LinearGradient | EId::RadialGradient)
    }

    #[inline]
    pub fn is_animation(&self) -> bool {
        matches!(
            self,
            EId::Animate | EId::AnimateColor | EId::AnimateTransform | EId::Set
        )
    }

    /// Elements whose text children are kept.
    #[inline]
    pub fn is_text_content(&self) -> bool {
        matches!(self, EId::Text | EId::TextArea | EId::Tspan)
    }

    /// Checks that `child` can be attached to `self`.
    pub fn can_have_child(&self, child: EId) -> bool {
        match child {
            EId::Tspan => matches!(self, EId::Text | EId::TextArea | EId::Tspan),
            EId::TBreak => *self == EId::TextArea,
            EId::FeMergeNode => *self == EId::FeMerge,
            EId::Stop => self.is_gradient(),
            EId::FontFace | EId::Glyph | EId::MissingGlyph => *self == EId::Font,
            _ if child.is_filter_primitive() => *self == EId::Filter,
            _ if child.is_animation() => {
                !self.is_animation() && !matches!(self, EId::Stop | EId::Style)
            }
            _ => self.is_container(),
        }
    }
}

macro_rules! define_attributes {
    (
        presentation { $($pvariant:ident = $ptext:literal,)+ }
        regular { $($rvariant:ident = $rtext:literal,)+ }
    ) => {
        /// Known attribute names.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum AId {
            $($pvariant,)+
            $($rvariant,)+
        }

        impl AId {
            pub fn from_str(text: &str) -> Option<AId> {
                match text {
                    $($ptext => Some(AId::$pvariant),)+
                    $($rtext => Some(AId::$rvariant),)+
                    _ => None,
                }
            }

            pub fn to_str(&self) -> &'static str {
                match self {
                    $(AId::$pvariant => $ptext,)+
                    $(AId::$rvariant => $rtext,)+
                }
            }

            /// Presentation attributes are the only ones that can be set via CSS.
            #[inline]
            pub fn is_presentation(&self) -> bool {
                matches!(self, $(AId::$pvariant)|+)
            }
        }
    };
}

define_attributes! {
    presentation {
        Color = "color",
        CompOp = "comp-op",
        Display = "display",
        Fill = "fill",
        FillOpacity = "fill-opacity",
        FillRule = "fill-rule",
        Filter = "filter",
        FloodColor = "flood-color",
        FloodOpacity = "flood-opacity",
        FontFamily = "font-family",
        FontSize = "font-size",
        FontStyle = "font-style",
        FontWeight = "font-weight",
        ImageRendering = "image-rendering",
        MarkerEnd = "marker-end",
        MarkerMid = "marker-mid",
        MarkerStart = "marker-start",
        Mask = "mask",
        MixBlendMode = "mix-blend-mode",
        Opacity = "opacity",
        Overflow = "overflow",
        ShapeRendering = "shape-rendering",
        SolidColor = "solid-color",
        SolidOpacity = "solid-opacity",
        StopColor = "stop-color",
        StopOpacity = "stop-opacity",
        Stroke = "stroke",
        StrokeDasharray = "stroke-dasharray",
        StrokeDashoffset = "stroke-dashoffset",
        StrokeLinecap = "stroke-linecap",
        StrokeLinejoin = "stroke-linejoin",
        StrokeMiterlimit = "stroke-miterlimit",
        StrokeOpacity = "stroke-opacity",
        StrokeWidth = "stroke-width",
        TextAnchor = "text-anchor",
        VectorEffect = "vector-effect",
        Visibility = "visibility",
    }
    regular {
        Additive = "additive",
        Ascent = "ascent",
        AttributeName = "attributeName",
        Begin = "begin",
        By = "by",
        Class = "class",
        Cx = "cx",
        Cy = "cy",
        D = "d",
        Descent = "descent",
        Dur = "dur",
        Dx = "dx",
        Dy = "dy",
        FilterUnits = "filterUnits",
        From = "from",
        Fx = "fx",
        Fy = "fy",
        GradientTransform = "gradientTransform",
        GradientUnits = "gradientUnits",
        Height = "height",
        HorizAdvX = "horiz-adv-x",
        Href = "href",
        Id = "id",
        In = "in",
        In2 = "in2",
        K1 = "k1",
        K2 = "k2",
        K3 = "k3",
        K4 = "k4",
        KeyTimes = "keyTimes",
        MarkerHeight = "markerHeight",
        MarkerUnits = "markerUnits",
        MarkerWidth = "markerWidth",
        MaskContentUnits = "maskContentUnits",
        MaskUnits = "maskUnits",
        Offset = "offset",
        Operator = "operator",
        Orient = "orient",
        PatternContentUnits = "patternContentUnits",
        PatternTransform = "patternTransform",
        PatternUnits = "patternUnits",
        Points = "points",
        PreserveAspectRatio = "preserveAspectRatio",
        PrimitiveUnits = "primitiveUnits",
        R = "r",
        RefX = "refX",
        RefY = "refY",
        RepeatCount = "repeatCount",
        RequiredExtensions = "requiredExtensions",
        RequiredFeatures = "requiredFeatures",
        RequiredFonts = "requiredFonts",
        RequiredFormats = "requiredFormats",
        Result = "result",
        Rx = "rx",
        Ry = "ry",
        Space = "xml:space",
        SpreadMethod = "spreadMethod",
        StdDeviation = "stdDeviation",
        Style = "style",
        SystemLanguage = "systemLanguage",
        To = "to",
        Transform = "transform",
        Type = "type",
        Unicode = "unicode",
        UnitsPerEm = "units-per-em",
        Values = "values",
        ViewBox = "viewBox",
        Width = "width",
        X = "x",
        X1 = "x1",
        X2 = "x2",
        Y = "y",
        Y1 = "y1",
        Y2 = "y2",
    }
}

impl std::fmt::Display for AId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_are_not_resolved() {
        assert_eq!(EId::from_str("rect"), Some(EId::Rect));
        assert_eq!(EId::from_str("svg:rect"), None);
    }

    #[test]
    fn unsupported_primitives() {
        assert_eq!(EId::from_str("feTurbulence"), Some(EId::FeUnsupported));
        assert!(EId::Filter.can_have_child(EId::FeUnsupported));
        assert!(!EId::G.can_have_child(EId::FeFlood));
    }

    #[test]
    fn attachment_rules() {
        assert!(EId::Text.can_have_child(EId::Tspan));
        assert!(!EId::G.can_have_child(EId::Tspan));
        assert!(EId::TextArea.can_have_child(EId::TBreak));
        assert!(!EId::Text.can_have_child(EId::TBreak));
        assert!(!EId::Rect.can_have_child(EId::Circle));
        assert!(EId::Rect.can_have_child(EId::Animate));
        assert!(EId::LinearGradient.can_have_child(EId::Stop));
        assert!(!EId::G.can_have_child(EId::Stop));
    }

    #[test]
    fn attributes() {
        assert_eq!(AId::from_str("stroke-width"), Some(AId::StrokeWidth));
        assert_eq!(AId::StrokeWidth.to_str(), "stroke-width");
        assert!(AId::Fill.is_presentation());
        assert!(!AId::Transform.is_presentation());
        assert!(!AId::Width.is_presentation());
    }
}
