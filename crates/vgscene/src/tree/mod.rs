// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An SVG scene tree.

mod filter;
mod style;

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::rc::Rc;

use tiny_skia::{NonZeroRect, Size};
pub use vgtypes::{Align, AspectRatio};

pub use filter::*;
pub use style::*;

use crate::animation::Animation;
use crate::Options;

/// A node ID inside a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        // An arena index is always below `u32::MAX`. See `ElementsLimitReached`.
        NodeId(NonZeroU32::new(index as u32 + 1).unwrap())
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Attributes shared by all elements.
#[derive(Clone, Default, Debug)]
pub struct CommonAttrs {
    /// Element's ID. Can be empty.
    pub id: String,
    /// Element's classes.
    pub classes: Vec<String>,
    /// `None` means inherited.
    pub visibility: Option<bool>,
    /// `false` when `display="none"`.
    pub display: bool,
    /// `requiredFeatures`
    pub required_features: Option<Vec<String>>,
    /// `requiredExtensions`
    pub required_extensions: Option<Vec<String>>,
    /// `systemLanguage`
    pub system_language: Option<Vec<String>>,
    /// `requiredFormats`
    pub required_formats: Option<Vec<String>>,
    /// `requiredFonts`
    pub required_fonts: Option<Vec<String>>,
    /// A mask ID.
    pub mask: Option<String>,
    /// A filter ID.
    pub filter: Option<String>,
    /// A start marker ID.
    pub marker_start: Option<String>,
    /// A mid marker ID.
    pub marker_mid: Option<String>,
    /// An end marker ID.
    pub marker_end: Option<String>,
    /// A viewport clipping flag, set via `overflow`.
    pub clip: Option<bool>,
}

/// A marker orientation.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MarkerOrientation {
    /// A fixed angle in degrees.
    Angle(f32),
    /// A bisector of the adjacent segments.
    Auto,
    /// Same as `Auto`, but the start marker is rotated by 180 degrees.
    AutoStartReverse,
}

/// A node kind with its element specific data.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum NodeKind {
    /// The invisible root node. Its only child is the root `svg` element.
    Document,
    /// `g` and `a`.
    Group,
    Defs,
    Switch,
    /// An `svg` element. `width` and `height` are `None` for `auto`.
    Svg {
        x: f32,
        y: f32,
        width: Option<f32>,
        height: Option<f32>,
        view_box: Option<NonZeroRect>,
        aspect: AspectRatio,
    },
    Symbol {
        view_box: Option<NonZeroRect>,
        aspect: AspectRatio,
    },
    Marker {
        ref_x: f32,
        ref_y: f32,
        width: f32,
        height: f32,
        view_box: Option<NonZeroRect>,
        aspect: AspectRatio,
        orientation: MarkerOrientation,
        /// `true` for `markerUnits="strokeWidth"`.
        stroke_width_units: bool,
    },
    Pattern {
        rect: NonZeroRect,
        units: Units,
        content_units: Units,
        transform: tiny_skia::Transform,
        view_box: Option<NonZeroRect>,
        aspect: AspectRatio,
    },
    Mask {
        rect: NonZeroRect,
        units: Units,
        content_units: Units,
    },
    Filter {
        rect: NonZeroRect,
        units: Units,
        primitive_units: Units,
        /// Set by the reference resolver.
        supported: bool,
    },
    FilterPrimitive {
        subregion: Subregion,
        input: Input,
        input2: Input,
        result: String,
        kind: PrimitiveKind,
    },
    MergeNode {
        input: Input,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        ry: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    /// `None` for an empty path.
    Path(Option<Rc<tiny_skia::Path>>),
    Polygon(Rc<Vec<(f32, f32)>>),
    Polyline(Rc<Vec<(f32, f32)>>),
    Text {
        x: f32,
        y: f32,
    },
    /// `width` and `height` are `None` for `auto`.
    Textarea {
        x: f32,
        y: f32,
        width: Option<f32>,
        height: Option<f32>,
    },
    Tspan {
        x: Option<f32>,
        y: Option<f32>,
        dx: f32,
        dy: f32,
    },
    TextRun(String),
    TBreak,
    Image {
        rect: NonZeroRect,
        aspect: AspectRatio,
        /// `None` when the image cannot be loaded.
        data: Option<Rc<tiny_skia::Pixmap>>,
    },
    Use {
        x: f32,
        y: f32,
        width: Option<f32>,
        height: Option<f32>,
        href: String,
        /// Set by the reference resolver.
        target: Option<NodeId>,
    },
    Animate(Animation),
}

impl NodeKind {
    /// Checks that the node is a shape with a geometry.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            NodeKind::Rect { .. }
                | NodeKind::Circle { .. }
                | NodeKind::Ellipse { .. }
                | NodeKind::Line { .. }
                | NodeKind::Path(_)
                | NodeKind::Polygon(_)
                | NodeKind::Polyline(_)
        )
    }

    /// Checks that markers can be applied to the node.
    pub fn can_have_markers(&self) -> bool {
        matches!(
            self,
            NodeKind::Line { .. }
                | NodeKind::Path(_)
                | NodeKind::Polygon(_)
                | NodeKind::Polyline(_)
        )
    }
}

/// A node data.
#[derive(Clone, Debug)]
pub struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) attrs: CommonAttrs,
    pub(crate) style: StyleSlots,
}

impl NodeData {
    /// Returns node's parent.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns node's children in the document order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns node's kind.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns node's common attributes.
    #[inline]
    pub fn attributes(&self) -> &CommonAttrs {
        &self.attrs
    }

    /// Returns node's style slots.
    #[inline]
    pub fn style(&self) -> &StyleSlots {
        &self.style
    }
}

/// An SVG font glyph.
#[derive(Clone, Debug)]
pub struct Glyph {
    /// Glyph outline in font units, with the Y axis pointing up.
    pub path: Option<Rc<tiny_skia::Path>>,
    /// Advance in font units.
    pub horiz_adv_x: f32,
}

/// An SVG font.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct SvgFont {
    pub family: String,
    pub units_per_em: f32,
    pub horiz_adv_x: f32,
    pub ascent: f32,
    pub descent: f32,
    pub glyphs: HashMap<char, Glyph>,
    pub missing_glyph: Option<Glyph>,
}

impl SvgFont {
    /// Returns a glyph for a character or the missing glyph.
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c).or(self.missing_glyph.as_ref())
    }
}

/// A linear or radial gradient before `href` resolution.
///
/// Lengths are kept unresolved, because their meaning depends on
/// the final `gradientUnits`.
#[derive(Clone, Debug)]
pub(crate) struct GradientDef {
    pub id: String,
    pub linear: bool,
    pub x1: Option<vgtypes::Length>,
    pub y1: Option<vgtypes::Length>,
    pub x2: Option<vgtypes::Length>,
    pub y2: Option<vgtypes::Length>,
    pub cx: Option<vgtypes::Length>,
    pub cy: Option<vgtypes::Length>,
    pub r: Option<vgtypes::Length>,
    pub fx: Option<vgtypes::Length>,
    pub fy: Option<vgtypes::Length>,
    pub units: Option<Units>,
    pub transform: Option<tiny_skia::Transform>,
    pub spread: Option<SpreadMethod>,
    pub stops: Vec<Stop>,
    pub href: Option<String>,
    /// A view box for user space percentages.
    pub view_box: NonZeroRect,
    pub font_size: f32,
}

/// An SVG document.
///
/// Immutable after loading. Can be rendered any number of times.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) ids: HashMap<String, NodeId>,
    pub(crate) paint_styles: HashMap<String, PaintStyle>,
    pub(crate) fonts: HashMap<String, Rc<SvgFont>>,
    pub(crate) gradient_defs: Vec<GradientDef>,
    pub(crate) size: Size,
    pub(crate) view_box: NonZeroRect,
    pub(crate) explicit_view_box: bool,
    pub(crate) aspect: AspectRatio,
    pub(crate) options: Options,
}

impl Document {
    pub(crate) fn new(options: Options, size: Size, view_box: NonZeroRect) -> Self {
        Document {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
                attrs: CommonAttrs {
                    display: true,
                    ..CommonAttrs::default()
                },
                style: StyleSlots::default(),
            }],
            ids: HashMap::new(),
            paint_styles: HashMap::new(),
            fonts: HashMap::new(),
            gradient_defs: Vec::new(),
            size,
            view_box,
            explicit_view_box: false,
            aspect: AspectRatio::default(),
            options,
        }
    }

    /// Returns the invisible root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Returns the root `svg` element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.node(self.root()).children.first().copied()
    }

    /// Returns node's data.
    ///
    /// # Panics
    ///
    /// When `id` belongs to another document.
    #[inline]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    /// Returns the total number of nodes.
    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the document size in user units.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Returns the document view box.
    ///
    /// Equals to the document size when `viewBox` is not set.
    pub fn view_box(&self) -> NonZeroRect {
        self.view_box
    }

    /// Returns the document loading options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Checks that an element with the given ID exists.
    pub fn element_exists(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Returns the first element with the given ID.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Returns a paint server by ID.
    pub fn paint_style(&self, id: &str) -> Option<&PaintStyle> {
        self.paint_styles.get(id)
    }

    /// Returns an SVG font by family name.
    pub fn font(&self, family: &str) -> Option<&Rc<SvgFont>> {
        self.fonts.get(family)
    }

    /// Returns an iterator over node's ancestors, starting with the node itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns all node's descendants in the document order, starting with the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut list = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            list.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }

        list
    }

    pub(crate) fn append(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        attrs: CommonAttrs,
        style: StyleSlots,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            kind,
            attrs,
            style,
        });
        self.node_mut(parent).children.push(id);
        id
    }
}

/// An iterator over node's ancestors.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.doc.node(id).parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id() {
        assert_eq!(NodeId::new(0).index(), 0);
        assert_eq!(NodeId::new(41).index(), 41);
    }

    #[test]
    fn tree_walk() {
        let vb = NonZeroRect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
        let mut doc = Document::new(Options::default(), vb.size(), vb);
        let root = doc.root();
        let g = doc.append(root, NodeKind::Group, CommonAttrs::default(), StyleSlots::default());
        let a = doc.append(g, NodeKind::Defs, CommonAttrs::default(), StyleSlots::default());
        let b = doc.append(root, NodeKind::Switch, CommonAttrs::default(), StyleSlots::default());

        assert_eq!(doc.descendants(root), vec![root, g, a, b]);
        assert_eq!(doc.ancestors(a).collect::<Vec<_>>(), vec![a, g, root]);
        assert_eq!(doc.root_element(), Some(g));
    }
}
