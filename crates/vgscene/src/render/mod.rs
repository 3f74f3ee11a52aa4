// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Document rendering onto a [`Canvas`].

mod canvas;
mod marker;
mod mask;
mod paint_server;
mod text;

pub use canvas::{Brush, Canvas, FontQuery, GradientStop, Pen, PixmapCanvas, RenderHints};

use std::rc::Rc;

use tiny_skia::{NonZeroRect, Pixmap, Rect, Size, Transform};

use crate::animation::{AnimatedTransform, AnimatedValue};
use crate::tree::{
    AspectRatio, Color, CommonAttrs, CompositeMode, Document, FillRule, FontStyle, ImageRendering,
    LineCap, LineJoin, NodeId, NodeKind, Paint, ShapeRendering, TextAnchor, Units,
};
use crate::{filter, geom, path};

/// `requiredFeatures` values we can render.
const SUPPORTED_FEATURES: &[&str] = &[
    "SVG",
    "SVG-static",
    "CoreAttribute",
    "Structure",
    "BasicStructure",
    "ContainerAttribute",
    "ConditionalProcessing",
    "Image",
    "Style",
    "ViewportAttribute",
    "Shape",
    "Text",
    "BasicText",
    "PaintAttribute",
    "BasicPaintAttribute",
    "OpacityAttribute",
    "GraphicsAttribute",
    "BasicGraphicsAttribute",
    "Marker",
    "Gradient",
    "Pattern",
    "Mask",
    "BasicFilter",
    "XlinkAttribute",
    "Font",
    "BasicFont",
    "Hyperlinking",
];

const FEATURE_PREFIX: &str = "http://www.w3.org/TR/SVG11/feature#";

/// Nodes nested deeper than this, `use` targets included, are not rendered.
///
/// Keeps the render recursion within a default thread stack
/// even in debug builds.
const MAX_RENDER_DEPTH: u32 = 1024;

pub(crate) struct Context<'a> {
    pub doc: &'a Document,
    /// Animation time in seconds.
    pub elapsed: f64,
    /// Nodes rendered through a link: `use` targets, masks, patterns and markers.
    pub active: Vec<NodeId>,
    /// Number of nested `use` expansions since the top-level `use`.
    pub use_count: u32,
    /// A viewport size passed from a `use` to its `svg` or `symbol` target.
    use_viewport: Option<(Option<f32>, Option<f32>)>,
    /// Current node nesting during rendering or bbox calculation.
    depth: u32,
    depth_warned: bool,
}

impl<'a> Context<'a> {
    pub fn new(doc: &'a Document, elapsed: f64) -> Self {
        Context {
            doc,
            elapsed,
            active: Vec::new(),
            use_count: 0,
            use_viewport: None,
            depth: 0,
            depth_warned: false,
        }
    }

    /// Enters a nested node. Returns `false` when the nesting is too deep.
    ///
    /// Each successful call must be paired with [`Context::leave`].
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_RENDER_DEPTH {
            if !self.depth_warned {
                log::warn!("Elements are nested too deep. Skipped.");
                self.depth_warned = true;
            }

            return false;
        }

        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn max_layer_size(&self) -> u64 {
        self.doc.options().max_layer_size
    }
}

/// Small per-node properties that are cheap to copy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ExtraStates {
    pub fill_opacity: f32,
    pub stroke_opacity: f32,
    pub fill_rule: FillRule,
    pub dash_offset: f32,
    pub text_anchor: TextAnchor,
    pub font_weight: u16,
    pub cosmetic_stroke: bool,
    pub nested_use_level: u32,
    pub in_use: bool,
    pub image_rendering: ImageRendering,
}

impl Default for ExtraStates {
    fn default() -> Self {
        ExtraStates {
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            dash_offset: 0.0,
            text_anchor: TextAnchor::Start,
            font_weight: 400,
            cosmetic_stroke: false,
            nested_use_level: 0,
            in_use: false,
            image_rendering: ImageRendering::OptimizeQuality,
        }
    }
}

/// Resolved style of the node being rendered.
///
/// Created from the parent state for each node and dropped afterwards.
#[derive(Clone, Debug)]
pub(crate) struct RenderState {
    /// User space to device.
    pub transform: Transform,
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dasharray: Option<Rc<Vec<f32>>>,
    pub font_families: Rc<Vec<String>>,
    pub font_size: f32,
    pub font_style: FontStyle,
    pub opacity: f32,
    pub composite: CompositeMode,
    pub shape_rendering: ShapeRendering,
    /// `currentColor`
    pub color: Color,
    pub visible: bool,
    pub extra: ExtraStates,
}

impl RenderState {
    pub fn new(doc: &Document, transform: Transform) -> Self {
        let opt = doc.options();
        RenderState {
            transform,
            fill: Paint::Color(Color::black()),
            stroke: Paint::None,
            stroke_width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dasharray: None,
            font_families: Rc::new(vec![opt.font_family.clone()]),
            font_size: opt.font_size,
            font_style: FontStyle::Normal,
            opacity: 1.0,
            composite: CompositeMode::SourceOver,
            shape_rendering: ShapeRendering::GeometricPrecision,
            color: Color::black(),
            visible: true,
            extra: ExtraStates::default(),
        }
    }

    fn hints(&self) -> RenderHints {
        RenderHints {
            antialiasing: self.shape_rendering.use_shape_antialiasing(),
            smooth_images: self.extra.image_rendering == ImageRendering::OptimizeQuality,
        }
    }

    /// Prepares the canvas for drawing the current node.
    fn setup_canvas(&self, canvas: &mut dyn Canvas) {
        canvas.set_transform(self.transform);
        canvas.set_composite_mode(self.composite);
        canvas.set_render_hints(self.hints());
    }
}

/// Computes a node style on top of the parent one.
///
/// Animations are evaluated first and override the static values.
pub(crate) fn apply_style(ctx: &Context, id: NodeId, parent: &RenderState) -> RenderState {
    let node = ctx.doc.node(id);
    let style = node.style();
    let mut state = parent.clone();

    let mut anim_fill = None;
    let mut anim_stroke = None;
    let mut anim_opacity = None;
    let mut anim_ts: Option<AnimatedTransform> = None;
    for &child in node.children() {
        if let NodeKind::Animate(animation) = ctx.doc.node(child).kind() {
            match animation.value_at(ctx.elapsed) {
                Some(AnimatedValue::Fill(c)) => anim_fill = Some(c),
                Some(AnimatedValue::Stroke(c)) => anim_stroke = Some(c),
                Some(AnimatedValue::Opacity(n)) => anim_opacity = Some(n),
                Some(AnimatedValue::Transform(kind, value)) => {
                    anim_ts
                        .get_or_insert_with(AnimatedTransform::default)
                        .push(kind, value, animation.additive);
                }
                None => {}
            }
        }
    }

    if let Some(c) = style.color {
        state.color = c;
    }

    let fill = anim_fill.map(Paint::Color).or_else(|| style.fill.paint.clone());
    if let Some(paint) = fill {
        state.fill = resolve_current_color(paint, state.color);
    }
    if let Some(n) = style.fill.opacity {
        state.extra.fill_opacity = n;
    }
    if let Some(rule) = style.fill.rule {
        state.extra.fill_rule = rule;
    }

    let stroke = anim_stroke.map(Paint::Color).or_else(|| style.stroke.paint.clone());
    if let Some(paint) = stroke {
        state.stroke = resolve_current_color(paint, state.color);
    }
    let s = &style.stroke;
    if let Some(n) = s.width {
        state.stroke_width = n;
    }
    if let Some(n) = s.opacity {
        state.extra.stroke_opacity = n;
    }
    if let Some(cap) = s.cap {
        state.cap = cap;
    }
    if let Some(join) = s.join {
        state.join = join;
    }
    if let Some(n) = s.miter_limit {
        state.miter_limit = n;
    }
    if let Some(ref list) = s.dasharray {
        state.dasharray = if list.is_empty() {
            None
        } else {
            Some(list.clone())
        };
    }
    if let Some(n) = s.dashoffset {
        state.extra.dash_offset = n;
    }
    if let Some(flag) = s.cosmetic {
        state.extra.cosmetic_stroke = flag;
    }

    let f = &style.font;
    if let Some(ref families) = f.families {
        state.font_families = families.clone();
    }
    if let Some(n) = f.size {
        state.font_size = n;
    }
    if let Some(font_style) = f.style {
        state.font_style = font_style;
    }
    if let Some(weight) = f.weight {
        state.extra.font_weight = weight.resolve(parent.extra.font_weight);
    }
    if let Some(anchor) = f.anchor {
        state.extra.text_anchor = anchor;
    }

    let own_ts = style.transform.unwrap_or_default();
    let local_ts = match anim_ts {
        Some(anim) if anim.replace => anim.to_transform(),
        Some(anim) => own_ts.pre_concat(anim.to_transform()),
        None => own_ts,
    };
    state.transform = parent.transform.pre_concat(local_ts);

    state.opacity = parent.opacity * anim_opacity.or(style.opacity).unwrap_or(1.0);

    if let Some(mode) = style.composite {
        state.composite = mode;
    }
    if let Some(mode) = style.image_rendering {
        state.extra.image_rendering = mode;
    }
    if let Some(mode) = style.shape_rendering {
        state.shape_rendering = mode;
    }
    if let Some(flag) = node.attributes().visibility {
        state.visible = flag;
    }

    state
}

fn resolve_current_color(paint: Paint, color: Color) -> Paint {
    match paint {
        Paint::CurrentColor => Paint::Color(color),
        _ => paint,
    }
}

/// Checks that a node is drawn by the regular traversal.
fn is_rendered_kind(kind: &NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::Document
            | NodeKind::Defs
            | NodeKind::Mask { .. }
            | NodeKind::Filter { .. }
            | NodeKind::FilterPrimitive { .. }
            | NodeKind::MergeNode { .. }
            | NodeKind::Pattern { .. }
            | NodeKind::Marker { .. }
            | NodeKind::Animate(_)
            | NodeKind::TextRun(_)
            | NodeKind::TBreak
            | NodeKind::Tspan { .. }
    )
}

pub(crate) fn render_children(
    ctx: &mut Context,
    id: NodeId,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) {
    for &child in ctx.doc.node(id).children() {
        render_node(ctx, child, state, canvas);
    }
}

pub(crate) fn render_node(
    ctx: &mut Context,
    id: NodeId,
    parent: &RenderState,
    canvas: &mut dyn Canvas,
) {
    if ctx.enter() {
        render_node_impl(ctx, id, parent, canvas);
        ctx.leave();
    }
}

fn render_node_impl(ctx: &mut Context, id: NodeId, parent: &RenderState, canvas: &mut dyn Canvas) {
    let doc = ctx.doc;
    let node = doc.node(id);
    let kind = node.kind();

    if !is_rendered_kind(kind) {
        return;
    }

    // Symbols are drawn only as a `use` target.
    let is_use_target = parent.extra.in_use && ctx.use_viewport.is_some();
    if matches!(kind, NodeKind::Symbol { .. }) && !is_use_target {
        return;
    }

    if !node.attributes().display {
        return;
    }

    let state = apply_style(ctx, id, parent);

    let is_leaf = kind.is_shape() || matches!(kind, NodeKind::Image { .. });
    if is_leaf && !state.visible {
        return;
    }

    if kind.is_shape() && !fits_max_shape_size(ctx, kind, &state) {
        log::warn!(
            "Element '{}' is too large to render. Skipped.",
            node.attributes().id
        );
        return;
    }

    let attrs = node.attributes();
    if let Some(filter_id) = resolve_link(ctx, attrs.filter.as_deref()) {
        if let NodeKind::Filter {
            supported: true, ..
        } = doc.node(filter_id).kind()
        {
            if render_filtered(ctx, id, filter_id, &state, canvas) {
                return;
            }
        }
    }

    render_masked(ctx, id, &state, canvas);
}

fn resolve_link(ctx: &Context, link: Option<&str>) -> Option<NodeId> {
    ctx.doc.element_by_id(link?)
}

fn fits_max_shape_size(ctx: &Context, kind: &NodeKind, state: &RenderState) -> bool {
    let max = ctx.doc.options().max_shape_size;
    let bbox = path::shape_to_path(kind)
        .and_then(|path| path::transformed_path_bbox(&path, state.transform));

    match bbox {
        Some(r) => r.width() <= max && r.height() <= max,
        None => true,
    }
}

/// Creates a device-sized layer.
fn new_layer(ctx: &Context, canvas: &dyn Canvas) -> Option<PixmapCanvas> {
    let size = canvas.device_size();
    if size.width() as u64 * size.height() as u64 > ctx.max_layer_size() {
        log::warn!("Layer of {}x{} is too large. Skipped.", size.width(), size.height());
        return None;
    }

    canvas.new_layer().map(PixmapCanvas::from_pixmap)
}

/// Composites a layer onto the canvas using the node composite mode.
fn draw_layer(state: &RenderState, layer: &Pixmap, x: i32, y: i32, canvas: &mut dyn Canvas) {
    canvas.save();
    canvas.set_opacity(1.0);
    canvas.set_composite_mode(state.composite);
    canvas.draw_layer(layer, x, y);
    canvas.restore();
}

/// Renders a node through a mask, if it has one.
fn render_masked(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let mask_id = match resolve_link(ctx, ctx.doc.node(id).attributes().mask.as_deref()) {
        Some(mask_id) if ctx.active.contains(&mask_id) => {
            log::debug!("Recursive mask detected. Drawing without a mask.");
            None
        }
        mask_id => mask_id,
    };

    let mask_id = match mask_id {
        Some(v) => v,
        None => {
            render_direct(ctx, id, state, canvas);
            return;
        }
    };

    let mut layer = match new_layer(ctx, canvas) {
        Some(v) => v,
        None => return,
    };

    let mut layer_state = state.clone();
    layer_state.composite = CompositeMode::SourceOver;
    render_direct(ctx, id, &layer_state, &mut layer);

    let bbox = node_bbox(ctx, id).and_then(|r| r.to_non_zero_rect());
    let mut pixmap = layer.into_pixmap();
    mask::apply(ctx, mask_id, bbox, state.transform, &mut pixmap);
    draw_layer(state, &pixmap, 0, 0, canvas);
}

/// Renders a node through a filter.
///
/// Returns `false` when the node should be drawn unfiltered.
fn render_filtered(
    ctx: &mut Context,
    id: NodeId,
    filter_id: NodeId,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) -> bool {
    let (rect, units) = match ctx.doc.node(filter_id).kind() {
        NodeKind::Filter { rect, units, .. } => (*rect, *units),
        _ => return false,
    };

    let bbox = node_bbox(ctx, id).and_then(|r| r.to_non_zero_rect());
    let region = match units {
        Units::ObjectBoundingBox => match bbox {
            Some(bbox) => geom::bbox_transform(rect, bbox),
            // Filters on zero-sized elements produce nothing.
            None => return true,
        },
        Units::UserSpaceOnUse => Some(rect),
    };

    let device = canvas.device_size().to_int_rect(0, 0);
    let region = region
        .and_then(|r| geom::transform_rect(r.to_rect(), state.transform))
        .and_then(|r| r.round_out())
        .and_then(|r| r.intersect(&device));
    let region = match region {
        Some(v) => v,
        None => return true,
    };

    if region.width() as u64 * region.height() as u64 > ctx.max_layer_size() {
        log::warn!(
            "Filter '{}' region is too large. Rendering without a filter.",
            ctx.doc.node(filter_id).attributes().id
        );
        return false;
    }

    let mut layer = match PixmapCanvas::new(region.width(), region.height()) {
        Some(v) => v,
        None => return false,
    };

    let shift = Transform::from_translate(-region.x() as f32, -region.y() as f32);
    let mut layer_state = state.clone();
    layer_state.transform = shift.pre_concat(state.transform);
    layer_state.composite = CompositeMode::SourceOver;
    render_direct(ctx, id, &layer_state, &mut layer);

    let mut pixmap = layer.into_pixmap();
    let info = filter::Filter {
        doc: ctx.doc,
        node: filter_id,
        bbox,
        transform: layer_state.transform,
    };
    filter::apply(&info, &mut pixmap);

    let mask_id = resolve_link(ctx, ctx.doc.node(id).attributes().mask.as_deref());
    if let Some(mask_id) = mask_id {
        mask::apply(ctx, mask_id, bbox, layer_state.transform, &mut pixmap);
    }

    draw_layer(state, &pixmap, region.x(), region.y(), canvas);
    true
}

/// Draws a node without a filter or a mask.
fn render_direct(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let doc = ctx.doc;
    let kind = doc.node(id).kind();
    match kind {
        NodeKind::Group | NodeKind::Document => render_children(ctx, id, state, canvas),
        NodeKind::Switch => render_switch(ctx, id, state, canvas),
        NodeKind::Svg {
            x,
            y,
            width,
            height,
            view_box,
            aspect,
        } => {
            if Some(id) == doc.root_element() {
                render_children(ctx, id, state, canvas);
            } else {
                let (use_w, use_h) = ctx.use_viewport.take().unwrap_or((None, None));
                let w = use_w.or(*width).unwrap_or_else(|| doc.size().width());
                let h = use_h.or(*height).unwrap_or_else(|| doc.size().height());
                let viewport = Viewport {
                    x: *x,
                    y: *y,
                    width: w,
                    height: h,
                    view_box: *view_box,
                    aspect: *aspect,
                };
                render_viewport(ctx, id, &viewport, state, canvas);
            }
        }
        NodeKind::Symbol { view_box, aspect } => {
            let (w, h) = ctx.use_viewport.take().unwrap_or((None, None));
            let viewport = Viewport {
                x: 0.0,
                y: 0.0,
                width: w.unwrap_or_else(|| doc.size().width()),
                height: h.unwrap_or_else(|| doc.size().height()),
                view_box: *view_box,
                aspect: *aspect,
            };
            render_viewport(ctx, id, &viewport, state, canvas);
        }
        NodeKind::Use { .. } => render_use(ctx, id, state, canvas),
        NodeKind::Text { .. } | NodeKind::Textarea { .. } => text::render(ctx, id, state, canvas),
        NodeKind::Image { rect, aspect, data } => {
            if let Some(data) = data {
                render_image(*rect, *aspect, data, state, canvas);
            }
        }
        _ if kind.is_shape() => render_shape(ctx, id, state, canvas),
        _ => {}
    }
}

fn render_switch(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let doc = ctx.doc;
    let child = doc.node(id).children().iter().copied().find(|child| {
        let node = doc.node(*child);
        is_rendered_kind(node.kind()) && passes_conditions(ctx, node.attributes())
    });

    if let Some(child) = child {
        render_node(ctx, child, state, canvas);
    }
}

/// Evaluates conditional processing attributes.
fn passes_conditions(ctx: &Context, attrs: &CommonAttrs) -> bool {
    if let Some(ref features) = attrs.required_features {
        if features.is_empty() {
            return false;
        }

        let supported = features.iter().all(|feature| {
            feature
                .strip_prefix(FEATURE_PREFIX)
                .map(|name| SUPPORTED_FEATURES.contains(&name))
                .unwrap_or(false)
        });

        if !supported {
            return false;
        }
    }

    // We do not support any extensions, formats or font checks.
    if attrs.required_extensions.is_some()
        || attrs.required_formats.is_some()
        || attrs.required_fonts.is_some()
    {
        return false;
    }

    if let Some(ref languages) = attrs.system_language {
        let opt_languages = &ctx.doc.options().languages;
        let matched = languages.iter().any(|lang| {
            opt_languages
                .iter()
                .any(|opt_lang| lang.starts_with(opt_lang.as_str()))
        });

        if !matched {
            return false;
        }
    }

    true
}

fn render_use(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let doc = ctx.doc;
    let (x, y, width, height, target) = match doc.node(id).kind() {
        NodeKind::Use {
            x,
            y,
            width,
            height,
            target,
            ..
        } => (*x, *y, *width, *height, *target),
        _ => return,
    };

    let target = match target {
        Some(v) => v,
        None => return,
    };

    if ctx.active.contains(&target) || doc.ancestors(id).any(|n| n == target) {
        log::debug!("Recursive 'use' detected. Skipped.");
        return;
    }

    let level = state.extra.nested_use_level;
    if level > 3 && ctx.use_count > 256 + 2 * level {
        log::debug!("'use' expansion limit reached. Skipped.");
        return;
    }

    if level > 0 {
        ctx.use_count += 1;
    }

    let mut use_state = state.clone();
    use_state.transform = state.transform.pre_translate(x, y);
    use_state.extra.nested_use_level += 1;
    use_state.extra.in_use = true;

    if matches!(
        doc.node(target).kind(),
        NodeKind::Svg { .. } | NodeKind::Symbol { .. }
    ) {
        ctx.use_viewport = Some((width, height));
    }

    ctx.active.push(target);
    render_node(ctx, target, &use_state, canvas);
    ctx.active.pop();
    ctx.use_viewport = None;

    if level == 0 {
        ctx.use_count = 0;
    }
}

struct Viewport {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    view_box: Option<NonZeroRect>,
    aspect: AspectRatio,
}

/// Renders a nested `svg` or a `symbol`.
fn render_viewport(
    ctx: &mut Context,
    id: NodeId,
    viewport: &Viewport,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) {
    let size = match Size::from_wh(viewport.width, viewport.height) {
        Some(v) => v,
        None => return,
    };

    let mut inner = state.clone();
    inner.transform = state.transform.pre_translate(viewport.x, viewport.y);

    canvas.save();
    if ctx.doc.node(id).attributes().clip != Some(false) {
        if let Some(rect) = size.to_rect(0.0, 0.0) {
            canvas.set_transform(inner.transform);
            canvas.set_clip_rect(rect);
        }
    }

    if let Some(view_box) = viewport.view_box {
        let ts = geom::view_box_to_transform(view_box, viewport.aspect, size);
        inner.transform = inner.transform.pre_concat(ts);
    }

    render_children(ctx, id, &inner, canvas);
    canvas.restore();
}

fn render_image(
    rect: NonZeroRect,
    aspect: AspectRatio,
    image: &Pixmap,
    state: &RenderState,
    canvas: &mut dyn Canvas,
) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let image_rect = match NonZeroRect::from_xywh(0.0, 0.0, w, h) {
        Some(v) => v,
        None => return,
    };

    let ts = state.transform.pre_translate(rect.x(), rect.y());

    canvas.save();
    state.setup_canvas(canvas);
    canvas.set_opacity(state.opacity);

    if aspect.slice {
        if let Some(clip) = rect.size().to_rect(0.0, 0.0) {
            canvas.set_transform(ts);
            canvas.set_clip_rect(clip);
        }
    }

    let view_ts = geom::view_box_to_transform(image_rect, aspect, rect.size());
    canvas.set_transform(ts.pre_concat(view_ts));
    canvas.draw_image(image_rect, image);
    canvas.restore();
}

fn render_shape(ctx: &mut Context, id: NodeId, state: &RenderState, canvas: &mut dyn Canvas) {
    let doc = ctx.doc;
    let kind = doc.node(id).kind();
    let path = match path::shape_to_path(kind) {
        Some(v) => v,
        None => return,
    };

    let bbox = path::path_bbox(&path).and_then(|r| r.to_non_zero_rect());

    canvas.save();
    state.setup_canvas(canvas);

    if let Some(brush) = paint_server::brush(ctx, &state.fill, state, bbox) {
        canvas.set_brush(Some(brush));
        canvas.set_pen(None);
        canvas.set_opacity(state.opacity * state.extra.fill_opacity);
        draw_geometry(kind, &path, state.extra.fill_rule, canvas);
    }

    if let Some(pen) = make_pen(ctx, state, bbox) {
        canvas.set_transform(state.transform);
        canvas.set_brush(None);
        canvas.set_pen(Some(pen));
        canvas.set_opacity(state.opacity * state.extra.stroke_opacity);
        draw_geometry(kind, &path, state.extra.fill_rule, canvas);
    }

    canvas.restore();

    if kind.can_have_markers() {
        marker::render(ctx, id, &path, state, canvas);
    }
}

pub(crate) fn make_pen(
    ctx: &mut Context,
    state: &RenderState,
    bbox: Option<NonZeroRect>,
) -> Option<Pen> {
    if !(state.stroke_width > 0.0) {
        return None;
    }

    let brush = paint_server::brush(ctx, &state.stroke, state, bbox)?;
    let dash = state
        .dasharray
        .as_ref()
        .map(|list| (list.as_ref().clone(), state.extra.dash_offset));

    Some(Pen {
        brush,
        width: state.stroke_width,
        cap: state.cap,
        join: state.join,
        miter_limit: state.miter_limit,
        dash,
        cosmetic: state.extra.cosmetic_stroke,
    })
}

/// Uses the dedicated canvas primitives where possible.
fn draw_geometry(
    kind: &NodeKind,
    path: &tiny_skia::Path,
    rule: FillRule,
    canvas: &mut dyn Canvas,
) {
    match *kind {
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            rx,
            ry,
        } if rx == 0.0 && ry == 0.0 => match Rect::from_xywh(x, y, width, height) {
            Some(rect) => canvas.draw_rect(rect),
            None => canvas.draw_path(path, rule),
        },
        NodeKind::Circle { cx, cy, r } => canvas.draw_ellipse(cx, cy, r, r),
        NodeKind::Ellipse { cx, cy, rx, ry } => canvas.draw_ellipse(cx, cy, rx, ry),
        NodeKind::Polygon(ref points) => canvas.draw_polygon(points, rule),
        NodeKind::Polyline(ref points) => canvas.draw_polyline(points),
        _ => canvas.draw_path(path, rule),
    }
}

/// Returns a node bounding box in its own coordinates,
/// i.e. without the node transform.
pub(crate) fn node_bbox(ctx: &mut Context, id: NodeId) -> Option<Rect> {
    if !ctx.enter() {
        return None;
    }

    let bbox = node_bbox_impl(ctx, id);
    ctx.leave();
    bbox
}

fn node_bbox_impl(ctx: &mut Context, id: NodeId) -> Option<Rect> {
    let doc = ctx.doc;
    let node = doc.node(id);
    if !node.attributes().display {
        return None;
    }

    match node.kind() {
        kind if kind.is_shape() => path::shape_to_path(kind).and_then(|p| path::path_bbox(&p)),
        NodeKind::Image { rect, .. } => Some(rect.to_rect()),
        NodeKind::Use {
            x,
            y,
            target: Some(target),
            ..
        } => {
            let target = *target;
            let level = ctx.active.len() as u32;
            if ctx.active.contains(&target) || (level > 3 && ctx.use_count > 256 + 2 * level) {
                return None;
            }

            if level > 0 {
                ctx.use_count += 1;
            }

            ctx.active.push(target);
            let bbox = child_bbox(ctx, target, Transform::from_translate(*x, *y));
            ctx.active.pop();

            if ctx.active.is_empty() {
                ctx.use_count = 0;
            }

            bbox
        }
        NodeKind::Group | NodeKind::Switch | NodeKind::Svg { .. } | NodeKind::Symbol { .. } => {
            let mut bbox: Option<Rect> = None;
            for &child in node.children() {
                if let Some(r) = child_bbox(ctx, child, Transform::identity()) {
                    bbox = Some(bbox.map_or(r, |b| geom::union_rect(b, r)));
                }
            }

            bbox
        }
        _ => None,
    }
}

fn child_bbox(ctx: &mut Context, id: NodeId, ts: Transform) -> Option<Rect> {
    let own = ctx.doc.node(id).style().transform.unwrap_or_default();
    let bbox = node_bbox(ctx, id)?;
    geom::transform_rect(bbox, ts.pre_concat(own))
}

impl Document {
    /// Returns element's bounding box in its parent coordinates,
    /// i.e. with its own transform, but without the ancestors' ones.
    ///
    /// Text is not measured, so text elements have no bounds.
    pub fn bounds_on_element(&self, id: &str) -> Option<Rect> {
        let node = self.element_by_id(id)?;
        let mut ctx = Context::new(self, 0.0);
        child_bbox(&mut ctx, node, Transform::identity())
    }

    /// Returns a combined transform of element's ancestors.
    pub fn transform_for_element(&self, id: &str) -> Option<Transform> {
        let node = self.element_by_id(id)?;
        let mut ts = Transform::identity();
        for ancestor in self.ancestors(node).skip(1) {
            if let Some(own) = self.node(ancestor).style().transform {
                ts = own.pre_concat(ts);
            }
        }

        Some(ts)
    }

    /// Renders the document onto a canvas.
    ///
    /// The document view box is mapped onto `target`, which defaults to the
    /// whole canvas. `elapsed` is the animation time in seconds.
    pub fn render(&self, canvas: &mut dyn Canvas, target: Option<Rect>, elapsed: f64) {
        let target = match target.or_else(|| canvas.device_size().to_size().to_rect(0.0, 0.0)) {
            Some(v) => v,
            None => return,
        };

        let size = match Size::from_wh(target.width(), target.height()) {
            Some(v) => v,
            None => return,
        };

        let fit = geom::fit_to_target(
            self.view_box,
            self.aspect,
            self.explicit_view_box,
            self.options.keep_aspect_ratio,
            size,
        );
        let ts = canvas
            .transform()
            .pre_translate(target.x(), target.y())
            .pre_concat(fit);

        let root = match self.root_element() {
            Some(v) => v,
            None => return,
        };

        let mut ctx = Context::new(self, elapsed);
        let state = RenderState::new(self, ts);

        canvas.save();
        render_node(&mut ctx, root, &state, canvas);
        canvas.restore();
    }

    /// Renders a single element, stretching its bounds onto `target`.
    ///
    /// The element inherits the style of its ancestors.
    /// Returns `false` when there is no such element or it has no bounds.
    pub fn render_element(
        &self,
        id: &str,
        canvas: &mut dyn Canvas,
        target: Option<Rect>,
        elapsed: f64,
    ) -> bool {
        let node = match self.element_by_id(id) {
            Some(v) => v,
            None => {
                log::warn!("Element '{}' not found.", id);
                return false;
            }
        };

        let bounds = self
            .bounds_on_element(id)
            .zip(self.transform_for_element(id))
            .and_then(|(bounds, ts)| geom::transform_rect(bounds, ts));
        let bounds = match bounds {
            Some(v) if v.width() > 0.0 && v.height() > 0.0 => v,
            _ => {
                log::warn!("Element '{}' has no bounds.", id);
                return false;
            }
        };

        let target = match target.or_else(|| canvas.device_size().to_size().to_rect(0.0, 0.0)) {
            Some(v) => v,
            None => return false,
        };

        let ts = canvas
            .transform()
            .pre_translate(target.x(), target.y())
            .pre_scale(target.width() / bounds.width(), target.height() / bounds.height())
            .pre_translate(-bounds.x(), -bounds.y());

        let mut ctx = Context::new(self, elapsed);
        let mut state = RenderState::new(self, ts);

        // Inherit the ancestors style, from the root down.
        let mut ancestors: Vec<NodeId> = self.ancestors(node).skip(1).collect();
        ancestors.reverse();
        for ancestor in ancestors {
            state = apply_style(&ctx, ancestor, &state);
        }

        canvas.save();
        render_node(&mut ctx, node, &state, canvas);
        canvas.restore();
        true
    }
}
