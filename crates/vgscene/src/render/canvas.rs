// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use tiny_skia::{IntSize, NonZeroRect, Path, PathBuilder, Pixmap, Point, Rect, Transform};

use crate::tree::{CompositeMode, FillRule, LineCap, LineJoin, SpreadMethod};

/// A gradient color stop with a final alpha.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct GradientStop {
    pub offset: f32,
    pub color: tiny_skia::Color,
}

/// A fill or stroke source.
///
/// Coordinates and transforms are in the user space of the shape being drawn.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum Brush {
    Color(tiny_skia::Color),
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
        spread: SpreadMethod,
        transform: Transform,
    },
    RadialGradient {
        center: Point,
        focal: Point,
        radius: f32,
        stops: Vec<GradientStop>,
        spread: SpreadMethod,
        transform: Transform,
    },
    /// A repeated premultiplied image.
    Pattern {
        image: Rc<Pixmap>,
        transform: Transform,
    },
}

/// Stroke properties.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct Pen {
    pub brush: Brush,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Dash lengths and an offset. Always an even, non-empty list.
    pub dash: Option<(Vec<f32>, f32)>,
    /// The width is in device pixels, independent of the transform.
    pub cosmetic: bool,
}

/// Quality hints.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RenderHints {
    /// Anti-alias shapes.
    pub antialiasing: bool,
    /// Use smooth image scaling.
    pub smooth_images: bool,
}

impl Default for RenderHints {
    fn default() -> Self {
        RenderHints {
            antialiasing: true,
            smooth_images: true,
        }
    }
}

/// A font request passed to [`Canvas::draw_text`].
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct FontQuery<'a> {
    pub families: &'a [String],
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

/// A 2-D drawing surface.
///
/// The canvas keeps a current transform, a brush, a pen, an opacity,
/// a composite mode and a clip. All of them are saved and restored
/// by `save`/`restore`.
///
/// Offscreen layers are device-space premultiplied RGBA pixmaps.
pub trait Canvas {
    /// Returns the surface size in pixels.
    fn device_size(&self) -> IntSize;

    /// Returns the current user to device transform.
    fn transform(&self) -> Transform;

    /// Sets the current user to device transform.
    fn set_transform(&mut self, ts: Transform);

    /// Pushes the current state.
    fn save(&mut self);

    /// Pops a previously saved state.
    fn restore(&mut self);

    /// Sets a fill source. `None` disables filling.
    fn set_brush(&mut self, brush: Option<Brush>);

    /// Sets stroke properties. `None` disables stroking.
    fn set_pen(&mut self, pen: Option<Pen>);

    /// Sets an opacity applied to everything drawn afterwards.
    fn set_opacity(&mut self, opacity: f32);

    /// Sets a composite mode.
    fn set_composite_mode(&mut self, mode: CompositeMode);

    /// Sets quality hints.
    fn set_render_hints(&mut self, hints: RenderHints);

    /// Intersects the clip with a rect in the current user space.
    fn set_clip_rect(&mut self, rect: Rect);

    /// Fills and strokes a path with the current brush and pen.
    fn draw_path(&mut self, path: &Path, rule: FillRule);

    /// Draws a rect.
    fn draw_rect(&mut self, rect: Rect) {
        self.draw_path(&PathBuilder::from_rect(rect), FillRule::NonZero);
    }

    /// Draws an ellipse.
    fn draw_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        if let Some(path) = crate::path::ellipse_to_path(cx, cy, rx, ry) {
            self.draw_path(&path, FillRule::NonZero);
        }
    }

    /// Draws a closed polygon.
    fn draw_polygon(&mut self, points: &[(f32, f32)], rule: FillRule) {
        if let Some(path) = crate::path::points_to_path(points, true) {
            self.draw_path(&path, rule);
        }
    }

    /// Draws an open polyline. The brush fills its implicitly closed area.
    fn draw_polyline(&mut self, points: &[(f32, f32)]) {
        if let Some(path) = crate::path::points_to_path(points, false) {
            self.draw_path(&path, FillRule::NonZero);
        }
    }

    /// Draws a premultiplied image scaled into a rect.
    fn draw_image(&mut self, rect: NonZeroRect, image: &Pixmap);

    /// Draws a text run with a baseline at `(x, y)` using the current brush.
    ///
    /// Returns the run advance or `None` when text rendering is not supported.
    fn draw_text(&mut self, _text: &str, _x: f32, _y: f32, _font: &FontQuery) -> Option<f32> {
        None
    }

    /// Measures a text run advance.
    fn measure_text(&self, _text: &str, _font: &FontQuery) -> Option<f32> {
        None
    }

    /// Allocates a transparent layer of the device size.
    fn new_layer(&self) -> Option<Pixmap> {
        let size = self.device_size();
        Pixmap::new(size.width(), size.height())
    }

    /// Composites a layer in device space, using the current opacity,
    /// composite mode and clip. The transform is ignored.
    fn draw_layer(&mut self, layer: &Pixmap, x: i32, y: i32);
}

#[derive(Clone)]
struct CanvasState {
    transform: Transform,
    brush: Option<Brush>,
    pen: Option<Pen>,
    opacity: f32,
    blend_mode: tiny_skia::BlendMode,
    hints: RenderHints,
    clip: Option<Rc<tiny_skia::Mask>>,
}

impl Default for CanvasState {
    fn default() -> Self {
        CanvasState {
            transform: Transform::identity(),
            brush: None,
            pen: None,
            opacity: 1.0,
            blend_mode: tiny_skia::BlendMode::SourceOver,
            hints: RenderHints::default(),
            clip: None,
        }
    }
}

/// A `tiny-skia` backed canvas.
///
/// Does not support text rendering.
pub struct PixmapCanvas {
    pixmap: Pixmap,
    size: IntSize,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl PixmapCanvas {
    /// Creates a transparent canvas.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(Self::from_pixmap)
    }

    /// Creates a canvas drawing over an existing pixmap.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        // A pixmap is never empty.
        let size = IntSize::from_wh(pixmap.width(), pixmap.height()).unwrap();
        PixmapCanvas {
            pixmap,
            size,
            state: CanvasState::default(),
            stack: Vec::new(),
        }
    }

    /// Returns the underlying pixmap.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Returns the underlying pixmap.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    fn paint<'a>(&self, brush: &'a Brush, extra: Transform) -> Option<tiny_skia::Paint<'a>> {
        let mut paint = tiny_skia::Paint::default();
        paint.shader = to_shader(brush, self.state.opacity, extra, self.state.hints)?;
        paint.anti_alias = self.state.hints.antialiasing;
        paint.blend_mode = self.state.blend_mode;
        Some(paint)
    }
}

fn to_spread_mode(spread: SpreadMethod) -> tiny_skia::SpreadMode {
    match spread {
        SpreadMethod::Pad => tiny_skia::SpreadMode::Pad,
        SpreadMethod::Reflect => tiny_skia::SpreadMode::Reflect,
        SpreadMethod::Repeat => tiny_skia::SpreadMode::Repeat,
    }
}

fn to_stops(stops: &[GradientStop], opacity: f32) -> Vec<tiny_skia::GradientStop> {
    stops
        .iter()
        .map(|stop| {
            let mut color = stop.color;
            color.apply_opacity(opacity);
            tiny_skia::GradientStop::new(stop.offset, color)
        })
        .collect()
}

fn to_shader<'a>(
    brush: &'a Brush,
    opacity: f32,
    extra: Transform,
    hints: RenderHints,
) -> Option<tiny_skia::Shader<'a>> {
    match brush {
        Brush::Color(c) => {
            let mut c = *c;
            c.apply_opacity(opacity);
            Some(tiny_skia::Shader::SolidColor(c))
        }
        Brush::LinearGradient {
            start,
            end,
            stops,
            spread,
            transform,
        } => tiny_skia::LinearGradient::new(
            *start,
            *end,
            to_stops(stops, opacity),
            to_spread_mode(*spread),
            extra.pre_concat(*transform),
        ),
        Brush::RadialGradient {
            center,
            focal,
            radius,
            stops,
            spread,
            transform,
        } => tiny_skia::RadialGradient::new(
            *focal,
            *center,
            *radius,
            to_stops(stops, opacity),
            to_spread_mode(*spread),
            extra.pre_concat(*transform),
        ),
        Brush::Pattern { image, transform } => {
            let quality = if hints.smooth_images {
                tiny_skia::FilterQuality::Bicubic
            } else {
                tiny_skia::FilterQuality::Nearest
            };

            Some(tiny_skia::Pattern::new(
                Pixmap::as_ref(image),
                tiny_skia::SpreadMode::Repeat,
                quality,
                opacity,
                extra.pre_concat(*transform),
            ))
        }
    }
}

pub(crate) fn to_blend_mode(mode: CompositeMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode;

    match mode {
        CompositeMode::Clear => BlendMode::Clear,
        CompositeMode::Source => BlendMode::Source,
        CompositeMode::Destination => BlendMode::Destination,
        CompositeMode::SourceOver => BlendMode::SourceOver,
        CompositeMode::DestinationOver => BlendMode::DestinationOver,
        CompositeMode::SourceIn => BlendMode::SourceIn,
        CompositeMode::DestinationIn => BlendMode::DestinationIn,
        CompositeMode::SourceOut => BlendMode::SourceOut,
        CompositeMode::DestinationOut => BlendMode::DestinationOut,
        CompositeMode::SourceAtop => BlendMode::SourceAtop,
        CompositeMode::DestinationAtop => BlendMode::DestinationAtop,
        CompositeMode::Xor => BlendMode::Xor,
        CompositeMode::Plus => BlendMode::Plus,
        CompositeMode::Multiply => BlendMode::Multiply,
        CompositeMode::Screen => BlendMode::Screen,
        CompositeMode::Overlay => BlendMode::Overlay,
        CompositeMode::Darken => BlendMode::Darken,
        CompositeMode::Lighten => BlendMode::Lighten,
        CompositeMode::ColorDodge => BlendMode::ColorDodge,
        CompositeMode::ColorBurn => BlendMode::ColorBurn,
        CompositeMode::HardLight => BlendMode::HardLight,
        CompositeMode::SoftLight => BlendMode::SoftLight,
        CompositeMode::Difference => BlendMode::Difference,
        CompositeMode::Exclusion => BlendMode::Exclusion,
        CompositeMode::Hue => BlendMode::Hue,
        CompositeMode::Saturation => BlendMode::Saturation,
        CompositeMode::Color => BlendMode::Color,
        CompositeMode::Luminosity => BlendMode::Luminosity,
    }
}

fn to_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

fn to_stroke(pen: &Pen) -> tiny_skia::Stroke {
    let mut stroke = tiny_skia::Stroke {
        width: pen.width,
        miter_limit: pen.miter_limit,
        line_cap: match pen.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match pen.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash: None,
    };

    if let Some((ref list, offset)) = pen.dash {
        stroke.dash = tiny_skia::StrokeDash::new(list.clone(), offset);
    }

    stroke
}

impl Canvas for PixmapCanvas {
    fn device_size(&self) -> IntSize {
        self.size
    }

    fn transform(&self) -> Transform {
        self.state.transform
    }

    fn set_transform(&mut self, ts: Transform) {
        self.state.transform = ts;
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_brush(&mut self, brush: Option<Brush>) {
        self.state.brush = brush;
    }

    fn set_pen(&mut self, pen: Option<Pen>) {
        self.state.pen = pen;
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.state.opacity = opacity.clamp(0.0, 1.0);
    }

    fn set_composite_mode(&mut self, mode: CompositeMode) {
        self.state.blend_mode = to_blend_mode(mode);
    }

    fn set_render_hints(&mut self, hints: RenderHints) {
        self.state.hints = hints;
    }

    fn set_clip_rect(&mut self, rect: Rect) {
        let path = PathBuilder::from_rect(rect);
        let anti_alias = self.state.hints.antialiasing;
        let mask = match self.state.clip {
            Some(ref clip) => {
                let mut mask = (**clip).clone();
                let ts = self.state.transform;
                mask.intersect_path(&path, tiny_skia::FillRule::Winding, anti_alias, ts);
                mask
            }
            None => {
                let size = self.device_size();
                let mut mask = match tiny_skia::Mask::new(size.width(), size.height()) {
                    Some(mask) => mask,
                    None => return,
                };
                let ts = self.state.transform;
                mask.fill_path(&path, tiny_skia::FillRule::Winding, anti_alias, ts);
                mask
            }
        };

        self.state.clip = Some(Rc::new(mask));
    }

    fn draw_path(&mut self, path: &Path, rule: FillRule) {
        let clip = self.state.clip.clone();
        let clip = clip.as_deref();

        if let Some(ref brush) = self.state.brush {
            // Horizontal and vertical lines cannot be filled.
            let bounds = path.bounds();
            if bounds.width() > 0.0 && bounds.height() > 0.0 {
                if let Some(paint) = self.paint(brush, Transform::identity()) {
                    let ts = self.state.transform;
                    self.pixmap.fill_path(path, &paint, to_fill_rule(rule), ts, clip);
                }
            }
        }

        if let Some(ref pen) = self.state.pen {
            let stroke = to_stroke(pen);
            if pen.cosmetic {
                // Stroke in device space.
                let ts = self.state.transform;
                let path = path.clone().transform(ts);
                if let (Some(path), Some(paint)) = (path, self.paint(&pen.brush, ts)) {
                    self.pixmap
                        .stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
                }
            } else if let Some(paint) = self.paint(&pen.brush, Transform::identity()) {
                self.pixmap.stroke_path(path, &paint, &stroke, self.state.transform, clip);
            }
        }
    }

    fn draw_image(&mut self, rect: NonZeroRect, image: &Pixmap) {
        let quality = if self.state.hints.smooth_images {
            tiny_skia::FilterQuality::Bicubic
        } else {
            tiny_skia::FilterQuality::Nearest
        };

        let ts = Transform::from_row(
            rect.width() / image.width() as f32,
            0.0,
            0.0,
            rect.height() / image.height() as f32,
            rect.x(),
            rect.y(),
        );

        let mut paint = tiny_skia::Paint::default();
        paint.shader = tiny_skia::Pattern::new(
            image.as_ref(),
            tiny_skia::SpreadMode::Pad,
            quality,
            self.state.opacity,
            ts,
        );
        paint.blend_mode = self.state.blend_mode;

        let clip = self.state.clip.clone();
        self.pixmap
            .fill_rect(rect.to_rect(), &paint, self.state.transform, clip.as_deref());
    }

    fn draw_layer(&mut self, layer: &Pixmap, x: i32, y: i32) {
        let paint = tiny_skia::PixmapPaint {
            opacity: self.state.opacity,
            blend_mode: self.state.blend_mode,
            quality: tiny_skia::FilterQuality::Nearest,
        };

        let clip = self.state.clip.clone();
        self.pixmap.draw_pixmap(
            x,
            y,
            layer.as_ref(),
            &paint,
            Transform::identity(),
            clip.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Brush {
        Brush::Color(tiny_skia::Color::from_rgba8(255, 0, 0, 255))
    }

    #[test]
    fn fill_rect() {
        let mut canvas = PixmapCanvas::new(10, 10).unwrap();
        canvas.set_brush(Some(red()));
        canvas.draw_rect(Rect::from_xywh(0.0, 0.0, 5.0, 10.0).unwrap());

        let pixmap = canvas.pixmap();
        assert_eq!(pixmap.pixel(2, 5).unwrap().red(), 255);
        assert_eq!(pixmap.pixel(7, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn save_restore() {
        let mut canvas = PixmapCanvas::new(10, 10).unwrap();
        canvas.save();
        canvas.set_transform(Transform::from_scale(2.0, 2.0));
        canvas.set_opacity(0.5);
        canvas.restore();

        assert_eq!(canvas.transform(), Transform::identity());
        canvas.restore();
        assert_eq!(canvas.transform(), Transform::identity());
    }

    #[test]
    fn clip_rect() {
        let mut canvas = PixmapCanvas::new(10, 10).unwrap();
        canvas.set_clip_rect(Rect::from_xywh(0.0, 0.0, 4.0, 10.0).unwrap());
        canvas.set_clip_rect(Rect::from_xywh(2.0, 0.0, 8.0, 10.0).unwrap());
        canvas.set_brush(Some(red()));
        canvas.draw_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap());

        let pixmap = canvas.pixmap();
        assert_eq!(pixmap.pixel(1, 5).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(3, 5).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(6, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn layer() {
        let mut layer = Pixmap::new(2, 2).unwrap();
        layer.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));

        let mut canvas = PixmapCanvas::new(4, 4).unwrap();
        canvas.draw_layer(&layer, 2, 2);
        assert_eq!(canvas.pixmap().pixel(3, 3).unwrap().blue(), 255);
        assert_eq!(canvas.pixmap().pixel(1, 1).unwrap().alpha(), 0);
    }
}
