// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The filter primitives graph.
//!
//! Raster kernels live in `vgfilters`. This module resolves regions, inputs
//! and coordinates and does the layer blending.

use std::rc::Rc;

use float_cmp::ApproxEqUlps;
use rgb::FromSlice;
use tiny_skia::{IntRect, NonZeroRect, Pixmap, Transform};
use vgfilters::{ImageRef, ImageRefMut};

use crate::geom;
use crate::tree::{
    ColorMatrixKind, CompositeOperator, Coord, Document, Input, NodeId, NodeKind, PrimitiveKind,
    Subregion, Units,
};

#[derive(Debug)]
pub(crate) enum Error {
    InvalidRegion,
    AllocFailed,
}

/// A filter applied to a single element.
pub(crate) struct Filter<'a> {
    pub doc: &'a Document,
    pub node: NodeId,
    /// Element's bounding box in user space.
    pub bbox: Option<NonZeroRect>,
    /// Maps user space onto the source pixmap.
    pub transform: Transform,
}

/// Applies a filter to `source` in place.
///
/// `source` must cover the whole filter region.
/// An invalid region clears the source. A failed allocation leaves it untouched.
pub(crate) fn apply(filter: &Filter, source: &mut Pixmap) {
    let result = apply_inner(filter, source);
    let result = result.and_then(|image| apply_to_canvas(image, source));

    let id = &filter.doc.node(filter.node).attributes().id;
    match result {
        Ok(_) => {}
        Err(Error::InvalidRegion) => {
            source.fill(tiny_skia::Color::TRANSPARENT);
            log::warn!("Filter '{}' has an invalid region.", id);
        }
        Err(Error::AllocFailed) => {
            log::warn!("Filter '{}' requires too much memory. Skipped.", id);
        }
    }
}

/// A primitive result.
///
/// All images have the size of the filter region.
#[derive(Clone)]
struct Image {
    image: Rc<Pixmap>,
}

impl Image {
    fn from_image(image: Pixmap) -> Self {
        Image {
            image: Rc::new(image),
        }
    }

    fn take(self) -> Pixmap {
        match Rc::try_unwrap(self.image) {
            Ok(image) => image,
            Err(image) => (*image).clone(),
        }
    }

    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }
}

struct FilterResult {
    name: String,
    image: Image,
}

struct Context<'a> {
    filter: &'a Filter<'a>,
    source: &'a Pixmap,
    source_alpha: Option<Image>,
    /// Filter region in user space.
    rect: NonZeroRect,
    primitive_units: Units,
    max_size: u64,
    results: Vec<FilterResult>,
}

impl Context<'_> {
    fn create_pixmap(&self) -> Result<Pixmap, Error> {
        let (w, h) = (self.source.width(), self.source.height());
        if w as u64 * h as u64 > self.max_size {
            return Err(Error::AllocFailed);
        }

        Pixmap::new(w, h).ok_or(Error::AllocFailed)
    }

    fn input(&mut self, input: &Input) -> Result<Image, Error> {
        match input {
            Input::SourceGraphic => Ok(Image::from_image(self.source.clone())),
            Input::SourceAlpha => {
                if let Some(image) = &self.source_alpha {
                    return Ok(image.clone());
                }

                let mut image = self.source.clone();
                // Set RGB to black. Keep alpha as is.
                for p in image.data_mut().as_rgba_mut() {
                    p.r = 0;
                    p.g = 0;
                    p.b = 0;
                }

                let image = Image::from_image(image);
                self.source_alpha = Some(image.clone());
                Ok(image)
            }
            Input::Reference(name) if name.is_empty() => match self.results.last() {
                Some(res) => Ok(res.image.clone()),
                None => self.input(&Input::SourceGraphic),
            },
            Input::Reference(name) => {
                if let Some(res) = self.results.iter().rev().find(|v| v.name == *name) {
                    Ok(res.image.clone())
                } else {
                    log::warn!("Unknown filter primitive reference '{}'.", name);
                    Ok(Image::from_image(self.create_pixmap()?))
                }
            }
        }
    }

    /// Converts a length in primitive units into user space.
    fn scale_primitive(&self, x: f32, y: f32) -> (f32, f32) {
        match (self.primitive_units, self.filter.bbox) {
            (Units::ObjectBoundingBox, Some(bbox)) => (x * bbox.width(), y * bbox.height()),
            _ => (x, y),
        }
    }
}

fn apply_inner(filter: &Filter, source: &Pixmap) -> Result<Image, Error> {
    let doc = filter.doc;
    let (rect, units, primitive_units) = match doc.node(filter.node).kind() {
        NodeKind::Filter {
            rect,
            units,
            primitive_units,
            ..
        } => (*rect, *units, *primitive_units),
        _ => return Err(Error::InvalidRegion),
    };

    let rect = match units {
        Units::ObjectBoundingBox => {
            let bbox = filter.bbox.ok_or(Error::InvalidRegion)?;
            geom::bbox_transform(rect, bbox).ok_or(Error::InvalidRegion)?
        }
        Units::UserSpaceOnUse => rect,
    };

    if primitive_units == Units::ObjectBoundingBox && filter.bbox.is_none() {
        return Err(Error::InvalidRegion);
    }

    let region = IntRect::from_xywh(0, 0, source.width(), source.height())
        .ok_or(Error::InvalidRegion)?;
    let mut ctx = Context {
        filter,
        source,
        source_alpha: None,
        rect,
        primitive_units,
        max_size: doc.options().max_layer_size,
        results: Vec::new(),
    };

    for &child in doc.node(filter.node).children() {
        let (subregion, input, input2, result_name, kind) = match doc.node(child).kind() {
            NodeKind::FilterPrimitive {
                subregion,
                input,
                input2,
                result: result_name,
                kind,
            } => (subregion, input, input2, result_name, kind),
            _ => continue,
        };

        let subregion = calc_subregion(subregion, ctx.rect, filter.bbox)
            .and_then(|r| geom::transform_rect(r.to_rect(), filter.transform))
            .and_then(|r| r.round_out())
            .and_then(|r| r.intersect(&region));

        let mut result = match kind {
            PrimitiveKind::Flood { color, opacity } => {
                let mut pixmap = ctx.create_pixmap()?;
                let mut c = tiny_skia::Color::from_rgba8(color.red, color.green, color.blue, 255);
                c.apply_opacity(*opacity);
                pixmap.fill(c);
                Image::from_image(pixmap)
            }
            PrimitiveKind::Offset { dx, dy } => {
                let input = ctx.input(input)?;
                let (dx, dy) = ctx.scale_primitive(*dx, *dy);
                apply_offset(&ctx, dx, dy, input)?
            }
            PrimitiveKind::ColorMatrix(matrix) => {
                let input = ctx.input(input)?;
                apply_color_matrix(matrix, input)
            }
            PrimitiveKind::GaussianBlur {
                std_dev_x,
                std_dev_y,
            } => {
                let input = ctx.input(input)?;
                let (sx, sy) = ctx.scale_primitive(*std_dev_x, *std_dev_y);
                apply_blur(sx, sy, filter.transform, input)
            }
            PrimitiveKind::Composite(operator) => {
                let input1 = ctx.input(input)?;
                let input2 = ctx.input(input2)?;
                apply_composite(&ctx, *operator, input1, input2)?
            }
            PrimitiveKind::Merge => apply_merge(&mut ctx, child)?,
            PrimitiveKind::Unsupported => Image::from_image(ctx.create_pixmap()?),
        };

        match subregion {
            Some(subregion) if subregion != region => {
                result = clip_to_subregion(result, subregion);
            }
            Some(_) => {}
            None => result = Image::from_image(ctx.create_pixmap()?),
        }

        ctx.results.push(FilterResult {
            name: result_name.clone(),
            image: result,
        });
    }

    match ctx.results.pop() {
        Some(res) => Ok(res.image),
        None => ctx.input(&Input::SourceGraphic),
    }
}

/// Resolves a primitive subregion in user space.
///
/// Unset edges are taken from the filter region. Relative edges without
/// a bounding box fall back to the filter region as well.
fn calc_subregion(
    subregion: &Subregion,
    filter_rect: NonZeroRect,
    bbox: Option<NonZeroRect>,
) -> Option<NonZeroRect> {
    let bbox = bbox.unwrap_or(filter_rect);
    let resolve = |coord: Option<Coord>, origin: f32, size: f32, def: f32| match coord {
        Some(Coord::Absolute(n)) => n,
        Some(Coord::Relative(n)) => origin + n * size,
        None => def,
    };

    NonZeroRect::from_xywh(
        resolve(subregion.x, bbox.x(), bbox.width(), filter_rect.x()),
        resolve(subregion.y, bbox.y(), bbox.height(), filter_rect.y()),
        resolve(subregion.width, 0.0, bbox.width(), filter_rect.width()),
        resolve(subregion.height, 0.0, bbox.height(), filter_rect.height()),
    )
}

/// Clears the pixels outside the subregion.
fn clip_to_subregion(image: Image, subregion: IntRect) -> Image {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(tiny_skia::Color::BLACK);
    paint.blend_mode = tiny_skia::BlendMode::Clear;

    let mut pixmap = image.take();
    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;
    let ts = Transform::identity();

    if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, w, subregion.y() as f32) {
        pixmap.fill_rect(rect, &paint, ts, None);
    }

    if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, subregion.x() as f32, h) {
        pixmap.fill_rect(rect, &paint, ts, None);
    }

    if let Some(rect) = tiny_skia::Rect::from_xywh(subregion.right() as f32, 0.0, w, h) {
        pixmap.fill_rect(rect, &paint, ts, None);
    }

    if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, subregion.bottom() as f32, w, h) {
        pixmap.fill_rect(rect, &paint, ts, None);
    }

    Image::from_image(pixmap)
}

trait PixmapToImageRef<'a> {
    fn as_image_ref(&'a self) -> ImageRef<'a>;
    fn as_image_ref_mut(&'a mut self) -> ImageRefMut<'a>;
}

impl<'a> PixmapToImageRef<'a> for Pixmap {
    fn as_image_ref(&'a self) -> ImageRef<'a> {
        ImageRef::new(self.data().as_rgba(), self.width(), self.height())
    }

    fn as_image_ref_mut(&'a mut self) -> ImageRefMut<'a> {
        let (w, h) = (self.width(), self.height());
        ImageRefMut::new(self.data_mut().as_rgba_mut(), w, h)
    }
}

fn scale_coordinates(x: f32, y: f32, ts: Transform) -> (f32, f32) {
    let (sx, sy) = ts.get_scale();
    (x * sx, y * sy)
}

fn apply_offset(ctx: &Context, dx: f32, dy: f32, input: Image) -> Result<Image, Error> {
    let (dx, dy) = scale_coordinates(dx, dy, ctx.filter.transform);
    if dx.approx_eq_ulps(&0.0, 4) && dy.approx_eq_ulps(&0.0, 4) {
        return Ok(input);
    }

    let mut pixmap = ctx.create_pixmap()?;
    pixmap.draw_pixmap(
        dx as i32,
        dy as i32,
        Pixmap::as_ref(&input.image),
        &tiny_skia::PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    Ok(Image::from_image(pixmap))
}

fn apply_blur(std_dx: f32, std_dy: f32, ts: Transform, input: Image) -> Image {
    let (std_dx, std_dy) = scale_coordinates(std_dx, std_dy, ts);

    // A zero deviation disables the primitive.
    if !(std_dx > 0.0 || std_dy > 0.0) {
        return input;
    }

    let mut pixmap = input.take();
    vgfilters::box_blur(std_dx as f64, std_dy as f64, pixmap.as_image_ref_mut());
    Image::from_image(pixmap)
}

fn apply_color_matrix(kind: &ColorMatrixKind, input: Image) -> Image {
    let matrix = match kind {
        ColorMatrixKind::Matrix(values) => vgfilters::ColorMatrix::Matrix(values),
        ColorMatrixKind::Saturate(n) => vgfilters::ColorMatrix::Saturate(*n),
        ColorMatrixKind::HueRotate(n) => vgfilters::ColorMatrix::HueRotate(*n),
        ColorMatrixKind::LuminanceToAlpha => vgfilters::ColorMatrix::LuminanceToAlpha,
    };

    let mut pixmap = input.take();
    vgfilters::demultiply_alpha(pixmap.data_mut().as_rgba_mut());
    vgfilters::color_matrix(matrix, pixmap.as_image_ref_mut());
    vgfilters::multiply_alpha(pixmap.data_mut().as_rgba_mut());

    Image::from_image(pixmap)
}

fn apply_composite(
    ctx: &Context,
    operator: CompositeOperator,
    input1: Image,
    input2: Image,
) -> Result<Image, Error> {
    let mut pixmap = ctx.create_pixmap()?;

    if let CompositeOperator::Arithmetic { k1, k2, k3, k4 } = operator {
        let mut pixmap1 = input1.take();
        let mut pixmap2 = input2.take();
        vgfilters::demultiply_alpha(pixmap1.data_mut().as_rgba_mut());
        vgfilters::demultiply_alpha(pixmap2.data_mut().as_rgba_mut());

        vgfilters::arithmetic_composite(
            k1,
            k2,
            k3,
            k4,
            pixmap1.as_image_ref(),
            pixmap2.as_image_ref(),
            pixmap.as_image_ref_mut(),
        );

        vgfilters::multiply_alpha(pixmap.data_mut().as_rgba_mut());
        return Ok(Image::from_image(pixmap));
    }

    pixmap.draw_pixmap(
        0,
        0,
        Pixmap::as_ref(&input2.image),
        &tiny_skia::PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    let blend_mode = match operator {
        CompositeOperator::Over => tiny_skia::BlendMode::SourceOver,
        CompositeOperator::In => tiny_skia::BlendMode::SourceIn,
        CompositeOperator::Out => tiny_skia::BlendMode::SourceOut,
        CompositeOperator::Atop => tiny_skia::BlendMode::SourceAtop,
        CompositeOperator::Xor => tiny_skia::BlendMode::Xor,
        CompositeOperator::Lighter => tiny_skia::BlendMode::Plus,
        CompositeOperator::Arithmetic { .. } => tiny_skia::BlendMode::SourceOver,
    };

    pixmap.draw_pixmap(
        0,
        0,
        Pixmap::as_ref(&input1.image),
        &tiny_skia::PixmapPaint {
            blend_mode,
            ..tiny_skia::PixmapPaint::default()
        },
        Transform::identity(),
        None,
    );

    Ok(Image::from_image(pixmap))
}

fn apply_merge(ctx: &mut Context, node: NodeId) -> Result<Image, Error> {
    let doc = ctx.filter.doc;
    let mut pixmap = ctx.create_pixmap()?;

    for &child in doc.node(node).children() {
        if let NodeKind::MergeNode { input } = doc.node(child).kind() {
            let input = ctx.input(input)?;
            pixmap.draw_pixmap(
                0,
                0,
                Pixmap::as_ref(&input.image),
                &tiny_skia::PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    Ok(Image::from_image(pixmap))
}

fn apply_to_canvas(input: Image, pixmap: &mut Pixmap) -> Result<(), Error> {
    if input.width() != pixmap.width() || input.height() != pixmap.height() {
        return Err(Error::InvalidRegion);
    }

    pixmap.fill(tiny_skia::Color::TRANSPARENT);
    pixmap.draw_pixmap(
        0,
        0,
        Pixmap::as_ref(&input.image),
        &tiny_skia::PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;

    fn run(svg: &str, w: u32, h: u32) -> Pixmap {
        let doc = Document::from_str(svg, &Options::default()).unwrap();
        let node = doc.element_by_id("f").unwrap();

        let mut source = Pixmap::new(w, h).unwrap();
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(0, 0, 255, 255);
        let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, w as f32 / 2.0, h as f32).unwrap();
        source.fill_rect(rect, &paint, Transform::identity(), None);

        let filter = Filter {
            doc: &doc,
            node,
            bbox: NonZeroRect::from_xywh(0.0, 0.0, w as f32, h as f32),
            transform: Transform::identity(),
        };
        apply(&filter, &mut source);
        source
    }

    #[test]
    fn flood() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feFlood flood-color='red'/>
                </filter>
            </svg>",
            10,
            10,
        );

        let p = pixmap.pixel(8, 5).unwrap();
        assert_eq!((p.red(), p.alpha()), (255, 255));
    }

    #[test]
    fn flood_subregion() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feFlood flood-color='red' x='0' y='0' width='5' height='10'/>
                </filter>
            </svg>",
            10,
            10,
        );

        assert_eq!(pixmap.pixel(2, 5).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(8, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn offset() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feOffset dx='5'/>
                </filter>
            </svg>",
            10,
            10,
        );

        assert_eq!(pixmap.pixel(2, 5).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(7, 5).unwrap().blue(), 255);
    }

    #[test]
    fn missing_input_is_transparent() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feOffset in='missing'/>
                </filter>
            </svg>",
            10,
            10,
        );

        assert_eq!(pixmap.pixel(2, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn source_alpha() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feOffset in='SourceAlpha'/>
                </filter>
            </svg>",
            10,
            10,
        );

        let p = pixmap.pixel(2, 5).unwrap();
        assert_eq!((p.blue(), p.alpha()), (0, 255));
    }

    #[test]
    fn merge() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feFlood flood-color='red' result='bg'/>
                    <feMerge>
                        <feMergeNode in='bg'/>
                        <feMergeNode in='SourceGraphic'/>
                    </feMerge>
                </filter>
            </svg>",
            10,
            10,
        );

        assert_eq!(pixmap.pixel(2, 5).unwrap().blue(), 255);
        assert_eq!(pixmap.pixel(8, 5).unwrap().red(), 255);
    }

    #[test]
    fn composite_in() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='10' height='10'>
                    <feFlood flood-color='red'/>
                    <feComposite in2='SourceGraphic' operator='in'/>
                </filter>
            </svg>",
            10,
            10,
        );

        let p = pixmap.pixel(2, 5).unwrap();
        assert_eq!((p.red(), p.blue()), (255, 0));
        assert_eq!(pixmap.pixel(8, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn blur_spreads() {
        let pixmap = run(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <filter id='f' filterUnits='userSpaceOnUse' x='0' y='0' width='20' height='20'>
                    <feGaussianBlur stdDeviation='2'/>
                </filter>
            </svg>",
            20,
            20,
        );

        let a = pixmap.pixel(11, 10).unwrap().alpha();
        assert!(a > 0 && a < 255);
    }

    #[test]
    fn subregion_resolving() {
        let region = NonZeroRect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap();
        let bbox = NonZeroRect::from_xywh(10.0, 10.0, 50.0, 20.0).unwrap();
        let sub = Subregion {
            x: Some(Coord::Relative(0.5)),
            y: None,
            width: Some(Coord::Absolute(30.0)),
            height: Some(Coord::Relative(1.0)),
        };

        let rect = calc_subregion(&sub, region, Some(bbox)).unwrap();
        assert_eq!(rect, NonZeroRect::from_xywh(35.0, 0.0, 30.0, 20.0).unwrap());
    }
}
