// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use tiny_skia::NonZeroRect;
use vgtypes::Length;

use super::convert::State;
use super::node::SvgNode;
use super::{units, AId, OptionLog};
use crate::tree::NodeKind;

#[derive(Clone, Copy, PartialEq, Debug)]
enum ImageFormat {
    PNG,
    JPEG,
    GIF,
}

pub(crate) fn convert(node: SvgNode, state: &State) -> Option<NodeKind> {
    let href = node
        .try_attribute::<&str>(AId::Href)
        .log_none(|| log::warn!("Image lacks the 'xlink:href' attribute. Skipped."))?;

    let data = load_href(href, state);

    let actual_size = data
        .as_ref()
        .and_then(|pixmap| tiny_skia::Size::from_wh(pixmap.width() as f32, pixmap.height() as f32));

    let x = units::convert_attr_or(node, AId::X, Length::zero(), state);
    let y = units::convert_attr_or(node, AId::Y, Length::zero(), state);
    let mut width = units::convert_attr(node, AId::Width, state);
    let mut height = units::convert_attr(node, AId::Height, state);

    if let Some(size) = actual_size {
        match (width, height) {
            (Some(w), None) => {
                // Only width was defined, so we need to scale height accordingly.
                height = Some(size.height() * (w / size.width()));
            }
            (None, Some(h)) => {
                // Only height was defined, so we need to scale width accordingly.
                width = Some(size.width() * (h / size.height()));
            }
            (None, None) => {
                width = Some(size.width());
                height = Some(size.height());
            }
            _ => {}
        }
    }

    let rect = NonZeroRect::from_xywh(x, y, width?, height?)
        .log_none(|| log::warn!("Image has an invalid size. Skipped."))?;

    Some(NodeKind::Image {
        rect,
        aspect: node.attribute(AId::PreserveAspectRatio).unwrap_or_default(),
        data,
    })
}

fn load_href(href: &str, state: &State) -> Option<Rc<tiny_skia::Pixmap>> {
    let data = if let Ok(url) = data_url::DataUrl::process(href) {
        let (data, _) = url.decode_to_vec().ok()?;
        data
    } else {
        let path = state.opt.resolve_path(std::path::Path::new(href));
        match std::fs::read(&path) {
            Ok(data) => data,
            Err(_) => {
                log::warn!("Failed to load '{}'. Skipped.", href);
                return None;
            }
        }
    };

    let pixmap = match get_image_data_format(&data) {
        Some(format) => decode_raster(format, &data),
        None => {
            log::warn!("'{}' is not a PNG, JPEG or GIF image.", shorten(href));
            return None;
        }
    };

    pixmap
        .log_none(|| log::warn!("Failed to decode an image."))
        .map(Rc::new)
}

fn shorten(href: &str) -> &str {
    match href.char_indices().nth(32) {
        Some((idx, _)) => &href[..idx],
        None => href,
    }
}

fn get_image_data_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::PNG)
    } else if data.starts_with(&[0xff, 0xd8, 0xff]) {
        Some(ImageFormat::JPEG)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageFormat::GIF)
    } else {
        None
    }
}

#[cfg(not(feature = "raster-images"))]
fn decode_raster(_: ImageFormat, _: &[u8]) -> Option<tiny_skia::Pixmap> {
    log::warn!("Raster images support is disabled.");
    None
}

#[cfg(feature = "raster-images")]
fn decode_raster(format: ImageFormat, data: &[u8]) -> Option<tiny_skia::Pixmap> {
    match format {
        ImageFormat::PNG => raster_images::decode_png(data),
        ImageFormat::JPEG => raster_images::decode_jpeg(data),
        ImageFormat::GIF => raster_images::decode_gif(data),
    }
}

#[cfg(feature = "raster-images")]
mod raster_images {
    use rgb::FromSlice;

    pub fn decode_png(data: &[u8]) -> Option<tiny_skia::Pixmap> {
        let mut decoder = png::Decoder::new(data);
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info().ok()?;

        let mut img_data = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut img_data).ok()?;
        img_data.truncate(info.buffer_size());

        let rgba = match info.color_type {
            png::ColorType::Rgb => from_rgb(&img_data),
            png::ColorType::Rgba => img_data,
            png::ColorType::Grayscale => img_data.iter().flat_map(|g| [*g, *g, *g, 255]).collect(),
            png::ColorType::GrayscaleAlpha => img_data
                .chunks(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            // Palettes are expanded by the decoder.
            png::ColorType::Indexed => return None,
        };

        rgba_to_pixmap(info.width, info.height, &rgba)
    }

    pub fn decode_jpeg(data: &[u8]) -> Option<tiny_skia::Pixmap> {
        let mut decoder = jpeg_decoder::Decoder::new(data);
        let img_data = decoder.decode().ok()?;
        let info = decoder.info()?;

        let rgba = match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => from_rgb(&img_data),
            jpeg_decoder::PixelFormat::L8 => img_data.iter().flat_map(|g| [*g, *g, *g, 255]).collect(),
            _ => return None,
        };

        rgba_to_pixmap(info.width as u32, info.height as u32, &rgba)
    }

    pub fn decode_gif(data: &[u8]) -> Option<tiny_skia::Pixmap> {
        let mut decoder = gif::DecodeOptions::new();
        decoder.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = decoder.read_info(data).ok()?;
        let first_frame = decoder.read_next_frame().ok()??;

        rgba_to_pixmap(
            first_frame.width as u32,
            first_frame.height as u32,
            &first_frame.buffer,
        )
    }

    fn from_rgb(data: &[u8]) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(data.len() / 3 * 4);
        for p in data.as_rgb() {
            rgba.extend_from_slice(&[p.r, p.g, p.b, 255]);
        }

        rgba
    }

    /// Creates a premultiplied pixmap from straight RGBA data.
    fn rgba_to_pixmap(width: u32, height: u32, data: &[u8]) -> Option<tiny_skia::Pixmap> {
        let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
        if data.len() < pixmap.data().len() {
            return None;
        }

        for (to, from) in pixmap.pixels_mut().iter_mut().zip(data.as_rgba()) {
            *to = tiny_skia::ColorU8::from_rgba(from.r, from.g, from.b, from.a).premultiply();
        }

        Some(pixmap)
    }
}
