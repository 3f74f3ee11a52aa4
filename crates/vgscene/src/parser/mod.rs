// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

mod animation;
mod builder;
mod convert;
mod css;
mod filter;
mod image;
mod names;
mod node;
mod options;
mod paint_server;
mod style;
mod text;
mod units;

pub use options::Options;
pub(crate) use builder::{RawDocument, RawId, RawKind};
pub(crate) use names::{AId, EId};
pub(crate) use paint_server::finish_gradient;

use crate::xml::{RoxmlSource, XmlEventSource};

/// A document loading error.
///
/// Malformed attribute values are never errors. They are logged and skipped.
#[derive(Debug)]
pub enum Error {
    /// The data is not valid UTF-8.
    NotAnUtf8Str,

    /// The data starts with a gzip signature but cannot be decompressed.
    MalformedGZip,

    /// The data does not start like an XML or SVG document.
    UnsupportedFormat,

    /// The root element is not `svg` in the SVG namespace.
    NotAnSvg,

    /// The document has more than a million elements or nests deeper than 2048 levels.
    ElementsLimitReached,

    /// The XML is malformed.
    ParsingFailed(roxmltree::Error),

    /// A `use`, gradient or pattern link leads back to itself.
    ///
    /// Holds the id of the element where the cycle was found.
    RecursiveReference(String),

    /// A file could not be read.
    Io(std::io::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match self {
            Error::NotAnUtf8Str => "the data is not UTF-8",
            Error::MalformedGZip => "the data is not a valid gzip stream",
            Error::UnsupportedFormat => "the data is not an SVG document",
            Error::NotAnSvg => "the root element is not an SVG 'svg'",
            Error::ElementsLimitReached => "the document has too many elements",
            Error::ParsingFailed(e) => return write!(f, "malformed XML: {}", e),
            Error::RecursiveReference(id) => {
                return write!(f, "'{}' is part of a reference cycle", id)
            }
            Error::Io(e) => return write!(f, "I/O error: {}", e),
        };

        f.write_str(msg)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ParsingFailed(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}

impl crate::Document {
    /// Parses a `Document` from an SVG data.
    ///
    /// Can contain an SVG string or a gzip compressed data.
    pub fn from_data(data: &[u8], opt: &Options) -> Result<Self, Error> {
        if data.starts_with(&[0x1f, 0x8b]) {
            let data = decompress_svgz(data)?;
            let text = std::str::from_utf8(&data).map_err(|_| Error::NotAnUtf8Str)?;
            Self::from_str(text, opt)
        } else {
            let text = std::str::from_utf8(data).map_err(|_| Error::NotAnUtf8Str)?;
            Self::from_str(text, opt)
        }
    }

    /// Parses a `Document` from an SVG string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str, opt: &Options) -> Result<Self, Error> {
        if !looks_like_svg(text) {
            return Err(Error::UnsupportedFormat);
        }

        let mut source = RoxmlSource::parse(text)?;
        Self::from_events(&mut source, opt)
    }

    /// Loads a `Document` from a file.
    ///
    /// When `Options::resources_dir` is not set, the file's directory is used.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P, opt: &Options) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        if opt.resources_dir.is_none() {
            let mut opt = opt.clone();
            opt.resources_dir = std::fs::canonicalize(path)
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            Self::from_data(&data, &opt)
        } else {
            Self::from_data(&data, opt)
        }
    }

    /// Builds a `Document` from an external XML event source.
    pub fn from_events<S: XmlEventSource>(source: &mut S, opt: &Options) -> Result<Self, Error> {
        let mut raw = builder::build(source)?;
        css::cascade(&mut raw, opt);
        let mut doc = convert::convert_doc(&raw, opt)?;
        crate::resolve::resolve(&mut doc)?;
        Ok(doc)
    }
}

/// Checks the first bytes of a text for an SVG/XML signature.
fn looks_like_svg(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let head = match text.char_indices().nth(64) {
        Some((idx, _)) => &text[..idx],
        None => text,
    };

    ["<?xml", "<svg", "<!--", "<!DOCTYPE svg"]
        .iter()
        .any(|prefix| head.starts_with(prefix))
}

/// Decompresses an SVGZ file.
pub fn decompress_svgz(data: &[u8]) -> Result<Vec<u8>, Error> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decoded = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut decoded)
        .map_err(|_| Error::MalformedGZip)?;
    Ok(decoded)
}
