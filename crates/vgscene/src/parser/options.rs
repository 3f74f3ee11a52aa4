// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use vgtypes::LengthUnit;

/// Document loading and rendering options.
///
/// Kept by the [`Document`](crate::Document) after loading, so rendering
/// limits can be changed only by reloading.
#[derive(Clone, Debug)]
pub struct Options {
    /// The base directory of relative `xlink:href` and `xml-stylesheet` links.
    ///
    /// `Document::from_file` uses the file's directory when this is `None`.
    pub resources_dir: Option<PathBuf>,

    /// User languages matched against `systemLanguage`, like `en` or `en-US`.
    ///
    /// An entry matches a language with the same prefix.
    pub languages: Vec<String>,

    /// The unit of the root `width` and `height` when they have no suffix.
    pub default_unit: LengthUnit,

    /// The font family of text without a `font-family`.
    pub font_family: String,

    /// The font size of text without a `font-size`.
    pub font_size: f32,

    /// The document size when the root `width` or `height` is a percentage
    /// and there is no `viewBox`.
    pub default_size: tiny_skia::Size,

    /// Shapes wider or taller than this in device pixels are skipped.
    pub max_shape_size: f32,

    /// Offscreen layers with more pixels than this are not allocated.
    ///
    /// Applies to masks, filters and pattern tiles. Group opacity is
    /// multiplied into the leaves and needs no layer.
    pub max_layer_size: u64,

    /// Preserve the view box aspect ratio when the target size differs
    /// from the document size.
    pub keep_aspect_ratio: bool,

    /// An extra style sheet applied after the document's own ones.
    pub style_sheet: Option<String>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            resources_dir: None,
            languages: vec!["en".to_string()],
            default_unit: LengthUnit::Px,
            font_family: "Times New Roman".to_string(),
            font_size: 12.0,
            default_size: tiny_skia::Size::from_wh(100.0, 100.0).unwrap(),
            max_shape_size: 32767.0,
            max_layer_size: 4096 * 4096,
            keep_aspect_ratio: false,
            style_sheet: None,
        }
    }
}

impl Options {
    /// Joins a link with `resources_dir`.
    pub fn resolve_path(&self, link: &Path) -> PathBuf {
        match self.resources_dir {
            Some(ref dir) => dir.join(link),
            None => link.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links() {
        let mut opt = Options::default();
        assert_eq!(opt.resolve_path(Path::new("a.png")), PathBuf::from("a.png"));

        opt.resources_dir = Some(PathBuf::from("/data"));
        assert_eq!(opt.resolve_path(Path::new("img/a.png")), PathBuf::from("/data/img/a.png"));
    }
}
