// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`vgscene` is an SVG Tiny 1.2 loader and renderer.

An SVG file is loaded into a [`Document`]: a flat arena of typed nodes
with resolved styles, links and paint servers. The document can then be
rendered any number of times onto a [`Canvas`], optionally at a given
animation time.

```no_run
let opt = vgscene::Options::default();
let doc = vgscene::Document::from_file("image.svg", &opt).unwrap();
let size = doc.size().to_int_size();
let mut canvas = vgscene::PixmapCanvas::new(size.width(), size.height()).unwrap();
doc.render(&mut canvas, None, 0.0);
canvas.pixmap().save_png("image.png").unwrap();
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::identity_op)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::upper_case_acronyms)]

pub use tiny_skia;
pub use vgtypes;

pub mod animation;
mod filter;
mod geom;
mod parser;
mod path;
pub mod render;
mod resolve;
pub mod tree;
pub mod xml;

pub use parser::{decompress_svgz, Error, Options};
pub use render::{Brush, Canvas, FontQuery, GradientStop, Pen, PixmapCanvas, RenderHints};
pub use tree::Document;
