// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
*vgtypes* tokenizes the attribute values used by `vgscene`.

Supported values:

- `<number>`, `<length>` and lists of them
- `<color>`, including the 12-digit hex form and named colors
- `<transform-list>`
- `<path-data>`
- `<paint>`, `<FuncIRI>` and `<IRI>`
- `viewBox` and `preserveAspectRatio`

Every tokenizer is a method on a [`Scanner`] and reports errors with a char position.
[`scan_number`] and [`Transform::parse_lossy`] never fail and return whatever
they managed to read.

The crate forbids unsafe code and never panics on malformed input.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

mod color;
#[rustfmt::skip] mod colors;
mod error;
mod iri;
mod length;
mod number;
mod paint;
mod path;
mod scanner;
mod transform;
mod viewbox;

pub use crate::color::Color;
pub use crate::error::Error;
pub use crate::iri::{FuncIRI, IRI};
pub use crate::length::{Length, LengthListParser, LengthUnit};
pub use crate::number::{scan_number, Number, NumberListParser};
pub use crate::paint::{Paint, PaintFallback};
pub use crate::path::{PathParser, PathSegment};
pub use crate::scanner::Scanner;
pub use crate::transform::Transform;
pub use crate::viewbox::{Align, AspectRatio, ViewBox};
