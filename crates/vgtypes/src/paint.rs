// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use crate::{Color, Error, Scanner};

/// What to paint with when a paint server link cannot be resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaintFallback {
    /// `none`
    None,
    /// `currentColor`
    CurrentColor,
    /// A `<color>`.
    Color(Color),
}

/// A [`<paint>`] value. Borrows the link id from the input.
///
/// `<icccolor>` is not supported.
///
/// ```
/// use vgtypes::{Paint, PaintFallback, Color};
///
/// let paint = Paint::from_str("url(#gradient) red").unwrap();
/// assert_eq!(paint, Paint::FuncIRI("gradient", Some(PaintFallback::Color(Color::red()))));
/// assert_eq!(Paint::from_str(" inherit ").unwrap(), Paint::Inherit);
/// ```
///
/// [`<paint>`]: https://www.w3.org/TR/SVG11/painting.html#SpecifyingPaint
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Paint<'a> {
    /// `none`
    None,
    /// `inherit`
    Inherit,
    /// `currentColor`
    CurrentColor,
    /// A `<color>`.
    Color(Color),
    /// A paint server link with an optional fallback.
    FuncIRI(&'a str, Option<PaintFallback>),
}

impl<'a> Paint<'a> {
    /// Parses a `Paint`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'a str) -> Result<Self, Error> {
        let text = text.trim();
        let paint = match text {
            "none" => Paint::None,
            "inherit" => Paint::Inherit,
            "currentColor" => Paint::CurrentColor,
            _ if text.starts_with("url(") => {
                let mut s = Scanner::new(text);
                let id = s.func_iri().map_err(|_| Error::InvalidValue)?;
                let fallback = match s.rest().trim_start() {
                    "" => None,
                    "none" => Some(PaintFallback::None),
                    "currentColor" => Some(PaintFallback::CurrentColor),
                    color => Some(PaintFallback::Color(Color::from_str(color)?)),
                };
                Paint::FuncIRI(id, fallback)
            }
            _ => Paint::Color(Color::from_str(text).map_err(|_| Error::InvalidValue)?),
        };

        Ok(paint)
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! paint {
        ($name:ident, $text:expr, $result:expr) => (
            #[test]
            fn $name() {
                assert_eq!(Paint::from_str($text).unwrap(), $result);
            }
        )
    }

    paint!(none,              "  none ",                     Paint::None);
    paint!(inherit,           "inherit",                     Paint::Inherit);
    paint!(current_color,     " currentColor",               Paint::CurrentColor);
    paint!(color,             "#00ff0080",                   Paint::Color(Color::new_rgba(0, 255, 0, 128)));
    paint!(link,              "url(#lg)",                    Paint::FuncIRI("lg", None));
    paint!(link_none,         "url(#lg) none",               Paint::FuncIRI("lg", Some(PaintFallback::None)));
    paint!(link_current,      "url(#lg)  currentColor ",     Paint::FuncIRI("lg", Some(PaintFallback::CurrentColor)));
    paint!(link_color,        "url('#lg') blue",             Paint::FuncIRI("lg", Some(PaintFallback::Color(Color::new_rgb(0, 0, 255)))));

    #[test]
    fn errors() {
        assert_eq!(Paint::from_str("qwe"), Err(Error::InvalidValue));
        assert_eq!(Paint::from_str("red icc-color(acmecmyk, 0.1)"), Err(Error::InvalidValue));
        assert_eq!(Paint::from_str("url(#) red"), Err(Error::InvalidValue));
        assert_eq!(Paint::from_str("url(#lg) red icc-color(acmecmyk, 0.1)"),
                   Err(Error::UnexpectedToken(5)));
    }
}
