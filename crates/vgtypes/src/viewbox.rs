// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, Scanner};

/// A [`viewBox`] rectangle. Always has a positive size.
///
/// [`viewBox`]: https://www.w3.org/TR/SVG11/coords.html#ViewBoxAttribute
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ViewBox {
    /// Creates a new `ViewBox`.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        ViewBox { x, y, w, h }
    }
}

impl std::str::FromStr for ViewBox {
    type Err = Error;

    /// Parses four numbers. A zero or negative size is `InvalidValue`.
    fn from_str(text: &str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let x = s.list_number()?;
        let y = s.list_number()?;
        let w = s.list_number()?;
        let h = s.list_number()?;

        if !(w > 0.0 && h > 0.0) {
            return Err(Error::InvalidValue);
        }

        Ok(ViewBox::new(x, y, w, h))
    }
}

/// The `<align>` part of [`preserveAspectRatio`].
///
/// [`preserveAspectRatio`]: https://www.w3.org/TR/SVG11/coords.html#PreserveAspectRatioAttribute
#[allow(missing_docs)]
#[derive(Clone, Hash, Copy, PartialEq, Eq, Debug)]
pub enum Align {
    None,
    XMinYMin,
    XMidYMin,
    XMaxYMin,
    XMinYMid,
    XMidYMid,
    XMaxYMid,
    XMinYMax,
    XMidYMax,
    XMaxYMax,
}

impl Align {
    fn from_name(name: &str) -> Option<Self> {
        let align = match name {
            "none" => Align::None,
            "xMinYMin" => Align::XMinYMin,
            "xMidYMin" => Align::XMidYMin,
            "xMaxYMin" => Align::XMaxYMin,
            "xMinYMid" => Align::XMinYMid,
            "xMidYMid" => Align::XMidYMid,
            "xMaxYMid" => Align::XMaxYMid,
            "xMinYMax" => Align::XMinYMax,
            "xMidYMax" => Align::XMidYMax,
            "xMaxYMax" => Align::XMaxYMax,
            _ => return None,
        };

        Some(align)
    }
}

/// A [`preserveAspectRatio`] value.
///
/// [`preserveAspectRatio`]: https://www.w3.org/TR/SVG11/coords.html#PreserveAspectRatioAttribute
#[derive(Clone, Hash, Copy, PartialEq, Eq, Debug)]
pub struct AspectRatio {
    /// The `defer` keyword is present.
    pub defer: bool,
    /// How the view box is aligned inside the viewport.
    pub align: Align,
    /// `slice` was set. `meet` is the default.
    pub slice: bool,
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio {
            defer: false,
            align: Align::XMidYMid,
            slice: false,
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = Error;

    /// Parses `defer? <align> (meet | slice)?`.
    fn from_str(text: &str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let mut word = || {
            s.skip_ws();
            let start = s.offset();
            (s.ident(), s.char_pos_of(start))
        };

        let (mut name, mut pos) = word();
        let defer = name == "defer";
        if defer {
            (name, pos) = word();
        }

        let align = Align::from_name(name).ok_or(Error::UnexpectedToken(pos))?;

        let slice = match word() {
            ("", _) => false,
            ("meet", _) => false,
            ("slice", _) => true,
            (_, pos) => return Err(Error::UnexpectedToken(pos)),
        };

        s.expect_done()?;
        Ok(AspectRatio {
            defer,
            align,
            slice,
        })
    }
}
