// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, Scanner};

/// An SVG length unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum LengthUnit {
    None,
    Em,
    Ex,
    Px,
    In,
    Cm,
    Mm,
    Pt,
    Pc,
    Percent,
}

// `%` goes first, the rest are two chars long.
const UNITS: &[(&str, LengthUnit)] = &[
    ("%", LengthUnit::Percent),
    ("em", LengthUnit::Em),
    ("ex", LengthUnit::Ex),
    ("px", LengthUnit::Px),
    ("in", LengthUnit::In),
    ("cm", LengthUnit::Cm),
    ("mm", LengthUnit::Mm),
    ("pt", LengthUnit::Pt),
    ("pc", LengthUnit::Pc),
];

impl LengthUnit {
    /// The number of user units in one unit, for units that have a fixed size.
    ///
    /// Everything else, including `pc`, returns `1` and must be resolved by the caller.
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            LengthUnit::Pt => 1.25,
            LengthUnit::Mm => 3.543307,
            LengthUnit::Cm => 35.43307,
            LengthUnit::In => 90.0,
            _ => 1.0,
        }
    }
}

/// A [`<length>`] value.
///
/// [`<length>`]: https://www.w3.org/TR/SVG2/types.html#InterfaceSVGLength
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Length {
    pub number: f64,
    pub unit: LengthUnit,
}

impl Length {
    /// Creates a new length.
    #[inline]
    pub fn new(number: f64, unit: LengthUnit) -> Length {
        Length { number, unit }
    }

    /// Creates a unitless length.
    #[inline]
    pub fn new_number(number: f64) -> Length {
        Length::new(number, LengthUnit::None)
    }

    /// Creates a unitless zero.
    #[inline]
    pub fn zero() -> Length {
        Length::new_number(0.0)
    }
}

impl Default for Length {
    fn default() -> Self {
        Length::zero()
    }
}

impl std::str::FromStr for Length {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let length = s.length()?;
        s.expect_done()?;
        Ok(length)
    }
}

impl<'a> Scanner<'a> {
    /// Parses a length. An unknown suffix is left unconsumed.
    pub fn length(&mut self) -> Result<Length, Error> {
        let number = self.number()?;
        let rest = self.rest();
        let unit = match UNITS.iter().find(|(name, _)| rest.starts_with(*name)) {
            Some(&(name, unit)) => {
                self.bump(name.len());
                unit
            }
            None => LengthUnit::None,
        };

        Ok(Length::new(number, unit))
    }

    /// Parses a list item: a length followed by an optional comma.
    pub fn list_length(&mut self) -> Result<Length, Error> {
        if self.is_done() {
            return Err(Error::UnexpectedEnd);
        }

        let length = self.length()?;
        self.skip_ws();
        self.eat(b',');
        Ok(length)
    }
}

/// A pull-based [`<list-of-length>`] parser.
///
/// Yields nothing after the first error.
///
/// [`<list-of-length>`]: https://www.w3.org/TR/SVG2/types.html#InterfaceSVGLengthList
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LengthListParser<'a>(Scanner<'a>);

impl<'a> From<&'a str> for LengthListParser<'a> {
    fn from(text: &'a str) -> Self {
        let mut s = Scanner::new(text);
        s.skip_ws();
        LengthListParser(s)
    }
}

impl Iterator for LengthListParser<'_> {
    type Item = Result<Length, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_done() {
            return None;
        }

        let item = self.0.list_length();
        if item.is_err() {
            self.0.finish();
        }

        Some(item)
    }
}
