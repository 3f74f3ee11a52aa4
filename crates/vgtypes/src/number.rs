// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, Scanner};

/// An [SVG number](https://www.w3.org/TR/SVG2/types.html#InterfaceSVGNumber).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Number(pub f64);

impl std::str::FromStr for Number {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut s = Scanner::new(text);
        let n = s.number()?;
        s.expect_done()?;
        Ok(Number(n))
    }
}

/// Scans a number at the start of `text`.
///
/// Never fails. Returns `(0.0, false)` when `text` doesn't start with a number.
/// Trailing data is ignored.
///
/// # Examples
///
/// ```
/// use vgtypes::scan_number;
///
/// assert_eq!(scan_number(" 12.5px"), (12.5, true));
/// assert_eq!(scan_number("qwe"), (0.0, false));
/// ```
pub fn scan_number(text: &str) -> (f64, bool) {
    match Scanner::new(text).number() {
        Ok(n) => (n, true),
        Err(_) => (0.0, false),
    }
}

/// Returns the byte length of a number at the start of `b`.
///
/// `sign? digits? ('.' digits?)? exponent?`, where at least one digit must be
/// present before the exponent. An `e` followed by `m` or `x` is a unit, not an exponent.
fn number_len(b: &[u8]) -> Option<usize> {
    let digits = |from: usize| b[from..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut len = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int = digits(len);
    len += int;

    let mut frac = 0;
    if b.get(len) == Some(&b'.') {
        len += 1;
        frac = digits(len);
        len += frac;
    }

    if int == 0 && frac == 0 {
        return None;
    }

    if matches!(b.get(len), Some(b'e' | b'E')) {
        match b.get(len + 1) {
            None => return None,
            Some(b'm' | b'x') => {}
            Some(_) => {
                let mut exp = len + 1;
                if matches!(b.get(exp), Some(b'+' | b'-')) {
                    exp += 1;
                }

                let n = digits(exp);
                if n == 0 {
                    return None;
                }
                len = exp + n;
            }
        }
    }

    Some(len)
}

impl<'a> Scanner<'a> {
    /// Parses a number, skipping leading whitespace.
    ///
    /// Values that don't fit into an `f32` become zero,
    /// so garbage exponents never leak into geometry.
    ///
    /// # Errors
    ///
    /// Returns only `InvalidNumber`. The scanner doesn't move on error.
    pub fn number(&mut self) -> Result<f64, Error> {
        self.skip_ws();
        let start = self.offset();
        let invalid = || Error::InvalidNumber(self.char_pos_of(start));

        let len = number_len(self.rest().as_bytes()).ok_or_else(invalid)?;
        let n: f64 = self.rest()[..len].parse().map_err(|_| invalid())?;
        self.bump(len);

        if n.is_finite() && (n as f32).is_finite() {
            Ok(n)
        } else {
            Ok(0.0)
        }
    }

    /// Parses a list item: a number followed by an optional comma.
    pub fn list_number(&mut self) -> Result<f64, Error> {
        if self.is_done() {
            return Err(Error::UnexpectedEnd);
        }

        let n = self.number()?;
        self.skip_ws();
        self.eat(b',');
        Ok(n)
    }

    /// Parses a number or a percentage. A percentage is divided by 100.
    pub fn number_or_percent(&mut self) -> Result<f64, Error> {
        let n = self.number()?;
        Ok(if self.eat(b'%') { n / 100.0 } else { n })
    }

    /// Parses a list item: a number or a percentage followed by an optional comma.
    pub fn list_number_or_percent(&mut self) -> Result<f64, Error> {
        if self.is_done() {
            return Err(Error::UnexpectedEnd);
        }

        let n = self.number_or_percent()?;
        self.skip_ws();
        self.eat(b',');
        Ok(n)
    }
}

/// A pull-based [`<list-of-numbers>`] parser.
///
/// Yields nothing after the first error.
///
/// ```
/// use vgtypes::NumberListParser;
///
/// let list: Vec<f64> = NumberListParser::from("10, 20 -50").flatten().collect();
/// assert_eq!(list, [10.0, 20.0, -50.0]);
/// ```
///
/// [`<list-of-numbers>`]: https://www.w3.org/TR/SVG2/types.html#InterfaceSVGNumberList
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NumberListParser<'a>(Scanner<'a>);

impl<'a> From<&'a str> for NumberListParser<'a> {
    fn from(text: &'a str) -> Self {
        let mut s = Scanner::new(text);
        s.skip_ws();
        NumberListParser(s)
    }
}

impl Iterator for NumberListParser<'_> {
    type Item = Result<f64, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_done() {
            return None;
        }

        let item = self.0.list_number();
        if item.is_err() {
            self.0.finish();
        }

        Some(item)
    }
}
