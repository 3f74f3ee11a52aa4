// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Error;

/// A byte cursor over an attribute value.
///
/// All the tokenizers in this crate are built on top of it.
/// It never panics: reading past the end yields `None` or [`Error::UnexpectedEnd`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Scanner<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner at the start of `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        Scanner { text, offset: 0 }
    }

    /// The current byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Checks that nothing is left.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// The unconsumed part of the input.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.text[self.offset..]
    }

    /// The current byte.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.offset).copied()
    }

    /// The current byte, or an error at the end of input.
    #[inline]
    pub fn peek_or_end(&self) -> Result<u8, Error> {
        self.peek().ok_or(Error::UnexpectedEnd)
    }

    /// Moves forward by `n` bytes, stopping at the end.
    #[inline]
    pub fn bump(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.text.len());
    }

    /// Consumes the rest of the input.
    ///
    /// List parsers call this after an error, so they yield nothing afterwards.
    #[inline]
    pub fn finish(&mut self) {
        self.offset = self.text.len();
    }

    /// Skips XML whitespace.
    pub fn skip_ws(&mut self) {
        let n = self
            .rest()
            .bytes()
            .take_while(|c| matches!(c, b' ' | b'\t' | b'\n' | b'\r'))
            .count();
        self.offset += n;
    }

    /// Consumes `c` if it's the current byte.
    #[inline]
    pub fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `c` or fails.
    pub fn expect(&mut self, c: u8) -> Result<(), Error> {
        let found = self.peek_or_end()?;
        if found != c {
            return Err(self.mismatch(&[c], 1));
        }

        self.offset += 1;
        Ok(())
    }

    /// Consumes `keyword` or fails.
    pub fn expect_str(&mut self, keyword: &str) -> Result<(), Error> {
        if self.is_done() {
            return Err(Error::UnexpectedEnd);
        }

        if !self.rest().starts_with(keyword) {
            return Err(self.mismatch(keyword.as_bytes(), keyword.chars().count()));
        }

        self.offset += keyword.len();
        Ok(())
    }

    fn mismatch(&self, expected: &[u8], chars: usize) -> Error {
        Error::Mismatch {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: self.rest().chars().take(chars).collect(),
            pos: self.char_pos(),
        }
    }

    /// Consumes bytes while `pred` holds and returns them.
    pub fn take_while<F: Fn(u8) -> bool>(&mut self, pred: F) -> &'a str {
        let start = self.offset;
        let n = self.rest().bytes().take_while(|c| pred(*c)).count();
        self.offset += n;
        &self.text[start..self.offset]
    }

    /// Consumes an ASCII identifier, like `rgb`, `xMidYMid` or `skewX`.
    #[inline]
    pub fn ident(&mut self) -> &'a str {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_')
    }

    /// Fails unless only whitespace is left.
    pub fn expect_done(&mut self) -> Result<(), Error> {
        self.skip_ws();
        if self.is_done() {
            Ok(())
        } else {
            Err(Error::UnexpectedToken(self.char_pos()))
        }
    }

    /// The current position in chars, 1-based.
    #[inline]
    pub fn char_pos(&self) -> usize {
        self.char_pos_of(self.offset)
    }

    /// Converts a byte offset into a 1-based char position.
    pub fn char_pos_of(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .take_while(|(idx, _)| *idx < offset)
            .count()
            + 1
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_reports_found_char() {
        let mut s = Scanner::new("ab");
        assert_eq!(s.expect(b'(').unwrap_err().to_string(),
                   "expected '(' at position 1, found 'a'");
        assert_eq!(s.offset(), 0);
    }

    #[test]
    fn expect_str_reports_prefix() {
        let mut s = Scanner::new(" urx(#a)");
        s.skip_ws();
        assert_eq!(s.expect_str("url(").unwrap_err().to_string(),
                   "expected 'url(' at position 2, found 'urx('");
    }

    #[test]
    fn char_positions_ignore_multibyte() {
        let mut s = Scanner::new("ёж q");
        s.take_while(|c| c != b' ');
        assert_eq!(s.offset(), 4);
        assert_eq!(s.char_pos(), 3);
        assert_eq!(s.expect_done().unwrap_err(), Error::UnexpectedToken(4));
    }

    #[test]
    fn bump_stops_at_end() {
        let mut s = Scanner::new("abc");
        s.bump(10);
        assert!(s.is_done());
        assert_eq!(s.peek(), None);
        assert_eq!(s.peek_or_end(), Err(Error::UnexpectedEnd));
    }
}
