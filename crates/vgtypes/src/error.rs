// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// A tokenizer error.
///
/// Positions are 1-based and counted in chars, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input ended in the middle of a value.
    UnexpectedEnd,

    /// A token that cannot appear at this position.
    UnexpectedToken(usize),

    /// A specific char or keyword was required.
    Mismatch {
        /// What the parser was looking for.
        expected: String,
        /// What the input contains instead.
        found: String,
        /// Where the mismatch starts.
        pos: usize,
    },

    /// Not a number at all, or a number with a broken exponent.
    InvalidNumber(usize),

    /// The value is well-formed, but doesn't make sense.
    ///
    /// For example, an unknown color name or a zero-sized `viewBox`.
    InvalidValue,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnexpectedEnd => write!(f, "unexpected end of input"),
            Error::UnexpectedToken(pos) => write!(f, "unexpected token at position {}", pos),
            Error::Mismatch {
                expected,
                found,
                pos,
            } => write!(
                f,
                "expected '{}' at position {}, found '{}'",
                expected, pos, found
            ),
            Error::InvalidNumber(pos) => write!(f, "malformed number at position {}", pos),
            Error::InvalidValue => write!(f, "invalid value"),
        }
    }
}

impl std::error::Error for Error {}
