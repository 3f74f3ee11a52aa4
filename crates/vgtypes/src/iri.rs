// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, Scanner};

/// A local [`<IRI>`] link, like `#id`. Holds the `id` part.
///
/// [`<IRI>`]: https://www.w3.org/TR/SVG11/types.html#DataTypeIRI
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IRI<'a>(pub &'a str);

impl<'a> IRI<'a> {
    /// Parses an `IRI`.
    ///
    /// The id is not checked against the XML `Name` production.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'a str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let id = s.iri()?;
        s.expect_done()?;
        Ok(IRI(id))
    }
}

/// A [`<FuncIRI>`] link, like `url(#id)`. Holds the `id` part.
///
/// [`<FuncIRI>`]: https://www.w3.org/TR/SVG11/types.html#DataTypeFuncIRI
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FuncIRI<'a>(pub &'a str);

impl<'a> FuncIRI<'a> {
    /// Parses a `FuncIRI`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'a str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let id = s.func_iri()?;
        s.expect_done()?;
        Ok(FuncIRI(id))
    }
}

impl<'a> Scanner<'a> {
    /// Parses `#id` and returns `id`.
    pub fn iri(&mut self) -> Result<&'a str, Error> {
        self.skip_ws();
        self.expect(b'#')?;
        non_empty(self.take_while(|c| !is_xml_space(c)))
    }

    /// Parses `url(#id)` and returns `id`. The link may be quoted.
    pub fn func_iri(&mut self) -> Result<&'a str, Error> {
        self.skip_ws();
        self.expect_str("url(")?;
        self.skip_ws();

        let quote = match self.peek_or_end()? {
            c @ (b'\'' | b'"') => {
                self.bump(1);
                self.skip_ws();
                Some(c)
            }
            _ => None,
        };

        self.expect(b'#')?;
        let id = non_empty(
            self.take_while(|c| !is_xml_space(c) && !matches!(c, b')' | b'\'' | b'"')),
        )?;
        self.skip_ws();

        if let Some(quote) = quote {
            self.expect(quote)?;
            self.skip_ws();
        }

        self.expect(b')')?;
        Ok(id)
    }
}

fn non_empty(id: &str) -> Result<&str, Error> {
    if id.is_empty() {
        Err(Error::InvalidValue)
    } else {
        Ok(id)
    }
}

#[inline]
fn is_xml_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri() {
        assert_eq!(IRI::from_str("#id").unwrap(), IRI("id"));
        assert_eq!(IRI::from_str("  #id\n").unwrap(), IRI("id"));
        assert_eq!(IRI::from_str("#a:b.c").unwrap(), IRI("a:b.c"));
    }

    #[test]
    fn iri_errors() {
        assert_eq!(IRI::from_str("# id"), Err(Error::InvalidValue));
        assert_eq!(IRI::from_str("#id text"), Err(Error::UnexpectedToken(5)));
        assert_eq!(IRI::from_str("id").unwrap_err().to_string(),
                   "expected '#' at position 1, found 'i'");
    }

    #[test]
    fn func_iri() {
        assert_eq!(FuncIRI::from_str("url(#id)").unwrap(), FuncIRI("id"));
        assert_eq!(FuncIRI::from_str(" url(  #id  ) ").unwrap(), FuncIRI("id"));
        assert_eq!(FuncIRI::from_str("url('#id')").unwrap(), FuncIRI("id"));
        assert_eq!(FuncIRI::from_str("url(\" #id \")").unwrap(), FuncIRI("id"));
    }

    #[test]
    fn func_iri_prefix_in_a_longer_value() {
        let mut s = Scanner::new("url(#grad) red");
        assert_eq!(s.func_iri().unwrap(), "grad");
        assert_eq!(s.rest(), " red");
    }

    #[test]
    fn func_iri_errors() {
        assert_eq!(FuncIRI::from_str("url (#id)").unwrap_err().to_string(),
                   "expected 'url(' at position 1, found 'url '");
        assert_eq!(FuncIRI::from_str("url(#)"), Err(Error::InvalidValue));
        assert_eq!(FuncIRI::from_str("url('#id)").unwrap_err().to_string(),
                   "expected ''' at position 9, found ')'");
        assert_eq!(FuncIRI::from_str("url(#id"), Err(Error::UnexpectedEnd));
    }
}
