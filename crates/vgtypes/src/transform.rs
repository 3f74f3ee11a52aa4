// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use float_cmp::ApproxEqUlps;

use crate::{Error, Scanner};

/// An affine transform.
///
/// Maps a point as `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    #[inline]
    fn default() -> Transform {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl Transform {
    /// Creates a transform from matrix values.
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// A translation.
    #[inline]
    pub fn translate(tx: f64, ty: f64) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A scale.
    #[inline]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation by `angle` degrees.
    pub fn rotate(angle: f64) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        Transform::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// A horizontal skew by `angle` degrees.
    pub fn skew_x(angle: f64) -> Self {
        Transform::new(1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    /// A vertical skew by `angle` degrees.
    pub fn skew_y(angle: f64) -> Self {
        Transform::new(1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Returns `self × other`, so `other` is applied to a point first.
    pub fn then_apply(&self, other: &Transform) -> Transform {
        let (l, r) = (self, other);
        Transform {
            a: l.a * r.a + l.c * r.b,
            b: l.b * r.a + l.d * r.b,
            c: l.a * r.c + l.c * r.d,
            d: l.b * r.c + l.d * r.d,
            e: l.a * r.e + l.c * r.f + l.e,
            f: l.b * r.e + l.d * r.f + l.f,
        }
    }

    /// Maps a point.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Checks that the transform is an identity.
    pub fn is_identity(&self) -> bool {
        let eq = |v: f64, n: f64| v.approx_eq_ulps(&n, 4);
        eq(self.a, 1.0)
            && eq(self.b, 0.0)
            && eq(self.c, 0.0)
            && eq(self.d, 1.0)
            && eq(self.e, 0.0)
            && eq(self.f, 0.0)
    }

    /// Parses a transform list, keeping every function parsed before the first error.
    ///
    /// ```
    /// use vgtypes::Transform;
    ///
    /// let ts = Transform::parse_lossy("translate(10 20) scale(2) qwe(1)");
    /// assert_eq!(ts, Transform::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
    /// ```
    pub fn parse_lossy(text: &str) -> Transform {
        let mut ts = Transform::default();
        let _ = parse_list(text, &mut ts);
        ts
    }
}

impl std::str::FromStr for Transform {
    type Err = Error;

    /// Parses a [`<transform-list>`](https://www.w3.org/TR/SVG11/coords.html#TransformAttribute).
    ///
    /// An empty list is an identity.
    fn from_str(text: &str) -> Result<Self, Error> {
        let mut ts = Transform::default();
        parse_list(text, &mut ts)?;
        Ok(ts)
    }
}

/// Multiplies `ts` by each function of the list, left to right.
fn parse_list(text: &str, ts: &mut Transform) -> Result<(), Error> {
    let mut s = Scanner::new(text);
    loop {
        s.skip_ws();
        if s.is_done() {
            return Ok(());
        }

        *ts = ts.then_apply(&parse_function(&mut s)?);
        s.skip_ws();
        s.eat(b',');
    }
}

fn parse_function(s: &mut Scanner) -> Result<Transform, Error> {
    let start = s.offset();
    let name = s.ident();
    s.skip_ws();
    s.expect(b'(')?;

    let mut args = [0.0; 6];
    let mut len = 0;
    loop {
        s.skip_ws();
        if s.eat(b')') {
            break;
        }

        if len == args.len() {
            return Err(Error::UnexpectedToken(s.char_pos()));
        }

        args[len] = s.list_number()?;
        len += 1;
    }

    let ts = match (name, &args[..len]) {
        ("matrix", &[a, b, c, d, e, f]) => Transform::new(a, b, c, d, e, f),
        ("translate", &[tx]) => Transform::translate(tx, 0.0),
        ("translate", &[tx, ty]) => Transform::translate(tx, ty),
        ("scale", &[k]) => Transform::scale(k, k),
        ("scale", &[sx, sy]) => Transform::scale(sx, sy),
        ("rotate", &[angle]) => Transform::rotate(angle),
        ("rotate", &[angle, cx, cy]) => Transform::translate(cx, cy)
            .then_apply(&Transform::rotate(angle))
            .then_apply(&Transform::translate(-cx, -cy)),
        ("skewX", &[angle]) => Transform::skew_x(angle),
        ("skewY", &[angle]) => Transform::skew_y(angle),
        _ => return Err(Error::UnexpectedToken(s.char_pos_of(start))),
    };

    Ok(ts)
}
