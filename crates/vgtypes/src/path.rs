// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Error, Scanner};

/// A path data command with its arguments.
///
/// `abs` is `false` for the lowercase, relative form.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PathSegment {
    MoveTo {
        abs: bool,
        x: f64,
        y: f64,
    },
    LineTo {
        abs: bool,
        x: f64,
        y: f64,
    },
    HorizontalLineTo {
        abs: bool,
        x: f64,
    },
    VerticalLineTo {
        abs: bool,
        y: f64,
    },
    CurveTo {
        abs: bool,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    SmoothCurveTo {
        abs: bool,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Quadratic {
        abs: bool,
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
    },
    SmoothQuadratic {
        abs: bool,
        x: f64,
        y: f64,
    },
    EllipticalArc {
        abs: bool,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    ClosePath {
        abs: bool,
    },
}

/// A pull-based [path data] tokenizer.
///
/// Implicit commands are made explicit: the coordinate pairs after a `MoveTo`
/// become `LineTo`, so `M 10 20 30 40` yields `M 10 20` and `L 30 40`.
/// Yields nothing after the first error.
///
/// ```
/// use vgtypes::{PathParser, PathSegment};
///
/// let segments: Vec<_> = PathParser::from("M10-20l30.1.5z").flatten().collect();
/// assert_eq!(segments, [
///     PathSegment::MoveTo { abs: true, x: 10.0, y: -20.0 },
///     PathSegment::LineTo { abs: false, x: 30.1, y: 0.5 },
///     PathSegment::ClosePath { abs: false },
/// ]);
/// ```
///
/// [path data]: https://www.w3.org/TR/SVG2/paths.html#PathData
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PathParser<'a> {
    scanner: Scanner<'a>,
    prev: Option<u8>,
}

impl<'a> From<&'a str> for PathParser<'a> {
    fn from(text: &'a str) -> Self {
        PathParser {
            scanner: Scanner::new(text),
            prev: None,
        }
    }
}

impl Iterator for PathParser<'_> {
    type Item = Result<PathSegment, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.skip_ws();
        if self.scanner.is_done() {
            return None;
        }

        let segment = self.next_segment();
        if segment.is_err() {
            self.scanner.finish();
        }

        Some(segment)
    }
}

impl PathParser<'_> {
    fn next_segment(&mut self) -> Result<PathSegment, Error> {
        let s = &mut self.scanner;
        let pos = s.char_pos();
        let c = s.peek_or_end()?;

        let cmd = if arg_count(c).is_some() {
            if self.prev.is_none() && !matches!(c, b'M' | b'm') {
                return Err(Error::UnexpectedToken(pos));
            }

            s.bump(1);
            c
        } else if matches!(c, b'0'..=b'9' | b'.' | b'-' | b'+') {
            // A repeated command.
            match self.prev {
                None | Some(b'Z' | b'z') => return Err(Error::UnexpectedToken(pos)),
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(prev) => prev,
            }
        } else {
            return Err(Error::UnexpectedToken(pos));
        };

        let is_arc = cmd.to_ascii_lowercase() == b'a';
        let mut v = [0.0; 7];
        let mut flags = [false; 2];
        for i in 0..arg_count(cmd).unwrap_or(0) {
            match i {
                3 | 4 if is_arc => flags[i - 3] = s.flag()?,
                _ => v[i] = s.list_number()?,
            }
        }

        self.prev = Some(cmd);

        let abs = cmd.is_ascii_uppercase();
        let segment = match cmd.to_ascii_lowercase() {
            b'm' => PathSegment::MoveTo { abs, x: v[0], y: v[1] },
            b'l' => PathSegment::LineTo { abs, x: v[0], y: v[1] },
            b'h' => PathSegment::HorizontalLineTo { abs, x: v[0] },
            b'v' => PathSegment::VerticalLineTo { abs, y: v[0] },
            b'c' => PathSegment::CurveTo {
                abs,
                x1: v[0],
                y1: v[1],
                x2: v[2],
                y2: v[3],
                x: v[4],
                y: v[5],
            },
            b's' => PathSegment::SmoothCurveTo {
                abs,
                x2: v[0],
                y2: v[1],
                x: v[2],
                y: v[3],
            },
            b'q' => PathSegment::Quadratic {
                abs,
                x1: v[0],
                y1: v[1],
                x: v[2],
                y: v[3],
            },
            b't' => PathSegment::SmoothQuadratic { abs, x: v[0], y: v[1] },
            b'a' => PathSegment::EllipticalArc {
                abs,
                rx: v[0],
                ry: v[1],
                x_axis_rotation: v[2],
                large_arc: flags[0],
                sweep: flags[1],
                x: v[5],
                y: v[6],
            },
            _ => PathSegment::ClosePath { abs },
        };

        Ok(segment)
    }
}

/// The number of arguments a command takes, or `None` for a non-command.
fn arg_count(cmd: u8) -> Option<usize> {
    let n = match cmd.to_ascii_lowercase() {
        b'z' => 0,
        b'h' | b'v' => 1,
        b'm' | b'l' | b't' => 2,
        b's' | b'q' => 4,
        b'c' => 6,
        b'a' => 7,
        _ => return None,
    };

    Some(n)
}

impl Scanner<'_> {
    /// Parses an arc flag.
    ///
    /// Flags are a single char, so `a5 5 30 0110 20` has the flags `0` and `1`.
    fn flag(&mut self) -> Result<bool, Error> {
        self.skip_ws();
        let flag = match self.peek_or_end()? {
            b'0' => false,
            b'1' => true,
            _ => return Err(Error::UnexpectedToken(self.char_pos())),
        };

        self.bump(1);
        self.skip_ws();
        self.eat(b',');
        Ok(flag)
    }
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (Vec<PathSegment>, bool) {
        let mut segments = Vec::new();
        for segment in PathParser::from(text) {
            match segment {
                Ok(v) => segments.push(v),
                Err(_) => return (segments, false),
            }
        }

        (segments, true)
    }

    macro_rules! path {
        ($name:ident, $text:expr, $ok:expr, [$( $seg:expr ),*]) => (
            #[test]
            fn $name() {
                let expected: Vec<PathSegment> = vec![$( $seg ),*];
                assert_eq!(parse($text), (expected, $ok));
            }
        )
    }

    use PathSegment::*;

    path!(empty, "  ", true, []);
    path!(garbage, "q", false, []);
    path!(starts_with_line, "L 20 30", false, []);
    path!(truncated_line, "M 10 20 L 30 40 L 50", false, [
        MoveTo { abs: true, x: 10.0, y: 20.0 },
        LineTo { abs: true, x: 30.0, y: 40.0 }
    ]);
    path!(implicit_line_to, "m 10 20 30 40 50 60", true, [
        MoveTo { abs: false, x: 10.0, y: 20.0 },
        LineTo { abs: false, x: 30.0, y: 40.0 },
        LineTo { abs: false, x: 50.0, y: 60.0 }
    ]);
    path!(lines_and_close, "M10,20 H 30 V40 Z", true, [
        MoveTo { abs: true, x: 10.0, y: 20.0 },
        HorizontalLineTo { abs: true, x: 30.0 },
        VerticalLineTo { abs: true, y: 40.0 },
        ClosePath { abs: true }
    ]);
    path!(repeated_curves, "M 0 0 c 1 2 3 4 5 6 7 8 9 10 11 12", true, [
        MoveTo { abs: true, x: 0.0, y: 0.0 },
        CurveTo { abs: false, x1: 1.0, y1: 2.0, x2: 3.0, y2: 4.0, x: 5.0, y: 6.0 },
        CurveTo { abs: false, x1: 7.0, y1: 8.0, x2: 9.0, y2: 10.0, x: 11.0, y: 12.0 }
    ]);
    path!(smooth_and_quad, "M0 0 S1 2 3 4 Q5 6 7 8 t9 10", true, [
        MoveTo { abs: true, x: 0.0, y: 0.0 },
        SmoothCurveTo { abs: true, x2: 1.0, y2: 2.0, x: 3.0, y: 4.0 },
        Quadratic { abs: true, x1: 5.0, y1: 6.0, x: 7.0, y: 8.0 },
        SmoothQuadratic { abs: false, x: 9.0, y: 10.0 }
    ]);
    path!(arc, "M 10 20 A 5 4 30 1 0 20 20", true, [
        MoveTo { abs: true, x: 10.0, y: 20.0 },
        EllipticalArc { abs: true, rx: 5.0, ry: 4.0, x_axis_rotation: 30.0,
                        large_arc: true, sweep: false, x: 20.0, y: 20.0 }
    ]);
    path!(arc_packed_flags, "M 10 20 a5 5 30 0110 20", true, [
        MoveTo { abs: true, x: 10.0, y: 20.0 },
        EllipticalArc { abs: false, rx: 5.0, ry: 5.0, x_axis_rotation: 30.0,
                        large_arc: false, sweep: true, x: 10.0, y: 20.0 }
    ]);
    path!(arc_bad_flag, "M 0 0 A 5 5 0 2 0 1 1", false, [
        MoveTo { abs: true, x: 0.0, y: 0.0 }
    ]);
    path!(number_after_close, "M 10 20 Z 5", false, [
        MoveTo { abs: true, x: 10.0, y: 20.0 },
        ClosePath { abs: true }
    ]);
    path!(packed_numbers, "M10-20l30.1.5.1-20z", true, [
        MoveTo { abs: true, x: 10.0, y: -20.0 },
        LineTo { abs: false, x: 30.1, y: 0.5 },
        LineTo { abs: false, x: 0.1, y: -20.0 },
        ClosePath { abs: false }
    ]);
}
