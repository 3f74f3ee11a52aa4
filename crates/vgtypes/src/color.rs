// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{colors, Error, Scanner};

/// A [CSS3 color](https://www.w3.org/TR/css-color-3/) in sRGB.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// Creates an opaque color.
    #[inline]
    pub fn new_rgb(red: u8, green: u8, blue: u8) -> Color {
        Color::new_rgba(red, green, blue, 255)
    }

    /// Creates a color.
    #[inline]
    pub fn new_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Opaque black.
    #[inline]
    pub fn black() -> Color {
        Color::new_rgb(0, 0, 0)
    }

    /// Opaque white.
    #[inline]
    pub fn white() -> Color {
        Color::new_rgb(255, 255, 255)
    }

    /// Opaque red.
    #[inline]
    pub fn red() -> Color {
        Color::new_rgb(255, 0, 0)
    }

    /// Transparent black.
    #[inline]
    pub fn transparent() -> Color {
        Color::new_rgba(0, 0, 0, 0)
    }
}

impl std::str::FromStr for Color {
    type Err = Error;

    /// Parses a color.
    ///
    /// Supports `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, the 12-digit `#rrrrggggbbbb` form
    /// (only the high byte of each channel is kept), `rgb()`, `rgba()`, `hsl()`, `hsla()`
    /// and named colors. Function and color names are case-insensitive.
    ///
    /// A trailing `<icccolor>` is an error.
    fn from_str(text: &str) -> Result<Self, Error> {
        let mut s = Scanner::new(text);
        let color = s.color()?;
        s.expect_done()?;
        Ok(color)
    }
}

impl<'a> Scanner<'a> {
    /// Parses a color, skipping leading whitespace.
    pub fn color(&mut self) -> Result<Color, Error> {
        self.skip_ws();
        if self.eat(b'#') {
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            return hex_color(digits.as_bytes()).ok_or(Error::InvalidValue);
        }

        match self.ident().to_ascii_lowercase().as_str() {
            "rgb" | "rgba" => self.rgb_function(),
            "hsl" | "hsla" => self.hsl_function(),
            name => colors::from_str(name).ok_or(Error::InvalidValue),
        }
    }

    fn rgb_function(&mut self) -> Result<Color, Error> {
        self.skip_ws();
        self.expect(b'(')?;

        // The first channel decides whether all of them are percentages.
        let first = self.number()?;
        let percent = self.eat(b'%');
        self.skip_ws();
        self.eat(b',');

        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            *channel = if percent {
                let v = if i == 0 { first / 100.0 } else { self.list_number_or_percent()? };
                unit_to_byte(v)
            } else {
                let v = if i == 0 { first } else { self.list_number()? };
                v.round().clamp(0.0, 255.0) as u8
            };
        }

        let [red, green, blue] = channels;
        let alpha = self.alpha_and_close()?;
        Ok(Color::new_rgba(red, green, blue, alpha))
    }

    fn hsl_function(&mut self) -> Result<Color, Error> {
        self.skip_ws();
        self.expect(b'(')?;

        let hue = self.list_number()?.rem_euclid(360.0);
        let saturation = self.list_number_or_percent()?.clamp(0.0, 1.0);
        let lightness = self.list_number_or_percent()?.clamp(0.0, 1.0);

        let mut color = hsl_to_rgb(hue, saturation, lightness);
        color.alpha = self.alpha_and_close()?;
        Ok(color)
    }

    fn alpha_and_close(&mut self) -> Result<u8, Error> {
        self.skip_ws();
        let alpha = if self.peek() == Some(b')') {
            255
        } else {
            unit_to_byte(self.list_number_or_percent()?)
        };

        self.skip_ws();
        self.expect(b')')?;
        Ok(alpha)
    }
}

fn hex_color(digits: &[u8]) -> Option<Color> {
    let mut n = [0u8; 12];
    for (v, c) in n.iter_mut().zip(digits) {
        *v = (*c as char).to_digit(16).unwrap_or(0) as u8;
    }

    let short = |i: usize| n[i] << 4 | n[i];
    let long = |i: usize| n[i] << 4 | n[i + 1];

    let color = match digits.len() {
        3 => Color::new_rgb(short(0), short(1), short(2)),
        4 => Color::new_rgba(short(0), short(1), short(2), short(3)),
        6 => Color::new_rgb(long(0), long(2), long(4)),
        8 => Color::new_rgba(long(0), long(2), long(4), long(6)),
        12 => Color::new_rgb(long(0), long(4), long(8)),
        _ => return None,
    };

    Some(color)
}

#[inline]
fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

// https://www.w3.org/TR/css-color-4/#hsl-to-rgb
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Color {
    let a = saturation * lightness.min(1.0 - lightness);
    let channel = |n: f64| {
        let k = (n + hue / 30.0) % 12.0;
        let v = lightness - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
        unit_to_byte(v)
    };

    Color::new_rgb(channel(0.0), channel(8.0), channel(4.0))
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use super::*;

    macro_rules! color {
        ($name:ident, $text:expr, $color:expr) => {
            #[test]
            fn $name() {
                assert_eq!(Color::from_str($text).unwrap(), $color);
            }
        };
    }

    color!(hex6,             "#1a2B3c",                 Color::new_rgb(0x1a, 0x2b, 0x3c));
    color!(hex3,             "#0f8",                    Color::new_rgb(0, 255, 136));
    color!(hex8,             "#ff000080",               Color::new_rgba(255, 0, 0, 128));
    color!(hex4,             "#f008",                   Color::new_rgba(255, 0, 0, 136));
    color!(hex12,            "#ffff80000000",           Color::new_rgb(255, 128, 0));
    color!(rgb_integers,     "rgb(254, 203, 231)",      Color::new_rgb(254, 203, 231));
    color!(rgb_clamped,      "rgb(300, -20, 10.4)",     Color::new_rgb(255, 0, 10));
    color!(rgb_percentages,  "rgb(50%, 0%, 100%)",      Color::new_rgb(128, 0, 255));
    color!(rgb_padded,       "  rgb( 7 ,8 , 9 )  ",     Color::new_rgb(7, 8, 9));
    color!(rgba_alpha,       "rgba(10, 20, 30, 0.5)",   Color::new_rgba(10, 20, 30, 128));
    color!(rgb_upper_case,   "RGB(1 2 3)",              Color::new_rgb(1, 2, 3));
    color!(hsl_green,        "hsl(120, 100%, 25%)",     Color::new_rgb(0, 128, 0));
    color!(hsl_negative_hue, "hsl(-240, 100%, 50%)",    Color::new_rgb(0, 255, 0));
    color!(hsla_alpha,       "hsla(0, 0%, 100%, 0)",    Color::new_rgba(255, 255, 255, 0));
    color!(named,            "tomato",                  Color::new_rgb(255, 99, 71));
    color!(named_any_case,   "LightGoldenRodYellow",    Color::new_rgb(250, 250, 210));
    color!(named_transparent, "transparent",            Color::transparent());

    #[test]
    fn errors() {
        assert_eq!(Color::from_str("text"), Err(Error::InvalidValue));
        assert_eq!(Color::from_str("#12345"), Err(Error::InvalidValue));
        assert_eq!(Color::from_str("#CD853F icc-color(acmecmyk, 0.11, 0.48, 0.83, 0.00)"),
                   Err(Error::UnexpectedToken(9)));
        assert_eq!(Color::from_str("rgb(1, 2, 3"), Err(Error::UnexpectedEnd));
    }
}
