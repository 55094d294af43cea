// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use svgtypes::{Length, LengthUnit};

/// An integer rectangle.
///
/// Width and height are guarantee to be >= 0.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    /// Creates a new `Rect` from values.
    ///
    /// Returns `None` when width or height is negative.
    #[inline]
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        if width >= 0 && height >= 0 {
            Some(Rect {
                x,
                y,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Returns rect's X position.
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Returns rect's Y position.
    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Returns rect's width.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Returns rect's height.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    #[inline]
    fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Checks that the rect has a zero width or height.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns rect's area.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Checks that the union of `self` and `other` is `self`.
    ///
    /// An empty rect is contained by any non-empty one.
    /// An empty rect contains nothing.
    pub fn contains(&self, other: &Rect) -> bool {
        if self.is_empty() {
            return false;
        }

        if other.is_empty() {
            return true;
        }

        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the rect moved into the coordinate system with the provided origin.
    #[inline]
    pub(crate) fn relative_to(&self, origin: &Rect) -> Rect {
        Rect {
            x: self.x.wrapping_sub(origin.x),
            y: self.y.wrapping_sub(origin.y),
            ..*self
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Parses a number with an optional `px` unit and rounds it half away from zero.
///
/// Returns `None` for other units, non-finite values
/// and values outside of the `i32` range.
pub(crate) fn parse_int(text: &str) -> Option<i32> {
    let n = parse_number(text)?;
    Some(n.round() as i32)
}

/// Parses a number with an optional `px` unit.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let length = Length::from_str(text.trim()).ok()?;
    if !matches!(length.unit, LengthUnit::None | LengthUnit::Px) {
        return None;
    }

    let n = length.number;
    if !n.is_finite() || n.abs() > i32::MAX as f64 {
        return None;
    }

    Some(n)
}

/// Parses `x y width height` separated by whitespaces and/or commas.
///
/// Each number may have a `px` unit. Returns `None` on a parsing error
/// or when width or height is negative.
pub(crate) fn parse_view_box(text: &str) -> Option<Rect> {
    let mut values = [0; 4];
    let mut count = 0;
    for part in text
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
    {
        if count == 4 {
            return None;
        }

        values[count] = parse_int(part)?;
        count += 1;
    }

    if count != 4 {
        return None;
    }

    Rect::from_xywh(values[0], values[1], values[2], values[3])
}
