// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::Error;

/// Extension methods for XML-subset only operations.
pub(crate) trait ByteExt {
    /// Checks if a byte is a space.
    ///
    /// `[ \r\n\t]`
    fn is_space(&self) -> bool;

    fn is_quote(&self) -> bool;

    /// Checks if a byte can be a part of an attribute name.
    ///
    /// A colon is not a name byte, so a namespace prefix is never included.
    fn is_name_byte(&self) -> bool;
}

impl ByteExt for u8 {
    #[inline]
    fn is_space(&self) -> bool {
        matches!(*self, b' ' | b'\t' | b'\n' | b'\r')
    }

    #[inline]
    fn is_quote(&self) -> bool {
        matches!(*self, b'\'' | b'"')
    }

    #[inline]
    fn is_name_byte(&self) -> bool {
        matches!(*self, b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'-' | b'_' | b'.')
            || *self >= 0x80
    }
}

/// A streaming byte reading interface.
///
/// Unlike a text parser, running past the end is never a panic:
/// every read returns `UnexpectedEndOfStream` instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Stream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> From<&'a [u8]> for Stream<'a> {
    #[inline]
    fn from(data: &'a [u8]) -> Self {
        Stream { data, pos: 0 }
    }
}

impl<'a> Stream<'a> {
    /// Checks if the stream is reached the end.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns a byte from a current stream position.
    ///
    /// # Errors
    ///
    /// - `UnexpectedEndOfStream`
    #[inline]
    pub fn curr_byte(&self) -> Result<u8, Error> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEndOfStream)
    }

    /// Returns a byte from a current stream position and advances by one.
    ///
    /// # Errors
    ///
    /// - `UnexpectedEndOfStream`
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let c = self.curr_byte()?;
        self.pos += 1;
        Ok(c)
    }

    /// Moves one byte back, so the last read byte will be read again.
    #[inline]
    pub fn step_back(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }

    /// Skips whitespaces.
    ///
    /// Accepted values: `' ' \n \r \t`.
    pub fn skip_spaces(&mut self) {
        while !self.at_end() && self.data[self.pos].is_space() {
            self.pos += 1;
        }
    }

    /// Consumes bytes up to and including the provided one.
    ///
    /// # Errors
    ///
    /// - `UnexpectedEndOfStream`
    pub fn skip_past(&mut self, c: u8) -> Result<(), Error> {
        while self.read_byte()? != c {}
        Ok(())
    }
}
