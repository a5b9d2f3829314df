/*
 * line_folding.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Mimemail, MIME header decoding for mail clients.
 *
 * Mimemail is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Mimemail is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Mimemail.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Strips CR, LF and NUL from a byte stream so folded base64 decodes as one run.

use std::io::{self, Read};

#[inline]
fn is_folding_byte(b: u8) -> bool {
    b == b'\r' || b == b'\n' || b == 0
}

pub struct LineFoldingStripper<R> {
    source: R,
}

impl<R: Read> LineFoldingStripper<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read> Read for LineFoldingStripper<R> {
    /// Filters in place. Loops until at least one byte survives or the source is exhausted,
    /// since returning 0 would read as end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let n = self.source.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                let b = buf[i];
                if !is_folding_byte(b) {
                    buf[kept] = b;
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_breaks() {
        let mut out = String::new();
        LineFoldingStripper::new(&b"aaaa\nbbbbb\nccc\r\nddd"[..])
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "aaaabbbbbcccddd");
    }

    #[test]
    fn strips_nul() {
        let mut out = Vec::new();
        LineFoldingStripper::new(&b"a\0b\0"[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ab");
    }

    #[test]
    fn all_folding_chunk_is_not_end_of_stream() {
        let mut stripper = LineFoldingStripper::new(&b"\r\n\r\nxy"[..]);
        let mut buf = [0u8; 4];
        assert_eq!(stripper.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"xy");
        assert_eq!(stripper.read(&mut buf).unwrap(), 0);
    }
}
