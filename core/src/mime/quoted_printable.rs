/*
 * quoted_printable.rs
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

//! Quoted-Printable decoder (RFC 2045 bodies, RFC 2047 "Q" encoded-words).

use std::io::{self, Read};

use crate::error::MimeError;

const HEX_DECODE: [i8; 256] = {
    let mut t = [-1i8; 256];
    let mut i = 0u8;
    while i < 10 {
        t[(b'0' + i) as usize] = i as i8;
        i = i.wrapping_add(1);
    }
    let mut i = 0u8;
    while i < 6 {
        t[(b'A' + i) as usize] = (10 + i) as i8;
        t[(b'a' + i) as usize] = (10 + i) as i8;
        i = i.wrapping_add(1);
    }
    t
};

const INPUT_CHUNK: usize = 256;

/// Where the quoted-printable text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpMode {
    /// RFC 2047 "Q": `_` is a space, CR and LF are folding artifacts and dropped.
    Header,
    /// RFC 2045 body: `_` is literal, line endings are kept.
    Body,
}

enum Step {
    Byte(u8),
    Skip,
    End,
}

/// Streaming quoted-printable decoder over any byte source.
///
/// Decoding stops at the first malformed escape; bytes decoded before it are still
/// returned, and every later read reports the same error.
pub struct QuotedPrintableDecoder<R> {
    source: R,
    mode: QpMode,
    input: [u8; INPUT_CHUNK],
    input_pos: usize,
    input_len: usize,
    /// Byte read after a soft break `=\r` that turned out not to be LF.
    pending: Option<u8>,
    err: Option<MimeError>,
    done: bool,
}

impl<R: Read> QuotedPrintableDecoder<R> {
    pub fn new(source: R, mode: QpMode) -> Self {
        Self {
            source,
            mode,
            input: [0; INPUT_CHUNK],
            input_pos: 0,
            input_len: 0,
            pending: None,
            err: None,
            done: false,
        }
    }

    pub fn mode(&self) -> QpMode {
        self.mode
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn next_byte(&mut self) -> Result<Option<u8>, MimeError> {
        if let Some(b) = self.pending.take() {
            return Ok(Some(b));
        }
        if self.input_pos == self.input_len {
            let n = loop {
                match self.source.read(&mut self.input) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            };
            if n == 0 {
                return Ok(None);
            }
            self.input_pos = 0;
            self.input_len = n;
        }
        let b = self.input[self.input_pos];
        self.input_pos += 1;
        Ok(Some(b))
    }

    fn step(&mut self) -> Result<Step, MimeError> {
        let c = match self.next_byte()? {
            Some(c) => c,
            None => return Ok(Step::End),
        };
        match c {
            b'=' => self.escape(),
            b'_' if self.mode == QpMode::Header => Ok(Step::Byte(b' ')),
            b'\r' | b'\n' if self.mode == QpMode::Header => Ok(Step::Skip),
            _ => Ok(Step::Byte(c)),
        }
    }

    /// After `=`: two hex digits, or a soft line break (=LF, =CR, =CRLF).
    fn escape(&mut self) -> Result<Step, MimeError> {
        let hex1 = self.next_byte()?.ok_or(MimeError::MalformedEscape(Vec::new()))?;
        match hex1 {
            b'\n' => return Ok(Step::Skip),
            b'\r' => {
                match self.next_byte()? {
                    Some(b'\n') | None => {}
                    Some(other) => self.pending = Some(other),
                }
                return Ok(Step::Skip);
            }
            _ => {}
        }
        let hex2 = self.next_byte()?.ok_or_else(|| MimeError::MalformedEscape(vec![hex1]))?;
        let v1 = HEX_DECODE[hex1 as usize];
        let v2 = HEX_DECODE[hex2 as usize];
        if v1 < 0 || v2 < 0 {
            return Err(MimeError::MalformedEscape(vec![hex1, hex2]));
        }
        Ok(Step::Byte(((v1 as u8) << 4) | v2 as u8))
    }
}

impl<R: Read> Read for QuotedPrintableDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            if let Some(err) = &self.err {
                if n > 0 {
                    break;
                }
                return Err(err.clone().into());
            }
            if self.done {
                break;
            }
            match self.step() {
                Ok(Step::Byte(b)) => {
                    buf[n] = b;
                    n += 1;
                }
                Ok(Step::Skip) => {}
                Ok(Step::End) => self.done = true,
                Err(err) => self.err = Some(err),
            }
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8], mode: QpMode) -> Result<Vec<u8>, MimeError> {
        let mut out = Vec::new();
        QuotedPrintableDecoder::new(input, mode).read_to_end(&mut out)?;
        Ok(out)
    }

    /// Hands out one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match (self.0.split_first(), buf.is_empty()) {
                (Some((&b, rest)), false) => {
                    buf[0] = b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn underscore_depends_on_mode() {
        assert_eq!(decode(b"a_b", QpMode::Header).unwrap(), b"a b");
        assert_eq!(decode(b"a_b", QpMode::Body).unwrap(), b"a_b");
    }

    #[test]
    fn escaped_line_feed_in_body() {
        assert_eq!(decode(b"a=0Ab", QpMode::Body).unwrap(), b"a\nb");
    }

    #[test]
    fn hex_is_case_insensitive() {
        assert_eq!(decode(b"J=F6rg=e9", QpMode::Body).unwrap(), b"J\xF6rg\xE9");
    }

    #[test]
    fn soft_line_breaks_vanish() {
        assert_eq!(decode(b"long=\r\nline", QpMode::Body).unwrap(), b"longline");
        assert_eq!(decode(b"long=\nline", QpMode::Body).unwrap(), b"longline");
        assert_eq!(decode(b"long=\rline", QpMode::Body).unwrap(), b"longline");
    }

    #[test]
    fn line_endings_depend_on_mode() {
        assert_eq!(decode(b"a\r\nb", QpMode::Body).unwrap(), b"a\r\nb");
        assert_eq!(decode(b"a\r\nb", QpMode::Header).unwrap(), b"ab");
    }

    #[test]
    fn malformed_escape_is_fatal() {
        match decode(b"ok=GZ", QpMode::Body) {
            Err(MimeError::MalformedEscape(bytes)) => assert_eq!(bytes, b"GZ"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(decode(b"end=", QpMode::Body), Err(MimeError::MalformedEscape(_))));
        assert!(matches!(decode(b"end=4", QpMode::Body), Err(MimeError::MalformedEscape(_))));
    }

    #[test]
    fn buffered_bytes_drain_before_error() {
        let mut dec = QuotedPrintableDecoder::new(&b"abc=ZZ"[..], QpMode::Body);
        let mut buf = [0u8; 16];
        assert_eq!(dec.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        for _ in 0..3 {
            let err = dec.read(&mut buf).unwrap_err();
            assert!(matches!(MimeError::from(err), MimeError::MalformedEscape(_)));
        }
    }

    #[test]
    fn escape_split_across_source_reads() {
        let mut out = Vec::new();
        QuotedPrintableDecoder::new(Trickle(b"x=3D=\r\ny_z"), QpMode::Header)
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"x=y z");
    }

    #[test]
    fn small_output_buffer() {
        let mut dec = QuotedPrintableDecoder::new(&b"=41=42C"[..], QpMode::Body);
        let mut one = [0u8; 1];
        let mut out = Vec::new();
        while dec.read(&mut one).unwrap() == 1 {
            out.push(one[0]);
        }
        assert_eq!(out, b"ABC");
    }
}
