/*
 * charset.rs
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

//! Charset transcoding to UTF-8.
//!
//! ISO-8859-1 and UTF-8/US-ASCII are handled here directly. Every other charset is
//! resolved by a [`Transcoder`] supplied by the embedder; [`EncodingTranscoder`]
//! (feature `encoding`) covers everything `encoding_rs` knows.

use std::io::{self, Read};

use crate::error::MimeError;

/// Pluggable charset support: wraps a byte stream in `charset` into a UTF-8 byte stream.
///
/// `charset` arrives lowercased and trimmed, with any RFC 2231 language suffix removed.
/// The built-in names (`iso-8859-1`, `utf-8`, `us-ascii`, `ascii`, empty) never reach
/// an implementation. Return [`MimeError::UnsupportedCharset`] to decline.
pub trait Transcoder {
    fn transcode<'a>(
        &self,
        charset: &str,
        body: Box<dyn Read + 'a>,
    ) -> Result<Box<dyn Read + 'a>, MimeError>;
}

/// Normalized charset label: `UTF-8*en` → `utf-8`.
pub fn normalize_charset(charset: &str) -> String {
    let name = charset.split('*').next().unwrap_or("");
    name.trim().to_ascii_lowercase()
}

/// Wrap `body` so it yields UTF-8, using the built-ins first and `transcoder` for the rest.
pub fn transcode<'a>(
    charset: &str,
    body: Box<dyn Read + 'a>,
    transcoder: Option<&dyn Transcoder>,
) -> Result<Box<dyn Read + 'a>, MimeError> {
    let name = normalize_charset(charset);
    match name.as_str() {
        "iso-8859-1" => Ok(Box::new(Latin1Reader::new(body))),
        "utf-8" | "us-ascii" | "ascii" | "" => Ok(body),
        _ => match transcoder {
            Some(t) => t.transcode(&name, body),
            None => Err(MimeError::UnsupportedCharset(name)),
        },
    }
}

/// ISO-8859-1 to UTF-8. Every Latin-1 byte value is its own code point.
pub struct Latin1Reader<R> {
    source: R,
    /// Second UTF-8 byte that did not fit in the caller's buffer.
    carry: Option<u8>,
}

impl<R: Read> Latin1Reader<R> {
    pub fn new(source: R) -> Self {
        Self { source, carry: None }
    }
}

impl<R: Read> Read for Latin1Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(b) = self.carry.take() {
            buf[0] = b;
            return Ok(1);
        }
        // Each input byte expands to at most two output bytes.
        let mut raw = [0u8; 256];
        let want = (buf.len() / 2).clamp(1, raw.len());
        let got = self.source.read(&mut raw[..want])?;
        let mut n = 0;
        for &b in &raw[..got] {
            let mut utf8 = [0u8; 2];
            for &u in char::from(b).encode_utf8(&mut utf8).as_bytes() {
                if n < buf.len() {
                    buf[n] = u;
                    n += 1;
                } else {
                    self.carry = Some(u);
                }
            }
        }
        Ok(n)
    }
}

#[cfg(feature = "encoding")]
pub use self::encoding::EncodingTranscoder;

#[cfg(feature = "encoding")]
mod encoding {
    use std::io::{self, Read};

    use encoding_rs::{Decoder, DecoderResult, Encoding};

    use super::Transcoder;
    use crate::error::MimeError;

    /// Transcoder for every label in the WHATWG Encoding Standard (via `encoding_rs`):
    /// GBK/GB2312, Big5, ISO-2022-JP, Shift_JIS, EUC-KR, KOI8-R, windows-125x, ISO-8859-x.
    ///
    /// Malformed input is an error, never replaced with U+FFFD.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct EncodingTranscoder;

    impl Transcoder for EncodingTranscoder {
        fn transcode<'a>(
            &self,
            charset: &str,
            body: Box<dyn Read + 'a>,
        ) -> Result<Box<dyn Read + 'a>, MimeError> {
            let encoding = Encoding::for_label(charset.as_bytes())
                .ok_or_else(|| MimeError::UnsupportedCharset(charset.to_string()))?;
            log::trace!("charset {} resolved to {}", charset, encoding.name());
            Ok(Box::new(EncodingReader {
                source: body,
                charset: charset.to_string(),
                decoder: encoding.new_decoder_without_bom_handling(),
                input: [0; 512],
                input_pos: 0,
                input_len: 0,
                output: Vec::new(),
                output_pos: 0,
                source_done: false,
                finished: false,
                err: None,
            }))
        }
    }

    struct EncodingReader<R> {
        source: R,
        charset: String,
        decoder: Decoder,
        input: [u8; 512],
        input_pos: usize,
        input_len: usize,
        output: Vec<u8>,
        output_pos: usize,
        source_done: bool,
        finished: bool,
        /// Set on the first failure; reported again on every later read.
        err: Option<MimeError>,
    }

    impl<R: Read> Read for EncodingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                if self.output_pos < self.output.len() {
                    let n = buf.len().min(self.output.len() - self.output_pos);
                    buf[..n].copy_from_slice(&self.output[self.output_pos..self.output_pos + n]);
                    self.output_pos += n;
                    return Ok(n);
                }
                if let Some(err) = &self.err {
                    return Err(err.clone().into());
                }
                if self.finished || buf.is_empty() {
                    return Ok(0);
                }
                if self.input_pos == self.input_len && !self.source_done {
                    let n = match self.source.read(&mut self.input) {
                        Ok(n) => n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            self.err = Some(MimeError::from(e));
                            continue;
                        }
                    };
                    self.input_pos = 0;
                    self.input_len = n;
                    self.source_done = n == 0;
                }
                let src = &self.input[self.input_pos..self.input_len];
                let capacity = self
                    .decoder
                    .max_utf8_buffer_length_without_replacement(src.len())
                    .unwrap_or(src.len() * 3 + 16);
                self.output.clear();
                self.output.resize(capacity.max(16), 0);
                self.output_pos = 0;
                let last = self.source_done;
                let (result, read, written) =
                    self.decoder
                        .decode_to_utf8_without_replacement(src, &mut self.output, last);
                self.input_pos += read;
                self.output.truncate(written);
                match result {
                    DecoderResult::Malformed(_, _) => {
                        self.err = Some(MimeError::MalformedText(self.charset.clone()));
                    }
                    DecoderResult::InputEmpty if last => self.finished = true,
                    DecoderResult::InputEmpty | DecoderResult::OutputFull => {}
                }
            }
        }
    }
}
