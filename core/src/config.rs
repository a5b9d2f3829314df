/*
 * config.rs
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

//! Decoder configuration: the injected charset transcoder and the look-ahead window.
//! Every public entry point has a method here; the free functions in the crate root
//! use [`DecoderConfig::default`].

use std::fmt;
use std::io::Read;

use crate::error::MimeError;
use crate::mime::body;
use crate::mime::charset::Transcoder;
use crate::mime::quoted_printable::QpMode;
use crate::mime::rfc2047;
use crate::mime::rfc5322::{self, Address};

/// Look-ahead window used when scanning for `=?` / `?=`.
pub const DEFAULT_WINDOW: usize = 256;

/// Smallest usable window: one marker plus a byte either side.
pub const MIN_WINDOW: usize = 4;

#[derive(Clone, Copy)]
pub struct DecoderConfig<'t> {
    transcoder: Option<&'t dyn Transcoder>,
    window: usize,
}

impl Default for DecoderConfig<'_> {
    fn default() -> Self {
        Self {
            transcoder: None,
            window: DEFAULT_WINDOW,
        }
    }
}

impl fmt::Debug for DecoderConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("transcoder", &self.transcoder.map(|_| "<dyn Transcoder>"))
            .field("window", &self.window)
            .finish()
    }
}

impl<'t> DecoderConfig<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charsets other than ISO-8859-1 and UTF-8/ASCII are resolved by `transcoder`.
    pub fn with_transcoder(mut self, transcoder: &'t dyn Transcoder) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// Look-ahead window in bytes; values below [`MIN_WINDOW`] are raised to it.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(MIN_WINDOW);
        self
    }

    pub fn transcoder(&self) -> Option<&'t dyn Transcoder> {
        self.transcoder
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Decode RFC 2047 encoded-words in an unstructured header value (e.g. Subject).
    pub fn decode_text(&self, raw: &str) -> Result<String, MimeError> {
        rfc2047::decode_text(raw, *self)
    }

    /// Parse an RFC 5322 address list (From, To, Cc, ...).
    pub fn parse_address_list(&self, raw: &str) -> Result<Vec<Address>, MimeError> {
        rfc5322::parse_address_list(raw, *self)
    }

    /// Transfer-decode and transcode a complete body part.
    pub fn decode_body(
        &self,
        charset: &str,
        encoding: &str,
        bytes: &[u8],
        mode: QpMode,
    ) -> Result<Vec<u8>, MimeError> {
        body::decode_body(charset, encoding, bytes, mode, self.transcoder)
    }

    /// Streaming form of [`decode_body`](Self::decode_body).
    pub fn body_reader<'a, R: Read + 'a>(
        &self,
        charset: &str,
        encoding: &str,
        source: R,
        mode: QpMode,
    ) -> Result<Box<dyn Read + 'a>, MimeError> {
        body::body_reader(charset, encoding, source, mode, self.transcoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert!(config.transcoder().is_none());
        assert_eq!(config.window(), DEFAULT_WINDOW);
    }

    #[test]
    fn window_has_a_floor() {
        assert_eq!(DecoderConfig::new().with_window(1).window(), MIN_WINDOW);
        assert_eq!(DecoderConfig::new().with_window(64).window(), 64);
    }

    #[test]
    fn debug_hides_transcoder() {
        let s = format!("{:?}", DecoderConfig::default());
        assert!(s.contains("window: 256"), "{s}");
    }
}
