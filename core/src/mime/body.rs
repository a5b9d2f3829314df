/*
 * body.rs
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

//! Transfer decoding (Q / B / identity) followed by charset transcoding.
//! Shared by encoded-word bodies and standalone body parts.

use std::io::Read;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::read::DecoderReader;

use crate::error::MimeError;
use crate::mime::charset::{self, Transcoder};
use crate::mime::line_folding::LineFoldingStripper;
use crate::mime::quoted_printable::{QpMode, QuotedPrintableDecoder};

/// Standard alphabet; mail clients are careless about padding and trailing bits.
static LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    QuotedPrintable,
    Base64,
    Identity,
}

impl TransferEncoding {
    /// `q`/`quoted-printable`, `b`/`base64` (any case); anything else is identity.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("q") || token.eq_ignore_ascii_case("quoted-printable") {
            TransferEncoding::QuotedPrintable
        } else if token.eq_ignore_ascii_case("b") || token.eq_ignore_ascii_case("base64") {
            TransferEncoding::Base64
        } else {
            TransferEncoding::Identity
        }
    }
}

/// Build the decode pipeline for one body: transfer decoder, then charset transcoder.
/// Fails up front if the charset is unsupported.
pub fn body_reader<'a, R: Read + 'a>(
    charset: &str,
    encoding: &str,
    source: R,
    mode: QpMode,
    transcoder: Option<&dyn Transcoder>,
) -> Result<Box<dyn Read + 'a>, MimeError> {
    let decoded: Box<dyn Read + 'a> = match TransferEncoding::from_token(encoding) {
        TransferEncoding::QuotedPrintable => Box::new(QuotedPrintableDecoder::new(source, mode)),
        TransferEncoding::Base64 => Box::new(DecoderReader::new(
            LineFoldingStripper::new(source),
            &LENIENT_BASE64,
        )),
        TransferEncoding::Identity => Box::new(source),
    };
    charset::transcode(charset, decoded, transcoder)
}

/// Decode a complete body held in memory.
pub fn decode_body(
    charset: &str,
    encoding: &str,
    bytes: &[u8],
    mode: QpMode,
    transcoder: Option<&dyn Transcoder>,
) -> Result<Vec<u8>, MimeError> {
    let mut out = Vec::with_capacity(bytes.len());
    body_reader(charset, encoding, bytes, mode, transcoder)?.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_tokens() {
        assert_eq!(TransferEncoding::from_token("Q"), TransferEncoding::QuotedPrintable);
        assert_eq!(TransferEncoding::from_token("Quoted-Printable"), TransferEncoding::QuotedPrintable);
        assert_eq!(TransferEncoding::from_token("b"), TransferEncoding::Base64);
        assert_eq!(TransferEncoding::from_token("BASE64"), TransferEncoding::Base64);
        assert_eq!(TransferEncoding::from_token("8bit"), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::from_token(""), TransferEncoding::Identity);
    }

    #[test]
    fn latin1_q_header_mode() {
        let out = decode_body("iso-8859-1", "q", b"J=F6rg_Doe", QpMode::Header, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Jörg Doe");
    }

    #[test]
    fn body_mode_keeps_underscore_and_newline() {
        let out = decode_body("utf-8", "quoted-printable", b"a_b=0Ac", QpMode::Body, None).unwrap();
        assert_eq!(out, b"a_b\nc");
    }

    #[test]
    fn folded_base64() {
        let out = decode_body("utf-8", "B", b"SGVsbG8g\r\nV29y\nbGQ=", QpMode::Body, None).unwrap();
        assert_eq!(out, b"Hello World");
    }

    #[test]
    fn base64_without_padding() {
        let out = decode_body("utf-8", "b", b"SGVsbG8", QpMode::Header, None).unwrap();
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn invalid_base64_is_reported() {
        let err = decode_body("utf-8", "b", b"SGV*bG8=", QpMode::Header, None).unwrap_err();
        assert!(matches!(err, MimeError::InvalidBase64(_)), "{err:?}");
    }

    #[test]
    fn identity_pass_through() {
        let out = decode_body("us-ascii", "7bit", b"a_b=41", QpMode::Header, None).unwrap();
        assert_eq!(out, b"a_b=41");
    }

    #[test]
    fn unsupported_charset_fails_before_reading() {
        let err = decode_body("shift_jis", "b", b"gsSCwQ==", QpMode::Header, None).unwrap_err();
        assert!(matches!(err, MimeError::UnsupportedCharset(ref c) if c == "shift_jis"));
    }
}
