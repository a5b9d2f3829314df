/*
 * lib.rs
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

//! Mimemail core: RFC 2047 encoded-word decoding for header text, RFC 5322
//! address lists and dates, and transfer/charset decoding for body parts.
//!
//! ```
//! let subject = mimemail_core::decode_rfc2047_text("=?ISO-8859-1?Q?Gr=FC=DFe?=").unwrap();
//! assert_eq!(subject, "Grüße");
//!
//! let to = mimemail_core::parse_address_list("Barry Gibbs <bg@example.com>").unwrap();
//! assert_eq!(to[0].name, "Barry Gibbs");
//! ```
//!
//! Charsets beyond ISO-8859-1 and UTF-8/ASCII go through a [`Transcoder`] set on a
//! [`DecoderConfig`]; with the `encoding` feature, [`EncodingTranscoder`] covers the
//! WHATWG encodings.

pub mod config;
pub mod error;
pub mod mime;

pub use config::{DecoderConfig, DEFAULT_WINDOW, MIN_WINDOW};
pub use error::MimeError;
#[cfg(feature = "encoding")]
pub use mime::EncodingTranscoder;
pub use mime::{Address, HeaderMap, QpMode, Transcoder, TransferEncoding};

use chrono::{DateTime, FixedOffset};

/// Decode RFC 2047 encoded-words in a header value, with built-in charsets only.
pub fn decode_rfc2047_text(raw: &str) -> Result<String, MimeError> {
    DecoderConfig::default().decode_text(raw)
}

pub fn decode_rfc2047_text_with(raw: &str, config: DecoderConfig<'_>) -> Result<String, MimeError> {
    config.decode_text(raw)
}

/// Parse an RFC 5322 address list, with built-in charsets only.
pub fn parse_address_list(raw: &str) -> Result<Vec<Address>, MimeError> {
    DecoderConfig::default().parse_address_list(raw)
}

pub fn parse_address_list_with(raw: &str, config: DecoderConfig<'_>) -> Result<Vec<Address>, MimeError> {
    config.parse_address_list(raw)
}

/// Transfer-decode (`q`/`quoted-printable`, `b`/`base64`, else identity) and convert
/// a body part to UTF-8, with built-in charsets only.
pub fn decode_body(charset: &str, encoding: &str, bytes: &[u8], mode: QpMode) -> Result<Vec<u8>, MimeError> {
    DecoderConfig::default().decode_body(charset, encoding, bytes, mode)
}

/// Parse an RFC 5322 date-time.
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, MimeError> {
    mime::parse_date(value)
}
