/*
 * error.rs
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

//! Decoding and parsing errors.
//!
//! Every decoder in this crate is an [`std::io::Read`], so errors cross `io::Error`
//! boundaries on their way out. [`MimeError`] converts to `io::Error` with kind
//! `InvalidData` and comes back intact through [`From<io::Error>`].

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors from header decoding, body decoding and address/date parsing.
#[derive(Debug, Clone, Error)]
pub enum MimeError {
    /// The requested header is not in the header map.
    #[error("header not present: {0}")]
    HeaderNotPresent(String),
    /// Charset name not handled by the built-ins or the injected transcoder.
    #[error("charset {0} not supported")]
    UnsupportedCharset(String),
    /// Quoted-printable `=` not followed by two hex digits.
    #[error("invalid quoted-printable escape: {:?}", String::from_utf8_lossy(.0))]
    MalformedEscape(Vec<u8>),
    /// `=?` without the `?` delimiters or the closing `?=`.
    #[error("unclosed encoded-word")]
    UnclosedEncodedWord,
    #[error("unclosed quoted-string")]
    UnclosedQuotedString,
    #[error("bad character in quoted-string: {:?}", byte_char(.0))]
    InvalidQuotedStringCharacter(u8),
    #[error("missing word in phrase")]
    EmptyPhrase,
    #[error("missing @ in addr-spec")]
    MissingAtSign,
    #[error("no domain in addr-spec")]
    MissingDomain,
    #[error("no address")]
    NoAddress,
    #[error("no angle-addr")]
    ExpectedAngleAddress,
    #[error("invalid string at {:?}", byte_char(.0))]
    ExpectedAtom(u8),
    #[error("unclosed angle-addr")]
    UnclosedAngleAddress,
    #[error("expected comma")]
    ExpectedComma,
    #[error("date could not be parsed: {0}")]
    DateUnparseable(String),
    /// Byte sequence not valid in the declared charset.
    #[error("malformed {0} text")]
    MalformedText(String),
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("decoded text is not valid UTF-8")]
    InvalidUtf8,
    /// Failure reported by the upstream byte source.
    #[error("read error: {0}")]
    Io(#[source] Arc<io::Error>),
}

fn byte_char(b: &u8) -> char {
    char::from(*b)
}

impl From<io::Error> for MimeError {
    fn from(err: io::Error) -> Self {
        let inner = err.get_ref();
        if let Some(mime) = inner.and_then(|e| e.downcast_ref::<MimeError>()) {
            return mime.clone();
        }
        if let Some(b64) = inner.and_then(|e| e.downcast_ref::<base64::DecodeError>()) {
            return MimeError::InvalidBase64(b64.clone());
        }
        MimeError::Io(Arc::new(err))
    }
}

impl From<MimeError> for io::Error {
    fn from(err: MimeError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_io_round_trip() {
        let io_err: io::Error = MimeError::UnsupportedCharset("koi8-r".into()).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        let back = MimeError::from(io_err);
        assert!(matches!(back, MimeError::UnsupportedCharset(ref c) if c == "koi8-r"));
    }

    #[test]
    fn foreign_io_error_is_wrapped() {
        let err = MimeError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        match err {
            MimeError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn base64_error_is_recovered() {
        let io_err = io::Error::new(io::ErrorKind::InvalidData, base64::DecodeError::InvalidByte(0, b'*'));
        assert!(matches!(MimeError::from(io_err), MimeError::InvalidBase64(_)));
    }

    #[test]
    fn display_messages() {
        assert_eq!(MimeError::ExpectedComma.to_string(), "expected comma");
        assert_eq!(
            MimeError::MalformedEscape(b"GZ".to_vec()).to_string(),
            "invalid quoted-printable escape: \"GZ\""
        );
    }
}
