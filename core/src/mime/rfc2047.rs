/*
 * rfc2047.rs
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

//! RFC 2047 encoded-word decoding (e.g. =?charset?q?text?=).
//!
//! [`Rfc2047Reader`] is a pull-based state machine over raw header text. It copies
//! literal runs through, decodes each encoded-word via the body pipeline, and drops
//! folding whitespace that sits between two encoded-words (RFC 2047 section 6.2).
//! The source is scanned through a bounded look-ahead window.

use std::io::{self, Cursor, Read};

use crate::config::DecoderConfig;
use crate::error::MimeError;
use crate::mime::body::body_reader;
use crate::mime::charset::Transcoder;
use crate::mime::quoted_printable::QpMode;

const ENCODED_WORD_START: &[u8] = b"=?";
const ENCODED_WORD_END: &[u8] = b"?=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Raw,
    QuoteStarting,
    QuoteBody,
    QuoteEnding,
}

/// What the reader produced most recently. Folding whitespace is only dropped
/// after the start of input or an encoded-word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Literal,
    Word,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Trim-based emptiness: only space, CR and LF count. A tab keeps the span.
fn is_folding_whitespace(span: &[u8]) -> bool {
    span.iter().all(|&b| b == b' ' || b == b'\r' || b == b'\n')
}

/// Byte source with a look-ahead buffer that can be topped up to a requested size.
struct LookAhead<R> {
    source: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> LookAhead<R> {
    fn new(source: R) -> Self {
        Self {
            source,
            buf: Vec::new(),
            pos: 0,
            eof: false,
        }
    }

    /// Pull from the source until `n` bytes are buffered or the source is exhausted.
    /// Returns the number of buffered bytes (less than `n` only at end of input).
    fn fill(&mut self, n: usize) -> Result<usize, MimeError> {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        while self.buf.len() < n && !self.eof {
            let start = self.buf.len();
            self.buf.resize(n, 0);
            let got = match self.source.read(&mut self.buf[start..]) {
                Ok(got) => got,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.buf.truncate(start);
                    continue;
                }
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e.into());
                }
            };
            self.buf.truncate(start + got);
            self.eof = got == 0;
        }
        Ok(self.buf.len())
    }

    fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// Read up to and including `delim`, returning the bytes before it.
    /// Keeps pulling chunks of `chunk` bytes; end of input first is an unclosed encoded-word.
    fn read_until(&mut self, delim: u8, chunk: usize) -> Result<Vec<u8>, MimeError> {
        let mut token = Vec::new();
        loop {
            if self.fill(chunk)? == 0 {
                return Err(MimeError::UnclosedEncodedWord);
            }
            let window = self.buffered();
            match window.iter().position(|&b| b == delim) {
                Some(i) => {
                    token.extend_from_slice(&window[..i]);
                    self.consume(i + 1);
                    return Ok(token);
                }
                None => {
                    let n = window.len();
                    token.extend_from_slice(window);
                    self.consume(n);
                }
            }
        }
    }
}

/// Streaming RFC 2047 decoder. Produces UTF-8.
///
/// Once an error is hit, reads return whatever was decoded before it and then the same
/// error on every later call. End of input is `Ok(0)` forever.
pub struct Rfc2047Reader<'t, R> {
    input: LookAhead<R>,
    state: State,
    window: usize,
    transcoder: Option<&'t dyn Transcoder>,
    out: Vec<u8>,
    out_pos: usize,
    last: Last,
    /// Whitespace-only literal seen before it is known what follows it.
    pending_ws: Vec<u8>,
    charset: String,
    encoding: String,
    /// Encoded text of the current word, accumulated across windows.
    word_body: Vec<u8>,
    err: Option<MimeError>,
    done: bool,
}

impl<'t, R: Read> Rfc2047Reader<'t, R> {
    pub fn new(source: R, config: DecoderConfig<'t>) -> Self {
        Self {
            input: LookAhead::new(source),
            state: State::Raw,
            window: config.window(),
            transcoder: config.transcoder(),
            out: Vec::new(),
            out_pos: 0,
            last: Last::Start,
            pending_ws: Vec::new(),
            charset: String::new(),
            encoding: String::new(),
            word_body: Vec::new(),
            err: None,
            done: false,
        }
    }

    fn drain(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.out.len() - self.out_pos);
        buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
        self.out_pos += n;
        if self.out_pos == self.out.len() {
            self.out.clear();
            self.out_pos = 0;
        }
        n
    }

    fn step(&mut self) -> Result<(), MimeError> {
        match self.state {
            State::Raw => self.step_raw(),
            State::QuoteStarting => self.step_quote_starting(),
            State::QuoteBody => self.step_quote_body(),
            State::QuoteEnding => self.step_quote_ending(),
        }
    }

    fn step_raw(&mut self) -> Result<(), MimeError> {
        let available = self.input.fill(self.window)?;
        if available == 0 {
            self.out.append(&mut self.pending_ws);
            self.done = true;
            return Ok(());
        }
        let at_end = available < self.window;
        let window = self.input.buffered();
        match find(window, ENCODED_WORD_START) {
            Some(start) => {
                let span = &window[..start];
                if is_folding_whitespace(span) && self.last != Last::Literal {
                    if !self.pending_ws.is_empty() || !span.is_empty() {
                        log::trace!(
                            "dropping {} bytes of folding whitespace before encoded-word",
                            self.pending_ws.len() + span.len()
                        );
                    }
                    self.pending_ws.clear();
                } else {
                    self.out.append(&mut self.pending_ws);
                    self.out.extend_from_slice(span);
                    if !span.is_empty() {
                        self.last = Last::Literal;
                    }
                }
                self.input.consume(start);
                self.state = State::QuoteStarting;
            }
            None => {
                let mut n = window.len();
                // A trailing '=' may be the first half of a marker split across windows.
                if !at_end && window[n - 1] == b'=' {
                    n -= 1;
                }
                let span = &window[..n];
                if self.last != Last::Literal && is_folding_whitespace(span) {
                    self.pending_ws.extend_from_slice(span);
                } else {
                    self.out.append(&mut self.pending_ws);
                    self.out.extend_from_slice(span);
                    if !span.is_empty() {
                        self.last = Last::Literal;
                    }
                }
                self.input.consume(n);
            }
        }
        Ok(())
    }

    fn step_quote_starting(&mut self) -> Result<(), MimeError> {
        self.input.fill(ENCODED_WORD_START.len())?;
        self.input.consume(ENCODED_WORD_START.len());
        let charset = self.input.read_until(b'?', self.window)?;
        let encoding = self.input.read_until(b'?', self.window)?;
        self.charset = String::from_utf8_lossy(&charset).into_owned();
        self.encoding = String::from_utf8_lossy(&encoding).into_owned();
        self.word_body.clear();
        self.state = State::QuoteBody;
        Ok(())
    }

    fn step_quote_body(&mut self) -> Result<(), MimeError> {
        let available = self.input.fill(self.window)?;
        let at_end = available < self.window;
        let window = self.input.buffered();
        if let Some(end) = find(window, ENCODED_WORD_END) {
            self.word_body.extend_from_slice(&window[..end]);
            self.input.consume(end);
            self.decode_word()?;
            self.state = State::QuoteEnding;
        } else if at_end {
            let n = window.len();
            self.word_body.extend_from_slice(window);
            self.input.consume(n);
            self.decode_word()?;
            return Err(MimeError::UnclosedEncodedWord);
        } else {
            let mut n = window.len();
            // Hold back a trailing '?' in case the terminator is split across windows.
            if window[n - 1] == b'?' {
                n -= 1;
            }
            self.word_body.extend_from_slice(&window[..n]);
            self.input.consume(n);
        }
        Ok(())
    }

    fn step_quote_ending(&mut self) -> Result<(), MimeError> {
        self.input.fill(ENCODED_WORD_END.len())?;
        self.input.consume(ENCODED_WORD_END.len());
        self.last = Last::Word;
        self.state = State::Raw;
        Ok(())
    }

    fn decode_word(&mut self) -> Result<(), MimeError> {
        let body = std::mem::take(&mut self.word_body);
        log::trace!("encoded-word charset={} encoding={} ({} bytes)", self.charset, self.encoding, body.len());
        let mut reader = body_reader(
            &self.charset,
            &self.encoding,
            Cursor::new(body),
            QpMode::Header,
            self.transcoder,
        )?;
        reader.read_to_end(&mut self.out)?;
        Ok(())
    }
}

impl<R: Read> Read for Rfc2047Reader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let available = self.out.len() - self.out_pos;
            let finished = self.err.is_some() || self.done;
            if available >= buf.len() || (available > 0 && finished) {
                return Ok(self.drain(buf));
            }
            if let Some(err) = &self.err {
                return Err(err.clone().into());
            }
            if self.done {
                return Ok(0);
            }
            if let Err(err) = self.step() {
                log::debug!("encoded-word decoding stopped: {}", err);
                self.err = Some(err);
            }
        }
    }
}

/// Decode a complete header value. Any error fails the whole call.
pub fn decode_text(raw: &str, config: DecoderConfig<'_>) -> Result<String, MimeError> {
    let mut out = Vec::with_capacity(raw.len());
    Rfc2047Reader::new(raw.as_bytes(), config).read_to_end(&mut out)?;
    String::from_utf8(out).map_err(|_| MimeError::InvalidUtf8)
}

/// RFC 2047 "Q" encoded-word for `text` in UTF-8, safe to use as a phrase word.
pub fn encode_q_word(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3 + 12);
    out.push_str("=?utf-8?q?");
    for b in text.bytes() {
        match b {
            b' ' => out.push('_'),
            b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' | b'!' | b'*' | b'+' | b'-' | b'/' => {
                out.push(char::from(b))
            }
            _ => out.push_str(&format!("={:02X}", b)),
        }
    }
    out.push_str("?=");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<String, MimeError> {
        decode_text(s, DecoderConfig::default())
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

    fn decode_streaming(s: &str, window: usize) -> Result<String, MimeError> {
        let config = DecoderConfig::default().with_window(window);
        let mut out = Vec::new();
        Rfc2047Reader::new(Trickle(s.as_bytes()), config).read_to_end(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn decode_encoded_words_b() {
        assert_eq!(decode("=?UTF-8?B?SGVsbG8=?=").unwrap(), "Hello");
    }

    #[test]
    fn decode_encoded_words_q() {
        assert_eq!(decode("=?UTF-8?Q?Hello_World?=").unwrap(), "Hello World");
    }

    #[test]
    fn decode_encoded_words_mixed() {
        assert_eq!(decode("Hello =?UTF-8?B?V29ybGQ=?=!").unwrap(), "Hello World!");
    }

    #[test]
    fn plain_text_unchanged() {
        for s in ["", "Subject line", "  padded  ", "a = b ? c", "tab\tseparated", "\r\n", "ünïcödé"] {
            assert_eq!(decode(s).unwrap(), s);
        }
    }

    #[test]
    fn folding_between_encoded_words_is_dropped() {
        let s = "=?utf-8?B?SGVsbG8gUERGIOWKoOeCueS4reaWh+WSjOaXpeacrOiqnuOBig==?=\r\n=?utf-8?B?44Gv44KI44GG44GU44GW44GE44G+44GZ?=";
        assert_eq!(decode(s).unwrap(), "Hello PDF 加点中文和日本語おはようございます");
    }

    #[test]
    fn space_between_literal_and_encoded_word_is_kept() {
        assert_eq!(decode("word =?utf-8?Q?x?=").unwrap(), "word x");
        assert_eq!(decode("=?utf-8?Q?x?= word").unwrap(), "x word");
    }

    #[test]
    fn tab_between_encoded_words_is_kept() {
        assert_eq!(decode("=?utf-8?Q?a?=\t=?utf-8?Q?b?=").unwrap(), "a\tb");
        assert_eq!(decode("=?utf-8?Q?a?=  \r\n =?utf-8?Q?b?=").unwrap(), "ab");
    }

    #[test]
    fn trailing_whitespace_after_encoded_word_is_kept() {
        assert_eq!(decode("=?utf-8?Q?a?=  ").unwrap(), "a  ");
    }

    #[test]
    fn leading_whitespace_before_encoded_word_is_dropped() {
        assert_eq!(decode("  =?utf-8?Q?a?=").unwrap(), "a");
    }

    #[test]
    fn latin1_display_name() {
        assert_eq!(
            decode("=?iso-8859-1?q?J=F6rg_Doe?= <joerg@example.com>").unwrap(),
            "Jörg Doe <joerg@example.com>"
        );
        assert_eq!(
            decode("=?ISO-8859-1?Q?Andr=E9?= Pirard <PIRARD@vm1.ulg.ac.be>").unwrap(),
            "André Pirard <PIRARD@vm1.ulg.ac.be>"
        );
    }

    #[test]
    fn unsupported_charset() {
        assert!(matches!(
            decode("=?shift_jis?B?gsSCwQ==?="),
            Err(MimeError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn unclosed_encoded_words() {
        assert!(matches!(decode("=?utf-8"), Err(MimeError::UnclosedEncodedWord)));
        assert!(matches!(decode("=?utf-8?q"), Err(MimeError::UnclosedEncodedWord)));
        assert!(matches!(decode("=?utf-8?q?abc"), Err(MimeError::UnclosedEncodedWord)));
    }

    #[test]
    fn partial_output_then_error() {
        let mut reader = Rfc2047Reader::new(&b"ok =?utf-8?q?abc"[..], DecoderConfig::default());
        let mut buf = [0u8; 64];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ok abc");
        for _ in 0..2 {
            let err = reader.read(&mut buf).unwrap_err();
            assert!(matches!(MimeError::from(err), MimeError::UnclosedEncodedWord));
        }
    }

    #[test]
    fn malformed_q_escape() {
        assert!(matches!(decode("=?utf-8?q?a=GZ?="), Err(MimeError::MalformedEscape(_))));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(matches!(decode("=?utf-8?q?=FF?="), Err(MimeError::InvalidUtf8)));
    }

    #[test]
    fn small_window_and_trickling_source() {
        let s = "Re: =?utf-8?B?SGVsbG8gUERGIOWKoOeCueS4reaWh+WSjOaXpeacrOiqnuOBig==?=\r\n =?iso-8859-1?q?_J=F6rg?= end";
        let expected = "Re: Hello PDF 加点中文和日本語お Jörg end";
        for window in [4, 5, 7, 16, 256] {
            assert_eq!(decode_streaming(s, window).unwrap(), expected, "window {window}");
        }
    }

    #[test]
    fn space_after_literal_on_window_edge_is_kept() {
        for window in [4, 5, 256] {
            assert_eq!(decode_streaming("word =?utf-8?Q?x?=", window).unwrap(), "word x", "window {window}");
        }
        // Literal ends exactly where the default window does.
        let s = format!("{} =?utf-8?Q?y?=", "x".repeat(256));
        assert_eq!(decode(&s).unwrap(), format!("{} y", "x".repeat(256)));
        let s = format!("{}   =?utf-8?Q?y?=", "x".repeat(6));
        assert_eq!(decode_streaming(&s, 6).unwrap(), format!("{}   y", "x".repeat(6)));
    }

    #[test]
    fn long_whitespace_run_between_words() {
        let s = format!("=?utf-8?q?a?={}=?utf-8?q?b?=", " ".repeat(1000));
        assert_eq!(decode_streaming(&s, 8).unwrap(), "ab");
        let s = format!("=?utf-8?q?a?={}b", " ".repeat(1000));
        assert_eq!(decode_streaming(&s, 8).unwrap(), format!("a{}b", " ".repeat(1000)));
    }

    #[test]
    fn one_byte_reads() {
        let mut reader = Rfc2047Reader::new(&b"=?iso-8859-1?q?=E9?=!"[..], DecoderConfig::default());
        let mut one = [0u8; 1];
        let mut out = Vec::new();
        while reader.read(&mut one).unwrap() == 1 {
            out.push(one[0]);
        }
        assert_eq!(String::from_utf8(out).unwrap(), "é!");
    }

    #[test]
    fn q_word_encoding() {
        assert_eq!(encode_q_word("Jörg Doe"), "=?utf-8?q?J=C3=B6rg_Doe?=");
        assert_eq!(encode_q_word("a=b?c_d"), "=?utf-8?q?a=3Db=3Fc=5Fd?=");
        assert_eq!(decode(&encode_q_word("Ünïcödé <x>, \"y\"")).unwrap(), "Ünïcödé <x>, \"y\"");
    }
}
