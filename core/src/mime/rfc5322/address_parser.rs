/*
 * address_parser.rs
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

//! RFC 5322 address list parsing (From, To, Cc, etc.).
//!
//! Each grammar rule takes a `Cursor` by value and returns the cursor after the
//! consumed input, so a failed alternative leaves the caller's cursor untouched.
//! Group syntax, comments and domain-literals are not supported.

use crate::config::DecoderConfig;
use crate::error::MimeError;
use crate::mime::rfc2047;
use crate::mime::utils::{is_atext, is_encoded_word, is_qtext, is_wsp};

use super::email_address::Address;

type Parsed<'a, T> = Result<(Cursor<'a>, T), MimeError>;

/// Unconsumed remainder of a header value.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    rest: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s.as_bytes() }
    }

    fn is_empty(self) -> bool {
        self.rest.is_empty()
    }

    fn peek(self) -> Option<u8> {
        self.rest.first().copied()
    }

    /// Skips spaces and tabs.
    fn skip_space(self) -> Self {
        let n = self.rest.iter().take_while(|&&c| is_wsp(c)).count();
        Self { rest: &self.rest[n..] }
    }

    /// The cursor past `c`, if `c` is next.
    fn consume(self, c: u8) -> Option<Self> {
        match self.rest.split_first() {
            Some((&first, rest)) if first == c => Some(Self { rest }),
            _ => None,
        }
    }

    fn advance(self, n: usize) -> (Self, &'a [u8]) {
        let (taken, rest) = self.rest.split_at(n);
        (Self { rest }, taken)
    }

    fn lossy(self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.rest)
    }
}

fn to_string(bytes: Vec<u8>) -> Result<String, MimeError> {
    String::from_utf8(bytes).map_err(|_| MimeError::InvalidUtf8)
}

/// Parse a comma-separated address list. Fails on the first malformed address;
/// there is no partial result.
pub fn parse_address_list(raw: &str, config: DecoderConfig<'_>) -> Result<Vec<Address>, MimeError> {
    let mut cur = Cursor::new(raw);
    let mut list = Vec::new();
    loop {
        let (next, addr) = address(cur.skip_space(), config)?;
        list.push(addr);
        let next = next.skip_space();
        if next.is_empty() {
            break;
        }
        cur = next.consume(b',').ok_or(MimeError::ExpectedComma)?;
    }
    Ok(list)
}

/// address = addr-spec / [phrase] "<" addr-spec ">"
fn address<'a>(cur: Cursor<'a>, config: DecoderConfig<'_>) -> Parsed<'a, Address> {
    log::trace!("address: {:?}", cur.lossy());
    let cur = cur.skip_space();
    if cur.is_empty() {
        return Err(MimeError::NoAddress);
    }

    // addr-spec is the narrower grammar, so it goes first.
    match addr_spec(cur) {
        Ok((next, spec)) => return Ok((next, Address::new("", spec))),
        Err(e) => log::trace!("address: not an addr-spec: {e}"),
    }

    let (cur, name) = if cur.peek() == Some(b'<') {
        (cur, String::new())
    } else {
        phrase(cur, config)?
    };
    log::trace!("address: display name {name:?}");

    let cur = cur
        .skip_space()
        .consume(b'<')
        .ok_or(MimeError::ExpectedAngleAddress)?;
    let (cur, spec) = addr_spec(cur)?;
    let cur = cur.consume(b'>').ok_or(MimeError::UnclosedAngleAddress)?;
    Ok((cur, Address::new(name, spec)))
}

/// addr-spec = (dot-atom / quoted-string) "@" dot-atom
fn addr_spec(cur: Cursor<'_>) -> Parsed<'_, String> {
    let cur = cur.skip_space();
    let (cur, local) = match cur.peek() {
        None => return Err(MimeError::NoAddress),
        Some(b'"') => quoted_string(cur)?,
        Some(_) => atom(cur, true)?,
    };
    let cur = cur.consume(b'@').ok_or(MimeError::MissingAtSign)?;
    let cur = cur.skip_space();
    if cur.is_empty() {
        return Err(MimeError::MissingDomain);
    }
    let (cur, domain) = atom(cur, true)?;
    Ok((cur, format!("{local}@{domain}")))
}

/// phrase = 1*word, word = atom / quoted-string. Encoded-word atoms are decoded;
/// quoted strings are taken literally.
/// Stops quietly at the first word that does not parse, as long as one word was read.
fn phrase<'a>(mut cur: Cursor<'a>, config: DecoderConfig<'_>) -> Parsed<'a, String> {
    let mut words: Vec<String> = Vec::new();
    loop {
        let at = cur.skip_space();
        let (parsed, is_atom) = match at.peek() {
            None => break,
            Some(b'"') => (quoted_string(at), false),
            Some(_) => (atom(at, false), true),
        };
        let (next, word) = match parsed {
            Ok(p) => p,
            Err(e) => {
                log::trace!("phrase: stopped at {:?}: {e}", at.lossy());
                break;
            }
        };
        cur = next;
        if is_atom && is_encoded_word(&word) {
            match rfc2047::decode_text(&word, config) {
                Ok(decoded) => words.push(decoded),
                Err(e) => {
                    log::debug!("phrase: dropping undecodable word {word:?}: {e}");
                    break;
                }
            }
        } else {
            words.push(word);
        }
    }
    if words.is_empty() {
        return Err(MimeError::EmptyPhrase);
    }
    Ok((cur, words.join(" ")))
}

/// quoted-string, with the opening `"` at the cursor. Backslash escapes any byte;
/// CRLF is not accepted inside.
fn quoted_string(cur: Cursor<'_>) -> Parsed<'_, String> {
    let body = &cur.rest[1..];
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    loop {
        match body.get(i).copied() {
            None => return Err(MimeError::UnclosedQuotedString),
            Some(b'"') => break,
            Some(b'\\') => {
                let escaped = body.get(i + 1).copied().ok_or(MimeError::UnclosedQuotedString)?;
                out.push(escaped);
                i += 2;
            }
            Some(c) if is_qtext(c) || is_wsp(c) => {
                out.push(c);
                i += 1;
            }
            Some(c) => return Err(MimeError::InvalidQuotedStringCharacter(c)),
        }
    }
    let (next, _) = cur.advance(i + 2);
    Ok((next, to_string(out)?))
}

/// atom, or dot-atom when `dot` is set. The first character is never a dot.
fn atom(cur: Cursor<'_>, dot: bool) -> Parsed<'_, String> {
    match cur.peek() {
        Some(c) if is_atext(c, false) => {}
        Some(c) => return Err(MimeError::ExpectedAtom(c)),
        None => return Err(MimeError::NoAddress),
    }
    let n = 1 + cur.rest[1..].iter().take_while(|&&c| is_atext(c, dot)).count();
    let (next, taken) = cur.advance(n);
    Ok((next, to_string(taken.to_vec())?))
}
