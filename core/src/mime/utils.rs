/*
 * utils.rs
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

//! RFC 5322 character classes (atext, qtext, VCHAR) and RFC 2047 shape checks.

/// Checks if a character is an RFC 5322 atext character. With `dot`, period is included
/// (dot-atom text).
#[inline]
pub fn is_atext(c: u8, dot: bool) -> bool {
    if dot && c == b'.' {
        return true;
    }
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'/' |
        b'=' | b'?' | b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~'
    )
}

/// Checks if a character is RFC 5322 qtext: printable US-ASCII except backslash and quote.
#[inline]
pub fn is_qtext(c: u8) -> bool {
    c != b'\\' && c != b'"' && is_vchar(c)
}

/// Visible (printing) US-ASCII.
#[inline]
pub fn is_vchar(c: u8) -> bool {
    (b'!'..=b'~').contains(&c)
}

#[inline]
pub fn is_wsp(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Checks if a phrase word has the shape of an RFC 2047 encoded-word:
/// starts with `=?`, ends with `?=`, and has exactly four `?`.
pub fn is_encoded_word(word: &str) -> bool {
    word.starts_with("=?")
        && word.ends_with("?=")
        && word.bytes().filter(|&b| b == b'?').count() == 4
}
