/*
 * email_address.rs
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

//! RFC 5322 mailbox: display name plus addr-spec.

use std::fmt::{self, Write};

use crate::mime::rfc2047::encode_q_word;
use crate::mime::utils::{is_vchar, is_wsp};

/// A single mail address. `"Barry Gibbs" <bg@example.com>` is
/// `Address { name: "Barry Gibbs", address: "bg@example.com" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Decoded display name; empty when there is none.
    pub name: String,
    /// `local-part@domain`, as written.
    pub address: String,
}

impl Address {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Local part (before the last `@`).
    pub fn local_part(&self) -> &str {
        self.address.rsplit_once('@').map_or(self.address.as_str(), |(local, _)| local)
    }

    /// Domain (after the last `@`); empty if there is no `@`.
    pub fn domain(&self) -> &str {
        self.address.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

/// Formats as a valid RFC 5322 address. Names with anything beyond printable ASCII
/// are written as a UTF-8 "Q" encoded-word.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return write!(f, "<{}>", self.address);
        }
        if self.name.bytes().all(|c| is_vchar(c) || is_wsp(c)) {
            f.write_char('"')?;
            for c in self.name.chars() {
                if c == '"' || c == '\\' {
                    f.write_char('\\')?;
                }
                f.write_char(c)?;
            }
            return write!(f, "\" <{}>", self.address);
        }
        write!(f, "{} <{}>", encode_q_word(&self.name), self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address() {
        assert_eq!(Address::new("", "bg@example.com").to_string(), "<bg@example.com>");
    }

    #[test]
    fn quoted_name() {
        assert_eq!(
            Address::new("Barry Gibbs", "bg@example.com").to_string(),
            "\"Barry Gibbs\" <bg@example.com>"
        );
        assert_eq!(
            Address::new("say \"hi\" \\o/", "a@b").to_string(),
            "\"say \\\"hi\\\" \\\\o/\" <a@b>"
        );
    }

    #[test]
    fn encoded_name() {
        assert_eq!(
            Address::new("Jörg Doe", "joerg@example.com").to_string(),
            "=?utf-8?q?J=C3=B6rg_Doe?= <joerg@example.com>"
        );
    }

    #[test]
    fn parts() {
        let a = Address::new("", "\"odd@local\"@example.com");
        assert_eq!(a.local_part(), "\"odd@local\"");
        assert_eq!(a.domain(), "example.com");
        assert_eq!(Address::new("", "nodomain").domain(), "");
    }
}
