/*
 * mod.rs
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

//! RFC 5322 header fields: address lists, dates, and a simple header map to read them from.

mod address_parser;
mod date_time;
mod email_address;

use chrono::{DateTime, FixedOffset};

use crate::config::DecoderConfig;
use crate::error::MimeError;
use crate::mime::rfc2047;

pub use address_parser::parse_address_list;
pub use date_time::parse_date;
pub use email_address::Address;

/// Header fields in arrival order. Names compare ASCII case-insensitively;
/// a name seen twice keeps all of its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `name`, after any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(n, values)| values.iter().map(move |v| (n.as_str(), v.as_str())))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (n, v) in iter {
            map.append(n, v);
        }
        map
    }
}

fn required<'h>(headers: &'h HeaderMap, key: &str) -> Result<&'h str, MimeError> {
    headers
        .get(key)
        .ok_or_else(|| MimeError::HeaderNotPresent(key.to_string()))
}

/// Parse the first value of `key` as an address list. An absent header is
/// `HeaderNotPresent`; a present but empty one fails as `NoAddress`.
pub fn address_list(
    headers: &HeaderMap,
    key: &str,
    config: DecoderConfig<'_>,
) -> Result<Vec<Address>, MimeError> {
    parse_address_list(required(headers, key)?, config)
}

/// Parse the `Date` header.
pub fn date(headers: &HeaderMap) -> Result<DateTime<FixedOffset>, MimeError> {
    parse_date(required(headers, "Date")?)
}

/// Decode the first value of `key` as unstructured text (Subject, Comments, ...).
pub fn text(headers: &HeaderMap, key: &str, config: DecoderConfig<'_>) -> Result<String, MimeError> {
    rfc2047::decode_text(required(headers, key)?, config)
}
