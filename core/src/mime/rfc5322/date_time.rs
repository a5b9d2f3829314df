/*
 * date_time.rs
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

//! RFC 5322 date-time parsing (section 3.3), including the obsolete forms
//! seen in the wild: 2-digit years, missing seconds, named zones and a
//! trailing `(ZONE)` comment.

use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset};

use crate::error::MimeError;

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Zone {
    /// `-0700`
    Numeric,
    /// `MST`
    Named,
    /// `-0700 (MST)`
    NumericWithName,
}

/// One entry of the layout table.
#[derive(Debug)]
struct Layout {
    weekday: bool,
    two_digit_year: bool,
    zone: Zone,
    /// chrono format for what remains after the weekday and zone are normalised.
    format: String,
}

/// Cross product of the optional pieces of the grammar, tried in order.
/// chrono's `%d` reads one or two digits, so the day needs no variants.
fn layouts() -> &'static [Layout] {
    static LAYOUTS: OnceLock<Vec<Layout>> = OnceLock::new();
    LAYOUTS.get_or_init(|| {
        let mut table = Vec::with_capacity(24);
        for weekday in [false, true] {
            // %Y also accepts two digits, so %y has to be tried first.
            for (year, two_digit_year) in [("%y", true), ("%Y", false)] {
                for seconds in [":%S", ""] {
                    for zone in [Zone::Numeric, Zone::Named, Zone::NumericWithName] {
                        table.push(Layout {
                            weekday,
                            two_digit_year,
                            zone,
                            format: format!("%d %b {year} %H:%M{seconds} %z"),
                        });
                    }
                }
            }
        }
        table
    })
}

impl Layout {
    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let rest = if self.weekday {
            strip_weekday(value)?
        } else {
            value
        };
        let rest: Cow<'_, str> = match self.zone {
            Zone::Numeric => Cow::Borrowed(rest),
            Zone::Named => {
                let (head, name) = rest.rsplit_once(' ')?;
                Cow::Owned(format!("{head} {}", zone_offset(name)?))
            }
            Zone::NumericWithName => {
                let (head, comment) = rest.rsplit_once(" (")?;
                let name = comment.strip_suffix(')')?;
                zone_offset(name)?;
                Cow::Borrowed(head)
            }
        };
        let dt = DateTime::parse_from_str(&rest, &self.format).ok()?;
        // RFC 5322 4.3: 00-49 is 2000-2049, 50-99 is 1950-1999.
        if self.two_digit_year && dt.year() >= 2050 {
            dt.with_year(dt.year() - 100)
        } else {
            Some(dt)
        }
    }
}

/// `Mon, ` prefix. The name must be a day name but is not checked against the date.
fn strip_weekday(value: &str) -> Option<&str> {
    let (name, rest) = value.split_once(", ")?;
    DAY_NAMES
        .iter()
        .any(|d| d.eq_ignore_ascii_case(name))
        .then_some(rest)
}

/// Offset for a zone abbreviation. Unknown alphabetic names are taken as UTC.
fn zone_offset(name: &str) -> Option<&'static str> {
    if name.is_empty() || name.len() > 5 || !name.bytes().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let offset = match name.to_ascii_uppercase().as_str() {
        "EDT" => "-0400",
        "EST" | "CDT" => "-0500",
        "CST" | "MDT" => "-0600",
        "MST" | "PDT" => "-0700",
        "PST" => "-0800",
        _ => "+0000",
    };
    Some(offset)
}

/// Parse an RFC 5322 date-time string (e.g. "Fri, 21 Nov 1997 09:55:06 -0600").
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>, MimeError> {
    let value = value.trim();
    for (i, layout) in layouts().iter().enumerate() {
        if let Some(dt) = layout.parse(value) {
            log::trace!("parse_date: {value:?} matched layout {i} {layout:?}");
            return Ok(dt);
        }
    }
    Err(MimeError::DateUnparseable(value.to_string()))
}
