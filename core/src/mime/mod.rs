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

//! Pull-based MIME header and body decoding (every decoder is an `io::Read`).

pub mod body;
pub mod charset;
pub mod line_folding;
pub mod quoted_printable;
pub mod rfc2047;
pub mod rfc5322;
pub mod utils;

pub use body::{body_reader, decode_body, TransferEncoding};
#[cfg(feature = "encoding")]
pub use charset::EncodingTranscoder;
pub use charset::{normalize_charset, Latin1Reader, Transcoder};
pub use line_folding::LineFoldingStripper;
pub use quoted_printable::{QpMode, QuotedPrintableDecoder};
pub use rfc2047::{decode_text, encode_q_word, Rfc2047Reader};
pub use rfc5322::{parse_address_list, parse_date, Address, HeaderMap};
