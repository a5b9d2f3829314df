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

//! C FFI for mimemail core. All string parameters are UTF-8 NUL-terminated.
//! Functions returning pointers return NULL on failure; functions returning int
//! return 0 on success, -1 on failure. After a failure, mimemail_last_error()
//! describes it. Every charset known to encoding_rs is available.

use libc::{c_char, c_int, size_t};
use std::ffi::{CStr, CString};
use std::ptr;

use mimemail_core::{Address, DecoderConfig, EncodingTranscoder, MimeError, QpMode};

static TRANSCODER: EncodingTranscoder = EncodingTranscoder;

fn config() -> DecoderConfig<'static> {
    DecoderConfig::new().with_transcoder(&TRANSCODER)
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<CString>> = const { std::cell::RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    let msg = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn set_mime_error(err: &MimeError) {
    set_last_error(&err.to_string());
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

fn ptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok() }
}

/// Owned C string, or NULL with last error set if `s` has an interior NUL.
fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => {
            set_last_error("decoded text contains a NUL byte");
            ptr::null_mut()
        }
    }
}

/// C struct for one parsed address. Both strings are owned by the list.
#[repr(C)]
pub struct MimemailAddress {
    /// Decoded display name; empty string when absent.
    pub name: *mut c_char,
    /// local-part@domain.
    pub address: *mut c_char,
}

#[no_mangle]
pub extern "C" fn mimemail_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Last error message from a failed call. Valid until the next failing call on this thread. Do not free.
#[no_mangle]
pub extern "C" fn mimemail_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Free a string returned by mimemail_decode_text or mimemail_format_address. No-op if ptr is NULL.
#[no_mangle]
pub unsafe extern "C" fn mimemail_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

/// Decode RFC 2047 encoded-words in a header value (e.g. Subject). Caller frees with mimemail_free_string.
#[no_mangle]
pub unsafe extern "C" fn mimemail_decode_text(raw: *const c_char) -> *mut c_char {
    let raw = match ptr_to_str(raw) {
        Some(s) => s,
        None => {
            set_last_error("raw is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    match config().decode_text(raw) {
        Ok(text) => {
            clear_last_error();
            into_c_string(text)
        }
        Err(e) => {
            set_mime_error(&e);
            ptr::null_mut()
        }
    }
}

/// Parse an RFC 5322 address list (From, To, Cc). On success *out_count is set and the
/// returned array has that many elements (caller frees with mimemail_free_address_list).
#[no_mangle]
pub unsafe extern "C" fn mimemail_parse_address_list(
    raw: *const c_char,
    out_count: *mut size_t,
) -> *mut MimemailAddress {
    if out_count.is_null() {
        set_last_error("out_count is null");
        return ptr::null_mut();
    }
    *out_count = 0;
    let raw = match ptr_to_str(raw) {
        Some(s) => s,
        None => {
            set_last_error("raw is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let list = match config().parse_address_list(raw) {
        Ok(list) => list,
        Err(e) => {
            set_mime_error(&e);
            return ptr::null_mut();
        }
    };
    let mut out: Vec<MimemailAddress> = Vec::with_capacity(list.len());
    for addr in list {
        let (name, address) = match (CString::new(addr.name), CString::new(addr.address)) {
            (Ok(n), Ok(a)) => (n, a),
            _ => {
                free_addresses(out);
                set_last_error("address contains a NUL byte");
                return ptr::null_mut();
            }
        };
        out.push(MimemailAddress {
            name: name.into_raw(),
            address: address.into_raw(),
        });
    }
    let mut out = out.into_boxed_slice();
    *out_count = out.len();
    let ptr = out.as_mut_ptr();
    std::mem::forget(out);
    clear_last_error();
    ptr
}

fn free_addresses(list: Vec<MimemailAddress>) {
    for a in list {
        unsafe {
            if !a.name.is_null() {
                let _ = CString::from_raw(a.name);
            }
            if !a.address.is_null() {
                let _ = CString::from_raw(a.address);
            }
        }
    }
}

/// Free an array returned by mimemail_parse_address_list. count = number of elements.
#[no_mangle]
pub unsafe extern "C" fn mimemail_free_address_list(list: *mut MimemailAddress, count: size_t) {
    if list.is_null() {
        return;
    }
    free_addresses(Vec::from_raw_parts(list, count, count));
}

/// Render name and address as an RFC 5322 mailbox (name may be NULL or empty).
/// Caller frees with mimemail_free_string.
#[no_mangle]
pub unsafe extern "C" fn mimemail_format_address(
    name: *const c_char,
    address: *const c_char,
) -> *mut c_char {
    let address = match ptr_to_str(address) {
        Some(s) => s,
        None => {
            set_last_error("address is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let name = if name.is_null() {
        ""
    } else {
        match ptr_to_str(name) {
            Some(s) => s,
            None => {
                set_last_error("name is not valid UTF-8");
                return ptr::null_mut();
            }
        }
    };
    clear_last_error();
    into_c_string(Address::new(name, address).to_string())
}

/// Transfer-decode and convert a body part to UTF-8. encoding is "quoted-printable"/"q",
/// "base64"/"b", or anything else for identity. header_mode != 0 selects header rules
/// for quoted-printable (`_` is space, CR/LF dropped). On success *out_len is set;
/// caller frees with mimemail_free_bytes.
#[no_mangle]
pub unsafe extern "C" fn mimemail_decode_body(
    charset: *const c_char,
    encoding: *const c_char,
    data: *const u8,
    len: size_t,
    header_mode: c_int,
    out_len: *mut size_t,
) -> *mut u8 {
    if out_len.is_null() {
        set_last_error("out_len is null");
        return ptr::null_mut();
    }
    *out_len = 0;
    let (charset, encoding) = match (ptr_to_str(charset), ptr_to_str(encoding)) {
        (Some(c), Some(e)) => (c, e),
        _ => {
            set_last_error("charset or encoding is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let bytes: &[u8] = if data.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    };
    let mode = if header_mode != 0 { QpMode::Header } else { QpMode::Body };
    match config().decode_body(charset, encoding, bytes, mode) {
        Ok(decoded) => {
            let mut decoded = decoded.into_boxed_slice();
            *out_len = decoded.len();
            let ptr = decoded.as_mut_ptr();
            std::mem::forget(decoded);
            clear_last_error();
            ptr
        }
        Err(e) => {
            set_mime_error(&e);
            ptr::null_mut()
        }
    }
}

/// Free bytes returned by mimemail_decode_body. len = the *out_len it reported.
#[no_mangle]
pub unsafe extern "C" fn mimemail_free_bytes(ptr: *mut u8, len: size_t) {
    if !ptr.is_null() {
        let _ = Vec::from_raw_parts(ptr, len, len);
    }
}

/// Parse an RFC 5322 date. On success *out_timestamp is seconds since the Unix epoch and
/// *out_offset is the zone offset in seconds east of UTC. Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn mimemail_parse_date(
    value: *const c_char,
    out_timestamp: *mut i64,
    out_offset: *mut c_int,
) -> c_int {
    if out_timestamp.is_null() || out_offset.is_null() {
        set_last_error("output pointer is null");
        return -1;
    }
    let value = match ptr_to_str(value) {
        Some(s) => s,
        None => {
            set_last_error("value is null or not valid UTF-8");
            return -1;
        }
    };
    match mimemail_core::parse_date(value) {
        Ok(dt) => {
            *out_timestamp = dt.timestamp();
            *out_offset = dt.offset().local_minus_utc();
            clear_last_error();
            0
        }
        Err(e) => {
            set_mime_error(&e);
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let p = mimemail_last_error();
        assert!(!p.is_null());
        unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
    }

    #[test]
    fn version_is_cargo_version() {
        let v = unsafe { CStr::from_ptr(mimemail_version()) };
        assert_eq!(v.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn decode_text_round_trip() {
        let raw = CString::new("=?gb2312?B?xOO6ww==?= world").unwrap();
        unsafe {
            let out = mimemail_decode_text(raw.as_ptr());
            assert!(!out.is_null());
            assert_eq!(CStr::from_ptr(out).to_str().unwrap(), "你好 world");
            mimemail_free_string(out);
        }
        assert!(mimemail_last_error().is_null());
    }

    #[test]
    fn decode_text_error_sets_last_error() {
        let raw = CString::new("=?utf-8?q?unterminated").unwrap();
        unsafe {
            assert!(mimemail_decode_text(raw.as_ptr()).is_null());
            assert!(mimemail_decode_text(ptr::null()).is_null());
        }
        assert_eq!(last_error(), "raw is null or not valid UTF-8");
    }

    #[test]
    fn address_list() {
        let raw = CString::new("=?ISO-8859-1?Q?J=F6rg_Doe?= <joerg@example.com>, bg@example.com").unwrap();
        let mut count: size_t = 0;
        unsafe {
            let list = mimemail_parse_address_list(raw.as_ptr(), &mut count);
            assert!(!list.is_null());
            assert_eq!(count, 2);
            let items = std::slice::from_raw_parts(list, count);
            assert_eq!(CStr::from_ptr(items[0].name).to_str().unwrap(), "Jörg Doe");
            assert_eq!(CStr::from_ptr(items[0].address).to_str().unwrap(), "joerg@example.com");
            assert_eq!(CStr::from_ptr(items[1].name).to_str().unwrap(), "");
            mimemail_free_address_list(list, count);
        }
    }

    #[test]
    fn address_list_error() {
        let raw = CString::new("a@b.com c@d.com").unwrap();
        let mut count: size_t = 7;
        unsafe {
            assert!(mimemail_parse_address_list(raw.as_ptr(), &mut count).is_null());
        }
        assert_eq!(count, 0);
        assert_eq!(last_error(), "expected comma");
    }

    #[test]
    fn format_address() {
        let name = CString::new("Barry Gibbs").unwrap();
        let addr = CString::new("bg@example.com").unwrap();
        unsafe {
            let out = mimemail_format_address(name.as_ptr(), addr.as_ptr());
            assert_eq!(CStr::from_ptr(out).to_str().unwrap(), "\"Barry Gibbs\" <bg@example.com>");
            mimemail_free_string(out);
            let out = mimemail_format_address(ptr::null(), addr.as_ptr());
            assert_eq!(CStr::from_ptr(out).to_str().unwrap(), "<bg@example.com>");
            mimemail_free_string(out);
        }
    }

    #[test]
    fn decode_body_modes() {
        let charset = CString::new("iso-8859-1").unwrap();
        let encoding = CString::new("q").unwrap();
        let data = b"J=F6rg_Doe";
        let mut len: size_t = 0;
        unsafe {
            let out = mimemail_decode_body(charset.as_ptr(), encoding.as_ptr(), data.as_ptr(), data.len(), 1, &mut len);
            assert_eq!(std::slice::from_raw_parts(out, len), "Jörg Doe".as_bytes());
            mimemail_free_bytes(out, len);
            let out = mimemail_decode_body(charset.as_ptr(), encoding.as_ptr(), data.as_ptr(), data.len(), 0, &mut len);
            assert_eq!(std::slice::from_raw_parts(out, len), "Jörg_Doe".as_bytes());
            mimemail_free_bytes(out, len);
        }
    }

    #[test]
    fn decode_body_unknown_charset() {
        let charset = CString::new("x-no-such-charset").unwrap();
        let encoding = CString::new("base64").unwrap();
        let mut len: size_t = 0;
        unsafe {
            let out = mimemail_decode_body(charset.as_ptr(), encoding.as_ptr(), ptr::null(), 0, 0, &mut len);
            assert!(out.is_null());
        }
        assert_eq!(last_error(), "charset x-no-such-charset not supported");
    }

    #[test]
    fn parse_date() {
        let value = CString::new("Fri, 21 Nov 1997 09:55:06 -0600").unwrap();
        let mut ts: i64 = 0;
        let mut offset: c_int = 0;
        unsafe {
            assert_eq!(mimemail_parse_date(value.as_ptr(), &mut ts, &mut offset), 0);
        }
        assert_eq!(ts, 880127706);
        assert_eq!(offset, -21600);
    }
}
