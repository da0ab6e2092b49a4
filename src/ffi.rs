//! C ABI over a process-wide [`Bridge`].
//!
//! Conventions shared by every function here:
//!
//! - Handles are `i64`. `-1` means no handle was produced.
//! - Strings in are NUL-terminated UTF-8. Null or invalid input makes the
//!   call fail with its sentinel, except a null base URI, which reads as
//!   empty.
//! - Strings out are owned by the caller and must be released with
//!   [`dom_free_string`]. Null means absent.
//! - Handle arrays out are written through `out_handles`/`out_len` and must
//!   be released with [`dom_free_handle_array`].
//! - Counts return `-1` for unknown handles.
//! - Predicates return `1` or `0`, and `0` for unknown handles.
//! - No panic unwinds into the caller.
//!
//! # Safety
//!
//! Every pointer argument must be null or valid for the access described
//! above for the duration of the call.

#![allow(clippy::missing_safety_doc)]

use std::ffi::{CStr, CString, c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::LazyLock;

use crate::bridge::Bridge;
use crate::error::{BridgeError, Result};
use crate::registry::{Handle, INVALID_HANDLE};

static BRIDGE: LazyLock<Bridge> = LazyLock::new(Bridge::new);

/// The bridge every exported function operates on.
pub fn global() -> &'static Bridge {
    &BRIDGE
}

/// Run `f`, turning a panic into `fallback`.
fn guard<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!("panic caught at the C boundary");
        fallback
    })
}

unsafe fn read_str<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::NullPointer);
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map_err(|_| {
        tracing::debug!("rejected non-UTF-8 string argument");
        BridgeError::InvalidUtf8
    })
}

/// Like [`read_str`], but null reads as `""`.
unsafe fn read_str_or_empty<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Ok("");
    }
    unsafe { read_str(ptr) }
}

/// Hand a string to the caller. Interior NULs cannot be represented.
fn into_raw(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

fn string_or_null(result: Result<String>) -> *mut c_char {
    result.map(into_raw).unwrap_or(ptr::null_mut())
}

fn optional_or_null(result: Result<Option<String>>) -> *mut c_char {
    match result {
        Ok(Some(s)) => into_raw(s),
        _ => ptr::null_mut(),
    }
}

fn handle_or_invalid(result: Result<Handle>) -> Handle {
    result.unwrap_or(INVALID_HANDLE)
}

fn flag(value: bool) -> c_int {
    c_int::from(value)
}

fn count(len: usize) -> c_int {
    c_int::try_from(len).unwrap_or(c_int::MAX)
}

unsafe fn write_handles(handles: Vec<Handle>, out_handles: *mut *mut i64, out_len: *mut c_int) {
    if out_handles.is_null() || out_len.is_null() {
        return;
    }
    let (data, len) = if handles.is_empty() {
        (ptr::null_mut(), 0)
    } else {
        let len = count(handles.len());
        let boxed: Box<[i64]> = handles.into_boxed_slice();
        (Box::into_raw(boxed).cast::<i64>(), len)
    };
    unsafe {
        *out_handles = data;
        *out_len = len;
    }
}

// Memory

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_free_handle_array(arr: *mut i64, len: c_int) {
    let Ok(len) = usize::try_from(len) else {
        return;
    };
    if !arr.is_null() && len > 0 {
        drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(arr, len)) });
    }
}

// Parsing

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_parse(html: *const c_char, base_uri: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        let parsed = unsafe { read_str(html).and_then(|h| Ok((h, read_str_or_empty(base_uri)?))) };
        handle_or_invalid(parsed.map(|(h, b)| BRIDGE.parse(h, b)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_parse_fragment(html: *const c_char, base_uri: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        let parsed = unsafe { read_str(html).and_then(|h| Ok((h, read_str_or_empty(base_uri)?))) };
        handle_or_invalid(parsed.map(|(h, b)| BRIDGE.parse_fragment(h, b)))
    })
}

// Query

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_select(handle: i64, selector: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(unsafe { read_str(selector) }.and_then(|s| BRIDGE.select(handle, s)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_select_first(handle: i64, selector: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(
            unsafe { read_str(selector) }.and_then(|s| BRIDGE.select_first(handle, s)),
        )
    })
}

// Attributes

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_attr(handle: i64, key: *const c_char) -> *mut c_char {
    guard(ptr::null_mut(), || {
        optional_or_null(unsafe { read_str(key) }.and_then(|k| BRIDGE.attr(handle, k)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_has_attr(handle: i64, key: *const c_char) -> c_int {
    guard(0, || {
        flag(
            unsafe { read_str(key) }
                .and_then(|k| BRIDGE.has_attr(handle, k))
                .unwrap_or(false),
        )
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_set_attr(handle: i64, key: *const c_char, value: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(key).and_then(|k| Ok((k, read_str(value)?))) }
            .and_then(|(k, v)| BRIDGE.set_attr(handle, k, v));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_remove_attr(handle: i64, key: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(key) }.and_then(|k| BRIDGE.remove_attr(handle, k));
    })
}

// Text and markup

#[unsafe(no_mangle)]
pub extern "C" fn dom_text(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.text(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_own_text(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.own_text(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_inner_html(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.inner_html(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_outer_html(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.outer_html(handle)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_set_text(handle: i64, text: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(text) }.and_then(|t| BRIDGE.set_text(handle, t));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_set_html(handle: i64, html: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(html) }.and_then(|h| BRIDGE.set_html(handle, h));
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_data(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.data(handle)))
}

// Element info

#[unsafe(no_mangle)]
pub extern "C" fn dom_tag_name(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.tag_name(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_element_id(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || optional_or_null(BRIDGE.element_id(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_class_name(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.class_name(handle)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_has_class(handle: i64, class: *const c_char) -> c_int {
    guard(0, || {
        flag(
            unsafe { read_str(class) }
                .and_then(|c| BRIDGE.has_class(handle, c))
                .unwrap_or(false),
        )
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_add_class(handle: i64, class: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(class) }.and_then(|c| BRIDGE.add_class(handle, c));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_remove_class(handle: i64, class: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(class) }.and_then(|c| BRIDGE.remove_class(handle, c));
    })
}

// Node lists

#[unsafe(no_mangle)]
pub extern "C" fn dom_list_size(list: i64) -> c_int {
    guard(-1, || BRIDGE.size(list).map(count).unwrap_or(-1))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_list_get(list: i64, index: c_int) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(BRIDGE.get(list, i64::from(index)))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_list_first(list: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.first(list)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_list_last(list: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.last(list)))
}

// Navigation

#[unsafe(no_mangle)]
pub extern "C" fn dom_parent(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.parent(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_children(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.children(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_next_sibling(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.next_sibling(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_prev_sibling(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.prev_sibling(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_siblings(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.siblings(handle)))
}

// Mutation

#[unsafe(no_mangle)]
pub extern "C" fn dom_remove(handle: i64) {
    guard((), || {
        let _ = BRIDGE.remove(handle);
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_prepend(handle: i64, html: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(html) }.and_then(|h| BRIDGE.prepend(handle, h));
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_append(handle: i64, html: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(html) }.and_then(|h| BRIDGE.append(handle, h));
    })
}

// Nodes of any kind

#[unsafe(no_mangle)]
pub extern "C" fn dom_node_name(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.node_name(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_child_node_size(handle: i64) -> c_int {
    guard(-1, || BRIDGE.child_node_size(handle).map(count).unwrap_or(-1))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_child_node(handle: i64, index: c_int) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(BRIDGE.child_node(handle, i64::from(index)))
    })
}

/// Writes null and `0` for unknown handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_child_node_handles(
    handle: i64,
    out_handles: *mut *mut i64,
    out_len: *mut c_int,
) {
    guard((), || {
        let handles = BRIDGE.child_node_handles(handle).unwrap_or_default();
        unsafe { write_handles(handles, out_handles, out_len) }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_is_text_node(handle: i64) -> c_int {
    guard(0, || flag(BRIDGE.is_text_node(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_parent_node(handle: i64) -> i64 {
    guard(INVALID_HANDLE, || handle_or_invalid(BRIDGE.parent_node(handle)))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_node_outer_html(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || {
        string_or_null(BRIDGE.node_outer_html(handle))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_remove_node(handle: i64) {
    guard((), || {
        let _ = BRIDGE.remove_node(handle);
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_node_base_uri(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.node_base_uri(handle)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_node_abs_url(handle: i64, key: *const c_char) -> *mut c_char {
    guard(ptr::null_mut(), || {
        string_or_null(unsafe { read_str(key) }.and_then(|k| BRIDGE.node_abs_url(handle, k)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_set_node_base_uri(handle: i64, base_uri: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(base_uri) }.and_then(|b| BRIDGE.set_node_base_uri(handle, b));
    })
}

// Creation

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_create_element(tag: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(unsafe { read_str(tag) }.and_then(|t| BRIDGE.create_element(t)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_create_text_node(text: *const c_char) -> i64 {
    guard(INVALID_HANDLE, || {
        handle_or_invalid(unsafe { read_str(text) }.map(|t| BRIDGE.create_text_node(t)))
    })
}

/// A null array or non-positive count yields an empty list.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_create_elements(handles: *const i64, len: c_int) -> i64 {
    guard(INVALID_HANDLE, || {
        let handles: &[i64] = match usize::try_from(len) {
            Ok(len) if !handles.is_null() && len > 0 => unsafe {
                std::slice::from_raw_parts(handles, len)
            },
            _ => &[],
        };
        BRIDGE.create_elements(handles)
    })
}

// Text nodes

#[unsafe(no_mangle)]
pub extern "C" fn dom_text_node_text(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || string_or_null(BRIDGE.text_node_text(handle)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_set_text_node_text(handle: i64, text: *const c_char) {
    guard((), || {
        let _ = unsafe { read_str(text) }.and_then(|t| BRIDGE.set_text_node_text(handle, t));
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_text_node_whole_text(handle: i64) -> *mut c_char {
    guard(ptr::null_mut(), || {
        string_or_null(BRIDGE.text_node_whole_text(handle))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_text_node_is_blank(handle: i64) -> c_int {
    guard(0, || flag(BRIDGE.text_node_is_blank(handle).unwrap_or(false)))
}

/// Writes null and `0` for unknown handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dom_text_node_handles(
    handle: i64,
    out_handles: *mut *mut i64,
    out_len: *mut c_int,
) {
    guard((), || {
        let handles = BRIDGE.text_node_handles(handle).unwrap_or_default();
        unsafe { write_handles(handles, out_handles, out_len) }
    })
}

// Lifecycle

#[unsafe(no_mangle)]
pub extern "C" fn dom_free(handle: i64) {
    guard((), || BRIDGE.free(handle))
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_release_all() {
    guard((), || BRIDGE.release_all())
}

#[unsafe(no_mangle)]
pub extern "C" fn dom_dispose() {
    guard((), || BRIDGE.dispose())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_str() {
        let s = CString::new("héllo").unwrap();
        assert_eq!(unsafe { read_str(s.as_ptr()) }, Ok("héllo"));
        assert_eq!(
            unsafe { read_str(ptr::null()) },
            Err(BridgeError::NullPointer)
        );

        let bad = [0xffu8, 0xfe, 0];
        assert_eq!(
            unsafe { read_str(bad.as_ptr().cast()) },
            Err(BridgeError::InvalidUtf8)
        );
    }

    #[test]
    fn test_into_raw_interior_nul() {
        assert!(into_raw("a\0b".to_string()).is_null());
        let p = into_raw("ok".to_string());
        assert!(!p.is_null());
        unsafe { dom_free_string(p) };
    }

    #[test]
    fn test_write_handles() {
        let mut data: *mut i64 = ptr::null_mut();
        let mut len: c_int = -1;
        unsafe { write_handles(vec![4, 5, 6], &mut data, &mut len) };
        assert_eq!(len, 3);
        assert_eq!(unsafe { std::slice::from_raw_parts(data, 3) }, &[4, 5, 6]);
        unsafe { dom_free_handle_array(data, len) };

        unsafe { write_handles(Vec::new(), &mut data, &mut len) };
        assert!(data.is_null());
        assert_eq!(len, 0);
        unsafe { write_handles(vec![1], ptr::null_mut(), ptr::null_mut()) };
    }

    #[test]
    fn test_guard_catches_panics() {
        let out = guard(-1i64, || panic!("boom"));
        assert_eq!(out, -1);
    }
}
