//! WASM bindings for JavaScript hosts.
//!
//! Mirrors the C ABI one to one, with JavaScript naming. Handles are
//! `bigint`s, absent strings are `undefined`, and failures use the same
//! sentinels as the C functions.

use std::sync::LazyLock;

use wasm_bindgen::prelude::*;

use crate::bridge::Bridge;
use crate::registry::{Handle, INVALID_HANDLE};

static BRIDGE: LazyLock<Bridge> = LazyLock::new(Bridge::new);

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn or_invalid(result: crate::Result<Handle>) -> Handle {
    result.unwrap_or(INVALID_HANDLE)
}

#[wasm_bindgen]
pub fn parse(html: &str, base_uri: &str) -> i64 {
    BRIDGE.parse(html, base_uri)
}

#[wasm_bindgen(js_name = parseFragment)]
pub fn parse_fragment(html: &str, base_uri: &str) -> i64 {
    BRIDGE.parse_fragment(html, base_uri)
}

#[wasm_bindgen]
pub fn select(handle: i64, selector: &str) -> i64 {
    or_invalid(BRIDGE.select(handle, selector))
}

#[wasm_bindgen(js_name = selectFirst)]
pub fn select_first(handle: i64, selector: &str) -> i64 {
    or_invalid(BRIDGE.select_first(handle, selector))
}

#[wasm_bindgen]
pub fn attr(handle: i64, key: &str) -> Option<String> {
    BRIDGE.attr(handle, key).ok().flatten()
}

#[wasm_bindgen(js_name = hasAttr)]
pub fn has_attr(handle: i64, key: &str) -> bool {
    BRIDGE.has_attr(handle, key).unwrap_or(false)
}

#[wasm_bindgen(js_name = setAttr)]
pub fn set_attr(handle: i64, key: &str, value: &str) {
    let _ = BRIDGE.set_attr(handle, key, value);
}

#[wasm_bindgen(js_name = removeAttr)]
pub fn remove_attr(handle: i64, key: &str) {
    let _ = BRIDGE.remove_attr(handle, key);
}

#[wasm_bindgen]
pub fn text(handle: i64) -> Option<String> {
    BRIDGE.text(handle).ok()
}

#[wasm_bindgen(js_name = ownText)]
pub fn own_text(handle: i64) -> Option<String> {
    BRIDGE.own_text(handle).ok()
}

#[wasm_bindgen(js_name = innerHtml)]
pub fn inner_html(handle: i64) -> Option<String> {
    BRIDGE.inner_html(handle).ok()
}

#[wasm_bindgen(js_name = outerHtml)]
pub fn outer_html(handle: i64) -> Option<String> {
    BRIDGE.outer_html(handle).ok()
}

#[wasm_bindgen(js_name = setText)]
pub fn set_text(handle: i64, text: &str) {
    let _ = BRIDGE.set_text(handle, text);
}

#[wasm_bindgen(js_name = setHtml)]
pub fn set_html(handle: i64, html: &str) {
    let _ = BRIDGE.set_html(handle, html);
}

#[wasm_bindgen]
pub fn data(handle: i64) -> Option<String> {
    BRIDGE.data(handle).ok()
}

#[wasm_bindgen(js_name = tagName)]
pub fn tag_name(handle: i64) -> Option<String> {
    BRIDGE.tag_name(handle).ok()
}

#[wasm_bindgen(js_name = elementId)]
pub fn element_id(handle: i64) -> Option<String> {
    BRIDGE.element_id(handle).ok().flatten()
}

#[wasm_bindgen(js_name = className)]
pub fn class_name(handle: i64) -> Option<String> {
    BRIDGE.class_name(handle).ok()
}

#[wasm_bindgen(js_name = hasClass)]
pub fn has_class(handle: i64, class: &str) -> bool {
    BRIDGE.has_class(handle, class).unwrap_or(false)
}

#[wasm_bindgen(js_name = addClass)]
pub fn add_class(handle: i64, class: &str) {
    let _ = BRIDGE.add_class(handle, class);
}

#[wasm_bindgen(js_name = removeClass)]
pub fn remove_class(handle: i64, class: &str) {
    let _ = BRIDGE.remove_class(handle, class);
}

#[wasm_bindgen]
pub fn size(list: i64) -> i32 {
    BRIDGE
        .size(list)
        .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
        .unwrap_or(-1)
}

#[wasm_bindgen]
pub fn get(list: i64, index: i32) -> i64 {
    or_invalid(BRIDGE.get(list, i64::from(index)))
}

#[wasm_bindgen]
pub fn first(list: i64) -> i64 {
    or_invalid(BRIDGE.first(list))
}

#[wasm_bindgen]
pub fn last(list: i64) -> i64 {
    or_invalid(BRIDGE.last(list))
}

#[wasm_bindgen]
pub fn parent(handle: i64) -> i64 {
    or_invalid(BRIDGE.parent(handle))
}

#[wasm_bindgen]
pub fn children(handle: i64) -> i64 {
    or_invalid(BRIDGE.children(handle))
}

#[wasm_bindgen(js_name = nextSibling)]
pub fn next_sibling(handle: i64) -> i64 {
    or_invalid(BRIDGE.next_sibling(handle))
}

#[wasm_bindgen(js_name = prevSibling)]
pub fn prev_sibling(handle: i64) -> i64 {
    or_invalid(BRIDGE.prev_sibling(handle))
}

#[wasm_bindgen]
pub fn siblings(handle: i64) -> i64 {
    or_invalid(BRIDGE.siblings(handle))
}

#[wasm_bindgen]
pub fn remove(handle: i64) {
    let _ = BRIDGE.remove(handle);
}

#[wasm_bindgen]
pub fn prepend(handle: i64, html: &str) {
    let _ = BRIDGE.prepend(handle, html);
}

#[wasm_bindgen]
pub fn append(handle: i64, html: &str) {
    let _ = BRIDGE.append(handle, html);
}

#[wasm_bindgen(js_name = nodeName)]
pub fn node_name(handle: i64) -> Option<String> {
    BRIDGE.node_name(handle).ok()
}

#[wasm_bindgen(js_name = childNodeSize)]
pub fn child_node_size(handle: i64) -> i32 {
    BRIDGE
        .child_node_size(handle)
        .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
        .unwrap_or(-1)
}

#[wasm_bindgen(js_name = childNode)]
pub fn child_node(handle: i64, index: i32) -> i64 {
    or_invalid(BRIDGE.child_node(handle, i64::from(index)))
}

#[wasm_bindgen(js_name = childNodeHandles)]
pub fn child_node_handles(handle: i64) -> Vec<i64> {
    BRIDGE.child_node_handles(handle).unwrap_or_default()
}

#[wasm_bindgen(js_name = isTextNode)]
pub fn is_text_node(handle: i64) -> bool {
    BRIDGE.is_text_node(handle)
}

#[wasm_bindgen(js_name = parentNode)]
pub fn parent_node(handle: i64) -> i64 {
    or_invalid(BRIDGE.parent_node(handle))
}

#[wasm_bindgen(js_name = nodeOuterHtml)]
pub fn node_outer_html(handle: i64) -> Option<String> {
    BRIDGE.node_outer_html(handle).ok()
}

#[wasm_bindgen(js_name = removeNode)]
pub fn remove_node(handle: i64) {
    let _ = BRIDGE.remove_node(handle);
}

#[wasm_bindgen(js_name = nodeBaseUri)]
pub fn node_base_uri(handle: i64) -> Option<String> {
    BRIDGE.node_base_uri(handle).ok()
}

#[wasm_bindgen(js_name = nodeAbsUrl)]
pub fn node_abs_url(handle: i64, key: &str) -> Option<String> {
    BRIDGE.node_abs_url(handle, key).ok()
}

#[wasm_bindgen(js_name = setNodeBaseUri)]
pub fn set_node_base_uri(handle: i64, base_uri: &str) {
    let _ = BRIDGE.set_node_base_uri(handle, base_uri);
}

#[wasm_bindgen(js_name = createElement)]
pub fn create_element(tag: &str) -> i64 {
    or_invalid(BRIDGE.create_element(tag))
}

#[wasm_bindgen(js_name = createTextNode)]
pub fn create_text_node(text: &str) -> i64 {
    BRIDGE.create_text_node(text)
}

#[wasm_bindgen(js_name = createElements)]
pub fn create_elements(handles: &[i64]) -> i64 {
    BRIDGE.create_elements(handles)
}

#[wasm_bindgen(js_name = textNodeText)]
pub fn text_node_text(handle: i64) -> Option<String> {
    BRIDGE.text_node_text(handle).ok()
}

#[wasm_bindgen(js_name = setTextNodeText)]
pub fn set_text_node_text(handle: i64, text: &str) {
    let _ = BRIDGE.set_text_node_text(handle, text);
}

#[wasm_bindgen(js_name = textNodeWholeText)]
pub fn text_node_whole_text(handle: i64) -> Option<String> {
    BRIDGE.text_node_whole_text(handle).ok()
}

#[wasm_bindgen(js_name = textNodeIsBlank)]
pub fn text_node_is_blank(handle: i64) -> bool {
    BRIDGE.text_node_is_blank(handle).unwrap_or(false)
}

#[wasm_bindgen(js_name = textNodeHandles)]
pub fn text_node_handles(handle: i64) -> Vec<i64> {
    BRIDGE.text_node_handles(handle).unwrap_or_default()
}

#[wasm_bindgen]
pub fn free(handle: i64) {
    BRIDGE.free(handle);
}

#[wasm_bindgen(js_name = releaseAll)]
pub fn release_all() {
    BRIDGE.release_all();
}

#[wasm_bindgen]
pub fn dispose() {
    BRIDGE.dispose();
}
