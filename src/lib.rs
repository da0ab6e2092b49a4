//! # dombridge
//!
//! An HTML DOM for hosts that can only pass integers across a foreign
//! function boundary.
//!
//! ## Features
//!
//! - Parse documents and body fragments with html5ever
//! - Query with CSS selectors, plus the `:contains` text pseudo-classes
//! - Read and mutate attributes, classes, text and markup
//! - Navigate parents, children, siblings and raw child nodes
//! - Every node and query result is addressed by an integer [`Handle`]
//!
//! ## Handles
//!
//! A handle is a lease on a node or a node list. It stays valid until it is
//! freed or the whole bridge is released. Asking for the same node twice
//! issues two handles, and freeing one leaves the other alone.
//!
//! ```
//! use dombridge::Bridge;
//!
//! let bridge = Bridge::new();
//! let doc = bridge.parse("<ul><li>one</li><li>two</li></ul>", "");
//!
//! let items = bridge.select(doc, "li").unwrap();
//! assert_eq!(bridge.size(items).unwrap(), 2);
//!
//! let second = bridge.get(items, 1).unwrap();
//! assert_eq!(bridge.text(second).unwrap(), "two");
//!
//! bridge.free(second);
//! assert!(bridge.text(second).is_err());
//! ```
//!
//! ## Boundary layers
//!
//! The `ffi` feature (on by default) exports the same operations as
//! `extern "C"` functions prefixed `dom_`; the `wasm` feature exports them
//! through wasm-bindgen. Both collapse errors into sentinels: `-1` for
//! handles and counts, null for strings, `false` for predicates.

pub mod bridge;
pub mod documents;
pub mod dom;
pub mod error;
pub mod registry;
pub mod select;
pub mod url_resolver;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bridge::Bridge;
pub use error::{BridgeError, Result};
pub use registry::{Entry, Handle, INVALID_HANDLE, NodeKind, NodeRef, Registry};
pub use select::Query;
