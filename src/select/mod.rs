//! CSS selector queries over an [`ArenaDom`].
//!
//! Selectors are parsed by the `selectors` crate, with the `:contains`
//! family peeled off first and applied as post-filters.

mod contains;
mod element_ref;

pub use contains::{ContainsFilter, ContainsKind, strip_contains};
pub use element_ref::{DomSelectors, ElementRef};

use selectors::context::{MatchingContext, QuirksMode, SelectorCaches};
use selectors::matching::{MatchingForInvalidation, MatchingMode, NeedsSelectorFlags};
use selectors::parser::{ParseRelative, Selector, SelectorList};

use crate::dom::{ArenaDom, ArenaNodeId};
use crate::error::{BridgeError, Result};

/// A compiled selector.
#[derive(Debug, Clone)]
pub struct Query {
    selectors: Vec<Selector<DomSelectors>>,
    filters: Vec<ContainsFilter>,
}

impl Query {
    /// Compile a selector string.
    pub fn parse(selector: &str) -> Result<Self> {
        if selector.trim().is_empty() {
            return Err(BridgeError::Selector("empty selector".to_string()));
        }

        let (base, filters) = strip_contains(selector);
        let base = if base.trim().is_empty() {
            "*"
        } else {
            base.as_str()
        };

        let mut input = cssparser::ParserInput::new(base);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = SelectorList::parse(&DomSelectors, &mut parser, ParseRelative::No)
            .map_err(|e| BridgeError::Selector(format!("{selector}: {:?}", e.kind)))?;

        Ok(Self {
            selectors: list.slice().to_vec(),
            filters,
        })
    }

    /// Check whether a single node matches.
    ///
    /// Only elements can match; documents and text nodes never do.
    pub fn matches(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        let mut caches = SelectorCaches::default();
        self.matches_with(dom, id, &mut caches)
    }

    fn matches_with(&self, dom: &ArenaDom, id: ArenaNodeId, caches: &mut SelectorCaches) -> bool {
        if !dom.is_element(id) {
            return false;
        }

        let elem = ElementRef::new(dom, id);
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        let css_match = self
            .selectors
            .iter()
            .any(|sel| selectors::matching::matches_selector(sel, 0, None, &elem, &mut context));

        css_match && self.filters.iter().all(|f| f.matches(dom, id))
    }
}

/// All elements matching `query` within `root`, in document order.
///
/// `root` itself comes first when it matches.
pub fn select(dom: &ArenaDom, root: ArenaNodeId, query: &Query) -> Vec<ArenaNodeId> {
    let mut caches = SelectorCaches::default();
    std::iter::once(root)
        .chain(dom.descendants(root))
        .filter(|&id| query.matches_with(dom, id, &mut caches))
        .collect()
}

/// The first element `select` would return.
pub fn select_first(dom: &ArenaDom, root: ArenaNodeId, query: &Query) -> Option<ArenaNodeId> {
    let mut caches = SelectorCaches::default();
    std::iter::once(root)
        .chain(dom.descendants(root))
        .find(|&id| query.matches_with(dom, id, &mut caches))
}
