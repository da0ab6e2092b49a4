//! Arena nodes as `selectors::Element`, and the selector dialect we parse.
//!
//! Names and identifiers are html5ever atoms, so selector matching compares
//! interned strings with the names the tree builder produced.

use std::fmt;

use cssparser::{CowRcStr, ParseError, SourceLocation, ToCss};
use html5ever::{LocalName, Namespace, Prefix};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::MatchingContext;
use selectors::matching::ElementSelectorFlags;
use selectors::parser::SelectorParseErrorKind;
use selectors::{OpaqueElement, SelectorImpl};

use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// A string-like value as it appears inside a compiled selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Css<T>(pub T);

impl<T: AsRef<str>> ToCss for Css<T> {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl<'a, T: From<&'a str>> From<&'a str> for Css<T> {
    fn from(s: &'a str) -> Self {
        Css(T::from(s))
    }
}

impl<T: AsRef<str>> AsRef<str> for Css<T> {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl<T: PrecomputedHash> PrecomputedHash for Css<T> {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

/// The selector dialect: CSS Selectors level 4 plus a few static
/// state pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomSelectors;

impl SelectorImpl for DomSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = Css<String>;
    type Identifier = Css<LocalName>;
    type LocalName = Css<LocalName>;
    type NamespaceUrl = Css<Namespace>;
    type NamespacePrefix = Css<Prefix>;
    type BorrowedLocalName = Css<LocalName>;
    type BorrowedNamespaceUrl = Css<Namespace>;
    type NonTSPseudoClass = StatePseudoClass;
    type PseudoElement = NoPseudoElement;
}

impl<'i> selectors::parser::Parser<'i> for DomSelectors {
    type Impl = DomSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_is_and_where(&self) -> bool {
        true
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<StatePseudoClass, ParseError<'i, Self::Error>> {
        let class = cssparser::match_ignore_ascii_case! { &name,
            "link" => StatePseudoClass::Link,
            "any-link" => StatePseudoClass::AnyLink,
            "checked" => StatePseudoClass::Checked,
            "disabled" => StatePseudoClass::Disabled,
            "enabled" => StatePseudoClass::Enabled,
            _ => return Err(location.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            )),
        };
        Ok(class)
    }
}

/// Pseudo-classes answerable from markup alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatePseudoClass {
    Link,
    AnyLink,
    Checked,
    Disabled,
    Enabled,
}

impl selectors::parser::NonTSPseudoClass for StatePseudoClass {
    type Impl = DomSelectors;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        false
    }
}

impl ToCss for StatePseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(match self {
            Self::Link => ":link",
            Self::AnyLink => ":any-link",
            Self::Checked => ":checked",
            Self::Disabled => ":disabled",
            Self::Enabled => ":enabled",
        })
    }
}

/// Pseudo-elements never match a static tree, so none parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoPseudoElement {}

impl ToCss for NoPseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for NoPseudoElement {
    type Impl = DomSelectors;
}

/// A node in an arena, seen by the selector matcher.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub dom: &'a ArenaDom,
    pub id: ArenaNodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(dom: &'a ArenaDom, id: ArenaNodeId) -> Self {
        Self { dom, id }
    }

    fn at(&self, id: ArenaNodeId) -> Self {
        Self::new(self.dom, id)
    }

    fn is_one_of(&self, tags: &[&str]) -> bool {
        self.dom
            .element_name(self.id)
            .is_some_and(|n| tags.contains(&n.as_ref()))
    }

    fn has_attr(&self, local: &str) -> bool {
        self.dom.get_attr(self.id, local).is_some()
    }

    /// Controls the `disabled` attribute applies to.
    fn is_form_control(&self) -> bool {
        self.is_one_of(&[
            "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
        ])
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dom.element_name(self.id) {
            Some(name) => write!(f, "<{}>@{}", name, self.id.0),
            None => write!(f, "node@{}", self.id.0),
        }
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = DomSelectors;

    fn opaque(&self) -> OpaqueElement {
        // One identity per arena slot, shared by every copy of this ref.
        match self.dom.get(self.id) {
            Some(node) => OpaqueElement::new(node),
            None => OpaqueElement::new(self.dom),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.dom.parent(self.id)?;
        self.dom.is_element(parent).then(|| self.at(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.dom.prev_element_sibling(self.id).map(|id| self.at(id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.dom.next_element_sibling(self.id).map(|id| self.at(id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom.element_children(self.id).next().map(|id| self.at(id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        self.dom
            .element_namespace(self.id)
            .is_some_and(|ns| *ns == html5ever::ns!(html))
    }

    fn has_local_name(&self, name: &Css<LocalName>) -> bool {
        self.dom
            .element_name(self.id)
            .is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &Css<Namespace>) -> bool {
        self.dom
            .element_namespace(self.id)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.element_name(self.id) == other.dom.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&Css<Namespace>>,
        local_name: &Css<LocalName>,
        operation: &AttrSelectorOperation<&Css<String>>,
    ) -> bool {
        self.dom.attrs(self.id).iter().any(|attr| {
            let ns_match = match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            };
            ns_match && attr.name.local == local_name.0 && operation.eval_str(&attr.value)
        })
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &StatePseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            StatePseudoClass::Link | StatePseudoClass::AnyLink => self.is_link(),
            StatePseudoClass::Checked => {
                (self.is_one_of(&["input"]) && self.has_attr("checked"))
                    || (self.is_one_of(&["option"]) && self.has_attr("selected"))
            }
            StatePseudoClass::Disabled => self.is_form_control() && self.has_attr("disabled"),
            StatePseudoClass::Enabled => self.is_form_control() && !self.has_attr("disabled"),
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &NoPseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        self.is_one_of(&["a", "area", "link"]) && self.has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &Css<LocalName>, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_id(self.id)
            .is_some_and(|elem_id| case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &Css<LocalName>, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &Css<LocalName>) -> Option<Css<LocalName>> {
        None
    }

    fn is_part(&self, _name: &Css<LocalName>) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.dom.children(self.id).all(|child| {
            match self.dom.get(child).map(|n| &n.data) {
                Some(ArenaNodeData::Element { .. }) => false,
                Some(ArenaNodeData::Text(t)) => t.is_empty(),
                _ => true,
            }
        })
    }

    fn is_root(&self) -> bool {
        self.dom
            .parent(self.id)
            .is_some_and(|parent| self.dom.is_document(parent))
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &Css<LocalName>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use selectors::context::SelectorCaches;

    use super::*;
    use crate::dom::{parse_body_fragment, parse_document};

    fn parse_selector(
        s: &str,
    ) -> Result<
        selectors::parser::Selector<DomSelectors>,
        cssparser::ParseError<'_, SelectorParseErrorKind<'_>>,
    > {
        let mut parser_input = cssparser::ParserInput::new(s);
        let mut parser = cssparser::Parser::new(&mut parser_input);
        selectors::parser::Selector::parse(&DomSelectors, &mut parser)
    }

    fn matches_selector(
        elem: ElementRef<'_>,
        selector: &selectors::parser::Selector<DomSelectors>,
    ) -> bool {
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
    }

    #[test]
    fn test_tag_selector() {
        let dom = parse_document("<div><p>Hello</p></div>");
        let elem = ElementRef::new(&dom, dom.find_by_tag("p").unwrap());

        assert!(matches_selector(elem, &parse_selector("p").unwrap()));
        assert!(!matches_selector(elem, &parse_selector("div").unwrap()));
    }

    #[test]
    fn test_class_and_id_selectors() {
        let dom = parse_document(r#"<p id="main" class="intro highlight">Hello</p>"#);
        let elem = ElementRef::new(&dom, dom.find_by_tag("p").unwrap());

        assert!(matches_selector(elem, &parse_selector(".intro").unwrap()));
        assert!(matches_selector(elem, &parse_selector("p.highlight").unwrap()));
        assert!(matches_selector(elem, &parse_selector("#main").unwrap()));
        assert!(!matches_selector(elem, &parse_selector(".missing").unwrap()));
        assert!(!matches_selector(elem, &parse_selector("#other").unwrap()));
    }

    #[test]
    fn test_combinators() {
        let dom = parse_document("<div><span><p>Nested</p></span></div>");
        let elem = ElementRef::new(&dom, dom.find_by_tag("p").unwrap());

        assert!(matches_selector(elem, &parse_selector("div p").unwrap()));
        assert!(matches_selector(elem, &parse_selector("span > p").unwrap()));
        assert!(!matches_selector(elem, &parse_selector("div > p").unwrap()));
    }

    #[test]
    fn test_attribute_selectors() {
        let dom = parse_body_fragment(r#"<a href="https://example.com/x" data-k="v">l</a>"#);
        let elem = ElementRef::new(&dom, dom.find_by_tag("a").unwrap());

        assert!(matches_selector(elem, &parse_selector("[data-k]").unwrap()));
        assert!(matches_selector(elem, &parse_selector("[data-k=v]").unwrap()));
        assert!(matches_selector(elem, &parse_selector("a[href^=https]").unwrap()));
        assert!(!matches_selector(elem, &parse_selector("[data-k=w]").unwrap()));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let dom = parse_body_fragment("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let items: Vec<_> = dom.element_children(dom.find_by_tag("ul").unwrap()).collect();
        let second = ElementRef::new(&dom, items[1]);

        assert!(matches_selector(second, &parse_selector("li:nth-child(2)").unwrap()));
        assert!(!matches_selector(second, &parse_selector("li:first-child").unwrap()));
        assert!(matches_selector(
            ElementRef::new(&dom, items[2]),
            &parse_selector("li:last-child").unwrap()
        ));
    }

    #[test]
    fn test_state_pseudo_classes() {
        let dom = parse_body_fragment(
            r#"<input type="checkbox" checked><button disabled>x</button><a href="/">l</a>"#,
        );
        let input = ElementRef::new(&dom, dom.find_by_tag("input").unwrap());
        let button = ElementRef::new(&dom, dom.find_by_tag("button").unwrap());
        let link = ElementRef::new(&dom, dom.find_by_tag("a").unwrap());

        assert!(matches_selector(input, &parse_selector(":checked").unwrap()));
        assert!(matches_selector(input, &parse_selector(":enabled").unwrap()));
        assert!(matches_selector(button, &parse_selector(":disabled").unwrap()));
        assert!(matches_selector(link, &parse_selector("a:link").unwrap()));
    }

    #[test]
    fn test_unknown_pseudo_class_is_error() {
        assert!(parse_selector("p:hover-ish").is_err());
    }

    #[test]
    fn test_foreign_names_match_case_sensitively() {
        let dom = parse_body_fragment("<svg><foreignObject></foreignObject></svg>");
        let el = ElementRef::new(&dom, dom.find_by_tag("foreignObject").unwrap());

        assert!(matches_selector(el, &parse_selector("foreignObject").unwrap()));
        assert!(!matches_selector(el, &parse_selector("foreignobject").unwrap()));
        assert!(matches_selector(el, &parse_selector("svg > *").unwrap()));
    }

    #[test]
    fn test_root() {
        let dom = parse_document("<p>x</p>");
        let html = ElementRef::new(&dom, dom.find_by_tag("html").unwrap());
        let p = ElementRef::new(&dom, dom.find_by_tag("p").unwrap());
        assert!(matches_selector(html, &parse_selector(":root").unwrap()));
        assert!(!matches_selector(p, &parse_selector(":root").unwrap()));
    }
}
