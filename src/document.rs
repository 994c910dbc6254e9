//! Read-only helpers over the parsed document tree.
//!
//! Result markup is addressed with a mix of CSS selectors and positional
//! child paths (`> div > span`); the latter are walked by hand because they
//! are relative to a container node rather than to the document.

use std::collections::HashSet;

use scraper::{ElementRef, Selector};

/// Expands to a `&'static Selector` compiled once on first use.
macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: ::once_cell::sync::Lazy<::scraper::Selector> =
            ::once_cell::sync::Lazy::new(|| $crate::document::compile($css));
        &*SELECTOR
    }};
}

pub(crate) use selector;

/// Compiles a selector literal. Only called for program constants.
pub fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid static selector {css:?}: {err:?}"))
}

/// A single result node plus an optional subtree that must be treated as absent.
///
/// Some layouts inject widgets (action menus, seller ratings) inside a result
/// whose anchors and text would otherwise leak into the record. The tree is
/// immutable, so instead of removing them every query skips them.
#[derive(Clone, Copy)]
pub struct Container<'a> {
    root: ElementRef<'a>,
    prune: Option<&'static Selector>,
}

impl<'a> Container<'a> {
    pub fn new(root: ElementRef<'a>) -> Self {
        Self { root, prune: None }
    }

    pub fn pruned(root: ElementRef<'a>, prune: &'static Selector) -> Self {
        Self {
            root,
            prune: Some(prune),
        }
    }

    pub fn root(&self) -> ElementRef<'a> {
        self.root
    }

    /// All visible descendants matching `selector`, in document order.
    pub fn all(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.root
            .select(selector)
            .filter(|el| self.is_visible(*el))
            .collect()
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.root.select(selector).find(|el| self.is_visible(*el))
    }

    /// Text of `el` with pruned subtrees left out.
    pub fn text(&self, el: ElementRef<'a>) -> String {
        let mut out = String::new();
        collect_text(el, self.prune, &mut out);
        out
    }

    /// Text of every outermost match of `selector`, space separated so
    /// numbers in adjacent nodes stay apart.
    pub fn text_of(&self, selector: &Selector) -> String {
        outermost(self.all(selector))
            .into_iter()
            .map(|el| self.text(el))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn attr_of(&self, selector: &Selector, name: &str) -> Option<&'a str> {
        self.first(selector).and_then(|el| el.value().attr(name))
    }

    fn is_visible(&self, el: ElementRef<'a>) -> bool {
        let Some(prune) = self.prune else {
            return true;
        };
        let root_id = self.root.id();
        std::iter::once(el)
            .chain(
                el.ancestors()
                    .take_while(|node| node.id() != root_id)
                    .filter_map(ElementRef::wrap),
            )
            .all(|node| !prune.matches(&node))
    }
}

fn collect_text(el: ElementRef<'_>, prune: Option<&Selector>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if prune.is_some_and(|p| p.matches(&child_el)) {
                continue;
            }
            collect_text(child_el, prune, out);
        }
    }
}

/// Drops matches nested inside another match so joined text is not doubled.
pub fn outermost(matches: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();
    matches
        .into_iter()
        .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text nodes directly under `el`, skipping all child elements.
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect()
}

/// Trimmed text, or `None` when nothing but whitespace is left.
pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn is_named(el: ElementRef<'_>, name: &str) -> bool {
    name == "*" || el.value().name().eq_ignore_ascii_case(name)
}

pub fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Elements reached by a positional child path, e.g. `["div", "span"]` for
/// `> div > span`. Order follows the document.
pub fn child_path<'a>(el: ElementRef<'a>, steps: &[&str]) -> Vec<ElementRef<'a>> {
    let mut frontier = vec![el];
    for step in steps {
        frontier = frontier
            .into_iter()
            .flat_map(child_elements)
            .filter(|child| is_named(*child, step))
            .collect();
    }
    frontier
}

/// Text of the `index`-th child node of `el`, counting text nodes.
pub fn child_node_text(el: ElementRef<'_>, index: usize) -> Option<String> {
    let node = el.children().nth(index)?;
    match node.value().as_text() {
        Some(t) => Some(t.to_string()),
        None => ElementRef::wrap(node).map(text),
    }
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub fn following_elements(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.next_siblings().filter_map(ElementRef::wrap).collect()
}

/// `el` itself or its nearest ancestor matching `selector`.
pub fn closest<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|node| selector.matches(node))
}

/// Nearest strict ancestor matching `selector`.
pub fn nearest_ancestor<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|node| selector.matches(node))
}
