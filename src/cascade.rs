//! Ordered selector generations and the single algorithm that picks one.
//!
//! Each feature of a results page has been served under several markup
//! generations. A feature lists them newest first; the resolver commits to
//! the first generation with any match and never mixes generations.

use scraper::{ElementRef, Html, Selector};

use crate::document::{compile, parent_element};

/// Where a cascade is evaluated: the whole document or one node's subtree.
pub trait Scope<'a> {
    fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'a>>;
}

impl<'a> Scope<'a> for &'a Html {
    fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

impl<'a> Scope<'a> for ElementRef<'a> {
    fn select_all(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        self.select(selector).collect()
    }
}

/// How a matched node maps to the actual result container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Itself,
    /// The selector hits an inner wrapper; the container is one level up.
    Parent,
}

/// One dated selector strategy. `kind` tells the assembler which field
/// logic belongs to this generation.
pub struct Generation<K> {
    pub era: &'static str,
    pub kind: K,
    selector: Selector,
    require: Option<Selector>,
    adjust: Adjust,
}

impl<K: Copy> Generation<K> {
    pub fn new(era: &'static str, kind: K, css: &str) -> Self {
        Self {
            era,
            kind,
            selector: compile(css),
            require: None,
            adjust: Adjust::Itself,
        }
    }

    pub fn parent(mut self) -> Self {
        self.adjust = Adjust::Parent;
        self
    }

    /// Keep only containers with a descendant matching `css`.
    pub fn requiring(mut self, css: &str) -> Self {
        self.require = Some(compile(css));
        self
    }

    /// Containers this generation yields in `scope`, in document order.
    pub fn containers<'a>(&self, scope: &impl Scope<'a>) -> Vec<ElementRef<'a>> {
        scope
            .select_all(&self.selector)
            .into_iter()
            .filter_map(|el| match self.adjust {
                Adjust::Itself => Some(el),
                Adjust::Parent => parent_element(el),
            })
            .filter(|el| {
                self.require
                    .as_ref()
                    .map_or(true, |req| el.select(req).next().is_some())
            })
            .collect()
    }

    fn resolved<'a>(&self, nodes: Vec<ElementRef<'a>>) -> Resolved<'a, K> {
        Resolved {
            era: self.era,
            kind: self.kind,
            nodes,
        }
    }
}

/// The generation a cascade committed to and its containers.
#[derive(Debug)]
pub struct Resolved<'a, K> {
    pub era: &'static str,
    pub kind: K,
    pub nodes: Vec<ElementRef<'a>>,
}

/// First generation with a non-empty match set, in list order.
pub fn resolve<'a, K: Copy>(
    scope: &impl Scope<'a>,
    generations: &[Generation<K>],
) -> Option<Resolved<'a, K>> {
    generations.iter().find_map(|generation| {
        let nodes = generation.containers(scope);
        if nodes.is_empty() {
            return None;
        }
        tracing::trace!(era = generation.era, count = nodes.len(), "cascade generation matched");
        Some(generation.resolved(nodes))
    })
}

/// Whichever of two generations yields more containers; `current` on ties.
///
/// Only paid results use this. Everywhere else order decides.
pub fn resolve_larger<'a, K: Copy>(
    scope: &impl Scope<'a>,
    current: &Generation<K>,
    legacy: &Generation<K>,
) -> Option<Resolved<'a, K>> {
    let current_nodes = current.containers(scope);
    let legacy_nodes = legacy.containers(scope);

    let (generation, nodes) = if current_nodes.len() >= legacy_nodes.len() {
        (current, current_nodes)
    } else {
        (legacy, legacy_nodes)
    };

    if nodes.is_empty() {
        return None;
    }
    tracing::trace!(era = generation.era, count = nodes.len(), "larger generation chosen");
    Some(generation.resolved(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Era {
        New,
        Old,
    }

    fn ids(resolved: &Resolved<'_, Era>) -> Vec<String> {
        resolved
            .nodes
            .iter()
            .map(|el| el.value().attr("id").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn first_non_empty_generation_wins_even_if_smaller() {
        let doc = Html::parse_document(
            r#"<div class="new" id="n1"></div><div class="old" id="o1"></div><div class="old" id="o2"></div>"#,
        );
        let generations = [
            Generation::new("new", Era::New, ".new"),
            Generation::new("old", Era::Old, ".old"),
        ];

        let resolved = resolve(&&doc, &generations).unwrap();
        assert_eq!(resolved.kind, Era::New);
        assert_eq!(ids(&resolved), vec!["n1"]);
    }

    #[test]
    fn falls_through_empty_generations() {
        let doc = Html::parse_document(r#"<div class="old" id="o1"></div>"#);
        let generations = [
            Generation::new("new", Era::New, ".new"),
            Generation::new("old", Era::Old, ".old"),
        ];

        let resolved = resolve(&&doc, &generations).unwrap();
        assert_eq!(resolved.era, "old");
    }

    #[test]
    fn nothing_matches_yields_none() {
        let doc = Html::parse_document("<p>nothing</p>");
        let generations = [Generation::new("new", Era::New, ".new")];

        assert!(resolve(&&doc, &generations).is_none());
    }

    #[test]
    fn parent_adjustment_lifts_to_container() {
        let doc = Html::parse_document(
            r#"<div id="c1"><div class="inner"></div></div><div id="c2"><div class="inner"></div></div>"#,
        );
        let generations = [Generation::new("inner", Era::New, ".inner").parent()];

        let resolved = resolve(&&doc, &generations).unwrap();
        assert_eq!(ids(&resolved), vec!["c1", "c2"]);
    }

    #[test]
    fn requirement_filters_containers() {
        let doc = Html::parse_document(
            r#"<div class="r" id="a"><a href="/url?q=x">x</a></div><div class="r" id="b"><a href="/other">y</a></div>"#,
        );
        let generations = [Generation::new("r", Era::New, ".r").requiring(r#"a[href^="/url"]"#)];

        let resolved = resolve(&&doc, &generations).unwrap();
        assert_eq!(ids(&resolved), vec!["a"]);
    }

    #[test]
    fn larger_set_wins_and_ties_go_to_current() {
        let doc = Html::parse_document(
            r#"<div class="cur" id="c1"></div><div class="leg" id="l1"></div><div class="leg" id="l2"></div>"#,
        );
        let current = Generation::new("current", Era::New, ".cur");
        let legacy = Generation::new("legacy", Era::Old, ".leg");
        assert_eq!(resolve_larger(&&doc, &current, &legacy).unwrap().kind, Era::Old);

        let tied = Html::parse_document(r#"<div class="cur" id="c1"></div><div class="leg" id="l1"></div>"#);
        assert_eq!(resolve_larger(&&tied, &current, &legacy).unwrap().kind, Era::New);
    }

    #[test]
    fn element_scope_only_sees_its_subtree() {
        let doc = Html::parse_document(
            r#"<div id="box"><p class="new" id="inside"></p></div><p class="new" id="outside"></p>"#,
        );
        let scope = doc.select(&compile("#box")).next().unwrap();
        let generations = [Generation::new("new", Era::New, ".new")];

        let resolved = resolve(&scope, &generations).unwrap();
        assert_eq!(ids(&resolved), vec!["inside"]);
    }
}
