//! Per-container field extractors. Each one returns a best-effort value and
//! never fails the record: missing markup gives `None` or an empty list.

use scraper::{ElementRef, Html, Selector};

use crate::document::{
    child_elements, child_path, closest, following_elements, is_named, nearest_ancestor, non_empty, outermost,
    parent_element, selector, text, Container,
};
use crate::model::{PersonalInfo, ProductInfo, RankingMeta, RelatedQuery, SiteLink};
use crate::normalize::{absolutize, parse_product_info, query_param, split_description_and_date};

// ============================================================================
// Heading / URL
// ============================================================================

/// Trimmed text of the first visible match, empty when absent.
pub fn first_text(container: &Container<'_>, selector: &Selector) -> String {
    container
        .first(selector)
        .map(|el| container.text(el).trim().to_string())
        .unwrap_or_default()
}

/// Trimmed text of the `index`-th element, empty when there are fewer.
pub fn nth_text(container: &Container<'_>, elements: &[ElementRef<'_>], index: usize) -> String {
    elements
        .get(index)
        .map(|el| container.text(*el).trim().to_string())
        .unwrap_or_default()
}

pub fn href(el: ElementRef<'_>) -> Option<String> {
    el.value().attr("href").map(str::to_string)
}

/// `href` of the first visible match.
pub fn first_href(container: &Container<'_>, selector: &Selector) -> Option<String> {
    container.first(selector).and_then(href)
}

// ============================================================================
// Description + keywords
// ============================================================================

/// Description, leading date and emphasized keywords of one result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Described {
    pub description: Option<String>,
    pub date: Option<String>,
    pub emphasized_keywords: Vec<String>,
}

/// Splits `raw` into date and description and collects every bold or
/// italic segment under `nodes` as a keyword.
pub fn describe(raw: &str, nodes: &[ElementRef<'_>]) -> Described {
    let split = split_description_and_date(raw);
    Described {
        description: split.description,
        date: split.date,
        emphasized_keywords: emphasized_keywords(nodes),
    }
}

pub fn emphasized_keywords(nodes: &[ElementRef<'_>]) -> Vec<String> {
    nodes
        .iter()
        .flat_map(|node| node.select(selector!("em, b")))
        .filter_map(|el| non_empty(&text(el)))
        .collect()
}

/// `describe` over the outermost visible matches of `selector`.
pub fn describe_matches(container: &Container<'_>, selector: &Selector) -> Described {
    let nodes = outermost(container.all(selector));
    let raw: String = nodes.iter().map(|el| container.text(*el)).collect();
    describe(&raw, &nodes)
}

// ============================================================================
// Site links
// ============================================================================

/// One way a layout has rendered site links inside a result.
#[derive(Clone, Copy)]
pub enum SiteLinkStrategy {
    /// Table of cells, each with its own anchor and description.
    Grid {
        table: &'static Selector,
        cell: &'static Selector,
        description: &'static Selector,
    },
    /// Plain anchors. With `heading_block` a description is read from the
    /// sibling divs of the heading wrapping the anchor, when there is one.
    Flat {
        anchors: &'static Selector,
        heading_block: bool,
    },
    /// Anchors at a fixed child path below the container, e.g.
    /// `["div", "div", "div", "a"]`.
    Path { steps: &'static [&'static str] },
    /// List items with a nested heading, heading link and description.
    Nested {
        item: &'static Selector,
        heading: &'static Selector,
        anchor: &'static Selector,
        description: &'static Selector,
    },
}

/// Runs `strategies` in order and keeps the first that yields any link.
/// `link_url` maps raw hrefs (absolutizing or redirect unwrapping).
pub fn site_links(
    container: &Container<'_>,
    strategies: &[SiteLinkStrategy],
    link_url: &dyn Fn(&str) -> String,
) -> Vec<SiteLink> {
    strategies
        .iter()
        .map(|strategy| site_links_with(container, *strategy, link_url))
        .find(|links| !links.is_empty())
        .unwrap_or_default()
}

fn site_links_with(
    container: &Container<'_>,
    strategy: SiteLinkStrategy,
    link_url: &dyn Fn(&str) -> String,
) -> Vec<SiteLink> {
    match strategy {
        SiteLinkStrategy::Grid {
            table,
            cell,
            description,
        } => {
            let Some(table) = container.first(table) else {
                return Vec::new();
            };
            table
                .select(cell)
                .filter_map(|cell| {
                    let anchors: Vec<_> = cell.select(selector!("a")).collect();
                    let url = anchors.first().copied().and_then(href)?;
                    let title: String = anchors.iter().map(|a| container.text(*a)).collect();
                    let desc: String = cell.select(description).map(text).collect();
                    Some(site_link(title, link_url(&url), &desc))
                })
                .collect()
        }
        SiteLinkStrategy::Flat {
            anchors,
            heading_block,
        } => container
            .all(anchors)
            .into_iter()
            .filter_map(|anchor| {
                let url = href(anchor)?;
                let desc = if heading_block {
                    heading_block_text(anchor).unwrap_or_default()
                } else {
                    String::new()
                };
                Some(site_link(container.text(anchor), link_url(&url), &desc))
            })
            .collect(),
        SiteLinkStrategy::Path { steps } => child_path(container.root(), steps)
            .into_iter()
            .filter_map(|anchor| {
                let url = href(anchor)?;
                Some(site_link(container.text(anchor), link_url(&url), ""))
            })
            .collect(),
        SiteLinkStrategy::Nested {
            item,
            heading,
            anchor,
            description,
        } => container
            .all(item)
            .into_iter()
            .filter_map(|item| {
                let url = item.select(anchor).next().and_then(href)?;
                let title: String = item.select(heading).map(text).collect();
                let desc: String = item.select(description).map(text).collect();
                Some(site_link(title, link_url(&url), &desc))
            })
            .collect(),
    }
}

fn site_link(title: String, url: String, raw_description: &str) -> SiteLink {
    let split = split_description_and_date(raw_description);
    SiteLink {
        title: title.trim().to_string(),
        url: non_empty(&url),
        description: split.description,
        date: split.date,
    }
}

/// `div > h3 > div > a`: text of the outer div's child divs, joined.
fn heading_block_text(anchor: ElementRef<'_>) -> Option<String> {
    let wrapper = parent_element(anchor).filter(|el| is_named(*el, "div"))?;
    let heading = parent_element(wrapper).filter(|el| is_named(*el, "h3"))?;
    let block = parent_element(heading).filter(|el| is_named(*el, "div"))?;
    let joined = child_elements(block)
        .filter(|el| is_named(*el, "div"))
        .map(text)
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&joined)
}

// ============================================================================
// Product / personal info
// ============================================================================

/// Commerce blob under `selector` run through the rating, review and price
/// rules.
pub fn product_info(container: &Container<'_>, selector: &Selector) -> Option<ProductInfo> {
    let blob = container.text_of(selector);
    if blob.trim().is_empty() {
        return None;
    }
    parse_product_info(&blob)
}

/// Profile fields, present only when the description node has exactly two
/// child elements: a "location · job · company" line and the description.
pub fn personal_info(title: &str, description: Option<ElementRef<'_>>) -> Option<PersonalInfo> {
    let children: Vec<_> = child_elements(description?).collect();
    let [who, what] = children.as_slice() else {
        return None;
    };

    let raw_text = non_empty(&text(*who))?;
    let mut parts = raw_text.split('·').map(non_empty);
    let mut next_part = || parts.next().flatten();
    let (location, job_title, company_name) = (next_part(), next_part(), next_part());

    Some(PersonalInfo {
        name: title.split('-').next().and_then(non_empty),
        location,
        job_title,
        company_name,
        clean_description: non_empty(&text(*what)),
        raw_text,
    })
}

// ============================================================================
// Shopping units / anchor lists
// ============================================================================

/// Parts of a shopping unit: the heading, the price-like strings between it
/// and the last sibling, and that last sibling, which carries the shop.
pub struct ProductUnit<'a> {
    pub heading: Option<ElementRef<'a>>,
    pub prices: Vec<String>,
    pub shop: Option<ElementRef<'a>>,
}

pub fn product_unit<'a>(container: &Container<'a>) -> ProductUnit<'a> {
    let Some(heading) = container.first(selector!(r#"[role="heading"]"#)) else {
        return ProductUnit {
            heading: None,
            prices: Vec::new(),
            shop: None,
        };
    };

    let mut siblings = following_elements(heading);
    let shop = siblings.pop();
    let prices = siblings
        .into_iter()
        .filter_map(|el| non_empty(&container.text(el)))
        .collect();

    ProductUnit {
        heading: Some(heading),
        prices,
        shop,
    }
}

/// Title and absolute URL of every anchor matching `selector`, in order.
pub fn related_queries(document: &Html, selector: &Selector, host: &str) -> Vec<RelatedQuery> {
    document
        .select(selector)
        .map(|el| RelatedQuery {
            title: text(el).trim().to_string(),
            url: href(el).map(|h| absolutize(&h, host)),
        })
        .collect()
}

// ============================================================================
// Ranking metadata
// ============================================================================

/// Where the primary anchor keeps its tracking id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingSource {
    /// `data-ved` attribute.
    DataVed,
    /// `ved` parameter inside the `ping` attribute.
    PingParam,
}

pub fn ranking_meta(container: &Container<'_>, source: PingSource) -> RankingMeta {
    let anchor = container.first(selector!("a"));
    let ping_ved = anchor.and_then(|a| match source {
        PingSource::DataVed => a.value().attr("data-ved").map(str::to_string),
        PingSource::PingParam => a
            .value()
            .attr("ping")
            .and_then(|ping| query_param(ping, "ved")),
    });

    let root = container.root();
    RankingMeta {
        ping_ved,
        item_ved: closest(root, selector!("div[data-ved]"))
            .and_then(|el| el.value().attr("data-ved"))
            .map(str::to_string),
        lang: nearest_ancestor(root, selector!("div[lang]"))
            .and_then(|el| el.value().attr("lang"))
            .map(str::to_string),
    }
}
