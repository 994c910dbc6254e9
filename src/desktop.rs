//! Assemblers for desktop result pages.
//!
//! Desktop pages have no layout detector: every feature walks its full
//! generation list.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html};

use crate::cascade::{resolve, resolve_larger, Generation};
use crate::document::{child_path, is_named, outermost, parent_element, selector, text, Container};
use crate::fields::{
    describe, first_href, first_text, href, nth_text, personal_info, product_info, product_unit,
    ranking_meta, related_queries as anchor_list, site_links, PingSource, SiteLinkStrategy,
};
use crate::model::{OrganicResult, PaidProduct, PaidResult, RelatedQuery, ResultsTotal};
use crate::normalize::parse_total_results;

// ============================================================================
// Organic results
// ============================================================================

/// Top result with inline site links. Fits none of the generations below,
/// so it is collected separately and ahead of them.
static TOP_RESULT: Lazy<Generation<()>> =
    Lazy::new(|| Generation::new("2022-08 top result", (), ".g[data-hveid] .Uo8X3b").parent());

static ORGANIC: Lazy<Vec<Generation<()>>> = Lazy::new(|| {
    vec![
        // The twitter box shares the row container; its cards are not parsed.
        Generation::new("2022-01", (), r#".g [data-header-feature="0"], .g.eejeod"#).parent(),
        Generation::new("2021-01", (), ".g .tF2Cxc>.yuRUbf").parent(),
        Generation::new("legacy", (), ".g .rc"),
    ]
});

fn organic_site_link_strategies() -> [SiteLinkStrategy; 3] {
    [
        SiteLinkStrategy::Grid {
            table: selector!("table"),
            cell: selector!("td"),
            description: selector!(".zz3gNc"),
        },
        SiteLinkStrategy::Flat {
            anchors: selector!(".St3GK a"),
            heading_block: true,
        },
        SiteLinkStrategy::Nested {
            item: selector!("ul li"),
            heading: selector!("h3"),
            anchor: selector!("h3 a"),
            description: selector!("div"),
        },
    ]
}

fn keep_href(href: &str) -> String {
    href.to_string()
}

pub fn organic_results(document: &Html) -> Vec<OrganicResult> {
    let top = TOP_RESULT.containers(&document);
    let rest = resolve(&document, &ORGANIC)
        .map(|resolved| resolved.nodes)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    top.into_iter()
        .chain(rest)
        .filter(|el| seen.insert(el.id()))
        .map(parse_organic)
        .collect()
}

fn parse_organic(el: ElementRef<'_>) -> OrganicResult {
    // An A/B-tested dropdown injects extra anchors into the row.
    let c = Container::pruned(el, selector!("div.action-menu"));

    let title = first_text(&c, selector!("h3"));
    let spans = outermost(c.all(selector!(".VwiC3b span")));
    let raw: String = spans.iter().map(|span| c.text(*span)).collect();
    let described = describe(&raw, &c.all(selector!(".VwiC3b")));
    let personal_info = personal_info(&title, spans.first().copied());

    OrganicResult {
        url: first_href(&c, selector!("a")),
        displayed_url: first_text(&c, selector!("cite")),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(&c, &organic_site_link_strategies(), &keep_href),
        product_info: product_info(&c, selector!(".dhIWPd, .fG8Fp")),
        personal_info,
        ranking: ranking_meta(&c, PingSource::DataVed),
        title,
    }
}

// ============================================================================
// Paid results
// ============================================================================

static PAID_CURRENT: Lazy<Generation<()>> = Lazy::new(|| Generation::new("current", (), "#tads > div"));
static PAID_LEGACY: Lazy<Generation<()>> = Lazy::new(|| Generation::new("legacy", (), ".ads-fr"));

/// Span under the heading link holding the displayed URL. Lower indexes hold
/// the "Ad" label and a separator; this breaks if the label moves.
const DISPLAYED_URL_SPAN_INDEX: usize = 2;

pub fn paid_results(document: &Html) -> Vec<PaidResult> {
    resolve_larger(&document, &PAID_CURRENT, &PAID_LEGACY)
        .map(|resolved| resolved.nodes.into_iter().map(parse_paid).collect())
        .unwrap_or_default()
}

fn parse_paid(el: ElementRef<'_>) -> PaidResult {
    let c = Container::pruned(el, selector!("w-ad-seller-rating"));

    let links = site_links(
        &c,
        &[SiteLinkStrategy::Flat {
            anchors: selector!("a:not([data-pcu]):not([ping])"),
            heading_block: true,
        }],
        &keep_href,
    );

    let heading = c.first(selector!("div[role=heading]"));
    let link = heading
        .and_then(parent_element)
        .filter(|parent| is_named(*parent, "a"));

    let current = c.all(selector!(".MUxGbd.yDYNvb.lyLwlc > span"));
    let description_nodes = if current.is_empty() {
        child_path(el, &["div", "div", "div", "div", "div"])
            .into_iter()
            .nth(1)
            .into_iter()
            .collect()
    } else {
        outermost(current)
    };
    let raw: String = description_nodes.iter().map(|n| c.text(*n)).collect();
    let described = describe(&raw, &description_nodes);

    PaidResult {
        title: heading
            .map(|h| c.text(h).trim().to_string())
            .unwrap_or_default(),
        url: link.and_then(href),
        displayed_url: link
            .map(|a| nth_text(&c, &child_path(a, &["div", "span"]), DISPLAYED_URL_SPAN_INDEX))
            .unwrap_or_default(),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: links,
    }
}

// ============================================================================
// Paid products
// ============================================================================

pub fn paid_products(document: &Html) -> Vec<PaidProduct> {
    document
        .select(selector!(".commercial-unit-desktop-rhs .pla-unit"))
        .map(|el| {
            let c = Container::new(el);
            let unit = product_unit(&c);
            PaidProduct {
                title: unit
                    .heading
                    .map(|h| c.text(h).trim().to_string())
                    .unwrap_or_default(),
                url: unit
                    .heading
                    .and_then(|h| h.select(selector!("a")).next())
                    .and_then(href),
                displayed_url: unit
                    .shop
                    .and_then(|shop| shop.select(selector!("span")).next())
                    .map(|span| c.text(span).trim().to_string())
                    .unwrap_or_default(),
                prices: unit.prices,
            }
        })
        .collect()
}

// ============================================================================
// Page-level fields
// ============================================================================

/// Count from the result-stats line; `0` when the page shows none.
pub fn total_results(document: &Html) -> ResultsTotal {
    let line = [selector!("#resultStats"), selector!("#result-stats")]
        .into_iter()
        .map(|sel| document.select(sel).map(text).collect::<String>())
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    ResultsTotal::Count(parse_total_results(&line).unwrap_or(0))
}

pub fn related_queries(document: &Html, host: &str) -> Vec<RelatedQuery> {
    anchor_list(document, selector!("#brs a, #bres a"), host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn top_result_comes_first_and_is_not_repeated() {
        let doc = Html::parse_document(
            r#"<div class="g" data-hveid="1"><div id="top"><div class="Uo8X3b"></div><a href="https://top.example"><h3>Top</h3></a></div></div>
               <div class="g"><div><div data-header-feature="0"></div><a href="https://second.example"><h3>Second</h3></a></div></div>"#,
        );
        let results = organic_results(&doc);

        assert_eq!(
            results.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            ["Top", "Second"]
        );
    }

    #[test]
    fn newer_generation_shadows_legacy() {
        let doc = Html::parse_document(
            r#"<div class="g"><div class="tF2Cxc"><div class="yuRUbf"><a href="https://new.example"><h3>New</h3></a></div></div></div>
               <div class="g"><div class="rc"><a href="https://old.example"><h3>Old</h3></a></div></div>"#,
        );
        let results = organic_results(&doc);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url.as_deref(), Some("https://new.example"));
    }

    #[test]
    fn action_menu_anchor_is_ignored() {
        let doc = Html::parse_document(
            r#"<div class="g"><div class="rc"><div class="action-menu"><a href="/menu">Cached</a></div>
               <a href="https://real.example"><h3>Real</h3></a></div></div>"#,
        );
        let results = organic_results(&doc);

        assert_eq!(results[0].url.as_deref(), Some("https://real.example"));
        assert!(results[0].site_links.is_empty());
    }

    #[test]
    fn paid_prefers_larger_legacy_set() {
        let doc = Html::parse_document(
            r#"<div id="tads"><div><a href="/aclk?1"><div role="heading">Only current</div></a></div></div>
               <div class="ads-fr"><a href="/aclk?2"><div role="heading">Legacy A</div></a></div>
               <div class="ads-fr"><a href="/aclk?3"><div role="heading">Legacy B</div></a></div>"#,
        );
        let ads = paid_results(&doc);

        assert_eq!(
            ads.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(),
            ["Legacy A", "Legacy B"]
        );
    }

    #[test]
    fn displayed_url_skips_ad_label() {
        let doc = Html::parse_document(
            r#"<div id="tads"><div>
                <a href="https://shop.example/landing" data-pcu="x"><div role="heading">Shop Now</div>
                  <div><span>Ad</span><span>·</span><span>www.shop.example/</span></div></a>
                <div class="MUxGbd yDYNvb lyLwlc"><span>Best <b>shoes</b> in town</span></div>
              </div></div>"#,
        );
        let ad = &paid_results(&doc)[0];

        assert_eq!(ad.displayed_url, "www.shop.example/");
        assert_eq!(ad.url.as_deref(), Some("https://shop.example/landing"));
        assert_eq!(ad.description.as_deref(), Some("Best shoes in town"));
        assert_eq!(ad.emphasized_keywords, ["shoes"]);
    }

    #[test]
    fn missing_stats_counts_zero() {
        let doc = Html::parse_document("<div id='search'></div>");
        assert_eq!(total_results(&doc), ResultsTotal::Count(0));

        let doc = Html::parse_document(
            "<div id='result-stats'>About 2,340,000 results<nobr> (0.41 seconds)&nbsp;</nobr></div>",
        );
        assert_eq!(total_results(&doc), ResultsTotal::Count(2_340_000));
    }
}
