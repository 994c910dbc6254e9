//! Assemblers for mobile result pages.
//!
//! Mobile pages come in three unrelated layout families. The caller detects
//! the family once and passes the tag to every function here.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html};

use crate::cascade::{resolve, Generation};
use crate::document::{
    child_node_text, child_path, is_named, next_element, own_text, parent_element, selector, text,
    Container,
};
use crate::fields::{
    describe, describe_matches, first_href, first_text, href, nth_text, product_unit,
    ranking_meta, related_queries as anchor_list, site_links, PingSource, SiteLinkStrategy,
};
use crate::layout::LayoutTag;
use crate::model::{
    OrganicResult, PaidProduct, PaidResult, ProductInfo, RelatedQuery, ResultsTotal,
};
use crate::normalize::{parse_loose_price, parse_product_info, unwrap_redirect};

fn containers<'a, K: Copy>(document: &'a Html, generations: &[Generation<K>]) -> Vec<ElementRef<'a>> {
    resolve(&document, generations)
        .map(|resolved| resolved.nodes)
        .unwrap_or_default()
}

fn keep_href(href: &str) -> String {
    href.to_string()
}

// ============================================================================
// Organic results
// ============================================================================

static DESKTOP_LIKE_ORGANIC: Lazy<Vec<Generation<()>>> = Lazy::new(|| {
    vec![
        Generation::new("2022", (), ".Ww4FFb.n3YsHb.xpd.EtOod.pkphOe"),
        Generation::new("legacy", (), "#ires, .srg > div"),
    ]
});

static MOBILE_ORGANIC: Lazy<Vec<Generation<()>>> = Lazy::new(|| {
    vec![Generation::new("mobile", (), "#main > div:not([class])").requiring(r#"a[href^="/url"]"#)]
});

static WEBLIGHT_ORGANIC: Lazy<Vec<Generation<()>>> = Lazy::new(|| {
    vec![Generation::new("weblight", (), "body > div > div > div")
        .requiring(r#"a[href*="googleweblight"], a[href^="/url"]"#)]
});

pub fn organic_results(document: &Html, layout: LayoutTag, host: &str) -> Vec<OrganicResult> {
    match layout {
        LayoutTag::DesktopLike => containers(document, &DESKTOP_LIKE_ORGANIC)
            .into_iter()
            .map(parse_desktop_like_organic)
            .collect(),
        LayoutTag::Mobile => containers(document, &MOBILE_ORGANIC)
            .into_iter()
            .map(|el| parse_mobile_organic(el, host))
            .collect(),
        LayoutTag::Weblight => containers(document, &WEBLIGHT_ORGANIC)
            .into_iter()
            .map(|el| parse_weblight_organic(el, host))
            .collect(),
    }
}

fn parse_desktop_like_organic(el: ElementRef<'_>) -> OrganicResult {
    let c = Container::new(el);
    let described = describe_matches(&c, selector!("div.yDYNvb"));

    OrganicResult {
        title: first_text(&c, selector!(r#"a div[role="heading"]"#)),
        url: first_href(&c, selector!("a")),
        displayed_url: first_text(&c, selector!("span.qzEoUe")),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Flat {
                anchors: selector!("[jsname].dJMePd a"),
                heading_block: false,
            }],
            &keep_href,
        ),
        product_info: commerce_info(&c),
        personal_info: None,
        ranking: ranking_meta(&c, PingSource::PingParam),
    }
}

/// Rating line `"4.5 (1,234)"` plus the price sitting in the third child
/// node of the offer row.
fn commerce_info(c: &Container<'_>) -> Option<ProductInfo> {
    let mut info = parse_product_info(c.text_of(selector!(".MvDXgc")).trim()).unwrap_or_default();

    let price = c
        .first(selector!(".jC6vSe"))
        .and_then(|row| child_node_text(row, 2))
        .and_then(|raw| parse_loose_price(raw.trim()));
    if price.is_some() {
        info.price = price;
    }

    (!info.is_empty()).then_some(info)
}

fn parse_mobile_organic(el: ElementRef<'_>, host: &str) -> OrganicResult {
    let c = Container::new(el);
    let resolve_link = |href: &str| unwrap_redirect(href, host);

    // The snippet's own text nodes; dates and bullets live in child spans.
    let snippet: Vec<_> = c
        .first(selector!(".s3v9rd"))
        .map(|block| child_path(block, &["div", "div", "div"]))
        .unwrap_or_default();
    let raw = snippet
        .iter()
        .map(|node| own_text(*node))
        .collect::<String>()
        .replace(" · ", "");
    let described = describe(&raw, &snippet);

    OrganicResult {
        title: first_text(&c, selector!("a > h3")),
        url: first_href(&c, selector!("a")).map(|h| resolve_link(&h)),
        displayed_url: first_text(&c, selector!("a > div")),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Flat {
                anchors: selector!(".s3v9rd a"),
                heading_block: false,
            }],
            &resolve_link,
        ),
        product_info: None,
        personal_info: None,
        ranking: ranking_meta(&c, PingSource::PingParam),
    }
}

fn parse_weblight_organic(el: ElementRef<'_>, host: &str) -> OrganicResult {
    let c = Container::new(el);
    let resolve_link = |href: &str| unwrap_redirect(href, host);

    let spans = c.all(selector!("a > span"));
    let snippet: Vec<_> = c.first(selector!("table span")).into_iter().collect();
    let raw: String = snippet.iter().map(|node| c.text(*node)).collect();
    let described = describe(&raw, &snippet);

    OrganicResult {
        title: nth_text(&c, &spans, 0),
        url: first_href(&c, selector!("a")).map(|h| resolve_link(&h)),
        displayed_url: nth_text(&c, &spans, 1),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Flat {
                anchors: selector!("a.M3vVJe"),
                heading_block: false,
            }],
            &resolve_link,
        ),
        product_info: None,
        personal_info: None,
        ranking: ranking_meta(&c, PingSource::PingParam),
    }
}

// ============================================================================
// Paid results
// ============================================================================

/// Ad markup families seen on the desktop-like layout. Each has its own
/// field logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdMarkup {
    SideFrame,
    TopAds,
}

static DESKTOP_LIKE_PAID: Lazy<Vec<Generation<AdMarkup>>> = Lazy::new(|| {
    vec![
        Generation::new("side frame", AdMarkup::SideFrame, ".ads-fr"),
        Generation::new("top ads", AdMarkup::TopAds, "div[id^=tads] div.uEierd"),
    ]
});

static MOBILE_PAID: Lazy<Vec<Generation<()>>> = Lazy::new(|| {
    vec![Generation::new("mobile", (), "#main > div").requiring("div[role=heading]")]
});

pub fn paid_results(document: &Html, layout: LayoutTag) -> Vec<PaidResult> {
    match layout {
        LayoutTag::DesktopLike => resolve(&document, &DESKTOP_LIKE_PAID)
            .map(|resolved| {
                let parse = match resolved.kind {
                    AdMarkup::SideFrame => parse_side_frame_ad,
                    AdMarkup::TopAds => parse_top_ad,
                };
                resolved.nodes.into_iter().map(parse).collect()
            })
            .unwrap_or_default(),
        LayoutTag::Mobile => containers(document, &MOBILE_PAID)
            .into_iter()
            .map(parse_mobile_ad)
            .collect(),
        LayoutTag::Weblight => Vec::new(),
    }
}

fn parse_side_frame_ad(el: ElementRef<'_>) -> PaidResult {
    let c = Container::new(el);

    let heading = c.first(selector!("div[role=heading]"));
    let link = heading
        .and_then(parent_element)
        .filter(|parent| is_named(*parent, "a"));

    let title = heading
        .map(|h| {
            let spans: Vec<_> = h.select(selector!("span")).map(text).collect();
            if spans.is_empty() {
                text(h)
            } else {
                spans.join(" ")
            }
        })
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let displayed_url = link
        .map(|a| {
            let beside = next_element(a)
                .filter(|el| is_named(*el, "div"))
                .map(|div| nth_text(&c, &child_path(div, &["span"]), 1))
                .unwrap_or_default();
            if !beside.is_empty() {
                return beside;
            }
            child_path(a, &["div"])
                .first()
                .map(|div| nth_text(&c, &child_path(*div, &["div", "span"]), 1))
                .unwrap_or_default()
        })
        .unwrap_or_default();

    let snippet: Vec<_> = link
        .and_then(parent_element)
        .and_then(next_element)
        .filter(|el| is_named(*el, "div"))
        .and_then(|div| div.select(selector!("span")).next())
        .into_iter()
        .collect();
    let raw: String = snippet.iter().map(|node| c.text(*node)).collect();
    let described = describe(&raw, &snippet);

    PaidResult {
        title,
        url: link.and_then(href),
        displayed_url,
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Flat {
                anchors: selector!("a:not([data-rw]):not([ping]):not([data-is-ad]):not(.aob-link)"),
                heading_block: false,
            }],
            &keep_href,
        ),
    }
}

fn parse_top_ad(el: ElementRef<'_>) -> PaidResult {
    let c = Container::new(el);
    let described = describe_matches(&c, selector!("div.w1C3Le div.MUxGbd.yDYNvb.lEBKkf"));

    PaidResult {
        title: first_text(&c, selector!(r#"div[role="heading"]"#)),
        url: first_href(&c, selector!("a")),
        displayed_url: first_text(&c, selector!("a span.Zu0yb.UGIkD.qzEoUe")),
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Flat {
                anchors: selector!(".BmP5tf .MUxGbd a[data-hveid], g-scrolling-carousel a"),
                heading_block: false,
            }],
            &keep_href,
        ),
    }
}

fn parse_mobile_ad(el: ElementRef<'_>) -> PaidResult {
    let c = Container::new(el);
    let heading = c.first(selector!(r#"[role="heading"]"#));

    let displayed_url = heading
        .and_then(next_element)
        .filter(|el| is_named(*el, "div"))
        .map(|div| {
            child_path(div, &["span", "span"])
                .into_iter()
                .map(|span| c.text(span))
                .collect::<String>()
        })
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let snippet = child_path(el, &["div", "div", "div", "span"]);
    let raw: String = snippet.iter().map(|node| c.text(*node)).collect();
    let described = describe(&raw, &snippet);

    PaidResult {
        title: heading
            .map(|h| c.text(h).trim().to_string())
            .unwrap_or_default(),
        url: first_href(&c, selector!(r#"a[href*="aclk"]"#)),
        displayed_url,
        description: described.description,
        date: described.date,
        emphasized_keywords: described.emphasized_keywords,
        site_links: site_links(
            &c,
            &[SiteLinkStrategy::Path {
                steps: &["div", "div", "div", "a"],
            }],
            &keep_href,
        ),
    }
}

// ============================================================================
// Paid products
// ============================================================================

pub fn paid_products(document: &Html) -> Vec<PaidProduct> {
    document
        .select(selector!(".itG22d .pla-unit-container"))
        .map(|el| {
            let c = Container::new(el);
            let unit = product_unit(&c);
            PaidProduct {
                title: unit
                    .heading
                    .map(|h| c.text(h).trim().to_string())
                    .unwrap_or_default(),
                url: first_href(&c, selector!("a")),
                displayed_url: first_text(&c, selector!(".a")),
                prices: unit.prices,
            }
        })
        .collect()
}

// ============================================================================
// Page-level fields
// ============================================================================

/// Mobile layouts never show a result count.
pub fn total_results(_document: &Html) -> ResultsTotal {
    ResultsTotal::Unknown
}

pub fn related_queries(document: &Html, layout: LayoutTag, host: &str) -> Vec<RelatedQuery> {
    match layout {
        LayoutTag::DesktopLike => [
            selector!("#extrares h2 ~ a"),
            selector!("#bres span a"),
            selector!("#brs p a"),
            selector!(".mR2gOd.Y3nRse .luHZgb .nZWEZc a"),
            selector!("a.iOJVmb"),
        ]
        .into_iter()
        .flat_map(|sel| anchor_list(document, sel, host))
        .collect(),
        LayoutTag::Mobile => anchor_list(document, selector!(r#"a[href^="/search"].tHmfQe"#), host),
        LayoutTag::Weblight => anchor_list(document, selector!(r#"a[href^="/search"].ZWRArf"#), host),
    }
}
