//! Structured data from search engine results pages.
//!
//! [`extract_page`] turns one results page (desktop or one of three mobile
//! layouts) into a [`SerpPage`] of organic results, ads, shopping units,
//! related queries and "people also ask" boxes. Extraction is best-effort:
//! missing markup yields empty fields, never an error.

pub mod api;
pub mod cascade;
pub mod challenge;
pub mod config;
pub mod desktop;
pub mod document;
pub mod error;
pub mod fields;
pub mod layout;
pub mod mobile;
pub mod model;
pub mod normalize;
pub mod people_also_ask;
pub mod query;

use scraper::Html;
use tracing::debug;

pub use challenge::is_challenge_page;
pub use error::ExtractError;
pub use layout::LayoutTag;
pub use model::{Device, SerpPage};
pub use query::{has_next_page, SearchQuery};

use crate::document::selector;
use crate::normalize::base_url;

/// Parses `html` and extracts every feature.
///
/// `host` is the search host the page came from (`www.google.com`); relative
/// links are resolved against it.
pub fn extract_page(html: &str, host: &str, device: Device) -> Result<SerpPage, ExtractError> {
    let document = parse_document(html, host)?;
    Ok(extract_document(&document, host, device))
}

/// Parses `html` after rejecting input no page can come from: blank markup,
/// a document without body content, or a host that cannot anchor links.
pub fn parse_document(html: &str, host: &str) -> Result<Html, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    base_url(host)?;

    let document = Html::parse_document(html);
    // The parser always synthesizes a body; an empty one means no page.
    let has_content = document.select(selector!("body")).next().is_some_and(|body| {
        body.children().any(|child| {
            child.value().is_element() || child.value().as_text().is_some_and(|t| !t.trim().is_empty())
        })
    });
    if !has_content {
        return Err(ExtractError::MissingRoot);
    }

    Ok(document)
}

/// Runs the assembler set for `device` over an already parsed document.
pub fn extract_document(document: &Html, host: &str, device: Device) -> SerpPage {
    let page = match device {
        Device::Desktop => SerpPage {
            layout: None,
            results_total: desktop::total_results(document),
            related_queries: desktop::related_queries(document, host),
            paid_results: desktop::paid_results(document),
            paid_products: desktop::paid_products(document),
            organic_results: desktop::organic_results(document),
            people_also_ask: people_also_ask::people_also_ask(document),
        },
        Device::Mobile => {
            let layout = layout::detect(document);
            debug!(layout = layout.as_str(), "mobile layout detected");
            SerpPage {
                layout: Some(layout),
                results_total: mobile::total_results(document),
                related_queries: mobile::related_queries(document, layout, host),
                paid_results: mobile::paid_results(document, layout),
                paid_products: mobile::paid_products(document),
                organic_results: mobile::organic_results(document, layout, host),
                people_also_ask: people_also_ask::people_also_ask(document),
            }
        }
    };

    debug!(counts = %page.counts(), "page extracted");
    page
}
