//! Bot-check interstitials served in place of a results page.
//!
//! Extraction on such a page returns empty lists that look like a real
//! "no results" page, so callers check first and retry elsewhere.

use scraper::Html;

use crate::document::selector;

pub fn is_challenge_page(document: &Html) -> bool {
    let markers = [
        selector!("#recaptcha"),
        selector!("#captcha-form"),
        selector!(r#"form[action*="sorry"]"#),
    ];
    let found = markers
        .into_iter()
        .any(|marker| document.select(marker).next().is_some());

    if found {
        tracing::debug!("challenge markup present");
    }
    found
}
