//! The search a results page answers, recovered from its URL, and the
//! next-page check.

use scraper::Html;
use serde::Serialize;
use url::Url;
use utoipa::ToSchema;

use crate::document::selector;
use crate::model::Device;

/// Results per page when the URL carries no `num` parameter.
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub term: Option<String>,
    pub device: Device,
    /// 1-based, as shown in the pager.
    pub page: u32,
    /// Search domain without the `www.` prefix, e.g. `google.co.uk`.
    pub domain: Option<String>,
    pub language_code: Option<String>,
    pub location_uule: Option<String>,
    pub results_per_page: u32,
}

impl SearchQuery {
    /// Reads term, paging and locale from a results page URL. `None` when the
    /// URL does not parse.
    pub fn from_url(raw: &str, device: Device) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let results_per_page = param("num")
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_RESULTS_PER_PAGE);
        let offset = param("start")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);

        Some(Self {
            term: param("q"),
            device,
            page: offset / results_per_page + 1,
            domain: url.host_str().map(|host| {
                let host = host.to_ascii_lowercase();
                host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
            }),
            language_code: param("hl"),
            location_uule: param("uule"),
            results_per_page,
        })
    }
}

/// True when the page links to the offset right after `page` (1-based).
pub fn has_next_page(document: &Html, page: u32, results_per_page: u32) -> bool {
    let needle = format!("start={}", page.saturating_mul(results_per_page));
    document
        .select(selector!("a[href]"))
        .filter_map(|a| a.value().attr("href"))
        .any(|href| {
            href.match_indices(&needle).any(|(idx, _)| {
                // `start=10` must not match `start=100`.
                !href[idx + needle.len()..].starts_with(|c: char| c.is_ascii_digit())
            })
        })
}
