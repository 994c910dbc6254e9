//! Value cleanup shared by every layout: description/date splitting, URL
//! absolutizing and redirect unwrapping, and the numeric extraction rules.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::ExtractError;
use crate::model::ProductInfo;

// ============================================================================
// Description / date
// ============================================================================

/// A description blob split into its leading date and the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionAndDate {
    pub description: Option<String>,
    pub date: Option<String>,
}

static DATE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(?P<date>.{1,40}?)\s+[—–-]\s+(?P<rest>.*)$").expect("static regex"));

static DATE_LIKE: Lazy<Regex> = Lazy::new(|| {
    const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?";
    Regex::new(&format!(
        r"(?ix)^(?:
            \d+\s+(?:second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago
          | {MONTH}\s+\d{{1,2}},?\s+\d{{4}}
          | \d{{1,2}}\s+{MONTH},?\s+\d{{4}}
          | \d{{4}}-\d{{2}}-\d{{2}}
          | \d{{1,2}}[./]\d{{1,2}}[./]\d{{2,4}}
        )$"
    ))
    .expect("static regex")
});

/// Splits `"3 days ago - Great product"` into date and description.
///
/// Without a leading date-like token the whole trimmed text is the
/// description. Blank input yields neither.
pub fn split_description_and_date(raw: &str) -> DescriptionAndDate {
    let text = raw.trim();
    if text.is_empty() {
        return DescriptionAndDate::default();
    }

    if let Some(caps) = DATE_SEPARATOR.captures(text) {
        let date = caps["date"].trim();
        if DATE_LIKE.is_match(date) {
            let rest = caps["rest"].trim();
            return DescriptionAndDate {
                date: Some(date.to_string()),
                description: (!rest.is_empty()).then(|| rest.to_string()),
            };
        }
    }

    DescriptionAndDate {
        description: Some(text.to_string()),
        date: None,
    }
}

// ============================================================================
// URLs
// ============================================================================

/// Base URL for a request host. Bare hosts get `http`, the scheme requests
/// are issued with.
pub fn base_url(host: &str) -> Result<Url, ExtractError> {
    let host = host.trim();
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}/")
    };
    Url::parse(&candidate)
        .ok()
        .filter(|url| url.has_host())
        .ok_or_else(|| ExtractError::InvalidHost(host.to_string()))
}

/// Makes a relative or protocol-relative href absolute against `host`.
/// Absolute hrefs come back untouched.
pub fn absolutize(href: &str, host: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    base_url(host)
        .ok()
        .and_then(|base| base.join(href).ok())
        .map_or_else(|| href.to_string(), String::from)
}

/// Value of one query parameter in a raw query string (a leading `?` or a
/// path before it is ignored). Form encoding is decoded.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    // A `?` after the first `=` belongs to an unencoded value, not a path.
    let query = match query.find('?') {
        Some(idx) if !query[..idx].contains('=') => &query[idx + 1..],
        _ => query,
    };
    let query = query.split('#').next().unwrap_or_default();

    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != name {
            return None;
        }
        let value = value.replace('+', " ");
        let decoded = urlencoding::decode(&value).map_or(value.clone(), |v| v.into_owned());
        Some(decoded)
    })
}

const REDIRECT_PATH: &str = "/url";
const REDIRECT_TARGET_PARAM: &str = "q";
const LIGHT_PAGE_HOST: &str = "googleweblight";
const LIGHT_PAGE_TARGET_PARAM: &str = "lite_url";

/// Peels the internal `/url?q=` redirect and, one level deeper, the light-page
/// `lite_url` redirect. Any other href, including search links that carry
/// their own `q`, comes back unchanged. Anything that does not parse falls
/// back to the best URL found so far.
pub fn unwrap_redirect(href: &str, host: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    let outer = absolutize(href, host);
    let Ok(parsed) = Url::parse(&outer) else {
        return href.to_string();
    };
    if parsed.path() != REDIRECT_PATH {
        return href.to_string();
    }

    let Some(target) = query_param(parsed.query().unwrap_or_default(), REDIRECT_TARGET_PARAM)
        .filter(|t| !t.is_empty())
    else {
        return href.to_string();
    };

    let Ok(light) = Url::parse(&target) else {
        return target;
    };
    if !light.host_str().is_some_and(|h| h.contains(LIGHT_PAGE_HOST)) {
        return target;
    }

    query_param(light.query().unwrap_or_default(), LIGHT_PAGE_TARGET_PARAM)
        .filter(|t| !t.is_empty())
        .unwrap_or(target)
}

// ============================================================================
// Numbers
// ============================================================================

fn strip_group_separators(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '\u{202f}' | '\''))
        .collect()
}

/// `"1,234"` → `1234`. Thousands separators (comma, spaces, apostrophe) are
/// dropped before conversion.
pub fn parse_grouped_integer(raw: &str) -> Option<u64> {
    strip_group_separators(raw).parse().ok()
}

/// `"1,299.99"` → `1299.99`.
pub fn parse_grouped_decimal(raw: &str) -> Option<f64> {
    strip_group_separators(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Named extraction rules for commerce text. Each capture group is the
/// numeric part of its field.
pub mod rules {
    use super::*;

    /// `Rating: 4.5`
    pub static RATING_LABELLED: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Rating:\s*([0-9]+(?:\.[0-9]+)?)").expect("static regex"));

    /// `4.5 (1,234)`: rating followed by a bracketed review count. The rating
    /// may not start inside a longer number or a price.
    pub static RATING_WITH_COUNT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:^|[^0-9.,$])([0-5](?:\.[0-9]+)?)\s*\(([0-9][0-9,]*)\)")
            .expect("static regex")
    });

    /// `1,234 reviews`
    pub static REVIEW_COUNT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"([0-9][0-9,]*)\s+reviews").expect("static regex"));

    /// `$1,299.99`
    pub static PRICE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\$\s?([0-9][0-9,]*(?:\.[0-9]+)?)").expect("static regex"));

    /// Digit runs grouped by dots, commas or spaces, as in result-count lines.
    pub static GROUPED_DIGITS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\d+(?:[.,\s\u{a0}\u{202f}]\d+)*").expect("static regex"));
}

fn capture<'t>(rule: &Regex, text: &'t str, group: usize) -> Option<&'t str> {
    rule.captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str())
}

fn rating_in_range(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|r| (0.0..=5.0).contains(r))
}

/// Applies the rating, review-count and price rules independently. Returns
/// `None` when none of them matched.
pub fn parse_product_info(text: &str) -> Option<ProductInfo> {
    // The bracketed count only counts when its own rating is on the scale.
    let rated_count = rules::RATING_WITH_COUNT.captures(text).and_then(|caps| {
        let rating = rating_in_range(caps.get(1)?.as_str())?;
        Some((rating, caps.get(2)?.as_str()))
    });

    let rating = capture(&rules::RATING_LABELLED, text, 1)
        .and_then(rating_in_range)
        .or(rated_count.map(|(rating, _)| rating));

    let number_of_reviews = capture(&rules::REVIEW_COUNT, text, 1)
        .or(rated_count.map(|(_, count)| count))
        .and_then(parse_grouped_integer);

    let price = capture(&rules::PRICE, text, 1).and_then(parse_grouped_decimal);

    let info = ProductInfo {
        rating,
        number_of_reviews,
        price,
    };
    (!info.is_empty()).then_some(info)
}

/// Price from free text with everything but digits and dots removed.
pub fn parse_loose_price(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Total result count from a line such as
/// `"About 1,230,000 results (0.45 seconds)"`. The bracketed timing is
/// ignored and the longest grouped number wins over page numbers.
pub fn parse_total_results(raw: &str) -> Option<u64> {
    let head = raw.split('(').next().unwrap_or_default();
    rules::GROUPED_DIGITS
        .find_iter(head)
        .map(|m| m.as_str())
        .max_by_key(|s| s.len())
        .and_then(|s| {
            s.chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_relative_date() {
        assert_eq!(
            split_description_and_date("3 days ago - Great product"),
            DescriptionAndDate {
                date: Some("3 days ago".into()),
                description: Some("Great product".into()),
            }
        );
    }

    #[test]
    fn splits_calendar_date_with_em_dash() {
        let split = split_description_and_date("Jan 5, 2021 — Release notes for the new version.");
        assert_eq!(split.date.as_deref(), Some("Jan 5, 2021"));
        assert_eq!(split.description.as_deref(), Some("Release notes for the new version."));
    }

    #[test]
    fn plain_text_is_all_description() {
        assert_eq!(
            split_description_and_date("Just a description"),
            DescriptionAndDate {
                date: None,
                description: Some("Just a description".into()),
            }
        );
    }

    #[test]
    fn hyphen_without_date_keeps_text_whole() {
        let split = split_description_and_date("Rust - a language empowering everyone");
        assert_eq!(split.date, None);
        assert_eq!(split.description.as_deref(), Some("Rust - a language empowering everyone"));
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert_eq!(split_description_and_date("   \n"), DescriptionAndDate::default());
    }

    #[test]
    fn absolutize_relative_and_protocol_relative() {
        assert_eq!(
            absolutize("/search?q=rust+lang", "www.google.com"),
            "http://www.google.com/search?q=rust+lang"
        );
        assert_eq!(
            absolutize("//maps.google.com/maps?q=x", "https://www.google.de"),
            "https://maps.google.com/maps?q=x"
        );
        assert_eq!(absolutize("https://example.com/a", "www.google.com"), "https://example.com/a");
    }

    #[test]
    fn query_param_is_typed_lookup() {
        let ping = "/url?sa=t&source=web&rct=j&url=https://example.com&ved=2ahUKEwi";
        assert_eq!(query_param(ping, "ved").as_deref(), Some("2ahUKEwi"));
        assert_eq!(query_param(ping, "missing"), None);
        assert_eq!(query_param("q=a+b%26c", "q").as_deref(), Some("a b&c"));
        assert_eq!(
            query_param("q=https://example.com/page?id=1&sa=U", "q").as_deref(),
            Some("https://example.com/page?id=1")
        );
    }

    fn redirect(target: &str) -> String {
        format!("/url?q={}&sa=U&ved=abc", urlencoding::encode(target))
    }

    #[test]
    fn unwraps_single_redirect_round_trip() {
        let target = "https://www.rust-lang.org/learn?x=1&y=2";
        let unwrapped = unwrap_redirect(&redirect(target), "www.google.com");
        assert_eq!(absolutize(&unwrapped, "www.google.com"), target);
    }

    #[test]
    fn unwraps_double_redirect_round_trip() {
        let target = "https://docs.rs/scraper/latest/scraper/";
        let light = format!(
            "https://googleweblight.com/i?lite_url={}&ei=xyz",
            urlencoding::encode(target)
        );
        let unwrapped = unwrap_redirect(&redirect(&light), "www.google.com");
        assert_eq!(absolutize(&unwrapped, "www.google.com"), target);
    }

    #[test]
    fn unwrap_falls_back_to_outermost() {
        assert_eq!(unwrap_redirect("/url?sa=U", "www.google.com"), "/url?sa=U");
        assert_eq!(
            unwrap_redirect("https://example.com/page", "www.google.com"),
            "https://example.com/page"
        );
        assert_eq!(unwrap_redirect("", "www.google.com"), "");
        assert_eq!(unwrap_redirect("/url?q=x", "not a host"), "/url?q=x");
    }

    #[test]
    fn only_redirect_paths_are_unwrapped() {
        assert_eq!(
            unwrap_redirect("/search?q=rust+book&sa=X", "www.google.com"),
            "/search?q=rust+book&sa=X"
        );
        assert_eq!(
            unwrap_redirect("https://duckduckgo.com/?q=rust", "www.google.com"),
            "https://duckduckgo.com/?q=rust"
        );
    }

    #[test]
    fn lite_url_is_read_only_from_the_light_page_host() {
        let target = "https://example.com/?lite_url=https%3A%2F%2Fother.example%2F";
        let unwrapped = unwrap_redirect(&redirect(target), "www.google.com");
        assert_eq!(unwrapped, target);
    }

    #[test]
    fn light_page_without_target_keeps_light_url() {
        let light = "https://googleweblight.com/i?ei=xyz";
        assert_eq!(unwrap_redirect(&redirect(light), "www.google.com"), light);
    }

    #[test]
    fn grouped_numbers() {
        assert_eq!(parse_grouped_integer("1,234"), Some(1234));
        assert_eq!(parse_grouped_integer("6 730 000"), Some(6_730_000));
        assert_eq!(parse_grouped_decimal("1,299.99"), Some(1299.99));
        assert_eq!(parse_grouped_integer("abc"), None);
    }

    #[test]
    fn product_rules() {
        let info = parse_product_info("1,234 reviews").unwrap();
        assert_eq!(info.number_of_reviews, Some(1234));
        assert_eq!(info.rating, None);

        let info = parse_product_info("$19.99").unwrap();
        assert_eq!(info.price, Some(19.99));

        let info = parse_product_info("4.5 (1,234)").unwrap();
        assert_eq!(info.rating, Some(4.5));
        assert_eq!(info.number_of_reviews, Some(1234));

        let info = parse_product_info("Rating: 4.8 · 2,310 reviews · $1,049.00 · In stock").unwrap();
        assert_eq!(
            info,
            ProductInfo {
                rating: Some(4.8),
                number_of_reviews: Some(2310),
                price: Some(1049.0),
            }
        );

        assert_eq!(parse_product_info("In stock"), None);
    }

    #[test]
    fn rating_outside_scale_is_dropped() {
        assert_eq!(parse_product_info("Rating: 7.5"), None);
        assert_eq!(parse_product_info("7.5 (12)"), None);
    }

    #[test]
    fn bracketed_number_after_price_is_not_a_review_count() {
        let info = parse_product_info("$1,049.00 (12)").unwrap();
        assert_eq!(info.price, Some(1049.0));
        assert_eq!(info.number_of_reviews, None);
        assert_eq!(info.rating, None);

        assert_eq!(parse_product_info("Price 19.99 (2)"), None);

        let info = parse_product_info("Top rated 4.7 (310) · $24.99").unwrap();
        assert_eq!(
            info,
            ProductInfo {
                rating: Some(4.7),
                number_of_reviews: Some(310),
                price: Some(24.99),
            }
        );
    }

    #[test]
    fn total_results_lines() {
        assert_eq!(parse_total_results("About 1,230,000 results (0.45 seconds)"), Some(1_230_000));
        assert_eq!(
            parse_total_results("Přibližný počet výsledků: 6 730 000 000 (0,30 s)"),
            Some(6_730_000_000)
        );
        assert_eq!(parse_total_results("Page 2 of about 98,400 results"), Some(98_400));
        assert_eq!(parse_total_results(""), None);
    }

    #[test]
    fn loose_price_strips_currency_text() {
        assert_eq!(parse_loose_price("$24.99 "), Some(24.99));
        assert_eq!(parse_loose_price("free"), None);
    }
}
