use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

use crate::layout::LayoutTag;

// ============================================================================
// Input
// ============================================================================

/// Device class the page was requested for. Picks the assembler set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

// ============================================================================
// Records
// ============================================================================

/// Secondary link nested inside a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteLink {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// Commerce details; any subset of the three may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    /// 0 to 5
    pub rating: Option<f64>,
    pub number_of_reviews: Option<u64>,
    pub price: Option<f64>,
}

impl ProductInfo {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.number_of_reviews.is_none() && self.price.is_none()
    }
}

/// Profile-style result split from a two-line description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub location: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub clean_description: Option<String>,
    pub raw_text: String,
}

/// Tracking attributes kept for attribution and debugging. Never used to
/// order results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankingMeta {
    pub ping_ved: Option<String>,
    pub item_ved: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganicResult {
    pub title: String,
    pub url: Option<String>,
    pub displayed_url: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub emphasized_keywords: Vec<String>,
    pub site_links: Vec<SiteLink>,
    pub product_info: Option<ProductInfo>,
    pub personal_info: Option<PersonalInfo>,
    #[serde(flatten)]
    pub ranking: RankingMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaidResult {
    pub title: String,
    pub url: Option<String>,
    pub displayed_url: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub emphasized_keywords: Vec<String>,
    pub site_links: Vec<SiteLink>,
}

/// Shopping unit. Prices stay strings: the slots mix amounts and labels such
/// as "Free shipping".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaidProduct {
    pub title: String,
    pub url: Option<String>,
    pub displayed_url: String,
    pub prices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedQuery {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeopleAlsoAsk {
    pub question: String,
    /// Only present when the expandable answer was already rendered.
    pub answer: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

// ============================================================================
// Page
// ============================================================================

/// Total result count. Mobile layouts never show one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsTotal {
    Count(u64),
    Unknown,
}

impl Serialize for ResultsTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u64(*n),
            Self::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

/// Everything extracted from one results page. List order is the visual
/// top-to-bottom order; consumers derive positions from the index.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerpPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutTag>,
    /// A number, or "N/A" when the layout does not show one.
    #[schema(value_type = Object)]
    pub results_total: ResultsTotal,
    pub related_queries: Vec<RelatedQuery>,
    pub paid_results: Vec<PaidResult>,
    pub paid_products: Vec<PaidProduct>,
    pub organic_results: Vec<OrganicResult>,
    pub people_also_ask: Vec<PeopleAlsoAsk>,
}

impl SerpPage {
    /// One-line summary for logs.
    pub fn counts(&self) -> String {
        format!(
            "organicResults: {}, paidResults: {}, paidProducts: {}",
            self.organic_results.len(),
            self.paid_results.len(),
            self.paid_products.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn results_total_serializes_number_or_sentinel() {
        assert_eq!(serde_json::to_value(ResultsTotal::Count(42)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(ResultsTotal::Unknown).unwrap(), json!("N/A"));
    }

    #[test]
    fn organic_result_flattens_ranking_metadata() {
        let result = OrganicResult {
            title: "Rust".into(),
            ranking: RankingMeta {
                ping_ved: Some("2ah".into()),
                item_ved: None,
                lang: Some("en".into()),
            },
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["pingVed"], json!("2ah"));
        assert_eq!(value["lang"], json!("en"));
        assert_eq!(value["productInfo"], json!(null));
        assert_eq!(value["emphasizedKeywords"], json!([]));
    }

    #[test]
    fn device_reads_uppercase() {
        let device: Device = serde_json::from_str("\"MOBILE\"").unwrap();
        assert_eq!(device, Device::Mobile);
    }
}
