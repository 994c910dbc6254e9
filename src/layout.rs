use scraper::Html;
use serde::Serialize;
use utoipa::ToSchema;

use crate::document::selector;

/// Structural family of a mobile results page.
///
/// The three families share almost no markup, so the tag is computed once per
/// document and handed to every mobile assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutTag {
    /// Lowest-end rendering; result links go through an extra light-page redirect.
    Weblight,
    /// JavaScript-lean layout built only for phones.
    Mobile,
    /// Full layout with JavaScript enabled, close to the desktop markup.
    DesktopLike,
}

impl LayoutTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weblight => "weblight",
            Self::Mobile => "mobile",
            Self::DesktopLike => "desktop-like",
        }
    }
}

/// Classifies a mobile document. First marker found wins; never fails.
pub fn detect(document: &Html) -> LayoutTag {
    let has = |sel| document.select(sel).next().is_some();

    if has(selector!(r#"meta[content*="xml"]"#)) {
        return LayoutTag::Weblight;
    }

    if has(selector!(r#"meta[name="viewport"]"#)) && !has(selector!("html[itemscope]")) {
        return LayoutTag::Mobile;
    }

    LayoutTag::DesktopLike
}
