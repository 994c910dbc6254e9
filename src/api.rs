//! HTTP parse service: markup in, `SerpPage` JSON out.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use url::Url;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ExtractError;
use crate::layout::LayoutTag;
use crate::model::{
    Device, OrganicResult, PaidProduct, PaidResult, PeopleAlsoAsk, PersonalInfo, ProductInfo,
    RankingMeta, RelatedQuery, SerpPage, SiteLink,
};
use crate::query::{has_next_page, SearchQuery, DEFAULT_RESULTS_PER_PAGE};
use crate::{extract_document, is_challenge_page, parse_document};

#[derive(OpenApi)]
#[openapi(
    paths(extract, health),
    components(
        schemas(
            ExtractRequest,
            ExtractResponse,
            SerpPage,
            OrganicResult,
            PaidResult,
            PaidProduct,
            SiteLink,
            ProductInfo,
            PersonalInfo,
            RankingMeta,
            RelatedQuery,
            PeopleAlsoAsk,
            SearchQuery,
            Device,
            LayoutTag
        )
    ),
    tags(
        (name = "extract", description = "Results page extraction API")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

pub fn app(config: Config) -> Router {
    let body_limit = config.max_html_bytes;
    let state = Arc::new(AppState { config });

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/extract", post(extract))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Extract
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Full markup of one results page.
    pub html: String,
    /// URL the page was served from. Supplies the host and the search query.
    pub url: Option<String>,
    /// Search host, e.g. `www.google.de`. Wins over the host of `url`.
    pub host: Option<String>,
    #[serde(default)]
    pub device: Device,
    /// 1-based page number; overrides the one derived from `url`.
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub request_id: Uuid,
    pub parsed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub url: Option<String>,
    pub search_query: Option<SearchQuery>,
    pub has_next_page: bool,
    #[serde(flatten)]
    pub page: SerpPage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[utoipa::path(
    post,
    path = "/extract",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Extracted page", body = ExtractResponse),
        (status = 400, description = "Empty or malformed markup"),
        (status = 413, description = "Markup exceeds the configured size limit"),
        (status = 422, description = "Bot-check page instead of results")
    ),
    tag = "extract"
)]
pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let device = request.device;
    let host = resolve_host(&request, &state.config.default_search_host);

    let mut search_query = request
        .url
        .as_deref()
        .and_then(|url| SearchQuery::from_url(url, device));
    if let (Some(query), Some(page)) = (search_query.as_mut(), request.page) {
        query.page = page;
    }
    let (page_number, per_page) = search_query
        .as_ref()
        .map(|q| (q.page, q.results_per_page))
        .unwrap_or((request.page.unwrap_or(1), DEFAULT_RESULTS_PER_PAGE));

    info!(%request_id, %host, ?device, bytes = request.html.len(), "extract request received");

    let html = request.html;
    let echoed_html = state.config.save_html.then(|| html.clone());

    // Parsing and selector matching are CPU bound.
    let outcome = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let document = parse_document(&html, &host)?;
        if is_challenge_page(&document) {
            return Err(ApiError::Challenge);
        }
        let page = extract_document(&document, &host, device);
        let next = has_next_page(&document, page_number, per_page);
        Ok((page, next))
    })
    .await
    .map_err(|err| ApiError::Internal(err.into()))?;

    let (page, has_next_page) =
        outcome.inspect_err(|err| warn!(%request_id, error = %err, "extract request rejected"))?;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        %request_id,
        layout = page.layout.map(|l| l.as_str()).unwrap_or("desktop"),
        organic = page.organic_results.len(),
        paid = page.paid_results.len(),
        products = page.paid_products.len(),
        duration_ms,
        "extract request done"
    );

    Ok(Json(ExtractResponse {
        request_id,
        parsed_at: Utc::now(),
        duration_ms,
        url: request.url,
        search_query,
        has_next_page,
        page,
        html: echoed_html,
    }))
}

/// Explicit host, then the host of the page URL, then the configured default.
fn resolve_host(request: &ExtractRequest, default_host: &str) -> String {
    request
        .host
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .or_else(|| {
            request
                .url
                .as_deref()
                .and_then(|url| Url::parse(url).ok())
                .and_then(|url| url.host_str().map(str::to_string))
        })
        .unwrap_or_else(|| default_host.to_string())
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "extract"
)]
pub async fn health() -> &'static str {
    "ok"
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Malformed(#[from] ExtractError),
    #[error("challenge page detected")]
    Challenge,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Challenge => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Challenge => json!({ "error": "challenge_detected" }),
            Self::Malformed(err) => json!({ "error": "malformed_input", "message": err.to_string() }),
            Self::Internal(err) => json!({ "error": "internal_error", "message": err.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
