use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{MediaDetails, MediaId, MediaType, NewEntryRequest, TrendingWindow, WatchlistEntry},
    services::watchlist::{complete_display_fields, hydrate, HydratedEntry},
    store::WatchlistError,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveQuery {
    pub id: Option<String>,
    #[serde(default, alias = "media_type", alias = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub window: TrendingWindow,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub titles: Option<Vec<String>>,
    #[serde(default)]
    pub mood: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub based_on: Vec<String>,
    pub recommendations: String,
}

fn parse_media_type(raw: &str) -> AppResult<MediaType> {
    raw.parse::<MediaType>().map_err(AppError::InvalidInput)
}

fn parse_optional_media_type(raw: Option<&str>) -> AppResult<Option<MediaType>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_media_type(raw).map(Some),
    }
}

impl RemoveQuery {
    fn parse(&self) -> AppResult<(MediaId, Option<MediaType>)> {
        let raw_id = self.id.as_deref().map(str::trim).unwrap_or_default();
        if raw_id.is_empty() {
            return Err(WatchlistError::Validation("Missing required parameter: id".to_string()).into());
        }
        let id = MediaId::parse(raw_id)
            .ok_or_else(|| WatchlistError::Validation(format!("Invalid id: {}", raw_id)))?;
        let media_type = parse_optional_media_type(self.media_type.as_deref())?;
        Ok((id, media_type))
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List the watchlist in store order
pub async fn list_watchlist(State(state): State<AppState>) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let entries = state.store.list(&state.owner).await?;
    Ok(Json(entries))
}

/// Add an entry to the watchlist
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    payload: Result<Json<NewEntryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let mut entry = request.into_entry()?;
    let id = entry.id;
    if state.store.caches_display_fields() {
        entry = complete_display_fields(state.gateway.as_ref(), entry).await;
    }

    match state.store.add(&state.owner, entry).await {
        Ok(()) => {
            tracing::info!(id = %id, store = state.store.name(), "Added to watchlist");
            Ok((StatusCode::CREATED, MessageResponse::new("Added to watchlist")))
        }
        Err(WatchlistError::Conflict(id)) => {
            tracing::debug!(id = %id, "Watchlist add rejected as duplicate");
            Err(WatchlistError::Conflict(id).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove an entry from the watchlist by `?id=`
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> AppResult<Json<MessageResponse>> {
    let (id, media_type) = query.parse()?;

    state.store.remove(&state.owner, id, media_type).await?;
    tracing::info!(id = %id, store = state.store.name(), "Removed from watchlist");

    Ok(MessageResponse::new("Removed from watchlist"))
}

/// Whether an item is saved, for toggling add/remove buttons
pub async fn watchlist_status(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> AppResult<Json<Value>> {
    let (id, media_type) = query.parse()?;

    let saved = state.store.contains(&state.owner, id, media_type).await?;
    Ok(Json(json!({ "id": id, "saved": saved })))
}

/// Any other method on the watchlist endpoint
pub async fn watchlist_method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST, DELETE")],
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Watchlist entries merged with fresh metadata
pub async fn watchlist_details(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HydratedEntry>>> {
    let entries = state.store.list(&state.owner).await?;
    Ok(Json(hydrate(state.gateway.as_ref(), entries).await))
}

/// Administrative reset: deletes the whole watchlist
pub async fn reset_watchlist(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    state.store.clear(&state.owner).await?;
    tracing::warn!(store = state.store.name(), "Watchlist cleared");
    Ok(MessageResponse::new("Watchlist cleared"))
}

/// Proxy: details for one movie or TV show
pub async fn media_details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> AppResult<Json<MediaDetails>> {
    let media_type = parse_media_type(&media_type)?;
    let id = MediaId::parse(&id).ok_or_else(|| AppError::InvalidInput(format!("Invalid id: {}", id)))?;

    let details = state.gateway.details(media_type, id).await?;
    Ok(Json(details))
}

/// Proxy: multi search
pub async fn search_media(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<MediaDetails>>> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() {
        return Err(AppError::InvalidInput("Missing required parameter: q".to_string()));
    }

    let results = state.gateway.search(q).await?;
    Ok(Json(results))
}

/// Proxy: trending movies or TV shows
pub async fn trending_media(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    Query(query): Query<TrendingQuery>,
) -> AppResult<Json<Vec<MediaDetails>>> {
    let media_type = parse_media_type(&media_type)?;
    let results = state.gateway.trending(media_type, query.window).await?;
    Ok(Json(results))
}

/// Viewing suggestions based on given titles, or on the watchlist when none are given
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let recommender = state
        .recommender
        .clone()
        .ok_or_else(|| AppError::NotConfigured("Recommendations are not configured".to_string()))?;

    let titles = match request.titles {
        Some(titles) => titles,
        None => state
            .store
            .list(&state.owner)
            .await?
            .into_iter()
            .filter_map(|entry| entry.title)
            .collect(),
    };
    let titles: Vec<String> = titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if titles.is_empty() {
        return Err(AppError::InvalidInput(
            "No titles to base recommendations on".to_string(),
        ));
    }

    let recommendations = recommender
        .recommend(&titles, request.mood.as_deref())
        .await?;
    tracing::info!(
        titles = titles.len(),
        recommender = recommender.name(),
        "Generated recommendations"
    );

    Ok(Json(RecommendationResponse {
        based_on: titles,
        recommendations,
    }))
}
