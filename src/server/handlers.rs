//! Request handlers for the `/api` routes

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::caption::{CaptionLine, CaptionSource};
use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsQuery {
    pub video_url: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsResponse {
    pub video_id: String,
    pub lang: String,
    pub source: CaptionSource,
    pub captions: Vec<CaptionLine>,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn get_captions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CaptionsQuery>,
) -> Result<Json<CaptionsResponse>, ApiError> {
    let video_url = query
        .video_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing videoUrl".to_string()))?;
    let lang = non_empty(query.lang.as_deref()).unwrap_or(&state.default_lang).to_string();

    let track = state.workflow.fetch_captions(&video_url, &lang).await?;

    Ok(Json(CaptionsResponse {
        video_id: track.video_id.to_string(),
        lang: track.lang,
        source: track.source,
        captions: track.lines,
    }))
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let body = payload.map(|Json(body)| body).unwrap_or(Value::Null);

    let Some(Value::Array(items)) = body.get("texts") else {
        return Err(ApiError::BadRequest("texts must be an array".to_string()));
    };
    let texts = items
        .iter()
        .map(|item| match item {
            Value::String(text) => Ok(text.clone()),
            Value::Null => Ok(String::new()),
            _ => Err(ApiError::BadRequest("texts must be an array of strings".to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let target_lang = non_empty(body.get("targetLang").and_then(Value::as_str))
        .unwrap_or(&state.default_target);
    let source_lang = non_empty(body.get("sourceLang").and_then(Value::as_str))
        .unwrap_or(&state.default_source);

    let translations = state.workflow.translate(&texts, target_lang, source_lang).await?;
    Ok(Json(TranslateResponse { translations }))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
