use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use vocab_core::model::{ModeError, ProgressCursor, TraversalMode};

use crate::error::AppError;
use crate::state::AppState;

const REAL_IP_HEADER: &str = "x-real-ip";

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CursorView {
    pub last_index: usize,
    pub mode: TraversalMode,
    pub served: u64,
}

impl From<&ProgressCursor> for CursorView {
    fn from(cursor: &ProgressCursor) -> Self {
        Self {
            last_index: cursor.last_index(),
            mode: cursor.mode(),
            served: cursor.served(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OverviewResponse {
    pub size: usize,
    pub cursor: Option<CursorView>,
}

/// Mode as sent by clients: a name, or a numeric option code either bare or
/// quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModeField {
    Code(u8),
    Name(String),
}

impl ModeField {
    fn resolve(&self) -> Result<TraversalMode, ModeError> {
        match self {
            ModeField::Code(code) => TraversalMode::from_option_code(*code)
                .ok_or_else(|| ModeError::Unknown(code.to_string())),
            ModeField::Name(name) => name.parse(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WordRequest {
    pub username: String,
    #[serde(rename = "type")]
    pub category: String,
    pub mode: ModeField,
    pub index: usize,
}

fn client_ip(headers: &HeaderMap) -> &str {
    headers
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

/// `GET ?username=..&type=..`: word count and the learner's cursor.
pub async fn overview_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<OverviewResponse>, AppError> {
    let username = query
        .username
        .ok_or(AppError::MissingParameter("username"))?;
    let category = query.category.ok_or(AppError::MissingParameter("type"))?;
    info!(
        client = client_ip(&headers),
        %username,
        %category,
        "Overview request"
    );

    let overview = state.engine.overview(&username, &category)?;
    Ok(Json(OverviewResponse {
        size: overview.count,
        cursor: overview.cursor.as_ref().map(CursorView::from),
    }))
}

/// `POST {"username","type","mode","index"}`: select, record and return a word.
pub async fn word_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if body.is_empty() {
        warn!(client = client_ip(&headers), "Word request with an empty body");
        return Err(AppError::EmptyBody);
    }
    let request: WordRequest = serde_json::from_slice(&body)?;
    let mode = request.mode.resolve()?;
    info!(
        client = client_ip(&headers),
        username = %request.username,
        category = %request.category,
        %mode,
        index = request.index,
        "Word request"
    );

    let selection = state
        .engine
        .select_next(&request.username, &request.category, mode, request.index)
        .await?;
    let word = state
        .registry
        .word(selection.category, selection.index)
        .ok_or(AppError::MissingWord {
            category: selection.category,
            index: selection.index,
        })?;
    Ok(Json(word))
}
