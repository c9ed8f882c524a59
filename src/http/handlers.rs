use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, Time};
use uuid::Uuid;

use crate::app::accounts::{AccountService, ConnectError, UpsertConnection};
use crate::app::calendar::{self, DayCell};
use crate::app::media::MediaService;
use crate::app::posts::{PostService, UpdatePost};
use crate::app::validation;
use crate::domain::account::ConnectedAccount;
use crate::domain::draft::{MediaFile, PostDraft};
use crate::domain::platform::Platform;
use crate::domain::post::{char_count, Post};
use crate::http::{AdminToken, AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Platform registry
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PlatformInfo {
    pub id: Platform,
    pub display_name: &'static str,
    pub char_limit: u32,
}

pub async fn list_platforms() -> Json<ListResponse<PlatformInfo>> {
    let items = Platform::ALL
        .iter()
        .map(|platform| PlatformInfo {
            id: *platform,
            display_name: platform.display_name(),
            char_limit: platform.char_limit(),
        })
        .collect();
    Json(ListResponse { items })
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct MediaPayload {
    pub content_type: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

impl MediaPayload {
    fn decode(&self) -> Result<MediaFile, AppError> {
        let data = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|_| AppError::bad_request("invalid media data"))?;
        Ok(MediaFile {
            content_type: self.content_type.clone(),
            data: Bytes::from(data),
        })
    }
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub platforms: Vec<Platform>,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub media: Option<MediaPayload>,
}

fn parse_schedule_date(value: &str) -> Result<Date, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, &format)
        .map_err(|_| AppError::bad_request("invalid scheduled_date (expected YYYY-MM-DD)"))
}

fn parse_schedule_time(value: &str) -> Result<Time, AppError> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(value, &format)
        .map_err(|_| AppError::bad_request("invalid scheduled_time (expected HH:MM)"))
}

/// One-way conversion from request fields into the draft model. Duplicate
/// platform ids collapse to a single selection.
fn draft_from_parts(
    content: String,
    platforms: &[Platform],
    media: Option<&MediaPayload>,
) -> Result<(PostDraft, Option<String>), AppError> {
    let mut draft = PostDraft::new();
    draft.set_content(content);
    for platform in platforms {
        if !draft.platforms().contains(platform) {
            draft.toggle_platform(*platform);
        }
    }
    let mut data_uri = None;
    if let Some(payload) = media {
        let preview = draft.attach_media(payload.decode()?);
        data_uri = Some(preview.data_uri);
    }
    Ok((draft, data_uri))
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let date = parse_schedule_date(&payload.scheduled_date)?;
    let time = parse_schedule_time(&payload.scheduled_time)?;

    let (mut draft, _) = draft_from_parts(payload.content, &payload.platforms, payload.media.as_ref())?;
    draft.set_schedule(date, time);

    validation::validate(&draft).map_err(|err| AppError::bad_request(err.to_string()))?;

    let media = media_service(&state);

    // Reject unsupported or oversized files before going anywhere near
    // storage.
    if let Some(file) = draft.media() {
        media
            .validate_file(&file.content_type, file.data.len() as i64)
            .map_err(|err| AppError::bad_request(err.to_string()))?;
    }

    // Media resolves first; a failed upload aborts the submit before a post
    // row exists, so no post can reference a missing object.
    let media_key = match draft.media() {
        Some(file) => Some(
            media
                .commit(auth.user_id, &file.content_type, file.data.clone())
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, user_id = %auth.user_id, "media upload failed");
                    AppError::bad_gateway("media upload failed")
                })?,
        ),
        None => None,
    };

    let scheduled_at = draft
        .scheduled_at()
        .ok_or_else(|| AppError::internal("draft passed validation without a schedule"))?;

    let service = PostService::new(state.db.clone());
    let mut post = service
        .create_post(
            auth.user_id,
            draft.content().to_string(),
            draft.platforms().to_vec(),
            scheduled_at,
            media_key,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    post.media_url = media.media_url(post.media_key.as_deref()).await;
    Ok(Json(post))
}

pub async fn list_posts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<Post>>, AppError> {
    let service = PostService::new(state.db.clone());
    let mut posts = service.list_posts(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    media_service(&state).populate_media_urls(&mut posts).await;
    Ok(Json(ListResponse { items: posts }))
}

pub async fn get_post(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone());
    let post = service.get_post(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;

    let mut post = post.ok_or_else(|| AppError::not_found("post not found"))?;
    post.media_url = media_service(&state).media_url(post.media_key.as_deref()).await;
    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub platforms: Option<Vec<Platform>>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub media: Option<MediaPayload>,
    #[serde(default)]
    pub clear_media: bool,
}

pub async fn update_post(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let scheduled_at = match (&payload.scheduled_date, &payload.scheduled_time) {
        (Some(date), Some(time)) => {
            let date = parse_schedule_date(date)?;
            let time = parse_schedule_time(time)?;
            Some(date.with_time(time).assume_utc())
        }
        (None, None) => None,
        _ => {
            return Err(AppError::bad_request(
                "scheduled_date and scheduled_time must be updated together",
            ))
        }
    };

    let service = PostService::new(state.db.clone());
    let existing = service.get_post(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to fetch post");
        AppError::internal("failed to fetch post")
    })?;
    let existing = existing.ok_or_else(|| AppError::not_found("post not found"))?;

    // Validate the post as it will be after the partial update: the binding
    // limit may come from stored platforms and incoming content, or the
    // other way around.
    let effective_content = payload.content.as_deref().unwrap_or(&existing.content);
    let effective_platforms = payload
        .platforms
        .as_deref()
        .unwrap_or(&existing.platforms);
    if effective_content.is_empty() {
        return Err(AppError::bad_request("content cannot be empty"));
    }
    if effective_platforms.is_empty() {
        return Err(AppError::bad_request("select at least one platform"));
    }
    validation::check_char_limit(effective_content, effective_platforms)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let media = media_service(&state);
    let media_key = if let Some(ref file_payload) = payload.media {
        let file = file_payload.decode()?;
        media
            .validate_file(&file.content_type, file.data.len() as i64)
            .map_err(|err| AppError::bad_request(err.to_string()))?;
        let key = media
            .commit(auth.user_id, &file.content_type, file.data)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, user_id = %auth.user_id, "media upload failed");
                AppError::bad_gateway("media upload failed")
            })?;
        Some(Some(key))
    } else if payload.clear_media {
        Some(None)
    } else {
        None
    };

    let updated = service
        .update_post(
            id,
            auth.user_id,
            UpdatePost {
                content: payload.content,
                platforms: payload.platforms,
                scheduled_at,
                media_key,
            },
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id = %id, "failed to update post");
            AppError::internal("failed to update post")
        })?;

    let mut post = updated.ok_or_else(|| AppError::not_found("post not found"))?;
    post.media_url = media.media_url(post.media_key.as_deref()).await;
    Ok(Json(post))
}

pub async fn delete_post(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = PostService::new(state.db.clone());
    let deleted = service.delete_post(id, auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id = %id, "failed to delete post");
        AppError::internal("failed to delete post")
    })?;

    // Deleting an already-deleted id is a no-op, not an error.
    if !deleted {
        tracing::debug!(post_id = %id, "delete on missing post");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

#[derive(Serialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u8,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u8,
    pub cells: Vec<DayCell>,
    pub previous: MonthRef,
    pub next: MonthRef,
}

pub async fn calendar(
    auth: AuthUser,
    Query(query): Query<CalendarQuery>,
    State(state): State<AppState>,
) -> Result<Json<CalendarResponse>, AppError> {
    // A single "now" per render pass keeps today-highlighting consistent.
    let now = OffsetDateTime::now_utc();

    let (year, month) = match (query.year, query.month) {
        (Some(year), Some(month)) => {
            let month = Month::try_from(month)
                .map_err(|_| AppError::bad_request("invalid month (expected 1-12)"))?;
            (year, month)
        }
        (None, None) => calendar::current_month(now),
        _ => {
            return Err(AppError::bad_request(
                "year and month must be supplied together",
            ))
        }
    };

    let from = Date::from_calendar_date(year, month, 1)
        .map_err(|_| AppError::bad_request("invalid year"))?
        .midnight()
        .assume_utc();
    let (next_year, next_month) = calendar::next_month(year, month);
    let to = Date::from_calendar_date(next_year, next_month, 1)
        .map_err(|_| AppError::bad_request("invalid year"))?
        .midnight()
        .assume_utc();

    let service = PostService::new(state.db.clone());
    let posts = service
        .list_between(auth.user_id, from, to)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to load calendar posts");
            AppError::internal("failed to load calendar")
        })?;

    let cells = calendar::month_grid(&posts, year, month, now.date());
    let (prev_year, prev_month) = calendar::previous_month(year, month);

    Ok(Json(CalendarResponse {
        year,
        month: month as u8,
        cells,
        previous: MonthRef {
            year: prev_year,
            month: prev_month as u8,
        },
        next: MonthRef {
            year: next_year,
            month: next_month as u8,
        },
    }))
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub content: String,
    pub platforms: Vec<Platform>,
    pub media: Option<MediaPayload>,
}

#[derive(Serialize)]
pub struct PlatformPreview {
    pub platform: Platform,
    pub display_name: &'static str,
    pub char_limit: u32,
    pub remaining: i64,
    pub content: String,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub effective_char_limit: Option<u32>,
    pub binding_platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_data_uri: Option<String>,
    pub previews: Vec<PlatformPreview>,
}

/// Per-platform rendering of a draft: remaining characters against each
/// target and the content as that platform would truncate it. Purely local;
/// nothing durable happens here.
pub async fn preview_post(
    State(_state): State<AppState>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let (draft, media_data_uri) =
        draft_from_parts(payload.content, &payload.platforms, payload.media.as_ref())?;

    let length = char_count(draft.content()) as i64;
    let previews = draft
        .platforms()
        .iter()
        .map(|platform| {
            let limit = platform.char_limit();
            let content = if length > i64::from(limit) {
                let cut: String = draft.content().chars().take(limit as usize).collect();
                format!("{}...", cut)
            } else {
                draft.content().to_string()
            };
            PlatformPreview {
                platform: *platform,
                display_name: platform.display_name(),
                char_limit: limit,
                remaining: i64::from(limit) - length,
                content,
            }
        })
        .collect();

    Ok(Json(PreviewResponse {
        effective_char_limit: validation::effective_char_limit(draft.platforms()),
        binding_platform: validation::binding_platform(draft.platforms()),
        media_data_uri,
        previews,
    }))
}

// ---------------------------------------------------------------------------
// Connected accounts
// ---------------------------------------------------------------------------

pub async fn list_accounts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<ConnectedAccount>>, AppError> {
    let service = account_service(&state);
    let accounts = service.list_accounts(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list accounts");
        AppError::internal("failed to list accounts")
    })?;

    Ok(Json(ListResponse { items: accounts }))
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub redirect_url: String,
}

pub async fn connect_account(
    auth: AuthUser,
    Path(platform): Path<Platform>,
    State(state): State<AppState>,
) -> Result<Json<ConnectResponse>, AppError> {
    let service = account_service(&state);
    let redirect_url = service
        .connect_url(platform, auth.user_id)
        .map_err(|err| match err {
            ConnectError::Unsupported(_) => AppError::not_implemented(err.to_string()),
            ConnectError::MissingClientId | ConnectError::Malformed(_) => {
                tracing::error!(error = %err, platform = %platform, "failed to build connect url");
                AppError::internal("failed to build connect url")
            }
        })?;

    Ok(Json(ConnectResponse { redirect_url }))
}

pub async fn disconnect_account(
    auth: AuthUser,
    Path(platform): Path<Platform>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = account_service(&state);
    let deactivated = service
        .disconnect(auth.user_id, platform)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, platform = %platform, "failed to disconnect account");
            AppError::internal("failed to disconnect account")
        })?;

    if !deactivated {
        tracing::debug!(platform = %platform, "disconnect on inactive account");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct OauthCallbackRequest {
    pub user_id: Uuid,
    pub platform: Platform,
    pub platform_user_id: Option<String>,
    pub platform_username: Option<String>,
    pub platform_display_name: Option<String>,
    pub platform_avatar_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub token_expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub followers_count: i64,
}

/// Invoked by the external OAuth callback function after token exchange.
pub async fn oauth_callback(
    _admin: AdminToken,
    State(state): State<AppState>,
    Json(payload): Json<OauthCallbackRequest>,
) -> Result<Json<ConnectedAccount>, AppError> {
    if payload.access_token.trim().is_empty() {
        return Err(AppError::bad_request("access_token is required"));
    }

    let service = account_service(&state);
    let account = service
        .upsert_connection(UpsertConnection {
            user_id: payload.user_id,
            platform: payload.platform,
            platform_user_id: payload.platform_user_id,
            platform_username: payload.platform_username,
            platform_display_name: payload.platform_display_name,
            platform_avatar_url: payload.platform_avatar_url,
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            token_expires_at: payload.token_expires_at,
            scopes: payload.scopes,
            followers_count: payload.followers_count,
        })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %payload.user_id, "failed to upsert connected account");
            AppError::internal("failed to save account connection")
        })?;

    Ok(Json(account))
}

// ---------------------------------------------------------------------------
// Service construction
// ---------------------------------------------------------------------------

fn media_service(state: &AppState) -> MediaService {
    MediaService::new(
        state.cache.clone(),
        state.storage.clone(),
        state.upload_max_bytes,
        state.media_url_ttl_seconds,
        state.s3_public_endpoint.clone(),
    )
}

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.db.clone(),
        state.oauth_redirect_url.clone(),
        state.google_client_id.clone(),
    )
}
