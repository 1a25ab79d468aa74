use crate::application::booking::{
    BookingError, ServiceDependencies, cancel_booking as execute_cancel_booking,
    get_post as query_post, get_reservation as query_reservation, list_active_reservations,
    list_available_posts, post_history, register_post as execute_register_post,
    relist_post as execute_relist_post, request_booking as execute_request_booking,
    withdraw_post as execute_withdraw_post,
};
use crate::domain::{
    CallerId, Category, PostId, ReservationId,
    commands::{CancelBooking, RegisterPost, RelistPost, WithdrawPost},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    extract::AppJson,
    types::{
        BookingRequest, HistoryEntryResponse, ListPostsQuery, PostDetailResponse, PostResponse,
        RegisterPostRequest, ReservationResponse,
    },
};

/// 認証済みの呼び出し元を示すヘッダー（検証せずに記録する）
pub const CALLER_ID_HEADER: &str = "x-caller-id";

/// 呼び出し元の期限（RFC 3339）
pub const DEADLINE_HEADER: &str = "x-booking-deadline";

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

fn caller_id(headers: &HeaderMap) -> Result<Option<CallerId>, BookingError> {
    headers
        .get(CALLER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| CallerId::parse(v, CALLER_ID_HEADER))
        .transpose()
        .map_err(BookingError::from)
}

fn deadline(headers: &HeaderMap) -> Result<Option<DateTime<Utc>>, BookingError> {
    let Some(value) = headers.get(DEADLINE_HEADER) else {
        return Ok(None);
    };

    let invalid = |reason: String| BookingError::InvalidField {
        field: DEADLINE_HEADER,
        reason,
    };

    let raw = value.to_str().map_err(|e| invalid(e.to_string()))?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| invalid(e.to_string()))
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /reservations, POST /api/DateReserve - 物件を予約
///
/// 強制されるビジネスルール:
/// - 物件が存在すること
/// - `Location`以外：物件が予約可能（Available）であること
/// - `Location`：開始日・終了日が必須で、有効な予約と期間が重ならないこと
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let cmd = req.to_command(caller_id(&headers)?, deadline(&headers)?, Utc::now())?;

    let reservation = execute_request_booking(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(ReservationResponse::from(reservation))))
}

/// POST /reservations/:id/cancel - 予約を取り消す
///
/// 他に有効な予約が残らなければ物件は Available に戻る。
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let cmd = CancelBooking {
        reservation_id: ReservationId::from_uuid(reservation_id),
        cancelled_at: Utc::now(),
        requested_by: caller_id(&headers)?,
    };

    let cancelled = execute_cancel_booking(&state.service_deps, cmd).await?;

    Ok(Json(ReservationResponse::from(cancelled)))
}

/// POST /posts - 物件を登録
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterPostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let cmd = RegisterPost {
        title: req.title,
        category: Category::from(req.category),
        registered_at: Utc::now(),
    };

    let post = execute_register_post(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// POST /posts/:id/withdraw - 掲載を停止
pub async fn withdraw_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let cmd = WithdrawPost {
        post_id: PostId::from_uuid(post_id),
        withdrawn_at: Utc::now(),
    };

    let post = execute_withdraw_post(&state.service_deps, cmd).await?;

    Ok(Json(PostResponse::from(post)))
}

/// POST /posts/:id/relist - 再掲載
pub async fn relist_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostResponse>, ApiError> {
    let cmd = RelistPost {
        post_id: PostId::from_uuid(post_id),
        relisted_at: Utc::now(),
    };

    let post = execute_relist_post(&state.service_deps, cmd).await?;

    Ok(Json(PostResponse::from(post)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /posts - 予約受付中の物件一覧
///
/// クエリパラメータ:
/// - category: カテゴリでフィルタリング（オプション）
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let category = query
        .category
        .filter(|c| !c.trim().is_empty())
        .map(Category::from);

    let posts = list_available_posts(&state.service_deps, category.as_ref()).await?;

    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// GET /posts/:id - 物件詳細
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostDetailResponse>, ApiError> {
    let post_id = PostId::from_uuid(post_id);
    let deps = &state.service_deps;

    let (post, active) = futures::try_join!(
        query_post(deps, post_id),
        list_active_reservations(deps, post_id)
    )?;

    Ok(Json(PostDetailResponse {
        post: PostResponse::from(post),
        active_reservations: active.len(),
    }))
}

/// GET /posts/:id/reservations - 物件の有効な予約一覧
pub async fn list_post_reservations(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let reservations =
        list_active_reservations(&state.service_deps, PostId::from_uuid(post_id)).await?;

    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    ))
}

/// GET /posts/:id/history - 物件の予約履歴
pub async fn get_post_history(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let events = post_history(&state.service_deps, PostId::from_uuid(post_id)).await?;

    Ok(Json(
        events.into_iter().map(HistoryEntryResponse::from).collect(),
    ))
}

/// GET /reservations/:id - 予約詳細（取消済みも含む）
pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation =
        query_reservation(&state.service_deps, ReservationId::from_uuid(reservation_id)).await?;

    Ok(Json(ReservationResponse::from(reservation)))
}
