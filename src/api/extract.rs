use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::application::booking::BookingError;

use super::error::ApiError;

/// 本文の項目名が特定できない拒否に使う項目名
pub const BODY_FIELD: &str = "body";

/// `Json` の拒否を他のエラーと同じ形式（コード + 項目）で返す抽出器
///
/// 型の合わない値（`"price": true` など）や壊れたJSONも
/// `INVALID_FIELD` として返す。
#[derive(Debug, Clone)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "rejected request body");
                Err(ApiError::from(BookingError::InvalidField {
                    field: BODY_FIELD,
                    reason: rejection.body_text(),
                }))
            }
        }
    }
}
