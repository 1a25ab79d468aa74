use crate::application::booking::BookingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            BookingError::PostNotFound(_) | BookingError::ReservationNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict - 物件の現在の状態と両立しない
            BookingError::PostUnavailable { .. } | BookingError::DateRangeOverlap { .. } => {
                StatusCode::CONFLICT
            }

            // 422 Unprocessable Entity - 入力の検証エラー
            BookingError::InvalidDateRange { .. }
            | BookingError::MissingRequiredField(_)
            | BookingError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 408 Request Timeout - 排他ゲート取得前に期限切れ
            BookingError::DeadlineExceeded => StatusCode::REQUEST_TIMEOUT,

            // 500 Internal Server Error - システム障害
            BookingError::PostRegistryError(_)
            | BookingError::LedgerError(_)
            | BookingError::EventStoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            let source = std::error::Error::source(&self.0)
                .map(ToString::to_string)
                .unwrap_or_default();
            tracing::error!(code = self.0.code(), %source, "{}", self.0);
            ErrorResponse::new(self.0.code(), "An unexpected error occurred")
        } else {
            ErrorResponse::new(self.0.code(), self.0.to_string()).with_field(self.0.field())
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PostId, PostStatus, ReservationId};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BookingError::PostNotFound(PostId::new()), StatusCode::NOT_FOUND),
            (
                BookingError::ReservationNotFound(ReservationId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                BookingError::PostUnavailable {
                    post_id: PostId::new(),
                    status: PostStatus::Taken,
                },
                StatusCode::CONFLICT,
            ),
            (
                BookingError::MissingRequiredField("CIN"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (BookingError::DeadlineExceeded, StatusCode::REQUEST_TIMEOUT),
            (
                BookingError::LedgerError("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
