/// 입찰 처리 오류 분류
/// 거절(내용) / 미존재 / 경합(일시적) / 저장소 장애(치명적)를 구분한다
// region:    --- Imports
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Reject Reason

/// 검증 거절 사유. 요청 내용에 의해 결정되며 재시도 대상이 아니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum RejectReason {
    /// 경매가 Live 단계가 아님
    NotLive { detail: &'static str },
    /// 판매자 본인의 입찰
    SelfBid,
    /// 최고 입찰자의 연속 입찰
    ConsecutiveBid,
    /// 최소 입찰 가능 금액 미달
    BelowMinimum { floor: i64 },
    /// 최대 증가폭 초과
    AboveMaximum { ceiling: i64 },
}

// endregion: --- Reject Reason

// region:    --- Bid Error

/// 입찰 시도 한 건의 실패 유형
#[derive(Debug, Error)]
pub enum BidError {
    /// 검증 거절: 즉시 반환, 재시도 없음
    #[error("입찰이 거절되었습니다: {0:?}")]
    Rejected(RejectReason),

    /// 존재하지 않는 경매
    #[error("경매를 찾을 수 없습니다: {0}")]
    AuctionNotFound(i64),

    /// CAS 재시도 한도 초과. 동일 요청 재제출이 안전하다.
    #[error("입찰 경합으로 커밋하지 못했습니다")]
    Conflict,

    /// 저장소 장애. 검증 거절로 위장하지 않는다.
    #[error("저장소 오류: {0}")]
    Storage(#[from] StoreError),
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        match self {
            BidError::Rejected(reason) => {
                (StatusCode::BAD_REQUEST, Json(reason)).into_response()
            }
            BidError::AuctionNotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": "NOT_FOUND",
                    "message": format!("경매를 찾을 수 없습니다: {}", id)
                })),
            )
                .into_response(),
            BidError::Conflict => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": "CONFLICT",
                    "message": "입찰 경합이 심해 처리하지 못했습니다. 같은 요청을 다시 시도해주세요."
                })),
            )
                .into_response(),
            BidError::Storage(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "STORAGE",
                    "message": e.to_string()
                })),
            )
                .into_response(),
        }
    }
}

// endregion: --- Bid Error
