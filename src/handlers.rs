// region:    --- Imports
use crate::bidding::error::BidError;
use crate::bidding::validator::BidProposal;
use crate::query;
use crate::state::AppState;
use crate::store::StoreError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

// endregion: --- Imports

// region:    --- Command Handlers

/// 입찰 요청 처리. WebSocket 경로와 동일한 승인 프로토콜을 거친다.
pub async fn handle_submit_bid(
    State(state): State<AppState>,
    Json(proposal): Json<BidProposal>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", proposal);

    let accepted = state.admission.submit(proposal).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "bid": accepted.bid,
            "new_current_price": accepted.new_current_price
        })),
    ))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 경매 조회
pub async fn handle_get_auctions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    let auctions = query::handlers::get_all_auctions(&state.db)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(auctions))
}

/// 진행 중 경매 조회
pub async fn handle_get_live_auctions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 진행 중 경매 조회", "HandlerQuery");
    let auctions = query::handlers::get_live_auctions(&state.db)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(auctions))
}

/// 시작 전 경매 조회
pub async fn handle_get_upcoming_auctions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 시작 전 경매 조회", "HandlerQuery");
    let auctions = query::handlers::get_upcoming_auctions(&state.db)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(auctions))
}

/// 경매 상세 조회
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 경매 상세 조회 id: {}", "HandlerQuery", auction_id);
    let auction = query::handlers::get_auction(&state.db, auction_id)
        .await
        .map_err(StoreError::from)?
        .ok_or(BidError::AuctionNotFound(auction_id))?;
    Ok(Json(auction))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, BidError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    let bids = query::handlers::get_bid_history(&state.db, auction_id)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(bids))
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, BidError> {
    info!(
        "{:<12} --> 최고 입찰가 조회 id: {}",
        "HandlerQuery", auction_id
    );
    let highest = query::handlers::get_highest_bid(&state.db, auction_id)
        .await
        .map_err(StoreError::from)?;
    Ok(Json(serde_json::json!({ "highest_bid": highest })))
}

// endregion: --- Query Handlers
