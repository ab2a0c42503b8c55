// region:    --- Imports
use super::queries;
use crate::auction::model::{Auction, Bid};
use crate::database::DatabaseManager;
use chrono::Utc;
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 경매 조회
pub async fn get_all_auctions(db_manager: &DatabaseManager) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 모든 경매 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 진행 중 경매 조회
pub async fn get_live_auctions(db_manager: &DatabaseManager) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 진행 중 경매 조회", "Query");
    let now = Utc::now();
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_LIVE_AUCTIONS)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 시작 전 경매 조회
pub async fn get_upcoming_auctions(
    db_manager: &DatabaseManager,
) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 시작 전 경매 조회", "Query");
    let now = Utc::now();
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_UPCOMING_AUCTIONS)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 이력 조회
pub async fn get_bid_history(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 최고 입찰가 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<i64>, SqlxError> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("highest_bid"))
            })
        })
        .await
}

// endregion: --- Query Handlers
