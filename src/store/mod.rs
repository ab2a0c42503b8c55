/// 경매 스냅샷 저장소
/// 전체 시스템에서 유일한 동기화 지점인 조건부 커밋(CAS)을 제공한다.
/// current_price와 입찰 로그는 오직 이 경로로만 변경된다.
// region:    --- Imports
use crate::auction::model::{Auction, Bid};
use crate::bidding::validator::BidProposal;
use crate::database::DatabaseManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod memory;

// endregion: --- Imports

// region:    --- Store Contract

/// 일관된 한 시점의 경매 상태: 경매 레코드 + 현재 최고액 입찰
#[derive(Debug, Clone)]
pub struct AuctionSnapshot {
    pub auction: Auction,
    pub latest_bid: Option<Bid>,
}

/// 조건부 커밋 결과. Conflict는 다른 입찰자가 먼저 가격을 갱신했다는 뜻이다.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed(Bid),
    Conflict,
}

/// 저장소 장애. CAS 경합(CommitOutcome::Conflict)과는 반드시 구분한다.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),
}

/// 경매 스냅샷 저장소 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매와 최고액 입찰을 일관된 시점으로 조회
    async fn load_snapshot(&self, auction_id: i64) -> Result<Option<AuctionSnapshot>, StoreError>;

    /// 조건부 커밋: current_price가 아직 expected_price일 때만
    /// 가격을 갱신하고 입찰 레코드를 추가한다. 단일 원자 연산이어야 한다.
    async fn commit_bid(
        &self,
        proposal: &BidProposal,
        expected_price: i64,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, StoreError>;
}

// endregion: --- Store Contract

// region:    --- Postgres Store

const GET_AUCTION_FOR_SNAPSHOT: &str = "SELECT id, seller_id, title, base_price, current_price, min_increment, max_increment, start_time, end_time, is_closed, winner_id, created_at FROM auctions WHERE id = $1";

const GET_TOP_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, created_at ASC
    LIMIT 1
"#;

/// CAS 가드: 읽었던 가격 그대로이고 아직 마감 전일 때만 갱신된다
const CAS_UPDATE_PRICE: &str = r#"
    UPDATE auctions SET current_price = $1
    WHERE id = $2 AND current_price = $3 AND is_closed = FALSE
    RETURNING current_price
"#;

const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, bidder_id, amount, created_at
"#;

/// Postgres 기반 저장소 구현체
pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn load_snapshot(&self, auction_id: i64) -> Result<Option<AuctionSnapshot>, StoreError> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let auction = sqlx::query_as::<_, Auction>(GET_AUCTION_FOR_SNAPSHOT)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    let Some(auction) = auction else {
                        return Ok(None);
                    };

                    let latest_bid = sqlx::query_as::<_, Bid>(GET_TOP_BID)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                    Ok(Some(AuctionSnapshot {
                        auction,
                        latest_bid,
                    }))
                })
            })
            .await
    }

    async fn commit_bid(
        &self,
        proposal: &BidProposal,
        expected_price: i64,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, StoreError> {
        let proposal = proposal.clone();
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    // 가격 갱신이 가드에 걸리면 경합 패배
                    let updated = sqlx::query_scalar::<_, i64>(CAS_UPDATE_PRICE)
                        .bind(proposal.amount)
                        .bind(proposal.auction_id)
                        .bind(expected_price)
                        .fetch_optional(&mut **tx)
                        .await?;

                    if updated.is_none() {
                        return Ok(CommitOutcome::Conflict);
                    }

                    let bid = sqlx::query_as::<_, Bid>(INSERT_BID)
                        .bind(proposal.auction_id)
                        .bind(proposal.bidder_id)
                        .bind(proposal.amount)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;

                    info!(
                        "{:<12} --> 입찰 커밋: 경매 {} 가격 {} -> {}",
                        "Store", proposal.auction_id, expected_price, proposal.amount
                    );
                    Ok(CommitOutcome::Committed(bid))
                })
            })
            .await
    }
}

// endregion: --- Postgres Store
