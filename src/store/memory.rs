/// 인메모리 저장소
/// Postgres 없이 CAS 계약을 그대로 제공한다. 테스트에서 프로토콜과
/// 브로드캐스트 경로를 격리 검증하는 용도.
// region:    --- Imports
use crate::auction::model::{Auction, Bid};
use crate::bidding::validator::BidProposal;
use crate::store::{AuctionSnapshot, AuctionStore, CommitOutcome, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

// endregion: --- Imports

// region:    --- Memory Store

struct AuctionRecord {
    auction: Auction,
    bids: Vec<Bid>,
}

#[derive(Default)]
pub struct MemoryAuctionStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    auctions: HashMap<i64, AuctionRecord>,
    next_bid_id: i64,
}

impl MemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 경매 등록 (테스트 픽스처용)
    pub async fn insert_auction(&self, auction: Auction) {
        let mut inner = self.inner.lock().await;
        inner.auctions.insert(
            auction.id,
            AuctionRecord {
                auction,
                bids: Vec::new(),
            },
        );
    }

    /// 현재 경매 상태 조회
    pub async fn auction(&self, auction_id: i64) -> Option<Auction> {
        let inner = self.inner.lock().await;
        inner.auctions.get(&auction_id).map(|r| r.auction.clone())
    }

    /// 커밋 순서 그대로의 입찰 로그
    pub async fn bids_of(&self, auction_id: i64) -> Vec<Bid> {
        let inner = self.inner.lock().await;
        inner
            .auctions
            .get(&auction_id)
            .map(|r| r.bids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuctionStore for MemoryAuctionStore {
    async fn load_snapshot(&self, auction_id: i64) -> Result<Option<AuctionSnapshot>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.auctions.get(&auction_id).map(|record| {
            let latest_bid = record
                .bids
                .iter()
                .max_by_key(|b| (b.amount, std::cmp::Reverse(b.id)))
                .cloned();
            AuctionSnapshot {
                auction: record.auction.clone(),
                latest_bid,
            }
        }))
    }

    async fn commit_bid(
        &self,
        proposal: &BidProposal,
        expected_price: i64,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let Inner {
            auctions,
            next_bid_id,
        } = &mut *inner;

        let record = auctions
            .get_mut(&proposal.auction_id)
            .ok_or_else(|| StoreError::Unavailable("존재하지 않는 경매".to_string()))?;

        // CAS 가드: 읽었던 가격에서 변했거나 그새 마감됐으면 커밋하지 않는다
        if record.auction.is_closed || record.auction.current_price != expected_price {
            return Ok(CommitOutcome::Conflict);
        }

        // 커밋이 확정된 뒤에만 id를 소비해 로그와 id가 연속되게 유지한다
        *next_bid_id += 1;
        let bid = Bid {
            id: *next_bid_id,
            auction_id: proposal.auction_id,
            bidder_id: proposal.bidder_id,
            amount: proposal.amount,
            created_at: now,
        };
        record.auction.current_price = proposal.amount;
        record.bids.push(bid.clone());

        Ok(CommitOutcome::Committed(bid))
    }
}

// endregion: --- Memory Store
