/// 입찰 승인 프로토콜
/// 스냅샷 조회 -> 검증 -> 조건부 커밋 -> 경합 시 제한 재시도.
/// 동시성 정합성은 전부 여기서 책임진다: 두 입찰자가 경합하면
/// CAS에서 정확히 한 쪽만 이기고, 진 쪽은 새 가격 기준으로 재검증된다.
// region:    --- Imports
use crate::auction::model::Bid;
use crate::bidding::error::BidError;
use crate::bidding::validator::{self, BidProposal};
use crate::realtime::broadcaster::{RealtimeBroadcaster, RealtimeEvent};
use crate::store::{AuctionStore, CommitOutcome};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Admission Protocol

/// 경합 시 조건부 커밋 최대 시도 횟수.
/// 한도를 넘으면 무한 스핀 대신 Conflict를 반환해 호출자가 재시도하게 한다.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// 수락된 입찰 결과
#[derive(Debug, Clone, Serialize)]
pub struct BidAccepted {
    pub bid: Bid,
    pub new_current_price: i64,
}

/// 입찰 승인 프로토콜. 저장소 핸들은 생성 시점에 명시적으로 주입받는다.
pub struct BidAdmissionProtocol<S: AuctionStore> {
    store: Arc<S>,
    broadcaster: Arc<RealtimeBroadcaster>,
}

impl<S: AuctionStore> BidAdmissionProtocol<S> {
    pub fn new(store: Arc<S>, broadcaster: Arc<RealtimeBroadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// 입찰 한 건 처리.
    /// 검증 거절과 미존재는 즉시 반환하고, CAS 경합만 내부에서 재시도한다.
    /// 저장소 장애는 재시도 없이 그대로 전파한다.
    pub async fn submit(&self, proposal: BidProposal) -> Result<BidAccepted, BidError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let snapshot = self
                .store
                .load_snapshot(proposal.auction_id)
                .await?
                .ok_or(BidError::AuctionNotFound(proposal.auction_id))?;

            let now = Utc::now();
            // 재시도마다 새 스냅샷으로 전체 규칙을 다시 평가한다
            validator::validate(
                &snapshot.auction,
                snapshot.latest_bid.as_ref(),
                &proposal,
                now,
            )
            .map_err(BidError::Rejected)?;

            let observed_price = snapshot.auction.current_price;
            match self.store.commit_bid(&proposal, observed_price, now).await? {
                CommitOutcome::Committed(bid) => {
                    info!(
                        "{:<12} --> 입찰 수락: 경매 {} 입찰자 {} 금액 {} (시도 {})",
                        "Admission", proposal.auction_id, proposal.bidder_id, bid.amount, attempt
                    );
                    let accepted = BidAccepted {
                        new_current_price: bid.amount,
                        bid,
                    };
                    // 전파는 fire-and-forget: 제출자 응답을 막지 않는다
                    self.broadcaster.publish(
                        proposal.auction_id,
                        RealtimeEvent::BidCommitted {
                            auction_id: proposal.auction_id,
                            bid: accepted.bid.clone(),
                            new_current_price: accepted.new_current_price,
                        },
                    );
                    return Ok(accepted);
                }
                CommitOutcome::Conflict => {
                    // 다른 입찰자가 먼저 가격을 갱신했다
                    warn!(
                        "{:<12} --> 낙관적 커밋 경합: 경매 {} (시도 {}/{})",
                        "Admission", proposal.auction_id, attempt, MAX_COMMIT_ATTEMPTS
                    );
                    continue;
                }
            }
        }

        Err(BidError::Conflict)
    }
}

// endregion: --- Admission Protocol
