/// 입찰 검증기
/// 스냅샷 + 제안 + 현재 시각만 보고 수락/거절을 결정하는 순수 함수.
/// 부수 효과가 없어 admission의 재시도 루프 안에서 반복 실행해도 안전하다.
// region:    --- Imports
use crate::auction::lifecycle::{phase_of, AuctionPhase};
use crate::auction::model::{Auction, Bid};
use crate::bidding::error::RejectReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Bid Proposal

/// 입찰 제안. bidder_id는 인증 계층이 이미 신뢰 가능한 값으로 채웠다고 가정한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidProposal {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
}

// endregion: --- Bid Proposal

// region:    --- Validator

/// 입찰 검증. 규칙은 순서대로 평가하며 먼저 실패한 규칙이 거절 사유가 된다.
/// 1. Live 단계가 아니면 NotLive
/// 2. 판매자 본인이면 SelfBid
/// 3. 최고 입찰자 본인이면 ConsecutiveBid
/// 4. (최고 입찰가 또는 시작가) + 최소 증가폭 미만이면 BelowMinimum
/// 5. 증가폭이 max_increment를 넘으면 AboveMaximum
pub fn validate(
    auction: &Auction,
    latest_bid: Option<&Bid>,
    proposal: &BidProposal,
    now: DateTime<Utc>,
) -> Result<(), RejectReason> {
    match phase_of(auction, now) {
        AuctionPhase::Upcoming => {
            return Err(RejectReason::NotLive {
                detail: "경매가 아직 시작되지 않았습니다.",
            })
        }
        AuctionPhase::Ended => {
            return Err(RejectReason::NotLive {
                detail: "경매가 이미 종료되었습니다.",
            })
        }
        AuctionPhase::Live => {}
    }

    if auction.seller_id == proposal.bidder_id {
        return Err(RejectReason::SelfBid);
    }

    if let Some(latest) = latest_bid {
        if latest.bidder_id == proposal.bidder_id {
            return Err(RejectReason::ConsecutiveBid);
        }
    }

    // 입찰이 없으면 시작가 기준
    let reference = latest_bid.map_or(auction.base_price, |b| b.amount);

    let floor = reference + auction.min_increment;
    if proposal.amount < floor {
        return Err(RejectReason::BelowMinimum { floor });
    }

    if let Some(max_increment) = auction.max_increment {
        if proposal.amount - reference > max_increment {
            return Err(RejectReason::AboveMaximum {
                ceiling: reference + max_increment,
            });
        }
    }

    Ok(())
}

// endregion: --- Validator

// region:    --- Tests


// endregion: --- Tests
