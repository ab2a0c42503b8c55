/// 경매 진행 단계 판정
/// 벽시계 시각과 마감 플래그만으로 결정되는 순수 함수
// region:    --- Imports
use crate::auction::model::Auction;
use chrono::{DateTime, Utc};
use serde::Serialize;

// endregion: --- Imports

// region:    --- Auction Phase

/// 경매 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuctionPhase {
    /// 시작 전
    Upcoming,
    /// 입찰 가능
    Live,
    /// 종료(시간 경과 또는 마감 처리)
    Ended,
}

/// 주어진 시각 기준으로 경매 단계를 판정
pub fn phase_of(auction: &Auction, now: DateTime<Utc>) -> AuctionPhase {
    if auction.is_closed || now > auction.end_time {
        AuctionPhase::Ended
    } else if now < auction.start_time {
        AuctionPhase::Upcoming
    } else {
        AuctionPhase::Live
    }
}

// endregion: --- Auction Phase

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auction_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Auction {
        Auction {
            id: 1,
            seller_id: 10,
            title: "단계 판정 테스트".to_string(),
            base_price: 10000,
            current_price: 10000,
            min_increment: 1000,
            max_increment: None,
            start_time: start,
            end_time: end,
            is_closed: false,
            winner_id: None,
            created_at: start,
        }
    }

    /// 시작 전에는 Upcoming
    #[test]
    fn test_upcoming_before_start() {
        let now = Utc::now();
        let auction = auction_between(now + Duration::hours(1), now + Duration::hours(2));
        assert_eq!(phase_of(&auction, now), AuctionPhase::Upcoming);
    }

    /// 진행 중에는 Live (시작 시각 정각 포함)
    #[test]
    fn test_live_within_window() {
        let now = Utc::now();
        let auction = auction_between(now - Duration::hours(1), now + Duration::hours(1));
        assert_eq!(phase_of(&auction, now), AuctionPhase::Live);

        let at_start = auction_between(now, now + Duration::hours(1));
        assert_eq!(phase_of(&at_start, now), AuctionPhase::Live);
    }

    /// 종료 시각이 지나면 Ended
    #[test]
    fn test_ended_after_end_time() {
        let now = Utc::now();
        let auction = auction_between(now - Duration::hours(2), now - Duration::hours(1));
        assert_eq!(phase_of(&auction, now), AuctionPhase::Ended);
    }

    /// 마감 플래그가 서면 시간과 무관하게 Ended
    #[test]
    fn test_closed_flag_overrides_window() {
        let now = Utc::now();
        let mut auction = auction_between(now - Duration::hours(1), now + Duration::hours(1));
        auction.is_closed = true;
        assert_eq!(phase_of(&auction, now), AuctionPhase::Ended);
    }
}

// endregion: --- Tests
