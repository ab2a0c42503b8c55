/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, seller_id, title, base_price, current_price, min_increment, max_increment, start_time, end_time, is_closed, winner_id, created_at FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = "SELECT id, seller_id, title, base_price, current_price, min_increment, max_increment, start_time, end_time, is_closed, winner_id, created_at FROM auctions ORDER BY end_time ASC";

/// 진행 중 경매 조회 (시작됨, 마감 전, 종료 시각 전)
pub const GET_LIVE_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, base_price, current_price, min_increment, max_increment, start_time, end_time, is_closed, winner_id, created_at
    FROM auctions
    WHERE is_closed = FALSE AND start_time <= $1 AND end_time >= $1
    ORDER BY end_time ASC
"#;

/// 시작 전 경매 조회
pub const GET_UPCOMING_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, base_price, current_price, min_increment, max_increment, start_time, end_time, is_closed, winner_id, created_at
    FROM auctions
    WHERE start_time > $1
    ORDER BY start_time ASC
"#;

/// 입찰 이력 조회 (최신순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, amount, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at DESC
"#;

/// 최고 입찰가 조회
pub const GET_HIGHEST_BID: &str =
    "SELECT MAX(amount) as highest_bid FROM bids WHERE auction_id = $1";
