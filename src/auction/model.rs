use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub base_price: i64,
    pub current_price: i64,
    pub min_increment: i64,
    pub max_increment: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_closed: bool,
    pub winner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델
// 생성 이후 수정/삭제되지 않는다
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}
