/// 경매 마감 스케줄러
/// 종료 시각이 지난 경매를 마감하고 최고 입찰자를 낙찰자로 지정한다.
/// 계약: end_time 이후에만 is_closed/winner_id를 세우고,
/// current_price는 절대 건드리지 않는다 (입찰 경로의 전유물).
// region:    --- Imports
use crate::database::DatabaseManager;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Closer

const CLOSE_ENDED_AUCTIONS: &str = r#"
    UPDATE auctions
    SET is_closed = TRUE,
        winner_id = (
            SELECT bidder_id FROM bids
            WHERE bids.auction_id = auctions.id
            ORDER BY amount DESC, created_at ASC
            LIMIT 1
        )
    WHERE is_closed = FALSE AND end_time <= $1
"#;

/// 경매 마감 스케줄러
pub struct AuctionCloser {
    db: Arc<DatabaseManager>,
}

impl AuctionCloser {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// 주기 실행 시작
    pub async fn start(&self) {
        let db = Arc::clone(&self.db);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                if let Err(e) = Self::close_ended_auctions(&db).await {
                    error!("{:<12} --> 경매 마감 처리 중 오류 발생: {:?}", "Closer", e);
                }
            }
        });
    }

    /// 종료 시각이 지난 경매 마감
    async fn close_ended_auctions(db: &DatabaseManager) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        let result = sqlx::query(CLOSE_ENDED_AUCTIONS)
            .bind(now)
            .execute(db.pool())
            .await?;

        if result.rows_affected() > 0 {
            debug!(
                "{:<12} --> 경매 {}건 마감 처리",
                "Closer",
                result.rows_affected()
            );
        }

        Ok(())
    }
}

// endregion: --- Auction Closer
