// region:    --- Imports
use auction_bid_engine::database::DatabaseManager;
use auction_bid_engine::scheduler::AuctionCloser;
use auction_bid_engine::state::AppState;
use auction_bid_engine::{handlers, ws};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성 (접속 URL은 환경에서 읽어 명시적으로 주입)
    let database_url = std::env::var("DATABASE_URL")?;
    let db_manager = Arc::new(DatabaseManager::connect(&database_url).await?);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매 마감 스케줄러 시작
    let closer = AuctionCloser::new(Arc::clone(&db_manager));
    closer.start().await;

    // 공유 상태 구성: REST와 WebSocket이 같은 승인 프로토콜을 쓴다
    let state = AppState::new(db_manager);

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_submit_bid))
        .route("/auctions", get(handlers::handle_get_auctions))
        .route("/auctions/live", get(handlers::handle_get_live_auctions))
        .route(
            "/auctions/upcoming",
            get(handlers::handle_get_upcoming_auctions),
        )
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/bids", get(handlers::handle_get_bid_history))
        .route(
            "/auctions/:id/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state);

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
