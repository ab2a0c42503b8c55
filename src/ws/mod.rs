/// WebSocket 유입 경로
/// watch/unwatch는 구독 레지스트리를 갱신하고, submit_bid는 REST 경로와
/// 동일한 승인 프로토콜을 거쳐 같은 응답 형태를 돌려준다.
/// 커밋 이벤트는 브로드캐스터가 넘긴 수신 채널을 통해 소켓으로 흘러나간다.
// region:    --- Imports
use crate::bidding::error::BidError;
use crate::bidding::validator::BidProposal;
use crate::realtime::registry::ConnectionId;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Client Frame

/// 클라이언트 요청 프레임
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    Watch { auction_id: i64 },
    Unwatch { auction_id: i64 },
    SubmitBid(BidProposal),
}

// endregion: --- Client Frame

// region:    --- WebSocket Handler

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!("{:<12} --> 연결 수립: {}", "WsHandler", connection_id);

    let mut events = state.broadcaster.register(connection_id);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            // 브로드캐스트 이벤트를 소켓으로 중계
            event = events.recv() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("{:<12} --> 이벤트 직렬화 실패: {:?}", "WsHandler", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            // 클라이언트 프레임 처리
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(frame) => handle_frame(&state, connection_id, frame).await,
                            Err(_) => json!({
                                "type": "error",
                                "message": "잘못된 프레임 형식입니다."
                            }),
                        };
                        if sink.send(Message::Text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong 등은 무시
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // 연결 정리: 구독 제거 후 남은 구독자에게 인원 수 갱신 전파
    info!("{:<12} --> 연결 종료: {}", "WsHandler", connection_id);
    state.broadcaster.unregister(connection_id);
    for auction_id in state.registry.drop_connection(connection_id) {
        state.broadcaster.publish_watcher_count(auction_id);
    }
}

/// 프레임 한 건 처리. 제출자에게 돌려줄 즉답 페이로드를 만든다.
async fn handle_frame(state: &AppState, connection_id: ConnectionId, frame: ClientFrame) -> Value {
    match frame {
        ClientFrame::Watch { auction_id } => {
            state.registry.join(connection_id, auction_id);
            state.broadcaster.publish_watcher_count(auction_id);
            json!({ "type": "ack", "action": "watch", "auction_id": auction_id })
        }
        ClientFrame::Unwatch { auction_id } => {
            state.registry.leave(connection_id, auction_id);
            state.broadcaster.publish_watcher_count(auction_id);
            json!({ "type": "ack", "action": "unwatch", "auction_id": auction_id })
        }
        ClientFrame::SubmitBid(proposal) => {
            info!(
                "{:<12} --> 소켓 입찰 요청: {:?} (연결 {})",
                "WsHandler", proposal, connection_id
            );
            match state.admission.submit(proposal).await {
                Ok(accepted) => json!({
                    "type": "bid_result",
                    "success": true,
                    "bid": accepted.bid,
                    "new_current_price": accepted.new_current_price
                }),
                Err(e) => bid_failure_payload(e),
            }
        }
    }
}

/// REST 경로와 동일한 실패 분류를 소켓 응답 형태로 변환
fn bid_failure_payload(error: BidError) -> Value {
    match error {
        BidError::Rejected(reason) => json!({
            "type": "bid_result",
            "success": false,
            "rejection": reason
        }),
        BidError::AuctionNotFound(id) => json!({
            "type": "bid_result",
            "success": false,
            "error": "NOT_FOUND",
            "auction_id": id
        }),
        BidError::Conflict => json!({
            "type": "bid_result",
            "success": false,
            "error": "CONFLICT",
            "message": "입찰 경합이 심해 처리하지 못했습니다. 같은 요청을 다시 시도해주세요."
        }),
        BidError::Storage(e) => {
            warn!("{:<12} --> 저장소 오류: {:?}", "WsHandler", e);
            json!({
                "type": "bid_result",
                "success": false,
                "error": "STORAGE"
            })
        }
    }
}

// endregion: --- WebSocket Handler

// region:    --- Tests


// endregion: --- Tests
