/// 실시간 브로드캐스터
/// 커밋된 입찰을 해당 경매의 모든 구독 연결로 전달한다.
/// 전달은 연결별로 독립적이며, 한 연결의 실패가 다른 연결이나
/// 입찰 처리 경로에 영향을 주지 않는다.
// region:    --- Imports
use crate::auction::model::Bid;
use crate::realtime::registry::{ConnectionId, SubscriptionRegistry};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Realtime Event

/// 구독 연결로 푸시되는 이벤트
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// 입찰 커밋 확정. 모든 구독자는 경매별 커밋 순서 그대로 본다.
    BidCommitted {
        auction_id: i64,
        bid: Bid,
        new_current_price: i64,
    },
    /// 지켜보는 인원 수 변동
    WatcherCount { auction_id: i64, count: usize },
}

// endregion: --- Realtime Event

// region:    --- Broadcaster

pub struct RealtimeBroadcaster {
    registry: Arc<SubscriptionRegistry>,
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<RealtimeEvent>>,
}

impl RealtimeBroadcaster {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            registry,
            senders: DashMap::new(),
        }
    }

    /// 연결의 송신 채널 등록. 반환된 수신단을 소켓 송신 루프가 소유한다.
    pub fn register(&self, connection_id: ConnectionId) -> mpsc::UnboundedReceiver<RealtimeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(connection_id, tx);
        rx
    }

    /// 연결 해제 시 송신 채널 제거
    pub fn unregister(&self, connection_id: ConnectionId) {
        self.senders.remove(&connection_id);
    }

    /// 경매 구독자 전원에게 이벤트 전달 (fire-and-forget)
    pub fn publish(&self, auction_id: i64, event: RealtimeEvent) {
        let watchers = self.registry.watchers_of(auction_id);
        debug!(
            "{:<12} --> 경매 {} 이벤트 전파: 구독 {}건",
            "Broadcast",
            auction_id,
            watchers.len()
        );

        for connection_id in watchers {
            let Some(sender) = self.senders.get(&connection_id) else {
                // 레지스트리에는 남았지만 소켓은 이미 끊긴 연결
                warn!(
                    "{:<12} --> 송신 채널 없음: 연결 {}",
                    "Broadcast", connection_id
                );
                continue;
            };
            if sender.send(event.clone()).is_err() {
                // 죽은 연결은 나머지 전달에 영향을 주지 않는다
                warn!(
                    "{:<12} --> 이벤트 전달 실패 (연결 종료됨): {}",
                    "Broadcast", connection_id
                );
            }
        }
    }

    /// 현재 지켜보는 인원 수를 해당 경매 구독자 전원에게 전파
    pub fn publish_watcher_count(&self, auction_id: i64) {
        let count = self.registry.watcher_count(auction_id);
        self.publish(auction_id, RealtimeEvent::WatcherCount { auction_id, count });
    }
}

// endregion: --- Broadcaster

// region:    --- Tests


// endregion: --- Tests
