/// 구독 레지스트리
/// 어떤 연결이 어떤 경매를 지켜보는지에 대한 프로세스 로컬 상태.
/// 영속화하지 않으며, 재시작 시 클라이언트가 다시 구독한다.
// region:    --- Imports
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Subscription Registry

pub type ConnectionId = Uuid;

#[derive(Default)]
pub struct SubscriptionRegistry {
    /// 경매 -> 지켜보는 연결들
    watchers: DashMap<i64, HashSet<ConnectionId>>,
    /// 연결 -> 지켜보는 경매들 (연결 종료 시 정리용 역방향 매핑)
    joined: DashMap<ConnectionId, HashSet<i64>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 경매 구독. 멱등: 이미 구독 중이면 아무 일도 일어나지 않는다.
    pub fn join(&self, connection_id: ConnectionId, auction_id: i64) {
        self.watchers
            .entry(auction_id)
            .or_default()
            .insert(connection_id);
        self.joined
            .entry(connection_id)
            .or_default()
            .insert(auction_id);
        debug!(
            "{:<12} --> 구독 등록: 연결 {} 경매 {}",
            "Registry", connection_id, auction_id
        );
    }

    /// 구독 해제. 멱등: 구독 중이 아니어도 오류가 아니다.
    pub fn leave(&self, connection_id: ConnectionId, auction_id: i64) {
        if let Some(mut watchers) = self.watchers.get_mut(&auction_id) {
            watchers.remove(&connection_id);
        }
        self.watchers
            .remove_if(&auction_id, |_, watchers| watchers.is_empty());
        if let Some(mut joined) = self.joined.get_mut(&connection_id) {
            joined.remove(&auction_id);
        }
    }

    /// 연결 종료 처리: 모든 구독을 제거하고, 빠져나간 경매 목록을 돌려준다.
    pub fn drop_connection(&self, connection_id: ConnectionId) -> Vec<i64> {
        let auction_ids: Vec<i64> = self
            .joined
            .remove(&connection_id)
            .map(|(_, set)| set.into_iter().collect())
            .unwrap_or_default();

        for auction_id in &auction_ids {
            if let Some(mut watchers) = self.watchers.get_mut(auction_id) {
                watchers.remove(&connection_id);
            }
            self.watchers
                .remove_if(auction_id, |_, watchers| watchers.is_empty());
        }
        auction_ids
    }

    /// 경매를 지켜보는 연결 목록
    pub fn watchers_of(&self, auction_id: i64) -> Vec<ConnectionId> {
        self.watchers
            .get(&auction_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 경매를 지켜보는 연결 수
    pub fn watcher_count(&self, auction_id: i64) -> usize {
        self.watchers
            .get(&auction_id)
            .map(|set| set.len())
            .unwrap_or(0)
    }
}

// endregion: --- Subscription Registry

// region:    --- Tests


// endregion: --- Tests
