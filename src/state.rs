// region:    --- Imports
use crate::bidding::admission::BidAdmissionProtocol;
use crate::database::DatabaseManager;
use crate::realtime::broadcaster::RealtimeBroadcaster;
use crate::realtime::registry::SubscriptionRegistry;
use crate::store::PostgresAuctionStore;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- App State

/// 핸들러 공유 상태. 두 유입 경로(REST, WebSocket)가 같은
/// BidAdmissionProtocol 인스턴스를 쓰도록 여기서 묶는다.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseManager>,
    pub admission: Arc<BidAdmissionProtocol<PostgresAuctionStore>>,
    pub registry: Arc<SubscriptionRegistry>,
    pub broadcaster: Arc<RealtimeBroadcaster>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Arc::new(RealtimeBroadcaster::new(Arc::clone(&registry)));
        let store = Arc::new(PostgresAuctionStore::new(Arc::clone(&db)));
        let admission = Arc::new(BidAdmissionProtocol::new(store, Arc::clone(&broadcaster)));
        Self {
            db,
            admission,
            registry,
            broadcaster,
        }
    }
}

// endregion: --- App State
