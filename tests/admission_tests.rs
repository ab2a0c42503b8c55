/// 입찰 승인 프로토콜 테스트
/// 인메모리 저장소로 Postgres 없이 검증 규칙, CAS 경합, 재시도 한도,
/// 커밋-브로드캐스트 연동을 격리 검증한다.
use auction_bid_engine::auction::model::Auction;
use auction_bid_engine::bidding::admission::BidAdmissionProtocol;
use auction_bid_engine::bidding::error::{BidError, RejectReason};
use auction_bid_engine::bidding::validator::BidProposal;
use auction_bid_engine::realtime::broadcaster::{RealtimeBroadcaster, RealtimeEvent};
use auction_bid_engine::realtime::registry::SubscriptionRegistry;
use auction_bid_engine::store::memory::MemoryAuctionStore;
use auction_bid_engine::store::{AuctionStore, CommitOutcome, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const SELLER: i64 = 10;
const BIDDER_A: i64 = 1;
const BIDDER_B: i64 = 2;

fn live_auction(id: i64) -> Auction {
    let now = Utc::now();
    Auction {
        id,
        seller_id: SELLER,
        title: format!("테스트 경매 {}", id),
        base_price: 100,
        current_price: 100,
        min_increment: 10,
        max_increment: None,
        start_time: now - Duration::hours(1),
        end_time: now + Duration::hours(1),
        is_closed: false,
        winner_id: None,
        created_at: now - Duration::hours(2),
    }
}

fn proposal(auction_id: i64, bidder_id: i64, amount: i64) -> BidProposal {
    BidProposal {
        auction_id,
        bidder_id,
        amount,
    }
}

struct Harness {
    store: Arc<MemoryAuctionStore>,
    registry: Arc<SubscriptionRegistry>,
    broadcaster: Arc<RealtimeBroadcaster>,
    admission: BidAdmissionProtocol<MemoryAuctionStore>,
}

async fn harness(auctions: Vec<Auction>) -> Harness {
    let store = Arc::new(MemoryAuctionStore::new());
    for auction in auctions {
        store.insert_auction(auction).await;
    }
    let registry = Arc::new(SubscriptionRegistry::new());
    let broadcaster = Arc::new(RealtimeBroadcaster::new(Arc::clone(&registry)));
    let admission = BidAdmissionProtocol::new(Arc::clone(&store), Arc::clone(&broadcaster));
    Harness {
        store,
        registry,
        broadcaster,
        admission,
    }
}

/// 명세 시나리오: 수락 / 연속 입찰 거절 / 하한 미달 거절 / 새 기준으로 수락
#[tokio::test]
async fn test_basic_bidding_scenario() {
    let h = harness(vec![live_auction(1)]).await;

    // A 110 → 수락, 가격 110
    let accepted = h.admission.submit(proposal(1, BIDDER_A, 110)).await.unwrap();
    assert_eq!(accepted.new_current_price, 110);
    assert_eq!(h.store.auction(1).await.unwrap().current_price, 110);

    // A 120 → 연속 입찰 거절
    let err = h.admission.submit(proposal(1, BIDDER_A, 120)).await;
    assert!(matches!(
        err,
        Err(BidError::Rejected(RejectReason::ConsecutiveBid))
    ));

    // B 115 → 하한(120) 미달 거절
    let err = h.admission.submit(proposal(1, BIDDER_B, 115)).await;
    assert!(matches!(
        err,
        Err(BidError::Rejected(RejectReason::BelowMinimum { floor: 120 }))
    ));

    // B 120 → 수락, 가격 120 (경계 포함)
    let accepted = h.admission.submit(proposal(1, BIDDER_B, 120)).await.unwrap();
    assert_eq!(accepted.new_current_price, 120);
    assert_eq!(h.store.auction(1).await.unwrap().current_price, 120);
}

/// 명세 시나리오: max_increment 상한 (경계 포함)
#[tokio::test]
async fn test_max_increment_scenario() {
    let mut auction = live_auction(1);
    auction.max_increment = Some(15);
    let h = harness(vec![auction]).await;

    h.admission.submit(proposal(1, BIDDER_A, 110)).await.unwrap();
    h.admission.submit(proposal(1, BIDDER_B, 120)).await.unwrap();

    // 136 - 120 = 16 > 15 → 거절
    let err = h.admission.submit(proposal(1, BIDDER_A, 136)).await;
    assert!(matches!(
        err,
        Err(BidError::Rejected(RejectReason::AboveMaximum { ceiling: 135 }))
    ));

    // 135 - 120 = 15 → 수락
    let accepted = h.admission.submit(proposal(1, BIDDER_A, 135)).await.unwrap();
    assert_eq!(accepted.new_current_price, 135);
}

/// 시작 전 경매는 금액과 무관하게 NotLive
#[tokio::test]
async fn test_rejects_upcoming_auction() {
    let mut auction = live_auction(1);
    auction.start_time = Utc::now() + Duration::hours(1);
    auction.end_time = Utc::now() + Duration::hours(2);
    let h = harness(vec![auction]).await;

    let err = h.admission.submit(proposal(1, BIDDER_A, 1_000_000)).await;
    assert!(matches!(
        err,
        Err(BidError::Rejected(RejectReason::NotLive { .. }))
    ));
}

/// 판매자 본인 입찰은 SelfBid
#[tokio::test]
async fn test_rejects_seller_bid() {
    let h = harness(vec![live_auction(1)]).await;

    let err = h.admission.submit(proposal(1, SELLER, 110)).await;
    assert!(matches!(err, Err(BidError::Rejected(RejectReason::SelfBid))));
}

/// 존재하지 않는 경매는 NotFound
#[tokio::test]
async fn test_unknown_auction_is_not_found() {
    let h = harness(vec![]).await;

    let err = h.admission.submit(proposal(99, BIDDER_A, 110)).await;
    assert!(matches!(err, Err(BidError::AuctionNotFound(99))));
}

/// 가격 단조 증가: 커밋된 입찰 로그의 금액은 순서대로 강증가한다
#[tokio::test]
async fn test_price_is_strictly_increasing() {
    let h = harness(vec![live_auction(1)]).await;

    let mut amount = 100;
    for round in 0..10 {
        amount += 10 + round;
        let bidder = if round % 2 == 0 { BIDDER_A } else { BIDDER_B };
        h.admission
            .submit(proposal(1, bidder, amount))
            .await
            .unwrap();
    }

    let bids = h.store.bids_of(1).await;
    assert_eq!(bids.len(), 10);
    for pair in bids.windows(2) {
        assert!(pair[1].amount > pair[0].amount);
    }
    assert_eq!(h.store.auction(1).await.unwrap().current_price, amount);
}

/// 경합 해소: 같은 스냅샷을 본 두 제안 중 정확히 하나만 수락된다
#[tokio::test]
async fn test_concurrent_bids_admit_exactly_one() {
    let h = harness(vec![live_auction(1)]).await;
    let admission = Arc::new(h.admission);

    let a = {
        let admission = Arc::clone(&admission);
        tokio::spawn(async move { admission.submit(proposal(1, BIDDER_A, 110)).await })
    };
    let b = {
        let admission = Arc::clone(&admission);
        tokio::spawn(async move { admission.submit(proposal(1, BIDDER_B, 110)).await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let accepted = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(accepted, 1, "경합하는 동액 입찰은 정확히 하나만 수락되어야 한다");

    // 진 쪽은 승자의 새 가격 기준으로 하한 미달 거절된다
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser,
        Err(BidError::Rejected(RejectReason::BelowMinimum { floor: 120 }))
    ));

    assert_eq!(h.store.auction(1).await.unwrap().current_price, 110);
    assert_eq!(h.store.bids_of(1).await.len(), 1);
}

/// CAS 계약: 읽었던 가격에서 변했으면 커밋되지 않는다
#[tokio::test]
async fn test_stale_expected_price_conflicts() {
    let store = MemoryAuctionStore::new();
    store.insert_auction(live_auction(1)).await;

    let stale = store
        .commit_bid(&proposal(1, BIDDER_A, 110), 90, Utc::now())
        .await
        .unwrap();
    assert!(matches!(stale, CommitOutcome::Conflict));
    assert_eq!(store.auction(1).await.unwrap().current_price, 100);

    let fresh = store
        .commit_bid(&proposal(1, BIDDER_A, 110), 100, Utc::now())
        .await
        .unwrap();
    assert!(matches!(fresh, CommitOutcome::Committed(_)));
}

/// 항상 경합하는 저장소: 재시도 한도만큼 시도한 뒤 Conflict를 돌려준다
struct AlwaysConflictingStore {
    inner: MemoryAuctionStore,
    commit_attempts: AtomicU32,
}

#[async_trait]
impl AuctionStore for AlwaysConflictingStore {
    async fn load_snapshot(
        &self,
        auction_id: i64,
    ) -> Result<Option<auction_bid_engine::store::AuctionSnapshot>, StoreError> {
        self.inner.load_snapshot(auction_id).await
    }

    async fn commit_bid(
        &self,
        _proposal: &BidProposal,
        _expected_price: i64,
        _now: DateTime<Utc>,
    ) -> Result<CommitOutcome, StoreError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        Ok(CommitOutcome::Conflict)
    }
}

/// 재시도 한도 소진 → Conflict 오류 (무한 스핀 금지)
#[tokio::test]
async fn test_retry_bound_exhaustion_surfaces_conflict() {
    let store = AlwaysConflictingStore {
        inner: MemoryAuctionStore::new(),
        commit_attempts: AtomicU32::new(0),
    };
    store.inner.insert_auction(live_auction(1)).await;
    let store = Arc::new(store);

    let registry = Arc::new(SubscriptionRegistry::new());
    let broadcaster = Arc::new(RealtimeBroadcaster::new(registry));
    let admission = BidAdmissionProtocol::new(Arc::clone(&store), broadcaster);

    let err = admission.submit(proposal(1, BIDDER_A, 110)).await;
    assert!(matches!(err, Err(BidError::Conflict)));
    assert_eq!(store.commit_attempts.load(Ordering::SeqCst), 5);
}

/// 장애 나는 저장소: 커밋이 인프라 오류로 실패하는 상황
struct UnavailableStore {
    inner: MemoryAuctionStore,
    commit_attempts: AtomicU32,
}

#[async_trait]
impl AuctionStore for UnavailableStore {
    async fn load_snapshot(
        &self,
        auction_id: i64,
    ) -> Result<Option<auction_bid_engine::store::AuctionSnapshot>, StoreError> {
        self.inner.load_snapshot(auction_id).await
    }

    async fn commit_bid(
        &self,
        _proposal: &BidProposal,
        _expected_price: i64,
        _now: DateTime<Utc>,
    ) -> Result<CommitOutcome, StoreError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("저장소 접속 불가".to_string()))
    }
}

/// 저장소 장애는 경합과 달리 재시도 없이 한 번 만에 그대로 전파된다
#[tokio::test]
async fn test_storage_fault_is_terminal_and_not_retried() {
    let store = UnavailableStore {
        inner: MemoryAuctionStore::new(),
        commit_attempts: AtomicU32::new(0),
    };
    store.inner.insert_auction(live_auction(1)).await;
    let store = Arc::new(store);

    let registry = Arc::new(SubscriptionRegistry::new());
    let broadcaster = Arc::new(RealtimeBroadcaster::new(registry));
    let admission = BidAdmissionProtocol::new(Arc::clone(&store), broadcaster);

    let err = admission.submit(proposal(1, BIDDER_A, 110)).await;
    assert!(matches!(
        err,
        Err(BidError::Storage(StoreError::Unavailable(_)))
    ));
    assert_eq!(store.commit_attempts.load(Ordering::SeqCst), 1);
}

/// 검증과 커밋 사이에 마감된 경매에는 기대 가격이 맞아도 커밋되지 않는다
#[tokio::test]
async fn test_cas_refuses_closed_auction() {
    let store = MemoryAuctionStore::new();
    let mut auction = live_auction(1);
    auction.is_closed = true;
    store.insert_auction(auction).await;

    let outcome = store
        .commit_bid(&proposal(1, BIDDER_A, 110), 100, Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, CommitOutcome::Conflict));
    assert!(store.bids_of(1).await.is_empty());
    assert_eq!(store.auction(1).await.unwrap().current_price, 100);
}

/// 실패한 커밋 시도는 입찰 id를 소비하지 않는다
#[tokio::test]
async fn test_failed_commits_do_not_burn_bid_ids() {
    let store = MemoryAuctionStore::new();
    store.insert_auction(live_auction(1)).await;

    // 낡은 기대 가격 → 경합으로 거부
    let stale = store
        .commit_bid(&proposal(1, BIDDER_A, 110), 90, Utc::now())
        .await
        .unwrap();
    assert!(matches!(stale, CommitOutcome::Conflict));

    // 첫 커밋의 id는 1부터 연속으로 붙는다
    match store
        .commit_bid(&proposal(1, BIDDER_A, 110), 100, Utc::now())
        .await
        .unwrap()
    {
        CommitOutcome::Committed(bid) => assert_eq!(bid.id, 1),
        other => panic!("커밋이 거부되었다: {:?}", other),
    }
}

/// 멱등 재제출: Conflict 후 동일 요청을 다시 내면 신규 제출과 같은 결정을 받는다
#[tokio::test]
async fn test_conflicted_resubmission_matches_fresh_decision() {
    let h = harness(vec![live_auction(1)]).await;

    // 먼저 다른 입찰자가 가격을 120으로 올렸다고 하자
    h.admission.submit(proposal(1, BIDDER_B, 120)).await.unwrap();

    // 동일 제안의 재제출과 신규 제출은 같은 결정
    let resubmitted = h.admission.submit(proposal(1, BIDDER_A, 125)).await;
    assert!(matches!(
        resubmitted,
        Err(BidError::Rejected(RejectReason::BelowMinimum { floor: 130 }))
    ));
    let fresh = h.admission.submit(proposal(1, BIDDER_A, 130)).await;
    assert!(fresh.is_ok());
}

/// 수락된 입찰은 구독 중인 연결로 전파되고, 구독하지 않은 경매는 조용하다
#[tokio::test]
async fn test_accepted_bid_is_fanned_out_to_watchers() {
    let h = harness(vec![live_auction(1), live_auction(2)]).await;

    let conn = Uuid::new_v4();
    let mut events = h.broadcaster.register(conn);
    h.registry.join(conn, 1);

    h.admission.submit(proposal(1, BIDDER_A, 110)).await.unwrap();
    h.admission.submit(proposal(2, BIDDER_A, 110)).await.unwrap();

    match events.recv().await {
        Some(RealtimeEvent::BidCommitted {
            auction_id,
            bid,
            new_current_price,
        }) => {
            assert_eq!(auction_id, 1);
            assert_eq!(bid.bidder_id, BIDDER_A);
            assert_eq!(new_current_price, 110);
        }
        other => panic!("예상치 못한 이벤트: {:?}", other),
    }
    // 경매 2의 커밋은 구독하지 않았으므로 오지 않는다
    assert!(events.try_recv().is_err());
}

/// 거절된 입찰은 어떤 이벤트도 전파하지 않는다
#[tokio::test]
async fn test_rejected_bid_is_not_broadcast() {
    let h = harness(vec![live_auction(1)]).await;

    let conn = Uuid::new_v4();
    let mut events = h.broadcaster.register(conn);
    h.registry.join(conn, 1);

    let err = h.admission.submit(proposal(1, SELLER, 110)).await;
    assert!(err.is_err());
    assert!(events.try_recv().is_err());
}
