//! Multi-process coordination, simulated in one process.
//!
//! Several "server processes" share the same backends the way real ones
//! share Redis: each gets its own candidate cache, prune listener, and
//! claim coordinator, and they may only communicate through the backend
//! traits.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use trionfi_coord::{
    keys, spawn_duel_workers, spawn_prune_listener, CandidateCache, ClaimCoordinator,
    DrawConfig, DrawEngine, DuelQueue, DuelResult, DuelTicket, EventBus, GameStore, HandStore,
    LedgerClaimCoordinator, MemoryBus, MemoryLedger, MemoryStore,
};
use trionfi_core::Catalog;

struct SimulatedProcess {
    server_id: String,
    cache: Arc<CandidateCache>,
    claims: Arc<dyn ClaimCoordinator>,
}

fn spawn_process(
    name: &str,
    catalog: &Catalog,
    ledger: &Arc<MemoryLedger>,
    store: &Arc<MemoryStore>,
    bus: &Arc<MemoryBus>,
    shutdown: &broadcast::Sender<()>,
) -> SimulatedProcess {
    let cache = Arc::new(CandidateCache::from_catalog(catalog));
    let bus_dyn: Arc<dyn EventBus> = bus.clone();
    spawn_prune_listener(bus_dyn, cache.clone(), shutdown.subscribe());

    let claims: Arc<dyn ClaimCoordinator> = Arc::new(LedgerClaimCoordinator::new(
        ledger.clone(),
        store.clone(),
        bus.clone(),
        name,
    ));

    SimulatedProcess {
        server_id: name.to_string(),
        cache,
        claims,
    }
}

#[tokio::test]
async fn each_rare_is_granted_exactly_once_across_processes() {
    let catalog = Catalog::standard();
    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(MemoryBus::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let processes: Vec<_> = (0..8)
        .map(|i| {
            spawn_process(
                &format!("srv-{}", i),
                &catalog,
                &ledger,
                &store,
                &bus,
                &shutdown_tx,
            )
        })
        .collect();

    // Every process races for every rare on behalf of its own player.
    let mut handles = Vec::new();
    for process in &processes {
        for rare in catalog.rares() {
            let claims = process.claims.clone();
            let player = format!("player-of-{}", process.server_id);
            let card_id = rare.id;
            handles.push(tokio::spawn(async move {
                (card_id, claims.try_claim(card_id, &player).await)
            }));
        }
    }

    let mut grants_per_card = std::collections::HashMap::new();
    for handle in handles {
        let (card_id, outcome) = handle.await.unwrap();
        if outcome.is_granted() {
            *grants_per_card.entry(card_id).or_insert(0u32) += 1;
        }
    }

    // All 15 rares were contended by 8 processes; each granted exactly once.
    assert_eq!(grants_per_card.len(), catalog.rares().len());
    assert!(grants_per_card.values().all(|&n| n == 1));

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn a_win_on_one_process_prunes_the_others() {
    let catalog = Catalog::standard();
    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(MemoryBus::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let winner = spawn_process("srv-a", &catalog, &ledger, &store, &bus, &shutdown_tx);
    let observer = spawn_process("srv-b", &catalog, &ledger, &store, &bus, &shutdown_tx);

    // Let both listeners subscribe first.
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(winner.claims.try_claim(107, "p1").await.is_granted());

    for _ in 0..100 {
        if !observer.cache.candidate_ids().contains(&107) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(
        !observer.cache.candidate_ids().contains(&107),
        "observer cache still lists the claimed rare"
    );

    // The observer can still attempt the stale id; the ledger denies it.
    assert!(!observer.claims.try_claim(107, "p2").await.is_granted());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn draw_duel_round_trip_across_owning_processes() {
    let catalog = Arc::new(Catalog::standard());
    let ledger = Arc::new(MemoryLedger::new());
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(MemoryBus::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let store_dyn: Arc<dyn GameStore> = store.clone();
    let bus_dyn: Arc<dyn EventBus> = bus.clone();
    let hands = HandStore::new(store_dyn.clone());

    // Two players on two different processes draw real packs.
    for (server_id, player_id) in [("srv-a", "p1"), ("srv-b", "p2")] {
        let process = spawn_process(server_id, &catalog, &ledger, &store, &bus, &shutdown_tx);
        let engine = DrawEngine::new(
            catalog.clone(),
            process.cache.clone(),
            process.claims.clone(),
            DrawConfig::default(),
        );
        let pack = engine.draw_pack(player_id).await;
        assert_eq!(pack.len(), 3);
        hands.append(player_id, &pack).await.unwrap();
    }

    // Both queue for a duel; a worker on a third process resolves it.
    let mut results_rx = bus.subscribe(keys::DUEL_RESULTS).await.unwrap();
    let queue = DuelQueue::new(store_dyn.clone());
    queue
        .enqueue(&DuelTicket {
            player_id: "p1".into(),
            server_id: "srv-a".into(),
        })
        .await
        .unwrap();
    queue
        .enqueue(&DuelTicket {
            player_id: "p2".into(),
            server_id: "srv-b".into(),
        })
        .await
        .unwrap();

    spawn_duel_workers(2, store_dyn, hands, bus_dyn, &shutdown_tx);

    let mut owners = Vec::new();
    for _ in 0..2 {
        let json = tokio::time::timeout(Duration::from_secs(2), results_rx.recv())
            .await
            .expect("duel result published")
            .unwrap();
        let result: DuelResult = serde_json::from_str(&json).unwrap();
        assert!(result.result.starts_with("Resultado do duelo: "));
        owners.push(result.owner);
    }
    owners.sort();
    assert_eq!(owners, vec!["srv-a".to_string(), "srv-b".to_string()]);

    let _ = shutdown_tx.send(());
}
