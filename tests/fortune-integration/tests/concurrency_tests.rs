use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fortune_common::LedgerError;
use fortune_integration::harness::TestHarness;
use fortune_integration::pid;
use fortune_router::{FortuneRequest, FortuneResponse};

async fn seeded(n: usize) -> TestHarness {
    let h = TestHarness::setup();
    for i in 0..n {
        h.ok("admin", &format!("!fortune add fortune number {i}")).await;
    }
    h
}

/// More participants than fortunes, all drawing at once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_draws_never_share_a_fortune() {
    let h = seeded(25).await;

    let mut tasks = Vec::new();
    for i in 0..40 {
        let service = h.service.clone();
        tasks.push(tokio::spawn(async move {
            service.handle(&pid(&format!("user{i}")), FortuneRequest::Random).await
        }));
    }

    let mut drawn = Vec::new();
    let mut exhausted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(FortuneResponse::Drawn(f)) => drawn.push(f),
            Err(LedgerError::PoolExhausted) => exhausted += 1,
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert_eq!(drawn.len(), 25);
    assert_eq!(exhausted, 15);

    let ids: HashSet<_> = drawn.iter().map(|f| f.id.clone()).collect();
    assert_eq!(ids.len(), 25);
    let openers: HashSet<_> = drawn.iter().filter_map(|f| f.opened_by().cloned()).collect();
    assert_eq!(openers.len(), 25);

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.opened_count(), 25);
    assert_eq!(snapshot.participants.len(), 25);
    assert_eq!(h.courier().delivered().len(), 25);
    assert_eq!(h.on_disk(), snapshot);
}

/// The same participant racing themselves wins exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_participant_racing_draws_once() {
    let h = seeded(10).await;
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let service = h.service.clone();
        tasks.push(tokio::spawn(async move {
            service.handle(&pid("eager"), FortuneRequest::Random).await
        }));
    }
    let mut wins = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(FortuneResponse::Drawn(_)) => wins += 1,
            Err(LedgerError::AlreadyParticipated(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(h.snapshot().await.opened_count(), 1);
}

/// Readers running alongside draws, some of which fail delivery and roll
/// back, always see opened fortunes and participants in step.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_a_half_finished_draw() {
    let h = seeded(30).await;
    for i in (0..30).step_by(3) {
        h.courier().close_dms(&pid(&format!("user{i}")));
    }

    let done = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..3 {
        let service = h.service.clone();
        let done = done.clone();
        readers.push(tokio::spawn(async move {
            let mut observed = 0usize;
            while !done.load(Ordering::SeqCst) {
                let snapshot = service.snapshot().await;
                assert_eq!(snapshot.opened_count(), snapshot.participants.len());
                for f in snapshot.fortunes.iter().filter(|f| f.is_opened()) {
                    let opener = f.opened_by().unwrap();
                    assert!(snapshot.participants.contains(opener));
                    assert!(f.opened_at().is_some());
                }
                observed += 1;
                tokio::task::yield_now().await;
            }
            observed
        }));
    }

    let mut writers = Vec::new();
    for i in 0..30 {
        let service = h.service.clone();
        writers.push(tokio::spawn(async move {
            service.handle(&pid(&format!("user{i}")), FortuneRequest::Random).await
        }));
    }
    let mut failed = 0;
    for w in writers {
        if let Err(e) = w.await.unwrap() {
            assert!(matches!(e, LedgerError::DeliveryFailed(_)), "{e}");
            failed += 1;
        }
    }
    done.store(true, Ordering::SeqCst);
    for r in readers {
        assert!(r.await.unwrap() > 0);
    }

    assert_eq!(failed, 10);
    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.opened_count(), 20);
    assert_eq!(snapshot.unopened_count(), 10);
}
