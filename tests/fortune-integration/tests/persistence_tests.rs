use fortune_common::LedgerError;
use fortune_integration::harness::TestHarness;
use fortune_integration::pid;
use fortune_router::FortuneResponse;

/// State written by one process is what the next one loads.
#[tokio::test]
async fn restart_keeps_fortunes_and_participants() {
    let h = TestHarness::setup();
    h.ok("admin", "!fortune add one").await;
    h.ok("admin", "!fortune add two").await;
    h.ok("P", "!fortune").await;
    let before = h.snapshot().await;

    let h = h.restart();
    assert_eq!(h.snapshot().await, before);
    assert!(matches!(
        h.say("P", "!fortune").await,
        Err(LedgerError::AlreadyParticipated(_))
    ));
    let FortuneResponse::Drawn(second) = h.ok("Q", "!fortune").await else {
        panic!("expected Drawn");
    };
    assert!(!before
        .fortunes
        .iter()
        .any(|f| f.id == second.id && f.is_opened()));
}

#[tokio::test]
async fn defaults_seed_only_the_first_start() {
    let h = TestHarness::setup_with_defaults(&["Good things come", "Luck is near"]);
    let texts: Vec<String> = h.snapshot().await.fortunes.into_iter().map(|f| f.text).collect();
    assert_eq!(texts, vec!["Good things come", "Luck is near"]);

    h.ok("admin", "!fortune clear").await;
    let h = h.restart();
    assert!(h.snapshot().await.fortunes.is_empty());
}

#[tokio::test]
async fn every_mutation_is_on_disk_before_the_reply() {
    let h = TestHarness::setup();
    h.ok("admin", "!fortune add one").await;
    assert_eq!(h.on_disk(), h.snapshot().await);
    h.ok("admin", "!fortune add two").await;
    h.ok("admin", "!fortune shuffle").await;
    assert_eq!(h.on_disk(), h.snapshot().await);
    h.ok("P", "!fortune").await;
    assert_eq!(h.on_disk(), h.snapshot().await);
    h.ok("admin", "!fortune clean").await;
    assert_eq!(h.on_disk(), h.snapshot().await);
    h.ok("admin", "!fortune unparticipate P").await;
    assert_eq!(h.on_disk(), h.snapshot().await);
    assert!(h.on_disk().participants.is_empty());
}

/// Storage failures surface unchanged and leave memory and disk in step.
#[tokio::test]
async fn storage_outage_propagates() {
    let h = TestHarness::setup();
    h.ok("admin", "!fortune add one").await;
    let before = h.snapshot().await;

    h.set_storage_down(true);
    for text in ["!fortune add two", "!fortune", "!fortune clear", "!fortune shuffle"] {
        let err = h.say("P", text).await.unwrap_err();
        assert!(err.is_fatal(), "{text}: {err}");
        assert!(matches!(err, LedgerError::Storage(_)));
    }
    assert_eq!(h.snapshot().await, before);
    assert_eq!(h.on_disk(), before);
    assert!(h.courier().delivered().is_empty());

    h.set_storage_down(false);
    h.ok("P", "!fortune").await;
    assert!(h.snapshot().await.participants.contains(&pid("P")));
}
