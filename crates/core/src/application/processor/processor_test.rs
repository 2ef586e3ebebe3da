//! Unit tests for the command processor

use super::*;
use crate::application::ledger::{ledger_channel, shutdown_channel};
use crate::application::mirror::{ApplyOutcome, QueueMirror};
use crate::application::retry::RetryPolicy;
use crate::config::RetrySettings;
use crate::domain::{EntryStatus, PaymentMethod};
use crate::port::ledger::mocks::RecordingLedgerSink;
use crate::port::time_provider::mocks::ManualClock;
use crate::port::{InMemoryPricing, SequentialIdProvider};
use tokio::task::JoinSet;
use tokio_test::{assert_err, assert_ok};

fn processor_with(config: EngineConfig) -> (CommandProcessor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000));
    let processor = CommandProcessor::new(
        &config,
        Arc::new(InMemoryPricing::new(5000)),
        Arc::new(SequentialIdProvider::new("e")),
        clock.clone(),
    )
    .unwrap();
    (processor, clock)
}

fn processor() -> CommandProcessor {
    processor_with(EngineConfig::default()).0
}

#[tokio::test]
async fn test_full_lifecycle_and_reset() {
    let (processor, clock) = processor_with(EngineConfig::default());

    let entry = assert_ok!(processor.admit(NewEntry::new("Ana", 3)).await);
    assert_eq!(entry.id, "e-1");
    assert_eq!(entry.status, EntryStatus::Waiting);
    assert_eq!(entry.unit_price, 5000);
    assert_eq!(entry.total_price, 15000);
    assert_eq!(entry.created_at, 1_000);

    clock.advance(500);
    let entry = assert_ok!(processor.begin_service("e-1").await);
    assert_eq!(entry.status, EntryStatus::InService);
    assert_eq!(entry.service_started_at, Some(1_500));
    assert_eq!(processor.in_service().map(|e| e.id), Some("e-1".to_string()));

    clock.advance(500);
    let entry = assert_ok!(processor.complete("e-1", Some("cash")).await);
    assert_eq!(entry.status, EntryStatus::Done);
    assert_eq!(entry.payment_method, Some(PaymentMethod::Cash));
    assert_eq!(entry.finished_at, Some(2_000));
    assert!(processor.in_service().is_none());
    assert_eq!(processor.revision(), 3);

    assert_eq!(processor.reset().await, 1);
    assert!(processor.list_entries().is_empty());
    assert_eq!(processor.revision(), 4);
}

#[tokio::test]
async fn test_admission_rejected_while_closed() {
    let processor = processor();
    processor.set_status(OperationalStatus::Closed).await;

    let err = processor.admit(NewEntry::new("Ana", 1)).await.unwrap_err();
    assert_eq!(err, AppError::AdmissionClosed(OperationalStatus::Closed));
    assert!(processor.list_entries().is_empty());
}

#[tokio::test]
async fn test_break_admission_follows_policy() {
    let strict = processor();
    strict.set_status(OperationalStatus::Break).await;
    assert_err!(strict.admit(NewEntry::new("Ana", 1)).await);

    let (lenient, _) = processor_with(EngineConfig {
        admission: AdmissionPolicy {
            allow_during_break: true,
        },
        ..EngineConfig::default()
    });
    lenient.set_status(OperationalStatus::Break).await;
    assert_ok!(lenient.admit(NewEntry::new("Ana", 1)).await);
}

#[tokio::test]
async fn test_progress_commands_allowed_while_closed() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();
    processor.set_status(OperationalStatus::Closed).await;

    assert_ok!(processor.begin_service("e-1").await);
    assert_ok!(processor.complete("e-1", Some("electronic")).await);
}

#[tokio::test]
async fn test_invalid_admission_does_not_bump_revision() {
    let processor = processor();
    let err = processor.admit(NewEntry::new("   ", 2)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = processor.admit(NewEntry::new("Ana", 0)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(processor.revision(), 0);
}

#[tokio::test]
async fn test_price_overflow_rejected_without_commit() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();
    let revision = assert_ok!(processor.update_unit_price(u64::MAX / 2).await);

    let err = processor.admit(NewEntry::new("Budi", 3)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.kind(), "validation");
    assert_eq!(processor.revision(), revision);
    assert_eq!(processor.list_entries().len(), 1);
}

#[tokio::test]
async fn test_complete_requires_payment_method() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();
    processor.begin_service("e-1").await.unwrap();

    let err = processor.complete("e-1", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = processor.complete("e-1", Some("barter")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let entry = processor.get_entry("e-1").unwrap();
    assert_eq!(entry.status, EntryStatus::InService);
}

#[tokio::test]
async fn test_complete_waiting_entry_is_invalid() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();

    let err = processor.complete("e-1", Some("cash")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_second_begin_service_is_busy() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();
    processor.admit(NewEntry::new("Budi", 2)).await.unwrap();
    processor.begin_service("e-1").await.unwrap();

    let err = processor.begin_service("e-2").await.unwrap_err();
    assert!(matches!(err, AppError::ResourceBusy(_)));
    assert_eq!(
        processor.get_entry("e-2").unwrap().status,
        EntryStatus::Waiting
    );
}

#[tokio::test]
async fn test_cancel_twice_is_invalid() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();

    assert_ok!(processor.cancel("e-1").await);
    let revision = processor.revision();
    let err = processor.cancel("e-1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(processor.revision(), revision);
}

#[tokio::test]
async fn test_unknown_entry_is_not_found() {
    let processor = processor();
    assert!(matches!(
        processor.begin_service("nope").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(processor.get_entry("nope"), Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_price_change_is_not_retroactive() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 2)).await.unwrap();

    assert_ok!(processor.update_unit_price(7000).await);
    processor.admit(NewEntry::new("Budi", 2)).await.unwrap();

    let entries = processor.list_entries();
    assert_eq!(entries[0].total_price, 10000);
    assert_eq!(entries[1].total_price, 14000);
    assert_eq!(processor.snapshot().unit_price, 7000);

    assert!(matches!(
        processor.update_unit_price(0).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_force_rules() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();
    processor.admit(NewEntry::new("Budi", 1)).await.unwrap();
    processor.begin_service("e-1").await.unwrap();

    // Cannot force a second entry into service
    let err = processor
        .force("e-2", EntryStatus::InService, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // Done needs a payment method
    let err = processor
        .force("e-2", EntryStatus::Done, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Pulling a cancelled entry back to waiting is allowed
    processor.cancel("e-2").await.unwrap();
    let entry = assert_ok!(processor.force("e-2", EntryStatus::Waiting, None).await);
    assert_eq!(entry.status, EntryStatus::Waiting);
    assert!(entry.finished_at.is_none());

    // Forcing the in-service entry away frees the slot
    processor
        .force("e-1", EntryStatus::Cancelled, None)
        .await
        .unwrap();
    assert!(processor.in_service().is_none());
    assert_ok!(processor.begin_service("e-2").await);
}

#[tokio::test]
async fn test_set_location_validates_and_dedupes() {
    let processor = processor();

    assert!(matches!(
        processor.set_location(None, None).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        processor.set_location(Some("  "), None).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(processor.revision(), 0);

    let state = processor
        .set_location(
            Some(" Lobby "),
            Some(vec!["Lobby".into(), " Hall ".into(), "Lobby".into()]),
        )
        .await
        .unwrap();
    assert_eq!(state.location, "Lobby");
    assert_eq!(state.preset_locations, vec!["Lobby", "Hall"]);
    assert_eq!(state.revision, 1);
    assert_eq!(processor.snapshot().location, "Lobby");
}

#[tokio::test]
async fn test_stats_reflect_revenue_by_method() {
    let processor = processor();
    for (name, photos, method) in [("Ana", 3, "cash"), ("Budi", 2, "qris")] {
        let entry = processor.admit(NewEntry::new(name, photos)).await.unwrap();
        processor.begin_service(&entry.id).await.unwrap();
        processor.complete(&entry.id, Some(method)).await.unwrap();
    }
    processor.admit(NewEntry::new("Citra", 1)).await.unwrap();

    let stats = processor.stats();
    assert_eq!(stats.done, 2);
    assert_eq!(stats.waiting, 1);
    assert_eq!(stats.cash_revenue, 15000);
    assert_eq!(stats.electronic_revenue, 10000);
    assert_eq!(stats.total_revenue, 25000);
}

#[tokio::test]
async fn test_concurrent_begin_service_admits_exactly_one() {
    let processor = Arc::new(processor());
    for i in 0..8 {
        processor
            .admit(NewEntry::new(format!("c{}", i), 1))
            .await
            .unwrap();
    }

    let mut set = JoinSet::new();
    for i in 1..=8 {
        let processor = processor.clone();
        set.spawn(async move { processor.begin_service(&format!("e-{}", i)).await });
    }

    let mut successes = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, AppError::ResourceBusy(_))),
        }
    }
    assert_eq!(successes, 1);
    let in_service = processor
        .list_entries()
        .iter()
        .filter(|e| e.status == EntryStatus::InService)
        .count();
    assert_eq!(in_service, 1);
}

#[tokio::test]
async fn test_broadcast_revisions_strictly_increase_under_concurrency() {
    let processor = Arc::new(processor());
    let mut subscription = processor.subscribe();

    let mut set = JoinSet::new();
    for i in 0..20 {
        let processor = processor.clone();
        set.spawn(async move {
            if i % 5 == 0 {
                processor.set_status(OperationalStatus::Open).await;
            } else {
                processor
                    .admit(NewEntry::new(format!("c{}", i), 1))
                    .await
                    .unwrap();
            }
        });
    }
    while set.join_next().await.is_some() {}

    let mut last = 0;
    for _ in 0..20 {
        let event = subscription.recv().await.unwrap();
        assert_eq!(event.revision(), last + 1);
        last = event.revision();
    }
    assert_eq!(processor.revision(), 20);
}

#[tokio::test]
async fn test_subscribe_then_snapshot_aligns_by_revision() {
    let processor = processor();
    processor.admit(NewEntry::new("Ana", 1)).await.unwrap();

    let mut subscription = processor.subscribe();
    processor.admit(NewEntry::new("Budi", 1)).await.unwrap();
    let mut mirror = QueueMirror::from_snapshot((*processor.snapshot()).clone());
    processor.begin_service("e-1").await.unwrap();

    // Revision 2 is already in the snapshot, revision 3 is new
    let first = subscription.recv().await.unwrap();
    assert_eq!(mirror.apply(first), ApplyOutcome::Stale);
    let second = subscription.recv().await.unwrap();
    assert_eq!(mirror.apply(second), ApplyOutcome::Applied);

    assert_eq!(mirror.state(), processor.snapshot().as_ref());
}

#[tokio::test]
async fn test_lagged_subscriber_detects_missed_events() {
    let (processor, _) = processor_with(EngineConfig {
        broadcast_capacity: 2,
        ..EngineConfig::default()
    });
    let mut subscription = processor.subscribe();
    for i in 0..5 {
        processor
            .admit(NewEntry::new(format!("c{}", i), 1))
            .await
            .unwrap();
    }

    assert!(matches!(
        subscription.recv().await,
        Err(crate::application::broadcaster::SubscriptionError::Lagged(_))
    ));
}

#[tokio::test]
async fn test_completed_entries_reach_ledger() {
    let sink = RecordingLedgerSink::new();
    let (handle, exporter) = ledger_channel(
        Arc::new(sink.clone()),
        RetryPolicy::new(RetrySettings::default()),
    );
    let processor = processor().with_ledger(handle);

    processor.admit(NewEntry::new("Ana", 3)).await.unwrap();
    processor.admit(NewEntry::new("Budi", 1)).await.unwrap();
    processor.begin_service("e-1").await.unwrap();
    processor.complete("e-1", Some("cash")).await.unwrap();
    processor
        .force("e-2", EntryStatus::Done, Some("electronic"))
        .await
        .unwrap();
    // done -> done is not a new completion
    processor
        .force("e-2", EntryStatus::Done, Some("cash"))
        .await
        .unwrap();
    processor.cancel("e-1").await.unwrap_err();

    let (tx, token) = shutdown_channel();
    tx.shutdown();
    drop(processor);
    exporter.run(token).await;

    let exported: Vec<(String, u64)> = sink
        .appended()
        .into_iter()
        .map(|e| (e.id, e.total_price))
        .collect();
    assert_eq!(
        exported,
        vec![("e-1".to_string(), 15000), ("e-2".to_string(), 5000)]
    );
}

#[test]
fn test_zero_capacity_config_is_rejected() {
    let config = EngineConfig {
        broadcast_capacity: 0,
        ..EngineConfig::default()
    };
    let result = CommandProcessor::new(
        &config,
        Arc::new(InMemoryPricing::new(5000)),
        Arc::new(SequentialIdProvider::new("e")),
        Arc::new(ManualClock::new(0)),
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_broadcast_capacity_comes_from_config() {
    let (processor, _) = processor_with(EngineConfig {
        broadcast_capacity: 2,
        ..EngineConfig::default()
    });
    assert_eq!(processor.broadcaster().capacity(), 2);

    // Three commits overflow a two-slot buffer
    let mut subscription = processor.subscribe();
    for name in ["Ana", "Budi", "Citra"] {
        processor.admit(NewEntry::new(name, 1)).await.unwrap();
    }
    assert_err!(subscription.recv().await);
}
