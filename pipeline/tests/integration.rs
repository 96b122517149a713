//! End-to-end tests for the run controller
//!
//! Runs go through the real rotator, stages and in-memory store; only the
//! provider backends and the classifier are mocked. Every test runs on a
//! paused clock so resume delays elapse instantly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dispatcher::{BackendResponse, MockProviderBackend};
use pipeline::traits::MockClassifier;
use pipeline::{ItemResult, PipelineError, RunStore};
use shared::{ApiFailure, ClusterId, ItemId, RunStatus};

mod common;
use common::{ControllerBuilder, FlakyWorkUnitSource, TestFixtures, TestHelpers};

#[tokio::test(start_paused = true)]
async fn test_full_run_completes_with_metrics() {
    let mut classifier = MockClassifier::new();
    classifier
        .expect_classify()
        .withf(|text| text == "I love this ad!")
        .times(1)
        .returning(|_| Ok(TestFixtures::scores("joy")));

    let controller = ControllerBuilder::new("  I love this ad!  ")
        .with_classifier(classifier)
        .build();
    let run_id = controller.start(TestFixtures::campaign()).await.unwrap();

    let view = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Completed).await;
    assert_eq!(view.run.total_items, 5);
    assert_eq!(view.run.processed_items, 5);
    assert_eq!(view.progress_percent, 100);
    assert_eq!(view.run.current_step, "Complete");
    assert!(view.run.completed_at.is_some());
    assert!(view.run.error_message.is_none());

    let store = controller.store();
    let items = store.load_item_results(run_id).await.unwrap();
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|item| item.text == "I love this ad!" && item.label.is_some()));
    assert_eq!(store.load_cluster_results(run_id).await.unwrap().len(), 2);

    let metrics = store.load_metrics(run_id).await.unwrap().unwrap();
    assert_eq!(metrics.total_personas, 5);
    assert_eq!(metrics.sentiment_breakdown.positive, "100.0%");
    assert_eq!(metrics.top_emotions[0].emotion, "joy");
    assert_eq!(metrics.top_emotions[0].count, 5);
    assert_eq!(metrics.cluster_summaries.len(), 2);

    assert_eq!(
        store.status_history(run_id).await,
        vec![RunStatus::Pending, RunStatus::Processing, RunStatus::Completed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_work_units_pause_then_resume() {
    let work_units = FlakyWorkUnitSource::new(TestFixtures::clusters(), 1);
    let loads = work_units.load_counter();
    let controller = ControllerBuilder::new("Nice shoes").with_work_units(work_units).build();
    let started = tokio::time::Instant::now();
    let run_id = controller.start(TestFixtures::campaign()).await.unwrap();

    let paused = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Paused).await;
    let error = paused.run.error_message.unwrap();
    assert!(error.contains("No work units"), "unexpected error: {error}");

    let done = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Completed).await;
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert!(done.run.error_message.is_none());
    assert_eq!(done.run.processed_items, 5);
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    assert_eq!(
        controller.store().status_history(run_id).await,
        vec![
            RunStatus::Pending,
            RunStatus::Processing,
            RunStatus::Paused,
            RunStatus::Processing,
            RunStatus::Completed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_resume_reuses_generated_reactions() {
    // 2 cluster reactions + 5 persona reactions, none of them regenerated
    let mut backend = MockProviderBackend::new();
    backend
        .expect_generate()
        .times(7)
        .returning(|_| Ok(BackendResponse::new("Fresh look")));

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut classifier = MockClassifier::new();
    classifier.expect_classify().returning(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ApiFailure::ServiceUnavailable)
        } else {
            Ok(TestFixtures::scores("surprise"))
        }
    });

    let controller = ControllerBuilder::new("unused")
        .with_backend(backend)
        .with_classifier(classifier)
        .build();
    let run_id = controller.start(TestFixtures::campaign()).await.unwrap();

    // Nothing got labeled on the first attempt, so aggregation pauses the run
    let paused = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Paused).await;
    assert!(paused.run.error_message.unwrap().contains("No labeled reactions"));

    let done = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Completed).await;
    assert_eq!(done.run.processed_items, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let metrics = controller.store().load_metrics(run_id).await.unwrap().unwrap();
    assert_eq!(metrics.top_emotions[0].emotion, "surprise");
}

#[tokio::test(start_paused = true)]
async fn test_resume_limit_fails_the_run() {
    let work_units = FlakyWorkUnitSource::new(TestFixtures::clusters(), usize::MAX);
    let controller = ControllerBuilder::new("unused")
        .with_work_units(work_units)
        .with_max_resume_attempts(1)
        .build();
    let run_id = controller.start(TestFixtures::campaign()).await.unwrap();

    let failed = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Failed).await;
    assert!(failed.run.error_message.is_some());
    assert!(failed.run.completed_at.is_some());

    assert_eq!(
        controller.store().status_history(run_id).await,
        vec![
            RunStatus::Pending,
            RunStatus::Processing,
            RunStatus::Paused,
            RunStatus::Processing,
            RunStatus::Paused,
            RunStatus::Failed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_generation_failures_become_placeholders() {
    let mut backend = MockProviderBackend::new();
    backend
        .expect_generate()
        .returning(|_| Err(ApiFailure::ServerError("boom".to_string())));

    let controller = ControllerBuilder::new("unused")
        .with_backend(backend)
        .with_max_resume_attempts(0)
        .build();
    let run_id = controller.start(TestFixtures::campaign()).await.unwrap();

    let failed = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Failed).await;
    // Every item still counts as processed
    assert_eq!(failed.run.processed_items, 5);

    let items = controller.store().load_item_results(run_id).await.unwrap();
    assert!(items.iter().all(|item| item.text == pipeline::DEFAULT_PLACEHOLDER));
}

#[tokio::test(start_paused = true)]
async fn test_creative_image_goes_through_vision_provider() {
    let mut vision = MockProviderBackend::new();
    vision
        .expect_generate()
        .withf(|request| request.has_image())
        .times(1)
        .returning(|_| Ok(BackendResponse::new(TestFixtures::CREATIVE)));

    let mut backend = MockProviderBackend::new();
    backend.expect_generate().returning(|request| {
        assert!(!request.has_image());
        if request.text_content().contains(TestFixtures::CREATIVE) {
            Ok(BackendResponse::new("Looks fast"))
        } else {
            Ok(BackendResponse::new("Want a pair"))
        }
    });

    let controller = ControllerBuilder::new("unused")
        .with_backend(backend)
        .with_vision(vision)
        .build();
    let run_id = controller.start(TestFixtures::campaign_with_image()).await.unwrap();
    TestHelpers::wait_for_status(&controller, run_id, RunStatus::Completed).await;

    let clusters = controller.store().load_cluster_results(run_id).await.unwrap();
    assert_eq!(clusters.len(), 2);
    assert!(clusters.iter().all(|cluster| cluster.text == "Looks fast"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_vision_provider_pauses_the_run() {
    let controller = ControllerBuilder::new("unused").with_max_resume_attempts(0).build();
    let run_id = controller.start(TestFixtures::campaign_with_image()).await.unwrap();

    let failed = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Failed).await;
    assert!(failed.run.error_message.is_some());
    assert_eq!(
        controller.store().status_history(run_id).await,
        vec![RunStatus::Pending, RunStatus::Processing, RunStatus::Paused, RunStatus::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_campaign_is_rejected() {
    let controller = ControllerBuilder::new("Nice shoes").build();
    controller.start(TestFixtures::campaign()).await.unwrap();

    let err = controller.start(TestFixtures::campaign()).await.unwrap_err();
    assert!(matches!(err, PipelineError::CampaignExists { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_share_the_provider_pool() {
    let controller = ControllerBuilder::new("Nice shoes").build();
    let first = controller.start(TestFixtures::campaign()).await.unwrap();

    let mut other = TestFixtures::campaign();
    other.id = shared::CampaignId::new("autumn-boots");
    let second = controller.start(other).await.unwrap();

    for run_id in [first, second] {
        let view = TestHelpers::wait_for_status(&controller, run_id, RunStatus::Completed).await;
        assert_eq!(view.run.processed_items, 5);
    }
}

async fn seed_reactions(controller: &Arc<common::helpers::TestController>, texts: &[&str]) -> shared::RunId {
    let store = controller.store();
    let campaign = TestFixtures::campaign();
    store.create_campaign(campaign.clone()).await.unwrap();
    let run_id = store.create_run(&campaign.id, texts.len()).await.unwrap();

    for (index, text) in texts.iter().enumerate() {
        store
            .save_item_result(ItemResult {
                run_id,
                campaign_id: campaign.id.clone(),
                cluster_id: ClusterId::new(0),
                item_id: ItemId::new(format!("p{index}")),
                persona_name: format!("Persona {index}"),
                text: text.to_string(),
                label: None,
            })
            .await
            .unwrap();
    }
    run_id
}

#[tokio::test(start_paused = true)]
async fn test_analyze_run_completes_stored_reactions() {
    let controller = ControllerBuilder::new("unused").build();
    let run_id = seed_reactions(&controller, &["Love it", "Love it", "So cool"]).await;

    let metrics = controller.analyze_run(run_id).await.unwrap();
    assert_eq!(metrics.total_personas, 3);

    let view = controller.status(run_id).await.unwrap();
    assert_eq!(view.run.status, RunStatus::Completed);
    assert_eq!(view.run.processed_items, 3);
    assert_eq!(view.progress_percent, 100);
    assert_eq!(controller.store().load_metrics(run_id).await.unwrap(), Some(metrics));

    // A finished run cannot be analyzed again
    let err = controller.analyze_run(run_id).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidTransition { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_analyze_run_without_reactions_fails_the_run() {
    let controller = ControllerBuilder::new("unused").build();
    let run_id = seed_reactions(&controller, &[]).await;

    let err = controller.analyze_run(run_id).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoItemResults { .. }));

    let view = controller.status(run_id).await.unwrap();
    assert_eq!(view.run.status, RunStatus::Failed);
    assert!(view.run.error_message.unwrap().contains("No persona reactions"));
}
