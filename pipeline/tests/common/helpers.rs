//! Test helpers and builder patterns for pipeline tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dispatcher::{
    BackendKind, BackendResponse, Dispatcher, MockProviderBackend, ProviderDescriptor, ProviderRegistry,
    QuotaLimits, Rotator, RotatorConfig,
};
use pipeline::traits::MockClassifier;
use pipeline::{
    Cluster, InMemoryRunStore, PipelineConfig, PipelineResult, RunController, RunStatusView, WorkUnitSource,
};
use shared::{CampaignId, RunId, RunStatus};

use super::fixtures::TestFixtures;

pub type TestController = RunController<InMemoryRunStore, FlakyWorkUnitSource, MockClassifier>;

/// Work unit source that reports no clusters for its first `empty_loads` calls
pub struct FlakyWorkUnitSource {
    clusters: Vec<Cluster>,
    empty_loads: usize,
    loads: Arc<AtomicUsize>,
}

impl FlakyWorkUnitSource {
    pub fn new(clusters: Vec<Cluster>, empty_loads: usize) -> Self {
        Self {
            clusters,
            empty_loads,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared count of loads so far; stays readable after the source moves into a controller
    pub fn load_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }
}

#[async_trait::async_trait]
impl WorkUnitSource for FlakyWorkUnitSource {
    async fn load_work_units(&self, _campaign_id: &CampaignId) -> PipelineResult<Vec<Cluster>> {
        let load = self.loads.fetch_add(1, Ordering::SeqCst);
        if load < self.empty_loads {
            return Ok(Vec::new());
        }
        Ok(self.clusters.clone())
    }
}

/// Builder for controllers wired to mock backends and an in-memory store
pub struct ControllerBuilder {
    backend: MockProviderBackend,
    vision: Option<MockProviderBackend>,
    classifier: MockClassifier,
    work_units: FlakyWorkUnitSource,
    config: PipelineConfig,
}

impl ControllerBuilder {
    /// Every generation answers `reply`; every classification answers `joy`
    pub fn new(reply: &'static str) -> Self {
        let mut classifier = MockClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Ok(TestFixtures::scores("joy")));

        Self {
            backend: TestHelpers::replying_backend(reply),
            vision: None,
            classifier,
            work_units: FlakyWorkUnitSource::new(TestFixtures::clusters(), 0),
            config: TestFixtures::config(),
        }
    }

    pub fn with_backend(mut self, backend: MockProviderBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_vision(mut self, vision: MockProviderBackend) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_classifier(mut self, classifier: MockClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_work_units(mut self, work_units: FlakyWorkUnitSource) -> Self {
        self.work_units = work_units;
        self
    }

    pub fn with_max_resume_attempts(mut self, max: u32) -> Self {
        self.config.max_resume_attempts = Some(max);
        self
    }

    pub fn build(self) -> Arc<TestController> {
        let descriptor = ProviderDescriptor::new(BackendKind::Groq, "test-model", QuotaLimits::new(1_000, 10_000, None));
        let mut registry = ProviderRegistry::new().with_provider(descriptor, Arc::new(self.backend));
        if let Some(vision) = self.vision {
            registry = registry.with_vision(Arc::new(vision));
        }

        let config = RotatorConfig {
            pacing: false,
            ..RotatorConfig::default()
        };
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(Rotator::new(registry, config));

        RunController::new(
            Arc::new(InMemoryRunStore::new()),
            Arc::new(self.work_units),
            dispatcher,
            Arc::new(self.classifier),
            self.config,
        )
    }
}

/// Common helper functions for tests
pub struct TestHelpers;

impl TestHelpers {
    pub fn replying_backend(reply: &'static str) -> MockProviderBackend {
        let mut backend = MockProviderBackend::new();
        backend
            .expect_generate()
            .returning(move |_| Ok(BackendResponse::new(reply)));
        backend
    }

    /// Poll the run until it reaches `status`; panics after a simulated day
    pub async fn wait_for_status(controller: &Arc<TestController>, run_id: RunId, status: RunStatus) -> RunStatusView {
        for _ in 0..86_400 {
            let view = controller.status(run_id).await.unwrap();
            if view.run.status == status {
                return view;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        panic!("{run_id} never reached {status}");
    }
}
