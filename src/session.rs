//! Startup and run scheduling.
//!
//! The OCR engine and the entity tagger are loaded once, on blocking worker
//! threads, while the caller stays responsive. A [`Session`] can only be
//! created from loaded collaborators, and it runs at most one detection at a
//! time on a blocking worker.

use anyhow::Context;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use crate::config::ModelPaths;
use crate::detection::AddressDetector;
use crate::detection::ner::{EntityTagger, LexiconTagger};
use crate::detection::ocr::{OcrsRecognizer, TextRecognizer};
use crate::error::RunError;
use crate::models::PipelineResult;

/// Read-only handles shared by every run.
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn TextRecognizer>,
    pub tagger: Arc<dyn EntityTagger>,
}

impl Collaborators {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, tagger: Arc<dyn EntityTagger>) -> Self {
        Self { recognizer, tagger }
    }

    /// Load the OCR models and the entity lexicon side by side.
    pub async fn load(models: ModelPaths) -> anyhow::Result<Self> {
        let ocr_dir = models.resolve_ocr_dir()?;
        let lexicon = models.require_lexicon()?.to_path_buf();

        let ocr = tokio::task::spawn_blocking(move || OcrsRecognizer::load(&ocr_dir));
        let ner = tokio::task::spawn_blocking(move || LexiconTagger::load(&lexicon));
        let (ocr, ner) = tokio::try_join!(ocr, ner).context("Collaborator loader panicked")?;

        let tagger = ner?;
        info!(entries = tagger.len(), "entity lexicon loaded");

        Ok(Self::new(Arc::new(ocr?), Arc::new(tagger)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Initializing,
    Ready,
    Failed(String),
}

/// Collaborator initialization running in the background.
pub struct Startup {
    readiness: watch::Receiver<Readiness>,
    task: JoinHandle<anyhow::Result<Collaborators>>,
}

impl Startup {
    /// Start loading collaborators from local model files.
    pub fn load(models: ModelPaths) -> Self {
        Self::begin(Collaborators::load(models))
    }

    /// Drive an arbitrary initialization future on the runtime.
    pub fn begin<F>(init: F) -> Self
    where
        F: Future<Output = anyhow::Result<Collaborators>> + Send + 'static,
    {
        let (tx, readiness) = watch::channel(Readiness::Initializing);
        let reporter = ReadinessReporter(tx);

        let task = tokio::spawn(async move {
            let result = init.await;
            match &result {
                Ok(_) => {
                    info!("collaborators ready");
                    reporter.report(Readiness::Ready);
                }
                Err(e) => {
                    error!("collaborator initialization failed: {:#}", e);
                    reporter.report(Readiness::Failed(format!("{:#}", e)));
                }
            }
            result
        });

        Self { readiness, task }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    /// Watch readiness changes, e.g. to enable a run control.
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.readiness.clone()
    }

    /// Wait for initialization to finish.
    pub async fn wait(self) -> anyhow::Result<Collaborators> {
        self.task.await.context("Collaborator initialization panicked")?
    }
}

/// Publishes the outcome of initialization. Reports a failure when dropped
/// before an outcome was published, e.g. while the loader unwinds a panic.
struct ReadinessReporter(watch::Sender<Readiness>);

impl ReadinessReporter {
    fn report(&self, state: Readiness) {
        self.0.send_replace(state);
    }
}

impl Drop for ReadinessReporter {
    fn drop(&mut self) {
        if *self.0.borrow() == Readiness::Initializing {
            error!("collaborator initialization panicked");
            self.0
                .send_replace(Readiness::Failed("initialization panicked".to_string()));
        }
    }
}

/// Clears the busy flag when a run ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A detection run in progress.
pub struct RunHandle {
    task: JoinHandle<Result<PipelineResult, RunError>>,
}

impl RunHandle {
    pub async fn finish(self) -> Result<PipelineResult, RunError> {
        self.task
            .await
            .map_err(|e| RunError::Worker(e.to_string()))?
    }
}

/// Accepts one run at a time against ready collaborators.
#[derive(Clone)]
pub struct Session {
    detector: Arc<AddressDetector>,
    busy: Arc<AtomicBool>,
}

impl Session {
    pub fn new(detector: AddressDetector) -> Self {
        Self {
            detector: Arc::new(detector),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a run on a blocking worker. Fails with `RunError::Busy` while
    /// another run of this session has not finished.
    pub fn begin_run(&self, path: PathBuf) -> Result<RunHandle, RunError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(RunError::Busy);
        }
        let guard = BusyGuard(self.busy.clone());
        let detector = self.detector.clone();

        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            detector.detect_path(&path)
        });

        Ok(RunHandle { task })
    }

    /// Run detection on `path` and wait for the result.
    pub async fn run(&self, path: PathBuf) -> Result<PipelineResult, RunError> {
        self.begin_run(path)?.finish().await
    }
}
