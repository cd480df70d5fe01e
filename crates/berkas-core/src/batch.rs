//! Concurrent batch verification: one worker task per document, each
//! owning its own document handle, with cooperative cancellation between
//! batch generations.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::BerkasError;
use crate::extraction::ocr::OcrEngine;
use crate::extraction::poppler::PdfTextProvider;
use crate::verdict::VerificationVerdict;
use crate::VerifyOptions;

/// Cooperative cancellation flag shared by one batch generation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress callbacks out of the workers. Implementations must tolerate
/// calls from any worker thread in any interleaving across documents;
/// within one document, match notifications arrive in window order.
pub trait BatchObserver: Send + Sync {
    fn on_match_found(&self, _document: &Path, _label: &str, _page: usize) {}
    fn on_document_finished(&self, _verdict: &VerificationVerdict) {}
}

/// Observer that ignores everything.
pub struct NullObserver;

impl BatchObserver for NullObserver {}

/// Per-run settings outside the keyword/rule configuration.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Rendering resolution for the OCR fallback.
    pub dpi: u32,
    /// Engine handle resolved once per process; `None` disables OCR and
    /// image-only pages read as blank.
    pub ocr: Option<Arc<OcrEngine>>,
}

struct Generation {
    cancel: CancelToken,
    tasks: JoinSet<(usize, VerificationVerdict)>,
}

/// Runs batches of documents. Re-running first cancels the in-flight
/// generation and waits for its workers; old and new generations never
/// overlap.
pub struct BatchRunner {
    options: Arc<VerifyOptions>,
    observer: Arc<dyn BatchObserver>,
    current: Option<Generation>,
}

impl BatchRunner {
    pub fn new(options: VerifyOptions, observer: Arc<dyn BatchObserver>) -> Self {
        Self {
            options: Arc::new(options),
            observer,
            current: None,
        }
    }

    /// Verify a batch. Always returns exactly one verdict per input, in
    /// input order, regardless of per-document failures.
    pub async fn run(
        &mut self,
        documents: Vec<PathBuf>,
        settings: BatchSettings,
    ) -> Result<Vec<VerificationVerdict>, BerkasError> {
        if settings.dpi == 0 {
            return Err(BerkasError::InvalidDpi);
        }
        self.cancel_pending().await;

        let cancel = CancelToken::new();
        let mut tasks = JoinSet::new();
        for (index, path) in documents.iter().enumerate() {
            let path = path.clone();
            let options = Arc::clone(&self.options);
            let observer = Arc::clone(&self.observer);
            let settings = settings.clone();
            let cancel = cancel.clone();
            tasks.spawn_blocking(move || {
                (index, worker(&path, &options, &settings, &cancel, &*observer))
            });
        }
        self.current = Some(Generation { cancel, tasks });

        let mut slots: Vec<Option<VerificationVerdict>> = vec![None; documents.len()];
        while let Some(generation) = self.current.as_mut() {
            match generation.tasks.join_next().await {
                Some(Ok((index, verdict))) => slots[index] = Some(verdict),
                Some(Err(err)) => tracing::warn!(error = %err, "worker terminated abnormally"),
                None => break,
            }
        }
        self.current = None;

        let verdicts = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    VerificationVerdict::error(
                        &documents[index],
                        "worker terminated unexpectedly".into(),
                    )
                })
            })
            .collect();
        Ok(verdicts)
    }

    /// Request cancellation of the in-flight generation and wait for all
    /// of its workers to stop.
    pub async fn cancel_pending(&mut self) {
        if let Some(mut generation) = self.current.take() {
            generation.cancel.cancel();
            while generation.tasks.join_next().await.is_some() {}
        }
    }
}

/// Worker boundary: no error crosses into the aggregator; every failure
/// becomes an ERROR verdict for its document.
fn worker(
    path: &Path,
    options: &VerifyOptions,
    settings: &BatchSettings,
    cancel: &CancelToken,
    observer: &dyn BatchObserver,
) -> VerificationVerdict {
    let verdict = match open_and_verify(path, options, settings, cancel, observer) {
        Ok(verdict) => verdict,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "verification failed");
            VerificationVerdict::error(path, err.to_string())
        }
    };
    observer.on_document_finished(&verdict);
    verdict
}

fn open_and_verify(
    path: &Path,
    options: &VerifyOptions,
    settings: &BatchSettings,
    cancel: &CancelToken,
    observer: &dyn BatchObserver,
) -> Result<VerificationVerdict, BerkasError> {
    let mut provider = PdfTextProvider::open(path, settings.dpi, settings.ocr.clone())?;
    crate::verify_document(path, &mut provider, options, cancel, observer)
}
