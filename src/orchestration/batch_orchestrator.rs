// Batch orchestrator: runs the single-item pipeline over an ordered
// sequence of path pairs with per-item failure isolation.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::core::config::Config;
use crate::core::types::{BatchItemResult, ImageMaskPair, SingleExtraction};
use crate::services::preprocess;

use super::pipeline::ExtractionPipeline;

/// Coordinates batch extraction over the shared pipeline.
///
/// Items run concurrently up to the configured cap, but results land in
/// a fixed-size buffer indexed by input position, so output order always
/// matches input order and a failed item only ever affects its own slot.
pub struct BatchOrchestrator {
    pipeline: Arc<ExtractionPipeline>,
    semaphore: Arc<Semaphore>,
    batch_root: Option<PathBuf>,
}

impl BatchOrchestrator {
    pub fn new(pipeline: Arc<ExtractionPipeline>, config: &Config) -> Self {
        Self {
            pipeline,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_extractions())),
            // Canonicalized once so per-item prefix checks compare like
            // with like even when the configured root is relative.
            batch_root: config
                .batch_root()
                .map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf())),
        }
    }

    #[instrument(skip(self, pairs), fields(total = pairs.len()))]
    pub async fn process_batch(&self, pairs: Vec<ImageMaskPair>) -> Vec<BatchItemResult> {
        let total = pairs.len();
        info!("Processing batch of {} image/mask pairs", total);

        let mut tasks = Vec::with_capacity(total);
        for (index, pair) in pairs.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&self.semaphore);
            let batch_root = self.batch_root.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("extraction semaphore is never closed");

                let outcome = tokio::task::spawn_blocking(move || {
                    let result = run_item(&pipeline, &pair, batch_root.as_deref());
                    (pair, result)
                })
                .await;

                match outcome {
                    Ok((pair, Ok(result))) => BatchItemResult::Success {
                        index,
                        image_path: pair.image_path().to_string(),
                        mask_path: pair.mask_path().to_string(),
                        result,
                    },
                    Ok((pair, Err(message))) => BatchItemResult::Failed {
                        index,
                        image_path: pair.image_path().to_string(),
                        mask_path: pair.mask_path().to_string(),
                        error: message,
                    },
                    Err(join_error) => BatchItemResult::Failed {
                        index,
                        image_path: String::new(),
                        mask_path: String::new(),
                        error: format!("extraction task panicked: {join_error}"),
                    },
                }
            }));
        }

        // Fixed-size buffer indexed by input position; task completion
        // order never influences result order.
        let mut results: Vec<Option<BatchItemResult>> = (0..total).map(|_| None).collect();
        for (index, task) in tasks.into_iter().enumerate() {
            let item = match task.await {
                Ok(item) => item,
                Err(join_error) => BatchItemResult::Failed {
                    index,
                    image_path: String::new(),
                    mask_path: String::new(),
                    error: format!("extraction task panicked: {join_error}"),
                },
            };
            if let BatchItemResult::Failed { index, error, .. } = &item {
                warn!("Batch item {} failed: {}", index, error);
            }
            results[index] = Some(item);
        }

        results.into_iter().flatten().collect()
    }
}

fn run_item(
    pipeline: &ExtractionPipeline,
    pair: &ImageMaskPair,
    batch_root: Option<&std::path::Path>,
) -> Result<SingleExtraction, String> {
    let image_source = preprocess::resolve_batch_path(pair.image_path(), batch_root)
        .map_err(|e| e.to_string())?;
    let mask_source = preprocess::resolve_batch_path(pair.mask_path(), batch_root)
        .map_err(|e| e.to_string())?;

    pipeline
        .extract_single(&image_source, &mask_source)
        .map_err(|e| e.to_string())
}
