//! Batched prediction over worker threads.
//!
//! A chip-scale layout is predicted one device at a time; fanning the
//! remote calls out over a few threads hides the per-call latency of the
//! serverless platform. Results come back in input order and each slot
//! carries its own outcome, so one rejected design does not discard the
//! rest of the batch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use log::info;

use crate::client::ModelKind;
use crate::device::{Device, PredictOptions};
use crate::errors::{BatchError, BatchResult, ClientError, ClientResult};
use crate::models::Model;

/// Options for a batched prediction call.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    threads: Option<usize>,
    predict: PredictOptions,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the worker thread count instead of deriving it from the host.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Per-call options applied to every device in the batch.
    pub fn with_predict_options(mut self, options: PredictOptions) -> Self {
        self.predict = options;
        self
    }

    /// Resolved worker count: the explicit setting, else the host
    /// parallelism, never more than the batch size.
    fn resolve_threads(&self, batch_size: usize) -> BatchResult<usize> {
        let threads = match self.threads {
            Some(0) => return Err(BatchError::InvalidThreadCount { count: 0 }),
            Some(threads) => threads,
            None => thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };
        Ok(threads.min(batch_size))
    }
}

/// Run the same remote model over a batch of devices.
///
/// Returns one result per input device, in input order.
pub fn predict_batch(
    devices: &[Device],
    model: &Model,
    kind: ModelKind,
    options: &BatchOptions,
) -> BatchResult<Vec<ClientResult<Device>>> {
    if devices.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    let threads = options.resolve_threads(devices.len())?;
    info!(
        "predicting batch of {} devices on {} threads",
        devices.len(),
        threads
    );

    let binarize = match kind {
        ModelKind::Corrector => options.predict.binarize_or(true),
        ModelKind::Predictor | ModelKind::SemStyle => options.predict.binarize_or(false),
    };

    // Workers pull the next free index from a shared counter, so a slow
    // cold-start call does not stall the rest of its stripe.
    let next_index = AtomicUsize::new(0);
    let results: Mutex<Vec<Option<ClientResult<Device>>>> =
        Mutex::new((0..devices.len()).map(|_| None).collect());
    let mut panicked = false;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads);
        for _ in 0..threads {
            handles.push(scope.spawn(|| loop {
                let index = next_index.fetch_add(1, Ordering::SeqCst);
                if index >= devices.len() {
                    break;
                }
                let outcome =
                    devices[index].run_remote(model, kind, binarize, &options.predict);
                let mut slots = results.lock().expect("results lock poisoned");
                slots[index] = Some(outcome);
            }));
        }
        for handle in handles {
            if handle.join().is_err() {
                panicked = true;
            }
        }
    });

    if panicked {
        return Err(BatchError::ThreadPanicked);
    }

    let slots = results.into_inner().expect("results lock poisoned");
    Ok(slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(ClientError::MissingPrediction)))
        .collect())
}
