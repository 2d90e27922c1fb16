//! Background resource decoding.
//!
//! A load runs to completion on a worker and the finished value is handed
//! over once through a [`PendingLoad`]. Nothing partially decoded is ever
//! visible to the consumer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;

use super::{ContentData, ContentKind, ContentSource};
use crate::core::ObjectName;
use crate::util::{Error, Result};

struct Slot<T> {
    ready: AtomicBool,
    value: Mutex<Option<Result<T>>>,
    signal: Condvar,
}

/// Handle to a value being decoded in the background.
pub struct PendingLoad<T> {
    slot: Arc<Slot<T>>,
}

impl<T> PendingLoad<T> {
    fn new() -> (Self, Arc<Slot<T>>) {
        let slot = Arc::new(Slot {
            ready: AtomicBool::new(false),
            value: Mutex::new(None),
            signal: Condvar::new(),
        });
        (Self { slot: Arc::clone(&slot) }, slot)
    }

    /// True once the worker has published its result.
    pub fn is_ready(&self) -> bool {
        self.slot.ready.load(Ordering::Acquire)
    }

    /// Take the result if it is ready. Returns `None` before completion and
    /// after the result has been taken.
    pub fn try_take(&self) -> Option<Result<T>> {
        if !self.is_ready() {
            return None;
        }
        self.slot.value.lock().take()
    }

    /// Block until the result is published and take it.
    pub fn wait(self) -> Result<T> {
        let mut value = self.slot.value.lock();
        while !self.slot.ready.load(Ordering::Acquire) {
            self.slot.signal.wait(&mut value);
        }
        value
            .take()
            .unwrap_or_else(|| Err(Error::other("background load result already taken")))
    }
}

impl<T> Slot<T> {
    fn publish(&self, result: Result<T>) {
        let mut value = self.value.lock();
        *value = Some(result);
        self.ready.store(true, Ordering::Release);
        self.signal.notify_all();
    }
}

/// Counter of audio files loaded off the main thread.
#[derive(Clone, Debug, Default)]
pub struct AsyncLoadCounter(Arc<AtomicU32>);

impl AsyncLoadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// Runs decode jobs on a rayon pool.
#[derive(Clone, Default)]
pub struct BackgroundLoader {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl BackgroundLoader {
    /// Loader on the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ge-content-loader-{}", i))
            .build()
            .map_err(|e| Error::other(format!("failed to start loader pool: {}", e)))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Run `job` in the background and publish its result when done.
    pub fn spawn<T, F>(&self, job: F) -> PendingLoad<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (pending, slot) = PendingLoad::new();
        let task = move || slot.publish(job());
        match &self.pool {
            Some(pool) => pool.spawn(task),
            None => rayon::spawn(task),
        }
        pending
    }

    /// Read audio files from `subdir` in parallel, counting each one read.
    ///
    /// Any failed read fails the whole load.
    pub fn load_audio_files(
        &self,
        source: Arc<dyn ContentSource>,
        subdir: String,
        files: Vec<ObjectName>,
        extension: &'static str,
        counter: AsyncLoadCounter,
    ) -> PendingLoad<Vec<(ObjectName, ContentData)>> {
        self.spawn(move || {
            let _span = tracing::debug_span!("load_audio_files", subdir = %subdir, count = files.len()).entered();
            files
                .par_iter()
                .map(|&file| {
                    let data = source.read(ContentKind::Audio, &subdir, &file.to_name_string(), extension)?;
                    counter.increment();
                    Ok((file, data))
                })
                .collect()
        })
    }
}

impl std::fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}
