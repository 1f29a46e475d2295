//! Memoize lookups so repeated inventory entries cost one round of requests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use clap::ValueEnum;
use dashmap::DashMap;

use crate::{
    config::LookupConfig,
    error::Result,
    normalize::NameForms,
    pipeline::{Pipeline, Resolution},
};

/// Strategy for reusing earlier lookups within one run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum CacheMode {
    /// Query the services for every row.
    None,
    /// Reuse the result of any earlier row with the same normalized name.
    Name,
}

#[derive(Clone)]
pub struct LookupCache {
    mode: CacheMode,
    cache: Arc<DashMap<String, Resolution>>,
    hits: Arc<AtomicUsize>,
}

impl LookupCache {
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            cache: Arc::new(DashMap::<String, Resolution>::new()),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return the cached resolution for `forms`, or run `resolve` and store
    /// its result. The map is not locked while `resolve` runs, so two workers
    /// racing on the same new name may both query the services.
    pub fn get_or_resolve<F>(&self, forms: &NameForms, resolve: F) -> Resolution
    where
        F: FnOnce() -> Resolution,
    {
        match self.mode {
            CacheMode::None => resolve(),
            CacheMode::Name => {
                if let Some(res) = self.cache.get(&forms.normalized) {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return (*res).clone();
                }
                let resolution = resolve();
                self.cache
                    .insert(forms.normalized.clone(), resolution.clone());
                resolution
            }
        }
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Live pipelines keyed by retry settings, so callers that cannot hold on to a
/// [`Pipeline`] still share one HTTP client per setting.
#[derive(Default)]
pub struct PipelinePool {
    pipelines: DashMap<(u32, Duration), Arc<Pipeline>>,
}

impl PipelinePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline for `config`, built on first use. Only `retries` and `delay`
    /// distinguish entries; other settings come from the first caller.
    pub fn get(&self, config: &LookupConfig) -> Result<Arc<Pipeline>> {
        let key = (config.retries, config.delay);
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(Arc::clone(pipeline.value()));
        }
        let pipeline = Arc::new(Pipeline::from_config(config)?);
        Ok(Arc::clone(self.pipelines.entry(key).or_insert(pipeline).value()))
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
