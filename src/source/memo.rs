use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use error_stack::Report;
use futures::future::BoxFuture;
use tracing::debug;

use crate::error::SourceError;
use crate::model::{PriceSeries, SeriesQuery, SourceKind};
use crate::source::PriceSource;

/// Memoizes another source per query for a caller-chosen time to live.
///
/// State lives in this instance only; dropping the wrapper drops the cache.
pub struct MemoizedSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<SeriesQuery, (Instant, PriceSeries)>>,
}

impl<S: PriceSource> MemoizedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Forget the cached series for `query`, if any.
    #[allow(dead_code)]
    pub fn invalidate(&self, query: &SeriesQuery) -> bool {
        self.lock().remove(query).is_some()
    }

    /// Drop every entry older than the TTL. Returns how many were removed.
    #[allow(dead_code)]
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        before - entries.len()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SeriesQuery, (Instant, PriceSeries)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, query: &SeriesQuery) -> Option<PriceSeries> {
        self.lock()
            .get(query)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, series)| series.clone())
    }
}

impl<S: PriceSource> PriceSource for MemoizedSource<S> {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    fn fetch(&self, query: &SeriesQuery) -> BoxFuture<'_, Result<PriceSeries, Report<SourceError>>> {
        let query = query.clone();
        Box::pin(async move {
            if let Some(series) = self.cached(&query) {
                debug!(identifier = %query.identifier, window = %query.window, "series cache hit");
                return Ok(series);
            }

            debug!(identifier = %query.identifier, window = %query.window, "series cache miss");
            let series = self.inner.fetch(&query).await?;
            self.lock().insert(query, (Instant::now(), series.clone()));
            Ok(series)
        })
    }
}
