//! Engine context shared by every lifecycle operation.

use crate::cache::SegmentCache;
use crate::catalog::TableCatalog;
use crate::config::VectorIndexConfig;
use crate::error::CoreResult;
use crate::event_log::{EventLogSink, JsonLinesEventLog};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Handles to the engine services the lifecycle code uses.
///
/// The event log and the table catalog are optional: an unbound event log
/// is a normal state in which every emitter is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use vidx_core::{InMemorySegmentCache, VectorIndexConfig, VectorIndexContext};
///
/// let ctx = VectorIndexContext::new(
///     VectorIndexConfig::new().cache_path("/var/cache/vidx"),
///     Arc::new(InMemorySegmentCache::<()>::new()),
/// )?;
/// ```
pub struct VectorIndexContext {
    config: VectorIndexConfig,
    cache: Arc<dyn SegmentCache>,
    event_log: Option<Arc<dyn EventLogSink>>,
    catalog: Option<Arc<dyn TableCatalog>>,
}

impl VectorIndexContext {
    /// Creates a context.
    ///
    /// If the configuration names an event log file it is opened (and
    /// created if missing) and bound; otherwise the event log is unbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the event log file cannot be opened.
    pub fn new(config: VectorIndexConfig, cache: Arc<dyn SegmentCache>) -> CoreResult<Self> {
        let event_log: Option<Arc<dyn EventLogSink>> = match &config.event_log_path {
            Some(path) => Some(Arc::new(JsonLinesEventLog::open(path)?)),
            None => None,
        };

        Ok(Self {
            config,
            cache,
            event_log,
            catalog: None,
        })
    }

    /// Binds an event log sink, replacing any configured one.
    #[must_use]
    pub fn with_event_log(mut self, sink: Arc<dyn EventLogSink>) -> Self {
        self.event_log = Some(sink);
        self
    }

    /// Binds a table catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn TableCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VectorIndexConfig {
        &self.config
    }

    /// Root of the segment cache directory tree.
    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.config.cache_path
    }

    /// Returns the segment cache.
    #[must_use]
    pub fn cache(&self) -> &dyn SegmentCache {
        self.cache.as_ref()
    }

    /// Returns the event log sink, if bound.
    #[must_use]
    pub fn event_log(&self) -> Option<&Arc<dyn EventLogSink>> {
        self.event_log.as_ref()
    }

    /// Returns the table catalog, if bound.
    #[must_use]
    pub fn catalog(&self) -> Option<&Arc<dyn TableCatalog>> {
        self.catalog.as_ref()
    }
}

impl fmt::Debug for VectorIndexContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndexContext")
            .field("config", &self.config)
            .field("event_log", &self.event_log.is_some())
            .field("catalog", &self.catalog.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemorySegmentCache;
    use tempfile::tempdir;

    #[test]
    fn unbound_by_default() {
        let ctx = VectorIndexContext::new(
            VectorIndexConfig::default(),
            Arc::new(InMemorySegmentCache::<()>::new()),
        )
        .unwrap();
        assert!(ctx.event_log().is_none());
        assert!(ctx.catalog().is_none());
    }

    #[test]
    fn configured_event_log_is_bound() {
        let temp = tempdir().unwrap();
        let ctx = VectorIndexContext::new(
            VectorIndexConfig::new().event_log_path(temp.path().join("events.jsonl")),
            Arc::new(InMemorySegmentCache::<()>::new()),
        )
        .unwrap();
        assert!(ctx.event_log().is_some());
        assert!(temp.path().join("events.jsonl").exists());
    }
}
