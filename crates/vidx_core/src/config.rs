//! Vector-index lifecycle configuration.

use std::path::PathBuf;

/// Configuration for the vector-index lifecycle.
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Root under which loaded segments are cached, mirroring the data layout.
    pub cache_path: PathBuf,

    /// Append-only event log file. `None` leaves the event log unbound.
    pub event_log_path: Option<PathBuf>,

    /// Records kept by the in-memory event log.
    pub event_log_max_history: usize,

    /// Whether builds default to the resource-constrained code path.
    pub slow_mode: bool,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("vector_index_cache"),
            event_log_path: None,
            event_log_max_history: 10_000,
            slow_mode: false,
        }
    }
}

impl VectorIndexConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache root.
    #[must_use]
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Binds the event log to a file.
    #[must_use]
    pub fn event_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log_path = Some(path.into());
        self
    }

    /// Sets the in-memory event log history limit.
    #[must_use]
    pub const fn event_log_max_history(mut self, records: usize) -> Self {
        self.event_log_max_history = records;
        self
    }

    /// Sets whether builds default to slow mode.
    #[must_use]
    pub const fn slow_mode(mut self, value: bool) -> Self {
        self.slow_mode = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = VectorIndexConfig::default();
        assert_eq!(config.cache_path, PathBuf::from("vector_index_cache"));
        assert!(config.event_log_path.is_none());
        assert!(!config.slow_mode);
    }

    #[test]
    fn builder_pattern() {
        let config = VectorIndexConfig::new()
            .cache_path("/var/cache/vidx")
            .event_log_path("/var/log/vidx/events.jsonl")
            .event_log_max_history(16)
            .slow_mode(true);

        assert_eq!(config.cache_path, PathBuf::from("/var/cache/vidx"));
        assert_eq!(
            config.event_log_path,
            Some(PathBuf::from("/var/log/vidx/events.jsonl"))
        );
        assert_eq!(config.event_log_max_history, 16);
        assert!(config.slow_mode);
    }
}
