//! Store configuration.

/// Default number of entries held in the memory tier.
pub const DEFAULT_MAX_MEM_CACHE_SIZE: usize = 5;

/// Default share of the current total evicted when the cap is exceeded.
pub const DEFAULT_EVICTION_PERCENT: u8 = 5;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Memory tier capacity in entries. Saving beyond it spills the oldest
    /// memory entries to disk. `0` writes every entry straight through.
    pub max_mem_cache_size: usize,

    /// Total entry cap across both tiers (0 = unbounded).
    pub max_file_size: usize,

    /// Percentage of the current total evicted once the cap is exceeded.
    /// At least one entry is always evicted.
    pub eviction_percent: u8,

    /// Whether to fsync every entry file as it is written (safer but slower).
    pub sync_on_write: bool,

    /// Whether to flush the memory tier to disk when the store shuts down.
    pub flush_on_shutdown: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_mem_cache_size: DEFAULT_MAX_MEM_CACHE_SIZE,
            max_file_size: 0,
            eviction_percent: DEFAULT_EVICTION_PERCENT,
            sync_on_write: false,
            flush_on_shutdown: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the memory tier capacity.
    #[must_use]
    pub const fn max_mem_cache_size(mut self, size: usize) -> Self {
        self.max_mem_cache_size = size;
        self
    }

    /// Sets the total entry cap (0 = unbounded).
    #[must_use]
    pub const fn max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets the eviction percentage, clamped to 1..=100.
    #[must_use]
    pub const fn eviction_percent(mut self, percent: u8) -> Self {
        self.eviction_percent = if percent == 0 {
            1
        } else if percent > 100 {
            100
        } else {
            percent
        };
        self
    }

    /// Sets whether each entry file is fsynced on write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets whether the memory tier is flushed on shutdown.
    #[must_use]
    pub const fn flush_on_shutdown(mut self, value: bool) -> Self {
        self.flush_on_shutdown = value;
        self
    }
}
