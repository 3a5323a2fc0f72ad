/// Default entry cache size for the streaming sort (entries per run)
pub const DEFAULT_SORT_CACHE_SIZE: usize = 1000;

/// Buffer size for spill-run files written during streaming sort
pub const SPILL_BUF_SIZE: usize = 256 * 1024;

/// Buffer size for format writers
pub const WRITE_BUF_SIZE: usize = 128 * 1024;
