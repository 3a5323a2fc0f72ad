//! Glosstool: dictionary glossary conversion pipeline
//!
//! This crate converts dictionary glossaries between formats through a single
//! pipeline built around one abstraction, the [`glossary::Glossary`]:
//!
//! 1. **Read** -- A format reader parses the input into a lazy entry stream.
//!    Indirect mode materializes every entry up front; direct mode keeps the
//!    readers open and pulls entries one at a time
//! 2. **Filter** -- Every entry passes through a fixed-order filter chain
//!    (whitespace stripping, sanitization, emptiness checks) before it is
//!    observed by anything downstream
//! 3. **Sort** (optional or format-mandated) -- In-memory stable sort for
//!    materialized entries; an external sort-merge with bounded memory for
//!    direct mode, spilling sorted runs to temp files and heap-merging them
//! 4. **Write** -- A format writer drains the entry stream into the output
//!    file, after which the glossary resets for reuse
//!
//! # Architecture
//!
//! The pipeline is designed for large glossaries and small memory:
//!
//! - **Streaming readers** -- Never load the input into memory unless asked;
//!    direct conversion is flat-memory end to end
//! - **Mode exclusivity** -- Materialized entries and open readers never
//!    coexist; illegal combinations fail with a state error instead of
//!    silently merging
//! - **Bounded sorting** -- The streaming sort holds at most the configured
//!    cache size in memory, trading spill volume for footprint, never
//!    correctness
//! - **Guaranteed cleanup** -- Readers are closed on every exit path,
//!    including errors raised mid-iteration
//!
//! # Key Modules
//!
//! - [`glossary`] -- The central state machine: modes, iteration, write policy
//! - [`convert`] -- One-call conversion orchestration and archive handling
//! - [`registry`] -- Format table with read/write capabilities and sort policies
//! - [`formats`] -- Built-in formats (tabfile, dict source, json)
//! - [`sort`] -- External sort-merge with spill runs
//! - [`filters`] -- The entry filter chain
//! - [`entry`] -- Entry model (word senses and binary resources)
//! - [`info`] -- Glossary metadata with key alias normalization
//! - [`reader`] -- The reader capability formats implement
//! - [`config`] -- Cache and buffer size constants
//!
//! # Example Usage
//!
//! ```bash
//! # Convert a tabfile to a sorted dict source file
//! glosstool convert input.txt output.dict
//!
//! # Force streaming conversion with a small sort cache
//! glosstool convert big.txt out.json --direct --sort --sort-cache-size 500
//!
//! # List available formats
//! glosstool formats
//! ```

pub mod config;
pub mod convert;
pub mod entry;
pub mod error;
pub mod filters;
pub mod formats;
pub mod glossary;
pub mod info;
pub mod reader;
pub mod registry;
pub mod sort;
