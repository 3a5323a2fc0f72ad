use crate::entry::Entry;
use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Caller-supplied read/write options, validated against the format's
/// recognized key set before use.
pub type Options = HashMap<String, String>;

/// What the pipeline requires of a format-specific reader.
///
/// A reader is a lazy, forward-only, non-restartable entry stream. The
/// glossary owns it exclusively while attached and guarantees `close()` on
/// every exit path, including an error raised mid-iteration.
pub trait Reader {
    /// Open the source. Fails with [`GlossaryError::Open`] on missing or
    /// corrupt input.
    ///
    /// [`GlossaryError::Open`]: crate::error::GlossaryError::Open
    fn open(&mut self, path: &Path, options: &Options) -> Result<()>;

    /// Best-effort total entry count, used only for progress estimation.
    /// `None` disables progress reporting and is never an error.
    fn len_hint(&self) -> Option<u64> {
        None
    }

    /// Pull the next entry. `Ok(None)` means the stream is exhausted.
    /// Unparseable input fails the whole read; skipping individual entries
    /// is the filter chain's responsibility.
    fn next_entry(&mut self) -> Result<Option<Entry>>;

    /// Glossary-level metadata found in the source (e.g. header lines),
    /// available after `open`.
    fn info(&self) -> &[(String, String)] {
        &[]
    }

    /// Release resources. Must be idempotent.
    fn close(&mut self);
}
