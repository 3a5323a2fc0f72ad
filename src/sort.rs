use crate::config::SPILL_BUF_SIZE;
use crate::entry::RawEntry;
use crate::error::Result;
use crate::reader::Reader;
use crate::registry::SortKeyFn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

/// Compute the sort key of a raw entry (resources sort by file name).
pub fn raw_sort_key(key: SortKeyFn, raw: &RawEntry) -> String {
    key(raw.sort_words())
}

#[derive(Serialize, Deserialize)]
struct SpillEntry {
    key: String,
    seq: u64,
    raw: RawEntry,
}

struct RunCursor {
    reader: BufReader<File>,
    remaining: u64,
}

impl RunCursor {
    fn next(&mut self) -> Result<Option<SpillEntry>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let entry: SpillEntry = bincode::deserialize_from(&mut self.reader)?;
        Ok(Some(entry))
    }
}

struct HeapItem {
    key: String,
    seq: u64,
    run: usize,
    raw: RawEntry,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we pop the lowest key first.
        // Ties break by arrival order to keep the sort stable.
        (other.key.as_str(), other.seq).cmp(&(self.key.as_str(), self.seq))
    }
}

/// Globally ordered lazy stream over one or more entry readers, using
/// bounded memory.
///
/// Each reader's stream is partitioned into runs of at most `cache_size`
/// entries; each run is sorted in memory and spilled to a temp file, then a
/// k-way heap merge pulls the lowest-key entry across all runs. The cache
/// size trades memory for spill volume and merge fan-in, never correctness.
pub struct SortedStream {
    runs: Vec<RunCursor>,
    heap: BinaryHeap<HeapItem>,
    // Keeps the spill files alive for the lifetime of the merge.
    _spill_dir: TempDir,
}

impl SortedStream {
    /// Drain `readers` into sorted spill runs and prime the merge. Every
    /// reader is closed before this returns, on success and on error.
    pub fn build(
        mut readers: Vec<Box<dyn Reader>>,
        cache_size: usize,
        key: SortKeyFn,
    ) -> Result<SortedStream> {
        let spill_dir = TempDir::new()?;
        let cache_size = cache_size.max(1);
        let mut run_paths = Vec::new();
        let mut seq = 0u64;

        let spilled = (|| -> Result<()> {
            for reader in readers.iter_mut() {
                let mut buf: Vec<SpillEntry> = Vec::with_capacity(cache_size.min(4096));
                while let Some(entry) = reader.next_entry()? {
                    let raw = entry.into_raw();
                    buf.push(SpillEntry {
                        key: raw_sort_key(key, &raw),
                        seq,
                        raw,
                    });
                    seq += 1;
                    if buf.len() >= cache_size {
                        run_paths.push(spill_run(spill_dir.path(), run_paths.len(), &mut buf)?);
                    }
                }
                if !buf.is_empty() {
                    run_paths.push(spill_run(spill_dir.path(), run_paths.len(), &mut buf)?);
                }
                reader.close();
            }
            Ok(())
        })();
        // close() is idempotent; make sure no reader leaks when a run fails
        for reader in readers.iter_mut() {
            reader.close();
        }
        spilled?;

        debug!(
            runs = run_paths.len(),
            entries = seq,
            cache_size,
            "spill phase complete"
        );

        let mut runs = Vec::with_capacity(run_paths.len());
        let mut heap = BinaryHeap::with_capacity(run_paths.len());
        for (idx, (path, len)) in run_paths.into_iter().enumerate() {
            let file = File::open(&path)?;
            let mut cursor = RunCursor {
                reader: BufReader::with_capacity(SPILL_BUF_SIZE, file),
                remaining: len,
            };
            if let Some(entry) = cursor.next()? {
                heap.push(HeapItem {
                    key: entry.key,
                    seq: entry.seq,
                    run: idx,
                    raw: entry.raw,
                });
            }
            runs.push(cursor);
        }

        Ok(SortedStream {
            runs,
            heap,
            _spill_dir: spill_dir,
        })
    }

    /// Pull the next entry in key order, or `None` when all runs are drained.
    pub fn next_raw(&mut self) -> Result<Option<RawEntry>> {
        let Some(item) = self.heap.pop() else {
            return Ok(None);
        };
        if let Some(next) = self.runs[item.run].next()? {
            self.heap.push(HeapItem {
                key: next.key,
                seq: next.seq,
                run: item.run,
                raw: next.raw,
            });
        }
        Ok(Some(item.raw))
    }
}

/// Stable-sort the buffered run and write it out, returning its path and
/// entry count. The buffer is left empty for reuse.
fn spill_run(
    dir: &Path,
    index: usize,
    buf: &mut Vec<SpillEntry>,
) -> Result<(std::path::PathBuf, u64)> {
    buf.sort_by(|a, b| (a.key.as_str(), a.seq).cmp(&(b.key.as_str(), b.seq)));
    let path = dir.join(format!("run_{:04}.bin", index));
    let mut writer = BufWriter::with_capacity(SPILL_BUF_SIZE, File::create(&path)?);
    let len = buf.len() as u64;
    for entry in buf.drain(..) {
        bincode::serialize_into(&mut writer, &entry)?;
    }
    use std::io::Write;
    writer.flush()?;
    Ok((path, len))
}

/// Stable in-memory sort of a materialized entry list.
pub fn sort_materialized(data: &mut [RawEntry], key: SortKeyFn) {
    data.sort_by_cached_key(|raw| raw_sort_key(key, raw));
}
