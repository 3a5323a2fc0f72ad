use crate::config::DEFAULT_SORT_CACHE_SIZE;
use crate::convert::{absolute, decompress, split_archive_suffix};
use crate::entry::{DefiFormat, Entry, RawEntry};
use crate::error::{GlossaryError, Result};
use crate::filters::{FilterChain, FilterPrefs};
use crate::info::GlossaryInfo;
use crate::reader::{Options, Reader};
use crate::registry::{default_sort_key, Registry, SortKeyFn, SortPolicy};
use crate::sort::{sort_materialized, SortedStream};
use indicatif::ProgressBar;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The active data source. Exactly one variant holds data at any time;
/// transitioning from `Streaming` to `Materialized` (the drain) is one-way.
enum Source {
    Empty,
    Materialized(Vec<RawEntry>),
    Streaming(Vec<Box<dyn Reader>>),
}

/// Position of the unified iteration surface over the current source.
enum Cursor {
    /// No iterator built yet; `read` or `update_iter` must run first.
    Blank,
    /// Reconstructing entries one at a time from the materialized list.
    Loaded {
        index: usize,
        bar: Option<ProgressBar>,
    },
    /// Draining open readers in attachment order, closing each before the
    /// next begins.
    Streamed {
        reader_idx: usize,
        bar: Option<ProgressBar>,
    },
    /// Pulling from the external sort-merge.
    Sorted(SortedStream),
}

/// Parameters for [`Glossary::read`].
pub struct ReadRequest {
    /// Format name; `None` detects from the file extension.
    pub format: Option<String>,
    /// Attach a streaming reader instead of materializing.
    pub direct: bool,
    pub progress: bool,
    pub options: Options,
}

impl Default for ReadRequest {
    fn default() -> Self {
        Self {
            format: None,
            direct: false,
            progress: true,
            options: Options::new(),
        }
    }
}

/// Parameters for [`Glossary::write`].
pub struct WriteRequest {
    /// `None` lets the format's sort-on-write policy decide.
    pub sort: Option<bool>,
    pub sort_key: Option<SortKeyFn>,
    /// Streaming sort cache size in entries; non-positive keeps the current
    /// value.
    pub sort_cache_size: usize,
    pub options: Options,
}

impl Default for WriteRequest {
    fn default() -> Self {
        Self {
            sort: None,
            sort_key: None,
            sort_cache_size: 0,
            options: Options::new(),
        }
    }
}

/// One glossary being converted: metadata plus either a materialized entry
/// list (indirect mode) or a set of open streaming readers (direct mode),
/// with a single lazy, filtered iteration surface over whichever is active.
pub struct Glossary {
    info: GlossaryInfo,
    source: Source,
    cursor: Cursor,
    filters: FilterChain,
    prefs: FilterPrefs,
    default_format: DefiFormat,
    sort_key: Option<SortKeyFn>,
    sort_cache_size: usize,
    input_stem: PathBuf,
    progress_enabled: bool,
    emitted: u64,
}

impl Default for Glossary {
    fn default() -> Self {
        Self::new()
    }
}

impl Glossary {
    pub fn new() -> Self {
        Self {
            info: GlossaryInfo::new(),
            source: Source::Empty,
            cursor: Cursor::Blank,
            filters: FilterChain::passthrough(),
            prefs: FilterPrefs::default(),
            default_format: DefiFormat::PlainText,
            sort_key: None,
            sort_cache_size: DEFAULT_SORT_CACHE_SIZE,
            input_stem: PathBuf::new(),
            progress_enabled: true,
            emitted: 0,
        }
    }

    /// Close any open readers and reset to the initial state. Runs after
    /// every write, successful or not.
    pub fn clear(&mut self) {
        if let Source::Streaming(readers) = &mut self.source {
            for reader in readers {
                reader.close();
            }
        }
        self.info.clear();
        self.source = Source::Empty;
        self.cursor = Cursor::Blank;
        self.filters = FilterChain::passthrough();
        self.prefs = FilterPrefs::default();
        self.default_format = DefiFormat::PlainText;
        self.sort_key = None;
        self.sort_cache_size = DEFAULT_SORT_CACHE_SIZE;
        self.input_stem = PathBuf::new();
        self.emitted = 0;
    }

    pub fn info(&self) -> &GlossaryInfo {
        &self.info
    }

    pub fn set_info(&mut self, key: &str, value: &str) {
        self.info.set(key, value);
    }

    pub fn get_info(&self, key: &str) -> Option<&str> {
        self.info.get(key)
    }

    pub fn set_filter_prefs(&mut self, prefs: FilterPrefs) {
        self.prefs = prefs;
    }

    /// Rebuild the filter chain from the current preferences. `read` does
    /// this automatically; manual pipelines call it before iterating.
    pub fn update_entry_filters(&mut self) {
        self.filters = FilterChain::build(&self.prefs);
    }

    pub fn default_format(&self) -> DefiFormat {
        self.default_format
    }

    pub fn set_default_format(&mut self, format: DefiFormat) {
        self.default_format = format;
    }

    /// Non-positive sizes are ignored, keeping the previous value.
    pub fn set_sort_cache_size(&mut self, size: usize) {
        if size > 0 {
            self.sort_cache_size = size;
        }
    }

    pub fn sort_cache_size(&self) -> usize {
        self.sort_cache_size
    }

    /// Materialized entry count plus the best-effort hints of open readers.
    pub fn approx_len(&self) -> u64 {
        match &self.source {
            Source::Empty => 0,
            Source::Materialized(data) => data.len() as u64,
            Source::Streaming(readers) => readers.iter().filter_map(|r| r.len_hint()).sum(),
        }
    }

    /// Add one entry to the materialized list. Fails with a state error in
    /// direct mode: the two sources never mix.
    pub fn add_entry(&mut self, entry: Entry) -> Result<()> {
        if matches!(self.source, Source::Streaming(_)) {
            return Err(GlossaryError::State(
                "cannot add entries while streaming readers are attached".into(),
            ));
        }
        self.push_raw(entry.into_raw());
        Ok(())
    }

    fn push_raw(&mut self, raw: RawEntry) {
        match &mut self.source {
            Source::Materialized(data) => data.push(raw),
            _ => self.source = Source::Materialized(vec![raw]),
        }
    }

    /// Read a glossary file. Indirect mode drains the reader into the
    /// materialized list; direct mode attaches it as an open stream.
    /// Archive suffixes (`.gz`, `.bz2`, `.zip`) are decompressed first via
    /// the external tool.
    pub fn read(&mut self, registry: &Registry, path: &Path, request: ReadRequest) -> Result<()> {
        match &self.source {
            Source::Streaming(readers) if !request.direct => {
                return Err(GlossaryError::State(format!(
                    "{} readers are already attached; indirect read would silently merge modes",
                    readers.len()
                )));
            }
            Source::Materialized(data) if request.direct && !data.is_empty() => {
                return Err(GlossaryError::State(
                    "glossary already holds materialized entries; direct read would shadow them"
                        .into(),
                ));
            }
            _ => {}
        }

        self.update_entry_filters();
        self.progress_enabled = request.progress;

        let path = absolute(path);
        let (path, unpacked_temp) = match split_archive_suffix(&path) {
            Some((inner, kind)) => {
                info!(path = ?path, "decompressing input archive");
                decompress(&path, kind)?;
                (inner, true)
            }
            None => (path, false),
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let format = match &request.format {
            Some(name) => name.clone(),
            None => registry
                .by_extension(&ext)
                .map(|d| d.name.to_string())
                .ok_or_else(|| GlossaryError::FormatResolution(path.clone()))?,
        };
        let desc = registry
            .by_name(&format)
            .ok_or_else(|| GlossaryError::FormatResolution(path.clone()))?;
        let factory = desc.reader.ok_or_else(|| GlossaryError::Unsupported {
            format: format.clone(),
            operation: "read",
        })?;
        let options = registry.validated_options(desc, &request.options, "read");

        self.input_stem = if desc.extensions.contains(&ext.as_str()) {
            path.with_extension("")
        } else {
            path.clone()
        };
        if self.info.get("name").is_none() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                self.info.set("name", name);
            }
        }

        let mut reader = factory();
        reader.open(&path, &options)?;
        for (key, value) in reader.info().to_vec() {
            self.info.set(&key, &value);
        }

        if request.direct {
            debug!(format = %format, "reader attached for direct conversion");
            match &mut self.source {
                Source::Streaming(readers) => readers.push(reader),
                _ => self.source = Source::Streaming(vec![reader]),
            }
        } else {
            self.load_reader(reader)?;
            if unpacked_temp {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(error = %e, path = ?path, "failed to remove decompressed temp file");
                }
            }
        }

        self.update_iter(false)
    }

    /// Drain one reader into the materialized list, closing it on every exit
    /// path.
    fn load_reader(&mut self, mut reader: Box<dyn Reader>) -> Result<()> {
        let bar = if self.progress_enabled {
            reader.len_hint().filter(|n| *n > 0).map(ProgressBar::new)
        } else {
            None
        };
        let result = (|| -> Result<()> {
            while let Some(entry) = reader.next_entry()? {
                if let Some(b) = &bar {
                    b.inc(1);
                }
                self.push_raw(entry.into_raw());
            }
            Ok(())
        })();
        reader.close();
        if let Some(b) = bar {
            b.finish_and_clear();
        }
        result
    }

    /// Drain every open reader into the materialized list and leave direct
    /// mode. One-way for this glossary instance.
    pub fn materialize(&mut self) -> Result<()> {
        let Source::Streaming(readers) = &mut self.source else {
            return Ok(());
        };
        let readers = mem::take(readers);
        self.source = Source::Materialized(Vec::new());
        let mut failed = None;
        for mut reader in readers {
            if failed.is_some() {
                reader.close();
                continue;
            }
            if let Err(e) = self.load_reader(reader) {
                failed = Some(e);
            }
        }
        match failed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Rebuild the iteration surface over the current source. With
    /// `sort = true` in direct mode this runs the spill phase of the
    /// external sort, bounded by the configured cache size.
    pub fn update_iter(&mut self, sort: bool) -> Result<()> {
        self.emitted = 0;
        match (&mut self.source, sort) {
            (Source::Streaming(readers), true) => {
                let key = self.sort_key.unwrap_or(default_sort_key);
                info!(
                    cache_size = self.sort_cache_size,
                    readers = readers.len(),
                    "stream sorting enabled"
                );
                let readers = mem::take(readers);
                self.source = Source::Empty;
                let stream = SortedStream::build(readers, self.sort_cache_size, key)?;
                self.cursor = Cursor::Sorted(stream);
            }
            (Source::Streaming(_), false) => {
                self.cursor = Cursor::Streamed {
                    reader_idx: 0,
                    bar: None,
                };
            }
            _ => {
                let total = match &self.source {
                    Source::Materialized(data) => data.len() as u64,
                    _ => 0,
                };
                let bar = if self.progress_enabled && total > 0 {
                    Some(ProgressBar::new(total))
                } else {
                    None
                };
                self.cursor = Cursor::Loaded { index: 0, bar };
            }
        }
        Ok(())
    }

    /// Switch or set the sort key and rebuild the iterator sorted. In
    /// indirect mode the materialized list is sorted in place (stable); in
    /// direct mode the key takes effect for the streaming sort-merge.
    pub fn sort_words(&mut self, key: Option<SortKeyFn>, cache_size: usize) -> Result<()> {
        match &mut self.source {
            Source::Streaming(_) => {
                self.sort_key = key;
                self.set_sort_cache_size(cache_size);
            }
            Source::Materialized(data) => {
                sort_materialized(data, key.unwrap_or(default_sort_key));
            }
            Source::Empty => {}
        }
        self.update_iter(true)
    }

    /// Pull the next entry through the filter chain. `Ok(None)` after
    /// exhaustion until `update_iter` rebuilds the surface.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        loop {
            let Some(entry) = self.pull_unfiltered()? else {
                return Ok(None);
            };
            if let Some(entry) = self.filters.apply(entry) {
                self.emitted += 1;
                return Ok(Some(entry));
            }
        }
    }

    fn pull_unfiltered(&mut self) -> Result<Option<Entry>> {
        match &mut self.cursor {
            Cursor::Blank => {
                warn!("iterating a blank glossary; call read() or update_iter() first");
                Ok(None)
            }
            Cursor::Loaded { index, bar } => {
                let Source::Materialized(data) = &self.source else {
                    return Ok(None);
                };
                match data.get(*index) {
                    Some(raw) => {
                        *index += 1;
                        if let Some(b) = bar {
                            b.inc(1);
                        }
                        Ok(Some(Entry::from_raw(raw.clone(), self.default_format)))
                    }
                    None => {
                        if let Some(b) = bar.take() {
                            b.finish_and_clear();
                        }
                        Ok(None)
                    }
                }
            }
            Cursor::Streamed { reader_idx, bar } => {
                let progress = self.progress_enabled;
                let Source::Streaming(readers) = &mut self.source else {
                    return Ok(None);
                };
                loop {
                    let Some(reader) = readers.get_mut(*reader_idx) else {
                        return Ok(None);
                    };
                    if bar.is_none() && progress {
                        *bar = reader.len_hint().filter(|n| *n > 0).map(ProgressBar::new);
                    }
                    match reader.next_entry() {
                        Ok(Some(entry)) => {
                            if let Some(b) = bar {
                                b.inc(1);
                            }
                            return Ok(Some(entry));
                        }
                        Ok(None) => {
                            reader.close();
                            *reader_idx += 1;
                            if let Some(b) = bar.take() {
                                b.finish_and_clear();
                            }
                        }
                        Err(e) => {
                            reader.close();
                            return Err(e);
                        }
                    }
                }
            }
            Cursor::Sorted(stream) => Ok(stream
                .next_raw()?
                .map(|raw| Entry::from_raw(raw, self.default_format))),
        }
    }

    /// Iterator adapter over [`next_entry`](Self::next_entry).
    pub fn entries(&mut self) -> Entries<'_> {
        Entries { glos: self }
    }

    /// Write the glossary through a format's write function.
    ///
    /// Returns the absolute output path on success. Failures are logged and
    /// yield `None`; they never propagate past the pipeline boundary. The
    /// glossary is cleared after the writer runs, on success and on failure.
    pub fn write(
        &mut self,
        registry: &Registry,
        path: &Path,
        format: &str,
        request: WriteRequest,
    ) -> Option<PathBuf> {
        let mut path = absolute(path);
        if path.is_dir() {
            match self.input_stem.file_name() {
                Some(base) => path = path.join(base),
                None => {
                    error!(path = ?path, "output is a directory and no input name is known");
                    return None;
                }
            }
        }

        let Some(desc) = registry.by_name(format) else {
            error!(format, "unknown output format");
            return None;
        };
        let Some(writer) = desc.writer else {
            error!(format, "format has no write support");
            return None;
        };
        let options = registry.validated_options(desc, &request.options, "write");

        let mut sort = request.sort;
        match desc.sort_policy {
            SortPolicy::Always => {
                if sort == Some(false) {
                    warn!(format, "output format requires sorting; ignoring sort=false");
                }
                if matches!(self.source, Source::Streaming(_)) {
                    warn!(
                        format,
                        "output format requires a full sort; draining streaming readers"
                    );
                    if let Err(e) = self.materialize() {
                        error!(error = %e, "failed to drain readers");
                        self.clear();
                        return None;
                    }
                    info!(entries = self.approx_len(), "entries loaded");
                }
                sort = Some(true);
            }
            SortPolicy::DefaultYes => sort = Some(sort.unwrap_or(true)),
            SortPolicy::DefaultNo => sort = Some(sort.unwrap_or(false)),
            SortPolicy::Never => {
                if sort == Some(true) {
                    warn!(format, "output format forbids sorting; ignoring sort=true");
                }
                sort = Some(false);
            }
        }

        let prepared = if sort == Some(true) {
            let mut key = request.sort_key;
            if key.is_none() {
                if desc.sort_key.is_some() {
                    debug!(format, "using sort key from output format");
                }
                key = desc.sort_key;
            } else if desc.sort_policy == SortPolicy::Always && desc.sort_key.is_some() {
                warn!(format, "ignoring caller sort key; output format supplies its own");
                key = desc.sort_key;
            }
            self.sort_words(key, request.sort_cache_size)
        } else {
            self.update_iter(false)
        };
        if let Err(e) = prepared {
            error!(error = %e, "failed to prepare entry stream");
            self.clear();
            return None;
        }

        info!(path = ?path, format, "writing");
        let result = writer(self, &path, &options);
        let emitted = self.emitted;
        self.clear();
        match result {
            Ok(()) => {
                info!(entries = emitted, "write complete");
                Some(path)
            }
            Err(e) => {
                error!(error = %e, path = ?path, "write failed");
                None
            }
        }
    }
}

pub struct Entries<'a> {
    glos: &'a mut Glossary,
}

impl Iterator for Entries<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.glos.next_entry().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::testutil::VecReader;
    use crate::registry::FormatDesc;

    fn term(word: &str, defi: &str) -> Entry {
        Entry::new(word, defi, DefiFormat::PlainText).unwrap()
    }

    fn fruit_entries() -> Vec<Entry> {
        vec![
            term("Apple", "a fruit"),
            term("  ", "discarded"),
            Entry::term(
                vec!["Banana".into(), "banana fruit".into()],
                vec!["a yellow fruit".into()],
                DefiFormat::PlainText,
            )
            .unwrap(),
        ]
    }

    fn fruit_reader() -> Box<dyn Reader> {
        Box::new(VecReader::new(fruit_entries()))
    }

    fn shuffled_reader() -> Box<dyn Reader> {
        Box::new(VecReader::new(vec![
            term("cherry", "red"),
            term("apple", "green"),
            term("banana", "yellow"),
        ]))
    }

    fn line_writer(
        glos: &mut Glossary,
        path: &Path,
        _options: &Options,
    ) -> crate::error::Result<()> {
        use std::io::Write;
        let mut file = fs::File::create(path)?;
        while let Some(entry) = glos.next_entry()? {
            writeln!(file, "{}", entry.word())?;
        }
        Ok(())
    }

    fn failing_writer(
        _glos: &mut Glossary,
        _path: &Path,
        _options: &Options,
    ) -> crate::error::Result<()> {
        Err(GlossaryError::Write("boom".into()))
    }

    fn mem_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(FormatDesc {
            name: "mem",
            description: "in-memory fruit fixture",
            extensions: &["mem"],
            read_options: &[],
            write_options: &[],
            reader: Some(fruit_reader),
            writer: Some(line_writer),
            sort_policy: SortPolicy::DefaultNo,
            sort_key: None,
        });
        registry.register(FormatDesc {
            name: "shuffled",
            description: "unsorted fixture",
            extensions: &["shuf"],
            read_options: &[],
            write_options: &[],
            reader: Some(shuffled_reader),
            writer: None,
            sort_policy: SortPolicy::DefaultNo,
            sort_key: None,
        });
        registry.register(FormatDesc {
            name: "sorted-out",
            description: "write target that requires sorting",
            extensions: &["srt"],
            read_options: &[],
            write_options: &[],
            reader: None,
            writer: Some(line_writer),
            sort_policy: SortPolicy::Always,
            sort_key: None,
        });
        registry.register(FormatDesc {
            name: "broken-out",
            description: "write target that always fails",
            extensions: &["brk"],
            read_options: &[],
            write_options: &[],
            reader: None,
            writer: Some(failing_writer),
            sort_policy: SortPolicy::DefaultNo,
            sort_key: None,
        });
        registry
    }

    fn quiet_read(direct: bool) -> ReadRequest {
        ReadRequest {
            format: Some("mem".into()),
            direct,
            progress: false,
            ..ReadRequest::default()
        }
    }

    fn collect_words(glos: &mut Glossary) -> Vec<String> {
        let mut words = Vec::new();
        while let Some(entry) = glos.next_entry().unwrap() {
            words.push(entry.word().to_string());
        }
        words
    }

    #[test]
    fn indirect_read_filters_and_materializes() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(false))
            .unwrap();
        // materialized list holds the unfiltered entries; filters run on pull
        assert_eq!(glos.approx_len(), 3);
        assert_eq!(collect_words(&mut glos), vec!["apple", "banana"]);
    }

    #[test]
    fn direct_read_streams_and_filters() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(true))
            .unwrap();
        assert_eq!(collect_words(&mut glos), vec!["apple", "banana"]);
    }

    #[test]
    fn indirect_read_rejected_while_streaming() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(true))
            .unwrap();
        let result = glos.read(&registry, Path::new("fruits.mem"), quiet_read(false));
        assert!(matches!(result, Err(GlossaryError::State(_))));
    }

    #[test]
    fn exhausted_iterator_stays_empty_until_rebuilt() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(false))
            .unwrap();
        assert_eq!(collect_words(&mut glos).len(), 2);
        assert!(collect_words(&mut glos).is_empty());
        glos.update_iter(false).unwrap();
        assert_eq!(collect_words(&mut glos).len(), 2);
    }

    #[test]
    fn blank_glossary_yields_nothing() {
        let mut glos = Glossary::new();
        assert!(glos.next_entry().unwrap().is_none());
    }

    #[test]
    fn add_entry_rejected_in_direct_mode() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(true))
            .unwrap();
        let result = glos.add_entry(term("manual", "entry"));
        assert!(matches!(result, Err(GlossaryError::State(_))));
    }

    #[test]
    fn manual_entries_iterate_after_update_iter() {
        let mut glos = Glossary::new();
        glos.add_entry(term("zebra", "animal")).unwrap();
        glos.add_entry(term("ant", "insect")).unwrap();
        glos.update_iter(false).unwrap();
        assert_eq!(collect_words(&mut glos), vec!["zebra", "ant"]);
    }

    #[test]
    fn sort_words_orders_materialized_entries() {
        let mut glos = Glossary::new();
        glos.add_entry(term("zebra", "animal")).unwrap();
        glos.add_entry(term("ant", "insect")).unwrap();
        glos.add_entry(term("mole", "animal")).unwrap();
        glos.sort_words(None, 0).unwrap();
        assert_eq!(collect_words(&mut glos), vec!["ant", "mole", "zebra"]);
    }

    #[test]
    fn streaming_sort_produces_ordered_output() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(
            &registry,
            Path::new("mixed.shuf"),
            ReadRequest {
                format: Some("shuffled".into()),
                direct: true,
                progress: false,
                ..ReadRequest::default()
            },
        )
        .unwrap();
        glos.sort_words(None, 2).unwrap();
        assert_eq!(collect_words(&mut glos), vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn nonpositive_sort_cache_is_a_noop() {
        let mut glos = Glossary::new();
        glos.set_sort_cache_size(7);
        glos.set_sort_cache_size(0);
        assert_eq!(glos.sort_cache_size(), 7);
    }

    #[test]
    fn write_always_policy_sorts_and_drains() {
        let registry = mem_registry();
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.srt");

        let mut glos = Glossary::new();
        glos.read(
            &registry,
            Path::new("mixed.shuf"),
            ReadRequest {
                format: Some("shuffled".into()),
                direct: true,
                progress: false,
                ..ReadRequest::default()
            },
        )
        .unwrap();
        // no sort preference given; the Always policy must force it
        let written = glos.write(&registry, &out, "sorted-out", WriteRequest::default());
        assert!(written.is_some());

        let content = fs::read_to_string(&out).unwrap();
        let words: Vec<&str> = content.lines().collect();
        assert_eq!(words, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn write_clears_state_on_success() {
        let registry = mem_registry();
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.mem");

        let mut glos = Glossary::new();
        glos.set_info("name", "fruits");
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(false))
            .unwrap();
        glos.write(&registry, &out, "mem", WriteRequest::default())
            .unwrap();
        assert_eq!(glos.approx_len(), 0);
        assert!(glos.info().is_empty());
    }

    #[test]
    fn write_failure_returns_none_and_clears() {
        let registry = mem_registry();
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.brk");

        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(false))
            .unwrap();
        let written = glos.write(&registry, &out, "broken-out", WriteRequest::default());
        assert!(written.is_none());
        assert_eq!(glos.approx_len(), 0);
    }

    #[test]
    fn write_to_unknown_format_returns_none() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.add_entry(term("word", "defi")).unwrap();
        let written = glos.write(
            &registry,
            Path::new("/tmp/out.xyz"),
            "nonexistent",
            WriteRequest::default(),
        );
        assert!(written.is_none());
    }

    #[test]
    fn read_sets_name_from_filename() {
        let registry = mem_registry();
        let mut glos = Glossary::new();
        glos.read(&registry, Path::new("fruits.mem"), quiet_read(false))
            .unwrap();
        assert_eq!(glos.get_info("name"), Some("fruits.mem"));
    }
}
