use crate::entry::Entry;
use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_BEFORE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());
static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// One stage of the entry filter chain: rewrite the entry or discard it by
/// returning `None`. On discard no further stage runs.
pub trait EntryFilter {
    fn name(&self) -> &'static str;
    fn apply(&self, entry: Entry) -> Option<Entry>;
}

/// Which optional stages the chain is built with. Rebuilt fresh at the start
/// of every read; the stage order itself is fixed.
#[derive(Debug, Clone)]
pub struct FilterPrefs {
    /// Drop embedded resource entries instead of carrying them through.
    pub skip_resources: bool,
    /// Strip control characters from words and definitions.
    pub sanitize_text: bool,
    /// Lowercase all words.
    pub lowercase: bool,
}

impl Default for FilterPrefs {
    fn default() -> Self {
        Self {
            skip_resources: false,
            sanitize_text: true,
            lowercase: true,
        }
    }
}

/// The composed chain. Order is significant and resolved at build time:
/// strip, drop empty words, optional stages, mark normalization, text
/// cleanup, then the final emptiness checks.
pub struct FilterChain {
    filters: Vec<Box<dyn EntryFilter>>,
}

impl FilterChain {
    pub fn build(prefs: &FilterPrefs) -> Self {
        let mut filters: Vec<Box<dyn EntryFilter>> = Vec::new();
        filters.push(Box::new(StripFilter));
        filters.push(Box::new(NonEmptyWordFilter));
        if prefs.skip_resources {
            filters.push(Box::new(SkipResourceFilter));
        }
        if prefs.sanitize_text {
            filters.push(Box::new(SanitizeTextFilter));
        }
        if prefs.lowercase {
            filters.push(Box::new(LowercaseFilter));
        }
        filters.push(Box::new(NormalizeMarksFilter));
        filters.push(Box::new(CleanTextFilter));
        filters.push(Box::new(NonEmptyWordFilter));
        filters.push(Box::new(NonEmptyDefiFilter));
        Self { filters }
    }

    /// Empty chain that passes everything through.
    pub fn passthrough() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn apply(&self, entry: Entry) -> Option<Entry> {
        let mut entry = entry;
        for filter in &self.filters {
            match filter.apply(entry) {
                Some(next) => entry = next,
                None => {
                    tracing::trace!(filter = filter.name(), "entry discarded");
                    return None;
                }
            }
        }
        Some(entry)
    }
}

fn map_term(entry: Entry, f: impl Fn(&mut Vec<String>, &mut Vec<String>)) -> Entry {
    match entry {
        Entry::Term(mut t) => {
            f(&mut t.words, &mut t.defis);
            Entry::Term(t)
        }
        resource => resource,
    }
}

/// Trim surrounding whitespace from words and definitions.
struct StripFilter;

impl EntryFilter for StripFilter {
    fn name(&self) -> &'static str {
        "strip"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        Some(map_term(entry, |words, defis| {
            for word in words.iter_mut() {
                *word = word.trim().to_string();
            }
            for defi in defis.iter_mut() {
                *defi = defi.trim().to_string();
            }
        }))
    }
}

/// Drop words that reduced to nothing, and the whole entry if none remain.
struct NonEmptyWordFilter;

impl EntryFilter for NonEmptyWordFilter {
    fn name(&self) -> &'static str {
        "non-empty-word"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        match entry {
            Entry::Term(mut t) => {
                t.words.retain(|w| !w.trim().is_empty());
                if t.words.is_empty() {
                    None
                } else {
                    Some(Entry::Term(t))
                }
            }
            resource => Some(resource),
        }
    }
}

/// Drop embedded resource entries.
struct SkipResourceFilter;

impl EntryFilter for SkipResourceFilter {
    fn name(&self) -> &'static str {
        "skip-resources"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        if entry.is_resource() {
            None
        } else {
            Some(entry)
        }
    }
}

/// Remove control characters (except newline and tab) from words and
/// definitions.
struct SanitizeTextFilter;

fn sanitize(text: &str) -> String {
    if text
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect()
    } else {
        text.to_string()
    }
}

impl EntryFilter for SanitizeTextFilter {
    fn name(&self) -> &'static str {
        "sanitize-text"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        Some(map_term(entry, |words, defis| {
            for word in words.iter_mut() {
                *word = sanitize(word);
            }
            for defi in defis.iter_mut() {
                *defi = sanitize(defi);
            }
        }))
    }
}

/// Lowercase all words.
struct LowercaseFilter;

impl EntryFilter for LowercaseFilter {
    fn name(&self) -> &'static str {
        "lowercase"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        Some(map_term(entry, |words, _| {
            for word in words.iter_mut() {
                *word = word.to_lowercase();
            }
        }))
    }
}

/// Strip directionality and joiner marks that some sources embed in
/// headwords; they break sorting and lookup.
struct NormalizeMarksFilter;

fn is_direction_mark(c: char) -> bool {
    matches!(c, '\u{200c}' | '\u{200d}' | '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}')
}

impl EntryFilter for NormalizeMarksFilter {
    fn name(&self) -> &'static str {
        "normalize-marks"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        Some(map_term(entry, |words, _| {
            for word in words.iter_mut() {
                if word.chars().any(is_direction_mark) {
                    *word = word.chars().filter(|c| !is_direction_mark(*c)).collect();
                }
            }
        }))
    }
}

/// Collapse trailing spaces before newlines and runs of blank lines in
/// definitions.
struct CleanTextFilter;

impl EntryFilter for CleanTextFilter {
    fn name(&self) -> &'static str {
        "clean-text"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        Some(map_term(entry, |_, defis| {
            for defi in defis.iter_mut() {
                if defi.contains('\n') {
                    let cleaned = SPACE_BEFORE_NEWLINE.replace_all(defi, "\n");
                    let cleaned = EXCESS_BLANK_LINES.replace_all(&cleaned, "\n\n");
                    *defi = cleaned.trim().to_string();
                }
            }
        }))
    }
}

/// Drop term entries whose definition reduced to nothing.
struct NonEmptyDefiFilter;

impl EntryFilter for NonEmptyDefiFilter {
    fn name(&self) -> &'static str {
        "non-empty-defi"
    }

    fn apply(&self, entry: Entry) -> Option<Entry> {
        match &entry {
            Entry::Term(t) if t.defis.iter().all(|d| d.trim().is_empty()) => None,
            _ => Some(entry),
        }
    }
}
