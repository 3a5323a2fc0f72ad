use crate::error::{GlossaryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::slice;

/// Markup of a definition body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefiFormat {
    /// Plain text ("m")
    #[default]
    #[serde(rename = "m")]
    PlainText,
    /// HTML ("h")
    #[serde(rename = "h")]
    Html,
    /// XDXF markup ("x")
    #[serde(rename = "x")]
    Xdxf,
}

impl DefiFormat {
    pub fn code(&self) -> &'static str {
        match self {
            DefiFormat::PlainText => "m",
            DefiFormat::Html => "h",
            DefiFormat::Xdxf => "x",
        }
    }

    pub fn from_code(code: &str) -> Option<DefiFormat> {
        match code {
            "m" => Some(DefiFormat::PlainText),
            "h" => Some(DefiFormat::Html),
            "x" => Some(DefiFormat::Xdxf),
            _ => None,
        }
    }
}

/// A word sense: headword plus alternates, and one or more definition bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub(crate) words: Vec<String>,
    pub(crate) defis: Vec<String>,
    pub(crate) format: DefiFormat,
}

/// An embedded binary resource (image, audio) carried alongside word senses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

/// One glossary item, either a word sense or an embedded resource.
///
/// Entries are immutable after construction as far as callers are concerned;
/// only the filter chain rewrites them, by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Term(TermEntry),
    Resource(ResourceEntry),
}

/// Compact interchange form used for the materialized entry list and for
/// spill runs during streaming sort. Keeps per-entry overhead low: a term
/// entry with no explicit format stores `None` and is filled with the
/// glossary default on reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawEntry {
    Term {
        words: Vec<String>,
        defis: Vec<String>,
        format: Option<DefiFormat>,
    },
    Resource {
        name: String,
        data: Vec<u8>,
    },
}

impl RawEntry {
    /// Words this entry sorts under. Resources sort by their file name.
    pub fn sort_words(&self) -> &[String] {
        match self {
            RawEntry::Term { words, .. } => words,
            RawEntry::Resource { name, .. } => slice::from_ref(name),
        }
    }
}

impl Entry {
    /// Build a term entry. Fails if `words` is empty; whitespace-only words
    /// are allowed here and dropped later by the filter chain.
    pub fn term(words: Vec<String>, defis: Vec<String>, format: DefiFormat) -> Result<Entry> {
        if words.is_empty() {
            return Err(GlossaryError::EmptyEntry);
        }
        Ok(Entry::Term(TermEntry {
            words,
            defis,
            format,
        }))
    }

    /// Convenience constructor for a single word and definition.
    pub fn new(word: &str, defi: &str, format: DefiFormat) -> Result<Entry> {
        Entry::term(vec![word.to_string()], vec![defi.to_string()], format)
    }

    pub fn resource(name: String, data: Vec<u8>) -> Entry {
        Entry::Resource(ResourceEntry { name, data })
    }

    /// Primary headword; a resource's file name.
    pub fn word(&self) -> &str {
        match self {
            Entry::Term(t) => &t.words[0],
            Entry::Resource(r) => &r.name,
        }
    }

    /// All words (headword first). A resource yields its name alone.
    pub fn words(&self) -> &[String] {
        match self {
            Entry::Term(t) => &t.words,
            Entry::Resource(r) => slice::from_ref(&r.name),
        }
    }

    /// Definition bodies; empty for resources.
    pub fn defis(&self) -> &[String] {
        match self {
            Entry::Term(t) => &t.defis,
            Entry::Resource(_) => &[],
        }
    }

    /// Definition joined with newlines when alternatives exist.
    pub fn defi(&self) -> String {
        self.defis().join("\n")
    }

    pub fn defi_format(&self) -> Option<DefiFormat> {
        match self {
            Entry::Term(t) => Some(t.format),
            Entry::Resource(_) => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Entry::Resource(_))
    }

    /// Resource payload, if this entry is one.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Entry::Resource(r) => Some(&r.data),
            Entry::Term(_) => None,
        }
    }

    /// Write a resource entry's payload into `dir`, returning the file path.
    pub fn save_resource(&self, dir: &Path) -> Result<PathBuf> {
        let Entry::Resource(r) = self else {
            return Err(GlossaryError::Write(
                "cannot save a term entry as a resource".into(),
            ));
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(&r.name);
        fs::write(&path, &r.data)?;
        Ok(path)
    }

    /// Compact form for storage. Lossless: an explicit format stays explicit.
    pub fn into_raw(self) -> RawEntry {
        match self {
            Entry::Term(t) => RawEntry::Term {
                words: t.words,
                defis: t.defis,
                format: Some(t.format),
            },
            Entry::Resource(r) => RawEntry::Resource {
                name: r.name,
                data: r.data,
            },
        }
    }

    /// Reconstruct from the compact form, filling an absent format with the
    /// glossary default.
    pub fn from_raw(raw: RawEntry, default_format: DefiFormat) -> Entry {
        match raw {
            RawEntry::Term {
                words,
                defis,
                format,
            } => Entry::Term(TermEntry {
                words,
                defis,
                format: format.unwrap_or(default_format),
            }),
            RawEntry::Resource { name, data } => Entry::Resource(ResourceEntry { name, data }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_requires_words() {
        let result = Entry::term(vec![], vec!["defi".into()], DefiFormat::PlainText);
        assert!(matches!(result, Err(GlossaryError::EmptyEntry)));
    }

    #[test]
    fn word_returns_primary() {
        let entry = Entry::term(
            vec!["Banana".into(), "banana fruit".into()],
            vec!["a yellow fruit".into()],
            DefiFormat::PlainText,
        )
        .unwrap();
        assert_eq!(entry.word(), "Banana");
        assert_eq!(entry.words().len(), 2);
    }

    #[test]
    fn defi_joins_alternatives() {
        let entry = Entry::term(
            vec!["w".into()],
            vec!["first".into(), "second".into()],
            DefiFormat::Html,
        )
        .unwrap();
        assert_eq!(entry.defi(), "first\nsecond");
    }

    #[test]
    fn raw_round_trip_preserves_explicit_format() {
        let entry = Entry::term(
            vec!["word".into(), "alt".into()],
            vec!["defi".into()],
            DefiFormat::Xdxf,
        )
        .unwrap();
        let restored = Entry::from_raw(entry.clone().into_raw(), DefiFormat::PlainText);
        assert_eq!(restored, entry);
    }

    #[test]
    fn from_raw_fills_default_format() {
        let raw = RawEntry::Term {
            words: vec!["word".into()],
            defis: vec!["defi".into()],
            format: None,
        };
        let entry = Entry::from_raw(raw, DefiFormat::Html);
        assert_eq!(entry.defi_format(), Some(DefiFormat::Html));
    }

    #[test]
    fn resource_round_trip() {
        let entry = Entry::resource("icon.png".into(), vec![1, 2, 3]);
        assert!(entry.is_resource());
        assert_eq!(entry.word(), "icon.png");
        let restored = Entry::from_raw(entry.clone().into_raw(), DefiFormat::PlainText);
        assert_eq!(restored, entry);
    }

    #[test]
    fn format_codes_round_trip() {
        for format in [DefiFormat::PlainText, DefiFormat::Html, DefiFormat::Xdxf] {
            assert_eq!(DefiFormat::from_code(format.code()), Some(format));
        }
        assert_eq!(DefiFormat::from_code("z"), None);
    }

    #[test]
    fn save_resource_writes_payload() {
        let dir = tempfile::TempDir::new().unwrap();
        let entry = Entry::resource("logo.png".into(), b"\x89PNG".to_vec());
        let path = entry.save_resource(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG");
    }
}
