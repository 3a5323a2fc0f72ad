use crate::glossary::Glossary;
use crate::reader::{Options, Reader};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Per-format rule for whether sorting before write is mandatory, a default,
/// or forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Output must be sorted; caller preference is overridden with a warning
    /// and a direct-mode glossary is drained first.
    Always,
    /// Sort unless the caller said otherwise.
    DefaultYes,
    /// Don't sort unless the caller asked.
    DefaultNo,
    /// Sorting is forbidden; a caller request is ignored with a warning.
    Never,
}

/// Key function used to order entries: maps the word list to a sort string.
pub type SortKeyFn = fn(&[String]) -> String;

/// Default sort key: the words themselves, order-significant, primary first.
pub fn default_sort_key(words: &[String]) -> String {
    words.join("\t")
}

pub type ReaderFactory = fn() -> Box<dyn Reader>;
pub type WriteFn = fn(&mut Glossary, &Path, &Options) -> crate::error::Result<()>;

/// Everything the pipeline needs to know about one format. Read and write
/// support are independent optional capabilities, validated once at registry
/// construction rather than probed per call.
pub struct FormatDesc {
    pub name: &'static str,
    pub description: &'static str,
    /// Extensions without the leading dot, preferred first.
    pub extensions: &'static [&'static str],
    pub read_options: &'static [&'static str],
    pub write_options: &'static [&'static str],
    pub reader: Option<ReaderFactory>,
    pub writer: Option<WriteFn>,
    pub sort_policy: SortPolicy,
    pub sort_key: Option<SortKeyFn>,
}

impl FormatDesc {
    pub fn can_read(&self) -> bool {
        self.reader.is_some()
    }

    pub fn can_write(&self) -> bool {
        self.writer.is_some()
    }
}

/// The format table. Explicitly constructed and passed by reference so tests
/// can build isolated registries; there is no process-global state.
#[derive(Default)]
pub struct Registry {
    formats: Vec<FormatDesc>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in formats.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for desc in crate::formats::builtin_formats() {
            registry.register(desc);
        }
        registry
    }

    pub fn register(&mut self, desc: FormatDesc) {
        if !desc.can_read() && !desc.can_write() {
            warn!(format = desc.name, "format has neither read nor write support");
        }
        self.formats.push(desc);
    }

    pub fn by_name(&self, name: &str) -> Option<&FormatDesc> {
        self.formats.iter().find(|d| d.name == name)
    }

    /// First registered format whose extension list contains `ext`
    /// (no leading dot).
    pub fn by_extension(&self, ext: &str) -> Option<&FormatDesc> {
        let ext = ext.to_lowercase();
        self.formats
            .iter()
            .find(|d| d.extensions.contains(&ext.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatDesc> {
        self.formats.iter()
    }

    /// Drop caller options the format doesn't recognize, with a warning per
    /// dropped key. Never a hard failure.
    pub fn validated_options(
        &self,
        desc: &FormatDesc,
        options: &Options,
        operation: &'static str,
    ) -> Options {
        let recognized: &[&str] = match operation {
            "read" => desc.read_options,
            _ => desc.write_options,
        };
        let mut valid = Options::new();
        for (key, value) in options {
            if recognized.contains(&key.as_str()) {
                valid.insert(key.clone(), value.clone());
            } else {
                warn!(
                    option = %key,
                    format = desc.name,
                    operation,
                    "unrecognized option dropped"
                );
            }
        }
        valid
    }
}
