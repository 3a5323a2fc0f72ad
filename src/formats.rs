//! Built-in formats: tabfile (read/write), dict source (write-only, always
//! sorted), and json (read/write).

use crate::config::WRITE_BUF_SIZE;
use crate::entry::{DefiFormat, Entry};
use crate::error::{GlossaryError, Result};
use crate::glossary::Glossary;
use crate::reader::{Options, Reader};
use crate::registry::{FormatDesc, SortPolicy};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn builtin_formats() -> Vec<FormatDesc> {
    vec![
        FormatDesc {
            name: "tabfile",
            description: "Tab-separated text file",
            extensions: &["txt", "tab", "tsv"],
            read_options: &[],
            write_options: &["resources"],
            reader: Some(|| Box::new(TabfileReader::default())),
            writer: Some(write_tabfile),
            sort_policy: SortPolicy::DefaultNo,
            sort_key: None,
        },
        FormatDesc {
            name: "dict-source",
            description: "Plain dictionary source lines (word :: definition)",
            extensions: &["dict"],
            read_options: &[],
            write_options: &[],
            reader: None,
            writer: Some(write_dict_source),
            sort_policy: SortPolicy::Always,
            sort_key: Some(dict_sort_key),
        },
        FormatDesc {
            name: "json",
            description: "JSON glossary document",
            extensions: &["json"],
            read_options: &[],
            write_options: &["pretty"],
            reader: Some(|| Box::new(JsonReader::default())),
            writer: Some(write_json),
            sort_policy: SortPolicy::DefaultNo,
            sort_key: None,
        },
    ]
}

// ---------------------------------------------------------------------------
// tabfile

fn escape_tab(text: &str) -> String {
    if !text.contains(['\\', '\n', '\t', '|']) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '|' => out.push_str("\\|"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_tab(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('|') => out.push('|'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split a word field on unescaped `|` separators.
fn split_alternates(field: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => {
                words.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    words.push(current);
    words.into_iter().map(|w| unescape_tab(&w)).collect()
}

/// Directory holding a tabfile's binary resources, next to the file itself.
fn res_dir_for(path: &Path) -> PathBuf {
    let mut name = path.with_extension("").into_os_string();
    name.push("_res");
    PathBuf::from(name)
}

/// Streaming line reader for tabfiles. Header lines (`##key<TAB>value`) are
/// consumed at open time; resource files from the `_res` directory are
/// yielded after the last text entry.
#[derive(Default)]
pub struct TabfileReader {
    path: PathBuf,
    lines: Option<std::io::Lines<BufReader<File>>>,
    pending: Option<String>,
    info: Vec<(String, String)>,
    line_no: u64,
    resources: VecDeque<PathBuf>,
}

impl Reader for TabfileReader {
    fn open(&mut self, path: &Path, _options: &Options) -> Result<()> {
        let file = File::open(path).map_err(|e| GlossaryError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.path = path.to_path_buf();
        let mut lines = BufReader::new(file).lines();

        // header lines end at the first non-## line, which is buffered as
        // the first entry
        for line in lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            let Some(rest) = line.strip_prefix("##") else {
                self.pending = Some(line);
                break;
            };
            match rest.split_once('\t') {
                Some((key, value)) => self
                    .info
                    .push((unescape_tab(key), unescape_tab(value))),
                None => {
                    return Err(GlossaryError::Parse {
                        path: self.path.clone(),
                        line: self.line_no,
                    })
                }
            }
        }
        self.lines = Some(lines);

        let res_dir = res_dir_for(path);
        if res_dir.is_dir() {
            let mut names: Vec<PathBuf> = fs::read_dir(&res_dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect();
            names.sort();
            debug!(count = names.len(), dir = ?res_dir, "resource files found");
            self.resources = names.into();
        }
        Ok(())
    }

    fn next_entry(&mut self) -> Result<Option<Entry>> {
        loop {
            let line = match self.pending.take() {
                Some(line) => Some(line),
                None => match &mut self.lines {
                    Some(lines) => match lines.next() {
                        Some(line) => {
                            self.line_no += 1;
                            Some(line?)
                        }
                        None => None,
                    },
                    None => None,
                },
            };

            let Some(line) = line else {
                // text entries exhausted; drain the resource directory
                let Some(res_path) = self.resources.pop_front() else {
                    return Ok(None);
                };
                let name = res_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let data = fs::read(&res_path)?;
                return Ok(Some(Entry::resource(name, data)));
            };

            if line.trim().is_empty() {
                continue;
            }
            let Some((words, defi)) = line.split_once('\t') else {
                return Err(GlossaryError::Parse {
                    path: self.path.clone(),
                    line: self.line_no,
                });
            };
            let entry = Entry::term(
                split_alternates(words),
                vec![unescape_tab(defi)],
                DefiFormat::PlainText,
            )?;
            return Ok(Some(entry));
        }
    }

    fn info(&self) -> &[(String, String)] {
        &self.info
    }

    fn close(&mut self) {
        self.lines = None;
        self.pending = None;
        self.resources.clear();
    }
}

fn write_tabfile(glos: &mut Glossary, path: &Path, options: &Options) -> Result<()> {
    let resources = options.get("resources").map(|v| v != "false").unwrap_or(true);
    let mut out = BufWriter::with_capacity(WRITE_BUF_SIZE, File::create(path)?);
    for (key, value) in glos.info().iter() {
        writeln!(out, "##{}\t{}", escape_tab(key), escape_tab(value))?;
    }

    let res_dir = res_dir_for(path);
    let mut skipped_resources = 0u64;
    while let Some(entry) = glos.next_entry()? {
        if entry.is_resource() {
            if resources {
                entry.save_resource(&res_dir)?;
            } else {
                skipped_resources += 1;
            }
            continue;
        }
        let words: Vec<String> = entry.words().iter().map(|w| escape_tab(w)).collect();
        writeln!(out, "{}\t{}", words.join("|"), escape_tab(&entry.defi()))?;
    }
    if skipped_resources > 0 {
        warn!(count = skipped_resources, "resource entries skipped");
    }
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// dict source

/// Case-insensitive ordering, required by dictfmt-style tooling.
fn dict_sort_key(words: &[String]) -> String {
    words.join("\t").to_lowercase()
}

fn single_line(text: &str) -> String {
    if text.contains('\n') {
        text.replace('\n', "\\n")
    } else {
        text.to_string()
    }
}

fn write_dict_source(glos: &mut Glossary, path: &Path, _options: &Options) -> Result<()> {
    let mut out = BufWriter::with_capacity(WRITE_BUF_SIZE, File::create(path)?);
    if let Some(name) = glos.get_info("name") {
        writeln!(out, ":head: {}", single_line(name))?;
    }
    let mut skipped_resources = 0u64;
    while let Some(entry) = glos.next_entry()? {
        if entry.is_resource() {
            skipped_resources += 1;
            continue;
        }
        writeln!(
            out,
            "{} :: {}",
            single_line(&entry.words().join(" | ")),
            single_line(&entry.defi())
        )?;
    }
    if skipped_resources > 0 {
        warn!(count = skipped_resources, "resource entries skipped");
    }
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// json

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct JsonEntry {
    word: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    alts: Vec<String>,
    defi: OneOrMany,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonDoc {
    #[serde(default)]
    info: Vec<(String, String)>,
    entries: Vec<JsonEntry>,
}

/// JSON documents are parsed whole at open time; the entry stream just
/// drains the parsed list, so `len_hint` is exact.
#[derive(Default)]
pub struct JsonReader {
    entries: VecDeque<JsonEntry>,
    total: u64,
    info: Vec<(String, String)>,
}

impl Reader for JsonReader {
    fn open(&mut self, path: &Path, _options: &Options) -> Result<()> {
        let file = File::open(path).map_err(|e| GlossaryError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        let doc: JsonDoc =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| GlossaryError::Parse {
                path: path.to_path_buf(),
                line: e.line() as u64,
            })?;
        self.info = doc.info;
        self.total = doc.entries.len() as u64;
        self.entries = doc.entries.into();
        Ok(())
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.total)
    }

    fn next_entry(&mut self) -> Result<Option<Entry>> {
        let Some(item) = self.entries.pop_front() else {
            return Ok(None);
        };
        let mut words = vec![item.word];
        words.extend(item.alts);
        let format = item
            .format
            .as_deref()
            .and_then(DefiFormat::from_code)
            .unwrap_or_default();
        Ok(Some(Entry::term(words, item.defi.into_vec(), format)?))
    }

    fn info(&self) -> &[(String, String)] {
        &self.info
    }

    fn close(&mut self) {
        self.entries.clear();
    }
}

fn write_json(glos: &mut Glossary, path: &Path, options: &Options) -> Result<()> {
    let pretty = options.get("pretty").map(|v| v != "false").unwrap_or(false);
    let info: Vec<(String, String)> = glos
        .info()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut entries = Vec::new();
    let mut skipped_resources = 0u64;
    while let Some(entry) = glos.next_entry()? {
        if entry.is_resource() {
            skipped_resources += 1;
            continue;
        }
        let mut words = entry.words().to_vec();
        let word = words.remove(0);
        let defis = entry.defis().to_vec();
        let defi = if defis.len() == 1 {
            OneOrMany::One(defis.into_iter().next().unwrap_or_default())
        } else {
            OneOrMany::Many(defis)
        };
        let format = entry
            .defi_format()
            .filter(|f| *f != DefiFormat::PlainText)
            .map(|f| f.code().to_string());
        entries.push(JsonEntry {
            word,
            alts: words,
            defi,
            format,
        });
    }
    if skipped_resources > 0 {
        warn!(count = skipped_resources, "resource entries skipped");
    }

    let doc = JsonDoc { info, entries };
    let out = BufWriter::with_capacity(WRITE_BUF_SIZE, File::create(path)?);
    let result = if pretty {
        serde_json::to_writer_pretty(out, &doc)
    } else {
        serde_json::to_writer(out, &doc)
    };
    result.map_err(|e| GlossaryError::Write(format!("json encode failed: {}", e)))?;
    Ok(())
}
