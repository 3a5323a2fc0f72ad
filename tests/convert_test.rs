//! Integration tests for the glossary conversion pipeline.
//!
//! These drive `convert()` end to end through real files on disk, covering:
//!
//! - **Basic conversion** -- tabfile in, json/dict out, filters applied
//! - **Direct vs indirect** -- both modes produce identical output
//! - **Sort-on-write** -- caller preference vs format policy, stability
//! - **Failure paths** -- unresolvable formats, missing input, bad entries
//! - **Metadata** -- info headers carried from input to output
//!
//! Each test gets its own TempDir; fixtures are plain tabfiles written
//! inline so the expected entry set is visible next to the assertions.

use glosstool::convert::{convert, ConvertRequest};
use glosstool::error::GlossaryError;
use glosstool::filters::FilterPrefs;
use glosstool::glossary::{Glossary, ReadRequest};
use glosstool::registry::Registry;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper: write a tabfile fixture into `dir` and return its path.
fn write_tabfile(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fruits_tabfile(dir: &Path) -> PathBuf {
    write_tabfile(
        dir,
        "fruits.txt",
        "##name\tFruits\napple\ta fruit\nBanana|banana fruit\ta yellow fruit\ncherry\ta red fruit\n",
    )
}

fn quiet() -> ConvertRequest {
    ConvertRequest {
        progress: false,
        ..ConvertRequest::default()
    }
}

/// Read a written glossary back for inspection.
fn read_back(path: &Path) -> Vec<(Vec<String>, String)> {
    let registry = Registry::builtin();
    let mut glos = Glossary::new();
    glos.read(
        &registry,
        path,
        ReadRequest {
            progress: false,
            ..ReadRequest::default()
        },
    )
    .unwrap();
    let mut out = Vec::new();
    while let Some(entry) = glos.next_entry().unwrap() {
        out.push((entry.words().to_vec(), entry.defi()));
    }
    out
}

// ---------------------------------------------------------------------------
// Basic conversion

#[test]
fn tabfile_to_json_and_back() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = fruits_tabfile(dir.path());
    let output = dir.path().join("fruits.json");

    let written = convert(&registry, &input, &output, quiet()).unwrap();
    assert_eq!(written, output);

    let entries = read_back(&output);
    assert_eq!(entries.len(), 3);
    // filters lowercase words; alternates survive
    assert_eq!(entries[0].0, vec!["apple"]);
    assert_eq!(entries[1].0, vec!["banana", "banana fruit"]);
    assert_eq!(entries[1].1, "a yellow fruit");
}

#[test]
fn info_headers_carry_through() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = fruits_tabfile(dir.path());
    let output = dir.path().join("fruits.json");
    convert(&registry, &input, &output, quiet()).unwrap();

    let mut glos = Glossary::new();
    glos.read(
        &registry,
        &output,
        ReadRequest {
            progress: false,
            ..ReadRequest::default()
        },
    )
    .unwrap();
    assert_eq!(glos.get_info("name"), Some("Fruits"));
    assert_eq!(glos.get_info("title"), Some("Fruits"));
}

#[test]
fn blank_and_malformed_entries_are_filtered() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = write_tabfile(
        dir.path(),
        "mixed.txt",
        "apple\ta fruit\n   \tdiscarded\nword\t   \nkept\tstill here\n",
    );
    let output = dir.path().join("mixed.json");
    convert(&registry, &input, &output, quiet()).unwrap();

    let entries = read_back(&output);
    let words: Vec<&str> = entries.iter().map(|(w, _)| w[0].as_str()).collect();
    assert_eq!(words, vec!["apple", "kept"]);
}

// ---------------------------------------------------------------------------
// Direct vs indirect

#[test]
fn direct_and_indirect_agree() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = fruits_tabfile(dir.path());

    let out_direct = dir.path().join("direct.json");
    convert(
        &registry,
        &input,
        &out_direct,
        ConvertRequest {
            direct: Some(true),
            ..quiet()
        },
    )
    .unwrap();

    let out_indirect = dir.path().join("indirect.json");
    convert(
        &registry,
        &input,
        &out_indirect,
        ConvertRequest {
            direct: Some(false),
            ..quiet()
        },
    )
    .unwrap();

    assert_eq!(read_back(&out_direct), read_back(&out_indirect));
}

// ---------------------------------------------------------------------------
// Sort-on-write

#[test]
fn explicit_sort_orders_output() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = write_tabfile(
        dir.path(),
        "shuffled.txt",
        "cherry\tred\napple\tgreen\nbanana\tyellow\n",
    );
    let output = dir.path().join("sorted.txt");
    convert(
        &registry,
        &input,
        &output,
        ConvertRequest {
            sort: Some(true),
            ..quiet()
        },
    )
    .unwrap();

    let words: Vec<String> = read_back(&output).into_iter().map(|(w, _)| w[0].clone()).collect();
    assert_eq!(words, vec!["apple", "banana", "cherry"]);
}

#[test]
fn streaming_sort_with_tiny_cache_matches_in_memory_sort() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let mut lines = String::new();
    for word in ["kiwi", "fig", "plum", "date", "lime", "pear", "apple", "mango"] {
        lines.push_str(word);
        lines.push_str("\tfruit\n");
    }
    let input = write_tabfile(dir.path(), "many.txt", &lines);

    let spilled = dir.path().join("spilled.txt");
    convert(
        &registry,
        &input,
        &spilled,
        ConvertRequest {
            direct: Some(true),
            sort: Some(true),
            sort_cache_size: 2,
            ..quiet()
        },
    )
    .unwrap();

    let in_memory = dir.path().join("in_memory.txt");
    convert(
        &registry,
        &input,
        &in_memory,
        ConvertRequest {
            direct: Some(false),
            sort: Some(true),
            ..quiet()
        },
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(&spilled).unwrap(),
        fs::read_to_string(&in_memory).unwrap()
    );
}

#[test]
fn dict_source_output_is_sorted_without_being_asked() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = write_tabfile(
        dir.path(),
        "shuffled.txt",
        "zebra\tanimal\nMole\tanimal\nant\tinsect\n",
    );
    let output = dir.path().join("out.dict");
    // direct mode plus a format whose policy mandates sorting: the pipeline
    // must drain the reader and sort anyway
    convert(
        &registry,
        &input,
        &output,
        ConvertRequest {
            direct: Some(true),
            filter_prefs: FilterPrefs {
                lowercase: false,
                ..FilterPrefs::default()
            },
            ..quiet()
        },
    )
    .unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let entry_lines: Vec<&str> = content
        .lines()
        .filter(|l| l.contains(" :: "))
        .collect();
    // case-insensitive order from the format's own sort key
    assert_eq!(
        entry_lines,
        vec!["ant :: insect", "Mole :: animal", "zebra :: animal"]
    );
}

#[test]
fn duplicate_headwords_keep_arrival_order_when_sorted() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = write_tabfile(
        dir.path(),
        "dups.txt",
        "same\tfirst\nzz\tlast\nsame\tsecond\nsame\tthird\n",
    );
    let output = dir.path().join("out.txt");
    convert(
        &registry,
        &input,
        &output,
        ConvertRequest {
            direct: Some(true),
            sort: Some(true),
            sort_cache_size: 1,
            ..quiet()
        },
    )
    .unwrap();

    let defis: Vec<String> = read_back(&output)
        .into_iter()
        .filter(|(w, _)| w[0] == "same")
        .map(|(_, d)| d)
        .collect();
    assert_eq!(defis, vec!["first", "second", "third"]);
}

// ---------------------------------------------------------------------------
// Failure paths

#[test]
fn unresolvable_output_format_fails_before_reading() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    // input deliberately missing: output resolution must fail first
    let result = convert(
        &registry,
        &dir.path().join("missing.txt"),
        &dir.path().join("out.unknownext"),
        quiet(),
    );
    assert!(matches!(result, Err(GlossaryError::FormatResolution(_))));
}

#[test]
fn missing_input_fails_with_open_error() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let result = convert(
        &registry,
        &dir.path().join("missing.txt"),
        &dir.path().join("out.json"),
        quiet(),
    );
    assert!(matches!(result, Err(GlossaryError::Open { .. })));
}

#[test]
fn write_only_format_rejects_reading() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = write_tabfile(dir.path(), "in.dict", "whatever\n");
    let result = convert(
        &registry,
        &input,
        &dir.path().join("out.json"),
        ConvertRequest {
            input_format: Some("dict-source".into()),
            ..quiet()
        },
    );
    assert!(matches!(result, Err(GlossaryError::Unsupported { .. })));
}

// ---------------------------------------------------------------------------
// Resources

#[test]
fn resources_travel_between_tabfiles() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = fruits_tabfile(dir.path());
    let res_dir = dir.path().join("fruits_res");
    fs::create_dir(&res_dir).unwrap();
    fs::write(res_dir.join("icon.png"), [1u8, 2, 3]).unwrap();

    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let output = out_dir.join("copy.txt");
    convert(&registry, &input, &output, quiet()).unwrap();

    assert_eq!(
        fs::read(out_dir.join("copy_res").join("icon.png")).unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn skip_resources_drops_them() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::builtin();
    let input = fruits_tabfile(dir.path());
    let res_dir = dir.path().join("fruits_res");
    fs::create_dir(&res_dir).unwrap();
    fs::write(res_dir.join("icon.png"), [1u8]).unwrap();

    let output = dir.path().join("copy.txt");
    convert(
        &registry,
        &input,
        &output,
        ConvertRequest {
            filter_prefs: FilterPrefs {
                skip_resources: true,
                ..FilterPrefs::default()
            },
            ..quiet()
        },
    )
    .unwrap();

    assert!(!dir.path().join("copy_res").exists());
}
