use crate::error::{GlossaryError, Result};
use crate::filters::FilterPrefs;
use crate::glossary::{Glossary, ReadRequest, WriteRequest};
use crate::reader::Options;
use crate::registry::Registry;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

/// Archive wrapper recognized by its trailing extension. Handled by shelling
/// out to the system tool, matching what the formats themselves expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Gzip,
    Bzip2,
    Zip,
}

impl ArchiveKind {
    fn from_ext(ext: &str) -> Option<ArchiveKind> {
        match ext {
            "gz" => Some(ArchiveKind::Gzip),
            "bz2" => Some(ArchiveKind::Bzip2),
            "zip" => Some(ArchiveKind::Zip),
            _ => None,
        }
    }
}

/// Resolve a path against the current directory without touching the
/// filesystem; inputs may not exist yet when the output path is planned.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Split a trailing archive extension off, returning the inner path and the
/// archive kind. `dict.txt.gz` maps to (`dict.txt`, Gzip); a bare `.gz` with
/// no inner extension is still split.
pub(crate) fn split_archive_suffix(path: &Path) -> Option<(PathBuf, ArchiveKind)> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let kind = ArchiveKind::from_ext(&ext)?;
    Some((path.with_extension(""), kind))
}

fn run_tool(mut cmd: Command, path: &Path) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().to_string();
    debug!(tool = %program, path = ?path, "running archive tool");
    let output = cmd.output().map_err(|e| GlossaryError::Archive {
        path: path.to_path_buf(),
        message: format!("cannot run {}: {}", program, e),
    })?;
    if !output.status.success() {
        return Err(GlossaryError::Archive {
            path: path.to_path_buf(),
            message: format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

/// Unpack `archive` in place, producing the file named by stripping the
/// archive extension. The archive itself is kept.
pub(crate) fn decompress(archive: &Path, kind: ArchiveKind) -> Result<()> {
    match kind {
        ArchiveKind::Gzip => {
            let mut cmd = Command::new("gzip");
            cmd.args(["--decompress", "--keep", "--force"]).arg(archive);
            run_tool(cmd, archive)
        }
        ArchiveKind::Bzip2 => {
            let mut cmd = Command::new("bzip2");
            cmd.args(["--decompress", "--keep", "--force"]).arg(archive);
            run_tool(cmd, archive)
        }
        ArchiveKind::Zip => {
            let dir = archive.parent().unwrap_or_else(|| Path::new("."));
            let mut cmd = Command::new("unzip");
            cmd.arg("-o").arg(archive).arg("-d").arg(dir);
            run_tool(cmd, archive)
        }
    }
}

/// Pack `file` into an archive of the given kind next to it, returning the
/// archive path. gzip and bzip2 replace the file; zip keeps it.
pub(crate) fn compress(file: &Path, kind: ArchiveKind) -> Result<PathBuf> {
    match kind {
        ArchiveKind::Gzip => {
            let mut cmd = Command::new("gzip");
            cmd.arg("--force").arg(file);
            run_tool(cmd, file)?;
            Ok(with_appended_ext(file, "gz"))
        }
        ArchiveKind::Bzip2 => {
            let mut cmd = Command::new("bzip2");
            cmd.arg("--force").arg(file);
            run_tool(cmd, file)?;
            Ok(with_appended_ext(file, "bz2"))
        }
        ArchiveKind::Zip => {
            let archive = with_appended_ext(file, "zip");
            let mut cmd = Command::new("zip");
            // -j drops directory components so the archive unpacks flat
            cmd.arg("-j").arg(&archive).arg(file);
            run_tool(cmd, file)?;
            Ok(archive)
        }
    }
}

fn with_appended_ext(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Output plan: resolved format name, the path the writer targets, and the
/// archive step to apply afterwards, if any.
pub(crate) struct OutputPlan {
    pub format: String,
    pub path: PathBuf,
    pub archive: Option<ArchiveKind>,
}

/// Resolve the output format before any reading happens, so a bad output
/// path fails fast. An explicit hint wins; otherwise the extension decides,
/// looking beneath a trailing archive extension first.
pub(crate) fn detect_output(
    registry: &Registry,
    path: &Path,
    hint: Option<&str>,
) -> Result<OutputPlan> {
    let path = absolute(path);
    let (inner, archive) = match split_archive_suffix(&path) {
        Some((inner, kind)) => (inner, Some(kind)),
        None => (path.clone(), None),
    };

    if let Some(name) = hint {
        let desc = registry
            .by_name(name)
            .ok_or_else(|| GlossaryError::FormatResolution(path.clone()))?;
        if !desc.can_write() {
            return Err(GlossaryError::Unsupported {
                format: name.to_string(),
                operation: "write",
            });
        }
        return Ok(OutputPlan {
            format: desc.name.to_string(),
            path: inner,
            archive,
        });
    }

    let ext = inner
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let name = inner
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    // extension lookup first; a bare filename equal to a format name or
    // extension token (e.g. "json") also resolves
    let desc = registry
        .by_extension(&ext)
        .or_else(|| registry.by_name(&name))
        .or_else(|| registry.by_extension(&name))
        .filter(|d| d.can_write())
        .ok_or_else(|| GlossaryError::FormatResolution(path.clone()))?;
    Ok(OutputPlan {
        format: desc.name.to_string(),
        path: inner,
        archive,
    })
}

/// Parameters for [`convert`].
pub struct ConvertRequest {
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    /// Streaming (direct) conversion; `None` picks direct unless a sort was
    /// requested.
    pub direct: Option<bool>,
    pub sort: Option<bool>,
    /// Entries held in memory per spill run of the streaming sort;
    /// non-positive keeps the default.
    pub sort_cache_size: usize,
    pub progress: bool,
    pub filter_prefs: FilterPrefs,
    pub read_options: Options,
    pub write_options: Options,
}

impl Default for ConvertRequest {
    fn default() -> Self {
        Self {
            input_format: None,
            output_format: None,
            direct: None,
            sort: None,
            sort_cache_size: 0,
            progress: true,
            filter_prefs: FilterPrefs::default(),
            read_options: Options::new(),
            write_options: Options::new(),
        }
    }
}

/// Read `input`, pass every entry through the filter chain, and write
/// `output`, returning the final absolute output path.
///
/// The whole pipeline runs on one glossary instance: output format
/// resolution fails fast before any input is read, and the glossary is
/// cleared when the write finishes either way.
pub fn convert(
    registry: &Registry,
    input: &Path,
    output: &Path,
    request: ConvertRequest,
) -> Result<PathBuf> {
    let started = Instant::now();
    let plan = detect_output(registry, output, request.output_format.as_deref())?;
    let direct = request.direct.unwrap_or(request.sort != Some(true));
    info!(
        input = ?input,
        output = ?plan.path,
        format = %plan.format,
        direct,
        "starting conversion"
    );

    let mut glos = Glossary::new();
    glos.set_filter_prefs(request.filter_prefs.clone());
    glos.read(
        registry,
        input,
        ReadRequest {
            format: request.input_format.clone(),
            direct,
            progress: request.progress,
            options: request.read_options.clone(),
        },
    )?;

    let written = glos
        .write(
            registry,
            &plan.path,
            &plan.format,
            WriteRequest {
                sort: request.sort,
                sort_key: None,
                sort_cache_size: request.sort_cache_size,
                options: request.write_options.clone(),
            },
        )
        .ok_or_else(|| GlossaryError::Write(format!("conversion to {:?} failed", plan.path)))?;

    let final_path = match plan.archive {
        Some(kind) => {
            info!(path = ?written, "compressing output");
            compress(&written, kind)?
        }
        None => written,
    };

    info!(
        path = ?final_path,
        elapsed = ?started.elapsed(),
        "conversion finished"
    );
    Ok(final_path)
}
