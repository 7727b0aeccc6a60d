use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, info, warn};

pub mod rules;

pub use rules::{Rewrite, RuleSet, SubstitutionRule};

/// Directory searched when no root is given.
pub const DEFAULT_ROOT: &str = "frontend/src/app/(marketing)";

/// File name that marks a file as a rewrite candidate.
pub const DEFAULT_FILE_NAME: &str = "page.tsx";

#[derive(thiserror::Error, Debug)]
pub enum RewriteError {
    #[error("Target directory does not exist: {}", path.display())]
    MissingRoot { path: PathBuf },
    #[error("Target must be a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
    #[error("Failed to read directory: {}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("File is not valid UTF-8: {}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Failed to write file: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid substitution pattern: {pattern}")]
    Rule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub file_name: String,
    pub dry_run: bool,
    pub keep_going: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            dry_run: false,
            keep_going: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// New content was written to disk.
    Rewritten { replacements: usize },
    /// No rule matched; the file was not touched.
    Unchanged,
    /// The confirmation callback rejected the change.
    Declined { replacements: usize },
    /// Dry run: the change was computed but not written.
    WouldRewrite { replacements: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RewriteSummary {
    pub candidates: usize,
    pub files_changed: usize,
    pub replacements: usize,
    pub failures: Vec<Failure>,
}

/// Rewrites every candidate under `root`, calling `on_file` after each one.
pub fn process_directory<R>(
    root: &Path,
    rules: &RuleSet,
    options: &RewriteOptions,
    on_file: R,
) -> Result<RewriteSummary>
where
    R: FnMut(&FileReport),
{
    process_directory_interactive(root, rules, options, |_, _, _| Ok(true), on_file)
}

/// Like [`process_directory`], but each pending change is passed to `confirm`
/// as `(path, old_content, new_content)` and is only applied when it returns
/// `true`. In a dry run `confirm` still sees the change, nothing is written.
pub fn process_directory_interactive<F, R>(
    root: &Path,
    rules: &RuleSet,
    options: &RewriteOptions,
    confirm: F,
    mut on_file: R,
) -> Result<RewriteSummary>
where
    F: Fn(&Path, &str, &str) -> Result<bool>,
    R: FnMut(&FileReport),
{
    info!("Starting import rewrite: {:?}", root);
    if options.dry_run {
        warn!("Dry run mode - no files will be written");
    }

    let mut summary = RewriteSummary::default();
    let candidates = collect_candidates(root, &options.file_name, options.keep_going, &mut summary)?;

    for path in candidates {
        summary.candidates += 1;
        match rewrite_file_with(&path, rules, options, &confirm) {
            Ok(report) => {
                match report.outcome {
                    FileOutcome::Rewritten { replacements }
                    | FileOutcome::WouldRewrite { replacements } => {
                        summary.files_changed += 1;
                        summary.replacements += replacements;
                    }
                    FileOutcome::Unchanged | FileOutcome::Declined { .. } => {}
                }
                on_file(&report);
            }
            Err(err) if options.keep_going => record_failure(&mut summary, path, &err),
            Err(err) => return Err(err),
        }
    }

    info!(
        "Rewrite complete: {} candidates, {} files changed, {} replacements, {} failures",
        summary.candidates,
        summary.files_changed,
        summary.replacements,
        summary.failures.len()
    );

    Ok(summary)
}

/// Finds every file named `file_name` at any depth under `root`.
///
/// Files are listed before subdirectories, each group in name order.
pub fn locate_candidates(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, RewriteError> {
    check_root(root)?;
    let mut found = Vec::new();
    walk(root, file_name, &mut found, &mut |_: &Path, err: RewriteError| Err(err))?;
    Ok(found)
}

/// Rewrites a single file in place.
pub fn rewrite_file(path: &Path, rules: &RuleSet, options: &RewriteOptions) -> Result<FileReport> {
    rewrite_file_with(path, rules, options, &|_, _, _| Ok(true))
}

fn collect_candidates(
    root: &Path,
    file_name: &str,
    keep_going: bool,
    summary: &mut RewriteSummary,
) -> Result<Vec<PathBuf>> {
    check_root(root)?;
    let mut found = Vec::new();
    walk(root, file_name, &mut found, &mut |dir: &Path, err: RewriteError| {
        if keep_going {
            record_failure(summary, dir.to_path_buf(), &err.into());
            Ok(())
        } else {
            Err(err)
        }
    })?;
    Ok(found)
}

fn check_root(root: &Path) -> Result<(), RewriteError> {
    let path = root.to_path_buf();
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(RewriteError::NotADirectory { path }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(RewriteError::MissingRoot { path })
        }
        Err(source) => Err(RewriteError::ReadDir { path, source }),
    }
}

fn walk<E>(
    dir: &Path,
    file_name: &str,
    found: &mut Vec<PathBuf>,
    on_error: &mut E,
) -> Result<(), RewriteError>
where
    E: FnMut(&Path, RewriteError) -> Result<(), RewriteError>,
{
    debug!("Scanning directory: {:?}", dir);

    let mut entries = match read_entries(dir) {
        Ok(entries) => entries,
        Err(err) => return on_error(dir, err),
    };
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();
    for entry in &entries {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(source) => {
                on_error(&path, RewriteError::ReadDir { path: path.clone(), source })?;
                continue;
            }
        };

        if file_type.is_dir() {
            subdirs.push(path);
        } else if entry.file_name() == file_name && is_regular_file(&path, file_type) {
            debug!("Found candidate: {:?}", path);
            found.push(path);
        }
    }

    for subdir in subdirs {
        walk(&subdir, file_name, found, on_error)?;
    }

    Ok(())
}

fn read_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, RewriteError> {
    let to_error = |source| RewriteError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    fs::read_dir(dir)
        .map_err(to_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_error)
}

// Symlinked files count, symlinked directories are not followed.
fn is_regular_file(path: &Path, file_type: fs::FileType) -> bool {
    if file_type.is_symlink() {
        return fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    }
    file_type.is_file()
}

fn rewrite_file_with<F>(
    path: &Path,
    rules: &RuleSet,
    options: &RewriteOptions,
    confirm: &F,
) -> Result<FileReport>
where
    F: Fn(&Path, &str, &str) -> Result<bool>,
{
    debug!("Processing file: {:?}", path);

    let content = read_text(path)?;
    let outcome = match rules.rewrite(&content) {
        None => {
            debug!("No imports to fix in: {:?}", path);
            FileOutcome::Unchanged
        }
        Some(rewrite) => {
            let replacements = rewrite.replacements;
            if !confirm(path, &content, &rewrite.content)? {
                info!("Skipping declined change to: {:?}", path);
                FileOutcome::Declined { replacements }
            } else if options.dry_run {
                info!("Would rewrite {} import(s) in: {:?}", replacements, path);
                FileOutcome::WouldRewrite { replacements }
            } else {
                info!("Rewriting {} import(s) in: {:?}", replacements, path);
                write_atomic(path, &rewrite.content)?;
                FileOutcome::Rewritten { replacements }
            }
        }
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        outcome,
    })
}

fn read_text(path: &Path) -> Result<String, RewriteError> {
    let bytes = fs::read(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| RewriteError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `content` to a sibling temp file and renames it over `path`, so a
/// crash never leaves `path` truncated. The original permissions are kept.
///
/// Symlinks are resolved first: the link stays in place and its target is
/// replaced.
fn write_atomic(path: &Path, content: &str) -> Result<(), RewriteError> {
    let to_error = |source| RewriteError::Write {
        path: path.to_path_buf(),
        source,
    };

    let target = fs::canonicalize(path).map_err(to_error)?;
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(&target).map_err(to_error)?.permissions();

    let mut tmp = Builder::new()
        .prefix(".pagefix.")
        .tempfile_in(dir)
        .map_err(to_error)?;
    tmp.write_all(content.as_bytes()).map_err(to_error)?;
    tmp.flush().map_err(to_error)?;
    tmp.as_file().sync_all().map_err(to_error)?;
    tmp.as_file().set_permissions(permissions).map_err(to_error)?;

    tmp.persist(&target).map_err(|err| to_error(err.error))?;
    Ok(())
}

fn record_failure(summary: &mut RewriteSummary, path: PathBuf, err: &anyhow::Error) {
    let message = format!("{err:#}");
    warn!("Continuing past failure: {}", message);
    summary.failures.push(Failure { path, message });
}
