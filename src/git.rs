//! Git integration for branchdiff.
//!
//! Provides the [`DiffSource`] seam and its process-backed implementation,
//! [`GitCli`]. This module is the sole interface to git: it fetches raw
//! diff, numstat and name-status text for a base ref and merges them into
//! [`FileDiff`] values. It does no rendering.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::diff::{self, FileDiff, FileStatus};
use crate::error::{BranchDiffError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Anything that can answer the questions the report needs from version
/// control.
pub trait DiffSource {
    /// Name of the checked-out branch (`HEAD` when detached).
    fn current_branch(&self) -> Result<String>;

    /// Names of all local branches.
    fn local_branches(&self) -> Result<Vec<String>>;

    /// Fetch the changes on `HEAD` since it diverged from `base`.
    fn fetch(&self, base: &str) -> Result<DiffFetch>;
}

/// Result of asking a [`DiffSource`] for the changes against a base.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffFetch {
    /// `HEAD` has no changes relative to the base.
    Unchanged,
    /// The base and `HEAD` share no history.
    Unrelated,
    Changes(DiffSnapshot),
}

/// Raw material for a report: unified diff text plus per-file stats.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffSnapshot {
    pub patch: String,
    pub numstat: Vec<NumstatEntry>,
    pub statuses: Vec<StatusEntry>,
}

/// One record of `git diff --numstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub path: String,
    /// `None` for binary files.
    pub counts: Option<(usize, usize)>,
}

/// One record of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: FileStatus,
    pub old_path: String,
    pub new_path: String,
    pub similarity: Option<u8>,
}

impl DiffSnapshot {
    /// Parse the patch and merge numstat and name-status information into
    /// one [`FileDiff`] per changed file, in patch order.
    pub fn files(&self) -> Vec<FileDiff> {
        let mut files = diff::parse_unified_diff(&self.patch);

        for entry in &self.statuses {
            let known = files
                .iter_mut()
                .find(|f| f.new_path == entry.new_path || f.old_path == entry.new_path);
            match known {
                Some(file) => {
                    if entry.similarity.is_some() {
                        file.similarity = entry.similarity;
                    }
                }
                None => {
                    let mut file = FileDiff::new(entry.old_path.clone(), entry.new_path.clone());
                    file.status = entry.status;
                    file.similarity = entry.similarity;
                    files.push(file);
                }
            }
        }

        for file in &mut files {
            let stat = self
                .numstat
                .iter()
                .find(|n| n.path == file.new_path || n.path == file.old_path);
            match stat.map(|n| n.counts) {
                Some(Some((insertions, deletions))) => {
                    file.insertions = insertions;
                    file.deletions = deletions;
                }
                Some(None) => {
                    file.status = FileStatus::Binary;
                    file.hunks.clear();
                    file.insertions = 0;
                    file.deletions = 0;
                }
                None => {}
            }
        }

        files
    }
}

// ---------------------------------------------------------------------------
// Git command execution
// ---------------------------------------------------------------------------

/// Run git with `args` in `cwd` and return the raw process output.
///
/// A failure to start the process (git missing, bad directory) becomes
/// [`BranchDiffError::DiffSourceUnavailable`].
fn git_output(args: &[&str], cwd: &Path) -> Result<Output> {
    debug!(?args, cwd = %cwd.display(), "running git");
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| BranchDiffError::unavailable(format!("failed to execute git: {e}")))
}

/// Run a git command and return its stdout, failing on non-zero exit.
fn run_git(args: &[&str], cwd: &Path) -> Result<String> {
    let output = git_output(args, cwd)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(BranchDiffError::Git {
            message: if stderr.is_empty() {
                format!("git exited with status {}", output.status)
            } else {
                stderr
            },
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Verify that the given path is inside a git repository.
pub fn verify_git_repo(root: &Path) -> Result<()> {
    run_git(&["rev-parse", "--git-dir"], root)
        .map(|_| ())
        .map_err(|e| match e {
            BranchDiffError::Git { message } => BranchDiffError::unavailable(message),
            other => other,
        })
}

/// [`DiffSource`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Open the repository containing `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        verify_git_repo(&root)?;
        Ok(Self { root })
    }

    fn diff(&self, extra: &[&str], range: &str) -> Result<String> {
        let mut args = vec![
            "-c",
            "core.quotepath=off",
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            "-M",
        ];
        args.extend_from_slice(extra);
        args.push(range);
        run_git(&args, &self.root)
    }

    /// Merge base of `base` and `HEAD`, or `None` for unrelated histories.
    fn merge_base(&self, base: &str) -> Result<Option<String>> {
        let output = git_output(&["merge-base", base, "HEAD"], &self.root)?;
        if output.status.code() == Some(1) {
            return Ok(None);
        }
        if !output.status.success() {
            return Err(BranchDiffError::Git {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }
}

impl DiffSource for GitCli {
    fn current_branch(&self) -> Result<String> {
        match run_git(&["symbolic-ref", "--quiet", "--short", "HEAD"], &self.root) {
            Ok(name) => Ok(name.trim().to_string()),
            Err(BranchDiffError::Git { .. }) => Ok("HEAD".to_string()),
            Err(e) => Err(e),
        }
    }

    fn local_branches(&self) -> Result<Vec<String>> {
        let output = run_git(
            &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
            &self.root,
        )?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn fetch(&self, base: &str) -> Result<DiffFetch> {
        let commit = format!("{base}^{{commit}}");
        if !git_output(&["rev-parse", "--verify", "--quiet", &commit], &self.root)?
            .status
            .success()
        {
            return Err(BranchDiffError::unavailable(format!(
                "unknown revision '{base}'"
            )));
        }

        let Some(merge_base) = self.merge_base(base)? else {
            return Ok(DiffFetch::Unrelated);
        };
        let head = run_git(&["rev-parse", "HEAD"], &self.root)?;
        if head.trim() == merge_base {
            debug!(base, "HEAD is the merge base; nothing to diff");
            return Ok(DiffFetch::Unchanged);
        }

        let range = format!("{base}...HEAD");
        let patch = self.diff(&[], &range)?;
        let numstat = parse_numstat(&self.diff(&["--numstat", "-z"], &range)?);
        let statuses = parse_name_status(&self.diff(&["--name-status", "-z"], &range)?);

        if patch.trim().is_empty() && statuses.is_empty() {
            return Ok(DiffFetch::Unchanged);
        }

        Ok(DiffFetch::Changes(DiffSnapshot {
            patch,
            numstat,
            statuses,
        }))
    }
}

// ---------------------------------------------------------------------------
// Stat parsers
// ---------------------------------------------------------------------------

/// Parse `git diff --numstat -z` output.
///
/// Records are `ins\tdel\tpath\0`, or `ins\tdel\t\0old\0new\0` for renames.
/// Binary files report `-` for both counts.
pub fn parse_numstat(raw: &str) -> Vec<NumstatEntry> {
    let mut entries = Vec::new();
    let mut fields = raw.split('\0');

    while let Some(record) = fields.next() {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }
        let mut parts = record.splitn(3, '\t');
        let (Some(ins), Some(del), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        let path = if path.is_empty() {
            // Rename: old and new paths follow as separate fields.
            let _old = fields.next();
            match fields.next() {
                Some(new) => new.to_string(),
                None => continue,
            }
        } else {
            path.to_string()
        };

        let counts = match (ins.parse(), del.parse()) {
            (Ok(i), Ok(d)) => Some((i, d)),
            _ => None,
        };
        entries.push(NumstatEntry { path, counts });
    }

    entries
}

/// Parse `git diff --name-status -z` output.
///
/// Records are `X\0path\0`, or `R087\0old\0new\0` for renames and copies.
pub fn parse_name_status(raw: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = raw.split('\0');

    while let Some(code) = fields.next() {
        let code = code.trim();
        let Some(letter) = code.chars().next() else {
            continue;
        };
        let score = code[letter.len_utf8()..].parse::<u8>().ok();

        let Some(first) = fields.next() else {
            break;
        };
        let (old_path, new_path) = if matches!(letter, 'R' | 'C') {
            match fields.next() {
                Some(second) => (first.to_string(), second.to_string()),
                None => break,
            }
        } else {
            (first.to_string(), first.to_string())
        };

        let status = match letter {
            'A' => FileStatus::Added,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'C' => FileStatus::Added,
            _ => FileStatus::Modified,
        };
        let (old_path, similarity) = match letter {
            'R' => (old_path, score),
            'C' => (new_path.clone(), None),
            _ => (old_path, None),
        };

        entries.push(StatusEntry {
            status,
            old_path,
            new_path,
            similarity,
        });
    }

    entries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
