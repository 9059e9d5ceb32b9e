//! Report assembly.
//!
//! Resolves the base branch, fetches the diff from a [`DiffSource`] and
//! renders the final text: a summary with per-file stats, one boxed
//! two-column section per file in patch order, and a legend of the glyphs
//! that were used. Missing bases and empty diffs short-circuit to one-line
//! messages.

use tracing::{info, warn};

use crate::branch::{resolve_base_branch, BaseBranch};
use crate::diff::{FileDiff, FileStatus, Hunk};
use crate::error::{BranchDiffError, Result};
use crate::escape::is_whitespace_only_change;
use crate::git::{DiffFetch, DiffSource};
use crate::layout::{Indicator, Section, Span};
use crate::legend::Legend;
use crate::pairing::{classify_hunk, LineClass, ModificationPair};
use crate::word_diff::{tokenize, word_diff, MarkedToken, WordDiff};

/// Report body when the branch has nothing to show.
pub const NO_CHANGES: &str = "No changes";
/// Prefix of the report body when no base branch could be determined.
pub const BASE_NOT_FOUND: &str = "Base branch not found";

/// Inputs that shape a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub terminal_width: usize,
    /// Use this base instead of resolving one from the branch name.
    pub base: Option<String>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Produce the full report for the repository behind `source`.
///
/// Only unexpected git failures are returned as errors; a missing base or an
/// unavailable repository become the "Base branch not found" message.
pub fn build_report(source: &dyn DiffSource, options: &ReportOptions) -> Result<String> {
    let base = match resolve_base(source, options.base.as_deref()) {
        Ok(base) => base,
        Err(err) if err.is_missing_base() => return Ok(base_not_found_message(&err)),
        Err(err) => return Err(err),
    };

    let fetch = match source.fetch(&base) {
        Ok(fetch) => fetch,
        Err(err) if err.is_missing_base() => return Ok(base_not_found_message(&err)),
        Err(err) => return Err(err),
    };

    match fetch {
        DiffFetch::Unchanged => Ok(no_changes_message()),
        DiffFetch::Unrelated => {
            warn!(base = %base, "no common ancestor with base; nothing to compare");
            Ok(no_changes_message())
        }
        DiffFetch::Changes(snapshot) => Ok(render_report(
            &base,
            &snapshot.files(),
            options.terminal_width,
        )),
    }
}

/// The explicit base if given, otherwise the conventional base of the
/// current branch.
pub fn resolve_base(source: &dyn DiffSource, explicit: Option<&str>) -> Result<String> {
    if let Some(base) = explicit {
        return Ok(base.to_string());
    }
    let current = source.current_branch()?;
    let branches = source.local_branches()?;
    match resolve_base_branch(&current, &branches) {
        BaseBranch::Found(base) => Ok(base),
        BaseBranch::NotFound => {
            info!(current = %current, "no base branch by naming convention");
            Err(BranchDiffError::BaseBranchNotFound { branch: current })
        }
    }
}

fn no_changes_message() -> String {
    format!("{NO_CHANGES}\n")
}

pub fn base_not_found_message(err: &BranchDiffError) -> String {
    let mut legend = Legend::new();
    let detail = match err {
        BranchDiffError::BaseBranchNotFound { branch } => format!("current branch: {branch}"),
        BranchDiffError::DiffSourceUnavailable { message } => {
            message.lines().next().unwrap_or_default().to_string()
        }
        other => other.to_string(),
    };
    format!(
        "{BASE_NOT_FOUND} ({})\n",
        Span::plain(&detail).render(&mut legend)
    )
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a report for already-parsed files.
pub fn render_report(base: &str, files: &[FileDiff], terminal_width: usize) -> String {
    if files.is_empty() {
        return no_changes_message();
    }

    let mut legend = Legend::new();
    let mut out = String::new();

    let insertions: usize = files.iter().map(|f| f.insertions).sum();
    let deletions: usize = files.iter().map(|f| f.deletions).sum();

    out.push_str("# Diff Summary\n\n");
    out.push_str(&format!(
        "- Base branch: {}\n",
        Span::plain(base).render(&mut legend)
    ));
    out.push_str(&format!("- Files changed: {}\n", files.len()));
    out.push_str(&format!("- Insertions: +{insertions}\n"));
    out.push_str(&format!("- Deletions: -{deletions}\n\n"));

    out.push_str("## Changed Files\n\n");
    for file in files {
        out.push_str(&format!("- {}\n", changed_file_entry(file, &mut legend)));
    }
    out.push('\n');

    out.push_str("## Rendered Diff (2-column format)\n\n");
    for file in files {
        out.push_str(&format!(
            "### {}\n\n",
            Span::plain(file.display_path()).render(&mut legend)
        ));
        out.push_str(&render_file(file, terminal_width, &mut legend));
        out.push('\n');
    }

    out.push_str(&legend.render());
    out
}

fn changed_file_entry(file: &FileDiff, legend: &mut Legend) -> String {
    let mut entry = Span::plain(file.display_path()).render(legend);
    if let Some(tag) = file_tag(file) {
        entry.push_str(&format!(" [{}]", Span::plain(&tag).render(legend)));
    }
    if file.status != FileStatus::Binary {
        entry.push_str(&format!(" (+{} / -{})", file.insertions, file.deletions));
    }
    entry
}

/// Status annotation for a file, e.g. `added` or
/// `renamed from src/old.rs, 92% similar`.
fn file_tag(file: &FileDiff) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    match file.status {
        FileStatus::Added | FileStatus::Deleted | FileStatus::Binary => {
            parts.extend(file.status.tag().map(String::from));
        }
        FileStatus::Renamed | FileStatus::Modified => {}
    }
    if file.is_renamed() {
        let mut rename = format!("renamed from {}", file.old_path);
        if let Some(similarity) = file.similarity {
            rename.push_str(&format!(", {similarity}% similar"));
        }
        parts.push(rename);
    } else if file.status == FileStatus::Renamed {
        parts.push("renamed".to_string());
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Render one file's boxed section.
fn render_file(file: &FileDiff, terminal_width: usize, legend: &mut Legend) -> String {
    let mut section = Section::new(
        file.display_path(),
        file_tag(file),
        file.max_line_number(),
        terminal_width,
    );

    if file.malformed_hunks > 0 {
        section.notice(format!(
            "{} malformed hunk{} skipped; remaining changes shown",
            file.malformed_hunks,
            if file.malformed_hunks == 1 { "" } else { "s" },
        ));
    } else if file.hunks.is_empty() {
        section.notice(empty_file_notice(file));
    }

    for (i, hunk) in file.hunks.iter().enumerate() {
        if i > 0 {
            section.push_gap(legend);
        }
        render_hunk(&mut section, hunk, legend);
    }

    section.render(legend)
}

fn empty_file_notice(file: &FileDiff) -> &'static str {
    match file.status {
        FileStatus::Binary => "Binary file changed; content not shown",
        FileStatus::Added => "Empty file added",
        FileStatus::Deleted => "Empty file deleted",
        FileStatus::Renamed => "Renamed without content changes",
        FileStatus::Modified => "No line changes (mode or metadata only)",
    }
}

fn render_hunk(section: &mut Section, hunk: &Hunk, legend: &mut Legend) {
    let classified = classify_hunk(hunk);
    let mut pairs: Vec<(Vec<Span>, Vec<Span>)> =
        classified.pairs.iter().map(pair_spans).collect();

    for &(line, class) in &classified.lines {
        let (indicator, spans) = match class {
            LineClass::Context => (Indicator::Context, plain_spans(&line.text)),
            LineClass::Addition => (Indicator::Added, plain_spans(&line.text)),
            LineClass::Deletion => (Indicator::Removed, plain_spans(&line.text)),
            LineClass::PairedDeletion(i) => (Indicator::Removed, std::mem::take(&mut pairs[i].0)),
            LineClass::PairedAddition(i) => (Indicator::Added, std::mem::take(&mut pairs[i].1)),
        };
        section.push_line(line.display_lineno(), indicator, spans, legend);
    }
}

/// Spans for both sides of a modification pair.
fn pair_spans(pair: &ModificationPair<'_>) -> (Vec<Span>, Vec<Span>) {
    let old = pair.deletion.text.as_str();
    let new = pair.addition.text.as_str();

    if is_whitespace_only_change(old, new) {
        return (visible_spans(old), visible_spans(new));
    }

    match word_diff(old, new) {
        WordDiff::Highlighted { old, new } => (marked_spans(&old), marked_spans(&new)),
        WordDiff::TooLarge => (plain_spans(old), plain_spans(new)),
    }
}

fn plain_spans(text: &str) -> Vec<Span> {
    tokenize(text).into_iter().map(Span::plain).collect()
}

fn visible_spans(text: &str) -> Vec<Span> {
    tokenize(text).into_iter().map(Span::visible).collect()
}

fn marked_spans(tokens: &[MarkedToken<'_>]) -> Vec<Span> {
    tokens
        .iter()
        .map(|t| {
            if t.changed {
                Span::changed(t.text)
            } else {
                Span::plain(t.text)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
