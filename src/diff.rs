//! Structured diff model and unified diff parser.
//!
//! Everything downstream of the git adapter works with [`FileDiff`],
//! [`Hunk`] and [`DiffLine`] rather than raw `git diff` text. Parsing is
//! best effort: a hunk whose `@@` header cannot be read is skipped and
//! counted on its file instead of failing the whole report.

use tracing::warn;

use crate::error::{BranchDiffError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single file affected by the diff.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    /// Path before the change (equal to `new_path` unless renamed).
    pub old_path: String,
    /// Path after the change.
    pub new_path: String,
    /// How the file was changed.
    pub status: FileStatus,
    /// Rename similarity percentage, when git reported one.
    pub similarity: Option<u8>,
    /// Lines added, per numstat (or counted from hunks as a fallback).
    pub insertions: usize,
    /// Lines removed, per numstat (or counted from hunks as a fallback).
    pub deletions: usize,
    /// Change regions, in the order git emitted them.
    pub hunks: Vec<Hunk>,
    /// Number of hunks dropped because their header failed to parse.
    pub malformed_hunks: usize,
}

/// The kind of change applied to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Binary,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

/// A single line within a [`Hunk`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line number in the old file (context and deletions).
    pub old_lineno: Option<usize>,
    /// Line number in the new file (context and additions).
    pub new_lineno: Option<usize>,
    /// Line text without the leading `+`/`-`/space marker.
    pub text: String,
}

/// Classification of a diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
}

impl FileStatus {
    /// Short tag shown next to the file name; `None` for plain modifications.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::Added => Some("added"),
            Self::Deleted => Some("deleted"),
            Self::Renamed => Some("renamed"),
            Self::Binary => Some("binary"),
            Self::Modified => None,
        }
    }
}

impl FileDiff {
    pub(crate) fn new(old_path: String, new_path: String) -> Self {
        let status = if old_path != new_path {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        };
        Self {
            old_path,
            new_path,
            status,
            similarity: None,
            insertions: 0,
            deletions: 0,
            hunks: Vec::new(),
            malformed_hunks: 0,
        }
    }

    /// Path used to identify the file in listings (the new path, or the
    /// old one for deletions).
    pub fn display_path(&self) -> &str {
        if self.status == FileStatus::Deleted {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    pub fn is_renamed(&self) -> bool {
        self.old_path != self.new_path
    }

    /// Largest line number shown for this file on either side.
    pub fn max_line_number(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .map(DiffLine::display_lineno)
            .max()
            .unwrap_or(0)
    }
}

impl DiffLine {
    /// The number rendered in the line-number column: the old number for
    /// deletions, the new number otherwise.
    pub fn display_lineno(&self) -> usize {
        match self.kind {
            LineKind::Deletion => self.old_lineno.unwrap_or(0),
            LineKind::Addition | LineKind::Context => self.new_lineno.unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Unified diff parser
// ---------------------------------------------------------------------------

/// Line-number cursor for the hunk currently being filled.
struct HunkCursor {
    old_lineno: usize,
    new_lineno: usize,
    old_remaining: usize,
    new_remaining: usize,
}

impl HunkCursor {
    fn is_done(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }
}

/// Parse the full output of `git diff` into structured [`FileDiff`] values.
///
/// Understands the `diff --git` header, extended headers (renames, new and
/// deleted file modes, binary notices) and `@@` hunks. Insertion and
/// deletion counts are derived from the parsed lines; the git adapter
/// replaces them with numstat figures when available.
pub fn parse_unified_diff(input: &str) -> Vec<FileDiff> {
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut hunk: Option<Hunk> = None;
    let mut cursor: Option<HunkCursor> = None;
    // True while skipping the body of a hunk whose header was malformed.
    let mut skipping = false;

    // Split on '\n' only: a '\r' before it is line content.
    let body = input.strip_suffix('\n').unwrap_or(input);
    for line in body.split('\n') {
        // Hunk bodies are consumed by count, so content lines that happen to
        // start with "---" or "diff " are never mistaken for headers.
        if let (Some(h), Some(c)) = (hunk.as_mut(), cursor.as_mut()) {
            if !c.is_done() && push_hunk_line(h, c, line) {
                continue;
            }
        }
        if line == "\\ No newline at end of file" {
            continue;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush_hunk(&mut current, &mut hunk);
            cursor = None;
            skipping = false;
            if let Some(file) = current.take() {
                files.push(finish_file(file));
            }
            let (a_path, b_path) = parse_diff_header(rest);
            current = Some(FileDiff::new(a_path, b_path));
            continue;
        }

        if current.is_none() {
            continue;
        }

        if line.starts_with("@@") {
            flush_hunk(&mut current, &mut hunk);
            match parse_hunk_header(line) {
                Ok(h) => {
                    cursor = Some(HunkCursor {
                        old_lineno: h.old_start,
                        new_lineno: h.new_start,
                        old_remaining: h.old_count,
                        new_remaining: h.new_count,
                    });
                    hunk = Some(h);
                    skipping = false;
                }
                Err(err) => {
                    if let Some(file) = current.as_mut() {
                        warn!(path = %file.new_path, "skipping hunk: {err}");
                        file.malformed_hunks += 1;
                    }
                    cursor = None;
                    skipping = true;
                }
            }
            continue;
        }

        if skipping {
            if is_hunk_body_line(line) {
                continue;
            }
            skipping = false;
        }

        if let Some(file) = current.as_mut() {
            apply_extended_header(file, line);
        }
    }

    flush_hunk(&mut current, &mut hunk);
    if let Some(file) = current.take() {
        files.push(finish_file(file));
    }

    files
}

/// Append one body line to the hunk, advancing the cursor. Returns false if
/// the line does not look like hunk content.
fn push_hunk_line(hunk: &mut Hunk, cursor: &mut HunkCursor, line: &str) -> bool {
    let (kind, text) = if let Some(text) = line.strip_prefix('+') {
        (LineKind::Addition, text)
    } else if let Some(text) = line.strip_prefix('-') {
        (LineKind::Deletion, text)
    } else if let Some(text) = line.strip_prefix(' ') {
        (LineKind::Context, text)
    } else if line.is_empty() {
        // Some tools strip the trailing space of empty context lines.
        (LineKind::Context, "")
    } else {
        return false;
    };

    let (old_lineno, new_lineno) = match kind {
        LineKind::Addition => {
            let n = cursor.new_lineno;
            cursor.new_lineno += 1;
            cursor.new_remaining = cursor.new_remaining.saturating_sub(1);
            (None, Some(n))
        }
        LineKind::Deletion => {
            let o = cursor.old_lineno;
            cursor.old_lineno += 1;
            cursor.old_remaining = cursor.old_remaining.saturating_sub(1);
            (Some(o), None)
        }
        LineKind::Context => {
            let (o, n) = (cursor.old_lineno, cursor.new_lineno);
            cursor.old_lineno += 1;
            cursor.new_lineno += 1;
            cursor.old_remaining = cursor.old_remaining.saturating_sub(1);
            cursor.new_remaining = cursor.new_remaining.saturating_sub(1);
            (Some(o), Some(n))
        }
    };

    hunk.lines.push(DiffLine {
        kind,
        old_lineno,
        new_lineno,
        text: text.to_string(),
    });
    true
}

fn is_hunk_body_line(line: &str) -> bool {
    line.is_empty() || line.starts_with([' ', '+', '-', '\\'])
}

/// Update file metadata from a git extended header line.
fn apply_extended_header(file: &mut FileDiff, line: &str) {
    if line.starts_with("new file mode") || line == "--- /dev/null" {
        file.status = FileStatus::Added;
    } else if line.starts_with("deleted file mode") || line == "+++ /dev/null" {
        file.status = FileStatus::Deleted;
    } else if let Some(path) = line.strip_prefix("rename from ") {
        file.old_path = unquote(path);
        file.status = FileStatus::Renamed;
    } else if let Some(path) = line.strip_prefix("rename to ") {
        file.new_path = unquote(path);
        file.status = FileStatus::Renamed;
    } else if let Some(pct) = line.strip_prefix("similarity index ") {
        file.similarity = pct.trim_end_matches('%').parse().ok();
    } else if line.starts_with("Binary files ") || line == "GIT binary patch" {
        file.status = FileStatus::Binary;
    } else if let Some(path) = line.strip_prefix("--- a/") {
        file.old_path = unquote(path);
    } else if let Some(path) = line.strip_prefix("+++ b/") {
        file.new_path = unquote(path);
    }
}

/// Count insertions and deletions from the parsed hunk lines.
fn finish_file(mut file: FileDiff) -> FileDiff {
    for line in file.hunks.iter().flat_map(|h| h.lines.iter()) {
        match line.kind {
            LineKind::Addition => file.insertions += 1,
            LineKind::Deletion => file.deletions += 1,
            LineKind::Context => {}
        }
    }
    file
}

/// Push the current hunk (if any) into the current file.
fn flush_hunk(file: &mut Option<FileDiff>, hunk: &mut Option<Hunk>) {
    if let (Some(f), Some(h)) = (file.as_mut(), hunk.take()) {
        f.hunks.push(h);
    }
}

/// Extract (a_path, b_path) from the tail of a `diff --git a/x b/y` line.
fn parse_diff_header(rest: &str) -> (String, String) {
    let rest = rest.trim();
    if let Some((a, b)) = rest.split_once(" b/") {
        let a = a.strip_prefix("a/").unwrap_or(a);
        return (unquote(a), unquote(b));
    }
    // Quoted form: "a/x y" "b/x y"
    if let Some((a, b)) = rest.split_once("\" \"") {
        let a = a.trim_start_matches('"');
        let b = b.trim_end_matches('"');
        let a = a.strip_prefix("a/").unwrap_or(a);
        let b = b.strip_prefix("b/").unwrap_or(b);
        return (a.to_string(), b.to_string());
    }
    (rest.to_string(), rest.to_string())
}

fn unquote(path: &str) -> String {
    let path = path.trim_end_matches('\t');
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
        .to_string()
}

/// Parse a hunk header line like `@@ -10,7 +10,8 @@ fn main()`.
pub fn parse_hunk_header(line: &str) -> Result<Hunk> {
    let malformed = || BranchDiffError::MalformedHunk {
        header: line.to_string(),
    };

    let trimmed = line.strip_prefix("@@ ").ok_or_else(malformed)?;
    let end = trimmed.find(" @@").ok_or_else(malformed)?;
    let mut parts = trimmed[..end].split(' ');

    let old = parts.next().and_then(|p| p.strip_prefix('-'));
    let new = parts.next().and_then(|p| p.strip_prefix('+'));
    if parts.next().is_some() {
        return Err(malformed());
    }

    let (old_start, old_count) = old.and_then(parse_range).ok_or_else(malformed)?;
    let (new_start, new_count) = new.and_then(parse_range).ok_or_else(malformed)?;

    Ok(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        lines: Vec::new(),
    })
}

/// Parse a range like "10,7" or "10" into (start, count).
fn parse_range(s: &str) -> Option<(usize, usize)> {
    if let Some((start, count)) = s.split_once(',') {
        Some((start.parse().ok()?, count.parse().ok()?))
    } else {
        Some((s.parse().ok()?, 1))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
