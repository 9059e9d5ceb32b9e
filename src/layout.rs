//! Fixed-width, two-column box layout for one file's diff.
//!
//! Every row of a section is padded to the same visual width so the right
//! border lines up, no matter how much zero-width markup (`**` markers,
//! escaping backslashes) a row carries or how many wide characters it has.
//! Overlong content is wrapped at span boundaries and continued on rows that
//! repeat the line number and change indicator.
//!
//! ```text
//! ┌────────────────────────────┐
//! │ src/lib.rs                 │
//! ├────┬───────────────────────┤
//! │ 12 │ - let a = **old**;    │
//! │ 12 │ + let a = **new**;    │
//! └────┴───────────────────────┘
//! ```

use std::collections::VecDeque;

use unicode_width::UnicodeWidthChar;

use crate::escape::{self, is_markup_char, CR_GLYPH, SPACE_GLYPH, TAB_GLYPH};
use crate::legend::{Legend, LegendEntry};

/// Appended to a row whose content continues on the next row.
pub const WRAP_GLYPH: char = '↩';
/// Shown in the line-number column between two hunks.
pub const GAP_GLYPH: char = '⋮';
/// Marks the start and end of a changed word.
pub const BOLD_MARKER: &str = "**";
/// Columns used by borders, padding and the change indicator on a body row,
/// excluding the line-number column and the content.
pub const BORDER_OVERHEAD: usize = 9;
pub const MIN_COLUMN_WIDTH: usize = 2;
pub const MIN_CONTENT_WIDTH: usize = 10;

// ---------------------------------------------------------------------------
// Width accounting
// ---------------------------------------------------------------------------

/// Displayed column count of rendered text.
///
/// A `**` pair and an escaping backslash count as zero columns; wide code
/// points count as two.
pub fn visual_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|&next| is_markup_char(next)) => {
                chars.next();
                width += 1;
            }
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
            }
            c => width += c.width().unwrap_or(0),
        }
    }
    width
}

/// Width of the line-number column for a file whose largest line number is
/// `max_line_number`.
pub fn column_width(max_line_number: usize) -> usize {
    let digits = max_line_number.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(MIN_COLUMN_WIDTH)
}

/// Columns available for content on a body row.
pub fn content_limit(terminal_width: usize, column_width: usize) -> usize {
    terminal_width
        .saturating_sub(column_width + BORDER_OVERHEAD)
        .max(MIN_CONTENT_WIDTH)
}

fn raw_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

// ---------------------------------------------------------------------------
// Spans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Plain,
    Changed,
    /// Whitespace shown as glyphs.
    Visible,
}

/// A run of display text (unescaped) that wrapping never splits unless it is
/// wider than a whole row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    text: String,
    kind: SpanKind,
}

impl Span {
    pub fn plain(text: &str) -> Self {
        Self {
            text: escape::sanitize(text).into_owned(),
            kind: SpanKind::Plain,
        }
    }

    pub fn changed(text: &str) -> Self {
        Self {
            text: escape::sanitize(text).into_owned(),
            kind: SpanKind::Changed,
        }
    }

    pub fn visible(text: &str) -> Self {
        Self {
            text: escape::visualize_whitespace(text),
            kind: SpanKind::Visible,
        }
    }

    /// Display width; equal to `visual_width` of the rendered form.
    pub fn width(&self) -> usize {
        raw_width(&self.text)
    }

    /// Escaped (and, for changed spans, bold-wrapped) text.
    pub fn render(&self, legend: &mut Legend) -> String {
        let escaped = escape::escape_markup(&self.text);
        if escaped.len() != self.text.len() {
            legend.mark(LegendEntry::Escaped);
        }
        if self.text.contains(CR_GLYPH) {
            legend.mark(LegendEntry::CarriageReturn);
        }
        match self.kind {
            SpanKind::Changed => {
                legend.mark(LegendEntry::ChangedWord);
                format!("{BOLD_MARKER}{escaped}{BOLD_MARKER}")
            }
            SpanKind::Visible => {
                if self.text.contains(SPACE_GLYPH) {
                    legend.mark(LegendEntry::Space);
                }
                if self.text.contains(TAB_GLYPH) {
                    legend.mark(LegendEntry::Tab);
                }
                escaped.into_owned()
            }
            SpanKind::Plain => escaped.into_owned(),
        }
    }

    /// Split into a head no wider than `max` and the remainder. With `force`,
    /// the head holds at least one character.
    fn split_at_width(self, max: usize, force: bool) -> (Option<Span>, Span) {
        let mut taken = 0;
        let mut cut = 0;
        for (idx, c) in self.text.char_indices() {
            let w = c.width().unwrap_or(0);
            if taken + w > max && !(force && cut == 0) {
                break;
            }
            taken += w;
            cut = idx + c.len_utf8();
        }
        let kind = self.kind;
        let mut head = self.text;
        let tail = head.split_off(cut);
        let head = (!head.is_empty()).then_some(Span { text: head, kind });
        (head, Span { text: tail, kind })
    }
}

/// Lay spans out on rows of at most `limit` columns.
///
/// Rows are broken at span boundaries; a span wider than a row is split by
/// character. Every row but the last ends with [`WRAP_GLYPH`]. Always
/// returns at least one (possibly empty) row.
pub fn wrap_spans(spans: Vec<Span>, limit: usize, legend: &mut Legend) -> Vec<String> {
    let budget = limit.saturating_sub(1).max(1);
    let mut rest: usize = spans.iter().map(Span::width).sum();
    let mut pending: VecDeque<Span> = spans.into();
    let mut rows = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    while let Some(span) = pending.pop_front() {
        let width = span.width();
        if line_width + rest <= limit || line_width + width <= budget {
            line.push_str(&span.render(legend));
            line_width += width;
            rest -= width;
            continue;
        }

        if width > budget {
            let room = budget.saturating_sub(line_width);
            let (head, tail) = span.split_at_width(room, line_width == 0);
            if let Some(head) = head {
                let w = head.width();
                line.push_str(&head.render(legend));
                rest -= w;
            }
            pending.push_front(tail);
        } else {
            pending.push_front(span);
        }

        line.push(WRAP_GLYPH);
        legend.mark(LegendEntry::Wrap);
        rows.push(std::mem::take(&mut line));
        line_width = 0;
    }

    rows.push(line);
    rows
}

// ---------------------------------------------------------------------------
// Rows and sections
// ---------------------------------------------------------------------------

/// Change indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Added,
    Removed,
    Context,
}

impl Indicator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "+ ",
            Self::Removed => "- ",
            Self::Context => "  ",
        }
    }
}

/// One physical body row. Wrapped lines produce several rows sharing the
/// same line number and indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub line_number: String,
    pub indicator: Indicator,
    pub content: String,
    /// Visual width of `content`.
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyRow {
    Line(RenderedRow),
    Gap,
}

/// A boxed file section under construction.
#[derive(Debug, Clone)]
pub struct Section {
    title: String,
    tag: Option<String>,
    column_width: usize,
    content_limit: usize,
    notices: Vec<String>,
    body: Vec<BodyRow>,
}

impl Section {
    pub fn new(
        title: impl Into<String>,
        tag: Option<String>,
        max_line_number: usize,
        terminal_width: usize,
    ) -> Self {
        let column_width = column_width(max_line_number);
        Self {
            title: title.into(),
            tag,
            column_width,
            content_limit: content_limit(terminal_width, column_width),
            notices: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a full-width informational row below the header.
    pub fn notice(&mut self, text: impl Into<String>) {
        self.notices.push(text.into());
    }

    /// Add one diff line, wrapping it over as many rows as needed.
    pub fn push_line(
        &mut self,
        number: usize,
        indicator: Indicator,
        spans: Vec<Span>,
        legend: &mut Legend,
    ) {
        match indicator {
            Indicator::Added => legend.mark(LegendEntry::Added),
            Indicator::Removed => legend.mark(LegendEntry::Removed),
            Indicator::Context => {}
        }
        let line_number = format!("{number:>width$}", width = self.column_width);
        for content in wrap_spans(spans, self.content_limit, legend) {
            let width = visual_width(&content);
            self.body.push(BodyRow::Line(RenderedRow {
                line_number: line_number.clone(),
                indicator,
                content,
                width,
            }));
        }
    }

    /// Add a separator row between two hunks.
    pub fn push_gap(&mut self, legend: &mut Legend) {
        legend.mark(LegendEntry::Gap);
        self.body.push(BodyRow::Gap);
    }

    pub fn rows(&self) -> impl Iterator<Item = &RenderedRow> {
        self.body.iter().filter_map(|row| match row {
            BodyRow::Line(r) => Some(r),
            BodyRow::Gap => None,
        })
    }

    /// Render the box, one line per row, each ending in a newline.
    pub fn render(&self, legend: &mut Legend) -> String {
        let w = self.column_width;
        let body_width = self.rows().map(|r| r.width).max().unwrap_or(0);
        let header_width = raw_width(&self.header_text());
        let notice_width = self.notices.iter().map(|n| raw_width(n)).max().unwrap_or(0);
        let wanted = header_width.max(notice_width).saturating_sub(w + 5);
        let content_width = body_width.max(wanted.min(self.content_limit));

        // Width of the text area of a full-width row.
        let full = w + content_width + 5;
        let rule = |n: usize| "─".repeat(n);

        let mut out = String::new();
        out.push_str(&format!("┌{}┐\n", rule(full + 2)));
        let header = Span::plain(&self.fitted_header(full)).render(legend);
        out.push_str(&format!("│ {} │\n", pad(&header, full)));

        if !self.notices.is_empty() {
            out.push_str(&format!("├{}┤\n", rule(full + 2)));
            for notice in &self.notices {
                let text = Span::plain(&truncate_end(notice, full)).render(legend);
                out.push_str(&format!("│ {} │\n", pad(&text, full)));
            }
        }

        if self.body.is_empty() {
            out.push_str(&format!("└{}┘\n", rule(full + 2)));
            return out;
        }

        out.push_str(&format!("├{}┬{}┤\n", rule(w + 2), rule(content_width + 4)));
        for row in &self.body {
            match row {
                BodyRow::Line(r) => out.push_str(&format!(
                    "│ {} │ {}{} │\n",
                    r.line_number,
                    r.indicator.as_str(),
                    pad(&r.content, content_width)
                )),
                BodyRow::Gap => out.push_str(&format!(
                    "│ {GAP_GLYPH:>w$} │ {} │\n",
                    " ".repeat(content_width + 2)
                )),
            }
        }
        out.push_str(&format!("└{}┴{}┘\n", rule(w + 2), rule(content_width + 4)));
        out
    }

    fn header_text(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{} [{tag}]", self.title),
            None => self.title.clone(),
        }
    }

    /// Header no wider than `max`, shortening the title from the left first.
    fn fitted_header(&self, max: usize) -> String {
        let full = self.header_text();
        if raw_width(&full) <= max {
            return full;
        }
        let suffix = self
            .tag
            .as_ref()
            .map(|t| format!(" [{t}]"))
            .unwrap_or_default();
        let room = max.saturating_sub(raw_width(&suffix));
        if room >= 2 {
            format!("{}{suffix}", truncate_start(&self.title, room))
        } else {
            truncate_end(&full, max)
        }
    }
}

/// Right-pad rendered text with spaces to `target` visual columns.
fn pad(text: &str, target: usize) -> String {
    let fill = target.saturating_sub(visual_width(text));
    format!("{text}{}", " ".repeat(fill))
}

/// Keep the end of `text`, prefixed with `…`, within `max` columns.
fn truncate_start(text: &str, max: usize) -> String {
    if raw_width(text) <= max {
        return text.to_string();
    }
    let mut kept: Vec<char> = Vec::new();
    let mut width = 1;
    for c in text.chars().rev() {
        let w = c.width().unwrap_or(0);
        if width + w > max {
            break;
        }
        width += w;
        kept.push(c);
    }
    std::iter::once('…').chain(kept.into_iter().rev()).collect()
}

/// Keep the start of `text`, suffixed with `…`, within `max` columns.
fn truncate_end(text: &str, max: usize) -> String {
    if raw_width(text) <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 1;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(words: &[&str]) -> Vec<Span> {
        words.iter().map(|w| Span::plain(w)).collect()
    }

    #[test]
    fn visual_width_ignores_markup() {
        assert_eq!(visual_width("plain"), 5);
        assert_eq!(visual_width("**bold**"), 4);
        assert_eq!(visual_width("my\\_var"), 6);
        assert_eq!(visual_width("**\\***"), 1);
        assert_eq!(visual_width("a\\\\b"), 3);
        assert_eq!(visual_width("**a****b**"), 2);
    }

    #[test]
    fn visual_width_counts_wide_chars_twice() {
        assert_eq!(visual_width("世界"), 4);
        assert_eq!(visual_width("**世**x"), 3);
    }

    #[test]
    fn span_width_matches_rendered_width() {
        let mut legend = Legend::new();
        for span in [
            Span::plain("snake_case * ptr \\ path"),
            Span::changed("__init__"),
            Span::changed("\\"),
            Span::visible("\t  x"),
            Span::plain("\ttabbed"),
        ] {
            assert_eq!(span.width(), visual_width(&span.render(&mut legend)));
        }
    }

    #[test]
    fn column_width_has_floor_of_two() {
        assert_eq!(column_width(0), 2);
        assert_eq!(column_width(7), 2);
        assert_eq!(column_width(99), 2);
        assert_eq!(column_width(100), 3);
        assert_eq!(column_width(1499), 4);
        assert_eq!(column_width(123_456), 6);
    }

    #[test]
    fn short_content_is_not_wrapped() {
        let mut legend = Legend::new();
        let rows = wrap_spans(spans(&["hello", " ", "world"]), 20, &mut legend);
        assert_eq!(rows, vec!["hello world".to_string()]);
        assert!(!legend.contains(LegendEntry::Wrap));
    }

    #[test]
    fn exact_fit_is_not_wrapped() {
        let mut legend = Legend::new();
        let rows = wrap_spans(spans(&["0123456789"]), 10, &mut legend);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn long_content_wraps_at_span_boundaries() {
        let mut legend = Legend::new();
        let words: Vec<&str> = "alpha beta gamma delta epsilon"
            .split_inclusive(' ')
            .collect();
        let rows = wrap_spans(spans(&words), 12, &mut legend);
        assert!(rows.len() > 1);
        for row in &rows[..rows.len() - 1] {
            assert!(row.ends_with(WRAP_GLYPH));
        }
        for row in &rows {
            assert!(visual_width(row) <= 12, "{row:?}");
        }
        let joined: String = rows.concat().replace(WRAP_GLYPH, "");
        assert_eq!(joined, "alpha beta gamma delta epsilon");
        assert_eq!(rows[0], format!("alpha beta {WRAP_GLYPH}"));
        assert!(legend.contains(LegendEntry::Wrap));
    }

    #[test]
    fn oversized_span_is_split_by_character() {
        let mut legend = Legend::new();
        let rows = wrap_spans(vec![Span::changed(&"x".repeat(25))], 10, &mut legend);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], format!("**{}**{WRAP_GLYPH}", "x".repeat(9)));
        for row in &rows {
            assert!(visual_width(row) <= 10);
        }
    }

    #[test]
    fn empty_line_yields_one_empty_row() {
        let mut legend = Legend::new();
        assert_eq!(wrap_spans(Vec::new(), 10, &mut legend), vec![String::new()]);
    }

    fn assert_aligned(rendered: &str) {
        let widths: Vec<usize> = rendered.lines().map(visual_width).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{rendered}\n{widths:?}");
    }

    #[test]
    fn section_rows_share_one_width() {
        let mut legend = Legend::new();
        let mut section = Section::new("src/lib.rs", None, 120, 40);
        section.push_line(
            118,
            Indicator::Removed,
            vec![Span::plain("let "), Span::changed("old_name"), Span::plain(" = 1;")],
            &mut legend,
        );
        section.push_line(
            118,
            Indicator::Added,
            vec![Span::plain("let "), Span::changed("新しい"), Span::plain(" = 1;")],
            &mut legend,
        );
        section.push_gap(&mut legend);
        section.push_line(120, Indicator::Context, spans(&["}"]), &mut legend);

        let rendered = section.render(&mut legend);
        assert_aligned(&rendered);
        for line in rendered.lines().skip(1) {
            assert!(line.ends_with('│') || line.ends_with('┤') || line.ends_with('┘'));
        }
        assert!(rendered.contains("│ 118 │ - let **old\\_name** = 1;"));
        assert!(rendered.contains(GAP_GLYPH));
        assert!(legend.contains(LegendEntry::Gap));
        assert!(legend.contains(LegendEntry::Escaped));
    }

    #[test]
    fn wrapped_rows_repeat_line_number_and_indicator() {
        let mut legend = Legend::new();
        let mut section = Section::new("a.txt", None, 5, 30);
        let words: Vec<&str> = "one two three four five six seven eight nine"
            .split_inclusive(' ')
            .collect();
        section.push_line(5, Indicator::Added, spans(&words), &mut legend);

        let rows: Vec<&RenderedRow> = section.rows().collect();
        assert!(rows.len() > 1);
        assert!(rows.iter().all(|r| r.line_number == " 5" && r.indicator == Indicator::Added));
        assert_aligned(&section.render(&mut legend));
    }

    #[test]
    fn long_titles_are_truncated_from_the_left() {
        let mut legend = Legend::new();
        let title = format!("{}/file.rs", "deeply/nested".repeat(10));
        let mut section = Section::new(title, Some("added".into()), 3, 40);
        section.push_line(1, Indicator::Added, spans(&["x"]), &mut legend);
        let rendered = section.render(&mut legend);

        assert_aligned(&rendered);
        assert!(rendered.contains("…"));
        assert!(rendered.contains("file.rs [added]"));
        assert!(rendered.lines().all(|l| visual_width(l) <= 40));
    }

    #[test]
    fn notice_only_section_is_boxed() {
        let mut legend = Legend::new();
        let mut section = Section::new("logo.png", Some("binary".into()), 0, 80);
        section.notice("Binary file changed; content not shown");
        let rendered = section.render(&mut legend);
        assert_aligned(&rendered);
        assert_eq!(rendered.lines().count(), 5);
        assert!(rendered.starts_with('┌'));
        assert!(rendered.trim_end().ends_with('┘'));
        assert!(!rendered.contains('┬'));
    }

    #[test]
    fn rows_fit_the_narrowest_accepted_width() {
        use crate::config::MIN_TERMINAL_WIDTH;

        let text = "let total = first_value + second_value * third_value;";
        for terminal_width in MIN_TERMINAL_WIDTH..MIN_TERMINAL_WIDTH + 8 {
            for max_line in [1, 999, 99_999, 99_999_999_999] {
                let mut legend = Legend::new();
                let mut section = Section::new(
                    "src/deeply/nested/module/file.rs",
                    Some("added".into()),
                    max_line,
                    terminal_width,
                );
                section.notice("1 malformed hunk skipped; remaining changes shown");
                section.push_line(max_line, Indicator::Added, spans(&[text]), &mut legend);
                let rendered = section.render(&mut legend);
                for line in rendered.lines() {
                    assert!(
                        visual_width(line) <= terminal_width,
                        "width {terminal_width}, line {max_line}: {line}"
                    );
                }
            }
        }
    }
}
