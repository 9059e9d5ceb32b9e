//! Legend of the glyphs that actually appear in a report.

use std::collections::BTreeSet;

use crate::escape::{CR_GLYPH, SPACE_GLYPH, TAB_GLYPH};
use crate::layout::{GAP_GLYPH, WRAP_GLYPH};

/// Something in the report a reader may need explained. Variant order is
/// the order entries are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LegendEntry {
    Added,
    Removed,
    ChangedWord,
    Space,
    Tab,
    CarriageReturn,
    Wrap,
    Gap,
    Escaped,
}

impl LegendEntry {
    fn describe(self) -> String {
        match self {
            Self::Added => "`+` added line".to_string(),
            Self::Removed => "`-` removed line".to_string(),
            Self::ChangedWord => "`**text**` changed words within a modified line".to_string(),
            Self::Space => format!("`{SPACE_GLYPH}` space (whitespace-only change)"),
            Self::Tab => format!("`{TAB_GLYPH}` tab (whitespace-only change)"),
            Self::CarriageReturn => format!("`{CR_GLYPH}` carriage return (CRLF line ending)"),
            Self::Wrap => format!("`{WRAP_GLYPH}` wrap: line continues on the next row"),
            Self::Gap => format!("`{GAP_GLYPH}` unchanged lines omitted between hunks"),
            Self::Escaped => "`\\*` `\\_` `\\\\` escaped literal characters".to_string(),
        }
    }
}

/// Entries collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Legend {
    used: BTreeSet<LegendEntry>,
}

impl Legend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, entry: LegendEntry) {
        self.used.insert(entry);
    }

    pub fn contains(&self, entry: LegendEntry) -> bool {
        self.used.contains(&entry)
    }

    /// Markdown block listing every used entry, or an empty string.
    pub fn render(&self) -> String {
        if self.used.is_empty() {
            return String::new();
        }
        let mut out = String::from("## Legend\n\n");
        for entry in &self.used {
            out.push_str("- ");
            out.push_str(&entry.describe());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_legend_renders_nothing() {
        assert_eq!(Legend::new().render(), "");
    }

    #[test]
    fn only_marked_entries_are_listed_in_order() {
        let mut legend = Legend::new();
        legend.mark(LegendEntry::Wrap);
        legend.mark(LegendEntry::Added);
        legend.mark(LegendEntry::Wrap);

        let out = legend.render();
        assert!(out.starts_with("## Legend"));
        let added = out.find("added line").unwrap();
        let wrap = out.find("wrap").unwrap();
        assert!(added < wrap);
        assert!(!out.contains("tab"));
        assert_eq!(out.lines().filter(|l| l.starts_with("- ")).count(), 2);
    }
}
