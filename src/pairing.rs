//! Positional pairing of deletion and addition runs.
//!
//! Within a hunk, a maximal run of deletions immediately followed by a
//! maximal run of additions is treated as a block of modified lines: the
//! i-th deletion is paired with the i-th addition. Surplus lines on either
//! side stay pure deletions or additions. Lines are never reordered or
//! matched by similarity.

use crate::diff::{DiffLine, Hunk, LineKind};

/// A deletion and an addition treated as the same line changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModificationPair<'a> {
    pub deletion: &'a DiffLine,
    pub addition: &'a DiffLine,
}

/// Role of a line after pairing. Paired variants carry the index of their
/// [`ModificationPair`] in [`ClassifiedHunk::pairs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Context,
    Addition,
    Deletion,
    PairedDeletion(usize),
    PairedAddition(usize),
}

/// A hunk's lines in original order, each tagged with its role.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHunk<'a> {
    pub lines: Vec<(&'a DiffLine, LineClass)>,
    pub pairs: Vec<ModificationPair<'a>>,
}

/// Classify every line of `hunk` in a single linear scan.
pub fn classify_hunk(hunk: &Hunk) -> ClassifiedHunk<'_> {
    let lines = &hunk.lines;
    let mut classified = Vec::with_capacity(lines.len());
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        match lines[i].kind {
            LineKind::Context => {
                classified.push((&lines[i], LineClass::Context));
                i += 1;
            }
            LineKind::Addition => {
                classified.push((&lines[i], LineClass::Addition));
                i += 1;
            }
            LineKind::Deletion => {
                let del_start = i;
                while i < lines.len() && lines[i].kind == LineKind::Deletion {
                    i += 1;
                }
                let add_start = i;
                while i < lines.len() && lines[i].kind == LineKind::Addition {
                    i += 1;
                }

                let dels = &lines[del_start..add_start];
                let adds = &lines[add_start..i];
                let first_pair = pairs.len();
                let paired = dels.len().min(adds.len());

                for (k, line) in dels.iter().enumerate() {
                    let class = if k < paired {
                        LineClass::PairedDeletion(first_pair + k)
                    } else {
                        LineClass::Deletion
                    };
                    classified.push((line, class));
                }
                for (k, line) in adds.iter().enumerate() {
                    let class = if k < paired {
                        LineClass::PairedAddition(first_pair + k)
                    } else {
                        LineClass::Addition
                    };
                    classified.push((line, class));
                }
                pairs.extend(
                    dels.iter()
                        .zip(adds)
                        .map(|(deletion, addition)| ModificationPair { deletion, addition }),
                );
            }
        }
    }

    ClassifiedHunk {
        lines: classified,
        pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(spec: &str) -> Hunk {
        let lines = spec
            .chars()
            .enumerate()
            .map(|(i, c)| DiffLine {
                kind: match c {
                    '-' => LineKind::Deletion,
                    '+' => LineKind::Addition,
                    _ => LineKind::Context,
                },
                old_lineno: Some(i + 1),
                new_lineno: Some(i + 1),
                text: format!("{c}{i}"),
            })
            .collect();
        Hunk {
            old_start: 1,
            old_count: 0,
            new_start: 1,
            new_count: 0,
            lines,
        }
    }

    fn classes(spec: &str) -> Vec<LineClass> {
        let h = hunk(spec);
        classify_hunk(&h).lines.into_iter().map(|(_, c)| c).collect()
    }

    #[test]
    fn equal_runs_pair_positionally() {
        let h = hunk("--++");
        let classified = classify_hunk(&h);
        assert_eq!(classified.pairs.len(), 2);
        assert_eq!(classified.pairs[0].deletion.text, "-0");
        assert_eq!(classified.pairs[0].addition.text, "+2");
        assert_eq!(classified.pairs[1].deletion.text, "-1");
        assert_eq!(classified.pairs[1].addition.text, "+3");
    }

    #[test]
    fn surplus_deletions_stay_pure() {
        use LineClass::*;
        assert_eq!(
            classes("---+"),
            vec![PairedDeletion(0), Deletion, Deletion, PairedAddition(0)]
        );
    }

    #[test]
    fn surplus_additions_stay_pure() {
        use LineClass::*;
        assert_eq!(
            classes("-+++"),
            vec![PairedDeletion(0), PairedAddition(0), Addition, Addition]
        );
    }

    #[test]
    fn context_breaks_pairing_window() {
        use LineClass::*;
        assert_eq!(classes("- +"), vec![Deletion, Context, Addition]);
    }

    #[test]
    fn additions_before_deletions_are_not_paired() {
        use LineClass::*;
        assert_eq!(classes("+-"), vec![Addition, Deletion]);
    }

    #[test]
    fn pair_indices_continue_across_runs() {
        use LineClass::*;
        assert_eq!(
            classes("-+ -+"),
            vec![
                PairedDeletion(0),
                PairedAddition(0),
                Context,
                PairedDeletion(1),
                PairedAddition(1)
            ]
        );
    }

    #[test]
    fn order_is_preserved() {
        let h = hunk(" --+++ ");
        let classified = classify_hunk(&h);
        let texts: Vec<&str> = classified.lines.iter().map(|(l, _)| l.text.as_str()).collect();
        let original: Vec<&str> = h.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, original);
    }
}
