//! Token-level diffing of modified lines.
//!
//! Lines are split into word runs, whitespace runs and single punctuation
//! characters, then compared with an LCS edit script from `similar`. Tokens
//! outside the common subsequence are marked as changed on their side.

use similar::{capture_diff_slices, Algorithm, DiffTag};
use tracing::warn;

/// Above this many tokens on either side, a pair is rendered without
/// highlighting to keep the edit computation bounded.
pub const MAX_WORD_DIFF_TOKENS: usize = 500;

/// A token and whether it differs from the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedToken<'a> {
    pub text: &'a str,
    pub changed: bool,
}

/// Outcome of diffing one modification pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordDiff<'a> {
    Highlighted {
        old: Vec<MarkedToken<'a>>,
        new: Vec<MarkedToken<'a>>,
    },
    /// Either side exceeded [`MAX_WORD_DIFF_TOKENS`].
    TooLarge,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Word,
    Space,
    Other,
}

fn class_of(c: char) -> TokenClass {
    if c.is_alphanumeric() || c == '_' {
        TokenClass::Word
    } else if c.is_whitespace() {
        TokenClass::Space
    } else {
        TokenClass::Other
    }
}

/// Split `line` into tokens. Concatenating the result yields `line`.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev: Option<TokenClass> = None;

    for (idx, c) in line.char_indices() {
        let class = class_of(c);
        let continues = match prev {
            Some(p) => p == class && class != TokenClass::Other,
            None => true,
        };
        if !continues {
            tokens.push(&line[start..idx]);
            start = idx;
        }
        prev = Some(class);
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }

    tokens
}

/// Compute the token-level difference between the two sides of a pair.
pub fn word_diff<'a>(old: &'a str, new: &'a str) -> WordDiff<'a> {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);

    if old_tokens.len() > MAX_WORD_DIFF_TOKENS || new_tokens.len() > MAX_WORD_DIFF_TOKENS {
        warn!(
            old_tokens = old_tokens.len(),
            new_tokens = new_tokens.len(),
            "token ceiling exceeded; skipping word highlighting"
        );
        return WordDiff::TooLarge;
    }

    let mut old_marked: Vec<MarkedToken<'a>> = old_tokens
        .iter()
        .map(|&text| MarkedToken { text, changed: false })
        .collect();
    let mut new_marked: Vec<MarkedToken<'a>> = new_tokens
        .iter()
        .map(|&text| MarkedToken { text, changed: false })
        .collect();

    for op in capture_diff_slices(Algorithm::Lcs, &old_tokens, &new_tokens) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {}
            DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                for token in &mut old_marked[old_range] {
                    token.changed = true;
                }
                for token in &mut new_marked[new_range] {
                    token.changed = true;
                }
            }
        }
    }

    WordDiff::Highlighted {
        old: old_marked,
        new: new_marked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed<'a>(tokens: &[MarkedToken<'a>]) -> Vec<&'a str> {
        tokens.iter().filter(|t| t.changed).map(|t| t.text).collect()
    }

    #[test]
    fn tokenize_splits_words_spaces_and_punctuation() {
        assert_eq!(
            tokenize("let x_1 = foo(a, b);"),
            vec!["let", " ", "x_1", " ", "=", " ", "foo", "(", "a", ",", " ", "b", ")", ";"]
        );
    }

    #[test]
    fn tokenize_keeps_whitespace_runs_together() {
        assert_eq!(tokenize("a \t b"), vec!["a", " \t ", "b"]);
    }

    #[test]
    fn tokenize_punctuation_is_one_char_per_token() {
        assert_eq!(tokenize("**"), vec!["*", "*"]);
        assert_eq!(tokenize("->"), vec!["-", ">"]);
    }

    #[test]
    fn tokenize_is_lossless() {
        let samples = [
            "",
            "   ",
            "\t\t",
            "fn main() { println!(\"héllo, 世界\"); }",
            "  trailing spaces   ",
            "__init__ ** ~~ 🎉 emoji",
        ];
        for sample in samples {
            assert_eq!(tokenize(sample).concat(), sample);
        }
    }

    #[test]
    fn tokenize_empty_line_has_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn single_word_change_is_marked_on_both_sides() {
        let WordDiff::Highlighted { old, new } = word_diff("hello world foo", "hello earth foo")
        else {
            panic!("expected highlighting");
        };
        assert_eq!(changed(&old), vec!["world"]);
        assert_eq!(changed(&new), vec!["earth"]);
        assert!(old.iter().any(|t| t.text == "hello" && !t.changed));
        assert!(new.iter().any(|t| t.text == "foo" && !t.changed));
    }

    #[test]
    fn pure_insertion_marks_only_new_side() {
        let WordDiff::Highlighted { old, new } = word_diff("a b", "a new b") else {
            panic!("expected highlighting");
        };
        assert!(changed(&old).is_empty());
        assert_eq!(changed(&new).concat().trim(), "new");
    }

    #[test]
    fn identical_lines_have_no_changes() {
        let WordDiff::Highlighted { old, new } = word_diff("same line", "same line") else {
            panic!("expected highlighting");
        };
        assert!(changed(&old).is_empty());
        assert!(changed(&new).is_empty());
    }

    #[test]
    fn token_ceiling_disables_highlighting() {
        let long_old = "a ".repeat(300);
        let long_new = "b ".repeat(300);
        assert_eq!(word_diff(&long_old, &long_new), WordDiff::TooLarge);
    }

    #[test]
    fn token_ceiling_is_inclusive() {
        // 500 single-char punctuation tokens on each side.
        let old = ".".repeat(MAX_WORD_DIFF_TOKENS);
        let new = ",".repeat(MAX_WORD_DIFF_TOKENS);
        assert!(matches!(word_diff(&old, &new), WordDiff::Highlighted { .. }));
    }
}
