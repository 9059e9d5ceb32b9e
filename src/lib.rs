//! Two-column branch diff summaries.
//!
//! Resolves the base of the checked-out branch, parses the unified diff
//! against it and renders a boxed, word-highlighted report suited to
//! readers that cannot run a pager.

pub mod branch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod escape;
pub mod git;
pub mod layout;
pub mod legend;
pub mod output;
pub mod pairing;
pub mod report;
pub mod word_diff;
