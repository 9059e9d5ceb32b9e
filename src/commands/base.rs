use std::path::PathBuf;

use crate::error::Result;
use crate::git::GitCli;
use crate::report;

/// Options for the `base` command.
pub struct BaseOptions {
    pub root: PathBuf,
}

/// Resolve the base branch for the checked-out branch in `root`.
pub fn run(options: BaseOptions) -> Result<String> {
    let git = GitCli::open(&options.root)?;
    report::resolve_base(&git, None)
}
