//! Output sink for rendered reports.
//!
//! Writes the report to stdout, or to a file when `--out` is given,
//! creating parent directories as needed.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{BranchDiffError, Result};

/// Controls where output is written.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// File path to write to; stdout when `None`.
    pub out: Option<PathBuf>,
}

/// Write a rendered report to the appropriate destination.
pub fn write_output(content: &str, options: &OutputOptions) -> Result<()> {
    match options.out {
        Some(ref path) => write_to_file(content, path),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| BranchDiffError::io("writing to stdout", e))
        }
    }
}

/// Write content to a file, creating parent directories if needed.
fn write_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            BranchDiffError::io(format!("creating directory '{}'", parent.display()), e)
        })?;
    }
    std::fs::write(path, content)
        .map_err(|e| BranchDiffError::io(format!("writing output to '{}'", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_to_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("dir").join("report.md");
        write_output(
            "No changes\n",
            &OutputOptions {
                out: Some(path.clone()),
            },
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "No changes\n");
    }

    #[test]
    fn write_to_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_to_file("first", &path).unwrap();
        write_to_file("second", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
