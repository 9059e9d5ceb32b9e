//! Base branch resolution by naming convention.
//!
//! A feature branch `X.Y-slug` is based on the version branch `vX.Y`, and a
//! version branch `vX.Y` is based on `main`. Resolution is a pure lookup
//! over the branch names supplied by the caller.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

static FEATURE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)-.+$").expect("valid regex"));

static VERSION_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)\.(\d+)$").expect("valid regex"));

/// Branch that version branches are based on.
pub const MAINLINE_BRANCH: &str = "main";

/// Outcome of base branch resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseBranch {
    Found(String),
    NotFound,
}

/// Determine the base branch for `current` given the local branch names.
pub fn resolve_base_branch<S: AsRef<str>>(current: &str, branches: &[S]) -> BaseBranch {
    let exists = |name: &str| branches.iter().any(|b| b.as_ref() == name);

    if let Some(caps) = FEATURE_BRANCH.captures(current) {
        let candidate = format!("v{}.{}", &caps[1], &caps[2]);
        if exists(&candidate) {
            info!(current, base = %candidate, "resolved version base branch");
            return BaseBranch::Found(candidate);
        }
        info!(current, candidate = %candidate, "version branch does not exist");
    } else if VERSION_BRANCH.is_match(current) && exists(MAINLINE_BRANCH) {
        info!(current, base = MAINLINE_BRANCH, "resolved mainline base branch");
        return BaseBranch::Found(MAINLINE_BRANCH.to_string());
    }

    BaseBranch::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branches() -> Vec<&'static str> {
        vec!["main", "v1.2", "v2.0", "1.2-login-form"]
    }

    #[test]
    fn feature_branch_resolves_to_version_branch() {
        assert_eq!(
            resolve_base_branch("1.2-login-form", &branches()),
            BaseBranch::Found("v1.2".into())
        );
    }

    #[test]
    fn version_branch_resolves_to_main() {
        assert_eq!(
            resolve_base_branch("v2.0", &branches()),
            BaseBranch::Found("main".into())
        );
    }

    #[test]
    fn feature_branch_without_version_branch_is_not_found() {
        assert_eq!(
            resolve_base_branch("3.1-new-thing", &branches()),
            BaseBranch::NotFound
        );
    }

    #[test]
    fn version_branch_without_main_is_not_found() {
        assert_eq!(
            resolve_base_branch("v1.2", &["v1.2", "master"]),
            BaseBranch::NotFound
        );
    }

    #[test]
    fn unconventional_names_are_not_found() {
        for name in ["main", "feature/login", "1.2", "v1.2-hotfix", "1.x-slug", ""] {
            assert_eq!(
                resolve_base_branch(name, &branches()),
                BaseBranch::NotFound,
                "{name}"
            );
        }
    }

    #[test]
    fn multi_digit_versions() {
        let names = ["v10.24"];
        assert_eq!(
            resolve_base_branch("10.24-big-release", &names),
            BaseBranch::Found("v10.24".into())
        );
    }
}
