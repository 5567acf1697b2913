//! Contracts for the host-side collaborators the core consumes.
//!
//! The extension host implements these over the editor API and the `git`
//! subprocess; the core never reimplements them.

use serde::{Deserialize, Serialize};

use crate::annotate::Decoration;
use crate::blame::Blame;
use crate::config::AnnotationKind;
use crate::error::Result;
use crate::event::Channel;

/// A repository known to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Absolute path of the working tree root.
    pub path: String,
    pub name: String,
}

impl Repository {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self { path, name }
    }

    /// `uri` relative to the working tree, when it lives inside it.
    pub fn relative_path<'a>(&self, uri: &'a str) -> Option<&'a str> {
        let root = self.path.trim_end_matches('/');
        uri.strip_prefix(root)?.strip_prefix('/')
    }
}

/// An open editor pane, identified by its document uri.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Editor {
    pub uri: String,
}

impl Editor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// One entry of a repository or file history listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub sha: String,
    pub author_name: String,
    pub author_date: u64,
    pub subject: String,
}

impl CommitSummary {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// Payload of the "repositories changed" event: the set of known
/// repositories was altered (opened, closed, discovered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoriesChanged;

/// Payload of the per-repository change event (new commits, checkout, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryChanged {
    pub path: String,
}

pub trait BlameProvider {
    /// Blame for `target`, or `None` when it cannot be computed (untracked
    /// file, binary content, ...).
    fn blame(&self, target: &str) -> Result<Option<Blame>>;
}

pub trait RepositoryProvider {
    fn repositories(&self) -> Result<Vec<Repository>>;
    fn repository(&self, uri: &str) -> Result<Option<Repository>>;
    fn is_trackable(&self, uri: &str) -> bool;
    /// Newest-first history of the repository, or of a single file in it.
    fn history(&self, repo: &Repository, path: Option<&str>) -> Result<Vec<CommitSummary>>;
    fn on_did_change_repositories(&self) -> &Channel<RepositoriesChanged>;
    fn on_did_change_repository(&self) -> &Channel<RepositoryChanged>;
}

/// Where decorations end up. One batched call per pass.
pub trait DecorationSurface {
    fn set_decorations(&self, kind: AnnotationKind, decorations: &[Decoration]);
}

/// Host command-context flags, read by menus to enable/disable entries.
pub trait CommandContext {
    fn set_context(&self, key: &str, value: serde_json::Value);
}

pub trait Notifier {
    fn show_error_message(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_name_from_path() {
        assert_eq!(Repository::new("/home/me/src/gitglance").name, "gitglance");
        assert_eq!(Repository::new("/home/me/src/gitglance/").name, "gitglance");
    }

    #[test]
    fn test_relative_path() {
        let repo = Repository::new("/work/app");
        assert_eq!(repo.relative_path("/work/app/src/main.rs"), Some("src/main.rs"));
        assert_eq!(repo.relative_path("/work/application/x.rs"), None);
        assert_eq!(repo.relative_path("/elsewhere/x.rs"), None);
    }

    #[test]
    fn test_short_sha() {
        let commit = CommitSummary {
            sha: "abcdef0123456789".to_string(),
            author_name: "Alice".to_string(),
            author_date: 0,
            subject: String::new(),
        };
        assert_eq!(commit.short_sha(), "abcdef0");
    }
}
