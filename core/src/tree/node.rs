use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::{CommitSummary, Repository, RepositoryProvider};

/// Lists every known repository; only used when there is more than one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryListNode {
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub repository: Repository,
    /// The only repository in the workspace; rendered expanded.
    pub sole: bool,
}

/// History of a single file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    pub repository: Repository,
    /// Path relative to the repository root.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub repository_path: String,
    pub file: Option<String>,
    pub commit: CommitSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageNode {
    pub message: String,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeNode {
    RepositoryList(RepositoryListNode),
    Repository(RepositoryNode),
    History(HistoryNode),
    Commit(CommitNode),
    Message(MessageNode),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Collapsible {
    None,
    Collapsed,
    Expanded,
}

/// What the host renders for a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    pub label: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub collapsible: Collapsible,
    pub context_value: String,
}

impl TreeItem {
    fn new(label: impl Into<String>, collapsible: Collapsible, context_value: &str) -> Self {
        Self {
            label: label.into(),
            description: None,
            tooltip: None,
            collapsible,
            context_value: context_value.to_string(),
        }
    }

    fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

impl TreeNode {
    pub fn message(message: impl Into<String>) -> Self {
        TreeNode::Message(MessageNode {
            message: message.into(),
            tooltip: None,
        })
    }

    pub fn children(&self, repositories: &dyn RepositoryProvider) -> Result<Vec<TreeNode>> {
        match self {
            TreeNode::RepositoryList(node) => Ok(node
                .repositories
                .iter()
                .map(|repository| {
                    TreeNode::Repository(RepositoryNode {
                        repository: repository.clone(),
                        sole: false,
                    })
                })
                .collect()),
            TreeNode::Repository(node) => {
                let commits = repositories.history(&node.repository, None)?;
                Ok(commit_children(&node.repository, None, commits, "No commits yet"))
            }
            TreeNode::History(node) => {
                let commits = repositories.history(&node.repository, Some(&node.path))?;
                Ok(commit_children(
                    &node.repository,
                    Some(&node.path),
                    commits,
                    "No commits found for this file",
                ))
            }
            TreeNode::Commit(_) | TreeNode::Message(_) => Ok(Vec::new()),
        }
    }

    pub fn tree_item(&self) -> TreeItem {
        match self {
            TreeNode::RepositoryList(node) => {
                TreeItem::new("Repositories", Collapsible::Expanded, "gitglance:repositories")
                    .description(format!("{}", node.repositories.len()))
            }
            TreeNode::Repository(node) => TreeItem::new(
                node.repository.name.clone(),
                if node.sole {
                    Collapsible::Expanded
                } else {
                    Collapsible::Collapsed
                },
                "gitglance:repository",
            )
            .tooltip(node.repository.path.clone()),
            TreeNode::History(node) => {
                let name = node.path.rsplit('/').next().unwrap_or(&node.path);
                TreeItem::new(name, Collapsible::Expanded, "gitglance:history:file")
                    .description(node.repository.name.clone())
                    .tooltip(format!("{}/{}", node.repository.path, node.path))
            }
            TreeNode::Commit(node) => {
                let commit = &node.commit;
                TreeItem::new(commit.subject.clone(), Collapsible::None, "gitglance:commit")
                    .description(format!("{}, {}", commit.author_name, commit.short_sha()))
                    .tooltip(format!("{}\n{}\n\n{}", commit.sha, commit.author_name, commit.subject))
            }
            TreeNode::Message(node) => {
                let item = TreeItem::new(node.message.clone(), Collapsible::None, "gitglance:message");
                match &node.tooltip {
                    Some(tooltip) => item.tooltip(tooltip.clone()),
                    None => item,
                }
            }
        }
    }

    /// Identity used to decide whether a rebuilt root is the same as the
    /// current one. Only the source location is compared, not content.
    pub fn location_key(&self) -> Option<String> {
        match self {
            TreeNode::RepositoryList(node) => Some(
                node.repositories
                    .iter()
                    .map(|r| r.path.as_str())
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
            TreeNode::Repository(node) => Some(node.repository.path.clone()),
            TreeNode::History(node) => Some(format!("{}/{}", node.repository.path, node.path)),
            TreeNode::Commit(_) | TreeNode::Message(_) => None,
        }
    }

    /// Repositories whose changes affect what this node shows.
    pub fn repository_paths(&self) -> Vec<&str> {
        match self {
            TreeNode::RepositoryList(node) => node.repositories.iter().map(|r| r.path.as_str()).collect(),
            TreeNode::Repository(node) => vec![node.repository.path.as_str()],
            TreeNode::History(node) => vec![node.repository.path.as_str()],
            TreeNode::Commit(node) => vec![node.repository_path.as_str()],
            TreeNode::Message(_) => Vec::new(),
        }
    }
}

fn commit_children(
    repository: &Repository,
    file: Option<&str>,
    commits: Vec<CommitSummary>,
    empty_message: &str,
) -> Vec<TreeNode> {
    if commits.is_empty() {
        return vec![TreeNode::message(empty_message)];
    }
    commits
        .into_iter()
        .map(|commit| {
            TreeNode::Commit(CommitNode {
                repository_path: repository.path.clone(),
                file: file.map(str::to_string),
                commit,
            })
        })
        .collect()
}
