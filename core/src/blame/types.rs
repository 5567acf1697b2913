use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Sha git uses for lines that are not committed yet.
pub const UNCOMMITTED_SHA: &str = "0000000000000000000000000000000000000000";

/// Attribution of a single line (0-based) to the commit that last touched it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlameLine {
    pub line: u32,
    pub sha: String,
}

/// Commit metadata shared by every line it is blamed for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlameCommit {
    pub sha: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: u64,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_date: u64,
    pub summary: String,
    pub filename: String,
}

impl BlameCommit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn is_uncommitted(&self) -> bool {
        self.sha == UNCOMMITTED_SHA
    }
}

/// Blame for a whole file: lines in file order plus the commits they refer to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blame {
    pub lines: Vec<BlameLine>,
    pub commits: HashMap<String, BlameCommit>,
}
