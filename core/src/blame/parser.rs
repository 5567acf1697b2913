use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::types::{Blame, BlameCommit, BlameLine};

/// Upper bound on lines a single chunk may claim; larger counts are malformed.
const MAX_CHUNK_LINES: u32 = 1 << 20;

/// `<40-hex sha> <orig_line> <final_line> [<num_lines>]`
fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^([0-9a-f]{40}) (\d+) (\d+)(?: (\d+))?$").expect("static regex")
    })
}

/// A chunk of consecutive lines attributed to one commit.
struct Chunk {
    sha: String,
    final_line: u32,
    num_lines: u32,
    commit: Option<BlameCommit>,
    filename: String,
}

impl Chunk {
    fn commit_mut(&mut self) -> &mut BlameCommit {
        let sha = &self.sha;
        self.commit.get_or_insert_with(|| BlameCommit {
            sha: sha.clone(),
            ..BlameCommit::default()
        })
    }
}

/// Parse `git blame --incremental` (or `--porcelain`) output into a [`Blame`].
///
/// ```text
/// <40-char sha> <orig_line> <final_line> <num_lines>
/// author <name>
/// author-mail <<email>>
/// author-time <epoch>
/// ...
/// summary <text>
/// filename <path>
/// ```
///
/// Commit metadata is only printed the first time git reports a sha; later
/// chunks for the same commit carry just the header and filename. Git emits
/// chunks in the order it resolves them, so lines are sorted afterwards.
/// Final line numbers are 1-based in the output and 0-based in the result.
pub fn parse_blame_output(raw: &[u8]) -> Blame {
    let input = match std::str::from_utf8(raw) {
        Ok(s) => s,
        Err(_) => return Blame::default(),
    };

    let mut lines: Vec<BlameLine> = Vec::new();
    let mut commits: HashMap<String, BlameCommit> = HashMap::new();
    let mut current: Option<Chunk> = None;

    for line in input.lines() {
        let line = line.trim_end();

        // Content lines only appear in porcelain mode
        if line.is_empty() || line.starts_with('\t') {
            continue;
        }

        if let Some(caps) = header_regex().captures(line) {
            if let Some(chunk) = current.take() {
                finish_chunk(chunk, &mut lines, &mut commits);
            }
            let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            current = Some(Chunk {
                sha: caps[1].to_string(),
                final_line: number(3).unwrap_or(1),
                num_lines: number(4).unwrap_or(1),
                commit: None,
                filename: String::new(),
            });
            continue;
        }

        let Some(chunk) = current.as_mut() else {
            continue;
        };

        if let Some(val) = line.strip_prefix("author-mail ") {
            chunk.commit_mut().author_email =
                val.trim_start_matches('<').trim_end_matches('>').to_string();
        } else if let Some(val) = line.strip_prefix("author-time ") {
            chunk.commit_mut().author_date = val.trim().parse().unwrap_or(0);
        } else if line.starts_with("author-tz ") || line.starts_with("committer-tz ") {
            // epoch is enough
        } else if let Some(val) = line.strip_prefix("author ") {
            chunk.commit_mut().author_name = val.to_string();
        } else if let Some(val) = line.strip_prefix("committer-mail ") {
            chunk.commit_mut().committer_email =
                val.trim_start_matches('<').trim_end_matches('>').to_string();
        } else if let Some(val) = line.strip_prefix("committer-time ") {
            chunk.commit_mut().committer_date = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("committer ") {
            chunk.commit_mut().committer_name = val.to_string();
        } else if let Some(val) = line.strip_prefix("summary ") {
            chunk.commit_mut().summary = val.to_string();
        } else if let Some(val) = line.strip_prefix("filename ") {
            chunk.filename = val.to_string();
        }
        // `previous` and `boundary` are not needed
    }

    if let Some(chunk) = current.take() {
        finish_chunk(chunk, &mut lines, &mut commits);
    }

    lines.sort_by_key(|l| l.line);
    lines.dedup_by_key(|l| l.line);

    Blame { lines, commits }
}

fn finish_chunk(chunk: Chunk, lines: &mut Vec<BlameLine>, commits: &mut HashMap<String, BlameCommit>) {
    let first = chunk.final_line.saturating_sub(1);
    let in_range = chunk.num_lines <= MAX_CHUNK_LINES
        && first.checked_add(chunk.num_lines.saturating_sub(1)).is_some();
    if !in_range {
        tracing::warn!(
            sha = %chunk.sha,
            final_line = chunk.final_line,
            num_lines = chunk.num_lines,
            "skipping blame chunk with out-of-range lines"
        );
        return;
    }
    lines.extend((0..chunk.num_lines).map(|offset| BlameLine {
        line: first + offset,
        sha: chunk.sha.clone(),
    }));

    match chunk.commit {
        Some(mut commit) => {
            if commit.filename.is_empty() {
                commit.filename = chunk.filename;
            }
            commits.insert(chunk.sha, commit);
        }
        None => {
            commits.entry(chunk.sha.clone()).or_insert_with(|| BlameCommit {
                sha: chunk.sha,
                filename: chunk.filename,
                ..BlameCommit::default()
            });
        }
    }
}
