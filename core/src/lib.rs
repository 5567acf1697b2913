pub mod error;
pub mod event;
pub mod debounce;
pub mod config;
pub mod provider;
pub mod blame;
pub mod annotate;
pub mod tree;
pub mod commands;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use blame::Blame;
use config::AnnotationOptions;

pub use error::{Error, Result};

// ---------------------------------------------------------------------------
// Handle storage for parsed blame kept across WASM calls, so a heatmap can be
// recomputed (new `now`, new options) without re-parsing git output.
// ---------------------------------------------------------------------------

fn blame_store() -> &'static Mutex<BlameStore> {
    static STORE: OnceLock<Mutex<BlameStore>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(BlameStore::new()))
}

struct BlameStore {
    entries: HashMap<u32, Blame>,
    next_handle: u32,
}

impl BlameStore {
    fn new() -> Self {
        BlameStore {
            entries: HashMap::new(),
            next_handle: 1,
        }
    }

    fn insert(&mut self, blame: Blame) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        if self.next_handle == 0 {
            self.next_handle = 1; // 0 is never a valid handle
        }
        self.entries.insert(handle, blame);
        handle
    }

    fn get(&self, handle: u32) -> Option<&Blame> {
        self.entries.get(&handle)
    }

    fn remove(&mut self, handle: u32) -> bool {
        self.entries.remove(&handle).is_some()
    }
}

// ---------------------------------------------------------------------------
// JSON wrappers
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadResult {
    handle: u32,
    line_count: usize,
    commit_count: usize,
}

#[derive(serde::Serialize)]
struct ErrorResult {
    error: String,
}

fn json_error(msg: &str) -> String {
    serde_json::to_string(&ErrorResult {
        error: msg.to_string(),
    })
    .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", msg))
}

fn parse_options(options_json: &str) -> Result<AnnotationOptions> {
    if options_json.trim().is_empty() {
        return Ok(AnnotationOptions::default());
    }
    Ok(serde_json::from_str(options_json)?)
}

// ---------------------------------------------------------------------------
// WASM-exported functions
// ---------------------------------------------------------------------------

/// Parse raw `git blame --incremental` output and keep it for later passes.
///
/// Returns: JSON `{ handle, lineCount, commitCount }`. The handle must be
/// freed with `free_blame`.
#[wasm_bindgen]
pub fn load_blame(raw_blame: &[u8]) -> String {
    let blame = blame::parse_blame_output(raw_blame);
    let line_count = blame.lines.len();
    let commit_count = blame.commits.len();

    let mut store = match blame_store().lock() {
        Ok(s) => s,
        Err(_) => return json_error("Failed to acquire blame store lock"),
    };
    let handle = store.insert(blame);

    serde_json::to_string(&LoadResult {
        handle,
        line_count,
        commit_count,
    })
    .unwrap_or_else(|e| json_error(&format!("Serialization error: {}", e)))
}

/// Compute decorations for a stored blame.
///
/// `now` is the unix epoch in seconds; `options_json` is an
/// `AnnotationOptions` object (empty string for defaults).
/// Returns: JSON array of `{ range, style }`.
#[wasm_bindgen]
pub fn compute_blame_annotations(handle: u32, now: u64, options_json: &str) -> String {
    let options = match parse_options(options_json) {
        Ok(o) => o,
        Err(e) => return json_error(&format!("Invalid options: {}", e)),
    };

    let store = match blame_store().lock() {
        Ok(s) => s,
        Err(_) => return json_error("Failed to acquire blame store lock"),
    };
    let blame = match store.get(handle) {
        Some(b) => b,
        None => return json_error(&format!("Invalid handle: {}", handle)),
    };

    match annotate::compute_annotations(&blame.lines, &blame.commits, now, &options) {
        Ok(decorations) => serde_json::to_string(&decorations)
            .unwrap_or_else(|e| json_error(&format!("Serialization error: {}", e))),
        Err(e) => json_error(&e.to_string()),
    }
}

/// Free a previously loaded blame handle.
#[wasm_bindgen]
pub fn free_blame(handle: u32) -> bool {
    match blame_store().lock() {
        Ok(mut store) => store.remove(handle),
        Err(_) => false,
    }
}

/// Parse raw `git blame --incremental` output into JSON `{ lines, commits }`.
#[wasm_bindgen]
pub fn parse_blame(raw_blame: &[u8]) -> String {
    let blame = blame::parse_blame_output(raw_blame);
    serde_json::to_string(&blame)
        .unwrap_or_else(|e| json_error(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &[u8] = b"abcdef0123456789abcdef0123456789abcdef01 1 1 2\nauthor Alice\nauthor-mail <alice@example.com>\nauthor-time 1700000000\nauthor-tz +0000\nsummary Initial commit\nfilename src/main.rs\n1111111111111111111111111111111111111111 3 3 1\nauthor Bob\nauthor-time 1600000000\nsummary Older\nfilename src/main.rs\n";

    #[test]
    fn test_load_annotate_and_free() {
        let loaded: serde_json::Value = serde_json::from_str(&load_blame(RAW)).unwrap();
        assert_eq!(loaded["lineCount"], 3);
        assert_eq!(loaded["commitCount"], 2);
        let handle = loaded["handle"].as_u64().unwrap() as u32;

        let json = compute_blame_annotations(handle, 1_700_000_000, "");
        let decorations: serde_json::Value = serde_json::from_str(&json).unwrap();
        let decorations = decorations.as_array().unwrap();
        assert_eq!(decorations.len(), 3);
        assert_eq!(decorations[0]["range"]["start"], 0);
        assert_eq!(decorations[2]["range"]["end"], 2);
        assert_eq!(decorations[0]["style"], decorations[1]["style"]);
        assert_ne!(decorations[0]["style"], decorations[2]["style"]);

        assert!(free_blame(handle));
        assert!(!free_blame(handle));

        let err: serde_json::Value =
            serde_json::from_str(&compute_blame_annotations(handle, 0, "")).unwrap();
        assert!(err.get("error").is_some());
    }

    #[test]
    fn test_gutter_options_over_wasm() {
        let loaded: serde_json::Value = serde_json::from_str(&load_blame(RAW)).unwrap();
        let handle = loaded["handle"].as_u64().unwrap() as u32;

        let json = compute_blame_annotations(handle, 1_700_000_000, r#"{"kind":"gutter"}"#);
        let decorations: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(decorations[0]["style"]["text"], "abcdef0  Alice  2023-11-14");

        free_blame(handle);
    }

    #[test]
    fn test_invalid_options_json() {
        let loaded: serde_json::Value = serde_json::from_str(&load_blame(RAW)).unwrap();
        let handle = loaded["handle"].as_u64().unwrap() as u32;

        let err: serde_json::Value =
            serde_json::from_str(&compute_blame_annotations(handle, 0, "{not json")).unwrap();
        assert!(err["error"].as_str().unwrap().starts_with("Invalid options"));

        free_blame(handle);
    }

    #[test]
    fn test_parse_blame_wasm() {
        let parsed: serde_json::Value = serde_json::from_str(&parse_blame(RAW)).unwrap();
        assert_eq!(parsed["lines"].as_array().unwrap().len(), 3);
        assert_eq!(
            parsed["commits"]["abcdef0123456789abcdef0123456789abcdef01"]["author_name"],
            "Alice"
        );
    }
}
