#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

use gitglance_core::{compute_blame_annotations, free_blame, load_blame, parse_blame};

const RAW: &[u8] = b"abcdef0123456789abcdef0123456789abcdef01 1 1 2\nauthor Alice\nauthor-time 1700000000\nsummary Initial commit\nfilename src/main.rs\n";

#[wasm_bindgen_test]
fn load_and_annotate() {
    let loaded: serde_json::Value = serde_json::from_str(&load_blame(RAW)).unwrap();
    assert_eq!(loaded["lineCount"], 2);
    let handle = loaded["handle"].as_u64().unwrap() as u32;

    let decorations: serde_json::Value =
        serde_json::from_str(&compute_blame_annotations(handle, 1_700_000_000, "")).unwrap();
    assert_eq!(decorations.as_array().unwrap().len(), 2);

    assert!(free_blame(handle));
}

#[wasm_bindgen_test]
fn parse_empty_input() {
    let parsed: serde_json::Value = serde_json::from_str(&parse_blame(b"")).unwrap();
    assert!(parsed["lines"].as_array().unwrap().is_empty());
}
