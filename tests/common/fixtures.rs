//! Static event corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of JSON lines in the shapes a
//! node delivers: bare record arrays and block-tagged objects.

/// Three blocks of typical chain activity, one JSON batch per line.
pub const CORPUS_BLOCKS: &[&str] = &[
    r#"{"block": 100, "events": [{"section": "system", "method": "ExtrinsicSuccess", "data": [{"weight": 1}]}, {"section": "balances", "method": "Transfer", "data": ["alice", "bob", 100]}]}"#,
    r#"{"block": 101, "events": [{"section": "system", "method": "NewAccount", "data": ["carol"]}, {"section": "balances", "method": "Endowed", "data": ["carol", 500]}]}"#,
    r#"{"block": 102, "events": [{"section": "system", "method": "ExtrinsicSuccess", "data": [{"weight": 2}]}]}"#,
];

/// Bare arrays without an origin, plus noise the reader must skip.
pub const CORPUS_MIXED: &[&str] = &[
    r#"[{"section": "staking", "method": "Rewarded", "data": ["dave", 12]}]"#,
    "",
    "not json at all",
    r#"{"origin": "0xabc", "events": [{"section": "sudo", "method": "Sudid", "data": [{"ok": null}]}]}"#,
    r#"{"unexpected": true}"#,
    r#"[]"#,
];

/// Join a corpus into file contents, one batch per line.
pub fn corpus_text(corpus: &[&str]) -> String {
    let mut text = corpus.join("\n");
    text.push('\n');
    text
}
