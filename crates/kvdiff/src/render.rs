//! Plain text rendering of diff results

use kvdiff_core::{ActionEntries, ActionView, Change, ChangeKind, DiffResult, ValuePair};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;

fn marker(kind: ChangeKind) -> char {
    match kind {
        ChangeKind::Added => '+',
        ChangeKind::Removed => '-',
        ChangeKind::Altered => '~',
    }
}

fn show(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "<absent>".to_string(),
    }
}

/// Tokenize text for word-level diffing.
/// Words stay whole so that JSON punctuation (`{`, `"`, `,`) never glues onto a key or value.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut in_word = false;

    for ch in text.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word {
            if !in_word {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
                in_word = true;
            }
            buf.push(ch);
        } else {
            if in_word {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
                in_word = false;
            }
            if ch.is_whitespace() {
                // Group consecutive whitespace
                if !buf.is_empty() && !buf.chars().all(char::is_whitespace) {
                    tokens.push(std::mem::take(&mut buf));
                }
                buf.push(ch);
            } else {
                // Each punctuation char is its own token
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
                tokens.push(ch.to_string());
            }
        }
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

/// Inline word diff of two strings, marked as `[-old-]{+new+}`
pub fn word_diff(old: &str, new: &str) -> String {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let old_refs: Vec<&str> = old_tokens.iter().map(|s| s.as_str()).collect();
    let new_refs: Vec<&str> = new_tokens.iter().map(|s| s.as_str()).collect();
    let diff = TextDiff::from_slices(&old_refs, &new_refs);

    let mut out = String::new();
    let mut pending: Option<ChangeTag> = None;
    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if pending != Some(tag) {
            close(&mut out, pending);
            match tag {
                ChangeTag::Delete => out.push_str("[-"),
                ChangeTag::Insert => out.push_str("{+"),
                ChangeTag::Equal => {}
            }
            pending = Some(tag);
        }
        out.push_str(change.value());
    }
    close(&mut out, pending);
    out
}

fn close(out: &mut String, tag: Option<ChangeTag>) {
    match tag {
        Some(ChangeTag::Delete) => out.push_str("-]"),
        Some(ChangeTag::Insert) => out.push_str("+}"),
        _ => {}
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn describe_values(values: &ValuePair) -> String {
    match (&values.old, &values.new) {
        (Some(Value::String(old)), Some(Value::String(new))) => word_diff(old, new),
        (Some(old), Some(new)) if is_composite(old) && is_composite(new) => {
            word_diff(&old.to_string(), &new.to_string())
        }
        (Some(old), Some(new)) => format!("{} -> {}", old, new),
        (old, new) => show(old.as_ref().or(new.as_ref())),
    }
}

fn change_line(change: &Change) -> String {
    format!(
        "  {} {}: {}",
        marker(change.action()),
        change.key(),
        describe_values(change.values())
    )
}

/// Every pairing with its changes, then a summary line
pub fn render_result(result: &DiffResult) -> String {
    let mut out = String::new();
    for (pairing, changes) in result.to_sequence().iter() {
        let _ = writeln!(out, "{}", pairing);
        if changes.is_empty() {
            let _ = writeln!(out, "  (no changes)");
        }
        for change in changes {
            let _ = writeln!(out, "{}", change_line(change));
        }
    }
    let stats = result.stats();
    let _ = writeln!(
        out,
        "{} changes: {} added, {} removed, {} altered",
        stats.total(),
        stats.added,
        stats.removed,
        stats.altered
    );
    out
}

/// A flat two-mapping change list
pub fn render_changes(changes: &[Change]) -> String {
    let mut out = String::new();
    for change in changes {
        let _ = writeln!(out, "{}", change_line(change));
    }
    out
}

/// A filtered view from [`DiffResult::filter_by_action`]
pub fn render_view(kind: ChangeKind, view: &ActionView) -> String {
    let mut out = String::new();
    if view.is_empty() {
        let _ = writeln!(out, "no {} keys", kind.as_str().to_lowercase());
    }
    for (pairing, entries) in view {
        let _ = writeln!(out, "{}", pairing);
        match entries {
            ActionEntries::Keys(keys) => {
                for key in keys {
                    let _ = writeln!(out, "  {} {}", marker(kind), key);
                }
            }
            ActionEntries::Values(values) => {
                for (key, pair) in values {
                    let _ = writeln!(out, "  {} {}: {}", marker(kind), key, describe_values(pair));
                }
            }
        }
    }
    out
}
