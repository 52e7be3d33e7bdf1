//! Helpers over untyped transaction receipts

use serde_json::Value;

/// Whether the first log of `receipt` was emitted as the event `topic`
///
/// Receipts without logs, or whose first log has no topics, never match.
pub fn is_event(receipt: &Value, topic: &str) -> bool {
    receipt
        .get("logs")
        .and_then(Value::as_array)
        .and_then(|logs| logs.first())
        .and_then(|log| log.get("topics"))
        .and_then(Value::as_array)
        .and_then(|topics| topics.first())
        .and_then(Value::as_str)
        .map_or(false, |first| first.eq_ignore_ascii_case(topic))
}

/// Address carried by an indexed address topic (the low 20 bytes of the word)
pub fn topic_address(topic: &str) -> Option<String> {
    let word = topic.strip_prefix("0x")?;
    if word.len() != 64 || !word.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", word[24..].to_lowercase()))
}
