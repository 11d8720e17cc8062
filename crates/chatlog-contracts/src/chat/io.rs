use std::path::Path;

use anyhow::{bail, Context};
use serde_json::Value;

use super::types::ChatHistoryItem;

/// Parses a history payload: either a bare array of items or an object
/// carrying the array under `histories`.
pub fn parse_histories(raw: &str) -> anyhow::Result<Vec<ChatHistoryItem>> {
    let payload: Value = serde_json::from_str(raw).context("history is not valid JSON")?;
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("histories") {
            Some(Value::Array(items)) => items,
            _ => bail!("history object has no `histories` array"),
        },
        _ => bail!("history must be a JSON array or an object with `histories`"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).with_context(|| format!("invalid history item {index}"))
        })
        .collect()
}

pub fn load_histories(path: &Path) -> anyhow::Result<Vec<ChatHistoryItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_histories(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_histories(path: &Path, histories: &[ChatHistoryItem]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(histories)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
