use std::borrow::Cow;

use super::types::{ChatHistoryItem, ChatRole, FlowNodeType, Quote, TraceNode};

/// Aggregates over every node reachable from a response trace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceStats {
    pub llm_module_account: u64,
    pub total_running_time: f64,
    pub total_quote_list: Vec<Quote>,
    pub history_preview_length: Option<usize>,
}

pub fn is_llm_node(node: &TraceNode) -> bool {
    matches!(node.module_type, FlowNodeType::ChatNode | FlowNodeType::Tools)
}

pub fn collect_trace_stats(nodes: &[TraceNode]) -> TraceStats {
    let mut stats = TraceStats::default();
    for node in nodes {
        accumulate(node, &mut stats);
    }
    stats
}

fn accumulate(node: &TraceNode, stats: &mut TraceStats) {
    if is_llm_node(node) {
        stats.llm_module_account += 1;
    }
    stats.total_running_time += node.running_time.unwrap_or(0.0);
    if let Some(quotes) = &node.quote_list {
        stats.total_quote_list.extend(quotes.iter().cloned());
    }
    if stats.history_preview_length.is_none() {
        stats.history_preview_length = node.history_preview.as_ref().map(Vec::len);
    }
    for child in node.children() {
        accumulate(child, stats);
    }
}

fn needs_annotation(item: &ChatHistoryItem) -> bool {
    item.role == ChatRole::Ai && !item.is_annotated()
}

fn apply_stats(item: &mut ChatHistoryItem, stats: TraceStats) {
    item.llm_module_account = Some(stats.llm_module_account);
    item.total_running_time = Some(stats.total_running_time);
    item.total_quote_list = Some(stats.total_quote_list);
    item.history_preview_length = stats.history_preview_length;
}

/// Attaches trace aggregates to an AI history item.
///
/// Returns the input reference untouched for non-AI items, items that were
/// already annotated, and items without trace data.
pub fn annotate_item(item: &ChatHistoryItem) -> Cow<'_, ChatHistoryItem> {
    if !needs_annotation(item) {
        return Cow::Borrowed(item);
    }
    let Some(nodes) = item.response_data.as_deref() else {
        return Cow::Borrowed(item);
    };

    let stats = collect_trace_stats(nodes);
    let mut annotated = item.clone();
    apply_stats(&mut annotated, stats);
    Cow::Owned(annotated)
}

/// Annotates every item and strips the raw trace for preview consumers.
///
/// With `response_detail` off the quote list is hidden as well.
pub fn transform_preview_histories(
    histories: Vec<ChatHistoryItem>,
    response_detail: bool,
) -> Vec<ChatHistoryItem> {
    histories
        .into_iter()
        .map(|mut item| {
            // The trace is dropped from the output, so it is taken rather than cloned.
            if let Some(nodes) = item.response_data.take() {
                if needs_annotation(&item) {
                    apply_stats(&mut item, collect_trace_stats(&nodes));
                }
            }
            if !response_detail {
                item.total_quote_list = None;
            }
            item
        })
        .collect()
}
