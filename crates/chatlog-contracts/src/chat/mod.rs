mod io;
mod stats;
mod types;

pub use io::{load_histories, parse_histories, write_histories};
pub use stats::{
    annotate_item, collect_trace_stats, is_llm_node, transform_preview_histories, TraceStats,
};
pub use types::{ChatHistoryItem, ChatRole, FlowNodeType, HistoryPreviewItem, Quote, TraceNode};
