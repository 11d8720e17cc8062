use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatRole {
    Human,
    #[serde(rename = "AI")]
    Ai,
    System,
}

/// Module type of a workflow node as recorded in a response trace.
///
/// Unrecognized type strings are kept in `Other` so traces from newer
/// workflow engines survive a load/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlowNodeType {
    WorkflowStart,
    ChatNode,
    Tools,
    StopTool,
    DatasetSearchNode,
    DatasetConcatNode,
    AnswerNode,
    ClassifyQuestion,
    ContentExtract,
    HttpRequest,
    RunApp,
    PluginModule,
    PluginInput,
    PluginOutput,
    QueryExtension,
    IfElseNode,
    VariableUpdate,
    Code,
    TextEditor,
    CustomFeedback,
    ReadFiles,
    UserSelect,
    Loop,
    LoopStart,
    LoopEnd,
    Other(String),
}

impl FlowNodeType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::WorkflowStart => "workflowStart",
            Self::ChatNode => "chatNode",
            Self::Tools => "tools",
            Self::StopTool => "stopTool",
            Self::DatasetSearchNode => "datasetSearchNode",
            Self::DatasetConcatNode => "datasetConcatNode",
            Self::AnswerNode => "answerNode",
            Self::ClassifyQuestion => "classifyQuestion",
            Self::ContentExtract => "contentExtract",
            Self::HttpRequest => "httpRequest468",
            Self::RunApp => "runApp",
            Self::PluginModule => "pluginModule",
            Self::PluginInput => "pluginInput",
            Self::PluginOutput => "pluginOutput",
            Self::QueryExtension => "cfr",
            Self::IfElseNode => "ifElseNode",
            Self::VariableUpdate => "variableUpdate",
            Self::Code => "code",
            Self::TextEditor => "textEditor",
            Self::CustomFeedback => "customFeedback",
            Self::ReadFiles => "readFiles",
            Self::UserSelect => "userSelect",
            Self::Loop => "loop",
            Self::LoopStart => "loopStart",
            Self::LoopEnd => "loopEnd",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for FlowNodeType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "workflowStart" => Self::WorkflowStart,
            "chatNode" => Self::ChatNode,
            "tools" => Self::Tools,
            "stopTool" => Self::StopTool,
            "datasetSearchNode" => Self::DatasetSearchNode,
            "datasetConcatNode" => Self::DatasetConcatNode,
            "answerNode" => Self::AnswerNode,
            "classifyQuestion" => Self::ClassifyQuestion,
            "contentExtract" => Self::ContentExtract,
            "httpRequest468" => Self::HttpRequest,
            "runApp" => Self::RunApp,
            "pluginModule" => Self::PluginModule,
            "pluginInput" => Self::PluginInput,
            "pluginOutput" => Self::PluginOutput,
            "cfr" => Self::QueryExtension,
            "ifElseNode" => Self::IfElseNode,
            "variableUpdate" => Self::VariableUpdate,
            "code" => Self::Code,
            "textEditor" => Self::TextEditor,
            "customFeedback" => Self::CustomFeedback,
            "readFiles" => Self::ReadFiles,
            "userSelect" => Self::UserSelect,
            "loop" => Self::Loop,
            "loopStart" => Self::LoopStart,
            "loopEnd" => Self::LoopEnd,
            _ => Self::Other(raw),
        }
    }
}

impl From<FlowNodeType> for String {
    fn from(value: FlowNodeType) -> Self {
        match value {
            FlowNodeType::Other(raw) => raw,
            named => named.as_str().to_string(),
        }
    }
}

/// A retrieved-document citation attached to a search node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub a: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub file_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry of a node's inner history snippet.
///
/// Only the entry count feeds the statistics, so entries are read leniently:
/// an unrecognized `obj` stays in `extra` instead of failing the whole trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct HistoryPreviewItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj: Option<ChatRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryPreviewItem {
    pub fn new(obj: ChatRole, value: impl Into<String>) -> Self {
        Self {
            obj: Some(obj),
            value: Some(Value::String(value.into())),
            extra: Map::new(),
        }
    }
}

impl From<Map<String, Value>> for HistoryPreviewItem {
    fn from(mut raw: Map<String, Value>) -> Self {
        let obj = raw
            .get("obj")
            .and_then(|role| serde_json::from_value::<ChatRole>(role.clone()).ok());
        if obj.is_some() {
            raw.remove("obj");
        }
        let value = raw.remove("value");
        Self {
            obj,
            value,
            extra: raw,
        }
    }
}

/// One execution step of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceNode {
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub id: String,
    pub module_type: FlowNodeType,
    #[serde(default)]
    pub module_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_list: Option<Vec<Quote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_preview: Option<Vec<HistoryPreviewItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_detail: Option<Vec<TraceNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_detail: Option<Vec<TraceNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_detail: Option<Vec<TraceNode>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TraceNode {
    pub fn new(id: impl Into<String>, module_type: FlowNodeType) -> Self {
        let id = id.into();
        Self {
            node_id: id.clone(),
            id,
            module_type,
            module_name: String::new(),
            running_time: None,
            quote_list: None,
            history_preview: None,
            plugin_detail: None,
            tool_detail: None,
            loop_detail: None,
            extra: Map::new(),
        }
    }

    /// Nested sub-runs in walk order: plugin, tool, then loop details.
    pub fn children(&self) -> impl Iterator<Item = &TraceNode> {
        [&self.plugin_detail, &self.tool_detail, &self.loop_detail]
            .into_iter()
            .flatten()
            .flat_map(|nodes| nodes.iter())
    }
}

/// One turn in a conversation.
///
/// The four aggregate fields stay `None` until the item has been annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryItem {
    #[serde(rename = "obj")]
    pub role: ChatRole,
    #[serde(rename = "value", default)]
    pub content: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Vec<TraceNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_module_account: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quote_list: Option<Vec<Quote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_running_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_preview_length: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatHistoryItem {
    pub fn new(role: ChatRole, content: Vec<Value>) -> Self {
        Self {
            role,
            content,
            response_data: None,
            llm_module_account: None,
            total_quote_list: None,
            total_running_time: None,
            history_preview_length: None,
            extra: Map::new(),
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.total_quote_list.is_some()
    }
}
