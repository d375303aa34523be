//! Function tools, tool calls, and server-side tool configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chat::message::Message;
use crate::error::{Error, Result};

fn is_false(value: &bool) -> bool {
    !*value
}

/// A callable function exposed to the model.
///
/// Parameters accumulate in an unordered map; [`Tool::to_json_schema`] emits
/// them as a JSON-schema object. The per-parameter `required` flag is builder
/// bookkeeping only: it surfaces as the schema's top-level `required` array
/// and never as a key inside a property object.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    name: String,
    description: String,
    parameters: HashMap<String, ParameterDef>,
    strict: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ParameterDef {
    param_type: String,
    description: String,
    required: bool,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: HashMap::new(),
            strict: false,
        }
    }

    /// Adds a parameter definition. Calling again with the same name
    /// overwrites the earlier definition.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            ParameterDef {
                param_type: param_type.into(),
                description: description.into(),
                required,
            },
        );
        self
    }

    /// Enables strict schema adherence.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Materializes the parameter JSON schema.
    ///
    /// Required parameter names are collected into the top-level `required`
    /// array (sorted, since the backing map is unordered); property objects
    /// carry only `type` and `description`.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for (name, def) in &self.parameters {
            properties.insert(
                name.clone(),
                serde_json::json!({
                    "type": def.param_type,
                    "description": def.description,
                }),
            );
            if def.required {
                required.push(name.clone());
            }
        }
        required.sort();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Full wire form: `{"type": "function", "function": {...}}`.
    pub fn to_wire(&self) -> serde_json::Value {
        let mut function = serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.to_json_schema(),
        });
        if self.strict
            && let Some(object) = function.as_object_mut()
        {
            object.insert("strict".to_string(), serde_json::Value::Bool(true));
        }
        serde_json::json!({
            "type": "function",
            "function": function,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("tool name is required"));
        }
        if self.description.is_empty() {
            return Err(Error::validation("tool description is required"));
        }
        for (name, def) in &self.parameters {
            if def.param_type.is_empty() {
                return Err(Error::validation(format!(
                    "parameter '{name}' is missing a type"
                )));
            }
            if def.description.is_empty() {
                return Err(Error::validation(format!(
                    "parameter '{name}' is missing a description"
                )));
            }
        }
        Ok(())
    }
}

/// Kind of a tool call, distinguishing client-executed functions from tools
/// the service runs itself.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallType {
    #[default]
    Function,
    WebSearch,
    XSearch,
    CodeExecution,
    CollectionsSearch,
    Mcp,
    DocumentSearch,
}

impl ToolCallType {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "web_search" => Self::WebSearch,
            "x_search" => Self::XSearch,
            "code_execution" => Self::CodeExecution,
            "collections_search" => Self::CollectionsSearch,
            "mcp" => Self::Mcp,
            "document_search" => Self::DocumentSearch,
            _ => Self::Function,
        }
    }

    /// Whether the caller is expected to execute this call and send back a
    /// tool result. Unrecognized kinds default to client-side.
    pub const fn is_client_side(&self) -> bool {
        matches!(self, Self::Function)
    }

    pub const fn is_server_side(&self) -> bool {
        !self.is_client_side()
    }
}

impl<'de> serde::Deserialize<'de> for ToolCallType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Execution status of a tool call.
///
/// Unknown or absent status strings deserialize to the in-progress default
/// rather than failing.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    #[default]
    InProgress,
    Completed,
    Incomplete,
    Failed,
}

impl<'de> serde::Deserialize<'de> for ToolCallStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl ToolCallStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "completed" => Self::Completed,
            "incomplete" => Self::Incomplete,
            "failed" => Self::Failed,
            _ => Self::InProgress,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
        }
    }
}

/// The function name and raw argument payload of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default)]
    pub call_type: ToolCallType,
    #[serde(default)]
    pub status: ToolCallStatus,
    pub function: FunctionCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            call_type: ToolCallType::Function,
            status: ToolCallStatus::InProgress,
            function: FunctionCall {
                name: name.into(),
                arguments: serde_json::to_string(&arguments).unwrap_or_default(),
            },
            error_message: None,
        }
    }

    pub fn with_status(mut self, status: ToolCallStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Parsed arguments. Empty or malformed argument payloads yield an empty
    /// object rather than an error.
    pub fn arguments(&self) -> serde_json::Value {
        if self.function.arguments.is_empty() {
            return serde_json::Value::Object(serde_json::Map::new());
        }
        serde_json::from_str(&self.function.arguments)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn is_client_side(&self) -> bool {
        self.call_type.is_client_side()
    }

    pub fn is_server_side(&self) -> bool {
        self.call_type.is_server_side()
    }
}

/// Caller-produced answer to a tool call.
///
/// Exactly one of `result` and `error` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool_call_id.is_empty() {
            return Err(Error::validation("tool result requires a tool call id"));
        }
        match (&self.result, &self.error) {
            (Some(_), Some(_)) => Err(Error::validation(
                "tool result cannot carry both a result and an error",
            )),
            (None, None) => Err(Error::validation(
                "tool result must carry either a result or an error",
            )),
            _ => Ok(()),
        }
    }

    /// Converts into the tool message that continues the exchange.
    pub fn into_message(self) -> Message {
        let text = match (self.result, self.error) {
            (Some(result), _) => result,
            (None, Some(error)) => error,
            (None, None) => String::new(),
        };
        Message::tool_result(self.tool_call_id, text)
    }
}

/// How the model chooses among the provided tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    /// Force a specific function by name.
    Tool(String),
    Invalid,
}

impl ToolChoice {
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool(name.into())
    }

    /// Parses a mode string. Unknown modes convert to the invalid sentinel,
    /// which request validation rejects.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "auto" => Self::Auto,
            "none" => Self::None,
            "required" => Self::Required,
            _ => Self::Invalid,
        }
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Auto => serializer.serialize_str("auto"),
            Self::None => serializer.serialize_str("none"),
            Self::Required => serializer.serialize_str("required"),
            Self::Invalid => serializer.serialize_str("invalid"),
            Self::Tool(name) => serde_json::json!({
                "type": "function",
                "function": {"name": name},
            })
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::String(mode) => Ok(Self::parse(mode)),
            serde_json::Value::Object(_) => {
                match value.pointer("/function/name").and_then(|n| n.as_str()) {
                    Some(name) => Ok(Self::Tool(name.to_string())),
                    None => Ok(Self::Invalid),
                }
            }
            _ => Ok(Self::Invalid),
        }
    }
}

/// Web search executed by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebSearchTool {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub safe_search: bool,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded_websites<I, S>(mut self, websites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_websites = websites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allowed_websites<I, S>(mut self, websites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_websites = websites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_safe_search(mut self, safe_search: bool) -> Self {
        self.safe_search = safe_search;
        self
    }
}

/// X post search executed by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct XSearchTool {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_x_handles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_x_handles: Vec<String>,
}

impl XSearchTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_included_handles<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_x_handles = handles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_handles<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_x_handles = handles.into_iter().map(Into::into).collect();
        self
    }
}

/// Sandboxed code execution by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeExecutionTool {}

/// Search over the caller's collections, executed by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectionsSearchTool {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_ids: Vec<String>,
}

/// Search over the caller's documents, executed by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentSearchTool {}

/// Remote MCP server the service may call tools on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct McpTool {
    pub server_label: String,
    pub server_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
}

/// Declarative configuration for a tool the service executes itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerTool {
    WebSearch(WebSearchTool),
    XSearch(XSearchTool),
    CodeExecution(CodeExecutionTool),
    CollectionsSearch(CollectionsSearchTool),
    DocumentSearch(DocumentSearchTool),
    Mcp(McpTool),
}

impl ServerTool {
    pub fn web_search() -> Self {
        Self::WebSearch(WebSearchTool::new())
    }

    pub fn x_search() -> Self {
        Self::XSearch(XSearchTool::new())
    }

    pub fn code_execution() -> Self {
        Self::CodeExecution(CodeExecutionTool {})
    }

    pub fn collections_search<I, S>(collection_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CollectionsSearch(CollectionsSearchTool {
            collection_ids: collection_ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn document_search() -> Self {
        Self::DocumentSearch(DocumentSearchTool {})
    }

    pub fn mcp(server_label: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self::Mcp(McpTool {
            server_label: server_label.into(),
            server_url: server_url.into(),
            allowed_tools: Vec::new(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Mcp(mcp) => {
                if mcp.server_label.is_empty() {
                    return Err(Error::validation("mcp tool requires a server label"));
                }
                if mcp.server_url.is_empty() {
                    return Err(Error::validation("mcp tool requires a server url"));
                }
                Ok(())
            }
            Self::CollectionsSearch(search) => {
                if search.collection_ids.is_empty() {
                    return Err(Error::validation(
                        "collections search tool requires at least one collection id",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

macro_rules! server_tool_from {
    ($config:ty, $variant:ident) => {
        impl From<$config> for ServerTool {
            fn from(config: $config) -> Self {
                Self::$variant(config)
            }
        }

        impl From<$config> for ToolSpec {
            fn from(config: $config) -> Self {
                Self::Server(ServerTool::$variant(config))
            }
        }
    };
}

server_tool_from!(WebSearchTool, WebSearch);
server_tool_from!(XSearchTool, XSearch);
server_tool_from!(CodeExecutionTool, CodeExecution);
server_tool_from!(CollectionsSearchTool, CollectionsSearch);
server_tool_from!(DocumentSearchTool, DocumentSearch);
server_tool_from!(McpTool, Mcp);

/// One entry in a request's tool list.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolSpec {
    Function(Tool),
    Server(ServerTool),
}

impl ToolSpec {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Function(tool) => tool.validate(),
            Self::Server(tool) => tool.validate(),
        }
    }
}

impl Serialize for ToolSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Function(tool) => tool.to_wire().serialize(serializer),
            Self::Server(tool) => tool.serialize(serializer),
        }
    }
}

impl From<Tool> for ToolSpec {
    fn from(tool: Tool) -> Self {
        Self::Function(tool)
    }
}

impl From<ServerTool> for ToolSpec {
    fn from(tool: ServerTool) -> Self {
        Self::Server(tool)
    }
}

/// Extra response payloads the caller asks the service to include.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncludeOption {
    WebSearchCallOutput,
    XSearchCallOutput,
    CodeExecutionCallOutput,
    CollectionsSearchCallOutput,
    DocumentSearchCallOutput,
    McpCallOutput,
    InlineCitations,
    Invalid,
}

impl<'de> serde::Deserialize<'de> for IncludeOption {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl IncludeOption {
    pub fn parse(option: &str) -> Self {
        match option {
            "web_search_call_output" => Self::WebSearchCallOutput,
            "x_search_call_output" => Self::XSearchCallOutput,
            "code_execution_call_output" => Self::CodeExecutionCallOutput,
            "collections_search_call_output" => Self::CollectionsSearchCallOutput,
            "document_search_call_output" => Self::DocumentSearchCallOutput,
            "mcp_call_output" => Self::McpCallOutput,
            "inline_citations" => Self::InlineCitations,
            _ => Self::Invalid,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WebSearchCallOutput => "web_search_call_output",
            Self::XSearchCallOutput => "x_search_call_output",
            Self::CodeExecutionCallOutput => "code_execution_call_output",
            Self::CollectionsSearchCallOutput => "collections_search_call_output",
            Self::DocumentSearchCallOutput => "document_search_call_output",
            Self::McpCallOutput => "mcp_call_output",
            Self::InlineCitations => "inline_citations",
            Self::Invalid => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;

    #[test]
    fn test_json_schema_required_array() {
        let tool = Tool::new("test_function", "A test function")
            .with_parameter("required_param", "string", "A required parameter", true)
            .with_parameter("optional_param", "number", "An optional parameter", false);

        let schema = tool.to_json_schema();
        assert_eq!(schema["type"], "object");

        let properties = schema["properties"].as_object().unwrap();
        let required_param = properties["required_param"].as_object().unwrap();
        assert!(
            !required_param.contains_key("required"),
            "per-property objects must not carry a 'required' key"
        );
        assert_eq!(required_param["type"], "string");
        assert_eq!(required_param["description"], "A required parameter");

        let optional_param = properties["optional_param"].as_object().unwrap();
        assert!(!optional_param.contains_key("required"));

        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "required_param");
    }

    #[test]
    fn test_json_schema_required_array_multiple() {
        let tool = Tool::new("f", "multi")
            .with_parameter("b", "string", "second", true)
            .with_parameter("a", "string", "first", true)
            .with_parameter("c", "string", "optional", false);

        let schema = tool.to_json_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["a", "b"]);
    }

    #[test]
    fn test_tool_wire_format() {
        let tool = Tool::new("get_weather", "Get the current weather")
            .with_parameter("city", "string", "The city name", true)
            .with_parameter("units", "string", "Temperature units", false);

        let wire = tool.to_wire();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "get_weather");

        let params = &wire["function"]["parameters"];
        assert!(params["properties"]["city"].get("required").is_none());
        assert_eq!(params["required"].as_array().unwrap().len(), 1);
        assert_eq!(params["required"][0], "city");
        assert!(wire["function"].get("strict").is_none());

        let strict = Tool::new("f", "d").with_strict(true).to_wire();
        assert_eq!(strict["function"]["strict"], true);
    }

    #[test]
    fn test_tool_validation() {
        assert!(
            Tool::new("test", "Test function")
                .with_parameter("param1", "string", "A parameter", true)
                .validate()
                .is_ok()
        );
        assert!(Tool::new("test", "Test function").validate().is_ok());
        assert!(Tool::new("", "Test function").validate().is_err());
        assert!(Tool::new("test", "").validate().is_err());
        assert!(
            Tool::new("test", "d")
                .with_parameter("p", "", "desc", false)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_tool_call_status_parse_defaults() {
        assert_eq!(ToolCallStatus::parse("completed"), ToolCallStatus::Completed);
        assert_eq!(ToolCallStatus::parse("incomplete"), ToolCallStatus::Incomplete);
        assert_eq!(ToolCallStatus::parse("failed"), ToolCallStatus::Failed);
        assert_eq!(ToolCallStatus::parse("in_progress"), ToolCallStatus::InProgress);
        assert_eq!(ToolCallStatus::parse(""), ToolCallStatus::InProgress);
        assert_eq!(ToolCallStatus::parse("UNKNOWN_STATUS"), ToolCallStatus::InProgress);
    }

    #[test]
    fn test_tool_call_round_trip() {
        let call = ToolCall::new(
            "call_789",
            "get_weather",
            serde_json::json!({"city": "London"}),
        )
        .with_status(ToolCallStatus::Failed)
        .with_error_message("Connection timeout");

        let json = serde_json::to_string(&call).unwrap();
        let back: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "call_789");
        assert_eq!(back.status, ToolCallStatus::Failed);
        assert_eq!(back.error_message.as_deref(), Some("Connection timeout"));
        assert_eq!(back.name(), "get_weather");
        assert_eq!(back.arguments(), serde_json::json!({"city": "London"}));

        let clean = ToolCall::new("call_1", "noop", serde_json::json!({}));
        let back: ToolCall = serde_json::from_str(&serde_json::to_string(&clean).unwrap()).unwrap();
        assert!(back.error_message.is_none());
        assert_eq!(back.status, ToolCallStatus::InProgress);
    }

    #[test]
    fn test_tool_call_arguments_never_fail() {
        let mut call = ToolCall::new("call_1", "f", serde_json::json!({}));
        call.function.arguments = String::new();
        assert_eq!(call.arguments(), serde_json::json!({}));

        call.function.arguments = "{invalid json}".to_string();
        assert_eq!(call.arguments(), serde_json::json!({}));
    }

    #[test]
    fn test_tool_call_sidedness() {
        let client = ToolCall::new("c", "f", serde_json::json!({}));
        assert!(client.is_client_side());
        assert!(!client.is_server_side());

        let mut server = ToolCall::new("s", "web_search", serde_json::json!({}));
        server.call_type = ToolCallType::WebSearch;
        assert!(!server.is_client_side());
        assert!(server.is_server_side());

        // Unknown wire kinds fall back to client-side.
        let parsed: ToolCallType = serde_json::from_str(r#""mystery_tool""#).unwrap();
        assert!(parsed.is_client_side());
    }

    #[test]
    fn test_tool_result_exclusivity() {
        assert!(ToolResult::success("call_1", "ok").validate().is_ok());
        assert!(ToolResult::failure("call_1", "boom").validate().is_ok());

        let both = ToolResult {
            tool_call_id: "call_1".to_string(),
            result: Some("ok".to_string()),
            error: Some("boom".to_string()),
        };
        assert!(both.validate().is_err());

        let neither = ToolResult {
            tool_call_id: "call_1".to_string(),
            result: None,
            error: None,
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn test_tool_result_into_message() {
        let message = ToolResult::success("call_9", "42").into_message();
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(message.text(), "42");
    }

    #[test]
    fn test_tool_choice_forms() {
        assert_eq!(
            serde_json::to_value(ToolChoice::Auto).unwrap(),
            serde_json::json!("auto")
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::tool("get_weather")).unwrap(),
            serde_json::json!({"type": "function", "function": {"name": "get_weather"}})
        );

        assert_eq!(ToolChoice::parse("required"), ToolChoice::Required);
        assert_eq!(ToolChoice::parse("sometimes"), ToolChoice::Invalid);

        let parsed: ToolChoice = serde_json::from_value(serde_json::json!({
            "type": "function", "function": {"name": "f"}
        }))
        .unwrap();
        assert_eq!(parsed, ToolChoice::tool("f"));
    }

    #[test]
    fn test_server_tool_wire_and_validation() {
        let web = serde_json::to_value(ServerTool::from(
            WebSearchTool::new()
                .with_excluded_websites(["spam.com", "ads.com"])
                .with_allowed_websites(["trusted.com"])
                .with_country("US")
                .with_safe_search(true),
        ))
        .unwrap();
        assert_eq!(web["type"], "web_search");
        assert_eq!(web["excluded_websites"].as_array().unwrap().len(), 2);
        assert_eq!(web["allowed_websites"][0], "trusted.com");
        assert_eq!(web["country"], "US");
        assert_eq!(web["safe_search"], true);

        let code = serde_json::to_value(ServerTool::code_execution()).unwrap();
        assert_eq!(code["type"], "code_execution");

        assert!(ServerTool::mcp("docs", "https://mcp.example.com").validate().is_ok());
        assert!(ServerTool::mcp("", "https://mcp.example.com").validate().is_err());
        assert!(ServerTool::mcp("docs", "").validate().is_err());

        assert!(ServerTool::collections_search(["col-1"]).validate().is_ok());
        assert!(ServerTool::collections_search(Vec::<String>::new()).validate().is_err());
    }

    #[test]
    fn test_include_option_conversion() {
        let cases = [
            (IncludeOption::WebSearchCallOutput, "web_search_call_output"),
            (IncludeOption::XSearchCallOutput, "x_search_call_output"),
            (IncludeOption::CodeExecutionCallOutput, "code_execution_call_output"),
            (
                IncludeOption::CollectionsSearchCallOutput,
                "collections_search_call_output",
            ),
            (
                IncludeOption::DocumentSearchCallOutput,
                "document_search_call_output",
            ),
            (IncludeOption::McpCallOutput, "mcp_call_output"),
            (IncludeOption::InlineCitations, "inline_citations"),
        ];
        for (option, wire) in cases {
            assert_eq!(option.as_str(), wire);
            assert_eq!(IncludeOption::parse(wire), option);
            assert_eq!(serde_json::to_value(option).unwrap(), serde_json::json!(wire));
        }
        assert_eq!(IncludeOption::parse("invalid"), IncludeOption::Invalid);
        assert_eq!(IncludeOption::parse(""), IncludeOption::Invalid);
    }
}
