//! Message and content types for chat conversations.

use serde::{Deserialize, Serialize};

use crate::chat::tools::ToolCall;

/// Message role.
///
/// Unknown role strings convert to [`Role::Invalid`] rather than failing;
/// validation rejects them before a request is transmitted.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Function,
    Invalid,
}

impl<'de> serde::Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            "function" => Self::Function,
            _ => Self::Invalid,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Function => "function",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image detail level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    #[default]
    Auto,
    Low,
    High,
}

impl ImageDetail {
    fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl From<&str> for ImageDetail {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Auto,
        }
    }
}

/// Image reference carried in a content part.
///
/// `url` accepts https URLs and `data:` URLs with base64 payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "ImageDetail::is_auto")]
    pub detail: ImageDetail,
}

/// One part of a message's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename = "image_url")]
    Image {
        image_url: ImageUrl,
    },
    File {
        file_id: String,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image part with the default (auto) detail level.
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image {
            image_url: ImageUrl {
                url: url.into(),
                detail: ImageDetail::Auto,
            },
        }
    }

    pub fn image_with_detail(url: impl Into<String>, detail: ImageDetail) -> Self {
        Self::Image {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }

    /// Creates a part referencing a previously uploaded file.
    pub fn file(file_id: impl Into<String>) -> Self {
        Self::File {
            file_id: file_id.into(),
        }
    }

    /// The primary string carried by this part: the text, the image URL, or
    /// the file id.
    pub fn content(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Image { image_url } => &image_url.url,
            Self::File { file_id } => file_id,
        }
    }
}

/// A chat message: a role plus an ordered list of content parts.
///
/// Parts are transmitted in insertion order. Assistant messages may carry
/// tool calls; tool messages answer one by `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
}

impl Message {
    /// Creates an empty message with the given role.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            content: Vec::new(),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            reasoning_content: None,
            encrypted_content: None,
        }
    }

    /// Creates a system message with a single text part.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System).with_part(ContentPart::text(text))
    }

    /// Creates a user message with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User).with_part(ContentPart::text(text))
    }

    /// Creates an assistant message with a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant).with_part(ContentPart::text(text))
    }

    /// Creates a tool message answering the given tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, result: impl Into<String>) -> Self {
        let mut message = Self::new(Role::Tool).with_part(ContentPart::text(result));
        message.tool_call_id = Some(tool_call_id.into());
        message
    }

    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.content.push(part);
        self
    }

    pub fn with_parts(mut self, parts: impl IntoIterator<Item = ContentPart>) -> Self {
        self.content.extend(parts);
        self
    }

    /// Sets the sender name, identifying participants in multi-user
    /// conversations.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: impl IntoIterator<Item = ToolCall>) -> Self {
        self.tool_calls = tool_calls.into_iter().collect();
        self
    }

    pub fn with_reasoning_content(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning_content = Some(reasoning.into());
        self
    }

    pub fn with_encrypted_content(mut self, encrypted: impl Into<String>) -> Self {
        self.encrypted_content = Some(encrypted.into());
        self
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        let mut result = String::new();
        for part in &self.content {
            if let ContentPart::Text { text } = part {
                result.push_str(text);
            }
        }
        result
    }

    /// Whether the message carries anything transmittable.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.tool_calls.is_empty()
    }
}
