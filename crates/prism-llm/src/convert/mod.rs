//! Conversion between the internal message model and vendor wire formats

pub mod chat;
pub mod google;
pub mod reasoning;

use crate::types::{Content, ContentPart, Message, Role, ToolDefinition};

/// Hoist tool-result parts out of user messages into tool-role messages
///
/// Vendors require tool results as distinct messages. Text and image parts
/// stay on the originating message; each tool-result part becomes its own
/// tool-role message inserted after it. Messages left with no parts are
/// dropped.
pub fn split_tool_results(messages: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len());

    for msg in messages {
        match &msg.content {
            Content::Text(_) => out.push(msg.clone()),
            Content::Parts(parts) => {
                let mut kept = Vec::new();
                let mut results = Vec::new();

                for part in parts {
                    match part {
                        ContentPart::ToolResult { .. } => results.push(part.clone()),
                        other => kept.push(other.clone()),
                    }
                }

                if !kept.is_empty() {
                    out.push(Message {
                        role: msg.role,
                        content: Content::Parts(kept),
                    });
                }
                for result in results {
                    out.push(Message {
                        role: Role::Tool,
                        content: Content::Parts(vec![result]),
                    });
                }
            }
        }
    }

    out
}

/// Merge consecutive messages sharing a role into one multipart message
///
/// Some vendors reject two consecutive same-role messages; adapters that
/// prepend a system prompt as a user message rely on this to fold it into
/// an existing leading user message.
pub fn merge_consecutive_roles(messages: Vec<Message>) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(messages.len());

    for msg in messages {
        match out.last_mut() {
            Some(last) if last.role == msg.role => {
                let mut parts = last.content.parts();
                parts.extend(msg.content.parts());
                last.content = Content::Parts(parts);
            }
            _ => out.push(msg),
        }
    }

    out
}

/// Keep only function-typed tool definitions
pub fn filter_function_tools(tools: &[ToolDefinition]) -> Vec<&ToolDefinition> {
    tools.iter().filter(|t| t.tool_type == "function").collect()
}
