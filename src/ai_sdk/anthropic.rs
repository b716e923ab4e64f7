use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<MessageParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinitionApi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageParam {
    User(UserMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    role: String,
    content: Vec<ContentBlock>,
}

impl UserMessage {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    pub fn from_text(text: String) -> Self {
        Self::new(vec![ContentBlock::Text { text }])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

/// Forces the model to answer through one named tool, which is how a
/// schema-validated structured output is obtained from the Messages API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Tool { name: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ResponseContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContentBlock {
    Text { text: String },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDefinitionApi {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Input of the first `tool_use` block addressed to `name`, if the model
/// produced one.
pub fn tool_input<'a>(response: &'a MessageResponse, name: &str) -> Option<&'a serde_json::Value> {
    response.content.iter().find_map(|content| match content {
        ResponseContentBlock::ToolUse {
            name: tool, input, ..
        } if tool == name => Some(input),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_input_picks_the_named_tool_use_block() {
        let response = MessageResponse {
            id: "msg_1".to_string(),
            stop_reason: Some("tool_use".to_string()),
            content: vec![
                ResponseContentBlock::Text {
                    text: "thinking aloud".to_string(),
                },
                ResponseContentBlock::ToolUse {
                    id: "tool_1".to_string(),
                    name: "other".to_string(),
                    input: json!({"ignored": true}),
                },
                ResponseContentBlock::ToolUse {
                    id: "tool_2".to_string(),
                    name: "respond".to_string(),
                    input: json!({"answer": "Platform 4"}),
                },
            ],
        };

        assert_eq!(
            tool_input(&response, "respond"),
            Some(&json!({"answer": "Platform 4"}))
        );
        assert_eq!(tool_input(&response, "missing"), None);
    }

    #[test]
    fn request_serializes_forced_tool_choice() {
        let request = MessageRequest {
            model: "claude-haiku-4-5-20251001".to_string(),
            max_tokens: 1024,
            system: Some("be brief".to_string()),
            messages: vec![MessageParam::User(UserMessage::from_text(
                "hello".to_string(),
            ))],
            tools: vec![ToolDefinitionApi {
                name: "respond".to_string(),
                description: "reply".to_string(),
                input_schema: json!({"type": "object"}),
            }],
            tool_choice: Some(ToolChoice::Tool {
                name: "respond".to_string(),
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tool_choice"], json!({"type": "tool", "name": "respond"}));
        assert_eq!(
            value["messages"][0],
            json!({"role": "user", "content": [{"type": "text", "text": "hello"}]})
        );
        assert_eq!(value["tools"][0]["input_schema"], json!({"type": "object"}));
        assert_eq!(value["system"], "be brief");
    }

    #[test]
    fn response_without_stop_reason_still_parses() {
        let response: MessageResponse = serde_json::from_value(json!({
            "id": "msg_2",
            "content": [{"type": "text", "text": "hi"}]
        }))
        .unwrap();

        assert!(response.stop_reason.is_none());
        assert_eq!(response.content.len(), 1);
    }
}
