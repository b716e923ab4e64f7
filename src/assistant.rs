use async_trait::async_trait;
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ai_sdk::{
    MessageParam, MessageRequest, MessageResponse, ToolChoice, ToolDefinitionApi, UserMessage,
    tool_input,
};
use crate::config::ModelConfig;

const INSTRUCTION: &str = "You are a helpful AI travel assistant for Indian Railways. \
Answer the user's question about train schedules, delays, platform numbers, and other \
travel-related queries.";

const OUTPUT_TOOL: &str = "travel_assistant_answer";
const OUTPUT_TOOL_DESCRIPTION: &str = "Reply to the traveller. Always call this tool with the \
complete answer to the user's question.";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssistantInput {
    #[schemars(description = "The user query related to train travel.")]
    pub query: String,
}

impl AssistantInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssistantOutput {
    #[schemars(description = "The answer to the user query.")]
    pub answer: String,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("model output does not match the answer schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("model returned no structured output (stop reason: {stop_reason:?})")]
    MissingOutput { stop_reason: Option<String> },
}

impl FlowError {
    /// The model answered but without the output block its contract requires.
    pub fn is_contract_breach(&self) -> bool {
        matches!(self, Self::MissingOutput { .. })
    }
}

/// A prompt bound to a hosted model: one query in, one answer out.
#[async_trait]
pub trait AssistantFlow: Send + Sync {
    async fn invoke(&self, input: AssistantInput) -> Result<AssistantOutput, FlowError>;
}

pub fn render_prompt(input: &AssistantInput) -> String {
    format!("{INSTRUCTION}\n\nQuestion: {}", input.query)
}

/// Production flow backed by the Anthropic Messages API.
///
/// Holds no per-request state; each `invoke` issues exactly one request and
/// inherits whatever timeout the HTTP client has (none by default).
pub struct TravelAssistant {
    client: Client,
    config: ModelConfig,
    output_schema: serde_json::Value,
}

impl TravelAssistant {
    /// Fails when `config` carries no usable API key.
    pub fn new(config: ModelConfig) -> Result<Self, &'static str> {
        config.require_api_key()?;
        Ok(Self {
            client: Client::new(),
            config,
            output_schema: output_schema(),
        })
    }

    fn build_request(&self, input: &AssistantInput) -> MessageRequest {
        MessageRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: None,
            messages: vec![MessageParam::User(UserMessage::from_text(render_prompt(
                input,
            )))],
            tools: vec![ToolDefinitionApi {
                name: OUTPUT_TOOL.to_string(),
                description: OUTPUT_TOOL_DESCRIPTION.to_string(),
                input_schema: self.output_schema.clone(),
            }],
            tool_choice: Some(ToolChoice::Tool {
                name: OUTPUT_TOOL.to_string(),
            }),
        }
    }

    pub(crate) async fn run_inference(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, FlowError> {
        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await?;
            return Err(FlowError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AssistantFlow for TravelAssistant {
    async fn invoke(&self, input: AssistantInput) -> Result<AssistantOutput, FlowError> {
        let request = self.build_request(&input);
        let response = self.run_inference(&request).await?;
        debug!(
            message_id = %response.id,
            stop_reason = ?response.stop_reason,
            "model responded"
        );
        parse_output(&response)
    }
}

/// Unwraps the structured answer from a model response.
pub fn parse_output(response: &MessageResponse) -> Result<AssistantOutput, FlowError> {
    let input = tool_input(response, OUTPUT_TOOL).ok_or_else(|| FlowError::MissingOutput {
        stop_reason: response.stop_reason.clone(),
    })?;
    Ok(AssistantOutput::deserialize(input)?)
}

fn output_schema() -> serde_json::Value {
    let mut schema = serde_json::to_value(schema_for!(AssistantOutput)).unwrap_or_default();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_sdk::ResponseContentBlock;
    use serde_json::json;

    fn response_with(content: Vec<ResponseContentBlock>) -> MessageResponse {
        MessageResponse {
            id: "msg_test".to_string(),
            content,
            stop_reason: Some("tool_use".to_string()),
        }
    }

    #[test]
    fn prompt_states_role_then_question() {
        let prompt = render_prompt(&AssistantInput::new("When is train 12951 expected at Kota?"));

        assert!(prompt.starts_with("You are a helpful AI travel assistant for Indian Railways."));
        assert!(prompt.ends_with("\n\nQuestion: When is train 12951 expected at Kota?"));
    }

    #[test]
    fn prompt_interpolates_query_verbatim() {
        let prompt = render_prompt(&AssistantInput::new("  {{query}} <b>\"x\"</b>  "));
        assert!(prompt.ends_with("Question:   {{query}} <b>\"x\"</b>  "));
    }

    #[test]
    fn request_forces_the_answer_tool() {
        let assistant =
            TravelAssistant::new(ModelConfig::new("sk-test", "http://127.0.0.1:1")).unwrap();
        let request = assistant.build_request(&AssistantInput::new("Platform for 12951?"));

        assert_eq!(
            request.tool_choice,
            Some(ToolChoice::Tool {
                name: OUTPUT_TOOL.to_string()
            })
        );
        assert!(request.system.is_none());
        assert_eq!(request.tools.len(), 1);

        let schema = &request.tools[0].input_schema;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["answer"]));
        assert_eq!(schema["properties"]["answer"]["type"], "string");
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn assistant_requires_an_api_key() {
        let mut config = ModelConfig::new("", "http://127.0.0.1:1");
        assert!(TravelAssistant::new(config.clone()).is_err());

        config.api_key = None;
        assert!(TravelAssistant::new(config).is_err());
    }

    #[test]
    fn parse_output_unwraps_answer() {
        let response = response_with(vec![ResponseContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: OUTPUT_TOOL.to_string(),
            input: json!({"answer": "It is expected at 11:40."}),
        }]);

        let output = parse_output(&response).unwrap();
        assert_eq!(output.answer, "It is expected at 11:40.");
    }

    #[test]
    fn parse_output_rejects_schema_violation() {
        let response = response_with(vec![ResponseContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: OUTPUT_TOOL.to_string(),
            input: json!({"answer": 42}),
        }]);

        let err = parse_output(&response).unwrap_err();
        assert!(matches!(err, FlowError::Schema(_)));
        assert!(!err.is_contract_breach());
    }

    #[test]
    fn parse_output_flags_missing_output_as_contract_breach() {
        let mut response = response_with(vec![ResponseContentBlock::Text {
            text: "The train is on time.".to_string(),
        }]);
        response.stop_reason = Some("max_tokens".to_string());

        let err = parse_output(&response).unwrap_err();
        assert!(err.is_contract_breach());
        match err {
            FlowError::MissingOutput { stop_reason } => {
                assert_eq!(stop_reason.as_deref(), Some("max_tokens"));
            }
            other => panic!("expected missing output, got {other:?}"),
        }
    }
}
